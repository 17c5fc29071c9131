use crate::content::NormalizedContent;
use sha2::{Digest, Sha256};

/// Computes the change-detection fingerprint of extracted content
///
/// SHA-256 over the title, meta description, primary heading, word count,
/// the sorted set of link hrefs, and the structured data blocks. Each field
/// is length-prefixed so adjacent fields cannot bleed into each other.
///
/// Body text, timings and raw HTML are not hashed.
///
/// Returns 64 lowercase hex characters.
pub fn content_hash(content: &NormalizedContent) -> String {
    let mut hasher = Sha256::new();

    write_field(&mut hasher, content.title.as_deref().unwrap_or(""));
    write_field(&mut hasher, content.meta_description.as_deref().unwrap_or(""));
    write_field(&mut hasher, content.primary_heading().unwrap_or(""));
    write_field(&mut hasher, &content.word_count.to_string());

    let mut hrefs: Vec<&str> = content.links.iter().map(|l| l.href.as_str()).collect();
    hrefs.sort_unstable();
    hrefs.dedup();
    hasher.update((hrefs.len() as u64).to_be_bytes());
    for href in hrefs {
        write_field(&mut hasher, href);
    }

    hasher.update((content.structured_data.len() as u64).to_be_bytes());
    for block in &content.structured_data {
        write_field(&mut hasher, block);
    }

    hex::encode(hasher.finalize())
}

fn write_field(hasher: &mut Sha256, value: &str) {
    hasher.update((value.len() as u64).to_be_bytes());
    hasher.update(value.as_bytes());
}
