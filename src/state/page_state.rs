/// URL inventory state definitions
///
/// This module defines the lifecycle states of a URL inventory entry and the
/// reasons an entry can be skipped without ever being fetched.
use serde::{Deserialize, Serialize};
use std::fmt;

/// Represents the current state of a URL in the project inventory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UrlState {
    // ===== Active States =====
    /// URL has been discovered and is waiting to be claimed
    Discovered,

    /// URL has been claimed by a fetch worker (holds a lease)
    Queued,

    // ===== Terminal States =====
    /// URL was fetched successfully
    Crawled,

    /// URL fetch failed (HTTP error, timeout, network error)
    Failed,

    /// URL was never fetched because of policy
    Skipped,
}

impl UrlState {
    /// Returns true if this is a terminal state for the current job
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Crawled | Self::Failed | Self::Skipped)
    }

    /// Returns true if this is an active state (entry may still be fetched)
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Discovered | Self::Queued)
    }

    /// Converts the state to its database string representation
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Discovered => "discovered",
            Self::Queued => "queued",
            Self::Crawled => "crawled",
            Self::Failed => "failed",
            Self::Skipped => "skipped",
        }
    }

    /// Parses a state from its database string representation
    ///
    /// Returns None if the string doesn't match any known state.
    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "discovered" => Some(Self::Discovered),
            "queued" => Some(Self::Queued),
            "crawled" => Some(Self::Crawled),
            "failed" => Some(Self::Failed),
            "skipped" => Some(Self::Skipped),
            _ => None,
        }
    }

    /// Returns all possible URL states
    pub fn all_states() -> Vec<Self> {
        vec![
            Self::Discovered,
            Self::Queued,
            Self::Crawled,
            Self::Failed,
            Self::Skipped,
        ]
    }
}

impl fmt::Display for UrlState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_string())
    }
}

/// Why an entry was moved to `Skipped` without a fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// Path disallowed by the site's robots.txt
    RobotsDisallowed,

    /// Entry was still waiting when the page budget ran out
    BudgetExceeded,

    /// Entry is deeper than the job's maximum depth
    DepthExceeded,

    /// URL matched an exclude pattern or missed every include pattern
    PatternExcluded,

    /// URL could not be normalized
    InvalidUrl,
}

impl SkipReason {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::RobotsDisallowed => "robots_disallowed",
            Self::BudgetExceeded => "budget_exceeded",
            Self::DepthExceeded => "depth_exceeded",
            Self::PatternExcluded => "pattern_excluded",
            Self::InvalidUrl => "invalid_url",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "robots_disallowed" => Some(Self::RobotsDisallowed),
            "budget_exceeded" => Some(Self::BudgetExceeded),
            "depth_exceeded" => Some(Self::DepthExceeded),
            "pattern_excluded" => Some(Self::PatternExcluded),
            "invalid_url" => Some(Self::InvalidUrl),
            _ => None,
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_terminal() {
        assert!(!UrlState::Discovered.is_terminal());
        assert!(!UrlState::Queued.is_terminal());

        assert!(UrlState::Crawled.is_terminal());
        assert!(UrlState::Failed.is_terminal());
        assert!(UrlState::Skipped.is_terminal());
    }

    #[test]
    fn test_is_active() {
        assert!(UrlState::Discovered.is_active());
        assert!(UrlState::Queued.is_active());

        assert!(!UrlState::Crawled.is_active());
        assert!(!UrlState::Skipped.is_active());
    }

    #[test]
    fn test_roundtrip_db_string() {
        for state in UrlState::all_states() {
            let db_str = state.to_db_string();
            let parsed = UrlState::from_db_string(db_str);
            assert_eq!(Some(state), parsed, "Failed roundtrip for {:?}", state);
        }
        assert_eq!(UrlState::from_db_string("fetching"), None);
    }

    #[test]
    fn test_skip_reason_db_string() {
        assert_eq!(
            SkipReason::from_db_string("robots_disallowed"),
            Some(SkipReason::RobotsDisallowed)
        );
        assert_eq!(
            SkipReason::BudgetExceeded.to_db_string(),
            "budget_exceeded"
        );
        assert_eq!(SkipReason::from_db_string("unknown"), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", UrlState::Discovered), "discovered");
        assert_eq!(format!("{}", SkipReason::PatternExcluded), "pattern_excluded");
    }
}
