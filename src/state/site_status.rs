/// Site status definitions for tracking indexing progress
///
/// This module defines the states a site record moves through during a crawl.
use std::fmt;

/// Represents the current indexing status of a site
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SiteStatus {
    /// A crawl of this site is in progress
    Indexing,

    /// The crawl finished without being stopped or failing
    Indexed,

    /// The crawl was stopped by the user or hit an error
    Failed,
}

impl SiteStatus {
    /// Returns true if this is a terminal state
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Indexing)
    }

    /// Checks whether a site may move from this status to `next`
    ///
    /// `Failed -> Failed` is allowed so a later branch failure can replace the
    /// recorded error. `Indexed -> Failed` covers a single-page re-index that
    /// fails under a site that was already indexed.
    pub fn can_transition_to(&self, next: SiteStatus) -> bool {
        matches!(
            (self, next),
            (Self::Indexing, Self::Indexed)
                | (Self::Indexing, Self::Failed)
                | (Self::Failed, Self::Failed)
                | (Self::Indexed, Self::Failed)
        )
    }

    /// Converts the status to its database string representation
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Indexing => "INDEXING",
            Self::Indexed => "INDEXED",
            Self::Failed => "FAILED",
        }
    }

    /// Parses a status from its database string representation
    ///
    /// Returns None if the string doesn't match any known status.
    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "INDEXING" => Some(Self::Indexing),
            "INDEXED" => Some(Self::Indexed),
            "FAILED" => Some(Self::Failed),
            _ => None,
        }
    }
}

impl fmt::Display for SiteStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_string())
    }
}
