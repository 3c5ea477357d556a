/// Pagination state definitions for one listing category
use serde::Serialize;
use std::fmt;

/// Represents where the pagination driver of a category currently stands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PaginationState {
    // ===== Active States =====
    /// The current index page is being requested
    Fetching,

    /// Listings of the current page are being processed by the worker pool
    Dispatching,

    /// Moving on to the next page number
    Advancing,

    // ===== Terminal States =====
    /// The page cap was passed; normal completion
    Exhausted,

    /// A fatal condition stopped the category (bad start URL, sink gone)
    Failed,
}

impl PaginationState {
    /// Returns true if the driver has stopped for good
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Exhausted | Self::Failed)
    }

    /// Returns true if this represents a normal completion
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Exhausted)
    }

    /// Returns true if the driver may move from `self` to `next`
    ///
    /// A failed index fetch goes straight from `Fetching` to `Advancing`.
    pub fn can_transition_to(&self, next: PaginationState) -> bool {
        use PaginationState::*;
        matches!(
            (self, next),
            (Fetching, Dispatching)
                | (Fetching, Advancing)
                | (Fetching, Failed)
                | (Dispatching, Advancing)
                | (Dispatching, Failed)
                | (Advancing, Fetching)
                | (Advancing, Exhausted)
                | (Advancing, Failed)
        )
    }

    /// Short lowercase name used in logs and summaries
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fetching => "fetching",
            Self::Dispatching => "dispatching",
            Self::Advancing => "advancing",
            Self::Exhausted => "exhausted",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for PaginationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
