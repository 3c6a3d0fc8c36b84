/// Per-visit outcome definitions
use std::fmt;

/// How a single visit to a queue item ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemOutcome {
    /// Page fetched, parsed and saved; carries the number of newly queued links
    Saved { links_enqueued: usize },

    /// Server answered 404; the item is abandoned
    NotFound,

    /// Server answered 429; the item stays pending
    RateLimited,

    /// Page had no usable title; the item is abandoned without a record
    Unparseable,

    /// Any other status, or no response at all; the item is abandoned
    Failed { status: Option<u16> },
}

impl ItemOutcome {
    /// Returns true if the item is marked done after this outcome
    pub fn retires_item(&self) -> bool {
        !matches!(self, Self::RateLimited)
    }

    /// Returns true if this outcome resets the rate-limit backoff
    pub fn resets_backoff(&self) -> bool {
        !matches!(self, Self::RateLimited)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Saved { .. } => "saved",
            Self::NotFound => "not_found",
            Self::RateLimited => "rate_limited",
            Self::Unparseable => "unparseable",
            Self::Failed { .. } => "failed",
        }
    }
}

impl fmt::Display for ItemOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
