//! Crawl phase and terminal status definitions
//!
//! A run moves through a fixed set of phases; every change goes through
//! [`CrawlPhase::can_transition_to`] so the orchestrator cannot skip a step.
use std::fmt;

/// Represents where a run currently is in the crawl loop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CrawlPhase {
    // ===== Active Phases =====
    /// Nothing fetched yet; the permission gate runs here
    Init,

    /// Retrieving the current listing page
    Fetching,

    /// Turning the page into records
    Extracting,

    /// Fetching detail pages for newly accepted products
    Enriching,

    /// Computing the next listing locator
    Paginating,

    // ===== Terminal Phases =====
    /// The run ended normally
    Done,

    /// The site's policy denied the seed
    Blocked,

    /// A page could not be retrieved or the host cancelled the run
    Aborted,
}

impl CrawlPhase {
    /// Returns true if no further transition is possible
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Blocked | Self::Aborted)
    }

    /// Returns true if moving from `self` to `next` is a legal step
    ///
    /// Every active phase may abort; the terminal phases accept nothing.
    pub fn can_transition_to(&self, next: CrawlPhase) -> bool {
        use CrawlPhase::*;

        if !self.is_terminal() && next == Aborted {
            return true;
        }

        matches!(
            (self, next),
            (Init, Fetching)
                | (Init, Blocked)
                | (Fetching, Extracting)
                | (Extracting, Enriching)
                | (Extracting, Paginating)
                | (Extracting, Done)
                | (Enriching, Paginating)
                | (Paginating, Fetching)
                | (Paginating, Done)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Init => "init",
            Self::Fetching => "fetching",
            Self::Extracting => "extracting",
            Self::Enriching => "enriching",
            Self::Paginating => "paginating",
            Self::Done => "done",
            Self::Blocked => "blocked",
            Self::Aborted => "aborted",
        }
    }
}

impl fmt::Display for CrawlPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Why a run was aborted
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AbortReason {
    /// A listing page could not be retrieved after retries
    Unreachable { url: String },

    /// The host triggered the cancellation token
    Cancelled,
}

/// Terminal status of one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunStatus {
    Completed,
    Blocked,
    Aborted(AbortReason),
}

impl RunStatus {
    /// Returns true unless the run was aborted
    pub fn is_success(&self) -> bool {
        !matches!(self, Self::Aborted(_))
    }

    /// Short human-readable status, given how many records the run produced
    ///
    /// A completed run with no records reads "nothing found".
    pub fn describe(&self, record_count: usize) -> String {
        match self {
            Self::Completed if record_count == 0 => "nothing found".to_string(),
            other => other.to_string(),
        }
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Completed => write!(f, "completed"),
            Self::Blocked => write!(f, "blocked by robots.txt"),
            Self::Aborted(AbortReason::Unreachable { url }) => {
                write!(f, "aborted: {} unreachable", url)
            }
            Self::Aborted(AbortReason::Cancelled) => write!(f, "aborted: cancelled"),
        }
    }
}
