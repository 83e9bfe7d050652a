//! Error types for the lookout library.

use thiserror::Error;

use crate::geometry::Region;
use crate::observation::{ElementObservation, ObservedState};
use crate::template::StateLabel;

/// Main error type for lookout operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Element name already registered
    #[error("Element already registered: {0}")]
    DuplicateElement(String),

    /// An element definition with a missing or malformed template set
    #[error("Invalid template set for element '{element}': {detail}")]
    InvalidTemplateSet {
        /// Element being defined
        element: String,
        /// What is wrong with the definition
        detail: String,
    },

    /// Templates of two or more mutually exclusive states matched at once
    #[error(
        "Ambiguous state for element '{element}': templates for states [{}] matched simultaneously",
        .states.iter().map(StateLabel::as_str).collect::<Vec<_>>().join(", ")
    )]
    AmbiguousState {
        /// Element being classified
        element: String,
        /// Every state whose templates matched, in sorted order
        states: Vec<StateLabel>,
    },

    /// Target state not reached before the timeout elapsed
    #[error(
        "Timed out after {waited_ms}ms waiting for element '{element}' to be {target} (last observed: {})",
        .last.state
    )]
    WaitTimeout {
        /// Element being waited on
        element: String,
        /// State that was waited for
        target: ObservedState,
        /// Total time waited in milliseconds
        waited_ms: u64,
        /// The final observation before giving up
        last: ElementObservation,
    },

    /// A generic wait expired before its condition held
    #[error("Timed out after {waited_ms}ms: {detail}")]
    Timeout {
        /// What was waited for
        detail: String,
        /// Total time waited in milliseconds
        waited_ms: u64,
    },

    /// Element not registered, not on screen, or not in an actionable state
    #[error("Element not found: {0}")]
    ElementNotFound(String),

    /// One element matched at two or more distinct screen locations
    #[error("Duplicate match: {what} found at {} distinct locations", .regions.len())]
    DuplicateMatch {
        /// What matched more than once (an element, or templates of one state)
        what: String,
        /// Every distinct location it matched at
        regions: Vec<Region>,
    },

    /// Opposite states scored identically, classification impossible
    #[error("Score tie: {detail} (score: {score})")]
    ScoreTie {
        /// What was being classified
        detail: String,
        /// The tied score
        score: f64,
    },

    /// More than one checked element in a radio button list
    #[error("Found {0} checked elements in a radio button list")]
    RadioConflict(usize),

    /// Invalid arguments (timeouts, intervals, indexes)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// External template matcher failure
    #[error("Matcher error: {0}")]
    Matcher(String),

    /// External input driver failure
    #[error("Driver error: {0}")]
    Driver(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
