//! Observations produced by element-state detection.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::geometry::{Point, Region};
use crate::template::StateLabel;

/// A single match reported by the external template matcher.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MatchLocation {
    /// Screen region the template matched at
    pub region: Region,
    /// Matcher confidence score, higher is better
    pub score: f64,
}

impl MatchLocation {
    /// Create a new match location.
    pub fn new(region: Region, score: f64) -> Self {
        Self { region, score }
    }

    /// Center of the matched region, the natural click target.
    pub fn center(&self) -> Point {
        self.region.center()
    }
}

/// Classification of an element at one snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObservedState {
    /// Templates of exactly this state matched
    State(StateLabel),
    /// No state's templates matched
    Absent,
}

impl ObservedState {
    /// Whether no state matched.
    pub fn is_absent(&self) -> bool {
        matches!(self, ObservedState::Absent)
    }

    /// The matched state label, if any.
    pub fn label(&self) -> Option<&StateLabel> {
        match self {
            ObservedState::State(label) => Some(label),
            ObservedState::Absent => None,
        }
    }

    /// Whether this observation is the given state.
    pub fn is(&self, label: &StateLabel) -> bool {
        self.label() == Some(label)
    }
}

impl fmt::Display for ObservedState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ObservedState::State(label) => label.fmt(f),
            ObservedState::Absent => f.write_str("absent"),
        }
    }
}

impl From<StateLabel> for ObservedState {
    fn from(label: StateLabel) -> Self {
        ObservedState::State(label)
    }
}

/// Result of classifying one element against one screen snapshot.
///
/// Produced fresh on every detection call and never cached, since the
/// screen can change at any time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementObservation {
    /// Name of the observed element
    pub element: String,
    /// The classified state
    pub state: ObservedState,
    /// Best-scoring match location, when a state matched
    pub location: Option<MatchLocation>,
    /// When the observation was made
    pub observed_at: DateTime<Utc>,
}

impl ElementObservation {
    /// Create an observation stamped with the current time.
    pub fn new(
        element: impl Into<String>,
        state: ObservedState,
        location: Option<MatchLocation>,
    ) -> Self {
        Self {
            element: element.into(),
            state,
            location,
            observed_at: Utc::now(),
        }
    }

    /// Observation of an element that is not on screen.
    pub fn absent(element: impl Into<String>) -> Self {
        Self::new(element, ObservedState::Absent, None)
    }
}
