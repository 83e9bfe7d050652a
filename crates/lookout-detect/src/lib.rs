//! # lookout-detect
//!
//! Element-state detection engine for the lookout GUI automation library.
//!
//! This crate provides:
//! - Collaborator traits for the external matcher and input driver
//! - An element registry and the [`ElementStateDetector`]
//! - Polling waits that absorb GUI timing flakiness
//! - Element groups, checkable lists and anchored regions
//! - Best-match selection across redundant templates
//! - Test doubles for driving automation logic without a screen
//!
//! ## Architecture
//!
//! This is Layer 2 in the architecture - it depends on lookout-core and
//! lookout-assets, and consumes screen capture, template matching and
//! input synthesis as external capabilities behind traits.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod anchor;
pub mod checkable;
pub mod detector;
pub mod group;
pub mod matcher;
pub mod probe;
pub mod registry;
pub mod selection;
pub mod testing;

// Re-export commonly used types
pub use anchor::AnchoredRegion;
pub use checkable::{CheckableList, CheckableSpec};
pub use detector::ElementStateDetector;
pub use group::GroupScan;
pub use matcher::{ScreenDriver, TemplateMatcher};
pub use probe::Probe;
pub use registry::ElementRegistry;
pub use selection::{best_match, best_matches};
