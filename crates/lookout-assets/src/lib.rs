//! # lookout-assets
//!
//! Template image resolution for the lookout GUI automation library.
//!
//! This crate provides:
//! - A template store scanning configured search directories
//! - Filename-convention grouping of templates into element definitions
//! - Explicit YAML manifests for element definitions
//!
//! ## Architecture
//!
//! This is Layer 1 in the architecture - it depends only on lookout-core
//! and supplies resolved [`lookout_core::TemplateImage`] references to the
//! detection layer. Image bytes are never read here; that is the external
//! matcher's concern.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod manifest;
pub mod naming;
pub mod store;

// Re-export commonly used types
pub use manifest::{Manifest, ManifestElement};
pub use naming::{group_elements, CheckablePool, GroupedAssets};
pub use store::TemplateStore;
