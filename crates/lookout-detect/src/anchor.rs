//! Regions anchored to a template image.
//!
//! Windows and panes rarely sit at fixed coordinates, but they carry a
//! stable visual landmark (a logo, a title bar icon). An anchored region
//! is located by finding that landmark and laying out a fixed frame
//! relative to it; child regions can anchor within a parent so a moved
//! window re-locates its whole hierarchy.

use std::time::Duration;
use tracing::debug;

use lookout_core::{Clock, Error, Region, Result, TemplateImage, Wait};

use crate::detector::validate_wait;
use crate::matcher::TemplateMatcher;

/// A region of fixed size located through an anchor template.
///
/// Without a frame, the region is the anchor match itself. With a frame,
/// the anchor image's top-left corner sits `(offset_x, offset_y)` pixels
/// from the region's top-left corner and the region has the given size.
pub struct AnchoredRegion {
    name: String,
    anchor: TemplateImage,
    offset_x: i32,
    offset_y: i32,
    size: Option<(u32, u32)>,
    parent: Option<Box<AnchoredRegion>>,
    resolved: Option<Region>,
    find_count: u64,
}

impl AnchoredRegion {
    /// Create an anchored region covering exactly the anchor match.
    pub fn new(name: impl Into<String>, anchor: TemplateImage) -> Self {
        Self {
            name: name.into(),
            anchor,
            offset_x: 0,
            offset_y: 0,
            size: None,
            parent: None,
            resolved: None,
            find_count: 0,
        }
    }

    /// Give the region a fixed frame relative to the anchor image.
    pub fn with_frame(
        mut self,
        offset_x: i32,
        offset_y: i32,
        width: u32,
        height: u32,
    ) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(Error::InvalidInput(
                "anchored region dimensions must be > 0".to_string(),
            ));
        }
        self.offset_x = offset_x;
        self.offset_y = offset_y;
        self.size = Some((width, height));
        Ok(self)
    }

    /// Search the anchor only within the given parent region.
    pub fn with_parent(mut self, parent: AnchoredRegion) -> Self {
        self.parent = Some(Box::new(parent));
        self
    }

    /// Name of the region, used in log and error messages.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// How many times this region has been resolved.
    pub fn find_count(&self) -> u64 {
        self.find_count
    }

    /// The resolved region.
    ///
    /// Fails until [`anchor`](Self::anchor) has succeeded once.
    pub fn region(&self) -> Result<Region> {
        self.resolved.ok_or_else(|| {
            Error::ElementNotFound(format!(
                "anchored region '{}' has not been resolved",
                self.name
            ))
        })
    }

    /// Resolve the region by locating its anchor template.
    ///
    /// Retries every `poll_interval` until `timeout` of waiting has
    /// elapsed (a zero timeout makes a single attempt). A parent that has
    /// been resolved less often than this region is re-anchored first, so
    /// a parent window that moved since the last resolution is re-located
    /// before its children search inside it.
    pub fn anchor(
        &mut self,
        matcher: &dyn TemplateMatcher,
        clock: &dyn Clock,
        timeout: Duration,
        poll_interval: Duration,
    ) -> Result<Region> {
        if poll_interval.is_zero() {
            return Err(Error::InvalidInput("poll interval must be > 0".to_string()));
        }
        self.find_count += 1;
        if let Some(parent) = &mut self.parent {
            if parent.find_count < self.find_count {
                parent.anchor(matcher, clock, timeout, poll_interval)?;
            }
        }
        let search = self.parent.as_ref().and_then(|parent| parent.resolved);

        let mut wait = Wait::new(clock, timeout, poll_interval);
        let found = loop {
            if let Some(found) = matcher.find(&self.anchor, search.as_ref())? {
                break found;
            }
            if wait.tick().is_err() {
                return Err(Error::Timeout {
                    detail: format!(
                        "anchor image '{}' of region '{}' not found",
                        self.anchor.name(),
                        self.name
                    ),
                    waited_ms: wait.waited_ms(),
                });
            }
        };

        let region = match self.size {
            Some((width, height)) => Region::new(
                found.region.x - self.offset_x,
                found.region.y - self.offset_y,
                width,
                height,
            ),
            None => found.region,
        };
        debug!(
            name = self.name.as_str(),
            region = ?region,
            find_count = self.find_count,
            "anchored region resolved"
        );
        self.resolved = Some(region);
        Ok(region)
    }

    /// Whether the anchor image is currently displayed.
    ///
    /// Searched within the parent's resolved region, if there is one.
    pub fn is_displayed(&self, matcher: &dyn TemplateMatcher) -> Result<bool> {
        let search = self.parent.as_ref().and_then(|parent| parent.resolved);
        Ok(matcher.find(&self.anchor, search.as_ref())?.is_some())
    }

    /// Poll until the anchor image appears (or, with `displayed` false,
    /// vanishes).
    pub fn wait_until_displayed(
        &self,
        matcher: &dyn TemplateMatcher,
        clock: &dyn Clock,
        timeout: Duration,
        poll_interval: Duration,
        displayed: bool,
    ) -> Result<()> {
        validate_wait(timeout, poll_interval)?;
        let mut wait = Wait::new(clock, timeout, poll_interval);
        loop {
            if self.is_displayed(matcher)? == displayed {
                return Ok(());
            }
            if wait.tick().is_err() {
                let detail = if displayed {
                    format!("anchor image of region '{}' not found", self.name)
                } else {
                    format!("anchor image of region '{}' still displayed", self.name)
                };
                return Err(Error::Timeout {
                    detail,
                    waited_ms: wait.waited_ms(),
                });
            }
        }
    }
}
