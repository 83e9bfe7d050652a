//! Collaborator traits for the external automation engine.
//!
//! The detection core consumes two capabilities it never implements:
//! locating template images on the screen, and synthesizing input. Both
//! are behind object-safe traits so any image-recognition engine can be
//! plugged in.

use lookout_core::{MatchLocation, Point, Region, Result, TemplateImage};

/// Locates template images on the screen.
///
/// Confidence thresholds, multi-scale search and capture mechanics are the
/// implementation's concern; the core only consumes match locations. A
/// `region` of `None` means the whole screen.
pub trait TemplateMatcher: Send + Sync {
    /// Find the best match of a template, if any.
    fn find(
        &self,
        template: &TemplateImage,
        region: Option<&Region>,
    ) -> Result<Option<MatchLocation>>;

    /// Find every match of a template.
    ///
    /// The default forwards to [`find`](Self::find), for engines that only
    /// report a single best match.
    fn find_all(
        &self,
        template: &TemplateImage,
        region: Option<&Region>,
    ) -> Result<Vec<MatchLocation>> {
        Ok(self.find(template, region)?.into_iter().collect())
    }
}

/// Synthesizes input at screen locations.
pub trait ScreenDriver: Send + Sync {
    /// Click at a screen point.
    fn click(&self, point: Point) -> Result<()>;

    /// Type a key sequence into the focused element.
    fn type_text(&self, text: &str) -> Result<()>;

    /// Type the same key sequence several times.
    fn type_repeated(&self, text: &str, repeat: usize) -> Result<()> {
        for _ in 0..repeat {
            self.type_text(text)?;
        }
        Ok(())
    }
}
