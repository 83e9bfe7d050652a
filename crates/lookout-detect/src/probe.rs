//! Multi-template probing utilities.
//!
//! Conveniences over a matcher and clock for working with loose templates
//! (splash screens, spinners, popups) that are not registered elements:
//! find whichever of several templates shows up first, wait for one to
//! vanish, or collect matches for a whole set.

use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use lookout_core::{Clock, Error, MatchLocation, Region, Result, TemplateImage, Wait};

use crate::detector::validate_wait;
use crate::matcher::{ScreenDriver, TemplateMatcher};

/// Template probing over a matcher and clock.
///
/// Obtained from
/// [`ElementStateDetector::probe`](crate::ElementStateDetector::probe) or
/// built directly. All operations retry in rounds separated by
/// `poll_interval` until `timeout` of waiting has elapsed; a zero timeout
/// makes a single round.
pub struct Probe {
    matcher: Arc<dyn TemplateMatcher>,
    clock: Arc<dyn Clock>,
}

impl Probe {
    /// Create a probe over the given collaborators.
    pub fn new(matcher: Arc<dyn TemplateMatcher>, clock: Arc<dyn Clock>) -> Self {
        Self { matcher, clock }
    }

    /// Find the first template that appears in the region.
    ///
    /// Templates are tried in the order given within each round; the
    /// first one found wins. Returns its index and match, or `None` when
    /// the timeout elapses.
    pub fn find_any(
        &self,
        templates: &[TemplateImage],
        region: Option<&Region>,
        timeout: Duration,
        poll_interval: Duration,
    ) -> Result<Option<(usize, MatchLocation)>> {
        if poll_interval.is_zero() {
            return Err(Error::InvalidInput("poll interval must be > 0".to_string()));
        }
        let mut wait = Wait::new(&*self.clock, timeout, poll_interval);
        loop {
            for (index, template) in templates.iter().enumerate() {
                if let Some(found) = self.matcher.find(template, region)? {
                    debug!(template = template.name(), score = found.score, "template found");
                    return Ok(Some((index, found)));
                }
            }
            if wait.tick().is_err() {
                return Ok(None);
            }
        }
    }

    /// Like [`find_any`](Self::find_any), but failing on timeout.
    pub fn wait_any(
        &self,
        templates: &[TemplateImage],
        region: Option<&Region>,
        timeout: Duration,
        poll_interval: Duration,
    ) -> Result<(usize, MatchLocation)> {
        self.find_any(templates, region, timeout, poll_interval)?
            .ok_or_else(|| Error::Timeout {
                detail: format!("none of the {} templates found", templates.len()),
                waited_ms: timeout.as_millis() as u64,
            })
    }

    /// Index of the first template that appears, or `None`.
    pub fn exists_any(
        &self,
        templates: &[TemplateImage],
        region: Option<&Region>,
        timeout: Duration,
        poll_interval: Duration,
    ) -> Result<Option<usize>> {
        Ok(self
            .find_any(templates, region, timeout, poll_interval)?
            .map(|(index, _)| index))
    }

    /// Poll until a template is no longer found in the region.
    pub fn wait_while_found(
        &self,
        template: &TemplateImage,
        region: Option<&Region>,
        timeout: Duration,
        poll_interval: Duration,
    ) -> Result<()> {
        validate_wait(timeout, poll_interval)?;
        let mut wait = Wait::new(&*self.clock, timeout, poll_interval);
        loop {
            if self.matcher.find(template, region)?.is_none() {
                return Ok(());
            }
            if wait.tick().is_err() {
                return Err(Error::Timeout {
                    detail: format!("template '{}' still visible", template.name()),
                    waited_ms: wait.waited_ms(),
                });
            }
        }
    }

    /// Find every template, retrying the missing ones each round.
    ///
    /// Returns one entry per template, `None` for templates never found
    /// before the timeout.
    pub fn all_matches(
        &self,
        templates: &[TemplateImage],
        region: Option<&Region>,
        timeout: Duration,
        poll_interval: Duration,
    ) -> Result<Vec<Option<MatchLocation>>> {
        if poll_interval.is_zero() {
            return Err(Error::InvalidInput("poll interval must be > 0".to_string()));
        }
        let mut matches: Vec<Option<MatchLocation>> = vec![None; templates.len()];
        let mut wait = Wait::new(&*self.clock, timeout, poll_interval);
        loop {
            for (index, template) in templates.iter().enumerate() {
                if matches[index].is_none() {
                    matches[index] = self.matcher.find(template, region)?;
                }
            }
            if matches.iter().all(Option::is_some) || wait.tick().is_err() {
                return Ok(matches);
            }
        }
    }

    /// Best score per template, 0.0 for templates never found.
    pub fn all_scores(
        &self,
        templates: &[TemplateImage],
        region: Option<&Region>,
        timeout: Duration,
        poll_interval: Duration,
    ) -> Result<Vec<f64>> {
        Ok(self
            .all_matches(templates, region, timeout, poll_interval)?
            .into_iter()
            .map(|found| found.map_or(0.0, |location| location.score))
            .collect())
    }

    /// Click the first template that appears.
    ///
    /// Returns the index of the clicked template, or `None` when nothing
    /// appeared before the timeout.
    pub fn click_any(
        &self,
        driver: &dyn ScreenDriver,
        templates: &[TemplateImage],
        region: Option<&Region>,
        timeout: Duration,
        poll_interval: Duration,
    ) -> Result<Option<usize>> {
        match self.find_any(templates, region, timeout, poll_interval)? {
            Some((index, found)) => {
                driver.click(found.center())?;
                Ok(Some(index))
            }
            None => Ok(None),
        }
    }

    /// Click at an offset from a template's match center.
    ///
    /// For targets with no recognizable appearance of their own, like a
    /// text field to the right of its label. Returns whether a click was
    /// performed.
    pub fn click_offset(
        &self,
        driver: &dyn ScreenDriver,
        template: &TemplateImage,
        offset_x: i32,
        offset_y: i32,
        region: Option<&Region>,
        timeout: Duration,
        poll_interval: Duration,
    ) -> Result<bool> {
        match self.find_any(std::slice::from_ref(template), region, timeout, poll_interval)? {
            Some((_, found)) => {
                driver.click(found.center().offset(offset_x, offset_y))?;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
