//! Rows and columns of checkboxes and radio buttons.
//!
//! Checkable elements all look alike, so they cannot be told apart by
//! per-element templates. Instead the checked and unchecked appearance
//! each get a template pool; every match of either pool is clustered into
//! distinct on-screen elements, and an element's state is whichever pool
//! scored higher at its location.

use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use lookout_core::{
    Clock, DetectionSettings, Error, Region, Result, SortOrder, TemplateImage, Wait,
};

use lookout_assets::CheckablePool;

use crate::matcher::{ScreenDriver, TemplateMatcher};

/// Matches closer than this are considered the same element.
///
/// Looser than the usual same-region threshold: checked and unchecked
/// templates of one element often differ slightly in size.
const CLUSTER_OVERLAP: f64 = 0.5;

/// Fraction of an element's size added around it when re-probing.
const REPROBE_MARGIN_FRACTION: f64 = 0.2;

/// Definition of a row or column of checkable elements.
#[derive(Debug, Clone)]
pub struct CheckableSpec {
    /// Images of a checked element
    pub checked: Vec<TemplateImage>,
    /// Images of an unchecked element
    pub unchecked: Vec<TemplateImage>,
    /// Order in which located elements are indexed
    pub orientation: SortOrder,
    /// At most one element may be checked
    pub radio: bool,
    /// Verify on screen that clicks had their expected effect
    pub auto_verify: bool,
    /// How long a click verification may poll
    pub verify_timeout: Duration,
}

impl CheckableSpec {
    /// A column of checkboxes.
    pub fn checkboxes(checked: Vec<TemplateImage>, unchecked: Vec<TemplateImage>) -> Self {
        Self {
            checked,
            unchecked,
            orientation: SortOrder::vertical(),
            radio: false,
            auto_verify: false,
            verify_timeout: Duration::from_secs(3),
        }
    }

    /// A column of radio buttons.
    pub fn radio_buttons(checked: Vec<TemplateImage>, unchecked: Vec<TemplateImage>) -> Self {
        Self {
            radio: true,
            ..Self::checkboxes(checked, unchecked)
        }
    }

    /// Build from a grouped template pool.
    pub fn from_pool(pool: CheckablePool, radio: bool) -> Self {
        let base = Self::checkboxes(pool.checked, pool.unchecked);
        Self { radio, ..base }
    }

    /// Set the element indexing order.
    pub fn with_orientation(mut self, orientation: SortOrder) -> Self {
        self.orientation = orientation;
        self
    }

    /// Verify every click on screen, polling up to the given timeout.
    pub fn with_auto_verify(mut self, verify_timeout: Duration) -> Self {
        self.auto_verify = true;
        self.verify_timeout = verify_timeout;
        self
    }

    pub(crate) fn kind(&self) -> &'static str {
        if self.radio {
            "radio button"
        } else {
            "checkbox"
        }
    }

    pub(crate) fn kinds(&self) -> &'static str {
        if self.radio {
            "radio buttons"
        } else {
            "checkboxes"
        }
    }

    pub(crate) fn validate(&self) -> Result<()> {
        for (label, pool) in [("checked", &self.checked), ("unchecked", &self.unchecked)] {
            if pool.is_empty() {
                return Err(Error::InvalidTemplateSet {
                    element: self.kinds().to_string(),
                    detail: format!("state '{label}' has no templates"),
                });
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy)]
struct Item {
    region: Region,
    checked_score: f64,
    unchecked_score: f64,
}

impl Item {
    fn is_checked(&self) -> bool {
        self.checked_score > self.unchecked_score
    }
}

/// A located row or column of checkboxes or radio buttons.
///
/// Created through
/// [`ElementStateDetector::checkable`](crate::ElementStateDetector::checkable);
/// call [`locate`](Self::locate) before anything else. Element indexes are
/// 0-based in the configured orientation.
pub struct CheckableList {
    spec: CheckableSpec,
    matcher: Arc<dyn TemplateMatcher>,
    driver: Arc<dyn ScreenDriver>,
    clock: Arc<dyn Clock>,
    settings: DetectionSettings,
    region: Option<Region>,
    items: Vec<Item>,
}

impl CheckableList {
    pub(crate) fn new(
        spec: CheckableSpec,
        matcher: Arc<dyn TemplateMatcher>,
        driver: Arc<dyn ScreenDriver>,
        clock: Arc<dyn Clock>,
        settings: DetectionSettings,
    ) -> Result<Self> {
        spec.validate()?;
        Ok(Self {
            spec,
            matcher,
            driver,
            clock,
            settings,
            region: None,
            items: Vec::new(),
        })
    }

    /// Find the elements of this list in the region.
    ///
    /// Clusters every match of both template pools into distinct elements,
    /// keeping the best score per pool per element, and orders them by the
    /// configured orientation. Fails with [`Error::ElementNotFound`] when
    /// nothing is found, and with [`Error::RadioConflict`] when a radio
    /// list has more than one checked element.
    pub fn locate(&mut self, region: Option<&Region>) -> Result<usize> {
        self.region = region.copied();
        let mut items: Vec<Item> = Vec::new();

        for (checked, templates) in [(true, &self.spec.checked), (false, &self.spec.unchecked)] {
            for template in templates {
                for found in self.matcher.find_all(template, region)? {
                    match items
                        .iter_mut()
                        .find(|item| item.region.same_region(&found.region, CLUSTER_OVERLAP))
                    {
                        Some(item) => {
                            let slot = if checked {
                                &mut item.checked_score
                            } else {
                                &mut item.unchecked_score
                            };
                            if found.score > *slot {
                                *slot = found.score;
                            }
                        }
                        None => items.push(Item {
                            region: found.region,
                            checked_score: if checked { found.score } else { 0.0 },
                            unchecked_score: if checked { 0.0 } else { found.score },
                        }),
                    }
                }
            }
        }

        if items.is_empty() {
            return Err(Error::ElementNotFound(format!(
                "no {} found",
                self.spec.kinds()
            )));
        }
        items.sort_by(|a, b| self.spec.orientation.compare(&a.region, &b.region));
        self.items = items;

        let checked = self.checked_indices();
        info!(
            kind = self.spec.kind(),
            found = self.items.len(),
            checked = ?checked,
            "checkable list located"
        );
        if self.spec.radio && checked.len() > 1 {
            return Err(Error::RadioConflict(checked.len()));
        }
        Ok(self.items.len())
    }

    /// Number of located elements.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether no elements have been located.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// The regions of the located elements, in index order.
    pub fn regions(&self) -> Vec<Region> {
        self.items.iter().map(|item| item.region).collect()
    }

    fn item(&self, index: usize) -> Result<&Item> {
        self.items.get(index).ok_or_else(|| {
            Error::InvalidInput(format!(
                "{} index {index} out of range ({} located)",
                self.spec.kind(),
                self.items.len()
            ))
        })
    }

    /// Whether the element at the index is checked.
    pub fn is_checked(&self, index: usize) -> Result<bool> {
        Ok(self.item(index)?.is_checked())
    }

    /// Indexes of all checked elements.
    pub fn checked_indices(&self) -> Vec<usize> {
        self.items
            .iter()
            .enumerate()
            .filter(|(_, item)| item.is_checked())
            .map(|(index, _)| index)
            .collect()
    }

    /// Index of the checked element of a radio list, if any.
    pub fn checked_index(&self) -> Result<Option<usize>> {
        if !self.spec.radio {
            return Err(Error::InvalidInput(
                "checked_index is only defined for radio button lists".to_string(),
            ));
        }
        Ok(self.checked_indices().into_iter().next())
    }

    /// Re-probe one element and update its recorded state.
    ///
    /// Probes the element's region grown by a fractional margin, since
    /// checked and unchecked templates may differ slightly in size. Fails
    /// with [`Error::ScoreTie`] when both pools score identically (and
    /// nonzero), and with [`Error::ElementNotFound`] when neither pool
    /// matches at all.
    pub fn refresh(&mut self, index: usize) -> Result<bool> {
        let item = *self.item(index)?;
        let margin_x = (item.region.width as f64 * REPROBE_MARGIN_FRACTION) as u32;
        let margin_y = (item.region.height as f64 * REPROBE_MARGIN_FRACTION) as u32;
        let probe = item.region.extended(margin_y, margin_x, margin_y, margin_x);

        let checked_score = self.best_score(&self.spec.checked, &probe)?;
        let unchecked_score = self.best_score(&self.spec.unchecked, &probe)?;

        if checked_score == 0.0 && unchecked_score == 0.0 {
            return Err(Error::ElementNotFound(format!(
                "no {} found at index {index}",
                self.spec.kind()
            )));
        }
        if checked_score == unchecked_score {
            return Err(Error::ScoreTie {
                detail: format!("{} {index} checked vs unchecked", self.spec.kind()),
                score: checked_score,
            });
        }

        let was_checked = item.is_checked();
        if let Some(stored) = self.items.get_mut(index) {
            stored.checked_score = checked_score;
            stored.unchecked_score = unchecked_score;
            if stored.is_checked() != was_checked {
                info!(
                    kind = self.spec.kind(),
                    index,
                    checked = stored.is_checked(),
                    "element state changed on screen"
                );
            }
        }
        self.is_checked(index)
    }

    fn best_score(&self, templates: &[TemplateImage], region: &Region) -> Result<f64> {
        let mut best = 0.0f64;
        for template in templates {
            if let Some(found) = self.matcher.find(template, Some(region))? {
                if found.score > best {
                    best = found.score;
                }
            }
        }
        Ok(best)
    }

    fn toggle_recorded(&mut self, index: usize) {
        if let Some(item) = self.items.get_mut(index) {
            std::mem::swap(&mut item.checked_score, &mut item.unchecked_score);
            debug!(
                kind = self.spec.kind(),
                index,
                checked = item.is_checked(),
                "recorded state flipped"
            );
        }
    }

    fn click_item(&self, index: usize) -> Result<()> {
        let center = self.item(index)?.region.center();
        info!(
            kind = self.spec.kind(),
            index,
            x = center.x,
            y = center.y,
            "clicking element"
        );
        self.driver.click(center)
    }

    /// Check the element at the index.
    ///
    /// Does nothing when it is already checked; returns whether a click
    /// was performed. On a radio list the previously checked element's
    /// recorded state is cleared.
    pub fn check(&mut self, index: usize) -> Result<bool> {
        if self.is_checked(index)? {
            return Ok(false);
        }
        let previous = if self.spec.radio {
            self.checked_index()?
        } else {
            None
        };

        self.click_item(index)?;
        if self.spec.auto_verify {
            self.wait_checked(index, true, self.spec.verify_timeout)?;
        } else {
            self.toggle_recorded(index);
        }
        // previous != index, since index was unchecked
        if let Some(previous) = previous {
            self.toggle_recorded(previous);
        }
        Ok(true)
    }

    /// Uncheck the element at the index.
    ///
    /// Does nothing when it is not checked; returns whether a click was
    /// performed. Not available on radio lists.
    pub fn uncheck(&mut self, index: usize) -> Result<bool> {
        if self.spec.radio {
            return Err(Error::InvalidInput(
                "cannot uncheck a radio button".to_string(),
            ));
        }
        if !self.is_checked(index)? {
            return Ok(false);
        }
        self.toggle(index)?;
        Ok(true)
    }

    /// Toggle the element at the index, returning its new checked state.
    ///
    /// Not available on radio lists.
    pub fn toggle(&mut self, index: usize) -> Result<bool> {
        if self.spec.radio {
            return Err(Error::InvalidInput(
                "cannot toggle a radio button".to_string(),
            ));
        }
        let expected = !self.is_checked(index)?;
        self.click_item(index)?;
        if self.spec.auto_verify {
            self.wait_checked(index, expected, self.spec.verify_timeout)?;
        } else {
            self.toggle_recorded(index);
        }
        self.is_checked(index)
    }

    /// Check the given elements (all elements when `None`).
    ///
    /// Returns how many changed. Not available on radio lists.
    pub fn check_all(&mut self, indices: Option<&[usize]>) -> Result<usize> {
        if self.spec.radio {
            return Err(Error::InvalidInput(
                "cannot check multiple radio buttons".to_string(),
            ));
        }
        let targets: Vec<usize> = match indices {
            Some(indices) => indices.to_vec(),
            None => (0..self.len()).collect(),
        };
        let mut changed = 0;
        for index in targets {
            if self.check(index)? {
                changed += 1;
            }
        }
        Ok(changed)
    }

    /// Uncheck the given elements (all elements when `None`).
    ///
    /// Returns how many changed. Not available on radio lists.
    pub fn uncheck_all(&mut self, indices: Option<&[usize]>) -> Result<usize> {
        if self.spec.radio {
            return Err(Error::InvalidInput(
                "cannot uncheck radio buttons".to_string(),
            ));
        }
        let targets: Vec<usize> = match indices {
            Some(indices) => indices.to_vec(),
            None => (0..self.len()).collect(),
        };
        let mut changed = 0;
        for index in targets {
            if self.uncheck(index)? {
                changed += 1;
            }
        }
        Ok(changed)
    }

    /// Check exactly the given elements and uncheck every other one.
    ///
    /// Returns how many changed. Not available on radio lists.
    pub fn set_checked(&mut self, indices: &[usize]) -> Result<usize> {
        if self.spec.radio {
            return Err(Error::InvalidInput(
                "cannot check multiple radio buttons".to_string(),
            ));
        }
        let mut changed = 0;
        for index in 0..self.len() {
            let desired = indices.contains(&index);
            if self.is_checked(index)? != desired {
                self.toggle(index)?;
                changed += 1;
            }
        }
        Ok(changed)
    }

    /// Poll until the element reaches the given checked state.
    pub fn wait_checked(&mut self, index: usize, checked: bool, timeout: Duration) -> Result<()> {
        if timeout.is_zero() {
            return Err(Error::InvalidInput("timeout must be > 0".to_string()));
        }
        let interval = self.settings.default_poll_interval().min(timeout);
        info!(
            kind = self.spec.kind(),
            index,
            checked,
            timeout_ms = timeout.as_millis() as u64,
            "waiting for element state"
        );

        let clock = Arc::clone(&self.clock);
        let mut wait = Wait::new(&*clock, timeout, interval);
        loop {
            if self.refresh(index)? == checked {
                return Ok(());
            }
            if wait.tick().is_err() {
                return Err(Error::Timeout {
                    detail: format!(
                        "{} {index} still {}",
                        self.spec.kind(),
                        if checked { "unchecked" } else { "checked" }
                    ),
                    waited_ms: wait.waited_ms(),
                });
            }
        }
    }

    /// Update the recorded state of one element without clicking.
    ///
    /// For when an external event changed the element. Recording a radio
    /// element as checked clears the previously checked one; recording it
    /// as unchecked is allowed.
    pub fn set_recorded_state(&mut self, index: usize, checked: bool) -> Result<()> {
        self.item(index)?;
        if self.spec.radio && checked {
            if let Some(previous) = self.checked_index()? {
                if previous != index {
                    self.toggle_recorded(previous);
                }
            }
        }
        if self.is_checked(index)? != checked {
            self.toggle_recorded(index);
        }
        Ok(())
    }
}
