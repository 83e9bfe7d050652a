//! Bulk scanning of element groups within one region.
//!
//! A group scan locates a whole set of registered elements (say, every
//! button of a dialog) in one pass and keeps their observations around, so
//! follow-up state checks only re-probe the immediate surroundings of the
//! previous match instead of the whole region.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use lookout_core::{
    Clock, DetectionSettings, ElementObservation, Error, MatchLocation, ObservedState, Region,
    Result, StateLabel, Wait,
};

use crate::detector::validate_wait;
use crate::matcher::{ScreenDriver, TemplateMatcher};
use crate::registry::ElementRegistry;

/// Scan of a fixed set of registered elements in one region.
///
/// Each element may exist at most once in the region: one element matching
/// at two distinct locations fails the scan with
/// [`Error::DuplicateMatch`]. Matches of different states at the *same*
/// location are resolved by score, since that is exactly how an
/// enabled/disabled pair of templates disambiguates.
pub struct GroupScan {
    registry: Arc<ElementRegistry>,
    matcher: Arc<dyn TemplateMatcher>,
    driver: Arc<dyn ScreenDriver>,
    clock: Arc<dyn Clock>,
    settings: DetectionSettings,
    names: Vec<String>,
    region: Option<Region>,
    observations: BTreeMap<String, ElementObservation>,
}

impl GroupScan {
    pub(crate) fn new(
        registry: Arc<ElementRegistry>,
        matcher: Arc<dyn TemplateMatcher>,
        driver: Arc<dyn ScreenDriver>,
        clock: Arc<dyn Clock>,
        settings: DetectionSettings,
        names: Vec<String>,
    ) -> Result<Self> {
        let mut unique = Vec::with_capacity(names.len());
        for name in names {
            registry.get(&name)?;
            if !unique.contains(&name) {
                unique.push(name);
            }
        }
        Ok(Self {
            registry,
            matcher,
            driver,
            clock,
            settings,
            names: unique,
            region: None,
            observations: BTreeMap::new(),
        })
    }

    /// The element names this group covers.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Locate every element of the group in the region.
    ///
    /// Returns the number of elements found. Elements not on screen are
    /// simply not recorded; an element found at two distinct locations
    /// fails the scan.
    pub fn scan(&mut self, region: Option<&Region>) -> Result<usize> {
        self.region = region.copied();
        self.observations.clear();

        let mut duplicate_names = Vec::new();
        let mut duplicate_regions = Vec::new();
        for name in &self.names {
            let spec = self.registry.get(name)?;
            let found = locate_element(
                &*self.matcher,
                spec.states(),
                region,
                self.settings.min_overlap,
            )?;
            match found.len() {
                0 => {}
                1 => {
                    if let Some((label, location)) = found.into_iter().next() {
                        debug!(element = name.as_str(), state = %label, "element located");
                        self.observations.insert(
                            name.clone(),
                            ElementObservation::new(
                                name.clone(),
                                ObservedState::State(label),
                                Some(location),
                            ),
                        );
                    }
                }
                _ => {
                    duplicate_names.push(name.clone());
                    duplicate_regions
                        .extend(found.into_iter().map(|(_, location)| location.region));
                }
            }
        }

        if !duplicate_names.is_empty() {
            return Err(Error::DuplicateMatch {
                what: format!("element(s) {}", duplicate_names.join(", ")),
                regions: duplicate_regions,
            });
        }

        info!(
            found = self.observations.len(),
            declared = self.names.len(),
            "group scan complete"
        );
        Ok(self.observations.len())
    }

    /// Number of elements found by the last scan.
    pub fn found_count(&self) -> usize {
        self.observations.len()
    }

    /// Names of the elements found by the last scan, in sorted order.
    pub fn found_names(&self) -> Vec<&str> {
        self.observations.keys().map(String::as_str).collect()
    }

    /// Whether the element was found by the last scan.
    pub fn exists(&self, name: &str) -> bool {
        self.observations
            .get(name)
            .map_or(false, |observation| !observation.state.is_absent())
    }

    /// The recorded observation of an element, if it was found.
    pub fn observation(&self, name: &str) -> Option<&ElementObservation> {
        self.observations.get(name)
    }

    /// The recorded state of an element, if it was found.
    pub fn state_of(&self, name: &str) -> Option<&ObservedState> {
        self.observations.get(name).map(|observation| &observation.state)
    }

    /// Whether every found element is in the given state.
    pub fn all_in_state(&self, label: &StateLabel) -> bool {
        self.observations
            .values()
            .all(|observation| observation.state.is(label))
    }

    /// Re-probe one element near its previously recorded location.
    ///
    /// The probe region is the previous match grown by the configured
    /// margin, so a state flip of the same on-screen element is picked up
    /// without rescanning the whole region.
    pub fn refresh(&mut self, name: &str) -> Result<ElementObservation> {
        let spec = self.registry.get(name)?;
        let previous = self.observations.get(name).ok_or_else(|| {
            Error::ElementNotFound(format!("'{name}' was not found in the last scan"))
        })?;
        let probe_region = previous
            .location
            .map(|location| location.region.nearby(self.settings.reprobe_margin_px))
            .or(self.region);

        let found = locate_element(
            &*self.matcher,
            spec.states(),
            probe_region.as_ref(),
            self.settings.min_overlap,
        )?;
        let observation = match found.len() {
            0 => ElementObservation::absent(name),
            1 => match found.into_iter().next() {
                Some((label, location)) => ElementObservation::new(
                    name,
                    ObservedState::State(label),
                    Some(location),
                ),
                None => ElementObservation::absent(name),
            },
            _ => {
                return Err(Error::DuplicateMatch {
                    what: format!("element '{name}'"),
                    regions: found.into_iter().map(|(_, location)| location.region).collect(),
                })
            }
        };

        debug!(element = name, state = %observation.state, "element refreshed");
        self.observations.insert(name.to_string(), observation.clone());
        Ok(observation)
    }

    /// Poll until one element of the group reaches the target state.
    pub fn wait_until_state(
        &mut self,
        name: &str,
        target: &StateLabel,
        timeout: Duration,
        poll_interval: Option<Duration>,
    ) -> Result<ElementObservation> {
        let interval = poll_interval.unwrap_or_else(|| self.settings.default_poll_interval());
        validate_wait(timeout, interval)?;
        info!(element = name, target = %target, "waiting for group element state");

        let clock = Arc::clone(&self.clock);
        let mut wait = Wait::new(&*clock, timeout, interval);
        loop {
            let current = self.observations.get(name).cloned().ok_or_else(|| {
                Error::ElementNotFound(format!("'{name}' was not found in the last scan"))
            })?;
            if current.state.is(target) {
                return Ok(current);
            }
            if wait.tick().is_err() {
                return Err(Error::WaitTimeout {
                    element: name.to_string(),
                    target: ObservedState::State(target.clone()),
                    waited_ms: wait.waited_ms(),
                    last: current,
                });
            }
            self.refresh(name)?;
        }
    }

    /// Poll until every found element of the group is in the target state.
    pub fn wait_until_all(
        &mut self,
        target: &StateLabel,
        timeout: Duration,
        poll_interval: Option<Duration>,
    ) -> Result<()> {
        let interval = poll_interval.unwrap_or_else(|| self.settings.default_poll_interval());
        validate_wait(timeout, interval)?;
        info!(target = %target, "waiting for all group elements");

        let clock = Arc::clone(&self.clock);
        let mut wait = Wait::new(&*clock, timeout, interval);
        loop {
            if self.all_in_state(target) {
                return Ok(());
            }
            if wait.tick().is_err() {
                return Err(Error::Timeout {
                    detail: format!("some group elements still not {target}"),
                    waited_ms: wait.waited_ms(),
                });
            }
            let names: Vec<String> = self.observations.keys().cloned().collect();
            for name in names {
                self.refresh(&name)?;
            }
        }
    }

    /// Click an element at its recorded location.
    ///
    /// Uses the observation from the last scan or refresh; fails when the
    /// element was not found or its recorded state does not accept clicks.
    pub fn click(&self, name: &str) -> Result<()> {
        let spec = self.registry.get(name)?;
        let observation = self.observations.get(name).ok_or_else(|| {
            Error::ElementNotFound(format!("'{name}' was not found in the last scan"))
        })?;

        let ObservedState::State(label) = &observation.state else {
            return Err(Error::ElementNotFound(format!("'{name}' is not on screen")));
        };
        if !spec.is_clickable(label) {
            return Err(Error::ElementNotFound(format!(
                "'{name}' is {label}, which is not clickable"
            )));
        }
        let target = observation
            .location
            .map(|location| location.center())
            .ok_or_else(|| Error::Matcher(format!("match for '{name}' carried no location")))?;

        info!(element = name, x = target.x, y = target.y, "clicking group element");
        self.driver.click(target)
    }
}

/// Best match per distinct location across every state of an element.
fn locate_element<'a, I>(
    matcher: &dyn TemplateMatcher,
    states: I,
    region: Option<&Region>,
    min_overlap: f64,
) -> Result<Vec<(StateLabel, MatchLocation)>>
where
    I: IntoIterator<Item = (&'a StateLabel, &'a [lookout_core::TemplateImage])>,
{
    let mut found: Vec<(StateLabel, MatchLocation)> = Vec::new();
    for (label, templates) in states {
        for template in templates {
            for location in matcher.find_all(template, region)? {
                match found
                    .iter_mut()
                    .find(|(_, kept)| kept.region.same_region(&location.region, min_overlap))
                {
                    Some(entry) => {
                        if location.score > entry.1.score {
                            *entry = (label.clone(), location);
                        }
                    }
                    None => found.push((label.clone(), location)),
                }
            }
        }
    }
    Ok(found)
}
