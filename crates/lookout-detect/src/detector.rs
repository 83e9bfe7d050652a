//! Element-state classification and polling waits.

use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use lookout_core::{
    Clock, DetectionSettings, ElementObservation, Error, MatchLocation, ObservedState, Region,
    Result, StateLabel, SystemClock, Wait,
};

use crate::checkable::{CheckableList, CheckableSpec};
use crate::group::GroupScan;
use crate::matcher::{ScreenDriver, TemplateMatcher};
use crate::probe::Probe;
use crate::registry::ElementRegistry;

pub(crate) fn validate_wait(timeout: Duration, interval: Duration) -> Result<()> {
    if timeout.is_zero() {
        return Err(Error::InvalidInput("timeout must be > 0".to_string()));
    }
    if interval.is_zero() {
        return Err(Error::InvalidInput("poll interval must be > 0".to_string()));
    }
    if interval > timeout {
        return Err(Error::InvalidInput(
            "poll interval must not exceed timeout".to_string(),
        ));
    }
    Ok(())
}

/// Classifies the state of registered elements and waits for state changes.
///
/// Classification is instantaneous and deterministic for a given snapshot;
/// the wait operations add temporal robustness on top by polling through
/// rendering delays, animations and redraws. This separation is the core
/// design of the library.
pub struct ElementStateDetector {
    registry: Arc<ElementRegistry>,
    matcher: Arc<dyn TemplateMatcher>,
    driver: Arc<dyn ScreenDriver>,
    clock: Arc<dyn Clock>,
    settings: DetectionSettings,
}

impl ElementStateDetector {
    /// Create a detector over a registry and the external collaborators.
    ///
    /// Uses the system clock and default detection settings; override with
    /// [`with_clock`](Self::with_clock) and
    /// [`with_settings`](Self::with_settings).
    pub fn new(
        registry: Arc<ElementRegistry>,
        matcher: Arc<dyn TemplateMatcher>,
        driver: Arc<dyn ScreenDriver>,
    ) -> Self {
        Self {
            registry,
            matcher,
            driver,
            clock: Arc::new(SystemClock),
            settings: DetectionSettings::default(),
        }
    }

    /// Replace the clock used for polling sleeps.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Replace the detection settings.
    pub fn with_settings(mut self, settings: DetectionSettings) -> Self {
        self.settings = settings;
        self
    }

    /// The element registry this detector reads.
    pub fn registry(&self) -> &ElementRegistry {
        &self.registry
    }

    /// The detection settings in effect, including the default timeout
    /// and polling interval.
    pub fn settings(&self) -> &DetectionSettings {
        &self.settings
    }

    /// Classify the current state of an element.
    ///
    /// A state counts as matched when at least one of its templates is
    /// found in the search region (whole screen when `None`). No state
    /// matched classifies as absent. Templates of two or more states
    /// matching at once is a template-set defect and fails with
    /// [`Error::AmbiguousState`] instead of guessing.
    pub fn detect_state(
        &self,
        name: &str,
        region: Option<&Region>,
    ) -> Result<ElementObservation> {
        let spec = self.registry.get(name)?;
        let mut matched: Vec<(StateLabel, MatchLocation)> = Vec::new();
        for (label, templates) in spec.states() {
            let mut best: Option<MatchLocation> = None;
            for template in templates {
                if let Some(found) = self.matcher.find(template, region)? {
                    debug!(
                        element = name,
                        state = %label,
                        template = template.name(),
                        score = found.score,
                        "template matched"
                    );
                    if best.map_or(true, |kept| found.score > kept.score) {
                        best = Some(found);
                    }
                }
            }
            if let Some(found) = best {
                matched.push((label.clone(), found));
            }
        }

        match matched.len() {
            0 => {
                debug!(element = name, "no state matched");
                Ok(ElementObservation::absent(name))
            }
            1 => {
                let (label, found) = matched.swap_remove(0);
                debug!(element = name, state = %label, "state classified");
                Ok(ElementObservation::new(
                    name,
                    ObservedState::State(label),
                    Some(found),
                ))
            }
            _ => Err(Error::AmbiguousState {
                element: name.to_string(),
                states: matched.into_iter().map(|(label, _)| label).collect(),
            }),
        }
    }

    /// Whether the element is currently on screen in any state.
    pub fn exists(&self, name: &str) -> Result<bool> {
        Ok(!self.detect_state(name, None)?.state.is_absent())
    }

    /// Poll until the element reaches the target state.
    ///
    /// Polls [`detect_state`](Self::detect_state) every `poll_interval`
    /// (the configured default when `None`) until the target state is
    /// observed or `timeout` of waiting has elapsed, then fails with
    /// [`Error::WaitTimeout`] carrying the last observation. An ambiguous
    /// classification aborts the wait immediately: it is a configuration
    /// defect, not a transient condition.
    pub fn wait_until_state(
        &self,
        name: &str,
        target: &StateLabel,
        timeout: Duration,
        poll_interval: Option<Duration>,
    ) -> Result<ElementObservation> {
        self.wait_until(name, ObservedState::State(target.clone()), timeout, poll_interval)
    }

    /// Poll until the element is no longer on screen in any state.
    pub fn wait_until_absent(
        &self,
        name: &str,
        timeout: Duration,
        poll_interval: Option<Duration>,
    ) -> Result<ElementObservation> {
        self.wait_until(name, ObservedState::Absent, timeout, poll_interval)
    }

    fn wait_until(
        &self,
        name: &str,
        target: ObservedState,
        timeout: Duration,
        poll_interval: Option<Duration>,
    ) -> Result<ElementObservation> {
        let interval = poll_interval.unwrap_or_else(|| self.settings.default_poll_interval());
        validate_wait(timeout, interval)?;
        info!(
            element = name,
            target = %target,
            timeout_ms = timeout.as_millis() as u64,
            "waiting for element state"
        );

        let mut wait = Wait::new(&*self.clock, timeout, interval);
        loop {
            let observation = self.detect_state(name, None)?;
            if observation.state == target {
                info!(
                    element = name,
                    target = %target,
                    waited_ms = wait.waited_ms(),
                    "element reached state"
                );
                return Ok(observation);
            }
            if wait.tick().is_err() {
                return Err(Error::WaitTimeout {
                    element: name.to_string(),
                    target,
                    waited_ms: wait.waited_ms(),
                    last: observation,
                });
            }
        }
    }

    /// Detect the element and click it.
    ///
    /// Fails with [`Error::ElementNotFound`] when the element is absent or
    /// its observed state does not accept clicks (a disabled button, for
    /// example). Returns the observation the click was based on.
    pub fn click(&self, name: &str) -> Result<ElementObservation> {
        let spec = self.registry.get(name)?;
        let observation = self.detect_state(name, None)?;

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

        info!(element = name, x = target.x, y = target.y, "clicking element");
        self.driver.click(target)?;
        Ok(observation)
    }

    /// A probe sharing this detector's matcher and clock.
    pub fn probe(&self) -> Probe {
        Probe::new(Arc::clone(&self.matcher), Arc::clone(&self.clock))
    }

    /// A group scan over the given registered elements.
    pub fn group<I, S>(&self, names: I) -> Result<GroupScan>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        GroupScan::new(
            Arc::clone(&self.registry),
            Arc::clone(&self.matcher),
            Arc::clone(&self.driver),
            Arc::clone(&self.clock),
            self.settings.clone(),
            names.into_iter().map(Into::into).collect(),
        )
    }

    /// A checkable list sharing this detector's collaborators.
    pub fn checkable(&self, spec: CheckableSpec) -> Result<CheckableList> {
        CheckableList::new(
            spec,
            Arc::clone(&self.matcher),
            Arc::clone(&self.driver),
            Arc::clone(&self.clock),
            self.settings.clone(),
        )
    }
}
