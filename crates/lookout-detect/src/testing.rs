//! Test doubles for the detection engine.
//!
//! Used by this crate's own tests and benchmarks, and public so downstream
//! automation code can exercise its flows without a real screen: a
//! scripted matcher plays back prepared screen states, a frame clock
//! advances them in step with polling sleeps, and a recording driver
//! captures synthesized input.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use lookout_core::{Clock, ManualClock, MatchLocation, Point, Region, Result, TemplateImage};

use crate::matcher::{ScreenDriver, TemplateMatcher};

/// One screen state: template name to its matches.
pub type Frame = HashMap<String, Vec<MatchLocation>>;

/// Build a frame with a single match per template.
pub fn frame<'a, I>(entries: I) -> Frame
where
    I: IntoIterator<Item = (&'a str, MatchLocation)>,
{
    entries
        .into_iter()
        .map(|(name, location)| (name.to_string(), vec![location]))
        .collect()
}

/// A template reference for tests, path derived from the name.
pub fn template(name: &str) -> TemplateImage {
    TemplateImage::new(name, format!("/templates/{name}.png"))
}

/// A match location for tests.
pub fn location(x: i32, y: i32, width: u32, height: u32, score: f64) -> MatchLocation {
    MatchLocation::new(Region::new(x, y, width, height), score)
}

/// Matcher that plays back a sequence of prepared frames.
///
/// The frame cursor never advances on its own: call [`advance`] from the
/// test, or share the [`cursor`] with a [`FrameClock`] so each polling
/// sleep moves to the next frame. The last frame repeats once the script
/// is exhausted. Search regions are honored by requiring a match's center
/// to lie inside the region.
///
/// [`advance`]: ScriptedMatcher::advance
/// [`cursor`]: ScriptedMatcher::cursor
#[derive(Debug)]
pub struct ScriptedMatcher {
    frames: Vec<Frame>,
    cursor: Arc<AtomicUsize>,
}

impl ScriptedMatcher {
    /// Create a matcher playing back the given frames.
    pub fn new(frames: Vec<Frame>) -> Self {
        Self {
            frames,
            cursor: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Create a matcher with one constant frame.
    pub fn single(frame: Frame) -> Self {
        Self::new(vec![frame])
    }

    /// The shared frame cursor.
    pub fn cursor(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.cursor)
    }

    /// Move to the next frame.
    pub fn advance(&self) {
        self.cursor.fetch_add(1, Ordering::SeqCst);
    }

    fn current(&self) -> Option<&Frame> {
        if self.frames.is_empty() {
            return None;
        }
        let index = self
            .cursor
            .load(Ordering::SeqCst)
            .min(self.frames.len() - 1);
        Some(&self.frames[index])
    }

    fn matches_in(&self, template: &TemplateImage, region: Option<&Region>) -> Vec<MatchLocation> {
        let Some(frame) = self.current() else {
            return Vec::new();
        };
        frame
            .get(template.name())
            .map(|matches| {
                matches
                    .iter()
                    .filter(|m| region.map_or(true, |r| r.contains(&m.region.center())))
                    .copied()
                    .collect()
            })
            .unwrap_or_default()
    }
}

impl TemplateMatcher for ScriptedMatcher {
    fn find(
        &self,
        template: &TemplateImage,
        region: Option<&Region>,
    ) -> Result<Option<MatchLocation>> {
        Ok(self
            .matches_in(template, region)
            .into_iter()
            .max_by(|a, b| a.score.total_cmp(&b.score)))
    }

    fn find_all(
        &self,
        template: &TemplateImage,
        region: Option<&Region>,
    ) -> Result<Vec<MatchLocation>> {
        Ok(self.matches_in(template, region))
    }
}

/// Deterministic clock that advances a shared frame cursor on every sleep.
///
/// Pair with a [`ScriptedMatcher`] to script "the screen changed after k
/// polls" scenarios.
#[derive(Debug)]
pub struct FrameClock {
    inner: ManualClock,
    cursor: Arc<AtomicUsize>,
}

impl FrameClock {
    /// Create a frame clock driving the given cursor.
    pub fn new(cursor: Arc<AtomicUsize>) -> Self {
        Self {
            inner: ManualClock::new(),
            cursor,
        }
    }

    /// Total virtual time slept.
    pub fn elapsed(&self) -> Duration {
        self.inner.elapsed()
    }
}

impl Clock for FrameClock {
    fn now(&self) -> Instant {
        self.inner.now()
    }

    fn sleep(&self, duration: Duration) {
        self.inner.sleep(duration);
        self.cursor.fetch_add(1, Ordering::SeqCst);
    }
}

/// Driver that records synthesized input instead of performing it.
#[derive(Debug, Default)]
pub struct RecordingDriver {
    clicks: Mutex<Vec<Point>>,
    typed: Mutex<Vec<String>>,
}

impl RecordingDriver {
    /// Create a new recording driver.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every click performed, in order.
    pub fn clicks(&self) -> Vec<Point> {
        self.clicks.lock().expect("driver lock poisoned").clone()
    }

    /// Every key sequence typed, in order.
    pub fn typed(&self) -> Vec<String> {
        self.typed.lock().expect("driver lock poisoned").clone()
    }
}

impl ScreenDriver for RecordingDriver {
    fn click(&self, point: Point) -> Result<()> {
        self.clicks.lock().expect("driver lock poisoned").push(point);
        Ok(())
    }

    fn type_text(&self, text: &str) -> Result<()> {
        self.typed
            .lock()
            .expect("driver lock poisoned")
            .push(text.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scripted_matcher_plays_frames() {
        let matcher = ScriptedMatcher::new(vec![
            frame([("spinner", location(0, 0, 20, 20, 0.9))]),
            frame([("done", location(0, 0, 20, 20, 0.95))]),
        ]);
        let spinner = template("spinner");
        let done = template("done");

        assert!(matcher.find(&spinner, None).unwrap().is_some());
        assert!(matcher.find(&done, None).unwrap().is_none());

        matcher.advance();
        assert!(matcher.find(&spinner, None).unwrap().is_none());
        assert!(matcher.find(&done, None).unwrap().is_some());

        // last frame repeats
        matcher.advance();
        assert!(matcher.find(&done, None).unwrap().is_some());
    }

    #[test]
    fn test_scripted_matcher_honors_region() {
        let matcher = ScriptedMatcher::single(frame([("ok", location(100, 100, 20, 20, 0.9))]));
        let ok = template("ok");

        let around = Region::new(90, 90, 40, 40);
        let elsewhere = Region::new(0, 0, 50, 50);

        assert!(matcher.find(&ok, Some(&around)).unwrap().is_some());
        assert!(matcher.find(&ok, Some(&elsewhere)).unwrap().is_none());
    }

    #[test]
    fn test_scripted_matcher_find_returns_best_score() {
        let mut screen = Frame::new();
        screen.insert(
            "ok".to_string(),
            vec![
                location(0, 0, 20, 20, 0.7),
                location(100, 0, 20, 20, 0.95),
            ],
        );
        let matcher = ScriptedMatcher::single(screen);

        let best = matcher.find(&template("ok"), None).unwrap().unwrap();
        assert!((best.score - 0.95).abs() < f64::EPSILON);
        assert_eq!(matcher.find_all(&template("ok"), None).unwrap().len(), 2);
    }

    #[test]
    fn test_frame_clock_advances_cursor_on_sleep() {
        let matcher = ScriptedMatcher::new(vec![
            frame([("spinner", location(0, 0, 20, 20, 0.9))]),
            Frame::new(),
        ]);
        let clock = FrameClock::new(matcher.cursor());

        assert!(matcher.find(&template("spinner"), None).unwrap().is_some());
        clock.sleep(Duration::from_millis(500));
        assert!(matcher.find(&template("spinner"), None).unwrap().is_none());
        assert_eq!(clock.elapsed(), Duration::from_millis(500));
    }

    #[test]
    fn test_recording_driver() {
        let driver = RecordingDriver::new();
        driver.click(Point::new(10, 20)).unwrap();
        driver.type_text("hello").unwrap();

        assert_eq!(driver.clicks(), vec![Point::new(10, 20)]);
        assert_eq!(driver.typed(), vec!["hello".to_string()]);
    }
}
