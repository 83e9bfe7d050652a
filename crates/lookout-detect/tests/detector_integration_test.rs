//! End-to-end detection flow against a scripted screen.
//!
//! Walks a full installer-style automation sequence: wait for a button to
//! enable, click it, wait for the progress phase to pass, then finish.

use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;

use lookout_core::{ElementSpec, Point, StateLabel};
use lookout_detect::testing::{
    frame, location, template, Frame, FrameClock, RecordingDriver, ScriptedMatcher,
};
use lookout_detect::{ElementRegistry, ElementStateDetector};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn installer_registry() -> Result<Arc<ElementRegistry>> {
    let mut registry = ElementRegistry::new();
    registry.register(
        ElementSpec::builder("install")
            .state(StateLabel::enabled(), [template("button_install")])
            .state(StateLabel::disabled(), [template("disabled_button_install")])
            .clickable_when(StateLabel::enabled())
            .build()?,
    )?;
    registry.register(
        ElementSpec::builder("finish")
            .state(StateLabel::enabled(), [template("button_finish")])
            .build()?,
    )?;
    Ok(Arc::new(registry))
}

#[test]
fn installer_flow_end_to_end() -> Result<()> {
    init_tracing();

    // one frame per polling round
    let frames: Vec<Frame> = vec![
        // license page: install not yet clickable
        frame([("disabled_button_install", location(400, 500, 120, 40, 0.88))]),
        frame([("disabled_button_install", location(400, 500, 120, 40, 0.88))]),
        // checkbox ticked by the operator: install enables
        frame([("button_install", location(400, 500, 120, 40, 0.93))]),
        // installing: button gone, spinner showing
        frame([("spinner", location(460, 300, 40, 40, 0.9))]),
        // done
        frame([("button_finish", location(400, 500, 120, 40, 0.94))]),
    ];

    let matcher = Arc::new(ScriptedMatcher::new(frames));
    let clock = Arc::new(FrameClock::new(matcher.cursor()));
    let driver = Arc::new(RecordingDriver::new());
    let detector = ElementStateDetector::new(
        installer_registry()?,
        matcher,
        Arc::clone(&driver) as _,
    )
    .with_clock(Arc::clone(&clock) as _);

    let interval = Duration::from_millis(250);

    // robust wait absorbs the two disabled frames
    let observation = detector.wait_until_state(
        "install",
        &StateLabel::enabled(),
        Duration::from_secs(10),
        Some(interval),
    )?;
    assert!(observation.state.is(&StateLabel::enabled()));

    detector.click("install")?;

    // the button disappears once installation starts
    detector.wait_until_absent("install", Duration::from_secs(10), Some(interval))?;

    // the spinner marks the progress phase; wait for it to clear
    detector.probe().wait_while_found(
        &template("spinner"),
        None,
        Duration::from_secs(10),
        interval,
    )?;

    detector.click("finish")?;

    assert_eq!(
        driver.clicks(),
        vec![Point::new(460, 520), Point::new(460, 520)]
    );
    // 2 polls to enable, 1 to vanish, 1 for the spinner to clear
    assert_eq!(clock.elapsed(), 4 * interval);
    Ok(())
}
