use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use std::sync::Arc;

use lookout_core::{ElementSpec, StateLabel};
use lookout_detect::testing::{location, template, Frame, RecordingDriver, ScriptedMatcher};
use lookout_detect::{best_matches, ElementRegistry, ElementStateDetector, TemplateMatcher};

/// Build a detector over `elements` registered elements, every one of them
/// present on the scripted screen.
fn build_detector(elements: usize) -> ElementStateDetector {
    let mut registry = ElementRegistry::new();
    let mut screen = Frame::new();

    for index in 0..elements {
        let name = format!("element_{index}");
        registry
            .register(
                ElementSpec::builder(name.as_str())
                    .state(
                        StateLabel::enabled(),
                        [
                            template(&format!("button_{name}")),
                            template(&format!("button_{name}_2")),
                        ],
                    )
                    .state(
                        StateLabel::disabled(),
                        [template(&format!("disabled_button_{name}"))],
                    )
                    .clickable_when(StateLabel::enabled())
                    .build()
                    .unwrap(),
            )
            .unwrap();
        screen.insert(
            format!("button_{name}"),
            vec![location(index as i32 * 50, 100, 40, 20, 0.9)],
        );
    }

    let matcher = Arc::new(ScriptedMatcher::single(screen));
    ElementStateDetector::new(Arc::new(registry), matcher, Arc::new(RecordingDriver::new()))
}

fn bench_detect_state(c: &mut Criterion) {
    let mut group = c.benchmark_group("detect_state");

    for elements in [4usize, 16, 64] {
        let detector = build_detector(elements);

        group.bench_with_input(
            BenchmarkId::from_parameter(elements),
            &detector,
            |b, detector| {
                b.iter(|| {
                    let observation = detector
                        .detect_state(black_box("element_0"), None)
                        .unwrap();
                    black_box(observation);
                });
            },
        );
    }

    group.finish();
}

fn bench_group_scan(c: &mut Criterion) {
    let mut group = c.benchmark_group("group_scan");

    for elements in [4usize, 16, 64] {
        let detector = build_detector(elements);
        let names: Vec<String> = (0..elements).map(|index| format!("element_{index}")).collect();
        let mut scan = detector.group(names).unwrap();

        group.bench_with_input(BenchmarkId::from_parameter(elements), &elements, |b, _| {
            b.iter(|| {
                let found = scan.scan(None).unwrap();
                black_box(found);
            });
        });
    }

    group.finish();
}

fn bench_best_matches(c: &mut Criterion) {
    // one template matching at many distinct locations plus near-duplicates
    let mut screen = Frame::new();
    screen.insert(
        "checked_box".to_string(),
        (0..64)
            .map(|index| location(0, index * 30, 20, 20, 0.8))
            .collect(),
    );
    screen.insert(
        "checked_box_2".to_string(),
        (0..64)
            .map(|index| location(1, index * 30, 20, 20, 0.85))
            .collect(),
    );
    let matcher = ScriptedMatcher::single(screen);
    let templates = [template("checked_box"), template("checked_box_2")];

    c.bench_function("best_matches_128", |b| {
        b.iter(|| {
            let matches = best_matches(
                black_box(&matcher as &dyn TemplateMatcher),
                black_box(&templates),
                None,
                0.9,
            )
            .unwrap();
            black_box(matches);
        });
    });
}

criterion_group!(benches, bench_detect_state, bench_group_scan, bench_best_matches);
criterion_main!(benches);
