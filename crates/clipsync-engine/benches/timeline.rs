//! Timeline Benchmarks
//!
//! Measures the full per-clip pipeline and its heaviest stages on synthetic
//! input.
//!
//! # Running Benchmarks
//! ```bash
//! cargo bench --package clipsync-engine --bench timeline
//! ```

use clipsync_engine::{
    build_timeline, CaptionTimelineBuilder, CropTrajectoryPlanner, DetectionIngest, EngineConfig,
    SubjectTracker,
};
use clipsync_models::{BoundingBox, ClipInput, Frame, RawDetection, RawFrame, SourceGeometry, Word};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::time::Duration;

/// Two people drifting across the frame with a confidence dip every so often.
fn synthetic_frames(count: u64) -> Vec<RawFrame> {
    (0..count)
        .map(|i| {
            let t = i as f64 * 0.1;
            let drift = (t * 0.3).sin() * 0.2;
            let dip = if i % 17 == 0 { 0.3 } else { 0.9 };
            RawFrame::new(
                i,
                t,
                vec![
                    RawDetection::new(BoundingBox::new(0.2 + drift, 0.2, 0.15, 0.6), dip),
                    RawDetection::new(BoundingBox::new(0.6 - drift, 0.25, 0.12, 0.5), 0.8),
                ],
            )
        })
        .collect()
}

fn synthetic_words(count: usize) -> Vec<Word> {
    (0..count)
        .map(|i| {
            let start = i as f64 * 0.35;
            let pause = if i % 9 == 8 { 0.7 } else { 0.0 };
            Word::new(format!("word{i}"), start + pause, start + pause + 0.3)
        })
        .collect()
}

fn bench_full_pipeline(c: &mut Criterion) {
    let mut group = c.benchmark_group("build_timeline");
    group.warm_up_time(Duration::from_secs(1));
    group.measurement_time(Duration::from_secs(3));

    let config = EngineConfig::default();
    for &frames in &[300u64, 1800, 9000] {
        let clip = ClipInput::new(
            SourceGeometry::hd_1080p(10.0),
            synthetic_frames(frames),
            synthetic_words((frames / 3) as usize),
        );
        group.throughput(Throughput::Elements(frames));
        group.bench_with_input(BenchmarkId::from_parameter(frames), &clip, |b, clip| {
            b.iter(|| build_timeline(black_box(clip), &config))
        });
    }
    group.finish();
}

fn bench_planner(c: &mut Criterion) {
    let mut group = c.benchmark_group("planner");
    group.warm_up_time(Duration::from_secs(1));
    group.measurement_time(Duration::from_secs(3));

    let config = EngineConfig::default();
    let geometry = SourceGeometry::hd_1080p(10.0);
    let ingest = DetectionIngest::new(&config, &geometry)
        .ingest(&synthetic_frames(1800))
        .expect("synthetic frames are well formed");
    let subjects = SubjectTracker::new().track(&ingest.frames);
    let frames: Vec<Frame> = ingest.frames.iter().map(|fd| fd.frame).collect();
    let planner = CropTrajectoryPlanner::new(&config, &geometry);

    group.throughput(Throughput::Elements(frames.len() as u64));
    group.bench_function("plan_1800", |b| {
        b.iter(|| planner.plan(black_box(&frames), black_box(&subjects)))
    });
    group.finish();
}

fn bench_captions(c: &mut Criterion) {
    let mut group = c.benchmark_group("captions");
    let builder = CaptionTimelineBuilder::new(&EngineConfig::default());
    let words = synthetic_words(2000);

    group.throughput(Throughput::Elements(words.len() as u64));
    group.bench_function("build_2000_words", |b| {
        b.iter(|| builder.build(black_box(&words)))
    });
    group.finish();
}

criterion_group!(benches, bench_full_pipeline, bench_planner, bench_captions);
criterion_main!(benches);
