//! Benchmarks for the pxgen pipeline.

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use pxgen::process::{Chain, ChainOptions};
use pxgen::types::ProcessedFrame;
use pxgen::{compile, GenerationSpec, Interpreter, Pipeline, PipelineConfig, ProceduralStrategy, Resolution};

const CONCEPT: &str = "pixel art fire pet idle animation";

// -- Interpretation --

fn bench_interpret(c: &mut Criterion) {
    let mut group = c.benchmark_group("interpret");

    group.bench_function("short_concept", |b| {
        b.iter(|| Interpreter.interpret(black_box("slime")).unwrap())
    });

    group.bench_function("full_concept", |b| {
        b.iter(|| {
            Interpreter
                .interpret(black_box("64x64 pixel art shadow knight attack animation 6 frames 8 colors"))
                .unwrap()
        })
    });

    group.finish();
}

// -- Generation and post-processing --

fn bench_generate(c: &mut Criterion) {
    let mut group = c.benchmark_group("generate");

    let small = GenerationSpec::builder("pet").theme("fire").frame_count(8).build().unwrap();
    let large = GenerationSpec::builder("pet")
        .theme("fire")
        .frame_count(8)
        .resolution(Resolution::new(128, 128).unwrap())
        .build()
        .unwrap();

    for (name, spec) in [("8x32px", &small), ("8x128px", &large)] {
        let prompt = compile(spec);
        group.bench_function(name, |b| {
            b.iter(|| ProceduralStrategy.generate(black_box(spec), &prompt).unwrap())
        });
    }

    group.finish();
}

fn bench_chain(c: &mut Criterion) {
    let mut group = c.benchmark_group("post_processing");

    let spec = GenerationSpec::builder("pet")
        .theme("fire")
        .frame_count(8)
        .max_colors(8)
        .build()
        .unwrap();
    let frames: Vec<ProcessedFrame> = ProceduralStrategy
        .generate(&spec, &compile(&spec))
        .unwrap()
        .into_iter()
        .map(ProcessedFrame::from_raw)
        .collect();
    let chain = Chain::standard(&spec, &ChainOptions::default());

    group.bench_function("standard_chain", |b| b.iter(|| chain.run(black_box(frames.clone()))));

    group.finish();
}

// -- Whole runs --

fn bench_execute(c: &mut Criterion) {
    let mut group = c.benchmark_group("execute");
    let pipeline = Pipeline::new();

    let config = PipelineConfig::default().with_engine("godot");
    group.bench_function("idle_animation", |b| {
        b.iter(|| pipeline.execute(black_box(CONCEPT), &config))
    });

    let upscaled = PipelineConfig {
        upscale: 4,
        ..PipelineConfig::default()
    };
    group.bench_function("idle_animation_upscaled", |b| {
        b.iter(|| pipeline.execute(black_box(CONCEPT), &upscaled))
    });

    group.finish();
}

criterion_group!(benches, bench_interpret, bench_generate, bench_chain, bench_execute);
criterion_main!(benches);
