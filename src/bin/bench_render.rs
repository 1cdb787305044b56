//! Benchmark for the choreography render pipeline.
//!
//! Builds a synthetic show (a ~206s song, 16 moving heads, alternating
//! templates with gaps between some sections) and times each stage.
//!
//! Run with: cargo run --profile perf --bin bench_render

use serde_json::{json, Map, Value};
use std::time::Instant;

use luma_choreo::curves::process_fixture;
use luma_choreo::models::{
    DimmerInstruction, GeometryInstruction, ImplementationPlan, MovementInstruction, PlanSection,
    Template, TemplateStep, TransitionMode, TransitionSpec,
};
use luma_choreo::transitions::GapFiller;
use luma_choreo::{build_effect_table, render_plan, FixtureConfig, FixtureGroup, RenderSettings};

const SONG_MS: u64 = 206_000;
const SECTION_MS: u64 = 8_000;

fn params(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

fn step(pattern: &str, intensity: &str, geometry: &str, geometry_params: Value) -> TemplateStep {
    TemplateStep {
        movement: Some(MovementInstruction {
            pattern: pattern.into(),
            intensity: intensity.into(),
            amplitude: None,
            frequency: None,
        }),
        dimmer: Some(DimmerInstruction {
            pattern: "pulse".into(),
            intensity: intensity.into(),
            level_pct: None,
        }),
        geometry: Some(GeometryInstruction {
            geometry_type: geometry.into(),
            params: params(geometry_params),
        }),
        ..TemplateStep::full_section()
    }
}

fn synthetic_show() -> (ImplementationPlan, FixtureGroup) {
    let fixtures = FixtureGroup::new(
        (1..=16)
            .map(|i| FixtureConfig::new(format!("MH{}", i)))
            .collect(),
    );

    let templates = vec![
        Template {
            id: "wave".into(),
            steps: vec![step("sweep_lr", "moderate", "wave_lr", json!({"phase_spacing": "auto"}))],
        },
        Template {
            id: "mirror".into(),
            steps: vec![step("circle", "fast", "mirror_lr", json!({"pan_spread_deg": 40}))],
        },
        Template {
            id: "chaos".into(),
            steps: vec![step("figure_eight", "dramatic", "scattered_chaos", json!({}))],
        },
        Template {
            id: "hold".into(),
            steps: vec![TemplateStep {
                target: "odd".into(),
                ..step("hold", "smooth", "alternating_updown", json!({}))
            }],
        },
    ];
    let ids = ["wave", "mirror", "chaos", "hold"];

    let mut sections = Vec::new();
    let mut start = 0;
    let mut i = 0;
    while start + SECTION_MS <= SONG_MS {
        sections.push(PlanSection {
            id: format!("section_{}", i),
            start_ms: start,
            end_ms: start + SECTION_MS,
            template: Some(ids[i % ids.len()].to_string()),
            transition_in: Some(TransitionSpec::new(TransitionMode::Crossfade, 500)),
            transition_out: None,
            instructions: Vec::new(),
        });
        // every fifth section leaves a large gap behind it
        start += if i % 5 == 4 { SECTION_MS + 6_000 } else { SECTION_MS };
        i += 1;
    }

    let plan = ImplementationPlan {
        song_duration_ms: Some(SONG_MS),
        sections,
        ..ImplementationPlan::default()
    };
    (plan, fixtures)
}

fn bench<F: FnMut() -> R, R>(name: &str, iterations: usize, mut f: F) -> std::time::Duration {
    // Warmup
    for _ in 0..2 {
        std::hint::black_box(f());
    }

    let start = Instant::now();
    for _ in 0..iterations {
        std::hint::black_box(f());
    }
    let elapsed = start.elapsed();
    let per_iter = elapsed / iterations as u32;

    println!(
        "  {:<40} {:>8.2}ms  ({} iters, {:.2}ms total)",
        name,
        per_iter.as_secs_f64() * 1000.0,
        iterations,
        elapsed.as_secs_f64() * 1000.0,
    );
    per_iter
}

fn main() {
    let settings = RenderSettings::default();
    let (plan, fixtures) = synthetic_show();
    println!(
        "Synthetic show: {} sections, {} fixtures, {:.0}s\n",
        plan.sections.len(),
        fixtures.len(),
        SONG_MS as f64 / 1000.0
    );

    let output = match render_plan(&plan, &fixtures, &settings) {
        Ok(output) => output,
        Err(err) => {
            eprintln!("render failed: {}", err);
            std::process::exit(1);
        }
    };
    println!(
        "  {} effects ({} gap fill)\n",
        output.effect_count(),
        output.gap_fill_count()
    );

    let iters = 10;
    println!("=== Stages ({iters} iterations each) ===\n");

    let t_render = bench("render_plan (full)", iters, || {
        render_plan(&plan, &fixtures, &settings).map(|o| o.effect_count())
    });

    let filler = GapFiller::new(&settings);
    let fixture = &fixtures.fixtures[0];
    let t_gap = bench("gap fill + curve pipeline (1 fixture)", iters, || {
        let filled = filler.fill(fixture, Vec::new(), SONG_MS);
        process_fixture(filled, &settings).len()
    });

    let t_export = bench("build_effect_table", iters, || {
        build_effect_table(&output, &fixtures).settings.len()
    });

    println!("\n=== Summary ===\n");
    println!(
        "  render {:.2}ms | idle fixture {:.3}ms | export {:.2}ms",
        t_render.as_secs_f64() * 1000.0,
        t_gap.as_secs_f64() * 1000.0,
        t_export.as_secs_f64() * 1000.0
    );
}
