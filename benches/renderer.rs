use corner_label_renderer::config::{Corner, LabelConfig};
use corner_label_renderer::geometry::solve;
use corner_label_renderer::render::render_svg;
use corner_label_renderer::text::{FastMetrics, fit_text, initial_font_size};
use corner_label_renderer::theme::Theme;
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::hint::black_box;

const LABELS: [(&str, &str); 3] = [
    ("short", "NEW"),
    ("phrase", "LIMITED TIME OFFER"),
    ("multiline", "FREE\nSHIPPING\nTODAY ONLY"),
];

fn bench_solve(c: &mut Criterion) {
    let mut group = c.benchmark_group("solve");
    for angle in [15.0f32, 45.0, 75.0] {
        group.bench_with_input(BenchmarkId::from_parameter(angle), &angle, |b, angle| {
            b.iter(|| solve(black_box(*angle), 20, 24, Corner::TopRight, 0, 0))
        });
    }
    group.finish();
}

fn bench_fit(c: &mut Criterion) {
    let mut group = c.benchmark_group("fit_text");
    let geometry = solve(45.0, 40, 60, Corner::TopRight, 0, 0);
    let metrics = FastMetrics::default();
    for (name, text) in LABELS {
        group.bench_with_input(BenchmarkId::from_parameter(name), &text, |b, text| {
            b.iter(|| {
                fit_text(
                    black_box(text),
                    &geometry.interior,
                    initial_font_size(60),
                    &metrics,
                )
            })
        });
    }
    group.finish();
}

fn bench_render(c: &mut Criterion) {
    let mut group = c.benchmark_group("render_svg");
    let theme = Theme {
        fast_text_metrics: true,
        ..Theme::default()
    };
    for (name, text) in LABELS {
        let config = LabelConfig {
            text: Some(text.to_string()),
            thickness: 48,
            ..LabelConfig::default()
        };
        group.bench_with_input(BenchmarkId::from_parameter(name), &config, |b, config| {
            b.iter(|| render_svg(black_box(config), &theme))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_solve, bench_fit, bench_render);
criterion_main!(benches);
