//! Version, requirement and config parsing benchmarks
//!
//! Benchmarks gem version parsing, requirement-to-range conversion and
//! `.garnet/config.toml` parsing.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use garnet_benchmarks::criterion_config;
use garnet_config::toml::parse_garnet_toml;
use garnet_core::types::{GemVersion, Requirement};
use garnet_resolver::requirement::requirement_range;

/// Benchmark gem version parsing
fn bench_version_parsing(c: &mut Criterion) {
    let mut group = c.benchmark_group("version_parsing");
    group.measurement_time(std::time::Duration::from_secs(5));

    let versions = [
        "1.0",
        "7.1.3.2",
        "1.16.0.rc1",
        "2.0.0-beta.2",
        "0.0.1.a.b.c",
        "20240101.1",
    ];

    group.throughput(Throughput::Elements(versions.len() as u64));
    group.bench_function("mixed", |b| {
        b.iter(|| {
            for version in &versions {
                black_box(version.parse::<GemVersion>().ok());
            }
        });
    });

    group.finish();
}

/// Benchmark requirement to range conversion
fn bench_requirement_ranges(c: &mut Criterion) {
    let mut group = c.benchmark_group("requirement_ranges");
    group.measurement_time(std::time::Duration::from_secs(5));

    let requirements = [
        ">= 0",
        "~> 1.0",
        "~> 7.1.3",
        ">= 1.2, < 2",
        "!= 1.5.0, >= 1.0, < 3",
        "= 3.2.2",
    ];

    for text in requirements.iter() {
        let requirement = Requirement::parse_list(text);
        group.bench_with_input(BenchmarkId::new("requirement", text), &requirement, |b, requirement| {
            b.iter(|| black_box(requirement_range(requirement).ok()));
        });
    }

    group.finish();
}

/// Benchmark config file parsing
fn bench_config_parsing(c: &mut Criterion) {
    let mut group = c.benchmark_group("config_parsing");
    group.measurement_time(std::time::Duration::from_secs(5));

    for gem_count in [10, 100, 500].iter() {
        group.throughput(Throughput::Elements(*gem_count as u64));
        let content = create_config_content(*gem_count);

        group.bench_with_input(BenchmarkId::new("unlocked_gems", gem_count), &content, |b, content| {
            b.iter(|| black_box(parse_garnet_toml(content).ok()));
        });
    }

    group.finish();
}

fn create_config_content(gem_count: usize) -> String {
    let gems = (0..gem_count)
        .map(|i| format!("\"gem-{i}\""))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "[resolver]\nplatforms = [\"ruby\", \"x86_64-linux\", \"arm64-darwin\"]\nupdate-level = \"minor\"\nunlock = [{gems}]\n"
    )
}

criterion_group! {
    name = benches;
    config = criterion_config();
    targets = bench_version_parsing, bench_requirement_ranges, bench_config_parsing
}
criterion_main!(benches);
