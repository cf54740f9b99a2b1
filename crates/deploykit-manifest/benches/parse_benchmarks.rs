use criterion::{black_box, criterion_group, criterion_main, Criterion};
use deploykit_manifest::{parse_records, segment, InstallPlan};
use std::fmt::Write;

const SECTIONS: [&str; 5] = [
    "Programming Environments",
    "Drivers",
    "Application Software",
    "Utilities",
    "Add-Ons",
];

fn create_listing(packages: usize) -> String {
    let mut text = String::new();
    for i in 0..packages {
        let section = SECTIONS[i % SECTIONS.len()];
        writeln!(text, "Package: pkg-{:05}", packages - i).unwrap();
        writeln!(text, "Version: 1.{i}.0").unwrap();
        writeln!(text, "Section: {section}").unwrap();
        writeln!(text, "Description: synthetic package {i}").unwrap();
        text.push_str("\n\n\n");
    }
    text
}

fn bench_segment(c: &mut Criterion) {
    let listing = create_listing(2000);
    c.bench_function("segment_2000_packages", |b| {
        b.iter(|| segment(black_box(&listing)));
    });
}

fn bench_parse_and_plan(c: &mut Criterion) {
    let listing = create_listing(2000);
    c.bench_function("parse_and_plan_2000_packages", |b| {
        b.iter(|| InstallPlan::from_records(parse_records(black_box(&listing))));
    });
}

criterion_group!(benches, bench_segment, bench_parse_and_plan);
criterion_main!(benches);
