use carspottr::models::analysis::{
    FEATURES_LABEL, MAKE_MODEL_LABEL, PERFORMANCE_LABEL, RARITY_LABEL, VALUE_RANGE_LABEL,
    YEAR_LABEL,
};
use carspottr::models::{
    parse_analysis, query_collection, rarity_counts, CollectorProgress, RarityTier, SortOrder,
    Spot,
};
use chrono::{Duration, TimeZone, Utc};
use criterion::{criterion_group, criterion_main, Criterion};
use std::hint::black_box;

fn sample_response() -> String {
    format!(
        "{MAKE_MODEL_LABEL} Porsche 911 GT3 RS\n\
         {YEAR_LABEL} 2023\n\
         {PERFORMANCE_LABEL} 518 hp, 0-60 mph in 3.0 s\n\
         {FEATURES_LABEL} Active aero, DRS rear wing, magnesium wheels\n\
         {RARITY_LABEL} Diamond\n\
         {VALUE_RANGE_LABEL} $240,000 - $350,000\n\n\
         The rear wing sits higher than the roof line."
    )
}

fn synthetic_collection(len: usize) -> Vec<Spot> {
    let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    (0..len)
        .map(|i| Spot {
            id: format!("spot-{i}"),
            user_id: "bench-user".to_string(),
            make: "Make".to_string(),
            model: format!("Model {i}"),
            year: 1960 + (i % 60) as i32,
            created_at: start + Duration::minutes((i * 7919 % len) as i64),
            location: String::new(),
            rarity: RarityTier::ALL[i % RarityTier::ALL.len()],
            performance: String::new(),
            features: String::new(),
            value_range: String::new(),
            trivia: String::new(),
        })
        .collect()
}

fn benchmark_parse_analysis(c: &mut Criterion) {
    let response = sample_response();
    c.bench_function("parse_analysis", |b| {
        b.iter(|| parse_analysis(black_box(&response)))
    });
}

fn benchmark_collection(c: &mut Criterion) {
    let spots = synthetic_collection(5_000);
    let counts = rarity_counts(&spots);

    let mut group = c.benchmark_group("collection");

    group.bench_function("sort_by_rarity", |b| {
        b.iter(|| query_collection(black_box(spots.clone()), None, SortOrder::Rarity))
    });

    group.bench_function("filter_gold_newest", |b| {
        b.iter(|| query_collection(black_box(spots.clone()), Some("Gold"), SortOrder::Newest))
    });

    group.bench_function("collector_progress", |b| {
        b.iter(|| CollectorProgress::from_counts(black_box(&counts)))
    });

    group.finish();
}

criterion_group!(benches, benchmark_parse_analysis, benchmark_collection);
criterion_main!(benches);
