use chrono::{Duration, NaiveDate, TimeZone, Utc};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use lecture_assigner::{AssignmentEngine, CandidateVideo, ClassCode, ConfigBuilder, IndexDocument};

const MARKER: &str = "not-found.html";

fn semester_start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 8, 24).unwrap()
}

/// Sixteen weeks of placeholder slots for every class
fn semester_index() -> String {
    let mut html = String::from("const lectures = {\n");
    for code in ClassCode::ALL {
        html.push_str(&format!("  '{}': {{\n", code.as_str()));
        for week in 1..=16 {
            for lecture in 1..=2 {
                html.push_str(&format!("    'week{}-lecture{}': '/{}',\n", week, lecture, MARKER));
            }
        }
        html.push_str("  },\n");
    }
    html.push_str("};\n");
    html
}

/// One recording per class on every Monday and Wednesday of the semester
fn semester_candidates() -> Vec<CandidateVideo> {
    let mut candidates = Vec::new();
    for week in 0..16 {
        for offset in [1, 3] {
            let date = semester_start() + Duration::days(week * 7 + offset);
            for code in ClassCode::ALL {
                candidates.push(CandidateVideo {
                    external_id: format!("{}-{}", code.as_str(), date),
                    title: format!("{} {}", code, date.format("%-m/%-d/%Y")),
                    published_at: Utc.with_ymd_and_hms(2025, 8, 24, 0, 0, 0).unwrap(),
                });
            }
        }
    }
    candidates
}

/// Benchmark parsing the lecture index
fn bench_index_parse(c: &mut Criterion) {
    let html = semester_index();

    c.bench_function("index_parse", |b| {
        b.iter(|| IndexDocument::parse(black_box(html.clone()), MARKER))
    });
}

/// Benchmark a full semester of candidates against an empty index
fn bench_engine_run(c: &mut Criterion) {
    let config = ConfigBuilder::new()
        .with_semester(semester_start(), NaiveDate::from_ymd_opt(2025, 12, 15).unwrap())
        .build();
    let engine = AssignmentEngine::from_config(&config);
    let snapshot = IndexDocument::parse(semester_index(), MARKER)
        .unwrap()
        .snapshot();
    let candidates = semester_candidates();

    c.bench_function("engine_run_full_semester", |b| {
        b.iter(|| engine.run(black_box(&candidates), black_box(&snapshot)))
    });
}

/// Benchmark rendering every slot change back into the index text
fn bench_render(c: &mut Criterion) {
    let config = ConfigBuilder::new()
        .with_semester(semester_start(), NaiveDate::from_ymd_opt(2025, 12, 15).unwrap())
        .build();
    let document = IndexDocument::parse(semester_index(), MARKER).unwrap();
    let outcome =
        AssignmentEngine::from_config(&config).run(&semester_candidates(), &document.snapshot());

    c.bench_function("index_render", |b| {
        b.iter(|| document.render(black_box(&outcome.snapshot)))
    });
}

criterion_group!(benches, bench_index_parse, bench_engine_run, bench_render);
criterion_main!(benches);
