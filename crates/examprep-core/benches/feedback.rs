use criterion::{black_box, criterion_group, criterion_main, Criterion};

use examprep_core::evaluation::{build_grading_prompt, parse_feedback};

fn bench_parse_feedback(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse_feedback");

    let short = "You've earned 4 out of 5 marks. Good attempt but missed X.\n\nConsider adding Y next time.";

    let unscored = "The answer covers the main idea but never states a mark.";

    let long = {
        let mut s = String::from("You've earned 14 out of 20 marks. Most points were covered.");
        for i in 0..40 {
            s.push_str(&format!(
                "\n\n({i}) The answer should also describe stage {i} of the process in detail."
            ));
        }
        s
    };

    group.bench_function("short", |b| b.iter(|| parse_feedback(black_box(short))));
    group.bench_function("unscored", |b| {
        b.iter(|| parse_feedback(black_box(unscored)))
    });
    group.bench_function("long", |b| b.iter(|| parse_feedback(black_box(&long))));

    group.finish();
}

fn bench_build_prompt(c: &mut Criterion) {
    c.bench_function("build_grading_prompt", |b| {
        b.iter(|| {
            build_grading_prompt(
                black_box("Explain the role of enzymes in digestion."),
                black_box("Enzymes are biological catalysts that break down large molecules."),
                black_box("They make food smaller."),
                black_box(6),
            )
        })
    });
}

criterion_group!(benches, bench_parse_feedback, bench_build_prompt);
criterion_main!(benches);
