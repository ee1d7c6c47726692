//! Benchmarks for the deterministic scoring path
//!
//! Run with: cargo bench -p lingua-tutor-scoring --bench scoring_bench

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use lingua_tutor_core::{Language, UtterancePair};
use lingua_tutor_scoring::{normalize, score_fallback};

fn bench_normalize(c: &mut Criterion) {
    let mut group = c.benchmark_group("normalize");

    for token in ["hello", "Hello!", "qu'est-ce,", "UNBELIEVABLE?!"] {
        group.bench_with_input(BenchmarkId::from_parameter(token), token, |b, token| {
            b.iter(|| normalize(token))
        });
    }

    group.finish();
}

fn bench_fallback_scorer(c: &mut Criterion) {
    let mut group = c.benchmark_group("fallback_scorer");

    for word_count in [4usize, 16, 64] {
        let sentence: Vec<String> = (0..word_count).map(|i| format!("word{}", i)).collect();
        let expected = sentence.join(" ");
        // Mismatch every fourth word so both branches run
        let transcribed: Vec<String> = sentence
            .iter()
            .enumerate()
            .map(|(i, w)| if i % 4 == 3 { format!("x{}", w) } else { w.clone() })
            .collect();
        let pair = UtterancePair::new(expected, transcribed.join(" "), Language::English);

        group.throughput(Throughput::Elements(word_count as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(word_count),
            &pair,
            |b, pair| b.iter(|| score_fallback(pair)),
        );
    }

    group.finish();
}

criterion_group!(benches, bench_normalize, bench_fallback_scorer);
criterion_main!(benches);
