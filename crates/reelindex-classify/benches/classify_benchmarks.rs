//! Benchmark for hashtag classification throughput.
//!
//! The classifier runs once per video inside every ingestion group, so its
//! cost is paid `concurrency_limit` times in parallel. It should stay well
//! under a microsecond per call for realistic hashtag strings.

use criterion::{criterion_group, criterion_main, Criterion};

use reelindex_classify::classify;

/// Realistic model output: a mix of known keywords across all five
/// categories plus unclassified tokens, with newlines.
fn generate_hashtag_text(index: usize) -> String {
    format!(
        "#male #female #tech #gaming #exciting #funny\n\
         #newyork #tokyo #adidas #nike #sunsetvibes #tag{} \
         plain words that are not hashtags #GenZ #Fitness",
        index
    )
}

fn bench_classify(c: &mut Criterion) {
    let inputs: Vec<String> = (0..64).map(generate_hashtag_text).collect();

    c.bench_function("classify_mixed_hashtags", |b| {
        let mut i = 0;
        b.iter(|| {
            let meta = classify(&inputs[i % inputs.len()]);
            i += 1;
            std::hint::black_box(meta)
        });
    });

    c.bench_function("classify_empty", |b| {
        b.iter(|| std::hint::black_box(classify("")));
    });
}

criterion_group!(benches, bench_classify);
criterion_main!(benches);
