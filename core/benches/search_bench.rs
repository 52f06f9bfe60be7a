use criterion::{criterion_group, criterion_main, Criterion};
use search_core::tokenizer::tokenize;
use search_core::{build, Bm25Params, QueryEvaluator, SourceDocument};
use std::sync::Arc;

const TEXT: &str = "Machine learning is a field of study in artificial intelligence concerned with \
the development of statistical algorithms that can learn from data and generalize to unseen data. \
Neural networks, a family of models loosely inspired by biological neurons, now dominate many \
learning tasks, from image recognition to language modelling and robotic control.";

fn corpus() -> Vec<SourceDocument> {
    (0..2_000)
        .map(|i| SourceDocument {
            title: format!("doc {i}"),
            url: String::new(),
            text: TEXT.split_whitespace().cycle().skip(i % 37).take(40 + i % 60).collect::<Vec<_>>().join(" "),
        })
        .collect()
}

fn bench_tokenize(c: &mut Criterion) {
    c.bench_function("tokenize_paragraph", |b| b.iter(|| tokenize(TEXT)));
}

fn bench_build(c: &mut Criterion) {
    let docs = corpus();
    c.bench_function("build_2k_docs", |b| b.iter(|| build(&docs)));
}

fn bench_search(c: &mut Criterion) {
    let ev = QueryEvaluator::new(Arc::new(build(&corpus())), Bm25Params::default()).expect("non-empty corpus");
    c.bench_function("search_boolean", |b| {
        b.iter(|| ev.search("(neural OR learning) AND data NOT robotic", 10))
    });
    c.bench_function("search_phrase", |b| b.iter(|| ev.search("\"neural networks\"", 10)));
}

criterion_group!(benches, bench_tokenize, bench_build, bench_search);
criterion_main!(benches);
