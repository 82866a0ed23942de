use boolsearch_core::query::{intersect_many, SignedTermId};
use boolsearch_core::{IndexBuilder, InvertedIndex, QueryEngine};
use criterion::{criterion_group, criterion_main, Criterion};

/// Term `tN` occurs in every document whose id is divisible by N.
fn synthetic_index(num_docs: u32) -> InvertedIndex {
    let mut b = IndexBuilder::new();
    for doc in 1..=num_docs {
        let terms: Vec<String> = (2..=16).filter(|n| doc % n == 0).map(|n| format!("t{n}")).collect();
        b.add_document(format!("doc{doc}.txt"), terms);
    }
    b.build().expect("valid synthetic index")
}

fn bench_queries(c: &mut Criterion) {
    let index = synthetic_index(50_000);
    let engine = QueryEngine::new(&index);

    let ids: Vec<SignedTermId> = ["t2", "t3", "t5", "t7"]
        .iter()
        .filter_map(|t| index.term_id(t))
        .map(SignedTermId::plain)
        .collect();
    c.bench_function("intersect_many_4", |b| b.iter(|| intersect_many(&index, &ids)));
    c.bench_function("flat_and_not", |b| b.iter(|| engine.execute("t2 AND t3 AND NOT t5")));
    c.bench_function("tree_mixed", |b| b.iter(|| engine.execute("t2 AND (t3 OR t5) AND NOT (t7 OR t11)")));
}

criterion_group!(benches, bench_queries);
criterion_main!(benches);
