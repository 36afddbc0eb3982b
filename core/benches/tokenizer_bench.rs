use criterion::{criterion_group, criterion_main, Criterion};
use vitrine_core::tokenizer::{tokenize, Stopwords};

const DESCRIPTION: &str = "A rich, full-bodied red wine vinegar aged in oak \
barrels. Made in France from hand-picked grapes, this vinegar brings a sharp \
and fruity note to dressings, marinades and sauces. Bottled at the estate.";

fn bench_tokenize(c: &mut Criterion) {
    let stopwords = Stopwords::english();
    let text = DESCRIPTION.repeat(200);
    c.bench_function("tokenize_description", |b| {
        b.iter(|| tokenize(&text, &stopwords))
    });
}

criterion_group!(benches, bench_tokenize);
criterion_main!(benches);
