use criterion::{Criterion, black_box, criterion_group, criterion_main};

use parsnip::Grammar;

const GRAMMAR_SRC: &str = include_str!("./english.cfg");

fn parse(g: &Grammar, input: &[&str]) -> usize {
  g.parse(input).len()
}

fn criterion_benchmark(c: &mut Criterion) {
  let grammar = GRAMMAR_SRC.parse::<Grammar>().unwrap();
  let simple_input = "the dog runs".split(' ').collect::<Vec<_>>();
  let ambiguous_input = "the man saw the dog in the park with the telescope"
    .split(' ')
    .collect::<Vec<_>>();

  c.bench_function("parse simple", |b| {
    b.iter(|| parse(black_box(&grammar), black_box(&simple_input)))
  });

  c.bench_function("parse ambiguous attachment", |b| {
    b.iter(|| parse(black_box(&grammar), black_box(&ambiguous_input)))
  });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
