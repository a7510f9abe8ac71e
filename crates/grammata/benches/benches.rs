use std::{env, path::PathBuf};

use criterion::{criterion_group, criterion_main, Criterion};
use grammata::{action::Ignored, grammar::RuleSet, ll::LLTable, lr1::LRTable};

criterion_main!(benches);
criterion_group!(benches, bench_expressions, bench_statements);

fn bench_expressions(c: &mut Criterion) {
    bench_table_gen(c, "rpn", true);
    bench_table_gen(c, "arithmetic", false);
}

fn bench_statements(c: &mut Criterion) {
    bench_table_gen(c, "ab", true);
    bench_table_gen(c, "statements", true);
}

fn bench_table_gen(c: &mut Criterion, grammar_name: &str, ll1: bool) {
    let project_root = env::var_os("CARGO_MANIFEST_DIR")
        .map(PathBuf::from)
        .expect("missing environment variable: `CARGO_MANIFEST_DIR'");
    let grammar =
        RuleSet::from_file(project_root.join(format!("tests/{}.gram", grammar_name))).unwrap();

    let mut group = c.benchmark_group(grammar_name);
    if ll1 {
        group.bench_function("LL(1)", |b| {
            b.iter(|| LLTable::<Ignored>::build(&grammar).unwrap());
        });
    }
    group.bench_function("LR(1)", |b| {
        b.iter(|| LRTable::<Ignored>::build(&grammar).unwrap());
    });
    group.finish();
}
