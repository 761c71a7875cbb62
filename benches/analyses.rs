use criterion::black_box;
use criterion::criterion_group;
use criterion::criterion_main;
use criterion::Criterion;

use pcre_audit::{lint, optimize, parse, profile_redos, validate};

const PLAIN: &str = "/hello world/";
const EMAIL_LIKE: &str = r"/[\w.+-]+@[\w-]+\.[a-zA-Z]{2,}/";
const CATASTROPHIC: &str = "/(a+)+$/";
const WIDE_ALTERNATION: &str = "/cat|dog|bird|fish|snake|lizard|frog|newt|toad|eel/";

fn bench_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse");
    for (name, pattern) in [
        ("plain", PLAIN),
        ("email_like", EMAIL_LIKE),
        ("catastrophic", CATASTROPHIC),
        ("wide_alternation", WIDE_ALTERNATION),
    ] {
        group.bench_function(name, |b| b.iter(|| parse(black_box(pattern)).unwrap()));
    }
    group.finish();
}

fn bench_validate(c: &mut Criterion) {
    let mut group = c.benchmark_group("validate");
    for (name, pattern) in [("plain", PLAIN), ("email_like", EMAIL_LIKE)] {
        let root = parse(pattern).unwrap();
        group.bench_function(name, |b| b.iter(|| validate(black_box(&root))));
    }
    group.finish();
}

fn bench_lint(c: &mut Criterion) {
    let mut group = c.benchmark_group("lint");
    for (name, pattern) in [("email_like", EMAIL_LIKE), ("wide_alternation", WIDE_ALTERNATION)] {
        let root = parse(pattern).unwrap();
        group.bench_function(name, |b| b.iter(|| lint(black_box(&root))));
    }
    group.finish();
}

fn bench_optimize(c: &mut Criterion) {
    let mut group = c.benchmark_group("optimize");
    for (name, pattern) in [("email_like", EMAIL_LIKE), ("wide_alternation", WIDE_ALTERNATION)] {
        let root = parse(pattern).unwrap();
        group.bench_function(name, |b| b.iter(|| optimize(black_box(&root))));
    }
    group.finish();
}

fn bench_redos_profile(c: &mut Criterion) {
    let mut group = c.benchmark_group("profile_redos");
    for (name, pattern) in [("plain", PLAIN), ("catastrophic", CATASTROPHIC)] {
        let root = parse(pattern).unwrap();
        group.bench_function(name, |b| b.iter(|| profile_redos(black_box(&root))));
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_parse,
    bench_validate,
    bench_lint,
    bench_optimize,
    bench_redos_profile
);
criterion_main!(benches);
