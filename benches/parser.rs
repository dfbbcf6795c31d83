use criterion::*;
use mish::parser::{parse, tokenizer::tokenize};

const LINES: &[&str] = &[
    "ls -l /tmp",
    "cat < input | sort -r | uniq -c >> counts",
    "p1 | p2 & p3 & p4 | p5",
    "build &| tee build.log | grep warning > warnings",
    "printf a\\nb\\nc | tr a-c A-C|wc -l",
    "sleep 10 &",
];

fn criterion_benchmark(c: &mut Criterion) {
    let bytes: usize = LINES.iter().map(|line| line.len()).sum();
    let mut group = c.benchmark_group("parser-throughput");
    group.throughput(Throughput::Bytes(bytes as u64));
    group.bench_function("tokenize", |b| {
        b.iter(|| LINES.iter().map(|line| tokenize(black_box(line))).collect::<Vec<_>>())
    });
    group.bench_function("parse", |b| {
        b.iter(|| LINES.iter().map(|line| parse(black_box(line))).collect::<Vec<_>>())
    });
    group.finish();
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
