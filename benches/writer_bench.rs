//! Benchmarks for the line differ.
//!
//! Run with: cargo bench --bench writer_bench

use std::hint::black_box;
use std::time::Duration;

use criterion::{criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};
use kraken_paint::config::DifferConfig;
use kraken_paint::{Result, TerminalBackend, TerminalInputEvent, TerminalWriter};

struct NullBackend;

impl TerminalBackend for NullBackend {
    fn init(&mut self) -> Result<()> {
        Ok(())
    }

    fn shutdown(&mut self) -> Result<()> {
        Ok(())
    }

    fn size(&self) -> (u16, u16) {
        (120, 60)
    }

    fn write(&mut self, bytes: &[u8]) -> Result<()> {
        black_box(bytes.len());
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }

    fn read_events(&mut self, _timeout: Duration) -> Vec<TerminalInputEvent> {
        Vec::new()
    }
}

fn make_frame(rows: usize, seed: usize) -> String {
    (0..rows)
        .map(|i| format!("\x1b[3{}m row {i:>4} \x1b[0m {}", (i + seed) % 8, "x".repeat(60)))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Same frame with every `stride`-th row replaced.
fn mutate(frame: &str, stride: usize) -> String {
    frame
        .split('\n')
        .enumerate()
        .map(|(i, line)| {
            if i % stride == 0 {
                format!("changed {i}")
            } else {
                line.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn bench_writer(c: &mut Criterion) {
    let mut group = c.benchmark_group("writer");
    let config = DifferConfig::default();

    for rows in [24usize, 60, 200] {
        let base = make_frame(rows, 0);

        group.bench_with_input(BenchmarkId::new("unchanged", rows), &base, |b, frame| {
            let mut writer = TerminalWriter::new(&config);
            let mut backend = NullBackend;
            writer.render(frame, &mut backend).unwrap();
            b.iter(|| black_box(writer.render(frame, &mut backend).unwrap()));
        });

        for stride in [1usize, 10] {
            let next = mutate(&base, stride);
            let id = BenchmarkId::new(format!("change_every_{stride}"), rows);
            group.bench_with_input(id, &(base.clone(), next), |b, (prev, next)| {
                b.iter_batched(
                    || {
                        let mut writer = TerminalWriter::new(&config);
                        writer.render(prev, &mut NullBackend).unwrap();
                        writer
                    },
                    |mut writer| black_box(writer.render(next, &mut NullBackend).unwrap()),
                    BatchSize::SmallInput,
                );
            });
        }
    }

    group.finish();
}

criterion_group!(benches, bench_writer);
criterion_main!(benches);
