// benches/spsc.rs

use criterion::{criterion_group, criterion_main, Criterion, Throughput};
use std::thread;
use std::time::Instant;

use filament::spsc;
use filament::strategy::{OverwriteOnFull, Spin, WaitOnFull};

fn spsc_hot_path(c: &mut Criterion) {
  let mut group = c.benchmark_group("spsc_hot_path");
  group.throughput(Throughput::Elements(1));

  group.bench_function("try_send_try_recv_wait_on_full", |b| {
    let (mut tx, mut rx) = spsc::channel::<u64, WaitOnFull, Spin>(1024);
    b.iter(|| {
      tx.try_send(42).unwrap();
      rx.try_recv().unwrap()
    });
  });

  group.bench_function("try_send_try_recv_overwrite", |b| {
    let (mut tx, mut rx) = spsc::channel::<u64, OverwriteOnFull, Spin>(1024);
    b.iter(|| {
      tx.try_send(42).unwrap();
      rx.try_recv().unwrap()
    });
  });

  group.finish();
}

fn spsc_cross_thread(c: &mut Criterion) {
  let mut group = c.benchmark_group("spsc_cross_thread");
  group.throughput(Throughput::Elements(1));

  group.bench_function("spin_transfer", |b| {
    b.iter_custom(|iters| {
      let (mut tx, mut rx) = spsc::channel::<u64, WaitOnFull, Spin>(1024);
      let start = Instant::now();
      let producer = thread::spawn(move || {
        for i in 0..iters {
          tx.send(i);
        }
      });
      for _ in 0..iters {
        rx.recv();
      }
      producer.join().unwrap();
      start.elapsed()
    });
  });

  group.finish();
}

criterion_group!(benches, spsc_hot_path, spsc_cross_thread);
criterion_main!(benches);
