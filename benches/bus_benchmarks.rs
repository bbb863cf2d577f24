use std::hint::black_box;

use bytes::Bytes;
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use pubsub::{Bus, ManualScheduler, Subscriber};

fn bus_with_subscribers(n: usize) -> (Bus, ManualScheduler) {
    let scheduler = ManualScheduler::new();
    let bus: Bus = Bus::new(scheduler.clone());
    for _ in 0..n {
        bus.subscribe(
            "chan",
            Subscriber::new(|_: &str, payload: &Bytes| {
                black_box(payload.len());
            }),
        );
    }
    (bus, scheduler)
}

fn bench_subscribe_unsubscribe(c: &mut Criterion) {
    let (bus, _scheduler) = bus_with_subscribers(0);
    let subscriber = Subscriber::new(|_: &str, _: &Bytes| {});
    c.bench_function("subscribe_unsubscribe", |b| {
        b.iter(|| {
            let subscription = bus.subscribe("chan", subscriber.clone());
            black_box(subscription.map(|s| s.unsubscribe()));
        })
    });
}

fn bench_publish_sync(c: &mut Criterion) {
    let mut group = c.benchmark_group("publish_sync");
    for n in [0, 1, 10, 100] {
        let (bus, _scheduler) = bus_with_subscribers(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, _| {
            b.iter(|| bus.publish_sync("chan", black_box(Bytes::from_static(b"x"))))
        });
    }
    group.finish();
}

fn bench_publish_deferred(c: &mut Criterion) {
    let mut group = c.benchmark_group("publish_deferred");
    for n in [1, 10, 100] {
        let (bus, scheduler) = bus_with_subscribers(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, _| {
            b.iter(|| {
                bus.publish("chan", black_box(Bytes::from_static(b"x")));
                scheduler.run_pending()
            })
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_subscribe_unsubscribe,
    bench_publish_sync,
    bench_publish_deferred,
);
criterion_main!(benches);
