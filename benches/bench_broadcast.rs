//! Criterion benchmarks for the broadcast ring hot paths.

use std::sync::Arc;
use std::thread;

use criterion::{ black_box, criterion_group, criterion_main, Criterion };

use pulse::BroadcastRing;

const PAYLOAD_LEN: usize = 64;

fn bench_publish(c: &mut Criterion) {
    let ring = BroadcastRing::new(8, PAYLOAD_LEN).unwrap();
    let mut value: u64 = 0;

    c.bench_function("publish_64b", |b| {
        b.iter(|| {
            value = value.wrapping_add(1);
            ring
                .publish(|buf| {
                    buf[..8].copy_from_slice(&black_box(value).to_le_bytes());
                    Ok(())
                })
                .unwrap()
        })
    });
}

fn bench_read_latest(c: &mut Criterion) {
    let ring = BroadcastRing::new(8, PAYLOAD_LEN).unwrap();
    ring
        .publish(|buf| {
            buf.fill(0x5a);
            Ok(())
        })
        .unwrap();

    c.bench_function("read_latest_64b", |b| {
        b.iter(|| {
            let mut sink = [0u8; PAYLOAD_LEN];
            let outcome = ring
                .read_latest(|payload, _| {
                    sink.copy_from_slice(payload);
                    Ok(())
                })
                .unwrap();
            black_box((outcome, sink))
        })
    });
}

fn bench_read_under_contention(c: &mut Criterion) {
    let ring = Arc::new(BroadcastRing::new(8, PAYLOAD_LEN).unwrap());
    let writer_ring = ring.clone();
    let stop = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let writer_stop = stop.clone();

    let writer = thread::spawn(move || {
        let mut value: u64 = 0;
        while !writer_stop.load(std::sync::atomic::Ordering::Relaxed) {
            value = value.wrapping_add(1);
            writer_ring
                .publish(|buf| {
                    buf[..8].copy_from_slice(&value.to_le_bytes());
                    Ok(())
                })
                .unwrap();
        }
    });

    c.bench_function("read_latest_64b_contended", |b| {
        b.iter(|| {
            let mut sink = [0u8; PAYLOAD_LEN];
            let outcome = ring
                .read_latest(|payload, _| {
                    sink.copy_from_slice(payload);
                    Ok(())
                })
                .unwrap();
            black_box((outcome, sink))
        })
    });

    stop.store(true, std::sync::atomic::Ordering::SeqCst);
    writer.join().unwrap();
}

criterion_group!(benches, bench_publish, bench_read_latest, bench_read_under_contention);
criterion_main!(benches);
