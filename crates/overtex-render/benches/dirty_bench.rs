//! Benchmarks for dirty-region tracking and the dirty-rect encoder.
//!
//! Run with: cargo bench -p overtex-render --bench dirty_bench

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use overtex_core::geometry::Rect;
use overtex_render::dirty::DirtyRegionTracker;
use overtex_render::protocol::{DirtyRectEncoder, dirty_buffer_len};
use std::hint::black_box;

/// Deterministic pseudo-random rects (xorshift) inside a 1024x1024 area.
fn rects(count: usize, max_size: i32) -> Vec<Rect> {
    let mut state = 0x9E37_79B9u32;
    let mut next = move || {
        state ^= state << 13;
        state ^= state >> 17;
        state ^= state << 5;
        state
    };
    (0..count)
        .map(|_| {
            let x = (next() % 1024) as i32;
            let y = (next() % 1024) as i32;
            let w = 1 + (next() % max_size as u32) as i32;
            let h = 1 + (next() % max_size as u32) as i32;
            Rect::new(x, y, w, h)
        })
        .collect()
}

// =============================================================================
// add_dirty_rect
// =============================================================================

fn bench_add(c: &mut Criterion) {
    let mut group = c.benchmark_group("dirty/add");

    for (count, max_size) in [(16, 32), (64, 64), (256, 128)] {
        let input = rects(count, max_size);
        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(
            BenchmarkId::new("random", format!("{count}x{max_size}")),
            &input,
            |b, input| {
                b.iter(|| {
                    let mut t = DirtyRegionTracker::new();
                    for r in input {
                        t.add_dirty_rect(*r);
                    }
                    black_box(t.len())
                })
            },
        );
    }

    // Repeated marks of the same widget area, the common steady state.
    let same = vec![Rect::new(100, 100, 64, 32); 64];
    group.bench_with_input(BenchmarkId::new("repeated", "64"), &same, |b, input| {
        b.iter(|| {
            let mut t = DirtyRegionTracker::new();
            for r in input {
                t.add_dirty_rect(*r);
            }
            black_box(t.len())
        })
    });

    group.finish();
}

// =============================================================================
// encode
// =============================================================================

fn bench_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("dirty/encode");
    let enc = DirtyRectEncoder::default();

    for count in [8, 64, 256] {
        let input = rects(count, 16);
        let mut buf = vec![0u8; dirty_buffer_len(1024)];
        group.bench_with_input(BenchmarkId::new("fits", count), &input, |b, input| {
            b.iter(|| {
                let mut t = DirtyRegionTracker::new();
                for r in input {
                    t.add_dirty_rect(*r);
                }
                black_box(enc.encode_tracker(1, &mut t, 1024, 1024, &mut buf))
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_add, bench_encode);
criterion_main!(benches);
