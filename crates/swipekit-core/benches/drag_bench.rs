#![forbid(unsafe_code)]

use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;
use swipekit_core::{
    DragConfig, DragController, GestureConfig, GestureSignal, GestureTracker, Point, TouchEvent,
};
use web_time::{Duration, Instant};

fn swipe(tracker: &mut GestureTracker, drag: &mut DragController, steps: u16, t0: Instant) {
    tracker.process(&TouchEvent::Start(Point::new(320.0, 40.0)), t0);
    drag.grab(t0);
    let mut now = t0;
    for step in 0..steps {
        now += Duration::from_millis(8);
        let pos = Point::new(320.0 - f32::from(step) * 3.0, 40.0 + f32::from(step % 3));
        for signal in tracker.process(&TouchEvent::Move(pos), now) {
            if let GestureSignal::Drag { delta_x, .. } = signal {
                black_box(drag.drag_to(delta_x));
            }
        }
    }
    now += Duration::from_millis(8);
    for signal in tracker.process(&TouchEvent::End(Point::new(0.0, 40.0)), now) {
        if let GestureSignal::Released(info) = signal {
            black_box(drag.release(false, &info, now));
        }
    }
}

fn bench_swipe_lifecycle(c: &mut Criterion) {
    let mut group = c.benchmark_group("swipe/row/lifecycle");

    for steps in [32u16, 120] {
        group.bench_function(format!("start_move_{steps}_release"), |b| {
            b.iter(|| {
                let mut tracker = GestureTracker::new(GestureConfig::default());
                let mut drag = DragController::new(DragConfig::default());
                swipe(&mut tracker, &mut drag, steps, Instant::now());
                black_box(drag.resting_offset());
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_swipe_lifecycle);
criterion_main!(benches);
