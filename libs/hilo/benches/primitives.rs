// Copyright 2025 Jonas Kruckenberg
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

use std::hint::black_box;
use std::sync::Arc;

use criterion::{Criterion, criterion_group, criterion_main};
use hilo::{Condvar, Mutex, Thread, raw};

fn spawn_join(c: &mut Criterion) {
    fn nothing((): ()) {}

    c.bench_function("raw_create_join", |b| {
        b.iter(|| {
            let thread = raw::create(nothing, ()).unwrap();
            raw::join(thread);
        });
    });

    c.bench_function("thread_new_join", |b| {
        b.iter(|| {
            let mut thread = Thread::new(|| {
                black_box(());
            });
            thread.join();
        });
    });
}

fn uncontended_lock(c: &mut Criterion) {
    let mutex = Mutex::new();

    c.bench_function("mutex_lock_unlock", |b| {
        b.iter(|| {
            mutex.lock();
            // Safety: locked right above
            unsafe { mutex.unlock() };
        });
    });

    c.bench_function("mutex_guard", |b| {
        b.iter(|| {
            let guard = mutex.guard();
            black_box(&guard);
        });
    });
}

fn ping_pong(c: &mut Criterion) {
    const ROUNDS: usize = 1_000;

    struct Table {
        mutex: Mutex,
        cond: Condvar,
        turn: std::sync::atomic::AtomicUsize,
    }

    c.bench_function("condvar_ping_pong_1k", |b| {
        b.iter(|| {
            use std::sync::atomic::Ordering;

            let table = Arc::new(Table {
                mutex: Mutex::new(),
                cond: Condvar::new(),
                turn: std::sync::atomic::AtomicUsize::new(0),
            });

            let mut pong = Thread::new({
                let table = table.clone();
                move || {
                    let mut guard = table.mutex.guard();
                    for round in 0..ROUNDS {
                        while table.turn.load(Ordering::Relaxed) != 2 * round + 1 {
                            table.cond.wait(&mut guard);
                        }
                        table.turn.store(2 * round + 2, Ordering::Relaxed);
                        table.cond.signal();
                    }
                }
            });

            let mut guard = table.mutex.guard();
            for round in 0..ROUNDS {
                while table.turn.load(Ordering::Relaxed) != 2 * round {
                    table.cond.wait(&mut guard);
                }
                table.turn.store(2 * round + 1, Ordering::Relaxed);
                table.cond.signal();
            }
            drop(guard);

            pong.join();
        });
    });
}

criterion_group!(benches, spawn_join, uncontended_lock, ping_pong);
criterion_main!(benches);
