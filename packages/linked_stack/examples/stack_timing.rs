//! Times repeated push-then-pop cycles on a stack under each node allocation strategy and on a
//! `Vec`, printing the elapsed wall-clock time for each.
//!
//! Run with `cargo run --release --example stack_timing`.

use std::hint::black_box;
use std::time::{Duration, Instant};

use linked_stack::{AllocationStrategy, LinkedStack, PoolStrategy, SystemStrategy};

const ELEMS: usize = 1_000_000;
const REPS: usize = 50;

fn main() {
    println!("Using the system allocator...");
    let elapsed = time_stack(&SystemStrategy::new());
    println!("System allocator time: {:.3}s", elapsed.as_secs_f64());
    println!();

    println!("Using the slot pool...");
    let elapsed = time_stack(&PoolStrategy::default());
    println!("Slot pool time: {:.3}s", elapsed.as_secs_f64());
    println!();

    println!("Using Vec...");
    let elapsed = time_vec();
    println!("Vec time: {:.3}s", elapsed.as_secs_f64());
}

fn time_stack<S: AllocationStrategy>(strategy: &S) -> Duration {
    let mut stack = LinkedStack::<usize, S>::with_strategy(strategy)
        .expect("the strategy must be able to allocate stack nodes");

    let start = Instant::now();

    for _ in 0..REPS {
        for value in 0..ELEMS {
            stack
                .push(black_box(value))
                .expect("the system must be able to provide memory for the benchmark");
        }

        for _ in 0..ELEMS {
            _ = black_box(stack.pop());
        }
    }

    start.elapsed()
}

fn time_vec() -> Duration {
    let mut stack = Vec::new();

    let start = Instant::now();

    for _ in 0..REPS {
        for value in 0..ELEMS {
            stack.push(black_box(value));
        }

        for _ in 0..ELEMS {
            _ = black_box(stack.pop());
        }
    }

    start.elapsed()
}
