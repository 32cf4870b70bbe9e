//! Round-robin demo
//!
//! Several closures share the CPU. Each one returns after a few turns,
//! which terminates it; the process exits when the last one is done.

use coop_tasking::{create, current_id, logging, setup, task_count, terminate, yield_now};

const NUM_TASKS: usize = 4;
const TURNS: usize = 3;

fn main() {
    let _ = logging::init();
    setup().expect("tasking already set up");

    for i in 0..NUM_TASKS {
        create(move || {
            for turn in 0..TURNS + i {
                println!(
                    "Task {} ({}): turn {} of {}",
                    i,
                    current_id().unwrap(),
                    turn + 1,
                    TURNS + i
                );
                yield_now();
            }
            println!("Task {} done, {} tasks left", i, task_count() - 1);
        })
        .expect("failed to create task");
    }

    println!("Initializer handing over to {} tasks", NUM_TASKS);
    terminate();
}
