//! Two tasks and the initializer taking turns until all of them are done.

use coop_tasking::{create, logging, setup, terminate, yield_now};

const MULTIPLIER: usize = 2;

fn task_a() {
    for i in 0..16 * MULTIPLIER {
        println!("task_a\t: Hello! (Iter #{})", i);
        yield_now();
    }

    terminate();
}

fn task_b() {
    for i in 0..8 * MULTIPLIER {
        println!("task_b\t: Hello! (Iter #{})", i);
        yield_now();
    }

    terminate();
}

fn main() {
    let _ = logging::init();

    println!("Starting tasking...");
    if let Err(e) = setup() {
        eprintln!("Failed to init tasking: {}", e);
        std::process::exit(1);
    }

    if let Err(e) = create(task_a) {
        eprintln!("Failed to create task_a: {}", e);
    }

    if let Err(e) = create(task_b) {
        eprintln!("Failed to create task_b: {}", e);
    }

    println!("Yielding to tasks...");
    for i in 0..4 * MULTIPLIER {
        println!("main\t: Hello! (Iter #{})", i);
        yield_now();
    }

    terminate();
}
