//! Tasks creating tasks
//!
//! Each task spawns its successor before finishing. A new task joins the
//! tail of the rotation, so it runs on the next pass.

use coop_tasking::{create, current_id, setup, terminate, yield_now};

const DEPTH: u32 = 5;

fn link(n: u32) {
    println!("link {} running as {}", n, current_id().unwrap());
    if n < DEPTH {
        create(move || link(n + 1)).expect("failed to create next link");
    }
    yield_now();
    println!("link {} finished", n);
}

fn main() {
    setup().expect("tasking already set up");
    create(|| link(1)).expect("failed to create first link");

    while coop_tasking::task_count() > 1 {
        yield_now();
    }

    println!("chain complete");
    terminate();
}
