//! Runs the demo binary: the process must exit 0 once the last task
//! terminates, with the interleaving the rotation dictates.

use std::process::Command;

fn run_demo() -> (bool, Vec<String>) {
    let output = Command::new(env!("CARGO_BIN_EXE_coop-tasking"))
        .env_remove("COOP_LOG")
        .output()
        .expect("failed to run demo binary");
    let stdout = String::from_utf8(output.stdout).expect("demo output is not utf-8");
    (
        output.status.success() && output.status.code() == Some(0),
        stdout.lines().map(str::to_owned).collect(),
    )
}

#[test]
fn demo_exits_successfully_after_last_task() {
    let (success, lines) = run_demo();
    assert!(success);
    assert_eq!(lines.first().map(String::as_str), Some("Starting tasking..."));
    assert_eq!(lines.get(1).map(String::as_str), Some("Yielding to tasks..."));
    assert_eq!(
        lines.last().map(String::as_str),
        Some("task_a\t: Hello! (Iter #31)")
    );
}

#[test]
fn demo_interleaves_round_robin() {
    let (_, lines) = run_demo();
    assert_eq!(
        lines[2..8],
        [
            "main\t: Hello! (Iter #0)",
            "task_a\t: Hello! (Iter #0)",
            "task_b\t: Hello! (Iter #0)",
            "main\t: Hello! (Iter #1)",
            "task_a\t: Hello! (Iter #1)",
            "task_b\t: Hello! (Iter #1)",
        ]
    );

    let count = |prefix: &str| lines.iter().filter(|l| l.starts_with(prefix)).count();
    assert_eq!(count("main"), 8);
    assert_eq!(count("task_a"), 32);
    assert_eq!(count("task_b"), 16);
}

#[test]
fn main_terminating_hands_off_to_task_a_first() {
    let (_, lines) = run_demo();
    let last_main = lines
        .iter()
        .rposition(|l| l.starts_with("main"))
        .expect("demo printed no main lines");
    assert_eq!(
        lines[last_main..last_main + 4],
        [
            "main\t: Hello! (Iter #7)",
            "task_a\t: Hello! (Iter #7)",
            "task_b\t: Hello! (Iter #7)",
            "task_a\t: Hello! (Iter #8)",
        ]
    );
    assert_eq!(lines[last_main + 4], "task_b\t: Hello! (Iter #8)");
}
