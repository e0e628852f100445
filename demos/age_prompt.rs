//! Validated prompt demonstration.
//!
//! Wraps a function that reads a line from standard input with output checks,
//! so the same validation applies to every prompt it decorates:
//! 1. The answer must be a whole number
//! 2. The number must lie within 0..=120
//!
//! Run with: `cargo run --example age_prompt`

use std::io::{self, BufRead, Write};

use wrap_core::{operation, Operation, Wrap, Wrapper};

const MAX_AGE: u32 = 120;

fn is_whole_number(answer: &String) -> bool {
    !answer.is_empty() && answer.chars().all(|c| c.is_ascii_digit())
}

fn within_limits(answer: &String) -> bool {
    answer.parse::<u32>().is_ok_and(|n| n <= MAX_AGE)
}

/// Builds a prompt operation whose answer must be a number in 0..=120.
fn bounded_prompt(
    question: &'static str,
) -> Wrapper<impl Operation<(), Output = String>, (), String> {
    let ask = operation(question, move |_: &()| -> io::Result<String> {
        print!("{}: ", question);
        io::stdout().flush()?;
        let mut line = String::new();
        io::stdin().lock().read_line(&mut line)?;
        Ok(line.trim().to_string())
    });

    Wrap::new(ask)
        .validate_output("whole number", is_whole_number)
        .validate_output("0..=120", within_limits)
        .build()
}

fn main() {
    tracing_subscriber::fmt().with_target(false).init();

    for prompt in [
        bounded_prompt("Enter your age"),
        bounded_prompt("Enter the garage area"),
    ] {
        match prompt.invoke(&()) {
            Ok(answer) => println!("✓ {} -> {}", prompt.name(), answer),
            Err(e) => println!("✗ {}", e),
        }
    }
}
