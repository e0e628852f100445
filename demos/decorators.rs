//! Wrapping demonstration.
//!
//! This example walks through the classic decorator exercises, built with
//! explicit composition:
//! 1. Prettify a function's string output
//! 2. Guard a division against a zero divisor
//! 3. Check argument types before repeating text
//! 4. Measure execution time
//! 5. Validate numeric parameters and log every call
//! 6. Validate that a result is numeric
//! 7. Normalise arguments before the target sees them
//!
//! Run with: `cargo run --example decorators`

use std::fmt;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use wrap_core::{
    arg_kind, each_arg, infallible, operation, Args, CallLog, Operation, TracingSink, Value,
    ValueKind, Wrap,
};

#[derive(Debug)]
struct DivideByZero;

impl fmt::Display for DivideByZero {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("division by zero")
    }
}

impl std::error::Error for DivideByZero {}

fn capitalize(s: String) -> String {
    let lower = s.to_lowercase();
    let mut chars = lower.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => lower,
    }
}

fn product(args: &Args) -> Value {
    let mut ints = Some(1i64);
    let mut floats = 1.0;
    for v in args.positional() {
        ints = ints.zip(v.as_i64()).and_then(|(acc, n)| acc.checked_mul(n));
        floats *= v.as_f64().unwrap_or(f64::NAN);
    }
    ints.map_or(Value::Float(floats), Value::Int)
}

fn add(args: &Args) -> Value {
    match (args.get(0), args.get(1)) {
        (Some(Value::Int(a)), Some(Value::Int(b))) => {
            a.checked_add(*b).map_or(Value::Bool(false), Value::Int)
        }
        (Some(Value::Str(a)), Some(Value::Str(b))) => Value::Str(format!("{}{}", a, b)),
        (Some(a), Some(b)) => a
            .as_f64()
            .zip(b.as_f64())
            .map_or(Value::Bool(false), |(a, b)| Value::Float(a + b)),
        _ => Value::Bool(false),
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_target(false)
        .init();

    println!("=== Wrapping Example ===\n");

    // Scenario 1: Output transform
    println!("--- Scenario 1: Prettify ---");

    for ugly in ["deVUelVO aLgO FeO", "He hErEdaDO un CaMafeo mUy fEO"] {
        let pretty = Wrap::new(infallible("ugly", move |_: &()| ugly.to_string()))
            .transform_output(capitalize)
            .transform_output(|s: String| s.replace("feo", "bonito"))
            .build();
        match pretty.invoke(&()) {
            Ok(s) => println!("✓ {:?} -> {:?}", ugly, s),
            Err(e) => println!("✗ {}", e),
        }
    }

    // Scenario 2: Input guard
    println!("\n--- Scenario 2: Division guard ---");

    let divide = Wrap::new(operation("divide", |&(x, y): &(f64, f64)| {
        if y == 0.0 {
            Err(DivideByZero)
        } else {
            Ok(x / y)
        }
    }))
    .validate_inputs("y != 0", |&(_, y): &(f64, f64)| y != 0.0)
    .build();

    for input in [(8.0, 2.0), (1.0, 0.0)] {
        match divide.invoke(&input) {
            Ok(q) => println!("✓ divide{:?} = {}", input, q),
            Err(e) => println!("✗ {}", e),
        }
    }

    // Scenario 3: Argument types
    println!("\n--- Scenario 3: Typed arguments ---");

    let repeat = Wrap::new(infallible("repeat_text", |args: &Args| {
        let text = args.get(0).and_then(Value::as_str).unwrap_or_default();
        let count = args.get(1).and_then(Value::as_i64).unwrap_or_default();
        text.repeat(usize::try_from(count).unwrap_or_default())
    }))
    .check_inputs(arg_kind(0, ValueKind::Str))
    .check_inputs(arg_kind(1, ValueKind::Int))
    .build();

    for args in [
        Args::new().arg("Hola").arg("Mundo"),
        Args::new().arg(2).arg("Mundo"),
        Args::new().arg("Hola").arg(3),
    ] {
        match repeat.invoke(&args) {
            Ok(s) => println!("✓ repeat_text{} = {:?}", args, s),
            Err(e) => println!("✗ {}", e),
        }
    }

    // Scenario 4: Timing
    println!("\n--- Scenario 4: Execution time ---");

    let slow_echo = Wrap::new(infallible("slow_echo", |args: &Args| {
        thread::sleep(Duration::from_millis(100));
        args.get(0).cloned()
    }))
    .measure_time(Arc::new(TracingSink))
    .build();

    for args in [
        Args::new().arg("Hola"),
        Args::new()
            .named("m1", "Hola")
            .named("m2", "Adios")
            .named("m3", "Hasta Luego"),
    ] {
        match slow_echo.invoke(&args) {
            Ok(v) => println!("✓ slow_echo{} = {:?}", args, v),
            Err(e) => println!("✗ {}", e),
        }
    }

    // Scenario 5: Parameter validation plus logging
    println!("\n--- Scenario 5: Validated and logged ---");

    let log = Arc::new(CallLog::new());
    let volume = Wrap::new(infallible("volume", product))
        .check_inputs(each_arg("positive number", |v| {
            v.as_f64().is_some_and(|x| x >= 0.0)
        }))
        .log_call(log.clone())
        .log_call(Arc::new(TracingSink))
        .build();

    for args in [
        Args::new().arg(2).arg(3).arg(12),
        Args::new().arg(23).arg(-25).arg(1),
        Args::new().arg(2.5).arg(4).arg(1),
    ] {
        match volume.invoke(&args) {
            Ok(v) => println!("✓ volume{} = {}", args, v),
            Err(e) => println!("✗ {}", e),
        }
    }

    println!("\nCall log:");
    log.with_calls(|calls| {
        for call in calls {
            println!(
                "  #{} {}{} = {}",
                call.seq(),
                call.operation(),
                call.args(),
                call.output()
            );
        }
    });

    // Scenario 6: Output validation
    println!("\n--- Scenario 6: Numeric result ---");

    let sum = Wrap::new(infallible("sum", add))
        .validate_output("is numeric", Value::is_numeric)
        .build();

    for args in [Args::new().arg(3).arg(5), Args::new().arg("3").arg("5")] {
        match sum.invoke(&args) {
            Ok(v) => println!("✓ sum{} = {}", args, v),
            Err(e) => println!("✗ {}", e),
        }
    }

    // Scenario 7: Input transform
    println!("\n--- Scenario 7: Normalised greeting ---");

    let greet = Wrap::new(infallible("greet", |name: &String| format!("Hola {}", name)))
        .validate_inputs("not blank", |name: &String| !name.trim().is_empty())
        .transform_inputs(|name: &String| capitalize(name.trim().to_string()))
        .log_call(Arc::new(TracingSink))
        .build();

    for name in ["  pEDRO ", "   "] {
        match greet.invoke(&name.to_string()) {
            Ok(s) => println!("✓ greet({:?}) = {:?}", name, s),
            Err(e) => println!("✗ {}", e),
        }
    }

    println!("\n=== Example Complete ===");
}
