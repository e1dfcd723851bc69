//! Built-in functions available to drills.

use anyhow::{anyhow, Context, Result};
use calltap_runtime::Function;
use serde_json::{json, Value};

pub const FUNCTION_NAMES: &[&str] = &["square", "concat", "echo", "repeat"];

/// Upper bound on the output of `repeat`, in bytes
pub const MAX_REPEAT_BYTES: usize = 1 << 20;

/// Look up a catalog function by name
pub fn lookup(name: &str) -> Result<Function> {
    let f = match name {
        "square" => Function::new("square", ["x"], |args| {
            let x = args.get("x").and_then(Value::as_i64).context("square() expects an integer x")?;
            let squared = x
                .checked_mul(x)
                .ok_or_else(|| anyhow!("square() overflowed for {}", x))?;
            Ok(json!(squared))
        }),
        "concat" => Function::new("concat", ["posarg", "kwarg"], |args| {
            let a = args.str("posarg").context("concat() expects a string posarg")?;
            let b = args.str("kwarg").context("concat() expects a string kwarg")?;
            Ok(json!(format!("{a}{b}")))
        }),
        "echo" => Function::new("echo", ["value"], |args| {
            Ok(args.get("value").cloned().unwrap_or(Value::Null))
        }),
        "repeat" => Function::new("repeat", ["text", "times"], |args| {
            let text = args.str("text").context("repeat() expects a string text")?;
            let times = args
                .get("times")
                .and_then(Value::as_u64)
                .context("repeat() expects a non-negative integer times")?;
            let count = usize::try_from(times)
                .ok()
                .filter(|n| text.len().checked_mul(*n).is_some_and(|len| len <= MAX_REPEAT_BYTES))
                .ok_or_else(|| {
                    anyhow!(
                        "repeat() output would exceed {} bytes (times = {})",
                        MAX_REPEAT_BYTES,
                        times
                    )
                })?;
            Ok(json!(text.repeat(count)))
        })
        .with_default("times", 2),
        other => anyhow::bail!(
            "Unknown function '{}' (available: {})",
            other,
            FUNCTION_NAMES.join(", ")
        ),
    };
    Ok(f)
}
