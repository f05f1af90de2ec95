//! Basic logging example demonstrating chains and output formats.
//!
//! Run with: LOG_LEVEL=debug cargo run --example basic_logging -- <format>
//! Where <format> is one of: pretty, compact, json

use chainlog::{chain_with, Log, LogConfig, LogFormat, Value, WrappedLogger};
use std::env;
use std::str::FromStr;

fn main() -> anyhow::Result<()> {
    let args: Vec<String> = env::args().collect();
    let format_str = args.get(1).map(|s| s.as_str()).unwrap_or("pretty");

    let format = LogFormat::from_str(format_str).unwrap_or(LogFormat::Pretty);

    println!("Initializing with format: {:?}", format);
    let config = LogConfig::from_env()?
        .with_format(format)
        .with_output("stdout");
    let logger = WrappedLogger::new("example", &config, &[Value::from("pid"), Value::from(std::process::id())])?;

    logger.infow("Application started", &[]);

    // Leveled calls through a chain
    let chain = logger.chain();
    chain.debug("This is a debug message", &[]);
    chain.info("This is an info message", &[]);
    chain.warn("This is a warning message", &[]);

    // Context accumulates without touching the parent
    let request = chain
        .with_string("request_id", "abc123")
        .with_i64("duration_ms", 42);
    request.info("Processing request", &[]);

    let result = process_file(&request, "/path/to/file");
    chain.info("File processing result: %v", &[Value::from(result)]);

    // Legacy key/value conventions
    chain_with(&chain, &[Value::from("user"), Value::from("ada")]).log(&[
        Value::from("warn"),
        Value::from("quota nearly exhausted"),
        Value::from("used_pct"),
        Value::from(93),
    ])?;

    chain.debug("Application shutting down", &[]);
    logger.sync()?;

    Ok(())
}

fn process_file(chain: &chainlog::Chain, path: &str) -> String {
    let chain = chain.with_string("path", path);
    chain.debug("Starting file processing", &[]);

    let result = format!("Processed: {}", path);
    chain.with_string("result", result.as_str()).debug("File processing complete", &[]);

    result
}
