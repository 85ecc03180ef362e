use std::path::PathBuf;
use std::process;

use sched_replay::{DEFAULT_ENDPOINT, DEFAULT_INPUT, HarnessConfig, ReplayDriver};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    init_tracing();

    let args: Vec<String> = std::env::args().collect();
    let config = match parse_args(&args) {
        Ok(config) => config,
        Err(msg) => {
            if !msg.is_empty() {
                eprintln!("error: {msg}");
                eprintln!();
            }
            eprintln!("Usage: sched-replay [endpoint_path] [input_file]");
            eprintln!();
            eprintln!("Arguments:");
            eprintln!("  [endpoint_path]   Unix socket path to listen on [default: {DEFAULT_ENDPOINT}]");
            eprintln!("  [input_file]      JSON array of timeframes [default: {DEFAULT_INPUT}]");
            process::exit(2);
        }
    };

    if !config.input.exists() {
        eprintln!("error: input file '{}' not found", config.input.display());
        process::exit(1);
    }

    match ReplayDriver::new(config).run().await {
        Ok(summary) => {
            println!("total timeframes: {}", summary.timeframes_loaded);
            println!("responses received: {}", summary.ticks_received);
        }
        Err(err) => {
            eprintln!("error: {err}");
            process::exit(1);
        }
    }
}

fn parse_args(args: &[String]) -> Result<HarnessConfig, String> {
    let mut positional: Vec<&str> = Vec::new();

    for arg in &args[1..] {
        match arg.as_str() {
            "--help" | "-h" => return Err(String::new()),
            flag if flag.starts_with('-') => return Err(format!("unknown flag: {flag}")),
            value => positional.push(value),
        }
    }

    if positional.len() > 2 {
        return Err(format!("unexpected argument: {}", positional[2]));
    }

    let endpoint = positional.first().copied().unwrap_or(DEFAULT_ENDPOINT);
    let input = positional.get(1).copied().unwrap_or(DEFAULT_INPUT);

    Ok(HarnessConfig::new(
        PathBuf::from(endpoint),
        PathBuf::from(input),
    ))
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
