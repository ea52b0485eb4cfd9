//! tickflow binary: live ticker feed to CSV with gated EMAs.

use std::path::PathBuf;

use anyhow::Context;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use tickflow_pipeline::{PipelineConfig, TickerPipeline};

struct CliArgs {
    product_id: String,
    output: PathBuf,
}

fn print_usage(program: &str) {
    println!("Usage: {program} [options]");
    println!("Options:");
    println!("  -p, --product <ID>    Product ID to ingest (default: BTC-USD)");
    println!("  -o, --output <file>   Output CSV filename (default: ticker_data.csv)");
    println!("  -h, --help            Show this help message");
    println!();
    println!("Examples:");
    println!("  {program} -p ETH-USD -o eth_data.csv");
    println!("  {program} --product BTC-USD --output btc_ticker.csv");
}

/// Parse flags; `Ok(None)` means help was requested.
fn parse_args(mut argv: impl Iterator<Item = String>) -> Result<Option<CliArgs>, String> {
    let mut product_id = "BTC-USD".to_string();
    let mut output = PathBuf::from("ticker_data.csv");

    while let Some(arg) = argv.next() {
        match arg.as_str() {
            "-h" | "--help" => return Ok(None),
            "-p" | "--product" => {
                product_id = argv
                    .next()
                    .ok_or_else(|| format!("{arg} requires a value"))?;
            }
            "-o" | "--output" => {
                output = argv
                    .next()
                    .map(PathBuf::from)
                    .ok_or_else(|| format!("{arg} requires a value"))?;
            }
            other => return Err(format!("unknown argument: {other}")),
        }
    }

    Ok(Some(CliArgs { product_id, output }))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let mut argv = std::env::args();
    let program = argv.next().unwrap_or_else(|| "tickflow".to_string());
    let args = match parse_args(argv) {
        Ok(Some(args)) => args,
        Ok(None) => {
            print_usage(&program);
            return Ok(());
        }
        Err(msg) => {
            eprintln!("error: {msg}");
            print_usage(&program);
            std::process::exit(2);
        }
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    info!(
        product_id = %args.product_id,
        output = %args.output.display(),
        "starting ticker pipeline"
    );

    let pipeline = TickerPipeline::new(PipelineConfig {
        product_id: args.product_id,
        output_path: args.output,
        ..Default::default()
    });

    let shutdown = pipeline.shutdown_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("interrupt received, shutting down");
            shutdown.request();
        }
    });

    pipeline.run().await.context("pipeline terminated")?;
    Ok(())
}
