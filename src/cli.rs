use std::sync::Arc;

use anyhow::Context;
use clap::{ArgAction, Parser, Subcommand};
use tokio::io::BufReader;
use tracing::Level;

use crate::{
    engine::MatchingEngine,
    instrument::Pair,
    orderbook::OrderBook,
    pipeline::{PipelineConfig, run_pipeline},
    simulate::{SimConfig, SimReport, run_simulation},
    utils::shutdown_token,
};

/// Limit order matcher with price-time priority
#[derive(Parser)]
#[command(name = "exchange-matcher")]
#[command(version, about = "Matches limit orders per instrument and emits trades")]
struct Cli {
    /// Log verbosity on stderr (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Read JSON orders from stdin, write JSON trades to stdout
    Run {
        /// Worker tasks calling into the engine
        #[arg(long, default_value_t = 4)]
        workers: usize,
        /// Capacity of the internal order and trade channels
        #[arg(long, default_value_t = 1024)]
        capacity: usize,
    },
    /// Match a batch of random orders and report the timing
    Simulate {
        #[arg(long, default_value_t = 100_000)]
        orders: usize,
        /// Mean order amount
        #[arg(long, default_value_t = 500.0)]
        mean_amount: f64,
        /// Seed for a reproducible batch
        #[arg(long)]
        seed: Option<u64>,
        #[arg(long, default_value_t = 4)]
        workers: usize,
    },
    /// Simulate, then print one instrument's resting book
    Book {
        #[arg(long, default_value_t = 1_000)]
        orders: usize,
        #[arg(long)]
        seed: Option<u64>,
        /// Pair code, e.g. EUR-USD
        #[arg(long, default_value = "EUR-USD")]
        instrument: Pair,
    },
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

async fn handle_run(workers: usize, capacity: usize) -> anyhow::Result<()> {
    let cfg = PipelineConfig {
        workers,
        channel_capacity: capacity,
    };
    let engine = Arc::new(MatchingEngine::new());
    let stats = run_pipeline(
        engine,
        BufReader::new(tokio::io::stdin()),
        tokio::io::stdout(),
        &cfg,
        shutdown_token(),
    )
    .await
    .context("order pipeline failed")?;
    eprintln!(
        "read {} orders ({} undecodable), processed {}, rejected {}, published {} trades",
        stats.orders_read,
        stats.decode_errors,
        stats.orders_processed,
        stats.orders_rejected,
        stats.trades_published
    );
    Ok(())
}

fn print_report(report: &SimReport) {
    println!("------ Simulation ------");
    println!("Orders:    {}", report.orders);
    println!("Processed: {}", report.processed);
    println!("Rejected:  {}", report.rejected);
    println!("Trades:    {}", report.trades);
    println!("Volume:    {}", report.volume);
    println!("Elapsed:   {:?}", report.elapsed);
    println!("------------------------");
}

fn print_order_book(book: &OrderBook) {
    println!("------ Order Book {} ------", book.pair());
    println!("Bids (highest first):");
    for (price, total) in book.bids().depth() {
        println!("Price: {}, Total Amount: {}", price, total);
    }

    println!("Asks (lowest first):");
    for (price, total) in book.asks().depth() {
        println!("Price: {}, Total Amount: {}", price, total);
    }
    println!("--------------------------");
}

pub async fn run_cli() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match cli.command {
        Commands::Run { workers, capacity } => handle_run(workers, capacity).await,
        Commands::Simulate {
            orders,
            mean_amount,
            seed,
            workers,
        } => {
            let cfg = SimConfig {
                orders,
                mean_amount,
                seed,
            };
            let engine = Arc::new(MatchingEngine::new());
            let report = run_simulation(engine, &cfg, workers).await?;
            print_report(&report);
            Ok(())
        }
        Commands::Book {
            orders,
            seed,
            instrument,
        } => {
            let cfg = SimConfig {
                orders,
                seed,
                ..Default::default()
            };
            let engine = Arc::new(MatchingEngine::new());
            // A single worker keeps a seeded run reproducible.
            run_simulation(Arc::clone(&engine), &cfg, 1).await?;
            print_order_book(&engine.snapshot(instrument)?);
            Ok(())
        }
    }
}
