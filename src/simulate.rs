//! Synthetic order flow for demos and benchmarks.
//!
//! Generates a batch of random limit orders and pushes them through a
//! [`MatchingEngine`] on a pool of worker tasks, timing the whole run.
//!
//! ## Order shape
//!
//! - side: `Buy` or `Sell` with equal probability
//! - price: buys uniform in `250..=500`, sells uniform in `0..=250`, so most
//!   incoming orders find something to cross
//! - amount: `Exp1 * mean_amount`, rounded up (never zero), giving
//!   heavy-tailed sizes around `mean_amount`
//! - instrument: uniform over [`Pair::supported`]
//! - id: `order-{i}`
//!
//! With a `seed` the batch is reproducible; the matching itself is not, since
//! workers race for the book locks.

use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use rand::{Rng, SeedableRng, rngs::StdRng, seq::IndexedRandom};
use rand_distr::Exp1;
use tokio::sync::mpsc;
use tracing::info;

use crate::{
    engine::MatchingEngine,
    errors::PipelineError,
    instrument::{EUR_USD, Pair},
    orders::{Order, Side},
    pipeline::spawn_workers,
};

#[derive(Debug, Clone)]
pub struct SimConfig {
    /// How many orders to generate.
    pub orders: usize,
    pub mean_amount: f64,
    pub seed: Option<u64>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            orders: 100_000,
            mean_amount: 500.0,
            seed: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SimReport {
    pub orders: usize,
    pub processed: u64,
    pub rejected: u64,
    pub trades: u64,
    pub volume: u64,
    pub elapsed: Duration,
}

pub fn random_order<R: Rng>(rng: &mut R, i: usize, mean_amount: f64) -> Order {
    let side = if rng.random_bool(0.5) {
        Side::Buy
    } else {
        Side::Sell
    };
    let price = match side {
        Side::Buy => rng.random_range(250..=500),
        Side::Sell => rng.random_range(0..=250),
    };
    let raw: f64 = rng.sample(Exp1);
    let amount = (raw * mean_amount).ceil().max(1.0) as u64;
    let instrument = *Pair::supported().choose(rng).unwrap_or(&EUR_USD);
    Order::new(format!("order-{i}"), side, price, amount, instrument)
}

pub fn generate_orders(cfg: &SimConfig) -> Vec<Order> {
    let mut rng = match cfg.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };
    (0..cfg.orders)
        .map(|i| random_order(&mut rng, i, cfg.mean_amount))
        .collect()
}

/// Generates `cfg.orders` orders and matches them on `workers` tasks
/// against `engine`.
///
/// # Errors
/// [`PipelineError::NoWorkers`] if `workers` is zero, or a worker task
/// panicking.
pub async fn run_simulation(
    engine: Arc<MatchingEngine>,
    cfg: &SimConfig,
    workers: usize,
) -> Result<SimReport, PipelineError> {
    if workers == 0 {
        return Err(PipelineError::NoWorkers);
    }
    let orders = generate_orders(cfg);
    let count = orders.len();

    let (order_tx, order_rx) = mpsc::channel::<Order>(1024);
    let (trade_tx, mut trade_rx) = mpsc::channel(1024);

    let start = Instant::now();
    let handles = spawn_workers(workers, &engine, order_rx, trade_tx);
    let feeder = tokio::spawn(async move {
        for order in orders {
            if order_tx.send(order).await.is_err() {
                break;
            }
        }
    });

    let (mut trades, mut volume) = (0u64, 0u64);
    while let Some(batch) = trade_rx.recv().await {
        trades += batch.len() as u64;
        volume += batch.iter().map(|t| t.amount).sum::<u64>();
    }
    feeder.await?;

    let mut report = SimReport {
        orders: count,
        processed: 0,
        rejected: 0,
        trades,
        volume,
        elapsed: Duration::ZERO,
    };
    for handle in handles {
        let ws = handle.await?;
        report.processed += ws.processed;
        report.rejected += ws.rejected;
    }
    report.elapsed = start.elapsed();

    info!(
        orders = count,
        trades,
        volume,
        "processing {} orders took {:?}",
        count,
        report.elapsed
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seeded_generation_is_reproducible() {
        let cfg = SimConfig {
            orders: 50,
            mean_amount: 10.0,
            seed: Some(7),
        };
        assert_eq!(generate_orders(&cfg), generate_orders(&cfg));
    }

    #[test]
    fn test_generated_orders_are_well_formed() {
        let cfg = SimConfig {
            orders: 2_000,
            mean_amount: 3.0,
            seed: Some(42),
        };
        for (i, o) in generate_orders(&cfg).iter().enumerate() {
            assert_eq!(o.id, format!("order-{i}"));
            assert!(o.amount >= 1);
            assert!(o.validate().is_ok());
            assert!(Pair::supported().contains(&o.instrument));
            match o.side {
                Side::Buy => assert!((250..=500).contains(&o.price)),
                Side::Sell => assert!(o.price <= 250),
            }
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_simulation_conserves_quantity() {
        let cfg = SimConfig {
            orders: 5_000,
            mean_amount: 20.0,
            seed: Some(1),
        };
        let submitted: u64 = generate_orders(&cfg).iter().map(|o| o.amount).sum();
        let engine = Arc::new(MatchingEngine::new());

        let report = run_simulation(Arc::clone(&engine), &cfg, 4).await.unwrap();

        assert_eq!(report.processed, 5_000);
        assert_eq!(report.rejected, 0);
        let resting: u64 = Pair::supported()
            .iter()
            .map(|&p| {
                let book = engine.snapshot(p).unwrap();
                book.bids().total_amount() + book.asks().total_amount()
            })
            .sum();
        assert_eq!(submitted, 2 * report.volume + resting);
    }
}
