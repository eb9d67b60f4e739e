//! Worker pipeline around the [`MatchingEngine`].
//!
//! Orders arrive as newline-delimited JSON, are matched by a pool of worker
//! tasks sharing one engine, and the resulting trades leave as
//! newline-delimited JSON:
//!
//! ```text
//! reader ─ ingest ─▶ [orders] ─▶ worker 0..N ─▶ [trades] ─▶ publish ─ writer
//! ```
//!
//! Both channels are bounded, so a slow writer pushes back on the workers and a
//! busy pool pushes back on ingestion. Orders for one instrument are matched in
//! whatever order the workers reach that instrument's lock.

use std::sync::Arc;

use tokio::{
    io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt},
    sync::{Mutex, mpsc},
    task::JoinHandle,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::{engine::MatchingEngine, errors::PipelineError, orders::Order, trade::Trade};

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Number of worker tasks calling into the engine.
    pub workers: usize,
    /// Capacity of the order and trade channels.
    pub channel_capacity: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            workers: 4,
            channel_capacity: 1024,
        }
    }
}

/// Counters reported once the pipeline has drained.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipelineStats {
    pub orders_read: u64,
    pub orders_processed: u64,
    pub orders_rejected: u64,
    pub decode_errors: u64,
    pub trades_published: u64,
}

#[derive(Debug, Default)]
pub(crate) struct WorkerStats {
    pub processed: u64,
    pub rejected: u64,
}

pub(crate) type SharedOrders = Arc<Mutex<mpsc::Receiver<Order>>>;

async fn worker(
    id: usize,
    engine: Arc<MatchingEngine>,
    orders: SharedOrders,
    trades: mpsc::Sender<Vec<Trade>>,
) -> WorkerStats {
    let mut stats = WorkerStats::default();
    loop {
        let next = orders.lock().await.recv().await;
        let Some(order) = next else { break };
        let order_id = order.id.clone();

        match engine.process(order) {
            Ok(fills) => {
                stats.processed += 1;
                debug!(worker = id, order = %order_id, trades = fills.len(), "processed order");
                if !fills.is_empty() && trades.send(fills).await.is_err() {
                    warn!(worker = id, "trade channel closed, stopping");
                    break;
                }
            }
            Err(e) => {
                stats.rejected += 1;
                warn!(worker = id, order = %order_id, error = %e, "rejected order");
            }
        }
    }
    stats
}

/// Starts `count` workers draining `orders` into `trades`.
///
/// Workers exit once the order channel is closed and empty.
pub(crate) fn spawn_workers(
    count: usize,
    engine: &Arc<MatchingEngine>,
    orders: mpsc::Receiver<Order>,
    trades: mpsc::Sender<Vec<Trade>>,
) -> Vec<JoinHandle<WorkerStats>> {
    let orders: SharedOrders = Arc::new(Mutex::new(orders));
    (0..count)
        .map(|id| {
            tokio::spawn(worker(
                id,
                Arc::clone(engine),
                Arc::clone(&orders),
                trades.clone(),
            ))
        })
        .collect()
}

/// Reads orders line by line until EOF or cancellation.
///
/// Returns `(orders_read, decode_errors)`.
async fn ingest<R>(
    reader: R,
    orders: mpsc::Sender<Order>,
    cancel: CancellationToken,
) -> std::io::Result<(u64, u64)>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    let (mut read, mut decode_errors) = (0u64, 0u64);
    loop {
        let line = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                info!("shutdown requested, stopping ingestion");
                break;
            }
            line = lines.next_line() => line?,
        };
        let Some(line) = line else { break };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match Order::from_json(line.as_bytes()) {
            Ok(order) => {
                read += 1;
                if orders.send(order).await.is_err() {
                    break;
                }
            }
            Err(e) => {
                decode_errors += 1;
                warn!(error = %e, "dropping undecodable order");
            }
        }
    }
    Ok((read, decode_errors))
}

/// Writes each batch of trades as JSON lines until every worker has hung up.
async fn publish<W>(
    trades: &mut mpsc::Receiver<Vec<Trade>>,
    writer: &mut W,
    published: &mut u64,
) -> Result<(), PipelineError>
where
    W: AsyncWrite + Unpin,
{
    while let Some(batch) = trades.recv().await {
        for trade in batch {
            let line = trade.to_json().map_err(PipelineError::Encode)?;
            writer.write_all(line.as_bytes()).await?;
            writer.write_all(b"\n").await?;
            *published += 1;
        }
    }
    writer.flush().await?;
    Ok(())
}

/// Runs the full ingest → match → publish pipeline until `reader` is exhausted
/// or `cancel` fires, then drains every in-flight order.
///
/// # Errors
/// - [`PipelineError::NoWorkers`] if `cfg.workers` is zero
/// - I/O errors from either end, and trade encoding failures
///
/// A failed write stops ingestion and waits for every task to finish before
/// the error is returned. Trades matched after that point are not published.
/// `cancel` itself is never cancelled here.
///
/// Undecodable lines and rejected orders are only counted and logged.
pub async fn run_pipeline<R, W>(
    engine: Arc<MatchingEngine>,
    reader: R,
    mut writer: W,
    cfg: &PipelineConfig,
    cancel: CancellationToken,
) -> Result<PipelineStats, PipelineError>
where
    R: AsyncBufRead + Unpin + Send + 'static,
    W: AsyncWrite + Unpin,
{
    if cfg.workers == 0 {
        return Err(PipelineError::NoWorkers);
    }
    let capacity = cfg.channel_capacity.max(1);
    let (order_tx, order_rx) = mpsc::channel::<Order>(capacity);
    let (trade_tx, mut trade_rx) = mpsc::channel::<Vec<Trade>>(capacity);

    let stop = cancel.child_token();
    let ingest_task = tokio::spawn(ingest(reader, order_tx, stop.clone()));
    let workers = spawn_workers(cfg.workers, &engine, order_rx, trade_tx);
    info!(workers = cfg.workers, "pipeline started");

    let mut stats = PipelineStats::default();
    if let Err(e) = publish(&mut trade_rx, &mut writer, &mut stats.trades_published).await {
        warn!(error = %e, published = stats.trades_published, "publishing failed, stopping");
        stop.cancel();
        // Closing the trade channel makes the workers stop at their next send.
        drop(trade_rx);
        if let Err(join) = ingest_task.await {
            warn!(error = %join, "ingest task failed");
        }
        for handle in workers {
            if let Err(join) = handle.await {
                warn!(error = %join, "worker task failed");
            }
        }
        return Err(e);
    }

    let (read, decode_errors) = ingest_task.await??;
    stats.orders_read = read;
    stats.decode_errors = decode_errors;
    for handle in workers {
        let ws = handle.await?;
        stats.orders_processed += ws.processed;
        stats.orders_rejected += ws.rejected;
    }
    info!(?stats, "pipeline drained");
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{
        io::{self, Cursor},
        pin::Pin,
        task::{Context, Poll},
    };

    /// A sink whose every write fails.
    struct BrokenPipe;

    impl AsyncWrite for BrokenPipe {
        fn poll_write(
            self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            _buf: &[u8],
        ) -> Poll<io::Result<usize>> {
            Poll::Ready(Err(io::Error::new(io::ErrorKind::BrokenPipe, "sink closed")))
        }

        fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Ok(()))
        }

        fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Ok(()))
        }
    }

    #[tokio::test]
    async fn test_zero_workers_rejected() {
        let cfg = PipelineConfig {
            workers: 0,
            ..Default::default()
        };
        let res = run_pipeline(
            Arc::new(MatchingEngine::new()),
            Cursor::new(Vec::<u8>::new()),
            Vec::<u8>::new(),
            &cfg,
            CancellationToken::new(),
        )
        .await;
        assert!(matches!(res, Err(PipelineError::NoWorkers)));
    }

    #[tokio::test]
    async fn test_empty_input_drains_cleanly() {
        let mut out: Vec<u8> = Vec::new();
        let stats = run_pipeline(
            Arc::new(MatchingEngine::new()),
            Cursor::new(b"\n\n".to_vec()),
            &mut out,
            &PipelineConfig::default(),
            CancellationToken::new(),
        )
        .await
        .unwrap();
        assert_eq!(stats, PipelineStats::default());
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn test_cancelled_before_start_reads_nothing() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let input = br#"{"id":"a1","side":"Sell","price":100,"amount":5,"instrument":"EUR-USD"}"#;
        let engine = Arc::new(MatchingEngine::new());
        let stats = run_pipeline(
            Arc::clone(&engine),
            Cursor::new(input.to_vec()),
            Vec::<u8>::new(),
            &PipelineConfig::default(),
            cancel,
        )
        .await
        .unwrap();
        assert_eq!(stats.orders_read, 0);
        assert!(engine.snapshot(crate::instrument::EUR_USD).unwrap().asks().is_empty());
    }

    #[tokio::test]
    async fn test_write_error_stops_every_task() {
        let mut input = String::new();
        for i in 0..500 {
            let side = if i % 2 == 0 { "Sell" } else { "Buy" };
            input.push_str(&format!(
                r#"{{"id":"o{i}","side":"{side}","price":100,"amount":1,"instrument":"EUR-USD"}}"#
            ));
            input.push('\n');
        }
        let cfg = PipelineConfig {
            workers: 3,
            channel_capacity: 1,
        };
        let cancel = CancellationToken::new();
        let engine = Arc::new(MatchingEngine::new());

        let res = run_pipeline(
            Arc::clone(&engine),
            Cursor::new(input.into_bytes()),
            BrokenPipe,
            &cfg,
            cancel.clone(),
        )
        .await;

        assert!(matches!(res, Err(PipelineError::Io(e)) if e.kind() == io::ErrorKind::BrokenPipe));
        // Every worker has exited and dropped its handle on the engine.
        assert_eq!(Arc::strong_count(&engine), 1);
        assert!(!cancel.is_cancelled());
    }
}
