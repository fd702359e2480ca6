use tokio::time::Instant;
use tracing::{info, warn};

use crate::client::ExchangeClient;
use crate::duration::Schedule;
use crate::error::LatencyError;
use crate::log_writer::LatencyLog;
use crate::prober::ProbeContext;
use crate::types::{LatencyRecord, RunSummary};

/// Run the full measurement: wallet association, warm-up order, then the probe loop.
///
/// Setup failures abort before any probe and are returned, not logged; the
/// caller reports them. Inside the loop every error is recoverable and skips
/// the cycle. The deadline is only checked at the top of each cycle, so a run
/// can overrun by up to one interval plus one probe.
pub async fn run_latency_test<C: ExchangeClient>(
    ctx: &ProbeContext<C>,
    schedule: Schedule,
    log: &mut LatencyLog,
) -> Result<RunSummary, LatencyError> {
    setup(ctx).await?;

    let deadline = Instant::now() + schedule.duration;
    let mut summary = RunSummary::new(log.path().to_path_buf());
    info!(
        "Probing every {:?} for {:?}, logging to {}",
        schedule.interval,
        schedule.duration,
        log.path().display()
    );

    while Instant::now() < deadline {
        summary.attempts += 1;
        match probe_once(ctx, log).await {
            Ok(record) => {
                summary.successes += 1;
                info!("Latency: {}ms", record.latency_ms);
            }
            Err(e) => {
                summary.failures += 1;
                warn!("Skipping this iteration: {e}");
            }
        }

        tokio::time::sleep(schedule.interval).await;
    }

    info!(
        "Run complete: {} attempt(s), {} logged, {} skipped",
        summary.attempts, summary.successes, summary.failures
    );
    Ok(summary)
}

/// One-time calls that must succeed before measuring.
async fn setup<C: ExchangeClient>(ctx: &ProbeContext<C>) -> Result<(), LatencyError> {
    info!("Running initial associate_wallet for {}...", ctx.wallet());
    ctx.associate_wallet()
        .await
        .map_err(|source| LatencyError::Setup {
            call: "associate_wallet",
            source,
        })?;
    info!("associate_wallet completed successfully");

    info!("Running initial create_order...");
    ctx.submit_order()
        .await
        .map_err(|source| LatencyError::Setup {
            call: "create_order",
            source,
        })?;
    info!("create_order completed successfully");
    Ok(())
}

/// Only yields [`Severity::Recoverable`](crate::error::Severity) errors.
async fn probe_once<C: ExchangeClient>(
    ctx: &ProbeContext<C>,
    log: &mut LatencyLog,
) -> Result<LatencyRecord, LatencyError> {
    let latency_ms = ctx.measure_latency().await.map_err(LatencyError::Probe)?;
    let record = LatencyRecord::now(latency_ms);
    log.append(&record)?;
    Ok(record)
}
