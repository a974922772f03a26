//! Background job scheduler.
//!
//! Registers the recurring supplier-location backfill so listings created
//! before their supplier had coordinates become visible to distance search.

use std::sync::Arc;

use sqlx::PgPool;
use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};

/// Builds and starts the background job scheduler.
///
/// Returns the running [`JobScheduler`] handle, which must be kept alive for
/// the lifetime of the process. Dropping it shuts down all scheduled jobs.
///
/// # Errors
///
/// Returns [`JobSchedulerError`] if the scheduler cannot be initialised, the
/// cron expression is invalid, or the scheduler fails to start.
pub async fn build_scheduler(
    pool: PgPool,
    backfill_cron: &str,
) -> Result<JobScheduler, JobSchedulerError> {
    let scheduler = JobScheduler::new().await?;
    register_backfill_job(&scheduler, pool, backfill_cron).await?;
    scheduler.start().await?;
    Ok(scheduler)
}

async fn register_backfill_job(
    scheduler: &JobScheduler,
    pool: PgPool,
    cron: &str,
) -> Result<(), JobSchedulerError> {
    let pool = Arc::new(pool);

    let job = Job::new_async(cron, move |_uuid, _lock| {
        let pool = Arc::clone(&pool);

        Box::pin(async move {
            tracing::info!("scheduler: starting supplier-location backfill");
            run_backfill(&pool).await;
        })
    })?;

    scheduler.add(job).await?;
    tracing::info!(cron, "scheduler: registered supplier-location backfill job");
    Ok(())
}

/// Copy supplier coordinates onto listings missing them, logging the outcome.
///
/// Failures are logged rather than propagated; the next run retries.
pub async fn run_backfill(pool: &PgPool) {
    match vendorbuddy_db::backfill_supplier_locations(pool).await {
        Ok(0) => tracing::debug!("scheduler: backfill found no listings to update"),
        Ok(updated) => {
            tracing::info!(updated, "scheduler: backfilled product supplier locations");
        }
        Err(e) => tracing::error!(error = %e, "scheduler: supplier-location backfill failed"),
    }
}
