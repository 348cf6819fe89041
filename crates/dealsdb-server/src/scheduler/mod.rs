//! Background job scheduler.
//!
//! Registers one daily ingestion job per category node. Node *i* in
//! registry order fires at the configured base time plus *i* stagger
//! intervals, wrapped at midnight UTC.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use dealsdb_core::{CategoryNode, CategoryRegistry, ScheduleConfig};
use dealsdb_ingest::{run_ingestion, IngestContext, OutcomeSink, Trigger};
use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};

/// Builds and starts the background job scheduler.
///
/// Returns the running [`JobScheduler`] handle, which must be kept alive
/// for the lifetime of the process; dropping it shuts down all jobs.
///
/// # Errors
///
/// Returns [`JobSchedulerError`] if the scheduler cannot be initialised,
/// a job cannot be registered, or the scheduler fails to start.
pub async fn build_scheduler(
    ctx: Arc<IngestContext>,
    registry: Arc<CategoryRegistry>,
    schedule: ScheduleConfig,
    sink: Arc<dyn OutcomeSink>,
) -> Result<JobScheduler, JobSchedulerError> {
    let scheduler = JobScheduler::new().await?;

    for (index, node) in registry.iter_nodes().enumerate() {
        let cron = slot_cron(schedule.slot_secs(index));
        tracing::debug!(
            storage_key = %node.storage_key,
            cron = %cron,
            "scheduler: registering ingestion job"
        );
        register_ingestion_job(
            &scheduler,
            &cron,
            Arc::new(node.clone()),
            Arc::clone(&ctx),
            Arc::clone(&sink),
        )
        .await?;
    }

    scheduler.start().await?;
    tracing::info!(
        jobs = registry.len(),
        "scheduler: started daily ingestion jobs"
    );
    Ok(scheduler)
}

/// Register the daily ingestion job for one node.
///
/// A tick that fires while the node's previous run is still in flight is
/// skipped rather than queued.
async fn register_ingestion_job(
    scheduler: &JobScheduler,
    cron: &str,
    node: Arc<CategoryNode>,
    ctx: Arc<IngestContext>,
    sink: Arc<dyn OutcomeSink>,
) -> Result<(), JobSchedulerError> {
    let in_flight = Arc::new(AtomicBool::new(false));

    let job = Job::new_async(cron, move |_uuid, _lock| {
        let node = Arc::clone(&node);
        let ctx = Arc::clone(&ctx);
        let sink = Arc::clone(&sink);
        let in_flight = Arc::clone(&in_flight);

        Box::pin(async move {
            run_scheduled_tick(&ctx, &node, sink.as_ref(), &in_flight).await;
        })
    })?;

    scheduler.add(job).await?;
    Ok(())
}

/// One scheduled tick for `node`: run ingestion unless the node's previous
/// run is still in flight, and report the outcome to `sink`.
///
/// Returns `false` when the tick was skipped.
async fn run_scheduled_tick(
    ctx: &IngestContext,
    node: &CategoryNode,
    sink: &dyn OutcomeSink,
    in_flight: &AtomicBool,
) -> bool {
    let Some(_guard) = InFlightGuard::acquire(in_flight) else {
        tracing::warn!(
            storage_key = %node.storage_key,
            "scheduler: previous run still in flight; skipping tick"
        );
        return false;
    };

    tracing::info!(storage_key = %node.storage_key, "scheduler: starting ingestion run");
    let outcome = run_ingestion(ctx, node, Trigger::Scheduled).await;
    sink.report(&outcome);
    true
}

/// Six-field cron expression (`sec min hour * * *`) for a daily slot.
fn slot_cron(secs_of_day: u32) -> String {
    let secs_of_day = secs_of_day % 86_400;
    let hour = secs_of_day / 3600;
    let minute = (secs_of_day % 3600) / 60;
    let second = secs_of_day % 60;
    format!("{second} {minute} {hour} * * *")
}

/// Marks a node's run as in flight until dropped.
struct InFlightGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> InFlightGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { flag })
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}
