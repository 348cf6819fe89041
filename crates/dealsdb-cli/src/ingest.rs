//! One-shot ingestion runs and registry listing for operators.

use std::fmt::Write as _;

use dealsdb_core::{AppConfig, CategoryNode, CategoryRegistry, ScheduleConfig};
use dealsdb_ingest::{
    run_ingestion, IngestContext, IngestionOutcome, OutcomeSink, TracingSink, Trigger,
};
use futures::stream::{self, StreamExt};

/// Run ingestion for the selected categories, `concurrency` at a time, and
/// print one line per finished run.
///
/// Every selected category is attempted; the command fails afterwards if
/// any run failed.
pub(crate) async fn run_ingest(
    config: &AppConfig,
    registry: &CategoryRegistry,
    storage_key: Option<&str>,
    concurrency: usize,
) -> anyhow::Result<()> {
    config.require_catalog_api_key()?;
    let nodes = select_nodes(registry, storage_key)?;

    let pool = dealsdb_db::connect_pool(
        &config.database_url,
        dealsdb_db::PoolConfig::from_app_config(config),
    )
    .await?;
    let ctx = IngestContext::from_app_config(pool, config)?;
    let sink = TracingSink;

    tracing::info!(
        categories = nodes.len(),
        concurrency,
        "ingest: starting one-shot run"
    );

    let mut runs = stream::iter(nodes)
        .map(|node| run_ingestion(&ctx, node, Trigger::Cli))
        .buffer_unordered(concurrency.max(1));

    let mut total = 0usize;
    let mut failed = 0usize;
    while let Some(outcome) = runs.next().await {
        sink.report(&outcome);
        println!("{}", format_outcome(&outcome));
        total += 1;
        if !outcome.is_success() {
            failed += 1;
        }
    }

    if failed > 0 {
        anyhow::bail!("{failed} of {total} ingestion run(s) failed");
    }
    println!("{total} ingestion run(s) succeeded");
    Ok(())
}

/// Every node in registry order, or just the node for `storage_key`.
pub(crate) fn select_nodes<'a>(
    registry: &'a CategoryRegistry,
    storage_key: Option<&str>,
) -> anyhow::Result<Vec<&'a CategoryNode>> {
    match storage_key {
        Some(key) => registry
            .resolve(key)
            .map(|node| vec![node])
            .ok_or_else(|| anyhow::anyhow!("storage key '{key}' is not in the category registry")),
        None => Ok(registry.iter_nodes().collect()),
    }
}

pub(crate) fn format_outcome(outcome: &IngestionOutcome) -> String {
    match &outcome.result {
        Ok(summary) => format!(
            "ok     {:<20} fetched={} stored={} ({}ms)",
            outcome.storage_key,
            summary.fetched,
            summary.stored,
            outcome.duration_ms()
        ),
        Err(e) => format!(
            "FAILED {:<20} [{}] {e}",
            outcome.storage_key,
            e.kind()
        ),
    }
}

/// Render the registry as a table: daily slot, storage key, external id.
/// Children are indented under their root.
pub(crate) fn format_registry(registry: &CategoryRegistry, schedule: ScheduleConfig) -> String {
    let mut out = String::new();
    let mut index = 0usize;
    for root in registry.roots() {
        write_row(&mut out, schedule.slot_secs(index), "", root);
        index += 1;
        for child in &root.children {
            write_row(&mut out, schedule.slot_secs(index), "  ", child);
            index += 1;
        }
    }
    out
}

fn write_row(out: &mut String, slot_secs: u32, indent: &str, node: &CategoryNode) {
    let key = format!("{indent}{}", node.storage_key);
    let _ = writeln!(
        out,
        "{:02}:{:02}:{:02}  {key:<22} {}",
        slot_secs / 3600,
        (slot_secs % 3600) / 60,
        slot_secs % 60,
        node.external_category_id
    );
}
