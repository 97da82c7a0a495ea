use anyhow::Context;
use chrono::Local;

use stockroom_app::{AppConfig, InventoryService};

fn main() -> anyhow::Result<()> {
    stockroom_observability::init();

    let config = AppConfig::from_env().context("reading configuration")?;
    tracing::info!(?config, "starting stockroom");

    let service = InventoryService::bootstrap(&config).context("opening inventory")?;
    let report = service.startup_report();
    if !report.is_consistent() {
        tracing::warn!(repaired = report.mismatches.len(), "item amounts were repaired at startup");
    }

    let today = Local::now().date_naive();
    let stats = service.dashboard(today, &Local);
    println!("{}", serde_json::to_string_pretty(&stats).context("encoding dashboard")?);

    let low = service.low_stock_items();
    if !low.is_empty() {
        println!("{}", serde_json::to_string_pretty(&low).context("encoding low-stock items")?);
    }
    Ok(())
}
