pub mod catalog;
pub mod models;
pub mod pipeline;
pub mod source;

use chrono::Local;
use common::Result;
use common::config::Settings;
use tracing::info;

use catalog::SocrataCatalog;
use pipeline::{BatchPublisher, SyncDriver};
use source::DropboxSource;

/// Runs the complete monthly trip sync pipeline
pub async fn run_sync_pipeline(config_path: &str) -> Result<()> {
    // Load configuration
    let config = Settings::new(config_path)?;

    let catalog = SocrataCatalog::new(&config.socrata)?;
    let source = DropboxSource::new(&config.dropbox)?;
    let publisher = BatchPublisher::new(config.sync.batch_size);

    let today = Local::now().date_naive();
    let driver = SyncDriver::new(&source, &catalog, publisher, &config.dropbox.root, today);

    let outcome = driver.run().await?;
    info!(
        periods = outcome.periods_published,
        records = outcome.records_published,
        "Sync run complete"
    );

    Ok(())
}
