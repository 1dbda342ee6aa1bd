use std::sync::Arc;

use anyhow::Context;

use library_application::default_dispatcher;
use library_core::{CancellationSignal, SystemClock};
use library_infra::{LibraryConfig, build_library, connect_store, seed};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = LibraryConfig::from_env().context("invalid library configuration")?;
    library_observability::init(&config.log_filter);

    let store = connect_store(&config).await?;
    let library = build_library(&config, store, Arc::new(SystemClock), default_dispatcher());
    let cancel = CancellationSignal::new();

    if config.seed_sample_data {
        if let Some(id) = seed(&library, &cancel).await? {
            tracing::info!(author_id = %id, "sample data inserted");
        }
    }

    let authors = library.send(config.first_authors_page(), &cancel).await?;
    let books = library.send(config.first_books_page(), &cancel).await?;

    println!(
        "{}",
        serde_json::to_string_pretty(&serde_json::json!({
            "authors": authors,
            "books": books,
        }))?
    );
    Ok(())
}
