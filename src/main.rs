mod config;
mod driver;
mod entities;
mod error;
mod models;
mod pool;
mod schema;
mod session;

use crate::{config::Settings, session::Session};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "info,filme=debug,sqlx=warn,sea_orm=warn".to_string()),
        )
        .init();

    let settings = Settings::from_env()?;
    tracing::debug!(file = %settings.connection_file.display(), selector = ?settings.selector, "settings loaded");

    let mut session = match &settings.database_url {
        Some(url) => Session::open(pool::connect_options(url))?,
        None => Session::new(&settings)?,
    };
    let rows = driver::run(&mut session, settings.reset);
    tracing::info!(rows = rows.len(), "done");

    Ok(())
}
