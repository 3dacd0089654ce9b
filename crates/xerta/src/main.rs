use std::sync::Arc;

use tracing::warn;

use xerta_core::{
    config::Config,
    corpus,
    db::{Connector, MySqlConnector},
};

#[tokio::main]
async fn main() -> Result<(), xerta_core::Error> {
    xerta_core::logging::init("xerta")?;

    let cfg = Arc::new(Config::load()?);
    let connector: Arc<dyn Connector> = Arc::new(MySqlConnector::new(cfg.database.clone()));

    if let Err(e) = corpus::load_jokes_once(connector.as_ref(), &cfg.jokes_path).await {
        warn!(path = %cfg.jokes_path.display(), "joke corpus not loaded: {e}");
    }

    xerta_telegram::router::run_polling(cfg, connector)
        .await
        .map_err(|e| xerta_core::Error::External(format!("telegram bot failed: {e}")))?;

    Ok(())
}
