//! Joke corpus loading.
//!
//! The corpus is a plain text file with one joke per paragraph (jokes are
//! separated by a blank line).

use std::path::Path;

use tracing::info;

use crate::{
    db::{self, Connector, Database},
    store::jokes,
    Result,
};

/// Split on blank lines and collapse whitespace inside each joke.
pub fn parse_jokes(text: &str) -> Vec<String> {
    text.split("\n\n")
        .map(|chunk| chunk.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|joke| !joke.is_empty())
        .collect()
}

/// Insert every joke from `path`; returns the number of rows inserted.
pub async fn load_jokes(db: &mut dyn Database, path: &Path) -> Result<u64> {
    let text = tokio::fs::read_to_string(path).await?;
    let mut nrows = 0;
    for joke in parse_jokes(&text) {
        nrows += jokes::insert_joke(db, &joke).await?;
    }
    Ok(nrows)
}

/// Load the corpus only if the jokes table is still empty.
pub async fn load_jokes_once(connector: &dyn Connector, path: &Path) -> Result<u64> {
    let mut conn = connector.connect().await?;
    let loaded = load_if_empty(conn.as_mut(), path).await;
    db::release(conn).await;
    loaded
}

async fn load_if_empty(db: &mut dyn Database, path: &Path) -> Result<u64> {
    if !jokes::get_jokes(db).await?.is_empty() {
        info!("jokes table already populated, skipping corpus load");
        return Ok(0);
    }

    let n = load_jokes(db, path).await?;
    info!(count = n, path = %path.display(), "loaded joke corpus");
    Ok(n)
}
