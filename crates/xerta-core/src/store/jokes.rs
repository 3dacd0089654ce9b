use rand::Rng;

use crate::{
    db::{Database, Table, Value},
    Result,
};

pub const TABLE: &str = "jokes";

pub async fn get_jokes(db: &mut dyn Database) -> Result<Table> {
    db.get_table(TABLE, None, None).await
}

/// A uniformly random joke, re-read from the table on every call.
///
/// `None` when the table is empty.
pub async fn random_joke(db: &mut dyn Database) -> Result<Option<String>> {
    let df = get_jokes(db).await?;
    if df.is_empty() {
        return Ok(None);
    }

    let idx = rand::rng().random_range(0..df.len());
    Ok(df.record(idx).and_then(|r| r.text("joke")))
}

pub async fn insert_joke(db: &mut dyn Database, joke: &str) -> Result<u64> {
    db.insert_row(TABLE, &["joke"], &[Value::from(joke)]).await
}
