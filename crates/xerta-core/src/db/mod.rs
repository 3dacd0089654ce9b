//! Generic table access.
//!
//! Everything above this layer talks to the database through the [`Database`]
//! port: insert/update/delete/select/describe, parameterised by table name.
//! [`Connector`] opens a fresh [`Database`] for every unit of work; there is no
//! pooling.

use std::{fmt, path::Path};

use async_trait::async_trait;
use tracing::warn;

use crate::{errors::Error, Result};

pub mod format;
pub mod memory;
pub mod mysql;

pub use memory::{MemoryConnector, MemoryTable};
pub use mysql::{MySqlConnector, MySqlDatabase};

/// A single cell value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Value {
    Null,
    Int(i64),
    Text(String),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            Value::Text(s) => s.trim().parse().ok(),
            Value::Null => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn into_text(self) -> Option<String> {
        match self {
            Value::Text(s) => Some(s),
            Value::Int(i) => Some(i.to_string()),
            Value::Null => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Int(i) => write!(f, "{i}"),
            Value::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

/// Column equality conditions, combined with `AND`.
///
/// Conditions keep insertion order so the generated SQL is deterministic.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Filter {
    conditions: Vec<(String, Value)>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eq(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.conditions.push((column.to_string(), value.into()));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    pub fn conditions(&self) -> &[(String, Value)] {
        &self.conditions
    }
}

/// Materialised result of a select.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl Table {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn push_row(&mut self, row: Vec<Value>) {
        debug_assert_eq!(row.len(), self.columns.len());
        self.rows.push(row);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// All values of one column, top to bottom.
    pub fn column(&self, name: &str) -> Result<Vec<&Value>> {
        let idx = self.column_index(name).ok_or_else(|| Error::UnknownColumn {
            table: "<result>".to_string(),
            column: name.to_string(),
        })?;
        Ok(self.rows.iter().map(|r| &r[idx]).collect())
    }

    pub fn records(&self) -> impl Iterator<Item = Record<'_>> {
        self.rows.iter().map(move |values| Record {
            columns: &self.columns,
            values,
        })
    }

    pub fn record(&self, idx: usize) -> Option<Record<'_>> {
        self.rows.get(idx).map(|values| Record {
            columns: &self.columns,
            values,
        })
    }

    /// Render as CSV with a header line.
    pub fn to_csv(&self) -> String {
        let mut out = String::new();
        push_csv_line(&mut out, self.columns.iter().map(String::as_str));
        for row in &self.rows {
            let cells: Vec<String> = row.iter().map(ToString::to_string).collect();
            push_csv_line(&mut out, cells.iter().map(String::as_str));
        }
        out
    }
}

fn push_csv_line<'a>(out: &mut String, cells: impl Iterator<Item = &'a str>) {
    let line = cells
        .map(|c| {
            if c.contains([',', '"', '\n', '\r']) {
                format!("\"{}\"", c.replace('"', "\"\""))
            } else {
                c.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(",");
    out.push_str(&line);
    out.push('\n');
}

/// One row of a [`Table`], addressable by column name.
#[derive(Clone, Copy, Debug)]
pub struct Record<'a> {
    columns: &'a [String],
    values: &'a [Value],
}

impl<'a> Record<'a> {
    pub fn get(&self, column: &str) -> Option<&'a Value> {
        let idx = self.columns.iter().position(|c| c == column)?;
        self.values.get(idx)
    }

    pub fn int(&self, column: &str) -> Option<i64> {
        self.get(column).and_then(Value::as_i64)
    }

    pub fn text(&self, column: &str) -> Option<String> {
        self.get(column).cloned().and_then(Value::into_text)
    }
}

/// Database manager port.
#[async_trait]
pub trait Database: Send {
    /// Insert one row. Returns 1, or 0 when a uniqueness constraint rejects it.
    async fn insert_row(&mut self, table: &str, columns: &[&str], values: &[Value])
        -> Result<u64>;

    /// Set `column = value` on every row matching `filter` (all rows if `None`).
    async fn update_column(
        &mut self,
        table: &str,
        column: &str,
        value: &Value,
        filter: Option<&Filter>,
    ) -> Result<u64>;

    async fn delete_values(&mut self, table: &str, filter: Option<&Filter>) -> Result<u64>;

    /// Select `columns` (every column if `None`) from rows matching `filter`.
    async fn get_table(
        &mut self,
        table: &str,
        columns: Option<&[&str]>,
        filter: Option<&Filter>,
    ) -> Result<Table>;

    async fn get_columns(&mut self, table: &str) -> Result<Vec<String>>;

    async fn get_tables(&mut self) -> Result<Vec<String>>;

    /// Delete all rows and restart auto-increment at 1.
    async fn reset_table(&mut self, table: &str) -> Result<()>;

    /// End the session gracefully. The connection is unusable afterwards.
    async fn close(self: Box<Self>) -> Result<()>;

    /// Insert every row of `df`; returns the number actually inserted.
    async fn insert_dataframe(&mut self, table: &str, df: &Table) -> Result<u64> {
        let columns: Vec<&str> = df.columns.iter().map(String::as_str).collect();
        let mut nrows = 0;
        for values in &df.rows {
            nrows += self.insert_row(table, &columns, values).await?;
        }
        Ok(nrows)
    }
}

/// Opens a fresh [`Database`] connection.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self) -> Result<Box<dyn Database>>;
}

/// Close `db` at the end of a unit of work. A failed quit is logged, not
/// returned.
pub async fn release(db: Box<dyn Database>) {
    if let Err(e) = db.close().await {
        warn!("closing database connection failed: {e}");
    }
}

/// Write a (filtered) table to `path` as CSV. `.csv` is appended when missing.
pub async fn export_table(
    db: &mut dyn Database,
    table: &str,
    columns: Option<&[&str]>,
    filter: Option<&Filter>,
    path: &Path,
) -> Result<std::path::PathBuf> {
    let df = db.get_table(table, columns, filter).await?;

    let path = if path.extension().is_some_and(|e| e == "csv") {
        path.to_path_buf()
    } else {
        let mut p = path.as_os_str().to_owned();
        p.push(".csv");
        p.into()
    };

    tokio::fs::write(&path, df.to_csv()).await?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Table {
        let mut t = Table::new(vec!["id".to_string(), "joke".to_string()]);
        t.push_row(vec![Value::Int(1), Value::from("plain")]);
        t.push_row(vec![Value::Int(2), Value::from("with, comma \"quoted\"")]);
        t.push_row(vec![Value::Int(3), Value::Null]);
        t
    }

    #[test]
    fn csv_quotes_special_cells_and_blanks_nulls() {
        assert_eq!(
            sample().to_csv(),
            "id,joke\n1,plain\n2,\"with, comma \"\"quoted\"\"\"\n3,\n"
        );
    }

    #[test]
    fn records_are_addressable_by_name() {
        let t = sample();
        let r = t.record(1).unwrap();
        assert_eq!(r.int("id"), Some(2));
        assert_eq!(r.text("joke").as_deref(), Some("with, comma \"quoted\""));
        assert!(r.get("missing").is_none());
        assert_eq!(t.record(2).unwrap().text("joke"), None);
    }

    #[test]
    fn column_lookup_fails_for_unknown_names() {
        let t = sample();
        assert_eq!(t.column("id").unwrap().len(), 3);
        assert!(matches!(
            t.column("nope"),
            Err(Error::UnknownColumn { .. })
        ));
    }

    #[test]
    fn option_values_map_to_null() {
        assert_eq!(Value::from(None::<String>), Value::Null);
        assert_eq!(Value::from(Some("x")), Value::Text("x".to_string()));
        assert_eq!(Value::from(Some(7i64)), Value::Int(7));
    }

    #[tokio::test]
    async fn export_appends_csv_extension() {
        let connector = MemoryConnector::with_bot_schema();
        let mut db = connector.connect().await.unwrap();
        db.insert_row("jokes", &["joke"], &[Value::from("hi")])
            .await
            .unwrap();

        let dir = std::env::temp_dir().join(format!("xerta-export-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();

        let written = export_table(db.as_mut(), "jokes", None, None, &dir.join("jokes"))
            .await
            .unwrap();
        assert_eq!(written, dir.join("jokes.csv"));
        assert_eq!(std::fs::read_to_string(&written).unwrap(), "id,joke\n1,hi\n");

        let _ = std::fs::remove_dir_all(&dir);
    }
}
