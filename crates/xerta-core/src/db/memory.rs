//! In-process [`Database`] backed by plain vectors.
//!
//! Mirrors the MySQL adapter closely enough for the bot's queries: unique
//! columns reject duplicate inserts with 0, auto-increment ids, column
//! defaults, and `col = NULL` never matching.

use std::{
    collections::BTreeMap,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex, MutexGuard,
    },
};

use async_trait::async_trait;

use super::{Connector, Database, Filter, Table, Value};
use crate::{errors::Error, Result};

#[derive(Clone, Debug)]
pub struct MemoryTable {
    columns: Vec<String>,
    unique: Vec<String>,
    auto_increment: Option<String>,
    defaults: Vec<(String, Value)>,
    rows: Vec<Vec<Value>>,
    next_id: i64,
}

impl MemoryTable {
    pub fn new(columns: &[&str]) -> Self {
        Self {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            unique: Vec::new(),
            auto_increment: None,
            defaults: Vec::new(),
            rows: Vec::new(),
            next_id: 1,
        }
    }

    pub fn unique(mut self, column: &str) -> Self {
        self.unique.push(column.to_string());
        self
    }

    pub fn auto_increment(mut self, column: &str) -> Self {
        self.auto_increment = Some(column.to_string());
        self
    }

    pub fn default_value(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.defaults.push((column.to_string(), value.into()));
        self
    }

    fn index(&self, table: &str, column: &str) -> Result<usize> {
        self.columns
            .iter()
            .position(|c| c == column)
            .ok_or_else(|| Error::UnknownColumn {
                table: table.to_string(),
                column: column.to_string(),
            })
    }

    fn matcher(&self, table: &str, filter: Option<&Filter>) -> Result<Vec<(usize, Value)>> {
        filter
            .map(|f| f.conditions())
            .unwrap_or_default()
            .iter()
            .map(|(col, val)| Ok((self.index(table, col)?, val.clone())))
            .collect()
    }

    fn insert(&mut self, table: &str, columns: &[&str], values: &[Value]) -> Result<u64> {
        if columns.len() != values.len() {
            return Err(Error::External(format!(
                "column count does not match value count for {table}"
            )));
        }

        let mut row: Vec<Option<Value>> = vec![None; self.columns.len()];
        for (col, val) in columns.iter().zip(values) {
            row[self.index(table, col)?] = Some(val.clone());
        }

        let mut assigned_id = None;
        let row: Vec<Value> = self
            .columns
            .iter()
            .zip(row)
            .map(|(name, v)| match v {
                Some(v) => v,
                None if self.auto_increment.as_deref() == Some(name.as_str()) => {
                    assigned_id = Some(self.next_id);
                    Value::Int(self.next_id)
                }
                None => self
                    .defaults
                    .iter()
                    .find(|(c, _)| c == name)
                    .map(|(_, d)| d.clone())
                    .unwrap_or(Value::Null),
            })
            .collect();

        for col in &self.unique {
            let idx = self.index(table, col)?;
            let candidate = &row[idx];
            if !candidate.is_null() && self.rows.iter().any(|r| &r[idx] == candidate) {
                return Ok(0);
            }
        }

        if let Some(ai) = self.auto_increment.clone() {
            let idx = self.index(table, &ai)?;
            let used = assigned_id.or_else(|| row[idx].as_i64());
            if let Some(id) = used {
                self.next_id = self.next_id.max(id + 1);
            }
        }

        self.rows.push(row);
        Ok(1)
    }

    fn update(
        &mut self,
        table: &str,
        column: &str,
        value: &Value,
        filter: Option<&Filter>,
    ) -> Result<u64> {
        let target = self.index(table, column)?;
        let conds = self.matcher(table, filter)?;
        let mut n = 0;
        for row in self.rows.iter_mut().filter(|r| row_matches(r, &conds)) {
            row[target] = value.clone();
            n += 1;
        }
        Ok(n)
    }

    fn delete(&mut self, table: &str, filter: Option<&Filter>) -> Result<u64> {
        let conds = self.matcher(table, filter)?;
        let before = self.rows.len();
        self.rows.retain(|r| !row_matches(r, &conds));
        Ok((before - self.rows.len()) as u64)
    }

    fn select(&self, table: &str, columns: Option<&[&str]>, filter: Option<&Filter>) -> Result<Table> {
        let names: Vec<String> = match columns {
            Some(cols) => cols.iter().map(|c| c.to_string()).collect(),
            None => self.columns.clone(),
        };
        let idxs = names
            .iter()
            .map(|c| self.index(table, c))
            .collect::<Result<Vec<_>>>()?;
        let conds = self.matcher(table, filter)?;

        let mut df = Table::new(names);
        for row in self.rows.iter().filter(|r| row_matches(r, &conds)) {
            df.push_row(idxs.iter().map(|&i| row[i].clone()).collect());
        }
        Ok(df)
    }
}

fn row_matches(row: &[Value], conds: &[(usize, Value)]) -> bool {
    conds
        .iter()
        .all(|(i, v)| !v.is_null() && !row[*i].is_null() && &row[*i] == v)
}

type Tables = BTreeMap<String, MemoryTable>;

/// Shared in-memory state; every `connect()` hands out a view of the same tables.
#[derive(Default)]
pub struct MemoryConnector {
    tables: Arc<Mutex<Tables>>,
    connects: AtomicUsize,
    closes: Arc<AtomicUsize>,
}

impl MemoryConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// The `users`, `jokes` and `commands` tables from `sql/schema.sql`.
    pub fn with_bot_schema() -> Self {
        Self::new()
            .with_table(
                "users",
                MemoryTable::new(&[
                    "id",
                    "username",
                    "first_name",
                    "last_name",
                    "language_code",
                    "privilege",
                ])
                .unique("id")
                .default_value("privilege", 0i64),
            )
            .with_table(
                "jokes",
                MemoryTable::new(&["id", "joke"])
                    .unique("id")
                    .auto_increment("id"),
            )
            .with_table("commands", MemoryTable::new(&["user_id", "command"]))
    }

    pub fn with_table(self, name: &str, table: MemoryTable) -> Self {
        lock(&self.tables).insert(name.to_string(), table);
        self
    }

    /// Number of connections opened so far.
    pub fn connect_count(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    /// Number of connections closed through [`Database::close`].
    pub fn close_count(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }

    /// Current contents of a table, for assertions.
    pub fn snapshot(&self, table: &str) -> Result<Table> {
        with_table(&self.tables, table, |t| t.select(table, None, None))
    }
}

#[async_trait]
impl Connector for MemoryConnector {
    async fn connect(&self) -> Result<Box<dyn Database>> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MemoryDatabase {
            tables: Arc::clone(&self.tables),
            closes: Arc::clone(&self.closes),
        }))
    }
}

pub struct MemoryDatabase {
    tables: Arc<Mutex<Tables>>,
    closes: Arc<AtomicUsize>,
}

fn lock(tables: &Mutex<Tables>) -> MutexGuard<'_, Tables> {
    // A panic while holding the lock only happens in a failing test; keep going.
    tables.lock().unwrap_or_else(|e| e.into_inner())
}

fn with_table<T>(
    tables: &Mutex<Tables>,
    name: &str,
    f: impl FnOnce(&mut MemoryTable) -> Result<T>,
) -> Result<T> {
    let mut guard = lock(tables);
    let table = guard
        .get_mut(name)
        .ok_or_else(|| Error::External(format!("table {name} doesn't exist")))?;
    f(table)
}

#[async_trait]
impl Database for MemoryDatabase {
    async fn insert_row(
        &mut self,
        table: &str,
        columns: &[&str],
        values: &[Value],
    ) -> Result<u64> {
        with_table(&self.tables, table, |t| t.insert(table, columns, values))
    }

    async fn update_column(
        &mut self,
        table: &str,
        column: &str,
        value: &Value,
        filter: Option<&Filter>,
    ) -> Result<u64> {
        with_table(&self.tables, table, |t| t.update(table, column, value, filter))
    }

    async fn delete_values(&mut self, table: &str, filter: Option<&Filter>) -> Result<u64> {
        with_table(&self.tables, table, |t| t.delete(table, filter))
    }

    async fn get_table(
        &mut self,
        table: &str,
        columns: Option<&[&str]>,
        filter: Option<&Filter>,
    ) -> Result<Table> {
        with_table(&self.tables, table, |t| t.select(table, columns, filter))
    }

    async fn get_columns(&mut self, table: &str) -> Result<Vec<String>> {
        with_table(&self.tables, table, |t| Ok(t.columns.clone()))
    }

    async fn get_tables(&mut self) -> Result<Vec<String>> {
        Ok(lock(&self.tables).keys().cloned().collect())
    }

    async fn reset_table(&mut self, table: &str) -> Result<()> {
        with_table(&self.tables, table, |t| {
            t.rows.clear();
            t.next_id = 1;
            Ok(())
        })
    }

    async fn close(self: Box<Self>) -> Result<()> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
