use async_trait::async_trait;
use sqlx::{
    mysql::{MySql, MySqlArguments, MySqlConnection, MySqlRow},
    query::Query,
    Connection, Row,
};
use tracing::debug;

use super::{
    format::{delete_sql, insert_sql, reset_sql, select_sql, update_sql},
    Connector, Database, Filter, Table, Value,
};
use crate::{config::DatabaseConfig, Result};

/// One live MySQL connection.
pub struct MySqlDatabase {
    conn: MySqlConnection,
}

impl MySqlDatabase {
    pub async fn connect(cfg: &DatabaseConfig) -> Result<Self> {
        let conn = MySqlConnection::connect_with(&cfg.connect_options()).await?;
        debug!(host = %cfg.host, database = %cfg.database, "mysql connected");
        Ok(Self { conn })
    }

    async fn execute(&mut self, sql: &str, binds: &[Value]) -> Result<u64> {
        let res = bind_all(sqlx::query(sql), binds)
            .execute(&mut self.conn)
            .await?;
        Ok(res.rows_affected())
    }
}

fn bind_value<'q>(
    query: Query<'q, MySql, MySqlArguments>,
    value: &'q Value,
) -> Query<'q, MySql, MySqlArguments> {
    match value {
        Value::Null => query.bind(None::<String>),
        Value::Int(i) => query.bind(*i),
        Value::Text(s) => query.bind(s.as_str()),
    }
}

fn bind_all<'q>(
    mut query: Query<'q, MySql, MySqlArguments>,
    values: &'q [Value],
) -> Query<'q, MySql, MySqlArguments> {
    for v in values {
        query = bind_value(query, v);
    }
    query
}

fn decode_value(row: &MySqlRow, idx: usize) -> Result<Value> {
    if let Ok(v) = row.try_get::<Option<i64>, _>(idx) {
        return Ok(v.into());
    }
    if let Ok(v) = row.try_get::<Option<String>, _>(idx) {
        return Ok(v.into());
    }
    // Binary collations come back as blobs.
    let v: Option<Vec<u8>> = row.try_get(idx)?;
    Ok(v.map(|b| String::from_utf8_lossy(&b).into_owned()).into())
}

fn decode_text(row: &MySqlRow, idx: usize) -> Result<String> {
    Ok(decode_value(row, idx)?.into_text().unwrap_or_default())
}

#[async_trait]
impl Database for MySqlDatabase {
    async fn insert_row(
        &mut self,
        table: &str,
        columns: &[&str],
        values: &[Value],
    ) -> Result<u64> {
        let sql = insert_sql(table, columns);

        match self.execute(&sql, values).await {
            Ok(_) => Ok(1),
            Err(crate::Error::Database(sqlx::Error::Database(e))) if e.is_unique_violation() => {
                debug!(table, "insert skipped: duplicate key");
                Ok(0)
            }
            Err(e) => Err(e),
        }
    }

    async fn update_column(
        &mut self,
        table: &str,
        column: &str,
        value: &Value,
        filter: Option<&Filter>,
    ) -> Result<u64> {
        let (sql, binds) = update_sql(table, column, value, filter);
        self.execute(&sql, &binds).await
    }

    async fn delete_values(&mut self, table: &str, filter: Option<&Filter>) -> Result<u64> {
        let (sql, binds) = delete_sql(table, filter);
        self.execute(&sql, &binds).await
    }

    async fn get_table(
        &mut self,
        table: &str,
        columns: Option<&[&str]>,
        filter: Option<&Filter>,
    ) -> Result<Table> {
        let columns: Vec<String> = match columns {
            Some(cols) => cols.iter().map(|c| c.to_string()).collect(),
            None => self.get_columns(table).await?,
        };

        let (sql, binds) = select_sql(table, &columns, filter);

        let rows = bind_all(sqlx::query(&sql), &binds)
            .fetch_all(&mut self.conn)
            .await?;

        let mut df = Table::new(columns);
        for row in &rows {
            let values = (0..df.columns.len())
                .map(|i| decode_value(row, i))
                .collect::<Result<Vec<_>>>()?;
            df.push_row(values);
        }
        Ok(df)
    }

    async fn get_columns(&mut self, table: &str) -> Result<Vec<String>> {
        let rows = sqlx::query(
            "SELECT COLUMN_NAME FROM information_schema.COLUMNS \
             WHERE TABLE_SCHEMA = DATABASE() AND TABLE_NAME = ? \
             ORDER BY ORDINAL_POSITION",
        )
        .bind(table)
        .fetch_all(&mut self.conn)
        .await?;

        rows.iter().map(|r| decode_text(r, 0)).collect()
    }

    async fn get_tables(&mut self) -> Result<Vec<String>> {
        let rows = sqlx::query(
            "SELECT TABLE_NAME FROM information_schema.TABLES \
             WHERE TABLE_SCHEMA = DATABASE() ORDER BY TABLE_NAME",
        )
        .fetch_all(&mut self.conn)
        .await?;

        rows.iter().map(|r| decode_text(r, 0)).collect()
    }

    async fn reset_table(&mut self, table: &str) -> Result<()> {
        for sql in reset_sql(table) {
            self.execute(&sql, &[]).await?;
        }
        Ok(())
    }

    async fn close(self: Box<Self>) -> Result<()> {
        self.conn.close().await?;
        debug!("mysql connection closed");
        Ok(())
    }
}

/// Opens a new [`MySqlDatabase`] on every call.
#[derive(Clone, Debug)]
pub struct MySqlConnector {
    cfg: DatabaseConfig,
}

impl MySqlConnector {
    pub fn new(cfg: DatabaseConfig) -> Self {
        Self { cfg }
    }
}

#[async_trait]
impl Connector for MySqlConnector {
    async fn connect(&self) -> Result<Box<dyn Database>> {
        Ok(Box::new(MySqlDatabase::connect(&self.cfg).await?))
    }
}
