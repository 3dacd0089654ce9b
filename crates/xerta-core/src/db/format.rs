//! SQL fragment builders.
//!
//! Identifiers only get naive quote escaping. Values never end up in the SQL
//! text: every builder emits `?` placeholders and hands back the values to bind.

use super::{Filter, Value};

/// Backslash-escape single and double quotes.
pub fn esc_chars(s: &str) -> String {
    s.replace('\'', "\\'").replace('"', "\\\"")
}

/// `a, b, c`
pub fn fmt_columns<S: AsRef<str>>(columns: &[S]) -> String {
    columns
        .iter()
        .map(|c| esc_chars(c.as_ref()))
        .collect::<Vec<_>>()
        .join(", ")
}

/// `?, ?, ?`
pub fn fmt_placeholders(n: usize) -> String {
    vec!["?"; n].join(", ")
}

/// `a = ? AND b = ?` plus the values to bind, in order.
pub fn fmt_where(filter: &Filter) -> (String, Vec<Value>) {
    let mut exprs = Vec::with_capacity(filter.conditions().len());
    let mut binds = Vec::with_capacity(filter.conditions().len());
    for (col, val) in filter.conditions() {
        exprs.push(format!("{} = ?", esc_chars(col)));
        binds.push(val.clone());
    }
    (exprs.join(" AND "), binds)
}

/// Append ` WHERE ...` to `sql` when the filter has conditions.
pub(crate) fn with_where(mut sql: String, filter: Option<&Filter>) -> (String, Vec<Value>) {
    match filter {
        Some(f) if !f.is_empty() => {
            let (where_str, binds) = fmt_where(f);
            sql.push_str(" WHERE ");
            sql.push_str(&where_str);
            (sql, binds)
        }
        _ => (sql, Vec::new()),
    }
}

/// `INSERT INTO t (a, b) VALUES (?, ?)`; the row values bind in column order.
pub fn insert_sql<S: AsRef<str>>(table: &str, columns: &[S]) -> String {
    format!(
        "INSERT INTO {} ({}) VALUES ({})",
        esc_chars(table),
        fmt_columns(columns),
        fmt_placeholders(columns.len())
    )
}

/// `UPDATE t SET c = ? [WHERE ...]`. The new value binds first, then the
/// filter values.
pub fn update_sql(
    table: &str,
    column: &str,
    value: &Value,
    filter: Option<&Filter>,
) -> (String, Vec<Value>) {
    let base = format!("UPDATE {} SET {} = ?", esc_chars(table), esc_chars(column));
    let (sql, where_binds) = with_where(base, filter);

    let mut binds = Vec::with_capacity(where_binds.len() + 1);
    binds.push(value.clone());
    binds.extend(where_binds);
    (sql, binds)
}

/// `DELETE FROM t [WHERE ...]`
pub fn delete_sql(table: &str, filter: Option<&Filter>) -> (String, Vec<Value>) {
    with_where(format!("DELETE FROM {}", esc_chars(table)), filter)
}

/// `SELECT a, b FROM t [WHERE ...]`
pub fn select_sql<S: AsRef<str>>(
    table: &str,
    columns: &[S],
    filter: Option<&Filter>,
) -> (String, Vec<Value>) {
    with_where(
        format!("SELECT {} FROM {}", fmt_columns(columns), esc_chars(table)),
        filter,
    )
}

/// Empty `table` and restart its auto-increment counter, in this order.
pub fn reset_sql(table: &str) -> [String; 2] {
    let table = esc_chars(table);
    [
        format!("DELETE FROM {table}"),
        format!("ALTER TABLE {table} AUTO_INCREMENT = 1"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_both_quote_kinds() {
        assert_eq!(esc_chars(r#"it's "fine""#), r#"it\'s \"fine\""#);
        assert_eq!(esc_chars("plain"), "plain");
    }

    #[test]
    fn columns_are_comma_separated() {
        assert_eq!(
            fmt_columns(&["id", "username", "first_name"]),
            "id, username, first_name"
        );
        assert_eq!(fmt_columns::<&str>(&[]), "");
    }

    #[test]
    fn where_uses_placeholders_in_order() {
        let f = Filter::new().eq("privilege", 2i64).eq("username", "o'neil");
        let (sql, binds) = fmt_where(&f);
        assert_eq!(sql, "privilege = ? AND username = ?");
        assert_eq!(binds, vec![Value::Int(2), Value::from("o'neil")]);
    }

    #[test]
    fn empty_filter_adds_no_where_clause() {
        let (sql, binds) = with_where("DELETE FROM jokes".to_string(), Some(&Filter::new()));
        assert_eq!(sql, "DELETE FROM jokes");
        assert!(binds.is_empty());

        let (sql, binds) = with_where(
            "DELETE FROM jokes".to_string(),
            Some(&Filter::new().eq("id", 3i64)),
        );
        assert_eq!(sql, "DELETE FROM jokes WHERE id = ?");
        assert_eq!(binds, vec![Value::Int(3)]);
    }

    #[test]
    fn placeholders_match_count() {
        assert_eq!(fmt_placeholders(3), "?, ?, ?");
        assert_eq!(fmt_placeholders(0), "");
    }

    #[test]
    fn insert_has_one_placeholder_per_column() {
        assert_eq!(
            insert_sql("users", &["id", "first_name"]),
            "INSERT INTO users (id, first_name) VALUES (?, ?)"
        );
    }

    #[test]
    fn update_binds_value_before_where_values() {
        let value = Value::from("Ada");
        let (sql, binds) = update_sql(
            "users",
            "first_name",
            &value,
            Some(&Filter::new().eq("id", 42i64)),
        );
        assert_eq!(sql, "UPDATE users SET first_name = ? WHERE id = ?");
        assert_eq!(binds, vec![Value::from("Ada"), Value::Int(42)]);

        let (sql, binds) = update_sql("users", "privilege", &Value::Int(1), None);
        assert_eq!(sql, "UPDATE users SET privilege = ?");
        assert_eq!(binds, vec![Value::Int(1)]);
    }

    #[test]
    fn update_with_several_conditions_keeps_their_order() {
        let f = Filter::new().eq("privilege", 0i64).eq("username", "bob");
        let (sql, binds) = update_sql("users", "privilege", &Value::Int(2), Some(&f));
        assert_eq!(
            sql,
            "UPDATE users SET privilege = ? WHERE privilege = ? AND username = ?"
        );
        assert_eq!(
            binds,
            vec![Value::Int(2), Value::Int(0), Value::from("bob")]
        );
    }

    #[test]
    fn delete_without_filter_clears_the_table() {
        let (sql, binds) = delete_sql("jokes", None);
        assert_eq!(sql, "DELETE FROM jokes");
        assert!(binds.is_empty());

        let (sql, binds) = delete_sql("commands", Some(&Filter::new().eq("user_id", 7i64)));
        assert_eq!(sql, "DELETE FROM commands WHERE user_id = ?");
        assert_eq!(binds, vec![Value::Int(7)]);
    }

    #[test]
    fn select_projects_requested_columns() {
        let (sql, binds) = select_sql("users", &["id", "first_name"], None);
        assert_eq!(sql, "SELECT id, first_name FROM users");
        assert!(binds.is_empty());

        let cols = vec!["id".to_string()];
        let (sql, binds) = select_sql("users", &cols, Some(&Filter::new().eq("privilege", 2i64)));
        assert_eq!(sql, "SELECT id FROM users WHERE privilege = ?");
        assert_eq!(binds, vec![Value::Int(2)]);
    }

    #[test]
    fn reset_deletes_then_restarts_auto_increment() {
        assert_eq!(
            reset_sql("jokes"),
            [
                "DELETE FROM jokes".to_string(),
                "ALTER TABLE jokes AUTO_INCREMENT = 1".to_string(),
            ]
        );
    }
}
