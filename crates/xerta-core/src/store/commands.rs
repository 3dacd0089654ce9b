use crate::{
    db::{Database, Table, Value},
    domain::UserId,
    Result,
};

pub const TABLE: &str = "commands";

/// Record one command invocation.
pub async fn insert_command(db: &mut dyn Database, user_id: UserId, command: &str) -> Result<u64> {
    db.insert_row(
        TABLE,
        &["user_id", "command"],
        &[Value::Int(user_id.0), Value::from(command)],
    )
    .await
}

pub async fn get_commands(db: &mut dyn Database) -> Result<Table> {
    db.get_table(TABLE, None, None).await
}
