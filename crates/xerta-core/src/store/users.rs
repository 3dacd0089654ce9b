use tracing::debug;

use crate::{
    db::{Database, Filter, Table, Value},
    domain::{Privilege, UserId, UserProfile},
    Result,
};

pub const TABLE: &str = "users";

/// Columns written on registration; `privilege` is left to the table default.
pub const PROFILE_COLUMNS: [&str; 5] = ["id", "username", "first_name", "last_name", "language_code"];

/// A row of `users`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub language_code: Option<String>,
    pub privilege: Privilege,
}

impl User {
    /// Rows without an id are skipped.
    pub fn from_table(df: &Table) -> Vec<User> {
        df.records()
            .filter_map(|r| {
                Some(User {
                    id: UserId(r.int("id")?),
                    username: r.text("username"),
                    first_name: r.text("first_name"),
                    last_name: r.text("last_name"),
                    language_code: r.text("language_code"),
                    privilege: r.int("privilege").unwrap_or_default(),
                })
            })
            .collect()
    }

    /// `"First Last"`, only when both parts are present.
    pub fn full_name(&self) -> Option<String> {
        match (&self.first_name, &self.last_name) {
            (Some(first), Some(last)) => Some(format!("{first} {last}")),
            _ => None,
        }
    }
}

fn profile_values(profile: &UserProfile) -> [Value; 5] {
    [
        Value::Int(profile.id.0),
        profile.username.clone().into(),
        Value::from(profile.first_name.as_str()),
        profile.last_name.clone().into(),
        profile.language_code.clone().into(),
    ]
}

/// All users, or only those with the given privilege.
pub async fn get_users(db: &mut dyn Database, privilege: Option<Privilege>) -> Result<Table> {
    match privilege {
        None => db.get_table(TABLE, None, None).await,
        Some(p) => {
            db.get_table(TABLE, None, Some(&Filter::new().eq("privilege", p)))
                .await
        }
    }
}

pub async fn list_users(db: &mut dyn Database, privilege: Option<Privilege>) -> Result<Vec<User>> {
    Ok(User::from_table(&get_users(db, privilege).await?))
}

/// Ids of every user holding one of `privileges`.
pub async fn get_user_ids(db: &mut dyn Database, privileges: &[Privilege]) -> Result<Vec<UserId>> {
    let mut ids = Vec::new();
    for &p in privileges {
        let df = db
            .get_table(TABLE, Some(&["id"]), Some(&Filter::new().eq("privilege", p)))
            .await?;
        ids.extend(df.records().filter_map(|r| r.int("id")).map(UserId));
    }
    Ok(ids)
}

/// Upsert by id.
///
/// Tries an insert first. If the id already exists, every other profile column
/// is updated, one statement per column. Returns the insert count (1 or 0).
pub async fn insert_user(db: &mut dyn Database, profile: &UserProfile) -> Result<u64> {
    let values = profile_values(profile);
    let nrows = db.insert_row(TABLE, &PROFILE_COLUMNS, &values).await?;

    if nrows == 0 {
        debug!(user_id = profile.id.0, "user exists, updating profile");
        let by_id = Filter::new().eq("id", profile.id.0);
        for (column, value) in PROFILE_COLUMNS.iter().zip(&values) {
            if *column == "id" {
                continue;
            }
            db.update_column(TABLE, column, value, Some(&by_id)).await?;
        }
    }

    Ok(nrows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{Connector, MemoryConnector};

    fn ana() -> UserProfile {
        UserProfile {
            id: UserId(42),
            username: Some("ana".to_string()),
            first_name: "Ana".to_string(),
            last_name: Some("Lee".to_string()),
            language_code: Some("es".to_string()),
        }
    }

    #[tokio::test]
    async fn second_insert_updates_instead_of_duplicating() {
        let c = MemoryConnector::with_bot_schema();
        let mut db = c.connect().await.unwrap();

        assert_eq!(insert_user(db.as_mut(), &ana()).await.unwrap(), 1);

        let renamed = UserProfile {
            username: None,
            first_name: "Anita".to_string(),
            language_code: Some("en".to_string()),
            ..ana()
        };
        assert_eq!(insert_user(db.as_mut(), &renamed).await.unwrap(), 0);

        let users = list_users(db.as_mut(), None).await.unwrap();
        assert_eq!(
            users,
            vec![User {
                id: UserId(42),
                username: None,
                first_name: Some("Anita".to_string()),
                last_name: Some("Lee".to_string()),
                language_code: Some("en".to_string()),
                privilege: 0,
            }]
        );
    }

    #[tokio::test]
    async fn update_keeps_privilege() {
        let c = MemoryConnector::with_bot_schema();
        let mut db = c.connect().await.unwrap();
        insert_user(db.as_mut(), &ana()).await.unwrap();
        db.update_column(TABLE, "privilege", &Value::Int(2), None)
            .await
            .unwrap();

        insert_user(db.as_mut(), &ana()).await.unwrap();
        assert_eq!(list_users(db.as_mut(), Some(2)).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn filters_by_privilege() {
        let c = MemoryConnector::with_bot_schema();
        let mut db = c.connect().await.unwrap();
        for (id, p) in [(1, 0), (2, 1), (3, 2), (4, 2)] {
            db.insert_row(TABLE, &["id", "privilege"], &[Value::Int(id), Value::Int(p)])
                .await
                .unwrap();
        }

        assert_eq!(get_users(db.as_mut(), None).await.unwrap().len(), 4);
        assert_eq!(get_users(db.as_mut(), Some(0)).await.unwrap().len(), 1);
        assert_eq!(
            get_user_ids(db.as_mut(), &[1, 2]).await.unwrap(),
            vec![UserId(2), UserId(3), UserId(4)]
        );
        assert!(get_user_ids(db.as_mut(), &[]).await.unwrap().is_empty());
    }

    #[test]
    fn full_name_needs_both_parts() {
        let mut u = User {
            id: UserId(1),
            username: None,
            first_name: Some("Ana".to_string()),
            last_name: None,
            language_code: None,
            privilege: 0,
        };
        assert_eq!(u.full_name(), None);
        u.last_name = Some("Lee".to_string());
        assert_eq!(u.full_name().as_deref(), Some("Ana Lee"));
    }
}
