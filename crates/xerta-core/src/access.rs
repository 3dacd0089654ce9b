//! Access control for command handlers.
//!
//! Every handler declares an [`Access`] level. [`check`] runs before the
//! handler: `Public` registers the caller, `Private` and `Restricted` look the
//! caller up among the privileged users.

use tracing::info;

use crate::{
    db::Database,
    domain::{Privilege, UserProfile, PRIVILEGE_ADMIN, PRIVILEGE_ELEVATED},
    store::users,
    Result,
};

pub const PRIVATE_DENIAL: &str = "Sorry, this method is private.";
pub const RESTRICTED_DENIAL: &str = "Sorry, this method is restricted.";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Access {
    /// Anyone; the caller is registered (or refreshed) in `users`.
    Public,
    /// Privilege 1 or 2.
    Private,
    /// Privilege 2 only.
    Restricted,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Gate {
    Allowed,
    Denied(&'static str),
}

impl Access {
    pub fn allowed_privileges(self) -> &'static [Privilege] {
        match self {
            Access::Public => &[],
            Access::Private => &[PRIVILEGE_ELEVATED, PRIVILEGE_ADMIN],
            Access::Restricted => &[PRIVILEGE_ADMIN],
        }
    }

    pub fn denial_message(self) -> &'static str {
        match self {
            Access::Public => "",
            Access::Private => PRIVATE_DENIAL,
            Access::Restricted => RESTRICTED_DENIAL,
        }
    }
}

pub async fn check(db: &mut dyn Database, access: Access, caller: &UserProfile) -> Result<Gate> {
    if access == Access::Public {
        users::insert_user(db, caller).await?;
        return Ok(Gate::Allowed);
    }

    let ids = users::get_user_ids(db, access.allowed_privileges()).await?;
    if ids.contains(&caller.id) {
        Ok(Gate::Allowed)
    } else {
        info!(user_id = caller.id.0, ?access, "access denied");
        Ok(Gate::Denied(access.denial_message()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{Connector, MemoryConnector, Value};

    async fn with_privileges() -> MemoryConnector {
        let c = MemoryConnector::with_bot_schema();
        let mut db = c.connect().await.unwrap();
        for (id, p) in [(10, 0), (11, 1), (12, 2)] {
            db.insert_row(
                users::TABLE,
                &["id", "first_name", "privilege"],
                &[Value::Int(id), Value::from("u"), Value::Int(p)],
            )
            .await
            .unwrap();
        }
        c
    }

    async fn gate(c: &MemoryConnector, access: Access, id: i64) -> Gate {
        let mut db = c.connect().await.unwrap();
        check(db.as_mut(), access, &UserProfile::new(id, "u"))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn privilege_matrix() {
        let c = with_privileges().await;

        assert_eq!(gate(&c, Access::Private, 12).await, Gate::Allowed);
        assert_eq!(gate(&c, Access::Restricted, 12).await, Gate::Allowed);

        assert_eq!(gate(&c, Access::Private, 11).await, Gate::Allowed);
        assert_eq!(
            gate(&c, Access::Restricted, 11).await,
            Gate::Denied(RESTRICTED_DENIAL)
        );

        assert_eq!(gate(&c, Access::Private, 10).await, Gate::Denied(PRIVATE_DENIAL));
        assert_eq!(
            gate(&c, Access::Restricted, 10).await,
            Gate::Denied(RESTRICTED_DENIAL)
        );
    }

    #[tokio::test]
    async fn unknown_caller_is_denied_without_registration() {
        let c = with_privileges().await;
        assert_eq!(gate(&c, Access::Restricted, 99).await, Gate::Denied(RESTRICTED_DENIAL));
        assert_eq!(c.snapshot(users::TABLE).unwrap().len(), 3);
    }

    #[tokio::test]
    async fn public_registers_the_caller() {
        let c = with_privileges().await;
        assert_eq!(gate(&c, Access::Public, 99).await, Gate::Allowed);
        assert_eq!(c.snapshot(users::TABLE).unwrap().len(), 4);

        // Existing users keep their privilege.
        assert_eq!(gate(&c, Access::Public, 12).await, Gate::Allowed);
        assert_eq!(gate(&c, Access::Restricted, 12).await, Gate::Allowed);
    }
}
