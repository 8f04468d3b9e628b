use std::sync::Mutex;

use async_trait::async_trait;
use sqlx::PgPool;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::auth::repo_types::{NewUser, User};

/// Errors from inserting a user row.
#[derive(Debug, thiserror::Error)]
pub enum CreateUserError {
    /// The storage-level unique index rejected the email. The service's
    /// prior lookup is advisory; this is the authoritative check.
    #[error("email already registered")]
    DuplicateEmail,
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Persistence seam for user records. Soft-deleted rows are excluded
/// unless `include_deleted` is set.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_email(
        &self,
        email: &str,
        include_deleted: bool,
    ) -> anyhow::Result<Option<User>>;

    async fn create(&self, new: NewUser) -> Result<User, CreateUserError>;
}

/// sqlx-backed store against the `users` table.
#[derive(Clone)]
pub struct PgUsers {
    db: PgPool,
}

impl PgUsers {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserStore for PgUsers {
    async fn find_by_email(
        &self,
        email: &str,
        include_deleted: bool,
    ) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, firstname, lastname, password_hash, agreed_to_terms,
                   created_at, last_updated_at, deleted_at
            FROM users
            WHERE email = $1 AND (deleted_at IS NULL OR $2)
            "#,
        )
        .bind(email)
        .bind(include_deleted)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn create(&self, new: NewUser) -> Result<User, CreateUserError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, firstname, lastname, password_hash, agreed_to_terms)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, email, firstname, lastname, password_hash, agreed_to_terms,
                      created_at, last_updated_at, deleted_at
            "#,
        )
        .bind(&new.email)
        .bind(&new.firstname)
        .bind(&new.lastname)
        .bind(&new.password_hash)
        .bind(new.agreed_to_terms)
        .fetch_one(&self.db)
        .await
        .map_err(|e| {
            // 23505 = unique_violation
            let duplicate = e
                .as_database_error()
                .and_then(|d| d.code())
                .map(|code| code == "23505")
                .unwrap_or(false);
            if duplicate {
                CreateUserError::DuplicateEmail
            } else {
                CreateUserError::Other(e.into())
            }
        })?;
        Ok(user)
    }
}

/// In-memory store used by tests and `AppState::fake()`. Honors the same
/// uniqueness and soft-delete semantics as the Postgres store.
#[derive(Default)]
pub struct MemoryUsers {
    rows: Mutex<Vec<User>>,
}

impl MemoryUsers {
    #[cfg(test)]
    pub fn soft_delete(&self, email: &str) {
        let mut rows = self.rows.lock().expect("users lock poisoned");
        if let Some(user) = rows
            .iter_mut()
            .find(|u| u.email == email && u.deleted_at.is_none())
        {
            user.deleted_at = Some(OffsetDateTime::now_utc());
        }
    }
}

#[async_trait]
impl UserStore for MemoryUsers {
    async fn find_by_email(
        &self,
        email: &str,
        include_deleted: bool,
    ) -> anyhow::Result<Option<User>> {
        let rows = self.rows.lock().expect("users lock poisoned");
        Ok(rows
            .iter()
            .find(|u| u.email == email && (include_deleted || u.deleted_at.is_none()))
            .cloned())
    }

    async fn create(&self, new: NewUser) -> Result<User, CreateUserError> {
        let mut rows = self.rows.lock().expect("users lock poisoned");
        if rows
            .iter()
            .any(|u| u.email == new.email && u.deleted_at.is_none())
        {
            return Err(CreateUserError::DuplicateEmail);
        }
        let now = OffsetDateTime::now_utc();
        let user = User {
            id: Uuid::new_v4(),
            email: new.email,
            firstname: new.firstname,
            lastname: new.lastname,
            password_hash: new.password_hash,
            agreed_to_terms: new.agreed_to_terms,
            created_at: now,
            last_updated_at: now,
            deleted_at: None,
        };
        rows.push(user.clone());
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(email: &str) -> NewUser {
        NewUser {
            email: email.into(),
            firstname: "A".into(),
            lastname: "B".into(),
            password_hash: "hash".into(),
            agreed_to_terms: true,
        }
    }

    #[tokio::test]
    async fn create_rejects_duplicate_email() {
        let store = MemoryUsers::default();
        store.create(new_user("a@b.com")).await.expect("first create");
        let err = store.create(new_user("a@b.com")).await.unwrap_err();
        assert!(matches!(err, CreateUserError::DuplicateEmail));
    }

    #[tokio::test]
    async fn find_excludes_soft_deleted_by_default() {
        let store = MemoryUsers::default();
        store.create(new_user("a@b.com")).await.expect("create");
        store.soft_delete("a@b.com");

        let visible = store.find_by_email("a@b.com", false).await.expect("find");
        assert!(visible.is_none());

        let with_deleted = store.find_by_email("a@b.com", true).await.expect("find");
        assert!(with_deleted.is_some());
    }

    #[tokio::test]
    async fn soft_deleted_email_can_be_reused() {
        let store = MemoryUsers::default();
        store.create(new_user("a@b.com")).await.expect("create");
        store.soft_delete("a@b.com");
        store
            .create(new_user("a@b.com"))
            .await
            .expect("re-create after soft delete");
    }
}
