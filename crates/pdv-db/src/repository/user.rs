//! # User Repository
//!
//! Operators, their roles and password hashes.
//!
//! The hash column is only read by [`UserRepository::find_credentials`];
//! every other query maps to [`pdv_core::User`], which has no hash field.

use chrono::Utc;
use pdv_core::{Role, User};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{DbError, DbResult};

const USER_COLUMNS: &str = "id, name, email, phone, role, active, created_at, updated_at";

/// A user to insert. The password is already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub password_hash: String,
    pub role: Role,
}

/// Partial user update. `None` leaves the column untouched; for `phone`,
/// `Some(None)` clears it.
#[derive(Debug, Clone, Default)]
pub struct UserUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<Option<String>>,
    pub role: Option<Role>,
    pub active: Option<bool>,
}

impl UserUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.email.is_none()
            && self.phone.is_none()
            && self.role.is_none()
            && self.active.is_none()
    }
}

#[derive(sqlx::FromRow)]
struct UserWithHash {
    #[sqlx(flatten)]
    user: User,
    password_hash: String,
}

/// Repository for user database operations.
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        UserRepository { pool }
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    pub async fn get_by_email(&self, email: &str) -> DbResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = ?1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Returns the user and stored password hash for a login attempt.
    pub async fn find_credentials(&self, email: &str) -> DbResult<Option<(User, String)>> {
        let row = sqlx::query_as::<_, UserWithHash>(&format!(
            "SELECT {USER_COLUMNS}, password_hash FROM users WHERE email = ?1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| (r.user, r.password_hash)))
    }

    /// Stored password hash of a user.
    pub async fn password_hash(&self, id: &str) -> DbResult<String> {
        sqlx::query_scalar::<_, String>("SELECT password_hash FROM users WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("User", id))
    }

    /// All users, newest first.
    pub async fn list(&self) -> DbResult<Vec<User>> {
        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }

    /// Inserts a user. A taken email gives `UniqueViolation { field: "email" }`.
    pub async fn insert(&self, new_user: NewUser) -> DbResult<User> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now();

        debug!(id = %id, email = %new_user.email, role = new_user.role.as_str(), "Inserting user");

        sqlx::query(
            r#"
            INSERT INTO users (
                id, name, email, phone, password_hash, role, active,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, 1, ?7, ?7)
            "#,
        )
        .bind(&id)
        .bind(&new_user.name)
        .bind(&new_user.email)
        .bind(&new_user.phone)
        .bind(&new_user.password_hash)
        .bind(new_user.role)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| email_conflict(e.into(), &new_user.email))?;

        info!(id = %id, role = new_user.role.as_str(), "User created");

        self.get_by_id(&id)
            .await?
            .ok_or_else(|| DbError::not_found("User", id))
    }

    /// Applies a partial update and returns the new row.
    pub async fn update(&self, id: &str, update: UserUpdate) -> DbResult<User> {
        if update.is_empty() {
            return Err(pdv_core::ValidationError::NothingToUpdate.into());
        }

        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE users SET ");
        {
            let mut set = qb.separated(", ");
            if let Some(name) = &update.name {
                set.push("name = ").push_bind_unseparated(name.clone());
            }
            if let Some(email) = &update.email {
                set.push("email = ").push_bind_unseparated(email.clone());
            }
            if let Some(phone) = &update.phone {
                set.push("phone = ").push_bind_unseparated(phone.clone());
            }
            if let Some(role) = update.role {
                set.push("role = ").push_bind_unseparated(role);
            }
            if let Some(active) = update.active {
                set.push("active = ").push_bind_unseparated(active);
            }
            set.push("updated_at = ").push_bind_unseparated(Utc::now());
        }
        qb.push(" WHERE id = ").push_bind(id.to_string());

        let result = qb.build().execute(&self.pool).await.map_err(|e| {
            let err: DbError = e.into();
            match &update.email {
                Some(email) => email_conflict(err, email),
                None => err,
            }
        })?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("User", id));
        }

        debug!(id = %id, "User updated");

        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("User", id))
    }

    pub async fn set_password_hash(&self, id: &str, password_hash: &str) -> DbResult<()> {
        let result = sqlx::query("UPDATE users SET password_hash = ?1, updated_at = ?2 WHERE id = ?3")
            .bind(password_hash)
            .bind(Utc::now())
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("User", id));
        }
        Ok(())
    }
}

fn email_conflict(err: DbError, email: &str) -> DbError {
    match err {
        DbError::UniqueViolation { .. } => DbError::duplicate("email", email),
        other => other,
    }
}
