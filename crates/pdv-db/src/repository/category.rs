//! # Category Repository
//!
//! Categories are created on demand from the name typed in the product
//! form. Names are unique among active categories.

use chrono::Utc;
use pdv_core::validation::validate_category;
use pdv_core::{Category, NO_CATEGORY_LABEL};
use sqlx::SqlitePool;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{DbError, DbResult};

#[derive(Debug, Clone)]
pub struct CategoryRepository {
    pool: SqlitePool,
}

impl CategoryRepository {
    pub fn new(pool: SqlitePool) -> Self {
        CategoryRepository { pool }
    }

    /// Active categories sorted by name.
    pub async fn list_active(&self) -> DbResult<Vec<Category>> {
        let categories = sqlx::query_as::<_, Category>(
            r#"
            SELECT id, name, description, active, created_at, updated_at
            FROM categories
            WHERE active = 1
            ORDER BY name
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(categories)
    }

    pub async fn find_by_name(&self, name: &str) -> DbResult<Option<String>> {
        let id = sqlx::query_scalar::<_, String>(
            "SELECT id FROM categories WHERE name = ?1 AND active = 1",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        Ok(id)
    }

    /// Resolves a category name to an id, creating the category if needed.
    ///
    /// ## Returns
    /// * `Ok(None)` - blank name or "Sem categoria"
    /// * `Ok(Some(id))` - existing or newly created category
    /// * `Err(Validation)` - a one-character or overlong name
    pub async fn get_or_create(&self, name: &str) -> DbResult<Option<String>> {
        let Some(name) = validate_category(Some(name))? else {
            return Ok(None);
        };
        if name == NO_CATEGORY_LABEL {
            return Ok(None);
        }
        let name = name.as_str();

        if let Some(id) = self.find_by_name(name).await? {
            return Ok(Some(id));
        }

        let id = Uuid::new_v4().to_string();
        let now = Utc::now();

        let inserted = sqlx::query(
            r#"
            INSERT INTO categories (id, name, description, active, created_at, updated_at)
            VALUES (?1, ?2, NULL, 1, ?3, ?3)
            "#,
        )
        .bind(&id)
        .bind(name)
        .bind(now)
        .execute(&self.pool)
        .await;

        match inserted.map_err(DbError::from) {
            Ok(_) => {
                info!(id = %id, name = %name, "Category created");
                Ok(Some(id))
            }
            // Another request created it between the lookup and the insert
            Err(DbError::UniqueViolation { .. }) => {
                debug!(name = %name, "Category created concurrently, re-reading");
                self.find_by_name(name)
                    .await?
                    .map(Some)
                    .ok_or_else(|| DbError::not_found("Category", name))
            }
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::error::DbError;
    use crate::repository::test_support::test_db;
    use pdv_core::{CoreError, ValidationError};

    #[tokio::test]
    async fn test_get_or_create_reuses_existing() {
        let db = test_db().await;
        let repo = db.categories();

        let first = repo.get_or_create("Bebidas").await.unwrap().unwrap();
        let second = repo.get_or_create("  Bebidas ").await.unwrap().unwrap();
        assert_eq!(first, second);

        let all = repo.list_active().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].name, "Bebidas");
    }

    #[tokio::test]
    async fn test_no_category_labels() {
        let db = test_db().await;
        let repo = db.categories();

        assert_eq!(repo.get_or_create("").await.unwrap(), None);
        assert_eq!(repo.get_or_create("Sem categoria").await.unwrap(), None);
        assert!(repo.list_active().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_short_name_is_rejected() {
        let db = test_db().await;
        let repo = db.categories();

        let err = repo.get_or_create(" B ").await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Core(CoreError::Validation(ValidationError::TooShort { .. }))
        ));
        assert!(repo.list_active().await.unwrap().is_empty());

        assert!(repo.get_or_create("Pães").await.unwrap().is_some());
    }
}
