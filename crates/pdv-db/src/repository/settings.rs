//! # Settings Repository
//!
//! Key/value store with JSON values (`app_settings`).

use chrono::Utc;
use pdv_core::SecuritySettings;
use serde::de::DeserializeOwned;
use serde::Serialize;
use sqlx::SqlitePool;
use tracing::{info, warn};

use crate::error::{DbError, DbResult};

/// Key of the inactivity settings row.
pub const SECURITY_SETTINGS_KEY: &str = "security";

#[derive(Debug, Clone)]
pub struct SettingsRepository {
    pool: SqlitePool,
}

impl SettingsRepository {
    pub fn new(pool: SqlitePool) -> Self {
        SettingsRepository { pool }
    }

    /// Reads and decodes a setting. `Ok(None)` when the key was never set.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> DbResult<Option<T>> {
        let raw = sqlx::query_scalar::<_, String>("SELECT value FROM app_settings WHERE key = ?1")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        raw.map(|json| {
            serde_json::from_str(&json).map_err(|e| {
                warn!(key = %key, error = %e, "Stored setting is not valid JSON");
                DbError::Corrupt(format!("app_settings.{key}"))
            })
        })
        .transpose()
    }

    /// Inserts or replaces a setting.
    pub async fn put<T: Serialize>(&self, key: &str, value: &T) -> DbResult<()> {
        let json = serde_json::to_string(value).map_err(|e| DbError::Internal(e.to_string()))?;

        sqlx::query(
            r#"
            INSERT INTO app_settings (key, value, updated_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT (key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
            "#,
        )
        .bind(key)
        .bind(json)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Stored inactivity settings, `None` before the first save.
    pub async fn security_settings(&self) -> DbResult<Option<SecuritySettings>> {
        self.get(SECURITY_SETTINGS_KEY).await
    }

    /// Validates and stores the inactivity settings.
    pub async fn save_security_settings(&self, settings: &SecuritySettings) -> DbResult<()> {
        settings.validate()?;
        self.put(SECURITY_SETTINGS_KEY, settings).await?;

        info!(
            timeout_minutes = settings.inactivity_timeout_minutes,
            warning_minutes = settings.warning_minutes,
            warnings_enabled = settings.warnings_enabled,
            "Security settings updated"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::test_db;

    #[tokio::test]
    async fn test_security_settings_default_and_save() {
        let db = test_db().await;
        let repo = db.settings();

        assert_eq!(repo.security_settings().await.unwrap(), None);

        let custom = SecuritySettings {
            inactivity_timeout_minutes: 60,
            warning_minutes: 10,
            warnings_enabled: false,
        };
        repo.save_security_settings(&custom).await.unwrap();
        assert_eq!(repo.security_settings().await.unwrap(), Some(custom));

        // Saving twice replaces the row
        repo.save_security_settings(&SecuritySettings::default()).await.unwrap();
        assert_eq!(
            repo.security_settings().await.unwrap(),
            Some(SecuritySettings::default())
        );
    }

    #[tokio::test]
    async fn test_invalid_settings_are_not_saved() {
        let db = test_db().await;
        let repo = db.settings();

        let invalid = SecuritySettings {
            inactivity_timeout_minutes: 1000,
            warning_minutes: 5,
            warnings_enabled: true,
        };
        assert!(repo.save_security_settings(&invalid).await.is_err());
        assert_eq!(repo.security_settings().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_corrupt_value() {
        let db = test_db().await;
        sqlx::query("INSERT INTO app_settings (key, value, updated_at) VALUES ('security', 'not json', '')")
            .execute(db.pool())
            .await
            .unwrap();

        assert!(matches!(
            db.settings().security_settings().await,
            Err(DbError::Corrupt(_))
        ));
    }
}
