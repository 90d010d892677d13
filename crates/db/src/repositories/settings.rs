use sqlx::Row;

use chatdesk_core::domain::settings::BotSettings;

use super::{decode_err, parse_timestamp, RepositoryError, SettingsRepository};
use crate::DbPool;

/// Single-row store for the bot configuration (`bot_settings.id = 1`).
pub struct SqlSettingsRepository {
    pool: DbPool,
}

impl SqlSettingsRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl SettingsRepository for SqlSettingsRepository {
    async fn load(&self) -> Result<Option<BotSettings>, RepositoryError> {
        let row = sqlx::query(
            "SELECT prompt_system, updated_by, updated_at FROM bot_settings WHERE id = 1",
        )
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let prompt_system: String = row.try_get("prompt_system").map_err(decode_err)?;
        let updated_by: Option<String> = row.try_get("updated_by").map_err(decode_err)?;
        let updated_at: String = row.try_get("updated_at").map_err(decode_err)?;

        Ok(Some(BotSettings { prompt_system, updated_by, updated_at: parse_timestamp(&updated_at)? }))
    }

    async fn save(&self, settings: BotSettings) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO bot_settings (id, prompt_system, updated_by, updated_at)
             VALUES (1, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                 prompt_system = excluded.prompt_system,
                 updated_by = excluded.updated_by,
                 updated_at = excluded.updated_at",
        )
        .bind(&settings.prompt_system)
        .bind(&settings.updated_by)
        .bind(settings.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chatdesk_core::domain::settings::BotSettings;

    use super::SqlSettingsRepository;
    use crate::repositories::SettingsRepository;
    use crate::{connect_with_settings, migrations};

    async fn setup() -> sqlx::SqlitePool {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrations");
        pool
    }

    #[tokio::test]
    async fn load_returns_none_before_first_save() {
        let repo = SqlSettingsRepository::new(setup().await);
        assert!(repo.load().await.expect("load").is_none());
    }

    #[tokio::test]
    async fn save_overwrites_the_single_settings_row() {
        let pool = setup().await;
        let repo = SqlSettingsRepository::new(pool.clone());

        repo.save(BotSettings::new("<role>First</role>", None)).await.expect("first save");
        repo.save(BotSettings::new("<role>Second</role>", Some("user-1".to_string())))
            .await
            .expect("second save");

        let loaded = repo.load().await.expect("load").expect("settings present");
        assert_eq!(loaded.prompt_system, "<role>Second</role>");
        assert_eq!(loaded.updated_by.as_deref(), Some("user-1"));

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM bot_settings")
            .fetch_one(&pool)
            .await
            .expect("count");
        assert_eq!(count, 1);
    }
}
