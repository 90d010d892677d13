use sqlx::Row;

use chatdesk_core::domain::contact::{Contact, ContactId, ContactPatch};

use super::{decode_err, parse_timestamp, ContactRepository, RepositoryError};
use crate::DbPool;

const CONTACT_COLUMNS: &str =
    "id, phone, name, email, notes, tags_json, bot_enabled, created_at, updated_at";

pub struct SqlContactRepository {
    pool: DbPool,
}

impl SqlContactRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn row_to_contact(row: &sqlx::sqlite::SqliteRow) -> Result<Contact, RepositoryError> {
    let id: String = row.try_get("id").map_err(decode_err)?;
    let phone: String = row.try_get("phone").map_err(decode_err)?;
    let name: String = row.try_get("name").map_err(decode_err)?;
    let email: Option<String> = row.try_get("email").map_err(decode_err)?;
    let notes: String = row.try_get("notes").map_err(decode_err)?;
    let tags_json: String = row.try_get("tags_json").map_err(decode_err)?;
    let bot_enabled: i64 = row.try_get("bot_enabled").map_err(decode_err)?;
    let created_at: String = row.try_get("created_at").map_err(decode_err)?;
    let updated_at: String = row.try_get("updated_at").map_err(decode_err)?;

    let tags: Vec<String> = serde_json::from_str(&tags_json)
        .map_err(|e| RepositoryError::Decode(format!("invalid tags for contact `{id}`: {e}")))?;

    Ok(Contact {
        id: ContactId(id),
        phone,
        name,
        email,
        notes,
        tags,
        bot_enabled: bot_enabled != 0,
        created_at: parse_timestamp(&created_at)?,
        updated_at: parse_timestamp(&updated_at)?,
    })
}

#[async_trait::async_trait]
impl ContactRepository for SqlContactRepository {
    async fn list(&self) -> Result<Vec<Contact>, RepositoryError> {
        let rows = sqlx::query(&format!(
            "SELECT {CONTACT_COLUMNS} FROM contact ORDER BY updated_at DESC, id ASC"
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_contact).collect()
    }

    async fn find_by_id(&self, id: &ContactId) -> Result<Option<Contact>, RepositoryError> {
        let row = sqlx::query(&format!("SELECT {CONTACT_COLUMNS} FROM contact WHERE id = ?"))
            .bind(&id.0)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(row_to_contact).transpose()
    }

    async fn save(&self, contact: Contact) -> Result<(), RepositoryError> {
        let tags_json = serde_json::to_string(&contact.tags)
            .map_err(|e| RepositoryError::Decode(e.to_string()))?;

        sqlx::query(
            "INSERT INTO contact (id, phone, name, email, notes, tags_json, bot_enabled,
                                  created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                 phone = excluded.phone,
                 name = excluded.name,
                 email = excluded.email,
                 notes = excluded.notes,
                 tags_json = excluded.tags_json,
                 bot_enabled = excluded.bot_enabled,
                 updated_at = excluded.updated_at",
        )
        .bind(&contact.id.0)
        .bind(&contact.phone)
        .bind(&contact.name)
        .bind(&contact.email)
        .bind(&contact.notes)
        .bind(&tags_json)
        .bind(i64::from(contact.bot_enabled))
        .bind(contact.created_at.to_rfc3339())
        .bind(contact.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn update(
        &self,
        id: &ContactId,
        patch: ContactPatch,
    ) -> Result<Contact, RepositoryError> {
        let mut contact = self
            .find_by_id(id)
            .await?
            .ok_or_else(|| RepositoryError::NotFound { entity: "contact", id: id.0.clone() })?;
        contact.apply(patch)?;
        self.save(contact.clone()).await?;
        Ok(contact)
    }
}

#[cfg(test)]
mod tests {
    use chatdesk_core::domain::contact::{Contact, ContactId, ContactPatch};

    use super::SqlContactRepository;
    use crate::repositories::{ContactRepository, RepositoryError};
    use crate::{connect_with_settings, migrations};

    async fn setup() -> sqlx::SqlitePool {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrations");
        pool
    }

    #[tokio::test]
    async fn save_and_find_round_trip() {
        let repo = SqlContactRepository::new(setup().await);
        let mut contact = Contact::new("c-1", "+5491111111111", "Lucía");
        contact.tags = vec!["vip".to_string(), "mayorista".to_string()];
        contact.email = Some("lucia@example.com".to_string());

        repo.save(contact.clone()).await.expect("save");
        let found = repo.find_by_id(&ContactId("c-1".to_string())).await.expect("find");

        let found = found.expect("contact exists");
        assert_eq!(found.name, "Lucía");
        assert_eq!(found.tags, contact.tags);
        assert_eq!(found.email, contact.email);
        assert!(found.bot_enabled);
    }

    #[tokio::test]
    async fn update_applies_patch_and_persists() {
        let repo = SqlContactRepository::new(setup().await);
        repo.save(Contact::new("c-1", "+5491111111111", "Lucía")).await.expect("save");

        let updated = repo
            .update(
                &ContactId("c-1".to_string()),
                ContactPatch { bot_enabled: Some(false), notes: Some("prefiere tarde".to_string()), ..ContactPatch::default() },
            )
            .await
            .expect("update");
        assert!(!updated.bot_enabled);

        let reloaded = repo
            .find_by_id(&ContactId("c-1".to_string()))
            .await
            .expect("find")
            .expect("contact exists");
        assert!(!reloaded.bot_enabled);
        assert_eq!(reloaded.notes, "prefiere tarde");
    }

    #[tokio::test]
    async fn update_of_unknown_contact_is_not_found() {
        let repo = SqlContactRepository::new(setup().await);
        let error = repo
            .update(&ContactId("missing".to_string()), ContactPatch::default())
            .await
            .expect_err("missing contact");

        assert!(matches!(error, RepositoryError::NotFound { entity: "contact", .. }));
    }

    #[tokio::test]
    async fn list_returns_every_contact() {
        let repo = SqlContactRepository::new(setup().await);
        repo.save(Contact::new("c-1", "+5491111111111", "Lucía")).await.expect("save");
        repo.save(Contact::new("c-2", "+5491122222222", "Pedro")).await.expect("save");

        let contacts = repo.list().await.expect("list");
        assert_eq!(contacts.len(), 2);
    }
}
