use sqlx::Row;

use chatdesk_core::access::Role;
use chatdesk_core::domain::team::{normalize_email, TeamUser, TeamUserId, TeamUserPatch};

use super::{decode_err, parse_timestamp, RepositoryError, TeamUserRepository};
use crate::DbPool;

const USER_COLUMNS: &str =
    "id, email, display_name, role, password_hash, active, created_at";

pub struct SqlTeamUserRepository {
    pool: DbPool,
}

impl SqlTeamUserRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    async fn write(&self, user: &TeamUser) -> Result<(), RepositoryError> {
        sqlx::query(
            "UPDATE team_user SET
                 display_name = ?, role = ?, password_hash = ?, active = ?
             WHERE id = ?",
        )
        .bind(&user.display_name)
        .bind(user.role.as_str())
        .bind(&user.password_hash)
        .bind(i64::from(user.active))
        .bind(&user.id.0)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

fn row_to_user(row: &sqlx::sqlite::SqliteRow) -> Result<TeamUser, RepositoryError> {
    let id: String = row.try_get("id").map_err(decode_err)?;
    let email: String = row.try_get("email").map_err(decode_err)?;
    let display_name: String = row.try_get("display_name").map_err(decode_err)?;
    let role: String = row.try_get("role").map_err(decode_err)?;
    let password_hash: String = row.try_get("password_hash").map_err(decode_err)?;
    let active: i64 = row.try_get("active").map_err(decode_err)?;
    let created_at: String = row.try_get("created_at").map_err(decode_err)?;

    Ok(TeamUser {
        id: TeamUserId(id),
        email,
        display_name,
        role: role.parse::<Role>().map_err(decode_err)?,
        password_hash,
        active: active != 0,
        created_at: parse_timestamp(&created_at)?,
    })
}

fn is_unique_violation(error: &sqlx::Error) -> bool {
    matches!(error, sqlx::Error::Database(db) if db.is_unique_violation())
}

#[async_trait::async_trait]
impl TeamUserRepository for SqlTeamUserRepository {
    async fn list(&self) -> Result<Vec<TeamUser>, RepositoryError> {
        let rows = sqlx::query(&format!(
            "SELECT {USER_COLUMNS} FROM team_user ORDER BY created_at ASC, email ASC"
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_user).collect()
    }

    async fn find_by_id(&self, id: &TeamUserId) -> Result<Option<TeamUser>, RepositoryError> {
        let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM team_user WHERE id = ?"))
            .bind(&id.0)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(row_to_user).transpose()
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<TeamUser>, RepositoryError> {
        let Ok(email) = normalize_email(email) else {
            return Ok(None);
        };
        let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM team_user WHERE email = ?"))
            .bind(&email)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(row_to_user).transpose()
    }

    async fn create(&self, user: TeamUser) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "INSERT INTO team_user (id, email, display_name, role, password_hash, active, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&user.id.0)
        .bind(&user.email)
        .bind(&user.display_name)
        .bind(user.role.as_str())
        .bind(&user.password_hash)
        .bind(i64::from(user.active))
        .bind(user.created_at.to_rfc3339())
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(error) if is_unique_violation(&error) => Err(RepositoryError::Conflict(format!(
                "a team user with email `{}` already exists",
                user.email
            ))),
            Err(error) => Err(error.into()),
        }
    }

    async fn update(
        &self,
        id: &TeamUserId,
        patch: TeamUserPatch,
    ) -> Result<TeamUser, RepositoryError> {
        let mut user = self
            .find_by_id(id)
            .await?
            .ok_or_else(|| RepositoryError::NotFound { entity: "team user", id: id.0.clone() })?;
        user.apply(patch)?;
        self.write(&user).await?;
        Ok(user)
    }

    async fn delete(&self, id: &TeamUserId) -> Result<(), RepositoryError> {
        let result =
            sqlx::query("DELETE FROM team_user WHERE id = ?").bind(&id.0).execute(&self.pool).await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound { entity: "team user", id: id.0.clone() });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chatdesk_core::access::Role;
    use chatdesk_core::domain::team::{NewTeamUser, TeamUser, TeamUserPatch};

    use super::SqlTeamUserRepository;
    use crate::repositories::{RepositoryError, TeamUserRepository};
    use crate::{connect_with_settings, migrations};

    async fn setup() -> sqlx::SqlitePool {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrations");
        pool
    }

    fn user(email: &str, role: Role) -> TeamUser {
        TeamUser::create(NewTeamUser {
            email: email.to_string(),
            display_name: "Operator".to_string(),
            role,
            password: "password-123".to_string(),
        })
        .expect("valid user")
    }

    #[tokio::test]
    async fn create_and_find_by_email_is_case_insensitive() {
        let repo = SqlTeamUserRepository::new(setup().await);
        let admin = user("admin@example.com", Role::Admin);
        repo.create(admin.clone()).await.expect("create");

        let found = repo.find_by_email("ADMIN@example.com").await.expect("find");
        let found = found.expect("user exists");
        assert_eq!(found.id, admin.id);
        assert_eq!(found.role, Role::Admin);
        assert!(found.check_password("password-123"));
    }

    #[tokio::test]
    async fn duplicate_email_is_a_conflict() {
        let repo = SqlTeamUserRepository::new(setup().await);
        repo.create(user("ops@example.com", Role::Editor)).await.expect("first create");

        let error =
            repo.create(user("ops@example.com", Role::Viewer)).await.expect_err("duplicate");
        assert!(matches!(error, RepositoryError::Conflict(_)));
    }

    #[tokio::test]
    async fn update_changes_role_and_delete_removes_user() {
        let repo = SqlTeamUserRepository::new(setup().await);
        let editor = user("ops@example.com", Role::Editor);
        repo.create(editor.clone()).await.expect("create");

        let updated = repo
            .update(&editor.id, TeamUserPatch { role: Some(Role::Viewer), ..TeamUserPatch::default() })
            .await
            .expect("update");
        assert_eq!(updated.role, Role::Viewer);
        assert_eq!(
            repo.find_by_id(&editor.id).await.expect("find").map(|user| user.role),
            Some(Role::Viewer)
        );

        repo.delete(&editor.id).await.expect("delete");
        assert!(repo.list().await.expect("list").is_empty());
        assert!(matches!(
            repo.delete(&editor.id).await,
            Err(RepositoryError::NotFound { entity: "team user", .. })
        ));
    }
}
