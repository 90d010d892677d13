use async_trait::async_trait;
use thiserror::Error;

use chatdesk_core::domain::chat::ChatMessage;
use chatdesk_core::domain::contact::{Contact, ContactId, ContactPatch};
use chatdesk_core::domain::settings::BotSettings;
use chatdesk_core::domain::team::{TeamUser, TeamUserId, TeamUserPatch};
use chatdesk_core::errors::{ApplicationError, DomainError};

pub mod chat;
pub mod contact;
pub mod settings;
pub mod user;

pub use chat::SqlChatRepository;
pub use contact::SqlContactRepository;
pub use settings::SqlSettingsRepository;
pub use user::SqlTeamUserRepository;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
    #[error("{entity} `{id}` not found")]
    NotFound { entity: &'static str, id: String },
    #[error("{0}")]
    Conflict(String),
    #[error(transparent)]
    Domain(#[from] DomainError),
}

impl From<RepositoryError> for ApplicationError {
    fn from(value: RepositoryError) -> Self {
        match value {
            RepositoryError::NotFound { entity, id } => Self::NotFound { entity, id },
            RepositoryError::Domain(error) => Self::Domain(error),
            RepositoryError::Conflict(message) => Self::Domain(DomainError::Validation(message)),
            other => Self::Persistence(other.to_string()),
        }
    }
}

pub(crate) fn decode_err(error: impl std::fmt::Display) -> RepositoryError {
    RepositoryError::Decode(error.to_string())
}

pub(crate) fn parse_timestamp(
    value: &str,
) -> Result<chrono::DateTime<chrono::Utc>, RepositoryError> {
    chrono::DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&chrono::Utc))
        .map_err(|error| RepositoryError::Decode(format!("invalid timestamp `{value}`: {error}")))
}

#[async_trait]
pub trait SettingsRepository: Send + Sync {
    async fn load(&self) -> Result<Option<BotSettings>, RepositoryError>;
    async fn save(&self, settings: BotSettings) -> Result<(), RepositoryError>;
}

#[async_trait]
pub trait ContactRepository: Send + Sync {
    async fn list(&self) -> Result<Vec<Contact>, RepositoryError>;
    async fn find_by_id(&self, id: &ContactId) -> Result<Option<Contact>, RepositoryError>;
    async fn save(&self, contact: Contact) -> Result<(), RepositoryError>;
    async fn update(&self, id: &ContactId, patch: ContactPatch)
        -> Result<Contact, RepositoryError>;
}

#[async_trait]
pub trait TeamUserRepository: Send + Sync {
    async fn list(&self) -> Result<Vec<TeamUser>, RepositoryError>;
    async fn find_by_id(&self, id: &TeamUserId) -> Result<Option<TeamUser>, RepositoryError>;
    async fn find_by_email(&self, email: &str) -> Result<Option<TeamUser>, RepositoryError>;
    async fn create(&self, user: TeamUser) -> Result<(), RepositoryError>;
    async fn update(
        &self,
        id: &TeamUserId,
        patch: TeamUserPatch,
    ) -> Result<TeamUser, RepositoryError>;
    async fn delete(&self, id: &TeamUserId) -> Result<(), RepositoryError>;
}

#[async_trait]
pub trait ChatRepository: Send + Sync {
    async fn list_for_contact(
        &self,
        contact_id: &ContactId,
        limit: u32,
    ) -> Result<Vec<ChatMessage>, RepositoryError>;
    async fn append(&self, message: ChatMessage) -> Result<(), RepositoryError>;
}
