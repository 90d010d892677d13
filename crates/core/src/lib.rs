pub mod access;
pub mod config;
pub mod domain;
pub mod errors;
pub mod prompt;
pub mod session;

pub use access::{authorize, AccessDenied, Capability, Role};
pub use domain::chat::{ChatMessage, MessageDirection};
pub use domain::contact::{Contact, ContactId, ContactPatch};
pub use domain::settings::{BotSettings, SettingsPayload};
pub use domain::team::{NewTeamUser, TeamUser, TeamUserId, TeamUserPatch};
pub use errors::{ApplicationError, DomainError, InterfaceError};
pub use prompt::{parse_prompt, render_prompt, PromptData};
pub use session::{SessionClaims, SessionError, SessionSigner, SessionToken};
