use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::access::Role;
use crate::errors::DomainError;
use crate::session::{hash_password, verify_password};

const MIN_PASSWORD_LEN: usize = 8;
// bcrypt ignores input past 72 bytes.
const MAX_PASSWORD_BYTES: usize = 72;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TeamUserId(pub String);

/// Dashboard operator account.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamUser {
    pub id: TeamUserId,
    pub email: String,
    pub display_name: String,
    pub role: Role,
    /// bcrypt hash string (`$2b$<cost>$<salt+digest>`).
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTeamUser {
    pub email: String,
    pub display_name: String,
    pub role: Role,
    pub password: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TeamUserPatch {
    pub display_name: Option<String>,
    pub role: Option<Role>,
    pub password: Option<String>,
    pub active: Option<bool>,
}

impl TeamUser {
    pub fn create(input: NewTeamUser) -> Result<Self, DomainError> {
        let email = normalize_email(&input.email)?;
        let display_name = input.display_name.trim();
        if display_name.is_empty() {
            return Err(DomainError::Validation("display name is required".to_string()));
        }
        validate_password(&input.password)?;

        let password_hash = hash_password(&input.password)?;
        Ok(Self {
            id: TeamUserId(Uuid::new_v4().to_string()),
            email,
            display_name: display_name.to_string(),
            role: input.role,
            password_hash,
            active: true,
            created_at: Utc::now(),
        })
    }

    pub fn apply(&mut self, patch: TeamUserPatch) -> Result<(), DomainError> {
        if let Some(display_name) = patch.display_name {
            let display_name = display_name.trim();
            if display_name.is_empty() {
                return Err(DomainError::Validation("display name is required".to_string()));
            }
            self.display_name = display_name.to_string();
        }
        if let Some(role) = patch.role {
            self.role = role;
        }
        if let Some(password) = patch.password {
            validate_password(&password)?;
            self.password_hash = hash_password(&password)?;
        }
        if let Some(active) = patch.active {
            self.active = active;
        }
        Ok(())
    }

    pub fn check_password(&self, password: &str) -> bool {
        self.active && verify_password(password, &self.password_hash)
    }
}

pub fn normalize_email(email: &str) -> Result<String, DomainError> {
    let email = email.trim().to_ascii_lowercase();
    let valid = email
        .split_once('@')
        .map(|(local, domain)| !local.is_empty() && domain.contains('.'))
        .unwrap_or(false);
    if valid {
        Ok(email)
    } else {
        Err(DomainError::Validation(format!("`{email}` is not a valid email address")))
    }
}

fn validate_password(password: &str) -> Result<(), DomainError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(DomainError::Validation(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    if password.len() > MAX_PASSWORD_BYTES {
        return Err(DomainError::Validation(format!(
            "password must be at most {MAX_PASSWORD_BYTES} bytes"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{normalize_email, NewTeamUser, TeamUser, TeamUserPatch};
    use crate::access::Role;

    fn new_user() -> NewTeamUser {
        NewTeamUser {
            email: " Ops@Example.com ".to_string(),
            display_name: "Ops".to_string(),
            role: Role::Editor,
            password: "correct-horse".to_string(),
        }
    }

    #[test]
    fn create_normalizes_email_and_hashes_password() {
        let user = TeamUser::create(new_user()).expect("valid user");

        assert_eq!(user.email, "ops@example.com");
        assert!(user.password_hash.starts_with("$2b$"));
        assert!(user.check_password("correct-horse"));
        assert!(!user.check_password("wrong-horse"));
    }

    #[test]
    fn serialized_users_never_expose_password_material() {
        let user = TeamUser::create(new_user()).expect("valid user");
        let json = serde_json::to_value(&user).expect("serialize");

        assert!(json.get("passwordHash").is_none());
        assert_eq!(json["role"], "EDITOR");
    }

    #[test]
    fn patch_rotates_password_and_deactivation_blocks_login() {
        let mut user = TeamUser::create(new_user()).expect("valid user");
        let old_hash = user.password_hash.clone();

        user.apply(TeamUserPatch {
            password: Some("new-password-1".to_string()),
            role: Some(Role::Viewer),
            ..TeamUserPatch::default()
        })
        .expect("valid patch");
        assert_ne!(user.password_hash, old_hash);
        assert!(user.check_password("new-password-1"));
        assert!(!user.check_password("correct-horse"));
        assert_eq!(user.role, Role::Viewer);

        user.apply(TeamUserPatch { active: Some(false), ..TeamUserPatch::default() })
            .expect("valid patch");
        assert!(!user.check_password("new-password-1"));
    }

    #[test]
    fn invalid_inputs_are_rejected() {
        assert!(normalize_email("no-at-sign").is_err());
        assert!(normalize_email("a@localhost").is_err());

        let short = NewTeamUser { password: "short".to_string(), ..new_user() };
        assert!(TeamUser::create(short).is_err());

        let long = NewTeamUser { password: "x".repeat(73), ..new_user() };
        assert!(TeamUser::create(long).is_err());
    }
}
