use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Admin,
    Editor,
    Viewer,
}

/// Operation a dashboard user may attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    ViewDashboard,
    ViewContacts,
    EditContacts,
    ViewPrompt,
    EditPrompt,
    ViewChats,
    ManageUsers,
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("role `{role}` is not allowed to {capability}")]
pub struct AccessDenied {
    pub role: Role,
    pub capability: Capability,
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("unknown role `{0}` (expected ADMIN|EDITOR|VIEWER)")]
pub struct UnknownRole(pub String);

impl Role {
    pub const ALL: [Role; 3] = [Role::Admin, Role::Editor, Role::Viewer];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "ADMIN",
            Self::Editor => "EDITOR",
            Self::Viewer => "VIEWER",
        }
    }

    pub fn allows(&self, capability: Capability) -> bool {
        match self {
            Self::Admin => true,
            Self::Editor => capability != Capability::ManageUsers,
            Self::Viewer => capability.is_read_only(),
        }
    }
}

impl Capability {
    pub fn is_read_only(&self) -> bool {
        matches!(
            self,
            Self::ViewDashboard | Self::ViewContacts | Self::ViewPrompt | Self::ViewChats
        )
    }

    fn describe(&self) -> &'static str {
        match self {
            Self::ViewDashboard => "view the dashboard",
            Self::ViewContacts => "view contacts",
            Self::EditContacts => "edit contacts",
            Self::ViewPrompt => "view the system prompt",
            Self::EditPrompt => "edit the system prompt",
            Self::ViewChats => "view chat history",
            Self::ManageUsers => "manage team users",
        }
    }
}

/// Gate consulted at the start of every operation handler.
pub fn authorize(role: Role, capability: Capability) -> Result<(), AccessDenied> {
    if role.allows(capability) {
        Ok(())
    } else {
        Err(AccessDenied { role, capability })
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.describe())
    }
}

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_uppercase().as_str() {
            "ADMIN" => Ok(Self::Admin),
            "EDITOR" => Ok(Self::Editor),
            "VIEWER" => Ok(Self::Viewer),
            _ => Err(UnknownRole(value.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{authorize, Capability, Role};

    #[test]
    fn admin_can_do_everything() {
        for capability in [
            Capability::ViewDashboard,
            Capability::EditContacts,
            Capability::EditPrompt,
            Capability::ManageUsers,
        ] {
            assert!(authorize(Role::Admin, capability).is_ok());
        }
    }

    #[test]
    fn editor_cannot_manage_users() {
        assert!(authorize(Role::Editor, Capability::EditPrompt).is_ok());
        assert!(authorize(Role::Editor, Capability::EditContacts).is_ok());
        let denied = authorize(Role::Editor, Capability::ManageUsers).expect_err("denied");
        assert_eq!(denied.to_string(), "role `EDITOR` is not allowed to manage team users");
    }

    #[test]
    fn viewer_is_read_only() {
        assert!(authorize(Role::Viewer, Capability::ViewChats).is_ok());
        assert!(authorize(Role::Viewer, Capability::ViewPrompt).is_ok());
        assert!(authorize(Role::Viewer, Capability::EditPrompt).is_err());
        assert!(authorize(Role::Viewer, Capability::EditContacts).is_err());
    }

    #[test]
    fn roles_parse_case_insensitively_and_serialize_uppercase() {
        assert_eq!("editor".parse::<Role>(), Ok(Role::Editor));
        assert_eq!(" ADMIN ".parse::<Role>(), Ok(Role::Admin));
        assert!("owner".parse::<Role>().is_err());
        assert_eq!(serde_json::to_string(&Role::Viewer).expect("serialize"), "\"VIEWER\"");
    }
}
