use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::DomainError;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContactId(pub String);

/// WhatsApp contact known to the bot.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    pub id: ContactId,
    pub phone: String,
    pub name: String,
    pub email: Option<String>,
    pub notes: String,
    pub tags: Vec<String>,
    pub bot_enabled: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Partial update; `None` leaves a field untouched.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ContactPatch {
    pub name: Option<String>,
    pub email: Option<String>,
    pub notes: Option<String>,
    pub tags: Option<Vec<String>>,
    pub bot_enabled: Option<bool>,
}

impl Contact {
    pub fn new(id: impl Into<String>, phone: impl Into<String>, name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: ContactId(id.into()),
            phone: phone.into(),
            name: name.into(),
            email: None,
            notes: String::new(),
            tags: Vec::new(),
            bot_enabled: true,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn apply(&mut self, patch: ContactPatch) -> Result<(), DomainError> {
        if let Some(name) = patch.name {
            let name = name.trim();
            if name.is_empty() {
                return Err(DomainError::Validation("contact name cannot be empty".to_string()));
            }
            self.name = name.to_string();
        }
        if let Some(email) = patch.email {
            let email = email.trim();
            if !email.is_empty() && !email.contains('@') {
                return Err(DomainError::Validation(format!("`{email}` is not an email address")));
            }
            self.email = (!email.is_empty()).then(|| email.to_string());
        }
        if let Some(notes) = patch.notes {
            self.notes = notes;
        }
        if let Some(tags) = patch.tags {
            self.tags = tags
                .into_iter()
                .map(|tag| tag.trim().to_string())
                .filter(|tag| !tag.is_empty())
                .collect();
        }
        if let Some(bot_enabled) = patch.bot_enabled {
            self.bot_enabled = bot_enabled;
        }
        self.updated_at = Utc::now();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{Contact, ContactPatch};
    use crate::errors::DomainError;

    #[test]
    fn patch_updates_only_provided_fields() {
        let mut contact = Contact::new("c-1", "+5491100000000", "Marta");
        contact
            .apply(ContactPatch {
                email: Some(" marta@example.com ".to_string()),
                tags: Some(vec!["vip".to_string(), " ".to_string()]),
                bot_enabled: Some(false),
                ..ContactPatch::default()
            })
            .expect("valid patch");

        assert_eq!(contact.name, "Marta");
        assert_eq!(contact.email.as_deref(), Some("marta@example.com"));
        assert_eq!(contact.tags, vec!["vip".to_string()]);
        assert!(!contact.bot_enabled);
    }

    #[test]
    fn patch_rejects_blank_names_and_bad_emails() {
        let mut contact = Contact::new("c-1", "+5491100000000", "Marta");

        let blank = contact.apply(ContactPatch { name: Some("  ".to_string()), ..Default::default() });
        assert!(matches!(blank, Err(DomainError::Validation(_))));

        let email = contact.apply(ContactPatch { email: Some("nope".to_string()), ..Default::default() });
        assert!(matches!(email, Err(DomainError::Validation(_))));

        contact
            .apply(ContactPatch { email: Some(String::new()), ..Default::default() })
            .expect("clearing email is allowed");
        assert_eq!(contact.email, None);
    }
}
