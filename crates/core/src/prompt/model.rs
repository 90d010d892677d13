use rand::Rng;
use serde::{Deserialize, Serialize};

const ITEM_ID_LEN: usize = 9;
const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Short random base-36 identifier for list items.
///
/// Identifiers only give editing views a stable key for each row. They are
/// never written into the prompt text and are regenerated on every parse.
pub fn new_item_id() -> String {
    let mut rng = rand::thread_rng();
    (0..ITEM_ID_LEN).map(|_| BASE36[rng.gen_range(0..BASE36.len())] as char).collect()
}

/// Structured form of the bot system prompt.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PromptData {
    pub role: String,
    pub purpose: String,
    pub core_rules: Vec<RuleItem>,
    pub behavior_rules: Vec<RuleItem>,
    pub negative_prompt: String,
    pub tools: String,
    pub company: CompanyInfo,
    pub branches: Vec<BranchInfo>,
    pub examples: Vec<ExampleItem>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleItem {
    pub id: String,
    #[serde(rename = "texto")]
    pub text: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompanyInfo {
    #[serde(rename = "acerca")]
    pub about: String,
    #[serde(rename = "servicios")]
    pub services: Vec<String>,
}

/// Contact and location record for one branch of the business.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BranchInfo {
    pub id: String,
    pub tag: String,
    #[serde(rename = "etiqueta")]
    pub label: String,
    #[serde(rename = "responsable")]
    pub manager: String,
    #[serde(rename = "telefonos")]
    pub phones: Vec<String>,
    pub emails: Vec<String>,
    #[serde(rename = "sitio")]
    pub website: String,
    #[serde(rename = "direccion")]
    pub address: String,
    #[serde(rename = "horario")]
    pub hours: String,
    #[serde(rename = "enlace")]
    pub map_link: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExampleItem {
    pub id: String,
    #[serde(rename = "pregunta")]
    pub question: String,
    #[serde(rename = "respuesta")]
    pub answer: String,
}

impl RuleItem {
    pub fn new(text: impl Into<String>) -> Self {
        Self { id: new_item_id(), text: text.into() }
    }

    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

impl ExampleItem {
    pub fn new(question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self { id: new_item_id(), question: question.into(), answer: answer.into() }
    }

    pub fn is_blank(&self) -> bool {
        self.question.trim().is_empty() && self.answer.trim().is_empty()
    }
}

impl BranchInfo {
    /// True when no user-visible field carries content. `id` and `tag` are
    /// derived values and do not count.
    pub fn is_blank(&self) -> bool {
        [&self.label, &self.manager, &self.website, &self.address, &self.hours, &self.map_link]
            .iter()
            .all(|value| value.trim().is_empty())
            && !has_entries(&self.phones)
            && !has_entries(&self.emails)
    }

    pub fn has_location_fields(&self) -> bool {
        [&self.label, &self.address, &self.hours, &self.map_link]
            .iter()
            .any(|value| !value.trim().is_empty())
            || has_entries(&self.phones)
            || has_entries(&self.emails)
    }

    pub fn has_contact_fields(&self) -> bool {
        !self.manager.trim().is_empty()
            || !self.website.trim().is_empty()
            || has_entries(&self.phones)
            || has_entries(&self.emails)
    }
}

impl CompanyInfo {
    pub fn is_blank(&self) -> bool {
        self.about.trim().is_empty() && !has_entries(&self.services)
    }
}

impl PromptData {
    pub fn is_empty(&self) -> bool {
        self.role.trim().is_empty()
            && self.purpose.trim().is_empty()
            && self.core_rules.iter().all(RuleItem::is_blank)
            && self.behavior_rules.iter().all(RuleItem::is_blank)
            && self.negative_prompt.trim().is_empty()
            && self.tools.trim().is_empty()
            && self.company.is_blank()
            && self.branches.iter().all(BranchInfo::is_blank)
            && self.examples.iter().all(ExampleItem::is_blank)
    }
}

pub(crate) fn has_entries(values: &[String]) -> bool {
    values.iter().any(|value| !value.trim().is_empty())
}
