use std::panic::{self, AssertUnwindSafe};
use std::sync::OnceLock;

use regex::Regex;
use tracing::{debug, warn};

use super::merge::{merge_branch, BranchDraft};
use super::model::{CompanyInfo, ExampleItem, PromptData, RuleItem};
use super::slug::format_label;
use super::tags::{
    child_elements, clean_text, contains_tag, section, sections, text_of, texts_of,
    without_section,
};

const STRUCTURED_LOCATION_TAGS: [&str; 6] = [
    "location_name",
    "location_address",
    "location_phone",
    "location_mail",
    "location_link",
    "location_hours",
];

static LINE_BREAKS: OnceLock<Option<Regex>> = OnceLock::new();

/// Builds a [`PromptData`] from stored prompt text.
///
/// Never fails: missing or malformed sections leave their fields empty, and
/// a panic while extracting is logged and answered with whatever had been
/// filled in up to that point.
pub fn parse_prompt(text: &str) -> PromptData {
    let mut data = PromptData::default();

    let outcome = panic::catch_unwind(AssertUnwindSafe(|| fill_prompt(&mut data, text)));
    if outcome.is_err() {
        warn!(
            event_name = "prompt.parse.failed",
            input_len = text.len(),
            "prompt parsing aborted, returning partial result"
        );
    } else {
        debug!(
            event_name = "prompt.parse.completed",
            core_rules = data.core_rules.len(),
            behavior_rules = data.behavior_rules.len(),
            branches = data.branches.len(),
            examples = data.examples.len(),
            "prompt parsed"
        );
    }

    data
}

fn fill_prompt(data: &mut PromptData, text: &str) {
    data.role = text_of(text, "role");
    data.purpose = text_of(text, "purpose");

    let core_section = section(text, "core_rules").or_else(|| section(text, "rules"));
    data.core_rules = core_section.map(parse_rules).unwrap_or_default();
    data.behavior_rules = section(text, "behavior_rules").map(parse_rules).unwrap_or_default();

    data.negative_prompt = text_of(text, "negative_prompt");
    data.tools = text_of(text, "tools");

    if let Some(company) = section(text, "company") {
        data.company = CompanyInfo {
            about: text_of(company, "about"),
            services: section(company, "services")
                .map(|services| texts_of(services, "service"))
                .unwrap_or_default(),
        };
        if let Some(locations) = section(company, "locations") {
            for draft in parse_locations(locations) {
                merge_branch(&mut data.branches, draft);
            }
        }
    }

    if let Some(contacts) = section(text, "contacts") {
        for draft in parse_contacts(contacts) {
            merge_branch(&mut data.branches, draft);
        }
    }

    let outside_company = without_section(text, "company");
    if let Some(locations) = section(&outside_company, "locations") {
        for draft in parse_locations(locations) {
            merge_branch(&mut data.branches, draft);
        }
    }

    data.examples = section(text, "examples").map(parse_examples).unwrap_or_default();
}

fn parse_rules(block: &str) -> Vec<RuleItem> {
    let tagged = sections(block, "rule");
    if !tagged.is_empty() {
        return tagged
            .into_iter()
            .map(clean_text)
            .filter(|rule| !rule.is_empty())
            .map(RuleItem::new)
            .collect();
    }

    let body = clean_text(block);
    if body.is_empty() {
        return Vec::new();
    }
    split_lines(&body).into_iter().map(RuleItem::new).collect()
}

fn split_lines(body: &str) -> Vec<String> {
    let pieces: Vec<&str> = match LINE_BREAKS.get_or_init(|| Regex::new(r"\s*\n\s*").ok()) {
        Some(pattern) => pattern.split(body).collect(),
        None => body.lines().collect(),
    };
    pieces
        .into_iter()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(ToString::to_string)
        .collect()
}

fn parse_locations(block: &str) -> Vec<BranchDraft> {
    sections(block, "location").into_iter().filter_map(parse_location).collect()
}

fn parse_location(inner: &str) -> Option<BranchDraft> {
    let structured = STRUCTURED_LOCATION_TAGS.iter().any(|tag| contains_tag(inner, tag));
    if structured {
        return Some(BranchDraft {
            label: text_of(inner, "location_name"),
            address: text_of(inner, "location_address"),
            phones: texts_of(inner, "location_phone"),
            emails: texts_of(inner, "location_mail"),
            map_link: text_of(inner, "location_link"),
            hours: text_of(inner, "location_hours"),
            ..BranchDraft::default()
        });
    }

    let free_text = clean_text(inner);
    let label = free_text.lines().map(str::trim).find(|line| !line.is_empty())?.to_string();
    Some(BranchDraft { label, address: free_text, ..BranchDraft::default() })
}

fn parse_contacts(block: &str) -> Vec<BranchDraft> {
    child_elements(block)
        .into_iter()
        .map(|(tag, inner)| BranchDraft {
            tag_hint: tag.to_string(),
            label: format_label(tag),
            manager: text_of(inner, "name"),
            phones: texts_of(inner, "phone"),
            emails: texts_of(inner, "email"),
            website: text_of(inner, "website"),
            ..BranchDraft::default()
        })
        .collect()
}

fn parse_examples(block: &str) -> Vec<ExampleItem> {
    sections(block, "example")
        .into_iter()
        .map(|inner| ExampleItem::new(text_of(inner, "question"), text_of(inner, "answer")))
        .filter(|example| !example.is_blank())
        .collect()
}
