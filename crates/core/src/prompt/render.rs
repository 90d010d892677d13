use super::merge::derive_tag;
use super::model::{BranchInfo, ExampleItem, PromptData, RuleItem};

const INDENT: &str = "    ";

/// Canonical prompt text for `data`.
///
/// Sections are emitted in a fixed order and omitted when empty after
/// trimming. Blank rules, branches, examples and list entries are dropped.
/// An all-empty record renders to `""`.
pub fn render_prompt(data: &PromptData) -> String {
    let mut out = Writer::default();

    out.inline(1, "role", &data.role);
    out.inline(1, "purpose", &data.purpose);
    out.rules("core_rules", &data.core_rules);
    out.rules("behavior_rules", &data.behavior_rules);
    out.block(1, "negative_prompt", &data.negative_prompt);
    out.block(1, "tools", &data.tools);

    let branches = tagged_branches(&data.branches);
    out.contacts(&branches);
    out.company(data, &branches);
    out.examples(&data.examples);

    if out.lines.is_empty() {
        return String::new();
    }

    let mut text = String::from("<assistant>\n");
    for line in out.lines {
        text.push_str(&line);
        text.push('\n');
    }
    text.push_str("</assistant>");
    text
}

/// Non-blank branches paired with the tag the parser will derive for them.
///
/// The parser creates branches from `<locations>` before `<contacts>`, so
/// `sucursal_N` fallbacks number located branches first and contact-only
/// branches after them.
fn tagged_branches(branches: &[BranchInfo]) -> Vec<(String, &BranchInfo)> {
    let visible: Vec<&BranchInfo> = branches.iter().filter(|branch| !branch.is_blank()).collect();
    let mut next_located = 0;
    let mut next_contact_only = visible.iter().filter(|branch| branch.has_location_fields()).count();

    visible
        .into_iter()
        .map(|branch| {
            let position = if branch.has_location_fields() {
                next_located += 1;
                next_located
            } else {
                next_contact_only += 1;
                next_contact_only
            };
            (derive_tag("", &branch.label, &branch.address, position), branch)
        })
        .collect()
}

#[derive(Default)]
struct Writer {
    lines: Vec<String>,
}

impl Writer {
    fn line(&mut self, depth: usize, content: impl AsRef<str>) {
        self.lines.push(format!("{}{}", INDENT.repeat(depth), content.as_ref()));
    }

    fn open(&mut self, depth: usize, tag: &str) {
        self.line(depth, format!("<{tag}>"));
    }

    fn close(&mut self, depth: usize, tag: &str) {
        self.line(depth, format!("</{tag}>"));
    }

    fn inline(&mut self, depth: usize, tag: &str, value: &str) {
        let value = value.trim();
        if !value.is_empty() {
            self.line(depth, format!("<{tag}>{value}</{tag}>"));
        }
    }

    fn inline_each(&mut self, depth: usize, tag: &str, values: &[String]) {
        for value in values {
            self.inline(depth, tag, value);
        }
    }

    /// Multi-line text re-indented one level under its tag.
    fn block(&mut self, depth: usize, tag: &str, value: &str) {
        let value = value.trim();
        if value.is_empty() {
            return;
        }
        self.open(depth, tag);
        for line in value.lines() {
            if line.trim().is_empty() {
                self.lines.push(String::new());
            } else {
                self.line(depth + 1, line.trim_end());
            }
        }
        self.close(depth, tag);
    }

    fn rules(&mut self, tag: &str, rules: &[RuleItem]) {
        if rules.iter().all(RuleItem::is_blank) {
            return;
        }
        self.open(1, tag);
        for rule in rules {
            self.inline(2, "rule", &rule.text);
        }
        self.close(1, tag);
    }

    fn contacts(&mut self, branches: &[(String, &BranchInfo)]) {
        let with_contact: Vec<_> =
            branches.iter().filter(|(_, branch)| branch.has_contact_fields()).collect();
        if with_contact.is_empty() {
            return;
        }
        self.open(1, "contacts");
        for (tag, branch) in with_contact {
            self.open(2, tag);
            self.inline(3, "name", &branch.manager);
            self.inline_each(3, "phone", &branch.phones);
            self.inline_each(3, "email", &branch.emails);
            self.inline(3, "website", &branch.website);
            self.close(2, tag);
        }
        self.close(1, "contacts");
    }

    fn company(&mut self, data: &PromptData, branches: &[(String, &BranchInfo)]) {
        let located: Vec<&BranchInfo> = branches
            .iter()
            .map(|(_, branch)| *branch)
            .filter(|branch| branch.has_location_fields())
            .collect();
        if data.company.is_blank() && located.is_empty() {
            return;
        }

        self.open(1, "company");
        self.inline(2, "about", &data.company.about);
        if data.company.services.iter().any(|service| !service.trim().is_empty()) {
            self.open(2, "services");
            self.inline_each(3, "service", &data.company.services);
            self.close(2, "services");
        }
        if !located.is_empty() {
            self.open(2, "locations");
            for branch in located {
                self.open(3, "location");
                self.inline(4, "location_name", &branch.label);
                self.inline(4, "location_address", &branch.address);
                self.inline_each(4, "location_phone", &branch.phones);
                self.inline_each(4, "location_mail", &branch.emails);
                self.inline(4, "location_link", &branch.map_link);
                self.inline(4, "location_hours", &branch.hours);
                self.close(3, "location");
            }
            self.close(2, "locations");
        }
        self.close(1, "company");
    }

    fn examples(&mut self, examples: &[ExampleItem]) {
        if examples.iter().all(ExampleItem::is_blank) {
            return;
        }
        self.open(1, "examples");
        for example in examples.iter().filter(|example| !example.is_blank()) {
            self.open(2, "example");
            self.inline(3, "question", &example.question);
            self.inline(3, "answer", &example.answer);
            self.close(2, "example");
        }
        self.close(1, "examples");
    }
}

#[cfg(test)]
mod tests {
    use super::render_prompt;
    use crate::prompt::model::{
        BranchInfo, CompanyInfo, ExampleItem, PromptData, RuleItem,
    };
    use crate::prompt::parse::parse_prompt;

    fn strip_ids(mut data: PromptData) -> PromptData {
        for rule in data.core_rules.iter_mut().chain(data.behavior_rules.iter_mut()) {
            rule.id.clear();
        }
        for branch in &mut data.branches {
            branch.id.clear();
        }
        for example in &mut data.examples {
            example.id.clear();
        }
        data
    }

    fn rule(text: &str) -> RuleItem {
        RuleItem { id: String::new(), text: text.to_string() }
    }

    fn canonical_fixture() -> PromptData {
        PromptData {
            role: "Asistente de ventas".to_string(),
            purpose: "Agendar visitas".to_string(),
            core_rules: vec![rule("Responde en español"), rule("No inventes precios")],
            behavior_rules: vec![rule("Sé breve")],
            negative_prompt: "Evita:\n  - política\n  - religión".to_string(),
            tools: "calendar_lookup".to_string(),
            company: CompanyInfo {
                about: "Panadería familiar".to_string(),
                services: vec!["Pasteles".to_string(), "Café".to_string()],
            },
            branches: vec![
                BranchInfo {
                    id: String::new(),
                    tag: "centro".to_string(),
                    label: "Centro".to_string(),
                    manager: "Ana".to_string(),
                    phones: vec!["111".to_string(), "222".to_string()],
                    emails: vec!["centro@example.com".to_string()],
                    website: "https://centro.example.com".to_string(),
                    address: "Calle 1".to_string(),
                    hours: "8-20".to_string(),
                    map_link: "https://maps.example.com/c".to_string(),
                },
                BranchInfo {
                    id: String::new(),
                    tag: "plaza_norte".to_string(),
                    label: "Plaza Norte".to_string(),
                    address: "Local 14".to_string(),
                    ..BranchInfo::default()
                },
            ],
            examples: vec![ExampleItem {
                id: String::new(),
                question: "¿Abren domingo?".to_string(),
                answer: "Sí, de 9 a 14".to_string(),
            }],
        }
    }

    #[test]
    fn renders_sections_in_fixed_order() {
        let text = render_prompt(&canonical_fixture());
        let order = [
            "<role>",
            "<purpose>",
            "<core_rules>",
            "<behavior_rules>",
            "<negative_prompt>",
            "<tools>",
            "<contacts>",
            "<company>",
            "<about>",
            "<services>",
            "<locations>",
            "<examples>",
        ];
        let positions: Vec<usize> =
            order.iter().map(|tag| text.find(tag).expect("section present")).collect();
        assert!(positions.windows(2).all(|pair| pair[0] < pair[1]), "unexpected order:\n{text}");
        assert!(text.starts_with("<assistant>\n"));
        assert!(text.ends_with("</assistant>"));
    }

    #[test]
    fn round_trip_reproduces_canonical_records() {
        let original = canonical_fixture();
        let reparsed = parse_prompt(&render_prompt(&original));
        assert_eq!(strip_ids(reparsed), original);
    }

    #[test]
    fn rendering_is_stable_across_round_trips() {
        let first = render_prompt(&canonical_fixture());
        let second = render_prompt(&parse_prompt(&first));
        assert_eq!(first, second);
    }

    #[test]
    fn rule_fixture_renders_one_line_per_rule() {
        let data = parse_prompt(
            "<assistant><role>X</role><core_rules><rule>A</rule><rule>B</rule></core_rules></assistant>",
        );
        let text = render_prompt(&data);
        let rule_lines: Vec<&str> =
            text.lines().map(str::trim).filter(|line| line.starts_with("<rule>")).collect();
        assert_eq!(rule_lines, vec!["<rule>A</rule>", "<rule>B</rule>"]);
        assert!(text.contains("<role>X</role>"));
    }

    #[test]
    fn blank_entities_are_omitted() {
        let data = PromptData {
            core_rules: vec![rule(""), rule("  ")],
            behavior_rules: vec![rule("keep"), rule(" ")],
            branches: vec![BranchInfo {
                tag: "sucursal_1".to_string(),
                phones: vec![String::new()],
                ..BranchInfo::default()
            }],
            examples: vec![ExampleItem::new(" ", "")],
            company: CompanyInfo { about: String::new(), services: vec![" ".to_string()] },
            ..PromptData::default()
        };

        let text = render_prompt(&data);
        assert!(!text.contains("<core_rules>"));
        assert_eq!(text.matches("<rule>").count(), 1);
        assert!(!text.contains("<contacts>"));
        assert!(!text.contains("<company>"));
        assert!(!text.contains("<examples>"));
        assert!(!text.contains("<service>"));
    }

    #[test]
    fn empty_record_renders_nothing() {
        assert_eq!(render_prompt(&PromptData::default()), "");
    }

    #[test]
    fn free_text_blocks_are_indented_under_their_tag() {
        let data = PromptData {
            negative_prompt: "line one\n  nested".to_string(),
            ..PromptData::default()
        };
        let text = render_prompt(&data);
        assert!(text.contains("    <negative_prompt>\n        line one\n          nested\n    </negative_prompt>"));
    }

    #[test]
    fn contacts_use_tags_derived_from_labels() {
        let data = PromptData {
            branches: vec![
                BranchInfo {
                    tag: "stale_tag".to_string(),
                    label: "Sede Sur".to_string(),
                    manager: "Iván".to_string(),
                    ..BranchInfo::default()
                },
                BranchInfo { phones: vec!["777".to_string()], ..BranchInfo::default() },
            ],
            ..PromptData::default()
        };

        let text = render_prompt(&data);
        assert!(text.contains("<sede_sur>"));
        assert!(text.contains("<sucursal_2>"));

        let reparsed = parse_prompt(&text);
        assert_eq!(reparsed.branches.len(), 2);
        assert_eq!(reparsed.branches[0].manager, "Iván");
        assert_eq!(reparsed.branches[1].tag, "sucursal_2");
        assert_eq!(reparsed.branches[1].phones, vec!["777".to_string()]);
    }

    #[test]
    fn contact_only_branch_before_located_branch_survives_round_trip() {
        let data = PromptData {
            branches: vec![
                BranchInfo { manager: "Ana".to_string(), ..BranchInfo::default() },
                BranchInfo { hours: "9-18".to_string(), ..BranchInfo::default() },
            ],
            ..PromptData::default()
        };

        let text = render_prompt(&data);
        assert!(text.contains("<sucursal_2>"), "contact-only branch numbered after located ones:\n{text}");

        let reparsed = parse_prompt(&text);
        assert_eq!(reparsed.branches.len(), 2);

        let located = &reparsed.branches[0];
        assert_eq!(located.tag, "sucursal_1");
        assert_eq!(located.hours, "9-18");
        assert!(located.manager.is_empty());

        let contact = &reparsed.branches[1];
        assert_eq!(contact.tag, "sucursal_2");
        assert_eq!(contact.manager, "Ana");
        assert!(contact.hours.is_empty());
    }

    #[test]
    fn unnamed_contact_branch_takes_its_tag_label_and_then_stays_stable() {
        let data = PromptData {
            branches: vec![BranchInfo { manager: "Ana".to_string(), ..BranchInfo::default() }],
            ..PromptData::default()
        };

        let first = parse_prompt(&render_prompt(&data));
        assert_eq!(first.branches.len(), 1);
        assert_eq!(first.branches[0].label, "Sucursal 1");
        assert_eq!(first.branches[0].manager, "Ana");

        // With a label the branch is now also emitted under <locations>.
        let settled = render_prompt(&first);
        assert!(settled.contains("<location_name>Sucursal 1</location_name>"));
        assert_eq!(render_prompt(&parse_prompt(&settled)), settled);
    }
}
