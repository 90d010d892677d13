use std::collections::BTreeSet;

use super::model::{has_entries, new_item_id, BranchInfo};
use super::slug::slugify;

/// Partial branch record extracted from one prompt section.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BranchDraft {
    /// Element name the record was found under, when the section provides one.
    pub tag_hint: String,
    pub label: String,
    pub manager: String,
    pub phones: Vec<String>,
    pub emails: Vec<String>,
    pub website: String,
    pub address: String,
    pub hours: String,
    pub map_link: String,
}

impl BranchDraft {
    fn is_blank(&self) -> bool {
        [
            &self.tag_hint,
            &self.label,
            &self.manager,
            &self.website,
            &self.address,
            &self.hours,
            &self.map_link,
        ]
        .iter()
        .all(|value| value.trim().is_empty())
            && !has_entries(&self.phones)
            && !has_entries(&self.emails)
    }

    fn candidate_keys(&self) -> BTreeSet<String> {
        key_set([self.tag_hint.as_str(), self.label.as_str(), self.address.as_str()])
    }
}

pub(crate) fn branch_keys(branch: &BranchInfo) -> BTreeSet<String> {
    key_set([branch.tag.as_str(), branch.label.as_str(), branch.address.as_str()])
}

fn key_set<'a>(values: impl IntoIterator<Item = &'a str>) -> BTreeSet<String> {
    values.into_iter().map(|value| slugify(value, "")).filter(|key| !key.is_empty()).collect()
}

/// Tag a branch would get at 1-based `position`: slug of the hint, label or
/// address (first non-empty), else `sucursal_<position>`.
pub fn derive_tag(hint: &str, label: &str, address: &str, position: usize) -> String {
    let source = [hint, label, address].into_iter().find(|value| !value.trim().is_empty());
    slugify(source.unwrap_or(""), &format!("sucursal_{position}"))
}

/// Folds `draft` into `branches`.
///
/// The draft joins the first branch sharing any candidate key (slugs of
/// tag, label and address). Scalars keep the first non-empty value; lists
/// are replaced only by a non-empty list. Unmatched drafts are appended.
pub fn merge_branch(branches: &mut Vec<BranchInfo>, draft: BranchDraft) {
    if draft.is_blank() {
        return;
    }

    let keys = draft.candidate_keys();
    let existing = if keys.is_empty() {
        None
    } else {
        branches.iter_mut().find(|branch| !branch_keys(branch).is_disjoint(&keys))
    };

    match existing {
        Some(branch) => enrich(branch, draft),
        None => {
            let tag = derive_tag(&draft.tag_hint, &draft.label, &draft.address, branches.len() + 1);
            let mut branch = BranchInfo { id: new_item_id(), tag, ..BranchInfo::default() };
            enrich(&mut branch, draft);
            branches.push(branch);
        }
    }
}

fn enrich(branch: &mut BranchInfo, draft: BranchDraft) {
    fill(&mut branch.label, draft.label);
    fill(&mut branch.manager, draft.manager);
    fill(&mut branch.website, draft.website);
    fill(&mut branch.address, draft.address);
    fill(&mut branch.hours, draft.hours);
    fill(&mut branch.map_link, draft.map_link);
    replace_if_present(&mut branch.phones, draft.phones);
    replace_if_present(&mut branch.emails, draft.emails);
}

fn fill(slot: &mut String, value: String) {
    if slot.trim().is_empty() && !value.trim().is_empty() {
        *slot = value;
    }
}

fn replace_if_present(slot: &mut Vec<String>, values: Vec<String>) {
    let values: Vec<String> = values.into_iter().filter(|value| !value.trim().is_empty()).collect();
    if !values.is_empty() {
        *slot = values;
    }
}

#[cfg(test)]
mod tests {
    use super::{derive_tag, merge_branch, BranchDraft};

    fn draft(label: &str) -> BranchDraft {
        BranchDraft { label: label.to_string(), ..BranchDraft::default() }
    }

    #[test]
    fn new_drafts_get_derived_tags() {
        let mut branches = Vec::new();
        merge_branch(&mut branches, draft("Centro Histórico"));
        merge_branch(
            &mut branches,
            BranchDraft { phones: vec!["555".to_string()], ..BranchDraft::default() },
        );

        assert_eq!(branches.len(), 2);
        assert_eq!(branches[0].tag, "centro_historico");
        assert_eq!(branches[1].tag, "sucursal_2");
        assert_eq!(branches[0].id.len(), 9);
    }

    #[test]
    fn drafts_match_on_any_slugged_key() {
        let mut branches = Vec::new();
        merge_branch(
            &mut branches,
            BranchDraft {
                label: "Centro".to_string(),
                address: "Av. Juárez 10".to_string(),
                ..BranchDraft::default()
            },
        );
        merge_branch(
            &mut branches,
            BranchDraft {
                address: "av juarez 10".to_string(),
                hours: "9-18".to_string(),
                ..BranchDraft::default()
            },
        );
        merge_branch(
            &mut branches,
            BranchDraft {
                tag_hint: "centro".to_string(),
                manager: "Ana".to_string(),
                ..BranchDraft::default()
            },
        );

        assert_eq!(branches.len(), 1);
        assert_eq!(branches[0].hours, "9-18");
        assert_eq!(branches[0].manager, "Ana");
        assert_eq!(branches[0].address, "Av. Juárez 10");
    }

    #[test]
    fn first_non_empty_scalar_wins_and_lists_replace_when_present() {
        let mut branches = Vec::new();
        merge_branch(
            &mut branches,
            BranchDraft {
                label: "Norte".to_string(),
                hours: "9-14".to_string(),
                phones: vec!["1".to_string(), "2".to_string()],
                ..BranchDraft::default()
            },
        );
        merge_branch(
            &mut branches,
            BranchDraft {
                label: "Norte".to_string(),
                hours: "10-20".to_string(),
                phones: vec![" ".to_string()],
                emails: vec!["norte@example.com".to_string()],
                ..BranchDraft::default()
            },
        );

        assert_eq!(branches[0].hours, "9-14");
        assert_eq!(branches[0].phones, vec!["1".to_string(), "2".to_string()]);
        assert_eq!(branches[0].emails, vec!["norte@example.com".to_string()]);

        merge_branch(
            &mut branches,
            BranchDraft {
                label: "Norte".to_string(),
                phones: vec!["3".to_string()],
                ..BranchDraft::default()
            },
        );
        assert_eq!(branches[0].phones, vec!["3".to_string()]);
    }

    #[test]
    fn blank_drafts_are_dropped() {
        let mut branches = Vec::new();
        merge_branch(&mut branches, BranchDraft::default());
        merge_branch(&mut branches, draft("   "));
        assert!(branches.is_empty());
    }

    #[test]
    fn derive_tag_prefers_hint_then_label_then_address() {
        assert_eq!(derive_tag("sede_a", "Main", "Street 1", 4), "sede_a");
        assert_eq!(derive_tag("", "Main Office", "Street 1", 4), "main_office");
        assert_eq!(derive_tag("", " ", "Street 1", 4), "street_1");
        assert_eq!(derive_tag("", "", "", 4), "sucursal_4");
        assert_eq!(derive_tag("", "!!!", "", 2), "sucursal_2");
    }
}
