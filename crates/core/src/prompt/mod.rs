//! Structured-prompt text codec.
//!
//! The bot's system prompt is stored as a tagged text blob. This module turns
//! that blob into a [`PromptData`] record for editing and renders the record
//! back into canonical text. Both directions are pure functions of their input.

pub mod merge;
pub mod model;
pub mod parse;
pub mod render;
pub mod slug;
pub mod tags;

pub use merge::{derive_tag, merge_branch, BranchDraft};
pub use model::{new_item_id, BranchInfo, CompanyInfo, ExampleItem, PromptData, RuleItem};
pub use parse::parse_prompt;
pub use render::render_prompt;
pub use slug::{format_label, slugify};
