pub mod artifacts;
pub mod entities;
pub mod error;
pub mod models;
pub mod normalize;
pub mod rules;

pub use artifacts::{ArtifactLayout, IntentLabels};
pub use entities::{extract_entities, EntityExtractor};
pub use error::{CocoError, CocoResult};
pub use models::*;
pub use normalize::normalize_text;
pub use rules::{
    compile_condition, match_rule, Check, ReplySource, Resolution, RuleEngine, UNRESOLVED_REPLY,
};
