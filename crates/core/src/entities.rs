use std::collections::HashSet;

use regex::{Regex, RegexBuilder};

use crate::error::{CocoError, CocoResult};
use crate::models::EntityPattern;
use crate::normalize::normalize_text;

#[derive(Debug, Clone)]
struct CompiledPattern {
    tag: String,
    matcher: Regex,
}

/// Literal, whole-word entity matcher over a fixed pattern table.
#[derive(Debug, Clone, Default)]
pub struct EntityExtractor {
    patterns: Vec<CompiledPattern>,
}

impl EntityExtractor {
    pub fn new(patterns: &[EntityPattern]) -> CocoResult<Self> {
        let patterns = patterns
            .iter()
            .map(compile_pattern)
            .collect::<CocoResult<Vec<_>>>()?;

        Ok(Self { patterns })
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Tags ordered by where each distinct tag first occurs in the text.
    /// Patterns starting at the same offset keep declaration order.
    pub fn extract(&self, text: &str) -> Vec<String> {
        let normalized = normalize_text(text);

        let mut hits = self
            .patterns
            .iter()
            .enumerate()
            .filter_map(|(idx, pattern)| {
                pattern
                    .matcher
                    .find(&normalized)
                    .map(|found| (found.start(), idx, pattern.tag.as_str()))
            })
            .collect::<Vec<_>>();
        hits.sort_by_key(|(start, idx, _)| (*start, *idx));

        let mut seen = HashSet::new();
        hits.into_iter()
            .filter(|(_, _, tag)| seen.insert(*tag))
            .map(|(_, _, tag)| tag.to_string())
            .collect()
    }
}

/// One-shot extraction; compiles the table on every call.
pub fn extract_entities(text: &str, patterns: &[EntityPattern]) -> CocoResult<Vec<String>> {
    Ok(EntityExtractor::new(patterns)?.extract(text))
}

fn compile_pattern(pattern: &EntityPattern) -> CocoResult<CompiledPattern> {
    let literal = normalize_text(&pattern.pattern);
    if literal.is_empty() {
        return Err(CocoError::InvalidPattern {
            pattern: pattern.pattern.clone(),
            reason: "pattern is empty".to_string(),
        });
    }

    let matcher = RegexBuilder::new(&format!(r"\b{}\b", regex::escape(&literal)))
        .case_insensitive(true)
        .build()
        .map_err(|err| CocoError::InvalidPattern {
            pattern: pattern.pattern.clone(),
            reason: err.to_string(),
        })?;

    Ok(CompiledPattern {
        tag: pattern.tag(),
        matcher,
    })
}
