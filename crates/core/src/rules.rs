use std::collections::HashSet;

use crate::models::{Condition, RuleTable};

/// Reply used when neither a rule, an intent default nor `_fallback` applies.
pub const UNRESOLVED_REPLY: &str = "Xin lỗi, mình chưa hiểu ý bạn.";

/// One predicate of a rule condition. A rule holds iff every check holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Check {
    Intent(String),
    HasEntity(String),
    HasAll(Vec<String>),
    HasAny(Vec<String>),
}

impl Check {
    pub fn holds(&self, intent: &str, entities: &HashSet<&str>) -> bool {
        match self {
            Self::Intent(expected) => expected == intent,
            Self::HasEntity(tag) => entities.contains(tag.as_str()),
            Self::HasAll(tags) => tags.iter().all(|tag| entities.contains(tag.as_str())),
            Self::HasAny(tags) => tags.iter().any(|tag| entities.contains(tag.as_str())),
        }
    }
}

/// Flattens a condition into checks; the intent check always comes first.
pub fn compile_condition(condition: &Condition) -> Vec<Check> {
    let mut checks = Vec::new();
    if let Some(intent) = &condition.intent {
        checks.push(Check::Intent(intent.clone()));
    }
    if let Some(tag) = &condition.has_entity {
        checks.push(Check::HasEntity(tag.clone()));
    }
    if let Some(tags) = &condition.has_all {
        checks.push(Check::HasAll(tags.clone()));
    }
    if let Some(tags) = &condition.has_any {
        checks.push(Check::HasAny(tags.clone()));
    }
    checks
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplySource {
    /// Index of the winning rule in table order.
    Rule(usize),
    IntentDefault,
    Fallback,
    Unresolved,
}

impl ReplySource {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Rule(_) => "rule",
            Self::IntentDefault => "intent_default",
            Self::Fallback => "fallback",
            Self::Unresolved => "unresolved",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub reply: String,
    pub source: ReplySource,
}

#[derive(Debug, Clone)]
struct CompiledRule {
    checks: Vec<Check>,
    reply: String,
}

/// First-match-wins evaluation over an ordered rule table.
#[derive(Debug, Clone)]
pub struct RuleEngine {
    rules: Vec<CompiledRule>,
    table: RuleTable,
}

impl RuleEngine {
    pub fn new(table: RuleTable) -> Self {
        let rules = table
            .rules
            .iter()
            .map(|rule| CompiledRule {
                checks: compile_condition(&rule.condition),
                reply: rule.reply.clone(),
            })
            .collect();

        Self { rules, table }
    }

    pub fn table(&self) -> &RuleTable {
        &self.table
    }

    pub fn resolve<S: AsRef<str>>(&self, intent: &str, entities: &[S]) -> Resolution {
        let entity_set = entities
            .iter()
            .map(|tag| tag.as_ref())
            .collect::<HashSet<&str>>();

        let winner = self.rules.iter().enumerate().find(|(_, rule)| {
            rule.checks
                .iter()
                .all(|check| check.holds(intent, &entity_set))
        });
        if let Some((idx, rule)) = winner {
            return Resolution {
                reply: rule.reply.clone(),
                source: ReplySource::Rule(idx),
            };
        }

        if let Some(reply) = self.table.intent_default(intent) {
            return Resolution {
                reply: reply.to_string(),
                source: ReplySource::IntentDefault,
            };
        }

        match self.table.fallback() {
            Some(reply) => Resolution {
                reply: reply.to_string(),
                source: ReplySource::Fallback,
            },
            None => Resolution {
                reply: UNRESOLVED_REPLY.to_string(),
                source: ReplySource::Unresolved,
            },
        }
    }
}

/// Convenience wrapper that compiles `table` for a single lookup.
pub fn match_rule<S: AsRef<str>>(intent: &str, entities: &[S], table: &RuleTable) -> String {
    RuleEngine::new(table.clone()).resolve(intent, entities).reply
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Rule;

    fn rule(condition: Condition, reply: &str) -> Rule {
        Rule {
            condition,
            reply: reply.to_string(),
        }
    }

    fn set<'a>(tags: &[&'a str]) -> HashSet<&'a str> {
        tags.iter().copied().collect()
    }

    #[test]
    fn intent_check_in_isolation() {
        let check = Check::Intent("pricing".to_string());
        assert!(check.holds("pricing", &set(&[])));
        assert!(!check.holds("product_advice", &set(&[])));
    }

    #[test]
    fn has_entity_check_in_isolation() {
        let check = Check::HasEntity("SKIN:mụn".to_string());
        assert!(check.holds("any", &set(&["SKIN:mụn", "SKIN:viêm"])));
        assert!(!check.holds("any", &set(&["SKIN:viêm"])));
    }

    #[test]
    fn has_all_check_in_isolation() {
        let check = Check::HasAll(vec!["SKIN:mụn".into(), "SKIN:dầu".into()]);
        assert!(check.holds("any", &set(&["SKIN:dầu", "SKIN:mụn"])));
        assert!(!check.holds("any", &set(&["SKIN:mụn"])));
        assert!(Check::HasAll(Vec::new()).holds("any", &set(&[])));
    }

    #[test]
    fn has_any_check_in_isolation() {
        let check = Check::HasAny(vec!["SKIN:mụn".into(), "SKIN:dầu".into()]);
        assert!(check.holds("any", &set(&["SKIN:dầu"])));
        assert!(!check.holds("any", &set(&["SKIN:khô"])));
        assert!(!Check::HasAny(Vec::new()).holds("any", &set(&["SKIN:mụn"])));
    }

    #[test]
    fn compiled_condition_keeps_every_present_key() {
        let checks = compile_condition(&Condition {
            intent: Some("pricing".into()),
            has_entity: Some("PRODUCT:serum".into()),
            has_all: None,
            has_any: Some(vec!["SIZE:30ml".into()]),
        });
        assert_eq!(checks.len(), 3);
        assert_eq!(checks[0], Check::Intent("pricing".into()));
        assert!(compile_condition(&Condition::default()).is_empty());
    }

    #[test]
    fn earlier_rule_wins_over_unconditional_one() {
        let table = RuleTable {
            rules: vec![
                rule(
                    Condition {
                        intent: Some("product_advice".into()),
                        has_entity: Some("SKIN:mụn".into()),
                        ..Condition::default()
                    },
                    "Dùng gel bí đao.",
                ),
                rule(
                    Condition {
                        intent: Some("product_advice".into()),
                        ..Condition::default()
                    },
                    "Bạn có làn da thế nào?",
                ),
            ],
            defaults: Default::default(),
        };
        let engine = RuleEngine::new(table);

        let resolution = engine.resolve("product_advice", &["SKIN:mụn"]);
        assert_eq!(resolution.reply, "Dùng gel bí đao.");
        assert_eq!(resolution.source, ReplySource::Rule(0));

        let resolution = engine.resolve("product_advice", &["SKIN:khô"]);
        assert_eq!(resolution.source, ReplySource::Rule(1));
    }

    #[test]
    fn all_present_checks_must_hold() {
        let table = RuleTable {
            rules: vec![rule(
                Condition {
                    has_entity: Some("PRODUCT:serum".into()),
                    has_any: Some(vec!["SKIN:mụn".into()]),
                    ..Condition::default()
                },
                "serum trị mụn",
            )],
            defaults: Default::default(),
        };
        let engine = RuleEngine::new(table);

        assert_eq!(
            engine.resolve("x", &["PRODUCT:serum"]).source,
            ReplySource::Unresolved
        );
        assert_eq!(
            engine.resolve("x", &["PRODUCT:serum", "SKIN:mụn"]).reply,
            "serum trị mụn"
        );
    }

    #[test]
    fn empty_condition_matches_any_intent() {
        let table = RuleTable {
            rules: vec![rule(Condition::default(), "always")],
            defaults: Default::default(),
        };
        assert_eq!(match_rule::<&str>("whatever", &[], &table), "always");
    }

    #[test]
    fn fallback_chain() {
        let mut table = RuleTable {
            rules: vec![rule(
                Condition {
                    intent: Some("product_advice".into()),
                    ..Condition::default()
                },
                "advice",
            )],
            defaults: [
                ("greeting".to_string(), "Chào bạn!".to_string()),
                ("_fallback".to_string(), "Xin lỗi, mình chưa hiểu.".to_string()),
            ]
            .into_iter()
            .collect(),
        };

        let engine = RuleEngine::new(table.clone());
        let greeting = engine.resolve::<&str>("greeting", &[]);
        assert_eq!(greeting.reply, "Chào bạn!");
        assert_eq!(greeting.source, ReplySource::IntentDefault);

        let pricing = engine.resolve::<&str>("pricing", &[]);
        assert_eq!(pricing.reply, "Xin lỗi, mình chưa hiểu.");
        assert_eq!(pricing.source, ReplySource::Fallback);

        table.defaults.remove("_fallback");
        let pricing = RuleEngine::new(table).resolve::<&str>("pricing", &[]);
        assert_eq!(pricing.reply, UNRESOLVED_REPLY);
        assert_eq!(pricing.source, ReplySource::Unresolved);
    }

    #[test]
    fn missing_reply_resolves_to_empty_string() {
        let table = RuleTable::from_json_str(r#"{"rules": [{"if": {}}]}"#).unwrap();
        assert_eq!(match_rule::<&str>("x", &[], &table), "");
    }
}
