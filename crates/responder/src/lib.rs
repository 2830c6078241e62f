use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use coco_core::artifacts::read_json;
use coco_core::{
    normalize_text, ArtifactLayout, ChatReply, CocoError, CocoResult, EntityExtractor,
    EntityPattern, ReplySource, RuleEngine, RuleTable,
};
use coco_ml::{IntentClassifier, IntentModel};
use coco_observability::AppMetrics;
use tracing::{info, instrument, warn};

/// Immutable inference context: classifier, compiled patterns and rule table.
///
/// Built once and shared; `respond` takes `&self` only.
#[derive(Clone)]
pub struct Responder {
    classifier: Arc<dyn IntentClassifier>,
    extractor: EntityExtractor,
    engine: RuleEngine,
    metrics: Arc<AppMetrics>,
}

impl Responder {
    pub fn new(
        classifier: Arc<dyn IntentClassifier>,
        patterns: &[EntityPattern],
        rules: RuleTable,
        metrics: Arc<AppMetrics>,
    ) -> CocoResult<Self> {
        Ok(Self {
            classifier,
            extractor: EntityExtractor::new(patterns)?,
            engine: RuleEngine::new(rules),
            metrics,
        })
    }

    pub fn from_artifacts(
        artifacts: impl AsRef<Path>,
        rules: RuleTable,
        metrics: Arc<AppMetrics>,
    ) -> CocoResult<Self> {
        let layout = ArtifactLayout::new(artifacts.as_ref());
        layout.ensure_exists()?;

        let model = IntentModel::load(layout.model_path())?;
        let recorded = layout.load_labels()?;
        if recorded.labels != model.labels() {
            warn!(
                recorded = ?recorded.labels,
                model = ?model.labels(),
                "intent_labels.json disagrees with the model label set"
            );
        }
        let patterns = layout.load_patterns()?;

        info!(
            artifacts = %layout.root().display(),
            model_id = %model.metadata().model_id,
            labels = model.labels().len(),
            patterns = patterns.len(),
            "inference artifacts loaded"
        );

        Self::new(Arc::new(model), &patterns, rules, metrics)
    }

    pub fn labels(&self) -> &[String] {
        self.classifier.labels()
    }

    pub fn rules(&self) -> &RuleTable {
        self.engine.table()
    }

    #[instrument(skip(self, query))]
    pub fn respond(&self, query: &str) -> ChatReply {
        let started = Instant::now();
        self.metrics.inc_request();

        let normalized = normalize_text(query);
        let prediction = self.classifier.predict(&normalized);
        let entities = self.extractor.extract(query);
        let resolution = self.engine.resolve(&prediction.intent, &entities);

        self.metrics.add_entities_found(entities.len());
        match resolution.source {
            ReplySource::Rule(_) => self.metrics.inc_rule_reply(),
            ReplySource::IntentDefault => self.metrics.inc_default_reply(),
            ReplySource::Fallback | ReplySource::Unresolved => self.metrics.inc_fallback(),
        }
        self.metrics.observe_latency(started.elapsed());

        info!(
            intent = %prediction.intent,
            confidence = prediction.confidence,
            model = prediction.model,
            entities = entities.len(),
            reply_source = resolution.source.as_str(),
            rule_index = match resolution.source {
                ReplySource::Rule(idx) => Some(idx),
                _ => None,
            },
            "query handled"
        );

        ChatReply {
            intent: prediction.intent,
            entities,
            reply: resolution.reply,
        }
    }
}

/// Explicit path (must exist), then `<artifacts>/rules.json`, then
/// `rules.json` next to the artifacts directory.
pub fn resolve_rules_path(artifacts: &Path, explicit: Option<&Path>) -> CocoResult<PathBuf> {
    if let Some(path) = explicit {
        return if path.is_file() {
            Ok(path.to_path_buf())
        } else {
            Err(CocoError::MissingResource {
                path: path.to_path_buf(),
            })
        };
    }

    let layout = ArtifactLayout::new(artifacts);
    let in_artifacts = layout.rules_candidate();
    if in_artifacts.is_file() {
        return Ok(in_artifacts);
    }

    let beside = artifacts
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .join(coco_core::artifacts::RULES_FILE);
    if beside.is_file() {
        return Ok(beside);
    }

    Err(CocoError::MissingResource { path: in_artifacts })
}

pub fn load_rules(artifacts: &Path, explicit: Option<&Path>) -> CocoResult<RuleTable> {
    read_json(resolve_rules_path(artifacts, explicit)?)
}

/// Loads every artifact, answers one query and drops the context.
pub fn respond_from_dir(
    query: &str,
    artifacts: impl AsRef<Path>,
    rules: &RuleTable,
) -> CocoResult<ChatReply> {
    let responder = Responder::from_artifacts(artifacts, rules.clone(), AppMetrics::shared())?;
    Ok(responder.respond(query))
}
