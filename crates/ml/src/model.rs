use std::collections::BTreeSet;
use std::path::Path;

use anyhow::{bail, Result};
use chrono::{DateTime, Utc};
use coco_core::artifacts::{read_json, write_json};
use coco_core::{CocoError, CocoResult};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::softmax::{SoftmaxRegression, SolverParams, SolverTrace};
use crate::vectorizer::CharNgramVectorizer;
use crate::{IntentClassifier, IntentPrediction};

pub const MODEL_NAME: &str = "char-ngram-logreg";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelMetadata {
    pub model_id: Uuid,
    pub trained_at: DateTime<Utc>,
    pub n_examples: usize,
    pub n_features: usize,
    pub ngram_range: (usize, usize),
    pub iterations: usize,
    pub converged: bool,
}

/// Trained text → intent mapping, persisted as `intent_model.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntentModel {
    labels: Vec<String>,
    vectorizer: CharNgramVectorizer,
    classifier: SoftmaxRegression,
    metadata: ModelMetadata,
}

impl IntentModel {
    /// Fits on already-normalised texts. Labels are indexed in sorted order.
    pub fn fit<S: AsRef<str>>(
        texts: &[S],
        labels: &[S],
        ngram_range: (usize, usize),
        params: &SolverParams,
    ) -> Result<(Self, SolverTrace)> {
        if texts.is_empty() {
            bail!("cannot fit an intent model on zero examples");
        }
        if texts.len() != labels.len() {
            bail!(
                "text/label length mismatch: {} texts, {} labels",
                texts.len(),
                labels.len()
            );
        }

        let label_set = labels
            .iter()
            .map(|label| label.as_ref().to_string())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect::<Vec<_>>();
        let targets = labels
            .iter()
            .map(|label| {
                label_set
                    .binary_search_by(|known| known.as_str().cmp(label.as_ref()))
                    .unwrap_or_default()
            })
            .collect::<Vec<_>>();

        let vectorizer = CharNgramVectorizer::fit(texts, ngram_range);
        let rows = texts
            .iter()
            .map(|text| vectorizer.transform(text.as_ref()))
            .collect::<Vec<_>>();
        let (classifier, trace) = SoftmaxRegression::fit(
            &rows,
            &targets,
            label_set.len(),
            vectorizer.n_features(),
            params,
        );

        if !trace.converged {
            tracing::warn!(
                iterations = trace.iterations,
                final_loss = trace.final_loss,
                "intent classifier stopped at the iteration cap before converging"
            );
        }

        let metadata = ModelMetadata {
            model_id: Uuid::new_v4(),
            trained_at: Utc::now(),
            n_examples: texts.len(),
            n_features: vectorizer.n_features(),
            ngram_range,
            iterations: trace.iterations,
            converged: trace.converged,
        };

        Ok((
            Self {
                labels: label_set,
                vectorizer,
                classifier,
                metadata,
            },
            trace,
        ))
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn metadata(&self) -> &ModelMetadata {
        &self.metadata
    }

    pub fn vectorizer(&self) -> &CharNgramVectorizer {
        &self.vectorizer
    }

    pub fn predict_label(&self, text: &str) -> &str {
        let (class, _) = self.classifier.predict(&self.vectorizer.transform(text));
        &self.labels[class]
    }

    pub fn save(&self, path: impl AsRef<Path>) -> CocoResult<()> {
        write_json(path, self)
    }

    /// Missing file, bad JSON or inconsistent dimensions are all resource errors.
    pub fn load(path: impl AsRef<Path>) -> CocoResult<Self> {
        let path = path.as_ref();
        let model: Self = read_json(path)?;

        let consistent = model.vectorizer.is_consistent()
            && model.classifier.is_consistent()
            && model.classifier.n_classes() == model.labels.len()
            && model.classifier.n_features() == model.vectorizer.n_features();
        if !consistent {
            return Err(CocoError::CorruptArtifact {
                path: path.to_path_buf(),
                reason: "label, vocabulary and weight dimensions disagree".to_string(),
            });
        }

        Ok(model)
    }
}

impl IntentClassifier for IntentModel {
    fn predict(&self, text: &str) -> IntentPrediction {
        let (class, confidence) = self.classifier.predict(&self.vectorizer.transform(text));
        IntentPrediction {
            intent: self.labels[class].clone(),
            confidence: confidence as f32,
            model: MODEL_NAME,
        }
    }

    fn labels(&self) -> &[String] {
        &self.labels
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fit_small() -> IntentModel {
        let texts = [
            "da dầu mụn nên dùng gì",
            "serum giá bao nhiêu",
            "kem chống nắng giá sao",
            "da khô nên dùng sản phẩm nào",
        ];
        let labels = ["product_advice", "pricing", "pricing", "product_advice"];
        IntentModel::fit(&texts, &labels, (3, 5), &SolverParams::default())
            .unwrap()
            .0
    }

    #[test]
    fn labels_are_sorted_and_unique() {
        let model = fit_small();
        assert_eq!(model.labels(), &["pricing", "product_advice"]);
        assert_eq!(model.metadata().n_examples, 4);
        assert!(model.metadata().converged);
    }

    #[test]
    fn predicts_training_texts() {
        let model = fit_small();
        assert_eq!(model.predict_label("serum giá bao nhiêu"), "pricing");
        assert_eq!(model.predict_label("da dầu mụn nên dùng gì"), "product_advice");
    }

    #[test]
    fn empty_text_still_gets_a_known_label() {
        let model = fit_small();
        let prediction = IntentClassifier::predict(&model, "");
        assert!(model.labels().contains(&prediction.intent));
        assert_eq!(
            IntentClassifier::predict(&model, "").intent,
            prediction.intent
        );
    }

    #[test]
    fn reloaded_model_predicts_identically() {
        let model = fit_small();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("intent_model.json");
        model.save(&path).unwrap();

        let loaded = IntentModel::load(&path).unwrap();
        for text in ["serum này giá sao", "da mụn", "xin chào", ""] {
            assert_eq!(loaded.predict_label(text), model.predict_label(text));
        }
        assert_eq!(loaded.metadata().model_id, model.metadata().model_id);
    }

    #[test]
    fn missing_or_corrupt_model_is_resource_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = IntentModel::load(dir.path().join("nope.json")).unwrap_err();
        assert!(missing.is_resource_error());

        let path = dir.path().join("intent_model.json");
        std::fs::write(&path, "{\"labels\": []}").unwrap();
        assert!(IntentModel::load(&path).unwrap_err().is_resource_error());
    }

    #[test]
    fn rejects_empty_training_set() {
        let empty: [&str; 0] = [];
        assert!(IntentModel::fit(&empty, &empty, (3, 5), &SolverParams::default()).is_err());
    }
}
