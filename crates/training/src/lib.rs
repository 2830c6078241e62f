mod inputs;

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use coco_core::artifacts::write_json;
use coco_core::{normalize_text, ArtifactLayout, IntentLabels, TrainingExample};
use coco_ml::{train_intent_model, FitOptions, SplitStrategy, TrainingOutcome};
use tracing::{info, instrument};

pub use inputs::{load_entity_patterns, load_examples, validate_rules};

#[derive(Debug, Clone)]
pub struct TrainingInputs {
    pub intents_csv: PathBuf,
    pub entities_jsonl: PathBuf,
    pub rules_json: PathBuf,
    pub outdir: PathBuf,
}

#[derive(Debug, Clone)]
pub struct TrainingSummary {
    pub outdir: PathBuf,
    pub labels: Vec<String>,
    pub patterns: usize,
    pub accuracy: Option<f64>,
    pub strategy: SplitStrategy,
    pub converged: bool,
}

pub fn run_training(inputs: &TrainingInputs) -> Result<TrainingSummary> {
    run_training_with(inputs, &FitOptions::default())
}

/// Reads, validates and fits, then writes the model, label list, compiled
/// patterns and `training_report.txt` into `inputs.outdir`.
#[instrument(skip_all, fields(outdir = %inputs.outdir.display()))]
pub fn run_training_with(inputs: &TrainingInputs, options: &FitOptions) -> Result<TrainingSummary> {
    for path in [&inputs.intents_csv, &inputs.entities_jsonl, &inputs.rules_json] {
        inputs::ensure_file(path)?;
    }

    let examples = load_examples(&inputs.intents_csv)?
        .into_iter()
        .map(|example| TrainingExample::new(normalize_text(&example.text), example.label))
        .collect::<Vec<_>>();
    info!(examples = examples.len(), "training examples loaded");

    let patterns = load_entity_patterns(&inputs.entities_jsonl)?;
    let rules = validate_rules(&inputs.rules_json)?;
    info!(
        patterns = patterns.len(),
        rules = rules.rules.len(),
        "entity patterns compiled and rule table validated"
    );

    let outcome = train_intent_model(&examples, options)?;

    let layout = ArtifactLayout::new(&inputs.outdir);
    fs::create_dir_all(layout.root()).with_context(|| {
        format!(
            "failed creating artifacts directory {}",
            layout.root().display()
        )
    })?;

    outcome.model.save(layout.model_path())?;
    let labels = outcome.model.labels().to_vec();
    write_json(
        layout.labels_path(),
        &IntentLabels {
            labels: labels.clone(),
        },
    )?;
    write_json(layout.patterns_path(), &patterns)?;
    fs::write(layout.report_path(), render_report(&outcome))
        .with_context(|| format!("failed writing {}", layout.report_path().display()))?;

    let summary = TrainingSummary {
        outdir: inputs.outdir.clone(),
        labels,
        patterns: patterns.len(),
        accuracy: outcome.validation.as_ref().map(|v| v.accuracy),
        strategy: outcome.strategy,
        converged: outcome.trace.converged,
    };
    info!(
        accuracy = summary.accuracy,
        converged = summary.converged,
        "training artifacts written"
    );

    Ok(summary)
}

pub fn render_report(outcome: &TrainingOutcome) -> String {
    let mut out = match &outcome.validation {
        Some(validation) => format!("Accuracy: {:.3}\n\n{}", validation.accuracy, validation.report),
        None => "Accuracy: n/a (no validation examples)\n".to_string(),
    };

    let meta = outcome.model.metadata();
    out.push_str(&format!(
        "\nSplit: {} (train={}, validation={})\n",
        outcome.strategy, outcome.train_size, outcome.validation_size
    ));
    out.push_str(&format!(
        "Optimizer: {} iterations, {}\n",
        outcome.trace.iterations,
        if outcome.trace.converged {
            "converged"
        } else {
            "NOT converged (iteration cap reached)"
        }
    ));
    out.push_str(&format!(
        "Features: {} char n-grams {:?}\n",
        meta.n_features, meta.ngram_range
    ));
    out.push_str(&format!("Labels: {}\n", outcome.model.labels().join(", ")));
    out.push_str(&format!("Model: {} trained at {}\n", meta.model_id, meta.trained_at.to_rfc3339()));
    out
}
