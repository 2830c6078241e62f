use anyhow::{Context, Result};
use coco_core::TrainingExample;
use tracing::{info, warn};

use crate::model::IntentModel;
use crate::report::ClassificationReport;
use crate::softmax::{SolverParams, SolverTrace};
use crate::split::{train_validation_split, Split, SplitStrategy};

#[derive(Debug, Clone, Copy)]
pub struct FitOptions {
    pub test_ratio: f64,
    pub seed: u64,
    pub ngram_range: (usize, usize),
    pub solver: SolverParams,
}

impl Default for FitOptions {
    fn default() -> Self {
        Self {
            test_ratio: 0.2,
            seed: 42,
            ngram_range: (3, 5),
            solver: SolverParams::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Validation {
    pub accuracy: f64,
    pub report: ClassificationReport,
}

#[derive(Debug, Clone)]
pub struct TrainingOutcome {
    /// Refit on every example so each training-time label stays predictable.
    pub model: IntentModel,
    pub trace: SolverTrace,
    pub strategy: SplitStrategy,
    pub train_size: usize,
    pub validation_size: usize,
    /// Scores of a model fit on the training portion only.
    pub validation: Option<Validation>,
}

/// Held-out evaluation followed by a full refit. Example texts must
/// already be normalised.
pub fn train_intent_model(
    examples: &[TrainingExample],
    options: &FitOptions,
) -> Result<TrainingOutcome> {
    let texts = examples.iter().map(|e| e.text.as_str()).collect::<Vec<_>>();
    let labels = examples.iter().map(|e| e.label.as_str()).collect::<Vec<_>>();

    let Split {
        train,
        validation,
        strategy,
    } = train_validation_split(&labels, options.test_ratio, options.seed);
    if strategy == SplitStrategy::Shuffled {
        warn!("some label has fewer than two examples, using a non-stratified split");
    }

    let validation_scores = if validation.is_empty() {
        None
    } else {
        let train_texts = train.iter().map(|idx| texts[*idx]).collect::<Vec<_>>();
        let train_labels = train.iter().map(|idx| labels[*idx]).collect::<Vec<_>>();
        let (held_out_model, _) = IntentModel::fit(
            &train_texts,
            &train_labels,
            options.ngram_range,
            &options.solver,
        )
        .context("failed fitting the validation model")?;

        let truth = validation.iter().map(|idx| labels[*idx]).collect::<Vec<_>>();
        let predicted = validation
            .iter()
            .map(|idx| held_out_model.predict_label(texts[*idx]))
            .collect::<Vec<_>>();
        let report = ClassificationReport::compute(&truth, &predicted);

        Some(Validation {
            accuracy: report.accuracy,
            report,
        })
    };

    let (model, trace) = IntentModel::fit(&texts, &labels, options.ngram_range, &options.solver)
        .context("failed fitting the intent model")?;

    info!(
        examples = examples.len(),
        labels = model.labels().len(),
        features = model.metadata().n_features,
        iterations = trace.iterations,
        converged = trace.converged,
        split = %strategy,
        accuracy = validation_scores.as_ref().map(|v| v.accuracy),
        "intent model trained"
    );

    Ok(TrainingOutcome {
        model,
        trace,
        strategy,
        train_size: train.len(),
        validation_size: validation.len(),
        validation: validation_scores,
    })
}
