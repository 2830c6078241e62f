mod model;
mod report;
mod softmax;
mod split;
mod train;
mod vectorizer;

pub use model::{IntentModel, ModelMetadata, MODEL_NAME};
pub use report::{AverageMetrics, ClassificationReport, LabelMetrics};
pub use softmax::{SoftmaxRegression, SolverParams, SolverTrace};
pub use split::{train_validation_split, Split, SplitStrategy};
pub use train::{train_intent_model, FitOptions, TrainingOutcome, Validation};
pub use vectorizer::{char_wb_ngrams, CharNgramVectorizer, SparseVector};

#[derive(Debug, Clone, PartialEq)]
pub struct IntentPrediction {
    pub intent: String,
    pub confidence: f32,
    pub model: &'static str,
}

/// Maps normalised text to exactly one label of a fixed label set.
pub trait IntentClassifier: Send + Sync {
    fn predict(&self, text: &str) -> IntentPrediction;

    fn labels(&self) -> &[String];
}
