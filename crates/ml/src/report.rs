use std::collections::BTreeSet;
use std::fmt;

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabelMetrics {
    pub label: String,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AverageMetrics {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
}

/// Per-label precision/recall/F1 plus accuracy, macro and weighted averages.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassificationReport {
    pub labels: Vec<LabelMetrics>,
    pub accuracy: f64,
    pub macro_avg: AverageMetrics,
    pub weighted_avg: AverageMetrics,
    pub support: usize,
}

impl ClassificationReport {
    pub fn compute<S: AsRef<str>>(truth: &[S], predicted: &[S]) -> Self {
        let pairs = truth
            .iter()
            .zip(predicted)
            .map(|(t, p)| (t.as_ref(), p.as_ref()))
            .collect::<Vec<_>>();
        let support = pairs.len();

        let label_set = pairs
            .iter()
            .flat_map(|(t, p)| [*t, *p])
            .collect::<BTreeSet<_>>();

        let labels = label_set
            .into_iter()
            .map(|label| {
                let tp = pairs.iter().filter(|(t, p)| *t == label && *p == label).count();
                let predicted_as = pairs.iter().filter(|(_, p)| *p == label).count();
                let actual = pairs.iter().filter(|(t, _)| *t == label).count();

                let precision = ratio(tp, predicted_as);
                let recall = ratio(tp, actual);
                let f1 = if precision + recall > 0.0 {
                    2.0 * precision * recall / (precision + recall)
                } else {
                    0.0
                };

                LabelMetrics {
                    label: label.to_string(),
                    precision,
                    recall,
                    f1,
                    support: actual,
                }
            })
            .collect::<Vec<_>>();

        let correct = pairs.iter().filter(|(t, p)| t == p).count();
        let n_labels = labels.len().max(1) as f64;
        let macro_avg = AverageMetrics {
            precision: labels.iter().map(|m| m.precision).sum::<f64>() / n_labels,
            recall: labels.iter().map(|m| m.recall).sum::<f64>() / n_labels,
            f1: labels.iter().map(|m| m.f1).sum::<f64>() / n_labels,
        };
        let weight = |m: &LabelMetrics| m.support as f64 / support.max(1) as f64;
        let weighted_avg = AverageMetrics {
            precision: labels.iter().map(|m| m.precision * weight(m)).sum(),
            recall: labels.iter().map(|m| m.recall * weight(m)).sum(),
            f1: labels.iter().map(|m| m.f1 * weight(m)).sum(),
        };

        Self {
            labels,
            accuracy: ratio(correct, support),
            macro_avg,
            weighted_avg,
            support,
        }
    }
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

impl fmt::Display for ClassificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self
            .labels
            .iter()
            .map(|m| m.label.chars().count())
            .chain(std::iter::once("weighted avg".len()))
            .max()
            .unwrap_or(0);

        writeln!(
            f,
            "{:>width$}  {:>9} {:>9} {:>9} {:>9}",
            "", "precision", "recall", "f1-score", "support"
        )?;
        writeln!(f)?;
        for m in &self.labels {
            writeln!(
                f,
                "{:>width$}  {:>9.3} {:>9.3} {:>9.3} {:>9}",
                m.label, m.precision, m.recall, m.f1, m.support
            )?;
        }
        writeln!(f)?;
        writeln!(
            f,
            "{:>width$}  {:>9} {:>9} {:>9.3} {:>9}",
            "accuracy", "", "", self.accuracy, self.support
        )?;
        for (name, avg) in [("macro avg", &self.macro_avg), ("weighted avg", &self.weighted_avg)] {
            writeln!(
                f,
                "{:>width$}  {:>9.3} {:>9.3} {:>9.3} {:>9}",
                name, avg.precision, avg.recall, avg.f1, self.support
            )?;
        }
        Ok(())
    }
}
