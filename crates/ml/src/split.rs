use std::collections::BTreeMap;
use std::fmt;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitStrategy {
    Stratified,
    /// Stratification was infeasible; seeded shuffle over all rows.
    Shuffled,
    /// Too few rows to hold anything out.
    Skipped,
}

impl fmt::Display for SplitStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Stratified => "stratified",
            Self::Shuffled => "shuffled (stratification infeasible)",
            Self::Skipped => "skipped (not enough examples)",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Split {
    pub train: Vec<usize>,
    pub validation: Vec<usize>,
    pub strategy: SplitStrategy,
}

/// Deterministic train/validation split over row indices.
///
/// Holds out `ceil(n * test_ratio)` rows. Stratifies by label when every
/// label has at least two rows and both sides can hold one row per label.
pub fn train_validation_split<S: AsRef<str>>(labels: &[S], test_ratio: f64, seed: u64) -> Split {
    let n = labels.len();
    let test_count = ((n as f64) * test_ratio).ceil() as usize;

    if n < 2 || test_count == 0 || test_count >= n {
        return Split {
            train: (0..n).collect(),
            validation: Vec::new(),
            strategy: SplitStrategy::Skipped,
        };
    }

    let mut by_label: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
    for (idx, label) in labels.iter().enumerate() {
        by_label.entry(label.as_ref()).or_default().push(idx);
    }

    let n_classes = by_label.len();
    let stratifiable = by_label.values().all(|rows| rows.len() >= 2)
        && test_count >= n_classes
        && n - test_count >= n_classes;

    let mut rng = StdRng::seed_from_u64(seed);
    let (mut train, mut validation) = if stratifiable {
        let mut train = Vec::new();
        let mut validation = Vec::new();
        for rows in by_label.values_mut() {
            rows.shuffle(&mut rng);
            let held = ((rows.len() as f64) * test_ratio).round() as usize;
            let held = held.clamp(1, rows.len() - 1);
            validation.extend_from_slice(&rows[..held]);
            train.extend_from_slice(&rows[held..]);
        }
        (train, validation)
    } else {
        let mut rows = (0..n).collect::<Vec<_>>();
        rows.shuffle(&mut rng);
        let train = rows.split_off(test_count);
        (train, rows)
    };

    train.sort_unstable();
    validation.sort_unstable();

    Split {
        train,
        validation,
        strategy: if stratifiable {
            SplitStrategy::Stratified
        } else {
            SplitStrategy::Shuffled
        },
    }
}
