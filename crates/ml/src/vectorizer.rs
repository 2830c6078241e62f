use std::collections::{BTreeMap, BTreeSet, HashSet};

use serde::{Deserialize, Serialize};

/// Sparse row: `(feature index, value)` pairs in ascending index order.
pub type SparseVector = Vec<(usize, f64)>;

/// Character n-grams taken inside word boundaries.
///
/// Each whitespace-delimited word is padded with a single space on both
/// sides before slicing, so prefixes and suffixes get their own grams. A
/// padded word shorter than `n` contributes itself once and no longer grams.
pub fn char_wb_ngrams(text: &str, min_n: usize, max_n: usize) -> Vec<String> {
    let mut grams = Vec::new();

    for word in text.split_whitespace() {
        let padded = std::iter::once(' ')
            .chain(word.chars())
            .chain(std::iter::once(' '))
            .collect::<Vec<_>>();
        let len = padded.len();

        for n in min_n..=max_n {
            let mut offset = 0;
            grams.push(padded[offset..(offset + n).min(len)].iter().collect());
            while offset + n < len {
                offset += 1;
                grams.push(padded[offset..offset + n].iter().collect());
            }
            if offset == 0 {
                break;
            }
        }
    }

    grams
}

/// TF-IDF over [`char_wb_ngrams`] with smoothed IDF and L2-normalised rows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CharNgramVectorizer {
    min_n: usize,
    max_n: usize,
    vocabulary: BTreeMap<String, usize>,
    idf: Vec<f64>,
}

impl CharNgramVectorizer {
    pub fn fit<S: AsRef<str>>(docs: &[S], ngram_range: (usize, usize)) -> Self {
        let (min_n, max_n) = ngram_range;
        let per_doc = docs
            .iter()
            .map(|doc| {
                char_wb_ngrams(doc.as_ref(), min_n, max_n)
                    .into_iter()
                    .collect::<HashSet<_>>()
            })
            .collect::<Vec<_>>();

        let vocabulary = per_doc
            .iter()
            .flatten()
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .enumerate()
            .map(|(idx, gram)| (gram, idx))
            .collect::<BTreeMap<_, _>>();

        let mut document_frequency = vec![0_usize; vocabulary.len()];
        for grams in &per_doc {
            for gram in grams {
                if let Some(&idx) = vocabulary.get(gram) {
                    document_frequency[idx] += 1;
                }
            }
        }

        let n_docs = docs.len() as f64;
        let idf = document_frequency
            .into_iter()
            .map(|df| ((1.0 + n_docs) / (1.0 + df as f64)).ln() + 1.0)
            .collect();

        Self {
            min_n,
            max_n,
            vocabulary,
            idf,
        }
    }

    pub fn n_features(&self) -> usize {
        self.vocabulary.len()
    }

    /// Vocabulary grams in lexicographic order.
    pub fn vocabulary(&self) -> impl Iterator<Item = &str> {
        self.vocabulary.keys().map(String::as_str)
    }

    pub fn ngram_range(&self) -> (usize, usize) {
        (self.min_n, self.max_n)
    }

    pub fn is_consistent(&self) -> bool {
        self.idf.len() == self.vocabulary.len()
            && self.vocabulary.values().all(|idx| *idx < self.idf.len())
            && self.min_n >= 1
            && self.min_n <= self.max_n
    }

    pub fn transform(&self, text: &str) -> SparseVector {
        let mut counts: BTreeMap<usize, f64> = BTreeMap::new();
        for gram in char_wb_ngrams(text, self.min_n, self.max_n) {
            if let Some(&idx) = self.vocabulary.get(&gram) {
                *counts.entry(idx).or_default() += 1.0;
            }
        }

        let mut row = counts
            .into_iter()
            .map(|(idx, tf)| (idx, tf * self.idf[idx]))
            .collect::<SparseVector>();

        let norm = row.iter().map(|(_, v)| v * v).sum::<f64>().sqrt();
        if norm > 0.0 {
            for (_, value) in row.iter_mut() {
                *value /= norm;
            }
        }
        row
    }
}
