use std::fs;
use std::path::Path;

use coco_core::{
    normalize_text, CocoError, CocoResult, EntityExtractor, EntityPattern, RuleTable,
    TrainingExample,
};

const TEXT_COLUMN: &str = "text";
const LABEL_COLUMN: &str = "label";

pub(crate) fn ensure_file(path: &Path) -> CocoResult<()> {
    if path.is_file() {
        Ok(())
    } else {
        Err(CocoError::MissingResource {
            path: path.to_path_buf(),
        })
    }
}

/// Reads a `text,label` CSV. Header names are matched after trimming and
/// lowercasing; other columns are ignored. Texts are returned as written.
pub fn load_examples(path: &Path) -> CocoResult<Vec<TrainingExample>> {
    ensure_file(path)?;
    let csv_error = |source| CocoError::Csv {
        path: path.to_path_buf(),
        source,
    };

    let mut reader = csv::Reader::from_path(path).map_err(csv_error)?;
    let headers = reader
        .headers()
        .map_err(csv_error)?
        .iter()
        .map(|name| name.trim_start_matches('\u{feff}').trim().to_lowercase())
        .collect::<Vec<_>>();

    let column = |name: &str| headers.iter().position(|header| header == name);
    let (Some(text_idx), Some(label_idx)) = (column(TEXT_COLUMN), column(LABEL_COLUMN)) else {
        return Err(CocoError::MissingColumns {
            path: path.to_path_buf(),
            expected: format!("{TEXT_COLUMN},{LABEL_COLUMN}"),
        });
    };

    let mut examples = Vec::new();
    for (row, record) in reader.records().enumerate() {
        let record = record.map_err(csv_error)?;
        let line = record
            .position()
            .map(|pos| pos.line() as usize)
            .unwrap_or(row + 2);

        let label = record.get(label_idx).unwrap_or_default().trim();
        if label.is_empty() {
            return Err(CocoError::MalformedLine {
                path: path.to_path_buf(),
                line,
                reason: "row has an empty label".to_string(),
            });
        }

        examples.push(TrainingExample::new(
            record.get(text_idx).unwrap_or_default(),
            label,
        ));
    }

    if examples.is_empty() {
        return Err(CocoError::EmptyDataset {
            path: path.to_path_buf(),
        });
    }

    Ok(examples)
}

/// Reads one `{"label", "pattern"}` object per line; blank lines are skipped.
pub fn load_entity_patterns(path: &Path) -> CocoResult<Vec<EntityPattern>> {
    ensure_file(path)?;
    let raw = fs::read_to_string(path).map_err(|err| CocoError::io(path, err))?;

    let mut patterns = Vec::new();
    for (idx, line) in raw.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let pattern: EntityPattern =
            serde_json::from_str(line).map_err(|err| CocoError::MalformedLine {
                path: path.to_path_buf(),
                line: idx + 1,
                reason: format!("each line must contain keys label, pattern ({err})"),
            })?;
        if normalize_text(&pattern.pattern).is_empty() {
            return Err(CocoError::MalformedLine {
                path: path.to_path_buf(),
                line: idx + 1,
                reason: "pattern is empty".to_string(),
            });
        }
        patterns.push(pattern);
    }

    EntityExtractor::new(&patterns)?;
    Ok(patterns)
}

/// Structural check only: the file must parse as a rule table.
pub fn validate_rules(path: &Path) -> CocoResult<RuleTable> {
    ensure_file(path)?;
    let raw = fs::read_to_string(path).map_err(|err| CocoError::io(path, err))?;
    RuleTable::from_json_str(&raw).map_err(|err| CocoError::json(path, err))
}
