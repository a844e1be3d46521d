//! Turning model output into food labels.
//!
//! Two kinds of classification exist. The fruit/vegetable model emits a
//! probability vector over a fixed label table, interpreted by
//! [`LabelTable::interpret`]. Crops from plate analysis are named by a
//! [`Classifier`] implementation (see [`crate::nutrition::GeminiClient`]).

mod labels;

pub use labels::FoodCategory;

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use image::RgbImage;
use serde::{Deserialize, Serialize};

use crate::error::PlatescanError;

/// Label given to anything that could not be identified.
pub const UNKNOWN_LABEL: &str = "Unknown";

/// Names the food shown in a crop.
pub trait Classifier {
    fn classify(&self, crop: &RgbImage) -> Result<String, PlatescanError>;
}

impl<C: Classifier + ?Sized> Classifier for &C {
    fn classify(&self, crop: &RgbImage) -> Result<String, PlatescanError> {
        (**self).classify(crop)
    }
}

/// A label chosen from a probability vector.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Prediction {
    pub name: String,
    pub confidence: f64,
    pub category: FoodCategory,
}

impl Prediction {
    pub fn is_unknown(&self) -> bool {
        self.category == FoodCategory::Unknown
    }
}

/// Maps model output indices to labels.
#[derive(Clone, Debug)]
pub struct LabelTable {
    entries: Vec<(String, FoodCategory)>,
}

impl Default for LabelTable {
    fn default() -> Self {
        Self::fruit_vegetable()
    }
}

impl LabelTable {
    /// The 36-class fruit and vegetable table.
    pub fn fruit_vegetable() -> Self {
        Self {
            entries: labels::FRUIT_VEG_LABELS
                .iter()
                .map(|(name, cat)| (name.to_string(), *cat))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn label(&self, index: usize) -> Option<&str> {
        self.entries.get(index).map(|(name, _)| name.as_str())
    }

    /// Picks the arg-max label.
    ///
    /// When the top probability is below `min_confidence` the prediction is
    /// [`UNKNOWN_LABEL`] with the top probability still reported.
    pub fn interpret(
        &self,
        probabilities: &[f64],
        min_confidence: f64,
    ) -> Result<Prediction, PlatescanError> {
        if probabilities.len() != self.entries.len() {
            return Err(PlatescanError::InvalidProbabilities {
                message: format!(
                    "expected {} values, got {}",
                    self.entries.len(),
                    probabilities.len()
                ),
            });
        }
        if probabilities.iter().any(|p| !p.is_finite()) {
            return Err(PlatescanError::InvalidProbabilities {
                message: "values must be finite".to_string(),
            });
        }

        // First index wins ties, like numpy's argmax.
        let (index, confidence) = probabilities.iter().copied().enumerate().fold(
            (0usize, f64::NEG_INFINITY),
            |best, (i, p)| if p > best.1 { (i, p) } else { best },
        );

        if confidence < min_confidence {
            return Ok(Prediction {
                name: UNKNOWN_LABEL.to_string(),
                confidence,
                category: FoodCategory::Unknown,
            });
        }

        let (name, category) = &self.entries[index];
        Ok(Prediction {
            name: name.clone(),
            confidence,
            category: *category,
        })
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ProbabilitiesDoc {
    Flat(Vec<f64>),
    Batch(Vec<Vec<f64>>),
    Wrapped { probabilities: Vec<f64> },
}

/// Parses a probability vector: a bare array, a single-row batch
/// (`[[...]]`) or `{"probabilities": [...]}`.
pub fn from_probabilities_str(json: &str) -> Result<Vec<f64>, serde_json::Error> {
    serde_json::from_str::<ProbabilitiesDoc>(json).map(flatten)
}

/// Reads a probability vector from a JSON file.
pub fn read_probabilities(path: &Path) -> Result<Vec<f64>, PlatescanError> {
    let file = File::open(path).map_err(PlatescanError::Io)?;
    let reader = BufReader::new(file);

    serde_json::from_reader::<_, ProbabilitiesDoc>(reader)
        .map(flatten)
        .map_err(|source| PlatescanError::ProbabilitiesParse {
            path: path.to_path_buf(),
            source,
        })
}

fn flatten(doc: ProbabilitiesDoc) -> Vec<f64> {
    match doc {
        ProbabilitiesDoc::Flat(values) | ProbabilitiesDoc::Wrapped { probabilities: values } => {
            values
        }
        ProbabilitiesDoc::Batch(rows) => rows.into_iter().next().unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn one_hot(index: usize, value: f64) -> Vec<f64> {
        let mut v = vec![0.0; 36];
        v[index] = value;
        v
    }

    #[test]
    fn argmax_picks_label() {
        let table = LabelTable::fruit_vegetable();
        let pred = table.interpret(&one_hot(35, 0.97), 0.6).unwrap();
        assert_eq!(pred.name, "watermelon");
        assert_eq!(pred.category, FoodCategory::Fruit);
        assert_eq!(pred.confidence, 0.97);
    }

    #[test]
    fn low_confidence_is_unknown() {
        let table = LabelTable::fruit_vegetable();
        let pred = table.interpret(&one_hot(6, 0.59), 0.6).unwrap();
        assert!(pred.is_unknown());
        assert_eq!(pred.name, UNKNOWN_LABEL);
        assert_eq!(pred.confidence, 0.59);
    }

    #[test]
    fn threshold_is_inclusive() {
        let table = LabelTable::fruit_vegetable();
        let pred = table.interpret(&one_hot(6, 0.6), 0.6).unwrap();
        assert_eq!(pred.name, "carrot");
        assert_eq!(pred.category, FoodCategory::Vegetable);
    }

    #[test]
    fn ties_resolve_to_first_index() {
        let table = LabelTable::fruit_vegetable();
        let mut probs = vec![0.0; 36];
        probs[3] = 0.7;
        probs[10] = 0.7;
        assert_eq!(table.interpret(&probs, 0.5).unwrap().name, "bell pepper");
    }

    #[test]
    fn wrong_length_is_rejected() {
        let table = LabelTable::fruit_vegetable();
        assert!(table.interpret(&[0.5, 0.5], 0.1).is_err());
        let mut probs = one_hot(0, 0.9);
        probs[1] = f64::NAN;
        assert!(table.interpret(&probs, 0.1).is_err());
    }

    #[test]
    fn table_has_every_index() {
        let table = LabelTable::fruit_vegetable();
        assert_eq!(table.len(), 36);
        assert_eq!(table.label(0), Some("apple"));
        assert_eq!(table.label(29), Some("soy beans"));
        assert_eq!(table.label(36), None);
    }

    #[test]
    fn probability_document_shapes() {
        assert_eq!(from_probabilities_str("[0.1, 0.9]").unwrap(), vec![0.1, 0.9]);
        assert_eq!(from_probabilities_str("[[0.2, 0.8]]").unwrap(), vec![0.2, 0.8]);
        assert_eq!(
            from_probabilities_str(r#"{"probabilities": [1.0]}"#).unwrap(),
            vec![1.0]
        );
        assert!(from_probabilities_str(r#"{"probs": [1.0]}"#).is_err());
    }
}
