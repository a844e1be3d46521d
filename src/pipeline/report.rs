//! Output records of a plate analysis.

use std::fmt;

use serde::Serialize;

use crate::nutrition::NutritionField;

/// One identified item.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ItemRecord {
    /// Artifact file name within the request namespace.
    pub filename: String,
    pub label: String,
    pub nutrition: NutritionField,
}

/// Counters for one analysis.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct AnalysisStats {
    pub detected: usize,
    pub kept: usize,
    pub rejected: usize,
    /// Kept regions whose crop could not be stored.
    pub failed: usize,
    pub classification_failures: usize,
    pub nutrition_failures: usize,
}

/// Everything an analysis produced.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AnalysisReport {
    pub items: Vec<ItemRecord>,
    pub stats: AnalysisStats,
}

impl AnalysisReport {
    /// Records as the JSON array handed to callers.
    pub fn to_json_string(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.items)
    }
}

impl fmt::Display for AnalysisStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} detected, {} kept, {} rejected, {} failed",
            self.detected, self.kept, self.rejected, self.failed
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_serialize_with_expected_keys() {
        let report = AnalysisReport {
            items: vec![ItemRecord {
                filename: "0a1b2c3d.jpg".into(),
                label: "rice".into(),
                nutrition: NutritionField::NotFound,
            }],
            stats: AnalysisStats::default(),
        };
        let value: serde_json::Value =
            serde_json::from_str(&report.to_json_string().unwrap()).unwrap();
        assert_eq!(value[0]["filename"], "0a1b2c3d.jpg");
        assert_eq!(value[0]["label"], "rice");
        assert_eq!(value[0]["nutrition"], "Not found");
    }

    #[test]
    fn empty_report_is_empty_array() {
        assert_eq!(AnalysisReport::default().to_json_string().unwrap(), "[]");
    }
}
