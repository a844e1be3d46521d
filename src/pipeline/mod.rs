//! Plate analysis: detect, deduplicate, extract, classify, look up nutrition.
//!
//! The [`Analyzer`] owns no model or network code. The detector, the crop
//! classifier and the nutrition service are injected, so the whole flow runs
//! against synthetic regions in tests.
//!
//! Failure policy, per stage:
//! - detector error: the analysis fails;
//! - rejected crop (too small or empty): skipped, counted;
//! - store error: that region is skipped and counted, siblings continue;
//! - classifier error: record labelled [`UNKNOWN_LABEL`], no nutrition call;
//! - nutrition error: record carries "Not found".

mod report;

pub use report::{AnalysisReport, AnalysisStats, ItemRecord};

use image::RgbImage;
use log::{info, warn};

use crate::classify::{Classifier, UNKNOWN_LABEL};
use crate::error::PlatescanError;
use crate::extract::{Artifact, ArtifactStore, Extraction, Extractor};
use crate::nutrition::{NutritionField, NutritionLookup};
use crate::region::{select_regions, Region, SelectOptions};

/// Produces candidate regions for an image.
pub trait Detector {
    fn detect(&self, image: &RgbImage) -> Result<Vec<Region>, PlatescanError>;
}

impl<D: Detector + ?Sized> Detector for &D {
    fn detect(&self, image: &RgbImage) -> Result<Vec<Region>, PlatescanError> {
        (**self).detect(image)
    }
}

/// Result of the segmentation half of the pipeline.
#[derive(Debug, Default)]
pub struct Segmentation {
    pub artifacts: Vec<Artifact>,
    pub stats: AnalysisStats,
}

/// Runs detection and extraction only; no external classification.
pub fn segment<D, S>(
    detector: &D,
    select: &SelectOptions,
    extractor: &Extractor,
    image: &RgbImage,
    store: &mut S,
) -> Result<Segmentation, PlatescanError>
where
    D: Detector + ?Sized,
    S: ArtifactStore + ?Sized,
{
    let regions = detector.detect(image)?;
    let mut stats = AnalysisStats {
        detected: regions.len(),
        ..Default::default()
    };

    let kept = select_regions(regions, select);
    stats.kept = kept.len();

    let mut artifacts = Vec::with_capacity(kept.len());
    for (idx, region) in kept.iter().enumerate() {
        match extractor.extract(image, region, store) {
            Ok(Extraction::Accepted(artifact)) => artifacts.push(artifact),
            Ok(Extraction::Rejected(_)) => stats.rejected += 1,
            Err(err) => {
                warn!("kept region {} could not be stored: {}", idx, err);
                stats.failed += 1;
            }
        }
    }

    info!(
        "{} detected, {} kept, {} extracted, {} rejected, {} failed",
        stats.detected,
        stats.kept,
        artifacts.len(),
        stats.rejected,
        stats.failed
    );
    Ok(Segmentation { artifacts, stats })
}

/// Orchestrates one plate analysis with injected collaborators.
pub struct Analyzer<D, C, N> {
    detector: D,
    classifier: C,
    nutrition: N,
    select: SelectOptions,
    extractor: Extractor,
}

impl<D, C, N> Analyzer<D, C, N>
where
    D: Detector,
    C: Classifier,
    N: NutritionLookup,
{
    pub fn new(detector: D, classifier: C, nutrition: N) -> Self {
        Self {
            detector,
            classifier,
            nutrition,
            select: SelectOptions::default(),
            extractor: Extractor::default(),
        }
    }

    pub fn with_select_options(mut self, select: SelectOptions) -> Self {
        self.select = select;
        self
    }

    pub fn with_extractor(mut self, extractor: Extractor) -> Self {
        self.extractor = extractor;
        self
    }

    /// Analyzes one image, writing crops into `store`.
    ///
    /// Records come back in kept order, one per extracted crop.
    pub fn analyze<S: ArtifactStore + ?Sized>(
        &self,
        image: &RgbImage,
        store: &mut S,
    ) -> Result<AnalysisReport, PlatescanError> {
        let Segmentation {
            artifacts,
            mut stats,
        } = segment(&self.detector, &self.select, &self.extractor, image, store)?;

        let items = artifacts
            .iter()
            .map(|artifact| self.describe(artifact, &mut stats))
            .collect();

        Ok(AnalysisReport { items, stats })
    }

    fn describe(&self, artifact: &Artifact, stats: &mut AnalysisStats) -> ItemRecord {
        let file_name = artifact.handle.file_name.clone();

        let label = match self.classifier.classify(&artifact.image) {
            Ok(label) => label,
            Err(err) => {
                warn!("classification failed for {}: {}", file_name, err);
                stats.classification_failures += 1;
                return ItemRecord {
                    filename: file_name,
                    label: UNKNOWN_LABEL.to_string(),
                    nutrition: NutritionField::NotFound,
                };
            }
        };

        let nutrition = match self.nutrition.lookup(&label) {
            Ok(found) => NutritionField::from(found),
            Err(err) => {
                warn!("nutrition lookup failed for '{}': {}", label, err);
                stats.nutrition_failures += 1;
                NutritionField::NotFound
            }
        };

        ItemRecord {
            filename: file_name,
            label,
            nutrition,
        }
    }
}
