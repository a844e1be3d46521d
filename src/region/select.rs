//! Greedy overlap suppression over detector regions.

use log::debug;

use super::mask::mask_iou;
use super::Region;

/// Order in which candidates are offered to the greedy pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SelectOrder {
    /// The detector's own output order; earlier regions win overlaps.
    #[default]
    Detector,
    /// Highest score first (stable for equal scores).
    Confidence,
}

/// Options for [`select_regions`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SelectOptions {
    /// A candidate is dropped when its IoU with any kept region is strictly
    /// greater than this value.
    pub iou_threshold: f64,
    pub order: SelectOrder,
}

impl Default for SelectOptions {
    fn default() -> Self {
        Self {
            iou_threshold: 0.5,
            order: SelectOrder::Detector,
        }
    }
}

/// Indices of the regions that survive greedy selection, in keep order.
pub fn select_region_indices(regions: &[Region], opts: &SelectOptions) -> Vec<usize> {
    let mut order: Vec<usize> = (0..regions.len()).collect();
    if opts.order == SelectOrder::Confidence {
        order.sort_by(|&a, &b| regions[b].score.total_cmp(&regions[a].score));
    }

    let mut kept: Vec<usize> = Vec::new();
    for idx in order {
        let candidate = &regions[idx];
        let overlapping = kept.iter().find(|&&k| {
            mask_iou(&candidate.mask, &regions[k].mask) > opts.iou_threshold
        });

        match overlapping {
            Some(&k) => debug!("region {} suppressed by region {}", idx, k),
            None => kept.push(idx),
        }
    }
    kept
}

/// Drops every region that overlaps an already-kept one by more than the
/// threshold. First seen wins under [`SelectOrder::Detector`].
pub fn select_regions(regions: Vec<Region>, opts: &SelectOptions) -> Vec<Region> {
    let keep = select_region_indices(&regions, opts);
    let mut slots: Vec<Option<Region>> = regions.into_iter().map(Some).collect();
    keep.into_iter()
        .filter_map(|idx| slots[idx].take())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::BBoxXYXY;
    use crate::region::Mask;

    fn region(x1: u32, y1: u32, x2: u32, y2: u32, score: f64) -> Region {
        Region::new(
            Mask::from_rect(100, 100, x1, y1, x2, y2),
            BBoxXYXY::from_xyxy(x1 as f64, y1 as f64, x2 as f64, y2 as f64),
            score,
        )
    }

    #[test]
    fn empty_input_yields_empty_output() {
        assert!(select_regions(Vec::new(), &SelectOptions::default()).is_empty());
    }

    #[test]
    fn first_seen_wins_over_higher_score() {
        let regions = vec![
            region(0, 0, 10, 10, 0.2),
            region(0, 0, 10, 9, 0.9),
            region(50, 50, 60, 60, 0.5),
        ];
        let kept = select_region_indices(&regions, &SelectOptions::default());
        assert_eq!(kept, vec![0, 2]);
    }

    #[test]
    fn confidence_order_prefers_higher_score() {
        let regions = vec![
            region(0, 0, 10, 10, 0.2),
            region(0, 0, 10, 9, 0.9),
            region(50, 50, 60, 60, 0.5),
        ];
        let opts = SelectOptions {
            order: SelectOrder::Confidence,
            ..Default::default()
        };
        assert_eq!(select_region_indices(&regions, &opts), vec![1, 2]);
    }

    #[test]
    fn overlap_equal_to_threshold_is_kept() {
        // 10x10 and 10x5 inside it: IoU exactly 0.5.
        let regions = vec![region(0, 0, 10, 10, 0.5), region(0, 0, 10, 5, 0.5)];
        let kept = select_regions(regions, &SelectOptions::default());
        assert_eq!(kept.len(), 2);
    }

    #[test]
    fn candidate_checked_against_every_kept_region() {
        let regions = vec![
            region(0, 0, 10, 10, 0.5),
            region(40, 40, 50, 50, 0.5),
            region(40, 40, 50, 49, 0.5),
        ];
        let kept = select_region_indices(&regions, &SelectOptions::default());
        assert_eq!(kept, vec![0, 1]);
    }

    #[test]
    fn selection_is_idempotent() {
        let regions = vec![
            region(0, 0, 20, 20, 0.3),
            region(5, 5, 20, 20, 0.8),
            region(30, 30, 60, 60, 0.6),
            region(35, 30, 60, 60, 0.1),
        ];
        let opts = SelectOptions::default();
        let once = select_regions(regions, &opts);
        let twice = select_regions(once.clone(), &opts);
        assert_eq!(once, twice);
    }
}
