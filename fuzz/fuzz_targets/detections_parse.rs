//! Fuzz target for detections documents.
//!
//! Parses arbitrary bytes as a detections document and, when that succeeds,
//! decodes every mask for a small image.

#![no_main]

use libfuzzer_sys::fuzz_target;
use platescan::detections::from_detections_slice;

fuzz_target!(|data: &[u8]| {
    if data.len() > 10 * 1024 * 1024 {
        return;
    }

    if let Ok(doc) = from_detections_slice(data) {
        let _ = doc.to_regions(64, 48);
    }
});
