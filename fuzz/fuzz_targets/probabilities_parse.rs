//! Fuzz target for classifier probability vectors.

#![no_main]

use libfuzzer_sys::fuzz_target;
use platescan::classify::{from_probabilities_str, LabelTable};

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };

    if let Ok(values) = from_probabilities_str(text) {
        let _ = LabelTable::fruit_vegetable().interpret(&values, 0.6);
    }
});
