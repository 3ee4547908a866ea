#![no_main]

use ocr_normalize::{transform, ScalePlan};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.is_empty() {
        return;
    }

    // First byte picks the mode; a tight cap keeps iterations fast.
    let grayscale = data[0] & 1 == 1;
    let policy = |w: u32, h: u32| {
        let factor = (256.0 / w.max(h) as f64).min(1.0);
        ScalePlan {
            width: ((w as f64 * factor).round() as u32).max(1),
            height: ((h as f64 * factor).round() as u32).max(1),
            scale_factor: factor,
        }
    };
    let _ = transform(&data[1..], grayscale, &policy);
});
