#![no_main]

//! Fuzz target for EXIF orientation resolution.
//! Any metadata problem must degrade to TopLeft, never panic.

use ocr_normalize::resolve_orientation;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let _ = resolve_orientation(data);
});
