#![no_main]

use ocr_normalize::decode_config;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let _ = decode_config(data);
});
