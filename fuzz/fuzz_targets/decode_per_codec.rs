#![no_main]

use ocr_normalize::engine::{decode_generic, decode_png_zune, decode_webp_libwebp, jpeg_config};
use ocr_normalize::FormatTag;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.is_empty() {
        return;
    }

    // Skip the sniffer so every codec sees bytes it did not claim.
    let payload = &data[1..];
    let _ = match data[0] % 5 {
        0 => decode_png_zune(payload).map(|_| ()),
        1 => decode_webp_libwebp(payload).map(|_| ()),
        2 => jpeg_config(payload).map(|_| ()),
        3 => decode_generic(payload, FormatTag::Tiff).map(|_| ()),
        _ => decode_generic(payload, FormatTag::Bmp).map(|_| ()),
    };
});
