#![no_main]

use arbitrary::{Arbitrary, Unstructured};
use ocr_normalize::{correct_orientation, to_gray, Orientation, PixelLayout, Raster};
use libfuzzer_sys::fuzz_target;

#[derive(Arbitrary, Debug)]
struct RasterSeed {
    width: u8,
    height: u8,
    layout: u8,
    padding: u8,
    orientation: u8,
}

fuzz_target!(|data: &[u8]| {
    let mut unstructured = Unstructured::new(data);
    let seed = match RasterSeed::arbitrary(&mut unstructured) {
        Ok(seed) => seed,
        Err(_) => return,
    };

    let layout = match seed.layout % 3 {
        0 => PixelLayout::Gray,
        1 => PixelLayout::Rgb,
        _ => PixelLayout::Rgba,
    };
    let width = seed.width as u32 % 64 + 1;
    let height = seed.height as u32 % 64 + 1;
    let stride = width as usize * layout.bytes_per_pixel() + (seed.padding % 8) as usize;
    let pixels: Vec<u8> = (0..stride * height as usize)
        .map(|i| unstructured.bytes(1).map(|b| b[0]).unwrap_or(i as u8))
        .collect();
    let Ok(raster) = Raster::from_raw(width, height, stride, layout, pixels) else {
        return;
    };
    let Some(orientation) = Orientation::from_code(seed.orientation as u32 % 8 + 1) else {
        return;
    };

    if let Ok(corrected) = correct_orientation(raster, orientation) {
        assert_eq!(
            corrected.dimensions(),
            orientation.corrected_dimensions(width, height)
        );
        let gray = to_gray(corrected);
        assert_eq!(gray.layout(), PixelLayout::Gray);
    }
});
