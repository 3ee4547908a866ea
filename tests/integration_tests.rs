// tests/integration_tests.rs
//
// End-to-end tests for the public API: transform on every format, the
// orientation matrix, decode_config, and encode.

use image::{DynamicImage, GrayImage, ImageFormat, Luma, Rgb, RgbImage};
use mozjpeg::{ColorSpace, Compress};
use ocr_normalize::{
    correct_orientation, decode_config, encode, normalize, transform, A4Scale, ColorModel,
    FormatTag, Orientation, OutputFormat, PixelLayout, Raster, ScalePlan,
};
use std::io::Cursor;

fn encode_with(img: DynamicImage, format: ImageFormat) -> Vec<u8> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), format).unwrap();
    buf
}

fn jpeg_from_raster(raster: &Raster) -> Vec<u8> {
    let space = match raster.layout() {
        PixelLayout::Gray => ColorSpace::JCS_GRAYSCALE,
        _ => ColorSpace::JCS_RGB,
    };
    let mut comp = Compress::new(space);
    comp.set_size(raster.width() as usize, raster.height() as usize);
    comp.set_quality(92.0);
    let mut output = Vec::new();
    {
        let mut writer = comp.start_compress(&mut output).unwrap();
        for row in raster.rows() {
            writer.write_scanlines(row).unwrap();
        }
        writer.finish().unwrap();
    }
    output
}

/// APP1 segment carrying a little-endian TIFF with a single Orientation entry.
fn exif_app1(orientation: u16) -> Vec<u8> {
    let mut tiff = Vec::new();
    tiff.extend_from_slice(b"II\x2A\x00");
    tiff.extend_from_slice(&8u32.to_le_bytes());
    tiff.extend_from_slice(&1u16.to_le_bytes());
    tiff.extend_from_slice(&0x0112u16.to_le_bytes());
    tiff.extend_from_slice(&3u16.to_le_bytes());
    tiff.extend_from_slice(&1u32.to_le_bytes());
    tiff.extend_from_slice(&orientation.to_le_bytes());
    tiff.extend_from_slice(&[0, 0]);
    tiff.extend_from_slice(&0u32.to_le_bytes());

    let mut payload = b"Exif\0\0".to_vec();
    payload.extend_from_slice(&tiff);

    let mut segment = vec![0xFF, 0xE1];
    segment.extend_from_slice(&((payload.len() + 2) as u16).to_be_bytes());
    segment.extend_from_slice(&payload);
    segment
}

fn with_exif(jpeg: &[u8], orientation: u16) -> Vec<u8> {
    let mut out = jpeg[..2].to_vec();
    out.extend_from_slice(&exif_app1(orientation));
    out.extend_from_slice(&jpeg[2..]);
    out
}

/// Upright page-like pattern: dark band on top, dark block bottom-left.
fn upright_page(width: u32, height: u32) -> Raster {
    let img = GrayImage::from_fn(width, height, |x, y| {
        if y < height / 4 || (x < width / 3 && y > height / 2) {
            Luma([20])
        } else {
            Luma([235])
        }
    });
    Raster::from_dynamic(DynamicImage::ImageLuma8(img))
}

/// 64-bit average hash over an 8x8 downsample.
fn average_hash(raster: &Raster) -> u64 {
    let img = raster.clone().into_dynamic().unwrap().to_luma8();
    let small = image::imageops::resize(&img, 8, 8, image::imageops::FilterType::Triangle);
    let mean = small.pixels().map(|p| p.0[0] as u32).sum::<u32>() / 64;
    small
        .pixels()
        .enumerate()
        .fold(0u64, |acc, (i, p)| if p.0[0] as u32 > mean { acc | (1 << i) } else { acc })
}

mod orientation_matrix {
    use super::*;

    #[test]
    fn all_eight_exif_variants_normalize_to_the_same_page() {
        let upright = upright_page(96, 64);
        let reference = normalize(&jpeg_from_raster(&upright), true).unwrap();
        let reference_hash = average_hash(&reference.raster);

        for orientation in Orientation::ALL {
            // Store the page so that correcting with `orientation` brings it upright.
            let stored = correct_orientation(upright.clone(), orientation.inverse()).unwrap();
            let bytes = with_exif(&jpeg_from_raster(&stored), orientation.code() as u16);
            assert_eq!(ocr_normalize::resolve_orientation(&bytes), orientation);

            let out = normalize(&bytes, true).unwrap();
            assert_eq!(out.raster.dimensions(), (96, 64), "{orientation:?}");
            assert_eq!((out.original_width, out.original_height), (96, 64));
            let distance = (average_hash(&out.raster) ^ reference_hash).count_ones();
            assert!(distance <= 4, "{orientation:?}: hash distance {distance}");
        }
    }

    #[test]
    fn color_jpeg_variants_keep_rgb_layout() {
        let upright = Raster::from_dynamic(DynamicImage::ImageRgb8(RgbImage::from_fn(
            48,
            32,
            |x, _| if x < 24 { Rgb([200, 30, 30]) } else { Rgb([30, 30, 200]) },
        )));
        for orientation in [Orientation::RightTop, Orientation::LeftBottom] {
            let stored = correct_orientation(upright.clone(), orientation.inverse()).unwrap();
            let bytes = with_exif(&jpeg_from_raster(&stored), orientation.code() as u16);
            let out = normalize(&bytes, false).unwrap();
            assert_eq!(out.raster.layout(), PixelLayout::Rgb);
            assert_eq!(out.raster.dimensions(), (48, 32));
            // left half red, right half blue
            assert!(out.raster.pixel(4, 16)[0] > 150);
            assert!(out.raster.pixel(44, 16)[2] > 150);
        }
    }

    #[test]
    fn garbage_exif_falls_back_to_identity() {
        let upright = upright_page(32, 32);
        let mut bytes = jpeg_from_raster(&upright);
        // APP1 whose TIFF header is nonsense
        let mut bad = vec![0xFF, 0xE1, 0x00, 0x0C];
        bad.extend_from_slice(b"Exif\0\0XXXX");
        bytes.splice(2..2, bad);
        let out = normalize(&bytes, true).unwrap();
        assert_eq!(out.raster.dimensions(), (32, 32));
    }
}

mod tiff_orientation {
    use super::*;

    /// Uncompressed 8-bit gray TIFF with an Orientation tag.
    fn gray_tiff(width: u16, height: u16, pixels: &[u8], orientation: u16) -> Vec<u8> {
        const ENTRIES: u16 = 10;
        let data_offset = 8 + 2 + ENTRIES as u32 * 12 + 4;
        let short = |tag: u16, value: u16| {
            let mut e = tag.to_le_bytes().to_vec();
            e.extend_from_slice(&3u16.to_le_bytes());
            e.extend_from_slice(&1u32.to_le_bytes());
            e.extend_from_slice(&value.to_le_bytes());
            e.extend_from_slice(&[0, 0]);
            e
        };
        let long = |tag: u16, value: u32| {
            let mut e = tag.to_le_bytes().to_vec();
            e.extend_from_slice(&4u16.to_le_bytes());
            e.extend_from_slice(&1u32.to_le_bytes());
            e.extend_from_slice(&value.to_le_bytes());
            e
        };

        let mut out = b"II\x2A\x00".to_vec();
        out.extend_from_slice(&8u32.to_le_bytes());
        out.extend_from_slice(&ENTRIES.to_le_bytes());
        out.extend(short(256, width));
        out.extend(short(257, height));
        out.extend(short(258, 8));
        out.extend(short(259, 1));
        out.extend(short(262, 1));
        out.extend(long(273, data_offset));
        out.extend(short(274, orientation));
        out.extend(short(277, 1));
        out.extend(short(278, height));
        out.extend(long(279, pixels.len() as u32));
        out.extend_from_slice(&0u32.to_le_bytes());
        out.extend_from_slice(pixels);
        out
    }

    #[test]
    fn tiff_orientation_is_applied_exactly() {
        // stored:
        // 1 2 3
        // 4 5 6
        let bytes = gray_tiff(3, 2, &[1, 2, 3, 4, 5, 6], 6);
        assert_eq!(ocr_normalize::sniff(&bytes).unwrap(), FormatTag::Tiff);

        let out = normalize(&bytes, true).unwrap();
        assert_eq!(out.raster.dimensions(), (2, 3));
        assert_eq!(out.raster.packed_bytes(), vec![4, 1, 5, 2, 6, 3]);
        assert_eq!((out.original_width, out.original_height), (2, 3));
        assert_eq!(out.scale_factor, 1.0);
    }

    #[test]
    fn tiff_without_orientation_is_untouched() {
        let bytes = gray_tiff(3, 2, &[1, 2, 3, 4, 5, 6], 1);
        let out = normalize(&bytes, false).unwrap();
        assert_eq!(out.raster.packed_bytes(), vec![1, 2, 3, 4, 5, 6]);
    }
}

mod a4_end_to_end {
    use super::*;

    #[test]
    fn a4_at_300ppi_jpeg_halves_in_decoder() {
        let page = upright_page(2480, 3508);
        let bytes = jpeg_from_raster(&page);

        let out = normalize(&bytes, true).unwrap();
        assert_eq!(out.raster.dimensions(), (1240, 1754));
        assert_eq!(out.raster.layout(), PixelLayout::Gray);
        assert_eq!(out.raster.stride(), 1240);
        assert_eq!(out.scale_factor, 0.5);
        assert_eq!((out.original_width, out.original_height), (2480, 3508));
    }

    #[test]
    fn a4_at_300ppi_png_resamples() {
        let page = upright_page(2480, 3508);
        let bytes = encode(&page, OutputFormat::Png, None).unwrap();

        let out = normalize(&bytes, true).unwrap();
        assert_eq!(out.raster.dimensions(), (1240, 1754));
        assert_eq!(out.raster.layout(), PixelLayout::Gray);
        assert!((out.scale_factor - 0.5).abs() < 0.001);
    }

    #[test]
    fn landscape_scan_caps_long_side() {
        let bytes = encode_with(
            DynamicImage::ImageRgb8(RgbImage::from_pixel(3508, 2480, Rgb([250, 250, 250]))),
            ImageFormat::Bmp,
        );
        let out = transform(&bytes, false, &A4Scale).unwrap();
        assert_eq!(out.raster.dimensions(), (1754, 1240));
        assert_eq!(out.raster.layout(), PixelLayout::Rgb);
    }
}

mod formats {
    use super::*;

    fn sample() -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_fn(40, 30, |x, y| {
            Rgb([(x * 6) as u8, (y * 8) as u8, 90])
        }))
    }

    #[test]
    fn every_container_transforms() {
        let cases = vec![
            (encode_with(sample(), ImageFormat::Png), FormatTag::Png),
            (encode_with(sample(), ImageFormat::Jpeg), FormatTag::Jpeg),
            (encode_with(sample(), ImageFormat::Gif), FormatTag::Gif),
            (encode_with(sample(), ImageFormat::Bmp), FormatTag::Bmp),
            (encode_with(sample(), ImageFormat::Tiff), FormatTag::Tiff),
            (
                encode(&Raster::from_dynamic(sample()), OutputFormat::WebP, None).unwrap(),
                FormatTag::WebP,
            ),
        ];
        for (bytes, tag) in cases {
            assert_eq!(ocr_normalize::sniff(&bytes).unwrap(), tag);
            let out = normalize(&bytes, false).unwrap();
            assert_eq!(out.raster.dimensions(), (40, 30), "{tag}");
            assert_eq!(out.scale_factor, 1.0, "{tag}");

            let gray = normalize(&bytes, true).unwrap();
            assert_eq!(gray.raster.layout(), PixelLayout::Gray, "{tag}");
            assert_eq!(gray.raster.stride(), 40, "{tag}");
        }
    }

    #[test]
    fn custom_policy_is_honoured_on_generic_path() {
        let bytes = encode_with(sample(), ImageFormat::Png);
        let fixed = |_: u32, _: u32| ScalePlan {
            width: 20,
            height: 10,
            scale_factor: 0.5,
        };
        let out = transform(&bytes, false, &fixed).unwrap();
        assert_eq!(out.raster.dimensions(), (20, 10));
        assert_eq!(out.scale_factor, 0.5);
    }

    fn cmyk_jpeg(width: u32, height: u32) -> Vec<u8> {
        let pixels: Vec<u8> = (0..width * height)
            .flat_map(|i| [(i % 200) as u8, 40, 90, 10])
            .collect();
        let mut comp = Compress::new(ColorSpace::JCS_CMYK);
        comp.set_size(width as usize, height as usize);
        comp.set_quality(90.0);
        let mut output = Vec::new();
        {
            let mut writer = comp.start_compress(&mut output).unwrap();
            writer.write_scanlines(&pixels).unwrap();
            writer.finish().unwrap();
        }
        output
    }

    #[test]
    fn cmyk_jpeg_takes_generic_path() {
        let bytes = cmyk_jpeg(64, 48);
        assert_eq!(decode_config(&bytes).unwrap().color_model, ColorModel::Cmyk);

        // 0.3 is no DCT ratio: the decoder would land on 2/8 and 16x12, the
        // resampler hits the planned size exactly.
        let policy = |w: u32, h: u32| ScalePlan {
            width: (w as f64 * 0.3).round() as u32,
            height: (h as f64 * 0.3).round() as u32,
            scale_factor: 0.3,
        };
        for grayscale in [false, true] {
            let out = transform(&bytes, grayscale, &policy).unwrap();
            assert_eq!(out.raster.dimensions(), (19, 14));
            assert_eq!(out.scale_factor, 0.3);
            assert_eq!((out.original_width, out.original_height), (64, 48));
            let expected = if grayscale { PixelLayout::Gray } else { PixelLayout::Rgb };
            assert_eq!(out.raster.layout(), expected);
        }
    }

    #[test]
    fn cmyk_jpeg_still_honours_exif_orientation() {
        let bytes = with_exif(&cmyk_jpeg(64, 48), 6);
        let out = normalize(&bytes, true).unwrap();
        assert_eq!(out.raster.dimensions(), (48, 64));
        assert_eq!((out.original_width, out.original_height), (48, 64));
        assert_eq!(out.scale_factor, 1.0);
    }

    #[test]
    fn decode_config_per_format() {
        let png = encode_with(sample(), ImageFormat::Png);
        let config = decode_config(&png).unwrap();
        assert_eq!((config.width, config.height, config.format), (40, 30, FormatTag::Png));
        assert_eq!(config.color_model, ColorModel::Rgb);

        let gray_jpeg = jpeg_from_raster(&upright_page(16, 24));
        let config = decode_config(&gray_jpeg).unwrap();
        assert_eq!((config.width, config.height), (16, 24));
        assert_eq!(config.color_model, ColorModel::Gray);

        let bmp = encode_with(sample(), ImageFormat::Bmp);
        assert_eq!(decode_config(&bmp).unwrap().format, FormatTag::Bmp);
    }

    #[test]
    fn normalized_output_encodes_in_every_format() {
        let bytes = encode_with(sample(), ImageFormat::Png);
        let out = normalize(&bytes, true).unwrap();
        for format in ocr_normalize::supported_output_formats() {
            for quality in [None, Some(75)] {
                let encoded = encode(&out.raster, format, quality).unwrap();
                let decoded = image::load_from_memory(&encoded).unwrap();
                assert_eq!((decoded.width(), decoded.height()), (40, 30), "{format:?}");
            }
        }
    }
}
