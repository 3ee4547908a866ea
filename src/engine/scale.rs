// src/engine/scale.rs
//
// Scale planning: how large the normalized raster should be.
// Default policy caps the image at an A4 page rendered at 150 ppi,
// independent of portrait/landscape orientation.

/// A4 short side (210 mm) at 150 ppi, in pixels (≈1240.16).
pub const A4_SHORT: f64 = 210.0 / 25.4 * 150.0;
/// A4 long side (297 mm) at 150 ppi, in pixels (≈1753.94).
pub const A4_LONG: f64 = 297.0 / 25.4 * 150.0;

/// Scale factors inside this open interval are treated as "no resampling".
pub const NEAR_IDENTITY_LOW: f64 = 0.9;
pub const NEAR_IDENTITY_HIGH: f64 = 1.1;

/// Target dimensions and the factor that produced them.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScalePlan {
    pub width: u32,
    pub height: u32,
    pub scale_factor: f64,
}

impl ScalePlan {
    /// Plan that keeps the source dimensions.
    pub fn identity(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            scale_factor: 1.0,
        }
    }

    pub fn needs_resample(&self) -> bool {
        !is_near_identity(self.scale_factor)
    }
}

/// `true` when `factor` lies strictly within (0.9, 1.1).
pub fn is_near_identity(factor: f64) -> bool {
    factor > NEAR_IDENTITY_LOW && factor < NEAR_IDENTITY_HIGH
}

/// Pluggable scale policy: given source dimensions, decide the target.
///
/// Any `Fn(u32, u32) -> ScalePlan` is a policy, so callers can pass a closure.
pub trait ScalePolicy {
    fn plan(&self, width: u32, height: u32) -> ScalePlan;
}

impl<F> ScalePolicy for F
where
    F: Fn(u32, u32) -> ScalePlan,
{
    fn plan(&self, width: u32, height: u32) -> ScalePlan {
        self(width, height)
    }
}

/// OCR-optimal A4 cap (the default policy).
#[derive(Clone, Copy, Debug, Default)]
pub struct A4Scale;

impl ScalePolicy for A4Scale {
    fn plan(&self, width: u32, height: u32) -> ScalePlan {
        a4_scale(width, height)
    }
}

/// Cap `short = min(w, h)` at [`A4_SHORT`] and `long = max(w, h)` at
/// [`A4_LONG`]; the tighter axis decides the factor. Never upscales.
///
/// Target dimensions are rounded half away from zero and never drop below 1.
/// Undefined for zero-area input; the pipeline rejects those before planning.
pub fn a4_scale(width: u32, height: u32) -> ScalePlan {
    let w = width as f64;
    let h = height as f64;

    let short = w.min(h);
    let long = w.max(h);
    let max_short = short.min(A4_SHORT);
    let max_long = long.min(A4_LONG);

    let short_ratio = max_short / short;
    let long_ratio = max_long / long;
    let scale_factor = short_ratio.min(long_ratio);

    ScalePlan {
        width: ((w * scale_factor).round() as u32).max(1),
        height: ((h * scale_factor).round() as u32).max(1),
        scale_factor,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_a4_constants() {
        assert!((A4_SHORT - 1240.157).abs() < 0.01);
        assert!((A4_LONG - 1753.937).abs() < 0.01);
    }

    #[test]
    fn test_a4_at_300ppi_halves() {
        let plan = a4_scale(2480, 3508);
        assert_eq!((plan.width, plan.height), (1240, 1754));
        assert!((plan.scale_factor - 0.5).abs() < 0.001);
        assert!(plan.needs_resample());
    }

    #[test]
    fn test_landscape_is_symmetric() {
        let portrait = a4_scale(2480, 3508);
        let landscape = a4_scale(3508, 2480);
        assert_eq!(portrait.scale_factor, landscape.scale_factor);
        assert_eq!((landscape.width, landscape.height), (1754, 1240));
    }

    #[test]
    fn test_small_image_untouched() {
        let plan = a4_scale(800, 600);
        assert_eq!(plan, ScalePlan::identity(800, 600));
        assert!(!plan.needs_resample());
    }

    #[test]
    fn test_tighter_axis_wins() {
        // Both sides exceed their caps; the short side needs the larger cut.
        let plan = a4_scale(2000, 1700);
        let expected = A4_SHORT / 1700.0;
        assert!((plan.scale_factor - expected).abs() < 1e-12);
        assert!(plan.width as f64 <= A4_LONG.round());
        assert!(plan.height as f64 <= A4_SHORT.round());
    }

    #[test]
    fn test_extreme_strip_keeps_one_pixel() {
        let plan = a4_scale(100_000, 1);
        assert!(plan.height >= 1);
        assert!(plan.width as f64 <= A4_LONG.round());
    }

    #[test]
    fn test_near_identity_band_is_open() {
        assert!(!is_near_identity(0.9));
        assert!(is_near_identity(0.9001));
        assert!(is_near_identity(1.0));
        assert!(is_near_identity(1.0999));
        assert!(!is_near_identity(1.1));
    }

    #[test]
    fn test_closure_is_a_policy() {
        let half = |w: u32, h: u32| ScalePlan {
            width: w / 2,
            height: h / 2,
            scale_factor: 0.5,
        };
        assert_eq!(half.plan(10, 20).height, 10);
        assert_eq!(A4Scale.plan(10, 20), ScalePlan::identity(10, 20));
    }
}
