use crate::foundation::error::{ReframeError, ReframeResult};

pub use kurbo::{Affine, Point, Rect, Size, Vec2};

/// Timescale used for all durations loaded from source media.
///
/// 600 is divisible by every common frame cadence (24, 25, 30, 60), so frame
/// boundaries stay representable without rounding.
pub const MEDIA_TIMESCALE: i32 = 600;

/// A rational instant or duration: `value / timescale` seconds.
///
/// Kept rational end to end; conversion to `f64` happens only at the edges
/// (encoder argument formatting and progress math).
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct MediaTime {
    /// Number of timescale units.
    pub value: i64,
    /// Units per second; always > 0.
    pub timescale: i32,
}

impl MediaTime {
    /// Create a media time; `timescale` must be positive.
    pub fn new(value: i64, timescale: i32) -> ReframeResult<Self> {
        if timescale <= 0 {
            return Err(ReframeError::validation("MediaTime timescale must be > 0"));
        }
        Ok(Self { value, timescale })
    }

    /// The zero instant at [`MEDIA_TIMESCALE`].
    pub fn zero() -> Self {
        Self {
            value: 0,
            timescale: MEDIA_TIMESCALE,
        }
    }

    /// Convert a floating-point seconds value, rounding to the nearest unit.
    pub fn from_secs_f64(secs: f64, timescale: i32) -> ReframeResult<Self> {
        if timescale <= 0 {
            return Err(ReframeError::validation("MediaTime timescale must be > 0"));
        }
        if !secs.is_finite() {
            return Err(ReframeError::validation(
                "MediaTime seconds must be finite",
            ));
        }
        Ok(Self {
            value: (secs * f64::from(timescale)).round() as i64,
            timescale,
        })
    }

    /// Value in seconds.
    pub fn as_secs_f64(self) -> f64 {
        self.value as f64 / f64::from(self.timescale)
    }

    /// Whether this time is strictly after zero.
    pub fn is_positive(self) -> bool {
        self.value > 0
    }
}

/// A half-open span of media time `[start, start + duration)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct TimeRange {
    /// Range start.
    pub start: MediaTime,
    /// Range length; never negative.
    pub duration: MediaTime,
}

impl TimeRange {
    /// Create a time range; `duration` must not be negative.
    pub fn new(start: MediaTime, duration: MediaTime) -> ReframeResult<Self> {
        if duration.value < 0 {
            return Err(ReframeError::validation(
                "TimeRange duration must not be negative",
            ));
        }
        Ok(Self { start, duration })
    }

    /// The full span of an asset: `[0, duration)`.
    pub fn from_zero(duration: MediaTime) -> ReframeResult<Self> {
        Self::new(MediaTime::new(0, duration.timescale)?, duration)
    }

    /// Range length in seconds.
    pub fn duration_secs(self) -> f64 {
        self.duration.as_secs_f64()
    }

    /// Whether the range covers no time.
    pub fn is_empty(self) -> bool {
        self.duration.value == 0
    }
}

/// Rational frames-per-second.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Fps {
    /// Frame count per `den` seconds.
    pub num: u32,
    /// Denominator; must be > 0.
    pub den: u32,
}

impl Fps {
    /// Create a frame rate; both terms must be non-zero.
    pub fn new(num: u32, den: u32) -> ReframeResult<Self> {
        if den == 0 {
            return Err(ReframeError::validation("Fps den must be > 0"));
        }
        if num == 0 {
            return Err(ReframeError::validation("Fps num must be > 0"));
        }
        Ok(Self { num, den })
    }

    /// Frame rate as a float.
    pub fn as_f64(self) -> f64 {
        f64::from(self.num) / f64::from(self.den)
    }

    /// Duration of one frame in seconds.
    pub fn frame_duration_secs(self) -> f64 {
        f64::from(self.den) / f64::from(self.num)
    }
}

/// Pixel dimensions of a frame or render target.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct PixelSize {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl PixelSize {
    /// Create pixel dimensions.
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Width over height.
    pub fn aspect_ratio(self) -> f64 {
        f64::from(self.width) / f64::from(self.height)
    }

    /// Whether either dimension is zero.
    pub fn is_degenerate(self) -> bool {
        self.width == 0 || self.height == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn media_time_secs_roundtrip() {
        let t = MediaTime::from_secs_f64(4.5, MEDIA_TIMESCALE).unwrap();
        assert_eq!(t.value, 2700);
        assert!((t.as_secs_f64() - 4.5).abs() < 1e-9);
    }

    #[test]
    fn media_time_rejects_bad_timescale() {
        assert!(MediaTime::new(10, 0).is_err());
        assert!(MediaTime::from_secs_f64(1.0, -600).is_err());
        assert!(MediaTime::from_secs_f64(f64::NAN, 600).is_err());
    }

    #[test]
    fn time_range_rejects_negative_duration() {
        let neg = MediaTime::new(-1, 600).unwrap();
        let start = MediaTime::zero();
        assert!(TimeRange::new(start, neg).is_err());
    }

    #[test]
    fn time_range_from_zero_starts_at_zero() {
        let d = MediaTime::new(1800, 600).unwrap();
        let r = TimeRange::from_zero(d).unwrap();
        assert_eq!(r.start.value, 0);
        assert!((r.duration_secs() - 3.0).abs() < 1e-9);
        assert!(!r.is_empty());
    }

    #[test]
    fn fps_validates_terms() {
        assert!(Fps::new(30, 0).is_err());
        assert!(Fps::new(0, 1).is_err());
        let fps = Fps::new(30, 1).unwrap();
        assert!((fps.frame_duration_secs() - 1.0 / 30.0).abs() < 1e-12);
    }

    #[test]
    fn pixel_size_aspect_and_degeneracy() {
        let hd = PixelSize::new(1920, 1080);
        assert!((hd.aspect_ratio() - 16.0 / 9.0).abs() < 1e-12);
        assert!(PixelSize::new(0, 1080).is_degenerate());
        assert!(!hd.is_degenerate());
    }
}
