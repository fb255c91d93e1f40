//! Exact frame rates.
//!
//! Container frame rates are rationals (29.97 fps is `30000/1001`), so
//! [`FrameRate`] keeps the numerator and denominator instead of a float.
//! Frame selection and GIF delays are computed from these integers, which
//! keeps long videos free of accumulated rounding error.

use std::fmt::{Display, Formatter, Result as FmtResult};

use ffmpeg_next::Rational;

use crate::error::GifMakerError;

/// A strictly positive frame rate expressed as `numerator / denominator`
/// frames per second.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameRate {
    numerator: u32,
    denominator: u32,
}

impl FrameRate {
    /// Create a frame rate of `numerator / denominator` frames per second.
    ///
    /// # Errors
    ///
    /// Returns [`GifMakerError::InvalidFrameRate`] if either part is zero.
    pub fn new(numerator: u32, denominator: u32) -> Result<Self, GifMakerError> {
        if numerator == 0 || denominator == 0 {
            return Err(GifMakerError::InvalidFrameRate);
        }
        Ok(Self {
            numerator,
            denominator,
        })
    }

    /// Create a whole-number frame rate.
    pub fn from_fps(fps: u32) -> Result<Self, GifMakerError> {
        Self::new(fps, 1)
    }

    /// Convert an FFmpeg rational, returning `None` for zero or negative
    /// rates (FFmpeg reports `0/0` when a stream has no declared rate).
    pub fn from_rational(rational: Rational) -> Option<Self> {
        let numerator = u32::try_from(rational.numerator()).ok()?;
        let denominator = u32::try_from(rational.denominator()).ok()?;
        Self::new(numerator, denominator).ok()
    }

    pub fn numerator(&self) -> u32 {
        self.numerator
    }

    pub fn denominator(&self) -> u32 {
        self.denominator
    }

    /// Frames per second as a float, for display and logging.
    pub fn as_f64(&self) -> f64 {
        self.numerator as f64 / self.denominator as f64
    }

    /// The slower of `self` and `limit`, compared exactly.
    pub fn capped_at(self, limit: FrameRate) -> FrameRate {
        let own = self.numerator as u64 * limit.denominator as u64;
        let other = limit.numerator as u64 * self.denominator as u64;
        if own <= other { self } else { limit }
    }

    /// Timestamp of frame `index` in hundredths of a second, rounded to the
    /// nearest centisecond.
    pub(crate) fn centiseconds_at(&self, index: u64) -> u64 {
        let numerator = index as u128 * 100 * self.denominator as u128;
        let denominator = self.numerator as u128;
        ((2 * numerator + denominator) / (2 * denominator)) as u64
    }
}

impl Default for FrameRate {
    /// 15 fps, the rate GIFs are written at unless configured otherwise.
    fn default() -> Self {
        Self {
            numerator: 15,
            denominator: 1,
        }
    }
}

impl Display for FrameRate {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        if self.denominator == 1 {
            write!(f, "{} fps", self.numerator)
        } else {
            write!(f, "{:.3} fps", self.as_f64())
        }
    }
}
