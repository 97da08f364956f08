//! Sample types for AGC processing
//!
//! The controller is written once against the [`Sample`] trait and runs
//! unchanged on complex baseband ([`IqSample`]) and real (`f32`) streams.
//! A real stream is the degenerate case with a zero quadrature component.

use core::ops;

#[cfg(all(not(feature = "std"), feature = "micromath"))]
#[allow(unused_imports)]
use micromath::F32Ext;

/// A sample the AGC can measure and rescale.
///
/// Only the squared magnitude is needed on the hot path; the gain is
/// applied through `Mul<f32>`.
pub trait Sample: Copy + ops::Mul<f32, Output = Self> {
    /// Additive identity
    const ZERO: Self;

    /// Squared magnitude `|x|²` (instantaneous power)
    fn magnitude_squared(&self) -> f32;

    /// Magnitude `|x|`
    fn magnitude(&self) -> f32 {
        self.magnitude_squared().sqrt()
    }

    /// Every component is finite
    fn is_finite(&self) -> bool;
}

impl Sample for f32 {
    const ZERO: Self = 0.0;

    #[inline]
    fn magnitude_squared(&self) -> f32 {
        self * self
    }

    #[inline]
    fn is_finite(&self) -> bool {
        f32::is_finite(*self)
    }
}

/// IQ sample pair representing complex baseband signal.
///
/// In-phase (I) and Quadrature (Q) components are the real and imaginary
/// parts of the signal.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct IqSample {
    /// In-phase component (real part)
    pub i: f32,
    /// Quadrature component (imaginary part)
    pub q: f32,
}

impl IqSample {
    /// Zero sample.
    pub const ZERO: Self = Self { i: 0.0, q: 0.0 };

    /// Create a new IQ sample.
    #[must_use]
    #[inline]
    pub const fn new(i: f32, q: f32) -> Self {
        Self { i, q }
    }

    /// Create an IQ sample from a real value (Q = 0).
    #[must_use]
    #[inline]
    pub const fn from_real(i: f32) -> Self {
        Self { i, q: 0.0 }
    }

    /// Create a sample from polar form (magnitude, phase in radians).
    #[must_use]
    pub fn from_polar(magnitude: f32, phase: f32) -> Self {
        Self {
            i: magnitude * phase.cos(),
            q: magnitude * phase.sin(),
        }
    }

    /// Calculate magnitude (absolute value).
    #[must_use]
    #[inline]
    pub fn magnitude(&self) -> f32 {
        self.magnitude_squared().sqrt()
    }

    /// Calculate magnitude squared (instantaneous power).
    #[must_use]
    #[inline]
    pub fn magnitude_squared(&self) -> f32 {
        self.i * self.i + self.q * self.q
    }

    /// Scale by a real factor.
    #[must_use]
    #[inline]
    pub fn scale(&self, factor: f32) -> Self {
        Self {
            i: self.i * factor,
            q: self.q * factor,
        }
    }

    /// Both components are finite.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.i.is_finite() && self.q.is_finite()
    }
}

impl ops::Add for IqSample {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self {
            i: self.i + other.i,
            q: self.q + other.q,
        }
    }
}

impl ops::Sub for IqSample {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        Self {
            i: self.i - other.i,
            q: self.q - other.q,
        }
    }
}

impl ops::Mul<f32> for IqSample {
    type Output = Self;

    fn mul(self, factor: f32) -> Self {
        self.scale(factor)
    }
}

impl ops::Mul for IqSample {
    type Output = Self;

    fn mul(self, other: Self) -> Self {
        Self {
            i: self.i * other.i - self.q * other.q,
            q: self.i * other.q + self.q * other.i,
        }
    }
}

impl Sample for IqSample {
    const ZERO: Self = Self::ZERO;

    #[inline]
    fn magnitude_squared(&self) -> f32 {
        IqSample::magnitude_squared(self)
    }

    #[inline]
    fn is_finite(&self) -> bool {
        IqSample::is_finite(self)
    }
}

impl From<f32> for IqSample {
    fn from(i: f32) -> Self {
        Self::from_real(i)
    }
}

#[cfg(feature = "num-complex")]
impl Sample for num_complex::Complex32 {
    const ZERO: Self = num_complex::Complex32::new(0.0, 0.0);

    #[inline]
    fn magnitude_squared(&self) -> f32 {
        self.norm_sqr()
    }

    #[inline]
    fn is_finite(&self) -> bool {
        self.re.is_finite() && self.im.is_finite()
    }
}

#[cfg(feature = "num-complex")]
impl From<num_complex::Complex32> for IqSample {
    fn from(value: num_complex::Complex32) -> Self {
        Self::new(value.re, value.im)
    }
}

#[cfg(feature = "num-complex")]
impl From<IqSample> for num_complex::Complex32 {
    fn from(value: IqSample) -> Self {
        Self::new(value.i, value.q)
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for IqSample {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "({}, {}j)", self.i, self.q);
    }
}
