//! Points in the listening plane.

use std::ops::{Add, Div, Mul, Neg, Sub};

use crate::error::{Error, Result};

/// A point (or offset) in the 2D listening plane.
///
/// Units are arbitrary but shared by every entity and by the speed of sound, so a
/// speed of sound in meters per second means positions are in meters.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Vec2 { x, y }
    }

    /// Construct a position, rejecting NaN and infinite coordinates.
    pub fn finite(x: f32, y: f32) -> Result<Self> {
        Vec2::new(x, y).validated()
    }

    /// Return `self` if both coordinates are finite.
    pub fn validated(self) -> Result<Self> {
        if self.is_finite() {
            Ok(self)
        } else {
            Err(Error::InvalidGeometry {
                x: self.x,
                y: self.y,
            })
        }
    }

    #[inline]
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    #[inline]
    pub fn dot(self, other: Vec2) -> f32 {
        self.x * other.x + self.y * other.y
    }

    #[inline]
    pub fn length(self) -> f32 {
        self.dot(self).sqrt()
    }

    #[inline]
    pub fn distance(self, other: Vec2) -> f32 {
        self.squared_distance(other).sqrt()
    }

    /// Squared Euclidean distance; cheaper than [`Vec2::distance`] when only an ordering
    /// or a later square root is needed.
    #[inline]
    pub fn squared_distance(self, other: Vec2) -> f32 {
        let diff = self - other;
        diff.dot(diff)
    }
}

impl From<[f32; 2]> for Vec2 {
    fn from(p: [f32; 2]) -> Self {
        Vec2::new(p[0], p[1])
    }
}

impl From<Vec2> for [f32; 2] {
    fn from(p: Vec2) -> Self {
        [p.x, p.y]
    }
}

impl Add for Vec2 {
    type Output = Vec2;

    fn add(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Vec2 {
    type Output = Vec2;

    fn sub(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Neg for Vec2 {
    type Output = Vec2;

    fn neg(self) -> Vec2 {
        Vec2::new(-self.x, -self.y)
    }
}

impl Mul<f32> for Vec2 {
    type Output = Vec2;

    fn mul(self, s: f32) -> Vec2 {
        Vec2::new(self.x * s, self.y * s)
    }
}

impl Div<f32> for Vec2 {
    type Output = Vec2;

    fn div(self, s: f32) -> Vec2 {
        Vec2::new(self.x / s, self.y / s)
    }
}

/// Anything that occupies a point in the listening plane.
///
/// Only reading is shared; each entity decides how it is moved, since moving a
/// listener also moves its ears.
pub trait Spatial {
    fn position(&self) -> Vec2;

    fn distance<S: Spatial + ?Sized>(&self, other: &S) -> f32 {
        self.position().distance(other.position())
    }

    fn squared_distance<S: Spatial + ?Sized>(&self, other: &S) -> f32 {
        self.position().squared_distance(other.position())
    }
}

impl Spatial for Vec2 {
    fn position(&self) -> Vec2 {
        *self
    }
}
