// src/math.rs

//! Small vector type and the shader-style scalar helpers the field code relies on.
//!
//! The helpers mirror GLSL semantics exactly (`sign(0) == 0`, `fract` is
//! `x - floor(x)`, rounding is half-up), because the level-crossing logic
//! depends on them bit for bit.

use std::ops::{Add, AddAssign, Div, Mul, Neg, Sub};

/// A 3-component `f32` vector.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);
    pub const X: Self = Self::new(1.0, 0.0, 0.0);
    pub const Y: Self = Self::new(0.0, 1.0, 0.0);
    pub const Z: Self = Self::new(0.0, 0.0, 1.0);

    #[inline(always)]
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    #[inline(always)]
    pub fn splat(v: f32) -> Self {
        Self::new(v, v, v)
    }

    #[inline(always)]
    pub fn dot(self, other: Self) -> f32 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    #[inline(always)]
    pub fn cross(self, other: Self) -> Self {
        Self::new(
            self.y * other.z - self.z * other.y,
            self.z * other.x - self.x * other.z,
            self.x * other.y - self.y * other.x,
        )
    }

    #[inline(always)]
    pub fn length_squared(self) -> f32 {
        self.dot(self)
    }

    #[inline(always)]
    pub fn length(self) -> f32 {
        self.length_squared().sqrt()
    }

    /// Unit vector in the same direction, or `None` when the length is too
    /// small (or not finite) to divide by.
    #[inline]
    pub fn try_normalize(self, min_length: f32) -> Option<Self> {
        let len = self.length();
        if len.is_finite() && len > min_length {
            Some(self * (1.0 / len))
        } else {
            None
        }
    }

    /// Unit vector; the zero vector maps to itself.
    #[inline]
    pub fn normalize(self) -> Self {
        self.try_normalize(0.0).unwrap_or(Self::ZERO)
    }

    #[inline(always)]
    pub fn map(self, f: impl Fn(f32) -> f32) -> Self {
        Self::new(f(self.x), f(self.y), f(self.z))
    }

    #[inline(always)]
    pub fn lerp(self, other: Self, t: f32) -> Self {
        self + (other - self) * t
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

impl Add for Vec3 {
    type Output = Self;
    #[inline(always)]
    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl AddAssign for Vec3 {
    #[inline(always)]
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Sub for Vec3 {
    type Output = Self;
    #[inline(always)]
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul<f32> for Vec3 {
    type Output = Self;
    #[inline(always)]
    fn mul(self, rhs: f32) -> Self {
        Self::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

impl Div<f32> for Vec3 {
    type Output = Self;
    #[inline(always)]
    fn div(self, rhs: f32) -> Self {
        Self::new(self.x / rhs, self.y / rhs, self.z / rhs)
    }
}

impl Neg for Vec3 {
    type Output = Self;
    #[inline(always)]
    fn neg(self) -> Self {
        Self::new(-self.x, -self.y, -self.z)
    }
}

/// GLSL `sign`: -1, 0 or 1. Unlike `f32::signum`, zero maps to zero.
#[inline(always)]
pub fn sign(x: f32) -> f32 {
    if x > 0.0 {
        1.0
    } else if x < 0.0 {
        -1.0
    } else {
        0.0
    }
}

/// GLSL `fract`: `x - floor(x)`, always in `[0, 1)` for finite input.
#[inline(always)]
pub fn fract(x: f32) -> f32 {
    x - x.floor()
}

/// Nearest integer with halves rounded up (`floor(x + 0.5)`).
#[inline(always)]
pub fn round_half_up(x: f32) -> f32 {
    (x + 0.5).floor()
}

/// Distance from `x` to the nearest integer level.
#[inline(always)]
pub fn level_distance(x: f32) -> f32 {
    (x - round_half_up(x)).abs()
}

/// GLSL `reflect`: `i - 2·dot(n, i)·n` for a unit normal `n`.
#[inline(always)]
pub fn reflect(i: Vec3, n: Vec3) -> Vec3 {
    i - n * (2.0 * n.dot(i))
}
