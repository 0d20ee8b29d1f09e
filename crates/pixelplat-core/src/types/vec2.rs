use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign, Div, DivAssign, Mul, MulAssign, Neg, Sub, SubAssign};

use super::Point2;

/// A 2D vector with x and y components.
/// Positions and speeds in the physics core are kept as doubles.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

impl Vec2 {
    /// All zeroes.
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    /// Creates a new Vec2 with the given x and y components.
    #[inline]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Computes the length (magnitude) of the vector.
    #[inline]
    pub fn length(self) -> f64 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    /// Computes the squared length of the vector.
    /// Faster than `length()` when you only need to compare lengths.
    #[inline]
    pub fn length_squared(self) -> f64 {
        self.x * self.x + self.y * self.y
    }

    /// Computes the dot product of two vectors.
    #[inline]
    pub fn dot(self, other: Self) -> f64 {
        self.x * other.x + self.y * other.y
    }

    /// Linearly interpolates between two vectors.
    #[inline]
    pub fn lerp(self, other: Self, t: f64) -> Self {
        Self {
            x: self.x + (other.x - self.x) * t,
            y: self.y + (other.y - self.y) * t,
        }
    }

    /// Pixel coordinates of the vector, derived with `floor` so that the
    /// sign conventions stay uniform on both sides of the origin.
    #[inline]
    pub fn to_point(self) -> Point2 {
        Point2::new(self.x.floor() as i32, self.y.floor() as i32)
    }
}

/// Convenience constructor matching `Vec2::new`.
#[inline]
pub const fn vec2(x: f64, y: f64) -> Vec2 {
    Vec2::new(x, y)
}

impl Add for Vec2 {
    type Output = Self;
    #[inline]
    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl AddAssign for Vec2 {
    #[inline]
    fn add_assign(&mut self, rhs: Self) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl Sub for Vec2 {
    type Output = Self;
    #[inline]
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl SubAssign for Vec2 {
    #[inline]
    fn sub_assign(&mut self, rhs: Self) {
        self.x -= rhs.x;
        self.y -= rhs.y;
    }
}

impl Mul<f64> for Vec2 {
    type Output = Self;
    #[inline]
    fn mul(self, rhs: f64) -> Self {
        Self::new(self.x * rhs, self.y * rhs)
    }
}

impl MulAssign<f64> for Vec2 {
    #[inline]
    fn mul_assign(&mut self, rhs: f64) {
        self.x *= rhs;
        self.y *= rhs;
    }
}

impl Div<f64> for Vec2 {
    type Output = Self;
    #[inline]
    fn div(self, rhs: f64) -> Self {
        Self::new(self.x / rhs, self.y / rhs)
    }
}

impl DivAssign<f64> for Vec2 {
    #[inline]
    fn div_assign(&mut self, rhs: f64) {
        self.x /= rhs;
        self.y /= rhs;
    }
}

impl Neg for Vec2 {
    type Output = Self;
    #[inline]
    fn neg(self) -> Self {
        Self::new(-self.x, -self.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vec2_arithmetic() {
        let a = vec2(1.0, 2.0);
        let b = vec2(3.0, -4.0);
        assert_eq!(a + b, vec2(4.0, -2.0));
        assert_eq!(a - b, vec2(-2.0, 6.0));
        assert_eq!(a * 2.0, vec2(2.0, 4.0));
        assert_eq!(b / 2.0, vec2(1.5, -2.0));
        assert_eq!(-a, vec2(-1.0, -2.0));
    }

    #[test]
    fn test_vec2_length() {
        let v = vec2(3.0, 4.0);
        assert_eq!(v.length(), 5.0);
        assert_eq!(v.length_squared(), 25.0);
    }

    #[test]
    fn test_vec2_lerp() {
        let a = vec2(0.0, 0.0);
        let b = vec2(10.0, 20.0);
        assert_eq!(a.lerp(b, 0.5), vec2(5.0, 10.0));
    }

    #[test]
    fn test_to_point_uses_floor() {
        assert_eq!(vec2(1.9, -0.1).to_point(), Point2::new(1, -1));
        assert_eq!(vec2(-1.5, 2.0).to_point(), Point2::new(-2, 2));
    }
}
