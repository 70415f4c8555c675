// src/field.rs

//! The `ScalarField` abstraction evaluated by the surface locator and the
//! field-line tracer.
//!
//! Gradients are central finite differences. The difference is deliberately
//! NOT divided by `2 * FD_EPS`: every consumer normalizes it, and keeping the
//! raw difference reproduces the original rendering exactly. Use
//! [`ScalarField::derivative`] when the true slope is needed.

use crate::math::Vec3;

/// Finite-difference step, also the iso-level hit tolerance.
pub const FD_EPS: f32 = 0.01;

/// Gradients shorter than this have no usable direction.
pub const MIN_GRADIENT: f32 = 1e-12;

/// A continuous scalar field over 3D space.
pub trait ScalarField {
    /// Field value at `p`.
    fn evaluate(&self, p: Vec3) -> f32;

    /// Unnormalized central difference: `f(p + ε·axis) - f(p - ε·axis)` per axis.
    fn gradient(&self, p: Vec3) -> Vec3 {
        let axis = |dir: Vec3| self.evaluate(p + dir * FD_EPS) - self.evaluate(p - dir * FD_EPS);
        Vec3::new(axis(Vec3::X), axis(Vec3::Y), axis(Vec3::Z))
    }

    /// Central-difference estimate of the true gradient.
    fn derivative(&self, p: Vec3) -> Vec3 {
        self.gradient(p) / (2.0 * FD_EPS)
    }

    /// Unit surface normal, `None` where the gradient vanishes.
    fn normal(&self, p: Vec3) -> Option<Vec3> {
        self.gradient(p).try_normalize(MIN_GRADIENT)
    }
}

impl<F: ScalarField + ?Sized> ScalarField for &F {
    fn evaluate(&self, p: Vec3) -> f32 {
        (**self).evaluate(p)
    }
}

/// Adapts any closure into a field. Mostly useful for synthetic test fields.
#[derive(Clone, Copy)]
pub struct FnField<F>(pub F);

impl<F: Fn(Vec3) -> f32> ScalarField for FnField<F> {
    fn evaluate(&self, p: Vec3) -> f32 {
        (self.0)(p)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gradient_keeps_raw_difference_scale() {
        let field = FnField(|p: Vec3| 3.0 * p.x);
        let g = field.gradient(Vec3::new(1.0, 2.0, 3.0));
        // 3 * 2ε
        assert!((g.x - 0.06).abs() < 1e-5, "got {:?}", g);
        assert_eq!(g.y, 0.0);
        let d = field.derivative(Vec3::new(1.0, 2.0, 3.0));
        assert!((d.x - 3.0).abs() < 1e-3);
    }

    #[test]
    fn constant_field_has_no_normal() {
        let field = FnField(|_p: Vec3| 0.25);
        assert_eq!(field.normal(Vec3::new(0.5, 0.5, 0.5)), None);
    }

    #[test]
    fn normal_points_up_the_slope() {
        let field = FnField(|p: Vec3| p.y * p.y);
        let n = field.normal(Vec3::new(0.0, 2.0, 0.0)).unwrap();
        assert!((n.y - 1.0).abs() < 1e-5);
    }
}
