//! Analytic vector fields: the transport velocity and the exact solution.

use crate::{Point, Vector2};

/// A vector-valued function of the plane.
pub trait VectorExpr {
  fn eval(&self, x: &Point) -> Vector2;
}
impl<F> VectorExpr for F
where
  F: Fn(&Point) -> Vector2,
{
  fn eval(&self, x: &Point) -> Vector2 {
    self(x)
  }
}

/// Rigid rotation $u = (-y, x)$ about the origin.
#[derive(Debug, Default, Clone, Copy)]
pub struct RigidRotation;
impl VectorExpr for RigidRotation {
  fn eval(&self, x: &Point) -> Vector2 {
    Vector2::new(-x.y, x.x)
  }
}

/// Divergence-free Gaussian hump transported by [`RigidRotation`].
///
/// $B(x, t) = 4 (-y + 1/2 sin t, x - 1/2 cos t) exp(-20 |x - c(t)|^2)$
/// with center $c(t) = 1/2 (cos t, sin t)$.
///
/// Serves as initial condition, boundary data and exact solution.
/// The time is fixed at construction, a new value is built for every time level.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RotatingHump {
  time: f64,
}
impl RotatingHump {
  const AMPLITUDE: f64 = 4.0;
  const DECAY: f64 = 20.0;
  const RADIUS: f64 = 0.5;

  pub fn at(time: f64) -> Self {
    Self { time }
  }
  pub fn time(&self) -> f64 {
    self.time
  }
  pub fn center(&self) -> Point {
    Self::RADIUS * Point::new(self.time.cos(), self.time.sin())
  }
}
impl VectorExpr for RotatingHump {
  fn eval(&self, x: &Point) -> Vector2 {
    let c = self.center();
    let envelope = Self::AMPLITUDE * (-Self::DECAY * (x - c).norm_squared()).exp();
    envelope * Vector2::new(-(x.y - c.y), x.x - c.x)
  }
}
