use crate::mesh::Rect;

use std::f64::consts::FRAC_PI_2;

/// Parameters of the numerical flux.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FluxParams {
  /// Interior penalty constant $C_1$.
  ///
  /// Has to be large enough for the resistive part to be coercive.
  /// This is assumed, not checked.
  pub penalty: f64,
  /// Magnetic resistivity $epsilon$.
  pub resistivity: f64,
}
impl Default for FluxParams {
  fn default() -> Self {
    Self {
      penalty: 50.0,
      resistivity: 1e-4,
    }
  }
}

/// Physical and discretization parameters of one induction run.
#[derive(Debug, Clone, PartialEq)]
pub struct InductionConfig {
  pub flux: FluxParams,
  pub domain: Rect,
  /// Final time $T$.
  pub horizon: f64,
  /// Target ratio $"dt" / h$ before rounding to a whole number of steps.
  pub cfl: f64,
}
impl Default for InductionConfig {
  fn default() -> Self {
    Self {
      flux: FluxParams::default(),
      domain: Rect::new_symmetric_square(),
      horizon: FRAC_PI_2,
      cfl: 0.5,
    }
  }
}
