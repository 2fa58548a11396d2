//! Gauss-Legendre quadrature on the reference interval and square.

use std::f64::consts::PI;

/// Legendre polynomial $P_n$ and its derivative at `x`.
pub fn legendre(n: usize, x: f64) -> (f64, f64) {
  let mut p_prev = 0.0;
  let mut p = 1.0;
  let mut dp = 0.0;
  for k in 0..n {
    let kf = k as f64;
    let p_next = ((2.0 * kf + 1.0) * x * p - kf * p_prev) / (kf + 1.0);
    let dp_next = (kf + 1.0) * p + x * dp;
    p_prev = p;
    p = p_next;
    dp = dp_next;
  }
  (p, dp)
}

/// A quadrature rule on the reference interval $[-1,1]$.
#[derive(Debug, Clone)]
pub struct QuadRule {
  nodes: Vec<f64>,
  weights: Vec<f64>,
}
impl QuadRule {
  /// Gauss-Legendre rule with `npoints` nodes.
  ///
  /// Exact for polynomials up to degree $2 n - 1$.
  pub fn gauss_legendre(npoints: usize) -> Self {
    assert!(npoints > 0, "Quadrature rule needs at least one point.");
    const TOL: f64 = 1e-15;
    const MAX_NEWTON: usize = 100;

    let n = npoints as f64;
    let mut nodes = vec![0.0; npoints];
    let mut weights = vec![0.0; npoints];
    for i in 0..npoints {
      // Initial guess from the asymptotic distribution of the roots.
      let mut x = -(PI * (i as f64 + 0.75) / (n + 0.5)).cos();
      for _ in 0..MAX_NEWTON {
        let (p, dp) = legendre(npoints, x);
        let dx = p / dp;
        x -= dx;
        if dx.abs() < TOL {
          break;
        }
      }
      let (_, dp) = legendre(npoints, x);
      nodes[i] = x;
      weights[i] = 2.0 / ((1.0 - x * x) * dp * dp);
    }
    Self { nodes, weights }
  }

  pub fn npoints(&self) -> usize {
    self.nodes.len()
  }
  pub fn nodes(&self) -> &[f64] {
    &self.nodes
  }
  pub fn weights(&self) -> &[f64] {
    &self.weights
  }

  pub fn apply<F>(&self, f: F) -> f64
  where
    F: Fn(f64) -> f64,
  {
    self
      .nodes
      .iter()
      .zip(self.weights.iter())
      .map(|(&x, &w)| w * f(x))
      .sum()
  }
}

/// Tensor-product rule on the reference square $[-1,1]^2$.
///
/// Points are ordered with the first coordinate running fastest.
#[derive(Debug, Clone)]
pub struct TensorQuadRule {
  nodes: Vec<[f64; 2]>,
  weights: Vec<f64>,
}
impl TensorQuadRule {
  pub fn gauss_legendre(npoints_axis: usize) -> Self {
    Self::from_1d(&QuadRule::gauss_legendre(npoints_axis))
  }

  pub fn from_1d(rule: &QuadRule) -> Self {
    let n = rule.npoints();
    let mut nodes = Vec::with_capacity(n * n);
    let mut weights = Vec::with_capacity(n * n);
    for j in 0..n {
      for i in 0..n {
        nodes.push([rule.nodes[i], rule.nodes[j]]);
        weights.push(rule.weights[i] * rule.weights[j]);
      }
    }
    Self { nodes, weights }
  }

  pub fn npoints(&self) -> usize {
    self.nodes.len()
  }
  pub fn nodes(&self) -> &[[f64; 2]] {
    &self.nodes
  }
  pub fn weights(&self) -> &[f64] {
    &self.weights
  }

  pub fn apply<F>(&self, f: F) -> f64
  where
    F: Fn([f64; 2]) -> f64,
  {
    self
      .nodes
      .iter()
      .zip(self.weights.iter())
      .map(|(&x, &w)| w * f(x))
      .sum()
  }
}

#[cfg(test)]
mod test {
  use super::*;
  use approx::assert_relative_eq;

  #[test]
  fn legendre_closed_forms() {
    for x in [-1.0, -0.4, 0.0, 0.7, 1.0] {
      let (p2, dp2) = legendre(2, x);
      assert_relative_eq!(p2, 0.5 * (3.0 * x * x - 1.0), epsilon = 1e-14);
      assert_relative_eq!(dp2, 3.0 * x, epsilon = 1e-14);
      let (p3, dp3) = legendre(3, x);
      assert_relative_eq!(p3, 0.5 * (5.0 * x * x * x - 3.0 * x), epsilon = 1e-14);
      assert_relative_eq!(dp3, 0.5 * (15.0 * x * x - 3.0), epsilon = 1e-14);
    }
  }

  #[test]
  fn weights_sum_to_interval_length() {
    for n in 1..=12 {
      let rule = QuadRule::gauss_legendre(n);
      assert_relative_eq!(rule.weights().iter().sum::<f64>(), 2.0, epsilon = 1e-13);
      assert!(rule.nodes().windows(2).all(|w| w[0] < w[1]));
    }
  }

  #[test]
  fn exact_for_polynomials() {
    for n in 1..=8 {
      let rule = QuadRule::gauss_legendre(n);
      for p in 0..2 * n {
        let exact = if p % 2 == 0 {
          2.0 / (p + 1) as f64
        } else {
          0.0
        };
        let approx = rule.apply(|x| x.powi(p as i32));
        assert_relative_eq!(approx, exact, epsilon = 1e-13);
      }
    }
  }

  #[test]
  fn tensor_rule_integrates_monomials() {
    let rule = TensorQuadRule::gauss_legendre(3);
    assert_eq!(rule.npoints(), 9);
    let approx = rule.apply(|[x, y]| x * x * y * y * y * y);
    assert_relative_eq!(approx, 2.0 / 3.0 * 2.0 / 5.0, epsilon = 1e-14);
  }
}
