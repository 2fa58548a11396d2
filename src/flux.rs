//! Weak form of the resistive induction equation.
//!
//! $partial_t B + div(u times.o B - B times.o u) + u div B = -curl(epsilon curl B)$
//!
//! The advective part uses an upwind flux, the resistive curl-curl part a
//! symmetric interior penalty discretization.
//! On interior facets the velocity, the donor values and the normal are taken
//! from the "+" side.

use crate::{
  config::FluxParams,
  expr::VectorExpr,
  fe::{cross, Trace, TracePair},
  operators::{BilinearForm, CellPoint, FacetPoint},
  Point, Vector2,
};

/// Splits the normal velocity into its inflow and outflow parts.
///
/// Returns $(u_n^+, u_n^-) = (max(u_n, 0), min(u_n, 0))$.
pub fn upwind_split(un: f64) -> (f64, f64) {
  (0.5 * (un + un.abs()), 0.5 * (un - un.abs()))
}

#[derive(Debug, Clone)]
pub struct InductionFlux<U> {
  velocity: U,
  params: FluxParams,
}
impl<U: VectorExpr> InductionFlux<U> {
  pub fn new(velocity: U, params: FluxParams) -> Self {
    Self { velocity, params }
  }
  pub fn velocity(&self) -> &U {
    &self.velocity
  }
  pub fn params(&self) -> &FluxParams {
    &self.params
  }

  /// Volume integrand.
  ///
  /// $-(B times.o u - u times.o B) : nabla v + (u dot v) div B + epsilon curl B curl v$
  pub fn cell(&self, x: &Point, b: &Trace, v: &Trace) -> f64 {
    let u = self.velocity.eval(x);
    let mut integrand = u.dot(&v.value) * b.div();
    for i in 0..2 {
      for j in 0..2 {
        let fl = b.value[i] * u[j] - b.value[j] * u[i];
        integrand -= fl * v.grad[(i, j)];
      }
    }
    integrand + self.params.resistivity * b.curl() * v.curl()
  }

  /// Interior facet integrand, `p.normal` is the outward normal of the "+" side.
  pub fn interior_facet(&self, p: &FacetPoint, b: &TracePair, v: &TracePair) -> f64 {
    let n = &p.normal;
    let u = self.velocity.eval(&p.x);
    let (unp, unm) = upwind_split(u.dot(n));

    let jump_b = b.jump_value();
    let jump_v = v.jump_value();
    let flux = unp * b.plus.value + unm * b.minus.value - u * b.avg_value().dot(n);
    let advective = flux.dot(&jump_v) - u.dot(&v.avg_value()) * jump_b.dot(n);

    // avg(n x B) with n taken outward on each side.
    let eps = self.params.resistivity;
    let avg_nxb = 0.5 * cross(n, &jump_b);
    let avg_nxv = 0.5 * cross(n, &jump_v);
    let resistive = -2.0 * eps * b.avg_curl() * avg_nxv - 2.0 * eps * v.avg_curl() * avg_nxb
      + self.params.penalty * eps / p.h * avg_nxb * avg_nxv;

    advective + resistive
  }

  /// Boundary facet integrand with exterior state `g`.
  pub fn boundary_facet(&self, p: &FacetPoint, b: &Trace, g: &Vector2, v: &Trace) -> f64 {
    let n = &p.normal;
    let u = self.velocity.eval(&p.x);
    let (unp, unm) = upwind_split(u.dot(n));

    let flux = unp * b.value + unm * *g - u * b.value.dot(n);
    let advective = flux.dot(&v.value);

    let eps = self.params.resistivity;
    let nxv = cross(n, &v.value);
    let nxdiff = cross(n, &(b.value - g));
    let resistive = -eps * b.curl() * nxv - eps * v.curl() * nxdiff
      + self.params.penalty * eps / p.h * nxdiff * nxv;

    advective + resistive
  }
}

/// The flux as a bilinear form in $(B, v)$, homogeneous exterior state.
impl<U: VectorExpr> BilinearForm for InductionFlux<U> {
  fn cell(&self, p: &CellPoint, trial: &Trace, test: &Trace) -> f64 {
    InductionFlux::cell(self, &p.x, trial, test)
  }
  fn interior_facet(&self, p: &FacetPoint, trial: &TracePair, test: &TracePair) -> f64 {
    InductionFlux::interior_facet(self, p, trial, test)
  }
  fn boundary_facet(&self, p: &FacetPoint, trial: &Trace, test: &Trace) -> f64 {
    InductionFlux::boundary_facet(self, p, trial, &Vector2::zeros(), test)
  }
}

#[cfg(test)]
mod test {
  use super::*;
  use crate::{expr::RigidRotation, Matrix2};
  use approx::assert_relative_eq;

  fn trace(seed: f64) -> Trace {
    Trace::new(
      Vector2::new(seed.sin(), (2.0 * seed).cos()),
      Matrix2::new(seed, -0.5 * seed, 0.3 + seed, 1.0 - seed),
    )
  }

  fn facet_point(normal: Vector2) -> FacetPoint {
    FacetPoint {
      x: Point::new(0.3, -0.6),
      normal,
      h: 0.1,
    }
  }

  #[test]
  fn interior_flux_is_independent_of_side_labels() {
    let flux = InductionFlux::new(RigidRotation, FluxParams::default());
    let b = TracePair::new(trace(0.4), trace(1.7));
    let v = TracePair::new(trace(-0.9), trace(2.3));
    for normal in [Vector2::new(1.0, 0.0), Vector2::new(0.0, 1.0)] {
      let value = flux.interior_facet(&facet_point(normal), &b, &v);
      let swapped = flux.interior_facet(&facet_point(-normal), &b.swapped(), &v.swapped());
      assert_relative_eq!(value, swapped, epsilon = 1e-13);
    }
  }

  #[test]
  fn interior_flux_vanishes_without_jumps() {
    let flux = InductionFlux::new(RigidRotation, FluxParams::default());
    let b = TracePair::new(trace(0.4), trace(0.4));
    let v = TracePair::new(trace(1.1), trace(1.1));
    let value = flux.interior_facet(&facet_point(Vector2::new(1.0, 0.0)), &b, &v);
    assert_relative_eq!(value, 0.0, epsilon = 1e-14);
  }

  #[test]
  fn boundary_flux_splits_into_state_and_data() {
    let flux = InductionFlux::new(RigidRotation, FluxParams::default());
    let p = facet_point(Vector2::new(0.0, -1.0));
    let b = trace(0.8);
    let v = trace(-1.3);
    let g = Vector2::new(0.7, -0.2);
    let full = flux.boundary_facet(&p, &b, &g, &v);
    let state = flux.boundary_facet(&p, &b, &Vector2::zeros(), &v);
    let data = flux.boundary_facet(&p, &Trace::zero(), &g, &v);
    assert_relative_eq!(full, state + data, epsilon = 1e-13);
  }

  #[test]
  fn penalty_controls_tangential_jumps() {
    let still = |_: &Point| Vector2::zeros();
    let params = FluxParams::default();
    let flux = InductionFlux::new(still, params);
    let p = facet_point(Vector2::new(1.0, 0.0));

    // Curl-free traces with a jump in the tangential component.
    let plus = Trace::new(Vector2::new(0.0, 1.0), Matrix2::zeros());
    let b = TracePair::new(plus, Trace::zero());
    let value = flux.interior_facet(&p, &b, &b);
    let expected = params.penalty * params.resistivity / p.h * 0.25;
    assert_relative_eq!(value, expected, epsilon = 1e-14);
    assert!(value > 0.0);

    // Normal jumps are not penalized.
    let plus = Trace::new(Vector2::new(1.0, 0.0), Matrix2::zeros());
    let b = TracePair::new(plus, Trace::zero());
    assert_relative_eq!(flux.interior_facet(&p, &b, &b), 0.0, epsilon = 1e-14);
  }

  #[test]
  fn upwinding_takes_outflow_from_inside() {
    assert_eq!(upwind_split(2.0), (2.0, 0.0));
    assert_eq!(upwind_split(-3.0), (0.0, -3.0));

    // Pure transport, outflow boundary: exterior data is ignored.
    let flux = InductionFlux::new(
      |_: &Point| Vector2::new(1.0, 0.0),
      FluxParams {
        penalty: 50.0,
        resistivity: 0.0,
      },
    );
    let p = facet_point(Vector2::new(1.0, 0.0));
    let b = Trace::new(Vector2::new(0.0, 2.0), Matrix2::zeros());
    let v = Trace::new(Vector2::new(0.0, 1.0), Matrix2::zeros());
    let a = flux.boundary_facet(&p, &b, &Vector2::new(5.0, 5.0), &v);
    let c = flux.boundary_facet(&p, &b, &Vector2::zeros(), &v);
    assert_relative_eq!(a, c, epsilon = 1e-14);
    assert_relative_eq!(a, 2.0, epsilon = 1e-14);
  }
}
