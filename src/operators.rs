//! Pointwise integrands of variational forms.
//!
//! Assembly evaluates these at the quadrature points of cells and facets.

use crate::{
  expr::VectorExpr,
  fe::{Trace, TracePair},
  flux::InductionFlux,
  mesh::CellIdx,
  space::VectorField,
  Point, Vector2,
};

pub type DofIdx = usize;

#[derive(Debug, Clone, Copy)]
pub struct CellPoint {
  pub icell: CellIdx,
  pub x: Point,
}

#[derive(Debug, Clone, Copy)]
pub struct FacetPoint {
  pub x: Point,
  /// Outward unit normal, of the "+" cell on interior facets.
  pub normal: Vector2,
  /// Cell size, the average over both sides on interior facets.
  pub h: f64,
}

/// A bilinear form $a(B, v)$ given by its integrands.
pub trait BilinearForm {
  fn cell(&self, p: &CellPoint, trial: &Trace, test: &Trace) -> f64;
  fn interior_facet(&self, p: &FacetPoint, trial: &TracePair, test: &TracePair) -> f64;
  fn boundary_facet(&self, p: &FacetPoint, trial: &Trace, test: &Trace) -> f64;
}
impl<F: BilinearForm + ?Sized> BilinearForm for &F {
  fn cell(&self, p: &CellPoint, trial: &Trace, test: &Trace) -> f64 {
    (**self).cell(p, trial, test)
  }
  fn interior_facet(&self, p: &FacetPoint, trial: &TracePair, test: &TracePair) -> f64 {
    (**self).interior_facet(p, trial, test)
  }
  fn boundary_facet(&self, p: &FacetPoint, trial: &Trace, test: &Trace) -> f64 {
    (**self).boundary_facet(p, trial, test)
  }
}

/// A linear form $L(v)$ given by its integrands.
///
/// Interior facets never contribute.
pub trait LinearForm {
  /// Discrete field whose trace is passed to [`LinearForm::cell`].
  fn coefficient(&self) -> Option<&VectorField> {
    None
  }
  fn cell(&self, p: &CellPoint, coeff: &Trace, test: &Trace) -> f64;
  fn boundary_facet(&self, p: &FacetPoint, test: &Trace) -> f64;
}
impl<F: LinearForm + ?Sized> LinearForm for &F {
  fn coefficient(&self) -> Option<&VectorField> {
    (**self).coefficient()
  }
  fn cell(&self, p: &CellPoint, coeff: &Trace, test: &Trace) -> f64 {
    (**self).cell(p, coeff, test)
  }
  fn boundary_facet(&self, p: &FacetPoint, test: &Trace) -> f64 {
    (**self).boundary_facet(p, test)
  }
}

/// $L^2$ inner product $(B, v)$.
#[derive(Debug, Default, Clone, Copy)]
pub struct MassForm;
impl BilinearForm for MassForm {
  fn cell(&self, _: &CellPoint, trial: &Trace, test: &Trace) -> f64 {
    trial.value.dot(&test.value)
  }
  fn interior_facet(&self, _: &FacetPoint, _: &TracePair, _: &TracePair) -> f64 {
    0.0
  }
  fn boundary_facet(&self, _: &FacetPoint, _: &Trace, _: &Trace) -> f64 {
    0.0
  }
}

/// Left hand side of an implicit step, $(B, v) + c F(B, v; 0)$.
///
/// With $c = "dt"$ this is backward Euler, with $c = 2/3 "dt"$ BDF2.
#[derive(Debug)]
pub struct ImplicitStepLhs<'a, U> {
  pub flux: &'a InductionFlux<U>,
  pub coeff: f64,
}
impl<U: VectorExpr> BilinearForm for ImplicitStepLhs<'_, U> {
  fn cell(&self, p: &CellPoint, trial: &Trace, test: &Trace) -> f64 {
    trial.value.dot(&test.value) + self.coeff * self.flux.cell(&p.x, trial, test)
  }
  fn interior_facet(&self, p: &FacetPoint, trial: &TracePair, test: &TracePair) -> f64 {
    self.coeff * self.flux.interior_facet(p, trial, test)
  }
  fn boundary_facet(&self, p: &FacetPoint, trial: &Trace, test: &Trace) -> f64 {
    self.coeff * self.flux.boundary_facet(p, trial, &Vector2::zeros(), test)
  }
}

/// Right hand side of an implicit step, $(K, v) - c F(0, v; g)$.
///
/// `known` is the combination of previous time levels $K$,
/// `boundary` the exterior state $g$ at the new time level.
#[derive(Debug)]
pub struct ImplicitStepRhs<'a, U, G> {
  pub flux: &'a InductionFlux<U>,
  pub coeff: f64,
  pub known: &'a VectorField,
  pub boundary: G,
}
impl<U: VectorExpr, G: VectorExpr> LinearForm for ImplicitStepRhs<'_, U, G> {
  fn coefficient(&self) -> Option<&VectorField> {
    Some(self.known)
  }
  fn cell(&self, _: &CellPoint, coeff: &Trace, test: &Trace) -> f64 {
    coeff.value.dot(&test.value)
  }
  fn boundary_facet(&self, p: &FacetPoint, test: &Trace) -> f64 {
    let g = self.boundary.eval(&p.x);
    -self.coeff * self.flux.boundary_facet(p, &Trace::zero(), &g, test)
  }
}
