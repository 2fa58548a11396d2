//! Capabilities the time integrator needs from the discretization.

use crate::{
  assemble::{assemble_galmat, assemble_galvec, GalMat, GalVec},
  error::SolveError,
  expr::VectorExpr,
  linalg::FaerLu,
  mesh::CartesianMesh,
  operators::{BilinearForm, LinearForm},
  space::{DgSpace, VectorField},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NormKind {
  L2,
  /// $L^2$ norm of the cell-wise divergence.
  DivergenceL2,
}

pub trait FeBackend {
  type Factorization;

  fn space(&self) -> &DgSpace;

  fn assemble_bilinear<F: BilinearForm>(&self, form: F) -> GalMat;
  fn assemble_linear<F: LinearForm>(&self, form: F) -> GalVec;
  fn factorize(&self, galmat: GalMat) -> Result<Self::Factorization, SolveError>;
  fn solve(&self, factorization: &Self::Factorization, galvec: &GalVec)
    -> Result<VectorField, SolveError>;

  fn interpolate<E: VectorExpr>(&self, expr: &E) -> VectorField;
  fn norm(&self, field: &VectorField, kind: NormKind) -> f64;
  fn error_norm<E: VectorExpr>(&self, field: &VectorField, exact: &E) -> f64;

  /// Factorize, solve once and drop the factorization.
  fn solve_once(&self, galmat: GalMat, galvec: &GalVec) -> Result<VectorField, SolveError> {
    let factorization = self.factorize(galmat)?;
    self.solve(&factorization, galvec)
  }
}

/// Discontinuous Galerkin backend with a sparse direct solver.
#[derive(Debug, Clone)]
pub struct DgBackend {
  space: DgSpace,
}
impl DgBackend {
  pub fn new(space: DgSpace) -> Self {
    Self { space }
  }
  pub fn from_mesh(mesh: CartesianMesh, degree: usize) -> Self {
    Self::new(DgSpace::new(mesh, degree))
  }
}
impl FeBackend for DgBackend {
  type Factorization = FaerLu;

  fn space(&self) -> &DgSpace {
    &self.space
  }

  fn assemble_bilinear<F: BilinearForm>(&self, form: F) -> GalMat {
    assemble_galmat(&self.space, form)
  }
  fn assemble_linear<F: LinearForm>(&self, form: F) -> GalVec {
    assemble_galvec(&self.space, form)
  }

  fn factorize(&self, galmat: GalMat) -> Result<FaerLu, SolveError> {
    FaerLu::new(nas::CscMatrix::from(&galmat))
  }
  fn solve(&self, factorization: &FaerLu, galvec: &GalVec) -> Result<VectorField, SolveError> {
    factorization.solve(galvec).map(VectorField::new)
  }

  fn interpolate<E: VectorExpr>(&self, expr: &E) -> VectorField {
    self.space.interpolate(expr)
  }
  fn norm(&self, field: &VectorField, kind: NormKind) -> f64 {
    match kind {
      NormKind::L2 => self.space.l2_norm(field),
      NormKind::DivergenceL2 => self.space.div_l2_norm(field),
    }
  }
  fn error_norm<E: VectorExpr>(&self, field: &VectorField, exact: &E) -> f64 {
    self.space.l2_error(field, exact)
  }
}
