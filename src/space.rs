//! Broken vector-valued polynomial space on a Cartesian mesh.

use crate::{
  expr::VectorExpr,
  fe::{BasisTable, RefElement, Trace},
  mesh::{CartesianMesh, CellGeometry, CellIdx},
  operators::DofIdx,
  Vector2,
};

use std::ops::Range;

/// Discrete vector field, coefficients with respect to the basis of a [`DgSpace`].
#[derive(Debug, Clone, PartialEq)]
pub struct VectorField {
  coeffs: na::DVector<f64>,
}
impl VectorField {
  pub fn new(coeffs: na::DVector<f64>) -> Self {
    Self { coeffs }
  }
  pub fn zeros(ndofs: usize) -> Self {
    Self::new(na::DVector::zeros(ndofs))
  }

  /// $a x + b y$
  pub fn linear_combination(a: f64, x: &Self, b: f64, y: &Self) -> Self {
    Self::new(a * &x.coeffs + b * &y.coeffs)
  }

  pub fn coeffs(&self) -> &na::DVector<f64> {
    &self.coeffs
  }
  pub fn coeffs_mut(&mut self) -> &mut na::DVector<f64> {
    &mut self.coeffs
  }
  pub fn into_coeffs(self) -> na::DVector<f64> {
    self.coeffs
  }
  pub fn ndofs(&self) -> usize {
    self.coeffs.len()
  }
}
impl std::ops::Sub for &VectorField {
  type Output = VectorField;
  fn sub(self, rhs: Self) -> VectorField {
    VectorField::new(&self.coeffs - &rhs.coeffs)
  }
}

/// Discontinuous $Q_k^2$ space.
///
/// Dofs are ordered by cell, then by component, then by scalar basis function.
#[derive(Debug, Clone)]
pub struct DgSpace {
  mesh: CartesianMesh,
  refelem: RefElement,
  /// Element with a finer rule for projections and norms.
  fine_elem: RefElement,
}
impl DgSpace {
  pub fn new(mesh: CartesianMesh, degree: usize) -> Self {
    Self {
      mesh,
      refelem: RefElement::new(degree),
      fine_elem: RefElement::with_quad_points(degree, degree + 4),
    }
  }

  pub fn mesh(&self) -> &CartesianMesh {
    &self.mesh
  }
  pub fn refelem(&self) -> &RefElement {
    &self.refelem
  }
  pub fn degree(&self) -> usize {
    self.refelem.degree()
  }
  pub fn ndofs_local(&self) -> usize {
    self.refelem.ndofs()
  }
  pub fn ndofs(&self) -> usize {
    self.mesh.ncells() * self.ndofs_local()
  }
  pub fn dofs(&self, icell: CellIdx) -> Range<DofIdx> {
    let n = self.ndofs_local();
    icell * n..(icell + 1) * n
  }

  pub fn zeros(&self) -> VectorField {
    VectorField::zeros(self.ndofs())
  }

  pub fn local_coeffs<'a>(
    &self,
    field: &'a VectorField,
    icell: CellIdx,
  ) -> na::DVectorView<'a, f64> {
    let dofs = self.dofs(icell);
    field.coeffs.rows(dofs.start, dofs.len())
  }

  /// Trace of `field` at a point tabulated in `table`.
  pub fn field_trace(
    &self,
    field: &VectorField,
    table: &BasisTable,
    cell: &CellGeometry,
    ipoint: usize,
  ) -> Trace {
    self
      .refelem
      .field_trace(table, cell, ipoint, self.local_coeffs(field, cell.idx))
  }

  /// Cell-wise $L^2$ projection of an analytic field.
  ///
  /// The basis is orthonormal on the reference cell,
  /// so every coefficient is a single quadrature sum.
  pub fn interpolate(&self, expr: &impl VectorExpr) -> VectorField {
    let quad = self.fine_elem.cell_quad();
    let table = self.fine_elem.cell_table();
    let nbasis = self.refelem.nbasis();

    let mut field = self.zeros();
    for cell in self.mesh.cells() {
      let values: Vec<Vector2> = quad
        .nodes()
        .iter()
        .map(|&xi| expr.eval(&cell.ref2phys(xi)))
        .collect();
      let offset = self.dofs(cell.idx).start;
      for comp in 0..2 {
        for ibasis in 0..nbasis {
          let coeff: f64 = (0..quad.npoints())
            .map(|q| quad.weights()[q] * table.value(ibasis, q) * values[q][comp])
            .sum();
          field.coeffs[offset + comp * nbasis + ibasis] = coeff;
        }
      }
    }
    field
  }

  /// Value of `field` at reference coordinates `xi` of a cell.
  pub fn evaluate(&self, field: &VectorField, icell: CellIdx, xi: [f64; 2]) -> Vector2 {
    let table = BasisTable::tabulate(self.degree(), &[xi]);
    let cell = self.mesh.cell(icell);
    self
      .refelem
      .field_trace(&table, &cell, 0, self.local_coeffs(field, icell))
      .value
  }

  /// Values at the cell corners, counter-clockwise from the lower-left one.
  ///
  /// Neighbouring cells generally disagree on shared vertices.
  pub fn cell_vertex_values(&self, field: &VectorField) -> Vec<[Vector2; 4]> {
    let corners = [[-1.0, -1.0], [1.0, -1.0], [1.0, 1.0], [-1.0, 1.0]];
    let table = BasisTable::tabulate(self.degree(), &corners);
    self
      .mesh
      .cells()
      .map(|cell| {
        let local = self.local_coeffs(field, cell.idx);
        std::array::from_fn(|i| {
          self
            .refelem
            .field_trace(&table, &cell, i, local)
            .value
        })
      })
      .collect()
  }

  fn integrate_cells<F>(&self, field: &VectorField, integrand: F) -> f64
  where
    F: Fn(&CellGeometry, [f64; 2], &Trace) -> f64,
  {
    let quad = self.fine_elem.cell_quad();
    let table = self.fine_elem.cell_table();
    self
      .mesh
      .cells()
      .map(|cell| {
        let local = self.local_coeffs(field, cell.idx);
        let sum: f64 = (0..quad.npoints())
          .map(|q| {
            let trace = self.fine_elem.field_trace(table, &cell, q, local);
            quad.weights()[q] * integrand(&cell, quad.nodes()[q], &trace)
          })
          .sum();
        cell.det_jacobian() * sum
      })
      .sum()
  }

  pub fn l2_norm(&self, field: &VectorField) -> f64 {
    self
      .integrate_cells(field, |_, _, trace| trace.value.norm_squared())
      .sqrt()
  }

  /// $L^2$ norm of the cell-wise divergence.
  pub fn div_l2_norm(&self, field: &VectorField) -> f64 {
    self
      .integrate_cells(field, |_, _, trace| trace.div().powi(2))
      .sqrt()
  }

  /// $norm(B_h - B)_(L^2)$ against an analytic field.
  pub fn l2_error(&self, field: &VectorField, exact: &impl VectorExpr) -> f64 {
    self
      .integrate_cells(field, |cell, xi, trace| {
        (trace.value - exact.eval(&cell.ref2phys(xi))).norm_squared()
      })
      .sqrt()
  }
}

#[cfg(test)]
mod test {
  use super::*;
  use crate::{
    expr::{RigidRotation, RotatingHump},
    mesh::Rect,
    Point,
  };
  use approx::assert_relative_eq;

  fn space(n: usize, degree: usize) -> DgSpace {
    DgSpace::new(CartesianMesh::new(Rect::new_symmetric_square(), n), degree)
  }

  #[test]
  fn interpolation_is_exact_in_the_space() {
    let space = space(3, 2);
    let quadratic = |x: &Point| Vector2::new(x.x * x.y - 1.0, x.y * x.y + 2.0 * x.x);
    let field = space.interpolate(&quadratic);
    assert!(space.l2_error(&field, &quadratic) < 1e-12);
    for icell in [0, 4, 8] {
      let xi = [0.3, -0.8];
      let x = space.mesh().cell(icell).ref2phys(xi);
      let value = space.evaluate(&field, icell, xi);
      assert_relative_eq!(value.x, quadratic(&x).x, epsilon = 1e-12);
      assert_relative_eq!(value.y, quadratic(&x).y, epsilon = 1e-12);
    }
  }

  #[test]
  fn norms_of_simple_fields() {
    let space = space(4, 1);
    // |(1, 2)|^2 integrated over [-1,1]^2
    let constant = space.interpolate(&|_: &Point| Vector2::new(1.0, 2.0));
    assert_relative_eq!(space.l2_norm(&constant), (5.0f64 * 4.0).sqrt(), epsilon = 1e-12);
    assert_relative_eq!(space.div_l2_norm(&constant), 0.0, epsilon = 1e-12);

    // div (x, y) = 2
    let radial = space.interpolate(&|x: &Point| *x);
    assert_relative_eq!(space.div_l2_norm(&radial), (4.0f64 * 4.0).sqrt(), epsilon = 1e-12);

    let rotation = space.interpolate(&RigidRotation);
    assert_relative_eq!(space.div_l2_norm(&rotation), 0.0, epsilon = 1e-12);
  }

  #[test]
  fn projection_error_decreases_with_refinement() {
    let hump = RotatingHump::at(0.0);
    let coarse = space(8, 1);
    let fine = space(16, 1);
    let err_coarse = coarse.l2_error(&coarse.interpolate(&hump), &hump);
    let err_fine = fine.l2_error(&fine.interpolate(&hump), &hump);
    assert!(err_fine < err_coarse / 2.0);
  }

  #[test]
  fn vertex_values_of_linear_field() {
    let space = space(2, 1);
    let linear = |x: &Point| Vector2::new(x.x + x.y, 2.0 * x.y);
    let field = space.interpolate(&linear);
    let values = space.cell_vertex_values(&field);
    assert_eq!(values.len(), 4);
    for (icell, corners) in values.iter().enumerate() {
      let vertices = space.mesh().cell_vertices(icell);
      for (value, &ivertex) in corners.iter().zip(vertices.iter()) {
        let x = space.mesh().vertex_coord(ivertex);
        assert_relative_eq!(value.x, linear(&x).x, epsilon = 1e-12);
        assert_relative_eq!(value.y, linear(&x).y, epsilon = 1e-12);
      }
    }
  }

  #[test]
  fn dof_ranges_partition_the_space() {
    let space = space(3, 2);
    assert_eq!(space.ndofs_local(), 18);
    assert_eq!(space.ndofs(), 9 * 18);
    assert_eq!(space.dofs(0), 0..18);
    assert_eq!(space.dofs(8).end, space.ndofs());
  }
}
