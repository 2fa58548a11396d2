//! Tensor-product Legendre elements on the reference square.

use crate::{
  mesh::{CellGeometry, LocalFacet},
  quadrature::{legendre, QuadRule, TensorQuadRule},
  Matrix2, Vector2,
};

/// Scalar $L^2$-orthonormal Legendre polynomial $sqrt((2n+1)/2) P_n$ and its derivative.
pub fn orthonormal_legendre(n: usize, x: f64) -> (f64, f64) {
  let scale = ((2 * n + 1) as f64 / 2.0).sqrt();
  let (p, dp) = legendre(n, x);
  (scale * p, scale * dp)
}

/// z-component of the cross product of two planar vectors.
pub fn cross(a: &Vector2, b: &Vector2) -> f64 {
  a.x * b.y - a.y * b.x
}

/// Value and gradient of a planar vector field at a single point.
///
/// `grad[(i, j)]` is $partial_j B_i$.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Trace {
  pub value: Vector2,
  pub grad: Matrix2,
}
impl Trace {
  pub fn zero() -> Self {
    Self {
      value: Vector2::new(0.0, 0.0),
      grad: Matrix2::new(0.0, 0.0, 0.0, 0.0),
    }
  }
  pub fn new(value: Vector2, grad: Matrix2) -> Self {
    Self { value, grad }
  }

  /// The trace of the vector basis function $phi e_"comp"$.
  pub fn basis(comp: usize, value: f64, grad: Vector2) -> Self {
    let mut trace = Self::zero();
    trace.value[comp] = value;
    trace.grad[(comp, 0)] = grad.x;
    trace.grad[(comp, 1)] = grad.y;
    trace
  }

  pub fn div(&self) -> f64 {
    self.grad[(0, 0)] + self.grad[(1, 1)]
  }
  /// $partial_x B_y - partial_y B_x$
  pub fn curl(&self) -> f64 {
    self.grad[(1, 0)] - self.grad[(0, 1)]
  }
}

/// Traces of a field on both sides of an interior facet.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TracePair {
  pub plus: Trace,
  pub minus: Trace,
}
impl TracePair {
  pub fn new(plus: Trace, minus: Trace) -> Self {
    Self { plus, minus }
  }
  pub fn avg_value(&self) -> Vector2 {
    0.5 * (self.plus.value + self.minus.value)
  }
  /// $[B] = B^+ - B^-$
  pub fn jump_value(&self) -> Vector2 {
    self.plus.value - self.minus.value
  }
  pub fn avg_curl(&self) -> f64 {
    0.5 * (self.plus.curl() + self.minus.curl())
  }
  pub fn swapped(&self) -> Self {
    Self::new(self.minus, self.plus)
  }
}

/// Scalar basis functions tabulated at a set of reference points.
///
/// Matrices are `nbasis x npoints`.
#[derive(Debug, Clone)]
pub struct BasisTable {
  pub values: na::DMatrix<f64>,
  pub dxi: na::DMatrix<f64>,
  pub deta: na::DMatrix<f64>,
}
impl BasisTable {
  pub fn tabulate(degree: usize, points: &[[f64; 2]]) -> Self {
    let n1 = degree + 1;
    let nbasis = n1 * n1;
    let npoints = points.len();
    let mut values = na::DMatrix::zeros(nbasis, npoints);
    let mut dxi = na::DMatrix::zeros(nbasis, npoints);
    let mut deta = na::DMatrix::zeros(nbasis, npoints);
    for (ipoint, &[xi, eta]) in points.iter().enumerate() {
      let lx: Vec<_> = (0..n1).map(|i| orthonormal_legendre(i, xi)).collect();
      let ly: Vec<_> = (0..n1).map(|j| orthonormal_legendre(j, eta)).collect();
      for j in 0..n1 {
        for i in 0..n1 {
          let ibasis = i + n1 * j;
          values[(ibasis, ipoint)] = lx[i].0 * ly[j].0;
          dxi[(ibasis, ipoint)] = lx[i].1 * ly[j].0;
          deta[(ibasis, ipoint)] = lx[i].0 * ly[j].1;
        }
      }
    }
    Self { values, dxi, deta }
  }

  pub fn nbasis(&self) -> usize {
    self.values.nrows()
  }
  pub fn npoints(&self) -> usize {
    self.values.ncols()
  }

  pub fn value(&self, ibasis: usize, ipoint: usize) -> f64 {
    self.values[(ibasis, ipoint)]
  }
  /// Physical gradient on the given cell.
  pub fn grad(&self, cell: &CellGeometry, ibasis: usize, ipoint: usize) -> Vector2 {
    let scale = cell.grad_scale();
    Vector2::new(
      scale.x * self.dxi[(ibasis, ipoint)],
      scale.y * self.deta[(ibasis, ipoint)],
    )
  }
}

/// Reference element for the vector-valued space $Q_k^2$.
///
/// Holds the quadrature rules and basis tables used by assembly.
#[derive(Debug, Clone)]
pub struct RefElement {
  degree: usize,
  cell_quad: TensorQuadRule,
  cell_table: BasisTable,
  facet_quad: QuadRule,
  facet_tables: [BasisTable; 4],
}
impl RefElement {
  pub fn new(degree: usize) -> Self {
    Self::with_quad_points(degree, degree + 2)
  }

  pub fn with_quad_points(degree: usize, npoints_axis: usize) -> Self {
    let facet_quad = QuadRule::gauss_legendre(npoints_axis);
    let cell_quad = TensorQuadRule::from_1d(&facet_quad);
    let cell_table = BasisTable::tabulate(degree, cell_quad.nodes());
    let facet_tables = LocalFacet::ALL.map(|facet| {
      let points: Vec<_> = facet_quad
        .nodes()
        .iter()
        .map(|&s| facet.ref_coord(s))
        .collect();
      BasisTable::tabulate(degree, &points)
    });
    Self {
      degree,
      cell_quad,
      cell_table,
      facet_quad,
      facet_tables,
    }
  }

  pub fn degree(&self) -> usize {
    self.degree
  }
  /// Number of scalar basis functions.
  pub fn nbasis(&self) -> usize {
    (self.degree + 1).pow(2)
  }
  /// Number of vector-valued local dofs.
  pub fn ndofs(&self) -> usize {
    2 * self.nbasis()
  }

  pub fn cell_quad(&self) -> &TensorQuadRule {
    &self.cell_quad
  }
  pub fn cell_table(&self) -> &BasisTable {
    &self.cell_table
  }
  pub fn facet_quad(&self) -> &QuadRule {
    &self.facet_quad
  }
  pub fn facet_table(&self, facet: LocalFacet) -> &BasisTable {
    &self.facet_tables[facet.index()]
  }

  /// Traces of all local vector basis functions at one tabulated point.
  ///
  /// Local dof `comp * nbasis + ibasis`.
  pub fn basis_traces(&self, table: &BasisTable, cell: &CellGeometry, ipoint: usize) -> Vec<Trace> {
    let nbasis = table.nbasis();
    let mut traces = Vec::with_capacity(2 * nbasis);
    for comp in 0..2 {
      for ibasis in 0..nbasis {
        traces.push(Trace::basis(
          comp,
          table.value(ibasis, ipoint),
          table.grad(cell, ibasis, ipoint),
        ));
      }
    }
    traces
  }

  /// Trace of a field with local coefficients `local` at one tabulated point.
  pub fn field_trace(
    &self,
    table: &BasisTable,
    cell: &CellGeometry,
    ipoint: usize,
    local: na::DVectorView<f64>,
  ) -> Trace {
    let nbasis = table.nbasis();
    let mut trace = Trace::zero();
    for comp in 0..2 {
      for ibasis in 0..nbasis {
        let coeff = local[comp * nbasis + ibasis];
        if coeff == 0.0 {
          continue;
        }
        let grad = table.grad(cell, ibasis, ipoint);
        trace.value[comp] += coeff * table.value(ibasis, ipoint);
        trace.grad[(comp, 0)] += coeff * grad.x;
        trace.grad[(comp, 1)] += coeff * grad.y;
      }
    }
    trace
  }
}

#[cfg(test)]
mod test {
  use super::*;
  use crate::mesh::{CartesianMesh, Rect};
  use approx::assert_relative_eq;

  #[test]
  fn reference_mass_is_identity() {
    for degree in 0..=3 {
      let refelem = RefElement::new(degree);
      let table = refelem.cell_table();
      let weights = refelem.cell_quad().weights();
      let nbasis = refelem.nbasis();
      for i in 0..nbasis {
        for j in 0..nbasis {
          let mass: f64 = (0..table.npoints())
            .map(|q| weights[q] * table.value(i, q) * table.value(j, q))
            .sum();
          let expected = if i == j { 1.0 } else { 0.0 };
          assert_relative_eq!(mass, expected, epsilon = 1e-12);
        }
      }
    }
  }

  #[test]
  fn curl_and_div_of_basis_traces() {
    let grad = Vector2::new(2.0, 3.0);
    let bx = Trace::basis(0, 1.0, grad);
    let by = Trace::basis(1, 1.0, grad);
    assert_eq!(bx.div(), 2.0);
    assert_eq!(bx.curl(), -3.0);
    assert_eq!(by.div(), 3.0);
    assert_eq!(by.curl(), 2.0);
  }

  #[test]
  fn field_trace_reproduces_linear_field() {
    // B = (x, 2y) on a physical cell, expressed in the orthonormal basis.
    let mesh = CartesianMesh::new(Rect::new_symmetric_square(), 2);
    let cell = mesh.cell(3);
    let refelem = RefElement::new(1);
    let nbasis = refelem.nbasis();
    let c = cell.center();
    let l0 = orthonormal_legendre(0, 0.0).0;
    let l1 = orthonormal_legendre(1, 1.0).0;
    let mut local = na::DVector::zeros(refelem.ndofs());
    // x = c.x + hx/2 xi
    local[0] = c.x / (l0 * l0);
    local[1] = 0.5 * cell.hx / (l1 * l0);
    // 2y = 2 c.y + hy eta
    local[nbasis] = 2.0 * c.y / (l0 * l0);
    local[nbasis + 2] = cell.hy / (l0 * l1);

    let table = refelem.cell_table();
    for q in 0..table.npoints() {
      let x = cell.ref2phys(refelem.cell_quad().nodes()[q]);
      let trace = refelem.field_trace(table, &cell, q, local.as_view());
      assert_relative_eq!(trace.value.x, x.x, epsilon = 1e-13);
      assert_relative_eq!(trace.value.y, 2.0 * x.y, epsilon = 1e-13);
      assert_relative_eq!(trace.div(), 3.0, epsilon = 1e-12);
      assert_relative_eq!(trace.curl(), 0.0, epsilon = 1e-12);
    }
  }
}
