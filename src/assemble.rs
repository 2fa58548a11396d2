use crate::{
  fe::{Trace, TracePair},
  linalg::CooMatrixExt,
  mesh::{CellGeometry, LocalFacet},
  operators::{BilinearForm, CellPoint, DofIdx, FacetPoint, LinearForm},
  space::DgSpace,
  util, Point,
};

use itertools::Itertools;

pub type GalMat = nas::CooMatrix<f64>;
pub type GalVec = na::DVector<f64>;

fn push_elmat(
  triplets: &mut Vec<(usize, usize, f64)>,
  row_dofs: &[DofIdx],
  col_dofs: &[DofIdx],
  elmat: &na::DMatrix<f64>,
) {
  for (ilocal, &iglobal) in row_dofs.iter().enumerate() {
    for (jlocal, &jglobal) in col_dofs.iter().enumerate() {
      let val = elmat[(ilocal, jlocal)];
      if val != 0.0 {
        triplets.push((iglobal, jglobal, val));
      }
    }
  }
}

/// Quadrature point and weight on a facet, including the facet Jacobian.
fn facet_point(
  space: &DgSpace,
  cell: &CellGeometry,
  facet: LocalFacet,
  iqp: usize,
) -> (Point, f64) {
  let quad = space.refelem().facet_quad();
  let x = cell.ref2phys(facet.ref_coord(quad.nodes()[iqp]));
  let weight = quad.weights()[iqp] * 0.5 * cell.facet_length(facet);
  (x, weight)
}

/// Assembly algorithm for the Galerkin Matrix.
///
/// Rows are test dofs, columns trial dofs.
pub fn assemble_galmat(space: &DgSpace, form: impl BilinearForm) -> GalMat {
  let mesh = space.mesh();
  let refelem = space.refelem();
  let ndofs = space.ndofs();
  let nlocal = space.ndofs_local();
  let h = mesh.mesh_width();

  let mut triplets = Vec::new();

  let cell_quad = refelem.cell_quad();
  for cell in mesh.cells() {
    let mut elmat = na::DMatrix::zeros(nlocal, nlocal);
    for iqp in 0..cell_quad.npoints() {
      let p = CellPoint {
        icell: cell.idx,
        x: cell.ref2phys(cell_quad.nodes()[iqp]),
      };
      let weight = cell_quad.weights()[iqp] * cell.det_jacobian();
      let traces = refelem.basis_traces(refelem.cell_table(), &cell, iqp);
      for (itest, test) in traces.iter().enumerate() {
        for (itrial, trial) in traces.iter().enumerate() {
          elmat[(itest, itrial)] += weight * form.cell(&p, trial, test);
        }
      }
    }
    let dofs: Vec<_> = space.dofs(cell.idx).collect();
    push_elmat(&mut triplets, &dofs, &dofs, &elmat);
  }

  let facet_quad = refelem.facet_quad();
  for facet in mesh.interior_facets() {
    let plus = mesh.cell(facet.plus);
    let minus = mesh.cell(facet.minus);
    let plus_table = refelem.facet_table(facet.plus_facet);
    let minus_table = refelem.facet_table(facet.minus_facet);

    // Local dofs: first those of the plus cell, then those of the minus cell.
    let pairs = |traces_plus: Vec<Trace>, traces_minus: Vec<Trace>| -> Vec<TracePair> {
      let plus_side = traces_plus
        .into_iter()
        .map(|t| TracePair::new(t, Trace::zero()));
      let minus_side = traces_minus
        .into_iter()
        .map(|t| TracePair::new(Trace::zero(), t));
      plus_side.chain(minus_side).collect()
    };

    let mut elmat = na::DMatrix::zeros(2 * nlocal, 2 * nlocal);
    for iqp in 0..facet_quad.npoints() {
      let (x, weight) = facet_point(space, &plus, facet.plus_facet, iqp);
      let p = FacetPoint {
        x,
        normal: facet.normal,
        h,
      };
      let traces = pairs(
        refelem.basis_traces(plus_table, &plus, iqp),
        refelem.basis_traces(minus_table, &minus, iqp),
      );
      for (itest, test) in traces.iter().enumerate() {
        for (itrial, trial) in traces.iter().enumerate() {
          elmat[(itest, itrial)] += weight * form.interior_facet(&p, trial, test);
        }
      }
    }
    let dofs: Vec<_> = space
      .dofs(facet.plus)
      .chain(space.dofs(facet.minus))
      .collect();
    push_elmat(&mut triplets, &dofs, &dofs, &elmat);
  }

  for facet in mesh.boundary_facets() {
    let cell = mesh.cell(facet.cell);
    let table = refelem.facet_table(facet.facet);
    let mut elmat = na::DMatrix::zeros(nlocal, nlocal);
    for iqp in 0..facet_quad.npoints() {
      let (x, weight) = facet_point(space, &cell, facet.facet, iqp);
      let p = FacetPoint {
        x,
        normal: facet.normal,
        h,
      };
      let traces = refelem.basis_traces(table, &cell, iqp);
      for (itest, test) in traces.iter().enumerate() {
        for (itrial, trial) in traces.iter().enumerate() {
          elmat[(itest, itrial)] += weight * form.boundary_facet(&p, trial, test);
        }
      }
    }
    let dofs: Vec<_> = space.dofs(facet.cell).collect();
    push_elmat(&mut triplets, &dofs, &dofs, &elmat);
  }

  let (rows, cols, values) = triplets.into_iter().multiunzip();
  GalMat::try_from_triplets(ndofs, ndofs, rows, cols, values)
    .expect("Assembled dofs are within the space.")
}

/// Assembly algorithm for the Galerkin Vector.
pub fn assemble_galvec(space: &DgSpace, form: impl LinearForm) -> GalVec {
  let mesh = space.mesh();
  let refelem = space.refelem();
  let h = mesh.mesh_width();
  let coefficient = form.coefficient();

  let mut galvec = GalVec::zeros(space.ndofs());

  let cell_quad = refelem.cell_quad();
  let cell_table = refelem.cell_table();
  for cell in mesh.cells() {
    let dofs = space.dofs(cell.idx);
    for iqp in 0..cell_quad.npoints() {
      let p = CellPoint {
        icell: cell.idx,
        x: cell.ref2phys(cell_quad.nodes()[iqp]),
      };
      let weight = cell_quad.weights()[iqp] * cell.det_jacobian();
      let coeff = match coefficient {
        Some(field) => space.field_trace(field, cell_table, &cell, iqp),
        None => Trace::zero(),
      };
      let traces = refelem.basis_traces(cell_table, &cell, iqp);
      for (ilocal, test) in traces.iter().enumerate() {
        galvec[dofs.start + ilocal] += weight * form.cell(&p, &coeff, test);
      }
    }
  }

  let facet_quad = refelem.facet_quad();
  for facet in mesh.boundary_facets() {
    let cell = mesh.cell(facet.cell);
    let table = refelem.facet_table(facet.facet);
    let dofs = space.dofs(facet.cell);
    for iqp in 0..facet_quad.npoints() {
      let (x, weight) = facet_point(space, &cell, facet.facet, iqp);
      let p = FacetPoint {
        x,
        normal: facet.normal,
        h,
      };
      let traces = refelem.basis_traces(table, &cell, iqp);
      for (ilocal, test) in traces.iter().enumerate() {
        galvec[dofs.start + ilocal] += weight * form.boundary_facet(&p, test);
      }
    }
  }

  galvec
}

/// Fix DOFs of FE solution.
///
/// Modifies supplied galerkin matrix and galerkin vector,
/// such that the FE solution has the given coefficents on the dofs.
/// $mat(A_0, 0; 0, I) vec(mu_0, mu_diff) = vec(phi - A_(0 diff) gamma, gamma)$
pub fn fix_dofs_coeff(dof_coeffs: &[(DofIdx, f64)], galmat: &mut GalMat, galvec: &mut GalVec) {
  let ndofs = galmat.nrows();

  let dof_coeffs_opt = util::sparse_to_dense_data(dof_coeffs.to_vec(), ndofs);
  let dof_coeffs_zeroed =
    na::DVector::from_iterator(ndofs, dof_coeffs_opt.iter().map(|v| v.unwrap_or(0.0)));

  // Modify galvec.
  let galmat_csr = nas::CsrMatrix::from(&*galmat);
  *galvec -= galmat_csr * dof_coeffs_zeroed;

  // Set galvec to prescribed coefficents.
  dof_coeffs.iter().for_each(|&(i, v)| galvec[i] = v);

  // Set entires zero that share a (row or column) index with a fixed dof.
  galmat.set_zero(|r, c| dof_coeffs_opt[r].is_some() || dof_coeffs_opt[c].is_some());

  // Set galmat diagonal for dofs to one.
  for &(i, _) in dof_coeffs {
    galmat.push(i, i, 1.0);
  }
}

#[cfg(test)]
mod test {
  use super::*;
  use crate::{
    config::FluxParams,
    expr::RigidRotation,
    flux::InductionFlux,
    mesh::{CartesianMesh, Rect},
    operators::{ImplicitStepRhs, MassForm},
    Vector2,
  };
  use approx::assert_relative_eq;

  fn space(n: usize, degree: usize) -> DgSpace {
    DgSpace::new(CartesianMesh::new(Rect::new_symmetric_square(), n), degree)
  }

  #[test]
  fn mass_matrix_is_scaled_identity() {
    let space = space(3, 1);
    let mass = na::DMatrix::from(&assemble_galmat(&space, MassForm));
    let det = space.mesh().cell(0).det_jacobian();
    let expected = det * na::DMatrix::identity(space.ndofs(), space.ndofs());
    assert!((mass - expected).abs().max() < 1e-13);
  }

  #[test]
  fn mass_rhs_matches_mass_matrix() {
    // With zero boundary data and zero flux coefficient the right hand side is M K.
    let space = space(2, 1);
    let flux = InductionFlux::new(RigidRotation, FluxParams::default());
    let known = space.interpolate(&|x: &Point| Vector2::new(x.y, x.x * x.x));
    let rhs = ImplicitStepRhs {
      flux: &flux,
      coeff: 0.0,
      known: &known,
      boundary: |_: &Point| Vector2::zeros(),
    };
    let galvec = assemble_galvec(&space, rhs);
    let mass = nas::CsrMatrix::from(&assemble_galmat(&space, MassForm));
    let expected = &mass * known.coeffs();
    for i in 0..space.ndofs() {
      assert_relative_eq!(galvec[i], expected[i], epsilon = 1e-13);
    }
  }

  #[test]
  fn constant_fields_only_see_boundary_penalty() {
    // Constant fields have no jumps, no curl and no divergence.
    // With zero velocity only boundary penalty terms see them.
    let space = space(3, 1);
    let still = |_: &Point| Vector2::zeros();
    let params = FluxParams {
      penalty: 50.0,
      resistivity: 1e-2,
    };
    let flux = InductionFlux::new(still, params);
    let galmat = nas::CsrMatrix::from(&assemble_galmat(&space, &flux));
    let constant = space.interpolate(&|_: &Point| Vector2::new(1.0, -2.0));
    let applied = &galmat * constant.coeffs();

    // Interior cells have no boundary facets.
    let interior_cell = 4;
    for idof in space.dofs(interior_cell) {
      assert_relative_eq!(applied[idof], 0.0, epsilon = 1e-12);
    }
    // B^T A B equals the boundary penalty of the tangential trace.
    let energy = constant.coeffs().dot(&applied);
    let h = space.mesh().mesh_width();
    // left/right: (n x B)^2 = B_y^2 = 4, top/bottom: B_x^2 = 1, each side has length 2.
    let expected = params.penalty * params.resistivity / h * (2.0 * 2.0 * 4.0 + 2.0 * 2.0 * 1.0);
    assert_relative_eq!(energy, expected, epsilon = 1e-10);
  }

  #[test]
  fn fixing_dofs_prescribes_coefficients() {
    let mut galmat = GalMat::new(3, 3);
    for i in 0..3 {
      galmat.push(i, i, 2.0);
    }
    galmat.push(0, 1, -1.0);
    galmat.push(1, 0, -1.0);
    let mut galvec = GalVec::from_element(3, 1.0);
    fix_dofs_coeff(&[(0, 5.0)], &mut galmat, &mut galvec);
    let dense = na::DMatrix::from(&galmat);
    assert_eq!(dense[(0, 0)], 1.0);
    assert_eq!(dense[(0, 1)], 0.0);
    assert_eq!(dense[(1, 0)], 0.0);
    assert_eq!(galvec[0], 5.0);
    assert_eq!(galvec[1], 1.0 + 5.0);
  }
}
