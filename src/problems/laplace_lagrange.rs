//! Module for the Laplace Equation with Dirichlet data imposed by a boundary projection.
//!
//! $-Delta u = 0$ in $Omega$, $u = g$ on $partial Omega$.
//!
//! The boundary data is first $L^2$ projected onto the boundary trace space,
//! using the boundary mass matrix $M_(b b)$.
//! After the Dirichlet solve the same reduced operator recovers the
//! boundary stress $tau approx partial_n u$ from $M_(b b) tau = (A u)_b$.

use crate::{
  assemble::{self, GalMat, GalVec},
  error::SolveError,
  linalg::{pcg, CooMatrixExt, CscMatrix, CsrMatrix, FaerCholesky, PcgConfig},
  mesh::{CartesianMesh, CellGeometry},
  operators::DofIdx,
  quadrature::{QuadRule, TensorQuadRule},
  Point, Vector2,
};

use tracing::info;

/// Reference corners in the vertex order of [`CartesianMesh::cell_vertices`].
const CORNERS: [[f64; 2]; 4] = [[-1.0, -1.0], [1.0, -1.0], [1.0, 1.0], [-1.0, 1.0]];

/// Bilinear shape functions and their reference gradients.
pub fn q1_shape(xi: [f64; 2]) -> ([f64; 4], [Vector2; 4]) {
  let values = CORNERS.map(|[cx, cy]| 0.25 * (1.0 + cx * xi[0]) * (1.0 + cy * xi[1]));
  let grads = CORNERS.map(|[cx, cy]| {
    Vector2::new(
      0.25 * cx * (1.0 + cy * xi[1]),
      0.25 * cy * (1.0 + cx * xi[0]),
    )
  });
  (values, grads)
}

/// Element matrix of $integral nabla u dot nabla v$ for bilinear elements.
pub fn q1_laplace_elmat(cell: &CellGeometry) -> na::Matrix4<f64> {
  let quad = TensorQuadRule::gauss_legendre(2);
  let scale = cell.grad_scale();
  let mut elmat = na::Matrix4::zeros();
  for (&xi, &w) in quad.nodes().iter().zip(quad.weights()) {
    let (_, grads) = q1_shape(xi);
    let grads = grads.map(|g| g.component_mul(&scale));
    for i in 0..4 {
      for j in 0..4 {
        elmat[(i, j)] += w * cell.det_jacobian() * grads[i].dot(&grads[j]);
      }
    }
  }
  elmat
}

pub fn assemble_laplace(mesh: &CartesianMesh) -> GalMat {
  let nvertices = mesh.nvertices();
  let mut galmat = GalMat::new(nvertices, nvertices);
  for cell in mesh.cells() {
    let elmat = q1_laplace_elmat(&cell);
    let vertices = mesh.cell_vertices(cell.idx);
    for (ilocal, &iglobal) in vertices.iter().enumerate() {
      for (jlocal, &jglobal) in vertices.iter().enumerate() {
        galmat.push(iglobal, jglobal, elmat[(ilocal, jlocal)]);
      }
    }
  }
  galmat
}

/// $integral_(partial Omega) u v dif s$ on the vertex dofs.
pub fn assemble_boundary_mass(mesh: &CartesianMesh) -> GalMat {
  let nvertices = mesh.nvertices();
  let mut galmat = GalMat::new(nvertices, nvertices);
  for facet in mesh.boundary_facets() {
    let length = mesh.cell(facet.cell).facet_length(facet.facet);
    let [v0, v1] = mesh.boundary_facet_vertices(&facet);
    for (i, j, factor) in [(v0, v0, 2.0), (v0, v1, 1.0), (v1, v0, 1.0), (v1, v1, 2.0)] {
      galmat.push(i, j, factor * length / 6.0);
    }
  }
  galmat
}

/// $integral_(partial Omega) g v dif s$ on the vertex dofs.
pub fn assemble_boundary_load<F>(mesh: &CartesianMesh, boundary_data: F) -> GalVec
where
  F: Fn(&Point) -> f64,
{
  let quad = QuadRule::gauss_legendre(3);
  let mut galvec = GalVec::zeros(mesh.nvertices());
  for facet in mesh.boundary_facets() {
    let [v0, v1] = mesh.boundary_facet_vertices(&facet);
    let x0 = mesh.vertex_coord(v0);
    let x1 = mesh.vertex_coord(v1);
    let length = (x1 - x0).norm();
    for (&s, &w) in quad.nodes().iter().zip(quad.weights()) {
      let phi0 = 0.5 * (1.0 - s);
      let phi1 = 0.5 * (1.0 + s);
      let g = boundary_data(&(phi0 * x0 + phi1 * x1));
      galvec[v0] += 0.5 * length * w * g * phi0;
      galvec[v1] += 0.5 * length * w * g * phi1;
    }
  }
  galvec
}

#[derive(Debug, Clone)]
pub struct LaplaceLagrangeSolution {
  pub solution: na::DVector<f64>,
  /// Normal derivative on the boundary dofs, zero elsewhere.
  pub stress: na::DVector<f64>,
  pub boundary_dofs: Vec<DofIdx>,
}

pub fn solve_laplace_lagrange<F>(
  mesh: &CartesianMesh,
  boundary_data: F,
  pcg_config: PcgConfig,
) -> Result<LaplaceLagrangeSolution, SolveError>
where
  F: Fn(&Point) -> f64,
{
  let nvertices = mesh.nvertices();
  let boundary_dofs = mesh.boundary_vertices();

  // Project boundary data.
  let boundary_mass = CsrMatrix::from(&assemble_boundary_mass(mesh).restrict(&boundary_dofs));
  let load = assemble_boundary_load(mesh, boundary_data);
  let load_boundary = load.select_rows(boundary_dofs.iter());
  let boundary_coeffs = pcg(&boundary_mass, &load_boundary, pcg_config)?;

  // Dirichlet solve.
  let laplace = assemble_laplace(mesh);
  let mut galmat = laplace.clone();
  let mut galvec = GalVec::zeros(nvertices);
  let dof_coeffs: Vec<_> = boundary_dofs
    .iter()
    .copied()
    .zip(boundary_coeffs.iter().copied())
    .collect();
  assemble::fix_dofs_coeff(&dof_coeffs, &mut galmat, &mut galvec);
  let solution = FaerCholesky::new(CscMatrix::from(&galmat))?.solve(&galvec)?;

  // Boundary stress from the residual of the unconstrained system.
  let residual = &CsrMatrix::from(&laplace) * &solution;
  let residual_boundary = residual.select_rows(boundary_dofs.iter());
  let stress_boundary = pcg(&boundary_mass, &residual_boundary, pcg_config)?;
  let mut stress = na::DVector::zeros(nvertices);
  for (&idof, &tau) in boundary_dofs.iter().zip(stress_boundary.iter()) {
    stress[idof] = tau;
  }

  info!(
    "solved laplace problem with {} dofs, {} on the boundary",
    nvertices,
    boundary_dofs.len()
  );

  Ok(LaplaceLagrangeSolution {
    solution,
    stress,
    boundary_dofs,
  })
}
