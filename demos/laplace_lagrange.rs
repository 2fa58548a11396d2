//! Solves the Laplace equation with boundary data $u = x^2 - y^2$ on the unit square
//! and writes the solution and the boundary stress as VTK files.

extern crate nalgebra as na;

use induction::{
  error::SolveError,
  io::{nodal_to_vtk, VtkSeries},
  linalg::PcgConfig,
  mesh::CartesianMesh,
  problems::laplace_lagrange::solve_laplace_lagrange,
  Point,
};

use std::process::ExitCode;

fn run(ncells_axis: usize) -> Result<(), SolveError> {
  let mesh = CartesianMesh::new_unit(ncells_axis);
  let boundary_data = |x: &Point| x.x * x.x - x.y * x.y;
  let result = solve_laplace_lagrange(&mesh, boundary_data, PcgConfig::default())?;

  let exact = na::DVector::from_fn(mesh.nvertices(), |i, _| boundary_data(&mesh.vertex_coord(i)));
  let max_error = (&result.solution - exact).amax();
  println!("np = {ncells_axis}, max nodal error = {max_error:e}");

  let dir = std::path::Path::new("out").join("laplace");
  VtkSeries::new(&dir, "sol")?.append(0.0, nodal_to_vtk(&mesh, &result.solution, "u"))?;
  VtkSeries::new(&dir, "stress")?.append(0.0, nodal_to_vtk(&mesh, &result.stress, "tau"))?;
  Ok(())
}

fn main() -> ExitCode {
  tracing_subscriber::fmt::init();

  match run(20) {
    Ok(()) => ExitCode::SUCCESS,
    Err(err) => {
      tracing::error!("laplace solve failed: {err}");
      ExitCode::FAILURE
    }
  }
}
