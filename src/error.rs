use thiserror::Error;

/// Fatal failures of a solver run.
///
/// Nothing is retried, the run for the current resolution is aborted.
#[derive(Debug, Error)]
pub enum SolveError {
  #[error("LU factorization of {size}x{size} system failed: {reason}")]
  Factorization { size: usize, reason: String },
  #[error("Cholesky factorization of {size}x{size} system failed: {reason}")]
  Cholesky { size: usize, reason: String },
  #[error("linear solve produced non-finite values")]
  NonFinite,
  #[error("conjugate gradient did not converge in {iterations} iterations (residual {residual:e})")]
  NoConvergence { iterations: usize, residual: f64 },
  #[error("failed to write output")]
  Io(#[from] std::io::Error),
  #[error("failed to export VTK file: {0:?}")]
  Vtk(vtkio::Error),
}
