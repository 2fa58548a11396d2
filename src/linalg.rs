use crate::error::SolveError;

use std::{
  mem,
  panic::{self, AssertUnwindSafe},
};

pub type Vector = na::DVector<f64>;
pub type CooMatrix = nas::CooMatrix<f64>;
pub type CscMatrix = nas::CscMatrix<f64>;
pub type CsrMatrix = nas::CsrMatrix<f64>;

type SparseMatrixFaer = faer::sparse::SparseColMat<usize, f64>;

pub fn nalgebra2faer(m: CscMatrix) -> SparseMatrixFaer {
  let nrows = m.nrows();
  let ncols = m.ncols();
  let (col_ptrs, row_indices, values) = m.disassemble();

  let symbolic =
    faer::sparse::SymbolicSparseColMat::new_checked(nrows, ncols, col_ptrs, None, row_indices);
  faer::sparse::SparseColMat::new(symbolic, values)
}

/// Runs a faer factorization.
///
/// faer reports structural singularity as an error but panics on a zero pivot,
/// both end up as `Err(reason)`.
fn catch_factorization<T, E: std::fmt::Debug>(
  factorize: impl FnOnce() -> Result<T, E>,
) -> Result<T, String> {
  match panic::catch_unwind(AssertUnwindSafe(factorize)) {
    Ok(Ok(raw)) => Ok(raw),
    Ok(Err(err)) => Err(format!("{err:?}")),
    Err(payload) => Err(
      payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .filter(|s| !s.is_empty() && s != "explicit panic")
        .unwrap_or_else(|| String::from("numerically singular matrix")),
    ),
  }
}

fn finite_or_err(x: Vector) -> Result<Vector, SolveError> {
  if x.iter().all(|v| v.is_finite()) {
    Ok(x)
  } else {
    Err(SolveError::NonFinite)
  }
}

/// Sparse LU factorization, computed once and reused for many right-hand sides.
pub struct FaerLu {
  raw: faer::sparse::linalg::solvers::Lu<usize, f64>,
}
impl FaerLu {
  pub fn new(a: CscMatrix) -> Result<Self, SolveError> {
    let size = a.nrows();
    let a = nalgebra2faer(a);
    let raw = catch_factorization(|| a.sp_lu())
      .map_err(|reason| SolveError::Factorization { size, reason })?;
    Ok(Self { raw })
  }

  pub fn solve(&self, b: &Vector) -> Result<Vector, SolveError> {
    use faer::solvers::SpSolver as _;

    let b = faer::col::from_slice(b.as_slice());
    finite_or_err(na::DVector::from_vec(self.raw.solve(b).as_slice().to_vec()))
  }
}

pub struct FaerCholesky {
  raw: faer::sparse::linalg::solvers::Cholesky<usize, f64>,
}
impl FaerCholesky {
  pub fn new(a: CscMatrix) -> Result<Self, SolveError> {
    let size = a.nrows();
    let a = nalgebra2faer(a);
    let raw = catch_factorization(|| a.sp_cholesky(faer::Side::Upper))
      .map_err(|reason| SolveError::Cholesky { size, reason })?;
    Ok(Self { raw })
  }

  pub fn solve(&self, b: &Vector) -> Result<Vector, SolveError> {
    use faer::solvers::SpSolver as _;

    let b = faer::col::from_slice(b.as_slice());
    finite_or_err(na::DVector::from_vec(self.raw.solve(b).as_slice().to_vec()))
  }
}

/// Settings of the Jacobi-preconditioned conjugate gradient method.
#[derive(Debug, Clone, Copy)]
pub struct PcgConfig {
  pub max_iterations: usize,
  pub rel_tolerance: f64,
  pub abs_tolerance: f64,
}
impl Default for PcgConfig {
  fn default() -> Self {
    Self {
      max_iterations: 2000,
      rel_tolerance: 1e-12,
      abs_tolerance: 1e-14,
    }
  }
}

/// Solves the SPD system $A x = b$ with Jacobi-preconditioned conjugate gradients.
pub fn pcg(a: &CsrMatrix, b: &Vector, config: PcgConfig) -> Result<Vector, SolveError> {
  let n = b.len();
  let mut x = Vector::zeros(n);
  if n == 0 {
    return Ok(x);
  }

  let mut diag = Vector::from_element(n, 1.0);
  for (r, c, &v) in a.triplet_iter() {
    if r == c && v.abs() > f64::MIN_POSITIVE {
      diag[r] = v;
    }
  }

  let tol = config
    .abs_tolerance
    .max(config.rel_tolerance * b.norm());
  let mut r = b.clone();
  if r.norm() <= tol {
    return Ok(x);
  }

  let mut z = r.component_div(&diag);
  let mut p = z.clone();
  let mut rz_old = r.dot(&z);

  for _ in 0..config.max_iterations {
    let ap: Vector = a * &p;
    let denom = p.dot(&ap);
    if denom.abs() < f64::MIN_POSITIVE {
      break;
    }
    let alpha = rz_old / denom;
    x.axpy(alpha, &p, 1.0);
    r.axpy(-alpha, &ap, 1.0);

    if r.norm() <= tol {
      return Ok(x);
    }

    z = r.component_div(&diag);
    let rz_new = r.dot(&z);
    let beta = rz_new / rz_old;
    p = &z + beta * &p;
    rz_old = rz_new;
  }

  let residual = r.norm();
  if residual <= tol {
    Ok(x)
  } else {
    Err(SolveError::NoConvergence {
      iterations: config.max_iterations,
      residual,
    })
  }
}

pub trait CooMatrixExt {
  fn set_zero<F>(&mut self, predicate: F)
  where
    F: Fn(usize, usize) -> bool;
  /// Principal submatrix on the given (sorted, unique) indices.
  fn restrict(&self, indices: &[usize]) -> Self;
}
impl CooMatrixExt for CooMatrix {
  fn set_zero<F>(&mut self, predicate: F)
  where
    F: Fn(usize, usize) -> bool,
  {
    let nrows = self.nrows();
    let ncols = self.ncols();
    let (mut rows, mut cols, mut vals) = mem::replace(self, Self::new(0, 0)).disassemble();
    let mut i = 0;
    while i < rows.len() {
      let r = rows[i];
      let c = cols[i];
      if predicate(r, c) {
        rows.swap_remove(i);
        cols.swap_remove(i);
        vals.swap_remove(i);
      } else {
        i += 1;
      }
    }
    *self = Self::try_from_triplets(nrows, ncols, rows, cols, vals)
      .expect("Removing entries keeps indices in bounds.");
  }

  fn restrict(&self, indices: &[usize]) -> Self {
    let mut map = vec![None; self.nrows().max(self.ncols())];
    for (inew, &iold) in indices.iter().enumerate() {
      map[iold] = Some(inew);
    }
    let mut restricted = Self::new(indices.len(), indices.len());
    for (r, c, &v) in self.triplet_iter() {
      if let (Some(r), Some(c)) = (map[r], map[c]) {
        restricted.push(r, c, v);
      }
    }
    restricted
  }
}

#[cfg(test)]
mod test {
  use super::*;
  use approx::assert_relative_eq;

  fn poisson_1d(n: usize) -> CooMatrix {
    let mut a = CooMatrix::new(n, n);
    for i in 0..n {
      a.push(i, i, 2.0);
      if i > 0 {
        a.push(i, i - 1, -1.0);
        a.push(i - 1, i, -1.0);
      }
    }
    a
  }

  #[test]
  fn lu_solves_nonsymmetric_system() {
    let mut a = poisson_1d(5);
    a.push(0, 1, 0.5);
    a.push(3, 1, 0.25);
    let x_exact = Vector::from_fn(5, |i, _| i as f64 - 1.5);
    let csc = CscMatrix::from(&a);
    let b: Vector = &csc * &x_exact;
    let x = FaerLu::new(csc).unwrap().solve(&b).unwrap();
    for i in 0..5 {
      assert_relative_eq!(x[i], x_exact[i], epsilon = 1e-12);
    }
  }

  #[test]
  fn cholesky_and_pcg_agree() {
    let a = poisson_1d(20);
    let b = Vector::from_element(20, 1.0);
    let x_chol = FaerCholesky::new(CscMatrix::from(&a))
      .unwrap()
      .solve(&b)
      .unwrap();
    let x_pcg = pcg(&CsrMatrix::from(&a), &b, PcgConfig::default()).unwrap();
    assert!((x_chol - x_pcg).norm() < 1e-9);
  }

  #[test]
  fn singular_factorizations_are_errors() {
    let mut a = CooMatrix::new(2, 2);
    for (i, j) in [(0, 0), (0, 1), (1, 0), (1, 1)] {
      a.push(i, j, 1.0);
    }
    let lu = FaerLu::new(CscMatrix::from(&a));
    assert!(matches!(lu, Err(SolveError::Factorization { size: 2, .. })));

    let mut indefinite = poisson_1d(3);
    indefinite.push(1, 1, -4.0);
    let cholesky = FaerCholesky::new(CscMatrix::from(&indefinite));
    assert!(matches!(cholesky, Err(SolveError::Cholesky { size: 3, .. })));
  }

  #[test]
  fn pcg_reports_non_convergence() {
    let a = poisson_1d(50);
    let b = Vector::from_element(50, 1.0);
    let config = PcgConfig {
      max_iterations: 2,
      ..Default::default()
    };
    let result = pcg(&CsrMatrix::from(&a), &b, config);
    assert!(matches!(result, Err(SolveError::NoConvergence { .. })));
  }

  #[test]
  fn restrict_and_set_zero() {
    let a = poisson_1d(4);
    let sub = a.restrict(&[1, 2]);
    let dense = na::DMatrix::from(&sub);
    assert_eq!(dense, na::DMatrix::from_row_slice(2, 2, &[2.0, -1.0, -1.0, 2.0]));

    let mut a = poisson_1d(3);
    a.set_zero(|r, c| r == 0 || c == 0);
    let dense = na::DMatrix::from(&a);
    assert_eq!(dense.row(0).sum(), 0.0);
    assert_eq!(dense.column(0).sum(), 0.0);
    assert_eq!(dense[(1, 1)], 2.0);
  }
}
