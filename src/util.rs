/// Order of convergence between two successive refinements by a factor of two.
///
/// Degenerate inputs (zero, negative or non-finite errors) give NaN or infinities.
pub fn algebraic_convergence_rate(next: f64, prev: f64) -> f64 {
  let quot: f64 = next / prev;
  -quot.log2()
}

pub fn is_degenerate_error(err: f64) -> bool {
  !(err.is_finite() && err > 0.0)
}

pub fn sparse_to_dense_data<T>(sparse: Vec<(usize, T)>, len: usize) -> Vec<Option<T>> {
  let mut dense = Vec::from_iter((0..len).map(|_| None));
  sparse.into_iter().for_each(|(i, t)| dense[i] = Some(t));
  dense
}

#[cfg(test)]
mod test {
  use super::*;
  use approx::assert_relative_eq;

  #[test]
  fn rate_of_halving_errors() {
    assert_relative_eq!(algebraic_convergence_rate(0.25, 1.0), 2.0);
    assert_relative_eq!(algebraic_convergence_rate(0.125, 1.0), 3.0);
    assert!(algebraic_convergence_rate(0.0, 0.0).is_nan());
    assert!(is_degenerate_error(0.0));
    assert!(is_degenerate_error(f64::NAN));
    assert!(!is_degenerate_error(1e-8));
  }

  #[test]
  fn dense_data_from_sparse() {
    assert_eq!(
      sparse_to_dense_data(vec![(1, 'a'), (3, 'b')], 4),
      vec![None, Some('a'), None, Some('b')]
    );
  }
}
