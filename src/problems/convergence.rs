//! Resolution sweep for the induction problem with empirical convergence rates.

use super::induction::{InductionSolver, RunReport};
use crate::{
  backend::DgBackend,
  config::InductionConfig,
  error::SolveError,
  io::{NullOutput, VtkOutput},
  mesh::CartesianMesh,
  util::{algebraic_convergence_rate, is_degenerate_error},
};

use std::{num::NonZeroUsize, path::PathBuf};
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConvergenceRecord {
  pub resolution: usize,
  pub div_error: f64,
  pub l2_error: f64,
}

/// Rates between two successive resolutions, assumed to differ by a factor of two.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConvergenceRate {
  pub resolutions: [usize; 2],
  pub l2_rate: f64,
  pub div_rate: f64,
}

#[derive(Debug, Clone)]
pub struct ConvergenceReport {
  pub degree: usize,
  pub records: Vec<ConvergenceRecord>,
  pub runs: Vec<RunReport>,
}
impl ConvergenceReport {
  pub fn rates(&self) -> Vec<ConvergenceRate> {
    self
      .records
      .windows(2)
      .map(|pair| {
        let [prev, next] = [pair[0], pair[1]];
        for err in [prev.l2_error, next.l2_error, prev.div_error, next.div_error] {
          if is_degenerate_error(err) {
            warn!(
              "degenerate error {err:e} between np={} and np={}",
              prev.resolution, next.resolution
            );
          }
        }
        ConvergenceRate {
          resolutions: [prev.resolution, next.resolution],
          l2_rate: algebraic_convergence_rate(next.l2_error, prev.l2_error),
          div_rate: algebraic_convergence_rate(next.div_error, prev.div_error),
        }
      })
      .collect()
  }
}

/// Runs the induction solver for every resolution in order.
#[derive(Debug, Clone)]
pub struct ConvergenceStudy {
  config: InductionConfig,
  degree: usize,
  resolutions: Vec<usize>,
  save_interval: NonZeroUsize,
  /// Every resolution writes into its own `np<N>` subdirectory.
  output_dir: Option<PathBuf>,
}
impl ConvergenceStudy {
  pub fn new(
    config: InductionConfig,
    degree: usize,
    resolutions: Vec<usize>,
    save_interval: NonZeroUsize,
  ) -> Self {
    Self {
      config,
      degree,
      resolutions,
      save_interval,
      output_dir: None,
    }
  }
  pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
    self.output_dir = Some(dir.into());
    self
  }

  pub fn run(&self) -> Result<ConvergenceReport, SolveError> {
    let mut records = Vec::with_capacity(self.resolutions.len());
    let mut runs = Vec::with_capacity(self.resolutions.len());

    for &np in &self.resolutions {
      let report = self.run_resolution(np)?;
      info!(
        "np={np}, div={:e}, err={:e}",
        report.div_error, report.l2_error
      );
      records.push(ConvergenceRecord {
        resolution: np,
        div_error: report.div_error,
        l2_error: report.l2_error,
      });
      runs.push(report);
    }

    Ok(ConvergenceReport {
      degree: self.degree,
      records,
      runs,
    })
  }

  fn run_resolution(&self, np: usize) -> Result<RunReport, SolveError> {
    let mesh = CartesianMesh::new(self.config.domain.clone(), np);
    let backend = DgBackend::from_mesh(mesh, self.degree);
    let solver = InductionSolver::new(&backend, &self.config, self.save_interval);
    match &self.output_dir {
      Some(dir) => solver.run(&mut VtkOutput::new(dir.join(format!("np{np}")))?),
      None => solver.run(&mut NullOutput),
    }
  }
}

#[cfg(test)]
mod test {
  use super::*;
  use approx::assert_relative_eq;

  fn record(resolution: usize, l2_error: f64, div_error: f64) -> ConvergenceRecord {
    ConvergenceRecord {
      resolution,
      div_error,
      l2_error,
    }
  }

  #[test]
  fn rates_from_records() {
    let report = ConvergenceReport {
      degree: 1,
      records: vec![record(10, 1e-2, 4e-1), record(20, 2.5e-3, 2e-1), record(40, 6.25e-4, 1e-1)],
      runs: Vec::new(),
    };
    let rates = report.rates();
    assert_eq!(rates.len(), 2);
    assert_eq!(rates[0].resolutions, [10, 20]);
    for rate in rates {
      assert_relative_eq!(rate.l2_rate, 2.0, epsilon = 1e-12);
      assert_relative_eq!(rate.div_rate, 1.0, epsilon = 1e-12);
    }
  }

  #[test]
  fn single_resolution_has_no_rates() {
    let report = ConvergenceReport {
      degree: 0,
      records: vec![record(10, 1.0, 1.0)],
      runs: Vec::new(),
    };
    assert!(report.rates().is_empty());
  }
}
