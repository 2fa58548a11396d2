//! Module for the resistive Induction Equation.
//!
//! $partial_t B + div(u times.o B - B times.o u) + u div B = -curl(epsilon curl B)$
//!
//! A single backward Euler step provides the second starting value,
//! after which BDF2 is used with a system matrix that is factorized only once.

use crate::{
  assemble::GalVec,
  backend::{FeBackend, NormKind},
  config::InductionConfig,
  error::SolveError,
  expr::{RigidRotation, RotatingHump},
  flux::InductionFlux,
  io::RunOutput,
  operators::{ImplicitStepLhs, ImplicitStepRhs},
  space::VectorField,
};

use std::{mem, num::NonZeroUsize};
use tracing::{debug, info};

/// Time levels of a fixed step size run.
///
/// The step count is fixed first, the step size then divides the horizon exactly.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeStepState {
  t: f64,
  it: usize,
  dt: f64,
  horizon: f64,
  nsteps: usize,
}
impl TimeStepState {
  /// $N = "round"(T / ("cfl" h))$ at least one, $"dt" = T / N$.
  pub fn new(horizon: f64, mesh_width: f64, cfl: f64) -> Self {
    let dt_target = cfl * mesh_width;
    let nsteps = ((horizon / dt_target).round() as usize).max(1);
    Self {
      t: 0.0,
      it: 0,
      dt: horizon / nsteps as f64,
      horizon,
      nsteps,
    }
  }

  pub fn advance(&mut self) {
    self.it += 1;
    self.t += self.dt;
  }
  pub fn is_finished(&self) -> bool {
    self.it >= self.nsteps
  }
  pub fn next_time(&self) -> f64 {
    self.t + self.dt
  }

  pub fn t(&self) -> f64 {
    self.t
  }
  pub fn it(&self) -> usize {
    self.it
  }
  pub fn dt(&self) -> f64 {
    self.dt
  }
  pub fn horizon(&self) -> f64 {
    self.horizon
  }
  pub fn nsteps(&self) -> usize {
    self.nsteps
  }
}

/// The last three time levels $B^(n-2), B^(n-1), B^n$.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldHistory {
  pub b0: VectorField,
  pub b1: VectorField,
  pub b2: VectorField,
}
impl FieldHistory {
  pub fn new(initial: VectorField) -> Self {
    Self {
      b0: initial.clone(),
      b1: initial.clone(),
      b2: initial,
    }
  }

  /// $B^0 <- B^1$, $B^1 <- B^2$.
  pub fn shift(&mut self) {
    self.b0 = mem::replace(&mut self.b1, self.b2.clone());
  }

  /// Most recent computed time level.
  pub fn latest(&self) -> &VectorField {
    &self.b1
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
  Init,
  Bootstrap,
  Steady,
  Done,
}

/// [`Stage`] together with the resources owned by it.
enum Phase<F> {
  Init,
  Bootstrap,
  /// Holds the BDF2 system, factorized when entering the stage.
  Steady(F),
  Done,
}
impl<F> Phase<F> {
  fn stage(&self) -> Stage {
    match self {
      Self::Init => Stage::Init,
      Self::Bootstrap => Stage::Bootstrap,
      Self::Steady(_) => Stage::Steady,
      Self::Done => Stage::Done,
    }
  }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
  pub resolution: usize,
  pub degree: usize,
  pub nsteps: usize,
  pub dt: f64,
  pub final_time: f64,
  pub l2_error: f64,
  pub div_error: f64,
  pub nsnapshots: usize,
}

/// Time integrator for the rotating hump problem.
pub struct InductionSolver<'a, B: FeBackend> {
  backend: &'a B,
  flux: InductionFlux<RigidRotation>,
  state: TimeStepState,
  history: FieldHistory,
  phase: Phase<B::Factorization>,
  save_interval: NonZeroUsize,
  nsnapshots: usize,
}
impl<'a, B: FeBackend> InductionSolver<'a, B> {
  const BDF2_WEIGHTS: [f64; 2] = [4.0 / 3.0, -1.0 / 3.0];
  const BDF2_COEFF: f64 = 2.0 / 3.0;

  pub fn new(backend: &'a B, config: &InductionConfig, save_interval: NonZeroUsize) -> Self {
    let mesh_width = backend.space().mesh().mesh_width();
    let state = TimeStepState::new(config.horizon, mesh_width, config.cfl);
    let initial = backend.interpolate(&RotatingHump::at(0.0));
    Self {
      backend,
      flux: InductionFlux::new(RigidRotation, config.flux),
      state,
      history: FieldHistory::new(initial),
      phase: Phase::Init,
      save_interval,
      nsnapshots: 0,
    }
  }

  pub fn stage(&self) -> Stage {
    self.phase.stage()
  }
  pub fn state(&self) -> &TimeStepState {
    &self.state
  }
  pub fn history(&self) -> &FieldHistory {
    &self.history
  }
  pub fn flux(&self) -> &InductionFlux<RigidRotation> {
    &self.flux
  }
  pub fn nsnapshots(&self) -> usize {
    self.nsnapshots
  }

  /// Performs the work of the current stage and moves on.
  ///
  /// Each call in the steady stage is a single BDF2 step.
  /// After an error the solver is done.
  pub fn advance(&mut self, output: &mut impl RunOutput) -> Result<Stage, SolveError> {
    match mem::replace(&mut self.phase, Phase::Done) {
      Phase::Init => {
        output.snapshot(self.backend.space(), 0.0, &self.history.b0)?;
        self.nsnapshots += 1;
        self.phase = Phase::Bootstrap;
      }
      Phase::Bootstrap => {
        self.bootstrap_step()?;
        self.save_if_due(output)?;
        if !self.state.is_finished() {
          self.phase = Phase::Steady(self.factorize_bdf2()?);
        }
      }
      Phase::Steady(factorization) => {
        self.bdf2_step(&factorization)?;
        self.save_if_due(output)?;
        if !self.state.is_finished() {
          self.phase = Phase::Steady(factorization);
        }
      }
      Phase::Done => {}
    }
    Ok(self.stage())
  }

  /// Runs all remaining stages and evaluates the final time level.
  pub fn run(mut self, output: &mut impl RunOutput) -> Result<RunReport, SolveError> {
    info!(
      "solving induction equation with np={}, degree={}, nsteps={}, dt={:e}",
      self.backend.space().mesh().ncells_axis(),
      self.backend.space().degree(),
      self.state.nsteps(),
      self.state.dt()
    );
    while self.stage() != Stage::Done {
      self.advance(output)?;
    }
    self.finish(output)
  }

  /// Error diagnostics against the exact solution at the current time.
  pub fn finish(&self, output: &mut impl RunOutput) -> Result<RunReport, SolveError> {
    let t = self.state.t();
    let exact = RotatingHump::at(t);
    let solution = self.history.latest();

    let l2_error = self.backend.error_norm(solution, &exact);
    let div_error = self.backend.norm(solution, NormKind::DivergenceL2);

    let error = solution - &self.backend.interpolate(&exact);
    output.error_field(self.backend.space(), &error)?;

    let report = RunReport {
      resolution: self.backend.space().mesh().ncells_axis(),
      degree: self.backend.space().degree(),
      nsteps: self.state.nsteps(),
      dt: self.state.dt(),
      final_time: t,
      l2_error,
      div_error,
      nsnapshots: self.nsnapshots,
    };
    info!(
      "np={}, t={t}, l2 error={l2_error:e}, div error={div_error:e}",
      report.resolution
    );
    Ok(report)
  }

  /// Backward Euler from $B^0$ into $B^1$, no matrix is kept.
  fn bootstrap_step(&mut self) -> Result<(), SolveError> {
    info!("bootstrapping with backward Euler");
    let dt = self.state.dt();
    let lhs = ImplicitStepLhs {
      flux: &self.flux,
      coeff: dt,
    };
    let galmat = self.backend.assemble_bilinear(lhs);
    let galvec = self.rhs(dt, &self.history.b0);
    self.history.b1 = self.backend.solve_once(galmat, &galvec)?;
    self.history.b2 = self.history.b1.clone();
    self.state.advance();
    debug!("it={}, dt={}, t={}", self.state.it(), self.state.dt(), self.state.t());
    Ok(())
  }

  fn factorize_bdf2(&self) -> Result<B::Factorization, SolveError> {
    info!("assembling and factorizing BDF2 system");
    let lhs = ImplicitStepLhs {
      flux: &self.flux,
      coeff: Self::BDF2_COEFF * self.state.dt(),
    };
    let galmat = self.backend.assemble_bilinear(lhs);
    self.backend.factorize(galmat)
  }

  fn bdf2_step(&mut self, factorization: &B::Factorization) -> Result<(), SolveError> {
    let [w1, w0] = Self::BDF2_WEIGHTS;
    let known = VectorField::linear_combination(w1, &self.history.b1, w0, &self.history.b0);
    let galvec = self.rhs(Self::BDF2_COEFF * self.state.dt(), &known);
    self.history.b2 = self.backend.solve(factorization, &galvec)?;
    self.history.shift();
    self.state.advance();
    debug!("it={}, dt={}, t={}", self.state.it(), self.state.dt(), self.state.t());
    Ok(())
  }

  /// Right hand side for the next time level.
  fn rhs(&self, coeff: f64, known: &VectorField) -> GalVec {
    let rhs = ImplicitStepRhs {
      flux: &self.flux,
      coeff,
      known,
      boundary: RotatingHump::at(self.state.next_time()),
    };
    self.backend.assemble_linear(rhs)
  }

  fn save_if_due(&mut self, output: &mut impl RunOutput) -> Result<(), SolveError> {
    if self.state.it() % self.save_interval == 0 {
      output.snapshot(self.backend.space(), self.state.t(), self.history.latest())?;
      self.nsnapshots += 1;
    }
    Ok(())
  }
}

/// Residual $A x - b$ of an implicit step $(x - K, v) + c F(x, v; g) = 0$.
///
/// Evaluates the flux with a known `solution` instead of solving for it.
pub fn implicit_step_residual<B: FeBackend>(
  backend: &B,
  flux: &InductionFlux<RigidRotation>,
  coeff: f64,
  known: &VectorField,
  boundary: RotatingHump,
  solution: &VectorField,
) -> GalVec {
  let galmat = backend.assemble_bilinear(ImplicitStepLhs { flux, coeff });
  let galvec = backend.assemble_linear(ImplicitStepRhs {
    flux,
    coeff,
    known,
    boundary,
  });
  &nas::CsrMatrix::from(&galmat) * solution.coeffs() - galvec
}

#[cfg(test)]
mod test {
  use super::*;
  use approx::assert_relative_eq;
  use std::f64::consts::FRAC_PI_2;

  #[test]
  fn step_size_divides_horizon() {
    for np in [1, 2, 5, 20, 40, 80] {
      let h = 2.0 / np as f64;
      let state = TimeStepState::new(FRAC_PI_2, h, 0.5);
      let expected_nsteps = ((FRAC_PI_2 / (0.5 * h)).round() as usize).max(1);
      assert_eq!(state.nsteps(), expected_nsteps);
      assert_relative_eq!(state.dt() * state.nsteps() as f64, FRAC_PI_2, epsilon = 1e-14);

      let mut state = state;
      while !state.is_finished() {
        state.advance();
      }
      assert_eq!(state.it(), state.nsteps());
      assert_relative_eq!(state.t(), FRAC_PI_2, epsilon = 1e-12);
    }
  }

  #[test]
  fn tiny_horizon_still_takes_one_step() {
    let state = TimeStepState::new(1e-3, 0.1, 0.5);
    assert_eq!(state.nsteps(), 1);
    assert_eq!(state.dt(), 1e-3);
  }

  #[test]
  fn history_shift_moves_levels() {
    let field = |v: f64| VectorField::new(na::DVector::from_element(3, v));
    let mut history = FieldHistory::new(field(0.0));
    history.b1 = field(1.0);
    history.b2 = field(2.0);
    history.shift();
    assert_eq!(history.b0, field(1.0));
    assert_eq!(history.b1, field(2.0));
    assert_eq!(history.latest(), &field(2.0));
  }
}
