pub mod convergence;
pub mod induction;
pub mod laplace_lagrange;
