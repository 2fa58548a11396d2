extern crate nalgebra as na;
extern crate nalgebra_sparse as nas;

pub mod assemble;
pub mod backend;
pub mod cli;
pub mod config;
pub mod error;
pub mod expr;
pub mod fe;
pub mod flux;
pub mod io;
pub mod linalg;
pub mod mesh;
pub mod operators;
pub mod problems;
pub mod quadrature;
pub mod space;
pub mod util;

pub type Point = na::Vector2<f64>;
pub type Vector2 = na::Vector2<f64>;
pub type Matrix2 = na::Matrix2<f64>;
