//! Step-by-step OpenGL exercises built on a small set of GL resource wrappers.

pub mod abs;
pub mod config;
pub mod exercises;
pub mod logging;
