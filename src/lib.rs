//! Dense decompositions and kernel machines in pure Rust
//!
//! - [`linalg`]: LU, Cholesky, QR, eigenvalue and singular value
//!   decompositions, plus [`linalg::solve`] which picks the cheapest
//!   decomposition that can handle a system and falls back to the
//!   pseudo-inverse.
//! - [`solver`], [`optimizer`], [`api`]: SMO training of kernel support
//!   vector machines; [`multiclass`] combines binary machines one-vs-one.
//! - [`ransac`]: robust model fitting by random sample consensus.
//!
//! [`data`] and [`persistence`] only move arrays between files and the
//! in-memory types above.

pub mod api;
pub mod cache;
pub mod core;
pub mod data;
pub mod kernel;
pub mod linalg;
pub mod multiclass;
pub mod optimizer;
pub mod persistence;
pub mod ransac;
pub mod solver;

// Re-export main types for convenience
pub use crate::api::{EvaluationMetrics, ModelInfo, TrainedModel, SVM};
pub use crate::cache::{CacheStats, KernelCache};
pub use crate::core::error::{Error, Result};
pub use crate::core::traits::*;
pub use crate::core::types::*;
pub use crate::data::LibSVMDataset;
pub use crate::kernel::{estimate_complexity, Kernel, KernelType, LinearKernel, RBFKernel};
pub use crate::linalg::{Matrix, Solution, SolveMethod};
pub use crate::multiclass::{MulticlassModel, MulticlassSVM};
pub use crate::optimizer::{LinearMachine, SVMOptimizer, TrainedSVM};
pub use crate::ransac::{Estimator, Ransac, RansacConfig, RansacResult};
pub use crate::solver::SMOSolver;

// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
