//! SVM solver implementations
//!
//! This module implements the Sequential Minimal Optimization (SMO) algorithm
//! of Platt, in the gradient formulation with working-set selection by
//! Fan, Chen and Lin ("Working Set Selection Using Second Order Information
//! for Training SVM").

pub mod smo;

pub use self::smo::*;
