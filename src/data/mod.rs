//! Data loading for the command-line collaborator
//!
//! Sparse labelled samples come in libsvm format; dense matrices for the
//! linear solver come as whitespace or comma separated rows.

pub mod dense;
pub mod libsvm;

pub use self::dense::*;
pub use self::libsvm::*;
