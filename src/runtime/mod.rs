//! Calibration hooks for floating-point execution
//!
//! A [`CalibrationSession`] is handed to the float runtime as an
//! [`ExecutionObserver`]; it folds every executed layer's tensors into a
//! statistics store and writes the snapshot when the session ends.

mod session;


pub use session::{CalibrationSession, ExecutionObserver};
