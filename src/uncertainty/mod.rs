//! Uncertainty quantification.
//!
//! - percentile bootstrap for one sample and for a pre→post delta (`bootstrap`)
//! - closed-form propagation through harmonization weights (`propagation`)

pub mod bootstrap;
pub mod propagation;

pub use bootstrap::*;
pub use propagation::*;
