//! Statistics toolkit: pure numeric primitives shared by every analyzer.
//!
//! - descriptive moments, CAGR and percentiles (`descriptive`)
//! - OLS trend with direction + significance labels (`trend`)
//! - IQR and z-score outlier detectors (`outliers`)
//! - flat series summaries (`series`)

pub mod descriptive;
pub mod outliers;
pub mod series;
pub mod trend;

pub use descriptive::*;
pub use outliers::*;
pub use series::*;
pub use trend::*;
