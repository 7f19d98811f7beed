//! CCA: calibration certificate critical analysis
//!
//! Reviews calibration certificates of oil and gas measurement instruments.
//! Each review is a plain-text YAML record; calibration points are judged
//! with the decision rule `|Erro| + U ≤ EMA` and summarized into a
//! conformity assessment and a range recommendation. Regulatory tables of
//! maximum uncertainties and periodicities are embedded for lookup.

pub mod cli;
pub mod conformity;
pub mod core;
pub mod entities;
pub mod reference;
pub mod schema;
pub mod yaml;
