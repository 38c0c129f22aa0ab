pub mod analysis;
pub mod config;
pub mod equilibrium;
pub mod error;
pub mod gbm;
pub mod profit;
pub mod request;
pub mod scr;
pub mod shocks;
pub mod simulation;
pub mod types;

pub use error::{ModelError, Result};
