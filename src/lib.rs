// Main library entry point for callscope.

pub mod api;
pub mod application;
pub mod config;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod ports;

pub use application::{AnalyzeUsecase, TreeRequest};
pub use config::AnalysisConfig;
pub use error::{AnalysisError, Result};
