//! Core allocation logic and the abstractions around it

pub mod allocation;
pub mod config;
pub mod custom;
pub mod log;
pub mod optimizer;
pub mod product;
pub mod scenario;
pub mod scheme;
pub mod solver;
pub mod source;
pub mod store;

pub use allocation::{AllocationResult, Mode, Preference};
pub use product::Catalog;
pub use solver::{SolveOutcome, SolveRequest};
