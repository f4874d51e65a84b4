// src/config/mod.rs
pub mod ai;
pub mod sources;

pub use ai::OracleConfig;
pub use sources::{load_registries_default, Registries};
