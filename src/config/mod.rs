//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → AppConfig (validated, immutable)
//!
//! Secrets (private key, Pinata credentials)
//!     → environment variables only, never in the file
//! ```
//!
//! # Design Decisions
//! - All fields have defaults so an empty file targets a local devnet
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, load_or_default, ConfigError};
pub use schema::{
    AppConfig, EvaluatorConfig, LedgerConfig, ObservabilityConfig, StorageConfig, StorageProvider,
};
