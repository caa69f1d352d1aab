//! # Graphweave Configuration
//!
//! Typed configuration for the store connection, the LLM provider, ingestion
//! limits and graph read policy.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use graphweave_config::ConfigLoader;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ConfigLoader::load_from_file("graphweave.toml").await?;
//!     println!("max rows per run: {}", config.ingestion.max_rows);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod components;
mod config;
mod loader;

pub use components::*;
pub use config::*;
pub use loader::*;
