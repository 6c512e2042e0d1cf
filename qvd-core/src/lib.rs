//! # QVD Core
//!
//! This crate provides the fundamental building blocks shared by the QVD
//! decoder and its front ends:
//! - Value types (symbols, cells)
//! - The column-oriented table
//! - Error types
//! - Configuration
//! - Decode metrics
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │                    qvd-core                     │
//! ├─────────────────────────────────────────────────┤
//! │  • value    - Symbols and cell values          │
//! │  • types    - Field kinds, columns, tables     │
//! │  • error    - Error handling                   │
//! │  • config   - Decoder and logging settings     │
//! │  • metrics  - Stage timers and decode stats    │
//! └─────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod error;
pub mod metrics;
pub mod types;
pub mod value;

// Re-export commonly used types
pub use config::{Config, DecodeConfig, LogFormat, LogLevel, LoggingConfig};
pub use error::{Error, FormatError, Result};
pub use types::{Column, FieldKind, Table};
pub use value::{Symbol, Value};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
