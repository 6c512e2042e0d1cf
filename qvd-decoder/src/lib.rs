//! # QVD Decoder
//!
//! Decodes QVD files into column-oriented tables.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        Decode Path                           │
//! │                                                              │
//! │  &[u8] ──> Header Parser ──> FileDescriptor                  │
//! │                                   │                          │
//! │                                   ▼                          │
//! │             Symbol Table Decoder (per field, rayon)          │
//! │                                   │                          │
//! │                                   ▼                          │
//! │    Row Unpacker (bit extractor + bias + sentinel, rayon)     │
//! │                                   │                          │
//! │                                   ▼                          │
//! │                 Table Assembler ──> Table                    │
//! └──────────────────────────────────────────────────────────────┘
//!
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        Outer Layers                          │
//! │                                                              │
//! │  Path / Read ──> source ──> bytes ──> DecodeCache (blake3)   │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! The core modules (`header`, `symbol`, `bits`, `rows`, `assemble`,
//! `decoder`) only ever see a byte slice. `source` and `cache` sit outside
//! the pipeline and are optional.

pub mod assemble;
pub mod bits;
pub mod cache;
pub mod decoder;
pub mod header;
pub mod rows;
pub mod source;
pub mod symbol;

pub use cache::{CacheStats, ContentKey, DecodeCache};
pub use decoder::{decode, Decoder};
pub use header::{parse_header, FieldDescriptor, FileDescriptor, Span};
pub use source::{read_from, read_path, QvdFile};
pub use symbol::{SymbolTable, SymbolTag};

pub use qvd_core::{Column, DecodeConfig, Error, FieldKind, FormatError, Result, Symbol, Table, Value};
