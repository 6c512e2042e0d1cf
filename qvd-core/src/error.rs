//! # Error Handling
//!
//! Error types for QVD decoding.
//!
//! ## Taxonomy
//!
//! 1. **Format**: the bytes are a QVD file but something in them is wrong
//!    (truncated header, unknown symbol tag, span overrun, bad bit index)
//! 2. **Input**: the bytes handed to the decoder are empty or not a QVD at all
//! 3. **Io / Configuration**: raised only by the outer layers (file sources,
//!    config loading), never by the decode pipeline itself
//!
//! Every format error names the region it was found in: a byte offset, a
//! field name or a record index.

use thiserror::Error;

/// Result type alias for QVD operations
pub type Result<T> = std::result::Result<T, Error>;

/// Primary error type
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Format(#[from] FormatError),

    #[error("Input error: {message}")]
    Input { message: String },

    #[error("IO error: {message}")]
    Io { message: String, source: std::io::Error },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

/// Structural violations found while decoding a QVD byte sequence.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormatError {
    // Header Errors
    #[error("header terminator `{marker}` not found in {scanned} bytes")]
    MissingHeaderTerminator { marker: &'static str, scanned: usize },

    #[error("malformed header: {message}")]
    MalformedHeader { message: String },

    #[error("{scope}: missing required attribute `{attribute}`")]
    MissingAttribute { scope: String, attribute: &'static str },

    #[error("{scope}: attribute `{attribute}` has invalid value `{value}`")]
    InvalidAttribute {
        scope: String,
        attribute: &'static str,
        value: String,
    },

    #[error("field `{field}` is declared more than once")]
    DuplicateField { field: String },

    #[error(
        "record byte size {declared} disagrees with field bit widths \
         ({total_bits} bits need {expected} bytes)"
    )]
    StrideMismatch {
        declared: usize,
        total_bits: usize,
        expected: usize,
    },

    #[error("field `{field}` bit width {bit_width} exceeds 64")]
    BitWidthTooLarge { field: String, bit_width: usize },

    #[error(
        "field `{field}` occupies bits {bit_offset}..{bit_end} but a record has {record_bits} bits"
    )]
    FieldOutsideRecord {
        field: String,
        bit_offset: usize,
        bit_end: usize,
        record_bits: usize,
    },

    #[error("{region} region [{start}, {start}+{len}) exceeds the {available}-byte input")]
    RegionOutOfBounds {
        region: &'static str,
        start: usize,
        len: usize,
        available: usize,
    },

    #[error(
        "field `{field}` symbol table [{offset}, {offset}+{len}) exceeds the {region_len}-byte symbol region"
    )]
    SymbolSpanOutOfBounds {
        field: String,
        offset: usize,
        len: usize,
        region_len: usize,
    },

    // Symbol Table Errors
    #[error("field `{field}`: unknown symbol tag 0x{tag:02x} at byte {offset}")]
    UnknownSymbolTag { field: String, tag: u8, offset: usize },

    #[error(
        "field `{field}`: {needed}-byte value at byte {offset} overruns the symbol table ending at byte {end}"
    )]
    SymbolOverrun {
        field: String,
        offset: usize,
        needed: usize,
        end: usize,
    },

    #[error("field `{field}`: string at byte {offset} has no terminator before byte {end}")]
    UnterminatedString { field: String, offset: usize, end: usize },

    #[error("field `{field}`: string at byte {offset} is not valid UTF-8")]
    InvalidUtf8 { field: String, offset: usize },

    #[error("field `{field}`: header declares {declared} symbols, table holds {decoded}")]
    SymbolCountMismatch {
        field: String,
        declared: usize,
        decoded: usize,
    },

    #[error("field `{field}`: {found} symbol at byte {offset} in a field declared {declared}")]
    KindMismatch {
        field: String,
        declared: &'static str,
        found: &'static str,
        offset: usize,
    },

    // Row Errors
    #[error("bit range {bit_offset}+{bit_width} does not fit a {available_bits}-bit slot")]
    BitRange {
        bit_offset: usize,
        bit_width: usize,
        available_bits: usize,
    },

    #[error(
        "row region holds {available} bytes but {records} records of {stride} bytes need {required}"
    )]
    RowRegionTruncated {
        records: usize,
        stride: usize,
        required: usize,
        available: usize,
    },

    #[error("field `{field}` record {record}: symbol index {index} is past the sentinel {sentinel}")]
    IndexOutOfRange {
        field: String,
        record: usize,
        index: i64,
        sentinel: usize,
    },

    #[error("field `{field}` record {record}: negative symbol index {index}")]
    NegativeIndex {
        field: String,
        record: usize,
        index: i64,
    },
}

impl Error {
    /// Shorthand for [`Error::Input`]
    pub fn input(message: impl Into<String>) -> Self {
        Error::Input {
            message: message.into(),
        }
    }

    /// True for errors caused by corrupt or truncated QVD content
    pub fn is_format(&self) -> bool {
        matches!(self, Error::Format(_))
    }

    /// Borrow the inner format error, if any
    pub fn as_format(&self) -> Option<&FormatError> {
        match self {
            Error::Format(e) => Some(e),
            _ => None,
        }
    }

    /// Get error code for monitoring
    pub fn error_code(&self) -> &'static str {
        match self {
            Error::Format(e) => e.error_code(),
            Error::Input { .. } => "INPUT_ERROR",
            Error::Io { .. } => "IO_ERROR",
            Error::Configuration { .. } => "CONFIG_ERROR",
            Error::Internal { .. } => "INTERNAL_ERROR",
        }
    }
}

impl FormatError {
    pub fn error_code(&self) -> &'static str {
        match self {
            FormatError::MissingHeaderTerminator { .. } => "HEADER_UNTERMINATED",
            FormatError::MalformedHeader { .. } => "HEADER_MALFORMED",
            FormatError::MissingAttribute { .. } => "HEADER_MISSING_ATTRIBUTE",
            FormatError::InvalidAttribute { .. } => "HEADER_INVALID_ATTRIBUTE",
            FormatError::DuplicateField { .. } => "HEADER_DUPLICATE_FIELD",
            FormatError::StrideMismatch { .. } => "STRIDE_MISMATCH",
            FormatError::BitWidthTooLarge { .. } => "BIT_WIDTH_TOO_LARGE",
            FormatError::FieldOutsideRecord { .. } => "FIELD_OUTSIDE_RECORD",
            FormatError::RegionOutOfBounds { .. } => "REGION_OUT_OF_BOUNDS",
            FormatError::SymbolSpanOutOfBounds { .. } => "SYMBOL_SPAN_OUT_OF_BOUNDS",
            FormatError::UnknownSymbolTag { .. } => "UNKNOWN_SYMBOL_TAG",
            FormatError::SymbolOverrun { .. } => "SYMBOL_OVERRUN",
            FormatError::UnterminatedString { .. } => "UNTERMINATED_STRING",
            FormatError::InvalidUtf8 { .. } => "INVALID_UTF8",
            FormatError::SymbolCountMismatch { .. } => "SYMBOL_COUNT_MISMATCH",
            FormatError::KindMismatch { .. } => "KIND_MISMATCH",
            FormatError::BitRange { .. } => "BIT_RANGE",
            FormatError::RowRegionTruncated { .. } => "ROW_REGION_TRUNCATED",
            FormatError::IndexOutOfRange { .. } => "INDEX_OUT_OF_RANGE",
            FormatError::NegativeIndex { .. } => "NEGATIVE_INDEX",
        }
    }

    /// Field the error was found in, when it is scoped to one
    pub fn field(&self) -> Option<&str> {
        match self {
            FormatError::DuplicateField { field }
            | FormatError::BitWidthTooLarge { field, .. }
            | FormatError::FieldOutsideRecord { field, .. }
            | FormatError::SymbolSpanOutOfBounds { field, .. }
            | FormatError::UnknownSymbolTag { field, .. }
            | FormatError::SymbolOverrun { field, .. }
            | FormatError::UnterminatedString { field, .. }
            | FormatError::InvalidUtf8 { field, .. }
            | FormatError::SymbolCountMismatch { field, .. }
            | FormatError::KindMismatch { field, .. }
            | FormatError::IndexOutOfRange { field, .. }
            | FormatError::NegativeIndex { field, .. } => Some(field),
            _ => None,
        }
    }
}

// Conversion from std::io::Error
impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io {
            message: err.to_string(),
            source: err,
        }
    }
}

/// Extension trait for adding context to results
pub trait ResultExt<T> {
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T> ResultExt<T> for Result<T> {
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| match e {
            Error::Io { message, source } => Error::Io {
                message: format!("{}: {}", f(), message),
                source,
            },
            Error::Configuration { message } => Error::Configuration {
                message: format!("{}: {}", f(), message),
            },
            other => other,
        })
    }
}
