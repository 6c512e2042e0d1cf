//! Header descriptor types

use qvd_core::FieldKind;

/// Literal that closes the XML header
pub const HEADER_TERMINATOR: &[u8] = b"</QvdTableHeader>";

/// A byte range inside the input buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub offset: usize,
    pub len: usize,
}

impl Span {
    pub fn new(offset: usize, len: usize) -> Self {
        Self { offset, len }
    }

    /// Exclusive end, or `None` on overflow
    pub fn end(&self) -> Option<usize> {
        self.offset.checked_add(self.len)
    }

    /// The span's bytes, or `None` if it runs past `bytes`
    pub fn slice<'a>(&self, bytes: &'a [u8]) -> Option<&'a [u8]> {
        bytes.get(self.offset..self.end()?)
    }

    /// The part of the span that `bytes` actually holds
    pub fn slice_available<'a>(&self, bytes: &'a [u8]) -> &'a [u8] {
        let start = self.offset.min(bytes.len());
        let end = self.offset.saturating_add(self.len).min(bytes.len());
        &bytes[start..end]
    }
}

/// Everything the header says about the file layout
#[derive(Debug, Clone, PartialEq)]
pub struct FileDescriptor {
    pub table_name: Option<String>,
    pub creator_doc: Option<String>,
    pub build_no: Option<String>,
    pub create_utc_time: Option<String>,
    /// Number of records in the row region
    pub record_count: usize,
    /// Row stride in bytes (`RecordByteSize`)
    pub record_byte_size: usize,
    pub fields: Vec<FieldDescriptor>,
    /// Bytes from the start of the input to the start of the binary payload
    pub header_len: usize,
    /// Absolute span holding every field's symbol table
    pub symbol_region: Span,
    /// Absolute span holding the packed records, as declared
    pub row_region: Span,
}

impl FileDescriptor {
    /// Row stride in bits
    pub fn record_bits(&self) -> usize {
        self.record_byte_size.saturating_mul(8)
    }

    /// Sum of all field bit widths
    pub fn total_bit_width(&self) -> usize {
        self.fields.iter().map(|f| f.bit_width).sum()
    }

    /// Bytes the row region must hold for every declared record
    pub fn required_row_bytes(&self) -> Option<usize> {
        self.record_count.checked_mul(self.record_byte_size)
    }
}

/// One field of the table
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDescriptor {
    pub name: String,
    pub bit_offset: usize,
    pub bit_width: usize,
    /// Added to the raw bit value to get the symbol index
    pub bias: i64,
    pub kind: FieldKind,
    /// Absolute span of this field's symbol table
    pub symbols: Span,
    /// `NoOfSymbols`, when the header carries it
    pub declared_symbols: Option<usize>,
    pub tags: Vec<String>,
    pub number_format: Option<String>,
}

impl FieldDescriptor {
    /// Exclusive end bit, or `None` on overflow
    pub fn bit_end(&self) -> Option<usize> {
        self.bit_offset.checked_add(self.bit_width)
    }
}
