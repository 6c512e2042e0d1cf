//! Symbol table decoding.
//!
//! Each field's symbol table is a run of tagged entries:
//!
//! | Tag | Entry |
//! |-----|-------|
//! | 1 | `i32` LE |
//! | 2 | `f64` LE |
//! | 4 | NUL-terminated UTF-8 |
//! | 5 | `i32` LE, then NUL-terminated UTF-8 |
//! | 6 | `f64` LE, then NUL-terminated UTF-8 |
//!
//! The field's declared span is authoritative: no read ever crosses its end,
//! even when the input continues into the next field's table.

use byteorder::{ByteOrder, LittleEndian};
use rayon::prelude::*;
use tracing::debug;

use qvd_core::error::{Error, FormatError, Result};
use qvd_core::{DecodeConfig, FieldKind, Symbol};

use crate::header::{FieldDescriptor, FileDescriptor};

/// Leading byte of a symbol entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum SymbolTag {
    Integer = 1,
    Real = 2,
    Text = 4,
    DualInteger = 5,
    DualReal = 6,
}

impl SymbolTag {
    pub fn as_byte(self) -> u8 {
        self as u8
    }

    pub fn from_byte(b: u8) -> Option<Self> {
        match b {
            1 => Some(Self::Integer),
            2 => Some(Self::Real),
            4 => Some(Self::Text),
            5 => Some(Self::DualInteger),
            6 => Some(Self::DualReal),
            _ => None,
        }
    }
}

/// The decoded symbols of one field, indexed 0..N-1
#[derive(Debug, Clone, PartialEq)]
pub struct SymbolTable {
    field: String,
    kind: FieldKind,
    symbols: Vec<Symbol>,
}

impl SymbolTable {
    pub fn new(field: impl Into<String>, kind: FieldKind, symbols: Vec<Symbol>) -> Self {
        Self {
            field: field.into(),
            kind,
            symbols,
        }
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn kind(&self) -> FieldKind {
        self.kind
    }

    pub fn symbols(&self) -> &[Symbol] {
        &self.symbols
    }

    pub fn get(&self, index: usize) -> Option<&Symbol> {
        self.symbols.get(index)
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// The index reserved for "no value": one past the last symbol
    pub fn sentinel(&self) -> usize {
        self.symbols.len()
    }
}

/// Decode the symbol tables of every field, in declaration order.
pub fn decode_symbol_tables(
    bytes: &[u8],
    descriptor: &FileDescriptor,
    config: &DecodeConfig,
) -> Result<Vec<SymbolTable>> {
    let decode = |field: &FieldDescriptor| decode_field_symbols(bytes, field, config.strict_kinds);

    if config.parallel {
        descriptor.fields.par_iter().map(decode).collect()
    } else {
        descriptor.fields.iter().map(decode).collect()
    }
}

/// Decode one field's symbol table from the full input buffer.
pub fn decode_field_symbols(bytes: &[u8], field: &FieldDescriptor, strict_kinds: bool) -> Result<SymbolTable> {
    let data = field.symbols.slice(bytes).ok_or(FormatError::RegionOutOfBounds {
        region: "symbol table",
        start: field.symbols.offset,
        len: field.symbols.len,
        available: bytes.len(),
    })?;

    let symbols = decode_symbols(&field.name, field.kind, data, field.symbols.offset, strict_kinds)?;

    if let Some(declared) = field.declared_symbols {
        if declared != symbols.len() {
            return Err(FormatError::SymbolCountMismatch {
                field: field.name.clone(),
                declared,
                decoded: symbols.len(),
            }
            .into());
        }
    }

    debug!(
        field = %field.name,
        kind = %field.kind,
        symbols = symbols.len(),
        bytes = data.len(),
        "Decoded symbol table"
    );
    Ok(SymbolTable::new(field.name.clone(), field.kind, symbols))
}

/// Decode a run of tagged entries. `base` is the absolute offset of
/// `data[0]` and only feeds error messages.
pub fn decode_symbols(
    field: &str,
    kind: FieldKind,
    data: &[u8],
    base: usize,
    strict_kinds: bool,
) -> std::result::Result<Vec<Symbol>, FormatError> {
    let mut reader = SpanReader::new(field, data, base);
    let mut symbols = Vec::new();
    let mut outside_kind = 0usize;

    while !reader.at_end() {
        let offset = reader.offset();
        let tag_byte = reader.read_u8()?;
        let tag = SymbolTag::from_byte(tag_byte).ok_or_else(|| FormatError::UnknownSymbolTag {
            field: field.to_string(),
            tag: tag_byte,
            offset,
        })?;

        let symbol = match tag {
            SymbolTag::Integer => Symbol::Integer(reader.read_i32()? as i64),
            SymbolTag::Real => Symbol::Real(reader.read_f64()?),
            SymbolTag::Text => Symbol::Text(reader.read_cstr()?),
            SymbolTag::DualInteger => {
                let number = reader.read_i32()? as i64;
                Symbol::DualInteger(number, reader.read_cstr()?)
            }
            SymbolTag::DualReal => {
                let number = reader.read_f64()?;
                Symbol::DualReal(number, reader.read_cstr()?)
            }
        };

        if !kind.admits(&symbol) {
            if strict_kinds {
                return Err(FormatError::KindMismatch {
                    field: field.to_string(),
                    declared: kind.as_str(),
                    found: symbol.type_name(),
                    offset,
                });
            }
            outside_kind += 1;
        }
        symbols.push(symbol);
    }

    if outside_kind > 0 {
        debug!(field, kind = %kind, outside_kind, "Symbols outside declared kind");
    }
    Ok(symbols)
}

/// Bounds-checked cursor over one field's symbol bytes
struct SpanReader<'a> {
    field: &'a str,
    data: &'a [u8],
    base: usize,
    pos: usize,
}

impl<'a> SpanReader<'a> {
    fn new(field: &'a str, data: &'a [u8], base: usize) -> Self {
        Self {
            field,
            data,
            base,
            pos: 0,
        }
    }

    fn at_end(&self) -> bool {
        self.pos >= self.data.len()
    }

    fn offset(&self) -> usize {
        self.base + self.pos
    }

    fn end(&self) -> usize {
        self.base + self.data.len()
    }

    fn take(&mut self, needed: usize) -> std::result::Result<&'a [u8], FormatError> {
        if self.data.len() - self.pos < needed {
            return Err(FormatError::SymbolOverrun {
                field: self.field.to_string(),
                offset: self.offset(),
                needed,
                end: self.end(),
            });
        }
        let slice = &self.data[self.pos..self.pos + needed];
        self.pos += needed;
        Ok(slice)
    }

    fn read_u8(&mut self) -> std::result::Result<u8, FormatError> {
        Ok(self.take(1)?[0])
    }

    fn read_i32(&mut self) -> std::result::Result<i32, FormatError> {
        Ok(LittleEndian::read_i32(self.take(4)?))
    }

    fn read_f64(&mut self) -> std::result::Result<f64, FormatError> {
        Ok(LittleEndian::read_f64(self.take(8)?))
    }

    fn read_cstr(&mut self) -> std::result::Result<String, FormatError> {
        let start = self.offset();
        let rest = &self.data[self.pos..];
        let len = rest.iter().position(|&b| b == 0).ok_or_else(|| FormatError::UnterminatedString {
            field: self.field.to_string(),
            offset: start,
            end: self.end(),
        })?;
        let text = std::str::from_utf8(&rest[..len]).map_err(|_| FormatError::InvalidUtf8 {
            field: self.field.to_string(),
            offset: start,
        })?;
        self.pos += len + 1;
        Ok(text.to_owned())
    }
}

/// Look up `index` in a table, reporting out-of-range lookups as internal
/// errors. Used where the index has already been validated.
pub(crate) fn symbol_at(table: &SymbolTable, index: usize) -> Result<&Symbol> {
    table.get(index).ok_or_else(|| Error::Internal {
        message: format!(
            "field `{}`: index {} past {} symbols",
            table.field,
            index,
            table.len()
        ),
    })
}
