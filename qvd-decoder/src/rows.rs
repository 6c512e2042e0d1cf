//! Row unpacking.
//!
//! Every record is `RecordByteSize` bytes. Each field owns a bit range of
//! the record; the raw bits plus the field's bias give an index into the
//! field's symbol table, where an index equal to the symbol count marks an
//! empty cell.

use std::mem;

use rayon::prelude::*;
use tracing::debug;

use qvd_core::error::{Error, FormatError, Result};
use qvd_core::{DecodeConfig, Value};

use crate::bits::extract_bits;
use crate::header::{FieldDescriptor, FileDescriptor};
use crate::symbol::{symbol_at, SymbolTable};

/// Decoded cells of one field, one per record
pub type ColumnValues = Vec<Value>;

/// Unpack every record in `rows` into per-field value vectors, in the
/// descriptor's field order.
///
/// `rows` is whatever the input holds from the start of the row region on.
/// It must cover `record_count * record_byte_size` bytes; anything past that
/// is ignored.
pub fn unpack_rows(
    rows: &[u8],
    descriptor: &FileDescriptor,
    tables: &[SymbolTable],
    config: &DecodeConfig,
) -> Result<Vec<ColumnValues>> {
    if tables.len() != descriptor.fields.len() {
        return Err(Error::Internal {
            message: format!(
                "{} symbol tables for {} fields",
                tables.len(),
                descriptor.fields.len()
            ),
        });
    }

    let stride = descriptor.record_byte_size;
    let records = descriptor.record_count;
    let required = records.saturating_mul(stride);
    if descriptor.required_row_bytes().is_none() || rows.len() < required {
        return Err(FormatError::RowRegionTruncated {
            records,
            stride,
            required,
            available: rows.len(),
        }
        .into());
    }
    if rows.len() > required {
        debug!(trailing = rows.len() - required, "Ignoring bytes after the last record");
    }

    // A zero stride lets any record count pass the length check above
    let cell_bytes = records
        .checked_mul(descriptor.fields.len())
        .and_then(|cells| cells.checked_mul(mem::size_of::<Value>()));
    if !matches!(cell_bytes, Some(n) if n <= isize::MAX as usize) {
        return Err(too_many_records(records).into());
    }

    let rows = &rows[..required];
    let unpack = |(field, table): (&FieldDescriptor, &SymbolTable)| {
        unpack_column(rows, stride, records, field, table, config)
    };

    if config.parallel {
        descriptor
            .fields
            .par_iter()
            .zip(tables.par_iter())
            .map(unpack)
            .collect()
    } else {
        descriptor.fields.iter().zip(tables.iter()).map(unpack).collect()
    }
}

/// Unpack one field across every record.
pub fn unpack_column(
    rows: &[u8],
    stride: usize,
    records: usize,
    field: &FieldDescriptor,
    table: &SymbolTable,
    config: &DecodeConfig,
) -> Result<ColumnValues> {
    let mut values = Vec::new();
    values
        .try_reserve_exact(records)
        .map_err(|_| too_many_records(records))?;
    for record in 0..records {
        let start = record * stride;
        let bytes = &rows[start..start + stride];
        let raw = extract_bits(bytes, field.bit_offset, field.bit_width)?;
        values.push(resolve(raw, record, field, table, config)?);
    }
    Ok(values)
}

/// Map a raw bit value to a cell.
///
/// The bias is applied before the sentinel comparison, so a biased index
/// equal to the symbol count is an empty cell.
pub fn resolve(
    raw: u64,
    record: usize,
    field: &FieldDescriptor,
    table: &SymbolTable,
    config: &DecodeConfig,
) -> Result<Value> {
    let index = raw as i128 + field.bias as i128;
    let sentinel = table.sentinel() as i128;

    if index < 0 {
        if config.negative_index_is_empty {
            return Ok(Value::Empty);
        }
        return Err(FormatError::NegativeIndex {
            field: field.name.clone(),
            record,
            index: clamp_i64(index),
        }
        .into());
    }
    if index == sentinel {
        return Ok(Value::Empty);
    }
    if index > sentinel {
        return Err(FormatError::IndexOutOfRange {
            field: field.name.clone(),
            record,
            index: clamp_i64(index),
            sentinel: table.sentinel(),
        }
        .into());
    }

    Ok(Value::Symbol(symbol_at(table, index as usize)?.clone()))
}

fn too_many_records(records: usize) -> FormatError {
    FormatError::InvalidAttribute {
        scope: "table header".to_string(),
        attribute: "NoOfRecords",
        value: records.to_string(),
    }
}

fn clamp_i64(v: i128) -> i64 {
    v.clamp(i64::MIN as i128, i64::MAX as i128) as i64
}
