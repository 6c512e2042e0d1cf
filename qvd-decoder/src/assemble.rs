//! Table assembly: per-field cells become named columns in declaration order.

use qvd_core::error::{Error, Result};
use qvd_core::{Column, Table};

use crate::header::FileDescriptor;
use crate::rows::ColumnValues;

/// Package unpacked columns into a [`Table`].
///
/// `columns` must line up with `descriptor.fields` and each must hold
/// `record_count` values. Anything else is an internal error.
pub fn assemble(descriptor: &FileDescriptor, columns: Vec<ColumnValues>) -> Result<Table> {
    if columns.len() != descriptor.fields.len() {
        return Err(Error::Internal {
            message: format!(
                "{} columns unpacked for {} fields",
                columns.len(),
                descriptor.fields.len()
            ),
        });
    }

    let columns = descriptor
        .fields
        .iter()
        .zip(columns)
        .map(|(field, values)| Column::new(field.name.clone(), field.kind, values))
        .collect();

    Table::from_columns(descriptor.record_count, columns)
}
