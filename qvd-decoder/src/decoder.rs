//! Decode pipeline: header, symbol tables, rows, table.

use std::time::Instant;

use tracing::{debug, instrument};

use qvd_core::error::Result;
use qvd_core::metrics::{DecodeStats, Timer};
use qvd_core::{DecodeConfig, Table};

use crate::assemble::assemble;
use crate::header::{parse_header, FileDescriptor};
use crate::rows::unpack_rows;
use crate::symbol::decode_symbol_tables;

/// Decode a complete QVD file held in memory with the default settings.
pub fn decode(bytes: &[u8]) -> Result<Table> {
    Decoder::default().decode(bytes)
}

/// A reusable decoder carrying its settings.
///
/// Decoders hold no state between calls; one instance can serve any number
/// of threads.
#[derive(Debug, Clone, Default)]
pub struct Decoder {
    config: DecodeConfig,
}

impl Decoder {
    pub fn new(config: DecodeConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DecodeConfig {
        &self.config
    }

    /// Parse only the header.
    pub fn read_header(&self, bytes: &[u8]) -> Result<FileDescriptor> {
        parse_header(bytes)
    }

    pub fn decode(&self, bytes: &[u8]) -> Result<Table> {
        self.decode_with_stats(bytes).map(|(table, _)| table)
    }

    /// Decode and report sizes and timing. The stats are also logged at
    /// info level.
    #[instrument(level = "debug", skip_all, fields(input_bytes = bytes.len()))]
    pub fn decode_with_stats(&self, bytes: &[u8]) -> Result<(Table, DecodeStats)> {
        let started = Instant::now();

        let timer = Timer::new("header");
        let descriptor = parse_header(bytes)?;
        timer.stop();

        let timer = Timer::new("symbols");
        let tables = decode_symbol_tables(bytes, &descriptor, &self.config)?;
        timer.stop();

        let timer = Timer::new("rows");
        let rows = descriptor.row_region.slice_available(bytes);
        if rows.len() < descriptor.row_region.len {
            debug!(
                declared = descriptor.row_region.len,
                available = rows.len(),
                "Row region shorter than declared"
            );
        }
        let columns = unpack_rows(rows, &descriptor, &tables, &self.config)?;
        timer.stop();

        let empty_cells = columns
            .iter()
            .map(|c| c.iter().filter(|v| v.is_empty()).count())
            .sum();
        let table = assemble(&descriptor, columns)?;

        let stats = DecodeStats {
            input_bytes: bytes.len(),
            header_bytes: descriptor.header_len,
            records: table.num_rows(),
            fields: table.num_columns(),
            symbols: tables.iter().map(|t| t.len()).sum(),
            empty_cells,
            elapsed: started.elapsed(),
        };
        stats.log();
        Ok((table, stats))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qvd_core::{Symbol, Value};

    fn single_field_file(row: u8) -> Vec<u8> {
        let xml = "<QvdTableHeader><TableName>T</TableName><Fields><QvdFieldHeader>\
                   <FieldName>A</FieldName><BitOffset>0</BitOffset><BitWidth>8</BitWidth>\
                   <Bias>0</Bias><NoOfSymbols>1</NoOfSymbols><Offset>0</Offset><Length>5</Length>\
                   <Tags><String>$numeric</String><String>$integer</String></Tags>\
                   </QvdFieldHeader></Fields><RecordByteSize>1</RecordByteSize>\
                   <NoOfRecords>1</NoOfRecords><Offset>5</Offset><Length>1</Length></QvdTableHeader>";
        let mut bytes = xml.as_bytes().to_vec();
        bytes.extend_from_slice(b"\r\n\0");
        bytes.extend_from_slice(&[0x01, 0x0A, 0x00, 0x00, 0x00]);
        bytes.push(row);
        bytes
    }

    #[test]
    fn test_decode_single_value() {
        let table = decode(&single_field_file(0x00)).unwrap();
        assert_eq!(table.num_rows(), 1);
        assert_eq!(
            table.column("A").unwrap().values(),
            &[Value::Symbol(Symbol::Integer(10))]
        );
    }

    #[test]
    fn test_decode_sentinel() {
        let table = decode(&single_field_file(0x01)).unwrap();
        assert_eq!(table.column("A").unwrap().values(), &[Value::Empty]);
    }

    #[test]
    fn test_stats() {
        let bytes = single_field_file(0x01);
        let (_, stats) = Decoder::default().decode_with_stats(&bytes).unwrap();
        assert_eq!(stats.input_bytes, bytes.len());
        assert_eq!(stats.records, 1);
        assert_eq!(stats.fields, 1);
        assert_eq!(stats.symbols, 1);
        assert_eq!(stats.empty_cells, 1);
        assert_eq!(stats.header_bytes, bytes.len() - 6);
    }

    #[test]
    fn test_empty_input() {
        let err = decode(&[]).unwrap_err();
        assert_eq!(err.error_code(), "INPUT_ERROR");
    }
}
