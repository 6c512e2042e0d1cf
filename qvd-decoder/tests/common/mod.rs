//! In-test QVD writer.
//!
//! Lays fields out back to back in declaration order, both in the symbol
//! region and in the record bits, then writes the header describing them.

#![allow(dead_code)]

use bytes::{BufMut, BytesMut};

pub struct FieldSpec {
    name: String,
    bit_width: usize,
    bias: i64,
    tags: Vec<String>,
    number_format: Option<String>,
    symbols: BytesMut,
    symbol_count: usize,
    declared_symbols: Option<Option<usize>>,
}

impl FieldSpec {
    pub fn new(name: &str, bit_width: usize) -> Self {
        Self {
            name: name.to_string(),
            bit_width,
            bias: 0,
            tags: Vec::new(),
            number_format: None,
            symbols: BytesMut::new(),
            symbol_count: 0,
            declared_symbols: None,
        }
    }

    pub fn bias(mut self, bias: i64) -> Self {
        self.bias = bias;
        self
    }

    pub fn tags(mut self, tags: &[&str]) -> Self {
        self.tags = tags.iter().map(|t| t.to_string()).collect();
        self
    }

    pub fn number_format(mut self, kind: &str) -> Self {
        self.number_format = Some(kind.to_string());
        self
    }

    /// Override `NoOfSymbols`; `None` leaves it out of the header
    pub fn declared_symbols(mut self, count: Option<usize>) -> Self {
        self.declared_symbols = Some(count);
        self
    }

    pub fn int(mut self, v: i32) -> Self {
        self.symbols.put_u8(1);
        self.symbols.put_i32_le(v);
        self.symbol_count += 1;
        self
    }

    pub fn real(mut self, v: f64) -> Self {
        self.symbols.put_u8(2);
        self.symbols.put_f64_le(v);
        self.symbol_count += 1;
        self
    }

    pub fn text(mut self, s: &str) -> Self {
        self.symbols.put_u8(4);
        put_cstr(&mut self.symbols, s);
        self.symbol_count += 1;
        self
    }

    pub fn dual_int(mut self, v: i32, s: &str) -> Self {
        self.symbols.put_u8(5);
        self.symbols.put_i32_le(v);
        put_cstr(&mut self.symbols, s);
        self.symbol_count += 1;
        self
    }

    pub fn dual_real(mut self, v: f64, s: &str) -> Self {
        self.symbols.put_u8(6);
        self.symbols.put_f64_le(v);
        put_cstr(&mut self.symbols, s);
        self.symbol_count += 1;
        self
    }

    /// Append bytes verbatim; they do not count as a symbol
    pub fn raw(mut self, bytes: &[u8]) -> Self {
        self.symbols.put_slice(bytes);
        self
    }
}

fn put_cstr(buf: &mut BytesMut, s: &str) {
    buf.put_slice(s.as_bytes());
    buf.put_u8(0);
}

pub struct QvdBuilder {
    table_name: String,
    fields: Vec<FieldSpec>,
    rows: Vec<Vec<u64>>,
    record_byte_size: Option<usize>,
    record_count: Option<usize>,
}

impl QvdBuilder {
    pub fn new(table_name: &str) -> Self {
        Self {
            table_name: table_name.to_string(),
            fields: Vec::new(),
            rows: Vec::new(),
            record_byte_size: None,
            record_count: None,
        }
    }

    pub fn field(mut self, field: FieldSpec) -> Self {
        self.fields.push(field);
        self
    }

    /// Raw bit values for one record, one per field
    pub fn row(mut self, raw: &[u64]) -> Self {
        self.rows.push(raw.to_vec());
        self
    }

    pub fn record_byte_size(mut self, size: usize) -> Self {
        self.record_byte_size = Some(size);
        self
    }

    pub fn record_count(mut self, count: usize) -> Self {
        self.record_count = Some(count);
        self
    }

    pub fn build(self) -> Vec<u8> {
        let total_bits: usize = self.fields.iter().map(|f| f.bit_width).sum();
        let packed_size = total_bits.div_ceil(8);
        let record_byte_size = self.record_byte_size.unwrap_or(packed_size);

        let mut field_xml = String::new();
        let mut symbol_region = BytesMut::new();
        let mut bit_offset = 0;
        let mut offsets = Vec::with_capacity(self.fields.len());
        for field in &self.fields {
            let declared = match field.declared_symbols {
                Some(Some(n)) => format!("<NoOfSymbols>{}</NoOfSymbols>", n),
                Some(None) => String::new(),
                None => format!("<NoOfSymbols>{}</NoOfSymbols>", field.symbol_count),
            };
            let tags: String = field
                .tags
                .iter()
                .map(|t| format!("<String>{}</String>", t))
                .collect();
            let number_format = field
                .number_format
                .as_ref()
                .map(|k| format!("<NumberFormat><Type>{}</Type><nDec>0</nDec></NumberFormat>", k))
                .unwrap_or_default();
            field_xml.push_str(&format!(
                "    <QvdFieldHeader>\r\n\
                 \x20     <FieldName>{}</FieldName>\r\n\
                 \x20     <BitOffset>{}</BitOffset>\r\n\
                 \x20     <BitWidth>{}</BitWidth>\r\n\
                 \x20     <Bias>{}</Bias>\r\n\
                 \x20     {}\r\n\
                 \x20     {}\r\n\
                 \x20     <Offset>{}</Offset>\r\n\
                 \x20     <Length>{}</Length>\r\n\
                 \x20     <Tags>{}</Tags>\r\n\
                 \x20   </QvdFieldHeader>\r\n",
                field.name,
                bit_offset,
                field.bit_width,
                field.bias,
                number_format,
                declared,
                symbol_region.len(),
                field.symbols.len(),
                tags,
            ));
            offsets.push(bit_offset);
            bit_offset += field.bit_width;
            symbol_region.put_slice(&field.symbols);
        }

        let mut rows = BytesMut::with_capacity(self.rows.len() * record_byte_size);
        for raw in &self.rows {
            let mut record = vec![0u8; record_byte_size];
            for ((field, &offset), &value) in self.fields.iter().zip(&offsets).zip(raw) {
                for bit in 0..field.bit_width {
                    if value >> bit & 1 == 1 {
                        let at = offset + bit;
                        record[at / 8] |= 1 << (at % 8);
                    }
                }
            }
            rows.put_slice(&record);
        }

        let header = format!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\" ?>\r\n\
             <QvdTableHeader>\r\n\
             \x20 <QvBuildNo>50667</QvBuildNo>\r\n\
             \x20 <CreatorDoc>builder</CreatorDoc>\r\n\
             \x20 <CreateUtcTime>2024-01-01 00:00:00</CreateUtcTime>\r\n\
             \x20 <TableName>{}</TableName>\r\n\
             \x20 <Fields>\r\n{}  </Fields>\r\n\
             \x20 <Compression></Compression>\r\n\
             \x20 <RecordByteSize>{}</RecordByteSize>\r\n\
             \x20 <NoOfRecords>{}</NoOfRecords>\r\n\
             \x20 <Offset>{}</Offset>\r\n\
             \x20 <Length>{}</Length>\r\n\
             </QvdTableHeader>\r\n\0",
            self.table_name,
            field_xml,
            record_byte_size,
            self.record_count.unwrap_or(self.rows.len()),
            symbol_region.len(),
            rows.len(),
        );

        let mut out = BytesMut::with_capacity(header.len() + symbol_region.len() + rows.len());
        out.put_slice(header.as_bytes());
        out.put_slice(&symbol_region);
        out.put_slice(&rows);
        out.to_vec()
    }
}

/// One integer field of width 8 holding `[10]`, with a single record
pub fn single_int(raw: u64) -> Vec<u8> {
    QvdBuilder::new("Single")
        .field(FieldSpec::new("A", 8).tags(&["$numeric", "$integer"]).int(10))
        .row(&[raw])
        .build()
}
