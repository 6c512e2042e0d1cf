//! Header parser implementation

use std::collections::HashSet;

use tracing::debug;

use qvd_core::error::{Error, FormatError, Result};
use qvd_core::FieldKind;

use crate::header::xml::{FieldHeaderXml, TableHeaderXml};
use crate::header::{FieldDescriptor, FileDescriptor, Span, HEADER_TERMINATOR};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";
const TABLE_SCOPE: &str = "table header";

/// Parse the XML header at the start of `bytes` into a [`FileDescriptor`].
///
/// The header runs from byte 0 through `</QvdTableHeader>`. Line breaks and
/// at most one NUL byte separate it from the binary payload; symbol and row
/// offsets are relative to the first payload byte.
pub fn parse_header(bytes: &[u8]) -> Result<FileDescriptor> {
    if bytes.is_empty() {
        return Err(Error::input("input is empty"));
    }

    let text_start = if bytes.starts_with(UTF8_BOM) { UTF8_BOM.len() } else { 0 };
    let first = bytes[text_start..].iter().find(|b| !b.is_ascii_whitespace());
    if first != Some(&b'<') {
        return Err(Error::input("input does not start with an XML header"));
    }

    let marker = find(bytes, HEADER_TERMINATOR).ok_or(FormatError::MissingHeaderTerminator {
        marker: "</QvdTableHeader>",
        scanned: bytes.len(),
    })?;
    let xml_end = marker + HEADER_TERMINATOR.len();
    let payload_start = skip_separator(bytes, xml_end);

    let text = std::str::from_utf8(&bytes[text_start..xml_end]).map_err(|e| {
        FormatError::MalformedHeader {
            message: format!("header is not valid UTF-8: {}", e),
        }
    })?;
    let raw: TableHeaderXml =
        quick_xml::de::from_str(text).map_err(|e| FormatError::MalformedHeader {
            message: e.to_string(),
        })?;

    let descriptor = build_descriptor(raw, payload_start, bytes.len())?;
    debug!(
        table = descriptor.table_name.as_deref().unwrap_or(""),
        records = descriptor.record_count,
        fields = descriptor.fields.len(),
        record_byte_size = descriptor.record_byte_size,
        header_len = descriptor.header_len,
        "Parsed QVD header"
    );
    Ok(descriptor)
}

fn build_descriptor(
    raw: TableHeaderXml,
    payload_start: usize,
    input_len: usize,
) -> std::result::Result<FileDescriptor, FormatError> {
    let record_count = parse_unsigned(TABLE_SCOPE, "NoOfRecords", raw.no_of_records.as_deref())?;
    let record_byte_size =
        parse_unsigned(TABLE_SCOPE, "RecordByteSize", raw.record_byte_size.as_deref())?;
    let rows_offset = parse_unsigned(TABLE_SCOPE, "Offset", raw.offset.as_deref())?;
    let rows_len = parse_unsigned(TABLE_SCOPE, "Length", raw.length.as_deref())?;

    let symbol_region = Span::new(payload_start, rows_offset);
    match symbol_region.end() {
        Some(end) if end <= input_len => {}
        _ => {
            return Err(FormatError::RegionOutOfBounds {
                region: "symbol",
                start: symbol_region.offset,
                len: symbol_region.len,
                available: input_len,
            })
        }
    }

    let mut fields = Vec::with_capacity(raw.fields.headers.len());
    let mut seen = HashSet::with_capacity(raw.fields.headers.len());
    for (position, header) in raw.fields.headers.into_iter().enumerate() {
        let field = build_field(header, position, &symbol_region)?;
        if !seen.insert(field.name.clone()) {
            return Err(FormatError::DuplicateField { field: field.name });
        }
        fields.push(field);
    }

    let descriptor = FileDescriptor {
        table_name: raw.table_name,
        creator_doc: raw.creator_doc,
        build_no: raw.build_no,
        create_utc_time: raw.create_utc_time,
        record_count,
        record_byte_size,
        fields,
        header_len: payload_start,
        symbol_region,
        row_region: Span::new(payload_start.saturating_add(rows_offset), rows_len),
    };
    check_record_layout(&descriptor)?;
    Ok(descriptor)
}

/// The stride must be exactly the packed width, and every field must fit in it.
fn check_record_layout(descriptor: &FileDescriptor) -> std::result::Result<(), FormatError> {
    let total_bits = descriptor.total_bit_width();
    let expected = total_bits.div_ceil(8);
    if descriptor.record_byte_size != expected {
        return Err(FormatError::StrideMismatch {
            declared: descriptor.record_byte_size,
            total_bits,
            expected,
        });
    }

    let record_bits = descriptor.record_bits();
    for field in &descriptor.fields {
        match field.bit_end() {
            Some(end) if end <= record_bits => {}
            end => {
                return Err(FormatError::FieldOutsideRecord {
                    field: field.name.clone(),
                    bit_offset: field.bit_offset,
                    bit_end: end.unwrap_or(usize::MAX),
                    record_bits,
                })
            }
        }
    }
    Ok(())
}

fn build_field(
    raw: FieldHeaderXml,
    position: usize,
    symbol_region: &Span,
) -> std::result::Result<FieldDescriptor, FormatError> {
    let name = match raw.field_name {
        Some(name) if !name.is_empty() => name,
        _ => {
            return Err(FormatError::MissingAttribute {
                scope: format!("field #{}", position),
                attribute: "FieldName",
            })
        }
    };
    let scope = format!("field `{}`", name);

    let bit_offset = parse_unsigned(&scope, "BitOffset", raw.bit_offset.as_deref())?;
    let bit_width = parse_unsigned(&scope, "BitWidth", raw.bit_width.as_deref())?;
    let bias = parse_signed(&scope, "Bias", raw.bias.as_deref())?;
    let offset = parse_unsigned(&scope, "Offset", raw.offset.as_deref())?;
    let len = parse_unsigned(&scope, "Length", raw.length.as_deref())?;
    let declared_symbols = match raw.no_of_symbols.as_deref() {
        Some(text) if !text.trim().is_empty() => {
            Some(parse_unsigned(&scope, "NoOfSymbols", Some(text))?)
        }
        _ => None,
    };

    if bit_width > 64 {
        return Err(FormatError::BitWidthTooLarge {
            field: name,
            bit_width,
        });
    }

    match offset.checked_add(len) {
        Some(end) if end <= symbol_region.len => {}
        _ => {
            return Err(FormatError::SymbolSpanOutOfBounds {
                field: name,
                offset,
                len,
                region_len: symbol_region.len,
            })
        }
    }

    let tags = raw.tags.map(|t| t.values).unwrap_or_default();
    let number_format = raw.number_format.and_then(|f| f.kind);
    let kind = resolve_kind(&tags, number_format.as_deref());

    Ok(FieldDescriptor {
        name,
        bit_offset,
        bit_width,
        bias,
        kind,
        symbols: Span::new(symbol_region.offset + offset, len),
        declared_symbols,
        tags,
        number_format,
    })
}

/// Resolve a field's declared kind from its tags, falling back to the
/// number format type.
///
/// | Tags | Kind |
/// |------|------|
/// | `$text`/`$ascii` with `$numeric`/`$integer` | Dual |
/// | `$date`/`$timestamp` with `$numeric`/`$integer` | Dual |
/// | `$integer` | Integer |
/// | `$numeric` | Real |
/// | `$text`/`$ascii` | String |
pub fn resolve_kind(tags: &[String], number_format: Option<&str>) -> FieldKind {
    let has = |tag: &str| tags.iter().any(|t| t.trim().eq_ignore_ascii_case(tag));
    let numeric = has("$numeric") || has("$integer");
    let text = has("$text") || has("$ascii");
    let temporal = has("$date") || has("$timestamp");

    if numeric && (text || temporal) {
        return FieldKind::Dual;
    }
    if has("$integer") {
        return FieldKind::Integer;
    }
    if numeric {
        return FieldKind::Real;
    }
    if text {
        return FieldKind::String;
    }

    match number_format.map(|f| f.trim().to_ascii_uppercase()).as_deref() {
        Some("INTEGER") => FieldKind::Integer,
        Some("REAL") | Some("FIX") | Some("MONEY") => FieldKind::Real,
        Some("DATE") | Some("TIME") | Some("TIMESTAMP") | Some("INTERVAL") => FieldKind::Dual,
        _ => FieldKind::String,
    }
}

fn parse_unsigned(
    scope: &str,
    attribute: &'static str,
    value: Option<&str>,
) -> std::result::Result<usize, FormatError> {
    let text = required(scope, attribute, value)?;
    text.parse::<u64>()
        .ok()
        .and_then(|v| usize::try_from(v).ok())
        .ok_or_else(|| FormatError::InvalidAttribute {
            scope: scope.to_string(),
            attribute,
            value: text.to_string(),
        })
}

fn parse_signed(
    scope: &str,
    attribute: &'static str,
    value: Option<&str>,
) -> std::result::Result<i64, FormatError> {
    let text = required(scope, attribute, value)?;
    text.parse::<i64>().map_err(|_| FormatError::InvalidAttribute {
        scope: scope.to_string(),
        attribute,
        value: text.to_string(),
    })
}

fn required<'a>(
    scope: &str,
    attribute: &'static str,
    value: Option<&'a str>,
) -> std::result::Result<&'a str, FormatError> {
    match value.map(str::trim) {
        Some(text) if !text.is_empty() => Ok(text),
        _ => Err(FormatError::MissingAttribute {
            scope: scope.to_string(),
            attribute,
        }),
    }
}

/// Skip `\r`/`\n` and then one NUL after the terminator
fn skip_separator(bytes: &[u8], mut pos: usize) -> usize {
    while matches!(bytes.get(pos), Some(b'\r') | Some(b'\n')) {
        pos += 1;
    }
    if bytes.get(pos) == Some(&0) {
        pos += 1;
    }
    pos
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}
