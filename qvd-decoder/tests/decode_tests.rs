//! # End-to-end decode tests
//!
//! Files are produced by the in-test builder in `common`, so every layout
//! below is byte-exact and known up front.

mod common;

use proptest::prelude::*;

use common::{single_int, FieldSpec, QvdBuilder};
use qvd_decoder::{decode, parse_header, DecodeConfig, Decoder, Error, FieldKind, FormatError, Symbol, Value};

fn format_err<T: std::fmt::Debug>(result: Result<T, Error>) -> FormatError {
    match result {
        Err(Error::Format(e)) => e,
        other => panic!("expected format error, got {:?}", other),
    }
}

fn int(v: i64) -> Value {
    Value::Symbol(Symbol::Integer(v))
}

fn text(s: &str) -> Value {
    Value::Symbol(Symbol::Text(s.to_string()))
}

fn mixed_table() -> Vec<u8> {
    QvdBuilder::new("Orders")
        .field(
            FieldSpec::new("OrderID", 3)
                .tags(&["$numeric", "$integer"])
                .int(1001)
                .int(1002)
                .int(1003),
        )
        .field(
            FieldSpec::new("Customer", 2)
                .tags(&["$text", "$ascii"])
                .text("Acme")
                .text("Zürich AG"),
        )
        .field(FieldSpec::new("Amount", 2).tags(&["$numeric"]).real(19.5).real(-0.25))
        .field(
            FieldSpec::new("OrderDate", 2)
                .tags(&["$numeric", "$integer", "$date"])
                .dual_int(45292, "2024-01-01"),
        )
        .field(
            FieldSpec::new("Rate", 1)
                .number_format("REAL")
                .dual_real(1.5, "1,50"),
        )
        .row(&[0, 0, 0, 0, 0])
        .row(&[1, 1, 1, 1, 1])
        .row(&[2, 2, 2, 0, 0])
        .build()
}

#[test]
fn test_single_value() {
    let table = decode(&single_int(0x00)).unwrap();
    assert_eq!(table.num_rows(), 1);
    assert_eq!(table.column_names().collect::<Vec<_>>(), vec!["A"]);
    assert_eq!(table.column("A").unwrap().values(), &[int(10)]);
}

#[test]
fn test_sentinel_decodes_as_empty() {
    let table = decode(&single_int(0x01)).unwrap();
    assert_eq!(table.column("A").unwrap().values(), &[Value::Empty]);
}

#[test]
fn test_two_fields_in_one_byte() {
    let bytes = QvdBuilder::new("T")
        .field(FieldSpec::new("A", 4).int(0).int(1).int(2))
        .field(FieldSpec::new("B", 4).int(0).int(1))
        .row(&[2, 1])
        .build();

    // Both fields share the record's only byte: 0b0001_0010
    let header = parse_header(&bytes).unwrap();
    assert_eq!(header.record_byte_size, 1);
    assert_eq!(&bytes[bytes.len() - 1..], &[0b0001_0010]);

    let table = decode(&bytes).unwrap();
    assert_eq!(table.column("A").unwrap().values(), &[int(2)]);
    assert_eq!(table.column("B").unwrap().values(), &[int(1)]);
}

#[test]
fn test_mixed_kinds() {
    let table = decode(&mixed_table()).unwrap();
    assert_eq!(table.num_rows(), 3);
    assert_eq!(
        table.column_names().collect::<Vec<_>>(),
        vec!["OrderID", "Customer", "Amount", "OrderDate", "Rate"]
    );

    assert_eq!(table.column("OrderID").unwrap().kind(), FieldKind::Integer);
    assert_eq!(table.column("Customer").unwrap().kind(), FieldKind::String);
    assert_eq!(table.column("Amount").unwrap().kind(), FieldKind::Real);
    assert_eq!(table.column("OrderDate").unwrap().kind(), FieldKind::Dual);
    assert_eq!(table.column("Rate").unwrap().kind(), FieldKind::Real);

    assert_eq!(
        table.column("OrderID").unwrap().values(),
        &[int(1001), int(1002), int(1003)]
    );
    assert_eq!(
        table.column("Customer").unwrap().values(),
        &[text("Acme"), text("Zürich AG"), Value::Empty]
    );
    assert_eq!(
        table.column("Amount").unwrap().values(),
        &[
            Value::Symbol(Symbol::Real(19.5)),
            Value::Symbol(Symbol::Real(-0.25)),
            Value::Empty
        ]
    );
    assert_eq!(
        table.row(0).unwrap()[3],
        &Value::Symbol(Symbol::DualInteger(45292, "2024-01-01".into()))
    );
    assert_eq!(table.row(1).unwrap()[3], &Value::Empty);
    assert_eq!(
        table.row(2).unwrap()[4],
        &Value::Symbol(Symbol::DualReal(1.5, "1,50".into()))
    );
}

#[test]
fn test_every_column_has_every_row() {
    let table = decode(&mixed_table()).unwrap();
    for column in table.columns() {
        assert_eq!(column.len(), table.num_rows(), "column {}", column.name());
    }
}

#[test]
fn test_decode_is_deterministic() {
    let bytes = mixed_table();
    assert_eq!(decode(&bytes).unwrap(), decode(&bytes).unwrap());
}

#[test]
fn test_parallel_matches_sequential() {
    let bytes = mixed_table();
    let sequential = Decoder::new(DecodeConfig {
        parallel: false,
        ..DecodeConfig::default()
    });
    let parallel = Decoder::new(DecodeConfig {
        parallel: true,
        ..DecodeConfig::default()
    });
    assert_eq!(sequential.decode(&bytes).unwrap(), parallel.decode(&bytes).unwrap());
}

#[test]
fn test_zero_records() {
    let bytes = QvdBuilder::new("Empty")
        .field(FieldSpec::new("A", 1).int(1))
        .build();
    let table = decode(&bytes).unwrap();
    assert_eq!(table.num_rows(), 0);
    assert_eq!(table.num_columns(), 1);
    assert!(table.column("A").unwrap().is_empty());
}

#[test]
fn test_zero_width_field() {
    // A single-symbol field may take no bits at all
    let bytes = QvdBuilder::new("T")
        .field(FieldSpec::new("Const", 0).text("always"))
        .field(FieldSpec::new("A", 8).int(1).int(2))
        .row(&[0, 1])
        .row(&[0, 0])
        .build();
    let table = decode(&bytes).unwrap();
    assert_eq!(table.column("Const").unwrap().values(), &[text("always"), text("always")]);
    assert_eq!(table.column("A").unwrap().values(), &[int(2), int(1)]);
}

#[test]
fn test_huge_record_count_with_zero_stride() {
    // No row bytes back a zero-width table, so only the count bounds it
    let bytes = QvdBuilder::new("T")
        .field(FieldSpec::new("Const", 0).int(1))
        .record_count(1_000_000_000_000_000_000)
        .build();
    assert_eq!(parse_header(&bytes).unwrap().record_byte_size, 0);
    assert_eq!(
        format_err(decode(&bytes)),
        FormatError::InvalidAttribute {
            scope: "table header".into(),
            attribute: "NoOfRecords",
            value: "1000000000000000000".into(),
        }
    );
}

#[test]
fn test_truncated_row_region() {
    let mut bytes = mixed_table();
    bytes.truncate(bytes.len() - 1);
    assert!(matches!(
        format_err(decode(&bytes)),
        FormatError::RowRegionTruncated { records: 3, .. }
    ));
}

#[test]
fn test_record_count_past_row_region() {
    let bytes = QvdBuilder::new("T")
        .field(FieldSpec::new("A", 8).int(1))
        .row(&[0])
        .record_count(2)
        .build();
    assert_eq!(
        format_err(decode(&bytes)),
        FormatError::RowRegionTruncated {
            records: 2,
            stride: 1,
            required: 2,
            available: 1,
        }
    );
}

#[test]
fn test_unknown_tag_names_field() {
    let bytes = QvdBuilder::new("T")
        .field(FieldSpec::new("Good", 1).int(1))
        .field(FieldSpec::new("Broken", 1).int(1).raw(&[0x07, 0x00]))
        .row(&[0, 0])
        .build();
    let err = format_err(decode(&bytes));
    assert!(matches!(err, FormatError::UnknownSymbolTag { tag: 0x07, .. }));
    assert_eq!(err.field(), Some("Broken"));
    assert!(err.to_string().contains("Broken"));
}

#[test]
fn test_symbol_count_mismatch() {
    let bytes = QvdBuilder::new("T")
        .field(FieldSpec::new("A", 2).int(1).int(2).declared_symbols(Some(3)))
        .row(&[0])
        .build();
    assert_eq!(
        format_err(decode(&bytes)),
        FormatError::SymbolCountMismatch {
            field: "A".into(),
            declared: 3,
            decoded: 2,
        }
    );
}

#[test]
fn test_symbol_count_optional() {
    let bytes = QvdBuilder::new("T")
        .field(FieldSpec::new("A", 2).int(1).int(2).declared_symbols(None))
        .row(&[1])
        .build();
    assert_eq!(decode(&bytes).unwrap().column("A").unwrap().values(), &[int(2)]);
}

#[test]
fn test_stride_mismatch() {
    let bytes = QvdBuilder::new("T")
        .field(FieldSpec::new("A", 4).int(1))
        .field(FieldSpec::new("B", 4).int(1))
        .record_byte_size(2)
        .row(&[0, 0])
        .build();
    assert_eq!(
        format_err(decode(&bytes)),
        FormatError::StrideMismatch {
            declared: 2,
            total_bits: 8,
            expected: 1,
        }
    );
}

#[test]
fn test_negative_index_is_empty() {
    // Bias -2 reserves raw values 0 and 1 for "no value"
    let bytes = QvdBuilder::new("T")
        .field(FieldSpec::new("A", 2).bias(-2).int(7))
        .row(&[0])
        .row(&[2])
        .row(&[3])
        .build();

    assert_eq!(
        format_err(decode(&bytes)),
        FormatError::NegativeIndex {
            field: "A".into(),
            record: 0,
            index: -2,
        }
    );

    let decoder = Decoder::new(DecodeConfig {
        negative_index_is_empty: true,
        ..DecodeConfig::default()
    });
    let table = decoder.decode(&bytes).unwrap();
    assert_eq!(
        table.column("A").unwrap().values(),
        &[Value::Empty, int(7), Value::Empty]
    );
}

#[test]
fn test_index_past_sentinel() {
    let bytes = QvdBuilder::new("T")
        .field(FieldSpec::new("A", 2).int(7))
        .row(&[0])
        .row(&[2])
        .build();
    assert_eq!(
        format_err(decode(&bytes)),
        FormatError::IndexOutOfRange {
            field: "A".into(),
            record: 1,
            index: 2,
            sentinel: 1,
        }
    );
}

#[test]
fn test_strict_kinds() {
    let bytes = QvdBuilder::new("T")
        .field(FieldSpec::new("A", 1).tags(&["$numeric", "$integer"]).text("oops"))
        .row(&[0])
        .build();

    // Advisory by default
    assert_eq!(decode(&bytes).unwrap().column("A").unwrap().values(), &[text("oops")]);

    let strict = Decoder::new(DecodeConfig {
        strict_kinds: true,
        ..DecodeConfig::default()
    });
    assert!(matches!(
        format_err(strict.decode(&bytes)),
        FormatError::KindMismatch {
            declared: "integer",
            found: "text",
            ..
        }
    ));
}

#[test]
fn test_not_a_qvd() {
    assert_eq!(decode(b"").unwrap_err().error_code(), "INPUT_ERROR");
    assert_eq!(decode(b"PK\x03\x04").unwrap_err().error_code(), "INPUT_ERROR");
    assert!(matches!(
        format_err(decode(b"<QvdTableHeader><TableName>T</TableName>")),
        FormatError::MissingHeaderTerminator { .. }
    ));
}

#[test]
fn test_table_serializes_by_column() {
    let table = decode(&mixed_table()).unwrap();
    let json = serde_json::to_value(&table).unwrap();
    assert_eq!(json["OrderID"], serde_json::json!([1001, 1002, 1003]));
    assert_eq!(json["Customer"][2], serde_json::Value::Null);
    assert_eq!(json["OrderDate"][0]["text"], "2024-01-01");
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn test_random_layouts_decode(
        widths in proptest::collection::vec(1usize..=12, 1..6),
        seeds in proptest::collection::vec(any::<u64>(), 1..40),
    ) {
        // Each field of width w gets 2^w - 1 symbols, so every raw value is
        // a symbol index or the sentinel
        let mut builder = QvdBuilder::new("Random");
        let counts: Vec<u64> = widths.iter().map(|&w| (1u64 << w) - 1).collect();
        for (i, &w) in widths.iter().enumerate() {
            let mut field = FieldSpec::new(&format!("F{}", i), w);
            for v in 0..counts[i] {
                field = field.int(v as i32);
            }
            builder = builder.field(field);
        }
        let mut expected = vec![Vec::new(); widths.len()];
        for seed in &seeds {
            let raw: Vec<u64> = counts
                .iter()
                .enumerate()
                .map(|(i, &c)| seed.rotate_left(i as u32 * 7) % (c + 1))
                .collect();
            for (i, &r) in raw.iter().enumerate() {
                expected[i].push(if r == counts[i] { Value::Empty } else { int(r as i64) });
            }
            builder = builder.row(&raw);
        }

        let bytes = builder.build();
        let table = decode(&bytes).unwrap();
        prop_assert_eq!(table.num_rows(), seeds.len());
        for (i, column) in table.columns().iter().enumerate() {
            prop_assert_eq!(column.values(), &expected[i][..]);
        }
        prop_assert_eq!(&table, &decode(&bytes).unwrap());
    }
}
