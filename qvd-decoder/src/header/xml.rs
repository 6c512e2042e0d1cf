//! Serde mirror of the XML header.
//!
//! Every scalar is read as text; numeric validation happens in the parser so
//! that errors can name the attribute and the offending value.

use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub(crate) struct TableHeaderXml {
    #[serde(rename = "QvBuildNo")]
    pub build_no: Option<String>,
    #[serde(rename = "CreatorDoc")]
    pub creator_doc: Option<String>,
    #[serde(rename = "CreateUtcTime")]
    pub create_utc_time: Option<String>,
    #[serde(rename = "TableName")]
    pub table_name: Option<String>,
    #[serde(rename = "Fields", default)]
    pub fields: FieldsXml,
    #[serde(rename = "NoOfRecords")]
    pub no_of_records: Option<String>,
    #[serde(rename = "RecordByteSize")]
    pub record_byte_size: Option<String>,
    #[serde(rename = "Offset")]
    pub offset: Option<String>,
    #[serde(rename = "Length")]
    pub length: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct FieldsXml {
    #[serde(rename = "QvdFieldHeader", default)]
    pub headers: Vec<FieldHeaderXml>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct FieldHeaderXml {
    #[serde(rename = "FieldName")]
    pub field_name: Option<String>,
    #[serde(rename = "BitOffset")]
    pub bit_offset: Option<String>,
    #[serde(rename = "BitWidth")]
    pub bit_width: Option<String>,
    #[serde(rename = "Bias")]
    pub bias: Option<String>,
    #[serde(rename = "NumberFormat")]
    pub number_format: Option<NumberFormatXml>,
    #[serde(rename = "NoOfSymbols")]
    pub no_of_symbols: Option<String>,
    #[serde(rename = "Offset")]
    pub offset: Option<String>,
    #[serde(rename = "Length")]
    pub length: Option<String>,
    #[serde(rename = "Tags")]
    pub tags: Option<TagsXml>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct NumberFormatXml {
    #[serde(rename = "Type")]
    pub kind: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct TagsXml {
    #[serde(rename = "String", default)]
    pub values: Vec<String>,
}
