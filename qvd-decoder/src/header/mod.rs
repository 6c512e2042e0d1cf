//! A QVD file opens with a self-describing XML header, followed by a binary
//! payload holding every field's symbol table and then the packed records.
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      QVD File Structure                     │
//! ├─────────────────────────────────────────────────────────────┤
//! │                                                             │
//! │  ┌─────────────────────────────────────────────────────┐    │
//! │  │                    XML Header                       │    │
//! │  │  <QvdTableHeader>                                   │    │
//! │  │    <Fields><QvdFieldHeader>...</QvdFieldHeader>     │    │
//! │  │    <RecordByteSize/><NoOfRecords/>                  │    │
//! │  │    <Offset/><Length/>                               │    │
//! │  │  </QvdTableHeader>  \r\n \0                         │    │
//! │  └─────────────────────────────────────────────────────┘    │
//! │                                                             │
//! │  ┌─────────────────────────────────────────────────────┐    │
//! │  │                   Symbol Region                     │    │
//! │  │  Field 1: [tag][value] [tag][value] ...             │    │
//! │  │  Field 2: [tag][value] ...                          │    │
//! │  │  (each field at its own Offset/Length)              │    │
//! │  └─────────────────────────────────────────────────────┘    │
//! │                                                             │
//! │  ┌─────────────────────────────────────────────────────┐    │
//! │  │                     Row Region                      │    │
//! │  │  Record 1: [RecordByteSize bytes, bit-packed]       │    │
//! │  │  Record 2: ...                                      │    │
//! │  └─────────────────────────────────────────────────────┘    │
//! └─────────────────────────────────────────────────────────────┘

mod parser;
mod types;
mod xml;

pub use parser::{parse_header, resolve_kind};
pub use types::{FieldDescriptor, FileDescriptor, Span, HEADER_TERMINATOR};
