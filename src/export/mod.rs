//! Export serialization: write form values back into the document

pub mod fields;
pub mod writer;

pub use fields::{FieldBinding, FieldType, StructuredField, bind_fields, discover_fields};
pub use writer::{ExportError, FormExporter};
