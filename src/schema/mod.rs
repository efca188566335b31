pub mod conversion;
pub mod definition;
pub mod lint;
pub mod path;

pub use conversion::{IntoForm, LegacyForm};
pub use definition::*;
pub use lint::SchemaIssue;
pub use path::FieldPath;
