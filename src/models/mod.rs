mod coordinate;
mod field;
mod operation;
mod raw;
mod tag;

pub use coordinate::{GeoCoordinate, Hemisphere, Rational, Sexagesimal};
pub use field::SemanticField;
pub use operation::{EditAction, FieldEdit, OperationResult, OperationSummary, ProgressEvent};
pub use raw::{ExifValue, RawValue, XmpValue};
pub use tag::{Namespace, TagId, TagValue};
