pub mod point;

pub use point::{DataPoint, FieldValue, PointError, Precision};
