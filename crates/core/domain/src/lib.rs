pub mod array;
pub mod data;

pub use array::{ArrayData, DType, NdArray, ShapeError, element_count};
pub use data::{DeliveryReport, ReadingValue, Record, RecordId, Scalar};
