//! Location hint parsing and datum normalization.

pub mod datum;
pub mod extract;

pub use datum::{to_standard_datum, to_vendor_datum, BoundingBox, DatumNormalizer, RegionTest};
pub use extract::{CoordinateExtractor, CoordinateShape, ExtractedCoordinate, Strategy};
