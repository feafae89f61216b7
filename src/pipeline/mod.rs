mod geoprocessor;
mod writer;

pub use geoprocessor::{CleanedTable, GeoprocessReport, Geoprocessor};
pub use writer::{ListingWriter, RowState, SkipReason, WriteError, WritePolicy, WriteReport};
