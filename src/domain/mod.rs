pub mod listing;
pub mod normalize;

pub use listing::{CleanedListingRecord, GeocodeResult, RawListingRecord};
pub use normalize::NormalizationDrop;
