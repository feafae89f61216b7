pub mod connection;
pub mod listings;
pub mod sink;

pub use connection::Database;
pub use listings::SqliteSink;
pub use sink::{InMemorySink, InsertOutcome, KeyedSink, SinkError};
