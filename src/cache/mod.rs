pub mod query_cache;

mod macros;

pub use query_cache::Fingerprint;
pub use query_cache::QueryCache;
