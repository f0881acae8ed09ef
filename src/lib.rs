pub mod cache;
pub mod config;
pub mod error;
pub mod hashing;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;

#[cfg(test)]
pub(crate) mod test_support;
