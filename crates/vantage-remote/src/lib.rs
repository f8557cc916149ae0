//! Remote backends: a PostgREST/Supabase-style REST API over HTTP.

#[cfg(feature = "http")]
pub mod http;

#[cfg(feature = "http")]
pub use http::RestStore;
