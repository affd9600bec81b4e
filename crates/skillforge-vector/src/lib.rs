//! The Vector Store: a dense-embedding index over skill text, backed by
//! LanceDB (spec.md §4.4).

mod error;
mod filter;
mod schema;
mod store;

pub use error::VectorError;
pub use store::{VectorStats, VectorStore};
