//! # dnematch API
//!
//! REST front end over a loaded [`dnematch_similarity::AddressSearchEngine`].
//!
//! - `GET /health`
//! - `GET /info` - build summary and search defaults
//! - `POST /search` - address query fields plus optional `top_k` / `search_k`

pub mod rest;

pub use rest::{routes, RestApi};
