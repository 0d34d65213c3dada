//! # dnematch Core
//!
//! Core data structures for the dnematch address resolver.
//!
//! - [`AddressQuery`] / [`AddressRecord`] - Query input and catalog rows
//! - [`AddressCatalog`] - Row-aligned table of reference addresses
//! - [`Vector`] - Dense embedding with SIMD distance kernels
//! - [`FlatL2Index`] - Exact per-field nearest-neighbor index
//! - [`RegionFilter`] - Hard state (UF) filter applied to candidates
//!
//! ## Example
//!
//! ```rust
//! use dnematch_core::{FlatL2Index, RowId, Vector, VectorIndex};
//!
//! let mut index = FlatL2Index::new(2).unwrap();
//! index
//!     .add(&[Vector::new(vec![1.0, 0.0]), Vector::new(vec![0.0, 1.0])])
//!     .unwrap();
//!
//! let hits = index.search(&Vector::new(vec![0.9, 0.1]), 1).unwrap();
//! assert_eq!(hits[0].row_id, RowId(0));
//! ```

pub mod address;
pub mod catalog;
pub mod error;
pub mod filter;
pub mod index;
pub mod vector;

/// SIMD-optimized distance kernels
///
/// AVX2/FMA on x86_64, scalar elsewhere.
pub mod simd;

pub use address::{AddressQuery, AddressRecord, Field, RowId};
pub use catalog::AddressCatalog;
pub use error::{Error, Result};
pub use filter::{RecordFilter, RegionFilter};
pub use index::{FlatL2Index, Neighbor, VectorIndex};
pub use vector::Vector;
