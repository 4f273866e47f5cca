//! # efatura
//!
//! Turkish e-invoicing core: normalization of heterogeneous order records
//! into a canonical invoice request, per-tenant document series allocation,
//! regime resolution (e-Fatura vs e-Arşiv), UBL-TR 1.2 XML generation, and
//! synchronous transmission to a GİB integrator.
//!
//! All monetary values use [`rust_decimal::Decimal`] - never floating point.
//! Rounding to wire precision happens only at XML serialization; every
//! intermediate aggregate is an unrounded running sum.
//!
//! The pipeline is `normalize → resolve → allocate → build → send`; each
//! stage's output is the next stage's sole input. Only the allocator touches
//! shared state (one counter row per tenant integration), and the lock it
//! takes never spans the network call.
//!
//! ## Quick Start
//!
//! ```rust
//! use chrono::NaiveDate;
//! use efatura::core::*;
//!
//! let store = InMemorySeriesStore::new();
//! store.insert("shop-1", DocumentSeries::new("ZNP{YYYY}", 1, 9));
//!
//! let id = allocate(&store, "shop-1", NaiveDate::from_ymd_opt(2024, 3, 5).unwrap()).unwrap();
//! assert_eq!(id, "ZNP2024000000001");
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `core` (default) | Canonical types, identifier validation, regime resolution, series allocation |
//! | `normalize` | Order normalization (tax-id chain, gross→net decomposition, carrier lookup) |
//! | `ubl` | UBL-TR 1.2 document generation |
//! | `transmit` | Integrator envelopes, HTTP submission, response classification |
//! | `all` | Everything |

#[cfg(feature = "core")]
pub mod core;

#[cfg(feature = "normalize")]
pub mod normalize;

#[cfg(feature = "ubl")]
pub mod ubl;

#[cfg(feature = "transmit")]
pub mod transmit;

// Re-export core types at crate root for convenience
#[cfg(feature = "core")]
pub use crate::core::*;
