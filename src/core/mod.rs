//! Canonical invoice types, identifier validation, regime resolution, and
//! document series allocation.
//!
//! This module is the dependency-free foundation: everything here is pure
//! data and decision logic; the only shared mutable state is the
//! [`DocumentSeries`] row behind [`SeriesStore`].

mod error;
pub mod identifier;
mod profile;
mod series;
mod types;
pub mod units;

pub use error::EfaturaError;
pub use identifier::{ANONYMOUS_TCKN, is_valid_tckn, is_valid_tax_id, is_valid_vkn};
pub use profile::InvoiceProfile;
pub use series::{DocumentSeries, InMemorySeriesStore, SeriesStore, allocate};
pub use types::*;
pub use units::{is_known_unit_code, unit_code};
