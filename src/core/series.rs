use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use super::error::EfaturaError;

/// Year placeholder accepted in series prefix templates, e.g. `"ZNP{YYYY}"`.
const YEAR_PLACEHOLDER: &str = "{YYYY}";

/// Regulator-mandated minimum width of the sequential part.
const MIN_PADDING: usize = 9;

/// Per-integration document number series - the one row of shared mutable
/// state this core owns.
///
/// The counter only ever increases and an issued number is never reused.
/// Gaps left by documents that were allocated but never successfully
/// transmitted are accepted; there is no rollback and no pending state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentSeries {
    /// Three uppercase letters plus a year placeholder, e.g. `"ZNP{YYYY}"`.
    pub prefix_template: String,
    /// Next counter value to issue.
    pub next_counter: u64,
    /// Zero-padding width of the counter; values below 9 are raised to 9.
    pub padding_width: usize,
}

impl DocumentSeries {
    pub fn new(prefix_template: impl Into<String>, next_counter: u64, padding_width: usize) -> Self {
        Self {
            prefix_template: prefix_template.into(),
            next_counter,
            padding_width,
        }
    }

    /// Substitute the year placeholder and validate the resolved prefix:
    /// exactly 3 uppercase ASCII letters followed by 4 digits.
    fn prefix_for_year(&self, year: i32) -> Result<String, EfaturaError> {
        let prefix = self.prefix_template.replace(YEAR_PLACEHOLDER, &year.to_string());
        let valid = prefix.len() == 7
            && prefix.bytes().take(3).all(|b| b.is_ascii_uppercase())
            && prefix.bytes().skip(3).all(|b| b.is_ascii_digit());
        if !valid {
            return Err(EfaturaError::Configuration(format!(
                "document series prefix '{}' does not resolve to 3 uppercase letters + 4 digits (got '{prefix}')",
                self.prefix_template
            )));
        }
        Ok(prefix)
    }

    fn format_id(&self, year: i32, counter: u64) -> Result<String, EfaturaError> {
        let prefix = self.prefix_for_year(year)?;
        let width = self.padding_width.max(MIN_PADDING);
        Ok(format!("{prefix}{counter:0>width$}"))
    }

    /// Preview the identifier the next allocation would produce, without
    /// consuming it.
    pub fn preview(&self, on: NaiveDate) -> Result<String, EfaturaError> {
        self.format_id(on.year(), self.next_counter)
    }
}

/// Storage seam for the series row.
///
/// `update` must run the closure under an exclusive lock (or transaction) on
/// that single row: load, mutate, persist, commit. The lock is held for the
/// allocation step only - transmission happens outside it, so one slow remote
/// call never serializes invoicing for a tenant.
pub trait SeriesStore {
    /// Run `f` against the series row for `integration_id`, exclusively.
    /// Fails with [`EfaturaError::Configuration`] when no series is
    /// configured for the integration.
    fn update(
        &self,
        integration_id: &str,
        f: &mut dyn FnMut(&mut DocumentSeries) -> Result<String, EfaturaError>,
    ) -> Result<String, EfaturaError>;
}

/// Mutex-backed store for tests and single-process deployments.
#[derive(Debug, Default)]
pub struct InMemorySeriesStore {
    rows: Mutex<HashMap<String, DocumentSeries>>,
}

impl InMemorySeriesStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, integration_id: impl Into<String>, series: DocumentSeries) {
        self.rows
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(integration_id.into(), series);
    }

    pub fn get(&self, integration_id: &str) -> Option<DocumentSeries> {
        self.rows
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(integration_id)
            .cloned()
    }
}

impl SeriesStore for InMemorySeriesStore {
    fn update(
        &self,
        integration_id: &str,
        f: &mut dyn FnMut(&mut DocumentSeries) -> Result<String, EfaturaError>,
    ) -> Result<String, EfaturaError> {
        let mut rows = self.rows.lock().unwrap_or_else(PoisonError::into_inner);
        let series = rows.get_mut(integration_id).ok_or_else(|| {
            EfaturaError::Configuration(format!(
                "no document series configured for integration '{integration_id}'"
            ))
        })?;
        f(series)
    }
}

/// Allocate the next document identifier for an integration.
///
/// Runs inside the store's exclusive row lock: read counter, format id,
/// persist counter + 1. Fails closed on an unconfigured or malformed series;
/// an identifier is never fabricated.
pub fn allocate(
    store: &dyn SeriesStore,
    integration_id: &str,
    on: NaiveDate,
) -> Result<String, EfaturaError> {
    store.update(integration_id, &mut |series| {
        let id = series.format_id(on.year(), series.next_counter)?;
        series.next_counter += 1;
        tracing::debug!(integration_id, document_id = %id, "allocated document id");
        Ok(id)
    })
}
