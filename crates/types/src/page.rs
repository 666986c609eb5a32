//! Paginated listing: filters, query parameters and the page envelope.

use crate::{NonEmptyText, PatientRecord};
use serde::{Deserialize, Serialize};

/// Active list filters. Both are optional; blank input is represented as `None`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PatientFilters {
    /// Risk category, matched case-insensitively by the backend.
    pub risk: Option<NonEmptyText>,
    /// Name substring.
    pub name: Option<NonEmptyText>,
}

impl PatientFilters {
    /// Builds filters from raw operator input, trimming and dropping blank values.
    pub fn from_inputs(risk: &str, name: &str) -> Self {
        Self {
            risk: NonEmptyText::optional(risk),
            name: NonEmptyText::optional(name),
        }
    }
}

/// Everything the backend needs to serve one page of the patient list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ListQuery {
    pub page: u32,
    pub page_size: u32,
    pub filters: PatientFilters,
}

impl ListQuery {
    /// Query-string pairs in wire order. Filter keys are omitted when unset.
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("page", self.page.to_string()),
            ("page_size", self.page_size.to_string()),
        ];
        if let Some(risk) = &self.filters.risk {
            pairs.push(("risk", risk.to_string()));
        }
        if let Some(name) = &self.filters.name {
            pairs.push(("name", name.to_string()));
        }
        pairs
    }
}

/// One page of patient records as returned by `GET /patients`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PatientPage {
    #[serde(default)]
    pub items: Vec<PatientRecord>,
    pub page: u32,
    /// Total page count. The backend reports `0` for an empty registry.
    pub pages: u32,
    pub total: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u32>,
}
