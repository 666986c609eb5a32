//! Pure presentation helpers for patient records.
//!
//! Every function here is total: absent, null or empty input yields [`PLACEHOLDER`], never an
//! empty string and never a panic. Fixed vocabularies (risk tiers, comorbidities, medications)
//! are ordered enumeration tables, so adding a category means adding a table row.

use crate::constants::{NO, PLACEHOLDER, YES};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use registro_types::PatientRecord;
use std::fmt;

// ============================================================================
// GENERIC VALUES
// ============================================================================

/// Renders a present value, or the placeholder for `None` and empty text.
pub fn display_value<T: fmt::Display>(value: Option<T>) -> String {
    match value {
        Some(v) => {
            let text = v.to_string();
            if text.is_empty() {
                PLACEHOLDER.to_string()
            } else {
                text
            }
        }
        None => PLACEHOLDER.to_string(),
    }
}

pub fn yes_no(flag: bool) -> &'static str {
    if flag {
        YES
    } else {
        NO
    }
}

// ============================================================================
// RISK BADGE
// ============================================================================

/// Severity tiers a free-text clinical risk label degrades to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RiskTier {
    /// High risk caused by low glucose; shown distinctly from generic high.
    Hypoglycemia,
    Low,
    Moderate,
    High,
}

/// Priority-ordered needles. The first tier with a matching needle wins, which is what keeps
/// `"alto (hipoglucemia)"` out of the generic high tier.
const RISK_TIERS: [(RiskTier, &[&str]); 4] = [
    (RiskTier::Hypoglycemia, &["hipoglucemia", "hypoglycemia"]),
    (RiskTier::Low, &["bajo", "low"]),
    (RiskTier::Moderate, &["moderado", "moderate"]),
    (RiskTier::High, &["alto", "high"]),
];

impl RiskTier {
    /// Case-insensitive containment match against the tier table.
    pub fn classify(label: &str) -> Option<Self> {
        let lowered = label.to_lowercase();
        RISK_TIERS
            .iter()
            .find(|(_, needles)| needles.iter().any(|n| lowered.contains(n)))
            .map(|(tier, _)| *tier)
    }

    pub fn label(self) -> &'static str {
        match self {
            RiskTier::Hypoglycemia => "Alto (hipoglucemia)",
            RiskTier::Low => "Bajo",
            RiskTier::Moderate => "Moderado",
            RiskTier::High => "Alto",
        }
    }

    /// Style class a rendering surface uses to colour the badge.
    pub fn css_class(self) -> &'static str {
        match self {
            RiskTier::Hypoglycemia => "hypo",
            RiskTier::Low => "low",
            RiskTier::Moderate => "mid",
            RiskTier::High => "high",
        }
    }
}

impl fmt::Display for RiskTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

pub fn risk_badge(label: Option<&str>) -> Option<RiskTier> {
    label.and_then(RiskTier::classify)
}

/// Badge text for a risk label, or the placeholder when no tier matches.
pub fn risk_badge_text(label: Option<&str>) -> String {
    display_value(risk_badge(label))
}

// ============================================================================
// TIMESTAMPS
// ============================================================================

const TIMESTAMP_DISPLAY: &str = "%d/%m/%Y %H:%M:%S";

/// Formats an ISO-8601 timestamp for display, in the wall-clock time it was written in.
///
/// Accepts RFC 3339 (`2025-03-01T10:00:00Z`), naive date-times with `T` or a space separator and
/// optional fractional seconds, and bare dates. Anything else yields the placeholder.
pub fn format_timestamp(iso: Option<&str>) -> String {
    let Some(raw) = iso.map(str::trim).filter(|s| !s.is_empty()) else {
        return PLACEHOLDER.to_string();
    };

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return dt.format(TIMESTAMP_DISPLAY).to_string();
    }
    for pattern in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, pattern) {
            return naive.format(TIMESTAMP_DISPLAY).to_string();
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return date.format("%d/%m/%Y").to_string();
    }

    PLACEHOLDER.to_string()
}

// ============================================================================
// COMORBIDITIES AND MEDICATIONS
// ============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Comorbidity {
    Hypertension,
    Obesity,
    Dyslipidemia,
    ChronicKidneyDisease,
    CardiovascularDisease,
    CopdAsthma,
    Depression,
}

impl Comorbidity {
    /// Display order.
    pub const ALL: [Comorbidity; 7] = [
        Comorbidity::Hypertension,
        Comorbidity::Obesity,
        Comorbidity::Dyslipidemia,
        Comorbidity::ChronicKidneyDisease,
        Comorbidity::CardiovascularDisease,
        Comorbidity::CopdAsthma,
        Comorbidity::Depression,
    ];

    pub fn abbreviation(self) -> &'static str {
        match self {
            Comorbidity::Hypertension => "HTA",
            Comorbidity::Obesity => "Obes",
            Comorbidity::Dyslipidemia => "Dislip",
            Comorbidity::ChronicKidneyDisease => "ERC",
            Comorbidity::CardiovascularDisease => "ECV",
            Comorbidity::CopdAsthma => "EPOC/Asma",
            Comorbidity::Depression => "Dep",
        }
    }

    pub fn is_present(self, record: &PatientRecord) -> bool {
        match self {
            Comorbidity::Hypertension => record.has_hypertension,
            Comorbidity::Obesity => record.has_obesity,
            Comorbidity::Dyslipidemia => record.has_dyslipidemia,
            Comorbidity::ChronicKidneyDisease => record.has_ckd,
            Comorbidity::CardiovascularDisease => record.has_cvd,
            Comorbidity::CopdAsthma => record.has_copd_asthma,
            Comorbidity::Depression => record.has_depression,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Medication {
    Antihypertensive,
    Antidiabetic,
    Insulin,
    Metformin,
    Statins,
    Antiplatelet,
}

impl Medication {
    /// Display order. Free-text "other" medication always follows these.
    pub const ALL: [Medication; 6] = [
        Medication::Antihypertensive,
        Medication::Antidiabetic,
        Medication::Insulin,
        Medication::Metformin,
        Medication::Statins,
        Medication::Antiplatelet,
    ];

    pub fn abbreviation(self) -> &'static str {
        match self {
            Medication::Antihypertensive => "Antihip.",
            Medication::Antidiabetic => "Antidiab.",
            Medication::Insulin => "Insulina",
            Medication::Metformin => "Metf.",
            Medication::Statins => "Estat.",
            Medication::Antiplatelet => "Antiagreg.",
        }
    }

    pub fn is_present(self, record: &PatientRecord) -> bool {
        match self {
            Medication::Antihypertensive => record.med_htn,
            Medication::Antidiabetic => record.med_dm,
            Medication::Insulin => record.med_insulin,
            Medication::Metformin => record.med_metformin,
            Medication::Statins => record.med_statins,
            Medication::Antiplatelet => record.med_antiplatelet,
        }
    }
}

pub fn comorbidity_list(record: &PatientRecord) -> String {
    let present: Vec<&str> = Comorbidity::ALL
        .iter()
        .filter(|c| c.is_present(record))
        .map(|c| c.abbreviation())
        .collect();
    join_or_placeholder(&present)
}

pub fn medication_list(record: &PatientRecord) -> String {
    let mut present: Vec<&str> = Medication::ALL
        .iter()
        .filter(|m| m.is_present(record))
        .map(|m| m.abbreviation())
        .collect();
    if let Some(other) = record.med_other.as_deref().filter(|s| !s.is_empty()) {
        present.push(other);
    }
    join_or_placeholder(&present)
}

fn join_or_placeholder(items: &[&str]) -> String {
    if items.is_empty() {
        PLACEHOLDER.to_string()
    } else {
        items.join(", ")
    }
}

// ============================================================================
// MEASUREMENTS
// ============================================================================

/// Glucose with one decimal.
pub fn glucose(record: &PatientRecord) -> String {
    display_value(record.glucose_mgdl.map(|g| format!("{g:.1}")))
}

/// `systolic/diastolic (stage)` when both readings are present and non-zero.
pub fn blood_pressure(record: &PatientRecord) -> String {
    match (record.systolic, record.diastolic) {
        (Some(s), Some(d)) if s != 0 && d != 0 => {
            format!("{s}/{d} ({})", display_value(record.htn_stage.as_deref()))
        }
        _ => PLACEHOLDER.to_string(),
    }
}

/// `bmi (category)` when the server computed a non-zero BMI.
pub fn bmi(record: &PatientRecord) -> String {
    match record.bmi {
        Some(value) if value != 0.0 => {
            format!("{value} ({})", display_value(record.bmi_cat.as_deref()))
        }
        _ => PLACEHOLDER.to_string(),
    }
}
