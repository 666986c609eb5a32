//! Patient record as served by the registry backend.
//!
//! Only the identifier is guaranteed. Every other column may be absent, `null` or loosely typed,
//! and the derived clinical labels (`risk`, `htn_stage`, `bmi`, `bmi_cat`) are computed server-side
//! and treated as opaque strings/values here.

use crate::lenient;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Server-assigned patient identifier; the sole key for edit and delete targeting.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct PatientId(i64);

impl PatientId {
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    pub fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for PatientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for PatientId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<i64>().map(Self)
    }
}

impl From<i64> for PatientId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

/// One patient entry with demographic, clinical and medication fields.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PatientRecord {
    pub id: PatientId,
    #[serde(default, deserialize_with = "lenient::text")]
    pub created_at: Option<String>,

    // Demographics
    #[serde(default, deserialize_with = "lenient::text")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient::integer")]
    pub age: Option<i64>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub sex: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub schooling: Option<String>,

    // Measurements
    #[serde(default, deserialize_with = "lenient::real")]
    pub glucose_mgdl: Option<f64>,
    #[serde(default, deserialize_with = "lenient::integer")]
    pub systolic: Option<i64>,
    #[serde(default, deserialize_with = "lenient::integer")]
    pub diastolic: Option<i64>,
    #[serde(default, deserialize_with = "lenient::real")]
    pub weight_kg: Option<f64>,
    #[serde(default, deserialize_with = "lenient::real")]
    pub height_cm: Option<f64>,

    // Server-derived labels
    #[serde(default, deserialize_with = "lenient::text")]
    pub risk: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub htn_stage: Option<String>,
    #[serde(default, deserialize_with = "lenient::real")]
    pub bmi: Option<f64>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub bmi_cat: Option<String>,

    // Comorbidities
    #[serde(default, deserialize_with = "lenient::flag")]
    pub has_hypertension: bool,
    #[serde(default, deserialize_with = "lenient::flag")]
    pub has_obesity: bool,
    #[serde(default, deserialize_with = "lenient::flag")]
    pub has_dyslipidemia: bool,
    #[serde(default, deserialize_with = "lenient::flag")]
    pub has_ckd: bool,
    #[serde(default, deserialize_with = "lenient::flag")]
    pub has_cvd: bool,
    #[serde(default, deserialize_with = "lenient::flag")]
    pub has_copd_asthma: bool,
    #[serde(default, deserialize_with = "lenient::flag")]
    pub has_depression: bool,

    // Lifestyle
    #[serde(default, deserialize_with = "lenient::flag")]
    pub smoker: bool,
    #[serde(default, deserialize_with = "lenient::text")]
    pub physical_activity: Option<String>,

    // Medications
    #[serde(default, deserialize_with = "lenient::flag")]
    pub med_htn: bool,
    #[serde(default, deserialize_with = "lenient::flag")]
    pub med_dm: bool,
    #[serde(default, deserialize_with = "lenient::flag")]
    pub med_insulin: bool,
    #[serde(default, deserialize_with = "lenient::flag")]
    pub med_metformin: bool,
    #[serde(default, deserialize_with = "lenient::flag")]
    pub med_statins: bool,
    #[serde(default, deserialize_with = "lenient::flag")]
    pub med_antiplatelet: bool,
    #[serde(default, deserialize_with = "lenient::text")]
    pub med_other: Option<String>,

    #[serde(default, deserialize_with = "lenient::text")]
    pub notes: Option<String>,
}
