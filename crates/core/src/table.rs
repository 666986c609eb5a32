//! View models for the patient table, page indicator and statistics panel.

use crate::formatter::{
    self, comorbidity_list, display_value, format_timestamp, medication_list, risk_badge, yes_no,
    RiskTier,
};
use registro_types::{PatientId, PatientRecord, StatsSnapshot};

/// Column headings, in cell order.
pub const COLUMNS: [&str; 17] = [
    "ID",
    "Fecha",
    "Nombre",
    "Edad",
    "Sexo",
    "Escolaridad",
    "Glucemia",
    "Riesgo",
    "PA",
    "IMC",
    "HTA",
    "Obesidad",
    "Fuma",
    "Act. física",
    "Comorbilidades",
    "Medicación",
    "Notas",
];

/// One rendered table row. `cells` lines up with [`COLUMNS`].
#[derive(Clone, Debug, PartialEq)]
pub struct PatientRow {
    /// Target for the row's edit and delete actions.
    pub id: PatientId,
    pub cells: Vec<String>,
    /// Badge tier for the risk cell, if any, so surfaces can colour it.
    pub risk: Option<RiskTier>,
}

impl PatientRow {
    pub fn from_record(record: &PatientRecord) -> Self {
        let risk = risk_badge(record.risk.as_deref());
        let cells = vec![
            display_value(Some(record.id)),
            format_timestamp(record.created_at.as_deref()),
            display_value(record.name.as_deref()),
            display_value(record.age),
            display_value(record.sex.as_deref()),
            display_value(record.schooling.as_deref()),
            formatter::glucose(record),
            display_value(risk),
            formatter::blood_pressure(record),
            formatter::bmi(record),
            yes_no(record.has_hypertension).to_string(),
            yes_no(record.has_obesity).to_string(),
            yes_no(record.smoker).to_string(),
            display_value(record.physical_activity.as_deref()),
            comorbidity_list(record),
            medication_list(record),
            display_value(record.notes.as_deref()),
        ];
        Self {
            id: record.id,
            cells,
            risk,
        }
    }
}

/// Rows for a page of records, in server order.
pub fn patient_rows(records: &[PatientRecord]) -> Vec<PatientRow> {
    records.iter().map(PatientRow::from_record).collect()
}

/// Page indicator text, e.g. `Página 1 de 1 (total 0)`.
pub fn page_info(page: u32, pages: u32, total: u64) -> String {
    format!("Página {page} de {pages} (total {total})")
}

/// A labelled number in the statistics panel.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StatCard {
    pub title: String,
    pub value: u64,
}

/// Cards for the statistics panel: totals first, then one card per risk category.
pub fn stat_cards(stats: &StatsSnapshot) -> Vec<StatCard> {
    let mut cards = vec![
        StatCard {
            title: "Total".into(),
            value: stats.total,
        },
        StatCard {
            title: "Con HTA".into(),
            value: stats.with_hypertension,
        },
        StatCard {
            title: "Con Obesidad".into(),
            value: stats.with_obesity,
        },
    ];
    cards.extend(stats.by_risk.iter().map(|(label, count)| StatCard {
        title: format!("Riesgo: {label}"),
        value: count,
    }));
    cards
}
