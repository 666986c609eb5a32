//! Create and edit forms, and their coercion into JSON payloads.
//!
//! Each form field declares its kind up front ([`FieldKind`]); coercion is driven by that
//! declaration rather than by whether the operator's input happens to look numeric. Blank inputs
//! are omitted from the payload, so a blank number is never sent as zero.

use registro_types::{PatientId, PatientPayload, PatientRecord};
use serde_json::{Number, Value};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FormError {
    #[error("unknown form field: {0}")]
    UnknownField(String),
    #[error("field {0} cannot be edited")]
    NotEditable(Field),
    #[error("field {0} is a checkbox; toggle it instead of typing a value")]
    NotAValueField(Field),
    #[error("field {0} is not a checkbox")]
    NotACheckbox(Field),
}

/// How raw form input for a field is turned into JSON.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldKind {
    /// Sent verbatim as a string, even when it looks numeric.
    Text,
    /// Sent as a JSON number; input that does not parse is forwarded as text for the backend
    /// to reject with its own validation message.
    Number,
    /// Checkbox: `true` when checked, `false` otherwise. Always sent on create.
    Checkbox,
    /// Yes/no select whose "yes" option has the value `"1"`. Always sent on create.
    YesNo,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Field {
    Name,
    Age,
    Sex,
    Schooling,
    GlucoseMgdl,
    Systolic,
    Diastolic,
    WeightKg,
    HeightCm,
    HasHypertension,
    HasObesity,
    HasDyslipidemia,
    HasCkd,
    HasCvd,
    HasCopdAsthma,
    HasDepression,
    Smoker,
    PhysicalActivity,
    MedHtn,
    MedDm,
    MedInsulin,
    MedMetformin,
    MedStatins,
    MedAntiplatelet,
    MedOther,
    Notes,
}

/// Field schema: wire name and kind for every form field, in form order.
const SCHEMA: [(Field, &str, FieldKind); 26] = [
    (Field::Name, "name", FieldKind::Text),
    (Field::Age, "age", FieldKind::Number),
    (Field::Sex, "sex", FieldKind::Text),
    (Field::Schooling, "schooling", FieldKind::Text),
    (Field::GlucoseMgdl, "glucose_mgdl", FieldKind::Number),
    (Field::Systolic, "systolic", FieldKind::Number),
    (Field::Diastolic, "diastolic", FieldKind::Number),
    (Field::WeightKg, "weight_kg", FieldKind::Number),
    (Field::HeightCm, "height_cm", FieldKind::Number),
    (Field::HasHypertension, "has_hypertension", FieldKind::Checkbox),
    (Field::HasObesity, "has_obesity", FieldKind::Checkbox),
    (Field::HasDyslipidemia, "has_dyslipidemia", FieldKind::Checkbox),
    (Field::HasCkd, "has_ckd", FieldKind::Checkbox),
    (Field::HasCvd, "has_cvd", FieldKind::Checkbox),
    (Field::HasCopdAsthma, "has_copd_asthma", FieldKind::Checkbox),
    (Field::HasDepression, "has_depression", FieldKind::Checkbox),
    (Field::Smoker, "smoker", FieldKind::YesNo),
    (Field::PhysicalActivity, "physical_activity", FieldKind::Text),
    (Field::MedHtn, "med_htn", FieldKind::Checkbox),
    (Field::MedDm, "med_dm", FieldKind::Checkbox),
    (Field::MedInsulin, "med_insulin", FieldKind::Checkbox),
    (Field::MedMetformin, "med_metformin", FieldKind::Checkbox),
    (Field::MedStatins, "med_statins", FieldKind::Checkbox),
    (Field::MedAntiplatelet, "med_antiplatelet", FieldKind::Checkbox),
    (Field::MedOther, "med_other", FieldKind::Text),
    (Field::Notes, "notes", FieldKind::Text),
];

/// Fields shown on the edit surface. Server-derived labels (risk, BMI category, stage) are not
/// editable.
pub const EDIT_FIELDS: [Field; 9] = [
    Field::Name,
    Field::Age,
    Field::Sex,
    Field::Schooling,
    Field::GlucoseMgdl,
    Field::Systolic,
    Field::Diastolic,
    Field::WeightKg,
    Field::HeightCm,
];

impl Field {
    pub fn all() -> impl Iterator<Item = Field> {
        SCHEMA.iter().map(|(field, _, _)| *field)
    }

    fn entry(self) -> &'static (Field, &'static str, FieldKind) {
        // SCHEMA lists the variants in declaration order.
        &SCHEMA[self as usize]
    }

    pub fn wire_name(self) -> &'static str {
        self.entry().1
    }

    pub fn kind(self) -> FieldKind {
        self.entry().2
    }

    pub fn is_editable(self) -> bool {
        EDIT_FIELDS.contains(&self)
    }

    /// Current value of an editable field in `record`, as the edit surface shows it.
    fn value_in(self, record: &PatientRecord) -> Option<String> {
        match self {
            Field::Name => record.name.clone(),
            Field::Age => record.age.map(|v| v.to_string()),
            Field::Sex => record.sex.clone(),
            Field::Schooling => record.schooling.clone(),
            Field::GlucoseMgdl => record.glucose_mgdl.map(|v| v.to_string()),
            Field::Systolic => record.systolic.map(|v| v.to_string()),
            Field::Diastolic => record.diastolic.map(|v| v.to_string()),
            Field::WeightKg => record.weight_kg.map(|v| v.to_string()),
            Field::HeightCm => record.height_cm.map(|v| v.to_string()),
            _ => None,
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

impl FromStr for Field {
    type Err = FormError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim();
        SCHEMA
            .iter()
            .find(|(_, wire, _)| *wire == key)
            .map(|(field, _, _)| *field)
            .ok_or_else(|| FormError::UnknownField(key.to_string()))
    }
}

/// Coerces one raw input according to the field's declared kind.
///
/// Returns `None` for blank input so the key is left out of the payload.
fn coerce_value(kind: FieldKind, raw: &str) -> Option<Value> {
    if raw.trim().is_empty() {
        return None;
    }
    match kind {
        FieldKind::Text => Some(Value::String(raw.to_string())),
        FieldKind::Number => {
            let trimmed = raw.trim();
            if let Ok(int) = trimmed.parse::<i64>() {
                return Some(Value::Number(int.into()));
            }
            let number = trimmed
                .parse::<f64>()
                .ok()
                .and_then(Number::from_f64)
                .map(Value::Number);
            Some(number.unwrap_or_else(|| Value::String(raw.to_string())))
        }
        FieldKind::Checkbox => Some(Value::Bool(raw == "on")),
        FieldKind::YesNo => Some(Value::Bool(raw.trim() == "1")),
    }
}

// ============================================================================
// CREATE FORM
// ============================================================================

/// Operator input for the create form: typed values plus the set of checked boxes.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FormInput {
    values: BTreeMap<Field, String>,
    checked: BTreeSet<Field>,
}

impl FormInput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a typed value (text, number or the yes/no select).
    pub fn set(&mut self, field: Field, value: impl Into<String>) -> Result<(), FormError> {
        if field.kind() == FieldKind::Checkbox {
            return Err(FormError::NotAValueField(field));
        }
        self.values.insert(field, value.into());
        Ok(())
    }

    pub fn set_checked(&mut self, field: Field, checked: bool) -> Result<(), FormError> {
        if field.kind() != FieldKind::Checkbox {
            return Err(FormError::NotACheckbox(field));
        }
        if checked {
            self.checked.insert(field);
        } else {
            self.checked.remove(&field);
        }
        Ok(())
    }

    pub fn value(&self, field: Field) -> Option<&str> {
        self.values.get(&field).map(String::as_str)
    }

    pub fn is_checked(&self, field: Field) -> bool {
        self.checked.contains(&field)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty() && self.checked.is_empty()
    }

    pub fn clear(&mut self) {
        self.values.clear();
        self.checked.clear();
    }

    /// Builds the `POST /patients` body.
    ///
    /// Checkbox and yes/no fields are always present; other fields only when non-blank.
    pub fn to_create_payload(&self) -> PatientPayload {
        let mut payload = PatientPayload::new();
        for field in Field::all() {
            match field.kind() {
                FieldKind::Checkbox => payload.insert(field.wire_name(), self.is_checked(field)),
                FieldKind::YesNo => {
                    let yes = self.value(field).is_some_and(|v| v.trim() == "1");
                    payload.insert(field.wire_name(), yes);
                }
                kind => {
                    if let Some(value) = self.value(field).and_then(|raw| coerce_value(kind, raw)) {
                        payload.insert(field.wire_name(), value);
                    }
                }
            }
        }
        payload
    }
}

// ============================================================================
// EDIT DRAFT
// ============================================================================

/// The edit surface: a record id and the editable subset of its fields as text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EditDraft {
    id: PatientId,
    values: BTreeMap<Field, String>,
}

impl EditDraft {
    /// Populates the draft from a fetched record. Absent values become empty inputs.
    pub fn from_record(record: &PatientRecord) -> Self {
        let values = EDIT_FIELDS
            .iter()
            .map(|field| (*field, field.value_in(record).unwrap_or_default()))
            .collect();
        Self {
            id: record.id,
            values,
        }
    }

    pub fn id(&self) -> PatientId {
        self.id
    }

    pub fn value(&self, field: Field) -> &str {
        self.values.get(&field).map(String::as_str).unwrap_or("")
    }

    /// Editable fields with their current values, in form order.
    pub fn fields(&self) -> impl Iterator<Item = (Field, &str)> {
        EDIT_FIELDS.iter().map(|f| (*f, self.value(*f)))
    }

    pub fn set(&mut self, field: Field, value: impl Into<String>) -> Result<(), FormError> {
        if !field.is_editable() {
            return Err(FormError::NotEditable(field));
        }
        self.values.insert(field, value.into());
        Ok(())
    }

    /// Builds the `PUT /patients/{id}` body. Blank fields are omitted.
    pub fn to_update_payload(&self) -> PatientPayload {
        let mut payload = PatientPayload::new();
        for field in EDIT_FIELDS {
            if let Some(value) = coerce_value(field.kind(), self.value(field)) {
                payload.insert(field.wire_name(), value);
            }
        }
        payload
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_schema_matches_variant_order() {
        for (i, (field, _, _)) in SCHEMA.iter().enumerate() {
            assert_eq!(*field as usize, i, "{field} out of order in SCHEMA");
        }
    }

    #[test]
    fn test_field_parses_from_wire_name() {
        assert_eq!("glucose_mgdl".parse::<Field>(), Ok(Field::GlucoseMgdl));
        assert_eq!(
            "risk".parse::<Field>(),
            Err(FormError::UnknownField("risk".into()))
        );
    }

    #[test]
    fn test_create_payload_omits_blank_numbers() {
        let mut form = FormInput::new();
        form.set(Field::Name, "Ana").unwrap();
        form.set(Field::GlucoseMgdl, "140").unwrap();
        form.set(Field::Age, "").unwrap();
        form.set(Field::WeightKg, "70.5").unwrap();

        let payload = form.to_create_payload();
        assert_eq!(payload.get("name"), Some(&json!("Ana")));
        assert_eq!(payload.get("glucose_mgdl"), Some(&json!(140)));
        assert_eq!(payload.get("weight_kg"), Some(&json!(70.5)));
        assert!(!payload.contains_key("age"), "blank numbers must be omitted");
        assert!(!payload.contains_key("systolic"));
    }

    #[test]
    fn test_create_payload_derives_flags_from_checkbox_presence() {
        let mut form = FormInput::new();
        form.set_checked(Field::HasCkd, true).unwrap();
        form.set_checked(Field::MedInsulin, true).unwrap();
        form.set_checked(Field::MedInsulin, false).unwrap();
        form.set(Field::Smoker, "1").unwrap();

        let payload = form.to_create_payload();
        assert_eq!(payload.get("has_ckd"), Some(&json!(true)));
        assert_eq!(payload.get("has_obesity"), Some(&json!(false)));
        assert_eq!(payload.get("med_insulin"), Some(&json!(false)));
        assert_eq!(payload.get("smoker"), Some(&json!(true)));
    }

    #[test]
    fn test_smoker_defaults_to_false() {
        let payload = FormInput::new().to_create_payload();
        assert_eq!(payload.get("smoker"), Some(&json!(false)));
    }

    #[test]
    fn test_checkbox_and_value_fields_are_not_interchangeable() {
        let mut form = FormInput::new();
        assert_eq!(
            form.set(Field::HasCkd, "on"),
            Err(FormError::NotAValueField(Field::HasCkd))
        );
        assert_eq!(
            form.set_checked(Field::Name, true),
            Err(FormError::NotACheckbox(Field::Name))
        );
    }

    #[test]
    fn test_unparseable_number_is_forwarded_as_text() {
        let mut form = FormInput::new();
        form.set(Field::GlucoseMgdl, "abc").unwrap();
        assert_eq!(
            form.to_create_payload().get("glucose_mgdl"),
            Some(&json!("abc"))
        );
    }

    #[test]
    fn test_edit_draft_populates_editable_subset() {
        let record = PatientRecord {
            id: PatientId::new(12),
            name: Some("Luis".into()),
            glucose_mgdl: Some(98.0),
            risk: Some("bajo".into()),
            ..Default::default()
        };
        let draft = EditDraft::from_record(&record);

        assert_eq!(draft.id(), PatientId::new(12));
        assert_eq!(draft.value(Field::Name), "Luis");
        assert_eq!(draft.value(Field::GlucoseMgdl), "98");
        assert_eq!(draft.value(Field::Age), "");
        assert_eq!(draft.fields().count(), EDIT_FIELDS.len());
    }

    #[test]
    fn test_edit_draft_rejects_non_editable_fields() {
        let mut draft = EditDraft::from_record(&PatientRecord::default());
        assert_eq!(
            draft.set(Field::Notes, "x"),
            Err(FormError::NotEditable(Field::Notes))
        );
    }

    #[test]
    fn test_update_payload_keeps_textual_fields_as_text() {
        let mut draft = EditDraft::from_record(&PatientRecord::default());
        draft.set(Field::Schooling, "12").unwrap();
        draft.set(Field::Name, "007").unwrap();
        draft.set(Field::Systolic, "130").unwrap();

        let payload = draft.to_update_payload();
        assert_eq!(payload.get("schooling"), Some(&json!("12")));
        assert_eq!(payload.get("name"), Some(&json!("007")));
        assert_eq!(payload.get("systolic"), Some(&json!(130)));
        assert!(!payload.contains_key("age"));
        assert_eq!(payload.len(), 3);
    }
}
