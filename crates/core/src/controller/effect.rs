//! API calls the controller asks its host to perform.

use super::state::Fetch;
use registro_types::{ListQuery, PatientId, PatientPayload};

#[derive(Clone, Debug, PartialEq)]
pub enum Effect {
    FetchList { seq: u64, query: ListQuery },
    FetchStats { seq: u64 },
    FetchPatient(PatientId),
    CreatePatient(PatientPayload),
    UpdatePatient {
        id: PatientId,
        payload: PatientPayload,
    },
    DeletePatient(PatientId),
}

impl Effect {
    /// Short name for log lines.
    pub fn name(&self) -> &'static str {
        match self {
            Effect::FetchList { .. } => "fetch_list",
            Effect::FetchStats { .. } => "fetch_stats",
            Effect::FetchPatient(_) => "fetch_patient",
            Effect::CreatePatient(_) => "create_patient",
            Effect::UpdatePatient { .. } => "update_patient",
            Effect::DeletePatient(_) => "delete_patient",
        }
    }
}

impl From<Fetch> for Effect {
    fn from(fetch: Fetch) -> Self {
        match fetch {
            Fetch::List(request) => Effect::FetchList {
                seq: request.seq,
                query: request.query,
            },
            Fetch::Stats { seq } => Effect::FetchStats { seq },
        }
    }
}
