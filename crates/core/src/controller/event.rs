//! Inputs to the view controller: operator interactions and completed API calls.

use crate::error::ApiResult;
use crate::form::Field;
use registro_types::{ExportFormat, PatientId, PatientPage, PatientRecord, StatsSnapshot};
use tokio::time::Instant;

/// Something the operator did on the rendering surface.
#[derive(Clone, Debug, PartialEq)]
pub enum UiEvent {
    /// Surface is ready; load the first page and the statistics.
    Start,
    RiskFilterChanged(String),
    /// A keystroke in the name search box. The fetch is debounced from `at`.
    NameTyped {
        value: String,
        at: Instant,
    },
    PageSizeChanged(u32),
    PrevPage,
    NextPage,
    Refresh,
    CreateFieldSet {
        field: Field,
        value: String,
    },
    CreateCheckboxSet {
        field: Field,
        checked: bool,
    },
    SubmitCreate,
    EditOpen(PatientId),
    EditFieldSet {
        field: Field,
        value: String,
    },
    EditSave,
    EditCancel,
    /// Asks for confirmation; nothing is sent until [`UiEvent::DeleteConfirmed`].
    DeleteRequested(PatientId),
    DeleteConfirmed,
    DeleteCancelled,
    Export(ExportFormat),
}

/// The outcome of an [`Effect`](super::Effect), fed back into the controller.
#[derive(Clone, Debug, PartialEq)]
pub enum Completion {
    ListLoaded {
        seq: u64,
        result: ApiResult<PatientPage>,
    },
    StatsLoaded {
        seq: u64,
        result: ApiResult<StatsSnapshot>,
    },
    PatientLoaded {
        id: PatientId,
        result: ApiResult<PatientRecord>,
    },
    Created(ApiResult<()>),
    Updated {
        id: PatientId,
        result: ApiResult<()>,
    },
    Deleted {
        id: PatientId,
        result: ApiResult<()>,
    },
}

#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    Ui(UiEvent),
    Done(Completion),
}

impl From<UiEvent> for Event {
    fn from(event: UiEvent) -> Self {
        Event::Ui(event)
    }
}

impl From<Completion> for Event {
    fn from(completion: Completion) -> Self {
        Event::Done(completion)
    }
}
