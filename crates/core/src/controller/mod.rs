//! # View State Controller
//!
//! Orchestrates operator interactions against the registry backend. The controller owns the
//! [`ViewState`], the last fetched page of records, the last statistics snapshot, the create
//! form, the open edit draft and any delete awaiting confirmation.
//!
//! It performs no I/O itself. Each [`ViewController::dispatch`] returns an [`Output`]: the
//! [`Effect`]s (API calls) the host must run and the [`RenderCommand`]s it must apply. Results
//! come back as [`Completion`] events. Nothing in memory changes before the call that justifies
//! it has succeeded, and a failed call is reported to the operator without being retried.

mod effect;
mod event;
mod render;
mod runner;
mod state;

pub use effect::Effect;
pub use event::{Completion, Event, UiEvent};
pub use render::{Notice, NoticeLevel, Output, RenderCommand};
pub use runner::{perform, spawn_effect, Session};
pub use state::{Fetch, ListRequest, Transition, Verdict, ViewEvent, ViewState};

use crate::chart::{draw_risk_chart, PixelCanvas};
use crate::config::ClientConfig;
use crate::constants::{CHART_HEIGHT, CHART_WIDTH};
use crate::debounce::Debouncer;
use crate::error::{ApiError, ApiResult};
use crate::form::{EditDraft, Field, FormInput};
use crate::table::{page_info, patient_rows, stat_cards};
use registro_types::{
    ExportFormat, NonEmptyText, PatientId, PatientPage, PatientRecord, StatsSnapshot,
};
use tokio::time::Instant;

pub const SAVED_MESSAGE: &str = "Paciente guardado correctamente";
pub const UPDATED_MESSAGE: &str = "Paciente actualizado correctamente";

/// Prompt shown before deleting a record.
pub fn delete_prompt(id: PatientId) -> String {
    format!("¿Eliminar #{id}?")
}

pub struct ViewController {
    config: ClientConfig,
    state: ViewState,
    records: Vec<PatientRecord>,
    stats: Option<StatsSnapshot>,
    create_form: FormInput,
    edit: Option<EditDraft>,
    /// Record most recently asked for by an edit open; only its fetch may open the edit.
    opening: Option<PatientId>,
    pending_delete: Option<PatientId>,
    search: Debouncer<String>,
    chart: PixelCanvas,
}

impl ViewController {
    pub fn new(config: &ClientConfig) -> Self {
        Self {
            state: ViewState::new(config.default_page_size()),
            records: Vec::new(),
            stats: None,
            create_form: FormInput::new(),
            edit: None,
            opening: None,
            pending_delete: None,
            search: Debouncer::new(config.search_debounce()),
            chart: PixelCanvas::new(CHART_WIDTH, CHART_HEIGHT),
            config: config.clone(),
        }
    }

    // ========================================================================
    // ACCESSORS
    // ========================================================================

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    pub fn records(&self) -> &[PatientRecord] {
        &self.records
    }

    pub fn stats(&self) -> Option<&StatsSnapshot> {
        self.stats.as_ref()
    }

    pub fn create_form(&self) -> &FormInput {
        &self.create_form
    }

    pub fn edit_draft(&self) -> Option<&EditDraft> {
        self.edit.as_ref()
    }

    pub fn pending_delete(&self) -> Option<PatientId> {
        self.pending_delete
    }

    pub fn chart(&self) -> &PixelCanvas {
        &self.chart
    }

    /// When the pending name search becomes due, if one is waiting.
    pub fn search_deadline(&self) -> Option<Instant> {
        self.search.deadline()
    }

    // ========================================================================
    // DISPATCH
    // ========================================================================

    /// Applies one event and returns the effects and renders it produced.
    pub fn dispatch(&mut self, event: impl Into<Event>) -> Output {
        let mut out = Output::default();
        match event.into() {
            Event::Ui(event) => self.on_ui(event, &mut out),
            Event::Done(completion) => self.on_completion(completion, &mut out),
        }
        out
    }

    /// Fires the debounced name search once input has been quiet long enough.
    pub fn poll_search(&mut self, now: Instant) -> Output {
        let mut out = Output::default();
        if let Some(name) = self.search.poll_ready(now) {
            tracing::debug!(name = %name, "name search settled");
            self.apply(ViewEvent::NameFilterChanged(NonEmptyText::optional(&name)), &mut out);
        }
        out
    }

    fn on_ui(&mut self, event: UiEvent, out: &mut Output) {
        match event {
            UiEvent::Start | UiEvent::Refresh => self.reload_all(out),
            UiEvent::RiskFilterChanged(risk) => {
                self.apply(ViewEvent::RiskFilterChanged(NonEmptyText::optional(&risk)), out);
            }
            UiEvent::NameTyped { value, at } => self.search.push(value, at),
            UiEvent::PageSizeChanged(size) => {
                if !self.config.page_size_options().contains(&size) {
                    tracing::warn!(size, "page size not offered; ignoring");
                    return;
                }
                self.apply(ViewEvent::PageSizeChanged(size), out);
            }
            UiEvent::PrevPage => {
                self.apply(ViewEvent::PrevPage, out);
            }
            UiEvent::NextPage => {
                self.apply(ViewEvent::NextPage, out);
            }
            UiEvent::CreateFieldSet { field, value } => {
                if let Err(err) = self.create_form.set(field, value) {
                    out.notify(Notice::error(err.to_string()));
                }
            }
            UiEvent::CreateCheckboxSet { field, checked } => {
                if let Err(err) = self.create_form.set_checked(field, checked) {
                    out.notify(Notice::error(err.to_string()));
                }
            }
            UiEvent::SubmitCreate => {
                let payload = self.create_form.to_create_payload();
                out.effects.push(Effect::CreatePatient(payload));
            }
            UiEvent::EditOpen(id) => {
                self.opening = Some(id);
                out.effects.push(Effect::FetchPatient(id));
            }
            UiEvent::EditFieldSet { field, value } => self.set_edit_field(field, value, out),
            UiEvent::EditSave => match &self.edit {
                Some(draft) => out.effects.push(Effect::UpdatePatient {
                    id: draft.id(),
                    payload: draft.to_update_payload(),
                }),
                None => tracing::debug!("save requested with no open edit"),
            },
            UiEvent::EditCancel => {
                self.opening = None;
                if self.edit.take().is_some() {
                    out.render(RenderCommand::CloseEdit);
                }
            }
            UiEvent::DeleteRequested(id) => {
                self.pending_delete = Some(id);
                out.render(RenderCommand::ConfirmDelete {
                    id,
                    prompt: delete_prompt(id),
                });
            }
            UiEvent::DeleteConfirmed => match self.pending_delete.take() {
                Some(id) => out.effects.push(Effect::DeletePatient(id)),
                None => tracing::debug!("delete confirmed with nothing pending"),
            },
            UiEvent::DeleteCancelled => self.pending_delete = None,
            UiEvent::Export(format) => self.export(format, out),
        }
    }

    fn on_completion(&mut self, completion: Completion, out: &mut Output) {
        match completion {
            Completion::ListLoaded { seq, result } => self.on_list(seq, result, out),
            Completion::StatsLoaded { seq, result } => self.on_stats(seq, result, out),
            Completion::PatientLoaded { id, result } => {
                if self.opening != Some(id) {
                    tracing::warn!(%id, "discarding stale patient record");
                    return;
                }
                self.opening = None;
                match result {
                    Ok(record) => {
                        let draft = EditDraft::from_record(&record);
                        self.edit = Some(draft.clone());
                        out.render(RenderCommand::OpenEdit(draft));
                    }
                    Err(err) => self.mutation_failed("open edit", id, &err, out),
                }
            }
            Completion::Created(result) => match result {
                Ok(()) => {
                    self.create_form.clear();
                    out.render(RenderCommand::ResetCreateForm);
                    self.reload_all(out);
                    out.notify(Notice::info(SAVED_MESSAGE));
                }
                Err(err) => {
                    tracing::warn!(error = %err, "create failed");
                    out.notify(Notice::error(err.operator_message()));
                }
            },
            Completion::Updated { id, result } => match result {
                Ok(()) => {
                    self.edit = None;
                    out.render(RenderCommand::CloseEdit);
                    self.reload_all(out);
                    out.notify(Notice::info(UPDATED_MESSAGE));
                }
                Err(err) => self.mutation_failed("update", id, &err, out),
            },
            Completion::Deleted { id, result } => match result {
                Ok(()) => {
                    self.close_edit_of(id, out);
                    self.reload_all(out);
                    out.notify(Notice::info(format!("Paciente #{id} eliminado")));
                }
                Err(err) => self.mutation_failed("delete", id, &err, out),
            },
        }
    }

    fn on_list(&mut self, seq: u64, result: ApiResult<PatientPage>, out: &mut Output) {
        match result {
            Ok(page) => {
                let verdict = self.apply(
                    ViewEvent::ListLoaded {
                        seq,
                        page: page.page,
                        pages: page.pages,
                        total: page.total,
                    },
                    out,
                );
                if verdict == Verdict::Stale {
                    tracing::warn!(seq, "discarding stale patient list");
                    return;
                }
                self.records = page.items;
                out.render(RenderCommand::Table(patient_rows(&self.records)));
                out.render(RenderCommand::PageInfo(page_info(
                    self.state.page(),
                    self.state.pages(),
                    self.state.total(),
                )));
            }
            Err(err) => {
                if self.apply(ViewEvent::ListFailed { seq }, out) == Verdict::Stale {
                    tracing::warn!(seq, error = %err, "discarding stale list failure");
                    return;
                }
                tracing::warn!(error = %err, "patient list fetch failed");
                out.notify(Notice::error(err.operator_message()));
            }
        }
    }

    fn on_stats(&mut self, seq: u64, result: ApiResult<StatsSnapshot>, out: &mut Output) {
        if self.apply(ViewEvent::StatsLoaded { seq }, out) == Verdict::Stale {
            tracing::warn!(seq, "discarding stale statistics");
            return;
        }
        match result {
            Ok(stats) => {
                draw_risk_chart(&mut self.chart, &stats.by_risk);
                out.render(RenderCommand::Stats(stat_cards(&stats)));
                out.render(RenderCommand::Chart(self.chart.clone()));
                self.stats = Some(stats);
            }
            Err(err) => {
                tracing::warn!(error = %err, "statistics fetch failed");
                out.notify(Notice::error(err.operator_message()));
            }
        }
    }

    /// Reports a failed record operation. A record that no longer exists means the table is out
    /// of date, so it is reloaded.
    fn mutation_failed(&mut self, action: &str, id: PatientId, err: &ApiError, out: &mut Output) {
        tracing::warn!(%id, action, error = %err, "record operation failed");
        out.notify(Notice::error(err.operator_message()));
        if matches!(err, ApiError::NotFound { .. }) {
            self.close_edit_of(id, out);
            self.reload_all(out);
        }
    }

    fn close_edit_of(&mut self, id: PatientId, out: &mut Output) {
        if self.opening == Some(id) {
            self.opening = None;
        }
        if self.edit.as_ref().is_some_and(|d| d.id() == id) {
            self.edit = None;
            out.render(RenderCommand::CloseEdit);
        }
    }

    fn set_edit_field(&mut self, field: Field, value: String, out: &mut Output) {
        let Some(draft) = self.edit.as_mut() else {
            tracing::debug!(%field, "edit field set with no open edit");
            return;
        };
        if let Err(err) = draft.set(field, value) {
            out.notify(Notice::error(err.to_string()));
        }
    }

    fn export(&self, format: ExportFormat, out: &mut Output) {
        let url = self.config.export_url(format);
        tracing::info!(%format, url = %url, "export requested");
        out.render(RenderCommand::OpenDownload { url });
    }

    fn reload_all(&mut self, out: &mut Output) {
        self.apply(ViewEvent::Reload, out);
        self.apply(ViewEvent::StatsRequested, out);
    }

    /// Runs the reducer and queues any fetch it asks for.
    fn apply(&mut self, event: ViewEvent, out: &mut Output) -> Verdict {
        let Transition {
            state,
            fetch,
            verdict,
        } = self.state.reduce(event);
        self.state = state;
        if let Some(fetch) = fetch {
            out.effects.push(fetch.into());
        }
        verdict
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use registro_types::{RiskCounts, StatsSnapshot};
    use tokio::time::Duration;

    fn controller() -> ViewController {
        let config = ClientConfig::new("http://localhost:5000/api").expect("valid config");
        ViewController::new(&config)
    }

    fn list_seq(out: &Output) -> u64 {
        out.effects
            .iter()
            .find_map(|e| match e {
                Effect::FetchList { seq, .. } => Some(*seq),
                _ => None,
            })
            .expect("list fetch")
    }

    fn page(total: u64, pages: u32, page: u32) -> PatientPage {
        PatientPage {
            items: Vec::new(),
            page,
            pages,
            total,
            page_size: Some(10),
        }
    }

    fn record(id: i64, name: &str) -> PatientRecord {
        PatientRecord {
            id: PatientId::new(id),
            name: Some(name.into()),
            ..Default::default()
        }
    }

    #[test]
    fn test_start_fetches_list_and_stats() {
        let mut controller = controller();
        let out = controller.dispatch(UiEvent::Start);
        assert_eq!(out.effects.len(), 2);
        assert!(matches!(
            &out.effects[0],
            Effect::FetchList { query, .. } if query.page == 1 && query.page_size == 10
        ));
        assert!(matches!(out.effects[1], Effect::FetchStats { .. }));
    }

    #[test]
    fn test_stale_list_never_overwrites_newer_one() {
        let mut controller = controller();
        let old = list_seq(&controller.dispatch(UiEvent::RiskFilterChanged("alto".into())));
        let new = list_seq(&controller.dispatch(UiEvent::RiskFilterChanged("bajo".into())));

        let mut fresh = page(1, 1, 1);
        fresh.items.push(record(2, "Bea"));
        controller.dispatch(Completion::ListLoaded {
            seq: new,
            result: Ok(fresh),
        });

        let mut late = page(1, 1, 1);
        late.items.push(record(1, "Ana"));
        let out = controller.dispatch(Completion::ListLoaded {
            seq: old,
            result: Ok(late),
        });

        assert!(out.is_empty());
        assert_eq!(controller.records()[0].name.as_deref(), Some("Bea"));
    }

    #[test]
    fn test_list_failure_keeps_previous_records() {
        let mut controller = controller();
        let seq = list_seq(&controller.dispatch(UiEvent::Start));
        let mut first = page(1, 1, 1);
        first.items.push(record(1, "Ana"));
        controller.dispatch(Completion::ListLoaded {
            seq,
            result: Ok(first),
        });

        let seq = list_seq(&controller.dispatch(UiEvent::Refresh));
        let out = controller.dispatch(Completion::ListLoaded {
            seq,
            result: Err(ApiError::Transport("connection refused".into())),
        });

        assert_eq!(controller.records().len(), 1);
        assert_eq!(
            out.renders,
            vec![RenderCommand::Notify(Notice::error(
                "Error de red: connection refused"
            ))]
        );
    }

    #[test]
    fn test_page_size_outside_options_is_ignored() {
        let mut controller = controller();
        assert!(controller.dispatch(UiEvent::PageSizeChanged(7)).is_empty());
        let out = controller.dispatch(UiEvent::PageSizeChanged(25));
        assert!(matches!(
            &out.effects[..],
            [Effect::FetchList { query, .. }] if query.page_size == 25
        ));
    }

    #[test]
    fn test_stats_render_cards_and_chart() {
        let mut controller = controller();
        let out = controller.dispatch(UiEvent::Start);
        let seq = out
            .effects
            .iter()
            .find_map(|e| match e {
                Effect::FetchStats { seq } => Some(*seq),
                _ => None,
            })
            .expect("stats fetch");

        let stats = StatsSnapshot {
            total: 3,
            with_hypertension: 1,
            with_obesity: 0,
            by_risk: RiskCounts::new(vec![("bajo".into(), 2), ("alto".into(), 1)]),
        };
        let out = controller.dispatch(Completion::StatsLoaded {
            seq,
            result: Ok(stats.clone()),
        });

        assert!(matches!(&out.renders[0], RenderCommand::Stats(cards) if cards.len() == 5));
        assert!(matches!(&out.renders[1], RenderCommand::Chart(_)));
        assert_eq!(controller.stats(), Some(&stats));
        assert_eq!(controller.chart().text_runs().len(), 4);
    }

    #[test]
    fn test_edit_round_trip_closes_and_reloads() {
        let mut controller = controller();
        let id = PatientId::new(4);
        let out = controller.dispatch(UiEvent::EditOpen(id));
        assert_eq!(out.effects, vec![Effect::FetchPatient(id)]);

        let mut existing = record(4, "Ana");
        existing.age = Some(40);
        let out = controller.dispatch(Completion::PatientLoaded {
            id,
            result: Ok(existing),
        });
        assert!(matches!(&out.renders[..], [RenderCommand::OpenEdit(d)] if d.value(Field::Age) == "40"));

        controller.dispatch(UiEvent::EditFieldSet {
            field: Field::Age,
            value: "41".into(),
        });
        let out = controller.dispatch(UiEvent::EditSave);
        let [Effect::UpdatePatient { payload, .. }] = &out.effects[..] else {
            panic!("expected one update, got {:?}", out.effects);
        };
        assert_eq!(payload.get("age"), Some(&serde_json::json!(41)));

        let out = controller.dispatch(Completion::Updated { id, result: Ok(()) });
        assert!(controller.edit_draft().is_none());
        assert_eq!(out.renders[0], RenderCommand::CloseEdit);
        assert_eq!(out.effects.len(), 2);
    }

    #[test]
    fn test_failed_update_keeps_edit_open() {
        let mut controller = controller();
        let id = PatientId::new(4);
        controller.dispatch(UiEvent::EditOpen(id));
        controller.dispatch(Completion::PatientLoaded {
            id,
            result: Ok(record(4, "Ana")),
        });
        let out = controller.dispatch(Completion::Updated {
            id,
            result: Err(ApiError::from_status(400, r#"{"error":"age must be numeric"}"#)),
        });
        assert!(controller.edit_draft().is_some());
        assert!(out.effects.is_empty());
        assert_eq!(
            out.renders,
            vec![RenderCommand::Notify(Notice::error("age must be numeric"))]
        );
    }

    #[test]
    fn test_missing_record_on_edit_reloads_table() {
        let mut controller = controller();
        let id = PatientId::new(99);
        controller.dispatch(UiEvent::EditOpen(id));
        let out = controller.dispatch(Completion::PatientLoaded {
            id,
            result: Err(ApiError::from_status(404, r#"{"error":"not found"}"#)),
        });
        assert!(controller.edit_draft().is_none());
        assert_eq!(out.effects.len(), 2);
    }

    #[test]
    fn test_edit_rejects_non_editable_field() {
        let mut controller = controller();
        controller.dispatch(UiEvent::EditOpen(PatientId::new(1)));
        controller.dispatch(Completion::PatientLoaded {
            id: PatientId::new(1),
            result: Ok(record(1, "Ana")),
        });
        let out = controller.dispatch(UiEvent::EditFieldSet {
            field: Field::Notes,
            value: "x".into(),
        });
        assert!(matches!(
            &out.renders[..],
            [RenderCommand::Notify(n)] if n.level == NoticeLevel::Error
        ));
    }

    #[test]
    fn test_only_last_opened_record_reaches_edit() {
        let mut controller = controller();
        let first = PatientId::new(4);
        let second = PatientId::new(5);
        controller.dispatch(UiEvent::EditOpen(first));
        controller.dispatch(UiEvent::EditOpen(second));

        let out = controller.dispatch(Completion::PatientLoaded {
            id: second,
            result: Ok(record(5, "Bea")),
        });
        assert!(matches!(&out.renders[..], [RenderCommand::OpenEdit(d)] if d.id() == second));

        let out = controller.dispatch(Completion::PatientLoaded {
            id: first,
            result: Ok(record(4, "Ana")),
        });
        assert!(out.is_empty());
        assert_eq!(controller.edit_draft().map(EditDraft::id), Some(second));

        let out = controller.dispatch(UiEvent::EditSave);
        assert!(matches!(
            &out.effects[..],
            [Effect::UpdatePatient { id, .. }] if *id == second
        ));
    }

    #[test]
    fn test_record_arriving_after_cancel_stays_closed() {
        let mut controller = controller();
        let id = PatientId::new(4);
        controller.dispatch(UiEvent::EditOpen(id));
        controller.dispatch(UiEvent::EditCancel);

        let out = controller.dispatch(Completion::PatientLoaded {
            id,
            result: Ok(record(4, "Ana")),
        });

        assert!(out.is_empty());
        assert!(controller.edit_draft().is_none());
        assert!(controller.dispatch(UiEvent::EditSave).effects.is_empty());
    }

    #[test]
    fn test_deleting_edited_record_closes_edit() {
        let mut controller = controller();
        let id = PatientId::new(4);
        controller.dispatch(UiEvent::EditOpen(id));
        controller.dispatch(Completion::PatientLoaded {
            id,
            result: Ok(record(4, "Ana")),
        });

        let out = controller.dispatch(Completion::Deleted { id, result: Ok(()) });

        assert!(controller.edit_draft().is_none());
        assert_eq!(out.renders[0], RenderCommand::CloseEdit);
        assert_eq!(out.effects.len(), 2);
    }

    #[test]
    fn test_delete_cancel_discards_pending() {
        let mut controller = controller();
        let out = controller.dispatch(UiEvent::DeleteRequested(PatientId::new(3)));
        assert_eq!(
            out.renders,
            vec![RenderCommand::ConfirmDelete {
                id: PatientId::new(3),
                prompt: "¿Eliminar #3?".into(),
            }]
        );
        controller.dispatch(UiEvent::DeleteCancelled);
        assert!(controller.dispatch(UiEvent::DeleteConfirmed).is_empty());
    }

    #[test]
    fn test_export_emits_download_url() {
        let mut controller = controller();
        let out = controller.dispatch(UiEvent::Export(ExportFormat::Xlsx));
        assert!(out.effects.is_empty());
        assert_eq!(
            out.renders,
            vec![RenderCommand::OpenDownload {
                url: "http://localhost:5000/api/export/xlsx".into()
            }]
        );
    }

    #[test]
    fn test_search_waits_for_quiet_period() {
        let mut controller = controller();
        let t0 = Instant::now();
        controller.dispatch(UiEvent::NameTyped {
            value: "A".into(),
            at: t0,
        });
        assert!(controller.poll_search(t0 + Duration::from_millis(100)).is_empty());
        let out = controller.poll_search(t0 + Duration::from_millis(250));
        assert!(matches!(
            &out.effects[..],
            [Effect::FetchList { query, .. }]
                if query.filters.name.as_ref().map(NonEmptyText::as_str) == Some("A")
        ));
    }
}
