//! Outputs of the view controller: what the surface should show and which calls to make.

use super::effect::Effect;
use crate::chart::PixelCanvas;
use crate::form::EditDraft;
use crate::table::{PatientRow, StatCard};
use registro_types::PatientId;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Error,
}

/// A message for the operator (the browser client used `alert`).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub text: String,
}

impl Notice {
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            text: text.into(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum RenderCommand {
    /// Replace the table body.
    Table(Vec<PatientRow>),
    PageInfo(String),
    Stats(Vec<StatCard>),
    /// The freshly drawn risk chart.
    Chart(PixelCanvas),
    Notify(Notice),
    ResetCreateForm,
    OpenEdit(EditDraft),
    CloseEdit,
    ConfirmDelete { id: PatientId, prompt: String },
    /// Open a download in the host's usual way; the controller does not track it.
    OpenDownload { url: String },
}

/// Everything one dispatch produced.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Output {
    pub effects: Vec<Effect>,
    pub renders: Vec<RenderCommand>,
}

impl Output {
    pub fn is_empty(&self) -> bool {
        self.effects.is_empty() && self.renders.is_empty()
    }

    pub(crate) fn render(&mut self, command: RenderCommand) {
        self.renders.push(command);
    }

    pub(crate) fn notify(&mut self, notice: Notice) {
        self.renders.push(RenderCommand::Notify(notice));
    }
}
