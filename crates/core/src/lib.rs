//! # Registro Core
//!
//! Client-side logic for the patient registry administrative console.
//!
//! This crate holds everything that does not touch the network or a terminal:
//! - Formatting of record fields into display text (`formatter`, `table`)
//! - The risk bar chart and an in-memory raster to draw it on (`chart`)
//! - Create/edit form coercion into JSON payloads (`form`)
//! - The view state controller, its reducer and effect runner (`controller`)
//! - Configuration and the API error taxonomy (`config`, `error`)
//!
//! **No I/O**: the HTTP implementation of [`RegistryApi`] lives in `registro-client`; hosts (the
//! interactive console and the `registro` CLI) own the event loop and the rendering surface.

pub mod api;
pub mod chart;
pub mod config;
pub mod constants;
pub mod controller;
pub mod debounce;
pub mod error;
pub mod form;
pub mod formatter;
pub mod table;

pub use api::RegistryApi;
pub use config::{resolve_api_base, ClientConfig, ConfigError};
pub use controller::{
    Completion, Effect, Event, Notice, NoticeLevel, Output, RenderCommand, Session, UiEvent,
    ViewController,
};
pub use error::{ApiError, ApiResult};
pub use form::{EditDraft, Field, FieldKind, FormError, FormInput};
