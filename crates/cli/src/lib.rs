//! Terminal presentation shared by the `registro` CLI and the interactive console.

pub mod terminal;

pub use terminal::{text_bar, Terminal};
