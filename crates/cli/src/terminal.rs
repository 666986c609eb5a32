//! Plain-text rendering surface.
//!
//! [`Terminal`] applies controller [`RenderCommand`]s to any `io::Write`. Risk categories in the
//! statistics panel are drawn as text bars; the raster chart itself is kept so the host can save
//! it on request.

use registro_core::chart::PixelCanvas;
use registro_core::form::EditDraft;
use registro_core::table::{PatientRow, StatCard, COLUMNS};
use registro_core::{NoticeLevel, RenderCommand};
use std::io::{self, Write};

const BAR_WIDTH: usize = 24;
const RISK_PREFIX: &str = "Riesgo: ";

/// A fixed-width bar for `current` out of `max`, e.g. `[████░░░░] 3`.
pub fn text_bar(current: u64, max: u64, width: usize) -> String {
    if max == 0 {
        return format!("[{}] {current}", "░".repeat(width));
    }
    let filled = ((current as f64 / max as f64) * width as f64).round() as usize;
    let filled = filled.min(width);
    format!(
        "[{}{}] {current}",
        "█".repeat(filled),
        "░".repeat(width - filled)
    )
}

pub struct Terminal<W> {
    out: W,
    chart: Option<PixelCanvas>,
    pending_prompt: bool,
}

impl<W: Write> Terminal<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            chart: None,
            pending_prompt: false,
        }
    }

    /// The most recently rendered risk chart.
    pub fn chart(&self) -> Option<&PixelCanvas> {
        self.chart.as_ref()
    }

    /// Whether a delete confirmation prompt is showing.
    pub fn awaiting_confirmation(&self) -> bool {
        self.pending_prompt
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    pub fn render_all(&mut self, commands: &[RenderCommand]) -> io::Result<()> {
        for command in commands {
            self.render(command)?;
        }
        Ok(())
    }

    pub fn render(&mut self, command: &RenderCommand) -> io::Result<()> {
        match command {
            RenderCommand::Table(rows) => self.table(rows),
            RenderCommand::PageInfo(text) => writeln!(self.out, "{text}"),
            RenderCommand::Stats(cards) => self.stats(cards),
            RenderCommand::Chart(canvas) => {
                self.chart = Some(canvas.clone());
                Ok(())
            }
            RenderCommand::Notify(notice) => match notice.level {
                NoticeLevel::Info => writeln!(self.out, "✔ {}", notice.text),
                NoticeLevel::Error => writeln!(self.out, "✖ {}", notice.text),
            },
            RenderCommand::ResetCreateForm => writeln!(self.out, "Formulario de alta vaciado."),
            RenderCommand::OpenEdit(draft) => self.edit(draft),
            RenderCommand::CloseEdit => writeln!(self.out, "Edición cerrada."),
            RenderCommand::ConfirmDelete { prompt, .. } => {
                self.pending_prompt = true;
                writeln!(self.out, "{prompt} [s/N]")
            }
            RenderCommand::OpenDownload { url } => writeln!(self.out, "Descarga: {url}"),
        }
    }

    /// Records that the operator answered the delete prompt.
    pub fn confirmation_answered(&mut self) {
        self.pending_prompt = false;
    }

    fn table(&mut self, rows: &[PatientRow]) -> io::Result<()> {
        if rows.is_empty() {
            return writeln!(self.out, "(sin pacientes)");
        }
        writeln!(self.out, "{}", COLUMNS.join(" | "))?;
        for row in rows {
            writeln!(self.out, "{}", row.cells.join(" | "))?;
        }
        Ok(())
    }

    fn stats(&mut self, cards: &[StatCard]) -> io::Result<()> {
        let max = cards
            .iter()
            .filter(|c| c.title.starts_with(RISK_PREFIX))
            .map(|c| c.value)
            .max()
            .unwrap_or(0);
        for card in cards {
            if card.title.starts_with(RISK_PREFIX) {
                writeln!(
                    self.out,
                    "{:<28} {}",
                    card.title,
                    text_bar(card.value, max, BAR_WIDTH)
                )?;
            } else {
                writeln!(self.out, "{:<28} {}", card.title, card.value)?;
            }
        }
        Ok(())
    }

    fn edit(&mut self, draft: &EditDraft) -> io::Result<()> {
        writeln!(self.out, "Editando paciente #{}", draft.id())?;
        for (field, value) in draft.fields() {
            writeln!(self.out, "  {field} = {value}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use registro_core::Notice;
    use registro_types::{PatientId, PatientRecord};

    fn rendered(commands: &[RenderCommand]) -> String {
        let mut terminal = Terminal::new(Vec::new());
        terminal.render_all(commands).expect("render to memory");
        String::from_utf8(terminal.into_inner()).expect("utf-8 output")
    }

    #[test]
    fn test_text_bar_scales_to_max() {
        assert_eq!(text_bar(2, 4, 4), "[██░░] 2");
        assert_eq!(text_bar(0, 0, 3), "[░░░] 0");
        assert_eq!(text_bar(9, 3, 2), "[██] 9");
    }

    #[test]
    fn test_empty_table_and_page_info() {
        let out = rendered(&[
            RenderCommand::Table(Vec::new()),
            RenderCommand::PageInfo("Página 1 de 1 (total 0)".into()),
        ]);
        assert_eq!(out, "(sin pacientes)\nPágina 1 de 1 (total 0)\n");
    }

    #[test]
    fn test_rows_follow_header() {
        let row = PatientRow::from_record(&PatientRecord {
            id: PatientId::new(5),
            name: Some("Ana".into()),
            ..Default::default()
        });
        let out = rendered(&[RenderCommand::Table(vec![row])]);
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("ID | Fecha | Nombre"));
        assert!(lines[1].starts_with("5 | — | Ana"));
    }

    #[test]
    fn test_risk_cards_get_bars() {
        let out = rendered(&[RenderCommand::Stats(vec![
            StatCard {
                title: "Total".into(),
                value: 3,
            },
            StatCard {
                title: "Riesgo: bajo".into(),
                value: 3,
            },
        ])]);
        assert!(out.contains("Total"));
        assert!(out.contains(&format!("[{}] 3", "█".repeat(BAR_WIDTH))));
    }

    #[test]
    fn test_delete_prompt_sets_pending_flag() {
        let mut terminal = Terminal::new(Vec::new());
        terminal
            .render(&RenderCommand::ConfirmDelete {
                id: PatientId::new(2),
                prompt: "¿Eliminar #2?".into(),
            })
            .expect("render");
        assert!(terminal.awaiting_confirmation());
        terminal.confirmation_answered();
        assert!(!terminal.awaiting_confirmation());
        let out = String::from_utf8(terminal.into_inner()).expect("utf-8");
        assert_eq!(out, "¿Eliminar #2? [s/N]\n");
    }

    #[test]
    fn test_notices_are_marked_by_level() {
        let out = rendered(&[
            RenderCommand::Notify(Notice::info("Paciente guardado correctamente")),
            RenderCommand::Notify(Notice::error("glucose_mgdl must be numeric")),
        ]);
        assert_eq!(
            out,
            "✔ Paciente guardado correctamente\n✖ glucose_mgdl must be numeric\n"
        );
    }
}
