//! Interactive console.
//!
//! Each input line is one operator interaction. The verb is looked up in [`COMMANDS`], built
//! once at start-up, which maps it to a controller event. API effects run as tokio tasks and
//! report back over a channel, so new commands are accepted while requests are in flight.

use registro_cli::Terminal;
use registro_client::{ClientError, HttpRegistryClient};
use registro_core::chart::Rgba;
use registro_core::controller::{spawn_effect, Completion, Output, ViewController};
use registro_core::{ClientConfig, Field, UiEvent};
use registro_types::{ExportFormat, PatientId};
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio::time::Instant;

/// What one console line asks for.
#[derive(Clone, Debug, PartialEq)]
pub enum Action {
    Ui(UiEvent),
    SaveChart(PathBuf),
    Help,
    Quit,
}

/// One console verb.
pub struct CommandSpec {
    pub verb: &'static str,
    pub usage: &'static str,
    pub help: &'static str,
    build: fn(&str, Instant) -> Result<Action, String>,
}

pub const COMMANDS: &[CommandSpec] = &[
    CommandSpec {
        verb: "refresh",
        usage: "refresh",
        help: "reload the patient list and statistics",
        build: |_, _| Ok(Action::Ui(UiEvent::Refresh)),
    },
    CommandSpec {
        verb: "risk",
        usage: "risk [category]",
        help: "filter by risk category (blank clears)",
        build: |args, _| Ok(Action::Ui(UiEvent::RiskFilterChanged(args.to_string()))),
    },
    CommandSpec {
        verb: "name",
        usage: "name [text]",
        help: "search by name (applied after a short pause)",
        build: |args, now| {
            Ok(Action::Ui(UiEvent::NameTyped {
                value: args.to_string(),
                at: now,
            }))
        },
    },
    CommandSpec {
        verb: "size",
        usage: "size <n>",
        help: "change the page size",
        build: |args, _| {
            let size = args
                .parse::<u32>()
                .map_err(|_| format!("not a page size: {args:?}"))?;
            Ok(Action::Ui(UiEvent::PageSizeChanged(size)))
        },
    },
    CommandSpec {
        verb: "prev",
        usage: "prev",
        help: "previous page",
        build: |_, _| Ok(Action::Ui(UiEvent::PrevPage)),
    },
    CommandSpec {
        verb: "next",
        usage: "next",
        help: "next page",
        build: |_, _| Ok(Action::Ui(UiEvent::NextPage)),
    },
    CommandSpec {
        verb: "set",
        usage: "set <field> <value>",
        help: "fill a create-form field",
        build: |args, _| {
            let (field, value) = field_and_value(args)?;
            Ok(Action::Ui(UiEvent::CreateFieldSet { field, value }))
        },
    },
    CommandSpec {
        verb: "check",
        usage: "check <field>",
        help: "tick a create-form checkbox",
        build: |args, _| {
            Ok(Action::Ui(UiEvent::CreateCheckboxSet {
                field: parse_field(args)?,
                checked: true,
            }))
        },
    },
    CommandSpec {
        verb: "uncheck",
        usage: "uncheck <field>",
        help: "untick a create-form checkbox",
        build: |args, _| {
            Ok(Action::Ui(UiEvent::CreateCheckboxSet {
                field: parse_field(args)?,
                checked: false,
            }))
        },
    },
    CommandSpec {
        verb: "submit",
        usage: "submit",
        help: "create a patient from the form",
        build: |_, _| Ok(Action::Ui(UiEvent::SubmitCreate)),
    },
    CommandSpec {
        verb: "edit",
        usage: "edit <id>",
        help: "open a patient for editing",
        build: |args, _| Ok(Action::Ui(UiEvent::EditOpen(parse_id(args)?))),
    },
    CommandSpec {
        verb: "edit-set",
        usage: "edit-set <field> <value>",
        help: "change a field of the open edit",
        build: |args, _| {
            let (field, value) = field_and_value(args)?;
            Ok(Action::Ui(UiEvent::EditFieldSet { field, value }))
        },
    },
    CommandSpec {
        verb: "save",
        usage: "save",
        help: "save the open edit",
        build: |_, _| Ok(Action::Ui(UiEvent::EditSave)),
    },
    CommandSpec {
        verb: "cancel",
        usage: "cancel",
        help: "close the open edit without saving",
        build: |_, _| Ok(Action::Ui(UiEvent::EditCancel)),
    },
    CommandSpec {
        verb: "delete",
        usage: "delete <id>",
        help: "delete a patient (asks first)",
        build: |args, _| Ok(Action::Ui(UiEvent::DeleteRequested(parse_id(args)?))),
    },
    CommandSpec {
        verb: "yes",
        usage: "yes",
        help: "confirm the pending delete",
        build: |_, _| Ok(Action::Ui(UiEvent::DeleteConfirmed)),
    },
    CommandSpec {
        verb: "no",
        usage: "no",
        help: "cancel the pending delete",
        build: |_, _| Ok(Action::Ui(UiEvent::DeleteCancelled)),
    },
    CommandSpec {
        verb: "export",
        usage: "export <csv|xlsx|pdf>",
        help: "download an export into the current directory",
        build: |args, _| {
            let format = args.parse::<ExportFormat>().map_err(|e| e.to_string())?;
            Ok(Action::Ui(UiEvent::Export(format)))
        },
    },
    CommandSpec {
        verb: "chart",
        usage: "chart <file.ppm>",
        help: "save the risk chart as a PPM image",
        build: |args, _| {
            if args.is_empty() {
                return Err("chart needs an output path".into());
            }
            Ok(Action::SaveChart(PathBuf::from(args)))
        },
    },
    CommandSpec {
        verb: "help",
        usage: "help",
        help: "show this list",
        build: |_, _| Ok(Action::Help),
    },
    CommandSpec {
        verb: "quit",
        usage: "quit",
        help: "leave the console",
        build: |_, _| Ok(Action::Quit),
    },
];

fn parse_id(args: &str) -> Result<PatientId, String> {
    args.parse::<PatientId>()
        .map_err(|_| format!("not a patient id: {args:?}"))
}

fn parse_field(args: &str) -> Result<Field, String> {
    args.parse::<Field>().map_err(|e| e.to_string())
}

fn field_and_value(args: &str) -> Result<(Field, String), String> {
    let (field, value) = args.split_once(' ').unwrap_or((args, ""));
    Ok((parse_field(field)?, value.trim().to_string()))
}

/// Parses one console line. Blank lines yield `Ok(None)`.
pub fn parse_line(line: &str, now: Instant) -> Result<Option<Action>, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let (verb, args) = line.split_once(' ').unwrap_or((line, ""));
    let spec = COMMANDS
        .iter()
        .find(|c| c.verb == verb)
        .ok_or_else(|| format!("unknown command {verb:?}; try 'help'"))?;
    (spec.build)(args.trim(), now).map(Some)
}

pub fn help_text() -> String {
    COMMANDS
        .iter()
        .map(|c| format!("  {:<26} {}", c.usage, c.help))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Runs the console until stdin closes or the operator quits.
///
/// # Errors
/// Returns an error if stdin or stdout fail.
pub async fn run(client: HttpRegistryClient, config: &ClientConfig) -> anyhow::Result<()> {
    let api = Arc::new(client);
    let (tx, mut rx) = mpsc::unbounded_channel::<Completion>();
    let mut controller = ViewController::new(config);
    let mut terminal = Terminal::new(io::stdout());
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    println!("Registro de pacientes ({}). Escriba 'help'.", config.api_base());
    let start = controller.dispatch(UiEvent::Start);
    apply(&api, &tx, &mut terminal, start)?;

    loop {
        let deadline = controller.search_deadline();
        let search_due = async move {
            match deadline {
                Some(at) => tokio::time::sleep_until(at).await,
                None => std::future::pending().await,
            }
        };

        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                match parse_line(&line, Instant::now()) {
                    Ok(None) => {}
                    Ok(Some(Action::Quit)) => break,
                    Ok(Some(Action::Help)) => println!("{}", help_text()),
                    Ok(Some(Action::SaveChart(path))) => save_chart(&terminal, path),
                    Ok(Some(Action::Ui(event))) => {
                        if matches!(event, UiEvent::DeleteConfirmed | UiEvent::DeleteCancelled) {
                            if !terminal.awaiting_confirmation() {
                                println!("No hay ninguna eliminación pendiente");
                                continue;
                            }
                            terminal.confirmation_answered();
                        }
                        if let UiEvent::Export(format) = event {
                            spawn_download(api.clone(), format);
                        }
                        let out = controller.dispatch(event);
                        apply(&api, &tx, &mut terminal, out)?;
                    }
                    Err(message) => println!("{message}"),
                }
            }
            Some(completion) = rx.recv() => {
                let out = controller.dispatch(completion);
                apply(&api, &tx, &mut terminal, out)?;
            }
            _ = search_due => {
                let out = controller.poll_search(Instant::now());
                apply(&api, &tx, &mut terminal, out)?;
            }
        }
        io::stdout().flush()?;
    }

    Ok(())
}

/// Starts every effect and renders every command in `out`.
fn apply(
    api: &Arc<HttpRegistryClient>,
    tx: &mpsc::UnboundedSender<Completion>,
    terminal: &mut Terminal<io::Stdout>,
    out: Output,
) -> io::Result<()> {
    for effect in out.effects {
        spawn_effect(api.clone(), effect, tx.clone());
    }
    terminal.render_all(&out.renders)
}

fn spawn_download(api: Arc<HttpRegistryClient>, format: ExportFormat) {
    tokio::spawn(async move {
        let path = format.file_name();
        let result: Result<u64, ClientError> = async {
            let mut file = tokio::fs::File::create(&path).await?;
            api.download_export(format, &mut file).await
        }
        .await;
        match result {
            Ok(bytes) => tracing::info!(path = %path, bytes, "export saved"),
            Err(err) => tracing::error!(path = %path, error = %err, "export failed"),
        }
    });
}

fn save_chart(terminal: &Terminal<io::Stdout>, path: PathBuf) {
    let Some(canvas) = terminal.chart() else {
        println!("Todavía no hay gráfico; espere a que carguen las estadísticas.");
        return;
    };
    match std::fs::write(&path, canvas.to_ppm(Rgba::WHITE)) {
        Ok(()) => println!("Gráfico guardado en {}", path.display()),
        Err(err) => println!("No se pudo guardar {}: {err}", path.display()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn parse(line: &str) -> Result<Option<Action>, String> {
        parse_line(line, Instant::now())
    }

    #[test]
    fn test_verbs_are_unique() {
        let verbs: HashSet<&str> = COMMANDS.iter().map(|c| c.verb).collect();
        assert_eq!(verbs.len(), COMMANDS.len());
    }

    #[test]
    fn test_blank_line_is_ignored() {
        assert_eq!(parse("   "), Ok(None));
    }

    #[test]
    fn test_unknown_verb_is_reported() {
        let err = parse("frobnicate").expect_err("unknown verb");
        assert!(err.contains("frobnicate"));
    }

    #[test]
    fn test_field_value_keeps_spaces() {
        assert_eq!(
            parse("set notes control en 3 meses"),
            Ok(Some(Action::Ui(UiEvent::CreateFieldSet {
                field: Field::Notes,
                value: "control en 3 meses".into(),
            })))
        );
    }

    #[test]
    fn test_blank_risk_clears_filter() {
        assert_eq!(
            parse("risk"),
            Ok(Some(Action::Ui(UiEvent::RiskFilterChanged(String::new()))))
        );
    }

    #[test]
    fn test_name_keystroke_carries_timestamp() {
        let now = Instant::now();
        assert_eq!(
            parse_line("name An", now),
            Ok(Some(Action::Ui(UiEvent::NameTyped {
                value: "An".into(),
                at: now,
            })))
        );
    }

    #[test]
    fn test_ids_and_formats_are_validated() {
        assert_eq!(
            parse("delete 12"),
            Ok(Some(Action::Ui(UiEvent::DeleteRequested(PatientId::new(12)))))
        );
        assert!(parse("delete doce").is_err());
        assert_eq!(
            parse("export XLSX"),
            Ok(Some(Action::Ui(UiEvent::Export(ExportFormat::Xlsx))))
        );
        assert!(parse("export docx").is_err());
        assert!(parse("size ten").is_err());
    }

    #[test]
    fn test_help_lists_every_verb() {
        let help = help_text();
        for command in COMMANDS {
            assert!(help.contains(command.usage), "{} missing", command.verb);
        }
    }
}
