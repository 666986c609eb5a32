use anyhow::Context;
use clap::{Parser, Subcommand};
use registro_cli::Terminal;
use registro_client::{config_from_env, HttpRegistryClient};
use registro_core::chart::{draw_risk_chart, PixelCanvas, Rgba};
use registro_core::constants::{CHART_HEIGHT, CHART_WIDTH, DEFAULT_PAGE_SIZE};
use registro_core::table::{page_info, patient_rows, stat_cards, PatientRow, COLUMNS};
use registro_core::{Field, NoticeLevel, RegistryApi, RenderCommand, Session, UiEvent};
use registro_types::{ExportFormat, ListQuery, PatientFilters, PatientId, StatsSnapshot};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "registro")]
#[command(about = "Patient registry administration CLI")]
struct Cli {
    /// API base URL (overrides REGISTRO_API_BASE and host resolution)
    #[arg(long, global = true)]
    api_base: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List one page of patients
    List {
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long, default_value_t = DEFAULT_PAGE_SIZE)]
        page_size: u32,
        /// Risk category filter
        #[arg(long, default_value = "")]
        risk: String,
        /// Name substring filter
        #[arg(long, default_value = "")]
        name: String,
    },
    /// Show one patient
    Show { id: PatientId },
    /// Show aggregate statistics
    Stats,
    /// Draw the risk chart to a PPM image
    Chart {
        #[arg(long, default_value = "risk-chart.ppm")]
        out: PathBuf,
        #[arg(long, default_value_t = CHART_WIDTH)]
        width: u32,
        #[arg(long, default_value_t = CHART_HEIGHT)]
        height: u32,
    },
    /// Create a patient
    Create {
        /// Field value as name=value (repeatable), e.g. -f name=Ana -f glucose_mgdl=140
        #[arg(short, long = "field", value_parser = parse_assignment)]
        fields: Vec<(Field, String)>,
        /// Checkbox field to tick (repeatable), e.g. --check has_hypertension
        #[arg(long = "check")]
        checked: Vec<Field>,
    },
    /// Update a patient's editable fields
    Update {
        id: PatientId,
        /// Field value as name=value (repeatable)
        #[arg(short, long = "field", value_parser = parse_assignment)]
        fields: Vec<(Field, String)>,
    },
    /// Delete a patient
    Delete {
        id: PatientId,
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
    /// Download a server-side export (csv, xlsx, pdf)
    Export {
        format: ExportFormat,
        /// Output file (defaults to patients.<format>)
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Check that the backend is up
    Health,
}

/// Parses a `name=value` form assignment.
fn parse_assignment(input: &str) -> Result<(Field, String), String> {
    let (name, value) = input
        .split_once('=')
        .ok_or_else(|| format!("expected name=value, got {input:?}"))?;
    let field = name.parse::<Field>().map_err(|e| e.to_string())?;
    Ok((field, value.to_string()))
}

/// Draws `stats.by_risk` onto a fresh canvas and writes it as a binary PPM image.
fn write_chart(stats: &StatsSnapshot, path: &Path, width: u32, height: u32) -> anyhow::Result<()> {
    let mut canvas = PixelCanvas::new(width, height);
    draw_risk_chart(&mut canvas, &stats.by_risk);
    std::fs::write(path, canvas.to_ppm(Rgba::WHITE))
        .with_context(|| format!("failed to write chart to {}", path.display()))
}

fn print_record(row: &PatientRow) {
    for (heading, cell) in COLUMNS.iter().zip(&row.cells) {
        println!("{heading:<16} {cell}");
    }
}

/// Renders session output and fails if the operator was shown an error.
fn finish(terminal: &mut Terminal<io::Stdout>, renders: &[RenderCommand]) -> anyhow::Result<()> {
    terminal.render_all(renders)?;
    let failed = renders.iter().any(|r| {
        matches!(r, RenderCommand::Notify(notice) if notice.level == NoticeLevel::Error)
    });
    if failed {
        anyhow::bail!("the registry rejected the request");
    }
    Ok(())
}

/// Asks on stdin; only an explicit yes confirms.
fn confirm() -> io::Result<bool> {
    io::stdout().flush()?;
    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    let answer = answer.trim().to_lowercase();
    Ok(matches!(answer.as_str(), "s" | "si" | "sí" | "y" | "yes"))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("registro=warn".parse()?),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let cli = Cli::parse();
    let Some(command) = cli.command else {
        println!("Use 'registro --help' for commands");
        return Ok(());
    };

    let config = config_from_env(cli.api_base)?;
    tracing::debug!(api_base = config.api_base(), "resolved configuration");
    let client = HttpRegistryClient::new(config.clone())?;
    let mut terminal = Terminal::new(io::stdout());

    match command {
        Commands::List {
            page,
            page_size,
            risk,
            name,
        } => {
            let query = ListQuery {
                page: page.max(1),
                page_size: page_size.max(1),
                filters: PatientFilters::from_inputs(&risk, &name),
            };
            let result = client.list_patients(&query).await?;
            terminal.render_all(&[
                RenderCommand::Table(patient_rows(&result.items)),
                RenderCommand::PageInfo(page_info(result.page, result.pages.max(1), result.total)),
            ])?;
        }
        Commands::Show { id } => {
            let record = client.get_patient(id).await?;
            print_record(&PatientRow::from_record(&record));
        }
        Commands::Stats => {
            let stats = client.stats().await?;
            terminal.render(&RenderCommand::Stats(stat_cards(&stats)))?;
        }
        Commands::Chart { out, width, height } => {
            let stats = client.stats().await?;
            write_chart(&stats, &out, width, height)?;
            println!("Gráfico guardado en {}", out.display());
        }
        Commands::Create { fields, checked } => {
            let mut session = Session::new(client, &config);
            let mut renders = Vec::new();
            for (field, value) in fields {
                renders.extend(session.dispatch(UiEvent::CreateFieldSet { field, value }).await);
            }
            for field in checked {
                renders.extend(
                    session
                        .dispatch(UiEvent::CreateCheckboxSet {
                            field,
                            checked: true,
                        })
                        .await,
                );
            }
            renders.extend(session.dispatch(UiEvent::SubmitCreate).await);
            finish(&mut terminal, &renders)?;
        }
        Commands::Update { id, fields } => {
            let mut session = Session::new(client, &config);
            let mut renders = session.dispatch(UiEvent::EditOpen(id)).await;
            if session.controller().edit_draft().is_none() {
                return finish(&mut terminal, &renders);
            }
            for (field, value) in fields {
                renders.extend(session.dispatch(UiEvent::EditFieldSet { field, value }).await);
            }
            renders.extend(session.dispatch(UiEvent::EditSave).await);
            finish(&mut terminal, &renders)?;
        }
        Commands::Delete { id, yes } => {
            let mut session = Session::new(client, &config);
            let prompt = session.dispatch(UiEvent::DeleteRequested(id)).await;
            let event = if yes {
                UiEvent::DeleteConfirmed
            } else {
                terminal.render_all(&prompt)?;
                if confirm()? {
                    UiEvent::DeleteConfirmed
                } else {
                    UiEvent::DeleteCancelled
                }
            };
            terminal.confirmation_answered();
            let renders = session.dispatch(event).await;
            finish(&mut terminal, &renders)?;
        }
        Commands::Export { format, out } => {
            let path = out.unwrap_or_else(|| PathBuf::from(format.file_name()));
            let mut file = tokio::fs::File::create(&path)
                .await
                .with_context(|| format!("failed to create {}", path.display()))?;
            let bytes = client.download_export(format, &mut file).await?;
            println!("{bytes} bytes guardados en {}", path.display());
        }
        Commands::Health => {
            let health = client.health().await?;
            println!(
                "{} ({})",
                health.status,
                health.time.as_deref().unwrap_or("—")
            );
            if !health.is_ok() {
                anyhow::bail!("backend reported status {}", health.status);
            }
        }
    }

    Ok(())
}
