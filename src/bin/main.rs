use clap::{Parser, Subcommand};
use irodori::colorize::ColorizationSnapshot;
use irodori::config::{self, ColorizationSettings, merge_settings, user_config_path};
use irodori::presentation::{RecordingSink, RenderStyle};
use irodori::{Category, ColorizationService, ColorizeError, ViewId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tower_lsp_server::ls_types::{Range, TextDocumentContentChangeEvent};
use url::Url;

/// Incremental colorization range tracking
#[derive(Parser)]
#[command(name = "irodori")]
#[command(version)]
#[command(about = "Incremental colorization range tracking and reconciliation")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a JSON-lines event trace and print what every view shows
    Replay {
        /// Trace file, one event per line
        trace: PathBuf,

        /// Settings file (default: user configuration, if present)
        #[arg(long)]
        settings: Option<PathBuf>,
    },
}

/// One line of a replay trace.
#[derive(Debug, Deserialize)]
#[serde(tag = "event", rename_all = "camelCase")]
enum TraceEvent {
    Open {
        uri: Url,
        version: i32,
    },
    Show {
        uri: Url,
        view: u64,
    },
    Hide {
        uri: Url,
        view: u64,
    },
    Change {
        uri: Url,
        version: i32,
        changes: Vec<TextDocumentContentChangeEvent>,
    },
    Syntactic {
        uri: Url,
        version: i32,
        #[serde(default)]
        ranges: BTreeMap<Category, Vec<Range>>,
    },
    Semantic {
        uri: Url,
        version: i32,
        #[serde(default)]
        ranges: BTreeMap<Category, Vec<Range>>,
        #[serde(default)]
        inactive: Vec<Range>,
    },
    Refresh {
        uri: Url,
        view: u64,
    },
    Close {
        uri: Url,
    },
}

#[derive(Debug, thiserror::Error)]
enum ReplayError {
    #[error("Failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("{}:{line}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        line: usize,
        source: serde_json::Error,
    },
    #[error("{}:{line}: {source}", .path.display())]
    Event {
        path: PathBuf,
        line: usize,
        source: ColorizeError,
    },
    #[error(transparent)]
    Colorize(#[from] ColorizeError),
    #[error("Failed to write report: {0}")]
    Report(#[from] serde_json::Error),
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Report {
    views: Vec<ViewReport>,
    documents: Vec<ColorizationSnapshot>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ViewReport {
    uri: Url,
    view: ViewId,
    painted: Vec<PaintedLayer>,
}

#[derive(Serialize)]
struct PaintedLayer {
    style: RenderStyle,
    ranges: Vec<Range>,
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Replay { trace, settings } => {
            let settings = resolve_settings(settings.as_deref()).await;
            match replay(&trace, settings).await {
                Ok(report) => println!("{}", report),
                Err(e) => {
                    eprintln!("Error: {}", e);
                    std::process::exit(1);
                }
            }
        }
    }
}

/// User configuration overlaid with the file given on the command line.
async fn resolve_settings(path: Option<&Path>) -> ColorizationSettings {
    let user = match user_config_path() {
        Some(path) if path.exists() => config::load_settings_file(&path).await,
        _ => None,
    };
    let explicit = match path {
        Some(path) => config::load_settings_file(path).await,
        None => None,
    };
    merge_settings(user, explicit).unwrap_or_default().into()
}

async fn replay(path: &Path, settings: ColorizationSettings) -> Result<String, ReplayError> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| ReplayError::Read {
            path: path.to_path_buf(),
            source,
        })?;

    let sink = Arc::new(RecordingSink::new());
    let service = ColorizationService::new(sink.clone(), settings);
    let mut views: BTreeMap<ViewId, Url> = BTreeMap::new();

    for (index, line) in content.lines().enumerate() {
        let line_number = index + 1;
        if line.trim().is_empty() {
            continue;
        }
        let event: TraceEvent =
            serde_json::from_str(line).map_err(|source| ReplayError::Parse {
                path: path.to_path_buf(),
                line: line_number,
                source,
            })?;
        log::debug!(target: "irodori::replay", "Line {}: {:?}", line_number, event);

        apply_event(&service, &sink, &mut views, event)
            .await
            .map_err(|source| ReplayError::Event {
                path: path.to_path_buf(),
                line: line_number,
                source,
            })?;
    }

    let mut documents = Vec::new();
    for uri in service.open_documents() {
        documents.push(service.snapshot(&uri).await?);
    }

    let views = views
        .into_iter()
        .map(|(view, uri)| ViewReport {
            painted: sink
                .painted(view)
                .into_iter()
                .map(|(style, ranges)| PaintedLayer { style, ranges })
                .collect(),
            uri,
            view,
        })
        .collect();

    service.shutdown_all().await?;
    Ok(serde_json::to_string_pretty(&Report { views, documents })?)
}

async fn apply_event(
    service: &ColorizationService,
    sink: &RecordingSink,
    views: &mut BTreeMap<ViewId, Url>,
    event: TraceEvent,
) -> Result<(), ColorizeError> {
    match event {
        TraceEvent::Open { uri, version } => service.open_document(uri, version).await,
        TraceEvent::Show { uri, view } => {
            sink.show(&uri, ViewId(view));
            views.insert(ViewId(view), uri.clone());
            if service.is_open(&uri) {
                service.refresh_view(&uri, ViewId(view)).await?;
            }
            Ok(())
        }
        TraceEvent::Hide { uri, view } => {
            sink.hide(&uri, ViewId(view));
            views.remove(&ViewId(view));
            Ok(())
        }
        TraceEvent::Change {
            uri,
            version,
            changes,
        } => service.did_change(&uri, changes, version).await,
        TraceEvent::Syntactic {
            uri,
            version,
            ranges,
        } => {
            if !service.syntactic_result(&uri, ranges, version).await? {
                log::info!(target: "irodori::replay", "Stale syntactic result for version {}", version);
            }
            Ok(())
        }
        TraceEvent::Semantic {
            uri,
            version,
            ranges,
            inactive,
        } => {
            if !service
                .semantic_result(&uri, ranges, inactive, version)
                .await?
            {
                log::info!(target: "irodori::replay", "Stale semantic result for version {}", version);
            }
            Ok(())
        }
        TraceEvent::Refresh { uri, view } => {
            if !service.refresh_view(&uri, ViewId(view)).await? {
                log::info!(target: "irodori::replay", "View {} does not show {}", view, uri);
            }
            Ok(())
        }
        TraceEvent::Close { uri } => service.close_document(&uri).await,
    }
}
