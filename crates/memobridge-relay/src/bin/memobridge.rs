//! memobridge: command-line access to a bound note service.
//!
//! Binds sessions to credentials, parses messages offline, and runs note,
//! tag, resource and batch maintenance commands against the remote API.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use memobridge_batch::{BatchConfig, BatchTools, Combine, SelectionPolicy};
use memobridge_client::{ClientConfig, MemosClient};
use memobridge_core::{
    defaults, parse_annotated, parse_plain, AnnotationRange, CreateNoteRequest,
    ListNotesRequest, NoteApi, NotePatch, ResourceApi, RowStatus, TagApi, UploadMeta, Visibility,
};
use memobridge_relay::{FileSessionStore, SessionStore};

/// Exit code for a batch in which some members failed.
const EXIT_PARTIAL: u8 = 2;

#[derive(Parser)]
#[command(name = "memobridge")]
#[command(author, version, about = "Chat-to-note bridge and maintenance tool")]
#[command(propagate_version = true)]
struct Cli {
    /// Credential URL (https://host/api/note?openId=...)
    #[arg(long, global = true)]
    open_api: Option<String>,

    /// Use the credential bound to this session
    #[arg(long, global = true)]
    session: Option<String>,

    /// Directory of the session store
    #[arg(long, global = true, env = "MEMOBRIDGE_SESSION_DIR", default_value = defaults::SESSION_DIR)]
    session_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Bind a session to a credential URL
    Bind { session: String, credential: String },

    /// Remove a session binding
    Unbind { session: String },

    /// Parse a message offline and print the derived note fields
    Parse {
        /// Plain message text
        text: String,

        /// Markup rendering of the text
        #[arg(long)]
        markup: Option<String>,

        /// Annotation ranges as JSON: [{"offset":0,"length":4,"type":"hashtag"}]
        #[arg(long, requires = "markup")]
        annotations: Option<String>,
    },

    /// Note commands
    #[command(subcommand)]
    Note(NoteCommand),

    /// Tag commands
    #[command(subcommand)]
    Tag(TagCommand),

    /// Resource commands
    #[command(subcommand)]
    Resource(ResourceCommand),

    /// Batch maintenance
    #[command(subcommand)]
    Tool(ToolCommand),
}

#[derive(Subcommand)]
enum NoteCommand {
    /// List notes
    List {
        #[arg(long, default_value = "NORMAL")]
        status: RowStatus,
        #[arg(long)]
        tag: Option<String>,
        #[arg(long)]
        visibility: Option<Visibility>,
        #[arg(long)]
        offset: Option<i64>,
        #[arg(long)]
        limit: Option<i64>,
    },
    /// Show one note
    Get { id: i64 },
    /// Create a note from plain text with inline directives
    Create {
        text: String,
        /// Also create every tag the text references
        #[arg(long)]
        create_tags: bool,
    },
    /// Change individual fields of a note
    Update {
        id: i64,
        #[arg(long)]
        content: Option<String>,
        #[arg(long)]
        visibility: Option<Visibility>,
        #[arg(long)]
        status: Option<RowStatus>,
        #[arg(long, value_delimiter = ',')]
        resources: Option<Vec<i64>>,
    },
    /// Delete a note
    Delete { id: i64 },
}

#[derive(Subcommand)]
enum TagCommand {
    List,
    Create { name: String },
    /// Delete a tag; fails when it is not listed
    Delete { name: String },
}

#[derive(Args, Clone)]
struct MetaArgs {
    /// Stored file name
    #[arg(long)]
    filename: Option<String>,
    /// Content type
    #[arg(long, default_value = defaults::ATTACHMENT_CONTENT_TYPE)]
    content_type: String,
}

#[derive(Subcommand)]
enum ResourceCommand {
    List,
    /// Upload a local file
    Upload {
        path: PathBuf,
        #[command(flatten)]
        meta: MetaArgs,
    },
    /// Register an externally hosted file
    Link {
        url: String,
        #[command(flatten)]
        meta: MetaArgs,
    },
    /// Download a URL and upload it
    Fetch {
        url: String,
        #[command(flatten)]
        meta: MetaArgs,
    },
    /// Delete a resource; fails when it is not listed
    Delete { id: i64 },
    /// Delete every resource no note links to
    Clean,
}

#[derive(Subcommand)]
enum ToolCommand {
    /// Rename a tag in every note body carrying it
    RenameTag {
        old: String,
        new: String,
        /// Delete the old tag once the new one exists
        #[arg(long)]
        delete_old: bool,
    },
    /// Set the visibility of every note selected by tags
    SetVisibility {
        visibility: Visibility,
        #[arg(required = true, num_args = 1..)]
        tags: Vec<String>,
        #[arg(long, default_value = "union")]
        combine: Combine,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let _log_guard = init_tracing();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

/// Initialize tracing with configurable output.
///
/// Environment variables:
///   LOG_FORMAT  - "json" or "text" (default: "text")
///   LOG_FILE    - path to log file (optional, enables daily-rotated file logging)
///   LOG_ANSI    - "true"/"false" override ANSI colors
///   RUST_LOG    - standard env filter (default: "memobridge=info")
fn init_tracing() -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let log_file = std::env::var("LOG_FILE").ok();
    let log_ansi = std::env::var("LOG_ANSI")
        .ok()
        .map(|v| v == "true" || v == "1");

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        "memobridge=info,memobridge_core=info,memobridge_client=info,memobridge_batch=info,memobridge_relay=info"
            .into()
    });
    let registry = tracing_subscriber::registry().with(env_filter);

    if let Some(ref path) = log_file {
        let path = Path::new(path);
        let file_dir = path.parent().unwrap_or(Path::new("."));
        let file_name = path
            .file_name()
            .and_then(|f| f.to_str())
            .unwrap_or("memobridge.log");
        let file_appender = tracing_appender::rolling::daily(file_dir, file_name);
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

        if log_format == "json" {
            registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(non_blocking),
                )
                .init();
        } else {
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(log_ansi.unwrap_or(false));
            registry.with(layer).init();
        }
        Some(guard)
    } else {
        // Console output goes to stderr so command output stays parseable
        if log_format == "json" {
            registry
                .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
                .init();
        } else {
            let mut layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);
            if let Some(ansi) = log_ansi {
                layer = layer.with_ansi(ansi);
            }
            registry.with(layer).init();
        }
        None
    }
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn upload_meta(meta: MetaArgs, fallback_name: &str) -> UploadMeta {
    UploadMeta::new(
        meta.filename.unwrap_or_else(|| fallback_name.to_string()),
        meta.content_type,
    )
}

/// Last path segment of a URL or path, used as the default file name.
fn last_segment(s: &str) -> &str {
    s.trim_end_matches('/')
        .rsplit('/')
        .next()
        .filter(|seg| !seg.is_empty())
        .unwrap_or("upload")
}

/// Credential from `--open-api`, then `--session`, then the environment.
async fn connect(cli: &Cli, store: &FileSessionStore) -> anyhow::Result<MemosClient> {
    let credential = match (&cli.open_api, &cli.session) {
        (Some(raw), _) => raw.clone(),
        (None, Some(session)) => store
            .credential(session)
            .await?
            .with_context(|| format!("session {} is not bound", session))?,
        (None, None) => std::env::var(defaults::OPEN_API_ENV).with_context(|| {
            format!(
                "no credential: pass --open-api, --session or set {}",
                defaults::OPEN_API_ENV
            )
        })?,
    };
    Ok(MemosClient::new(&credential, ClientConfig::from_env())?)
}

async fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let store = FileSessionStore::new(&cli.session_dir);

    match cli.command {
        Commands::Bind {
            ref session,
            ref credential,
        } => {
            store.bind(session, credential).await?;
            println!("Bound session {}", session);
        }
        Commands::Unbind { ref session } => {
            if store.unbind(session).await? {
                println!("Unbound session {}; consider resetting the credential", session);
            } else {
                bail!("session {} is not bound", session);
            }
        }
        Commands::Parse {
            ref text,
            ref markup,
            ref annotations,
        } => {
            let parsed = match markup {
                None => parse_plain(text),
                Some(markup) => {
                    let ranges: Option<Vec<AnnotationRange>> = annotations
                        .as_deref()
                        .map(|raw| serde_json::from_str(raw))
                        .transpose()
                        .context("invalid --annotations JSON")?;
                    parse_annotated(text, markup, ranges.as_deref())?
                }
            };
            print_json(&parsed)?;
        }
        Commands::Note(ref command) => {
            let client = connect(&cli, &store).await?;
            run_note(&client, command).await?;
        }
        Commands::Tag(ref command) => {
            let client = connect(&cli, &store).await?;
            match command {
                TagCommand::List => print_json(&client.list_tags().await?)?,
                TagCommand::Create { name } => {
                    client.create_tag(name).await?;
                    println!("Created tag {}", name);
                }
                TagCommand::Delete { name } => {
                    client.delete_tag(name).await?;
                    println!("Deleted tag {}", name);
                }
            }
        }
        Commands::Resource(ref command) => {
            let client = connect(&cli, &store).await?;
            return run_resource(&client, command).await;
        }
        Commands::Tool(ref command) => {
            let client = connect(&cli, &store).await?;
            let tools = BatchTools::new(client, BatchConfig::from_env());
            return run_tool(&tools, command).await;
        }
    }
    Ok(ExitCode::SUCCESS)
}

async fn run_note(client: &MemosClient, command: &NoteCommand) -> anyhow::Result<()> {
    match command {
        NoteCommand::List {
            status,
            tag,
            visibility,
            offset,
            limit,
        } => {
            let req = ListNotesRequest {
                status: *status,
                tag: tag.clone(),
                offset: *offset,
                limit: *limit,
                visibility: *visibility,
            };
            print_json(&client.list_notes(&req).await?)?;
        }
        NoteCommand::Get { id } => print_json(&client.get_note(*id).await?)?,
        NoteCommand::Create { text, create_tags } => {
            let parsed = parse_plain(text);
            let id = client
                .create_note(&CreateNoteRequest::from(&parsed))
                .await?;
            if parsed.status != RowStatus::Normal {
                client
                    .update_note(
                        id,
                        &NotePatch {
                            status: Some(parsed.status),
                            ..Default::default()
                        },
                    )
                    .await?;
            }
            if *create_tags {
                for tag in &parsed.tags {
                    client.create_tag(tag).await?;
                }
            }
            println!("{}", client.credential().note_link(id));
        }
        NoteCommand::Update {
            id,
            content,
            visibility,
            status,
            resources,
        } => {
            let patch = NotePatch {
                content: content.clone(),
                visibility: *visibility,
                resource_ids: resources.clone(),
                status: *status,
            };
            if patch.is_empty() {
                bail!("nothing to update: pass at least one field");
            }
            client.update_note(*id, &patch).await?;
            println!("Updated note {}", id);
        }
        NoteCommand::Delete { id } => {
            client.delete_note(*id).await?;
            println!("Deleted note {}", id);
        }
    }
    Ok(())
}

async fn run_resource(client: &MemosClient, command: &ResourceCommand) -> anyhow::Result<ExitCode> {
    match command {
        ResourceCommand::List => print_json(&client.list_resources().await?)?,
        ResourceCommand::Upload { path, meta } => {
            let bytes = tokio::fs::read(path)
                .await
                .with_context(|| format!("failed to read {}", path.display()))?;
            let fallback = path
                .file_name()
                .and_then(|f| f.to_str())
                .unwrap_or("upload");
            let meta = upload_meta(meta.clone(), fallback);
            println!("{}", client.upload_bytes(bytes, &meta).await?);
        }
        ResourceCommand::Link { url, meta } => {
            let meta = upload_meta(meta.clone(), last_segment(url));
            println!("{}", client.upload_external_link(url, &meta).await?);
        }
        ResourceCommand::Fetch { url, meta } => {
            let meta = upload_meta(meta.clone(), last_segment(url));
            println!("{}", client.upload_from_remote_stream(url, &meta).await?);
        }
        ResourceCommand::Delete { id } => {
            client.delete_resource(*id).await?;
            println!("Deleted resource {}", id);
        }
        ResourceCommand::Clean => {
            let result = client.delete_unlinked_resources().await?;
            print_json(&result.summary())?;
            if !result.is_complete() {
                return Ok(ExitCode::from(EXIT_PARTIAL));
            }
        }
    }
    Ok(ExitCode::SUCCESS)
}

async fn run_tool(tools: &BatchTools<MemosClient>, command: &ToolCommand) -> anyhow::Result<ExitCode> {
    let complete = match command {
        ToolCommand::RenameTag {
            old,
            new,
            delete_old,
        } => {
            let report = tools.rename_tag(old, new, *delete_old).await?;
            print_json(&report.summary())?;
            report.is_complete()
        }
        ToolCommand::SetVisibility {
            visibility,
            tags,
            combine,
        } => {
            let policy = SelectionPolicy::new(tags.iter().cloned(), *combine);
            let result = tools.bulk_set_visibility(&policy, *visibility).await?;
            print_json(&result.summary())?;
            result.is_complete()
        }
    };

    if complete {
        Ok(ExitCode::SUCCESS)
    } else {
        info!("Batch finished with failures");
        Ok(ExitCode::from(EXIT_PARTIAL))
    }
}
