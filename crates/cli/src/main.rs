//! Versioned Handle Command Line Interface
//!
//! Drives the versioned handle provider over a local JSON state file.

mod state;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use handle_provider::{Handle, MetadataSynchronizer, ObjectId, ObjectKind, ProviderConfig};
use serde_json::{json, Value};
use state::Workspace;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "handle-cli")]
#[command(about = "Versioned handle management", long_about = None)]
#[command(version)]
struct Cli {
    /// State file holding objects, handles and version histories
    #[arg(long, default_value = "handles.json")]
    state: PathBuf,

    /// Optional configuration file (HANDLE_* environment variables also apply)
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum KindArg {
    Item,
    Collection,
    Community,
    Bitstream,
}

impl From<KindArg> for ObjectKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Item => ObjectKind::Item,
            KindArg::Collection => ObjectKind::Collection,
            KindArg::Community => ObjectKind::Community,
            KindArg::Bitstream => ObjectKind::Bitstream,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create a content object and register a handle for it
    Create {
        #[arg(long, value_enum, default_value = "item")]
        kind: KindArg,
    },
    /// Create the next version of an item's work
    NewVersion {
        object: ObjectId,
        #[arg(long, default_value = "")]
        summary: String,
    },
    /// Mint (or return) the handle of an object
    Mint { object: ObjectId },
    /// Import an object under a supplied handle, rebuilding its version history
    Import {
        #[arg(long, value_enum, default_value = "item")]
        kind: KindArg,
        identifier: Handle,
    },
    /// Bind a supplied handle to an existing object as-is
    Reserve { object: ObjectId, identifier: Handle },
    /// Object bound to a handle
    Resolve { identifier: Handle },
    /// Handle bound to an object
    Lookup { object: ObjectId },
    /// Remove an object, moving the canonical handle when needed
    Delete { object: ObjectId },
    /// Whether an identifier string is served by this provider
    Supports { identifier: String },
    /// Dump the state file
    Show,
}

impl Commands {
    fn mutates(&self) -> bool {
        !matches!(
            self,
            Commands::Resolve { .. }
                | Commands::Lookup { .. }
                | Commands::Supports { .. }
                | Commands::Show
        )
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = ProviderConfig::load(cli.config.as_deref())?;
    init_logging(&config);

    let mut workspace = Workspace::open(&cli.state, config)?;
    let mutates = cli.command.mutates();
    let output = execute(&mut workspace, cli.command)?;
    if mutates {
        workspace.save()?;
    }

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn init_logging(config: &ProviderConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn execute(workspace: &mut Workspace, command: Commands) -> Result<Value> {
    let output = match command {
        Commands::Create { kind } => {
            let object = workspace.create_object(kind.into());
            let handle = workspace.provider().register(&object)?;
            json!({
                "object": object.id,
                "kind": object.kind,
                "handle": handle,
                "url": workspace_url(workspace, &handle),
            })
        }
        Commands::NewVersion { object, summary } => {
            let (successor, handle) = workspace.new_version(object, &summary)?;
            json!({
                "object": successor.id,
                "handle": handle,
                "canonical": handle.canonical(),
            })
        }
        Commands::Mint { object } => {
            let object = workspace.object(object)?;
            let handle = workspace.provider().mint(&object)?;
            json!({ "object": object.id, "handle": handle })
        }
        Commands::Import { kind, identifier } => {
            let object = workspace.create_object(kind.into());
            workspace.provider().register_identifier(&object, &identifier)?;
            let uris = workspace.metadata().descriptive_uris(object.id)?;
            json!({
                "object": object.id,
                "handle": identifier,
                "descriptive_uris": uris,
            })
        }
        Commands::Reserve { object, identifier } => {
            let object = workspace.object(object)?;
            workspace.provider().reserve(&object, &identifier)?;
            json!({ "object": object.id, "handle": identifier })
        }
        Commands::Resolve { identifier } => {
            let object = workspace.provider().resolve(&identifier);
            json!({ "handle": identifier, "object": object })
        }
        Commands::Lookup { object } => {
            let object = workspace.object(object)?;
            let handle = workspace.provider().lookup(&object)?;
            json!({ "object": object.id, "handle": handle })
        }
        Commands::Delete { object } => {
            workspace.remove_object(object)?;
            json!({ "deleted": object })
        }
        Commands::Supports { identifier } => {
            let supported = workspace.provider().supports(&identifier);
            json!({ "identifier": identifier, "supported": supported })
        }
        Commands::Show => serde_json::from_str(&workspace.to_json()?)?,
    };

    Ok(output)
}

fn workspace_url(workspace: &Workspace, handle: &Handle) -> String {
    workspace.provider().config().canonical_url(handle)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn workspace() -> (tempfile::TempDir, Workspace) {
        let dir = tempfile::tempdir().unwrap();
        let workspace =
            Workspace::open(&dir.path().join("handles.json"), ProviderConfig::default()).unwrap();
        (dir, workspace)
    }

    fn object_id(value: &Value) -> ObjectId {
        value["object"].as_str().unwrap().parse().unwrap()
    }

    #[test]
    fn test_create_and_version_flow() {
        let (_dir, mut ws) = workspace();

        let created = execute(&mut ws, Commands::Create { kind: KindArg::Item }).unwrap();
        assert_eq!(created["handle"], "123456789/1");
        assert_eq!(created["url"], "http://hdl.handle.net/123456789/1");

        let versioned = execute(
            &mut ws,
            Commands::NewVersion {
                object: object_id(&created),
                summary: "second".into(),
            },
        )
        .unwrap();
        assert_eq!(versioned["handle"], "123456789/1.2");
        assert_eq!(versioned["canonical"], "123456789/1");

        let resolved = execute(
            &mut ws,
            Commands::Resolve {
                identifier: Handle::new("123456789/1"),
            },
        )
        .unwrap();
        assert_eq!(object_id(&resolved), object_id(&versioned));

        execute(
            &mut ws,
            Commands::Delete {
                object: object_id(&versioned),
            },
        )
        .unwrap();
        let resolved = execute(
            &mut ws,
            Commands::Resolve {
                identifier: Handle::new("123456789/1"),
            },
        )
        .unwrap();
        assert_eq!(object_id(&resolved), object_id(&created));
    }

    #[test]
    fn test_import_rebuilds_history() {
        let (_dir, mut ws) = workspace();
        let imported = execute(
            &mut ws,
            Commands::Import {
                kind: KindArg::Item,
                identifier: Handle::new("123456789/77.2"),
            },
        )
        .unwrap();
        assert_eq!(
            imported["descriptive_uris"][0],
            "http://hdl.handle.net/123456789/77"
        );

        let resolved = execute(
            &mut ws,
            Commands::Resolve {
                identifier: Handle::new("123456789/77"),
            },
        )
        .unwrap();
        assert_eq!(object_id(&resolved), object_id(&imported));
    }

    #[test]
    fn test_lookup_unknown_handle_fails() {
        let (_dir, mut ws) = workspace();
        let created = execute(&mut ws, Commands::Create { kind: KindArg::Collection }).unwrap();
        let looked_up = execute(
            &mut ws,
            Commands::Lookup {
                object: object_id(&created),
            },
        )
        .unwrap();
        assert_eq!(looked_up["handle"], "123456789/1");

        assert!(execute(
            &mut ws,
            Commands::Lookup {
                object: ObjectId::new_v4()
            }
        )
        .is_err());
        assert!(!Commands::Show.mutates());
    }

    #[test]
    fn test_cli_parses_arguments() {
        let cli = Cli::try_parse_from([
            "handle-cli",
            "--state",
            "/tmp/h.json",
            "import",
            "--kind",
            "item",
            "123456789/5.1",
        ])
        .unwrap();
        assert!(matches!(cli.command, Commands::Import { .. }));
        assert!(Cli::try_parse_from(["handle-cli", "mint", "not-a-uuid"]).is_err());
    }
}
