use anyhow::{Context as AnyhowContext, Result};
use bundle_protocol::{serialize_json, serialize_json_pretty};
use bundle_store::{decode_key, list_keys, DocumentStore, QueryParams};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub mod http_api;
mod server_security;

const DEFAULT_BUNDLE: &str = "nvsupport.json.gz";

fn print_stdout(text: &str) -> Result<()> {
    use std::io::Write;

    let mut stdout = io::stdout().lock();
    if let Err(err) = stdout
        .write_all(text.as_bytes())
        .and_then(|_| stdout.write_all(b"\n"))
        .and_then(|_| stdout.flush())
    {
        if err.kind() == io::ErrorKind::BrokenPipe {
            return Ok(());
        }
        return Err(err.into());
    }
    Ok(())
}

fn print_json<T: Serialize>(value: &T, pretty: bool) -> Result<()> {
    let text = if pretty {
        serialize_json_pretty(value)?
    } else {
        serialize_json(value)?
    };
    print_stdout(&text)
}

#[derive(Parser)]
#[command(name = "bundle-viewer")]
#[command(about = "Browse a support-bundle export over a read-only JSON API", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode: log only warnings/errors
    #[arg(long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the JSON API and the frontend assets over HTTP
    Serve(ServeArgs),

    /// Print the bundle's top-level keys as JSON
    Keys(KeysArgs),

    /// Print the (projected) value stored under one key as JSON
    Get(GetArgs),
}

#[derive(Args)]
struct BundleArgs {
    /// Gzip-compressed JSON support bundle
    #[arg(long, env = "BUNDLE_VIEWER_BUNDLE", default_value = DEFAULT_BUNDLE)]
    bundle: PathBuf,
}

impl BundleArgs {
    fn open(&self) -> Result<DocumentStore> {
        DocumentStore::open(&self.bundle).with_context(|| {
            format!(
                "Failed to load support bundle data from {}",
                self.bundle.display()
            )
        })
    }
}

#[derive(Args)]
struct ServeArgs {
    #[command(flatten)]
    bundle: BundleArgs,

    /// Directory with the frontend's static files
    #[arg(long, env = "BUNDLE_VIEWER_FRONTEND", default_value = "frontend")]
    frontend_dir: PathBuf,

    /// Bind address. Defaults to loopback only; use e.g. 0.0.0.0:8080 with
    /// --public to listen on all interfaces
    #[arg(long, default_value = "127.0.0.1:8080")]
    bind: String,

    /// Allow binding to non-loopback addresses
    #[arg(long)]
    public: bool,
}

#[derive(Args)]
struct KeysArgs {
    #[command(flatten)]
    bundle: BundleArgs,

    /// Keep only keys containing this substring (case-insensitive)
    #[arg(long, short)]
    query: Option<String>,

    /// Pretty-print JSON output
    #[arg(long)]
    pretty: bool,
}

#[derive(Args)]
struct GetArgs {
    #[command(flatten)]
    bundle: BundleArgs,

    /// Key to read; `%2F` is accepted for `/`
    key: String,

    /// View filter, e.g. --param domain=prod (repeatable)
    #[arg(long = "param", value_parser = parse_param)]
    params: Vec<(String, String)>,

    /// Pretty-print JSON output
    #[arg(long)]
    pretty: bool,
}

fn parse_param(raw: &str) -> std::result::Result<(String, String), String> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected name=value, got '{raw}'"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("parameter name must be non-empty in '{raw}'"));
    }
    Ok((name.to_string(), value.to_string()))
}

pub async fn main_entry() -> Result<()> {
    let mut cli = Cli::parse();

    // `keys` and `get` write JSON to stdout; keep stderr to warnings unless asked.
    if matches!(cli.command, Commands::Keys(_) | Commands::Get(_)) && !cli.verbose {
        cli.quiet = true;
    }

    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if cli.quiet {
        builder.filter_level(log::LevelFilter::Warn);
    } else if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.target(env_logger::Target::Stderr).init();

    match cli.command {
        Commands::Serve(args) => serve_http(args).await?,
        Commands::Keys(args) => run_keys(args)?,
        Commands::Get(args) => run_get(args)?,
    }

    Ok(())
}

fn run_keys(args: KeysArgs) -> Result<()> {
    let store = args.bundle.open()?;
    let keys = list_keys(&store, args.query.as_deref())?;
    print_json(&keys, args.pretty)
}

fn run_get(args: GetArgs) -> Result<()> {
    let key = decode_key(&args.key)?;
    let store = args.bundle.open()?;
    let params: QueryParams = args.params.into_iter().collect();
    let value = store.view(&key, &params)?;
    print_json(&value, args.pretty)
}

async fn serve_http(args: ServeArgs) -> Result<()> {
    log::info!(
        "Bundle viewer v{} starting...",
        env!("CARGO_PKG_VERSION")
    );
    let addrs = server_security::resolve_guarded_bind_addrs(&args.bind, args.public).await?;

    let store = args.bundle.open()?;
    warn_missing_frontend(&args.frontend_dir);
    let app = http_api::router(Arc::new(store), &args.frontend_dir);

    let listener = tokio::net::TcpListener::bind(&args.bind)
        .await
        .with_context(|| format!("Failed to bind {}", args.bind))?;
    let local_addr = listener.local_addr()?;
    let base_url = format!("http://{local_addr}");
    log::info!("Server listening on {base_url}");

    print_stdout(&format!("Serving bundle API: {base_url}/api/keys"))?;
    if args.public {
        let addrs = addrs
            .iter()
            .map(|a| a.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        print_stdout(&format!(
            "Public bind enabled (--public). Resolved addresses: {addrs}"
        ))?;
    }
    print_stdout(&format!("Try: curl '{base_url}/api/data/%2Fv1%2Fgroup?domain=prod'"))?;

    axum::serve(listener, app).await?;
    Ok(())
}

fn warn_missing_frontend(dir: &Path) {
    if !dir.is_dir() {
        log::warn!(
            "Frontend directory {} not found; only /api routes will respond",
            dir.display()
        );
    }
}
