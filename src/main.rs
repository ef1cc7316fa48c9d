// gdc-loadfiles: manifest in, load files out
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use gdc_loadfiles::config::{DEFAULT_TIMEOUT, RunConfig};
use gdc_loadfiles::core::run::LoadRun;
use gdc_loadfiles::io::manifest::load_manifest;
use gdc_loadfiles::io::resolver::UrlResolver;
use gdc_loadfiles::io::snapshot::write_snapshot;
use gdc_loadfiles::io::tables::write_load_files;
use gdc_loadfiles::metadata::client::DEFAULT_API_ROOT;
use gdc_loadfiles::metadata::{GdcClient, MetadataSource, OfflineSource, RetryPolicy, Retrying};

#[derive(Parser, Debug)]
#[command(name = "gdc-loadfiles")]
#[command(about = "Create workspace load files from a GDC download manifest")]
struct Args {
    /// Manifest file from the GDC Data Portal
    #[arg(value_name = "MANIFEST")]
    manifest: PathBuf,

    /// TSV file mapping GDC UUIDs to URLs
    #[arg(short = 'r', long, value_name = "PATH")]
    resolve_uuids: Option<PathBuf>,

    /// Create participant entities for all referenced cases
    #[arg(short = 'c', long)]
    all_cases: bool,

    /// Metadata API root
    #[arg(long, env = "GDC_API_ROOT", default_value = DEFAULT_API_ROOT)]
    api_root: String,

    /// Serve metadata from a JSON object keyed by file id instead of the API
    #[arg(long, value_name = "PATH")]
    metadata_json: Option<PathBuf>,

    /// Directory the load files are written to
    #[arg(short, long, value_name = "DIR", default_value = ".")]
    output_dir: PathBuf,

    /// Also write a TOON snapshot of the registry
    #[arg(long, value_name = "PATH")]
    snapshot: Option<PathBuf>,

    /// Attempts per metadata request
    #[arg(long, default_value_t = 5)]
    retries: u32,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = DEFAULT_TIMEOUT.as_secs())]
    timeout: u64,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn into_config(self) -> RunConfig {
        let mut config = RunConfig::new(self.manifest);
        config.url_table = self.resolve_uuids;
        config.all_cases = self.all_cases;
        config.api_root = self.api_root;
        config.metadata_json = self.metadata_json;
        config.output_dir = self.output_dir;
        config.snapshot = self.snapshot;
        config.retry = RetryPolicy {
            attempts: self.retries,
            ..RetryPolicy::default()
        };
        config.timeout = Duration::from_secs(self.timeout);
        config
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    setup_tracing(args.verbose);
    let config = args.into_config();

    info!(manifest = %config.manifest.display(), "reading manifest");
    let manifest = load_manifest(&config.manifest)
        .with_context(|| format!("reading manifest {}", config.manifest.display()))?;

    let urls = match &config.url_table {
        Some(path) => {
            info!(path = %path.display(), "reading url table");
            UrlResolver::load(path).with_context(|| format!("reading url table {}", path.display()))?
        }
        None => UrlResolver::default(),
    };

    let source: Box<dyn MetadataSource> = match &config.metadata_json {
        Some(path) => Box::new(OfflineSource::from_json_file(path)?),
        None => {
            let client = GdcClient::new(config.api_root.as_str(), config.timeout)
                .context("building metadata client")?;
            Box::new(Retrying::new(client, config.retry))
        }
    };

    let mut run = LoadRun::new(source.as_ref(), urls, config.all_cases);
    run.run(&manifest);
    let (graph, _) = run.into_parts();

    std::fs::create_dir_all(&config.output_dir)
        .with_context(|| format!("creating {}", config.output_dir.display()))?;
    write_load_files(&graph, &config.output_dir, &config.basename)?;
    if let Some(path) = &config.snapshot {
        write_snapshot(&graph, path)?;
    }
    Ok(())
}

fn setup_tracing(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("gdc_loadfiles=debug,info")
        } else {
            EnvFilter::new("info")
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
