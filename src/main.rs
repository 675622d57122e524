use anyhow::{Context, Result};
use arxiv2kindle::config::{find_config_file, get_config, load_config, Config, GeometryConfig};
use arxiv2kindle::delivery::{Delivered, Destination};
use arxiv2kindle::models::{GeometrySettings, Orientation};
use arxiv2kindle::pipeline::{ConvertRequest, Converter};
use arxiv2kindle::sources::ArxivSource;
use arxiv2kindle::tools::Toolchain;
use arxiv2kindle::utils::HttpClient;
use clap::Parser;
use std::io::IsTerminal;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// arxiv2kindle - Recompile arXiv papers to fit small e-reader screens
#[derive(Parser, Debug)]
#[command(name = "arxiv2kindle")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Recompile arXiv papers from their LaTeX sources to fit small e-reader screens", long_about = None)]
struct Cli {
    /// arXiv identifier, abs/pdf URL or search query
    #[arg(required_unless_present = "env")]
    query: Option<String>,

    /// Output directory, output file, or "-" for stdout
    #[arg(required_unless_present = "env")]
    dest: Option<Destination>,

    /// Page width in inches
    #[arg(long, short = 'W', value_parser = parse_inches)]
    width: Option<f64>,

    /// Page height in inches
    #[arg(long, short = 'H', value_parser = parse_inches)]
    height: Option<f64>,

    /// Page margin in inches
    #[arg(long, short, value_parser = parse_inches)]
    margin: Option<f64>,

    /// Landscape orientation (pages are rotated after compiling)
    #[arg(long, conflicts_with = "portrait")]
    landscape: bool,

    /// Portrait orientation (default)
    #[arg(long)]
    portrait: bool,

    /// Enable verbose logging (can be used multiple times for more verbosity: -v, -vv)
    #[arg(long, short, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output, including typesetting engine output
    #[arg(long, short)]
    quiet: bool,

    /// Configuration file path
    #[arg(long)]
    config: Option<PathBuf>,

    /// Request timeout in seconds
    #[arg(long)]
    timeout: Option<u64>,

    /// Show all environment variables
    #[arg(long)]
    env: bool,
}

impl Cli {
    fn orientation(&self) -> Orientation {
        if self.landscape {
            Orientation::Landscape
        } else {
            Orientation::Portrait
        }
    }

    /// Page geometry from the flags, falling back to configured defaults
    fn geometry(&self, defaults: &GeometryConfig) -> Result<GeometrySettings> {
        Ok(GeometrySettings::new(
            checked_inches("width", self.width.unwrap_or(defaults.width))?,
            checked_inches("height", self.height.unwrap_or(defaults.height))?,
            checked_inches("margin", self.margin.unwrap_or(defaults.margin))?,
            self.orientation(),
        ))
    }
}

/// Configured lengths bypass `parse_inches`, so check them again
fn checked_inches(name: &str, value: f64) -> Result<f64> {
    anyhow::ensure!(
        value.is_finite() && value > 0.0,
        "geometry {} must be a positive number of inches, got {}",
        name,
        value
    );
    Ok(value)
}

/// Positive length in inches
fn parse_inches(s: &str) -> Result<f64, String> {
    let value: f64 = s
        .parse()
        .map_err(|_| format!("`{}` is not a number", s))?;
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(format!("`{}` must be a positive number of inches", s))
    }
}

/// Print all available environment variables
fn print_env_vars() {
    println!("arxiv2kindle - Environment Variables");
    println!();
    println!("Geometry Defaults (inches):");
    println!("  ARXIV2KINDLE_GEOMETRY__WIDTH            Page width (default: 4)");
    println!("  ARXIV2KINDLE_GEOMETRY__HEIGHT           Page height (default: 6)");
    println!("  ARXIV2KINDLE_GEOMETRY__MARGIN           Page margin (default: 0.2)");
    println!();
    println!("External Tools:");
    println!("  ARXIV2KINDLE_TOOLS__LATEX               Typesetting engine (default: pdflatex)");
    println!("  ARXIV2KINDLE_TOOLS__ROTATOR             PDF rotator, landscape only (default: pdftk)");
    println!("  ARXIV2KINDLE_TOOLS__COMPILE_PASSES      Engine passes (default: 3)");
    println!();
    println!("Network:");
    println!("  ARXIV2KINDLE_NETWORK__API_URL           arXiv query API (default: http://export.arxiv.org/api/query)");
    println!("  ARXIV2KINDLE_NETWORK__EPRINT_URL        Source archive base URL (default: https://arxiv.org/e-print)");
    println!("  ARXIV2KINDLE_NETWORK__TIMEOUT_SECONDS   Request timeout (default: 30)");
    println!("  HTTP_PROXY / HTTPS_PROXY / NO_PROXY     Standard proxy settings");
    println!();
    println!("Other Settings:");
    println!("  RUST_LOG                                Rust logging level (e.g., debug, info, warn, error)");
    println!();
    println!("Example:");
    println!("  export ARXIV2KINDLE_GEOMETRY__WIDTH=\"3.5\"");
    println!("  arxiv2kindle 1802.08395 ~/kindle");
}

/// Logs go to stderr: stdout may carry the PDF
fn init_tracing(verbose: u8, quiet: bool) {
    let log_level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    let env_filter = if quiet { "error" } else { log_level };

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("arxiv2kindle={}", env_filter)),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Load configuration from file if specified or found in default locations
fn resolve_config(explicit: Option<&PathBuf>) -> Result<Config> {
    if let Some(config_path) = explicit {
        return load_config(config_path)
            .with_context(|| format!("Failed to load config file {}", config_path.display()));
    }
    if let Some(config_path) = find_config_file() {
        tracing::info!("Using config file: {}", config_path.display());
        return load_config(&config_path)
            .with_context(|| format!("Failed to load config file {}", config_path.display()));
    }
    get_config().context("Failed to read configuration from the environment")
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Show environment variables and exit if requested
    if cli.env {
        print_env_vars();
        return Ok(());
    }

    init_tracing(cli.verbose, cli.quiet);

    let config = resolve_config(cli.config.as_ref())?;

    let query = cli.query.clone().context("missing QUERY argument")?;
    let dest = cli.dest.clone().context("missing DEST argument")?;
    let geometry = cli.geometry(&config.geometry)?;

    if dest == Destination::Stdout && std::io::stdout().is_terminal() {
        tracing::warn!("Writing PDF data to a terminal; redirect stdout to a file or pipe");
    }

    let timeout = cli.timeout.unwrap_or(config.network.timeout_seconds);
    let client = HttpClient::with_timeout(Duration::from_secs(timeout))
        .context("Failed to build HTTP client")?;
    let source = ArxivSource::with_client(Arc::new(client))
        .with_endpoints(&config.network.api_url, &config.network.eprint_url);

    let mut toolchain = Toolchain::from_config(&config.tools);
    toolchain.echo_output = !cli.quiet;

    let converter = Converter::new(Arc::new(source), toolchain);
    let request = ConvertRequest {
        query,
        dest,
        geometry,
    };

    let conversion = converter.run(&request).await?;

    match &conversion.delivered {
        Delivered::File(path) => {
            tracing::info!(
                "Done: {} ({} pages)",
                path.display(),
                conversion.pages
            );
        }
        Delivered::Stdout { bytes } => {
            tracing::info!("Done: wrote {} bytes ({} pages) to stdout", bytes, conversion.pages);
        }
    }
    tracing::debug!("Work directory kept at {}", conversion.work_dir.display());

    Ok(())
}
