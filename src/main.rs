use std::path::{Path, PathBuf};

use clap::Parser;
use miette::{Context, IntoDiagnostic, Result};
use tracing_subscriber::EnvFilter;

use licensegate_core::{GateConfig, GateError, OutputFormat};
use licensegate_difflens::filter::PathExclusion;
use licensegate_difflens::parser::parse_patch;
use licensegate_scan::copyright::CopyrightAnalyzer;
use licensegate_scan::license::{LicenseAnalyzer, LicensePolicy};
use licensegate_scan::oracle::ScancodeOracle;
use licensegate_scan::report::ComplianceReport;

const DEFAULT_CONFIG: &str = ".licensegate.toml";

#[derive(Parser)]
#[command(
    name = "licensegate",
    version,
    about = "Flag copyright regressions and incompatible licensing in a patch",
    long_about = "Checks a git patch before it is merged.\n\n\
                   Deleted copyright notices in modified files are reported unless they were\n\
                   re-added or replaced by a sanctioned holder transition. Added and deleted\n\
                   text is classified with ScanCode and judged against the license marking of\n\
                   the target project.\n\n\
                   The exit status is the number of flagged files (0 means clean).\n\n\
                   Examples:\n  \
                     licensegate change.patch meta-qcom-robotics\n  \
                     git format-patch -1 --stdout > p.diff && licensegate p.diff my/project\n  \
                     licensegate change.patch meta-qcom-kernel --format json"
)]
struct Cli {
    /// Patch file in git diff format
    patch: PathBuf,

    /// Project identifier used to look up the license marking
    project: String,

    /// Path to configuration file (default: .licensegate.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Path-exclusion file (default: value of `ignore_file` in the config)
    #[arg(long)]
    ignore_file: Option<PathBuf>,

    /// Output format
    #[arg(
        long,
        default_value = "text",
        long_help = "Output format for the report.\n\n\
                       Formats:\n  \
                         text      Prefixed per-file listing (default)\n  \
                         json      Machine-readable JSON with camelCase keys\n  \
                         markdown  GitHub-flavored Markdown table"
    )]
    format: OutputFormat,

    /// Enable debug logging on stderr
    #[arg(long, short)]
    verbose: bool,
}

fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .build(),
        )
    }))
    .into_diagnostic()?;
    human_panic::setup_panic!();

    let cli = Cli::parse();
    init_logging(cli.verbose);
    tracing::debug!(patch = %cli.patch.display(), project = %cli.project, format = %cli.format, "starting check");

    let config = load_config(cli.config.as_deref())?;
    let report = check(&cli, &config)?;

    match cli.format {
        OutputFormat::Json => {
            println!("{}", report.to_json().into_diagnostic()?);
        }
        OutputFormat::Markdown => print!("{}", report.to_markdown()),
        OutputFormat::Text => print!("{report}"),
    }

    let flagged = report.flagged_count();
    tracing::debug!(flagged, "check complete");
    // Exit statuses above 255 wrap on unix.
    std::process::exit(flagged.min(255) as i32)
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn load_config(explicit: Option<&Path>) -> Result<GateConfig> {
    match explicit {
        Some(path) => GateConfig::from_file(path)
            .into_diagnostic()
            .wrap_err_with(|| format!("failed to load config {}", path.display())),
        None => {
            let default_path = Path::new(DEFAULT_CONFIG);
            if default_path.exists() {
                GateConfig::from_file(default_path)
                    .into_diagnostic()
                    .wrap_err("failed to load .licensegate.toml")
            } else {
                Ok(GateConfig::default())
            }
        }
    }
}

fn check(cli: &Cli, config: &GateConfig) -> Result<ComplianceReport> {
    let input = read_patch(&cli.patch)?;
    let changes = parse_patch(&input);

    let ignore_file = cli.ignore_file.as_deref().unwrap_or(config.ignore_file.as_path());
    let exclusion = PathExclusion::from_file(ignore_file)
        .into_diagnostic()
        .wrap_err_with(|| format!("invalid exclusion file {}", ignore_file.display()))?;
    let (changes, excluded) = exclusion.retain(changes);
    if !excluded.is_empty() {
        tracing::info!(count = excluded.len(), "files excluded from checks");
    }

    let oracle = ScancodeOracle::new(&config.oracle);
    let policy = LicensePolicy::new(config.allowed_licenses(&cli.project), &config.license);
    let license_issues = LicenseAnalyzer::new(policy, &oracle)
        .run(&changes)
        .into_diagnostic()
        .wrap_err("license check failed")?;
    let copyright_issues = CopyrightAnalyzer::new(&config.copyright).run(&changes);

    Ok(ComplianceReport::merge(license_issues, copyright_issues))
}

fn read_patch(path: &Path) -> Result<String> {
    if !path.exists() {
        return Err(GateError::FileNotFound(path.to_path_buf())).into_diagnostic();
    }
    let bytes = std::fs::read(path)
        .into_diagnostic()
        .wrap_err_with(|| format!("failed to read {}", path.display()))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}
