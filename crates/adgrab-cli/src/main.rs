//! AdGrab CLI - download the photos of a classified ad

use adgrab::{conversion_available, ConversionPolicy, GrabError, GrabReport, Grabber};
use clap::{Parser, ValueEnum};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Prompt shown when no URL is given on the command line
const PROMPT: &str = "Paste OLX Ad URL: ";

/// Output format for the final report
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
enum OutputFormat {
    /// Short human-readable summary
    #[default]
    Text,
    /// Full report as JSON
    Json,
}

/// AdGrab - download and normalize the photos of a classified ad
#[derive(Parser, Debug)]
#[command(name = "adgrab")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Ad URL; prompts on stdin when omitted
    url: Option<String>,

    /// Root folder for ad folders (default: ~/Downloads)
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Do not save the title/description file
    #[arg(long)]
    no_metadata: bool,

    /// Abort if images cannot be converted to JPEG
    #[arg(long)]
    require_conversion: bool,

    /// Custom User-Agent
    #[arg(long)]
    user_agent: Option<String>,

    /// Report format
    #[arg(long, short, default_value = "text")]
    output: OutputFormat,
}

#[tokio::main]
async fn main() {
    init_logging();
    let cli = Cli::parse();

    if let Err(e) = check_conversion_support(&cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    let url = match cli.url.clone() {
        Some(url) => url,
        None => match prompt_url() {
            Ok(url) => url,
            Err(e) => {
                eprintln!("Error reading URL: {}", e);
                std::process::exit(1);
            }
        },
    };

    let url = url.trim();
    if url.is_empty() {
        return;
    }

    let grabber = build_grabber(&cli);
    match grabber.run(url).await {
        Ok(report) => print_report(&report, cli.output),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

/// Log to stderr, `RUST_LOG` overrides the default `info` level
fn init_logging() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(io::stderr)
        .with_target(false)
        .without_time()
        .init();
}

/// Fail before prompting when `--require-conversion` cannot be honored
fn check_conversion_support(cli: &Cli) -> Result<(), GrabError> {
    if cli.require_conversion && !conversion_available() {
        return Err(GrabError::ConversionUnavailable);
    }
    Ok(())
}

fn build_grabber(cli: &Cli) -> Grabber {
    let mut builder = Grabber::builder().scrape_metadata(!cli.no_metadata);

    if cli.require_conversion {
        builder = builder.conversion(ConversionPolicy::Required);
    }
    if let Some(ref dir) = cli.output_dir {
        builder = builder.output_root(dir.clone());
    }
    if let Some(ref ua) = cli.user_agent {
        builder = builder.user_agent(ua.clone());
    }

    builder.build()
}

fn prompt_url() -> io::Result<String> {
    let mut stdout = io::stdout();
    write!(stdout, "{}", PROMPT)?;
    stdout.flush()?;

    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line)
}

fn print_report(report: &GrabReport, output: OutputFormat) {
    match output {
        OutputFormat::Text => writeln_safe(&format_summary(report)),
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(report).unwrap_or_else(|e| {
                eprintln!("Error serializing report: {}", e);
                std::process::exit(1);
            });
            writeln_safe(&json);
        }
    }
}

/// Human-readable end-of-run summary
fn format_summary(report: &GrabReport) -> String {
    let mut output = String::new();

    output.push_str(&format!(
        "Saved {} of {} images",
        report.saved_count(),
        report.found
    ));
    if !report.downloads.failed.is_empty() {
        output.push_str(&format!(" ({} failed)", report.downloads.failed.len()));
    }
    output.push('\n');

    if let Some(ref conversion) = report.conversion {
        if !conversion.failed.is_empty() {
            output.push_str(&format!(
                "{} file(s) kept in original format\n",
                conversion.failed.len()
            ));
        }
    }

    if report.saved_count() > 0 {
        output.push_str(&format!(
            "\nSUCCESS! Images saved to:\n{}",
            report.folder.display()
        ));
    } else {
        output.push_str(&format!("Folder: {}", report.folder.display()));
    }

    output
}

/// Write to stdout, exit silently on broken pipe
fn writeln_safe(s: &str) {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    if let Err(e) = writeln!(handle, "{}", s) {
        if e.kind() == io::ErrorKind::BrokenPipe {
            std::process::exit(0);
        }
        eprintln!("Error writing to stdout: {}", e);
        std::process::exit(1);
    }
}
