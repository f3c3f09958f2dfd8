use clap::Parser;
use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, Color, ContentArrangement, Table};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::process::exit;
use std::str::FromStr;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;
use strum_macros::{Display, EnumString};
use tlsnamecheck::config::{Config, DEFAULT_CONFIG_FILE};
use tlsnamecheck::{
    Connector, IssuerOrdered, OpenSslConnector, PeerOutputConnector, TLSValidationError,
    TlsSession, ValidationReport, Validator,
};
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

/// Checks that the TLS certificate served by each URL is valid for its hostname
#[derive(Parser, Debug)]
#[command(name = "tlsnamecheck", version, author, about, long_about = None)]
struct Args {
    /// HTTPS URLs to check, e.g. https://example.com
    urls: Vec<String>,

    /// Output format: json, text, summary
    #[arg(short, long)]
    output: Option<String>,

    /// Exit code used when any URL fails validation
    #[arg(long)]
    exit_code: Option<i32>,

    /// PEM bundle used as the only trusted root authority
    #[arg(long = "ca-file")]
    ca_file: Option<String>,

    /// Connect and read timeout in seconds
    #[arg(long)]
    timeout: Option<u64>,

    /// Validate against captured `openssl s_client -showcerts` output instead of connecting
    #[arg(long)]
    peer_output: Option<PathBuf>,

    /// Configuration file (defaults to ./tlsnamecheck.toml when present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print an example configuration file and exit
    #[arg(long)]
    generate_config: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
enum OutputFormat {
    Json,
    Text,
    Summary,
}

/// Where certificates come from for every URL of one run.
#[derive(Debug, Clone)]
enum Source {
    Network(OpenSslConnector),
    Captured(PeerOutputConnector),
}

impl Connector for Source {
    fn handshake(
        &self,
        host: &str,
        port: u16,
        trusted_ca_file: Option<&Path>,
    ) -> Result<TlsSession, TLSValidationError> {
        match self {
            Source::Network(connector) => connector.handshake(host, port, trusted_ca_file),
            Source::Captured(connector) => connector.handshake(host, port, trusted_ca_file),
        }
    }
}

#[derive(Debug, Serialize)]
struct Outcome {
    #[serde(skip_serializing)]
    index: usize,
    url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    report: Option<ValidationReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl Outcome {
    fn passed(&self) -> bool {
        self.report
            .as_ref()
            .map_or(false, |report| report.valid_for_hostname)
    }
}

fn main() {
    let args = Args::parse();

    if args.generate_config {
        println!("{}", Config::example_toml());
        exit(0);
    }

    let config = match load_config(&args) {
        Ok(config) => config,
        Err(message) => {
            eprintln!("{}", message);
            exit(2);
        }
    };

    init_logging(args.verbose, config.log_level.as_deref().unwrap_or("warn"));

    let output = config.output.as_deref().unwrap_or("summary");
    let format = match OutputFormat::from_str(output) {
        Ok(format) => format,
        Err(e) => {
            error!(output, "unknown output format: {}", e);
            exit(2);
        }
    };
    debug!(%format, "output format selected");

    let source = match &args.peer_output {
        Some(path) => match PeerOutputConnector::from_file(path) {
            Ok(connector) => Source::Captured(connector),
            Err(e) => {
                error!("{}", e);
                exit(2);
            }
        },
        None => Source::Network(OpenSslConnector::new(Duration::from_secs(
            config.timeout_secs.unwrap_or(tlsnamecheck::session::DEFAULT_TIMEOUT),
        ))),
    };

    let urls = config.urls.clone().unwrap_or_default();
    let outcomes = check_all(urls, source, config.trusted_ca_file.clone());

    match format {
        OutputFormat::Json => match serde_json::to_string_pretty(&outcomes) {
            Ok(json) => println!("{}", json),
            Err(e) => error!("failed to render json: {}", e),
        },
        OutputFormat::Text => print_text(&outcomes),
        OutputFormat::Summary => print_summary(&outcomes),
    }

    let failures = outcomes.iter().filter(|outcome| !outcome.passed()).count();
    let exit_code = config.exit_code.unwrap_or(0);
    if failures > 0 && exit_code != 0 {
        info!(failures, exit_code, "some URLs failed validation");
        exit(exit_code);
    }
    exit(0);
}

fn load_config(args: &Args) -> Result<Config, String> {
    let mut config = Config::default();

    let file = match &args.config {
        Some(path) => Some(path.clone()),
        None if Path::new(DEFAULT_CONFIG_FILE).is_file() => {
            Some(PathBuf::from(DEFAULT_CONFIG_FILE))
        }
        None => None,
    };
    if let Some(path) = file {
        let from_file = Config::from_file(&path)
            .map_err(|e| format!("Failed to load {}: {}", path.display(), e))?;
        config = config.merge_with(from_file);
    }

    let from_cli = Config {
        urls: if args.urls.is_empty() {
            None
        } else {
            Some(args.urls.clone())
        },
        output: args.output.clone(),
        exit_code: args.exit_code,
        trusted_ca_file: args.ca_file.clone(),
        timeout_secs: args.timeout,
        log_level: None,
    };
    let config = config.merge_with(from_cli);
    config.validate().map_err(|e| e.to_string())?;
    Ok(config)
}

fn init_logging(verbose: bool, level: &str) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Validates every URL on its own thread, each with its own validator.
fn check_all(urls: Vec<String>, source: Source, trusted_ca_file: Option<String>) -> Vec<Outcome> {
    let (sender, receiver) = mpsc::channel::<Outcome>();
    for (index, url) in urls.into_iter().enumerate() {
        let thread_tx = sender.clone();
        let source = source.clone();
        let trusted_ca_file = trusted_ca_file.clone();
        thread::spawn(move || {
            let outcome = match check(&url, source, trusted_ca_file) {
                Ok(report) => Outcome {
                    index,
                    url,
                    report: Some(report),
                    error: None,
                },
                Err(e) => {
                    error!(%url, "check failed: {}", e);
                    Outcome {
                        index,
                        url,
                        report: None,
                        error: Some(e.to_string()),
                    }
                }
            };
            if thread_tx.send(outcome).is_err() {
                error!("result receiver went away");
            }
        });
    }
    drop(sender);

    let mut outcomes: Vec<Outcome> = receiver.iter().collect();
    outcomes.sort_by_key(|outcome| outcome.index);
    outcomes
}

fn check(
    url: &str,
    source: Source,
    trusted_ca_file: Option<String>,
) -> Result<ValidationReport, TLSValidationError> {
    let mut validator = Validator::with_connector(url, source)?;
    if let Some(file) = trusted_ca_file {
        validator.set_trusted_ca_file(file);
    }
    let report = validator.report(&IssuerOrdered)?;
    debug!(
        url,
        valid = report.valid_for_hostname,
        trusted = report.trusted,
        "checked"
    );
    Ok(report)
}

fn print_text(outcomes: &[Outcome]) {
    for outcome in outcomes {
        println!("--------------------------------------");
        println!("URL: {}", outcome.url);
        let report = match &outcome.report {
            Some(report) => report,
            None => {
                println!("Error: {}", outcome.error.as_deref().unwrap_or("unknown"));
                continue;
            }
        };
        let cert = &report.certificate;
        println!("Hostname: {}:{}", report.hostname, report.port);
        println!("Valid for hostname: {}", report.valid_for_hostname);
        println!("Trusted: {} ({})", report.trusted, report.verify_result);
        println!("Subject: {}", cert.subject);
        println!("Issuer: {}", cert.issuer);
        println!(
            "Valid from: {}",
            cert.not_before.as_deref().unwrap_or("unknown")
        );
        println!("Valid to: {}", cert.not_after.as_deref().unwrap_or("unknown"));
        println!("Days left: {}", cert.validity_days);
        println!("Expired: {}", cert.is_expired);
        println!("Certificate version: {}", cert.cert_ver);
        println!("Certificate algorithm: {}", cert.cert_alg);
        println!("Certificate S/N: {}", cert.cert_sn);
        if let Some(cipher) = &report.cipher {
            println!("Cipher: {} ({})", cipher.name, cipher.version);
        }
        println!("Valid host names:");
        for name in &cert.valid_host_names {
            println!("\t{}", name);
        }
        println!("Chain:");
        for (depth, link) in report.chain.iter().enumerate() {
            println!("\t{} s:{}", depth, link.subject);
            println!("\t  i:{}", link.issuer);
        }
    }
}

fn print_summary(outcomes: &[Outcome]) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            "URL",
            "Hostname",
            "Valid for host",
            "Trusted",
            "Issuer",
            "Days left",
            "Error",
        ]);

    for outcome in outcomes {
        match &outcome.report {
            Some(report) => {
                let valid = if report.valid_for_hostname {
                    Cell::new("yes").fg(Color::Green)
                } else {
                    Cell::new("no").fg(Color::Red)
                };
                table.add_row(vec![
                    Cell::new(&outcome.url),
                    Cell::new(&report.hostname),
                    valid,
                    Cell::new(report.trusted),
                    Cell::new(&report.certificate.issuer_cn),
                    Cell::new(report.certificate.validity_days),
                    Cell::new(""),
                ]);
            }
            None => {
                table.add_row(vec![
                    Cell::new(&outcome.url),
                    Cell::new(""),
                    Cell::new("no").fg(Color::Red),
                    Cell::new(""),
                    Cell::new(""),
                    Cell::new(""),
                    Cell::new(outcome.error.as_deref().unwrap_or("")).fg(Color::Red),
                ]);
            }
        }
    }

    println!("{table}");
}
