//! Anvil CLI - Command-line interface for CodeAnvil
//!
//! Commands:
//! - report: Compute activity metrics from a fetched event feed
//! - validate: Validate raw commit event schema
//! - doctor: Diagnose inputs and configuration
//! - schema: Print input/output schema information

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{debug, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use codeanvil::adapters::{EventFeedAdapter, GitHubCommitsAdapter, GitHubEventsAdapter};
use codeanvil::encoder::{render_text, REPORT_VERSION};
use codeanvil::schema::{RawEventAdapter, SCHEMA_VERSION};
use codeanvil::types::ActivityReport;
use codeanvil::window::DEFAULT_WINDOW_DAYS;
use codeanvil::{ActivityProcessor, ActivityWindow, ComputeError, ANVIL_VERSION, PRODUCER_NAME};

/// Anvil - Activity and regularity metrics from commit streams
#[derive(Parser)]
#[command(name = "anvil")]
#[command(version = ANVIL_VERSION)]
#[command(about = "Derive activity metrics from developer commit events", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute activity metrics from a fetched event feed
    Report {
        /// Input file path(s), newest page first (use - for stdin)
        #[arg(short, long, required = true, num_args = 1..)]
        input: Vec<PathBuf>,

        /// Output file path (use - for stdout)
        #[arg(short, long, default_value = "-")]
        output: PathBuf,

        /// Feed format of the input
        #[arg(long, default_value = "github-events")]
        feed: Feed,

        /// Account whose activity is measured
        #[arg(long, env = "GITHUB_USER", default_value = "unknown")]
        subject: String,

        /// Trailing window(s) in days, e.g. --window-days 7,30
        #[arg(long, env = "SINCE_DAYS", value_delimiter = ',', default_values_t = [DEFAULT_WINDOW_DAYS])]
        window_days: Vec<u32>,

        /// Reference time the windows end at (RFC 3339, defaults to now)
        #[arg(long)]
        now: Option<String>,

        /// Repository name for the github-commits feed
        #[arg(long)]
        repository: Option<String>,

        /// Output format
        #[arg(long, default_value = "text")]
        output_format: OutputFormat,
    },

    /// Validate raw commit event schema
    Validate {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Input format
        #[arg(long, default_value = "ndjson")]
        input_format: InputFormat,

        /// Output validation report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Diagnose inputs and configuration
    Doctor {
        /// Check an input feed file
        #[arg(long)]
        input: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print schema information
    Schema {
        /// Schema to print (input or output)
        #[arg(value_enum)]
        schema_type: SchemaType,

        /// Output as JSON schema
        #[arg(long)]
        json_schema: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Feed {
    /// GitHub `/users/{user}/events` pages
    GithubEvents,
    /// GitHub `/repos/{owner}/{repo}/commits` pages
    GithubCommits,
    /// commit.raw_event.v1 records (NDJSON or JSON array)
    Raw,
}

#[derive(Clone, ValueEnum)]
enum InputFormat {
    /// Newline-delimited JSON (one event per line)
    Ndjson,
    /// JSON array of events
    Json,
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Plain-text summary
    Text,
    /// Newline-delimited JSON (one report per line)
    Ndjson,
    /// JSON array of reports
    Json,
    /// Pretty-printed JSON
    JsonPretty,
}

#[derive(Clone, ValueEnum)]
enum SchemaType {
    /// Input schema (commit.raw_event.v1)
    Input,
    /// Output schema (activity report)
    Output,
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliError::from(e))
                    .unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("codeanvil=warn,anvil=warn"));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

fn run(cli: Cli) -> Result<(), AnvilCliError> {
    match cli.command {
        Commands::Report {
            input,
            output,
            feed,
            subject,
            window_days,
            now,
            repository,
            output_format,
        } => {
            let options = ReportOptions {
                feed,
                subject,
                window_days,
                now,
                repository,
            };
            cmd_report(&input, &output, &options, output_format)
        }

        Commands::Validate {
            input,
            input_format,
            json,
        } => cmd_validate(&input, input_format, json),

        Commands::Doctor { input, json } => cmd_doctor(input.as_deref(), json),

        Commands::Schema {
            schema_type,
            json_schema,
        } => cmd_schema(schema_type, json_schema),
    }
}

struct ReportOptions {
    feed: Feed,
    subject: String,
    window_days: Vec<u32>,
    now: Option<String>,
    repository: Option<String>,
}

fn cmd_report(
    inputs: &[PathBuf],
    output: &Path,
    options: &ReportOptions,
    output_format: OutputFormat,
) -> Result<(), AnvilCliError> {
    let now = match &options.now {
        Some(ts) => DateTime::parse_from_rfc3339(ts)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| AnvilCliError::InvalidArgument(format!("--now {ts}: {e}")))?,
        None => Utc::now(),
    };

    let pages = inputs
        .iter()
        .map(|path| read_input(path))
        .collect::<Result<Vec<_>, _>>()?;
    let page_refs: Vec<&str> = pages.iter().map(String::as_str).collect();

    let processor = ActivityProcessor::new();
    let mut reports: Vec<ActivityReport> = Vec::with_capacity(options.window_days.len());
    let mut quiet_windows: Vec<u32> = Vec::new();

    for &days in &options.window_days {
        let window = ActivityWindow::ending_at(options.subject.as_str(), days, now)?;
        let events = collect_events(options, &page_refs, &window)?;
        debug!(window_days = days, commits = events.len(), "collected events");
        match processor.report_events(&events, &window) {
            Ok(report) => reports.push(report),
            Err(ComputeError::EmptySeries) => quiet_windows.push(days),
            Err(e) => return Err(e.into()),
        }
    }

    if reports.is_empty() {
        return Err(AnvilCliError::NoCommits);
    }
    for days in quiet_windows {
        warn!(window_days = days, "no commits in window");
        eprintln!("{}", serde_json::to_string(&CliError::no_commits(Some(days)))?);
    }

    let output_data = match output_format {
        OutputFormat::Text => reports
            .iter()
            .map(render_text)
            .collect::<Vec<_>>()
            .join("\n"),
        OutputFormat::Ndjson => {
            let mut lines: Vec<String> = Vec::new();
            for report in &reports {
                lines.push(serde_json::to_string(report)?);
            }
            lines.join("\n") + "\n"
        }
        OutputFormat::Json => serde_json::to_string(&reports)?,
        OutputFormat::JsonPretty => serde_json::to_string_pretty(&reports)?,
    };

    if output.to_string_lossy() == "-" {
        print!("{}", output_data);
    } else {
        fs::write(output, output_data)?;
    }

    Ok(())
}

fn collect_events(
    options: &ReportOptions,
    pages: &[&str],
    window: &ActivityWindow,
) -> Result<Vec<codeanvil::CommitEvent>, AnvilCliError> {
    match options.feed {
        Feed::GithubEvents => Ok(GitHubEventsAdapter.parse_pages(pages, window)?),
        Feed::GithubCommits => {
            let repository = options.repository.clone().ok_or_else(|| {
                AnvilCliError::InvalidArgument(
                    "--repository is required for the github-commits feed".to_string(),
                )
            })?;
            parse_each(&GitHubCommitsAdapter::new(repository), pages, window)
        }
        Feed::Raw => parse_each(&RawEventAdapter, pages, window),
    }
}

fn parse_each(
    adapter: &dyn EventFeedAdapter,
    pages: &[&str],
    window: &ActivityWindow,
) -> Result<Vec<codeanvil::CommitEvent>, AnvilCliError> {
    let mut events = Vec::new();
    for page in pages {
        events.extend(adapter.parse(page, window)?);
    }
    Ok(events)
}

fn cmd_validate(input: &Path, input_format: InputFormat, json: bool) -> Result<(), AnvilCliError> {
    let input_data = read_input(input)?;

    let events = match input_format {
        InputFormat::Ndjson => RawEventAdapter::parse_ndjson(&input_data)?,
        InputFormat::Json => RawEventAdapter::parse_array(&input_data)?,
    };

    let results = RawEventAdapter::validate_events(&events);

    let report = ValidationReport {
        total_events: events.len(),
        valid_events: events.len() - results.len(),
        invalid_events: results.len(),
        errors: results
            .iter()
            .map(|r| ValidationErrorDetail {
                index: r.index,
                event_id: r.event_id.clone(),
                error: r.result.as_ref().map(|e| e.to_string()).unwrap_or_default(),
            })
            .collect(),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Validation Report");
        println!("=================");
        println!("Total events:   {}", report.total_events);
        println!("Valid events:   {}", report.valid_events);
        println!("Invalid events: {}", report.invalid_events);

        if !report.errors.is_empty() {
            println!("\nErrors:");
            for err in &report.errors {
                println!(
                    "  - Event {} (index {}): {}",
                    err.event_id.as_deref().unwrap_or("unknown"),
                    err.index,
                    err.error
                );
            }
        }
    }

    if report.invalid_events > 0 {
        Err(AnvilCliError::ValidationFailed(report.invalid_events))
    } else {
        Ok(())
    }
}

fn cmd_doctor(input: Option<&Path>, json: bool) -> Result<(), AnvilCliError> {
    let mut checks: Vec<DoctorCheck> = vec![
        DoctorCheck {
            name: "anvil_version".to_string(),
            status: CheckStatus::Ok,
            message: format!("Anvil version {}", ANVIL_VERSION),
        },
        DoctorCheck {
            name: "schema_version".to_string(),
            status: CheckStatus::Ok,
            message: format!("Input schema: {}", SCHEMA_VERSION),
        },
    ];

    checks.push(match std::env::var("GITHUB_USER") {
        Ok(user) if !user.trim().is_empty() => DoctorCheck {
            name: "subject".to_string(),
            status: CheckStatus::Ok,
            message: format!("GITHUB_USER is set ({user})"),
        },
        _ => DoctorCheck {
            name: "subject".to_string(),
            status: CheckStatus::Warning,
            message: "GITHUB_USER is not set; pass --subject to name reports".to_string(),
        },
    });

    if let Some(input_path) = input {
        checks.push(check_input(input_path));
    }

    let stdin_check = if atty::is(atty::Stream::Stdin) {
        DoctorCheck {
            name: "stdin".to_string(),
            status: CheckStatus::Ok,
            message: "stdin is a TTY (pass --input <file>)".to_string(),
        }
    } else {
        DoctorCheck {
            name: "stdin".to_string(),
            status: CheckStatus::Ok,
            message: "stdin is a pipe (--input - ready)".to_string(),
        }
    };
    checks.push(stdin_check);

    let report = DoctorReport {
        producer: PRODUCER_NAME.to_string(),
        version: ANVIL_VERSION.to_string(),
        checks,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Anvil Doctor Report");
        println!("===================");
        println!("Producer: {}", report.producer);
        println!("Version:  {}", report.version);
        println!("\nChecks:");

        for check in &report.checks {
            let status_icon = match check.status {
                CheckStatus::Ok => "[OK]",
                CheckStatus::Warning => "[WARN]",
                CheckStatus::Error => "[ERR]",
            };
            println!("  {} {}: {}", status_icon, check.name, check.message);
        }
    }

    let has_errors = report
        .checks
        .iter()
        .any(|c| matches!(c.status, CheckStatus::Error));
    if has_errors {
        Err(AnvilCliError::DoctorFailed)
    } else {
        Ok(())
    }
}

fn check_input(path: &Path) -> DoctorCheck {
    if !path.exists() {
        return DoctorCheck {
            name: "input".to_string(),
            status: CheckStatus::Warning,
            message: "Input file does not exist".to_string(),
        };
    }

    match fs::read_to_string(path) {
        Ok(content) => match serde_json::from_str::<Vec<serde_json::Value>>(&content) {
            Ok(items) => {
                let pushes = items
                    .iter()
                    .filter(|v| v.get("type").and_then(|t| t.as_str()) == Some("PushEvent"))
                    .count();
                DoctorCheck {
                    name: "input".to_string(),
                    status: CheckStatus::Ok,
                    message: format!("JSON array with {} items ({} push events)", items.len(), pushes),
                }
            }
            Err(_) => match RawEventAdapter::parse_ndjson(&content) {
                Ok(events) => DoctorCheck {
                    name: "input".to_string(),
                    status: CheckStatus::Ok,
                    message: format!("NDJSON with {} raw commit events", events.len()),
                },
                Err(e) => DoctorCheck {
                    name: "input".to_string(),
                    status: CheckStatus::Error,
                    message: format!("Unrecognized input: {}", e),
                },
            },
        },
        Err(e) => DoctorCheck {
            name: "input".to_string(),
            status: CheckStatus::Error,
            message: format!("Cannot read input file: {}", e),
        },
    }
}

fn cmd_schema(schema_type: SchemaType, json_schema: bool) -> Result<(), AnvilCliError> {
    match schema_type {
        SchemaType::Input => {
            if json_schema {
                println!("{}", get_input_json_schema());
            } else {
                println!("Input Schema: {}", SCHEMA_VERSION);
                println!();
                println!("One record per commit:");
                println!("- schema_version: \"{}\"", SCHEMA_VERSION);
                println!("- timestamp: commit time (RFC 3339)");
                println!("- repository: repository name");
                println!("- event_id, sha, author: optional");
                println!();
                println!("Also accepted by `anvil report --feed`:");
                println!("- github-events: /users/{{user}}/events pages (PushEvent commits)");
                println!("- github-commits: /repos/{{owner}}/{{repo}}/commits pages");
            }
        }
        SchemaType::Output => {
            if json_schema {
                println!("{}", get_output_json_schema());
            } else {
                println!("Output Schema: activity report {}", REPORT_VERSION);
                println!();
                println!("- producer: {{ name, version, instance_id }}");
                println!("- subject, window_days, window_start_utc, computed_at_utc");
                println!("- totals: {{ commits, active_days, repositories }}");
                println!("- metrics: {{ pulse, activity_heat, strikes, consistency_score }}");
                println!("  strikes is null with fewer than two active days");
                println!("- repositories: commits per repository");
                println!("- daily: [{{ date, commits, commit_speed, commit_energy, time_gap }}]");
            }
        }
    }

    Ok(())
}

// Helper functions

fn read_input(input: &Path) -> Result<String, AnvilCliError> {
    if input.to_string_lossy() == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        Ok(fs::read_to_string(input)?)
    }
}

fn get_input_json_schema() -> String {
    serde_json::json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "title": SCHEMA_VERSION,
        "description": "CodeAnvil raw commit event schema",
        "type": "object",
        "required": ["schema_version", "timestamp", "repository"],
        "properties": {
            "schema_version": { "type": "string", "const": SCHEMA_VERSION },
            "event_id": { "type": "string" },
            "timestamp": { "type": "string", "format": "date-time" },
            "repository": { "type": "string", "minLength": 1 },
            "sha": { "type": "string" },
            "author": { "type": "string" }
        }
    })
    .to_string()
}

fn get_output_json_schema() -> String {
    serde_json::json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "title": "activity report",
        "description": "CodeAnvil activity report",
        "type": "object",
        "required": ["report_version", "producer", "subject", "window_days", "metrics", "daily"],
        "properties": {
            "report_version": { "type": "string" },
            "producer": {
                "type": "object",
                "properties": {
                    "name": { "type": "string" },
                    "version": { "type": "string" },
                    "instance_id": { "type": "string" }
                }
            },
            "subject": { "type": "string" },
            "window_days": { "type": "integer", "minimum": 1 },
            "window_start_utc": { "type": "string" },
            "computed_at_utc": { "type": "string" },
            "totals": {
                "type": "object",
                "properties": {
                    "commits": { "type": "integer" },
                    "active_days": { "type": "integer" },
                    "repositories": { "type": "integer" }
                }
            },
            "metrics": {
                "type": "object",
                "properties": {
                    "pulse": { "type": "number" },
                    "activity_heat": { "type": "number" },
                    "strikes": { "type": ["number", "null"] },
                    "consistency_score": { "type": "number", "exclusiveMinimum": 0, "maximum": 50 }
                }
            },
            "repositories": {
                "type": "object",
                "additionalProperties": { "type": "integer" }
            },
            "daily": {
                "type": "array",
                "items": { "type": "object" }
            }
        }
    })
    .to_string()
}

// Error types

#[derive(Debug)]
enum AnvilCliError {
    Io(io::Error),
    Compute(ComputeError),
    Json(serde_json::Error),
    NoCommits,
    ValidationFailed(usize),
    DoctorFailed,
    InvalidArgument(String),
}

impl From<io::Error> for AnvilCliError {
    fn from(e: io::Error) -> Self {
        AnvilCliError::Io(e)
    }
}

impl From<ComputeError> for AnvilCliError {
    fn from(e: ComputeError) -> Self {
        match e {
            ComputeError::EmptySeries => AnvilCliError::NoCommits,
            other => AnvilCliError::Compute(other),
        }
    }
}

impl From<serde_json::Error> for AnvilCliError {
    fn from(e: serde_json::Error) -> Self {
        AnvilCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl CliError {
    fn no_commits(window_days: Option<u32>) -> Self {
        let message = match window_days {
            Some(days) => format!("No commits in the requested period (last {days} days)"),
            None => "No commits in the requested period".to_string(),
        };
        CliError {
            code: "NO_COMMITS".to_string(),
            message,
            hint: Some("Widen --window-days or check --now".to_string()),
        }
    }
}

impl From<AnvilCliError> for CliError {
    fn from(e: AnvilCliError) -> Self {
        match e {
            AnvilCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            AnvilCliError::Compute(e) => CliError {
                code: "COMPUTE_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check that --feed matches the input".to_string()),
            },
            AnvilCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            AnvilCliError::NoCommits => CliError::no_commits(None),
            AnvilCliError::ValidationFailed(count) => CliError {
                code: "VALIDATION_FAILED".to_string(),
                message: format!("{} events failed validation", count),
                hint: Some("Fix validation errors and retry".to_string()),
            },
            AnvilCliError::DoctorFailed => CliError {
                code: "DOCTOR_FAILED".to_string(),
                message: "One or more health checks failed".to_string(),
                hint: Some("Review the doctor report for details".to_string()),
            },
            AnvilCliError::InvalidArgument(msg) => CliError {
                code: "INVALID_ARGUMENT".to_string(),
                message: msg,
                hint: Some("Run 'anvil report --help'".to_string()),
            },
        }
    }
}

// Report types

#[derive(serde::Serialize)]
struct ValidationReport {
    total_events: usize,
    valid_events: usize,
    invalid_events: usize,
    errors: Vec<ValidationErrorDetail>,
}

#[derive(serde::Serialize)]
struct ValidationErrorDetail {
    index: usize,
    event_id: Option<String>,
    error: String,
}

#[derive(serde::Serialize)]
struct DoctorReport {
    producer: String,
    version: String,
    checks: Vec<DoctorCheck>,
}

#[derive(serde::Serialize)]
struct DoctorCheck {
    name: String,
    status: CheckStatus,
    message: String,
}

#[derive(serde::Serialize)]
enum CheckStatus {
    Ok,
    Warning,
    Error,
}
