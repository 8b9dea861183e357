mod logging;
mod params;
mod settings;

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use fauxdata_generate::{Template, TemplateError, resolve_named};
use thiserror::Error;
use tracing::info;

use logging::init_logging;
use params::{ParamError, Params, parse_param_line, parse_params};
use settings::{Settings, SettingsError, load_settings};

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Settings(#[from] SettingsError),
    #[error(transparent)]
    Params(#[from] ParamError),
    #[error(transparent)]
    Template(#[from] TemplateError),
    #[error("failed to initialise logging: {0}")]
    Logging(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to write report: {0}")]
    Report(#[from] serde_json::Error),
    #[error("{0} table(s) failed")]
    TablesFailed(usize),
}

#[derive(Parser, Debug)]
#[command(name = "fauxdata", version, about = "Generate fake tabular data from YAML templates")]
struct Cli {
    /// Settings file; defaults to ./fauxdata.toml when present.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Log at debug level unless RUST_LOG is set.
    #[arg(long, global = true, default_value_t = false)]
    debug: bool,
    /// Emit logs as JSON lines.
    #[arg(long, global = true, default_value_t = false)]
    log_json: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the resolved variables and the rendered template.
    Render(TemplateArgs),
    /// Generate every table and print its first rows.
    Sample(SampleArgs),
    /// Generate every table and write it to its targets.
    Run(RunArgs),
}

#[derive(Args, Debug)]
struct TemplateArgs {
    /// Template path, or a name under the configured template directory.
    template: String,
    /// Template parameters: --key value, --key=value or --flag.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true, value_name = "PARAMS")]
    params: Vec<String>,
}

#[derive(Args, Debug)]
struct SampleArgs {
    /// Rows printed per table.
    #[arg(long, default_value_t = 10)]
    rows: usize,
    #[command(flatten)]
    template: TemplateArgs,
}

#[derive(Args, Debug)]
struct RunArgs {
    /// Write a JSON run report to this path.
    #[arg(long, value_name = "PATH")]
    report: Option<PathBuf>,
    #[command(flatten)]
    template: TemplateArgs,
}

fn main() -> ExitCode {
    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let settings = load_settings(cli.config.as_deref())?;
    let template_args = match &cli.command {
        Command::Render(args) => args,
        Command::Sample(args) => &args.template,
        Command::Run(args) => &args.template,
    };
    let params = resolve_params(&settings, &template_args.params)?;
    init_logging(cli.debug || params.debug, cli.log_json || settings.log_json)?;

    let path = template_path(&template_args.template, &settings);
    match cli.command {
        Command::Render(_) => render(&path, &params),
        Command::Sample(args) => sample(&path, &params, &settings, args.rows),
        Command::Run(args) => run_template(&path, &params, &settings, args.report.as_deref()),
    }
}

fn resolve_params(settings: &Settings, args: &[String]) -> Result<Params, CliError> {
    let defaults = match &settings.params {
        Some(line) => parse_param_line(line)?,
        None => Params::default(),
    };
    Ok(defaults.merge(parse_params(args)?))
}

fn template_path(template: &str, settings: &Settings) -> PathBuf {
    let path = Path::new(template);
    match &settings.template_dir {
        Some(dir) if !path.is_file() => resolve_named(dir, template),
        _ => path.to_path_buf(),
    }
}

fn load_template(path: &Path, params: &Params, settings: &Settings) -> Result<Template, CliError> {
    let template = Template::from_file(path, &params.variables)?;
    Ok(match params.seed.or(settings.seed) {
        Some(seed) => template.with_seed(seed),
        None => template,
    })
}

fn render(path: &Path, params: &Params) -> Result<(), CliError> {
    let rendered = Template::render_file(path, &params.variables)?;
    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "# variables")?;
    writeln!(stdout, "{}", serde_json::to_string_pretty(&rendered.variables)?)?;
    writeln!(stdout, "# template")?;
    writeln!(stdout, "{}", rendered.text)?;
    Ok(())
}

fn sample(path: &Path, params: &Params, settings: &Settings, rows: usize) -> Result<(), CliError> {
    let template = load_template(path, params, settings)?;
    let report = template.generate();
    let mut stdout = std::io::stdout().lock();
    for outcome in &report.outcomes {
        match &outcome.result {
            Ok(table) => {
                writeln!(stdout, "[{}] {} rows", table.name, table.frame.height())?;
                writeln!(stdout, "{}", table.frame.head(rows))?;
            }
            Err(err) => writeln!(stdout, "[{}] failed: {err}", outcome.table)?,
        }
    }
    finish(&report)
}

fn run_template(
    path: &Path,
    params: &Params,
    settings: &Settings,
    report_path: Option<&Path>,
) -> Result<(), CliError> {
    let template = load_template(path, params, settings)?;
    let report = template.run();
    print!("{}", report.result());
    if let Some(report_path) = report_path {
        std::fs::write(report_path, serde_json::to_vec_pretty(&report.summary())?)?;
        info!(path = %report_path.display(), "run report written");
    }
    finish(&report)
}

fn finish(report: &fauxdata_generate::RunReport) -> Result<(), CliError> {
    match report.failed().count() {
        0 => Ok(()),
        failed => Err(CliError::TablesFailed(failed)),
    }
}
