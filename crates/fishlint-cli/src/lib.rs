//! fishlint-cli: check fish scripts from the command line.
//!
//! ```bash
//! fishlint config.fish functions/*.fish
//! cat script.fish | fishlint --autoload-name mkcd
//! fishlint --format json --disable privateHelperFunction conf.d/
//! ```
//!
//! A directory stands for every `*.fish` file below it, honoring ignore
//! files. Every input gets its own pass. Text output prints one block per
//! diagnostic as `path:line:col: severity [code]: message` followed by the
//! offending line. The exit status is 1 when any reported diagnostic is an
//! error.

use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use ignore::WalkBuilder;
use owo_colors::OwoColorize;
use serde::Serialize;

use fishlint_kernel::syntax::sexpr;
use fishlint_kernel::{diagnose, parse, Diagnostic, Document, ErrorCode, LintConfig, Severity};

/// Label used for standard input.
const STDIN_LABEL: &str = "<stdin>";

/// Command-line arguments.
#[derive(Debug, Parser)]
#[command(name = "fishlint", version, about = "Diagnostics for fish shell scripts")]
pub struct Args {
    /// Scripts or directories to check. Reads standard input when empty or `-`.
    pub paths: Vec<PathBuf>,

    /// Check every input as an autoloaded file expected to define NAME.
    #[arg(long, value_name = "NAME")]
    pub autoload_name: Option<String>,

    /// Output format.
    #[arg(long, value_enum, default_value_t = Format::Text)]
    pub format: Format,

    /// Config file to use instead of the discovered one.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Stop reporting CODE, by name or number. Repeatable.
    #[arg(long, value_name = "CODE")]
    pub disable: Vec<ErrorCode>,

    /// Print the syntax tree of each input instead of checking it.
    #[arg(long)]
    pub dump_tree: bool,

    /// Never color text output.
    #[arg(long)]
    pub no_color: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    Text,
    Json,
}

/// One script to check.
#[derive(Debug)]
pub struct Input {
    pub label: String,
    pub source: String,
    pub document: Document,
}

/// The outcome of checking one input.
#[derive(Debug, Serialize)]
pub struct FileReport {
    pub path: String,
    pub diagnostics: Vec<Diagnostic>,
}

impl FileReport {
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == Severity::Error)
    }
}

/// Run the CLI and pick the process exit status.
pub fn run(args: Args) -> Result<ExitCode> {
    let inputs = read_inputs(&args)?;

    if args.dump_tree {
        for input in &inputs {
            println!("{}", dump_tree(&input.source)?);
        }
        return Ok(ExitCode::SUCCESS);
    }

    let config = load_config(&args)?;
    let reports = inputs
        .iter()
        .map(|input| check(input, &config))
        .collect::<Result<Vec<_>>>()?;

    match args.format {
        Format::Text => {
            let color = !args.no_color && use_color();
            for (input, report) in inputs.iter().zip(&reports) {
                print!("{}", render_text(report, &input.source, color));
            }
            if let Some(line) = summary(&reports) {
                eprintln!("{line}");
            }
        }
        Format::Json => {
            println!("{}", serde_json::to_string_pretty(&reports)?);
        }
    }

    if reports.iter().any(FileReport::has_errors) {
        Ok(ExitCode::from(1))
    } else {
        Ok(ExitCode::SUCCESS)
    }
}

/// Read every input named on the command line.
pub fn read_inputs(args: &Args) -> Result<Vec<Input>> {
    let stdin_only = [PathBuf::from("-")];
    let paths: &[PathBuf] = if args.paths.is_empty() {
        &stdin_only
    } else {
        &args.paths
    };

    let mut scripts = Vec::new();
    for path in paths {
        scripts.extend(expand(path)?);
    }

    scripts
        .iter()
        .map(|path| -> Result<Input> {
            let (label, source, document) = if path.as_os_str() == "-" {
                let source = std::io::read_to_string(std::io::stdin())
                    .context("Failed to read standard input")?;
                (STDIN_LABEL.to_string(), source, Document::anonymous())
            } else {
                let source = std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read {}", path.display()))?;
                (path.display().to_string(), source, Document::from_path(path))
            };
            let document = match &args.autoload_name {
                Some(name) => document.with_autoload_name(name.as_str()),
                None => document,
            };
            Ok(Input {
                label,
                source,
                document,
            })
        })
        .collect()
}

/// A directory becomes the `*.fish` files below it, in path order. Anything
/// else is passed through untouched.
fn expand(path: &Path) -> Result<Vec<PathBuf>> {
    if !path.is_dir() {
        return Ok(vec![path.to_path_buf()]);
    }

    let mut scripts = Vec::new();
    for entry in WalkBuilder::new(path).build() {
        let entry = entry.with_context(|| format!("Failed to walk {}", path.display()))?;
        let is_script = entry.file_type().is_some_and(|t| t.is_file())
            && entry.path().extension().is_some_and(|ext| ext == "fish");
        if is_script {
            scripts.push(entry.into_path());
        }
    }
    scripts.sort();
    tracing::debug!(dir = %path.display(), count = scripts.len(), "expanded directory");
    Ok(scripts)
}

/// The explicit config file, or the one discovered from the working
/// directory, with `--disable` layered on top.
pub fn load_config(args: &Args) -> Result<LintConfig> {
    let base = match &args.config {
        Some(path) => LintConfig::load_from(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => {
            let cwd = std::env::current_dir().context("Failed to read working directory")?;
            discover_config(&cwd)?
        }
    };
    Ok(args
        .disable
        .iter()
        .fold(base, |config, code| config.with_disabled(*code)))
}

fn discover_config(dir: &Path) -> Result<LintConfig> {
    LintConfig::discover(dir)
        .with_context(|| format!("Failed to load config for {}", dir.display()))
}

/// Parse and check one input, then apply the config.
pub fn check(input: &Input, config: &LintConfig) -> Result<FileReport> {
    let tree = parse(&input.source).with_context(|| format!("Failed to parse {}", input.label))?;
    let diagnostics = diagnose(&tree, &input.document)
        .with_context(|| format!("Failed to check {}", input.label))?;
    tracing::debug!(path = %input.label, count = diagnostics.len(), "checked");

    Ok(FileReport {
        path: input.label.clone(),
        diagnostics: config.apply(diagnostics),
    })
}

/// S-expression dump of a script's syntax tree.
pub fn dump_tree(source: &str) -> Result<String> {
    let tree = parse(source)?;
    let root = tree.require_root()?;
    Ok(sexpr::format(root))
}

/// Text rendering of one report. The header line is colored by severity.
pub fn render_text(report: &FileReport, source: &str, color: bool) -> String {
    let mut out = String::new();
    for diagnostic in &report.diagnostics {
        let formatted = diagnostic.format(source);
        let (header, context) = match formatted.split_once('\n') {
            Some((header, context)) => (header, Some(context)),
            None => (formatted.as_str(), None),
        };
        let header = format!("{}:{}", report.path, header);

        if color {
            out.push_str(&paint(&header, diagnostic.severity));
        } else {
            out.push_str(&header);
        }
        out.push('\n');
        if let Some(context) = context {
            out.push_str(context);
            out.push('\n');
        }
    }
    out
}

fn paint(text: &str, severity: Severity) -> String {
    match severity {
        Severity::Error => text.red().bold().to_string(),
        Severity::Warning => text.yellow().to_string(),
        Severity::Info => text.blue().to_string(),
    }
}

/// `N problems (E errors, W warnings, I infos)`, or nothing when clean.
pub fn summary(reports: &[FileReport]) -> Option<String> {
    let all: Vec<&Diagnostic> = reports.iter().flat_map(|r| &r.diagnostics).collect();
    if all.is_empty() {
        return None;
    }
    let count = |severity: Severity| all.iter().filter(|d| d.severity == severity).count();
    Some(format!(
        "{} problem{} ({} errors, {} warnings, {} infos)",
        all.len(),
        if all.len() == 1 { "" } else { "s" },
        count(Severity::Error),
        count(Severity::Warning),
        count(Severity::Info),
    ))
}

/// Color only on a terminal that wants it.
fn use_color() -> bool {
    if std::env::var_os("NO_COLOR").is_some() {
        return false;
    }
    if std::env::var("TERM").map(|t| t == "dumb").unwrap_or(false) {
        return false;
    }
    std::io::stdout().is_terminal()
}
