// readmegen/src/commands.rs

use anyhow::{
    Context,
    Result
};
use clap::{
    Args,
    Parser,
    Subcommand
};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;
use crate::{
    backend,
    config::{
        BackendKind,
        Settings
    },
    prompt,
    sample::{
        self,
        Excerpt
    },
    scan::{
        self,
        ScanResult
    },
    util,
    writeback,
};

/// Scan a project and generate its README with a local or cloud text model.
#[derive(Parser, Debug)]
#[command(name = "readmegen", version, about)]
pub struct Cli {
    /// More log output on stderr (-v info, -vv debug, -vvv trace). RUST_LOG wins.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Scan the project and print what was found
    Scan {
        #[command(flatten)]
        target: Target,
        /// Print the full scan result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the prompt that would be sent to the model
    Prompt {
        #[command(flatten)]
        target: Target,
        /// Free-text notes about the project, passed to the model verbatim
        #[arg(long, default_value = "")]
        context: String,
    },
    /// Scan, ask the model for a README and write it
    Generate {
        #[command(flatten)]
        target: Target,
        #[arg(long, default_value = "")]
        context: String,
        /// Backend to call: ollama or gemini
        #[arg(long)]
        backend: Option<BackendKind>,
        /// Model name for the chosen backend
        #[arg(long)]
        model: Option<String>,
        /// Output document, relative to the project root
        #[arg(long)]
        output: Option<String>,
        /// Build the prompt and stop before calling the model
        #[arg(long)]
        dry_run: bool,
    },
}

/// Project selection shared by every command.
#[derive(Args, Debug, Clone)]
pub struct Target {
    /// Project root
    #[arg(default_value = ".")]
    pub path: PathBuf,
    /// Extra directory name to ignore (repeatable)
    #[arg(long = "ignore-dir", value_name = "NAME")]
    pub ignore_dirs: Vec<String>,
    /// Extra file name to ignore (repeatable)
    #[arg(long = "ignore-file", value_name = "NAME")]
    pub ignore_files: Vec<String>,
    /// Also skip what the root .gitignore ignores
    #[arg(long)]
    pub gitignore: bool,
    /// Settings file (default: <root>/readmegen.toml when present)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

pub fn run_cli() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Command::Scan { target, json } => run_scan(&target, json),
        Command::Prompt { target, context } => {
            let (_, scan) = settings_and_scan(&target)?;
            let (_, text) = assemble(&target, &scan, &context)?;
            println!("{text}");
            Ok(())
        }
        Command::Generate { target, context, backend, model, output, dry_run } => {
            let (mut settings, scan) = settings_and_scan(&target)?;
            if let Some(b) = backend { settings.backend = b; }
            if let Some(m) = model { settings.set_model(m); }
            if let Some(o) = output { settings.output = o; }
            run_generate(&target, &settings, &scan, &context, dry_run)
        }
    }
}

/// Settings (file < env < flags) and the scan they configure.
fn settings_and_scan(target: &Target) -> Result<(Settings, ScanResult)> {
    let mut settings = Settings::load(&target.path, target.config.as_deref())?;
    settings.ignored_directories.extend(target.ignore_dirs.iter().cloned());
    settings.ignored_files.extend(target.ignore_files.iter().cloned());
    settings.respect_gitignore |= target.gitignore;

    let scan = scan::scan_with(&target.path, &settings.scan_config())
        .with_context(|| format!("scanning {}", target.path.display()))?;
    Ok((settings, scan))
}

fn assemble(target: &Target, scan: &ScanResult, context: &str) -> Result<(Vec<Excerpt>, String)> {
    let excerpts = sample::select_samples(&scan.contents, scan.project_type, &scan.language_tags);
    let text = prompt::build_prompt(&util::project_name(&target.path), scan, &excerpts, context)
        .context("assembling prompt")?;
    Ok((excerpts, text))
}

fn run_scan(target: &Target, json: bool) -> Result<()> {
    let (_, scan) = settings_and_scan(target)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&scan).context("serializing scan result")?);
        return Ok(());
    }
    let tags: Vec<&str> = scan.language_tags.iter().map(String::as_str).collect();
    println!("Project:      {}", util::project_name(&target.path));
    println!("Type:         {}", scan.project_type);
    println!("Tags:         {}", if tags.is_empty() { "-".to_string() } else { tags.join(", ") });
    println!("Directories:  {}", scan.directories.len());
    println!("Files:        {} ({} with content)", scan.files.len(), scan.contents.len());
    println!("Fingerprint:  {}", scan.fingerprint());
    Ok(())
}

fn run_generate(target: &Target, settings: &Settings, scan: &ScanResult, context: &str, dry_run: bool) -> Result<()> {
    let (excerpts, text) = assemble(target, scan, context)?;
    info!(excerpts = excerpts.len(), prompt_bytes = text.len(), "prompt assembled");
    if dry_run {
        println!("Dry run: prompt is {} bytes with {} excerpts; nothing sent.", text.len(), excerpts.len());
        return Ok(());
    }

    let generator = backend::from_settings(settings)?;
    println!("Generating with {} ({})…", generator.name(), generator.model());
    let readme = generator.generate(&text)?;

    let written = writeback::write_readme(&target.path, &settings.output, &readme)?;
    if let Some(old) = &written.archived {
        println!("Previous document archived to {}", old.display());
    }
    println!("README written to {}", written.path.display());
    Ok(())
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(format!("readmegen={level}")));
    // A second init (tests, embedding) keeps the first subscriber.
    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
