//! apicontract CLI - contract tests from specification response examples

mod storage;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use apicontract_core::config::DEFAULT_CONFIG_FILES;
use apicontract_core::verdict::{EXIT_PASS, EXIT_TOOL};
use apicontract_core::{Config, RunReport, synthesize};
use apicontract_runner::{ContractRunner, load_spec};

#[derive(Parser)]
#[command(name = "apicontract")]
#[command(about = "Contract tests derived from OpenAPI/Swagger response examples")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, global = true, default_value = "terminal")]
    output: OutputFormat,

    /// Verbose output (every case, debug logs)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run contract tests against a live service
    Run {
        /// Config file (default: .apicontract.toml)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Override the spec path from config
        #[arg(long)]
        spec: Option<PathBuf>,

        /// Override the base URL from config
        #[arg(long)]
        base_url: Option<String>,

        /// Write summary, outcomes and reproductions here
        #[arg(long)]
        report_dir: Option<PathBuf>,

        /// Worker threads
        #[arg(short, long, default_value_t = 1)]
        jobs: usize,

        /// Stop on first failure (fast-fail for CI)
        #[arg(long)]
        stop_on_failure: bool,

        /// Only run cases whose operation or description contains this
        #[arg(long)]
        filter: Option<String>,
    },

    /// List the synthesized test cases without sending requests
    List {
        /// Config file (default: .apicontract.toml)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Override the spec path from config
        #[arg(long)]
        spec: Option<PathBuf>,

        /// Only list cases whose operation or description contains this
        #[arg(long)]
        filter: Option<String>,
    },

    /// Initialize config file
    Init,

    /// Check config and spec
    Doctor,

    /// Export JSON Schema for the run report
    Schema,
}

#[derive(Clone, Copy, ValueEnum, PartialEq, Eq)]
enum OutputFormat {
    Terminal,
    Json,
    Silent,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.output);

    match run(cli) {
        Ok(code) => ExitCode::from(u8::try_from(code).unwrap_or(1)),
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::from(3)
        }
    }
}

/// Logs go to stderr; `RUST_LOG` wins over the flags.
fn init_tracing(verbose: bool, output: OutputFormat) {
    let default = if verbose {
        "apicontract=debug,apicontract_core=debug,apicontract_runner=debug"
    } else if output == OutputFormat::Silent {
        "error"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn load_config(path: Option<&Path>, spec: Option<PathBuf>) -> Result<Config> {
    let mut cfg = match path {
        Some(p) => Config::load(p)?,
        None => Config::load_default()?,
    };
    if let Some(spec) = spec {
        cfg.spec = spec;
    }
    Ok(cfg)
}

fn run(cli: Cli) -> Result<i32> {
    match cli.command {
        Commands::Run {
            config,
            spec,
            base_url,
            report_dir,
            jobs,
            stop_on_failure,
            filter,
        } => {
            let mut cfg = load_config(config.as_deref(), spec)?;
            if let Some(url) = base_url {
                cfg.base_url = url;
            }

            if cli.output != OutputFormat::Silent {
                eprintln!("Config:");
                eprintln!("  spec:     {}", cfg.spec.display());
                eprintln!("  base_url: {}", cfg.base_url);
                if !cfg.headers.is_empty() {
                    eprintln!("  headers:  {} configured", cfg.headers.len());
                }
                eprintln!();
            }

            let report = ContractRunner::from_config(&cfg)
                .with_jobs(jobs)
                .with_stop_on_failure(stop_on_failure)
                .with_filter(filter)
                .run()?;

            match cli.output {
                OutputFormat::Terminal => print_terminal(&report, cli.verbose),
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
                OutputFormat::Silent => {}
            }

            if let Some(dir) = report_dir.or_else(|| cfg.report_dir.clone()) {
                match storage::save_run(&cfg, &report, &dir) {
                    Ok(saved) => {
                        if cli.output != OutputFormat::Silent {
                            eprintln!(
                                "Report saved: {} ({} operation files)",
                                saved.index.report_dir.display(),
                                saved.index.files.len()
                            );
                            if let Some(path) = saved.reproductions {
                                eprintln!("Reproductions: {}", path.display());
                            }
                        }
                    }
                    Err(e) => eprintln!("Warning: failed to save report: {e:#}"),
                }
            }

            Ok(report.verdict.exit_code)
        }

        Commands::List {
            config,
            spec,
            filter,
        } => {
            let cfg = load_config(config.as_deref(), spec)?;
            let plan = ContractRunner::from_config(&cfg)
                .with_filter(filter)
                .plan(&cfg)?;
            match cli.output {
                OutputFormat::Terminal => println!("{}", plan.to_terminal()),
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&plan)?),
                OutputFormat::Silent => {}
            }
            Ok(if plan.has_errors() { EXIT_TOOL } else { EXIT_PASS })
        }

        Commands::Init => {
            let config_path = ".apicontract.toml";
            if Path::new(config_path).exists() {
                eprintln!("{config_path} already exists");
                return Ok(1);
            }

            std::fs::write(config_path, Config::example())?;
            println!("Created {config_path}");
            println!("\nEdit the file to configure:");
            println!("  - spec: path to your specification document");
            println!("  - base_url: server to test");
            println!("  - headers: auth tokens, API keys");
            Ok(EXIT_PASS)
        }

        Commands::Doctor => {
            println!("apicontract doctor");
            println!("==================\n");

            let found = DEFAULT_CONFIG_FILES
                .iter()
                .find(|name| Path::new(name).exists());
            println!(
                "[{}] Config file ({})",
                if found.is_some() { "OK" } else { "--" },
                found.unwrap_or(&DEFAULT_CONFIG_FILES[0])
            );
            let cfg = match Config::load_default() {
                Ok(cfg) => cfg,
                Err(e) => {
                    println!("[NG] Config: {e}");
                    return Ok(EXIT_TOOL);
                }
            };

            if !cfg.spec.exists() {
                println!("[NG] Spec file ({}) not found", cfg.spec.display());
                if found.is_none() {
                    println!("\nCreate config file:");
                    println!("  apicontract init");
                }
                return Ok(EXIT_TOOL);
            }
            println!("[OK] Spec file ({})", cfg.spec.display());

            let synthesized = load_spec(&cfg.spec)
                .map_err(anyhow::Error::from)
                .and_then(|spec| synthesize(&spec).map_err(anyhow::Error::from));
            match synthesized {
                Ok(cases) => println!("[OK] {} test cases synthesized", cases.len()),
                Err(e) => {
                    println!("[NG] Synthesis: {e:#}");
                    return Ok(EXIT_TOOL);
                }
            }

            println!("\nReady to run!");
            Ok(EXIT_PASS)
        }

        Commands::Schema => {
            let schema = apicontract_core::report::generate_schema();
            println!("{schema}");
            Ok(EXIT_PASS)
        }
    }
}

fn print_terminal(report: &RunReport, verbose: bool) {
    if verbose {
        for outcome in &report.outcomes {
            let mark = if outcome.passed() { "PASS" } else { "FAIL" };
            println!("  [{}] {mark}  {}", outcome.case_id, outcome.description);
        }
    }

    let failures: Vec<_> = report.failures().collect();
    if !failures.is_empty() {
        println!("\nFailures ({}):", failures.len());
        for outcome in &failures {
            let reason = outcome
                .failure
                .as_ref()
                .map(ToString::to_string)
                .unwrap_or_default();
            println!(
                "  [{}] {} {} -> {reason}",
                outcome.case_id, outcome.request.method, outcome.request.url
            );
            println!("         {}", outcome.description);
        }
    }

    println!("\n{}: {}", report.verdict.status, report.verdict.reason);
    println!(
        "  Cases: {} total, {} passed, {} failed, {} transport errors ({:.2}s)",
        report.stats.total,
        report.stats.passed,
        report.stats.failed,
        report.stats.transport_errors,
        report.duration_secs
    );
    println!("  Exit code: {}", report.verdict.exit_code);
}
