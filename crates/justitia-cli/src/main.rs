use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use justitia_core::ValidationConfig;
use justitia_core::load::load_policy;
use justitia_core::report::render;
use justitia_core::rules::catalog::MatchOptions;
use justitia_core::suite::runner::{Parallelism, RunOptions};

mod args;

use args::{Command, MatchArgs, OutputFormat, TestArgs};

/// Exit code for load, parse and configuration errors.
const EXIT_ERROR: u8 = 2;

fn init_logging(verbose: bool, json: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_env("JUSTITIA_LOG").unwrap_or_else(|_| EnvFilter::new(default));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn match_options(args: &MatchArgs) -> MatchOptions {
    MatchOptions {
        case_insensitive: !args.case_sensitive,
        multi_line: !args.single_line,
        ..Default::default()
    }
}

fn run_tests(args: TestArgs) -> Result<ExitCode> {
    let parallelism = match (args.sequential, args.threads) {
        (true, _) => Parallelism::Sequential,
        (false, Some(n)) => Parallelism::Threads(n),
        (false, None) => Parallelism::Auto,
    };
    let config = ValidationConfig {
        matching: match_options(&args.matching),
        run: RunOptions {
            parallelism,
            ..Default::default()
        },
    };

    let report = justitia_core::validate_files(&args.policy, &args.cases, &config)?;

    let output = match args.format {
        OutputFormat::Json => serde_json::to_string_pretty(&report)?,
        OutputFormat::Text => render::render_text(&report),
    };

    match args.out {
        Some(path) => {
            std::fs::write(&path, &output)
                .with_context(|| format!("failed to write report: {}", path.display()))?;
            tracing::info!(path = %path.display(), "report written");
        }
        None => print!("{output}"),
    }

    if report.all_passed() {
        Ok(ExitCode::SUCCESS)
    } else {
        tracing::warn!(failed = report.fail_count, "some test cases failed");
        Ok(ExitCode::FAILURE)
    }
}

fn check_policy(policy: &std::path::Path, matching: &MatchArgs) -> Result<ExitCode> {
    let policy = load_policy(policy, &match_options(matching))?;
    println!(
        "policy ok: {} v{} ({} rules)",
        policy.domain,
        policy.version,
        policy.len()
    );
    Ok(ExitCode::SUCCESS)
}

fn main() -> ExitCode {
    let args = args::Args::parse();
    init_logging(args.verbose, args.log_json);

    let result = match args.command {
        Command::Test(test) => run_tests(test),
        Command::Check { policy, matching } => check_policy(&policy, &matching),
    };

    match result {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::from(EXIT_ERROR)
        }
    }
}
