//! Gatera CLI binary entry point.
//! Resolves configuration, runs the gates, prints results, and exits.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;

use gatera::cli::{Cli, Commands};
use gatera::config::{self, RunOptions};
use gatera::files::{changed_python_files, DiffRange};
use gatera::orchestrator::{exit_code, run_all};
use gatera::{output, report, tests_runner, utils};

fn main() -> ExitCode {
    let cli = Cli::parse();
    match cli.cmd {
        Commands::Version => {
            println!("{}", env!("CARGO_PKG_VERSION"));
            ExitCode::SUCCESS
        }
        Commands::Check {
            repo_root,
            min_cov,
            no_min_cov,
            output: output_mode,
            timeout_secs,
            diff,
            coverage_xml,
            sarif,
            report: report_path,
            run_tests,
            no_parallel,
        } => {
            // The only place process environment is consulted.
            let opts = RunOptions::from_env();
            let eff = config::resolve_effective(
                repo_root.as_deref(),
                min_cov,
                no_min_cov,
                output_mode.as_deref(),
                timeout_secs,
            );
            if eff.output != "json" && config::load_config(&eff.repo_root).is_none() {
                eprintln!(
                    "{} {}",
                    utils::note_prefix(),
                    "No gatera.toml found; using defaults."
                );
            }

            let range = match diff.as_deref() {
                Some(raw) => match DiffRange::parse(raw) {
                    Some(r) => Some(r),
                    None => {
                        eprintln!(
                            "{} {}",
                            utils::error_prefix(),
                            "--diff expects base...head (e.g. origin/main...HEAD)"
                        );
                        return ExitCode::from(2);
                    }
                },
                None => None,
            };
            let files = changed_python_files(&eff.repo_root, range.as_ref());

            let tests_gate = if run_tests {
                if eff.output != "json" {
                    eprintln!(
                        "{} {}",
                        utils::info_prefix(),
                        "Running tests with coverage..."
                    );
                }
                Some(tests_runner::run_pytest_with_coverage(
                    &eff.repo_root,
                    eff.timeout,
                ))
            } else {
                None
            };

            let coverage_path = coverage_xml.map(PathBuf::from);
            let mut outcome = match run_all(
                &files,
                &eff,
                &opts,
                coverage_path.as_deref(),
                !no_parallel,
            ) {
                Ok(outcome) => outcome,
                Err(err) => {
                    eprintln!("{} {}", utils::error_prefix(), err);
                    return ExitCode::from(2);
                }
            };
            if let Some(gate) = tests_gate {
                outcome.gates.push(gate);
            }

            output::print_summary(&outcome, &eff.output);

            if let Some(path) = sarif.as_deref().map(Path::new) {
                if let Err(err) = report::write_sarif(path, &outcome.gates, &outcome.findings) {
                    eprintln!(
                        "{} {}",
                        utils::error_prefix(),
                        format!("could not write {}: {}", utils::rel_to_wd(path), err)
                    );
                    return ExitCode::from(2);
                }
            }
            if let Some(path) = report_path.as_deref().map(Path::new) {
                if let Err(err) = report::write_json_report(path, &outcome.gates, &outcome.findings)
                {
                    eprintln!(
                        "{} {}",
                        utils::error_prefix(),
                        format!("could not write {}: {}", utils::rel_to_wd(path), err)
                    );
                    return ExitCode::from(2);
                }
            }

            ExitCode::from(exit_code(&outcome.gates) as u8)
        }
    }
}
