//! Subcommand execution: read inputs, run the engine, write outputs.

use std::path::Path;

use pogkit_recon::report::{issues_csv, skipped_csv};
use pogkit_recon::{
    run, AddTarget, BundleKind, CreateTarget, EngineConfig, OperationRequest, OperationResult, Severity,
};

use crate::exit_codes::{EXIT_ERROR, EXIT_ISSUES, EXIT_OP_FAILED};
use crate::{CliError, Commands, OutputArgs};

pub fn dispatch(config: &EngineConfig, command: Commands) -> Result<(), CliError> {
    let (request, out) = match command {
        Commands::CreateBundles { table, out } => (
            OperationRequest::CreateBundle { target: CreateTarget::Services, table: read_input(&table)? },
            out,
        ),
        Commands::AddEntries { archive, table, out } => (
            OperationRequest::AddEntries {
                target: AddTarget::Services,
                archive: read_input(&archive)?,
                table: read_input(&table)?,
            },
            out,
        ),
        Commands::ExpireEntries { archive, table, out } => (
            OperationRequest::ExpireEntries {
                kind: BundleKind::Service,
                archive: read_input(&archive)?,
                table: read_input(&table)?,
            },
            out,
        ),
        Commands::ExpireAndAdd { archive, expire, add, out } => (
            OperationRequest::CombinedExpireAdd {
                archive: read_input(&archive)?,
                expire_table: read_input(&expire)?,
                add_table: read_input(&add)?,
            },
            out,
        ),
        Commands::CreateTransition { table, name, id, out } => (
            OperationRequest::CreateBundle {
                target: CreateTarget::Transition { name, id },
                table: read_input(&table)?,
            },
            out,
        ),
        Commands::AddTransition { archive, table, offer_id, out } => (
            OperationRequest::AddEntries {
                target: AddTarget::Transitions { offer_id },
                archive: read_input(&archive)?,
                table: read_input(&table)?,
            },
            out,
        ),
        Commands::ExpireTransition { archive, table, out } => (
            OperationRequest::ExpireEntries {
                kind: BundleKind::Transition,
                archive: read_input(&archive)?,
                table: read_input(&table)?,
            },
            out,
        ),
        Commands::Categories { table, out } => (
            OperationRequest::GenerateCategories { table: read_input(&table)? },
            out,
        ),
    };

    let result = run(config, &request);
    log::debug!("{}: {} issue(s)", request.name(), result.issues.len());
    emit(request.name(), &result, &out)?;
    exit_status(&result)
}

fn read_input(path: &Path) -> Result<Vec<u8>, CliError> {
    std::fs::read(path).map_err(|e| CliError::io(format!("cannot read {}: {e}", path.display())))
}

fn write_output(path: &Path, bytes: &[u8]) -> Result<(), CliError> {
    std::fs::write(path, bytes).map_err(|e| CliError::io(format!("cannot write {}: {e}", path.display())))?;
    eprintln!("wrote {}", path.display());
    Ok(())
}

/// Write requested files, print JSON to stdout and a summary to stderr.
fn emit(operation: &str, result: &OperationResult, out: &OutputArgs) -> Result<(), CliError> {
    if let Some(path) = &out.issues {
        let csv = issues_csv(&result.issues).map_err(|e| report_error(path, e))?;
        write_output(path, &csv)?;
    }
    if let Some(path) = &out.skipped {
        let skipped = result.details.as_ref().map(|d| d.all()).unwrap_or_default();
        let csv = skipped_csv(&skipped).map_err(|e| report_error(path, e))?;
        write_output(path, &csv)?;
    }

    match (&result.archive, &out.output) {
        (Some(archive), Some(path)) => write_output(path, archive)?,
        (Some(_), None) => eprintln!("note: archive not saved (pass -o/--output)"),
        (None, _) => {}
    }

    if out.json {
        let json = serde_json::to_string_pretty(result)
            .map_err(|e| CliError::new(EXIT_ERROR, format!("JSON serialization error: {e}")))?;
        println!("{json}");
    }

    print_summary(operation, result);
    Ok(())
}

fn report_error(path: &Path, err: impl std::fmt::Display) -> CliError {
    CliError::new(EXIT_ERROR, format!("cannot build report {}: {err}", path.display()))
}

fn print_summary(operation: &str, result: &OperationResult) {
    eprintln!("{operation}: {}", result.msg);
    for (key, value) in &result.counts {
        eprintln!("  {key}: {value}");
    }

    for issue in result.issues.iter().filter(|i| i.severity != Severity::Info) {
        let mut line = format!("  [{}] {}: {}", issue.severity, issue.kind, issue.message);
        if let Some(path) = &issue.file_path {
            line.push_str(&format!(" ({path})"));
        }
        if let Some(row) = issue.row_number {
            line.push_str(&format!(" (row {row})"));
        }
        eprintln!("{line}");
    }

    let (errors, warnings, infos) = result.severity_counts();
    eprintln!("issues: {errors} errors, {warnings} warnings, {infos} infos");
}

fn exit_status(result: &OperationResult) -> Result<(), CliError> {
    if !result.ok {
        return Err(CliError::new(EXIT_OP_FAILED, result.msg.clone())
            .with_hint("see --issues or --json for details"));
    }
    if result.has_errors() {
        let (errors, _, _) = result.severity_counts();
        return Err(CliError::new(EXIT_ISSUES, format!("completed with {errors} error issue(s)")));
    }
    Ok(())
}
