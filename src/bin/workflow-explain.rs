//! Workflow Explain CLI
//!
//! Command-line interface for validating experiment descriptions and
//! inspecting their schemas.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use workflow_explain::{
    extract_by_reference, load_document, load_document_auto, validate_workflow, ValidateError,
};

#[derive(Parser)]
#[command(name = "workflow-explain")]
#[command(about = "Validate experiment descriptions with readable error messages")]
#[command(version)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate an experiment description against a schema
    Validate {
        /// Experiment description file (JSON, or YAML with .yaml/.yml)
        workflow: PathBuf,

        /// Schema source: file path or URL (http:// or https://)
        #[arg(long)]
        schema: String,

        /// Output results as JSON (for automation)
        #[arg(long)]
        json: bool,
    },

    /// Print the sub-schema a reference points to, following $ref links
    Extract {
        /// Schema source: file path or URL (http:// or https://)
        schema: String,

        /// Local reference to extract (e.g. "#/definitions/task")
        #[arg(long, default_value = "#")]
        pointer: String,

        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Validate {
            workflow,
            schema,
            json,
        } => run_validate(&workflow, &schema, json),
        Commands::Extract {
            schema,
            pointer,
            pretty,
        } => run_extract(&schema, &pointer, pretty),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(code) => ExitCode::from(code),
    }
}

fn run_validate(workflow_path: &Path, schema_source: &str, json_output: bool) -> Result<(), u8> {
    let workflow = load_document(workflow_path).map_err(|e| {
        report_error(json_output, &format!("loading workflow: {}", e));
        e.exit_code() as u8
    })?;

    let schema = load_document_auto(schema_source).map_err(|e| {
        report_error(json_output, &format!("loading schema: {}", e));
        e.exit_code() as u8
    })?;

    match validate_workflow(&schema, &workflow) {
        Ok(()) => {
            if json_output {
                println!(r#"{{"valid":true}}"#);
            } else {
                println!("Valid");
            }
            Ok(())
        }
        Err(ValidateError::Invalid { failures, message }) => {
            if json_output {
                let output = serde_json::json!({
                    "valid": false,
                    "message": message,
                    "failures": failures
                });
                println!("{}", output);
            } else {
                eprintln!("Validation failed:\n");
                eprintln!("{}", message);
            }
            Err(1)
        }
        Err(e) => {
            report_error(json_output, &e.to_string());
            Err(e.exit_code() as u8)
        }
    }
}

fn run_extract(schema_source: &str, pointer: &str, pretty: bool) -> Result<(), u8> {
    let schema = load_document_auto(schema_source).map_err(|e| {
        eprintln!("Error: {}", e);
        e.exit_code() as u8
    })?;

    let sub_schema = extract_by_reference(pointer, &schema).map_err(|e| {
        eprintln!("Error: {}", e);
        e.exit_code() as u8
    })?;

    let output = if pretty {
        serde_json::to_string_pretty(sub_schema)
    } else {
        serde_json::to_string(sub_schema)
    }
    .map_err(|e| {
        eprintln!("Error serializing output: {}", e);
        2u8
    })?;

    println!("{}", output);
    Ok(())
}

/// Output an error message in plain text or JSON format.
fn report_error(json_output: bool, msg: &str) {
    if json_output {
        println!("{}", serde_json::json!({ "valid": false, "error": msg }));
    } else {
        eprintln!("Error: {}", msg);
    }
}
