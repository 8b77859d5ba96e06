//! The `promote` command.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::sync::Once;

use sel_ir::Program;
use sel_promote::{promote, PassOutcome};

use crate::options::PromoteOptions;
use crate::{EXIT_FAILURE, EXIT_USAGE};

static TRACING_INIT: Once = Once::new();

/// Initialize the hierarchical tracing subscriber.
///
/// Safe to call multiple times. Without `--verbose`, only initialized
/// when `RUST_LOG` is set.
fn init_tracing(verbose: bool) {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{prelude::*, EnvFilter};

        let filter = if verbose {
            EnvFilter::new("sel_promote=debug,sel_ir=debug,selc=debug")
        } else if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            return;
        };
        tracing_subscriber::registry()
            .with(tracing_tree::HierarchicalLayer::new(2).with_targets(true))
            .with(filter)
            .init();
    });
}

/// Run the promotion pass over an on-disk program snapshot.
///
/// Returns the process exit code.
pub fn run_promote(args: &[String]) -> i32 {
    let options = match crate::options::parse_promote_options(args) {
        Ok(options) => options,
        Err(message) => {
            eprintln!("error: {message}");
            print_promote_usage();
            return EXIT_USAGE;
        }
    };
    init_tracing(options.verbose);

    let program = match read_program(&options) {
        Ok(program) => program,
        Err(message) => {
            eprintln!("error: {message}");
            return EXIT_FAILURE;
        }
    };

    let PassOutcome { program, report } = match promote(&program, &options.config) {
        Ok(outcome) => outcome,
        Err(error) => {
            eprintln!("error: {error}");
            return EXIT_FAILURE;
        }
    };
    tracing::debug!(
        promoted = report.total_promoted(),
        generations = report.generations.len(),
        "promotion finished"
    );

    if !options.quiet {
        print!("{report}");
        println!(
            "promoted {} function(s) across {} generation(s)",
            report.total_promoted(),
            report.generations.len(),
        );
    }

    if let Some(path) = &options.output {
        if let Err(message) = write_program(path, &program) {
            eprintln!("error: {message}");
            return EXIT_FAILURE;
        }
    }
    0
}

fn read_program(options: &PromoteOptions) -> Result<Program, String> {
    let file = File::open(&options.input)
        .map_err(|e| format!("cannot open {}: {e}", options.input.display()))?;
    bincode::deserialize_from(BufReader::new(file))
        .map_err(|e| format!("cannot decode {}: {e}", options.input.display()))
}

fn write_program(path: &std::path::Path, program: &Program) -> Result<(), String> {
    let file =
        File::create(path).map_err(|e| format!("cannot create {}: {e}", path.display()))?;
    bincode::serialize_into(BufWriter::new(file), program)
        .map_err(|e| format!("cannot encode {}: {e}", path.display()))
}

/// Usage text for the `promote` command.
pub fn print_promote_usage() {
    eprintln!("Usage: sel-opt promote <program.selir> [options]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  -o <path>                Write the rewritten program here");
    eprintln!("  --no-promote             Disable the pass; the snapshot passes through");
    eprintln!("  --quiet                  Suppress the diagnostic report");
    eprintln!("  --max-variants=<n>       Variant cap per function (default 8)");
    eprintln!("  --max-growth=<bytes>     Estimated growth budget (default 16384)");
    eprintln!("  --promote-full-domains   Promote even fully-observed domains");
    eprintln!("  --report-address-taken   Report address-taken distinctly from exported");
    eprintln!("  --threads=<n>            Worker threads (default: all cores)");
    eprintln!("  -v, --verbose            Hierarchical pass tracing");
}
