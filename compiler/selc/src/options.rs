//! Option parsing for the `promote` command.

use std::path::PathBuf;

use sel_promote::PromoteConfig;

/// Parsed options for `sel-opt promote`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PromoteOptions {
    /// Input program snapshot.
    pub input: PathBuf,
    /// Where to write the rewritten program (omitted: analysis only).
    pub output: Option<PathBuf>,
    /// Pass configuration assembled from the flags.
    pub config: PromoteConfig,
    /// Install the hierarchical tracing subscriber.
    pub verbose: bool,
    /// Suppress the diagnostic report on stdout.
    pub quiet: bool,
}

/// Parse arguments following the `promote` subcommand.
///
/// Accepts `-o <path>` (with lookahead), `--no-promote`, `--verbose`/`-v`,
/// `--quiet`, `--report-address-taken`, `--promote-full-domains`,
/// `--max-variants=<n>`, `--max-growth=<bytes>`, and `--threads=<n>`.
pub fn parse_promote_options(args: &[String]) -> Result<PromoteOptions, String> {
    let mut input: Option<PathBuf> = None;
    let mut output: Option<PathBuf> = None;
    let mut config = PromoteConfig::default();
    let mut verbose = false;
    let mut quiet = false;

    let mut i = 0;
    while i < args.len() {
        let arg = &args[i];
        if arg == "-o" {
            let Some(path) = args.get(i + 1) else {
                return Err("-o requires a path".to_string());
            };
            output = Some(PathBuf::from(path));
            i += 2;
            continue;
        }
        match arg.as_str() {
            "--no-promote" => config.enabled = false,
            "--verbose" | "-v" => verbose = true,
            "--quiet" => quiet = true,
            "--promote-full-domains" => config.promote_fully_observed = true,
            "--report-address-taken" => config.treat_address_taken_as_exported = false,
            _ => {
                if let Some(value) = arg.strip_prefix("--max-variants=") {
                    config.max_variants_per_function =
                        value.parse().map_err(|_| format!("bad --max-variants value: {value}"))?;
                } else if let Some(value) = arg.strip_prefix("--max-growth=") {
                    config.max_estimated_growth_bytes =
                        value.parse().map_err(|_| format!("bad --max-growth value: {value}"))?;
                } else if let Some(value) = arg.strip_prefix("--threads=") {
                    config.threads =
                        value.parse().map_err(|_| format!("bad --threads value: {value}"))?;
                } else if arg.starts_with('-') {
                    return Err(format!("unknown option: {arg}"));
                } else if input.is_none() {
                    input = Some(PathBuf::from(arg));
                } else {
                    return Err(format!("unexpected argument: {arg}"));
                }
            }
        }
        i += 1;
    }

    let Some(input) = input else {
        return Err("missing input program".to_string());
    };
    Ok(PromoteOptions { input, output, config, verbose, quiet })
}
