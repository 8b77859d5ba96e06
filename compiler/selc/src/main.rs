//! Sel middle-end CLI.

use selc::commands::{print_promote_usage, run_promote};
use selc::EXIT_USAGE;

fn main() {
    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        print_usage();
        std::process::exit(EXIT_USAGE);
    }

    match args[1].as_str() {
        "promote" => {
            let code = run_promote(&args[2..]);
            std::process::exit(code);
        }
        "help" | "--help" | "-h" => {
            print_usage();
        }
        other => {
            eprintln!("error: unknown command: {other}");
            print_usage();
            std::process::exit(EXIT_USAGE);
        }
    }
}

fn print_usage() {
    eprintln!("Sel middle-end driver");
    eprintln!();
    eprintln!("Usage: sel-opt <command> [options]");
    eprintln!();
    eprintln!("Commands:");
    eprintln!("  promote    Constant-parameter promotion over a program snapshot");
    eprintln!("  help       Show this message");
    eprintln!();
    print_promote_usage();
}
