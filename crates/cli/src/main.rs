//! Traceloom CLI — inspect persisted trace files.
//!
//! `traceloom inspect <path>` loads one trace JSON file through the storage
//! codec (full structural re-validation), then prints a summary and an
//! indented tree. `--json` dumps the canonical JSON instead; `--output`
//! writes to a file rather than stdout.
//!
//! Exit codes: 0 on success, 1 on load/parse failure, 2 on usage errors
//! (clap's default).

mod render;

use clap::{Arg, ArgAction, ArgMatches, Command};
use std::fs;
use std::path::PathBuf;
use std::process;
use traceloom_storage::codec;

fn main() {
    let matches = build_cli().get_matches();

    let exit_code = match matches.subcommand() {
        Some(("inspect", sub)) => run_inspect(sub),
        _ => unreachable!("subcommand is required"),
    };
    process::exit(exit_code);
}

fn build_cli() -> Command {
    Command::new("traceloom")
        .about("Inspect traceloom execution traces")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new("inspect")
                .about("Inspect a persisted trace JSON file")
                .arg(
                    Arg::new("path")
                        .help("Path to the trace JSON file")
                        .required(true)
                        .value_parser(clap::value_parser!(PathBuf)),
                )
                .arg(
                    Arg::new("json")
                        .long("json")
                        .help("Dump canonical JSON instead of the rendered tree")
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("output")
                        .long("output")
                        .help("Write to this file instead of stdout")
                        .value_parser(clap::value_parser!(PathBuf)),
                ),
        )
}

fn run_inspect(matches: &ArgMatches) -> i32 {
    // Presence is guaranteed by the arg definitions.
    let path = match matches.get_one::<PathBuf>("path") {
        Some(p) => p,
        None => return 2,
    };
    let as_json = matches.get_flag("json");
    let output = matches.get_one::<PathBuf>("output");

    let payload = match fs::read_to_string(path) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("error: cannot read {}: {e}", path.display());
            return 1;
        }
    };
    let graph = match codec::from_json(&payload) {
        Ok(g) => g,
        Err(e) => {
            eprintln!("error: {}: {e}", path.display());
            return 1;
        }
    };

    let rendered = if as_json {
        codec::to_json(&graph)
    } else {
        format!(
            "{}\n{}",
            render::render_summary(&graph),
            render::render_tree(&graph)
        )
    };

    match output {
        Some(out_path) => {
            if let Err(e) = fs::write(out_path, rendered) {
                eprintln!("error: cannot write {}: {e}", out_path.display());
                return 1;
            }
        }
        None => println!("{rendered}"),
    }
    0
}
