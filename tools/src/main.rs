use std::path::PathBuf;

use tools::{cat_cmd, tac_cmd, tail_cmd};

const USAGE: &str = "\
tools <cat|tac|tail> [-n COUNT] [FILE]

cat    print FILE (or stdin) in order
tac    print FILE (or stdin) in reverse
tail   print the last COUNT lines of FILE (or stdin), default 10";

fn main() {
    if let Err(e) = run() {
        eprintln!("{e}");
        std::process::exit(1);
    }
}

fn run() -> std::io::Result<()> {
    let mut args = pico_args::Arguments::from_env();
    let mode = match args.subcommand().ok().flatten() {
        Some(m) => m,
        None => {
            println!("{USAGE}");
            return Ok(());
        }
    };
    let count: usize = args.opt_value_from_str("-n").ok().flatten().unwrap_or(10);
    let path: Option<PathBuf> = args.free_from_str().ok();

    match mode.as_str() {
        "cat" => cat_cmd(path.as_ref()),
        "tac" => tac_cmd(path.as_ref()),
        "tail" => tail_cmd(path.as_ref(), count),
        other => {
            eprintln!("unknown mode `{other}`\n{USAGE}");
            std::process::exit(1);
        }
    }
}
