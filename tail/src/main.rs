use std::path::PathBuf;

use tools::tail_cmd;

fn main() {
    let _ = flexi_logger::Logger::try_with_env_or_str("warn").map(|l| l.start());

    let mut args = pico_args::Arguments::from_env();
    let count: usize = args.opt_value_from_str("-n").ok().flatten().unwrap_or(10);
    let path: Option<PathBuf> = args.free_from_str().ok();

    if let Err(e) = tail_cmd(path.as_ref(), count) {
        eprintln!("{e}");
        std::process::exit(1);
    }
}
