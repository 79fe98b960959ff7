mod config;

use std::path::PathBuf;
use std::sync::mpsc;
use std::sync::Arc;

use config::Config;
use indexed_file::{load_repository, open_log_source, regex_config_dir, CoreConfig, LogFile, LogFileState};

/// Thin demonstrator binary: opens the requested file(s), runs the core's
/// index -> complete pipeline to completion and prints a summary. A real
/// desktop table/paint UI is out of scope here; this binary only exercises
/// the public interfaces `indexed_file` exposes to a front end
/// (`LogFile::index`, `read_line`, `get_values`, `column_widths`).
fn main() {
    let _ = flexi_logger::Logger::try_with_env_or_str("warn").map(|l| l.start());

    let cfg = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("{e:?}");
            std::process::exit(1);
        }
    };

    let config_dir = std::env::var_os("GROK_CONFIG_DIR").map(PathBuf::from);
    let (repo, failures) = load_repository(config_dir.as_deref().map(regex_config_dir).as_deref());
    for (name, err) in &failures {
        log::warn!("parser config `{name}` failed to load: {err}");
    }
    let repo = Arc::new(repo);

    let paths: Vec<Option<PathBuf>> = if cfg.filename.is_empty() {
        vec![None]
    } else {
        cfg.filename.iter().cloned().map(Some).collect()
    };

    for path in paths {
        if let Err(e) = show_one(&path, &repo) {
            let label = path.as_ref().map(|p| p.display().to_string()).unwrap_or_else(|| "<stdin>".to_string());
            eprintln!("{label}: {e}");
        }
    }
}

fn show_one(path: &Option<PathBuf>, repo: &indexed_file::Repository) -> std::io::Result<()> {
    let mut probe = indexed_file::new_text_file(path.as_ref())?;
    probe.index(|_, _| {}, || false).ok();
    let sample: Vec<String> = (0..probe.line_count().min(10))
        .map(|i| probe.read_line_string(i).unwrap_or_default())
        .collect();
    let file_name = path.as_ref().and_then(|p| p.file_name()).and_then(|n| n.to_str());
    let parser = repo.resolve(&sample, file_name);
    log::trace!("resolved parser `{}` for {:?}", parser.name(), path);

    let source = open_log_source(path.as_ref())?;
    let (tx, rx) = mpsc::channel();
    let log = LogFile::open(source, parser, CoreConfig::default(), move |s| {
        let _ = tx.send(s);
    })
    .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))?;

    log.index();
    loop {
        match rx.recv() {
            Ok(s @ (LogFileState::Complete | LogFileState::Failed | LogFileState::Interrupted)) => {
                if s != LogFileState::Complete {
                    println!("did not reach Complete (state: {s:?})");
                    return Ok(());
                }
                break;
            }
            Ok(_) => continue,
            Err(_) => return Ok(()),
        }
    }

    println!("{} lines", log.line_count());
    for (i, format) in log.column_formats().iter().enumerate() {
        let (width, _) = log.column_widths()[i];
        println!("  column {:<12} max width {width}", format.name);
    }
    let mut line = String::new();
    for i in 0..log.line_count().min(10) {
        log.read_line(i, &mut line)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))?;
        println!("{line}");
    }
    Ok(())
}
