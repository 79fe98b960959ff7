use std::io::Write;
use std::path::PathBuf;

use indexed_file::new_text_file;

fn to_io_err(e: indexed_file::CoreError) -> std::io::Error {
    std::io::Error::new(std::io::ErrorKind::Other, e.to_string())
}

/// Print every line of `path` (stdin if `None`) in file order.
pub fn cat_cmd(path: Option<&PathBuf>) -> std::io::Result<()> {
    let mut file = new_text_file(path)?;
    file.index(|_, _| {}, || false).map_err(to_io_err)?;
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    for i in 0..file.line_count() {
        writeln!(out, "{}", file.read_line_string(i).map_err(to_io_err)?)?;
    }
    Ok(())
}

/// Print every line of `path` in reverse order.
pub fn tac_cmd(path: Option<&PathBuf>) -> std::io::Result<()> {
    let mut file = new_text_file(path)?;
    file.index(|_, _| {}, || false).map_err(to_io_err)?;
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    for i in (0..file.line_count()).rev() {
        writeln!(out, "{}", file.read_line_string(i).map_err(to_io_err)?)?;
    }
    Ok(())
}

/// Print the last `count` lines of `path`.
pub fn tail_cmd(path: Option<&PathBuf>, count: usize) -> std::io::Result<()> {
    let mut file = new_text_file(path)?;
    file.index(|_, _| {}, || false).map_err(to_io_err)?;
    let total = file.line_count();
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    for i in total.saturating_sub(count)..total {
        writeln!(out, "{}", file.read_line_string(i).map_err(to_io_err)?)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;

    fn fixture(lines: &[&str]) -> PathBuf {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        for line in lines {
            writeln!(tmp, "{line}").unwrap();
        }
        let (_, path) = tmp.keep().unwrap();
        path
    }

    #[test]
    fn cat_reads_every_line() {
        let path = fixture(&["a", "b", "c"]);
        cat_cmd(Some(&path)).unwrap();
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn tail_reads_only_the_last_lines() {
        let path = fixture(&["a", "b", "c", "d"]);
        tail_cmd(Some(&path), 2).unwrap();
        std::fs::remove_file(path).ok();
    }
}
