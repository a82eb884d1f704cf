//! Interactive prompts.
//!
//! The decision logic (`parse_selection`, `is_confirmed`) is pure so it can
//! be tested without a terminal; the `ask_*` wrappers only do the I/O.

use anyhow::Result;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

/// Outcome of parsing a selection response.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Selection {
    /// Zero-based indices, in the order given, without duplicates.
    pub indices: Vec<usize>,
    /// Tokens that were not valid 1-based indices.
    pub rejected: Vec<String>,
}

/// Parse a response to the archive selection prompt.
///
/// Accepts `all`, a single 1-based index, or comma-separated indices.
/// Blank tokens are ignored; invalid or out-of-range tokens are collected
/// in `rejected` rather than failing the whole response.
pub fn parse_selection(response: &str, count: usize) -> Selection {
    let response = response.trim();
    if response.eq_ignore_ascii_case("all") {
        return Selection {
            indices: (0..count).collect(),
            rejected: Vec::new(),
        };
    }

    let mut selection = Selection::default();
    for token in response.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        match token.parse::<usize>() {
            Ok(n) if (1..=count).contains(&n) => {
                if !selection.indices.contains(&(n - 1)) {
                    selection.indices.push(n - 1);
                }
            }
            _ => selection.rejected.push(token.to_string()),
        }
    }
    selection
}

/// Whether a response to a yes/no prompt confirms. Default is no.
pub fn is_confirmed(response: &str) -> bool {
    let response = response.trim().to_lowercase();
    response == "y" || response == "yes"
}

/// Read one line from `input` after printing `question` to stderr.
fn ask(question: &str, input: &mut impl BufRead) -> Result<String> {
    eprint!("{question}");
    io::stderr().flush()?;

    let mut line = String::new();
    input.read_line(&mut line)?;
    Ok(line)
}

/// List `archives` and ask which to process.
pub fn ask_selection(archives: &[PathBuf]) -> Result<Selection> {
    for (i, path) in archives.iter().enumerate() {
        eprintln!("{:>3}. {}", i + 1, display_name(path));
    }
    let response = ask(
        "Select archives (e.g. 1 or 1,3 or all): ",
        &mut io::stdin().lock(),
    )?;
    Ok(parse_selection(&response, archives.len()))
}

/// Ask whether an existing output directory may be replaced.
pub fn ask_overwrite(dir: &Path) -> Result<bool> {
    let response = ask(
        &format!("{} exists. Overwrite? [y/N] ", dir.display()),
        &mut io::stdin().lock(),
    )?;
    Ok(is_confirmed(&response))
}

/// File name of `path` for display.
pub fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selection_all() {
        let sel = parse_selection(" ALL\n", 3);
        assert_eq!(sel.indices, vec![0, 1, 2]);
        assert!(sel.rejected.is_empty());
    }

    #[test]
    fn test_selection_single() {
        assert_eq!(parse_selection("2", 3).indices, vec![1]);
    }

    #[test]
    fn test_selection_list_keeps_order_and_dedups() {
        let sel = parse_selection("3, 1,3", 3);
        assert_eq!(sel.indices, vec![2, 0]);
        assert!(sel.rejected.is_empty());
    }

    #[test]
    fn test_selection_invalid_tokens_skipped() {
        let sel = parse_selection("0,2,9,x,", 3);
        assert_eq!(sel.indices, vec![1]);
        assert_eq!(sel.rejected, vec!["0", "9", "x"]);
    }

    #[test]
    fn test_selection_empty() {
        assert_eq!(parse_selection("\n", 4), Selection::default());
    }

    #[test]
    fn test_is_confirmed() {
        assert!(is_confirmed("y\n"));
        assert!(is_confirmed(" Yes "));
        assert!(!is_confirmed(""));
        assert!(!is_confirmed("n"));
        assert!(!is_confirmed("yep"));
    }

    #[test]
    fn test_ask_reads_line() {
        let mut input = io::Cursor::new(b"1,2\nignored\n".to_vec());
        let line = ask("", &mut input).unwrap();
        assert_eq!(parse_selection(&line, 2).indices, vec![0, 1]);
    }

    #[test]
    fn test_display_name() {
        assert_eq!(display_name(Path::new("/a/b/deck.apkg")), "deck.apkg");
    }
}
