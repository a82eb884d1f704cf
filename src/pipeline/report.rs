//! Plain-text reports written next to the artifacts.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::log;
use crate::utils::exec::Cmd;

/// Listing of every artifact file name.
pub const IMAGE_PATHS_FILE: &str = "_image_paths.txt";
/// HTML snippet for pasting a question/answer pair into Joplin.
pub const QA_SNIPPET_FILE: &str = "_joplin_qa_paths.txt";

/// Write the artifact listing for `archive_name` into `out_dir`.
pub fn write_image_paths(out_dir: &Path, archive_name: &str, names: &[String]) -> io::Result<PathBuf> {
    let path = out_dir.join(IMAGE_PATHS_FILE);
    let content = if names.is_empty() {
        format!("No images were generated for {archive_name}.\n")
    } else {
        names.iter().map(|n| format!("{n}\n")).collect()
    };
    fs::write(&path, content)?;
    Ok(path)
}

/// HTML that shows the question composite and reveals the answer on click.
pub fn render_qa_snippet(question: &str, answer: &str) -> String {
    let (question, answer) = (escape_attr(question), escape_attr(answer));
    format!(
        "<details>\n\
         <summary><img src=\"{question}\" alt=\"question\" /></summary>\n\
         <img src=\"{answer}\" alt=\"answer\" />\n\
         </details>\n"
    )
}

/// Escape a value for a double-quoted HTML attribute.
fn escape_attr(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

/// Write the Q&A snippet into `out_dir`.
pub fn write_qa_snippet(out_dir: &Path, question: &str, answer: &str) -> io::Result<PathBuf> {
    let path = out_dir.join(QA_SNIPPET_FILE);
    fs::write(&path, render_qa_snippet(question, answer))?;
    Ok(path)
}

/// Open `path` with `editor`. Failure is only a warning.
pub fn open_in_editor(path: &Path, editor: &[String]) {
    let Some(program) = editor.first() else {
        return;
    };
    if which::which(program).is_err() {
        log!("warning"; "`{}` not found, open {} manually", program, path.display());
        return;
    }
    if let Err(e) = Cmd::from_slice(editor).arg(path).spawn() {
        log!("warning"; "{:#}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_image_paths_lists_names() {
        let dir = TempDir::new().unwrap();
        let names = vec!["base.png".to_string(), "q_composite.png".to_string()];
        let path = write_image_paths(dir.path(), "deck.apkg", &names).unwrap();
        assert_eq!(
            fs::read_to_string(path).unwrap(),
            "base.png\nq_composite.png\n"
        );
    }

    #[test]
    fn test_image_paths_zero_results() {
        let dir = TempDir::new().unwrap();
        let path = write_image_paths(dir.path(), "deck.apkg", &[]).unwrap();
        let content = fs::read_to_string(path).unwrap();
        assert!(content.contains("No images"));
        assert!(content.contains("deck.apkg"));
    }

    #[test]
    fn test_qa_snippet_contains_both_names() {
        let snippet = render_qa_snippet("heart-ques_composite.png", "heart-ans_composite.png");
        assert!(snippet.contains("<img src=\"heart-ques_composite.png\""));
        assert!(snippet.contains("<img src=\"heart-ans_composite.png\""));
        assert_eq!(snippet.matches("<img").count(), 2);
    }

    #[test]
    fn test_qa_snippet_escapes_names() {
        let snippet = render_qa_snippet("a\"b&c_composite.png", "<x>.png");
        assert!(snippet.contains("src=\"a&quot;b&amp;c_composite.png\""));
        assert!(snippet.contains("src=\"&lt;x&gt;.png\""));
        assert_eq!(snippet.matches('"').count(), 8);
    }

    #[test]
    fn test_write_qa_snippet() {
        let dir = TempDir::new().unwrap();
        let path = write_qa_snippet(dir.path(), "q.png", "a.png").unwrap();
        assert_eq!(path.file_name().unwrap(), QA_SNIPPET_FILE);
        assert!(fs::read_to_string(path).unwrap().contains("a.png"));
    }

    #[test]
    fn test_open_in_editor_missing_is_not_fatal() {
        let dir = TempDir::new().unwrap();
        open_in_editor(dir.path(), &["no-such-editor-ankimask".to_string()]);
        open_in_editor(dir.path(), &[]);
    }
}
