//! `[report]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [report]
//! editor = ["code"]   # Opens the Q&A snippet after it is written; [] disables
//! ```

use serde::{Deserialize, Serialize};

use crate::config::{ConfigDiagnostics, FieldPath};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Editor command (program followed by arguments).
    pub editor: Vec<String>,
}

pub struct ReportFields {
    pub editor: FieldPath,
}

impl ReportConfig {
    pub const FIELDS: ReportFields = ReportFields {
        editor: FieldPath::new("report.editor"),
    };
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            editor: vec!["code".to_string()],
        }
    }
}

impl ReportConfig {
    /// Editor program, if one is configured.
    pub fn editor_program(&self) -> Option<&str> {
        self.editor.first().map(String::as_str)
    }

    /// A missing editor only loses the convenience of auto-opening,
    /// so it is reported as a warning.
    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if let Some(program) = self.editor_program()
            && which::which(program).is_err()
        {
            diag.warn(
                Self::FIELDS.editor,
                format!("`{program}` not found, Q&A snippets will not be opened"),
            );
        }
    }
}
