//! Configuration section definitions.
//!
//! Each module corresponds to a section in `ankimask.toml`:
//!
//! | Module    | TOML Section | Purpose                                |
//! |-----------|--------------|----------------------------------------|
//! | `paths`   | `[paths]`    | Input, output and Anki media folders   |
//! | `convert` | `[convert]`  | SVG rasterizer and composite format    |
//! | `report`  | `[report]`   | Q&A snippet editor                     |

mod convert;
mod paths;
mod report;

pub use convert::{CompositeFormat, ConvertConfig, SvgConverter};
pub use paths::PathsConfig;
pub use report::ReportConfig;
