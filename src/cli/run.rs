//! `run` command: pick archives and push them through the pipeline.

use anyhow::{Result, bail};
use std::path::PathBuf;

use crate::cli::RunArgs;
use crate::cli::prompt::{Selection, ask_selection, display_name};
use crate::config::PipelineConfig;
use crate::log;
use crate::pipeline::convert::ExternalRasterizer;
use crate::pipeline::intake::discover_archives;
use crate::pipeline::{Overwrite, Pipeline};
use crate::utils::plural_count;

pub fn run_pipeline(args: &RunArgs, config: &PipelineConfig) -> Result<()> {
    let paths = &config.paths;
    let found = discover_archives(&paths.input, &paths.extension)?;
    let candidates = filter_by_names(found, &args.names);

    if candidates.is_empty() {
        bail!(
            "no .{} archives{} in {}",
            paths.extension,
            if args.names.is_empty() { "" } else { " matching the given names" },
            paths.input.display()
        );
    }

    let selected = if candidates.len() == 1 || args.all {
        candidates
    } else {
        let selection = ask_selection(&candidates)?;
        for token in &selection.rejected {
            log!("warning"; "ignoring invalid selection `{}`", token);
        }
        pick(candidates, &selection)
    };

    if selected.is_empty() {
        log!("run"; "nothing selected");
        return Ok(());
    }
    log!("run"; "processing {}", plural_count(selected.len(), "archive"));

    let rasterizer = ExternalRasterizer::from_config(&config.convert);
    let overwrite = overwrite_policy(args);
    let summary = Pipeline::new(config, &rasterizer, overwrite).run(&selected);
    summary.log();

    Ok(())
}

fn overwrite_policy(args: &RunArgs) -> Overwrite {
    match (args.yes, args.skip_existing) {
        (true, _) => Overwrite::Always,
        (false, true) => Overwrite::Never,
        (false, false) => Overwrite::Prompt,
    }
}

/// Keep archives whose file name contains any of `names` (case-insensitive).
/// No names keeps everything.
fn filter_by_names(archives: Vec<PathBuf>, names: &[String]) -> Vec<PathBuf> {
    if names.is_empty() {
        return archives;
    }
    let needles: Vec<String> = names.iter().map(|n| n.to_lowercase()).collect();
    archives
        .into_iter()
        .filter(|path| {
            let name = display_name(path).to_lowercase();
            needles.iter().any(|n| name.contains(n.as_str()))
        })
        .collect()
}

/// Archives at the selected indices, in selection order.
fn pick(archives: Vec<PathBuf>, selection: &Selection) -> Vec<PathBuf> {
    selection
        .indices
        .iter()
        .filter_map(|&i| archives.get(i).cloned())
        .collect()
}
