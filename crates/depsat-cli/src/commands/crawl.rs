//! Handler for `depsat crawl`.

use depsat_core::config::GlobalConfig;
use depsat_util::progress;
use miette::Result;

use crate::cli::RootArgs;

pub async fn exec(
    config: &GlobalConfig,
    roots: &RootArgs,
    tree: bool,
    depth: Option<usize>,
) -> Result<()> {
    let graph = super::crawl_graph(roots, config).await?;

    if tree {
        print!("{}", graph.requirement_graph().print_tree(depth));
    } else {
        for flat in &graph.flattened {
            let versions: Vec<String> = flat.versions.iter().map(|v| v.to_string()).collect();
            println!("{} -> [{}]", flat.specifier, versions.join(", "));
        }
    }

    let missing = graph.missing_keys();
    if missing.is_empty() {
        progress::status_info("Complete", "every requirement was found in the registry");
    } else {
        for key in &missing {
            progress::status_warn("Missing", key);
        }
    }
    Ok(())
}
