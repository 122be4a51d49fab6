//! Handler for `depsat why`.

use depsat_core::config::GlobalConfig;
use depsat_util::errors::DepsatError;
use miette::Result;

use crate::cli::RootArgs;

pub async fn exec(config: &GlobalConfig, roots: &RootArgs, package: &str) -> Result<()> {
    let graph = super::crawl_graph(roots, config).await?;
    let requirements = graph.requirement_graph();

    let Some(path) = requirements.find_path(package) else {
        return Err(DepsatError::Generic {
            message: format!("{package} is not required by any root"),
        }
        .into());
    };

    for (depth, node) in path.iter().enumerate() {
        if depth == 0 {
            println!("{node}");
        } else {
            println!("{}└── {node}", "    ".repeat(depth - 1));
        }
    }
    Ok(())
}
