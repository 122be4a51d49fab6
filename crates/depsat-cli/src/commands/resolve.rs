//! Handler for `depsat resolve`.

use std::io::Write;
use std::time::Duration;

use depsat_core::config::GlobalConfig;
use depsat_resolver::{ResolvedGraph, Solution, Solver, SolverOptions};
use depsat_util::errors::DepsatError;
use depsat_util::progress;
use miette::Result;

use crate::cli::RootArgs;

pub async fn exec(
    config: &GlobalConfig,
    roots: &RootArgs,
    unique_versions: bool,
    strict: bool,
    json: bool,
) -> Result<()> {
    let graph = super::crawl_graph(roots, config).await?;
    let missing = graph.missing_keys();

    let options = SolverOptions {
        unique_versions: unique_versions || config.solver.unique_versions,
        strict: strict || config.solver.strict,
    };
    let solution = solve(graph, options, config.solver.timeout_secs).await?;

    match solution {
        Solution::Satisfied(selection) => {
            if json {
                let out = serde_json::to_string_pretty(&selection).map_err(|e| {
                    DepsatError::Generic {
                        message: format!("Failed to serialize selection: {e}"),
                    }
                })?;
                writeln!(std::io::stdout(), "{out}").map_err(DepsatError::Io)?;
            } else {
                write!(std::io::stdout(), "{selection}").map_err(DepsatError::Io)?;
                progress::status("Resolved", &format!("{} packages", selection.len()));
            }
            Ok(())
        }
        Solution::Unsatisfiable => {
            progress::status_error("Failed", "no solution satisfies the root requirements");
            for key in &missing {
                progress::status_warn("Missing", key);
            }
            std::process::exit(1);
        }
    }
}

/// Run the solver on a blocking thread, bounded by `timeout_secs` when
/// non-zero.
async fn solve(graph: ResolvedGraph, options: SolverOptions, timeout_secs: u64) -> Result<Solution> {
    let task = tokio::task::spawn_blocking(move || Solver::new(options).solve(&graph));

    let joined = if timeout_secs > 0 {
        tokio::time::timeout(Duration::from_secs(timeout_secs), task)
            .await
            .map_err(|_| DepsatError::Resolution {
                message: format!("solver gave up after {timeout_secs}s"),
            })?
    } else {
        task.await
    };

    let result = joined.map_err(|e| DepsatError::Resolution {
        message: format!("solver task failed: {e}"),
    })?;
    result.map_err(|e| {
        DepsatError::Resolution {
            message: e.to_string(),
        }
        .into()
    })
}
