//! Dependency resolution engine: a worklist crawl over registry metadata that
//! builds the requirement graph, and a SAT encoding of that graph whose
//! models decode into one version per package.

pub mod formula;
pub mod graph;
pub mod resolver;
pub mod selection;
pub mod solver;
pub mod worklist;

pub use graph::ResolvedGraph;
pub use resolver::Resolver;
pub use selection::Selection;
pub use solver::{Solution, SolveError, Solver, SolverOptions};
