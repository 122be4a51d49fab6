//! Boolean encoding of the requirement graph and decoding of its models.
//!
//! Every specifier key and every concrete version key is a variable:
//!
//! * roots are true;
//! * a specifier is true iff exactly one of its matching versions is true;
//! * a true version makes all of its dependency specifiers true;
//! * missing specifiers are false;
//! * with `unique_versions`, at most one version per package is true.
//!
//! Without `unique_versions`, two specifiers of the same package may pick
//! different versions and both come out true. Decoding reports that as an
//! [`Ambiguity`] and keeps the highest version.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use depsat_core::Specifier;
use semver::Version;
use thiserror::Error;
use tracing::{debug, info, warn};
use varisat::Lit;

use crate::formula::{Assignment, Formula};
use crate::graph::ResolvedGraph;
use crate::selection::{Ambiguity, SelectedPackage, Selection};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SolveError {
    #[error("no version of {name} is selected although it is required")]
    MissingFix { name: String },

    #[error("ambiguous selection for {name}: {} are all selected", join_versions(.candidates))]
    Ambiguous { name: String, candidates: Vec<Version> },

    #[error("SAT solver failed: {0}")]
    Engine(String),
}

fn join_versions(versions: &[Version]) -> String {
    versions
        .iter()
        .map(Version::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

#[derive(Debug)]
pub enum Solution {
    Satisfied(Selection),
    Unsatisfiable,
}

impl Solution {
    pub fn selection(&self) -> Option<&Selection> {
        match self {
            Solution::Satisfied(selection) => Some(selection),
            Solution::Unsatisfiable => None,
        }
    }

    pub fn is_satisfied(&self) -> bool {
        matches!(self, Solution::Satisfied(_))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SolverOptions {
    /// Allow at most one version per package.
    pub unique_versions: bool,
    /// Fail instead of picking the highest of several selected versions.
    pub strict: bool,
}

/// The formula plus what each named variable means.
struct Encoding {
    formula: Formula,
    /// Concrete version keys.
    versions: HashMap<String, (String, Version)>,
    /// Specifier keys, mapped to their package name.
    specifiers: HashMap<String, String>,
}

impl Encoding {
    fn version(&mut self, name: &str, version: &Version) -> Lit {
        let key = format!("{name}:{version}");
        let lit = self.formula.var(&key);
        self.versions
            .entry(key)
            .or_insert_with(|| (name.to_string(), version.clone()));
        lit
    }

    fn specifier(&mut self, specifier: &Specifier) -> Lit {
        let key = specifier.key();
        let lit = self.formula.var(&key);
        self.specifiers
            .entry(key)
            .or_insert_with(|| specifier.name().to_string());
        lit
    }
}

#[derive(Debug, Clone, Default)]
pub struct Solver {
    options: SolverOptions,
}

impl Solver {
    pub fn new(options: SolverOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> SolverOptions {
        self.options
    }

    /// Encode, solve once, and decode.
    pub fn solve(&self, graph: &ResolvedGraph) -> Result<Solution, SolveError> {
        let encoding = self.encode(graph);
        let Some(assignment) = Self::run(&encoding.formula)? else {
            info!("No assignment satisfies the requirements");
            return Ok(Solution::Unsatisfiable);
        };
        self.decode(&assignment, &encoding).map(Solution::Satisfied)
    }

    /// The raw model, without decoding. `None` when unsatisfiable.
    pub fn assignment(&self, graph: &ResolvedGraph) -> Result<Option<Assignment>, SolveError> {
        Self::run(&self.encode(graph).formula)
    }

    fn run(formula: &Formula) -> Result<Option<Assignment>, SolveError> {
        info!(
            "Solving {} variables ({} named), {} clauses",
            formula.var_count(),
            formula.named_count(),
            formula.clause_count()
        );
        formula
            .solve()
            .map_err(|e| SolveError::Engine(e.to_string()))
    }

    fn encode(&self, graph: &ResolvedGraph) -> Encoding {
        let mut enc = Encoding {
            formula: Formula::new(),
            versions: HashMap::new(),
            specifiers: HashMap::new(),
        };

        for root in &graph.roots {
            let lit = enc.specifier(root);
            enc.formula.require(lit);
        }

        for flat in &graph.flattened {
            let s = enc.specifier(&flat.specifier);
            let name = flat.specifier.name();
            let choices: Vec<Lit> = flat.versions.iter().map(|v| enc.version(name, v)).collect();
            enc.formula.require_equiv_exactly_one(s, &choices);
        }

        for entry in &graph.edges {
            let v = enc.version(&entry.name, &entry.version);
            let deps: Vec<Lit> = entry
                .dependencies
                .iter()
                .map(|d| enc.specifier(d))
                .collect();
            enc.formula.require_implies_all(v, &deps);
        }

        for missing in &graph.missing {
            let lit = enc.specifier(missing);
            enc.formula.require(!lit);
        }

        if self.options.unique_versions {
            let mut by_name: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
            for (key, (name, _)) in &enc.versions {
                by_name.entry(name.as_str()).or_default().insert(key.as_str());
            }
            let groups: Vec<Vec<String>> = by_name
                .into_values()
                .filter(|keys| keys.len() > 1)
                .map(|keys| keys.into_iter().map(str::to_string).collect())
                .collect();
            for keys in groups {
                let lits: Vec<Lit> = keys.iter().map(|k| enc.formula.var(k)).collect();
                enc.formula.require_at_most_one(&lits);
            }
        }

        enc
    }

    fn decode(&self, assignment: &Assignment, enc: &Encoding) -> Result<Selection, SolveError> {
        #[derive(Default)]
        struct Group {
            candidates: BTreeSet<Version>,
            patterns: BTreeSet<String>,
        }

        let mut groups: BTreeMap<&str, Group> = BTreeMap::new();
        for key in assignment.true_variables() {
            if let Some((name, version)) = enc.versions.get(key) {
                groups
                    .entry(name.as_str())
                    .or_default()
                    .candidates
                    .insert(version.clone());
            }
            if let Some(name) = enc.specifiers.get(key) {
                groups.entry(name.as_str()).or_default().patterns.insert(key.clone());
            }
        }

        let mut selection = Selection::new();
        for (name, group) in groups {
            let candidates: Vec<Version> = group.candidates.into_iter().collect();
            let Some(chosen) = candidates.last().cloned() else {
                return Err(SolveError::MissingFix {
                    name: name.to_string(),
                });
            };

            if candidates.len() > 1 {
                if self.options.strict {
                    return Err(SolveError::Ambiguous {
                        name: name.to_string(),
                        candidates,
                    });
                }
                let ambiguity = Ambiguity {
                    name: name.to_string(),
                    candidates,
                    chosen: chosen.clone(),
                };
                warn!("Ambiguous selection for {ambiguity}");
                selection.ambiguities.push(ambiguity);
            }

            debug!("Selected {name}@{chosen}");
            selection.insert(SelectedPackage {
                name: name.to_string(),
                version: chosen,
                patterns: group.patterns.into_iter().collect(),
            });
        }

        Ok(selection)
    }
}
