//! CNF builder with named variables.
//!
//! Named variables stand for canonical keys (`name:spec`, `name:version`);
//! auxiliary variables introduced by the Tseitin definitions have no name
//! and never appear in an assignment.

use std::collections::{BTreeSet, HashMap};

use varisat::solver::Solver;
use varisat::{ExtendFormula, Lit};

#[derive(Debug, Default)]
pub struct Formula {
    /// `names[i]` belongs to the DIMACS variable `i + 1`.
    names: Vec<Option<String>>,
    vars: HashMap<String, Lit>,
    clauses: Vec<Vec<Lit>>,
}

impl Formula {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_lit(&mut self, name: Option<String>) -> Lit {
        self.names.push(name);
        Lit::from_dimacs(self.names.len() as isize)
    }

    /// Positive literal of the variable named `name`, created on first use.
    pub fn var(&mut self, name: &str) -> Lit {
        if let Some(&lit) = self.vars.get(name) {
            return lit;
        }
        let lit = self.next_lit(Some(name.to_string()));
        self.vars.insert(name.to_string(), lit);
        lit
    }

    /// A fresh anonymous variable.
    pub fn aux(&mut self) -> Lit {
        self.next_lit(None)
    }

    pub fn add_clause(&mut self, lits: &[Lit]) {
        self.clauses.push(lits.to_vec());
    }

    /// Unit clause.
    pub fn require(&mut self, lit: Lit) {
        self.add_clause(&[lit]);
    }

    /// `a ⇒ b` for every `b`.
    pub fn require_implies_all(&mut self, a: Lit, bs: &[Lit]) {
        for &b in bs {
            self.add_clause(&[!a, b]);
        }
    }

    /// Define a fresh `o ⇔ OR(lits)`.
    fn define_or(&mut self, lits: &[Lit]) -> Lit {
        let o = self.aux();
        let mut wide = Vec::with_capacity(lits.len() + 1);
        wide.push(!o);
        for &lit in lits {
            wide.push(lit);
            self.add_clause(&[!lit, o]);
        }
        self.add_clause(&wide);
        o
    }

    /// Define a fresh `t ⇔ a ∧ b`.
    fn define_and(&mut self, a: Lit, b: Lit) -> Lit {
        let t = self.aux();
        self.add_clause(&[!t, a]);
        self.add_clause(&[!t, b]);
        self.add_clause(&[t, !a, !b]);
        t
    }

    /// `s ⇔ exactly one of lits`.
    ///
    /// With a sequential prefix-or `p_i ⇔ p_{i-1} ∨ v_i` and pair flags
    /// `t_i ⇔ p_{i-1} ∧ v_i`, "at least one" is `p_n` and "at least two" is
    /// `OR(t_i)`. Linear in the number of literals.
    pub fn require_equiv_exactly_one(&mut self, s: Lit, lits: &[Lit]) {
        match lits {
            [] => self.require(!s),
            [only] => {
                self.add_clause(&[!s, *only]);
                self.add_clause(&[s, !*only]);
            }
            [first, rest @ ..] => {
                let mut prefix = *first;
                let mut pairs = Vec::with_capacity(rest.len());
                for &lit in rest {
                    pairs.push(self.define_and(prefix, lit));
                    prefix = self.define_or(&[prefix, lit]);
                }
                let at_least_one = prefix;
                let at_least_two = self.define_or(&pairs);

                self.add_clause(&[!s, at_least_one]);
                self.add_clause(&[!s, !at_least_two]);
                self.add_clause(&[s, !at_least_one, at_least_two]);
            }
        }
    }

    /// At most one of `lits` is true. Pairwise for short lists, a
    /// sequential counter beyond that.
    pub fn require_at_most_one(&mut self, lits: &[Lit]) {
        if lits.len() <= 4 {
            for (i, &a) in lits.iter().enumerate() {
                for &b in &lits[i + 1..] {
                    self.add_clause(&[!a, !b]);
                }
            }
            return;
        }

        let n = lits.len();
        let mut prev = self.aux();
        self.add_clause(&[!lits[0], prev]);
        for &lit in &lits[1..n - 1] {
            let next = self.aux();
            self.add_clause(&[!lit, next]);
            self.add_clause(&[!prev, next]);
            self.add_clause(&[!lit, !prev]);
            prev = next;
        }
        self.add_clause(&[!lits[n - 1], !prev]);
    }

    pub fn var_count(&self) -> usize {
        self.names.len()
    }

    pub fn named_count(&self) -> usize {
        self.vars.len()
    }

    pub fn clause_count(&self) -> usize {
        self.clauses.len()
    }

    /// Run the SAT engine once. `Ok(None)` means unsatisfiable.
    pub fn solve(&self) -> Result<Option<Assignment>, varisat::solver::SolverError> {
        let mut solver = Solver::new();
        for clause in &self.clauses {
            solver.add_clause(clause);
        }
        if !solver.solve()? {
            return Ok(None);
        }

        let mut true_vars = BTreeSet::new();
        for lit in solver.model().unwrap_or_default() {
            if !lit.is_positive() {
                continue;
            }
            let index = lit.to_dimacs() as usize;
            if let Some(Some(name)) = self.names.get(index - 1) {
                true_vars.insert(name.clone());
            }
        }
        Ok(Some(Assignment { true_vars }))
    }
}

/// The named variables a model sets true.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Assignment {
    true_vars: BTreeSet<String>,
}

impl Assignment {
    pub fn true_variables(&self) -> &BTreeSet<String> {
        &self.true_vars
    }

    pub fn is_true(&self, name: &str) -> bool {
        self.true_vars.contains(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Every subset of `n` literals, as bitmasks, forced in turn.
    fn exactly_one_holds_for(n: usize) {
        for mask in 0u32..(1 << n) {
            let mut f = Formula::new();
            let s = f.var("s");
            let lits: Vec<Lit> = (0..n).map(|i| f.var(&format!("v{i}"))).collect();
            f.require_equiv_exactly_one(s, &lits);
            for (i, &lit) in lits.iter().enumerate() {
                f.require(if mask & (1 << i) != 0 { lit } else { !lit });
            }
            let model = f.solve().unwrap().expect("always satisfiable through s");
            assert_eq!(model.is_true("s"), mask.count_ones() == 1, "n={n} mask={mask:b}");
        }
    }

    #[test]
    fn exactly_one_semantics() {
        for n in 0..=5 {
            exactly_one_holds_for(n);
        }
    }

    #[test]
    fn empty_choice_forces_false() {
        let mut f = Formula::new();
        let s = f.var("s");
        f.require_equiv_exactly_one(s, &[]);
        f.require(s);
        assert!(f.solve().unwrap().is_none());
    }

    #[test]
    fn at_most_one_rejects_pairs() {
        for n in [2usize, 4, 7] {
            let mut f = Formula::new();
            let lits: Vec<Lit> = (0..n).map(|i| f.var(&format!("v{i}"))).collect();
            f.require_at_most_one(&lits);
            f.require(lits[0]);
            f.require(lits[n - 1]);
            assert!(f.solve().unwrap().is_none(), "n={n}");
        }
    }

    #[test]
    fn at_most_one_allows_single() {
        let mut f = Formula::new();
        let lits: Vec<Lit> = (0..6).map(|i| f.var(&format!("v{i}"))).collect();
        f.require_at_most_one(&lits);
        f.require(lits[3]);
        let model = f.solve().unwrap().unwrap();
        assert!(model.is_true("v3"));
        assert_eq!(model.true_variables().len(), 1);
    }

    #[test]
    fn implication_propagates() {
        let mut f = Formula::new();
        let a = f.var("a");
        let b = f.var("b");
        let c = f.var("c");
        f.require_implies_all(a, &[b, c]);
        f.require(a);
        let model = f.solve().unwrap().unwrap();
        assert!(model.is_true("b") && model.is_true("c"));
    }

    #[test]
    fn aux_variables_are_unnamed() {
        let mut f = Formula::new();
        let s = f.var("s");
        let x = f.var("x");
        let y = f.var("y");
        f.require_equiv_exactly_one(s, &[x, y]);
        f.require(s);
        f.require(x);
        let model = f.solve().unwrap().unwrap();
        assert_eq!(
            model.true_variables().iter().cloned().collect::<Vec<_>>(),
            vec!["s".to_string(), "x".to_string()]
        );
        assert_eq!(f.named_count(), 3);
        assert!(f.var_count() > 3);
    }

    #[test]
    fn same_name_same_variable() {
        let mut f = Formula::new();
        assert_eq!(f.var("a:1.0.0"), f.var("a:1.0.0"));
    }
}
