use crate::clause::Lit;

/// Argument passed to the theory during checks.
pub use crate::core::TheoryArg;

/// A theory plugged into the CDCL loop.
///
/// The solver calls `partial_check` each time boolean propagation reaches a
/// fixpoint, and `final_check` once every variable is assigned. The theory
/// keeps one backtracking level per decision level of the solver.
pub trait Theory {
    /// Check the full assignment `acts.model()`.
    ///
    /// If it is not satisfiable in the theory, this *must* propagate a
    /// literal or call `acts.raise_conflict` with a clause made of
    /// negations of literals of the model.
    fn final_check(&mut self, acts: &mut TheoryArg);

    /// Push a new backtracking level.
    fn create_level(&mut self);

    /// Pop `n` levels.
    fn pop_levels(&mut self, n: usize);

    /// Number of levels.
    fn n_levels(&self) -> usize;

    /// Check the partial assignment, best effort.
    ///
    /// The theory may remember how much of `acts.model()` it has seen and
    /// only look at the new suffix.
    fn partial_check(&mut self, _acts: &mut TheoryArg) {}

    /// Explain `p`, a literal propagated earlier by this theory, as a set of
    /// literals that were true when `p` was propagated.
    fn explain_propagation(&mut self, _p: Lit) -> &[Lit];
}

/// Theory that accepts everything.
#[derive(Default)]
pub struct EmptyTheory(usize);

impl EmptyTheory {
    pub fn new() -> Self {
        EmptyTheory(0)
    }
}

impl Theory for EmptyTheory {
    fn final_check(&mut self, _: &mut TheoryArg) {}
    fn create_level(&mut self) {
        self.0 += 1
    }
    fn pop_levels(&mut self, n: usize) {
        debug_assert!(self.0 >= n);
        self.0 -= n
    }
    fn n_levels(&self) -> usize {
        self.0
    }
    fn explain_propagation(&mut self, _p: Lit) -> &[Lit] {
        unreachable!("the empty theory never propagates")
    }
}
