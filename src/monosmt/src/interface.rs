use crate::{
    clause::{lbool, Lit, Var},
    theory::{EmptyTheory, Theory},
};

/// Main interface of the CDCL solver: allocate variables, add clauses,
/// tune decisions, and check satisfiability, possibly modulo a theory.
pub trait SolverInterface {
    fn num_vars(&self) -> u32;
    fn num_clauses(&self) -> u64;
    fn num_conflicts(&self) -> u64;
    fn num_propagations(&self) -> u64;
    fn num_decisions(&self) -> u64;
    fn num_restarts(&self) -> u64;

    /// `false` once the clause set is known to be unsatisfiable.
    fn is_ok(&self) -> bool;

    /// Print some statistics to standard output.
    fn print_stats(&self);

    /// Create a new variable with preferred polarity `upol`. If `dvar` is
    /// false, the variable is never decided on, which changes the meaning
    /// of a satisfiable result.
    fn new_var(&mut self, upol: lbool, dvar: bool) -> Var;

    fn new_var_default(&mut self) -> Var {
        self.new_var(lbool::UNDEF, true)
    }

    /// Add a clause at level 0. Returns `false` if the solver is now in an
    /// unsatisfiable state. `clause` is modified in place.
    fn add_clause_reuse(&mut self, clause: &mut Vec<Lit>) -> bool;

    /// Search for a model of the clauses and of the theory under the given
    /// assumptions, within the configured resource limits.
    ///
    /// Returns `UNDEF` if a limit was hit.
    fn solve_limited_th<Th: Theory>(&mut self, th: &mut Th, assumps: &[Lit]) -> lbool;

    fn solve_limited(&mut self, assumps: &[Lit]) -> lbool {
        self.solve_limited_th(&mut EmptyTheory::new(), assumps)
    }

    /// The model of the last satisfiable call, empty if there is none.
    fn get_model(&self) -> &[lbool];

    fn value_var(&self, v: Var) -> lbool;

    fn value_lit(&self, lit: Lit) -> lbool {
        self.value_var(lit.var()) ^ !lit.sign()
    }

    /// Value of `lit` if it is assigned at level 0, `UNDEF` otherwise.
    fn value_lvl_0(&self, lit: Lit) -> lbool;

    /// Final conflict of the last unsatisfiable call, as a clause over
    /// negated assumptions. Empty if the clauses alone are unsatisfiable.
    fn unsat_core(&self) -> &[Lit];

    fn set_decision_var(&mut self, v: Var, b: bool);
    fn is_decision_var(&self, v: Var) -> bool;

    /// Preferred value when deciding on `v`; `UNDEF` means phase saving.
    fn set_polarity(&mut self, v: Var, pol: lbool);
    fn polarity(&self, v: Var) -> lbool;

    /// Variables with a higher priority are decided first.
    fn set_priority(&mut self, v: Var, priority: i32);
    fn priority(&self, v: Var) -> i32;
}
