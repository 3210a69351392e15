/*****************************************************************************************[core.rs]
Copyright (c) 2003-2006, Niklas Een, Niklas Sorensson (MiniSat)
Copyright (c) 2007-2010, Niklas Sorensson (MiniSat)
Copyright (c) 2018-2018, Masaki Hara

Permission is hereby granted, free of charge, to any person obtaining a copy of this software and
associated documentation files (the "Software"), to deal in the Software without restriction,
including without limitation the rights to use, copy, modify, merge, publish, distribute,
sublicense, and/or sell copies of the Software, and to permit persons to whom the Software is
furnished to do so, subject to the following conditions:

The above copyright notice and this permission notice shall be included in all copies or
substantial portions of the Software.

THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR IMPLIED, INCLUDING BUT
NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY, FITNESS FOR A PARTICULAR PURPOSE AND
NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM,
DAMAGES OR OTHER LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM, OUT
OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.
**************************************************************************************************/

use {
    crate::callbacks::{Callbacks, ProgressStatus},
    crate::clause::{
        lbool, CRef, ClauseArena, ClauseRef, DeletePred, Kind, LSet, Lit, OccListsData, VMap, Var,
    },
    crate::interface::SolverInterface,
    crate::intmap::{Comparator, Heap, HeapData},
    crate::limits::{Budget, ResourceLimits},
    crate::theory::Theory,
    std::{cmp, mem},
};

/// The CDCL solver.
///
/// A `Solver` owns the clause database, the trail, the decision heuristic
/// and the statistics. Theories are passed to each call to `solve_limited_th`
/// rather than owned, so one solver can be driven with different theories.
///
/// It is parametrized by `Callbacks`.
pub struct Solver<Cb: Callbacks> {
    /// Model of the last satisfiable call. Cleared as soon as a variable or
    /// clause is added.
    model: Vec<lbool>,
    /// Final conflict of the last unsatisfiable call, over negated assumptions.
    conflict: LSet,

    cb: Cb,

    clauses: Vec<CRef>,
    learnts: Vec<CRef>,

    v: SolverV,
    tmp_th_confl: Vec<Lit>,
}

/// Assignment state.
struct VarState {
    /// Current value of each variable.
    ass: VMap<lbool>,
    /// Reason and level of each assigned variable.
    vardata: VMap<VarData>,
    /// VSIDS score.
    activity: VMap<f64>,
    /// Decision priority, compared before activity.
    priority: VMap<i32>,
    var_inc: f64,
    var_decay: f64,

    /// Assignments, in chronological order.
    trail: Vec<Lit>,
    /// Start of each decision level in `trail`.
    trail_lim: Vec<u32>,
}

struct SolverV {
    vars: VarState,

    learntsize_adjust_start_confl: i32,
    learntsize_adjust_inc: f64,
    max_learnts: f64,
    learntsize_adjust_confl: f64,
    learntsize_adjust_cnt: i32,

    remove_satisfied: bool,

    // statistics
    starts: u64,
    decisions: u64,
    rnd_decisions: u64,
    propagations: u64,
    conflicts: u64,
    dec_vars: u64,
    max_literals: u64,
    tot_literals: u64,
    num_clauses: u64,
    num_learnts: u64,
    clauses_literals: u64,
    learnts_literals: u64,

    // options
    clause_decay: f64,
    random_var_freq: f64,
    random_seed: f64,
    luby_restart: bool,
    ccmin_mode: i32,
    phase_saving: i32,
    rnd_init_act: bool,
    garbage_frac: f64,
    min_learnts_lim: i32,
    restart_first: i32,
    restart_inc: f64,
    learntsize_factor: f64,
    learntsize_inc: f64,

    /// Saved phase of each variable.
    polarity: VMap<bool>,
    /// User preferred polarity, overrides the saved phase.
    user_pol: VMap<lbool>,
    /// Is the variable eligible for decisions?
    decision: VMap<bool>,
    /// `watches[lit]` lists the clauses to visit when `lit` becomes true.
    watches_data: OccListsData<Lit, Watcher>,
    order_heap_data: HeapData<Var>,
    /// `false` once the clauses are known to be unsatisfiable.
    ok: bool,
    cla_inc: f64,
    /// Index in the trail of the next literal to propagate.
    qhead: usize,
    simp_db_assigns: i64,
    simp_db_props: i64,

    next_var: Var,
    ca: ClauseArena,

    assumptions: Vec<Lit>,

    // scratch space
    seen: VMap<Seen>,
    minimize_stack: Vec<Lit>,
    analyze_toclear: Vec<Lit>,

    budget: Budget,
}

/// Approximate bytes of per-variable bookkeeping (assignment, reason,
/// activity, priority, phases, two watch lists, heap slot).
const BYTES_PER_VAR: usize = 96;

impl<Cb: Callbacks> SolverInterface for Solver<Cb> {
    fn new_var(&mut self, upol: lbool, dvar: bool) -> Var {
        self.model.clear();
        self.v.new_var(upol, dvar)
    }

    fn add_clause_reuse(&mut self, clause: &mut Vec<Lit>) -> bool {
        debug!("add toplevel clause {:?}", clause);
        debug_assert_eq!(self.v.decision_level(), 0, "clause added during search");
        self.model.clear();
        clause.sort_unstable();
        self.add_clause_(clause)
    }

    fn solve_limited_th<Th: Theory>(&mut self, th: &mut Th, assumps: &[Lit]) -> lbool {
        self.v.assumptions.clear();
        self.v.assumptions.extend_from_slice(assumps);
        self.solve_internal(th)
    }

    fn get_model(&self) -> &[lbool] {
        &self.model
    }

    fn value_var(&self, v: Var) -> lbool {
        self.model
            .get(v.idx() as usize)
            .map_or(lbool::UNDEF, |&b| b)
    }

    fn value_lvl_0(&self, lit: Lit) -> lbool {
        if self.v.vars.ass.has(lit.var()) && self.v.level_lit(lit) == 0 {
            self.v.value_lit(lit)
        } else {
            lbool::UNDEF
        }
    }

    fn unsat_core(&self) -> &[Lit] {
        self.conflict.as_slice()
    }

    fn is_ok(&self) -> bool {
        self.v.ok
    }

    fn num_vars(&self) -> u32 {
        self.v.num_vars()
    }
    fn num_clauses(&self) -> u64 {
        self.v.num_clauses
    }
    fn num_conflicts(&self) -> u64 {
        self.v.conflicts
    }
    fn num_propagations(&self) -> u64 {
        self.v.propagations
    }
    fn num_decisions(&self) -> u64 {
        self.v.decisions
    }
    fn num_restarts(&self) -> u64 {
        self.v.starts
    }

    fn set_decision_var(&mut self, v: Var, b: bool) {
        self.v.set_decision_var(v, b)
    }

    fn is_decision_var(&self, v: Var) -> bool {
        self.v.decision[v]
    }

    fn set_polarity(&mut self, v: Var, pol: lbool) {
        self.v.user_pol[v] = pol;
    }

    fn polarity(&self, v: Var) -> lbool {
        self.v.user_pol[v]
    }

    fn set_priority(&mut self, v: Var, priority: i32) {
        self.v.vars.priority[v] = priority;
        if self.v.order_heap_data.in_heap(v) {
            self.v.order_heap().update(v);
        }
    }

    fn priority(&self, v: Var) -> i32 {
        self.v.vars.priority[v]
    }

    fn print_stats(&self) {
        let v = &self.v;
        println!("c restarts              : {}", v.starts);
        println!("c conflicts             : {:<12}", v.conflicts);
        println!(
            "c decisions             : {:<12}   ({:4.2} % random)",
            v.decisions,
            v.rnd_decisions as f32 * 100.0 / cmp::max(1, v.decisions) as f32
        );
        println!("c propagations          : {:<12}", v.propagations);
        println!(
            "c conflict literals     : {:<12}   ({:4.2} % deleted)",
            v.tot_literals,
            (v.max_literals - v.tot_literals) as f64 * 100.0 / cmp::max(1, v.max_literals) as f64
        );
        println!(
            "c clause database       : {} clauses, {} learnt, ~{} KiB",
            v.num_clauses,
            v.num_learnts,
            v.mem_used() / 1024
        );
    }
}

impl<Cb: Callbacks + Default> Default for Solver<Cb> {
    fn default() -> Self {
        Solver::new(SolverOpts::default(), Default::default())
    }
}

/// Which check the theory is asked to perform.
enum TheoryCall {
    Partial,
    Final,
}

impl<Cb: Callbacks> Solver<Cb> {
    /// Create a new solver with the given options and callbacks.
    ///
    /// Panics if the options are invalid (see `SolverOpts::check`).
    pub fn new(opts: SolverOpts, cb: Cb) -> Self {
        assert!(opts.check(), "invalid solver options");
        Solver {
            model: vec![],
            conflict: LSet::new(),
            cb,
            clauses: vec![],
            learnts: vec![],
            v: SolverV::new(&opts),
            tmp_th_confl: vec![],
        }
    }

    pub fn cb_mut(&mut self) -> &mut Cb {
        &mut self.cb
    }

    pub fn cb(&self) -> &Cb {
        &self.cb
    }

    /// Install the limits for the next calls, relative to the current
    /// counters.
    pub fn set_budget(&mut self, limits: &ResourceLimits) {
        self.v.budget = Budget::start(limits, self.v.conflicts, self.v.propagations);
    }

    /// Remove all limits.
    pub fn clear_budget(&mut self) {
        self.v.budget = Budget::unlimited();
    }

    /// Estimated memory used by the clause database and variables, in bytes.
    pub fn mem_used(&self) -> usize {
        self.v.mem_used()
    }

    pub fn num_learnts(&self) -> u64 {
        self.v.num_learnts
    }

    /// Reinstate a model saved from an earlier satisfiable call.
    pub(crate) fn restore_model(&mut self, model: Vec<lbool>) {
        self.model = model;
    }

    fn new_decision_level<Th: Theory>(&mut self, th: &mut Th) {
        self.v.vars.new_decision_level();
        th.create_level();
        debug_assert_eq!(
            self.v.decision_level() as usize,
            th.n_levels(),
            "theory and trail disagree on the number of levels"
        );
    }

    fn simplify_internal<Th: Theory>(&mut self, _th: &mut Th) -> bool {
        debug_assert_eq!(self.v.decision_level(), 0);

        if !self.v.ok || self.v.propagate().is_some() {
            self.v.ok = false;
            return false;
        }

        if self.v.num_assigns() as i64 == self.v.simp_db_assigns || self.v.simp_db_props > 0 {
            return true;
        }

        self.remove_satisfied(ClauseSet::Learnt);
        if self.v.remove_satisfied {
            self.remove_satisfied(ClauseSet::Original);
        }
        self.check_garbage();
        self.v.rebuild_order_heap();

        self.v.simp_db_assigns = self.v.num_assigns() as i64;
        self.v.simp_db_props = (self.v.clauses_literals + self.v.learnts_literals) as i64;
        true
    }

    /// Search until `nof_conflicts` conflicts (negative: no bound).
    ///
    /// Returns `TRUE` if an assignment accepted by the theory was found,
    /// `FALSE` if the clauses are unsatisfiable under the assumptions, and
    /// `UNDEF` on restart or when a limit is reached.
    fn search<Th: Theory>(
        &mut self,
        th: &mut Th,
        nof_conflicts: i32,
        tmp_learnt: &mut Vec<Lit>,
    ) -> lbool {
        debug_assert!(self.v.ok);
        let mut conflict_c = 0;
        self.v.starts += 1;

        loop {
            if let Some(confl) = self.v.propagate() {
                self.v.conflicts += 1;
                conflict_c += 1;
                if self.v.decision_level() == 0 {
                    return lbool::FALSE;
                }

                let learnt = self
                    .v
                    .analyze(Conflict::Bcp(confl), &self.learnts, tmp_learnt, th);
                self.add_learnt_and_backtrack(th, learnt, Kind::Learnt);
                self.after_conflict();
                continue;
            }

            if (nof_conflicts >= 0 && conflict_c >= nof_conflicts) || !self.within_budget() {
                self.cancel_until(th, 0);
                return lbool::UNDEF;
            }

            if self.v.decision_level() == 0 && !self.simplify_internal(th) {
                return lbool::FALSE;
            }

            if self.learnts.len() as f64 - self.v.num_assigns() as f64 >= self.v.max_learnts {
                self.reduce_db();
            }

            match self.call_theory(th, TheoryCall::Partial, tmp_learnt) {
                r if r == lbool::UNDEF => continue, // propagated, back to BCP
                r if r == lbool::FALSE => {
                    if !self.v.ok {
                        return lbool::FALSE;
                    }
                    conflict_c += 1;
                    continue;
                }
                _ => (),
            }

            // assumptions first, then the heap
            let mut next = Lit::UNDEF;
            while (self.v.decision_level() as usize) < self.v.assumptions.len() {
                let p = self.v.assumptions[self.v.decision_level() as usize];
                let val = self.v.value_lit(p);
                if val == lbool::TRUE {
                    // dummy level, `p` holds already
                    self.new_decision_level(th);
                } else if val == lbool::FALSE {
                    let mut conflict = mem::replace(&mut self.conflict, LSet::new());
                    self.v.analyze_final(th, !p, &mut conflict);
                    self.cb.on_new_clause(conflict.as_slice(), Kind::Learnt);
                    self.conflict = conflict;
                    return lbool::FALSE;
                } else {
                    next = p;
                    break;
                }
            }

            if next == Lit::UNDEF {
                next = self.v.pick_branch_lit();

                if next == Lit::UNDEF {
                    // full assignment: final check
                    match self.call_theory(th, TheoryCall::Final, tmp_learnt) {
                        r if r == lbool::TRUE => return lbool::TRUE,
                        r if r == lbool::FALSE && !self.v.ok => return lbool::FALSE,
                        r if r == lbool::FALSE => conflict_c += 1,
                        _ => (),
                    }
                    continue;
                }
                self.v.decisions += 1;
            }

            self.new_decision_level(th);
            trace!("decide {:?} at level {}", next, self.v.decision_level());
            self.v.vars.unchecked_enqueue(next, CRef::UNDEF);
        }
    }

    /// Decay activities and adjust the learnt clause limit after a conflict.
    fn after_conflict(&mut self) {
        self.v.vars.var_decay_activity();
        self.v.cla_decay_activity();

        self.v.learntsize_adjust_cnt -= 1;
        if self.v.learntsize_adjust_cnt == 0 {
            self.v.learntsize_adjust_confl *= self.v.learntsize_adjust_inc;
            self.v.learntsize_adjust_cnt = self.v.learntsize_adjust_confl as i32;
            self.v.max_learnts *= self.v.learntsize_inc;

            let v = &self.v;
            self.cb.on_progress(|| ProgressStatus {
                conflicts: v.conflicts,
                dec_vars: v
                    .dec_vars
                    .saturating_sub(v.vars.trail_lim.first().map_or(0, |&x| x as u64)),
                n_clauses: v.num_clauses,
                n_clause_lits: v.clauses_literals,
                max_learnt: v.max_learnts as u64,
                n_learnt: v.num_learnts,
                n_learnt_lits: v.learnts_literals as f64 / cmp::max(1, v.num_learnts) as f64,
                progress_estimate: v.progress_estimate() * 100.0,
            });
        }
    }

    /// Add a learnt clause, backjump, and assert its first literal.
    fn add_learnt_and_backtrack<Th: Theory>(&mut self, th: &mut Th, learnt: LearntClause, k: Kind) {
        self.cb.on_new_clause(learnt.clause, k);
        self.cancel_until(th, learnt.backtrack_lvl);

        match learnt.clause.len() {
            0 => self.v.ok = false,
            1 => self.v.vars.unchecked_enqueue(learnt.clause[0], CRef::UNDEF),
            _ => {
                let cr = self.v.ca.alloc(learnt.clause, true);
                self.learnts.push(cr);
                self.v.attach_clause(cr);
                self.v.cla_bump_activity(&self.learnts, cr);
                self.v.vars.unchecked_enqueue(learnt.clause[0], cr);
            }
        }
    }

    /// Let the theory check the current assignment.
    ///
    /// Returns `UNDEF` if the theory propagated something, `TRUE` if it
    /// accepted the assignment as is, and `FALSE` if it raised a conflict
    /// (which has been learnt already).
    fn call_theory<Th: Theory>(
        &mut self,
        th: &mut Th,
        k: TheoryCall,
        tmp_learnt: &mut Vec<Lit>,
    ) -> lbool {
        let mut confl = mem::take(&mut self.tmp_th_confl);
        confl.clear();
        let outcome = {
            let mut arg = TheoryArg {
                v: &mut self.v,
                lits: &mut confl,
                has_propagated: false,
                conflict: TheoryConflict::Nil,
            };
            match k {
                TheoryCall::Partial => th.partial_check(&mut arg),
                TheoryCall::Final => th.final_check(&mut arg),
            }
            (arg.conflict, arg.has_propagated)
        };

        let res = match outcome {
            (TheoryConflict::Nil, true) => lbool::UNDEF,
            (TheoryConflict::Nil, false) => lbool::TRUE,
            (TheoryConflict::Prop(p), _) => {
                // `p` was propagated but is false: `p ∨ ¬explanation` is false
                debug!("inconsistent theory propagation {:?}", p);
                confl.clear();
                confl.push(p);
                confl.extend(th.explain_propagation(p).iter().map(|&q| !q));
                self.learn_theory_conflict(th, &mut confl, tmp_learnt);
                lbool::FALSE
            }
            (TheoryConflict::Clause, _) => {
                self.learn_theory_conflict(th, &mut confl, tmp_learnt);
                lbool::FALSE
            }
        };
        self.tmp_th_confl = confl;
        res
    }

    /// Analyze a conflict clause produced by the theory.
    ///
    /// The clause may be false at a level below the current one; we first
    /// backjump to that level so that 1-UIP analysis sees a conflict at
    /// the top of the trail.
    fn learn_theory_conflict<Th: Theory>(
        &mut self,
        th: &mut Th,
        confl: &mut Vec<Lit>,
        tmp_learnt: &mut Vec<Lit>,
    ) {
        self.v.conflicts += 1;
        confl.sort_unstable();
        confl.dedup();
        debug_assert!(
            confl.iter().all(|&p| self.v.value_lit(p) == lbool::FALSE),
            "theory conflict {:?} is not false",
            confl
        );
        debug!("theory conflict {:?}", confl);

        let lvl = confl
            .iter()
            .map(|&p| self.v.level_lit(p))
            .max()
            .unwrap_or(0);
        if lvl == 0 {
            self.cancel_until(th, 0);
            self.v.ok = false;
            return;
        }
        if lvl < self.v.decision_level() {
            trace!("theory conflict at level {}, backjump", lvl);
            self.cancel_until(th, lvl);
        }
        let learnt = self
            .v
            .analyze(Conflict::Theory(&confl[..]), &self.learnts, tmp_learnt, th);
        self.add_learnt_and_backtrack(th, learnt, Kind::Theory);
        self.after_conflict();
    }

    /// Main solve loop (assumptions in `self.v.assumptions`).
    fn solve_internal<Th: Theory>(&mut self, th: &mut Th) -> lbool {
        debug_assert_eq!(self.v.decision_level(), 0);
        self.model.clear();
        self.conflict.clear();
        if !self.v.ok {
            return lbool::FALSE;
        }

        let mut tmp_learnt: Vec<Lit> = vec![];

        self.v.max_learnts = (self.v.num_clauses as f64 * self.v.learntsize_factor)
            .max(self.v.min_learnts_lim as f64);
        self.v.learntsize_adjust_confl = self.v.learntsize_adjust_start_confl as f64;
        self.v.learntsize_adjust_cnt = self.v.learntsize_adjust_confl as i32;

        info!("search.start ({} assumptions)", self.v.assumptions.len());
        self.cb.on_start();

        let mut status;
        let mut curr_restarts: i32 = 0;
        loop {
            let base = if self.v.luby_restart {
                utils::luby(self.v.restart_inc, curr_restarts)
            } else {
                f64::powi(self.v.restart_inc, curr_restarts)
            };
            let nof_conflicts = (base * self.v.restart_first as f64) as i32;
            status = self.search(th, nof_conflicts, &mut tmp_learnt);
            if status != lbool::UNDEF || !self.within_budget() {
                break;
            }
            curr_restarts += 1;
            trace!("search.restart({})", curr_restarts);
            self.cb.on_restart();
        }

        self.cb.on_result(status);

        if status == lbool::TRUE {
            let v = &self.v;
            self.model.clear();
            self.model
                .extend((0..v.num_vars()).map(|i| v.value(Var::from_idx(i))));
        } else if status == lbool::FALSE && self.conflict.len() == 0 {
            // not caused by assumptions: unsatisfiable for good
            self.v.ok = false;
        }

        self.cancel_until(th, 0);
        debug!("search.done: {:?}", status);
        status
    }

    /// Remove about half of the learnt clauses, keeping binary clauses and
    /// clauses that are the reason of a current assignment.
    fn reduce_db(&mut self) {
        let extra_lim = self.v.cla_inc / self.learnts.len() as f64;
        {
            let ca = &self.v.ca;
            self.learnts.sort_unstable_by(|&x, &y| {
                let x = ca.get_ref(x);
                let y = ca.get_ref(y);
                (x.size() <= 2).cmp(&(y.size() <= 2)).then(
                    x.activity()
                        .partial_cmp(&y.activity())
                        .unwrap_or(cmp::Ordering::Equal),
                )
            });
        }

        let half = self.learnts.len() / 2;
        let mut kept = Vec::with_capacity(self.learnts.len());
        for (i, &cr) in self.learnts.iter().enumerate() {
            let delete = {
                let c = self.v.ca.get_ref(cr);
                c.size() > 2
                    && !self.v.locked(c)
                    && (i < half || (c.activity() as f64) < extra_lim)
            };
            if delete {
                self.cb.on_delete_clause(self.v.ca.get_ref(cr).lits());
                self.v.remove_clause(cr);
            } else {
                kept.push(cr);
            }
        }
        debug!("reduce_db: deleted {}", self.learnts.len() - kept.len());
        self.learnts = kept;
        self.check_garbage();
    }

    /// Remove satisfied clauses and false literals at level 0.
    fn remove_satisfied(&mut self, which: ClauseSet) {
        debug_assert_eq!(self.v.decision_level(), 0);
        let cs = match which {
            ClauseSet::Learnt => &mut self.learnts,
            ClauseSet::Original => &mut self.clauses,
        };
        let v = &mut self.v;
        cs.retain(|&cr| {
            if v.satisfied(v.ca.get_ref(cr)) {
                v.remove_clause(cr);
                return false;
            }
            let shaved = {
                let vars = &v.vars;
                let mut c = v.ca.get_mut(cr);
                // the two watched literals are unassigned, leave them in place
                let mut k = 2;
                let mut end = c.size();
                while k < end {
                    if vars.value_lit(c[k]) == lbool::FALSE {
                        end -= 1;
                        c.swap(k, end);
                    } else {
                        k += 1;
                    }
                }
                c.shrink(end)
            };
            v.ca.free_amount(shaved);
            true
        });
    }

    /// Backtrack to `level`, keeping assignments made at `level`.
    fn cancel_until<Th: Theory>(&mut self, th: &mut Th, level: u32) {
        let dl = self.v.decision_level();
        if dl > level {
            trace!("cancel-until {} (from {})", level, dl);
            self.v.cancel_until(level);
            th.pop_levels((dl - level) as usize);
        }
    }

    /// Move live clauses into a fresh arena.
    fn garbage_collect(&mut self) {
        let mut to = ClauseArena::with_capacity(self.v.ca.len() - self.v.ca.wasted());
        self.v
            .reloc_all(&mut self.learnts, &mut self.clauses, &mut to);
        let ws = ClauseArena::WORD_SIZE;
        self.cb
            .on_gc(self.v.ca.len() as usize * ws, to.len() as usize * ws);
        self.v.ca = to;
    }

    fn check_garbage(&mut self) {
        if self.v.ca.wasted() as f64 > self.v.ca.len() as f64 * self.v.garbage_frac {
            self.garbage_collect();
        }
    }

    fn within_budget(&self) -> bool {
        let v = &self.v;
        !self.cb.stop() && !v.budget.exhausted(v.conflicts, v.propagations, || v.mem_used())
    }

    /// Add a clause at level 0.
    ///
    /// Precondition: `clause` is sorted, so duplicates and complementary
    /// literals are adjacent.
    fn add_clause_(&mut self, clause: &mut Vec<Lit>) -> bool {
        if !self.v.ok {
            return false;
        }

        let mut last = Lit::UNDEF;
        let mut j = 0;
        for i in 0..clause.len() {
            let lit = clause[i];
            let val = self.v.value_lit(lit);
            let at_root = self.v.level_lit(lit) == 0;
            if (val == lbool::TRUE && at_root) || lit == !last {
                return true; // satisfied, or tautology
            }
            if !(val == lbool::FALSE && at_root) && lit != last {
                last = lit;
                clause[j] = lit;
                j += 1;
            }
        }
        clause.truncate(j);

        match clause.len() {
            0 => {
                self.v.ok = false;
                false
            }
            1 => {
                self.v.vars.unchecked_enqueue(clause[0], CRef::UNDEF);
                true
            }
            _ => {
                let cr = self.v.ca.alloc(clause, false);
                self.clauses.push(cr);
                self.v.attach_clause(cr);
                true
            }
        }
    }
}

/// Conflict raised by the theory during a check.
#[derive(Clone, Copy, Debug)]
enum TheoryConflict {
    Nil,
    Clause,
    Prop(Lit),
}

/// The temporary theory argument, passed to the theory.
///
/// Gives read access to the trail and lets the theory propagate
/// literals or raise a conflict.
pub struct TheoryArg<'a> {
    v: &'a mut SolverV,
    lits: &'a mut Vec<Lit>,
    has_propagated: bool,
    conflict: TheoryConflict,
}

/// A learnt clause produced by `analyze`.
struct LearntClause<'a> {
    clause: &'a [Lit],
    backtrack_lvl: u32,
}

#[derive(Clone, Copy, Debug)]
enum Conflict<'a> {
    /// boolean propagation conflict
    Bcp(CRef),
    /// theory conflict clause, false at the current level
    Theory(&'a [Lit]),
}

impl SolverV {
    #[inline(always)]
    fn num_assigns(&self) -> u32 {
        self.vars.trail.len() as u32
    }

    #[inline(always)]
    fn num_vars(&self) -> u32 {
        self.next_var.idx()
    }

    #[inline(always)]
    fn level(&self, x: Var) -> u32 {
        self.vars.vardata[x].level
    }

    #[inline(always)]
    fn level_lit(&self, x: Lit) -> u32 {
        self.level(x.var())
    }

    #[inline(always)]
    fn value(&self, x: Var) -> lbool {
        self.vars.ass[x]
    }

    #[inline(always)]
    fn value_lit(&self, x: Lit) -> lbool {
        self.vars.value_lit(x)
    }

    #[inline(always)]
    fn reason(&self, x: Var) -> CRef {
        self.vars.vardata[x].reason
    }

    #[inline(always)]
    fn decision_level(&self) -> u32 {
        self.vars.trail_lim.len() as u32
    }

    fn mem_used(&self) -> usize {
        self.ca.len() as usize * ClauseArena::WORD_SIZE
            + self.num_vars() as usize * BYTES_PER_VAR
            + self.vars.trail.capacity() * mem::size_of::<Lit>()
    }

    fn order_heap(&mut self) -> Heap<Var, VarOrder> {
        self.order_heap_data.promote(VarOrder {
            activity: &self.vars.activity,
            priority: &self.vars.priority,
        })
    }

    fn set_decision_var(&mut self, v: Var, b: bool) {
        if b != self.decision[v] {
            if b {
                self.dec_vars += 1;
            } else {
                self.dec_vars -= 1;
            }
        }
        self.decision[v] = b;
        self.insert_var_order(v);
    }

    fn insert_var_order(&mut self, x: Var) {
        if self.decision[x] && !self.order_heap_data.in_heap(x) {
            self.order_heap().insert(x);
        }
    }

    fn cla_decay_activity(&mut self) {
        self.cla_inc *= 1.0 / self.clause_decay;
    }

    fn cla_bump_activity(&mut self, learnts: &[CRef], cr: CRef) {
        let act = {
            let mut c = self.ca.get_mut(cr);
            let a = c.activity() + self.cla_inc as f32;
            c.set_activity(a);
            a
        };
        if act > 1e20 {
            for &l in learnts {
                let mut c = self.ca.get_mut(l);
                let a = c.activity() * 1e-20;
                c.set_activity(a);
            }
            self.cla_inc *= 1e-20;
        }
    }

    /// Next decision literal, or `UNDEF` if every decision variable is assigned.
    fn pick_branch_lit(&mut self) -> Lit {
        let mut next = Var::UNDEF;

        if self.random_var_freq > 0.
            && utils::drand(&mut self.random_seed) < self.random_var_freq
            && !self.order_heap_data.is_empty()
        {
            let i = utils::irand(&mut self.random_seed, self.order_heap_data.len() as i32);
            next = self.order_heap_data.at(i as usize);
            if self.value(next) == lbool::UNDEF && self.decision[next] {
                self.rnd_decisions += 1;
            }
        }

        while next == Var::UNDEF || self.value(next) != lbool::UNDEF || !self.decision[next] {
            match self.order_heap().pop() {
                Some(v) => next = v,
                None => return Lit::UNDEF,
            }
        }

        if self.user_pol[next] != lbool::UNDEF {
            Lit::new(next, self.user_pol[next] == lbool::TRUE)
        } else {
            Lit::new(next, self.polarity[next])
        }
    }

    fn new_var(&mut self, upol: lbool, dvar: bool) -> Var {
        let v = self.next_var;
        self.next_var = Var::from_idx(v.idx() + 1);

        self.watches_data.init(Lit::new(v, false));
        self.watches_data.init(Lit::new(v, true));
        self.vars.ass.insert_default(v, lbool::UNDEF);
        self.vars.vardata.insert_default(v, VarData::default());
        let act = if self.rnd_init_act {
            utils::drand(&mut self.random_seed) * 0.00001
        } else {
            0.0
        };
        self.vars.activity.insert_default(v, act);
        self.vars.priority.insert_default(v, 0);
        self.seen.insert_default(v, Seen::Undef);
        self.polarity.insert_default(v, false);
        self.user_pol.insert_default(v, upol);
        self.decision.insert_default(v, false);
        self.set_decision_var(v, dvar);
        v
    }

    /// Analyze a conflict and produce a 1-UIP clause.
    ///
    /// Preconditions: the decision level is above 0 and the conflict
    /// contains at least one literal assigned at the current level.
    ///
    /// Postconditions: `clause[0]` is the asserting literal; if there are
    /// other literals, `clause[1]` has the highest level among them, which
    /// is the backtrack level.
    fn analyze<'a, Th: Theory>(
        &mut self,
        orig: Conflict,
        learnts: &[CRef],
        out_learnt: &'a mut Vec<Lit>,
        th: &mut Th,
    ) -> LearntClause<'a> {
        out_learnt.clear();
        let conflict_level = self.decision_level();

        if let Conflict::Theory(lits) = orig {
            if lits.len() == 1 {
                out_learnt.push(lits[0]);
                return LearntClause {
                    clause: out_learnt,
                    backtrack_lvl: 0,
                };
            }
        }

        out_learnt.push(Lit::UNDEF); // room for the UIP
        let mut path_c = 0;
        let mut p = Lit::UNDEF;
        let mut index = self.vars.trail.len();
        let mut reason = Reason::Conflict(orig);

        loop {
            // literals to resolve with; `flip` when they are true on the trail
            let (lits, flip): (&[Lit], bool) = match reason {
                Reason::Conflict(Conflict::Theory(lits)) => (lits, false),
                Reason::Conflict(Conflict::Bcp(cr)) => {
                    if self.ca.get_ref(cr).learnt() {
                        self.cla_bump_activity(learnts, cr);
                    }
                    (self.ca.get_ref(cr).lits(), false)
                }
                Reason::Propagated(lit, cr) if cr == CRef::SPECIAL => {
                    let expl = th.explain_propagation(lit);
                    debug_assert!(
                        expl.iter().all(|&q| self.value_lit(q) == lbool::TRUE),
                        "explanation of {:?} is not true: {:?}",
                        lit,
                        expl
                    );
                    (expl, true)
                }
                Reason::Propagated(lit, cr) => {
                    debug_assert_ne!(cr, CRef::UNDEF, "reached decision {:?}", lit);
                    if self.ca.get_ref(cr).learnt() {
                        self.cla_bump_activity(learnts, cr);
                    }
                    let c = self.ca.get_ref(cr);
                    debug_assert_eq!(c[0], lit);
                    (&c.lits()[1..], false)
                }
            };

            for &q in lits {
                let q = if flip { !q } else { q };
                let x = q.var();
                let lvl = self.level(x);
                debug_assert!(lvl <= conflict_level);
                if !self.seen[x].is_seen() && lvl > 0 {
                    self.vars.var_bump_activity(&mut self.order_heap_data, x);
                    self.seen[x] = Seen::Source;
                    if lvl == conflict_level {
                        path_c += 1;
                    } else {
                        out_learnt.push(q);
                    }
                }
            }

            // next marked literal on the trail
            while !self.seen[self.vars.trail[index - 1].var()].is_seen() {
                index -= 1;
            }
            index -= 1;
            p = self.vars.trail[index];
            self.seen[p.var()] = Seen::Undef;
            path_c -= 1;
            if path_c <= 0 {
                break;
            }
            reason = Reason::Propagated(p, self.reason(p.var()));
        }

        debug_assert_ne!(p, Lit::UNDEF);
        out_learnt[0] = !p;
        self.max_literals += out_learnt.len() as u64;

        self.minimize_conflict(out_learnt);

        let btlevel = if out_learnt.len() == 1 {
            0
        } else {
            let mut max_i = 1;
            for i in 2..out_learnt.len() {
                if self.level_lit(out_learnt[i]) > self.level_lit(out_learnt[max_i]) {
                    max_i = i;
                }
            }
            out_learnt.swap(1, max_i);
            self.level_lit(out_learnt[1])
        };

        for &lit in &self.analyze_toclear {
            self.seen[lit.var()] = Seen::Undef;
        }
        trace!("learnt {:?} (backjump to {})", out_learnt, btlevel);
        LearntClause {
            clause: out_learnt,
            backtrack_lvl: btlevel,
        }
    }

    #[inline]
    fn abstract_level(&self, v: Var) -> u32 {
        1 << (self.level(v) & 31)
    }

    fn minimize_conflict(&mut self, out_learnt: &mut Vec<Lit>) {
        self.analyze_toclear.clear();
        self.analyze_toclear.extend_from_slice(out_learnt);

        let new_size = match self.ccmin_mode {
            2 => {
                let abstract_levels = out_learnt[1..]
                    .iter()
                    .fold(0, |acc, a| acc | self.abstract_level(a.var()));
                let mut j = 1;
                for i in 1..out_learnt.len() {
                    let lit = out_learnt[i];
                    if self.reason(lit.var()) == CRef::UNDEF
                        || !self.lit_redundant(lit, abstract_levels)
                    {
                        out_learnt[j] = lit;
                        j += 1;
                    }
                }
                j
            }
            1 => {
                let mut j = 1;
                for i in 1..out_learnt.len() {
                    let lit = out_learnt[i];
                    let reason = self.reason(lit.var());
                    let keep = reason == CRef::UNDEF
                        || reason == CRef::SPECIAL
                        || self.ca.get_ref(reason).lits()[1..]
                            .iter()
                            .any(|q| !self.seen[q.var()].is_seen() && self.level(q.var()) > 0);
                    if keep {
                        out_learnt[j] = lit;
                        j += 1;
                    }
                }
                j
            }
            _ => out_learnt.len(),
        };

        self.tot_literals += new_size as u64;
        out_learnt.truncate(new_size);
    }

    /// Can `p` be removed from the learnt clause? It can if its reason is
    /// made of literals that are at level 0, in the clause, or themselves
    /// removable.
    fn lit_redundant(&mut self, p: Lit, abstract_levels: u32) -> bool {
        self.minimize_stack.clear();
        self.minimize_stack.push(p);
        let top = self.analyze_toclear.len();

        while let Some(q) = self.minimize_stack.pop() {
            let cr = self.reason(q.var());
            debug_assert_ne!(cr, CRef::UNDEF);

            if cr == CRef::SPECIAL {
                if self.level(q.var()) == 0 {
                    continue;
                }
                // theory explanations are not resolved here
                self.undo_redundant(top);
                return false;
            }

            let mut failed = false;
            let c = self.ca.get_ref(cr);
            for &l in &c.lits()[1..] {
                let x = l.var();
                if self.level(x) == 0 || self.seen[x] == Seen::Source {
                    continue;
                }
                let r = self.reason(x);
                if r != CRef::UNDEF && (self.abstract_level(x) & abstract_levels) != 0 {
                    self.seen[x] = Seen::Source;
                    self.minimize_stack.push(l);
                    self.analyze_toclear.push(l);
                } else {
                    failed = true;
                    break;
                }
            }
            if failed {
                self.undo_redundant(top);
                return false;
            }
        }
        true
    }

    fn undo_redundant(&mut self, top: usize) {
        for a in &self.analyze_toclear[top..] {
            self.seen[a.var()] = Seen::Undef;
        }
        self.analyze_toclear.truncate(top);
    }

    /// Express the final conflict in terms of assumptions: compute the set
    /// of assumptions that led to the assignment of `p`, and store it in
    /// `out_conflict` (negated, together with `p`).
    fn analyze_final<Th: Theory>(&mut self, th: &mut Th, p: Lit, out_conflict: &mut LSet) {
        out_conflict.clear();
        out_conflict.insert(p);
        debug!("analyze_final {:?}", p);

        if self.decision_level() == 0 {
            return;
        }

        self.seen[p.var()] = Seen::Source;
        let start = self.vars.trail_lim[0] as usize;
        for i in (start..self.vars.trail.len()).rev() {
            let lit = self.vars.trail[i];
            let x = lit.var();
            if !self.seen[x].is_seen() {
                continue;
            }
            let reason = self.reason(x);
            if reason == CRef::UNDEF {
                debug_assert!(self.level(x) > 0);
                out_conflict.insert(!lit);
            } else if reason == CRef::SPECIAL {
                for &q in th.explain_propagation(lit) {
                    if self.level(q.var()) > 0 {
                        self.seen[q.var()] = Seen::Source;
                    }
                }
            } else {
                let c = self.ca.get_ref(reason);
                for &q in &c.lits()[1..] {
                    if self.level(q.var()) > 0 {
                        self.seen[q.var()] = Seen::Source;
                    }
                }
            }
            self.seen[x] = Seen::Undef;
        }
        self.seen[p.var()] = Seen::Undef;
    }

    /// Unit propagation over the watched literals.
    ///
    /// Returns the conflicting clause, if any. The propagation queue is
    /// empty afterwards, even on conflict.
    fn propagate(&mut self) -> Option<CRef> {
        let mut confl = None;
        let mut num_props: u64 = 0;

        while self.qhead < self.vars.trail.len() {
            let p = self.vars.trail[self.qhead];
            self.qhead += 1;
            num_props += 1;

            let mut ws = mem::take(
                self.watches_data
                    .lookup_mut_pred(p, &WatcherDeleted { ca: &self.ca }),
            );
            let false_lit = !p;
            let mut i = 0;
            let mut j = 0;
            'clauses: while i < ws.len() {
                let blocker = ws[i].blocker;
                if self.vars.value_lit(blocker) == lbool::TRUE {
                    ws[j] = ws[i];
                    j += 1;
                    i += 1;
                    continue;
                }

                let cr = ws[i].cref;
                i += 1;
                let mut c = self.ca.get_mut(cr);
                // make sure the false literal is c[1]
                if c[0] == false_lit {
                    c.swap(0, 1);
                }
                debug_assert_eq!(c[1], false_lit);

                let first = c[0];
                let w = Watcher::new(cr, first);
                if first != blocker && self.vars.value_lit(first) == lbool::TRUE {
                    ws[j] = w;
                    j += 1;
                    continue;
                }

                for k in 2..c.size() {
                    if self.vars.value_lit(c[k]) != lbool::FALSE {
                        c.swap(1, k);
                        let new_watch = !c[1];
                        debug_assert_ne!(new_watch, p);
                        self.watches_data[new_watch].push(w);
                        continue 'clauses;
                    }
                }

                // unit or conflicting
                ws[j] = w;
                j += 1;
                if self.vars.value_lit(first) == lbool::FALSE {
                    confl = Some(cr);
                    self.qhead = self.vars.trail.len();
                    while i < ws.len() {
                        ws[j] = ws[i];
                        j += 1;
                        i += 1;
                    }
                } else {
                    self.vars.unchecked_enqueue(first, cr);
                }
            }
            ws.truncate(j);
            self.watches_data[p] = ws;
        }
        self.propagations += num_props;
        self.simp_db_props -= num_props as i64;
        confl
    }

    fn rebuild_order_heap(&mut self) {
        let vs: Vec<Var> = (0..self.num_vars())
            .map(Var::from_idx)
            .filter(|&v| self.decision[v] && self.value(v) == lbool::UNDEF)
            .collect();
        self.order_heap().build(&vs);
    }

    /// Relocate every clause into `to`.
    fn reloc_all(
        &mut self,
        learnts: &mut Vec<CRef>,
        clauses: &mut Vec<CRef>,
        to: &mut ClauseArena,
    ) {
        self.watches_data
            .clean_all_pred(&WatcherDeleted { ca: &self.ca });
        for v in (0..self.num_vars()).map(Var::from_idx) {
            for &sign in &[false, true] {
                let p = Lit::new(v, sign);
                for w in self.watches_data[p].iter_mut() {
                    self.ca.reloc(&mut w.cref, to);
                }
            }
        }

        // reasons of current assignments
        for i in 0..self.vars.trail.len() {
            let v = self.vars.trail[i].var();
            let reason = self.reason(v);
            if reason != CRef::UNDEF && reason != CRef::SPECIAL {
                let keep = {
                    let c = self.ca.get_ref(reason);
                    c.reloced() || self.locked(c)
                };
                if keep {
                    let mut r = reason;
                    self.ca.reloc(&mut r, to);
                    self.vars.vardata[v].reason = r;
                }
            }
        }

        for cs in &mut [learnts, clauses] {
            let ca = &mut self.ca;
            cs.retain(|&cr| ca.get_ref(cr).mark() != 1);
            for cr in cs.iter_mut() {
                ca.reloc(cr, to);
            }
        }
    }

    fn attach_clause(&mut self, cr: CRef) {
        let (c0, c1, learnt, size) = {
            let c = self.ca.get_ref(cr);
            debug_assert!(c.size() > 1);
            (c[0], c[1], c.learnt(), c.size() as u64)
        };
        self.watches_data[!c0].push(Watcher::new(cr, c1));
        self.watches_data[!c1].push(Watcher::new(cr, c0));
        if learnt {
            self.num_learnts += 1;
            self.learnts_literals += size;
        } else {
            self.num_clauses += 1;
            self.clauses_literals += size;
        }
    }

    fn cancel_until(&mut self, level: u32) {
        debug_assert!(self.decision_level() > level);
        let lim_last = *self.vars.trail_lim.last().unwrap_or(&0) as usize;
        let lim = self.vars.trail_lim[level as usize] as usize;
        for c in (lim..self.vars.trail.len()).rev() {
            let lit = self.vars.trail[c];
            let x = lit.var();
            self.vars.ass[x] = lbool::UNDEF;
            if self.phase_saving > 1 || (self.phase_saving == 1 && c > lim_last) {
                self.polarity[x] = lit.sign();
            }
            self.insert_var_order(x);
        }
        self.qhead = lim;
        self.vars.trail.truncate(lim);
        self.vars.trail_lim.truncate(level as usize);
    }

    /// Lazily detach a clause: its watch lists are marked for cleanup.
    fn detach_clause(&mut self, cr: CRef) {
        let (c0, c1, size, learnt) = {
            let c = self.ca.get_ref(cr);
            (c[0], c[1], c.size() as u64, c.learnt())
        };
        self.watches_data.smudge(!c0);
        self.watches_data.smudge(!c1);
        if learnt {
            self.num_learnts -= 1;
            self.learnts_literals -= size;
        } else {
            self.num_clauses -= 1;
            self.clauses_literals -= size;
        }
    }

    fn remove_clause(&mut self, cr: CRef) {
        self.detach_clause(cr);
        {
            let c = self.ca.get_ref(cr);
            if self.locked(c) {
                // don't leave a dangling reason
                self.vars.vardata[c[0].var()].reason = CRef::UNDEF;
            }
        }
        self.ca.get_mut(cr).set_mark(1);
        self.ca.free(cr);
    }

    fn satisfied(&self, c: ClauseRef) -> bool {
        c.iter().any(|&lit| self.value_lit(lit) == lbool::TRUE)
    }

    /// Is `c` the reason of its first literal?
    fn locked(&self, c: ClauseRef) -> bool {
        let reason = self.reason(c[0].var());
        self.value_lit(c[0]) == lbool::TRUE
            && reason != CRef::UNDEF
            && reason != CRef::SPECIAL
            && self.ca.get_ref(reason).same_as(&c)
    }

    fn progress_estimate(&self) -> f64 {
        let n = self.num_vars().max(1) as f64;
        let f = 1.0 / n;
        let dl = self.decision_level() as usize;
        let mut progress = 0.0;
        for i in 0..=dl {
            let beg = if i == 0 { 0 } else { self.vars.trail_lim[i - 1] as usize };
            let end = if i == dl {
                self.vars.trail.len()
            } else {
                self.vars.trail_lim[i] as usize
            };
            progress += f64::powi(f, i as i32) * (end - beg) as f64;
        }
        progress / n
    }

    fn new(opts: &SolverOpts) -> Self {
        SolverV {
            vars: VarState {
                ass: VMap::new(),
                vardata: VMap::new(),
                activity: VMap::new(),
                priority: VMap::new(),
                var_inc: 1.0,
                var_decay: opts.var_decay,
                trail: vec![],
                trail_lim: vec![],
            },
            learntsize_adjust_start_confl: 100,
            learntsize_adjust_inc: 1.5,
            max_learnts: 0.0,
            learntsize_adjust_confl: 0.0,
            learntsize_adjust_cnt: 0,
            remove_satisfied: true,

            starts: 0,
            decisions: 0,
            rnd_decisions: 0,
            propagations: 0,
            conflicts: 0,
            dec_vars: 0,
            max_literals: 0,
            tot_literals: 0,
            num_clauses: 0,
            num_learnts: 0,
            clauses_literals: 0,
            learnts_literals: 0,

            clause_decay: opts.clause_decay,
            random_var_freq: opts.random_var_freq,
            random_seed: opts.random_seed,
            luby_restart: opts.luby_restart,
            ccmin_mode: opts.ccmin_mode,
            phase_saving: opts.phase_saving,
            rnd_init_act: opts.rnd_init_act,
            garbage_frac: opts.garbage_frac,
            min_learnts_lim: opts.min_learnts_lim,
            restart_first: opts.restart_first,
            restart_inc: opts.restart_inc,
            learntsize_factor: 1.0 / 3.0,
            learntsize_inc: 1.1,

            polarity: VMap::new(),
            user_pol: VMap::new(),
            decision: VMap::new(),
            watches_data: OccListsData::new(),
            order_heap_data: HeapData::new(),
            ok: true,
            cla_inc: 1.0,
            qhead: 0,
            simp_db_assigns: -1,
            simp_db_props: 0,
            next_var: Var::from_idx(0),
            ca: ClauseArena::new(),
            assumptions: vec![],
            seen: VMap::new(),
            minimize_stack: vec![],
            analyze_toclear: vec![],
            budget: Budget::unlimited(),
        }
    }
}

impl VarState {
    fn new_decision_level(&mut self) {
        self.trail_lim.push(self.trail.len() as u32);
    }

    #[inline(always)]
    fn value_lit(&self, x: Lit) -> lbool {
        self.ass[x.var()] ^ !x.sign()
    }

    fn var_decay_activity(&mut self) {
        self.var_inc *= 1.0 / self.var_decay;
    }

    fn unchecked_enqueue(&mut self, p: Lit, from: CRef) {
        debug_assert_eq!(self.value_lit(p), lbool::UNDEF, "{:?} is assigned", p);
        self.ass[p.var()] = lbool::new(p.sign());
        self.vardata[p.var()] = VarData {
            reason: from,
            level: self.trail_lim.len() as u32,
        };
        self.trail.push(p);
    }

    fn var_bump_activity(&mut self, order_heap_data: &mut HeapData<Var>, v: Var) {
        self.activity[v] += self.var_inc;
        if self.activity[v] > 1e100 {
            for (_, x) in self.activity.iter_mut() {
                *x *= 1e-100;
            }
            self.var_inc *= 1e-100;
        }
        if order_heap_data.in_heap(v) {
            order_heap_data
                .promote(VarOrder {
                    activity: &self.activity,
                    priority: &self.priority,
                })
                .decrease(v);
        }
    }
}

impl<'a> TheoryArg<'a> {
    /// `false` once a conflict has been raised in this check.
    #[inline]
    pub fn is_ok(&self) -> bool {
        matches!(self.conflict, TheoryConflict::Nil)
    }

    /// Current value of `v`.
    #[inline(always)]
    pub fn value(&self, v: Var) -> lbool {
        self.v.value(v)
    }

    /// Current value of `lit`.
    #[inline(always)]
    pub fn value_lit(&self, lit: Lit) -> lbool {
        self.v.value_lit(lit)
    }

    /// The current (possibly partial) assignment, in trail order.
    #[inline(always)]
    pub fn model(&self) -> &[Lit] {
        &self.v.vars.trail
    }

    pub fn decision_level(&self) -> u32 {
        self.v.decision_level()
    }

    /// Propagate `p`, which must be implied by the current assignment.
    ///
    /// The theory must be able to explain `p` through
    /// `Theory::explain_propagation` for as long as `p` stays on the trail.
    ///
    /// Returns `false` if `p` is false, in which case this counts as a
    /// conflict and the theory should return as soon as possible.
    pub fn propagate(&mut self, p: Lit) -> bool {
        if !self.is_ok() {
            return false;
        }
        let val = self.v.value_lit(p);
        if val == lbool::TRUE {
            true
        } else if val == lbool::UNDEF {
            self.has_propagated = true;
            self.v.vars.unchecked_enqueue(p, CRef::SPECIAL);
            true
        } else {
            self.conflict = TheoryConflict::Prop(p);
            false
        }
    }

    /// Raise a conflict: `lits` is a clause valid in the theory whose
    /// literals are all false in the current assignment. The solver learns
    /// from it and backjumps.
    pub fn raise_conflict(&mut self, lits: &[Lit]) {
        if self.is_ok() {
            self.conflict = TheoryConflict::Clause;
            self.lits.clear();
            self.lits.extend_from_slice(lits);
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum ClauseSet {
    Original,
    Learnt,
}

/// What to resolve with during `analyze`.
#[derive(Clone, Copy, Debug)]
enum Reason<'a> {
    Conflict(Conflict<'a>),
    Propagated(Lit, CRef),
}

#[derive(Debug, Clone, Copy)]
struct VarData {
    reason: CRef,
    level: u32,
}

impl Default for VarData {
    fn default() -> Self {
        VarData {
            reason: CRef::UNDEF,
            level: 0,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Watcher {
    cref: CRef,
    blocker: Lit,
}

impl Watcher {
    fn new(cref: CRef, blocker: Lit) -> Self {
        Watcher { cref, blocker }
    }
}

/// Decision order: higher priority first, then higher activity.
struct VarOrder<'a> {
    activity: &'a VMap<f64>,
    priority: &'a VMap<i32>,
}

impl<'a> Comparator<Var> for VarOrder<'a> {
    fn cmp(&self, lhs: &Var, rhs: &Var) -> cmp::Ordering {
        self.priority[*rhs].cmp(&self.priority[*lhs]).then_with(|| {
            self.activity[*rhs]
                .partial_cmp(&self.activity[*lhs])
                .expect("NaN activity")
        })
    }
}

struct WatcherDeleted<'a> {
    ca: &'a ClauseArena,
}

impl<'a> DeletePred<Watcher> for WatcherDeleted<'a> {
    #[inline]
    fn deleted(&self, w: &Watcher) -> bool {
        self.ca.get_ref(w.cref).mark() == 1
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Seen {
    Undef,
    Source,
}

impl Default for Seen {
    fn default() -> Self {
        Seen::Undef
    }
}

impl Seen {
    #[inline(always)]
    fn is_seen(&self) -> bool {
        *self != Seen::Undef
    }
}

mod utils {
    /// Finite subsequences of the Luby sequence:
    ///
    /// > 0: 1
    /// > 1: 1 1 2
    /// > 2: 1 1 2 1 1 2 4
    /// > 3: 1 1 2 1 1 2 4 1 1 2 1 1 2 4 8
    pub(super) fn luby(y: f64, mut x: i32) -> f64 {
        let mut size = 1;
        let mut seq = 0;
        while size < x + 1 {
            seq += 1;
            size = 2 * size + 1;
        }
        while size - 1 != x {
            size = (size - 1) >> 1;
            seq -= 1;
            x %= size;
        }
        f64::powi(y, seq)
    }

    pub(super) fn drand(seed: &mut f64) -> f64 {
        *seed *= 1389796.0;
        let q = (*seed / 2147483647.0) as i32;
        *seed -= q as f64 * 2147483647.0;
        *seed / 2147483647.0
    }

    pub(super) fn irand(seed: &mut f64, size: i32) -> i32 {
        (drand(seed) * size as f64) as i32
    }
}

/// Options of the CDCL core.
#[derive(Debug, Clone, PartialEq)]
pub struct SolverOpts {
    pub var_decay: f64,
    pub clause_decay: f64,
    pub random_var_freq: f64,
    pub random_seed: f64,
    /// Conflict clause minimization (0=none, 1=basic, 2=deep).
    pub ccmin_mode: i32,
    /// Phase saving (0=none, 1=limited, 2=full).
    pub phase_saving: i32,
    pub rnd_init_act: bool,
    pub luby_restart: bool,
    pub restart_first: i32,
    pub restart_inc: f64,
    /// Fraction of wasted arena space that triggers a garbage collection.
    pub garbage_frac: f64,
    pub min_learnts_lim: i32,
}

impl Default for SolverOpts {
    fn default() -> SolverOpts {
        SolverOpts {
            var_decay: 0.95,
            clause_decay: 0.999,
            random_var_freq: 0.0,
            random_seed: 91648253.0,
            ccmin_mode: 2,
            phase_saving: 2,
            rnd_init_act: false,
            luby_restart: true,
            restart_first: 100,
            restart_inc: 2.0,
            garbage_frac: 0.20,
            min_learnts_lim: 0,
        }
    }
}

impl SolverOpts {
    /// Check that options are within their valid ranges.
    pub fn check(&self) -> bool {
        (0.0 < self.var_decay && self.var_decay < 1.0)
            && (0.0 < self.clause_decay && self.clause_decay < 1.0)
            && (0.0 <= self.random_var_freq && self.random_var_freq <= 1.0)
            && (0.0 < self.random_seed && self.random_seed < f64::INFINITY)
            && (0..=2).contains(&self.ccmin_mode)
            && (0..=2).contains(&self.phase_saving)
            && 1 <= self.restart_first
            && (1.0 < self.restart_inc && self.restart_inc < f64::INFINITY)
            && (0.0 < self.garbage_frac && self.garbage_frac < f64::INFINITY)
            && 0 <= self.min_learnts_lim
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::callbacks::Basic;
    use crate::theory::EmptyTheory;

    fn solver() -> Solver<Basic> {
        Solver::new(SolverOpts::default(), Basic::new())
    }

    fn lits(s: &mut Solver<Basic>, n: usize) -> Vec<Lit> {
        (0..n).map(|_| Lit::new(s.new_var_default(), true)).collect()
    }

    #[test]
    fn test_luby() {
        let seq: Vec<f64> = (0..7).map(|i| utils::luby(2.0, i)).collect();
        assert_eq!(seq, vec![1., 1., 2., 1., 1., 2., 4.]);
    }

    #[test]
    fn test_opts_check() {
        assert!(SolverOpts::default().check());
        let bad = SolverOpts {
            ccmin_mode: 3,
            ..SolverOpts::default()
        };
        assert!(!bad.check());
    }

    #[test]
    fn test_pigeons_unsat() {
        // 3 pigeons, 2 holes
        let mut s = solver();
        let p: Vec<Vec<Lit>> = (0..3).map(|_| lits(&mut s, 2)).collect();
        for i in 0..3 {
            s.add_clause_reuse(&mut p[i].clone());
        }
        for h in 0..2 {
            for i in 0..3 {
                for j in i + 1..3 {
                    s.add_clause_reuse(&mut vec![!p[i][h], !p[j][h]]);
                }
            }
        }
        assert_eq!(s.solve_limited(&[]), lbool::FALSE);
        assert!(!s.is_ok());
    }

    #[test]
    fn test_assumptions_core() {
        let mut s = solver();
        let x = lits(&mut s, 3);
        s.add_clause_reuse(&mut vec![!x[0], x[1]]);
        s.add_clause_reuse(&mut vec![!x[1], !x[2]]);
        assert_eq!(s.solve_limited(&[x[0], x[2]]), lbool::FALSE);
        let core = s.unsat_core().to_vec();
        assert!(core.contains(&!x[0]) || core.contains(&!x[2]));
        assert!(s.is_ok());
        assert_eq!(s.solve_limited(&[x[0]]), lbool::TRUE);
        assert_eq!(s.value_lit(x[1]), lbool::TRUE);
        assert_eq!(s.value_lit(x[2]), lbool::FALSE);
    }

    #[test]
    fn test_model_invalidated() {
        let mut s = solver();
        let x = lits(&mut s, 2);
        s.add_clause_reuse(&mut vec![x[0], x[1]]);
        assert_eq!(s.solve_limited(&[]), lbool::TRUE);
        assert!(!s.get_model().is_empty());
        s.add_clause_reuse(&mut vec![!x[0]]);
        assert!(s.get_model().is_empty());
    }

    #[test]
    fn test_priority_and_polarity() {
        let mut s = solver();
        let x = lits(&mut s, 4);
        s.add_clause_reuse(&mut vec![!x[0], !x[3]]);
        s.set_polarity(x[0].var(), lbool::TRUE);
        s.set_polarity(x[3].var(), lbool::TRUE);
        s.set_priority(x[3].var(), 10);
        assert_eq!(s.priority(x[3].var()), 10);
        assert_eq!(s.solve_limited(&[]), lbool::TRUE);
        // x3 is decided first, which forces x0
        assert_eq!(s.value_lit(x[3]), lbool::TRUE);
        assert_eq!(s.value_lit(x[0]), lbool::FALSE);
    }

    #[test]
    fn test_conflict_budget() {
        let mut s = solver();
        let p: Vec<Vec<Lit>> = (0..8).map(|_| lits(&mut s, 7)).collect();
        for i in 0..8 {
            s.add_clause_reuse(&mut p[i].clone());
        }
        for h in 0..7 {
            for i in 0..8 {
                for j in i + 1..8 {
                    s.add_clause_reuse(&mut vec![!p[i][h], !p[j][h]]);
                }
            }
        }
        s.set_budget(&ResourceLimits {
            conflicts: Some(5),
            ..ResourceLimits::default()
        });
        assert_eq!(s.solve_limited_th(&mut EmptyTheory::new(), &[]), lbool::UNDEF);
        assert!(s.is_ok());
    }
}
