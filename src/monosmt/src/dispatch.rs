//! Routing of assignments to theory solvers.
//!
//! The dispatcher is the single `Theory` seen by the CDCL core. It owns all
//! theory solvers, delivers each new trail literal to the solvers watching
//! its variable, runs their checks in a fixed order (bitvectors, graphs,
//! geometry, state machines), and stores the explanation of every theory
//! propagation at the moment it is made.

use crate::{
    bv::{BvTable, BvTheory},
    clause::{lbool, Lit, VMap, Var},
    config::TheoryOpts,
    fsm::FsmTheory,
    geometry::CsgTheory,
    graph::GraphTheory,
    theory::{Theory, TheoryArg},
};

/// Identifies a theory solver in the watch table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TheoryId {
    Bv,
    Graph(u32),
    Csg,
    Fsm,
}

/// A theory solver driven by the dispatcher.
pub(crate) trait TheorySolver {
    /// A watched literal became true. Must be idempotent.
    fn on_assign(&mut self, lit: Lit);

    fn new_level(&mut self);

    fn backtrack(&mut self, n: usize);

    /// Check the current assignment. With `full`, everything is rechecked
    /// rather than only what changed since the last check.
    fn check(&mut self, cx: &mut CheckCx, full: bool);
}

/// Explanations of theory propagations, indexed by variable.
///
/// Explanations are copied when the propagation happens and dropped when
/// the level they were made at is popped.
#[derive(Default)]
pub(crate) struct ReasonStore {
    lits: Vec<Lit>,
    index: VMap<(u32, u32)>,
    lims: Vec<usize>,
}

impl ReasonStore {
    fn store(&mut self, v: Var, reason: &[Lit]) {
        let start = self.lits.len() as u32;
        self.lits.extend_from_slice(reason);
        self.index.insert(v, (start, reason.len() as u32), (0, 0));
    }

    fn get(&self, v: Var) -> &[Lit] {
        match self.index.get(v) {
            Some(&(start, len)) => &self.lits[start as usize..(start + len) as usize],
            None => &[],
        }
    }

    fn push_level(&mut self) {
        self.lims.push(self.lits.len());
    }

    fn pop_levels(&mut self, n: usize) {
        let lvl = self.lims.len() - n;
        self.lits.truncate(self.lims[lvl]);
        self.lims.truncate(lvl);
    }
}

/// What a theory can see and do during a check.
pub(crate) struct CheckCx<'a, 'b: 'a> {
    arg: &'a mut TheoryArg<'b>,
    reasons: &'a mut ReasonStore,
    pub(crate) bv: &'a BvTable,
    propagate: bool,
    n_props: usize,
    tmp: Vec<Lit>,
}

impl<'a, 'b: 'a> CheckCx<'a, 'b> {
    #[inline]
    pub fn value(&self, lit: Lit) -> lbool {
        self.arg.value_lit(lit)
    }

    #[inline]
    pub fn is_true(&self, lit: Lit) -> bool {
        self.value(lit) == lbool::TRUE
    }

    #[inline]
    pub fn is_ok(&self) -> bool {
        self.arg.is_ok()
    }

    /// Did this round propagate or conflict?
    fn progressed(&self) -> bool {
        self.n_props > 0 || !self.is_ok()
    }

    /// Propagate `p` because of `reason`, a set of true literals.
    ///
    /// If `p` is false, a conflict is raised instead and `false` is
    /// returned. If theory propagation is disabled, only that conflict
    /// detection happens.
    pub fn propagate(&mut self, p: Lit, reason: &[Lit]) -> bool {
        if !self.is_ok() {
            return false;
        }
        debug_assert!(
            reason.iter().all(|&q| self.is_true(q)),
            "explanation {:?} of {:?} is not true",
            reason,
            p
        );
        let v = self.value(p);
        if v == lbool::TRUE {
            true
        } else if v == lbool::FALSE {
            self.tmp.clear();
            self.tmp.push(p);
            self.tmp.extend(reason.iter().map(|&q| !q));
            self.arg.raise_conflict(&self.tmp);
            false
        } else {
            if self.propagate {
                trace!("theory propagation {:?} because {:?}", p, reason);
                self.reasons.store(p.var(), reason);
                self.arg.propagate(p);
                self.n_props += 1;
            }
            true
        }
    }

    /// `lits` are true and jointly inconsistent.
    pub fn conflict(&mut self, lits: &[Lit]) {
        debug_assert!(
            lits.iter().all(|&q| self.is_true(q)),
            "conflict {:?} is not true",
            lits
        );
        self.tmp.clear();
        self.tmp.extend(lits.iter().map(|&q| !q));
        self.arg.raise_conflict(&self.tmp);
    }
}

/// The theory combination seen by the core.
pub(crate) struct Dispatch {
    pub bv_table: BvTable,
    pub bv: BvTheory,
    pub graphs: Vec<GraphTheory>,
    pub csg: Option<CsgTheory>,
    pub fsm: Option<FsmTheory>,
    owners: VMap<Vec<TheoryId>>,
    reasons: ReasonStore,
    /// Trail prefix already delivered to the solvers.
    seen: usize,
    seen_lims: Vec<usize>,
    opts: TheoryOpts,
}

fn solvers<'a>(
    bv: &'a mut BvTheory,
    graphs: &'a mut [GraphTheory],
    csg: &'a mut Option<CsgTheory>,
    fsm: &'a mut Option<FsmTheory>,
) -> impl Iterator<Item = &'a mut dyn TheorySolver> {
    std::iter::once(bv as &mut dyn TheorySolver)
        .chain(graphs.iter_mut().map(|g| g as &mut dyn TheorySolver))
        .chain(csg.iter_mut().map(|c| c as &mut dyn TheorySolver))
        .chain(fsm.iter_mut().map(|f| f as &mut dyn TheorySolver))
}

impl Dispatch {
    pub fn new(opts: TheoryOpts) -> Self {
        Dispatch {
            bv_table: BvTable::default(),
            bv: BvTheory::default(),
            graphs: vec![],
            csg: None,
            fsm: None,
            owners: VMap::new(),
            reasons: ReasonStore::default(),
            seen: 0,
            seen_lims: vec![],
            opts,
        }
    }

    /// Deliver assignments of `v` to theory `id`.
    pub fn watch(&mut self, v: Var, id: TheoryId) {
        self.owners.reserve_default(v);
        let w = &mut self.owners[v];
        if !w.contains(&id) {
            w.push(id);
        }
    }

    fn route(&mut self, acts: &TheoryArg) {
        let trail = acts.model();
        for &lit in &trail[self.seen..] {
            let ids = match self.owners.get(lit.var()) {
                Some(ids) => ids,
                None => continue,
            };
            for &id in ids {
                match id {
                    TheoryId::Bv => self.bv.on_assign(lit),
                    TheoryId::Graph(g) => self.graphs[g as usize].on_assign(lit),
                    TheoryId::Csg => {
                        if let Some(c) = self.csg.as_mut() {
                            c.on_assign(lit)
                        }
                    }
                    TheoryId::Fsm => {
                        if let Some(f) = self.fsm.as_mut() {
                            f.on_assign(lit)
                        }
                    }
                }
            }
        }
        self.seen = trail.len();
    }

    fn run(&mut self, acts: &mut TheoryArg, full: bool) {
        self.route(acts);
        let mut cx = CheckCx {
            arg: acts,
            reasons: &mut self.reasons,
            bv: &self.bv_table,
            propagate: self.opts.theory_propagation,
            n_props: 0,
            tmp: vec![],
        };
        for th in solvers(&mut self.bv, &mut self.graphs, &mut self.csg, &mut self.fsm) {
            th.check(&mut cx, full);
            if cx.progressed() {
                debug!("theory check: {} propagations, ok={}", cx.n_props, cx.is_ok());
                return;
            }
        }
    }
}

impl Theory for Dispatch {
    fn final_check(&mut self, acts: &mut TheoryArg) {
        self.run(acts, true)
    }

    fn partial_check(&mut self, acts: &mut TheoryArg) {
        self.run(acts, false)
    }

    fn create_level(&mut self) {
        self.seen_lims.push(self.seen);
        self.reasons.push_level();
        for th in solvers(&mut self.bv, &mut self.graphs, &mut self.csg, &mut self.fsm) {
            th.new_level();
        }
    }

    fn pop_levels(&mut self, n: usize) {
        debug_assert!(n <= self.seen_lims.len());
        let lvl = self.seen_lims.len() - n;
        self.seen = self.seen_lims[lvl];
        self.seen_lims.truncate(lvl);
        self.reasons.pop_levels(n);
        for th in solvers(&mut self.bv, &mut self.graphs, &mut self.csg, &mut self.fsm) {
            th.backtrack(n);
        }
    }

    fn n_levels(&self) -> usize {
        self.seen_lims.len()
    }

    fn explain_propagation(&mut self, p: Lit) -> &[Lit] {
        self.reasons.get(p.var())
    }
}
