//! The `Context`: one solver together with all its theories.
//!
//! Every entity (variable, bitvector, graph, shape, state machine) belongs
//! to the context that created it. Fallible operations validate their
//! arguments before modifying anything, so an `Err` leaves the context as
//! it was.

use {
    crate::{
        bv::{
            self,
            ops::{self, BitOp},
            BvId, Cmp,
        },
        callbacks::Stats,
        clause::{lbool, Lit, Var},
        config::Config,
        core::Solver,
        dispatch::{Dispatch, TheoryId},
        encode::{ClauseSink, Gates},
        error::{Error, Result},
        fsm::{FsmId, FsmTheory, StringId},
        geometry::{CsgTheory, PlaneId, PointId, ShapeId, ShapeOp},
        graph::{AtomKind, Bound, GraphId, GraphTheory, Metric, ModelGraph, Weight},
        interface::SolverInterface,
        limits::ResourceLimits,
        optimize::{self, Objective},
        pb::{self, PbOp},
    },
    std::time::Duration,
};

/// A solver with graph, bitvector, geometry and state machine theories.
///
/// Theory atoms are ordinary literals: they can be used in clauses,
/// assumptions and other constraints like any literal returned by
/// [`Context::new_lit`].
pub struct Context {
    solver: Solver<Stats>,
    th: Dispatch,
    true_lit: Lit,
    limits: ResourceLimits,
    objectives: Vec<Objective>,
    last: lbool,
}

impl Default for Context {
    fn default() -> Self {
        Context::new()
    }
}

/// Model value of `bits`; unassigned bits count as 1 if `maximum`.
/// Range of `bv` in the model of `solver`. Set bits and true comparisons
/// raise the lower bound; clear bits and false comparisons lower the upper
/// one.
fn bv_model_bounds(solver: &Solver<Stats>, table: &bv::BvTable, bv: BvId) -> bv::Bounds {
    table.bounds(bv, &|l| solver.value_lit(l))
}

impl Context {
    pub fn new() -> Self {
        Context::with_config(Config::default())
    }

    pub fn with_config(config: Config) -> Self {
        let mut solver = Solver::new(config.solver, Stats::new());
        let true_lit = solver.fresh_lit();
        solver.add_clause(&[true_lit]);
        Context {
            solver,
            th: Dispatch::new(config.theory),
            true_lit,
            limits: config.limits,
            objectives: vec![],
            last: lbool::UNDEF,
        }
    }

    /// Build a context from a flag string, see [`Config::parse`].
    pub fn from_args(args: &str) -> Result<Self> {
        Ok(Context::with_config(Config::parse(args)?))
    }

    /// Print statistics of the CDCL core to standard output.
    pub fn print_stats(&self) {
        self.solver.print_stats()
    }

    // ---- validation ----

    fn check_var(&self, v: Var) -> Result<()> {
        if v.idx() < self.solver.num_vars() {
            Ok(())
        } else {
            Err(Error::UnknownVar(v.idx()))
        }
    }

    fn check_lits(&self, lits: &[Lit]) -> Result<()> {
        lits.iter().try_for_each(|l| self.check_var(l.var()))
    }

    fn check_bv(&self, bv: BvId) -> Result<usize> {
        if self.th.bv_table.has(bv) {
            Ok(self.th.bv_table.width(bv))
        } else {
            Err(Error::UnknownBitvector(bv))
        }
    }

    fn check_same_width(&self, a: BvId, b: BvId) -> Result<usize> {
        let wa = self.check_bv(a)?;
        let wb = self.check_bv(b)?;
        if wa == wb {
            Ok(wa)
        } else {
            Err(Error::WidthMismatch {
                expected: wa as u32,
                got: wb as u32,
            })
        }
    }

    fn check_width(width: usize) -> Result<()> {
        if width >= 1 && width <= bv::MAX_WIDTH {
            Ok(())
        } else {
            Err(Error::InvalidWidth(width))
        }
    }

    fn graph(&self, g: GraphId) -> Result<&GraphTheory> {
        self.th.graphs.get(g.idx()).ok_or(Error::UnknownGraph(g))
    }

    fn check_node(&self, g: GraphId, node: usize) -> Result<()> {
        if node < self.graph(g)?.n_nodes() {
            Ok(())
        } else {
            Err(Error::UnknownNode { graph: g, node })
        }
    }

    fn has_model(&self) -> Result<()> {
        if self.solver.get_model().is_empty() {
            Err(Error::NoModel)
        } else {
            Ok(())
        }
    }

    fn gates(&mut self) -> Gates<Solver<Stats>> {
        Gates::new(&mut self.solver, self.true_lit)
    }

    // ---- boolean layer ----

    pub fn new_var(&mut self) -> Var {
        self.solver.new_var_default()
    }

    pub fn new_lit(&mut self) -> Lit {
        Lit::new(self.new_var(), true)
    }

    /// A literal that is true in every model.
    pub fn true_lit(&self) -> Lit {
        self.true_lit
    }

    pub fn n_vars(&self) -> u32 {
        self.solver.num_vars()
    }

    pub fn n_clauses(&self) -> u64 {
        self.solver.num_clauses()
    }

    pub fn n_bitvectors(&self) -> usize {
        self.th.bv_table.len()
    }

    /// Add a clause. Returns `false` if the context is now known to be
    /// unsatisfiable.
    pub fn add_clause(&mut self, lits: &[Lit]) -> Result<bool> {
        self.check_lits(lits)?;
        let mut c = lits.to_vec();
        Ok(self.solver.add_clause_reuse(&mut c))
    }

    pub fn add_unit_clause(&mut self, a: Lit) -> Result<bool> {
        self.add_clause(&[a])
    }

    pub fn add_binary_clause(&mut self, a: Lit, b: Lit) -> Result<bool> {
        self.add_clause(&[a, b])
    }

    pub fn add_ternary_clause(&mut self, a: Lit, b: Lit, c: Lit) -> Result<bool> {
        self.add_clause(&[a, b, c])
    }

    /// Assert `sum(coefs[i] * lits[i]) op rhs`.
    pub fn assert_pb(&mut self, lits: &[Lit], coefs: &[i64], op: PbOp, rhs: i64) -> Result<()> {
        if lits.len() != coefs.len() {
            return Err(Error::LengthMismatch(lits.len(), coefs.len()));
        }
        self.check_lits(lits)?;
        pb::assert_pb(&mut self.gates(), lits, coefs, op, rhs);
        Ok(())
    }

    pub fn assert_at_most_one(&mut self, lits: &[Lit]) -> Result<()> {
        self.check_lits(lits)?;
        pb::at_most_one(&mut self.gates(), lits);
        Ok(())
    }

    // ---- gates ----
    //
    // Each returns a literal defined equal to the gate's output. Constant
    // inputs are folded, so the result may be `true_lit` or its negation.

    pub fn and(&mut self, a: Lit, b: Lit) -> Result<Lit> {
        self.check_lits(&[a, b])?;
        Ok(self.gates().and(a, b))
    }

    pub fn or(&mut self, a: Lit, b: Lit) -> Result<Lit> {
        self.check_lits(&[a, b])?;
        Ok(self.gates().or(a, b))
    }

    pub fn nand(&mut self, a: Lit, b: Lit) -> Result<Lit> {
        self.and(a, b).map(|l| !l)
    }

    pub fn nor(&mut self, a: Lit, b: Lit) -> Result<Lit> {
        self.or(a, b).map(|l| !l)
    }

    pub fn xor(&mut self, a: Lit, b: Lit) -> Result<Lit> {
        self.check_lits(&[a, b])?;
        Ok(self.gates().xor(a, b))
    }

    pub fn xnor(&mut self, a: Lit, b: Lit) -> Result<Lit> {
        self.check_lits(&[a, b])?;
        Ok(self.gates().equiv(a, b))
    }

    pub fn implies(&mut self, a: Lit, b: Lit) -> Result<Lit> {
        self.or(!a, b)
    }

    /// `if c then a else b`
    pub fn ite(&mut self, c: Lit, a: Lit, b: Lit) -> Result<Lit> {
        self.check_lits(&[c, a, b])?;
        Ok(self.gates().ite(c, a, b))
    }

    /// Conjunction of `lits`; `true_lit` if empty.
    pub fn and_all(&mut self, lits: &[Lit]) -> Result<Lit> {
        self.check_lits(lits)?;
        Ok(self.gates().and_all(lits))
    }

    /// Disjunction of `lits`; the negation of `true_lit` if empty.
    pub fn or_all(&mut self, lits: &[Lit]) -> Result<Lit> {
        self.check_lits(lits)?;
        Ok(self.gates().or_all(lits))
    }

    pub fn set_decision_var(&mut self, v: Var, decide: bool) -> Result<()> {
        self.check_var(v)?;
        self.solver.set_decision_var(v, decide);
        Ok(())
    }

    pub fn is_decision_var(&self, v: Var) -> Result<bool> {
        self.check_var(v)?;
        Ok(self.solver.is_decision_var(v))
    }

    /// Variables with a higher priority are decided first. Default is 0.
    pub fn set_decision_priority(&mut self, v: Var, priority: i32) -> Result<()> {
        self.check_var(v)?;
        self.solver.set_priority(v, priority);
        Ok(())
    }

    pub fn decision_priority(&self, v: Var) -> Result<i32> {
        self.check_var(v)?;
        Ok(self.solver.priority(v))
    }

    /// Preferred value of `v` when deciding on it. `UNDEF` restores phase
    /// saving.
    pub fn set_decision_polarity(&mut self, v: Var, pol: lbool) -> Result<()> {
        self.check_var(v)?;
        self.solver.set_polarity(v, pol);
        Ok(())
    }

    pub fn decision_polarity(&self, v: Var) -> Result<lbool> {
        self.check_var(v)?;
        Ok(self.solver.polarity(v))
    }

    // ---- solving ----

    fn run(&mut self, assumps: &[Lit], limits: Option<ResourceLimits>) -> Result<lbool> {
        self.check_lits(assumps)?;
        info!(
            "solve: {} vars, {} clauses, {} assumptions",
            self.solver.num_vars(),
            self.solver.num_clauses(),
            assumps.len()
        );
        let r = optimize::solve(
            &mut self.solver,
            &mut self.th,
            self.true_lit,
            &self.objectives,
            assumps,
            limits.as_ref(),
        );
        self.last = r;
        Ok(r)
    }

    /// Solve under `assumps`, ignoring the resource limits.
    ///
    /// Assumptions only hold for this call. If objectives are set, the
    /// model is optimal for them.
    pub fn solve(&mut self, assumps: &[Lit]) -> Result<bool> {
        Ok(self.run(assumps, None)? == lbool::TRUE)
    }

    /// Solve under `assumps` within the resource limits.
    ///
    /// Returns `UNDEF` if a limit was reached; the context is still usable.
    /// With objectives, a limit reached while optimizing keeps the best
    /// model found so far.
    pub fn solve_limited(&mut self, assumps: &[Lit]) -> Result<lbool> {
        let limits = self.limits;
        self.run(assumps, Some(limits))
    }

    pub fn set_time_limit(&mut self, limit: Option<Duration>) {
        self.limits.time = limit;
    }

    /// Memory ceiling in MiB.
    pub fn set_memory_limit(&mut self, limit: Option<u64>) {
        self.limits.memory_mb = limit;
    }

    pub fn set_conflict_limit(&mut self, limit: Option<u64>) {
        self.limits.conflicts = limit;
    }

    pub fn set_propagation_limit(&mut self, limit: Option<u64>) {
        self.limits.propagations = limit;
    }

    /// After an unsatisfiable call, a clause over negated assumptions
    /// implied by the constraints. Empty if no assumption is needed.
    pub fn conflict_clause(&self) -> Option<&[Lit]> {
        if self.last == lbool::FALSE {
            Some(self.solver.unsat_core())
        } else {
            None
        }
    }

    /// Install a predicate polled during search; the search stops with
    /// `UNDEF` as soon as it returns `true`.
    pub fn set_stop<F>(&mut self, f: F)
    where
        F: 'static + Fn() -> bool,
    {
        self.solver.cb_mut().set_stop(f)
    }

    // ---- optimization ----

    pub fn clear_objectives(&mut self) {
        self.objectives.clear();
    }

    fn add_objective(&mut self, bits: Vec<Lit>, maximize: bool) {
        self.objectives.push(Objective { bits, maximize });
    }

    pub fn maximize_bv(&mut self, bv: BvId) -> Result<()> {
        self.check_bv(bv)?;
        let bits = self.th.bv_table.bits(bv).to_vec();
        self.add_objective(bits, true);
        Ok(())
    }

    pub fn minimize_bv(&mut self, bv: BvId) -> Result<()> {
        self.check_bv(bv)?;
        let bits = self.th.bv_table.bits(bv).to_vec();
        self.add_objective(bits, false);
        Ok(())
    }

    /// Maximize the number of true literals among `lits`.
    pub fn maximize_lits(&mut self, lits: &[Lit]) -> Result<()> {
        self.check_lits(lits)?;
        let bits = self.gates().count(lits);
        self.add_objective(bits, true);
        Ok(())
    }

    pub fn minimize_lits(&mut self, lits: &[Lit]) -> Result<()> {
        self.check_lits(lits)?;
        let bits = self.gates().count(lits);
        self.add_objective(bits, false);
        Ok(())
    }

    fn weighted_objective(&mut self, lits: &[Lit], weights: &[u64]) -> Result<Vec<Lit>> {
        if lits.len() != weights.len() {
            return Err(Error::LengthMismatch(lits.len(), weights.len()));
        }
        self.check_lits(lits)?;
        Ok(self.gates().weighted_sum(lits, weights))
    }

    /// Maximize the sum of the weights of the true literals.
    pub fn maximize_weighted_lits(&mut self, lits: &[Lit], weights: &[u64]) -> Result<()> {
        let bits = self.weighted_objective(lits, weights)?;
        self.add_objective(bits, true);
        Ok(())
    }

    pub fn minimize_weighted_lits(&mut self, lits: &[Lit], weights: &[u64]) -> Result<()> {
        let bits = self.weighted_objective(lits, weights)?;
        self.add_objective(bits, false);
        Ok(())
    }

    // ---- bitvectors ----

    fn watch_bv(&mut self, v: Var, id: BvId) {
        self.th.bv.watch_var(v, id);
        self.th.watch(v, TheoryId::Bv);
        self.th.bv.mark_dirty(id);
    }

    fn register_bv(&mut self, bits: Vec<Lit>) -> BvId {
        let vars: Vec<Var> = bits.iter().map(|b| b.var()).collect();
        let id = self.th.bv_table.add(bits);
        for v in vars {
            self.watch_bv(v, id);
        }
        trace!("new bitvector {:?} of width {}", id, self.th.bv_table.width(id));
        id
    }

    /// A bitvector with fresh bits.
    pub fn new_bv_anon(&mut self, width: usize) -> Result<BvId> {
        Context::check_width(width)?;
        let bits = (0..width).map(|_| self.solver.fresh_lit()).collect();
        Ok(self.register_bv(bits))
    }

    pub fn new_bv_const(&mut self, width: usize, value: u64) -> Result<BvId> {
        Context::check_width(width)?;
        if value > bv::max_value(width) {
            return Err(Error::ConstantTooLarge {
                value,
                width: width as u32,
            });
        }
        let bits = self.gates().const_bits(value, width);
        Ok(self.register_bv(bits))
    }

    /// A bitvector over existing literals, least significant first.
    pub fn new_bv(&mut self, bits: &[Lit]) -> Result<BvId> {
        Context::check_width(bits.len())?;
        self.check_lits(bits)?;
        Ok(self.register_bv(bits.to_vec()))
    }

    pub fn bv_width(&self, bv: BvId) -> Result<usize> {
        self.check_bv(bv)
    }

    pub fn bv_bits(&self, bv: BvId) -> Result<&[Lit]> {
        self.check_bv(bv)?;
        Ok(self.th.bv_table.bits(bv))
    }

    /// Atom `bv >= k`, or `None` for `k` beyond any value.
    fn bv_geq_const(&mut self, bv: BvId, k: Option<u64>) -> Lit {
        let k = match k {
            Some(0) => return self.true_lit,
            Some(k) if k <= self.th.bv_table.max(bv) => k,
            _ => return !self.true_lit,
        };
        if let Some(lit) = self.th.bv_table.const_atom(bv, k) {
            return lit;
        }
        let lit = self.solver.fresh_lit();
        self.th.bv_table.add_const_atom(bv, k, lit);
        self.watch_bv(lit.var(), bv);
        lit
    }

    /// Atom `a >= b`.
    fn bv_geq(&mut self, a: BvId, b: BvId) -> Lit {
        if a == b {
            return self.true_lit;
        }
        if let Some(lit) = self.th.bv_table.pair_atom(a, b) {
            return lit;
        }
        let lit = self.solver.fresh_lit();
        self.th.bv_table.add_pair_atom(a, b, lit);
        self.watch_bv(lit.var(), a);
        self.watch_bv(lit.var(), b);
        lit
    }

    /// A literal equivalent to `bv op value`.
    pub fn bv_cmp_const(&mut self, bv: BvId, op: Cmp, value: u64) -> Result<Lit> {
        self.check_bv(bv)?;
        let next = value.checked_add(1);
        let lit = match op {
            Cmp::Geq => self.bv_geq_const(bv, Some(value)),
            Cmp::Lt => !self.bv_geq_const(bv, Some(value)),
            Cmp::Gt => self.bv_geq_const(bv, next),
            Cmp::Leq => !self.bv_geq_const(bv, next),
            Cmp::Eq | Cmp::Neq => {
                let ge = self.bv_geq_const(bv, Some(value));
                let gt = self.bv_geq_const(bv, next);
                let eq = self.gates().and(ge, !gt);
                if op == Cmp::Eq {
                    eq
                } else {
                    !eq
                }
            }
        };
        Ok(lit)
    }

    /// A literal equivalent to `a op b`. Widths may differ.
    pub fn bv_cmp(&mut self, a: BvId, op: Cmp, b: BvId) -> Result<Lit> {
        self.check_bv(a)?;
        self.check_bv(b)?;
        let lit = match op {
            Cmp::Geq => self.bv_geq(a, b),
            Cmp::Lt => !self.bv_geq(a, b),
            Cmp::Leq => self.bv_geq(b, a),
            Cmp::Gt => !self.bv_geq(b, a),
            Cmp::Eq | Cmp::Neq => {
                let ab = self.bv_geq(a, b);
                let ba = self.bv_geq(b, a);
                let eq = self.gates().and(ab, ba);
                if op == Cmp::Eq {
                    eq
                } else {
                    !eq
                }
            }
        };
        Ok(lit)
    }

    /// Constrain `a` and `b` to be equal, bit by bit.
    pub fn bv_assert_eq(&mut self, a: BvId, b: BvId) -> Result<()> {
        self.check_same_width(a, b)?;
        let table = &self.th.bv_table;
        let mut g = Gates::new(&mut self.solver, self.true_lit);
        for (&x, &y) in table.bits(a).iter().zip(table.bits(b)) {
            g.assert_equal(x, y);
        }
        Ok(())
    }

    /// `a + b`. Overflowing assignments are excluded.
    pub fn bv_add(&mut self, a: BvId, b: BvId) -> Result<BvId> {
        self.check_same_width(a, b)?;
        let table = &self.th.bv_table;
        let bits = ops::add(
            &mut Gates::new(&mut self.solver, self.true_lit),
            table.bits(a),
            table.bits(b),
        );
        Ok(self.register_bv(bits))
    }

    /// `a - b`. Assignments with `a < b` are excluded.
    pub fn bv_sub(&mut self, a: BvId, b: BvId) -> Result<BvId> {
        self.check_same_width(a, b)?;
        let table = &self.th.bv_table;
        let bits = ops::sub(
            &mut Gates::new(&mut self.solver, self.true_lit),
            table.bits(a),
            table.bits(b),
        );
        Ok(self.register_bv(bits))
    }

    fn bv_bitwise(&mut self, op: BitOp, a: BvId, b: BvId) -> Result<BvId> {
        self.check_same_width(a, b)?;
        let table = &self.th.bv_table;
        let bits = ops::bitwise(
            &mut Gates::new(&mut self.solver, self.true_lit),
            op,
            table.bits(a),
            table.bits(b),
        );
        Ok(self.register_bv(bits))
    }

    pub fn bv_and(&mut self, a: BvId, b: BvId) -> Result<BvId> {
        self.bv_bitwise(BitOp::And, a, b)
    }

    pub fn bv_nand(&mut self, a: BvId, b: BvId) -> Result<BvId> {
        self.bv_bitwise(BitOp::Nand, a, b)
    }

    pub fn bv_or(&mut self, a: BvId, b: BvId) -> Result<BvId> {
        self.bv_bitwise(BitOp::Or, a, b)
    }

    pub fn bv_nor(&mut self, a: BvId, b: BvId) -> Result<BvId> {
        self.bv_bitwise(BitOp::Nor, a, b)
    }

    pub fn bv_xor(&mut self, a: BvId, b: BvId) -> Result<BvId> {
        self.bv_bitwise(BitOp::Xor, a, b)
    }

    pub fn bv_xnor(&mut self, a: BvId, b: BvId) -> Result<BvId> {
        self.bv_bitwise(BitOp::Xnor, a, b)
    }

    pub fn bv_not(&mut self, a: BvId) -> Result<BvId> {
        self.check_bv(a)?;
        let bits = ops::not(self.th.bv_table.bits(a));
        Ok(self.register_bv(bits))
    }

    /// `a` in the low bits, `b` in the high bits.
    pub fn bv_concat(&mut self, a: BvId, b: BvId) -> Result<BvId> {
        let width = self.check_bv(a)? + self.check_bv(b)?;
        Context::check_width(width)?;
        let bits = ops::concat(self.th.bv_table.bits(a), self.th.bv_table.bits(b));
        Ok(self.register_bv(bits))
    }

    /// Bits `lower..=upper` of `a`.
    pub fn bv_slice(&mut self, a: BvId, lower: usize, upper: usize) -> Result<BvId> {
        let width = self.check_bv(a)?;
        if lower > upper || upper >= width {
            return Err(Error::InvalidSlice {
                lower: lower as u32,
                upper: upper as u32,
                width: width as u32,
            });
        }
        let bits = ops::slice(self.th.bv_table.bits(a), lower, upper);
        Ok(self.register_bv(bits))
    }

    /// `if c { t } else { e }`.
    pub fn bv_ite(&mut self, c: Lit, t: BvId, e: BvId) -> Result<BvId> {
        self.check_var(c.var())?;
        self.check_same_width(t, e)?;
        let table = &self.th.bv_table;
        let bits = Gates::new(&mut self.solver, self.true_lit)
            .ite_bits(c, table.bits(t), table.bits(e));
        Ok(self.register_bv(bits))
    }

    fn check_args(&self, args: &[BvId]) -> Result<()> {
        let first = *args.first().ok_or(Error::EmptyArguments)?;
        args.iter()
            .try_for_each(|&x| self.check_same_width(first, x).map(|_| ()))
    }

    pub fn bv_min(&mut self, args: &[BvId]) -> Result<BvId> {
        self.check_args(args)?;
        let table = &self.th.bv_table;
        let inputs: Vec<&[Lit]> = args.iter().map(|&x| table.bits(x)).collect();
        let bits = ops::min(&mut Gates::new(&mut self.solver, self.true_lit), &inputs);
        Ok(self.register_bv(bits))
    }

    pub fn bv_max(&mut self, args: &[BvId]) -> Result<BvId> {
        self.check_args(args)?;
        let table = &self.th.bv_table;
        let inputs: Vec<&[Lit]> = args.iter().map(|&x| table.bits(x)).collect();
        let bits = ops::max(&mut Gates::new(&mut self.solver, self.true_lit), &inputs);
        Ok(self.register_bv(bits))
    }

    /// Number of true literals among `lits`, as a `width`-bit bitvector.
    /// Assignments where the count does not fit are excluded.
    pub fn bv_popcount(&mut self, lits: &[Lit], width: usize) -> Result<BvId> {
        Context::check_width(width)?;
        self.check_lits(lits)?;
        let bits = ops::popcount(&mut self.gates(), lits, width);
        Ok(self.register_bv(bits))
    }

    // ---- graphs ----

    pub fn new_graph(&mut self) -> GraphId {
        let id = GraphId(self.th.graphs.len() as u32);
        self.th.graphs.push(GraphTheory::new());
        id
    }

    pub fn new_node(&mut self, g: GraphId) -> Result<usize> {
        self.graph(g)?;
        Ok(self.th.graphs[g.idx()].add_node())
    }

    fn add_edge(
        &mut self,
        g: GraphId,
        from: usize,
        to: usize,
        weight: Weight,
        undirected: bool,
    ) -> Result<Lit> {
        self.check_node(g, from)?;
        self.check_node(g, to)?;
        if let Weight::Bv(bv) = weight {
            self.check_bv(bv)?;
            if self.th.graphs[g.idx()].has_mst_atoms() {
                return Err(Error::Unsupported(
                    "bitvector weights in a graph with spanning tree atoms",
                ));
            }
        }
        let lit = self.solver.fresh_lit();
        let init = self.solver.value_lvl_0(lit);
        self.th.graphs[g.idx()].add_edge(from, to, lit, weight, undirected, init);
        self.th.watch(lit.var(), TheoryId::Graph(g.0));
        Ok(lit)
    }

    /// A directed edge, present iff the returned literal is true.
    pub fn new_edge(&mut self, g: GraphId, from: usize, to: usize, weight: u64) -> Result<Lit> {
        self.add_edge(g, from, to, Weight::Const(weight), false)
    }

    pub fn new_edge_bv(&mut self, g: GraphId, from: usize, to: usize, weight: BvId) -> Result<Lit> {
        self.add_edge(g, from, to, Weight::Bv(weight), false)
    }

    pub fn new_undirected_edge(
        &mut self,
        g: GraphId,
        a: usize,
        b: usize,
        weight: u64,
    ) -> Result<Lit> {
        self.add_edge(g, a, b, Weight::Const(weight), true)
    }

    pub fn new_undirected_edge_bv(
        &mut self,
        g: GraphId,
        a: usize,
        b: usize,
        weight: BvId,
    ) -> Result<Lit> {
        self.add_edge(g, a, b, Weight::Bv(weight), true)
    }

    fn graph_atom<F>(&mut self, g: GraphId, add: F) -> Result<Lit>
    where
        F: FnOnce(&mut GraphTheory, Lit) -> usize,
    {
        self.graph(g)?;
        let lit = self.solver.fresh_lit();
        add(&mut self.th.graphs[g.idx()], lit);
        self.th.watch(lit.var(), TheoryId::Graph(g.0));
        Ok(lit)
    }

    fn path_atom(
        &mut self,
        g: GraphId,
        from: usize,
        to: usize,
        metric: Metric,
        bound: Bound,
    ) -> Result<Lit> {
        self.check_node(g, from)?;
        self.check_node(g, to)?;
        if let Bound::Bv { bv, .. } = bound {
            self.check_bv(bv)?;
        }
        self.graph_atom(g, |gr, lit| gr.add_path_atom(lit, from, to, metric, bound))
    }

    /// True iff `to` can be reached from `from` using present edges.
    pub fn reaches(&mut self, g: GraphId, from: usize, to: usize) -> Result<Lit> {
        self.path_atom(g, from, to, Metric::Hops, Bound::Any)
    }

    /// True iff there is a path of fewer than `steps` edges.
    pub fn shortest_path_unweighted_lt_const(
        &mut self,
        g: GraphId,
        from: usize,
        to: usize,
        steps: u64,
    ) -> Result<Lit> {
        let bound = Bound::Const { k: steps, strict: true };
        self.path_atom(g, from, to, Metric::Hops, bound)
    }

    pub fn shortest_path_unweighted_leq_const(
        &mut self,
        g: GraphId,
        from: usize,
        to: usize,
        steps: u64,
    ) -> Result<Lit> {
        let bound = Bound::Const { k: steps, strict: false };
        self.path_atom(g, from, to, Metric::Hops, bound)
    }

    /// True iff there is a path of weight less than `dist`.
    pub fn shortest_path_lt_const(
        &mut self,
        g: GraphId,
        from: usize,
        to: usize,
        dist: u64,
    ) -> Result<Lit> {
        let bound = Bound::Const { k: dist, strict: true };
        self.path_atom(g, from, to, Metric::Weighted, bound)
    }

    pub fn shortest_path_leq_const(
        &mut self,
        g: GraphId,
        from: usize,
        to: usize,
        dist: u64,
    ) -> Result<Lit> {
        let bound = Bound::Const { k: dist, strict: false };
        self.path_atom(g, from, to, Metric::Weighted, bound)
    }

    pub fn shortest_path_lt_bv(
        &mut self,
        g: GraphId,
        from: usize,
        to: usize,
        dist: BvId,
    ) -> Result<Lit> {
        let bound = Bound::Bv { bv: dist, strict: true };
        self.path_atom(g, from, to, Metric::Weighted, bound)
    }

    pub fn shortest_path_leq_bv(
        &mut self,
        g: GraphId,
        from: usize,
        to: usize,
        dist: BvId,
    ) -> Result<Lit> {
        let bound = Bound::Bv { bv: dist, strict: false };
        self.path_atom(g, from, to, Metric::Weighted, bound)
    }

    fn flow_atom(&mut self, g: GraphId, s: usize, t: usize, bound: Bound) -> Result<Lit> {
        self.check_node(g, s)?;
        self.check_node(g, t)?;
        if let Bound::Bv { bv, .. } = bound {
            self.check_bv(bv)?;
        }
        self.graph_atom(g, |gr, lit| gr.add_flow_atom(lit, s, t, bound))
    }

    /// True iff the maximum flow from `s` to `t` is at least `flow`.
    pub fn maximum_flow_geq(&mut self, g: GraphId, s: usize, t: usize, flow: u64) -> Result<Lit> {
        self.flow_atom(g, s, t, Bound::Const { k: flow, strict: false })
    }

    pub fn maximum_flow_gt(&mut self, g: GraphId, s: usize, t: usize, flow: u64) -> Result<Lit> {
        self.flow_atom(g, s, t, Bound::Const { k: flow, strict: true })
    }

    pub fn maximum_flow_geq_bv(
        &mut self,
        g: GraphId,
        s: usize,
        t: usize,
        flow: BvId,
    ) -> Result<Lit> {
        self.flow_atom(g, s, t, Bound::Bv { bv: flow, strict: false })
    }

    pub fn maximum_flow_gt_bv(
        &mut self,
        g: GraphId,
        s: usize,
        t: usize,
        flow: BvId,
    ) -> Result<Lit> {
        self.flow_atom(g, s, t, Bound::Bv { bv: flow, strict: true })
    }

    fn mst_atom(&mut self, g: GraphId, limit: Option<u64>) -> Result<Lit> {
        if self.graph(g)?.has_bv_weights() {
            return Err(Error::Unsupported(
                "spanning tree atoms over bitvector weights",
            ));
        }
        self.graph_atom(g, |gr, lit| gr.add_mst_atom(lit, limit))
    }

    /// True iff the graph, directions ignored, is connected and its
    /// minimum spanning tree weighs at most `weight`.
    pub fn minimum_spanning_tree_leq(&mut self, g: GraphId, weight: u64) -> Result<Lit> {
        self.mst_atom(g, Some(weight))
    }

    pub fn minimum_spanning_tree_lt(&mut self, g: GraphId, weight: u64) -> Result<Lit> {
        self.mst_atom(g, weight.checked_sub(1))
    }

    /// True iff the present edges form no directed cycle. An undirected
    /// edge counts as a cycle by itself.
    pub fn acyclic_directed(&mut self, g: GraphId) -> Result<Lit> {
        self.graph_atom(g, |gr, lit| gr.add_acyclic_atom(lit, true))
    }

    /// True iff the present edges, directions ignored, form a forest.
    pub fn acyclic_undirected(&mut self, g: GraphId) -> Result<Lit> {
        self.graph_atom(g, |gr, lit| gr.add_acyclic_atom(lit, false))
    }

    // ---- geometry ----

    fn csg(&self) -> Option<&CsgTheory> {
        self.th.csg.as_ref()
    }

    fn csg_mut(&mut self) -> &mut CsgTheory {
        self.th.csg.get_or_insert_with(CsgTheory::default)
    }

    fn check_point(&self, p: PointId) -> Result<()> {
        match self.csg() {
            Some(c) if c.has_point(p) => Ok(()),
            _ => Err(Error::UnknownPoint(p.idx())),
        }
    }

    fn check_shape(&self, s: ShapeId) -> Result<()> {
        match self.csg() {
            Some(c) if c.has_shape(s) => Ok(()),
            _ => Err(Error::UnknownShape(s.idx())),
        }
    }

    pub fn new_point(&mut self, x: i64, y: i64) -> PointId {
        self.csg_mut().add_point(x, y)
    }

    /// The half-plane of points `p` with `dot(p - origin, dir) >= 0`.
    pub fn new_plane(&mut self, origin: PointId, dir: PointId) -> Result<PlaneId> {
        self.check_point(origin)?;
        self.check_point(dir)?;
        Ok(self.csg_mut().add_plane(origin, dir))
    }

    fn add_primitive(&mut self, planes: &[PlaneId], cond: Option<Lit>) -> Result<ShapeId> {
        if planes.is_empty() {
            return Err(Error::EmptyArguments);
        }
        for &p in planes {
            match self.csg() {
                Some(c) if c.has_plane(p) => (),
                _ => return Err(Error::UnknownPlane(p.idx())),
            }
        }
        if let Some(c) = cond {
            self.check_var(c.var())?;
            self.th.watch(c.var(), TheoryId::Csg);
        }
        Ok(self.csg_mut().add_primitive(planes.to_vec(), cond))
    }

    /// The intersection of `planes`.
    pub fn new_primitive(&mut self, planes: &[PlaneId]) -> Result<ShapeId> {
        self.add_primitive(planes, None)
    }

    /// The intersection of `planes` if `cond` is true, empty otherwise.
    pub fn new_conditional_primitive(&mut self, planes: &[PlaneId], cond: Lit) -> Result<ShapeId> {
        self.add_primitive(planes, Some(cond))
    }

    fn add_shape(
        &mut self,
        op: ShapeOp,
        a: ShapeId,
        b: ShapeId,
        cond: Option<Lit>,
    ) -> Result<ShapeId> {
        self.check_shape(a)?;
        self.check_shape(b)?;
        if let Some(c) = cond {
            self.check_var(c.var())?;
            self.th.watch(c.var(), TheoryId::Csg);
        }
        Ok(self.csg_mut().add_shape(op, a, b, cond))
    }

    pub fn new_shape(&mut self, op: ShapeOp, a: ShapeId, b: ShapeId) -> Result<ShapeId> {
        self.add_shape(op, a, b, None)
    }

    pub fn new_conditional_shape(
        &mut self,
        op: ShapeOp,
        a: ShapeId,
        b: ShapeId,
        cond: Lit,
    ) -> Result<ShapeId> {
        self.add_shape(op, a, b, Some(cond))
    }

    /// True iff `shape` contains `point`.
    pub fn shape_contains_point(&mut self, shape: ShapeId, point: PointId) -> Result<Lit> {
        self.check_shape(shape)?;
        self.check_point(point)?;
        let lit = self.solver.fresh_lit();
        self.csg_mut().add_atom(shape, point, lit);
        Ok(lit)
    }

    // ---- state machines ----

    fn fsm_mut(&mut self) -> &mut FsmTheory {
        self.th.fsm.get_or_insert_with(FsmTheory::default)
    }

    fn fsm(&self, f: FsmId) -> Result<&FsmTheory> {
        match self.th.fsm.as_ref() {
            Some(t) if t.has_fsm(f) => Ok(t),
            _ => Err(Error::UnknownFsm(f.idx())),
        }
    }

    fn check_state(&self, f: FsmId, state: usize) -> Result<()> {
        if state < self.fsm(f)?.n_states(f) {
            Ok(())
        } else {
            Err(Error::UnknownState {
                fsm: f.idx(),
                state,
            })
        }
    }

    /// Symbols of `s`, checked against the input alphabet of `f`.
    fn check_string(&self, f: FsmId, s: StringId) -> Result<()> {
        let t = self.fsm(f)?;
        if !t.has_string(s) {
            return Err(Error::UnknownString(s.idx()));
        }
        let (n_in, _) = t.alphabets(f);
        match t.string(s).iter().find(|&&c| c == 0 || c >= n_in) {
            Some(&symbol) => Err(Error::InvalidSymbol { symbol, size: n_in }),
            None => Ok(()),
        }
    }

    /// A state machine with input labels `0..n_in` and output labels
    /// `0..n_out`. Label 0 is epsilon.
    pub fn new_fsm(&mut self, n_in: usize, n_out: usize) -> FsmId {
        self.fsm_mut().add_fsm(n_in, n_out)
    }

    pub fn new_state(&mut self, f: FsmId) -> Result<usize> {
        self.fsm(f)?;
        Ok(self.fsm_mut().add_state(f))
    }

    /// A transition reading `input` and writing `output`, enabled iff the
    /// returned literal is true.
    pub fn new_transition(
        &mut self,
        f: FsmId,
        from: usize,
        to: usize,
        input: usize,
        output: usize,
    ) -> Result<Lit> {
        self.check_state(f, from)?;
        self.check_state(f, to)?;
        let (n_in, n_out) = self.fsm(f)?.alphabets(f);
        if input >= n_in {
            return Err(Error::InvalidLabel {
                label: input,
                size: n_in,
            });
        }
        if output >= n_out {
            return Err(Error::InvalidLabel {
                label: output,
                size: n_out,
            });
        }
        let lit = self.solver.fresh_lit();
        self.fsm_mut().add_transition(f, from, to, input, output, lit);
        self.th.watch(lit.var(), TheoryId::Fsm);
        Ok(lit)
    }

    /// A string of symbols. Symbols are checked when the string is used.
    pub fn new_string(&mut self, symbols: &[usize]) -> StringId {
        self.fsm_mut().add_string(symbols.to_vec())
    }

    /// True iff `f` has a run from `start` to `accept` reading `string`.
    pub fn fsm_accepts(
        &mut self,
        f: FsmId,
        start: usize,
        accept: usize,
        string: StringId,
    ) -> Result<Lit> {
        self.check_state(f, start)?;
        self.check_state(f, accept)?;
        self.check_string(f, string)?;
        let lit = self.solver.fresh_lit();
        self.fsm_mut().add_accepts(lit, f, start, accept, string);
        Ok(lit)
    }

    /// True iff the output of generator `gen` on `string` can be accepted
    /// by acceptor `acc`.
    #[allow(clippy::too_many_arguments)]
    pub fn fsm_composition_accepts(
        &mut self,
        gen: FsmId,
        acc: FsmId,
        gen_start: usize,
        gen_accept: usize,
        acc_start: usize,
        acc_accept: usize,
        string: StringId,
    ) -> Result<Lit> {
        self.check_state(gen, gen_start)?;
        self.check_state(gen, gen_accept)?;
        self.check_state(acc, acc_start)?;
        self.check_state(acc, acc_accept)?;
        self.check_string(gen, string)?;
        let lit = self.solver.fresh_lit();
        self.fsm_mut().add_compose(
            lit, gen, acc, gen_start, gen_accept, acc_start, acc_accept, string,
        );
        Ok(lit)
    }

    // ---- model ----

    /// Value of `lit` in the last model.
    pub fn model_lit(&self, lit: Lit) -> Result<lbool> {
        self.check_var(lit.var())?;
        self.has_model()?;
        Ok(self.solver.value_lit(lit))
    }

    /// Value of `bv` in the last model: the largest value it can take there
    /// if `maximum`, the smallest otherwise.
    pub fn model_bv(&self, bv: BvId, maximum: bool) -> Result<u64> {
        self.check_bv(bv)?;
        self.has_model()?;
        let b = bv_model_bounds(&self.solver, &self.th.bv_table, bv);
        Ok(if maximum { b.hi } else { b.lo })
    }

    /// The graph `g` in the last model.
    fn model_graph(&self, g: GraphId) -> Result<ModelGraph> {
        let gr = self.graph(g)?;
        self.has_model()?;
        let table = &self.th.bv_table;
        let solver = &self.solver;
        Ok(gr.model_graph(&|l| solver.value_lit(l), &|bv| {
            bv_model_bounds(solver, table, bv).lo
        }))
    }

    fn model_graph_of(&self, g: GraphId, atom: Lit) -> Result<(ModelGraph, usize)> {
        let i = self.graph(g)?.atom_of(atom).ok_or(Error::NotAnAtom(atom))?;
        Ok((self.model_graph(g)?, i))
    }

    fn model_flow(&self, g: GraphId, atom: Lit, acyclic: bool) -> Result<(u64, Vec<i128>)> {
        let (m, i) = self.model_graph_of(g, atom)?;
        self.th.graphs[g.idx()]
            .model_flow(&m, i, acyclic)
            .ok_or(Error::NotAnAtom(atom))
    }

    /// Maximum flow value of flow atom `atom` in the last model.
    pub fn model_max_flow(&self, g: GraphId, atom: Lit) -> Result<u64> {
        Ok(self.model_flow(g, atom, false)?.0)
    }

    fn edge_flow(&self, g: GraphId, atom: Lit, edge: Lit, acyclic: bool) -> Result<i64> {
        let e = self.graph(g)?.edge_of(edge).ok_or(Error::NotAnEdge(edge, g))?;
        let (_, flows) = self.model_flow(g, atom, acyclic)?;
        let f = flows[e as usize];
        Ok(f.max(i64::MIN as i128).min(i64::MAX as i128) as i64)
    }

    /// Flow along `edge` in a maximum flow of `atom` in the last model.
    /// Negative values go against the direction of an undirected edge.
    pub fn model_edge_flow(&self, g: GraphId, atom: Lit, edge: Lit) -> Result<i64> {
        self.edge_flow(g, atom, edge, false)
    }

    /// Like `model_edge_flow`, on a maximum flow without flow cycles.
    pub fn model_acyclic_edge_flow(&self, g: GraphId, atom: Lit, edge: Lit) -> Result<i64> {
        self.edge_flow(g, atom, edge, true)
    }

    /// Weight of the minimum spanning tree of `g` in the last model, or
    /// `None` if the graph is disconnected there.
    pub fn model_mst_weight(&self, g: GraphId) -> Result<Option<u64>> {
        let m = self.model_graph(g)?;
        Ok(self.th.graphs[g.idx()].model_mst_weight(&m))
    }

    fn model_path(&self, g: GraphId, atom: Lit) -> Result<Option<(Vec<usize>, Vec<Lit>)>> {
        let (m, i) = self.model_graph_of(g, atom)?;
        let gr = &self.th.graphs[g.idx()];
        match gr.atom(i).kind {
            AtomKind::Path { .. } => Ok(gr.model_path(&m, i)),
            _ => Err(Error::NotAnAtom(atom)),
        }
    }

    /// Nodes of a shortest path witnessing reach or distance atom `atom`
    /// in the last model, or `None` if there is no path.
    pub fn model_path_nodes(&self, g: GraphId, atom: Lit) -> Result<Option<Vec<usize>>> {
        Ok(self.model_path(g, atom)?.map(|(nodes, _)| nodes))
    }

    /// Edge literals of the path of `model_path_nodes`.
    pub fn model_path_edge_lits(&self, g: GraphId, atom: Lit) -> Result<Option<Vec<Lit>>> {
        Ok(self.model_path(g, atom)?.map(|(_, lits)| lits))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_errors_leave_context_unchanged() {
        let mut ctx = Context::new();
        let n = ctx.n_vars();
        let g = ctx.new_graph();
        assert_eq!(
            ctx.new_edge(g, 0, 1, 1),
            Err(Error::UnknownNode { graph: g, node: 0 })
        );
        assert_eq!(ctx.new_bv_anon(0), Err(Error::InvalidWidth(0)));
        assert_eq!(ctx.new_bv_anon(64), Err(Error::InvalidWidth(64)));
        assert_eq!(
            ctx.new_bv_const(3, 8),
            Err(Error::ConstantTooLarge { value: 8, width: 3 })
        );
        let a = ctx.new_bv_anon(3).unwrap();
        let b = ctx.new_bv_anon(4).unwrap();
        assert_eq!(
            ctx.bv_add(a, b),
            Err(Error::WidthMismatch { expected: 3, got: 4 })
        );
        assert_eq!(
            ctx.bv_slice(a, 2, 3),
            Err(Error::InvalidSlice {
                lower: 2,
                upper: 3,
                width: 3
            })
        );
        assert_eq!(ctx.bv_min(&[]), Err(Error::EmptyArguments));
        assert_eq!(ctx.n_vars(), n + 7);
        assert_eq!(ctx.n_bitvectors(), 2);
    }

    #[test]
    fn test_model_requires_solve() {
        let mut ctx = Context::new();
        let x = ctx.new_lit();
        assert_eq!(ctx.model_lit(x), Err(Error::NoModel));
        assert!(ctx.solve(&[x]).unwrap());
        assert_eq!(ctx.model_lit(x), Ok(lbool::TRUE));
        let y = ctx.new_lit();
        assert_eq!(ctx.model_lit(y), Err(Error::NoModel));
    }

    #[test]
    fn test_cmp_const_folding() {
        let mut ctx = Context::new();
        let t = ctx.true_lit();
        let x = ctx.new_bv_anon(3).unwrap();
        assert_eq!(ctx.bv_cmp_const(x, Cmp::Geq, 0).unwrap(), t);
        assert_eq!(ctx.bv_cmp_const(x, Cmp::Gt, 7).unwrap(), !t);
        assert_eq!(ctx.bv_cmp_const(x, Cmp::Leq, u64::MAX).unwrap(), t);
        let a = ctx.bv_cmp_const(x, Cmp::Geq, 5).unwrap();
        assert_eq!(ctx.bv_cmp_const(x, Cmp::Lt, 5).unwrap(), !a);
        assert_eq!(ctx.bv_cmp_const(x, Cmp::Leq, 4).unwrap(), !a);
        assert_eq!(ctx.bv_cmp(x, Cmp::Leq, x).unwrap(), t);
    }

    #[test]
    fn test_bv_eq_const() {
        let mut ctx = Context::new();
        let x = ctx.new_bv_anon(4).unwrap();
        let eq = ctx.bv_cmp_const(x, Cmp::Eq, 9).unwrap();
        assert!(ctx.solve(&[eq]).unwrap());
        assert_eq!(ctx.model_bv(x, false).unwrap(), 9);
        let ne = ctx.bv_cmp_const(x, Cmp::Neq, 9).unwrap();
        assert!(!ctx.solve(&[eq, ne]).unwrap());
        assert!(ctx.conflict_clause().is_some());
    }

    #[test]
    fn test_mst_rejects_bv_weights() {
        let mut ctx = Context::new();
        let g = ctx.new_graph();
        let a = ctx.new_node(g).unwrap();
        let b = ctx.new_node(g).unwrap();
        let w = ctx.new_bv_anon(2).unwrap();
        ctx.minimum_spanning_tree_leq(g, 3).unwrap();
        assert!(matches!(
            ctx.new_edge_bv(g, a, b, w),
            Err(Error::Unsupported(_))
        ));
        let h = ctx.new_graph();
        let c = ctx.new_node(h).unwrap();
        ctx.new_undirected_edge_bv(h, c, c, w).unwrap();
        assert!(matches!(
            ctx.minimum_spanning_tree_lt(h, 3),
            Err(Error::Unsupported(_))
        ));
    }
}
