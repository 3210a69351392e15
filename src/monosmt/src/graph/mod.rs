//! Graph predicates over edges controlled by literals.
//!
//! Every predicate is decided between two graphs: the *under* graph, made
//! of the edges whose literal is true, and the *over* graph, made of the
//! edges whose literal is not false. Bitvector weights are taken at their
//! upper bound in the under graph and at their lower bound in the over
//! graph for distances, and the other way around for capacities. If a
//! predicate holds in the graph that is hardest for it, it is implied; if
//! it fails in the graph that is easiest for it, its negation is implied.

use {
    crate::{
        bv::{BvId, Bounds},
        clause::{lbool, Lit, Var},
        dispatch::{CheckCx, TheorySolver},
    },
    rustc_hash::FxHashMap,
};

mod cycle;
mod flow;
mod mst;
mod sssp;

use self::{flow::MaxFlow, mst::SpanningForest, sssp::Sssp};

/// Identifier of a graph in a context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GraphId(pub(crate) u32);

impl GraphId {
    pub fn idx(self) -> usize {
        self.0 as usize
    }
}

pub(crate) type EdgeId = u32;

/// Distance of an unreachable node.
pub(crate) const INF: u64 = u64::MAX;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Weight {
    Const(u64),
    Bv(BvId),
}

#[derive(Debug, Clone)]
pub(crate) struct Edge {
    pub from: usize,
    pub to: usize,
    pub lit: Lit,
    pub weight: Weight,
    pub undirected: bool,
}

/// A graph as seen by one algorithm: a presence flag and a weight per edge.
pub(crate) struct View<'a> {
    pub n: usize,
    pub edges: &'a [Edge],
    /// Edges incident to each node, in both directions.
    pub inc: &'a [Vec<EdgeId>],
    pub present: &'a [bool],
    /// `None` counts every edge as 1.
    pub weights: Option<&'a [u64]>,
}

impl<'a> View<'a> {
    #[inline]
    pub fn weight(&self, e: EdgeId) -> u64 {
        self.weights.map_or(1, |w| w[e as usize])
    }

    /// Node reached by traversing `e` from `u`, if `e` is present and can
    /// be traversed in that direction.
    pub fn follow(&self, e: EdgeId, u: usize) -> Option<usize> {
        let edge = &self.edges[e as usize];
        if !self.present[e as usize] {
            None
        } else if edge.from == u {
            Some(edge.to)
        } else if edge.undirected && edge.to == u {
            Some(edge.from)
        } else {
            None
        }
    }

    /// Node from which traversing `e` reaches `v`.
    pub fn follow_back(&self, e: EdgeId, v: usize) -> Option<usize> {
        let edge = &self.edges[e as usize];
        if !self.present[e as usize] {
            None
        } else if edge.to == v {
            Some(edge.from)
        } else if edge.undirected && edge.from == v {
            Some(edge.to)
        } else {
            None
        }
    }

    /// The endpoint of `e` that is not `v`.
    #[inline]
    pub fn other(&self, e: EdgeId, v: usize) -> usize {
        let edge = &self.edges[e as usize];
        if edge.to == v {
            edge.from
        } else {
            edge.to
        }
    }
}

/// What a distance predicate measures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum Metric {
    Hops,
    Weighted,
}

/// Right-hand side of a distance or flow predicate.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Bound {
    /// Plain reachability.
    Any,
    Const { k: u64, strict: bool },
    Bv { bv: BvId, strict: bool },
}

#[derive(Debug, Clone, Copy)]
pub(crate) enum AtomKind {
    /// `dist(src, dst) <= / < bound`, `src` given by the detector.
    Path { dst: usize, bound: Bound, det: usize },
    /// `maxflow(s, t) >= / > bound`.
    Flow { bound: Bound, det: usize },
    /// `mst weight <= limit`, never true if `limit` is `None`.
    Mst { limit: Option<u64> },
    Acyclic { directed: bool },
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct Atom {
    pub lit: Lit,
    pub kind: AtomKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Status {
    Undef,
    Enabled,
    Disabled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Under,
    Over,
    Full,
}

#[derive(Debug, Clone, Copy)]
enum Weights {
    Unit,
    Lo,
    Hi,
}

#[derive(Debug, Clone, Copy)]
struct Change {
    edge: EdgeId,
    side: Side,
    insert: bool,
}

/// A limit on a distance.
#[derive(Debug, Clone, Copy)]
enum Limit {
    Unbounded,
    At(u64),
    Never,
}

impl Limit {
    fn of(k: u64, strict: bool) -> Self {
        if !strict {
            Limit::At(k)
        } else {
            k.checked_sub(1).map_or(Limit::Never, Limit::At)
        }
    }

    fn admits(self, d: u64) -> bool {
        d != INF
            && match self {
                Limit::Unbounded => true,
                Limit::At(l) => d <= l,
                Limit::Never => false,
            }
    }
}

/// Edges, their current status, and the weights used by the algorithms.
struct GraphData {
    n: usize,
    edges: Vec<Edge>,
    inc: Vec<Vec<EdgeId>>,
    status: Vec<Status>,
    under_in: Vec<bool>,
    over_in: Vec<bool>,
    all_in: Vec<bool>,
    w_lo: Vec<u64>,
    w_hi: Vec<u64>,
}

impl GraphData {
    fn view(&self, side: Side, w: Weights) -> View {
        View {
            n: self.n,
            edges: &self.edges,
            inc: &self.inc,
            present: match side {
                Side::Under => &self.under_in,
                Side::Over => &self.over_in,
                Side::Full => &self.all_in,
            },
            weights: match w {
                Weights::Unit => None,
                Weights::Lo => Some(&self.w_lo),
                Weights::Hi => Some(&self.w_hi),
            },
        }
    }
}

/// Shortest paths from one source, in the under and over graphs.
struct PathDet {
    src: usize,
    metric: Metric,
    under: Sssp,
    over: Sssp,
}

impl PathDet {
    fn weights(&self, side: Side) -> Weights {
        match (self.metric, side) {
            (Metric::Hops, _) => Weights::Unit,
            (Metric::Weighted, Side::Under) => Weights::Hi,
            (Metric::Weighted, _) => Weights::Lo,
        }
    }

    fn check(
        &mut self,
        g: &GraphData,
        lit: Lit,
        dst: usize,
        bound: Bound,
        cx: &mut CheckCx,
        expl: &mut Vec<Lit>,
    ) {
        let weighted = self.metric == Metric::Weighted;
        let under_view = g.view(Side::Under, self.weights(Side::Under));
        let over_view = g.view(Side::Over, self.weights(Side::Over));
        self.under.update(&under_view);
        self.over.update(&over_view);
        let du = self.under.dist(dst);
        let dov = self.over.dist(dst);

        let (true_limit, false_limit, bv_bounds) = match bound {
            Bound::Any => (Limit::Unbounded, Limit::Unbounded, None),
            Bound::Const { k, strict } => (Limit::of(k, strict), Limit::of(k, strict), None),
            Bound::Bv { bv, strict } => {
                let b = cx.bv_bounds(bv);
                (Limit::of(b.lo, strict), Limit::of(b.hi, strict), Some(b))
            }
        };

        if true_limit.admits(du) {
            expl.clear();
            for e in self.under.path(dst, &under_view).unwrap_or_default() {
                let edge = &g.edges[e as usize];
                expl.push(edge.lit);
                if let (true, Weight::Bv(bv)) = (weighted, edge.weight) {
                    cx.explain_bv_hi(bv, g.w_hi[e as usize], expl);
                }
            }
            if let Bound::Bv { bv, strict } = bound {
                cx.explain_bv_lo(bv, du + strict as u64, expl);
            }
            cx.propagate(lit, expl);
        } else if !false_limit.admits(dov) {
            expl.clear();
            // with `Never`, nothing could satisfy the bound
            if !matches!(false_limit, Limit::Never) {
                self.explain_unreachable(g, false_limit, cx, expl);
            }
            if let (Bound::Bv { bv, .. }, Some(b)) = (bound, bv_bounds) {
                cx.explain_bv_hi(bv, b.hi, expl);
            }
            cx.propagate(!lit, expl);
        }
    }

    /// Disabled edges that could bring the destination within `limit`,
    /// and the lower bounds of the weights that keep it out of reach.
    fn explain_unreachable(&self, g: &GraphData, limit: Limit, cx: &CheckCx, expl: &mut Vec<Lit>) {
        let weighted = self.metric == Metric::Weighted;
        for (i, edge) in g.edges.iter().enumerate() {
            let ends = [edge.from, edge.to];
            let tails = if edge.undirected { &ends[..] } else { &ends[..1] };
            let reached: Vec<u64> = tails
                .iter()
                .map(|&u| self.over.dist(u))
                .filter(|&d| d != INF)
                .collect();
            if reached.is_empty() {
                continue;
            }
            if g.status[i] == Status::Disabled {
                let useful = reached.iter().any(|&d| match limit {
                    Limit::Unbounded => true,
                    Limit::Never => false,
                    Limit::At(l) => match (weighted, edge.weight) {
                        (false, _) => d.saturating_add(1) <= l,
                        (true, Weight::Bv(_)) => true,
                        (true, Weight::Const(w)) => d.saturating_add(w) <= l,
                    },
                });
                if useful {
                    expl.push(!edge.lit);
                }
            } else if let (true, Weight::Bv(bv)) = (weighted, edge.weight) {
                if g.w_lo[i] > 0 {
                    cx.explain_bv_lo(bv, g.w_lo[i], expl);
                }
            }
        }
    }
}

/// Maximum flow between two nodes, in the under and over graphs.
struct FlowDet {
    under: MaxFlow,
    over: MaxFlow,
}

impl FlowDet {
    fn check(
        &mut self,
        g: &GraphData,
        lit: Lit,
        bound: Bound,
        cx: &mut CheckCx,
        expl: &mut Vec<Lit>,
    ) {
        let under_view = g.view(Side::Under, Weights::Lo);
        let over_view = g.view(Side::Over, Weights::Hi);
        self.under.update(&under_view);
        self.over.update(&over_view);

        let (need_true, need_false, bv_bounds) = match bound {
            Bound::Any => (0, 0, None),
            Bound::Const { k, strict } => {
                let need = k as u128 + strict as u128;
                (need, need, None)
            }
            Bound::Bv { bv, strict } => {
                let b = cx.bv_bounds(bv);
                (
                    b.hi as u128 + strict as u128,
                    b.lo as u128 + strict as u128,
                    Some(b),
                )
            }
        };

        if self.under.value() >= need_true {
            expl.clear();
            for (i, edge) in g.edges.iter().enumerate() {
                let f = self.under.edge_flow(i as EdgeId);
                if f == 0 {
                    continue;
                }
                expl.push(edge.lit);
                if let Weight::Bv(bv) = edge.weight {
                    cx.explain_bv_lo(bv, f.unsigned_abs() as u64, expl);
                }
            }
            if let (Bound::Bv { bv, .. }, Some(b)) = (bound, bv_bounds) {
                cx.explain_bv_hi(bv, b.hi, expl);
            }
            cx.propagate(lit, expl);
        } else if self.over.value() < need_false {
            expl.clear();
            let side = self.over.source_side(&over_view);
            for (i, edge) in g.edges.iter().enumerate() {
                let crosses = (side[edge.from] && !side[edge.to])
                    || (edge.undirected && side[edge.to] && !side[edge.from]);
                if !crosses {
                    continue;
                }
                if g.status[i] == Status::Disabled {
                    expl.push(!edge.lit);
                } else if let Weight::Bv(bv) = edge.weight {
                    cx.explain_bv_hi(bv, g.w_hi[i], expl);
                }
            }
            if let (Bound::Bv { bv, .. }, Some(b)) = (bound, bv_bounds) {
                cx.explain_bv_lo(bv, b.lo, expl);
            }
            cx.propagate(!lit, expl);
        }
    }
}

/// A cached cycle search: `Some(Some(cycle))`, `Some(None)` for acyclic,
/// or `None` when unknown.
type CycleCache = Option<Option<Vec<EdgeId>>>;

/// Is `cache` stale after `e` was inserted into (or removed from) a graph
/// in which it is now `present`?
fn cycle_stale(cache: &CycleCache, e: EdgeId, insert: bool, present: bool) -> bool {
    match cache {
        Some(None) => insert && present,
        Some(Some(c)) => !insert && !present && c.contains(&e),
        None => false,
    }
}

/// The theory of one graph.
pub(crate) struct GraphTheory {
    data: GraphData,
    edge_of_var: FxHashMap<Var, Vec<EdgeId>>,
    bv_edges: Vec<EdgeId>,
    atoms: Vec<Atom>,
    atom_of_lit: FxHashMap<Lit, usize>,
    /// Bitvector bounds of atoms, as of the last check.
    bound_refs: Vec<(BvId, Bounds)>,
    trail: Vec<EdgeId>,
    lims: Vec<usize>,
    pending: Vec<Change>,
    paths: Vec<PathDet>,
    path_index: FxHashMap<(usize, Metric), usize>,
    flows: Vec<FlowDet>,
    flow_index: FxHashMap<(usize, usize), usize>,
    mst_under: Option<SpanningForest>,
    mst_over: Option<SpanningForest>,
    dir_under: CycleCache,
    dir_over: CycleCache,
    undir_under: CycleCache,
    undir_over: CycleCache,
    scc: Option<Vec<usize>>,
    dirty: bool,
    expl: Vec<Lit>,
}

impl GraphTheory {
    pub fn new() -> Self {
        GraphTheory {
            data: GraphData {
                n: 0,
                edges: vec![],
                inc: vec![],
                status: vec![],
                under_in: vec![],
                over_in: vec![],
                all_in: vec![],
                w_lo: vec![],
                w_hi: vec![],
            },
            edge_of_var: FxHashMap::default(),
            bv_edges: vec![],
            atoms: vec![],
            atom_of_lit: FxHashMap::default(),
            bound_refs: vec![],
            trail: vec![],
            lims: vec![],
            pending: vec![],
            paths: vec![],
            path_index: FxHashMap::default(),
            flows: vec![],
            flow_index: FxHashMap::default(),
            mst_under: None,
            mst_over: None,
            dir_under: None,
            dir_over: None,
            undir_under: None,
            undir_over: None,
            scc: None,
            dirty: false,
            expl: vec![],
        }
    }

    pub fn n_nodes(&self) -> usize {
        self.data.n
    }

    pub fn has_bv_weights(&self) -> bool {
        !self.bv_edges.is_empty()
    }

    pub fn has_mst_atoms(&self) -> bool {
        self.atoms
            .iter()
            .any(|a| matches!(a.kind, AtomKind::Mst { .. }))
    }

    pub fn add_node(&mut self) -> usize {
        let v = self.data.n;
        self.data.n += 1;
        self.data.inc.push(vec![]);
        self.invalidate_all();
        v
    }

    /// Add an edge. `init` is the value of `lit` at level 0.
    pub fn add_edge(
        &mut self,
        from: usize,
        to: usize,
        lit: Lit,
        weight: Weight,
        undirected: bool,
        init: lbool,
    ) -> EdgeId {
        let d = &mut self.data;
        let e = d.edges.len() as EdgeId;
        d.inc[from].push(e);
        if to != from {
            d.inc[to].push(e);
        }
        let status = match init.to_bool() {
            Some(true) => Status::Enabled,
            Some(false) => Status::Disabled,
            None => Status::Undef,
        };
        d.status.push(status);
        d.under_in.push(status == Status::Enabled);
        d.over_in.push(status != Status::Disabled);
        d.all_in.push(true);
        let (lo, hi) = match weight {
            Weight::Const(w) => (w, w),
            Weight::Bv(_) => {
                self.bv_edges.push(e);
                (0, u64::MAX)
            }
        };
        d.w_lo.push(lo);
        d.w_hi.push(hi);
        d.edges.push(Edge {
            from,
            to,
            lit,
            weight,
            undirected,
        });
        self.edge_of_var
            .entry(lit.var())
            .or_insert_with(Vec::new)
            .push(e);
        self.invalidate_all();
        e
    }

    fn add_atom(&mut self, lit: Lit, kind: AtomKind) -> usize {
        let i = self.atoms.len();
        self.atoms.push(Atom { lit, kind });
        self.atom_of_lit.insert(lit, i);
        match kind {
            AtomKind::Path {
                bound: Bound::Bv { bv, .. },
                ..
            }
            | AtomKind::Flow {
                bound: Bound::Bv { bv, .. },
                ..
            } => self.bound_refs.push((bv, Bounds { lo: 0, hi: 0 })),
            _ => (),
        }
        self.dirty = true;
        i
    }

    pub fn add_path_atom(
        &mut self,
        lit: Lit,
        src: usize,
        dst: usize,
        metric: Metric,
        bound: Bound,
    ) -> usize {
        let paths = &mut self.paths;
        let det = *self.path_index.entry((src, metric)).or_insert_with(|| {
            paths.push(PathDet {
                src,
                metric,
                under: Sssp::new(src),
                over: Sssp::new(src),
            });
            paths.len() - 1
        });
        self.add_atom(lit, AtomKind::Path { dst, bound, det })
    }

    pub fn add_flow_atom(&mut self, lit: Lit, s: usize, t: usize, bound: Bound) -> usize {
        let flows = &mut self.flows;
        let det = *self.flow_index.entry((s, t)).or_insert_with(|| {
            flows.push(FlowDet {
                under: MaxFlow::new(s, t),
                over: MaxFlow::new(s, t),
            });
            flows.len() - 1
        });
        self.add_atom(lit, AtomKind::Flow { bound, det })
    }

    pub fn add_mst_atom(&mut self, lit: Lit, limit: Option<u64>) -> usize {
        self.add_atom(lit, AtomKind::Mst { limit })
    }

    pub fn add_acyclic_atom(&mut self, lit: Lit, directed: bool) -> usize {
        self.add_atom(lit, AtomKind::Acyclic { directed })
    }

    pub fn atom_of(&self, lit: Lit) -> Option<usize> {
        self.atom_of_lit.get(&lit).cloned()
    }

    pub fn atom(&self, i: usize) -> &Atom {
        &self.atoms[i]
    }

    pub fn edge_of(&self, lit: Lit) -> Option<EdgeId> {
        let es = self.edge_of_var.get(&lit.var())?;
        es.iter()
            .cloned()
            .find(|&e| self.data.edges[e as usize].lit == lit)
    }

    fn invalidate_all(&mut self) {
        for p in &mut self.paths {
            p.under.invalidate();
            p.over.invalidate();
        }
        for f in &mut self.flows {
            f.under.invalidate();
            f.over.invalidate();
        }
        self.mst_under = None;
        self.mst_over = None;
        self.dir_under = None;
        self.dir_over = None;
        self.undir_under = None;
        self.undir_over = None;
        self.scc = None;
        self.dirty = true;
    }

    /// Re-read bitvector bounds of weights and atom bounds. Returns `true`
    /// if any of them changed.
    fn refresh_bounds(&mut self, cx: &CheckCx) -> bool {
        let mut weights_changed = false;
        for &e in &self.bv_edges {
            let i = e as usize;
            if let Weight::Bv(bv) = self.data.edges[i].weight {
                let b = cx.bv_bounds(bv);
                if b.lo != self.data.w_lo[i] || b.hi != self.data.w_hi[i] {
                    self.data.w_lo[i] = b.lo;
                    self.data.w_hi[i] = b.hi;
                    weights_changed = true;
                }
            }
        }
        if weights_changed {
            trace!("graph: weights changed");
            for p in &mut self.paths {
                if p.metric == Metric::Weighted {
                    p.under.invalidate();
                    p.over.invalidate();
                }
            }
            for f in &mut self.flows {
                f.under.invalidate();
                f.over.invalidate();
            }
        }
        let mut bounds_changed = false;
        for r in &mut self.bound_refs {
            let b = cx.bv_bounds(r.0);
            if b != r.1 {
                r.1 = b;
                bounds_changed = true;
            }
        }
        weights_changed || bounds_changed
    }

    /// Repair the cached structures after edge status changes.
    fn apply_pending(&mut self) {
        let d = &self.data;
        for ch in self.pending.drain(..) {
            let e = ch.edge;
            let present = match ch.side {
                Side::Under => d.under_in[e as usize],
                _ => d.over_in[e as usize],
            };
            for p in &mut self.paths {
                let view = d.view(ch.side, p.weights(ch.side));
                let s = match ch.side {
                    Side::Under => &mut p.under,
                    _ => &mut p.over,
                };
                if ch.insert {
                    s.on_insert(e, &view);
                } else {
                    s.on_remove(e, &view);
                }
            }
            if !ch.insert {
                for f in &mut self.flows {
                    match ch.side {
                        Side::Under => f.under.on_remove(e, &d.view(Side::Under, Weights::Lo)),
                        _ => f.over.on_remove(e, &d.view(Side::Over, Weights::Hi)),
                    }
                }
            }
            let (mst, dir, undir) = match ch.side {
                Side::Under => (&mut self.mst_under, &mut self.dir_under, &mut self.undir_under),
                _ => (&mut self.mst_over, &mut self.dir_over, &mut self.undir_over),
            };
            let mst_stale = match mst {
                Some(_) if ch.insert => present,
                Some(m) => !present && m.contains(e),
                None => false,
            };
            if mst_stale {
                *mst = None;
            }
            if cycle_stale(dir, e, ch.insert, present) {
                *dir = None;
            }
            if cycle_stale(undir, e, ch.insert, present) {
                *undir = None;
            }
        }
    }

    fn check_mst(&mut self, lit: Lit, limit: Option<u64>, cx: &mut CheckCx) {
        let expl = &mut self.expl;
        let limit = match limit {
            Some(l) => l,
            None => {
                cx.propagate(!lit, &[]);
                return;
            }
        };
        let g = &self.data;
        let admits = |m: &SpanningForest| m.spanning && m.weight <= limit;

        let under = self
            .mst_under
            .get_or_insert_with(|| mst::kruskal(&g.view(Side::Under, Weights::Lo)));
        if admits(under) {
            expl.clear();
            expl.extend(under.tree.iter().map(|&e| g.edges[e as usize].lit));
            cx.propagate(lit, expl);
            return;
        }

        let over_view = g.view(Side::Over, Weights::Lo);
        let over = self
            .mst_over
            .get_or_insert_with(|| mst::kruskal(&over_view));
        if !admits(over) {
            expl.clear();
            for (i, edge) in g.edges.iter().enumerate() {
                if g.status[i] != Status::Disabled || edge.from == edge.to {
                    continue;
                }
                let w = g.w_lo[i];
                let useful = !over.same_tree(edge.from, edge.to)
                    || over
                        .max_on_path(edge.from, edge.to, &over_view)
                        .map_or(false, |mx| w < mx);
                if useful {
                    expl.push(!edge.lit);
                }
            }
            cx.propagate(!lit, expl);
        }
    }

    fn check_acyclic(&mut self, lit: Lit, directed: bool, cx: &mut CheckCx) {
        let expl = &mut self.expl;
        let g = &self.data;
        let (under, over) = if directed {
            (&mut self.dir_under, &mut self.dir_over)
        } else {
            (&mut self.undir_under, &mut self.undir_over)
        };
        let find = |side: Side| {
            let view = g.view(side, Weights::Unit);
            if directed {
                cycle::directed_cycle(&view)
            } else {
                cycle::undirected_cycle(&view)
            }
        };

        if let Some(c) = under.get_or_insert_with(|| find(Side::Under)) {
            expl.clear();
            expl.extend(c.iter().map(|&e| g.edges[e as usize].lit));
            expl.sort_unstable();
            expl.dedup();
            cx.propagate(!lit, expl);
            return;
        }
        if over.get_or_insert_with(|| find(Side::Over)).is_some() {
            return;
        }
        expl.clear();
        if directed {
            let scc = self.scc.get_or_insert_with(|| {
                cycle::strong_components(&g.view(Side::Full, Weights::Unit))
            });
            for (i, edge) in g.edges.iter().enumerate() {
                if g.status[i] == Status::Disabled && scc[edge.from] == scc[edge.to] {
                    expl.push(!edge.lit);
                }
            }
        } else {
            for (i, edge) in g.edges.iter().enumerate() {
                if g.status[i] == Status::Disabled {
                    expl.push(!edge.lit);
                }
            }
        }
        cx.propagate(lit, expl);
    }

    fn check_atom(&mut self, atom: Atom, cx: &mut CheckCx) {
        match atom.kind {
            AtomKind::Path { dst, bound, det } => {
                self.paths[det].check(&self.data, atom.lit, dst, bound, cx, &mut self.expl)
            }
            AtomKind::Flow { bound, det } => {
                self.flows[det].check(&self.data, atom.lit, bound, cx, &mut self.expl)
            }
            AtomKind::Mst { limit } => self.check_mst(atom.lit, limit, cx),
            AtomKind::Acyclic { directed } => self.check_acyclic(atom.lit, directed, cx),
        }
    }
}

impl TheorySolver for GraphTheory {
    fn on_assign(&mut self, lit: Lit) {
        self.dirty = true;
        let d = &mut self.data;
        if let Some(es) = self.edge_of_var.get(&lit.var()) {
            for &e in es {
                let i = e as usize;
                if d.status[i] != Status::Undef {
                    continue;
                }
                if d.edges[i].lit == lit {
                    d.status[i] = Status::Enabled;
                    d.under_in[i] = true;
                    self.pending.push(Change {
                        edge: e,
                        side: Side::Under,
                        insert: true,
                    });
                } else {
                    d.status[i] = Status::Disabled;
                    d.over_in[i] = false;
                    self.pending.push(Change {
                        edge: e,
                        side: Side::Over,
                        insert: false,
                    });
                }
                self.trail.push(e);
            }
        }
    }

    fn new_level(&mut self) {
        self.lims.push(self.trail.len());
    }

    fn backtrack(&mut self, n: usize) {
        let lvl = self.lims.len() - n;
        let d = &mut self.data;
        for e in self.trail.drain(self.lims[lvl]..) {
            let i = e as usize;
            match d.status[i] {
                Status::Enabled => {
                    d.under_in[i] = false;
                    self.pending.push(Change {
                        edge: e,
                        side: Side::Under,
                        insert: false,
                    });
                }
                Status::Disabled => {
                    d.over_in[i] = true;
                    self.pending.push(Change {
                        edge: e,
                        side: Side::Over,
                        insert: true,
                    });
                }
                Status::Undef => (),
            }
            d.status[i] = Status::Undef;
        }
        self.lims.truncate(lvl);
        self.dirty = true;
    }

    fn check(&mut self, cx: &mut CheckCx, full: bool) {
        if full {
            self.invalidate_all();
        }
        if self.refresh_bounds(cx) {
            self.dirty = true;
        }
        self.apply_pending();
        if !self.dirty {
            return;
        }
        self.dirty = false;
        for i in 0..self.atoms.len() {
            let atom = self.atoms[i];
            self.check_atom(atom, cx);
            if !cx.is_ok() {
                self.dirty = true;
                return;
            }
        }
    }
}

/// The graph of a model: edges whose literal is true, weighted by the
/// model values of their bitvectors.
pub(crate) struct ModelGraph {
    present: Vec<bool>,
    weights: Vec<u64>,
}

impl GraphTheory {
    pub fn model_graph(
        &self,
        value: &dyn Fn(Lit) -> lbool,
        bv_value: &dyn Fn(BvId) -> u64,
    ) -> ModelGraph {
        let edges = &self.data.edges;
        ModelGraph {
            present: edges.iter().map(|e| value(e.lit) == lbool::TRUE).collect(),
            weights: edges
                .iter()
                .map(|e| match e.weight {
                    Weight::Const(w) => w,
                    Weight::Bv(bv) => bv_value(bv),
                })
                .collect(),
        }
    }

    fn model_view<'a>(&'a self, m: &'a ModelGraph, weighted: bool) -> View<'a> {
        View {
            n: self.data.n,
            edges: &self.data.edges,
            inc: &self.data.inc,
            present: &m.present,
            weights: if weighted { Some(&m.weights) } else { None },
        }
    }

    /// Nodes and edge literals of a shortest path witnessing path atom
    /// `atom` in the model graph.
    pub fn model_path(&self, m: &ModelGraph, atom: usize) -> Option<(Vec<usize>, Vec<Lit>)> {
        let (dst, det) = match self.atoms[atom].kind {
            AtomKind::Path { dst, det, .. } => (dst, &self.paths[det]),
            _ => return None,
        };
        let view = self.model_view(m, det.metric == Metric::Weighted);
        let mut sssp = Sssp::new(det.src);
        sssp.update(&view);
        let path = sssp.path(dst, &view)?;
        let mut nodes = vec![det.src];
        for &e in &path {
            let u = nodes[nodes.len() - 1];
            nodes.push(view.other(e, u));
        }
        let lits = path.iter().map(|&e| self.data.edges[e as usize].lit).collect();
        Some((nodes, lits))
    }

    /// Value and per-edge flows of a maximum flow for flow atom `atom` in
    /// the model graph. With `acyclic`, flow cycles are cancelled.
    pub fn model_flow(
        &self,
        m: &ModelGraph,
        atom: usize,
        acyclic: bool) -> Option<(u64,
        Vec<i128>,
    )> {
        let (s, t) = match self.atoms[atom].kind {
            AtomKind::Flow { det, .. } => (self.flows[det].under.s, self.flows[det].under.t),
            _ => return None,
        };
        let view = self.model_view(m, true);
        let mut mf = MaxFlow::new(s, t);
        mf.update(&view);
        let mut flows = mf.flows().to_vec();
        if acyclic {
            flow::cancel_cycles(&view, &mut flows);
        }
        let value = mf.value().min(u64::MAX as u128) as u64;
        Some((value, flows))
    }

    /// Weight of a minimum spanning tree of the model graph, if connected.
    pub fn model_mst_weight(&self, m: &ModelGraph) -> Option<u64> {
        let forest = mst::kruskal(&self.model_view(m, true));
        if forest.spanning {
            Some(forest.weight)
        } else {
            None
        }
    }
}
