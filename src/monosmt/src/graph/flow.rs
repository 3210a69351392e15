//! Maximum flow by shortest augmenting paths.

use {
    super::{cycle, EdgeId, View},
    std::collections::VecDeque,
};

/// A flow from `s` to `t`, kept across insertions.
///
/// Flows are signed per edge: positive means from `from` to `to`. An
/// insertion only ever allows more augmentation, so the flow is kept and
/// augmented further; removing an edge that carries flow, or changing
/// capacities, resets it.
pub(crate) struct MaxFlow {
    pub s: usize,
    pub t: usize,
    flow: Vec<i128>,
    value: u128,
    valid: bool,
    prev: Vec<Option<(EdgeId, usize)>>,
    queue: VecDeque<usize>,
}

fn residual(view: &View, flow: &[i128], e: EdgeId, u: usize) -> i128 {
    let ei = e as usize;
    let edge = &view.edges[ei];
    let cap = if view.present[ei] {
        view.weight(e) as i128
    } else {
        0
    };
    let f = flow[ei];
    if edge.from == u {
        cap - f
    } else if edge.undirected {
        cap + f
    } else {
        f
    }
}

impl MaxFlow {
    pub fn new(s: usize, t: usize) -> Self {
        MaxFlow {
            s,
            t,
            flow: vec![],
            value: 0,
            valid: false,
            prev: vec![],
            queue: VecDeque::new(),
        }
    }

    pub fn invalidate(&mut self) {
        self.valid = false;
    }

    /// Value of the current flow. A source that is also the sink has
    /// unbounded flow.
    pub fn value(&self) -> u128 {
        if self.s == self.t {
            u128::MAX
        } else {
            self.value
        }
    }

    pub fn edge_flow(&self, e: EdgeId) -> i128 {
        self.flow.get(e as usize).cloned().unwrap_or(0)
    }

    pub fn flows(&self) -> &[i128] {
        &self.flow
    }

    /// `e` was removed from the graph.
    pub fn on_remove(&mut self, e: EdgeId, view: &View) {
        if !view.present[e as usize] && self.edge_flow(e) != 0 {
            self.valid = false;
        }
    }

    /// Augment until no augmenting path is left in `view`.
    pub fn update(&mut self, view: &View) {
        if !self.valid {
            self.flow.clear();
            self.value = 0;
            self.valid = true;
        }
        self.flow.resize(view.edges.len(), 0);
        if self.s == self.t || self.s >= view.n || self.t >= view.n {
            return;
        }
        let mut n_aug = 0;
        while self.bfs(view) {
            let mut bottleneck = i128::MAX;
            let mut v = self.t;
            while v != self.s {
                let (e, u) = match self.prev[v] {
                    Some(p) => p,
                    None => break,
                };
                bottleneck = bottleneck.min(residual(view, &self.flow, e, u));
                v = u;
            }
            let mut v = self.t;
            while v != self.s {
                let (e, u) = match self.prev[v] {
                    Some(p) => p,
                    None => break,
                };
                if view.edges[e as usize].from == u {
                    self.flow[e as usize] += bottleneck;
                } else {
                    self.flow[e as usize] -= bottleneck;
                }
                v = u;
            }
            self.value += bottleneck as u128;
            n_aug += 1;
        }
        if n_aug > 0 {
            trace!(
                "flow {}->{}: {} augmentations, value {}",
                self.s,
                self.t,
                n_aug,
                self.value
            );
        }
    }

    /// Breadth-first search for an augmenting path. Fills `prev`.
    fn bfs(&mut self, view: &View) -> bool {
        self.prev.clear();
        self.prev.resize(view.n, None);
        self.queue.clear();
        self.queue.push_back(self.s);
        while let Some(u) = self.queue.pop_front() {
            for &e in &view.inc[u] {
                let edge = &view.edges[e as usize];
                if edge.from == edge.to {
                    continue;
                }
                let v = view.other(e, u);
                if v == self.s || self.prev[v].is_some() {
                    continue;
                }
                if residual(view, &self.flow, e, u) <= 0 {
                    continue;
                }
                self.prev[v] = Some((e, u));
                if v == self.t {
                    return true;
                }
                self.queue.push_back(v);
            }
        }
        false
    }

    /// Nodes reachable from the source in the residual graph. After
    /// `update`, this is the source side of a minimum cut.
    pub fn source_side(&self, view: &View) -> Vec<bool> {
        let mut side = vec![false; view.n];
        if self.s >= view.n {
            return side;
        }
        side[self.s] = true;
        let mut stack = vec![self.s];
        while let Some(u) = stack.pop() {
            for &e in &view.inc[u] {
                let v = view.other(e, u);
                if !side[v] && residual(view, &self.flow, e, u) > 0 {
                    side[v] = true;
                    stack.push(v);
                }
            }
        }
        side
    }
}

/// Remove flow around cycles, leaving an acyclic flow of the same value.
pub(crate) fn cancel_cycles(view: &View, flow: &mut [i128]) {
    loop {
        let found = cycle::find_cycle(view.n, |u, out| {
            for &e in &view.inc[u] {
                let edge = &view.edges[e as usize];
                let f = flow[e as usize];
                if f > 0 && edge.from == u {
                    out.push((e, edge.to));
                } else if f < 0 && edge.to == u {
                    out.push((e, edge.from));
                }
            }
        });
        let cyc = match found {
            Some(c) => c,
            None => return,
        };
        let m = cyc
            .iter()
            .map(|&e| flow[e as usize].abs())
            .min()
            .unwrap_or(0);
        for &e in &cyc {
            let f = &mut flow[e as usize];
            if *f > 0 {
                *f -= m;
            } else {
                *f += m;
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::graph::test_util::Fixture;

    #[test]
    fn test_max_flow_and_cut() {
        let mut f = Fixture::new(4);
        let a = f.edge(0, 1, 3, false);
        f.edge(0, 2, 2, false);
        f.edge(1, 2, 5, false);
        let d = f.edge(1, 3, 2, false);
        let e = f.edge(2, 3, 3, false);
        let mut mf = MaxFlow::new(0, 3);
        mf.update(&f.view());
        assert_eq!(mf.value(), 5);
        let side = mf.source_side(&f.view());
        assert!(side[0]);
        assert!(!side[3]);
        // the sink edges are saturated
        assert_eq!(mf.edge_flow(d) + mf.edge_flow(e), 5);

        f.present[a as usize] = false;
        mf.on_remove(a, &f.view());
        mf.update(&f.view());
        assert_eq!(mf.value(), 2);
    }

    #[test]
    fn test_insertion_augments() {
        let mut f = Fixture::new(3);
        f.edge(0, 1, 4, false);
        let b = f.edge(1, 2, 1, true);
        let c = f.edge(1, 2, 2, false);
        f.present[c as usize] = false;
        let mut mf = MaxFlow::new(0, 2);
        mf.update(&f.view());
        assert_eq!(mf.value(), 1);
        f.present[c as usize] = true;
        mf.update(&f.view());
        assert_eq!(mf.value(), 3);
        assert_eq!(mf.edge_flow(b), 1);
    }

    #[test]
    fn test_undirected_both_ways() {
        let mut f = Fixture::new(2);
        let e = f.edge(1, 0, 7, true);
        let mut mf = MaxFlow::new(0, 1);
        mf.update(&f.view());
        assert_eq!(mf.value(), 7);
        assert_eq!(mf.edge_flow(e), -7);
        let mut same = MaxFlow::new(1, 1);
        same.update(&f.view());
        assert_eq!(same.value(), u128::MAX);
    }

    #[test]
    fn test_cancel_cycles() {
        let mut f = Fixture::new(3);
        f.edge(0, 1, 1, false);
        f.edge(1, 2, 1, false);
        f.edge(2, 0, 1, false);
        f.edge(1, 0, 1, false);
        let mut flow = vec![1, 1, 1, 0];
        cancel_cycles(&f.view(), &mut flow);
        assert_eq!(flow, vec![0, 0, 0, 0]);
    }
}
