//! Single source shortest paths, maintained under edge insertions.

use {
    super::{EdgeId, View, INF},
    crate::intmap::{Comparator, HeapData},
    std::cmp,
};

/// Nodes ordered by tentative distance.
struct DistOrder<'a> {
    dist: &'a [u64],
}

impl<'a> Comparator<usize> for DistOrder<'a> {
    fn cmp(&self, a: &usize, b: &usize) -> cmp::Ordering {
        self.dist[*a].cmp(&self.dist[*b])
    }
}

/// Distances from `source` and the shortest path tree.
///
/// Insertions are repaired by decrease-only relaxation from the new edge.
/// Removing an edge that is not in the tree changes nothing; removing a
/// tree edge, or changing weights, forces a full recomputation.
pub(crate) struct Sssp {
    pub source: usize,
    dist: Vec<u64>,
    parent: Vec<Option<EdgeId>>,
    heap: HeapData<usize>,
    valid: bool,
}

impl Sssp {
    pub fn new(source: usize) -> Self {
        Sssp {
            source,
            dist: vec![],
            parent: vec![],
            heap: HeapData::new(),
            valid: false,
        }
    }

    pub fn invalidate(&mut self) {
        self.valid = false;
    }

    pub fn dist(&self, v: usize) -> u64 {
        self.dist.get(v).cloned().unwrap_or(INF)
    }

    /// Make distances current for `view`.
    pub fn update(&mut self, view: &View) {
        if self.valid && self.dist.len() == view.n {
            return;
        }
        trace!("sssp from {}: recompute ({} nodes)", self.source, view.n);
        self.dist.clear();
        self.dist.resize(view.n, INF);
        self.parent.clear();
        self.parent.resize(view.n, None);
        if self.source < view.n {
            self.dist[self.source] = 0;
            self.heap.promote(DistOrder { dist: &self.dist }).insert(self.source);
            self.run(view);
        }
        self.valid = true;
    }

    /// `e` was added to the graph.
    pub fn on_insert(&mut self, e: EdgeId, view: &View) {
        if !self.valid || self.dist.len() != view.n || !view.present[e as usize] {
            return;
        }
        let edge = &view.edges[e as usize];
        for &(u, v) in &[(edge.from, edge.to), (edge.to, edge.from)] {
            if (u == edge.from || edge.undirected) && self.relax(e, u, v, view) {
                self.heap.promote(DistOrder { dist: &self.dist }).update(v);
            }
        }
        self.run(view);
    }

    /// `e` was removed from the graph.
    pub fn on_remove(&mut self, e: EdgeId, view: &View) {
        if !self.valid || view.present[e as usize] {
            return;
        }
        let edge = &view.edges[e as usize];
        let in_tree = |x: usize| self.parent.get(x) == Some(&Some(e));
        if in_tree(edge.to) || in_tree(edge.from) {
            self.valid = false;
        }
    }

    fn relax(&mut self, e: EdgeId, u: usize, v: usize, view: &View) -> bool {
        let du = self.dist[u];
        if du == INF {
            return false;
        }
        let d = du.saturating_add(view.weight(e));
        if d < self.dist[v] {
            self.dist[v] = d;
            self.parent[v] = Some(e);
            true
        } else {
            false
        }
    }

    fn run(&mut self, view: &View) {
        loop {
            let u = match self.heap.promote(DistOrder { dist: &self.dist }).pop() {
                Some(u) => u,
                None => break,
            };
            for &e in &view.inc[u] {
                if let Some(v) = view.follow(e, u) {
                    if self.relax(e, u, v, view) {
                        self.heap.promote(DistOrder { dist: &self.dist }).update(v);
                    }
                }
            }
        }
    }

    /// Tree edges from the source to `t`, in path order.
    pub fn path(&self, t: usize, view: &View) -> Option<Vec<EdgeId>> {
        if self.dist(t) == INF {
            return None;
        }
        let mut path = vec![];
        let mut v = t;
        while v != self.source {
            let e = self.parent[v]?;
            path.push(e);
            v = view.other(e, v);
        }
        path.reverse();
        Some(path)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::graph::test_util::Fixture;

    #[test]
    fn test_dijkstra_and_path() {
        let mut f = Fixture::new(4);
        let a = f.edge(0, 1, 4, false);
        let b = f.edge(0, 2, 1, false);
        let c = f.edge(2, 1, 1, false);
        f.edge(1, 3, 1, false);
        let mut s = Sssp::new(0);
        s.update(&f.view());
        assert_eq!(s.dist(1), 2);
        assert_eq!(s.dist(3), 3);
        assert_eq!(s.path(1, &f.view()), Some(vec![b, c]));
        // removing a non-tree edge keeps the tree
        f.present[a as usize] = false;
        s.on_remove(a, &f.view());
        assert!(s.valid);
        f.present[c as usize] = false;
        s.on_remove(c, &f.view());
        s.update(&f.view());
        assert_eq!(s.dist(1), 4);
    }

    #[test]
    fn test_insert_relaxes() {
        let mut f = Fixture::new(3);
        f.edge(0, 1, 5, false);
        let e = f.edge(1, 2, 1, true);
        f.present[e as usize] = false;
        let mut s = Sssp::new(2);
        s.update(&f.view());
        assert_eq!(s.dist(0), INF);
        f.present[e as usize] = true;
        s.on_insert(e, &f.view());
        // undirected edge 1-2 reaches 1, not 0
        assert_eq!(s.dist(1), 1);
        assert_eq!(s.dist(0), INF);
    }
}
