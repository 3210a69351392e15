//! Minimum spanning forests.

use super::{cycle::forest_path, EdgeId, View};

/// Disjoint sets with path halving and union by rank.
pub(crate) struct UnionFind {
    parent: Vec<usize>,
    rank: Vec<u8>,
}

impl UnionFind {
    pub fn new(n: usize) -> Self {
        UnionFind {
            parent: (0..n).collect(),
            rank: vec![0; n],
        }
    }

    pub fn find(&mut self, mut x: usize) -> usize {
        while self.parent[x] != x {
            self.parent[x] = self.parent[self.parent[x]];
            x = self.parent[x];
        }
        x
    }

    /// Merge the sets of `a` and `b`. Returns `false` if they were already
    /// the same set.
    pub fn union(&mut self, a: usize, b: usize) -> bool {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra == rb {
            return false;
        }
        if self.rank[ra] < self.rank[rb] {
            self.parent[ra] = rb;
        } else if self.rank[ra] > self.rank[rb] {
            self.parent[rb] = ra;
        } else {
            self.parent[rb] = ra;
            self.rank[ra] += 1;
        }
        true
    }
}

/// A minimum spanning forest, directions ignored.
pub(crate) struct SpanningForest {
    /// Total weight of the forest, saturating.
    pub weight: u64,
    /// Is the forest a single tree over all nodes?
    pub spanning: bool,
    pub tree: Vec<EdgeId>,
    in_tree: Vec<bool>,
    adj: Vec<Vec<(EdgeId, usize)>>,
    comp: Vec<usize>,
}

/// Kruskal's algorithm over the present edges of `view`.
pub(crate) fn kruskal(view: &View) -> SpanningForest {
    let mut order: Vec<EdgeId> = (0..view.edges.len() as EdgeId)
        .filter(|&e| {
            let edge = &view.edges[e as usize];
            view.present[e as usize] && edge.from != edge.to
        })
        .collect();
    order.sort_by_key(|&e| view.weight(e));

    let mut uf = UnionFind::new(view.n);
    let mut forest = SpanningForest {
        weight: 0,
        spanning: false,
        tree: vec![],
        in_tree: vec![false; view.edges.len()],
        adj: vec![vec![]; view.n],
        comp: vec![],
    };
    for e in order {
        let edge = &view.edges[e as usize];
        if uf.union(edge.from, edge.to) {
            forest.weight = forest.weight.saturating_add(view.weight(e));
            forest.tree.push(e);
            forest.in_tree[e as usize] = true;
            forest.adj[edge.from].push((e, edge.to));
            forest.adj[edge.to].push((e, edge.from));
        }
    }
    forest.spanning = forest.tree.len() + 1 >= view.n;
    forest.comp = (0..view.n).map(|x| uf.find(x)).collect();
    forest
}

impl SpanningForest {
    pub fn contains(&self, e: EdgeId) -> bool {
        self.in_tree.get(e as usize).cloned().unwrap_or(false)
    }

    pub fn same_tree(&self, a: usize, b: usize) -> bool {
        self.comp[a] == self.comp[b]
    }

    /// Weight of the heaviest edge on the forest path from `a` to `b`.
    pub fn max_on_path(&self, a: usize, b: usize, view: &View) -> Option<u64> {
        let path = forest_path(&self.adj, a, b)?;
        path.iter().map(|&e| view.weight(e)).max()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::graph::test_util::Fixture;

    #[test]
    fn test_union_find() {
        let mut uf = UnionFind::new(4);
        assert!(uf.union(0, 1));
        assert!(uf.union(2, 3));
        assert!(!uf.union(1, 0));
        assert!(uf.union(1, 3));
        assert_eq!(uf.find(0), uf.find(2));
    }

    #[test]
    fn test_kruskal_triangle() {
        let mut f = Fixture::new(3);
        let a = f.edge(0, 1, 1, true);
        let b = f.edge(1, 2, 2, true);
        let c = f.edge(2, 0, 4, true);
        let m = kruskal(&f.view());
        assert!(m.spanning);
        assert_eq!(m.weight, 3);
        assert!(m.contains(a) && m.contains(b) && !m.contains(c));
        assert_eq!(m.max_on_path(2, 0, &f.view()), Some(2));

        f.present[a as usize] = false;
        f.present[c as usize] = false;
        let m = kruskal(&f.view());
        assert!(!m.spanning);
        assert!(!m.same_tree(0, 2));
        assert_eq!(m.max_on_path(0, 2, &f.view()), None);
    }

    #[test]
    fn test_trivial_graphs() {
        let f = Fixture::new(1);
        let m = kruskal(&f.view());
        assert!(m.spanning);
        assert_eq!(m.weight, 0);
        let f = Fixture::new(0);
        assert!(kruskal(&f.view()).spanning);
    }
}
