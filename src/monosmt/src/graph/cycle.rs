//! Cycle detection and strongly connected components.

use super::{mst::UnionFind, EdgeId, View};

#[derive(Clone, Copy, PartialEq, Eq)]
enum Color {
    White,
    Grey,
    Black,
}

/// Find a cycle in the graph on `0..n` whose arcs are produced by `succ`.
///
/// `succ(u, out)` pushes every arc `(edge, head)` leaving `u`. The cycle is
/// returned as its edges, in order.
pub(crate) fn find_cycle<F>(n: usize, mut succ: F) -> Option<Vec<EdgeId>>
where
    F: FnMut(usize, &mut Vec<(EdgeId, usize)>),
{
    let mut color = vec![Color::White; n];
    let mut via: Vec<Option<(EdgeId, usize)>> = vec![None; n];
    let mut stack: Vec<(usize, Vec<(EdgeId, usize)>, usize)> = vec![];
    for root in 0..n {
        if color[root] != Color::White {
            continue;
        }
        color[root] = Color::Grey;
        let mut out = vec![];
        succ(root, &mut out);
        stack.push((root, out, 0));
        loop {
            let (u, next) = match stack.last_mut() {
                None => break,
                Some(top) => {
                    let next = top.1.get(top.2).cloned();
                    top.2 += 1;
                    (top.0, next)
                }
            };
            let (e, v) = match next {
                Some(arc) => arc,
                None => {
                    color[u] = Color::Black;
                    stack.pop();
                    continue;
                }
            };
            match color[v] {
                Color::White => {
                    color[v] = Color::Grey;
                    via[v] = Some((e, u));
                    let mut out = vec![];
                    succ(v, &mut out);
                    stack.push((v, out, 0));
                }
                Color::Grey => {
                    // `v` is on the stack: close the loop back to it
                    let mut cycle = vec![e];
                    let mut x = u;
                    while x != v {
                        let (pe, px) = via[x]?;
                        cycle.push(pe);
                        x = px;
                    }
                    cycle.reverse();
                    return Some(cycle);
                }
                Color::Black => (),
            }
        }
    }
    None
}

/// A directed cycle among the present edges. Undirected edges are two
/// opposite arcs, so each present one is a cycle by itself.
pub(crate) fn directed_cycle(view: &View) -> Option<Vec<EdgeId>> {
    find_cycle(view.n, |u, out| {
        for &e in &view.inc[u] {
            if let Some(v) = view.follow(e, u) {
                out.push((e, v));
            }
        }
    })
}

/// A cycle among the present edges, directions ignored.
pub(crate) fn undirected_cycle(view: &View) -> Option<Vec<EdgeId>> {
    let mut uf = UnionFind::new(view.n);
    let mut adj: Vec<Vec<(EdgeId, usize)>> = vec![vec![]; view.n];
    for (i, edge) in view.edges.iter().enumerate() {
        if !view.present[i] {
            continue;
        }
        let e = i as EdgeId;
        let (a, b) = (edge.from, edge.to);
        if a == b {
            return Some(vec![e]);
        }
        if uf.union(a, b) {
            adj[a].push((e, b));
            adj[b].push((e, a));
        } else {
            let mut path = forest_path(&adj, a, b)?;
            path.push(e);
            return Some(path);
        }
    }
    None
}

/// Edges of the unique path from `a` to `b` in the forest `adj`.
pub(crate) fn forest_path(adj: &[Vec<(EdgeId, usize)>], a: usize, b: usize) -> Option<Vec<EdgeId>> {
    let mut prev: Vec<Option<(EdgeId, usize)>> = vec![None; adj.len()];
    let mut visited = vec![false; adj.len()];
    visited[a] = true;
    let mut stack = vec![a];
    while let Some(u) = stack.pop() {
        if u == b {
            break;
        }
        for &(e, v) in &adj[u] {
            if !visited[v] {
                visited[v] = true;
                prev[v] = Some((e, u));
                stack.push(v);
            }
        }
    }
    if !visited[b] {
        return None;
    }
    let mut path = vec![];
    let mut x = b;
    while x != a {
        let (e, px) = prev[x]?;
        path.push(e);
        x = px;
    }
    path.reverse();
    Some(path)
}

/// Strongly connected component of each node, for arcs given by `view`.
pub(crate) fn strong_components(view: &View) -> Vec<usize> {
    let n = view.n;
    let mut visited = vec![false; n];
    let mut order = Vec::with_capacity(n);
    let mut stack: Vec<(usize, usize)> = vec![];
    for root in 0..n {
        if visited[root] {
            continue;
        }
        visited[root] = true;
        stack.push((root, 0));
        while let Some(top) = stack.last_mut() {
            let u = top.0;
            if top.1 < view.inc[u].len() {
                let e = view.inc[u][top.1];
                top.1 += 1;
                if let Some(v) = view.follow(e, u) {
                    if !visited[v] {
                        visited[v] = true;
                        stack.push((v, 0));
                    }
                }
            } else {
                order.push(u);
                stack.pop();
            }
        }
    }

    // second pass on the reversed arcs, in decreasing finish time
    let mut comp = vec![usize::MAX; n];
    let mut n_comps = 0;
    let mut todo = vec![];
    for &root in order.iter().rev() {
        if comp[root] != usize::MAX {
            continue;
        }
        comp[root] = n_comps;
        todo.push(root);
        while let Some(u) = todo.pop() {
            for &e in &view.inc[u] {
                if let Some(v) = view.follow_back(e, u) {
                    if comp[v] == usize::MAX {
                        comp[v] = n_comps;
                        todo.push(v);
                    }
                }
            }
        }
        n_comps += 1;
    }
    comp
}
