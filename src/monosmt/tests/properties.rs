//! Property tests: the engine against brute-force enumeration on small
//! random instances.

use monosmt::{lbool, Cmp, Context, Lit};
use proptest::prelude::*;
use std::collections::VecDeque;

fn holds(ctx: &Context, l: Lit) -> bool {
    ctx.model_lit(l).unwrap() == lbool::TRUE
}

/// Clauses over `n` variables, as DIMACS-style signed indices.
fn cnf(n: i32) -> impl Strategy<Value = Vec<Vec<i32>>> {
    let lit = (1..=n, any::<bool>()).prop_map(|(v, s)| if s { v } else { -v });
    prop::collection::vec(prop::collection::vec(lit, 1..4), 0..24)
}

fn brute_force_sat(n: i32, clauses: &[Vec<i32>]) -> bool {
    (0..1u32 << n).any(|mask| {
        clauses.iter().all(|c| {
            c.iter()
                .any(|&x| (mask >> (x.abs() - 1) & 1 == 1) == (x > 0))
        })
    })
}

/// Reachability from `s` over the edges whose flag is set.
fn brute_force_reach(n: usize, edges: &[(usize, usize)], on: &[bool], s: usize, t: usize) -> bool {
    let mut seen = vec![false; n];
    let mut stack = vec![s];
    seen[s] = true;
    while let Some(u) = stack.pop() {
        for (i, &(a, b)) in edges.iter().enumerate() {
            if on[i] && a == u && !seen[b] {
                seen[b] = true;
                stack.push(b);
            }
        }
    }
    seen[t]
}

/// Bellman-Ford over the enabled edges.
fn brute_force_dist(
    n: usize,
    edges: &[(usize, usize, u64)],
    on: &[bool],
    s: usize,
    t: usize,
) -> Option<u64> {
    let mut dist = vec![None; n];
    dist[s] = Some(0u64);
    for _ in 0..n {
        for (i, &(a, b, w)) in edges.iter().enumerate() {
            if let (true, Some(da)) = (on[i], dist[a]) {
                if dist[b].map_or(true, |db| da + w < db) {
                    dist[b] = Some(da + w);
                }
            }
        }
    }
    dist[t]
}

fn directed_cycle(n: usize, edges: &[(usize, usize)], on: &[bool]) -> bool {
    (0..edges.len()).any(|i| {
        let (a, b) = edges[i];
        on[i] && (a == b || brute_force_reach(n, edges, on, b, a))
    })
}

/// Assumptions setting each literal to its flag.
fn fix(lits: &[Lit], on: &[bool]) -> Vec<Lit> {
    lits.iter()
        .zip(on)
        .map(|(&l, &b)| if b { l } else { !l })
        .collect()
}

fn flags(n: usize, mask: u16) -> Vec<bool> {
    (0..n).map(|i| mask >> i & 1 == 1).collect()
}

/// Edmonds-Karp over the enabled edges.
fn brute_force_max_flow(
    n: usize,
    edges: &[(usize, usize, u64)],
    on: &[bool],
    s: usize,
    t: usize,
) -> u64 {
    let mut cap = vec![vec![0u64; n]; n];
    for (i, &(a, b, c)) in edges.iter().enumerate() {
        if on[i] && a != b {
            cap[a][b] += c;
        }
    }
    let mut flow = 0;
    loop {
        let mut prev = vec![None; n];
        prev[s] = Some(s);
        let mut queue = VecDeque::new();
        queue.push_back(s);
        while let Some(u) = queue.pop_front() {
            for v in 0..n {
                if prev[v].is_none() && cap[u][v] > 0 {
                    prev[v] = Some(u);
                    queue.push_back(v);
                }
            }
        }
        if prev[t].is_none() {
            return flow;
        }
        let mut path = vec![];
        let mut v = t;
        while v != s {
            let u = prev[v].unwrap();
            path.push((u, v));
            v = u;
        }
        let push = path.iter().map(|&(u, v)| cap[u][v]).min().unwrap();
        for &(u, v) in &path {
            cap[u][v] -= push;
            cap[v][u] += push;
        }
        flow += push;
    }
}

fn find(parent: &mut [usize], mut x: usize) -> usize {
    while parent[x] != x {
        x = parent[x];
    }
    x
}

/// Kruskal over the enabled edges, directions ignored. `None` if they do
/// not connect all nodes.
fn brute_force_mst(n: usize, edges: &[(usize, usize, u64)], on: &[bool]) -> Option<u64> {
    let mut order: Vec<_> = (0..edges.len()).filter(|&i| on[i]).collect();
    order.sort_by_key(|&i| edges[i].2);
    let mut parent: Vec<usize> = (0..n).collect();
    let (mut weight, mut joined) = (0, 0);
    for i in order {
        let (a, b, w) = edges[i];
        let (ra, rb) = (find(&mut parent, a), find(&mut parent, b));
        if ra != rb {
            parent[ra] = rb;
            weight += w;
            joined += 1;
        }
    }
    if joined + 1 == n {
        Some(weight)
    } else {
        None
    }
}

fn undirected_cycle(n: usize, edges: &[(usize, usize)], on: &[bool]) -> bool {
    let mut parent: Vec<usize> = (0..n).collect();
    for (i, &(a, b)) in edges.iter().enumerate() {
        if !on[i] {
            continue;
        }
        let (ra, rb) = (find(&mut parent, a), find(&mut parent, b));
        if ra == rb {
            return true;
        }
        parent[ra] = rb;
    }
    false
}

/// Runs of a machine with transitions `(from, to, input)`; input 0 reads
/// nothing.
fn brute_force_accepts(
    n: usize,
    trans: &[(usize, usize, usize)],
    on: &[bool],
    start: usize,
    accept: usize,
    s: &[usize],
) -> bool {
    let mut seen = vec![vec![false; s.len() + 1]; n];
    seen[start][0] = true;
    let mut todo = vec![(start, 0)];
    while let Some((q, pos)) = todo.pop() {
        for (i, &(from, to, input)) in trans.iter().enumerate() {
            if !on[i] || from != q {
                continue;
            }
            let next = if input == 0 {
                pos
            } else if pos < s.len() && s[pos] == input {
                pos + 1
            } else {
                continue;
            };
            if !seen[to][next] {
                seen[to][next] = true;
                todo.push((to, next));
            }
        }
    }
    seen[accept][s.len()]
}

/// Can the generator, reading `s` from state 0 to 1, write a string that
/// the acceptor consumes from state 0 to 1? Generator transitions are
/// `(from, to, input, output)`, acceptor ones `(from, to, input)`.
fn brute_force_compose(
    gen: &[(usize, usize, usize, usize)],
    gen_on: &[bool],
    acc: &[(usize, usize, usize)],
    acc_on: &[bool],
    s: &[usize],
) -> bool {
    let mut seen = vec![vec![vec![false; s.len() + 1]; 2]; 2];
    seen[0][0][0] = true;
    let mut todo = vec![(0, 0, 0)];
    let mut step = |g: usize, a: usize, pos: usize, todo: &mut Vec<_>| {
        if !seen[g][a][pos] {
            seen[g][a][pos] = true;
            todo.push((g, a, pos));
        }
    };
    while let Some((qg, qa, pos)) = todo.pop() {
        for (j, &(from, to, input)) in acc.iter().enumerate() {
            if acc_on[j] && from == qa && input == 0 {
                step(qg, to, pos, &mut todo);
            }
        }
        for (i, &(from, to, input, output)) in gen.iter().enumerate() {
            if !gen_on[i] || from != qg {
                continue;
            }
            let next = if input == 0 {
                pos
            } else if pos < s.len() && s[pos] == input {
                pos + 1
            } else {
                continue;
            };
            if output == 0 {
                step(to, qa, next, &mut todo);
                continue;
            }
            for (j, &(afrom, ato, ainput)) in acc.iter().enumerate() {
                if acc_on[j] && afrom == qa && ainput == output {
                    step(to, ato, next, &mut todo);
                }
            }
        }
    }
    seen[1][1][s.len()]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn cnf_agrees_with_enumeration(clauses in cnf(6)) {
        let mut ctx = Context::new();
        let vars: Vec<Lit> = (0..6).map(|_| ctx.new_lit()).collect();
        let to_lit = |x: i32| {
            let l = vars[(x.abs() - 1) as usize];
            if x > 0 { l } else { !l }
        };
        for c in &clauses {
            let c: Vec<Lit> = c.iter().map(|&x| to_lit(x)).collect();
            ctx.add_clause(&c).unwrap();
        }
        let sat = ctx.solve(&[]).unwrap();
        prop_assert_eq!(sat, brute_force_sat(6, &clauses));
        if sat {
            for c in &clauses {
                prop_assert!(c.iter().any(|&x| holds(&ctx, to_lit(x))));
            }
        }
    }

    #[test]
    fn reach_agrees_with_search(
        edges in prop::collection::vec((0..5usize, 0..5usize), 0..10),
        mask in any::<u16>(),
        s in 0..5usize,
        t in 0..5usize,
    ) {
        let mut ctx = Context::new();
        let g = ctx.new_graph();
        for _ in 0..5 {
            ctx.new_node(g).unwrap();
        }
        let lits: Vec<Lit> = edges
            .iter()
            .map(|&(a, b)| ctx.new_edge(g, a, b, 1).unwrap())
            .collect();
        let r = ctx.reaches(g, s, t).unwrap();
        let on: Vec<bool> = (0..edges.len()).map(|i| mask >> i & 1 == 1).collect();
        let assumps: Vec<Lit> = lits
            .iter()
            .zip(&on)
            .map(|(&l, &b)| if b { l } else { !l })
            .collect();

        prop_assert!(ctx.solve(&assumps).unwrap());
        prop_assert_eq!(holds(&ctx, r), brute_force_reach(5, &edges, &on, s, t));
    }

    #[test]
    fn reach_atom_is_satisfiable_iff_a_path_exists(
        edges in prop::collection::vec((0..5usize, 0..5usize), 0..8),
        s in 0..5usize,
        t in 0..5usize,
    ) {
        let mut ctx = Context::new();
        let g = ctx.new_graph();
        for _ in 0..5 {
            ctx.new_node(g).unwrap();
        }
        let lits: Vec<Lit> = edges
            .iter()
            .map(|&(a, b)| ctx.new_edge(g, a, b, 1).unwrap())
            .collect();
        let r = ctx.reaches(g, s, t).unwrap();
        let all = vec![true; edges.len()];
        let possible = brute_force_reach(5, &edges, &all, s, t);
        prop_assert_eq!(ctx.solve(&[r]).unwrap(), possible);
        if possible {
            let on: Vec<bool> = lits.iter().map(|&l| holds(&ctx, l)).collect();
            prop_assert!(brute_force_reach(5, &edges, &on, s, t));
        }
    }

    #[test]
    fn distance_agrees_with_bellman_ford(
        edges in prop::collection::vec((0..4usize, 0..4usize, 0..5u64), 0..8),
        mask in any::<u8>(),
        bound in 0..12u64,
    ) {
        let mut ctx = Context::new();
        let g = ctx.new_graph();
        for _ in 0..4 {
            ctx.new_node(g).unwrap();
        }
        let lits: Vec<Lit> = edges
            .iter()
            .map(|&(a, b, w)| ctx.new_edge(g, a, b, w).unwrap())
            .collect();
        let leq = ctx.shortest_path_leq_const(g, 0, 3, bound).unwrap();
        let lt = ctx.shortest_path_lt_const(g, 0, 3, bound).unwrap();
        let on: Vec<bool> = (0..edges.len()).map(|i| mask >> i & 1 == 1).collect();
        let assumps: Vec<Lit> = lits
            .iter()
            .zip(&on)
            .map(|(&l, &b)| if b { l } else { !l })
            .collect();

        prop_assert!(ctx.solve(&assumps).unwrap());
        let d = brute_force_dist(4, &edges, &on, 0, 3);
        prop_assert_eq!(holds(&ctx, leq), d.map_or(false, |d| d <= bound));
        prop_assert_eq!(holds(&ctx, lt), d.map_or(false, |d| d < bound));
    }

    #[test]
    fn acyclic_agrees_with_search(
        edges in prop::collection::vec((0..4usize, 0..4usize), 0..7),
        mask in any::<u8>(),
    ) {
        let mut ctx = Context::new();
        let g = ctx.new_graph();
        for _ in 0..4 {
            ctx.new_node(g).unwrap();
        }
        let lits: Vec<Lit> = edges
            .iter()
            .map(|&(a, b)| ctx.new_edge(g, a, b, 1).unwrap())
            .collect();
        let dag = ctx.acyclic_directed(g).unwrap();
        let on: Vec<bool> = (0..edges.len()).map(|i| mask >> i & 1 == 1).collect();
        let assumps: Vec<Lit> = lits
            .iter()
            .zip(&on)
            .map(|(&l, &b)| if b { l } else { !l })
            .collect();

        prop_assert!(ctx.solve(&assumps).unwrap());
        prop_assert_eq!(holds(&ctx, dag), !directed_cycle(4, &edges, &on));
    }

    #[test]
    fn bitvector_ops_agree_with_integers(a in 0..16u64, b in 0..16u64, k in 0..16u64) {
        let mut ctx = Context::new();
        let x = ctx.new_bv_anon(4).unwrap();
        let y = ctx.new_bv_anon(4).unwrap();
        let sum = ctx.bv_add(x, y).unwrap();
        let and = ctx.bv_and(x, y).unwrap();
        let xor = ctx.bv_xor(x, y).unwrap();
        let max = ctx.bv_max(&[x, y]).unwrap();
        let below = ctx.bv_cmp_const(sum, Cmp::Lt, k).unwrap();
        let xa = ctx.bv_cmp_const(x, Cmp::Eq, a).unwrap();
        let yb = ctx.bv_cmp_const(y, Cmp::Eq, b).unwrap();

        let sat = ctx.solve(&[xa, yb]).unwrap();
        prop_assert_eq!(sat, a + b < 16);
        if sat {
            prop_assert_eq!(ctx.model_bv(sum, false).unwrap(), a + b);
            prop_assert_eq!(ctx.model_bv(and, false).unwrap(), a & b);
            prop_assert_eq!(ctx.model_bv(xor, false).unwrap(), a ^ b);
            prop_assert_eq!(ctx.model_bv(max, false).unwrap(), a.max(b));
            prop_assert_eq!(holds(&ctx, below), a + b < k);
        }
    }

    #[test]
    fn bitvector_bounds_are_consistent(lo in 0..32u64, hi in 0..32u64) {
        let mut ctx = Context::new();
        let x = ctx.new_bv_anon(5).unwrap();
        let ge = ctx.bv_cmp_const(x, Cmp::Geq, lo).unwrap();
        let le = ctx.bv_cmp_const(x, Cmp::Leq, hi).unwrap();
        let sat = ctx.solve(&[ge, le]).unwrap();
        prop_assert_eq!(sat, lo <= hi);
        if sat {
            let v = ctx.model_bv(x, false).unwrap();
            prop_assert!(lo <= v && v <= hi);
        }
    }

    #[test]
    fn max_flow_agrees_with_edmonds_karp(
        edges in prop::collection::vec((0..4usize, 0..4usize, 0..4u64), 0..8),
        mask in any::<u16>(),
        k in 0..8u64,
    ) {
        let mut ctx = Context::new();
        let g = ctx.new_graph();
        for _ in 0..4 {
            ctx.new_node(g).unwrap();
        }
        let lits: Vec<Lit> = edges
            .iter()
            .map(|&(a, b, c)| ctx.new_edge(g, a, b, c).unwrap())
            .collect();
        let geq = ctx.maximum_flow_geq(g, 0, 3, k).unwrap();
        let gt = ctx.maximum_flow_gt(g, 0, 3, k).unwrap();
        let on = flags(edges.len(), mask);

        prop_assert!(ctx.solve(&fix(&lits, &on)).unwrap());
        let f = brute_force_max_flow(4, &edges, &on, 0, 3);
        prop_assert_eq!(holds(&ctx, geq), f >= k);
        prop_assert_eq!(holds(&ctx, gt), f > k);
        prop_assert_eq!(ctx.model_max_flow(g, geq).unwrap(), f);
    }

    #[test]
    fn spanning_tree_agrees_with_kruskal(
        edges in prop::collection::vec((0..4usize, 0..4usize, 0..5u64), 0..8),
        mask in any::<u16>(),
        bound in 0..16u64,
    ) {
        let mut ctx = Context::new();
        let g = ctx.new_graph();
        for _ in 0..4 {
            ctx.new_node(g).unwrap();
        }
        let lits: Vec<Lit> = edges
            .iter()
            .map(|&(a, b, w)| ctx.new_edge(g, a, b, w).unwrap())
            .collect();
        let leq = ctx.minimum_spanning_tree_leq(g, bound).unwrap();
        let lt = ctx.minimum_spanning_tree_lt(g, bound).unwrap();
        let on = flags(edges.len(), mask);

        prop_assert!(ctx.solve(&fix(&lits, &on)).unwrap());
        let w = brute_force_mst(4, &edges, &on);
        prop_assert_eq!(holds(&ctx, leq), w.map_or(false, |w| w <= bound));
        prop_assert_eq!(holds(&ctx, lt), w.map_or(false, |w| w < bound));
    }

    #[test]
    fn forest_agrees_with_union_find(
        edges in prop::collection::vec((0..4usize, 0..4usize), 0..7),
        mask in any::<u16>(),
    ) {
        let mut ctx = Context::new();
        let g = ctx.new_graph();
        for _ in 0..4 {
            ctx.new_node(g).unwrap();
        }
        let lits: Vec<Lit> = edges
            .iter()
            .map(|&(a, b)| ctx.new_edge(g, a, b, 1).unwrap())
            .collect();
        let forest = ctx.acyclic_undirected(g).unwrap();
        let on = flags(edges.len(), mask);

        prop_assert!(ctx.solve(&fix(&lits, &on)).unwrap());
        prop_assert_eq!(holds(&ctx, forest), !undirected_cycle(4, &edges, &on));
    }

    #[test]
    fn bitvector_distance_agrees_with_bellman_ford(
        edges in prop::collection::vec((0..4usize, 0..4usize, 0..5u64), 0..7),
        mask in any::<u16>(),
        bound in 0..14u64,
    ) {
        let mut ctx = Context::new();
        let g = ctx.new_graph();
        for _ in 0..4 {
            ctx.new_node(g).unwrap();
        }
        let mut assumps = vec![];
        let mut lits = vec![];
        for &(a, b, w) in &edges {
            let wb = ctx.new_bv_anon(4).unwrap();
            assumps.push(ctx.bv_cmp_const(wb, Cmp::Eq, w).unwrap());
            lits.push(ctx.new_edge_bv(g, a, b, wb).unwrap());
        }
        let d = ctx.new_bv_anon(5).unwrap();
        assumps.push(ctx.bv_cmp_const(d, Cmp::Eq, bound).unwrap());
        let leq = ctx.shortest_path_leq_bv(g, 0, 3, d).unwrap();
        let lt = ctx.shortest_path_lt_bv(g, 0, 3, d).unwrap();
        let on = flags(edges.len(), mask);
        assumps.extend(fix(&lits, &on));

        prop_assert!(ctx.solve(&assumps).unwrap());
        let dist = brute_force_dist(4, &edges, &on, 0, 3);
        prop_assert_eq!(holds(&ctx, leq), dist.map_or(false, |x| x <= bound));
        prop_assert_eq!(holds(&ctx, lt), dist.map_or(false, |x| x < bound));
    }

    #[test]
    fn fsm_acceptance_agrees_with_simulation(
        trans in prop::collection::vec((0..3usize, 0..3usize, 0..3usize), 0..8),
        mask in any::<u16>(),
        string in prop::collection::vec(1..3usize, 0..4),
    ) {
        let mut ctx = Context::new();
        let f = ctx.new_fsm(3, 1);
        for _ in 0..3 {
            ctx.new_state(f).unwrap();
        }
        let lits: Vec<Lit> = trans
            .iter()
            .map(|&(a, b, i)| ctx.new_transition(f, a, b, i, 0).unwrap())
            .collect();
        let s = ctx.new_string(&string);
        let acc = ctx.fsm_accepts(f, 0, 2, s).unwrap();
        let on = flags(trans.len(), mask);

        prop_assert!(ctx.solve(&fix(&lits, &on)).unwrap());
        let expected = brute_force_accepts(3, &trans, &on, 0, 2, &string);
        prop_assert_eq!(holds(&ctx, acc), expected);
    }

    #[test]
    fn fsm_composition_agrees_with_simulation(
        gen_trans in prop::collection::vec((0..2usize, 0..2usize, 0..3usize, 0..3usize), 0..6),
        acc_trans in prop::collection::vec((0..2usize, 0..2usize, 0..3usize), 0..5),
        mask in any::<u16>(),
        string in prop::collection::vec(1..3usize, 0..3),
    ) {
        let mut ctx = Context::new();
        let gen = ctx.new_fsm(3, 3);
        let acc = ctx.new_fsm(3, 1);
        for _ in 0..2 {
            ctx.new_state(gen).unwrap();
            ctx.new_state(acc).unwrap();
        }
        let mut lits: Vec<Lit> = gen_trans
            .iter()
            .map(|&(a, b, i, o)| ctx.new_transition(gen, a, b, i, o).unwrap())
            .collect();
        for &(a, b, i) in &acc_trans {
            lits.push(ctx.new_transition(acc, a, b, i, 0).unwrap());
        }
        let s = ctx.new_string(&string);
        let comp = ctx.fsm_composition_accepts(gen, acc, 0, 1, 0, 1, s).unwrap();
        let on = flags(lits.len(), mask);

        prop_assert!(ctx.solve(&fix(&lits, &on)).unwrap());
        let (gen_on, acc_on) = on.split_at(gen_trans.len());
        let expected = brute_force_compose(&gen_trans, gen_on, &acc_trans, acc_on, &string);
        prop_assert_eq!(holds(&ctx, comp), expected);
    }
}
