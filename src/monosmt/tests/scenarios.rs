//! End-to-end uses of a `Context`: the classic small instances, incremental
//! solving and resource limits.

use monosmt::{lbool, Cmp, Context, Error, Lit, PbOp};
use std::time::Duration;

/// Log output is visible with `RUST_LOG=debug` and the `logging` feature.
fn init_log() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn pigeonhole(ctx: &mut Context, pigeons: usize, holes: usize) {
    let x: Vec<Vec<Lit>> = (0..pigeons)
        .map(|_| (0..holes).map(|_| ctx.new_lit()).collect())
        .collect();
    for p in &x {
        ctx.add_clause(p).unwrap();
    }
    for h in 0..holes {
        for p in 0..pigeons {
            for q in p + 1..pigeons {
                ctx.add_binary_clause(!x[p][h], !x[q][h]).unwrap();
            }
        }
    }
}

#[test]
fn test_reach_triangle() {
    init_log();
    let mut ctx = Context::new();
    let g = ctx.new_graph();
    let n: Vec<usize> = (0..3).map(|_| ctx.new_node(g).unwrap()).collect();
    let e1 = ctx.new_edge(g, n[0], n[1], 1).unwrap();
    let e2 = ctx.new_edge(g, n[1], n[2], 1).unwrap();
    let e3 = ctx.new_edge(g, n[0], n[2], 1).unwrap();
    ctx.add_ternary_clause(!e1, !e2, !e3).unwrap();
    ctx.add_binary_clause(e1, e3).unwrap();
    let r = ctx.reaches(g, n[0], n[2]).unwrap();
    ctx.add_unit_clause(r).unwrap();

    assert!(ctx.solve(&[]).unwrap());
    let v: Vec<bool> = [e1, e2, e3]
        .iter()
        .map(|&e| ctx.model_lit(e).unwrap() == lbool::TRUE)
        .collect();
    assert!(v[0] || v[2]);
    assert!(!(v[0] && v[1] && v[2]));
    // the model really has a path
    assert!(v[2] || (v[0] && v[1]));
    let nodes = ctx.model_path_nodes(g, r).unwrap().unwrap();
    assert_eq!(nodes.first(), Some(&n[0]));
    assert_eq!(nodes.last(), Some(&n[2]));
}

#[test]
fn test_bitvector_sums() {
    let mut ctx = Context::new();
    let bv1 = ctx.new_bv_anon(4).unwrap();
    let bv2 = ctx.new_bv_anon(4).unwrap();
    let bv3 = ctx.new_bv_anon(4).unwrap();
    let s12 = ctx.bv_add(bv1, bv2).unwrap();
    let s13 = ctx.bv_add(bv1, bv3).unwrap();
    let a = ctx.bv_cmp_const(s12, Cmp::Leq, 7).unwrap();
    let b = ctx.bv_cmp_const(s13, Cmp::Geq, 3).unwrap();
    let c = ctx.bv_cmp_const(bv1, Cmp::Geq, 2).unwrap();
    for &l in &[a, b, c] {
        ctx.add_unit_clause(l).unwrap();
    }

    assert!(ctx.solve(&[]).unwrap());
    let x1 = ctx.model_bv(bv1, false).unwrap();
    let x2 = ctx.model_bv(bv2, false).unwrap();
    let x3 = ctx.model_bv(bv3, false).unwrap();
    assert!((2..=7).contains(&x1));
    assert!(x1 + x2 <= 7);
    assert!(x1 + x3 >= 3);
    assert_eq!(ctx.model_bv(s12, false).unwrap(), x1 + x2);
    assert_eq!(ctx.model_bv(s13, false).unwrap(), x1 + x3);
}

#[test]
fn test_spanning_tree_triangle() {
    let mut ctx = Context::new();
    let g = ctx.new_graph();
    let n: Vec<usize> = (0..3).map(|_| ctx.new_node(g).unwrap()).collect();
    let w1 = ctx.new_undirected_edge(g, n[0], n[1], 1).unwrap();
    let w2 = ctx.new_undirected_edge(g, n[1], n[2], 2).unwrap();
    let _w4 = ctx.new_undirected_edge(g, n[0], n[2], 4).unwrap();
    let le3 = ctx.minimum_spanning_tree_leq(g, 3).unwrap();
    let le1 = ctx.minimum_spanning_tree_leq(g, 1).unwrap();
    ctx.add_unit_clause(le3).unwrap();
    ctx.add_unit_clause(!le1).unwrap();

    assert!(ctx.solve(&[]).unwrap());
    assert_eq!(ctx.model_lit(w1).unwrap(), lbool::TRUE);
    assert_eq!(ctx.model_lit(w2).unwrap(), lbool::TRUE);
    assert_eq!(ctx.model_mst_weight(g).unwrap(), Some(3));

    // weight 3 is only reachable with both light edges
    assert!(!ctx.solve(&[!w1]).unwrap());
    assert!(ctx.solve(&[]).unwrap());
}

#[test]
fn test_assumption_unsat_keeps_context() {
    let mut ctx = Context::new();
    let a = ctx.new_lit();
    let b = ctx.new_lit();
    ctx.add_binary_clause(!b, a).unwrap();
    ctx.add_binary_clause(!b, !a).unwrap();

    assert!(!ctx.solve(&[b]).unwrap());
    let core = ctx.conflict_clause().unwrap().to_vec();
    assert_eq!(core, vec![!b]);

    assert!(ctx.solve(&[]).unwrap());
    assert_eq!(ctx.model_lit(b).unwrap(), lbool::FALSE);
    assert!(ctx.conflict_clause().is_none());
    assert!(ctx.solve(&[!b]).unwrap());

    // still usable for more constraints
    let c = ctx.new_lit();
    ctx.add_binary_clause(c, b).unwrap();
    assert!(ctx.solve(&[]).unwrap());
    assert_eq!(ctx.model_lit(c).unwrap(), lbool::TRUE);
    assert!(!ctx.solve(&[!c]).unwrap());
}

#[test]
fn test_clause_invalidates_model() {
    let mut ctx = Context::new();
    let a = ctx.new_lit();
    assert!(ctx.solve(&[]).unwrap());
    assert!(ctx.model_lit(a).is_ok());
    ctx.add_unit_clause(a).unwrap();
    assert_eq!(ctx.model_lit(a), Err(Error::NoModel));
    assert!(ctx.solve(&[]).unwrap());
    assert_eq!(ctx.model_lit(a).unwrap(), lbool::TRUE);
}

#[test]
fn test_top_level_contradiction() {
    let mut ctx = Context::new();
    let a = ctx.new_lit();
    assert!(ctx.add_unit_clause(a).unwrap());
    assert!(!ctx.add_unit_clause(!a).unwrap());
    assert!(!ctx.solve(&[]).unwrap());
    assert!(!ctx.add_clause(&[]).unwrap());
}

#[test]
fn test_unknown_literals_are_rejected() {
    let mut ctx = Context::new();
    let a = ctx.new_lit();
    let mut other = Context::new();
    let bogus = (0..10).map(|_| other.new_lit()).last().unwrap();
    assert!(ctx.add_binary_clause(a, bogus).is_err());
    assert!(ctx.solve(&[bogus]).is_err());
    assert!(ctx.solve(&[a]).unwrap());
}

#[test]
fn test_conflict_limit() {
    init_log();
    let mut ctx = Context::new();
    pigeonhole(&mut ctx, 7, 6);
    ctx.set_conflict_limit(Some(5));
    assert_eq!(ctx.solve_limited(&[]).unwrap(), lbool::UNDEF);
    // the limit is per call
    assert_eq!(ctx.solve_limited(&[]).unwrap(), lbool::UNDEF);
    ctx.set_conflict_limit(None);
    assert_eq!(ctx.solve_limited(&[]).unwrap(), lbool::FALSE);
}

#[test]
fn test_time_limit() {
    let mut ctx = Context::new();
    pigeonhole(&mut ctx, 7, 6);
    ctx.set_time_limit(Some(Duration::from_secs(0)));
    assert_eq!(ctx.solve_limited(&[]).unwrap(), lbool::UNDEF);
    ctx.set_time_limit(Some(Duration::from_secs(3600)));
    assert_eq!(ctx.solve_limited(&[]).unwrap(), lbool::FALSE);
}

#[test]
fn test_memory_limit() {
    let mut ctx = Context::new();
    let a = ctx.new_lit();
    let b = ctx.new_lit();
    ctx.add_binary_clause(a, b).unwrap();
    ctx.set_memory_limit(Some(0));
    assert_eq!(ctx.solve_limited(&[]).unwrap(), lbool::UNDEF);
    assert_eq!(ctx.model_lit(a), Err(Error::NoModel));
    // still usable: new constraints, then a solve without the ceiling
    ctx.add_unit_clause(!a).unwrap();
    ctx.set_memory_limit(None);
    assert_eq!(ctx.solve_limited(&[]).unwrap(), lbool::TRUE);
    assert_eq!(ctx.model_lit(b).unwrap(), lbool::TRUE);
}

#[test]
fn test_propagation_limit() {
    init_log();
    let mut ctx = Context::new();
    pigeonhole(&mut ctx, 7, 6);
    ctx.set_propagation_limit(Some(20));
    assert_eq!(ctx.solve_limited(&[]).unwrap(), lbool::UNDEF);
    assert_eq!(ctx.solve_limited(&[]).unwrap(), lbool::UNDEF);
    ctx.set_propagation_limit(None);
    assert_eq!(ctx.solve_limited(&[]).unwrap(), lbool::FALSE);
}

#[test]
fn test_conflict_limit_spans_objectives() {
    let mut ctx = Context::new();
    let x = ctx.new_bv_anon(3).unwrap();
    let y = ctx.new_bv_anon(3).unwrap();
    let xb = ctx.bv_bits(x).unwrap().to_vec();
    for b in &xb {
        ctx.set_decision_polarity(b.var(), lbool::FALSE).unwrap();
    }
    // x >= 4 switches on 6 pigeons in 5 holes
    let p: Vec<Vec<Lit>> = (0..6)
        .map(|_| (0..5).map(|_| ctx.new_lit()).collect())
        .collect();
    for row in &p {
        let mut c = vec![!xb[2]];
        c.extend(row.iter().cloned());
        ctx.add_clause(&c).unwrap();
    }
    for h in 0..5 {
        for i in 0..6 {
            for j in i + 1..6 {
                ctx.add_clause(&[!xb[2], !p[i][h], !p[j][h]]).unwrap();
            }
        }
    }
    ctx.maximize_bv(x).unwrap();
    ctx.maximize_bv(y).unwrap();
    ctx.set_conflict_limit(Some(5));
    assert_eq!(ctx.solve_limited(&[]).unwrap(), lbool::TRUE);
    assert!(ctx.model_bv(x, false).unwrap() < 4);
    // the budget ran out on x, so y was never raised
    assert_eq!(ctx.model_bv(y, false).unwrap(), 0);

    // without the limit both objectives are optimized
    ctx.set_conflict_limit(None);
    assert_eq!(ctx.solve_limited(&[]).unwrap(), lbool::TRUE);
    assert_eq!(ctx.model_bv(x, false).unwrap(), 3);
    assert_eq!(ctx.model_bv(y, false).unwrap(), 7);
}

#[test]
fn test_plain_solve_ignores_limits() {
    let mut ctx = Context::from_args("-conflict-limit=1").unwrap();
    pigeonhole(&mut ctx, 6, 5);
    assert!(!ctx.solve(&[]).unwrap());
}

#[test]
fn test_stop_predicate() {
    let mut ctx = Context::new();
    pigeonhole(&mut ctx, 7, 6);
    ctx.set_stop(|| true);
    assert_eq!(ctx.solve_limited(&[]).unwrap(), lbool::UNDEF);
    assert!(ctx.conflict_clause().is_none());
}

#[test]
fn test_decision_settings() {
    let mut ctx = Context::new();
    let v = ctx.new_var();
    assert!(ctx.is_decision_var(v).unwrap());
    ctx.set_decision_var(v, false).unwrap();
    assert!(!ctx.is_decision_var(v).unwrap());
    ctx.set_decision_priority(v, 3).unwrap();
    assert_eq!(ctx.decision_priority(v).unwrap(), 3);
    ctx.set_decision_polarity(v, lbool::TRUE).unwrap();
    assert_eq!(ctx.decision_polarity(v).unwrap(), lbool::TRUE);

    let w = ctx.new_var();
    ctx.set_decision_polarity(w, lbool::TRUE).unwrap();
    assert!(ctx.solve(&[]).unwrap());
    assert_eq!(ctx.model_lit(Lit::new(w, true)).unwrap(), lbool::TRUE);
}

#[test]
fn test_pb_and_amo() {
    let mut ctx = Context::new();
    let x: Vec<Lit> = (0..4).map(|_| ctx.new_lit()).collect();
    ctx.assert_pb(&x, &[1, 2, 3, 4], PbOp::Eq, 5).unwrap();
    ctx.assert_at_most_one(&x[..2]).unwrap();

    assert!(ctx.solve(&[]).unwrap());
    let sum: i64 = x
        .iter()
        .zip(&[1, 2, 3, 4])
        .filter(|&(&l, _)| ctx.model_lit(l).unwrap() == lbool::TRUE)
        .map(|(_, &c)| c)
        .sum();
    assert_eq!(sum, 5);
    // 1+4 and 2+3 are the only ways
    assert!(!ctx.solve(&[!x[0], !x[1]]).unwrap());
    assert!(ctx.solve(&[x[1]]).unwrap());
    assert_eq!(ctx.model_lit(x[2]).unwrap(), lbool::TRUE);

    assert_eq!(
        ctx.assert_pb(&x, &[1, 2], PbOp::Geq, 1),
        Err(Error::LengthMismatch(4, 2))
    );
}

#[test]
fn test_gates_follow_truth_tables() {
    let mut ctx = Context::new();
    let a = ctx.new_lit();
    let b = ctx.new_lit();
    let c = ctx.new_lit();
    let gates = [
        ctx.and(a, b).unwrap(),
        ctx.or(a, b).unwrap(),
        ctx.nand(a, b).unwrap(),
        ctx.nor(a, b).unwrap(),
        ctx.xor(a, b).unwrap(),
        ctx.xnor(a, b).unwrap(),
        ctx.implies(a, b).unwrap(),
        ctx.ite(c, a, b).unwrap(),
        ctx.and_all(&[a, b, c]).unwrap(),
        ctx.or_all(&[a, b, c]).unwrap(),
    ];
    for mask in 0..8 {
        let (va, vb, vc) = (mask & 1 == 1, mask & 2 == 2, mask & 4 == 4);
        let set = |l: Lit, v: bool| if v { l } else { !l };
        assert!(ctx.solve(&[set(a, va), set(b, vb), set(c, vc)]).unwrap());
        let expected = [
            va && vb,
            va || vb,
            !(va && vb),
            !(va || vb),
            va != vb,
            va == vb,
            !va || vb,
            if vc { va } else { vb },
            va && vb && vc,
            va || vb || vc,
        ];
        for (&g, &e) in gates.iter().zip(&expected) {
            assert_eq!(ctx.model_lit(g).unwrap() == lbool::TRUE, e, "inputs {:03b}", mask);
        }
    }
}

#[test]
fn test_gates_fold_constants() {
    let mut ctx = Context::new();
    let t = ctx.true_lit();
    let a = ctx.new_lit();
    assert_eq!(ctx.and(a, t).unwrap(), a);
    assert_eq!(ctx.or(a, !t).unwrap(), a);
    assert_eq!(ctx.and_all(&[]).unwrap(), t);
    assert_eq!(ctx.or_all(&[]).unwrap(), !t);
    let n = ctx.n_vars();
    let g = ctx.and(a, !a).unwrap();
    assert_eq!(g, !t);
    assert_eq!(ctx.n_vars(), n);

    let mut other = Context::new();
    let unknown = (0..5).map(|_| other.new_lit()).last().unwrap();
    assert_eq!(
        ctx.xor(a, unknown),
        Err(Error::UnknownVar(unknown.var().idx()))
    );
}
