use monosmt::{lbool, Context, Error, PlaneId, ShapeOp};

/// Half-planes bounding the axis-aligned square `[lo, hi]^2`.
fn square(ctx: &mut Context, lo: i64, hi: i64) -> Vec<PlaneId> {
    let a = ctx.new_point(lo, lo);
    let b = ctx.new_point(hi, hi);
    let right = ctx.new_point(1, 0);
    let up = ctx.new_point(0, 1);
    let left = ctx.new_point(-1, 0);
    let down = ctx.new_point(0, -1);
    vec![
        ctx.new_plane(a, right).unwrap(),
        ctx.new_plane(a, up).unwrap(),
        ctx.new_plane(b, left).unwrap(),
        ctx.new_plane(b, down).unwrap(),
    ]
}

#[test]
fn test_fixed_shape_containment() {
    let mut ctx = Context::new();
    let planes = square(&mut ctx, 0, 10);
    let sq = ctx.new_primitive(&planes).unwrap();
    let inside = ctx.new_point(5, 5);
    let border = ctx.new_point(10, 0);
    let outside = ctx.new_point(11, 5);
    let a = ctx.shape_contains_point(sq, inside).unwrap();
    let b = ctx.shape_contains_point(sq, border).unwrap();
    let c = ctx.shape_contains_point(sq, outside).unwrap();

    assert!(ctx.solve(&[]).unwrap());
    assert_eq!(ctx.model_lit(a).unwrap(), lbool::TRUE);
    assert_eq!(ctx.model_lit(b).unwrap(), lbool::TRUE);
    assert_eq!(ctx.model_lit(c).unwrap(), lbool::FALSE);
    assert!(!ctx.solve(&[!a]).unwrap());
    assert!(!ctx.solve(&[c]).unwrap());
}

#[test]
fn test_conditional_difference() {
    let mut ctx = Context::new();
    let outer = square(&mut ctx, 0, 10);
    let inner = square(&mut ctx, 4, 6);
    let big = ctx.new_primitive(&outer).unwrap();
    let hole = ctx.new_lit();
    let small = ctx.new_conditional_primitive(&inner, hole).unwrap();
    let ring = ctx.new_shape(ShapeOp::Difference, big, small).unwrap();
    let center = ctx.new_point(5, 5);
    let corner = ctx.new_point(1, 1);
    let in_center = ctx.shape_contains_point(ring, center).unwrap();
    let in_corner = ctx.shape_contains_point(ring, corner).unwrap();

    assert!(ctx.solve(&[hole]).unwrap());
    assert_eq!(ctx.model_lit(in_center).unwrap(), lbool::FALSE);
    assert_eq!(ctx.model_lit(in_corner).unwrap(), lbool::TRUE);
    assert!(!ctx.solve(&[in_center, hole]).unwrap());
    assert!(ctx.solve(&[in_center]).unwrap());
    assert_eq!(ctx.model_lit(hole).unwrap(), lbool::FALSE);
    assert!(!ctx.solve(&[!in_corner]).unwrap());
}

#[test]
fn test_conditional_union() {
    let mut ctx = Context::new();
    let left = square(&mut ctx, 0, 4);
    let right = square(&mut ctx, 3, 8);
    let c1 = ctx.new_lit();
    let c2 = ctx.new_lit();
    let on = ctx.new_lit();
    let l = ctx.new_conditional_primitive(&left, c1).unwrap();
    let r = ctx.new_conditional_primitive(&right, c2).unwrap();
    let both = ctx.new_conditional_shape(ShapeOp::Union, l, r, on).unwrap();
    let meet = ctx.new_shape(ShapeOp::Intersection, l, r).unwrap();
    let p = ctx.new_point(3, 3);
    let q = ctx.new_point(7, 7);
    let in_both = ctx.shape_contains_point(both, p).unwrap();
    let in_meet = ctx.shape_contains_point(meet, p).unwrap();
    let q_in = ctx.shape_contains_point(both, q).unwrap();

    assert!(!ctx.solve(&[in_both, !on]).unwrap());
    assert!(!ctx.solve(&[in_both, !c1, !c2]).unwrap());
    assert!(ctx.solve(&[in_both, !c1]).unwrap());
    assert_eq!(ctx.model_lit(c2).unwrap(), lbool::TRUE);
    assert!(!ctx.solve(&[in_meet, !c2]).unwrap());
    assert!(!ctx.solve(&[q_in, !c2]).unwrap());
    assert!(ctx.solve(&[q_in, on, c2]).unwrap());
}

#[test]
fn test_geometry_errors() {
    let mut ctx = Context::new();
    let p = ctx.new_point(0, 0);
    assert_eq!(ctx.new_primitive(&[]), Err(Error::EmptyArguments));
    let mut other = Context::new();
    let o = other.new_point(1, 1);
    let far = other.new_point(2, 2);
    let plane = other.new_plane(o, far).unwrap();
    // ids from another context that this one never created
    assert!(ctx.new_plane(p, far).is_err());
    assert!(ctx.new_primitive(&[plane]).is_err());
}

#[test]
fn test_fsm_accepts() {
    let mut ctx = Context::new();
    let f = ctx.new_fsm(3, 1);
    let q0 = ctx.new_state(f).unwrap();
    let q1 = ctx.new_state(f).unwrap();
    let t1 = ctx.new_transition(f, q0, q1, 1, 0).unwrap();
    let t2 = ctx.new_transition(f, q1, q1, 2, 0).unwrap();
    let back = ctx.new_transition(f, q1, q0, 0, 0).unwrap();
    let s = ctx.new_string(&[1, 2, 2]);
    let acc = ctx.fsm_accepts(f, q0, q1, s).unwrap();

    assert!(!ctx.solve(&[acc, !t2]).unwrap());
    assert!(!ctx.solve(&[!acc, t1, t2]).unwrap());
    assert!(ctx.solve(&[acc]).unwrap());
    assert_eq!(ctx.model_lit(t1).unwrap(), lbool::TRUE);
    assert_eq!(ctx.model_lit(t2).unwrap(), lbool::TRUE);

    // `1 1` needs the epsilon move back to q0
    let s2 = ctx.new_string(&[1, 1]);
    let acc2 = ctx.fsm_accepts(f, q0, q1, s2).unwrap();
    assert!(!ctx.solve(&[acc2, !back]).unwrap());
    assert!(ctx.solve(&[acc2]).unwrap());
    assert_eq!(ctx.model_lit(back).unwrap(), lbool::TRUE);
}

#[test]
fn test_fsm_composition() {
    let mut ctx = Context::new();
    // reads 1 and writes 2, or reads 1 and writes 1
    let gen = ctx.new_fsm(2, 3);
    let g0 = ctx.new_state(gen).unwrap();
    let g1 = ctx.new_state(gen).unwrap();
    let write2 = ctx.new_transition(gen, g0, g1, 1, 2).unwrap();
    let write1 = ctx.new_transition(gen, g0, g1, 1, 1).unwrap();
    // consumes 2 only
    let acc = ctx.new_fsm(3, 1);
    let a0 = ctx.new_state(acc).unwrap();
    let a1 = ctx.new_state(acc).unwrap();
    let read2 = ctx.new_transition(acc, a0, a1, 2, 0).unwrap();
    let s = ctx.new_string(&[1]);
    let comp = ctx
        .fsm_composition_accepts(gen, acc, g0, g1, a0, a1, s)
        .unwrap();

    assert!(!ctx.solve(&[comp, !write2]).unwrap());
    assert!(!ctx.solve(&[comp, !read2]).unwrap());
    assert!(ctx.solve(&[comp, write1]).unwrap());
    assert_eq!(ctx.model_lit(write2).unwrap(), lbool::TRUE);
    assert!(!ctx.solve(&[!comp, write2, read2]).unwrap());
}

#[test]
fn test_fsm_errors() {
    let mut ctx = Context::new();
    let f = ctx.new_fsm(3, 2);
    let q = ctx.new_state(f).unwrap();
    assert_eq!(
        ctx.new_transition(f, q, q, 3, 0),
        Err(Error::InvalidLabel { label: 3, size: 3 })
    );
    assert_eq!(
        ctx.new_transition(f, q, q, 1, 2),
        Err(Error::InvalidLabel { label: 2, size: 2 })
    );
    assert_eq!(
        ctx.new_transition(f, q, 1, 1, 0),
        Err(Error::UnknownState { fsm: f.idx(), state: 1 })
    );
    let eps = ctx.new_string(&[1, 0]);
    assert_eq!(
        ctx.fsm_accepts(f, q, q, eps),
        Err(Error::InvalidSymbol { symbol: 0, size: 3 })
    );
    let big = ctx.new_string(&[5]);
    assert_eq!(
        ctx.fsm_accepts(f, q, q, big),
        Err(Error::InvalidSymbol { symbol: 5, size: 3 })
    );
    let ok = ctx.new_string(&[]);
    let empty = ctx.fsm_accepts(f, q, q, ok).unwrap();
    assert!(ctx.solve(&[]).unwrap());
    assert_eq!(ctx.model_lit(empty).unwrap(), lbool::TRUE);
}
