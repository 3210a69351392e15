use monosmt::{lbool, BvId, Cmp, Context, Error};

/// A `width`-bit bitvector fixed to `value` by a unit clause.
fn fixed(ctx: &mut Context, width: usize, value: u64) -> BvId {
    let x = ctx.new_bv_anon(width).unwrap();
    let eq = ctx.bv_cmp_const(x, Cmp::Eq, value).unwrap();
    ctx.add_unit_clause(eq).unwrap();
    x
}

fn value(ctx: &mut Context, x: BvId) -> u64 {
    assert!(ctx.solve(&[]).unwrap());
    ctx.model_bv(x, false).unwrap()
}

#[test]
fn test_arithmetic() {
    let mut ctx = Context::new();
    let a = fixed(&mut ctx, 4, 9);
    let b = fixed(&mut ctx, 4, 5);
    let sum = ctx.bv_add(a, b).unwrap();
    let diff = ctx.bv_sub(a, b).unwrap();
    assert_eq!(value(&mut ctx, sum), 14);
    assert_eq!(ctx.model_bv(diff, false).unwrap(), 4);

    // 9 + 9 overflows 4 bits
    let _twice = ctx.bv_add(a, a).unwrap();
    assert!(!ctx.solve(&[]).unwrap());
}

#[test]
fn test_sub_excludes_negative() {
    let mut ctx = Context::new();
    let a = fixed(&mut ctx, 3, 2);
    let b = fixed(&mut ctx, 3, 5);
    ctx.bv_sub(a, b).unwrap();
    assert!(!ctx.solve(&[]).unwrap());
}

#[test]
fn test_bitwise() {
    let mut ctx = Context::new();
    let a = fixed(&mut ctx, 4, 0b1100);
    let b = fixed(&mut ctx, 4, 0b1010);
    let and = ctx.bv_and(a, b).unwrap();
    let nand = ctx.bv_nand(a, b).unwrap();
    let or = ctx.bv_or(a, b).unwrap();
    let nor = ctx.bv_nor(a, b).unwrap();
    let xor = ctx.bv_xor(a, b).unwrap();
    let xnor = ctx.bv_xnor(a, b).unwrap();
    let not = ctx.bv_not(a).unwrap();
    assert!(ctx.solve(&[]).unwrap());
    let v = |x| ctx.model_bv(x, false).unwrap();
    assert_eq!(v(and), 0b1000);
    assert_eq!(v(nand), 0b0111);
    assert_eq!(v(or), 0b1110);
    assert_eq!(v(nor), 0b0001);
    assert_eq!(v(xor), 0b0110);
    assert_eq!(v(xnor), 0b1001);
    assert_eq!(v(not), 0b0011);
}

#[test]
fn test_concat_and_slice() {
    let mut ctx = Context::new();
    let lo = fixed(&mut ctx, 3, 0b101);
    let hi = fixed(&mut ctx, 2, 0b10);
    let c = ctx.bv_concat(lo, hi).unwrap();
    assert_eq!(ctx.bv_width(c).unwrap(), 5);
    let mid = ctx.bv_slice(c, 2, 3).unwrap();
    assert_eq!(ctx.bv_width(mid).unwrap(), 2);
    assert_eq!(value(&mut ctx, c), 0b10101);
    assert_eq!(ctx.model_bv(mid, false).unwrap(), 0b01);

    let wide = ctx.new_bv_anon(60).unwrap();
    assert_eq!(ctx.bv_concat(wide, c), Err(Error::InvalidWidth(65)));
}

#[test]
fn test_ite_min_max() {
    let mut ctx = Context::new();
    let a = fixed(&mut ctx, 4, 3);
    let b = fixed(&mut ctx, 4, 11);
    let d = fixed(&mut ctx, 4, 7);
    let c = ctx.new_lit();
    let ite = ctx.bv_ite(c, a, b).unwrap();
    let min = ctx.bv_min(&[b, a, d]).unwrap();
    let max = ctx.bv_max(&[a, d, b]).unwrap();

    assert!(ctx.solve(&[c]).unwrap());
    assert_eq!(ctx.model_bv(ite, false).unwrap(), 3);
    assert!(ctx.solve(&[!c]).unwrap());
    assert_eq!(ctx.model_bv(ite, false).unwrap(), 11);
    assert_eq!(ctx.model_bv(min, false).unwrap(), 3);
    assert_eq!(ctx.model_bv(max, false).unwrap(), 11);
}

#[test]
fn test_popcount() {
    let mut ctx = Context::new();
    let lits: Vec<_> = (0..5).map(|_| ctx.new_lit()).collect();
    let n = ctx.bv_popcount(&lits, 3).unwrap();
    assert!(ctx.solve(&[lits[0], lits[2], lits[4], !lits[1], !lits[3]]).unwrap());
    assert_eq!(ctx.model_bv(n, false).unwrap(), 3);

    // at least 4 of 5
    let four = ctx.bv_cmp_const(n, Cmp::Geq, 4).unwrap();
    assert!(!ctx.solve(&[four, !lits[0], !lits[1]]).unwrap());
    assert!(ctx.solve(&[four, !lits[0]]).unwrap());
    assert_eq!(ctx.model_bv(n, false).unwrap(), 4);

    // 2 bits cannot count 5
    let _small = ctx.bv_popcount(&lits, 2).unwrap();
    assert!(!ctx.solve(&lits).unwrap());
}

#[test]
fn test_comparisons_between_bitvectors() {
    let mut ctx = Context::new();
    let x = ctx.new_bv_anon(4).unwrap();
    let y = ctx.new_bv_anon(3).unwrap();
    let lt = ctx.bv_cmp(x, Cmp::Lt, y).unwrap();
    let eq = ctx.bv_cmp(x, Cmp::Eq, y).unwrap();
    let ne = ctx.bv_cmp(x, Cmp::Neq, y).unwrap();
    let x_ge_8 = ctx.bv_cmp_const(x, Cmp::Geq, 8).unwrap();

    // y has 3 bits, so it is below any x >= 8
    assert!(!ctx.solve(&[lt, x_ge_8]).unwrap());
    assert!(!ctx.solve(&[eq, x_ge_8]).unwrap());
    assert!(ctx.solve(&[ne, x_ge_8]).unwrap());
    assert!(ctx.solve(&[eq]).unwrap());
    let (vx, vy) = (ctx.model_bv(x, false).unwrap(), ctx.model_bv(y, false).unwrap());
    assert_eq!(vx, vy);
    assert!(ctx.solve(&[lt]).unwrap());
    assert!(ctx.model_bv(x, false).unwrap() < ctx.model_bv(y, false).unwrap());
    assert!(!ctx.solve(&[eq, ne]).unwrap());

    let leq = ctx.bv_cmp(x, Cmp::Leq, y).unwrap();
    let gt = ctx.bv_cmp(x, Cmp::Gt, y).unwrap();
    assert_eq!(leq, !gt);
}

#[test]
fn test_const_and_assert_eq() {
    let mut ctx = Context::new();
    let k = ctx.new_bv_const(5, 21).unwrap();
    let x = ctx.new_bv_anon(5).unwrap();
    ctx.bv_assert_eq(x, k).unwrap();
    assert_eq!(value(&mut ctx, x), 21);
    let lits = ctx.bv_bits(x).unwrap().to_vec();
    let explicit = ctx.new_bv(&lits).unwrap();
    assert_eq!(value(&mut ctx, explicit), 21);
    assert_eq!(ctx.n_bitvectors(), 3);

    let y = ctx.new_bv_anon(4).unwrap();
    assert_eq!(
        ctx.bv_assert_eq(x, y),
        Err(Error::WidthMismatch { expected: 5, got: 4 })
    );
}

#[test]
fn test_model_values_in_range() {
    let mut ctx = Context::new();
    let widths = [1, 2, 5, 8, 13];
    let bvs: Vec<_> = widths.iter().map(|&w| ctx.new_bv_anon(w).unwrap()).collect();
    let first = bvs[0];
    let top = ctx.bv_cmp_const(first, Cmp::Eq, 1).unwrap();
    for _ in 0..3 {
        assert!(ctx.solve(&[top]).unwrap());
        for (&b, &w) in bvs.iter().zip(&widths) {
            let v = ctx.model_bv(b, false).unwrap();
            assert!(v < 1 << w);
        }
        assert_eq!(ctx.model_bv(first, false).unwrap(), 1);
        assert_eq!(ctx.model_lit(top).unwrap(), lbool::TRUE);
    }
}

#[test]
fn test_model_respects_bounds_of_undecided_bits() {
    let mut ctx = Context::new();
    let x = ctx.new_bv_anon(3).unwrap();
    let bits = ctx.bv_bits(x).unwrap().to_vec();
    for b in bits {
        ctx.set_decision_var(b.var(), false).unwrap();
    }
    let le = ctx.bv_cmp_const(x, Cmp::Leq, 5).unwrap();
    let ge = ctx.bv_cmp_const(x, Cmp::Geq, 2).unwrap();
    ctx.add_unit_clause(le).unwrap();
    ctx.add_unit_clause(ge).unwrap();
    assert!(ctx.solve(&[]).unwrap());
    let lo = ctx.model_bv(x, false).unwrap();
    let hi = ctx.model_bv(x, true).unwrap();
    assert!(2 <= lo && lo <= hi && hi <= 5, "model range [{}, {}]", lo, hi);
}

#[test]
fn test_model_maximum_of_assigned_bits() {
    let mut ctx = Context::new();
    let x = fixed(&mut ctx, 4, 11);
    assert!(ctx.solve(&[]).unwrap());
    assert_eq!(ctx.model_bv(x, false).unwrap(), 11);
    assert_eq!(ctx.model_bv(x, true).unwrap(), 11);
}
