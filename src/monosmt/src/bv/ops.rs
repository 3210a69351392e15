//! Clause encodings of bitvector operations.
//!
//! Each function returns the bits of the result. Results never wrap around:
//! an overflowing addition or an underflowing subtraction is unsatisfiable.

use crate::{
    clause::Lit,
    encode::{ClauseSink, Gates},
};

/// Bitwise binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BitOp {
    And,
    Nand,
    Or,
    Nor,
    Xor,
    Xnor,
}

pub(crate) fn add<S: ClauseSink + ?Sized>(g: &mut Gates<S>, a: &[Lit], b: &[Lit]) -> Vec<Lit> {
    debug_assert_eq!(a.len(), b.len());
    let mut sum = g.add_bits(a, b);
    let carry = sum.pop().unwrap_or(!g.true_lit());
    g.assert_lit(!carry);
    sum
}

/// `r = a - b`, encoded as `b + r = a`.
pub(crate) fn sub<S: ClauseSink + ?Sized>(g: &mut Gates<S>, a: &[Lit], b: &[Lit]) -> Vec<Lit> {
    debug_assert_eq!(a.len(), b.len());
    let r: Vec<Lit> = (0..a.len()).map(|_| g.fresh()).collect();
    let sum = add(g, b, &r);
    for (&s, &x) in sum.iter().zip(a.iter()) {
        g.assert_equal(s, x);
    }
    r
}

pub(crate) fn bitwise<S: ClauseSink + ?Sized>(
    g: &mut Gates<S>,
    op: BitOp,
    a: &[Lit],
    b: &[Lit],
) -> Vec<Lit> {
    debug_assert_eq!(a.len(), b.len());
    a.iter()
        .zip(b.iter())
        .map(|(&x, &y)| match op {
            BitOp::And => g.and(x, y),
            BitOp::Nand => !g.and(x, y),
            BitOp::Or => g.or(x, y),
            BitOp::Nor => !g.or(x, y),
            BitOp::Xor => g.xor(x, y),
            BitOp::Xnor => g.equiv(x, y),
        })
        .collect()
}

pub(crate) fn not(a: &[Lit]) -> Vec<Lit> {
    a.iter().map(|&x| !x).collect()
}

/// `a` in the low bits, `b` in the high bits.
pub(crate) fn concat(a: &[Lit], b: &[Lit]) -> Vec<Lit> {
    a.iter().chain(b.iter()).cloned().collect()
}

/// Bits `lower..=upper`.
pub(crate) fn slice(a: &[Lit], lower: usize, upper: usize) -> Vec<Lit> {
    a[lower..=upper].to_vec()
}

pub(crate) fn min<S: ClauseSink + ?Sized>(g: &mut Gates<S>, args: &[&[Lit]]) -> Vec<Lit> {
    let mut m = args[0].to_vec();
    for x in &args[1..] {
        let lt = g.lt_bits(x, &m);
        m = g.ite_bits(lt, x, &m);
    }
    m
}

pub(crate) fn max<S: ClauseSink + ?Sized>(g: &mut Gates<S>, args: &[&[Lit]]) -> Vec<Lit> {
    let mut m = args[0].to_vec();
    for x in &args[1..] {
        let lt = g.lt_bits(&m, x);
        m = g.ite_bits(lt, x, &m);
    }
    m
}

/// Number of true literals among `lits`, on `width` bits.
pub(crate) fn popcount<S: ClauseSink + ?Sized>(
    g: &mut Gates<S>,
    lits: &[Lit],
    width: usize,
) -> Vec<Lit> {
    let mut cnt = g.count(lits);
    for &high in cnt.iter().skip(width) {
        g.assert_lit(!high);
    }
    let f = !g.true_lit();
    cnt.resize(width, f);
    cnt.truncate(width);
    cnt
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        callbacks::Basic,
        clause::lbool,
        core::{Solver, SolverOpts},
        interface::SolverInterface,
    };

    fn setup() -> (Solver<Basic>, Lit) {
        let mut s = Solver::new(SolverOpts::default(), Basic::new());
        let t = s.fresh_lit();
        s.add_clause(&[t]);
        (s, t)
    }

    fn fix(bits: &[Lit], v: u64) -> Vec<Lit> {
        bits.iter()
            .enumerate()
            .map(|(i, &b)| if (v >> i) & 1 == 1 { b } else { !b })
            .collect()
    }

    fn value(s: &Solver<Basic>, bits: &[Lit]) -> u64 {
        bits.iter()
            .enumerate()
            .filter(|&(_, &b)| s.value_lit(b) == lbool::TRUE)
            .fold(0, |acc, (i, _)| acc | 1 << i)
    }

    #[test]
    fn test_add_sub_no_wrap() {
        let (mut s, t) = setup();
        let a: Vec<Lit> = (0..3).map(|_| s.fresh_lit()).collect();
        let b: Vec<Lit> = (0..3).map(|_| s.fresh_lit()).collect();
        let (sum, diff) = {
            let mut g = Gates::new(&mut s, t);
            (add(&mut g, &a, &b), sub(&mut g, &a, &b))
        };
        for x in 0..8 {
            for y in 0..8 {
                let mut assumps = fix(&a, x);
                assumps.extend(fix(&b, y));
                let r = s.solve_limited(&assumps);
                if x + y < 8 && x >= y {
                    assert_eq!(r, lbool::TRUE);
                    assert_eq!(value(&s, &sum), x + y);
                    assert_eq!(value(&s, &diff), x - y);
                } else {
                    assert_eq!(r, lbool::FALSE, "{} {}", x, y);
                }
            }
        }
    }

    #[test]
    fn test_min_max_popcount() {
        let (mut s, t) = setup();
        let a: Vec<Lit> = (0..3).map(|_| s.fresh_lit()).collect();
        let b: Vec<Lit> = (0..3).map(|_| s.fresh_lit()).collect();
        let (lo, hi, pc) = {
            let mut g = Gates::new(&mut s, t);
            let lo = min(&mut g, &[&a[..], &b[..]]);
            let hi = max(&mut g, &[&a[..], &b[..]]);
            let both: Vec<Lit> = a.iter().chain(b.iter()).cloned().collect();
            let pc = popcount(&mut g, &both, 2);
            (lo, hi, pc)
        };
        for x in 0..8u64 {
            for y in 0..8u64 {
                let mut assumps = fix(&a, x);
                assumps.extend(fix(&b, y));
                let r = s.solve_limited(&assumps);
                if x.count_ones() + y.count_ones() > 3 {
                    assert_eq!(r, lbool::FALSE);
                    continue;
                }
                assert_eq!(r, lbool::TRUE);
                assert_eq!(value(&s, &lo), x.min(y));
                assert_eq!(value(&s, &hi), x.max(y));
                assert_eq!(value(&s, &pc), (x.count_ones() + y.count_ones()) as u64);
            }
        }
    }

    #[test]
    fn test_structural() {
        let (mut s, _) = setup();
        let a: Vec<Lit> = (0..4).map(|_| s.fresh_lit()).collect();
        assert_eq!(slice(&a, 1, 2), vec![a[1], a[2]]);
        assert_eq!(concat(&a[..1], &a[3..]), vec![a[0], a[3]]);
        assert_eq!(not(&a[..1]), vec![!a[0]]);
    }
}
