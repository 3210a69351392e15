//! Pseudo-boolean and cardinality constraints, encoded into clauses.

use crate::{
    clause::Lit,
    encode::{ClauseSink, Gates},
};

/// Comparison of a pseudo-boolean constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PbOp {
    Lt,
    Leq,
    Eq,
    Geq,
    Gt,
}

impl PbOp {
    /// Parse the textual form used by GNF files.
    pub fn parse(s: &str) -> Option<PbOp> {
        Some(match s {
            "<" => PbOp::Lt,
            "<=" => PbOp::Leq,
            "==" | "=" => PbOp::Eq,
            ">=" => PbOp::Geq,
            ">" => PbOp::Gt,
            _ => return None,
        })
    }
}

/// Assert `sum(coefs[i] * lits[i]) op rhs`.
pub(crate) fn assert_pb<S: ClauseSink + ?Sized>(
    g: &mut Gates<S>,
    lits: &[Lit],
    coefs: &[i64],
    op: PbOp,
    rhs: i64,
) {
    debug_assert_eq!(lits.len(), coefs.len());
    // c * l == c + |c| * !l for negative c
    let mut offset: i128 = 0;
    let mut pos_lits = Vec::with_capacity(lits.len());
    let mut pos_coefs = Vec::with_capacity(lits.len());
    for (&l, &c) in lits.iter().zip(coefs.iter()) {
        if c < 0 {
            offset += c as i128;
            pos_lits.push(!l);
        } else {
            pos_lits.push(l);
        }
        pos_coefs.push(c.unsigned_abs());
    }
    let total: i128 = pos_coefs.iter().map(|&c| c as i128).sum();
    let k = rhs as i128 - offset;

    // bounds on the sum of the normalized terms
    let (lo, hi) = match op {
        PbOp::Lt => (None, Some(k - 1)),
        PbOp::Leq => (None, Some(k)),
        PbOp::Eq => (Some(k), Some(k)),
        PbOp::Geq => (Some(k), None),
        PbOp::Gt => (Some(k + 1), None),
    };
    let lo = lo.filter(|&l| l > 0);
    let hi = hi.filter(|&h| h < total);
    if lo.map_or(false, |l| l > total) || hi.map_or(false, |h| h < 0) {
        trace!("pb constraint is trivially false");
        g.add_clause(&[]);
        return;
    }
    if lo.is_none() && hi.is_none() {
        return;
    }

    let sum = g.weighted_sum(&pos_lits, &pos_coefs);
    if let Some(l) = lo {
        let ge = g.geq_const(&sum, l as u64);
        g.assert_lit(ge);
    }
    if let Some(h) = hi {
        let gt = g.geq_const(&sum, h as u64 + 1);
        g.assert_lit(!gt);
    }
}

/// At most one of `lits` is true.
///
/// Small sets use the pairwise encoding, larger ones a sequential counter.
pub(crate) fn at_most_one<S: ClauseSink + ?Sized>(g: &mut Gates<S>, lits: &[Lit]) {
    if lits.len() <= 5 {
        for (i, &a) in lits.iter().enumerate() {
            for &b in &lits[i + 1..] {
                g.add_clause(&[!a, !b]);
            }
        }
        return;
    }
    // s[i] is true if one of lits[..=i] is true
    let mut prev = lits[0];
    for &x in &lits[1..] {
        let s = g.fresh();
        g.add_clause(&[!prev, s]);
        g.add_clause(&[!x, s]);
        g.add_clause(&[!prev, !x]);
        prev = s;
    }
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

    fn setup(n: usize) -> (Solver<Basic>, Lit, Vec<Lit>) {
        let mut s = Solver::new(SolverOpts::default(), Basic::new());
        let t = s.fresh_lit();
        s.add_clause(&[t]);
        let lits = (0..n).map(|_| s.fresh_lit()).collect();
        (s, t, lits)
    }

    fn fix(lits: &[Lit], mask: u32) -> Vec<Lit> {
        lits.iter()
            .enumerate()
            .map(|(i, &l)| if mask >> i & 1 == 1 { l } else { !l })
            .collect()
    }

    #[test]
    fn test_pb_exhaustive() {
        let coefs = [3, -2, 1];
        for &op in &[PbOp::Lt, PbOp::Leq, PbOp::Eq, PbOp::Geq, PbOp::Gt] {
            for rhs in -3..=5 {
                let (mut s, t, lits) = setup(3);
                assert_pb(&mut Gates::new(&mut s, t), &lits, &coefs, op, rhs);
                for mask in 0..8u32 {
                    let sum: i64 = (0..3)
                        .filter(|i| mask >> i & 1 == 1)
                        .map(|i| coefs[i])
                        .sum();
                    let expected = match op {
                        PbOp::Lt => sum < rhs,
                        PbOp::Leq => sum <= rhs,
                        PbOp::Eq => sum == rhs,
                        PbOp::Geq => sum >= rhs,
                        PbOp::Gt => sum > rhs,
                    };
                    let r = s.solve_limited(&fix(&lits, mask));
                    assert_eq!(r == lbool::TRUE, expected, "{:?} {} {}", op, rhs, mask);
                }
            }
        }
    }

    #[test]
    fn test_at_most_one() {
        for &n in &[3usize, 7] {
            let (mut s, t, lits) = setup(n);
            at_most_one(&mut Gates::new(&mut s, t), &lits);
            for mask in 0..(1u32 << n) {
                let r = s.solve_limited(&fix(&lits, mask));
                assert_eq!(r == lbool::TRUE, mask.count_ones() <= 1, "{} {:b}", n, mask);
            }
        }
    }
}
