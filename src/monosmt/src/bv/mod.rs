//! Bounded bitvectors.
//!
//! A bitvector is a list of literals (least significant first) of width
//! 1 to 63. The theory tracks an interval `[lo, hi]` for each bitvector,
//! from its assigned bits and from assigned comparisons against constants,
//! and uses it to propagate comparison atoms and bits.
//!
//! Arithmetic and bitwise operations are not handled here: they are
//! encoded into clauses (see `ops`).

use {
    crate::{
        clause::{lbool, Lit, Var},
        dispatch::{CheckCx, TheorySolver},
    },
    rustc_hash::FxHashMap,
};

pub(crate) mod ops;

pub const MAX_WIDTH: usize = 63;

/// Identifier of a bitvector in a context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BvId(pub(crate) u32);

impl BvId {
    pub fn idx(self) -> usize {
        self.0 as usize
    }
}

/// Comparison operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cmp {
    Lt,
    Leq,
    Gt,
    Geq,
    Eq,
    Neq,
}

/// An interval of possible values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Bounds {
    pub lo: u64,
    pub hi: u64,
}

struct BvDef {
    bits: Vec<Lit>,
    const_atoms: Vec<u32>,
    pair_atoms: Vec<u32>,
}

/// `lit <=> bv >= k`, with `1 <= k <= max(bv)`
struct ConstAtom {
    k: u64,
    lit: Lit,
}

/// `lit <=> a >= b`
struct PairAtom {
    a: BvId,
    b: BvId,
    lit: Lit,
}

/// Definitions of all bitvectors and comparison atoms.
#[derive(Default)]
pub(crate) struct BvTable {
    defs: Vec<BvDef>,
    const_atoms: Vec<ConstAtom>,
    pair_atoms: Vec<PairAtom>,
    const_index: FxHashMap<(BvId, u64), Lit>,
    pair_index: FxHashMap<(BvId, BvId), Lit>,
}

#[inline]
pub(crate) fn max_value(width: usize) -> u64 {
    (1u64 << width) - 1
}

impl BvTable {
    pub fn len(&self) -> usize {
        self.defs.len()
    }

    pub fn has(&self, id: BvId) -> bool {
        id.idx() < self.defs.len()
    }

    pub fn add(&mut self, bits: Vec<Lit>) -> BvId {
        debug_assert!(!bits.is_empty() && bits.len() <= MAX_WIDTH);
        let id = BvId(self.defs.len() as u32);
        self.defs.push(BvDef {
            bits,
            const_atoms: vec![],
            pair_atoms: vec![],
        });
        id
    }

    pub fn bits(&self, id: BvId) -> &[Lit] {
        &self.defs[id.idx()].bits
    }

    pub fn width(&self, id: BvId) -> usize {
        self.defs[id.idx()].bits.len()
    }

    pub fn max(&self, id: BvId) -> u64 {
        max_value(self.width(id))
    }

    /// Existing atom for `id >= k`.
    pub fn const_atom(&self, id: BvId, k: u64) -> Option<Lit> {
        self.const_index.get(&(id, k)).cloned()
    }

    pub fn add_const_atom(&mut self, id: BvId, k: u64, lit: Lit) {
        debug_assert!(k >= 1 && k <= self.max(id));
        let i = self.const_atoms.len() as u32;
        self.const_atoms.push(ConstAtom { k, lit });
        self.defs[id.idx()].const_atoms.push(i);
        self.const_index.insert((id, k), lit);
    }

    /// Existing atom for `a >= b`.
    pub fn pair_atom(&self, a: BvId, b: BvId) -> Option<Lit> {
        self.pair_index.get(&(a, b)).cloned()
    }

    pub fn add_pair_atom(&mut self, a: BvId, b: BvId, lit: Lit) {
        debug_assert_ne!(a, b);
        let i = self.pair_atoms.len() as u32;
        self.pair_atoms.push(PairAtom { a, b, lit });
        self.defs[a.idx()].pair_atoms.push(i);
        self.defs[b.idx()].pair_atoms.push(i);
        self.pair_index.insert((a, b), lit);
    }

    /// Current bounds of `id` under the assignment `value`.
    pub fn bounds(&self, id: BvId, value: &dyn Fn(Lit) -> lbool) -> Bounds {
        let def = &self.defs[id.idx()];
        let mut lo = 0;
        let mut hi = 0;
        for (i, &b) in def.bits.iter().enumerate() {
            match value(b) {
                v if v == lbool::TRUE => {
                    lo |= 1 << i;
                    hi |= 1 << i;
                }
                v if v == lbool::UNDEF => hi |= 1 << i,
                _ => (),
            }
        }
        for &ai in &def.const_atoms {
            let a = &self.const_atoms[ai as usize];
            match value(a.lit) {
                v if v == lbool::TRUE => lo = lo.max(a.k),
                v if v == lbool::FALSE => hi = hi.min(a.k - 1),
                _ => (),
            }
        }
        Bounds { lo, hi }
    }

    /// Push true literals implying `id >= target`.
    ///
    /// Precondition: the lower bound of `id` is at least `target`.
    pub fn explain_lo(
        &self,
        id: BvId,
        target: u64,
        value: &dyn Fn(Lit) -> lbool,
        out: &mut Vec<Lit>,
    ) {
        if target == 0 {
            return;
        }
        let def = &self.defs[id.idx()];
        for &ai in &def.const_atoms {
            let a = &self.const_atoms[ai as usize];
            if a.k >= target && value(a.lit) == lbool::TRUE {
                out.push(a.lit);
                return;
            }
        }
        let mut sum = 0;
        for (i, &b) in def.bits.iter().enumerate().rev() {
            if value(b) == lbool::TRUE {
                sum |= 1 << i;
                out.push(b);
                if sum >= target {
                    return;
                }
            }
        }
        panic!("cannot explain {:?} >= {}", id, target);
    }

    /// Push true literals implying `id <= target`.
    ///
    /// Precondition: the upper bound of `id` is at most `target`.
    pub fn explain_hi(
        &self,
        id: BvId,
        target: u64,
        value: &dyn Fn(Lit) -> lbool,
        out: &mut Vec<Lit>,
    ) {
        let def = &self.defs[id.idx()];
        let mut hi = max_value(def.bits.len());
        if hi <= target {
            return;
        }
        for &ai in &def.const_atoms {
            let a = &self.const_atoms[ai as usize];
            if a.k - 1 <= target && value(a.lit) == lbool::FALSE {
                out.push(!a.lit);
                return;
            }
        }
        for (i, &b) in def.bits.iter().enumerate().rev() {
            if value(b) == lbool::FALSE {
                hi &= !(1 << i);
                out.push(!b);
                if hi <= target {
                    return;
                }
            }
        }
        panic!("cannot explain {:?} <= {}", id, target);
    }
}

impl<'a, 'b: 'a> CheckCx<'a, 'b> {
    pub fn bv_bounds(&self, id: BvId) -> Bounds {
        self.bv.bounds(id, &|l| self.value(l))
    }

    pub fn explain_bv_lo(&self, id: BvId, target: u64, out: &mut Vec<Lit>) {
        self.bv.explain_lo(id, target, &|l| self.value(l), out)
    }

    pub fn explain_bv_hi(&self, id: BvId, target: u64, out: &mut Vec<Lit>) {
        self.bv.explain_hi(id, target, &|l| self.value(l), out)
    }
}

/// Check state of the bitvector theory.
#[derive(Default)]
pub(crate) struct BvTheory {
    watch: FxHashMap<Var, Vec<BvId>>,
    dirty: Vec<BvId>,
    is_dirty: Vec<bool>,
    expl: Vec<Lit>,
}

impl BvTheory {
    /// Recheck `id` when `v` is assigned.
    pub fn watch_var(&mut self, v: Var, id: BvId) {
        let w = self.watch.entry(v).or_insert_with(Vec::new);
        if !w.contains(&id) {
            w.push(id);
        }
    }

    pub fn mark_dirty(&mut self, id: BvId) {
        if self.is_dirty.len() <= id.idx() {
            self.is_dirty.resize(id.idx() + 1, false);
        }
        if !self.is_dirty[id.idx()] {
            self.is_dirty[id.idx()] = true;
            self.dirty.push(id);
        }
    }

    fn check_bv(&mut self, cx: &mut CheckCx, id: BvId) {
        let table = cx.bv;
        let b = cx.bv_bounds(id);
        let expl = &mut self.expl;

        if b.lo > b.hi {
            expl.clear();
            cx.explain_bv_lo(id, b.hi + 1, expl);
            cx.explain_bv_hi(id, b.hi, expl);
            trace!("bv {:?}: empty range [{}, {}]", id, b.lo, b.hi);
            cx.conflict(expl);
            return;
        }

        for &ai in &table.defs[id.idx()].const_atoms {
            let a = &table.const_atoms[ai as usize];
            if b.lo >= a.k {
                expl.clear();
                cx.explain_bv_lo(id, a.k, expl);
                cx.propagate(a.lit, expl);
            } else if b.hi < a.k {
                expl.clear();
                cx.explain_bv_hi(id, a.k - 1, expl);
                cx.propagate(!a.lit, expl);
            }
            if !cx.is_ok() {
                return;
            }
        }

        // bits above the highest bit where `lo` and `hi` differ are fixed
        let diff = b.lo ^ b.hi;
        let fixed_from = 64 - diff.leading_zeros() as usize;
        let bits = table.bits(id);
        let mut explained = false;
        for i in fixed_from..bits.len() {
            let p = bits[i] ^ ((b.lo >> i) & 1 == 0);
            if cx.value(p) != lbool::UNDEF {
                continue;
            }
            if !explained {
                expl.clear();
                cx.explain_bv_lo(id, b.lo, expl);
                cx.explain_bv_hi(id, b.hi, expl);
                explained = true;
            }
            if !cx.propagate(p, expl) {
                return;
            }
        }

        for &pi in &table.defs[id.idx()].pair_atoms {
            let a = &table.pair_atoms[pi as usize];
            let ba = cx.bv_bounds(a.a);
            let bb = cx.bv_bounds(a.b);
            if ba.lo >= bb.hi {
                expl.clear();
                cx.explain_bv_lo(a.a, bb.hi, expl);
                cx.explain_bv_hi(a.b, bb.hi, expl);
                cx.propagate(a.lit, expl);
            } else if ba.hi < bb.lo {
                expl.clear();
                cx.explain_bv_hi(a.a, ba.hi, expl);
                cx.explain_bv_lo(a.b, ba.hi + 1, expl);
                cx.propagate(!a.lit, expl);
            }
            if !cx.is_ok() {
                return;
            }
        }
    }
}

impl TheorySolver for BvTheory {
    fn on_assign(&mut self, lit: Lit) {
        if let Some(ids) = self.watch.get(&lit.var()) {
            for &id in ids {
                if self.is_dirty.len() <= id.idx() {
                    self.is_dirty.resize(id.idx() + 1, false);
                }
                if !self.is_dirty[id.idx()] {
                    self.is_dirty[id.idx()] = true;
                    self.dirty.push(id);
                }
            }
        }
    }

    fn new_level(&mut self) {}

    fn backtrack(&mut self, _n: usize) {}

    fn check(&mut self, cx: &mut CheckCx, full: bool) {
        if full {
            for i in 0..cx.bv.len() {
                self.mark_dirty(BvId(i as u32));
            }
        }
        while let Some(id) = self.dirty.pop() {
            self.is_dirty[id.idx()] = false;
            self.check_bv(cx, id);
            if !cx.is_ok() {
                for id in self.dirty.drain(..) {
                    self.is_dirty[id.idx()] = false;
                }
                return;
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::collections::HashMap;

    fn lit(i: u32) -> Lit {
        Lit::new(Var::from_idx(i), true)
    }

    fn assignment(a: &[(Lit, bool)]) -> impl Fn(Lit) -> lbool {
        let m: HashMap<Var, bool> = a.iter().map(|&(l, b)| (l.var(), b == l.sign())).collect();
        move |l: Lit| match m.get(&l.var()) {
            Some(&b) => lbool::new(b == l.sign()),
            None => lbool::UNDEF,
        }
    }

    #[test]
    fn test_bounds_from_bits() {
        let mut t = BvTable::default();
        let x = t.add(vec![lit(0), lit(1), lit(2), lit(3)]);
        let v = assignment(&[(lit(3), true), (lit(1), false)]);
        let b = t.bounds(x, &v);
        assert_eq!(b, Bounds { lo: 8, hi: 13 });
        let mut out = vec![];
        t.explain_lo(x, 8, &v, &mut out);
        assert_eq!(out, vec![lit(3)]);
        out.clear();
        t.explain_hi(x, 13, &v, &mut out);
        assert_eq!(out, vec![!lit(1)]);
    }

    #[test]
    fn test_bounds_from_atoms() {
        let mut t = BvTable::default();
        let x = t.add(vec![lit(0), lit(1), lit(2)]);
        t.add_const_atom(x, 3, lit(10));
        t.add_const_atom(x, 6, lit(11));
        let v = assignment(&[(lit(10), true), (lit(11), false)]);
        assert_eq!(t.bounds(x, &v), Bounds { lo: 3, hi: 5 });
        let mut out = vec![];
        t.explain_hi(x, 5, &v, &mut out);
        assert_eq!(out, vec![!lit(11)]);
        out.clear();
        t.explain_lo(x, 2, &v, &mut out);
        assert_eq!(out, vec![lit(10)]);
        assert_eq!(t.const_atom(x, 6), Some(lit(11)));
        assert_eq!(t.const_atom(x, 4), None);
    }

    #[test]
    fn test_explain_greedy_bits() {
        let mut t = BvTable::default();
        let x = t.add(vec![lit(0), lit(1), lit(2)]);
        let v = assignment(&[(lit(0), true), (lit(1), true), (lit(2), true)]);
        let mut out = vec![];
        t.explain_lo(x, 5, &v, &mut out);
        assert_eq!(out, vec![lit(2), lit(1)]);
    }
}
