//! Tseitin encoding of boolean gates and small arithmetic circuits.
//!
//! Gates fold constants: a gate over the constant literal (or its negation)
//! returns an existing literal instead of a fresh one. Bits are always
//! least significant first.

use crate::{
    callbacks::Callbacks,
    clause::Lit,
    core::Solver,
    interface::SolverInterface,
};

/// Something we can add clauses and fresh literals to.
pub trait ClauseSink {
    fn fresh_lit(&mut self) -> Lit;
    fn add_clause(&mut self, lits: &[Lit]);
}

impl<Cb: Callbacks> ClauseSink for Solver<Cb> {
    fn fresh_lit(&mut self) -> Lit {
        Lit::new(self.new_var_default(), true)
    }

    fn add_clause(&mut self, lits: &[Lit]) {
        let mut c = lits.to_vec();
        self.add_clause_reuse(&mut c);
    }
}

/// Gate builder over a clause sink.
pub struct Gates<'a, S: ClauseSink + ?Sized> {
    sink: &'a mut S,
    t: Lit,
}

impl<'a, S: ClauseSink + ?Sized> Gates<'a, S> {
    /// `true_lit` must be a literal asserted true in `sink`.
    pub fn new(sink: &'a mut S, true_lit: Lit) -> Self {
        Gates { sink, t: true_lit }
    }

    #[inline]
    pub fn true_lit(&self) -> Lit {
        self.t
    }

    #[inline]
    pub fn constant(&self, b: bool) -> Lit {
        if b {
            self.t
        } else {
            !self.t
        }
    }

    /// Constant value of `l`, if it is one.
    #[inline]
    pub fn const_value(&self, l: Lit) -> Option<bool> {
        if l == self.t {
            Some(true)
        } else if l == !self.t {
            Some(false)
        } else {
            None
        }
    }

    pub fn fresh(&mut self) -> Lit {
        self.sink.fresh_lit()
    }

    /// Add a clause, dropping false constants. A clause containing the true
    /// constant is skipped.
    pub fn add_clause(&mut self, lits: &[Lit]) {
        if lits.iter().any(|&l| l == self.t) {
            return;
        }
        let t = self.t;
        let c: Vec<Lit> = lits.iter().cloned().filter(|&l| l != !t).collect();
        self.sink.add_clause(&c);
    }

    pub fn assert_lit(&mut self, a: Lit) {
        self.add_clause(&[a]);
    }

    pub fn assert_equal(&mut self, a: Lit, b: Lit) {
        if a != b {
            self.add_clause(&[!a, b]);
            self.add_clause(&[a, !b]);
        }
    }

    pub fn and(&mut self, a: Lit, b: Lit) -> Lit {
        match (self.const_value(a), self.const_value(b)) {
            (Some(false), _) | (_, Some(false)) => return !self.t,
            (Some(true), _) => return b,
            (_, Some(true)) => return a,
            _ => (),
        }
        if a == b {
            return a;
        } else if a == !b {
            return !self.t;
        }
        let o = self.fresh();
        self.sink.add_clause(&[!o, a]);
        self.sink.add_clause(&[!o, b]);
        self.sink.add_clause(&[o, !a, !b]);
        o
    }

    pub fn or(&mut self, a: Lit, b: Lit) -> Lit {
        !self.and(!a, !b)
    }

    pub fn and_all(&mut self, lits: &[Lit]) -> Lit {
        let mut acc = self.t;
        for &l in lits {
            acc = self.and(acc, l);
        }
        acc
    }

    pub fn or_all(&mut self, lits: &[Lit]) -> Lit {
        let mut acc = !self.t;
        for &l in lits {
            acc = self.or(acc, l);
        }
        acc
    }

    pub fn xor(&mut self, a: Lit, b: Lit) -> Lit {
        match (self.const_value(a), self.const_value(b)) {
            (Some(x), _) => return b ^ x,
            (_, Some(y)) => return a ^ y,
            _ => (),
        }
        if a == b {
            return !self.t;
        } else if a == !b {
            return self.t;
        }
        let o = self.fresh();
        self.sink.add_clause(&[!o, a, b]);
        self.sink.add_clause(&[!o, !a, !b]);
        self.sink.add_clause(&[o, !a, b]);
        self.sink.add_clause(&[o, a, !b]);
        o
    }

    pub fn equiv(&mut self, a: Lit, b: Lit) -> Lit {
        !self.xor(a, b)
    }

    pub fn xor3(&mut self, a: Lit, b: Lit, c: Lit) -> Lit {
        let ab = self.xor(a, b);
        self.xor(ab, c)
    }

    /// At least two of three.
    pub fn maj3(&mut self, a: Lit, b: Lit, c: Lit) -> Lit {
        for &(x, y, z) in &[(a, b, c), (b, a, c), (c, a, b)] {
            match self.const_value(x) {
                Some(true) => return self.or(y, z),
                Some(false) => return self.and(y, z),
                None => (),
            }
        }
        let o = self.fresh();
        for &(x, y) in &[(a, b), (a, c), (b, c)] {
            self.sink.add_clause(&[!x, !y, o]);
            self.sink.add_clause(&[x, y, !o]);
        }
        o
    }

    /// `if c then a else b`
    pub fn ite(&mut self, c: Lit, a: Lit, b: Lit) -> Lit {
        match self.const_value(c) {
            Some(true) => return a,
            Some(false) => return b,
            None => (),
        }
        if a == b {
            return a;
        }
        let o = self.fresh();
        self.add_clause(&[!c, !a, o]);
        self.add_clause(&[!c, a, !o]);
        self.add_clause(&[c, !b, o]);
        self.add_clause(&[c, b, !o]);
        self.add_clause(&[!a, !b, o]);
        self.add_clause(&[a, b, !o]);
        o
    }

    /// Returns `(sum, carry)`.
    pub fn full_add(&mut self, a: Lit, b: Lit, c: Lit) -> (Lit, Lit) {
        (self.xor3(a, b, c), self.maj3(a, b, c))
    }

    pub fn const_bits(&self, value: u64, width: usize) -> Vec<Lit> {
        (0..width)
            .map(|i| self.constant(i < 64 && (value >> i) & 1 == 1))
            .collect()
    }

    /// Ripple carry adder; the result has one more bit than the widest input.
    pub fn add_bits(&mut self, a: &[Lit], b: &[Lit]) -> Vec<Lit> {
        let n = a.len().max(b.len());
        let f = !self.t;
        let mut carry = f;
        let mut out = Vec::with_capacity(n + 1);
        for i in 0..n {
            let x = a.get(i).cloned().unwrap_or(f);
            let y = b.get(i).cloned().unwrap_or(f);
            let (s, c) = self.full_add(x, y, carry);
            out.push(s);
            carry = c;
        }
        out.push(carry);
        out
    }

    /// Literal equivalent to `value(bits) >= k`.
    pub fn geq_const(&mut self, bits: &[Lit], k: u64) -> Lit {
        if bits.len() < 64 && k >> bits.len() != 0 {
            return !self.t;
        }
        // prefix comparison from the least significant bit up
        let mut ge = self.t;
        for (i, &b) in bits.iter().enumerate() {
            ge = if i < 64 && (k >> i) & 1 == 1 {
                self.and(b, ge)
            } else {
                self.or(b, ge)
            };
        }
        ge
    }

    /// Literal equivalent to `value(a) < value(b)`.
    pub fn lt_bits(&mut self, a: &[Lit], b: &[Lit]) -> Lit {
        let n = a.len().max(b.len());
        let f = !self.t;
        let mut lt = f;
        for i in 0..n {
            let x = a.get(i).cloned().unwrap_or(f);
            let y = b.get(i).cloned().unwrap_or(f);
            let differ = self.xor(x, y);
            lt = self.ite(differ, y, lt);
        }
        lt
    }

    pub fn ite_bits(&mut self, c: Lit, a: &[Lit], b: &[Lit]) -> Vec<Lit> {
        debug_assert_eq!(a.len(), b.len());
        a.iter()
            .zip(b.iter())
            .map(|(&x, &y)| self.ite(c, x, y))
            .collect()
    }

    /// Sum of `lits`, as a bit vector wide enough to hold `lits.len()`.
    pub fn count(&mut self, lits: &[Lit]) -> Vec<Lit> {
        match lits.len() {
            0 => vec![],
            1 => vec![lits[0]],
            n => {
                let (l, r) = lits.split_at(n / 2);
                let l = self.count(l);
                let r = self.count(r);
                self.add_bits(&l, &r)
            }
        }
    }

    /// Sum of `coef * lit`, with non-negative coefficients.
    pub fn weighted_sum(&mut self, lits: &[Lit], coefs: &[u64]) -> Vec<Lit> {
        let mut acc: Vec<Lit> = vec![];
        for (&l, &c) in lits.iter().zip(coefs.iter()) {
            if c == 0 {
                continue;
            }
            let width = 64 - c.leading_zeros() as usize;
            let f = !self.t;
            let term: Vec<Lit> = (0..width)
                .map(|i| if (c >> i) & 1 == 1 { l } else { f })
                .collect();
            acc = self.add_bits(&acc, &term);
            // drop known-false high bits
            while acc.last() == Some(&f) {
                acc.pop();
            }
        }
        acc
    }
}
