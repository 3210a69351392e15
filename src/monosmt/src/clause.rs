/*****************************************************************************************[clause.rs]
Copyright (c) 2003-2006, Niklas Een, Niklas Sorensson (MiniSat)
Copyright (c) 2007-2010, Niklas Sorensson (MiniSat)
Copyright (c) 2018-2018, Masaki Hara

Permission is hereby granted, free of charge, to any person obtaining a copy of this software and
associated documentation files (the "Software"), to deal in the Software without restriction,
including without limitation the rights to use, copy, modify, merge, publish, distribute,
sublicense, and/or sell copies of the Software, and to permit persons to whom the Software is
furnished to do so, subject to the following conditions:

The above copyright notice and this permission notice shall be included in all copies or
substantial portions of the Software.

THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR IMPLIED, INCLUDING BUT
NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY, FITNESS FOR A PARTICULAR PURPOSE AND
NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM,
DAMAGES OR OTHER LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM, OUT
OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.
**************************************************************************************************/

use {
    crate::intmap::{AsIndex, IntMap, IntMapBool, IntSet},
    std::{fmt, ops, slice},
};

/// A boolean variable, identified by a dense index.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct Var(u32);

impl fmt::Debug for Var {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if *self == Var::UNDEF {
            write!(f, "UNDEF")
        } else {
            write!(f, "{}", self.0 + 1)
        }
    }
}

impl Var {
    pub const UNDEF: Var = Var(!0);

    #[inline(always)]
    pub(crate) fn from_idx(idx: u32) -> Self {
        debug_assert!(idx < u32::MAX / 2, "variable index too large");
        Var(idx)
    }

    #[inline(always)]
    pub fn idx(&self) -> u32 {
        self.0
    }
}

impl AsIndex for Var {
    #[inline(always)]
    fn as_index(self) -> usize {
        self.0 as usize
    }
    #[inline(always)]
    fn from_index(index: usize) -> Self {
        Var(index as u32)
    }
}

pub type VMap<V> = IntMap<Var, V>;

/// A literal: a variable with a polarity, encoded as `2*var + (negated as u32)`.
///
/// ```
/// use monosmt::*;
/// let mut ctx = Context::new();
/// let a = ctx.new_lit();
/// assert_eq!(!!a, a);
/// assert!(a.sign() != (!a).sign());
/// assert_eq!(a.var(), (!a).var());
/// ```
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct Lit(u32);

impl Lit {
    pub const UNDEF: Lit = Lit(!1);
    pub const ERROR: Lit = Lit(!0);

    /// The literal of `var` that is true iff `var` has value `sign`.
    #[inline(always)]
    pub fn new(var: Var, sign: bool) -> Self {
        Lit(var.0 * 2 + (!sign) as u32)
    }

    #[inline(always)]
    pub fn idx(&self) -> u32 {
        self.0
    }

    /// `true` for the positive literal of its variable.
    #[inline(always)]
    pub fn sign(&self) -> bool {
        (self.0 & 1) == 0
    }

    #[inline(always)]
    pub fn var(&self) -> Var {
        Var(self.0 >> 1)
    }

    /// Keep the literal if `sign` holds, negate it otherwise.
    #[inline(always)]
    pub fn apply_sign(&self, sign: bool) -> Lit {
        Lit(self.0 ^ (!sign) as u32)
    }

    /// Signed, 1-based DIMACS number.
    pub fn to_dimacs(&self) -> i64 {
        let v = self.var().idx() as i64 + 1;
        if self.sign() {
            v
        } else {
            -v
        }
    }
}

impl fmt::Debug for Lit {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Lit::ERROR => write!(f, "ERROR"),
            Lit::UNDEF => write!(f, "UNDEF"),
            _ => write!(f, "{}", self.to_dimacs()),
        }
    }
}

impl ops::Not for Lit {
    type Output = Lit;
    #[inline(always)]
    fn not(self) -> Lit {
        Lit(self.0 ^ 1)
    }
}

impl ops::BitXor<bool> for Lit {
    type Output = Lit;
    #[inline(always)]
    fn bitxor(self, rhs: bool) -> Lit {
        Lit(self.0 ^ rhs as u32)
    }
}

impl AsIndex for Lit {
    #[inline(always)]
    fn as_index(self) -> usize {
        self.0 as usize
    }
    #[inline(always)]
    fn from_index(index: usize) -> Self {
        Lit(index as u32)
    }
}

pub type LSet = IntSet<Lit>;

/// A three-valued boolean: `TRUE`, `FALSE` or `UNDEF`.
///
/// Any value with bit 1 set counts as `UNDEF`, which lets `^ bool` act
/// as a negation that leaves `UNDEF` alone.
#[allow(non_camel_case_types)]
#[derive(Clone, Copy)]
pub struct lbool(u8);

impl lbool {
    pub const TRUE: lbool = lbool(0);
    pub const FALSE: lbool = lbool(1);
    pub const UNDEF: lbool = lbool(2);

    #[inline(always)]
    pub fn new(v: bool) -> Self {
        lbool((!v) as u8)
    }

    pub fn from_u8(v: u8) -> Self {
        debug_assert!(v < 4, "invalid lbool value {}", v);
        lbool(v)
    }

    #[inline(always)]
    pub fn to_u8(&self) -> u8 {
        self.0
    }

    #[inline(always)]
    pub fn is_undef(&self) -> bool {
        self.0 & 2 != 0
    }

    /// `Some(b)` for a defined value.
    pub fn to_bool(&self) -> Option<bool> {
        if self.is_undef() {
            None
        } else {
            Some(self.0 == 0)
        }
    }
}

impl Default for lbool {
    fn default() -> Self {
        lbool::UNDEF
    }
}

impl fmt::Debug for lbool {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.to_bool() {
            Some(true) => write!(f, "TRUE"),
            Some(false) => write!(f, "FALSE"),
            None => write!(f, "UNDEF"),
        }
    }
}

impl PartialEq for lbool {
    #[inline(always)]
    fn eq(&self, rhs: &Self) -> bool {
        self.0 == rhs.0 || (self.is_undef() && rhs.is_undef())
    }
}

impl Eq for lbool {}

impl ops::Neg for lbool {
    type Output = lbool;
    #[inline(always)]
    fn neg(self) -> lbool {
        lbool(self.0 ^ 1)
    }
}

impl ops::BitXor<bool> for lbool {
    type Output = lbool;
    #[inline(always)]
    fn bitxor(self, rhs: bool) -> lbool {
        lbool(self.0 ^ rhs as u8)
    }
}

impl ops::BitAnd for lbool {
    type Output = lbool;
    fn bitand(self, rhs: lbool) -> lbool {
        if self == lbool::FALSE || rhs == lbool::FALSE {
            lbool::FALSE
        } else if self.is_undef() || rhs.is_undef() {
            lbool::UNDEF
        } else {
            lbool::TRUE
        }
    }
}

impl ops::BitOr for lbool {
    type Output = lbool;
    fn bitor(self, rhs: lbool) -> lbool {
        if self == lbool::TRUE || rhs == lbool::TRUE {
            lbool::TRUE
        } else if self.is_undef() || rhs.is_undef() {
            lbool::UNDEF
        } else {
            lbool::FALSE
        }
    }
}

impl From<bool> for lbool {
    fn from(x: bool) -> Self {
        lbool::new(x)
    }
}

/// Where a clause comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Axiom,
    Learnt,
    Theory,
}

/// Index of a clause in the `ClauseArena`.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub(crate) struct CRef(u32);

impl fmt::Debug for CRef {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            CRef::UNDEF => write!(f, "CRef(undef)"),
            CRef::SPECIAL => write!(f, "CRef(theory)"),
            CRef(i) => write!(f, "CRef({})", i),
        }
    }
}

impl CRef {
    /// No reason: decision or level-0 unit.
    pub const UNDEF: CRef = CRef(!0);
    /// Reason is a theory explanation.
    pub const SPECIAL: CRef = CRef(!1);
}

// header word layout, from the high bits down:
// mark(2) | learnt(1) | has_extra(1) | reloced(1) | size(27)
const SIZE_BITS: u32 = 27;
const SIZE_MASK: u32 = (1 << SIZE_BITS) - 1;
const RELOCED: u32 = 1 << 27;
const HAS_EXTRA: u32 = 1 << 28;
const LEARNT: u32 = 1 << 29;
const MARK_SHIFT: u32 = 30;

/// Clause metadata, packed in one word.
#[derive(Clone, Copy, PartialEq, Eq)]
pub(crate) struct Header(u32);

impl fmt::Debug for Header {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Header")
            .field("mark", &self.mark())
            .field("learnt", &self.learnt())
            .field("size", &self.size())
            .finish()
    }
}

impl Header {
    fn new(learnt: bool, has_extra: bool, size: u32) -> Self {
        assert!(size <= SIZE_MASK, "clause too large");
        let mut w = size;
        if learnt {
            w |= LEARNT;
        }
        if has_extra {
            w |= HAS_EXTRA;
        }
        Header(w)
    }
    #[inline(always)]
    pub fn mark(&self) -> u32 {
        self.0 >> MARK_SHIFT
    }
    #[inline(always)]
    pub fn learnt(&self) -> bool {
        self.0 & LEARNT != 0
    }
    #[inline(always)]
    pub fn has_extra(&self) -> bool {
        self.0 & HAS_EXTRA != 0
    }
    #[inline(always)]
    pub fn reloced(&self) -> bool {
        self.0 & RELOCED != 0
    }
    #[inline(always)]
    pub fn size(&self) -> u32 {
        self.0 & SIZE_MASK
    }
    /// Number of words used by the clause, header included.
    #[inline(always)]
    fn footprint(&self) -> u32 {
        1 + self.size() + self.has_extra() as u32
    }
}

#[inline(always)]
fn as_lits(words: &[u32]) -> &[Lit] {
    // `Lit` is a transparent wrapper around `u32`
    unsafe { slice::from_raw_parts(words.as_ptr() as *const Lit, words.len()) }
}

#[inline(always)]
fn as_lits_mut(words: &mut [u32]) -> &mut [Lit] {
    unsafe { slice::from_raw_parts_mut(words.as_mut_ptr() as *mut Lit, words.len()) }
}

/// Read-only view of a clause.
#[derive(Clone, Copy)]
pub(crate) struct ClauseRef<'a> {
    header: Header,
    lits: &'a [Lit],
    extra: Option<u32>,
}

impl<'a> fmt::Debug for ClauseRef<'a> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_list().entries(self.lits.iter()).finish()
    }
}

impl<'a> ClauseRef<'a> {
    #[inline(always)]
    pub fn mark(&self) -> u32 {
        self.header.mark()
    }
    #[inline(always)]
    pub fn learnt(&self) -> bool {
        self.header.learnt()
    }
    #[inline(always)]
    pub fn reloced(&self) -> bool {
        self.header.reloced()
    }
    #[inline(always)]
    pub fn size(&self) -> u32 {
        self.header.size()
    }
    /// Activity of a learnt clause.
    #[inline(always)]
    pub fn activity(&self) -> f32 {
        f32::from_bits(self.extra.unwrap_or(0))
    }
    #[inline(always)]
    pub fn lits(&self) -> &'a [Lit] {
        self.lits
    }
    #[inline(always)]
    pub fn iter(&self) -> slice::Iter<'a, Lit> {
        self.lits.iter()
    }
    /// Same clause (same storage), not just the same literals.
    pub fn same_as(&self, other: &ClauseRef) -> bool {
        self.lits.as_ptr() == other.lits.as_ptr()
    }
}

impl<'a> ops::Index<u32> for ClauseRef<'a> {
    type Output = Lit;
    #[inline(always)]
    fn index(&self, i: u32) -> &Lit {
        &self.lits[i as usize]
    }
}

/// Mutable view of a clause.
pub(crate) struct ClauseMut<'a> {
    header: &'a mut u32,
    lits: &'a mut [Lit],
    extra: Option<&'a mut u32>,
}

impl<'a> ClauseMut<'a> {
    #[inline(always)]
    pub fn size(&self) -> u32 {
        self.lits.len() as u32
    }
    #[inline(always)]
    pub fn swap(&mut self, i: u32, j: u32) {
        self.lits.swap(i as usize, j as usize)
    }
    pub fn set_mark(&mut self, mark: u32) {
        debug_assert!(mark < 4);
        *self.header = (*self.header & !(3 << MARK_SHIFT)) | (mark << MARK_SHIFT);
    }
    pub fn activity(&self) -> f32 {
        self.extra.as_ref().map_or(0., |w| f32::from_bits(**w))
    }
    pub fn set_activity(&mut self, a: f32) {
        if let Some(w) = self.extra.as_mut() {
            **w = a.to_bits();
        }
    }
    /// Drop the literals beyond `new_size`, keeping the extra word.
    /// Returns how many words were freed.
    pub fn shrink(self, new_size: u32) -> u32 {
        let old = self.size();
        debug_assert!(2 <= new_size && new_size <= old);
        if new_size < old {
            *self.header = (*self.header & !SIZE_MASK) | new_size;
            if let Some(extra) = self.extra {
                // the extra word follows the last literal
                self.lits[new_size as usize] = Lit(*extra);
            }
        }
        old - new_size
    }
}

impl<'a> ops::Index<u32> for ClauseMut<'a> {
    type Output = Lit;
    #[inline(always)]
    fn index(&self, i: u32) -> &Lit {
        &self.lits[i as usize]
    }
}

impl<'a> ops::IndexMut<u32> for ClauseMut<'a> {
    #[inline(always)]
    fn index_mut(&mut self, i: u32) -> &mut Lit {
        &mut self.lits[i as usize]
    }
}

/// Contiguous storage for clauses.
///
/// A clause occupies one header word, one word per literal, and for
/// learnt clauses one extra word holding the activity. Deleted clauses
/// are only accounted as wasted; the solver compacts the arena by
/// relocating live clauses into a fresh one.
#[derive(Debug)]
pub struct ClauseArena {
    words: Vec<u32>,
    wasted: u32,
}

impl ClauseArena {
    pub const WORD_SIZE: usize = 4;

    pub fn with_capacity(cap: u32) -> Self {
        ClauseArena {
            words: Vec::with_capacity(cap as usize),
            wasted: 0,
        }
    }

    pub fn new() -> Self {
        Self::with_capacity(1024 * 64)
    }

    #[inline(always)]
    pub fn len(&self) -> u32 {
        self.words.len() as u32
    }

    pub fn wasted(&self) -> u32 {
        self.wasted
    }

    pub(crate) fn alloc(&mut self, lits: &[Lit], learnt: bool) -> CRef {
        let cr = CRef(self.words.len() as u32);
        let header = Header::new(learnt, learnt, lits.len() as u32);
        self.words.push(header.0);
        self.words.extend(lits.iter().map(|l| l.0));
        if learnt {
            self.words.push(0f32.to_bits());
        }
        cr
    }

    fn header(&self, cr: CRef) -> Header {
        Header(self.words[cr.0 as usize])
    }

    pub(crate) fn free(&mut self, cr: CRef) {
        self.wasted += self.header(cr).footprint();
    }

    pub(crate) fn free_amount(&mut self, n: u32) {
        self.wasted += n;
    }

    pub(crate) fn get_ref(&self, cr: CRef) -> ClauseRef {
        let h = self.header(cr);
        let start = cr.0 as usize + 1;
        let end = start + h.size() as usize;
        ClauseRef {
            header: h,
            lits: as_lits(&self.words[start..end]),
            extra: if h.has_extra() {
                Some(self.words[end])
            } else {
                None
            },
        }
    }

    pub(crate) fn get_mut(&mut self, cr: CRef) -> ClauseMut {
        let h = self.header(cr);
        let start = cr.0 as usize;
        let words = &mut self.words[start..start + h.footprint() as usize];
        let (head, rest) = words.split_at_mut(1);
        let (lits, extra) = rest.split_at_mut(h.size() as usize);
        ClauseMut {
            header: &mut head[0],
            lits: as_lits_mut(lits),
            extra: extra.first_mut(),
        }
    }

    /// Move clause `cr` into `to`, updating `cr`. A clause moved twice
    /// resolves to its first copy, through a forwarding address stored
    /// in place of its first literal.
    pub(crate) fn reloc(&mut self, cr: &mut CRef, to: &mut ClauseArena) {
        let i = cr.0 as usize;
        let h = self.header(*cr);
        if h.reloced() {
            *cr = CRef(self.words[i + 1]);
            return;
        }
        let new = CRef(to.words.len() as u32);
        to.words
            .extend_from_slice(&self.words[i..i + h.footprint() as usize]);
        self.words[i] |= RELOCED;
        self.words[i + 1] = new.0;
        *cr = new;
    }
}

/// Predicate telling whether an occurrence has been deleted.
pub trait DeletePred<V> {
    fn deleted(&self, v: &V) -> bool;
}

/// Occurrence lists (watch lists) with lazy removal of deleted entries.
#[derive(Debug, Clone)]
pub struct OccListsData<K: AsIndex, V> {
    occs: IntMap<K, Vec<V>>,
    dirty: IntMapBool<K>,
    dirties: Vec<K>,
}

impl<K: AsIndex, V> OccListsData<K, V> {
    pub fn new() -> Self {
        OccListsData {
            occs: IntMap::new(),
            dirty: IntMapBool::new(),
            dirties: Vec::new(),
        }
    }

    pub fn init(&mut self, k: K) {
        self.occs.reserve_default(k);
        self.occs[k].clear();
        self.dirty.reserve(k);
    }

    /// Occurrences of `k`, cleaned first if they were smudged.
    pub fn lookup_mut_pred<P: DeletePred<V>>(&mut self, k: K, pred: &P) -> &mut Vec<V> {
        if self.dirty[k] {
            self.occs[k].retain(|x| !pred.deleted(x));
            self.dirty.set(k, false);
        }
        &mut self.occs[k]
    }

    pub fn clean_all_pred<P: DeletePred<V>>(&mut self, pred: &P) {
        for &k in &self.dirties {
            if self.dirty[k] {
                self.occs[k].retain(|x| !pred.deleted(x));
                self.dirty.set(k, false);
            }
        }
        self.dirties.clear();
    }

    /// Mark `k` as containing deleted occurrences.
    pub fn smudge(&mut self, k: K) {
        if !self.dirty[k] {
            self.dirty.set(k, true);
            self.dirties.push(k);
        }
    }
}

impl<K: AsIndex, V> ops::Index<K> for OccListsData<K, V> {
    type Output = Vec<V>;
    fn index(&self, k: K) -> &Vec<V> {
        &self.occs[k]
    }
}

impl<K: AsIndex, V> ops::IndexMut<K> for OccListsData<K, V> {
    fn index_mut(&mut self, k: K) -> &mut Vec<V> {
        &mut self.occs[k]
    }
}
