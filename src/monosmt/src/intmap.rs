/*****************************************************************************************[intmap.rs]
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

use bit_vec::BitVec;
use std::{cmp, iter, marker::PhantomData, ops};

/// Keys that are dense small integers (variables, literals, nodes...).
pub trait AsIndex: Copy {
    fn as_index(self) -> usize;
    fn from_index(index: usize) -> Self;
}

impl AsIndex for usize {
    #[inline(always)]
    fn as_index(self) -> usize {
        self
    }
    #[inline(always)]
    fn from_index(index: usize) -> Self {
        index
    }
}

/// A vector indexed by `K`, grown on demand.
#[derive(Debug, Clone)]
pub struct IntMap<K: AsIndex, V> {
    map: Vec<V>,
    _marker: PhantomData<fn(K)>,
}

impl<K: AsIndex, V> Default for IntMap<K, V> {
    fn default() -> Self {
        IntMap {
            map: Vec::new(),
            _marker: PhantomData,
        }
    }
}

impl<K: AsIndex, V> IntMap<K, V> {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn has(&self, k: K) -> bool {
        k.as_index() < self.map.len()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    #[inline]
    pub fn get(&self, k: K) -> Option<&V> {
        self.map.get(k.as_index())
    }

    /// Make sure `key` is a valid index, filling holes with `pad`.
    pub fn reserve(&mut self, key: K, pad: V)
    where
        V: Clone,
    {
        let want = key.as_index() + 1;
        if want > self.map.len() {
            self.map.resize(want, pad);
        }
    }

    /// Make sure `key` is a valid index, filling holes with `V::default()`.
    pub fn reserve_default(&mut self, key: K)
    where
        V: Default,
    {
        let want = key.as_index() + 1;
        while self.map.len() < want {
            self.map.push(V::default());
        }
    }

    #[inline]
    pub fn insert(&mut self, key: K, val: V, pad: V)
    where
        V: Clone,
    {
        self.reserve(key, pad);
        self[key] = val;
    }

    pub fn insert_default(&mut self, key: K, val: V)
    where
        V: Default,
    {
        self.reserve_default(key);
        self[key] = val;
    }

    /// Remove all entries, keeping the allocation.
    pub fn clear(&mut self) {
        self.map.clear();
    }

    pub fn iter(&self) -> impl iter::Iterator<Item = (K, &V)> {
        self.map
            .iter()
            .enumerate()
            .map(|(i, v)| (K::from_index(i), v))
    }

    pub fn iter_mut(&mut self) -> impl iter::Iterator<Item = (K, &mut V)> {
        self.map
            .iter_mut()
            .enumerate()
            .map(|(i, v)| (K::from_index(i), v))
    }

    pub fn values(&self) -> &[V] {
        &self.map
    }
}

impl<K: AsIndex, V> ops::Index<K> for IntMap<K, V> {
    type Output = V;
    #[inline]
    fn index(&self, index: K) -> &V {
        &self.map[index.as_index()]
    }
}

impl<K: AsIndex, V> ops::IndexMut<K> for IntMap<K, V> {
    #[inline]
    fn index_mut(&mut self, index: K) -> &mut V {
        &mut self.map[index.as_index()]
    }
}

/// A map from `K` to booleans, stored as a bitset.
#[derive(Debug, Clone)]
pub struct IntMapBool<K: AsIndex> {
    bits: BitVec,
    _marker: PhantomData<fn(K)>,
}

impl<K: AsIndex> Default for IntMapBool<K> {
    fn default() -> Self {
        IntMapBool::new()
    }
}

impl<K: AsIndex> ops::Index<K> for IntMapBool<K> {
    type Output = bool;
    #[inline]
    fn index(&self, index: K) -> &bool {
        &self.bits[index.as_index()]
    }
}

impl<K: AsIndex> IntMapBool<K> {
    pub fn new() -> Self {
        IntMapBool {
            bits: BitVec::new(),
            _marker: PhantomData,
        }
    }

    #[inline]
    pub fn has(&self, k: K) -> bool {
        k.as_index() < self.bits.len()
    }

    #[inline]
    pub fn set(&mut self, k: K, b: bool) {
        self.bits.set(k.as_index(), b);
    }

    pub fn reserve(&mut self, key: K) {
        let len = self.bits.len();
        let idx = key.as_index();
        if idx >= len {
            self.bits.grow(idx + 1 - len, false);
        }
    }

    /// Reset every key to `false`. `BitVec::clear` only zeroes the bits.
    pub fn clear(&mut self) {
        self.bits.clear();
    }

    #[inline]
    pub fn insert(&mut self, key: K) {
        self.reserve(key);
        self.bits.set(key.as_index(), true);
    }
}

/// A set of keys with insertion-order iteration and O(1) membership.
#[derive(Debug, Clone)]
pub struct IntSet<K: AsIndex> {
    member: IntMapBool<K>,
    elems: Vec<K>,
}

impl<K: AsIndex> Default for IntSet<K> {
    fn default() -> Self {
        IntSet {
            member: IntMapBool::default(),
            elems: vec![],
        }
    }
}

impl<K: AsIndex> IntSet<K> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.elems.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elems.is_empty()
    }

    pub fn clear(&mut self) {
        for &k in &self.elems {
            self.member.set(k, false);
        }
        self.elems.clear()
    }

    pub fn as_slice(&self) -> &[K] {
        &self.elems
    }

    /// Insert `k`, returns `true` if it was not present.
    pub fn insert(&mut self, k: K) -> bool {
        self.member.reserve(k);
        if self.member[k] {
            false
        } else {
            self.member.set(k, true);
            self.elems.push(k);
            true
        }
    }

    pub fn has(&self, k: K) -> bool {
        self.member.has(k) && self.member[k]
    }
}

impl<K: AsIndex> ops::Deref for IntSet<K> {
    type Target = [K];
    fn deref(&self) -> &[K] {
        &self.elems
    }
}

/// Ordering used by a `Heap`. The smallest element is at the top.
pub trait Comparator<T: ?Sized> {
    fn cmp(&self, lhs: &T, rhs: &T) -> cmp::Ordering;

    #[inline]
    fn lt(&self, lhs: &T, rhs: &T) -> bool {
        self.cmp(lhs, rhs) == cmp::Ordering::Less
    }
}

const NOT_IN_HEAP: u32 = u32::MAX;

/// Storage of a binary heap over dense keys. The ordering is supplied
/// separately (see `promote`) because it usually borrows data owned
/// elsewhere, such as variable activities or tentative distances.
#[derive(Debug, Clone)]
pub struct HeapData<K: AsIndex> {
    heap: Vec<K>,
    pos: IntMap<K, u32>,
}

impl<K: AsIndex> Default for HeapData<K> {
    fn default() -> Self {
        HeapData {
            heap: Vec::new(),
            pos: IntMap::new(),
        }
    }
}

impl<K: AsIndex> HeapData<K> {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn len(&self) -> usize {
        self.heap.len()
    }
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
    pub fn in_heap(&self, k: K) -> bool {
        self.pos.has(k) && self.pos[k] != NOT_IN_HEAP
    }
    /// Element at position `i` of the underlying array.
    pub fn at(&self, i: usize) -> K {
        self.heap[i]
    }

    /// Pair the storage with an ordering.
    pub fn promote<C: Comparator<K>>(&mut self, comp: C) -> Heap<K, C> {
        Heap { data: self, comp }
    }
}

/// A binary min-heap, borrowing its storage and ordering.
pub struct Heap<'a, K: AsIndex + 'a, C: Comparator<K>> {
    data: &'a mut HeapData<K>,
    comp: C,
}

impl<'a, K: AsIndex + 'a, C: Comparator<K>> ops::Deref for Heap<'a, K, C> {
    type Target = HeapData<K>;
    fn deref(&self) -> &HeapData<K> {
        self.data
    }
}

impl<'a, K: AsIndex + 'a, C: Comparator<K>> Heap<'a, K, C> {
    #[inline]
    fn place(&mut self, i: usize, k: K) {
        self.data.heap[i] = k;
        self.data.pos[k] = i as u32;
    }

    fn sift_up(&mut self, mut i: usize) {
        let x = self.data.heap[i];
        while i > 0 {
            let parent = (i - 1) / 2;
            let p = self.data.heap[parent];
            if !self.comp.lt(&x, &p) {
                break;
            }
            self.place(i, p);
            i = parent;
        }
        self.place(i, x);
    }

    fn sift_down(&mut self, mut i: usize) {
        let x = self.data.heap[i];
        let n = self.data.heap.len();
        loop {
            let left = 2 * i + 1;
            if left >= n {
                break;
            }
            let right = left + 1;
            let child = if right < n && self.comp.lt(&self.data.heap[right], &self.data.heap[left])
            {
                right
            } else {
                left
            };
            let c = self.data.heap[child];
            if !self.comp.lt(&c, &x) {
                break;
            }
            self.place(i, c);
            i = child;
        }
        self.place(i, x);
    }

    /// `k`'s key got smaller.
    pub fn decrease(&mut self, k: K) {
        debug_assert!(self.in_heap(k));
        let i = self.data.pos[k] as usize;
        self.sift_up(i);
    }

    /// `k`'s key got larger.
    pub fn increase(&mut self, k: K) {
        debug_assert!(self.in_heap(k));
        let i = self.data.pos[k] as usize;
        self.sift_down(i);
    }

    /// Insert `k`, or restore the heap property around it if already present.
    pub fn update(&mut self, k: K) {
        if !self.in_heap(k) {
            self.insert(k);
        } else {
            let i = self.data.pos[k] as usize;
            self.sift_up(i);
            let i = self.data.pos[k] as usize;
            self.sift_down(i);
        }
    }

    pub fn insert(&mut self, k: K) {
        self.data.pos.reserve(k, NOT_IN_HEAP);
        debug_assert!(!self.in_heap(k));
        let i = self.data.heap.len();
        self.data.heap.push(k);
        self.data.pos[k] = i as u32;
        self.sift_up(i);
    }

    /// Remove and return the smallest element, if any.
    pub fn pop(&mut self) -> Option<K> {
        let top = *self.data.heap.first()?;
        let last = self.data.heap.pop()?;
        self.data.pos[top] = NOT_IN_HEAP;
        if !self.data.heap.is_empty() {
            self.place(0, last);
            self.sift_down(0);
        }
        Some(top)
    }

    /// Replace the content with `ks`, in linear time.
    pub fn build(&mut self, ks: &[K]) {
        self.clear();
        for &k in ks {
            self.data.pos.reserve(k, NOT_IN_HEAP);
            let i = self.data.heap.len();
            self.data.heap.push(k);
            self.data.pos[k] = i as u32;
        }
        for i in (0..self.data.heap.len() / 2).rev() {
            self.sift_down(i);
        }
    }

    pub fn clear(&mut self) {
        let data = &mut *self.data;
        for &k in &data.heap {
            data.pos[k] = NOT_IN_HEAP;
        }
        data.heap.clear();
    }
}
