//! Finite state transducers with symbolic transitions.
//!
//! Each transition is present iff its literal is true. Acceptance atoms ask
//! whether some run of one machine consumes a string; composition atoms ask
//! whether a generator, reading the string, can emit an output that an
//! acceptor consumes at the same time. Label 0 is epsilon on both sides.

use {
    crate::{
        clause::{lbool, Lit, Var},
        dispatch::{CheckCx, TheorySolver},
    },
    rustc_hash::FxHashMap,
    std::collections::VecDeque,
};

/// Identifier of a state machine in a context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FsmId(pub(crate) u32);

/// Identifier of an input string in a context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StringId(pub(crate) u32);

impl FsmId {
    pub fn idx(self) -> usize {
        self.0 as usize
    }
}

impl StringId {
    pub fn idx(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, Copy)]
struct Transition {
    to: usize,
    input: usize,
    output: usize,
    lit: Lit,
}

#[derive(Debug, Clone)]
struct Fsm {
    n_in: usize,
    n_out: usize,
    /// Transitions leaving each state.
    trans: Vec<Vec<Transition>>,
}

#[derive(Debug, Clone, Copy)]
enum AtomKind {
    Accepts {
        fsm: FsmId,
        start: usize,
        accept: usize,
    },
    Compose {
        gen: FsmId,
        acc: FsmId,
        gen_start: usize,
        gen_accept: usize,
        acc_start: usize,
        acc_accept: usize,
    },
}

#[derive(Debug, Clone, Copy)]
struct FsmAtom {
    lit: Lit,
    string: StringId,
    kind: AtomKind,
}

/// Which transitions a search may use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    /// Only transitions whose literal is true.
    Under,
    /// Transitions whose literal is not false.
    Over,
}

fn usable(mode: Mode, v: lbool) -> bool {
    match mode {
        Mode::Under => v == lbool::TRUE,
        Mode::Over => v != lbool::FALSE,
    }
}

/// A configuration of a composition: generator state, acceptor state,
/// position in the string.
type Config3 = (usize, usize, usize);

/// The state machine theory of a context.
#[derive(Default)]
pub(crate) struct FsmTheory {
    fsms: Vec<Fsm>,
    strings: Vec<Vec<usize>>,
    atoms: Vec<FsmAtom>,
    fsm_of_var: FxHashMap<Var, Vec<FsmId>>,
    atoms_of_fsm: Vec<Vec<u32>>,
    dirty: Vec<u32>,
    is_dirty: Vec<bool>,
    all_dirty: bool,
    expl: Vec<Lit>,
}

impl FsmTheory {
    pub fn add_fsm(&mut self, n_in: usize, n_out: usize) -> FsmId {
        self.fsms.push(Fsm {
            n_in,
            n_out,
            trans: vec![],
        });
        self.atoms_of_fsm.push(vec![]);
        FsmId(self.fsms.len() as u32 - 1)
    }

    pub fn has_fsm(&self, f: FsmId) -> bool {
        f.idx() < self.fsms.len()
    }

    /// Alphabet sizes of `f`, input then output.
    pub fn alphabets(&self, f: FsmId) -> (usize, usize) {
        let m = &self.fsms[f.idx()];
        (m.n_in, m.n_out)
    }

    pub fn n_states(&self, f: FsmId) -> usize {
        self.fsms[f.idx()].trans.len()
    }

    pub fn add_state(&mut self, f: FsmId) -> usize {
        let m = &mut self.fsms[f.idx()];
        m.trans.push(vec![]);
        m.trans.len() - 1
    }

    pub fn add_transition(
        &mut self,
        f: FsmId,
        from: usize,
        to: usize,
        input: usize,
        output: usize,
        lit: Lit,
    ) {
        self.fsms[f.idx()].trans[from].push(Transition {
            to,
            input,
            output,
            lit,
        });
        let fs = self.fsm_of_var.entry(lit.var()).or_insert_with(Vec::new);
        if !fs.contains(&f) {
            fs.push(f);
        }
        for i in self.atoms_of_fsm[f.idx()].clone() {
            self.mark_dirty(i);
        }
    }

    pub fn add_string(&mut self, symbols: Vec<usize>) -> StringId {
        self.strings.push(symbols);
        StringId(self.strings.len() as u32 - 1)
    }

    pub fn has_string(&self, s: StringId) -> bool {
        s.idx() < self.strings.len()
    }

    pub fn string(&self, s: StringId) -> &[usize] {
        &self.strings[s.idx()]
    }

    pub fn add_accepts(
        &mut self,
        lit: Lit,
        fsm: FsmId,
        start: usize,
        accept: usize,
        string: StringId,
    ) {
        self.add_atom(
            FsmAtom {
                lit,
                string,
                kind: AtomKind::Accepts { fsm, start, accept },
            },
            &[fsm],
        );
    }

    #[allow(clippy::too_many_arguments)]
    pub fn add_compose(
        &mut self,
        lit: Lit,
        gen: FsmId,
        acc: FsmId,
        gen_start: usize,
        gen_accept: usize,
        acc_start: usize,
        acc_accept: usize,
        string: StringId,
    ) {
        self.add_atom(
            FsmAtom {
                lit,
                string,
                kind: AtomKind::Compose {
                    gen,
                    acc,
                    gen_start,
                    gen_accept,
                    acc_start,
                    acc_accept,
                },
            },
            &[gen, acc],
        );
    }

    fn add_atom(&mut self, atom: FsmAtom, fsms: &[FsmId]) {
        let i = self.atoms.len() as u32;
        self.atoms.push(atom);
        for f in fsms {
            let v = &mut self.atoms_of_fsm[f.idx()];
            if !v.contains(&i) {
                v.push(i);
            }
        }
        self.mark_dirty(i);
    }

    fn mark_dirty(&mut self, i: u32) {
        if self.is_dirty.len() <= i as usize {
            self.is_dirty.resize(i as usize + 1, false);
        }
        if !self.is_dirty[i as usize] {
            self.is_dirty[i as usize] = true;
            self.dirty.push(i);
        }
    }

    /// Search for an accepting run. Returns the transition literals of a
    /// run if one exists, or the set of reached configurations otherwise.
    fn accepts(
        &self,
        fsm: FsmId,
        start: usize,
        accept: usize,
        s: &[usize],
        mode: Mode,
        value: &dyn Fn(Lit) -> lbool,
    ) -> Result<Vec<Lit>, Vec<(usize, usize)>> {
        let m = &self.fsms[fsm.idx()];
        let width = s.len() + 1;
        let idx = |q: usize, pos: usize| q * width + pos;
        let mut prev: Vec<Option<(usize, Lit)>> = vec![None; m.trans.len() * width];
        let mut seen = vec![false; m.trans.len() * width];
        let mut queue = VecDeque::new();
        let mut reached = vec![];
        seen[idx(start, 0)] = true;
        queue.push_back((start, 0));
        while let Some((q, pos)) = queue.pop_front() {
            reached.push((q, pos));
            if q == accept && pos == s.len() {
                let mut run = vec![];
                let mut cur = idx(q, pos);
                while let Some((p, l)) = prev[cur] {
                    run.push(l);
                    cur = p;
                }
                run.reverse();
                return Ok(run);
            }
            for t in &m.trans[q] {
                if !usable(mode, value(t.lit)) {
                    continue;
                }
                let next = if t.input == 0 {
                    pos
                } else if pos < s.len() && t.input == s[pos] {
                    pos + 1
                } else {
                    continue;
                };
                let j = idx(t.to, next);
                if !seen[j] {
                    seen[j] = true;
                    prev[j] = Some((idx(q, pos), t.lit));
                    queue.push_back((t.to, next));
                }
            }
        }
        Err(reached)
    }

    /// Search for an accepting run of the composition of `gen` and `acc`.
    #[allow(clippy::too_many_arguments)]
    fn compose_accepts(
        &self,
        gen: FsmId,
        acc: FsmId,
        start: (usize, usize),
        accept: (usize, usize),
        s: &[usize],
        mode: Mode,
        value: &dyn Fn(Lit) -> lbool,
    ) -> Result<Vec<Lit>, Vec<Config3>> {
        let g = &self.fsms[gen.idx()];
        let a = &self.fsms[acc.idx()];
        let init = (start.0, start.1, 0);
        let mut prev: FxHashMap<Config3, Option<(Config3, Option<Lit>, Option<Lit>)>> =
            FxHashMap::default();
        let mut queue = VecDeque::new();
        let mut reached = vec![];
        prev.insert(init, None);
        queue.push_back(init);

        while let Some(c) = queue.pop_front() {
            let (qg, qa, pos) = c;
            reached.push(c);
            if qg == accept.0 && qa == accept.1 && pos == s.len() {
                let mut run = vec![];
                let mut cur = c;
                while let Some(&Some((p, lg, la))) = prev.get(&cur) {
                    run.extend(la);
                    run.extend(lg);
                    cur = p;
                }
                run.reverse();
                return Ok(run);
            }
            let mut succ: Vec<(Config3, Option<Lit>, Option<Lit>)> = vec![];
            // acceptor epsilon moves
            for ta in &a.trans[qa] {
                if ta.input == 0 && usable(mode, value(ta.lit)) {
                    succ.push(((qg, ta.to, pos), None, Some(ta.lit)));
                }
            }
            for tg in &g.trans[qg] {
                if !usable(mode, value(tg.lit)) {
                    continue;
                }
                let next = if tg.input == 0 {
                    pos
                } else if pos < s.len() && tg.input == s[pos] {
                    pos + 1
                } else {
                    continue;
                };
                if tg.output == 0 {
                    succ.push(((tg.to, qa, next), Some(tg.lit), None));
                    continue;
                }
                for ta in &a.trans[qa] {
                    if ta.input == tg.output && usable(mode, value(ta.lit)) {
                        succ.push(((tg.to, ta.to, next), Some(tg.lit), Some(ta.lit)));
                    }
                }
            }
            for (n, lg, la) in succ {
                if !prev.contains_key(&n) {
                    prev.insert(n, Some((c, lg, la)));
                    queue.push_back(n);
                }
            }
        }
        Err(reached)
    }

    /// Negations of disabled transitions that could extend a rejected
    /// single-machine search.
    fn explain_reject(
        &self,
        fsm: FsmId,
        s: &[usize],
        reached: &[(usize, usize)],
        value: &dyn Fn(Lit) -> lbool,
        out: &mut Vec<Lit>,
    ) {
        let m = &self.fsms[fsm.idx()];
        for &(q, pos) in reached {
            for t in &m.trans[q] {
                let applies = t.input == 0 || (pos < s.len() && t.input == s[pos]);
                if applies && value(t.lit) == lbool::FALSE {
                    out.push(!t.lit);
                }
            }
        }
    }

    fn explain_compose_reject(
        &self,
        gen: FsmId,
        acc: FsmId,
        s: &[usize],
        reached: &[Config3],
        value: &dyn Fn(Lit) -> lbool,
        out: &mut Vec<Lit>,
    ) {
        let g = &self.fsms[gen.idx()];
        let a = &self.fsms[acc.idx()];
        let mut labels = vec![];
        for &(qg, qa, pos) in reached {
            labels.clear();
            for tg in &g.trans[qg] {
                let applies = tg.input == 0 || (pos < s.len() && tg.input == s[pos]);
                if !applies {
                    continue;
                }
                labels.push(tg.output);
                if value(tg.lit) == lbool::FALSE {
                    out.push(!tg.lit);
                }
            }
            for ta in &a.trans[qa] {
                let applies = ta.input == 0 || labels.contains(&ta.input);
                if applies && value(ta.lit) == lbool::FALSE {
                    out.push(!ta.lit);
                }
            }
        }
    }

    fn check_atom(&mut self, i: u32, cx: &mut CheckCx) {
        let atom = self.atoms[i as usize];
        let s = &self.strings[atom.string.idx()];
        let value = |l: Lit| cx.value(l);
        let mut expl = std::mem::take(&mut self.expl);
        expl.clear();
        let implied = match atom.kind {
            AtomKind::Accepts { fsm, start, accept } => {
                match self.accepts(fsm, start, accept, s, Mode::Under, &value) {
                    Ok(run) => {
                        expl.extend(run);
                        Some(atom.lit)
                    }
                    Err(_) => match self.accepts(fsm, start, accept, s, Mode::Over, &value) {
                        Ok(_) => None,
                        Err(reached) => {
                            self.explain_reject(fsm, s, &reached, &value, &mut expl);
                            Some(!atom.lit)
                        }
                    },
                }
            }
            AtomKind::Compose {
                gen,
                acc,
                gen_start,
                gen_accept,
                acc_start,
                acc_accept,
            } => {
                let start = (gen_start, acc_start);
                let accept = (gen_accept, acc_accept);
                match self.compose_accepts(gen, acc, start, accept, s, Mode::Under, &value) {
                    Ok(run) => {
                        expl.extend(run);
                        Some(atom.lit)
                    }
                    Err(_) => {
                        match self.compose_accepts(gen, acc, start, accept, s, Mode::Over, &value) {
                            Ok(_) => None,
                            Err(reached) => {
                                self.explain_compose_reject(
                                    gen, acc, s, &reached, &value, &mut expl,
                                );
                                Some(!atom.lit)
                            }
                        }
                    }
                }
            }
        };
        if let Some(p) = implied {
            expl.sort_unstable();
            expl.dedup();
            cx.propagate(p, &expl);
        }
        self.expl = expl;
    }
}

impl TheorySolver for FsmTheory {
    fn on_assign(&mut self, lit: Lit) {
        let fsms = match self.fsm_of_var.get(&lit.var()) {
            Some(fs) => fs.clone(),
            None => return,
        };
        for f in fsms {
            for i in self.atoms_of_fsm[f.idx()].clone() {
                self.mark_dirty(i);
            }
        }
    }

    fn new_level(&mut self) {}

    fn backtrack(&mut self, _n: usize) {
        self.all_dirty = true;
    }

    fn check(&mut self, cx: &mut CheckCx, full: bool) {
        if full || self.all_dirty {
            self.all_dirty = false;
            for i in 0..self.atoms.len() as u32 {
                self.mark_dirty(i);
            }
        }
        while let Some(i) = self.dirty.pop() {
            self.is_dirty[i as usize] = false;
            self.check_atom(i, cx);
            if !cx.is_ok() {
                self.all_dirty = true;
                return;
            }
        }
    }
}
