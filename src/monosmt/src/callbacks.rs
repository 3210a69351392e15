use crate::clause::{lbool, Kind, Lit};

/// Hooks called by the solver at notable points of the search.
///
/// Typically used for statistics, logging, or interrupting a long search.
pub trait Callbacks {
    /// Called before starting to solve.
    fn on_start(&mut self) {}

    /// Called after each restart.
    fn on_restart(&mut self) {}

    /// Called after a clause GC.
    fn on_gc(&mut self, _old_size: usize, _new_size: usize) {}

    /// Called regularly with a progress report. The report is computed lazily.
    fn on_progress<F>(&mut self, _f: F)
    where
        F: FnOnce() -> ProgressStatus,
    {
    }

    /// Called when a result is computed.
    fn on_result(&mut self, _s: lbool) {}

    /// Called when a clause is learnt, or when a final conflict over
    /// the assumptions is computed.
    fn on_new_clause(&mut self, _c: &[Lit], _k: Kind) {}

    /// Called when a learnt clause is removed.
    fn on_delete_clause(&mut self, _c: &[Lit]) {}

    /// Should we stop? Polled regularly during search.
    fn stop(&self) -> bool {
        false
    }
}

/// Progress indicator from the solver.
#[derive(Debug, Clone, Copy)]
pub struct ProgressStatus {
    pub conflicts: u64,
    pub dec_vars: u64,
    pub n_clauses: u64,
    pub n_clause_lits: u64,
    pub max_learnt: u64,
    pub n_learnt: u64,
    pub n_learnt_lits: f64,
    pub progress_estimate: f64,
}

/// Callbacks that only hold an optional stop predicate.
#[derive(Default)]
pub struct Basic {
    stop: Option<Box<dyn Fn() -> bool>>,
}

impl Callbacks for Basic {
    fn stop(&self) -> bool {
        self.stop.as_ref().map_or(false, |f| f())
    }
}

impl Basic {
    pub fn new() -> Self {
        Basic { stop: None }
    }

    /// Set the `stop` predicate, polled during search.
    pub fn set_stop<F>(&mut self, f: F)
    where
        F: 'static + Fn() -> bool,
    {
        self.stop = Some(Box::new(f));
    }
}

/// Callbacks that count events and log a summary, on top of `Basic`.
#[derive(Default)]
pub struct Stats {
    basic: Basic,
    pub restarts: u64,
    pub learnt: u64,
    pub theory_lemmas: u64,
    pub deleted: u64,
}

impl Stats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_stop<F>(&mut self, f: F)
    where
        F: 'static + Fn() -> bool,
    {
        self.basic.set_stop(f)
    }
}

impl Callbacks for Stats {
    fn on_restart(&mut self) {
        self.restarts += 1;
    }
    fn on_new_clause(&mut self, _c: &[Lit], k: Kind) {
        match k {
            Kind::Learnt => self.learnt += 1,
            Kind::Theory => self.theory_lemmas += 1,
            Kind::Axiom => (),
        }
    }
    fn on_delete_clause(&mut self, _c: &[Lit]) {
        self.deleted += 1;
    }
    fn on_progress<F>(&mut self, _f: F)
    where
        F: FnOnce() -> ProgressStatus,
    {
        debug!("progress: {:?}", _f());
    }
    fn on_result(&mut self, _s: lbool) {
        info!(
            "result {:?} after {} restarts, {} learnt ({} from theories), {} deleted",
            _s, self.restarts, self.learnt, self.theory_lemmas, self.deleted
        );
    }
    fn stop(&self) -> bool {
        self.basic.stop()
    }
}
