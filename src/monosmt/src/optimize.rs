//! Lexicographic optimization by repeated solving under assumptions.

use crate::{
    callbacks::Callbacks,
    clause::{lbool, Lit},
    core::Solver,
    dispatch::Dispatch,
    encode::Gates,
    interface::SolverInterface,
    limits::ResourceLimits,
};

/// A value to maximize or minimize, as bits (least significant first).
#[derive(Debug, Clone)]
pub(crate) struct Objective {
    pub bits: Vec<Lit>,
    pub maximize: bool,
}

fn bits_value<Cb: Callbacks>(s: &Solver<Cb>, bits: &[Lit]) -> u64 {
    bits.iter()
        .take(64)
        .enumerate()
        .filter(|&(_, &b)| s.value_lit(b) == lbool::TRUE)
        .fold(0, |acc, (i, _)| acc | 1 << i)
}

fn bits_max(bits: &[Lit]) -> u64 {
    if bits.len() >= 64 {
        u64::MAX
    } else {
        (1u64 << bits.len()) - 1
    }
}

/// Solve under `assumps`, then improve each objective in turn.
///
/// Each objective is improved by binary search between its known bound and
/// the best value found so far; every probe is a solve under one more
/// assumption. The optimum is then assumed while optimizing the next
/// objectives. All probes share one budget, started here: once it runs
/// out, optimization stops with the best solution found so far. On
/// success, the model of the best solution is restored.
pub(crate) fn solve<Cb: Callbacks>(
    solver: &mut Solver<Cb>,
    th: &mut Dispatch,
    true_lit: Lit,
    objectives: &[Objective],
    assumps: &[Lit],
    limits: Option<&ResourceLimits>,
) -> lbool {
    match limits {
        Some(l) => solver.set_budget(l),
        None => solver.clear_budget(),
    }

    let r = solver.solve_limited_th(th, assumps);
    if r != lbool::TRUE || objectives.is_empty() {
        return r;
    }
    let mut best_model = solver.get_model().to_vec();
    let mut pinned = assumps.to_vec();

    'objectives: for obj in objectives {
        let value = bits_value(solver, &obj.bits);
        let (mut lo, mut hi) = if obj.maximize {
            (value, bits_max(&obj.bits))
        } else {
            (0, value)
        };
        debug!("objective: start at {}, range [{}, {}]", value, lo, hi);

        while lo < hi {
            let (mid, probe) = {
                let mut g = Gates::new(&mut *solver, true_lit);
                if obj.maximize {
                    let mid = lo + (hi - lo - 1) / 2 + 1;
                    (mid, g.geq_const(&obj.bits, mid))
                } else {
                    let mid = lo + (hi - lo) / 2;
                    (mid, !g.geq_const(&obj.bits, mid + 1))
                }
            };
            pinned.push(probe);
            let r = solver.solve_limited_th(th, &pinned);
            pinned.pop();

            if r == lbool::TRUE {
                best_model = solver.get_model().to_vec();
                let v = bits_value(solver, &obj.bits);
                info!("objective: improved to {}", v);
                if obj.maximize {
                    lo = v;
                } else {
                    hi = v;
                }
            } else if r == lbool::FALSE {
                if obj.maximize {
                    hi = mid - 1;
                } else {
                    lo = mid + 1;
                }
            } else {
                debug!("objective: limit reached, keeping {}", if obj.maximize { lo } else { hi });
                break 'objectives;
            }
        }

        let best = if obj.maximize { lo } else { hi };
        let pin = {
            let mut g = Gates::new(&mut *solver, true_lit);
            if obj.maximize {
                g.geq_const(&obj.bits, best)
            } else {
                match best.checked_add(1) {
                    Some(b) => !g.geq_const(&obj.bits, b),
                    None => true_lit,
                }
            }
        };
        pinned.push(pin);
    }

    solver.restore_model(best_model);
    lbool::TRUE
}
