/*****************************************************************************************[lib.rs]
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

//! SAT modulo monotonic theories.
//!
//! A CDCL solver (derived from batsat/minisat) extended with lazily checked
//! theories over graphs, bounded bitvectors, constructive solid geometry and
//! finite state machines. Every theory fact is a plain literal, so theory
//! atoms combine freely with ordinary clauses.
//!
//! The entry point is [`Context`].
//!
//! ```
//! use monosmt::Context;
//! let mut ctx = Context::new();
//! let g = ctx.new_graph();
//! let (a, b) = (ctx.new_node(g).unwrap(), ctx.new_node(g).unwrap());
//! let e = ctx.new_edge(g, a, b, 1).unwrap();
//! let r = ctx.reaches(g, a, b).unwrap();
//! ctx.add_unit_clause(r).unwrap();
//! assert!(ctx.solve(&[]).unwrap());
//! assert_eq!(ctx.model_lit(e).unwrap(), monosmt::lbool::TRUE);
//! ```

//======== LOG ============

// stubs when logging is not enabled
#[cfg(not(feature = "logging"))]
#[macro_use]
pub(crate) mod log {
    macro_rules! trace {
        ($( $x:expr ),*) => {};
    }
    macro_rules! debug {
        ($( $x:expr ),*) => {};
    }
    macro_rules! info {
        ($( $x:expr ),*) => {};
    }
}

#[cfg(feature = "logging")]
#[macro_use]
pub extern crate log;

//======== PUBLIC INTERFACE ============

pub mod bv;
pub mod callbacks;
pub mod clause;
pub mod config;
pub mod context;
pub mod core;
pub mod encode;
pub mod error;
pub mod fsm;
pub mod geometry;
pub mod gnf;
pub mod graph;
pub mod interface;
pub mod intmap;
pub mod limits;
pub mod theory;

mod dispatch;
mod optimize;
mod pb;

pub use crate::{
    bv::{BvId, Cmp},
    callbacks::{Basic as BasicCallbacks, Callbacks, ProgressStatus, Stats as StatsCallbacks},
    clause::{lbool, Kind as ClauseKind, LSet, Lit, VMap, Var},
    config::{Config, TheoryOpts},
    context::Context,
    core::{Solver, SolverOpts},
    error::{Error, Result},
    fsm::{FsmId, StringId},
    geometry::{PlaneId, PointId, ShapeId, ShapeOp},
    graph::GraphId,
    interface::SolverInterface,
    limits::ResourceLimits,
    pb::PbOp,
    theory::{EmptyTheory, Theory, TheoryArg},
};
