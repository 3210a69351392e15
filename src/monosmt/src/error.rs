//! Usage errors of the `Context` API.

use crate::{bv::BvId, clause::Lit, graph::GraphId};

/// Errors returned by fallible `Context` operations.
///
/// They are detected before any state is modified, so the context stays
/// usable after an error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("unknown variable {0}")]
    UnknownVar(u32),
    #[error("unknown graph {0:?}")]
    UnknownGraph(GraphId),
    #[error("unknown node {node} in graph {graph:?}")]
    UnknownNode { graph: GraphId, node: usize },
    #[error("unknown bitvector {0:?}")]
    UnknownBitvector(BvId),
    #[error("unknown point {0}")]
    UnknownPoint(usize),
    #[error("unknown plane {0}")]
    UnknownPlane(usize),
    #[error("unknown shape {0}")]
    UnknownShape(usize),
    #[error("unknown state machine {0}")]
    UnknownFsm(usize),
    #[error("unknown state {state} in state machine {fsm}")]
    UnknownState { fsm: usize, state: usize },
    #[error("unknown string {0}")]
    UnknownString(usize),
    #[error("bitvector widths differ: {expected} and {got}")]
    WidthMismatch { expected: u32, got: u32 },
    #[error("invalid bitvector width {0} (must be in 1..=63)")]
    InvalidWidth(usize),
    #[error("constant {value} does not fit in {width} bits")]
    ConstantTooLarge { value: u64, width: u32 },
    #[error("invalid slice {lower}..={upper} of a {width}-bit bitvector")]
    InvalidSlice { lower: u32, upper: u32, width: u32 },
    #[error("length mismatch: {0} and {1}")]
    LengthMismatch(usize, usize),
    #[error("empty argument list")]
    EmptyArguments,
    #[error("label {label} is not below the alphabet size {size}")]
    InvalidLabel { label: usize, size: usize },
    #[error("symbol {symbol} is not in 1..{size}")]
    InvalidSymbol { symbol: usize, size: usize },
    #[error("{0:?} is not a theory atom of this kind")]
    NotAnAtom(Lit),
    #[error("{0:?} is not an edge literal of graph {1:?}")]
    NotAnEdge(Lit, GraphId),
    #[error("no model available")]
    NoModel,
    #[error("unsupported: {0}")]
    Unsupported(&'static str),
    #[error("invalid option: {0}")]
    InvalidOption(String),
}

pub type Result<T> = std::result::Result<T, Error>;
