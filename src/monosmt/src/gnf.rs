/*****************************************************************************************[gnf.rs]
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

//! Reader for the GNF instruction format.
//!
//! GNF extends DIMACS CNF with lines declaring bitvectors, graphs, shapes
//! and their atoms, constraints, objectives and `solve` calls. Literals use DIMACS
//! numbering; each file variable is mapped to a fresh variable of the
//! context, and each theory atom is tied to its file literal by an
//! equivalence.

use {
    crate::{
        bv::{BvId, Cmp},
        clause::{lbool, Lit},
        context::Context,
        error,
        geometry::{PlaneId, PointId, ShapeId, ShapeOp},
        graph::GraphId,
        pb::PbOp,
    },
    rustc_hash::FxHashMap,
    std::{
        fmt::Display,
        io::{self, BufRead},
        str::{FromStr, SplitWhitespace},
    },
};

/// What was read from a GNF input.
#[derive(Debug, Default)]
pub struct Instance {
    /// Result of each `solve` line, in order.
    pub results: Vec<lbool>,
    lits: Vec<Lit>,
    bvs: FxHashMap<u64, BvId>,
    /// Graph and number of nodes created so far.
    graphs: FxHashMap<u64, (GraphId, usize)>,
    spaces: FxHashMap<u64, Space>,
}

/// File names of the objects of one `geometry` declaration.
#[derive(Debug, Default)]
struct Space {
    points: FxHashMap<u64, PointId>,
    planes: FxHashMap<u64, PlaneId>,
    shapes: FxHashMap<u64, ShapeId>,
}

impl Instance {
    /// Context literal of DIMACS literal `x`, if its variable appeared.
    pub fn lit(&self, x: i64) -> Option<Lit> {
        if x == 0 {
            return None;
        }
        let l = *self.lits.get(x.unsigned_abs() as usize - 1)?;
        Some(if x > 0 { l } else { !l })
    }

    /// Number of DIMACS variables seen so far.
    pub fn n_vars(&self) -> usize {
        self.lits.len()
    }

    pub fn bv(&self, id: u64) -> Option<BvId> {
        self.bvs.get(&id).cloned()
    }

    pub fn graph(&self, id: u64) -> Option<GraphId> {
        self.graphs.get(&id).map(|&(g, _)| g)
    }

    /// Shape `id` of geometry `space`.
    pub fn shape(&self, space: u64, id: u64) -> Option<ShapeId> {
        self.spaces.get(&space)?.shapes.get(&id).cloned()
    }

    /// Point `id` of geometry `space`.
    pub fn point(&self, space: u64, id: u64) -> Option<PointId> {
        self.spaces.get(&space)?.points.get(&id).cloned()
    }
}

/// `parse(input, ctx)` replays the content of `input` into `ctx`.
///
/// `solve` lines are executed as they are read, with the limits of the
/// context. Malformed lines fail with `io::ErrorKind::InvalidData`.
pub fn parse<R: BufRead>(input: &mut R, ctx: &mut Context) -> io::Result<Instance> {
    let mut r = Reader {
        ctx,
        inst: Instance::default(),
    };
    let mut buf = String::new();
    let mut no = 0;
    loop {
        buf.clear();
        if input.read_line(&mut buf)? == 0 {
            break;
        }
        no += 1;
        let mut line = Line {
            no,
            toks: buf.split_whitespace(),
        };
        r.line(&mut line)?;
    }
    Ok(r.inst)
}

struct Line<'a> {
    no: usize,
    toks: SplitWhitespace<'a>,
}

impl<'a> Line<'a> {
    fn err<T, D: Display>(&self, msg: D) -> io::Result<T> {
        Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("line {}: {}", self.no, msg),
        ))
    }

    /// Turn a usage error of the context into a parse error.
    fn ck<T>(&self, r: error::Result<T>) -> io::Result<T> {
        match r {
            Ok(x) => Ok(x),
            Err(e) => self.err(e),
        }
    }

    fn word(&mut self) -> io::Result<&'a str> {
        match self.toks.next() {
            Some(w) => Ok(w),
            None => self.err("unexpected end of line"),
        }
    }

    fn num<T: FromStr>(&mut self) -> io::Result<T> {
        let w = self.word()?;
        match w.parse() {
            Ok(x) => Ok(x),
            Err(_) => self.err(format!("expected a number, got {:?}", w)),
        }
    }

    fn opt_num<T: FromStr>(&mut self) -> io::Result<Option<T>> {
        match self.toks.clone().next() {
            Some(_) => self.num().map(Some),
            None => Ok(None),
        }
    }

    /// Integers up to a terminating `0` or the end of the line.
    fn ints_until_zero(&mut self) -> io::Result<Vec<i64>> {
        let mut v = vec![];
        while let Some(w) = self.toks.next() {
            let x: i64 = match w.parse() {
                Ok(x) => x,
                Err(_) => return self.err(format!("expected a literal, got {:?}", w)),
            };
            if x == 0 {
                break;
            }
            v.push(x);
        }
        Ok(v)
    }

    /// Skip the optional number type of geometry lines.
    fn number_type(&mut self) {
        if let Some("int") | Some("float") | Some("rational") = self.toks.clone().next() {
            self.toks.next();
        }
    }

    fn cmp(&mut self) -> io::Result<Cmp> {
        let w = self.word()?;
        match parse_cmp(w) {
            Some(c) => Ok(c),
            None => self.err(format!("unknown comparison {:?}", w)),
        }
    }
}

fn parse_cmp(w: &str) -> Option<Cmp> {
    Some(match w {
        "<" => Cmp::Lt,
        "<=" => Cmp::Leq,
        ">" => Cmp::Gt,
        ">=" => Cmp::Geq,
        "==" | "=" => Cmp::Eq,
        "!=" => Cmp::Neq,
        _ => return None,
    })
}

struct Reader<'c> {
    ctx: &'c mut Context,
    inst: Instance,
}

impl<'c> Reader<'c> {
    fn lit(&mut self, l: &Line, x: i64) -> io::Result<Lit> {
        if x == 0 {
            return l.err("literal 0");
        }
        let v = x.unsigned_abs() as usize;
        while self.inst.lits.len() < v {
            let fresh = self.ctx.new_lit();
            self.inst.lits.push(fresh);
        }
        let p = self.inst.lits[v - 1];
        Ok(if x > 0 { p } else { !p })
    }

    fn lits(&mut self, l: &Line, xs: &[i64]) -> io::Result<Vec<Lit>> {
        xs.iter().map(|&x| self.lit(l, x)).collect()
    }

    fn read_lit(&mut self, l: &mut Line) -> io::Result<Lit> {
        let x = l.num()?;
        self.lit(l, x)
    }

    /// Make `atom` equivalent to the file literal `file`.
    fn tie(&mut self, l: &Line, atom: Lit, file: Lit) -> io::Result<()> {
        l.ck(self.ctx.add_binary_clause(!atom, file))?;
        l.ck(self.ctx.add_binary_clause(atom, !file))?;
        Ok(())
    }

    fn bv(&self, l: &mut Line) -> io::Result<BvId> {
        let id: u64 = l.num()?;
        match self.inst.bvs.get(&id) {
            Some(&b) => Ok(b),
            None => l.err(format!("undeclared bitvector {}", id)),
        }
    }

    fn declare_bv(&mut self, l: &Line, id: u64, bv: BvId) -> io::Result<()> {
        if self.inst.bvs.contains_key(&id) {
            return l.err(format!("bitvector {} declared twice", id));
        }
        self.inst.bvs.insert(id, bv);
        Ok(())
    }

    /// Bind file bitvector `id` to `result`: declare it if it is new,
    /// constrain it to be equal otherwise.
    fn bind_bv(&mut self, l: &Line, id: u64, result: BvId) -> io::Result<()> {
        match self.inst.bvs.get(&id) {
            Some(&b) => l.ck(self.ctx.bv_assert_eq(b, result)),
            None => {
                self.inst.bvs.insert(id, result);
                Ok(())
            }
        }
    }

    fn graph(&self, l: &mut Line) -> io::Result<u64> {
        let id: u64 = l.num()?;
        if self.inst.graphs.contains_key(&id) {
            Ok(id)
        } else {
            l.err(format!("undeclared graph {}", id))
        }
    }

    /// Node `n` of file graph `gid`, creating missing nodes.
    fn node(&mut self, l: &mut Line, gid: u64) -> io::Result<usize> {
        let n: usize = l.num()?;
        let entry = match self.inst.graphs.get_mut(&gid) {
            Some(e) => e,
            None => return l.err(format!("undeclared graph {}", gid)),
        };
        while entry.1 <= n {
            l.ck(self.ctx.new_node(entry.0))?;
            entry.1 += 1;
        }
        Ok(n)
    }

    fn line(&mut self, l: &mut Line) -> io::Result<()> {
        let head = match l.toks.clone().next() {
            Some(h) => h,
            None => return Ok(()),
        };
        if head.parse::<i64>().is_ok() {
            let xs = l.ints_until_zero()?;
            let c = self.lits(l, &xs)?;
            l.ck(self.ctx.add_clause(&c))?;
            return Ok(());
        }
        l.word()?;
        match head {
            "c" | "p" => Ok(()),
            "solve" => self.solve(l),
            "clear_opt" => {
                self.ctx.clear_objectives();
                Ok(())
            }
            "minimize" | "maximize" => {
                let kind = l.word()?;
                if kind != "bv" {
                    return l.err(format!("cannot optimize {:?}", kind));
                }
                let b = self.bv(l)?;
                if head == "minimize" {
                    l.ck(self.ctx.minimize_bv(b))
                } else {
                    l.ck(self.ctx.maximize_bv(b))
                }
            }
            "amo" => {
                let xs = l.ints_until_zero()?;
                let lits = self.lits(l, &xs)?;
                l.ck(self.ctx.assert_at_most_one(&lits))
            }
            "pb" => self.pb(l),
            "bv" => self.bv_line(l),
            "digraph" => self.digraph(l),
            "geometry" => self.geometry(l),
            "point" | "plane" | "primative" | "union" | "intersection" | "difference"
            | "predicate_point_in_shape" => self.shape_line(head, l),
            _ => self.graph_line(head, l),
        }
    }

    fn solve(&mut self, l: &mut Line) -> io::Result<()> {
        let xs = l.ints_until_zero()?;
        let assumps = self.lits(l, &xs)?;
        debug!("gnf: solve under {:?}", assumps);
        let r = l.ck(self.ctx.solve_limited(&assumps))?;
        self.inst.results.push(r);
        Ok(())
    }

    fn pb(&mut self, l: &mut Line) -> io::Result<()> {
        let w = l.word()?;
        let op = match PbOp::parse(w) {
            Some(op) => op,
            None => return l.err(format!("unknown comparison {:?}", w)),
        };
        let rhs: i64 = l.num()?;
        let n: usize = l.num()?;
        let mut lits = Vec::with_capacity(n);
        for _ in 0..n {
            lits.push(self.read_lit(l)?);
        }
        let m: usize = l.num()?;
        let coefs = if m == 0 {
            vec![1; n]
        } else {
            (0..m).map(|_| l.num()).collect::<io::Result<Vec<i64>>>()?
        };
        l.ck(self.ctx.assert_pb(&lits, &coefs, op, rhs))
    }

    fn bv_line(&mut self, l: &mut Line) -> io::Result<()> {
        let w = l.word()?;
        if let Some(op) = parse_cmp(w) {
            // bv OP LIT ID1 ID2
            let file = self.read_lit(l)?;
            let a = self.bv(l)?;
            let b = self.bv(l)?;
            let atom = l.ck(self.ctx.bv_cmp(a, op, b))?;
            return self.tie(l, atom, file);
        }
        match w {
            "anon" => {
                let id = l.num()?;
                let width = l.num()?;
                let b = l.ck(self.ctx.new_bv_anon(width))?;
                self.declare_bv(l, id, b)
            }
            "const" => {
                if l.toks.clone().next().and_then(parse_cmp).is_some() {
                    // bv const OP LIT ID VAL
                    let op = l.cmp()?;
                    let file = self.read_lit(l)?;
                    let a = self.bv(l)?;
                    let k = l.num()?;
                    let atom = l.ck(self.ctx.bv_cmp_const(a, op, k))?;
                    self.tie(l, atom, file)
                } else {
                    let id = l.num()?;
                    let width = l.num()?;
                    let value = l.num()?;
                    let b = l.ck(self.ctx.new_bv_const(width, value))?;
                    self.declare_bv(l, id, b)
                }
            }
            "+" | "-" => {
                let r = l.num()?;
                let a = self.bv(l)?;
                let b = self.bv(l)?;
                let res = if w == "+" {
                    l.ck(self.ctx.bv_add(a, b))?
                } else {
                    l.ck(self.ctx.bv_sub(a, b))?
                };
                self.bind_bv(l, r, res)
            }
            "ite" => {
                let c = self.read_lit(l)?;
                let t = self.bv(l)?;
                let e = self.bv(l)?;
                let r = l.num()?;
                let res = l.ck(self.ctx.bv_ite(c, t, e))?;
                self.bind_bv(l, r, res)
            }
            "min" | "max" => {
                let r = l.num()?;
                let n: usize = l.num()?;
                let args = (0..n).map(|_| self.bv(l)).collect::<io::Result<Vec<_>>>()?;
                let res = if w == "min" {
                    l.ck(self.ctx.bv_min(&args))?
                } else {
                    l.ck(self.ctx.bv_max(&args))?
                };
                self.bind_bv(l, r, res)
            }
            "not" => {
                let a = self.bv(l)?;
                let r = l.num()?;
                let res = l.ck(self.ctx.bv_not(a))?;
                self.bind_bv(l, r, res)
            }
            "and" | "nand" | "or" | "nor" | "xor" | "xnor" | "concat" => {
                let a = self.bv(l)?;
                let b = self.bv(l)?;
                let r = l.num()?;
                let ctx = &mut *self.ctx;
                let res = l.ck(match w {
                    "and" => ctx.bv_and(a, b),
                    "nand" => ctx.bv_nand(a, b),
                    "or" => ctx.bv_or(a, b),
                    "nor" => ctx.bv_nor(a, b),
                    "xor" => ctx.bv_xor(a, b),
                    "xnor" => ctx.bv_xnor(a, b),
                    _ => ctx.bv_concat(a, b),
                })?;
                self.bind_bv(l, r, res)
            }
            "slice" => {
                let a = self.bv(l)?;
                let lo = l.num()?;
                let hi = l.num()?;
                let r = l.num()?;
                let res = l.ck(self.ctx.bv_slice(a, lo, hi))?;
                self.bind_bv(l, r, res)
            }
            "popcount" => {
                let r: u64 = l.num()?;
                let n: usize = l.num()?;
                let mut lits = Vec::with_capacity(n);
                for _ in 0..n {
                    lits.push(self.read_lit(l)?);
                }
                let width = match self.inst.bvs.get(&r) {
                    Some(&b) => l.ck(self.ctx.bv_width(b))?,
                    // wide enough to count all of `lits`
                    None => (64 - (n as u64).leading_zeros() as usize).max(1),
                };
                let res = l.ck(self.ctx.bv_popcount(&lits, width))?;
                self.bind_bv(l, r, res)
            }
            _ => {
                // bv ID W v1 ... vW
                let id: u64 = match w.parse() {
                    Ok(id) => id,
                    Err(_) => return l.err(format!("unknown bitvector command {:?}", w)),
                };
                let width: usize = l.num()?;
                let mut bits = Vec::with_capacity(width);
                for _ in 0..width {
                    bits.push(self.read_lit(l)?);
                }
                let b = l.ck(self.ctx.new_bv(&bits))?;
                self.declare_bv(l, id, b)
            }
        }
    }

    fn digraph(&mut self, l: &mut Line) -> io::Result<()> {
        let _weight_type = l.word()?;
        let n: usize = l.num()?;
        let _n_edges: usize = l.num()?;
        let id: u64 = l.num()?;
        if self.inst.graphs.contains_key(&id) {
            return l.err(format!("graph {} declared twice", id));
        }
        let g = self.ctx.new_graph();
        for _ in 0..n {
            l.ck(self.ctx.new_node(g))?;
        }
        self.inst.graphs.insert(id, (g, n));
        Ok(())
    }

    fn graph_line(&mut self, head: &str, l: &mut Line) -> io::Result<()> {
        let gid = match head {
            "edge" | "edge_bv" | "reach" | "distance_lt" | "distance_leq" | "weighted_distance_lt"
            | "weighted_distance_leq" | "weighted_distance_bv_lt" | "weighted_distance_bv_leq"
            | "maximum_flow_geq" | "maximum_flow_gt" | "maximum_flow_bv_geq"
            | "maximum_flow_bv_gt" | "mst_weight_leq" | "mst_weight_lt" | "forest"
            | "acyclic" => self.graph(l)?,
            _ => return l.err(format!("unknown command {:?}", head)),
        };
        let g = self.inst.graphs[&gid].0;

        match head {
            "mst_weight_leq" | "mst_weight_lt" => {
                let file = self.read_lit(l)?;
                let w = l.num()?;
                let atom = if head == "mst_weight_leq" {
                    l.ck(self.ctx.minimum_spanning_tree_leq(g, w))?
                } else {
                    l.ck(self.ctx.minimum_spanning_tree_lt(g, w))?
                };
                return self.tie(l, atom, file);
            }
            "forest" | "acyclic" => {
                let file = self.read_lit(l)?;
                let atom = if head == "forest" {
                    l.ck(self.ctx.acyclic_undirected(g))?
                } else {
                    l.ck(self.ctx.acyclic_directed(g))?
                };
                return self.tie(l, atom, file);
            }
            _ => (),
        }

        let u = self.node(l, gid)?;
        let v = self.node(l, gid)?;
        let file = self.read_lit(l)?;
        let atom = match head {
            "edge" => {
                let w = l.opt_num()?.unwrap_or(1);
                l.ck(self.ctx.new_edge(g, u, v, w))?
            }
            "edge_bv" => {
                let w = self.bv(l)?;
                l.ck(self.ctx.new_edge_bv(g, u, v, w))?
            }
            "reach" => l.ck(self.ctx.reaches(g, u, v))?,
            "distance_lt" => {
                let d = l.num()?;
                l.ck(self.ctx.shortest_path_unweighted_lt_const(g, u, v, d))?
            }
            "distance_leq" => {
                let d = l.num()?;
                l.ck(self.ctx.shortest_path_unweighted_leq_const(g, u, v, d))?
            }
            "weighted_distance_lt" => {
                let d = l.num()?;
                l.ck(self.ctx.shortest_path_lt_const(g, u, v, d))?
            }
            "weighted_distance_leq" => {
                let d = l.num()?;
                l.ck(self.ctx.shortest_path_leq_const(g, u, v, d))?
            }
            "weighted_distance_bv_lt" => {
                let d = self.bv(l)?;
                l.ck(self.ctx.shortest_path_lt_bv(g, u, v, d))?
            }
            "weighted_distance_bv_leq" => {
                let d = self.bv(l)?;
                l.ck(self.ctx.shortest_path_leq_bv(g, u, v, d))?
            }
            "maximum_flow_geq" => {
                let f = l.num()?;
                l.ck(self.ctx.maximum_flow_geq(g, u, v, f))?
            }
            "maximum_flow_gt" => {
                let f = l.num()?;
                l.ck(self.ctx.maximum_flow_gt(g, u, v, f))?
            }
            "maximum_flow_bv_geq" => {
                let f = self.bv(l)?;
                l.ck(self.ctx.maximum_flow_geq_bv(g, u, v, f))?
            }
            _ => {
                let f = self.bv(l)?;
                l.ck(self.ctx.maximum_flow_gt_bv(g, u, v, f))?
            }
        };
        self.tie(l, atom, file)
    }

    fn geometry(&mut self, l: &mut Line) -> io::Result<()> {
        l.number_type();
        let dim: usize = l.num()?;
        let id: u64 = l.num()?;
        if dim != 2 {
            return l.err(format!("unsupported geometry dimension {}", dim));
        }
        if self.inst.spaces.contains_key(&id) {
            return l.err(format!("geometry {} declared twice", id));
        }
        self.inst.spaces.insert(id, Space::default());
        Ok(())
    }

    /// Optional condition of a shape: `0` for none, a literal otherwise.
    fn condition(&mut self, l: &mut Line) -> io::Result<Option<Lit>> {
        match l.num()? {
            0 => Ok(None),
            x => self.lit(l, x).map(Some),
        }
    }

    fn shape_line(&mut self, head: &str, l: &mut Line) -> io::Result<()> {
        let sid: u64 = l.num()?;
        if !self.inst.spaces.contains_key(&sid) {
            return l.err(format!("undeclared geometry {}", sid));
        }
        l.number_type();

        match head {
            "point" => {
                let x = l.num()?;
                let y = l.num()?;
                let id = l.num()?;
                if self.space(sid).points.contains_key(&id) {
                    return l.err(format!("point {} declared twice", id));
                }
                let p = self.ctx.new_point(x, y);
                self.space(sid).points.insert(id, p);
                Ok(())
            }
            "plane" => {
                let origin = self.space_point(l, sid)?;
                let dir = self.space_point(l, sid)?;
                let id = l.num()?;
                if self.space(sid).planes.contains_key(&id) {
                    return l.err(format!("plane {} declared twice", id));
                }
                let p = l.ck(self.ctx.new_plane(origin, dir))?;
                self.space(sid).planes.insert(id, p);
                Ok(())
            }
            "primative" => {
                let n: usize = l.num()?;
                let mut planes = Vec::with_capacity(n);
                for _ in 0..n {
                    let p: u64 = l.num()?;
                    match self.space(sid).planes.get(&p) {
                        Some(&p) => planes.push(p),
                        None => return l.err(format!("undeclared plane {}", p)),
                    }
                }
                let id = self.new_shape_id(l, sid)?;
                let shape = match self.condition(l)? {
                    None => l.ck(self.ctx.new_primitive(&planes))?,
                    Some(c) => l.ck(self.ctx.new_conditional_primitive(&planes, c))?,
                };
                self.space(sid).shapes.insert(id, shape);
                Ok(())
            }
            "predicate_point_in_shape" => {
                let p = self.space_point(l, sid)?;
                let shape = self.space_shape(l, sid)?;
                let file = self.read_lit(l)?;
                let atom = l.ck(self.ctx.shape_contains_point(shape, p))?;
                self.tie(l, atom, file)
            }
            _ => {
                let op = match head {
                    "union" => ShapeOp::Union,
                    "intersection" => ShapeOp::Intersection,
                    _ => ShapeOp::Difference,
                };
                let a = self.space_shape(l, sid)?;
                let b = self.space_shape(l, sid)?;
                let id = self.new_shape_id(l, sid)?;
                let shape = match self.condition(l)? {
                    None => l.ck(self.ctx.new_shape(op, a, b))?,
                    Some(c) => l.ck(self.ctx.new_conditional_shape(op, a, b, c))?,
                };
                self.space(sid).shapes.insert(id, shape);
                Ok(())
            }
        }
    }

    fn space(&mut self, sid: u64) -> &mut Space {
        self.inst.spaces.entry(sid).or_insert_with(Space::default)
    }

    fn space_point(&mut self, l: &mut Line, sid: u64) -> io::Result<PointId> {
        let id: u64 = l.num()?;
        match self.space(sid).points.get(&id) {
            Some(&p) => Ok(p),
            None => l.err(format!("undeclared point {}", id)),
        }
    }

    fn space_shape(&mut self, l: &mut Line, sid: u64) -> io::Result<ShapeId> {
        let id: u64 = l.num()?;
        match self.space(sid).shapes.get(&id) {
            Some(&s) => Ok(s),
            None => l.err(format!("undeclared shape {}", id)),
        }
    }

    fn new_shape_id(&mut self, l: &mut Line, sid: u64) -> io::Result<u64> {
        let id: u64 = l.num()?;
        if self.space(sid).shapes.contains_key(&id) {
            return l.err(format!("shape {} declared twice", id));
        }
        Ok(id)
    }
}
