//! Constructive solid geometry in the plane.
//!
//! Shapes are trees of set operations over convex primitives, each
//! primitive being an intersection of half-planes. Geometry is fixed at
//! creation; only the conditions of conditional shapes are symbolic, so a
//! containment atom only changes when a condition in its tree is assigned.

use {
    crate::{
        clause::{lbool, Lit, Var},
        dispatch::{CheckCx, TheorySolver},
    },
    rustc_hash::FxHashMap,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PointId(pub(crate) u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PlaneId(pub(crate) u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ShapeId(pub(crate) u32);

impl PointId {
    pub fn idx(self) -> usize {
        self.0 as usize
    }
}

impl PlaneId {
    pub fn idx(self) -> usize {
        self.0 as usize
    }
}

impl ShapeId {
    pub fn idx(self) -> usize {
        self.0 as usize
    }
}

/// Set operation combining two shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeOp {
    Union = 0,
    Intersection = 1,
    /// Left minus right.
    Difference = 2,
}

impl ShapeOp {
    pub fn from_index(i: u32) -> Option<ShapeOp> {
        match i {
            0 => Some(ShapeOp::Union),
            1 => Some(ShapeOp::Intersection),
            2 => Some(ShapeOp::Difference),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Point {
    x: i64,
    y: i64,
}

/// Half-plane of the points `p` with `dot(p - origin, dir) >= 0`.
#[derive(Debug, Clone, Copy)]
struct Plane {
    origin: PointId,
    dir: PointId,
}

#[derive(Debug, Clone)]
enum Node {
    Primitive(Vec<PlaneId>),
    Op(ShapeOp, ShapeId, ShapeId),
}

#[derive(Debug, Clone)]
struct Shape {
    node: Node,
    cond: Option<Lit>,
}

#[derive(Debug, Clone, Copy)]
struct ContainAtom {
    shape: ShapeId,
    point: PointId,
    lit: Lit,
}

/// Containment state of a shape: `lo` if it surely contains the point,
/// `hi` if it possibly does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Contain {
    lo: bool,
    hi: bool,
}

/// The geometry theory of a context.
#[derive(Default)]
pub(crate) struct CsgTheory {
    points: Vec<Point>,
    planes: Vec<Plane>,
    shapes: Vec<Shape>,
    atoms: Vec<ContainAtom>,
    atoms_of_cond: FxHashMap<Var, Vec<u32>>,
    dirty: Vec<u32>,
    is_dirty: Vec<bool>,
    all_dirty: bool,
    expl: Vec<Lit>,
}

impl CsgTheory {
    pub fn has_point(&self, p: PointId) -> bool {
        p.idx() < self.points.len()
    }

    pub fn has_plane(&self, p: PlaneId) -> bool {
        p.idx() < self.planes.len()
    }

    pub fn has_shape(&self, s: ShapeId) -> bool {
        s.idx() < self.shapes.len()
    }

    pub fn add_point(&mut self, x: i64, y: i64) -> PointId {
        self.points.push(Point { x, y });
        PointId(self.points.len() as u32 - 1)
    }

    pub fn add_plane(&mut self, origin: PointId, dir: PointId) -> PlaneId {
        self.planes.push(Plane { origin, dir });
        PlaneId(self.planes.len() as u32 - 1)
    }

    pub fn add_primitive(&mut self, planes: Vec<PlaneId>, cond: Option<Lit>) -> ShapeId {
        self.add_shape_node(Node::Primitive(planes), cond)
    }

    pub fn add_shape(&mut self, op: ShapeOp, a: ShapeId, b: ShapeId, cond: Option<Lit>) -> ShapeId {
        self.add_shape_node(Node::Op(op, a, b), cond)
    }

    fn add_shape_node(&mut self, node: Node, cond: Option<Lit>) -> ShapeId {
        self.shapes.push(Shape { node, cond });
        ShapeId(self.shapes.len() as u32 - 1)
    }

    pub fn add_atom(&mut self, shape: ShapeId, point: PointId, lit: Lit) {
        let i = self.atoms.len() as u32;
        self.atoms.push(ContainAtom { shape, point, lit });
        let mut conds = vec![];
        self.collect_conds(shape, &mut conds);
        conds.sort_unstable();
        conds.dedup();
        for v in conds {
            self.atoms_of_cond.entry(v).or_insert_with(Vec::new).push(i);
        }
        self.mark_dirty(i);
    }

    fn collect_conds(&self, s: ShapeId, out: &mut Vec<Var>) {
        let shape = &self.shapes[s.idx()];
        if let Some(c) = shape.cond {
            out.push(c.var());
        }
        if let Node::Op(_, a, b) = shape.node {
            self.collect_conds(a, out);
            self.collect_conds(b, out);
        }
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

    fn plane_contains(&self, pl: PlaneId, p: PointId) -> bool {
        let plane = &self.planes[pl.idx()];
        let o = self.points[plane.origin.idx()];
        let d = self.points[plane.dir.idx()];
        let q = self.points[p.idx()];
        let dx = q.x as i128 - o.x as i128;
        let dy = q.y as i128 - o.y as i128;
        dx * d.x as i128 + dy * d.y as i128 >= 0
    }

    fn eval(&self, s: ShapeId, p: PointId, value: &dyn Fn(Lit) -> lbool) -> Contain {
        let shape = &self.shapes[s.idx()];
        let c = match shape.node {
            Node::Primitive(ref planes) => {
                let inside = planes.iter().all(|&pl| self.plane_contains(pl, p));
                Contain {
                    lo: inside,
                    hi: inside,
                }
            }
            Node::Op(op, a, b) => {
                let ca = self.eval(a, p, value);
                let cb = self.eval(b, p, value);
                match op {
                    ShapeOp::Union => Contain {
                        lo: ca.lo || cb.lo,
                        hi: ca.hi || cb.hi,
                    },
                    ShapeOp::Intersection => Contain {
                        lo: ca.lo && cb.lo,
                        hi: ca.hi && cb.hi,
                    },
                    ShapeOp::Difference => Contain {
                        lo: ca.lo && !cb.hi,
                        hi: ca.hi && !cb.lo,
                    },
                }
            }
        };
        match shape.cond.map(|l| value(l)) {
            Some(v) if v == lbool::FALSE => Contain {
                lo: false,
                hi: false,
            },
            Some(v) if v == lbool::UNDEF => Contain { lo: false, hi: c.hi },
            _ => c,
        }
    }

    /// True literals forcing `s` to contain `p`. Requires `lo`.
    fn explain_in(&self, s: ShapeId, p: PointId, value: &dyn Fn(Lit) -> lbool, out: &mut Vec<Lit>) {
        let shape = &self.shapes[s.idx()];
        if let Some(c) = shape.cond {
            out.push(c);
        }
        match shape.node {
            Node::Primitive(_) => (),
            Node::Op(ShapeOp::Union, a, b) => {
                let in_a = self.eval(a, p, value).lo;
                let in_b = self.eval(b, p, value).lo;
                match (in_a, in_b) {
                    (true, true) => self.smaller(
                        out,
                        |cs, o| cs.explain_in(a, p, value, o),
                        |cs, o| cs.explain_in(b, p, value, o),
                    ),
                    (true, false) => self.explain_in(a, p, value, out),
                    _ => self.explain_in(b, p, value, out),
                }
            }
            Node::Op(ShapeOp::Intersection, a, b) => {
                self.explain_in(a, p, value, out);
                self.explain_in(b, p, value, out);
            }
            Node::Op(ShapeOp::Difference, a, b) => {
                self.explain_in(a, p, value, out);
                self.explain_out(b, p, value, out);
            }
        }
    }

    /// True literals preventing `s` from containing `p`. Requires `!hi`.
    fn explain_out(
        &self,
        s: ShapeId,
        p: PointId,
        value: &dyn Fn(Lit) -> lbool,
        out: &mut Vec<Lit>,
    ) {
        let shape = &self.shapes[s.idx()];
        if let Some(c) = shape.cond {
            if value(c) == lbool::FALSE {
                out.push(!c);
                return;
            }
        }
        match shape.node {
            Node::Primitive(_) => (),
            Node::Op(ShapeOp::Union, a, b) => {
                self.explain_out(a, p, value, out);
                self.explain_out(b, p, value, out);
            }
            Node::Op(ShapeOp::Intersection, a, b) => {
                let out_a = !self.eval(a, p, value).hi;
                let out_b = !self.eval(b, p, value).hi;
                match (out_a, out_b) {
                    (true, true) => self.smaller(
                        out,
                        |cs, o| cs.explain_out(a, p, value, o),
                        |cs, o| cs.explain_out(b, p, value, o),
                    ),
                    (true, false) => self.explain_out(a, p, value, out),
                    _ => self.explain_out(b, p, value, out),
                }
            }
            Node::Op(ShapeOp::Difference, a, b) => {
                let out_a = !self.eval(a, p, value).hi;
                let in_b = self.eval(b, p, value).lo;
                match (out_a, in_b) {
                    (true, true) => self.smaller(
                        out,
                        |cs, o| cs.explain_out(a, p, value, o),
                        |cs, o| cs.explain_in(b, p, value, o),
                    ),
                    (true, false) => self.explain_out(a, p, value, out),
                    _ => self.explain_in(b, p, value, out),
                }
            }
        }
    }

    /// Append the shorter of two explanations.
    fn smaller<F, G>(&self, out: &mut Vec<Lit>, f: F, g: G)
    where
        F: Fn(&Self, &mut Vec<Lit>),
        G: Fn(&Self, &mut Vec<Lit>),
    {
        let mut ea = vec![];
        let mut eb = vec![];
        f(self, &mut ea);
        g(self, &mut eb);
        out.extend(if ea.len() <= eb.len() { ea } else { eb });
    }

    fn check_atom(&mut self, i: u32, cx: &mut CheckCx) {
        let atom = self.atoms[i as usize];
        let value = |l: Lit| cx.value(l);
        let c = self.eval(atom.shape, atom.point, &value);
        let mut expl = std::mem::take(&mut self.expl);
        expl.clear();
        let implied = if c.lo {
            self.explain_in(atom.shape, atom.point, &value, &mut expl);
            Some(atom.lit)
        } else if !c.hi {
            self.explain_out(atom.shape, atom.point, &value, &mut expl);
            Some(!atom.lit)
        } else {
            None
        };
        if let Some(p) = implied {
            cx.propagate(p, &expl);
        }
        self.expl = expl;
    }
}

impl TheorySolver for CsgTheory {
    fn on_assign(&mut self, lit: Lit) {
        let atoms = match self.atoms_of_cond.get(&lit.var()) {
            Some(a) => a.clone(),
            None => return,
        };
        for i in atoms {
            self.mark_dirty(i);
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
