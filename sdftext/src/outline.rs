//! Glyph outlines.
//!
//! An outline is a set of closed contours made of quadratic Bézier edges.
//! Straight lines are stored as quadratics with the control point in the
//! middle, cubic curves are approximated by a handful of quadratics. The
//! coordinates are y-up, in pixels at [`crate::BASE_SIZE`] pixels per em.
use crate::approx;
use crate::polynomial::Poly;
use std::ops;

/// A (control) point on a Bézier curve.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

/// Linearly interpolate between points p, q and interpolation variable t.
pub fn lerp(p: Point, q: Point, t: f32) -> Point {
    let x = (1.0 - t) * p.x + t * q.x;
    let y = (1.0 - t) * p.y + t * q.y;
    Point { x, y }
}

impl Point {
    pub fn new(x: f32, y: f32) -> Point {
        Point { x, y }
    }

    /// Distance to another point.
    pub fn d(&self, p: &Point) -> f32 {
        (*p - *self).length()
    }

    pub fn dot(self, rhs: Point) -> f32 {
        self.x * rhs.x + self.y * rhs.y
    }

    /// z-component of the 3D cross product.
    pub fn cross(self, rhs: Point) -> f32 {
        self.x * rhs.y - self.y * rhs.x
    }

    pub fn length(self) -> f32 {
        f32::sqrt(self.dot(self))
    }

    /// Unit vector in the same direction, or zero for the zero vector.
    pub fn normalize(self) -> Point {
        let len = self.length();
        if len == 0.0 {
            return Point::default();
        }
        (1.0 / len) * self
    }
}

/// Axis aligned box. `x0, y0` is the lower left corner.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x0: f32,
    pub x1: f32,
    pub y0: f32,
    pub y1: f32,
}

impl Rect {
    pub fn width(&self) -> f32 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f32 {
        self.y1 - self.y0
    }

    fn include(&mut self, p: Point) {
        self.x0 = f32::min(self.x0, p.x);
        self.x1 = f32::max(self.x1, p.x);
        self.y0 = f32::min(self.y0, p.y);
        self.y1 = f32::max(self.y1, p.y);
    }
}

/// A quadratic Bézier curve consists of three control points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quadratic(pub Point, pub Point, pub Point);

/// Distance from a point to an edge. The sign tells which side of the edge
/// the point is on, `dot` breaks ties between edges meeting at a corner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SignedDistance {
    pub distance: f32,
    pub dot: f32,
}

impl SignedDistance {
    pub const INFINITE: SignedDistance = SignedDistance {
        distance: -f32::MAX,
        dot: 1.0,
    };

    pub fn closer_than(&self, other: &SignedDistance) -> bool {
        let (a, b) = (self.distance.abs(), other.distance.abs());
        a < b || (a == b && self.dot < other.dot)
    }
}

fn non_zero_sign(x: f32) -> f32 {
    if x > 0.0 {
        1.0
    } else {
        -1.0
    }
}

impl Quadratic {
    /// A straight segment from p to q.
    pub fn line(p: Point, q: Point) -> Quadratic {
        Quadratic(p, lerp(p, q, 0.5), q)
    }

    /// Evaluates the Bézier curve at a point t.
    pub fn at(&self, t: f32) -> Point {
        let q1 = lerp(self.0, self.1, t);
        let q2 = lerp(self.1, self.2, t);
        lerp(q1, q2, t)
    }

    /// Tangent direction at t (half the derivative). Falls back to the chord
    /// when the control point coincides with an end point.
    pub fn direction(&self, t: f32) -> Point {
        let tangent = lerp(self.1 - self.0, self.2 - self.1, t);
        if tangent.x == 0.0 && tangent.y == 0.0 {
            return self.2 - self.0;
        }
        tangent
    }

    /// Returns the polynomial B_y(t).
    pub fn y(&self) -> Poly<3> {
        let c = self.0.y;
        let b = -2.0 * self.0.y + 2.0 * self.1.y;
        let a = self.0.y - 2.0 * self.1.y + self.2.y;
        Poly([c, b, a])
    }

    /// Returns the polynomial dB_y/dt.
    pub fn dy(&self) -> Poly<2> {
        let b = -2.0 * self.0.y + 2.0 * self.1.y;
        let a = self.0.y - 2.0 * self.1.y + self.2.y;
        Poly([b, 2.0 * a])
    }

    /// de Casteljau split at t.
    pub fn split(&self, t: f32) -> (Quadratic, Quadratic) {
        let q1 = lerp(self.0, self.1, t);
        let q2 = lerp(self.1, self.2, t);
        let m = lerp(q1, q2, t);
        (Quadratic(self.0, q1, m), Quadratic(m, q2, self.2))
    }

    pub fn split_in_thirds(&self) -> [Quadratic; 3] {
        let (first, rest) = self.split(1.0 / 3.0);
        let (second, third) = rest.split(0.5);
        [first, second, third]
    }

    /// Grows `rect` to contain the curve itself (not just its control points).
    fn extend_bounds(&self, rect: &mut Rect) {
        rect.include(self.0);
        rect.include(self.2);
        let denom = self.0 - 2.0 * self.1 + self.2;
        for (num, den) in [
            (self.0.x - self.1.x, denom.x),
            (self.0.y - self.1.y, denom.y),
        ] {
            if den != 0.0 {
                let t = num / den;
                if t > 0.0 && t < 1.0 {
                    rect.include(self.at(t));
                }
            }
        }
    }

    /// Signed distance from `p` to the curve, and the curve parameter of the
    /// closest point. The parameter lies outside [0, 1] when the closest point
    /// is an end point and `p` is beyond it.
    pub fn signed_distance(&self, p: Point) -> (SignedDistance, f32) {
        let qa = self.0 - p;
        let ab = self.1 - self.0;
        let br = self.2 - self.1 - ab;

        // d/dt |B(t) - p|² / 2 as a cubic in t.
        let a = br.dot(br);
        let b = 3.0 * ab.dot(br);
        let c = 2.0 * ab.dot(ab) + qa.dot(br);
        let d = qa.dot(ab);

        let ep_dir = self.direction(0.0);
        let mut min_distance = non_zero_sign(ep_dir.cross(qa)) * qa.length();
        let mut param = -qa.dot(ep_dir) / ep_dir.dot(ep_dir);

        let ep_dir = self.direction(1.0);
        let distance = (self.2 - p).length();
        if distance < min_distance.abs() {
            min_distance = non_zero_sign(ep_dir.cross(self.2 - p)) * distance;
            param = (p - self.1).dot(ep_dir) / ep_dir.dot(ep_dir);
        }

        for t in Poly([d, c, b, a]).solve() {
            if t > 0.0 && t < 1.0 {
                let qe = qa + (2.0 * t) * ab + (t * t) * br;
                let distance = qe.length();
                if distance <= min_distance.abs() {
                    min_distance = non_zero_sign((ab + t * br).cross(qe)) * distance;
                    param = t;
                }
            }
        }

        let dot = if (0.0..=1.0).contains(&param) {
            0.0
        } else if param < 0.5 {
            f32::abs(self.direction(0.0).normalize().dot(qa.normalize()))
        } else {
            f32::abs(self.direction(1.0).normalize().dot((self.2 - p).normalize()))
        };

        (
            SignedDistance {
                distance: min_distance,
                dot,
            },
            param,
        )
    }

    /// Replaces the distance to an end point by the distance to the tangent
    /// line through it, when `p` lies beyond that end point.
    pub fn pseudo_distance(&self, p: Point, distance: SignedDistance, param: f32) -> f32 {
        if param < 0.0 {
            let dir = self.direction(0.0).normalize();
            let aq = p - self.0;
            if aq.dot(dir) < 0.0 {
                let pseudo = aq.cross(dir);
                if pseudo.abs() <= distance.distance.abs() {
                    return pseudo;
                }
            }
        } else if param > 1.0 {
            let dir = self.direction(1.0).normalize();
            let bq = p - self.2;
            if bq.dot(dir) > 0.0 {
                let pseudo = bq.cross(dir);
                if pseudo.abs() <= distance.distance.abs() {
                    return pseudo;
                }
            }
        }
        distance.distance
    }

    /// Signed number of crossings of this curve with the ray from `p` towards +x.
    /// Upward crossings count +1, downward -1. End points are half open so a
    /// vertex shared by two edges is counted once.
    fn crossings(&self, p: Point) -> i32 {
        let mut y = self.y();
        y.0[0] -= p.y;
        let dy = self.dy();

        let mut w = 0;
        for t in y.solve() {
            let slope = dy.at(t);
            let upward = slope > 0.0 && (0.0..1.0).contains(&t);
            let downward = slope < 0.0 && t > 0.0 && t <= 1.0;
            if (upward || downward) && self.at(t).x > p.x {
                w += if upward { 1 } else { -1 };
            }
        }
        w
    }
}

/// Channels an edge contributes to in a multi-channel distance field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EdgeColor(pub u8);

impl EdgeColor {
    pub const BLACK: EdgeColor = EdgeColor(0);
    pub const RED: EdgeColor = EdgeColor(1);
    pub const GREEN: EdgeColor = EdgeColor(2);
    pub const YELLOW: EdgeColor = EdgeColor(3);
    pub const BLUE: EdgeColor = EdgeColor(4);
    pub const MAGENTA: EdgeColor = EdgeColor(5);
    pub const CYAN: EdgeColor = EdgeColor(6);
    pub const WHITE: EdgeColor = EdgeColor(7);

    pub fn has(self, channel: EdgeColor) -> bool {
        self.0 & channel.0 != 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Edge {
    pub curve: Quadratic,
    pub color: EdgeColor,
}

impl From<Quadratic> for Edge {
    fn from(curve: Quadratic) -> Self {
        Edge {
            curve,
            color: EdgeColor::WHITE,
        }
    }
}

/// A closed loop of edges.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Contour {
    pub edges: Vec<Edge>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Outline {
    contours: Vec<Contour>,
    bounds: Rect,
}

impl Outline {
    /// An outline with no contours, e.g. the outline of a space.
    pub fn empty() -> Outline {
        Outline::default()
    }

    /// Builder for an outline whose input coordinates get multiplied by `scale`.
    pub fn builder(scale: f32) -> Builder {
        Builder {
            scale,
            contours: vec![],
            current: vec![],
            position: Point::default(),
            start: None,
            bounds: Rect::default(),
        }
    }

    pub fn contours(&self) -> &[Contour] {
        &self.contours
    }

    pub fn contours_mut(&mut self) -> &mut [Contour] {
        &mut self.contours
    }

    /// Iterator over every edge of every contour.
    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.contours.iter().flat_map(|c| c.edges.iter())
    }

    pub fn is_empty(&self) -> bool {
        self.contours.iter().all(|c| c.edges.is_empty())
    }

    /// Bounding box of the outline. It always contains the pen origin (0, 0),
    /// so `x0, y0` is the glyph's offset from the origin when negative and
    /// zero otherwise. The box of an empty outline is all zeros.
    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    /// Splits single-edge contours in three so that edge coloring has
    /// enough edges to tell corners apart.
    pub fn normalize(&mut self) {
        for contour in &mut self.contours {
            if contour.edges.len() == 1 {
                let edge = contour.edges[0];
                contour.edges = edge
                    .curve
                    .split_in_thirds()
                    .into_iter()
                    .map(|curve| Edge {
                        curve,
                        color: edge.color,
                    })
                    .collect();
            }
        }
    }

    /// Nonzero winding number of the outline around `p`.
    pub fn winding_number(&self, p: Point) -> i32 {
        self.edges().map(|edge| edge.curve.crossings(p)).sum()
    }

    pub fn contains(&self, p: Point) -> bool {
        self.winding_number(p) != 0
    }
}

/// Collects the outline of a glyph from ttf-parser (or by hand).
pub struct Builder {
    scale: f32,
    contours: Vec<Contour>,
    current: Vec<Edge>,
    position: Point,
    start: Option<Point>,
    // The box starts at the origin, see `Outline::bounds`.
    bounds: Rect,
}

impl Builder {
    /// True until the first command arrives.
    pub fn is_empty(&self) -> bool {
        self.start.is_none() && self.current.is_empty() && self.contours.is_empty()
    }

    pub fn build(mut self) -> Outline {
        self.finish_contour();
        let mut bounds = self.bounds;
        for edge in self.contours.iter().flat_map(|c| c.edges.iter()) {
            edge.curve.extend_bounds(&mut bounds);
        }
        Outline {
            contours: self.contours,
            bounds,
        }
    }

    fn point(&self, x: f32, y: f32) -> Point {
        Point {
            x: x * self.scale,
            y: y * self.scale,
        }
    }

    fn push(&mut self, curve: Quadratic) {
        self.current.push(curve.into());
        self.position = curve.2;
    }

    /// Loop back to the start of the contour and store it. Some fonts omit
    /// the final straight line back to the start point.
    fn finish_contour(&mut self) {
        if let Some(start) = self.start.take() {
            if !approx(0.0, start.d(&self.position)) {
                self.push(Quadratic::line(self.position, start));
            }
        }
        if !self.current.is_empty() {
            let edges = std::mem::take(&mut self.current);
            self.contours.push(Contour { edges });
        }
    }
}

impl ttf_parser::OutlineBuilder for Builder {
    fn move_to(&mut self, x: f32, y: f32) {
        self.finish_contour();
        self.position = self.point(x, y);
        self.start = Some(self.position);
    }

    fn line_to(&mut self, x: f32, y: f32) {
        let target = self.point(x, y);
        // Zero length segments have no direction and only confuse coloring.
        if !approx(0.0, self.position.d(&target)) {
            self.push(Quadratic::line(self.position, target));
        }
    }

    fn quad_to(&mut self, x1: f32, y1: f32, x: f32, y: f32) {
        let ctrl = self.point(x1, y1);
        let target = self.point(x, y);
        self.push(Quadratic(self.position, ctrl, target));
    }

    /// Cubic curves are split in four and each piece is replaced by the
    /// quadratic through its end points and the midpoint of its tangents.
    fn curve_to(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, x: f32, y: f32) {
        const PIECES: usize = 4;
        let p0 = self.position;
        let p1 = self.point(x1, y1);
        let p2 = self.point(x2, y2);
        let p3 = self.point(x, y);

        let cubic = |t: f32| {
            let a = lerp(p0, p1, t);
            let b = lerp(p1, p2, t);
            let c = lerp(p2, p3, t);
            let ab = lerp(a, b, t);
            let bc = lerp(b, c, t);
            (lerp(ab, bc, t), bc - ab)
        };

        for i in 0..PIECES {
            let t0 = i as f32 / PIECES as f32;
            let t1 = (i + 1) as f32 / PIECES as f32;
            let (s, ds) = cubic(t0);
            let (e, de) = cubic(t1);
            // Tangents scaled to the piece; the control point averages the
            // two tangent intersections estimates.
            let h = (t1 - t0) * 1.5;
            let ctrl = 0.5 * ((s + h * ds) + (e - h * de));
            self.push(Quadratic(s, ctrl, e));
        }
    }

    fn close(&mut self) {
        self.finish_contour();
    }
}

// Arithmetic overloads.

impl ops::Add<Point> for Point {
    type Output = Point;

    fn add(self, rhs: Point) -> Self::Output {
        Point {
            x: self.x + rhs.x,
            y: self.y + rhs.y,
        }
    }
}

impl ops::Sub<Point> for Point {
    type Output = Point;

    fn sub(self, rhs: Point) -> Self::Output {
        Point {
            x: self.x - rhs.x,
            y: self.y - rhs.y,
        }
    }
}

impl ops::Add<Point> for Quadratic {
    type Output = Quadratic;

    fn add(self, rhs: Point) -> Self::Output {
        Quadratic(rhs + self.0, rhs + self.1, rhs + self.2)
    }
}

impl ops::Mul<Point> for f32 {
    type Output = Point;

    fn mul(self, rhs: Point) -> Self::Output {
        Point {
            x: self * rhs.x,
            y: self * rhs.y,
        }
    }
}

impl ops::Mul<Quadratic> for f32 {
    type Output = Quadratic;

    fn mul(self, rhs: Quadratic) -> Self::Output {
        Quadratic(self * rhs.0, self * rhs.1, self * rhs.2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::rect_outline;
    use ttf_parser::OutlineBuilder;

    #[test]
    fn builder_closes_open_contours() {
        let mut b = Outline::builder(1.0);
        b.move_to(0.0, 0.0);
        b.line_to(10.0, 0.0);
        b.line_to(10.0, 10.0);
        // No explicit line back to the start, no close().
        let outline = b.build();
        assert_eq!(outline.contours().len(), 1);
        let edges = &outline.contours()[0].edges;
        assert_eq!(edges.len(), 3);
        assert_eq!(edges[2].curve.2, Point::new(0.0, 0.0));
    }

    #[test]
    fn bounds_include_the_origin() {
        let outline = rect_outline(5.0, 2.0, 25.0, 26.0);
        let b = outline.bounds();
        assert_eq!((b.x0, b.y0, b.x1, b.y1), (0.0, 0.0, 25.0, 26.0));

        let descender = rect_outline(1.0, -6.0, 9.0, 10.0);
        let b = descender.bounds();
        assert_eq!((b.x0, b.y0), (0.0, -6.0));
    }

    #[test]
    fn bounds_follow_the_curve_not_the_control_point() {
        let mut b = Outline::builder(1.0);
        b.move_to(0.0, 0.0);
        b.quad_to(5.0, 10.0, 10.0, 0.0);
        b.close();
        let outline = b.build();
        // The apex of the parabola is at y = 5.
        assert!((outline.bounds().y1 - 5.0).abs() < 1e-4);
    }

    #[test]
    fn empty_outline_has_zero_bounds() {
        let outline = Outline::builder(1.0).build();
        assert!(outline.is_empty());
        assert_eq!(outline.bounds(), Rect::default());
    }

    #[test]
    fn builder_applies_scale() {
        let mut b = Outline::builder(0.5);
        b.move_to(0.0, 0.0);
        b.line_to(40.0, 0.0);
        b.line_to(40.0, 20.0);
        b.close();
        let outline = b.build();
        assert_eq!(outline.bounds().width(), 20.0);
        assert_eq!(outline.bounds().height(), 10.0);
    }

    #[test]
    fn winding_inside_and_outside() {
        let outline = rect_outline(0.0, 0.0, 10.0, 10.0);
        assert!(outline.contains(Point::new(5.0, 5.0)));
        assert!(!outline.contains(Point::new(15.0, 5.0)));
        assert!(!outline.contains(Point::new(-1.0, 5.0)));
        assert!(!outline.contains(Point::new(5.0, 11.0)));
        // Scanline through a vertex.
        assert!(outline.contains(Point::new(5.0, 0.0 + 1e-3)));
        assert!(!outline.contains(Point::new(-5.0, 10.0)));
    }

    #[test]
    fn normalize_splits_single_edge_contours() {
        let mut b = Outline::builder(1.0);
        b.move_to(0.0, 0.0);
        b.quad_to(5.0, 10.0, 0.0, 0.0);
        let mut outline = b.build();
        assert_eq!(outline.contours()[0].edges.len(), 1);
        outline.normalize();
        let edges = &outline.contours()[0].edges;
        assert_eq!(edges.len(), 3);
        assert_eq!(edges[0].curve.0, Point::new(0.0, 0.0));
        assert_eq!(edges[2].curve.2, Point::new(0.0, 0.0));
    }

    #[test]
    fn distance_to_a_line() {
        let line = Quadratic::line(Point::new(0.0, 0.0), Point::new(10.0, 0.0));
        let (d, param) = line.signed_distance(Point::new(5.0, 3.0));
        assert!((d.distance.abs() - 3.0).abs() < 1e-4, "{:?}", d);
        assert!((param - 0.5).abs() < 1e-4);

        // Beyond the end point: true distance is to the end point, the pseudo
        // distance is to the extended line.
        let p = Point::new(13.0, 4.0);
        let (d, param) = line.signed_distance(p);
        assert!((d.distance.abs() - 5.0).abs() < 1e-4);
        assert!(param > 1.0);
        assert!((line.pseudo_distance(p, d, param).abs() - 4.0).abs() < 1e-4);
    }

    #[test]
    fn distance_sign_depends_on_side() {
        let line = Quadratic::line(Point::new(0.0, 0.0), Point::new(10.0, 0.0));
        let (above, _) = line.signed_distance(Point::new(5.0, 2.0));
        let (below, _) = line.signed_distance(Point::new(5.0, -2.0));
        assert!(above.distance * below.distance < 0.0);
    }

    #[test]
    fn cubic_pieces_stay_connected() {
        let mut b = Outline::builder(1.0);
        b.move_to(0.0, 0.0);
        b.curve_to(0.0, 10.0, 10.0, 10.0, 10.0, 0.0);
        b.close();
        let outline = b.build();
        let edges = &outline.contours()[0].edges;
        // Four quadratics plus the closing line.
        assert_eq!(edges.len(), 5);
        for pair in edges.windows(2) {
            assert_eq!(pair[0].curve.2, pair[1].curve.0);
        }
        // The cubic peaks at y = 7.5.
        assert!((outline.bounds().y1 - 7.5).abs() < 0.1, "{:?}", outline.bounds());
    }
}
