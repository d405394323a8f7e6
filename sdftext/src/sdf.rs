//! Multi-channel signed distance fields.
//!
//! Every edge of an outline is assigned a subset of the RGB channels so that
//! the two edges meeting at a sharp corner never share all of them. Each
//! channel then stores the (pseudo) distance to the nearest edge of its own
//! color, and the shader takes the median of the three. Corners survive
//! magnification instead of being rounded off like in a plain SDF.
use crate::outline::{Edge, EdgeColor, Outline, Point, SignedDistance};
use glm::Vec2;
use image::{Rgb, Rgb32FImage};

/// Turns an outline into a float RGB distance field of a fixed size.
///
/// Pixel `(x, row)` samples the shape at
/// `((x + 0.5) / scale.x - translate.x, (y + 0.5) / scale.y - translate.y)`
/// with `y = height - 1 - row`, i.e. rows are top-down while the outline is
/// y-up. Values are `distance / range + 0.5`, positive distances inside, and
/// are not clamped.
pub trait SdfRasterizer {
    fn rasterize(&self, outline: &Outline, scale: Vec2, translate: Vec2, size: (u32, u32))
        -> Rgb32FImage;
}

/// The built-in MSDF generator.
#[derive(Debug, Clone, Copy)]
pub struct Msdf {
    range: f32,
    angle_threshold: f32,
}

impl Default for Msdf {
    fn default() -> Self {
        Msdf {
            range: Msdf::RANGE,
            angle_threshold: Msdf::ANGLE_THRESHOLD,
        }
    }
}

impl Msdf {
    /// Width of the distance band, in outline units.
    pub const RANGE: f32 = 4.0;
    /// Edges meeting at a sharper angle than this (radians) form a corner.
    pub const ANGLE_THRESHOLD: f32 = 3.0;

    pub fn range(mut self, range: f32) -> Self {
        self.range = range;
        self
    }

    pub fn angle_threshold(mut self, angle: f32) -> Self {
        self.angle_threshold = angle;
        self
    }

    fn sample(&self, shape: &Outline, p: Point) -> [f32; 3] {
        let mut channels = [Nearest::default(); 3];
        let mut any = Nearest::default();

        for edge in shape.edges() {
            let (distance, param) = edge.curve.signed_distance(p);
            let candidate = Nearest {
                distance,
                edge: Some(edge),
                param,
            };
            for (nearest, channel) in channels
                .iter_mut()
                .zip([EdgeColor::RED, EdgeColor::GREEN, EdgeColor::BLUE])
            {
                if edge.color.has(channel) && distance.closer_than(&nearest.distance) {
                    *nearest = candidate;
                }
            }
            if distance.closer_than(&any.distance) {
                any = candidate;
            }
        }

        let fallback = any.pseudo_distance(p);
        let mut rgb = channels.map(|nearest| match nearest.edge {
            Some(_) => nearest.pseudo_distance(p),
            None => fallback,
        });

        // The per-edge signs only know the local side of each edge, the
        // winding rule knows the truth.
        if (median(rgb) > 0.0) != shape.contains(p) {
            rgb = rgb.map(|d| -d);
        }

        rgb.map(|d| d / self.range + 0.5)
    }
}

#[derive(Clone, Copy)]
struct Nearest<'a> {
    distance: SignedDistance,
    edge: Option<&'a Edge>,
    param: f32,
}

impl<'a> Default for Nearest<'a> {
    fn default() -> Self {
        Nearest {
            distance: SignedDistance::INFINITE,
            edge: None,
            param: 0.0,
        }
    }
}

impl<'a> Nearest<'a> {
    fn pseudo_distance(&self, p: Point) -> f32 {
        match self.edge {
            Some(edge) => edge.curve.pseudo_distance(p, self.distance, self.param),
            None => self.distance.distance,
        }
    }
}

fn median([a, b, c]: [f32; 3]) -> f32 {
    f32::max(f32::min(a, b), f32::min(f32::max(a, b), c))
}

impl SdfRasterizer for Msdf {
    fn rasterize(
        &self,
        outline: &Outline,
        scale: Vec2,
        translate: Vec2,
        (width, height): (u32, u32),
    ) -> Rgb32FImage {
        let mut image = Rgb32FImage::new(width, height);
        if outline.is_empty() {
            return image;
        }

        let mut shape = outline.clone();
        shape.normalize();
        color_edges(&mut shape, self.angle_threshold);

        for row in 0..height {
            let y = (height - 1 - row) as f32;
            for x in 0..width {
                let p = Point {
                    x: (x as f32 + 0.5) / scale.x - translate.x,
                    y: (y + 0.5) / scale.y - translate.y,
                };
                image.put_pixel(x, row, Rgb(self.sample(&shape, p)));
            }
        }
        image
    }
}

fn is_corner(a: Point, b: Point, cross_threshold: f32) -> bool {
    a.dot(b) <= 0.0 || a.cross(b).abs() > cross_threshold
}

/// Next color in the cycle cyan, magenta, yellow. White and black start
/// the cycle. When `banned` shares exactly one channel with `color`, the
/// result is the color made of the other two.
fn switch_color(color: EdgeColor, banned: EdgeColor) -> EdgeColor {
    let combined = EdgeColor(color.0 & banned.0);
    if matches!(combined, EdgeColor::RED | EdgeColor::GREEN | EdgeColor::BLUE) {
        return EdgeColor(combined.0 ^ EdgeColor::WHITE.0);
    }
    if color == EdgeColor::BLACK || color == EdgeColor::WHITE {
        return EdgeColor::CYAN;
    }
    let shifted = color.0 << 1;
    EdgeColor((shifted | shifted >> 3) & EdgeColor::WHITE.0)
}

/// Assigns channels to edges so that no two edges meeting at a corner share
/// the same color. Contours without corners stay white.
pub fn color_edges(outline: &mut Outline, angle_threshold: f32) {
    let cross_threshold = f32::sin(angle_threshold);

    for contour in outline.contours_mut() {
        let edges = &mut contour.edges;
        let Some(last) = edges.last() else {
            continue;
        };

        let mut corners = vec![];
        let mut prev = last.curve.direction(1.0);
        for (i, edge) in edges.iter().enumerate() {
            let dir = edge.curve.direction(0.0);
            if is_corner(prev.normalize(), dir.normalize(), cross_threshold) {
                corners.push(i);
            }
            prev = edge.curve.direction(1.0);
        }

        match corners[..] {
            [] => {
                for edge in edges.iter_mut() {
                    edge.color = EdgeColor::WHITE;
                }
            }
            // Teardrop: a single corner, spread three colors around it.
            [corner] => {
                let first = switch_color(EdgeColor::WHITE, EdgeColor::BLACK);
                let colors = [first, EdgeColor::WHITE, switch_color(first, EdgeColor::BLACK)];
                let m = edges.len();
                if m >= 3 {
                    for i in 0..m {
                        let t = 2.875 * i as f32 / (m - 1) as f32 - 1.4375 + 0.5;
                        let c = (3.0 + t).floor() as usize - 2;
                        edges[(corner + i) % m].color = colors[c];
                    }
                } else {
                    // Too few edges for three colors, split them up.
                    let mut parts: Vec<_> = edges.iter().map(|e| e.curve.split_in_thirds()).collect();
                    if corner == 1 {
                        parts.rotate_left(1);
                    }
                    let parts: Vec<_> = parts.into_iter().flatten().collect();
                    let per_color = parts.len() / 3;
                    *edges = parts
                        .into_iter()
                        .enumerate()
                        .map(|(i, curve)| Edge {
                            curve,
                            color: colors[i / per_color],
                        })
                        .collect();
                }
            }
            _ => {
                let m = edges.len();
                let start = corners[0];
                let mut spline = 0;
                let mut color = switch_color(EdgeColor::WHITE, EdgeColor::BLACK);
                let initial = color;
                for i in 0..m {
                    let index = (start + i) % m;
                    if spline + 1 < corners.len() && corners[spline + 1] == index {
                        spline += 1;
                        let banned = if spline == corners.len() - 1 {
                            initial
                        } else {
                            EdgeColor::BLACK
                        };
                        color = switch_color(color, banned);
                    }
                    edges[index].color = color;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::rect_outline;
    use ttf_parser::OutlineBuilder;

    fn circle() -> Outline {
        let mut b = Outline::builder(1.0);
        b.move_to(10.0, 0.0);
        b.quad_to(10.0, 10.0, 0.0, 10.0);
        b.quad_to(-10.0, 10.0, -10.0, 0.0);
        b.quad_to(-10.0, -10.0, 0.0, -10.0);
        b.quad_to(10.0, -10.0, 10.0, 0.0);
        b.close();
        b.build()
    }

    #[test]
    fn color_cycle() {
        assert_eq!(switch_color(EdgeColor::WHITE, EdgeColor::BLACK), EdgeColor::CYAN);
        assert_eq!(switch_color(EdgeColor::CYAN, EdgeColor::BLACK), EdgeColor::MAGENTA);
        assert_eq!(switch_color(EdgeColor::MAGENTA, EdgeColor::BLACK), EdgeColor::YELLOW);
        assert_eq!(switch_color(EdgeColor::YELLOW, EdgeColor::BLACK), EdgeColor::CYAN);
        // Yellow and cyan share green, so the result avoids green.
        assert_eq!(switch_color(EdgeColor::YELLOW, EdgeColor::CYAN), EdgeColor::MAGENTA);
    }

    #[test]
    fn corners_get_distinct_colors() {
        let mut outline = rect_outline(0.0, 0.0, 10.0, 10.0);
        color_edges(&mut outline, Msdf::ANGLE_THRESHOLD);
        let edges = &outline.contours()[0].edges;
        assert_eq!(edges.len(), 4);
        for i in 0..edges.len() {
            let next = (i + 1) % edges.len();
            assert_ne!(edges[i].color, edges[next].color, "edges {} and {}", i, next);
        }
        // Every channel is carried by at least two edges.
        for channel in [EdgeColor::RED, EdgeColor::GREEN, EdgeColor::BLUE] {
            assert!(edges.iter().filter(|e| e.color.has(channel)).count() >= 2);
        }
    }

    #[test]
    fn smooth_contours_are_white() {
        let mut outline = circle();
        color_edges(&mut outline, Msdf::ANGLE_THRESHOLD);
        assert!(outline.edges().all(|e| e.color == EdgeColor::WHITE));
    }

    #[test]
    fn teardrop_spreads_three_colors() {
        // A right angle at (0, 0), smooth at (0, 20).
        let mut b = Outline::builder(1.0);
        b.move_to(0.0, 0.0);
        b.quad_to(20.0, 20.0, 0.0, 20.0);
        b.quad_to(-20.0, 20.0, 0.0, 0.0);
        b.close();
        let mut outline = b.build();
        color_edges(&mut outline, Msdf::ANGLE_THRESHOLD);
        let edges = &outline.contours()[0].edges;
        // Two edges are too few for three colors, both got split in thirds.
        assert_eq!(edges.len(), 6);
        assert_ne!(edges[0].color, edges[edges.len() - 1].color);
        assert_eq!(edges[0].color, EdgeColor::CYAN);
        assert_eq!(edges[edges.len() - 1].color, EdgeColor::MAGENTA);
    }

    #[test]
    fn inside_is_bright_outside_is_dark() {
        let outline = rect_outline(0.0, 0.0, 20.0, 20.0);
        let msdf = Msdf::default();
        let image = msdf.rasterize(&outline, Vec2::new(1.0, 1.0), Vec2::new(2.0, 2.0), (24, 24));

        let center = image.get_pixel(12, 12).0;
        assert!(median(center) > 0.5, "{:?}", center);

        for (x, y) in [(0, 0), (23, 0), (0, 23), (23, 23)] {
            let corner = image.get_pixel(x, y).0;
            assert!(median(corner) < 0.5, "({}, {}): {:?}", x, y, corner);
        }
    }

    #[test]
    fn clockwise_contours_have_the_same_sign() {
        let mut b = Outline::builder(1.0);
        b.move_to(0.0, 0.0);
        b.line_to(0.0, 20.0);
        b.line_to(20.0, 20.0);
        b.line_to(20.0, 0.0);
        b.close();
        let cw = b.build();
        let ccw = rect_outline(0.0, 0.0, 20.0, 20.0);

        let msdf = Msdf::default();
        let scale = Vec2::new(1.0, 1.0);
        let translate = Vec2::new(2.0, 2.0);
        let a = msdf.rasterize(&cw, scale, translate, (24, 24));
        let b = msdf.rasterize(&ccw, scale, translate, (24, 24));
        for (p, q) in a.pixels().zip(b.pixels()) {
            assert_eq!(median(p.0) > 0.5, median(q.0) > 0.5);
        }
    }

    #[test]
    fn rows_are_top_down() {
        // A box in the upper half of the cell only.
        let outline = rect_outline(0.0, 12.0, 24.0, 24.0);
        let image = Msdf::default().rasterize(
            &outline,
            Vec2::new(1.0, 1.0),
            Vec2::new(0.0, 0.0),
            (24, 24),
        );
        assert!(median(image.get_pixel(12, 4).0) > 0.5);
        assert!(median(image.get_pixel(12, 20).0) < 0.5);
    }

    #[test]
    fn distance_is_scaled_by_range() {
        let outline = rect_outline(0.0, 0.0, 20.0, 20.0);
        let image = Msdf::default().rasterize(
            &outline,
            Vec2::new(1.0, 1.0),
            Vec2::new(2.0, 2.0),
            (24, 24),
        );
        // Pixel (12, row 12) samples (10.5, 9.5) in shape units: 9.5 from
        // the bottom edge. The median is the true distance there.
        let px = image.get_pixel(12, 12).0;
        let expected = 9.5 / Msdf::RANGE + 0.5;
        assert!((median(px) - expected).abs() < 1e-3, "{:?}", px);
    }

    #[test]
    fn empty_outline_rasterizes_to_zero() {
        let image = Msdf::default().rasterize(
            &Outline::empty(),
            Vec2::new(1.0, 1.0),
            Vec2::new(0.0, 0.0),
            (4, 4),
        );
        assert!(image.pixels().all(|p| p.0 == [0.0; 3]));
    }
}
