//! Polynomials.
//!
//! Just enough to find the parameters of interest on a quadratic Bézier:
//! where it crosses a scanline (quadratic roots) and where it comes closest to
//! a point (cubic roots).
use crate::approx;
use std::f32::consts::PI;

/// Polynomial with N coefficients over f32. The index of a coefficient is its power.
#[derive(Debug, Clone, Copy)]
pub struct Poly<const N: usize>(pub [f32; N]);

impl<const N: usize> Poly<N> {
    /// Evaluate P at t.
    pub fn at(&self, t: f32) -> f32 {
        // Horner's scheme, highest power first.
        self.0.iter().rev().fold(0.0, |acc, coeff| acc * t + coeff)
    }
}

impl Poly<4> {
    /// Real roots of c + bt + at² + dt³.
    pub fn solve(&self) -> Vec<f32> {
        let [c, b, a, d] = self.0;
        solve_cubic(c, b, a, d)
    }
}

impl Poly<3> {
    /// Real roots of c + bt + at².
    pub fn solve(&self) -> Vec<f32> {
        let [c, b, a] = self.0;
        solve_quadratic(c, b, a)
    }
}

/// Solve P(x) = 0 for some polynomial P = ax² + bx + c.
///
/// A double root is reported once. Degenerate (linear or constant) polynomials
/// are handled, a constant has no roots.
pub fn solve_quadratic(c: f32, b: f32, a: f32) -> Vec<f32> {
    // If a is small, dividing by it is dangerous.
    if approx(0.0, a) {
        if approx(0.0, b) {
            return vec![];
        }
        return vec![-c / b];
    }

    let delta = b * b - 4.0 * a * c;

    if delta > 0.0 {
        let sq = f32::sqrt(delta);
        return vec![(-b - sq) / (2.0 * a), (-b + sq) / (2.0 * a)];
    }

    if delta == 0.0 {
        return vec![-b / (2.0 * a)];
    }

    vec![]
}

/// Solve P(x) = 0 for some polynomial P = dx³ + ax² + bx + c.
pub fn solve_cubic(c: f32, b: f32, a: f32, d: f32) -> Vec<f32> {
    if approx(0.0, d) {
        return solve_quadratic(c, b, a);
    }

    // Normalize to x³ + ax² + bx + c.
    let c = c / d;
    let b = b / d;
    let a = a / d;

    // Depressed cubic s³ + ps + q with x = s - a/3.
    let p = (3.0 * b - a.powi(2)) / 3.0;
    let q = (2.0 * a.powi(3) - 9.0 * a * b + 27.0 * c) / 27.0;
    let shift = a / 3.0;

    let delta = q.powi(2) / 4.0 + p.powi(3) / 27.0;

    if delta == 0.0 {
        // One simple root and one double root (or a triple root at p = q = 0).
        let u = (-q / 2.0).cbrt();
        return vec![2.0 * u - shift, -u - shift];
    }

    if delta > 0.0 {
        // One real root.
        let u = (-(q / 2.0) + delta.sqrt()).cbrt();
        let v = (-(q / 2.0) - delta.sqrt()).cbrt();
        return vec![u + v - shift];
    }

    // Three real roots, trigonometric form.
    let r = f32::sqrt(-p.powi(3) / 27.0);
    let phi = f32::atan2(f32::sqrt(-delta), -q / 2.0);
    let m = 2.0 * r.cbrt();

    vec![
        m * f32::cos(phi / 3.0) - shift,
        m * f32::cos((phi + 2.0 * PI) / 3.0) - shift,
        m * f32::cos((phi + 4.0 * PI) / 3.0) - shift,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contains(roots: &[f32], x: f32) -> bool {
        roots.iter().any(|r| (r - x).abs() < 1e-3)
    }

    #[test]
    fn quadratic_two_roots() {
        // (x - 1)(x - 3) = x² - 4x + 3
        let roots = Poly([3.0, -4.0, 1.0]).solve();
        assert_eq!(roots.len(), 2);
        assert!(contains(&roots, 1.0) && contains(&roots, 3.0), "{:?}", roots);
    }

    #[test]
    fn quadratic_degenerates_to_linear() {
        let roots = solve_quadratic(-2.0, 4.0, 0.0);
        assert_eq!(roots, vec![0.5]);
        assert!(solve_quadratic(1.0, 0.0, 0.0).is_empty());
    }

    #[test]
    fn cubic_three_roots() {
        // (x - 0.25)(x - 0.5)(x - 0.75)
        let roots = Poly([-0.09375, 0.6875, -1.5, 1.0]).solve();
        for x in [0.25, 0.5, 0.75] {
            assert!(contains(&roots, x), "missing {} in {:?}", x, roots);
        }
    }

    #[test]
    fn cubic_one_root() {
        // x³ + x - 2 has the single real root 1.
        let roots = solve_cubic(-2.0, 1.0, 0.0, 1.0);
        assert_eq!(roots.len(), 1);
        assert!(contains(&roots, 1.0));
    }

    #[test]
    fn horner_matches_powers() {
        let p = Poly([1.0, 2.0, 3.0]);
        assert_eq!(p.at(2.0), 1.0 + 4.0 + 12.0);
    }
}
