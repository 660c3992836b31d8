#![warn(missing_docs)]

//! B-spline, NURBS and Bezier curves for the vdraft kernel.
//!
//! Curves are stored the way CAD kernels hand them out: distinct knots with
//! multiplicities, optional weights, and an explicit periodic flag. All
//! algorithms run on an expanded ("open") form in homogeneous coordinates.
//!
//! # Key types
//!
//! - [`BSplineCurve`]: rational or polynomial, clamped or periodic B-spline
//! - [`BezierCurve`]: single-span Bezier produced by [`BSplineCurve::bezier_segments`]
//!
//! # Algorithms
//!
//! - **De Boor's algorithm** for evaluation
//! - **Boehm's algorithm** for knot insertion, used by [`BSplineCurve::segment`]
//! - exact rational quadratic conversion of circular and elliptical arcs

use std::f64::consts::FRAC_PI_2;

use thiserror::Error;
use vdraft_geom::{Circle3d, Curve3d, CurveKind, Ellipse3d};
use vdraft_math::{Point3, Transform, Vec3};

/// Errors raised by spline construction and restriction.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum NurbsError {
    /// Knots, multiplicities, poles or weights are inconsistent.
    #[error("invalid knot vector: {0}")]
    InvalidKnots(String),

    /// A restriction range is empty within the parametric tolerance.
    #[error("parameters {u1} and {u2} are closer than {tolerance}")]
    ParametersTooClose {
        /// Lower bound.
        u1: f64,
        /// Upper bound.
        u2: f64,
        /// Tolerance used for the comparison.
        tolerance: f64,
    },

    /// A parameter falls outside the curve's domain.
    #[error("parameter {u} is outside the curve domain [{min}, {max}]")]
    ParameterOutOfRange {
        /// Offending parameter.
        u: f64,
        /// Domain start.
        min: f64,
        /// Domain end.
        max: f64,
    },

    /// Degree zero curves are not supported.
    #[error("spline degree must be at least 1")]
    DegreeTooLow,
}

/// Result alias for spline operations.
pub type Result<T> = std::result::Result<T, NurbsError>;

// =============================================================================
// Knot vector utilities
// =============================================================================

/// Expand distinct knots and multiplicities into a flat knot vector.
fn expand_knots(knots: &[f64], mults: &[usize]) -> Vec<f64> {
    knots
        .iter()
        .zip(mults)
        .flat_map(|(&k, &m)| std::iter::repeat(k).take(m))
        .collect()
}

/// Collapse a flat knot vector into distinct knots and multiplicities.
fn collapse_knots(flat: &[f64]) -> (Vec<f64>, Vec<usize>) {
    let mut knots: Vec<f64> = Vec::new();
    let mut mults: Vec<usize> = Vec::new();
    for &k in flat {
        match knots.last() {
            Some(&last) if last == k => {
                if let Some(m) = mults.last_mut() {
                    *m += 1;
                }
            }
            _ => {
                knots.push(k);
                mults.push(1);
            }
        }
    }
    (knots, mults)
}

/// Find the knot span index for parameter `t`.
///
/// Returns `i` such that `knots[i] <= t < knots[i+1]`, clamped to the valid range.
fn find_span(knots: &[f64], n: usize, degree: usize, t: f64) -> usize {
    // n = number of control points - 1 (last index)
    if t >= knots[n + 1] {
        return n;
    }
    if t <= knots[degree] {
        return degree;
    }
    let mut low = degree;
    let mut high = n + 1;
    let mut mid = (low + high) / 2;
    while t < knots[mid] || t >= knots[mid + 1] {
        if t < knots[mid] {
            high = mid;
        } else {
            low = mid;
        }
        mid = (low + high) / 2;
    }
    mid
}

/// Non-zero basis function values `N[span-degree..=span]` at `t`.
fn basis_functions(knots: &[f64], span: usize, degree: usize, t: f64) -> Vec<f64> {
    let mut n = vec![0.0; degree + 1];
    let mut left = vec![0.0; degree + 1];
    let mut right = vec![0.0; degree + 1];
    n[0] = 1.0;

    for j in 1..=degree {
        left[j] = t - knots[span + 1 - j];
        right[j] = knots[span + j] - t;
        let mut saved = 0.0;
        for r in 0..j {
            let denom = right[r + 1] + left[j - r];
            if denom.abs() < 1e-30 {
                n[r] = saved;
                saved = 0.0;
                continue;
            }
            let temp = n[r] / denom;
            n[r] = saved + right[r + 1] * temp;
            saved = left[j - r] * temp;
        }
        n[j] = saved;
    }

    n
}

// =============================================================================
// Homogeneous control points
// =============================================================================

/// A weighted control point in homogeneous form `(w*x, w*y, w*z, w)`.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Homogeneous([f64; 4]);

impl Homogeneous {
    fn new(point: &Point3, weight: f64) -> Self {
        Self([weight * point.x, weight * point.y, weight * point.z, weight])
    }

    fn lerp(&self, other: &Self, alpha: f64) -> Self {
        let mut out = [0.0; 4];
        for (k, o) in out.iter_mut().enumerate() {
            *o = (1.0 - alpha) * self.0[k] + alpha * other.0[k];
        }
        Self(out)
    }

    fn weight(&self) -> f64 {
        self.0[3]
    }

    fn point(&self) -> Point3 {
        let w = self.0[3];
        if w.abs() < 1e-30 {
            return Point3::origin();
        }
        Point3::new(self.0[0] / w, self.0[1] / w, self.0[2] / w)
    }
}

/// Non-periodic working form: flat knots and homogeneous poles.
#[derive(Debug, Clone)]
struct OpenForm {
    knots: Vec<f64>,
    points: Vec<Homogeneous>,
    degree: usize,
}

impl OpenForm {
    fn last_index(&self) -> usize {
        self.points.len() - 1
    }

    fn domain(&self) -> (f64, f64) {
        (self.knots[self.degree], self.knots[self.points.len()])
    }

    fn eval(&self, t: f64) -> Point3 {
        let n = self.last_index();
        let p = self.degree;
        let (lo, hi) = self.domain();
        let t = t.clamp(lo, hi);
        let span = find_span(&self.knots, n, p, t);
        let basis = basis_functions(&self.knots, span, p, t);

        let mut h = [0.0; 4];
        for (i, &b) in basis.iter().enumerate() {
            let cp = &self.points[span - p + i];
            for (k, v) in h.iter_mut().enumerate() {
                *v += b * cp.0[k];
            }
        }
        Homogeneous(h).point()
    }

    fn multiplicity(&self, t: f64) -> usize {
        self.knots.iter().filter(|&&k| k == t).count()
    }

    /// Boehm knot insertion in homogeneous space.
    fn insert_knot(&mut self, t: f64) {
        let n = self.last_index();
        let p = self.degree;
        let span = find_span(&self.knots, n, p, t);

        let mut new_knots = Vec::with_capacity(self.knots.len() + 1);
        new_knots.extend_from_slice(&self.knots[..=span]);
        new_knots.push(t);
        new_knots.extend_from_slice(&self.knots[span + 1..]);

        let mut new_pts = Vec::with_capacity(self.points.len() + 1);
        new_pts.extend_from_slice(&self.points[..=span - p]);
        for i in (span - p + 1)..=span {
            let denom = self.knots[i + p] - self.knots[i];
            let alpha = if denom.abs() < 1e-30 {
                0.0
            } else {
                (t - self.knots[i]) / denom
            };
            new_pts.push(self.points[i - 1].lerp(&self.points[i], alpha));
        }
        new_pts.extend_from_slice(&self.points[span..]);

        self.knots = new_knots;
        self.points = new_pts;
    }

    /// Raise the multiplicity of `t` to at least `degree`.
    fn saturate(&mut self, t: f64) {
        let mut m = self.multiplicity(t);
        while m < self.degree {
            self.insert_knot(t);
            m += 1;
        }
    }

    /// Snap `t` onto an existing knot closer than `tol`.
    fn snap(&self, t: f64, tol: f64) -> f64 {
        self.knots
            .iter()
            .copied()
            .find(|k| (k - t).abs() < tol)
            .unwrap_or(t)
    }
}

// =============================================================================
// B-spline curve
// =============================================================================

/// A B-spline curve, optionally rational and optionally periodic.
///
/// Knots are stored as distinct values with multiplicities. For a periodic
/// curve the first and last knot bound one period and the pole list does not
/// repeat its wrap-around poles.
#[derive(Debug, Clone, PartialEq)]
pub struct BSplineCurve {
    poles: Vec<Point3>,
    weights: Option<Vec<f64>>,
    knots: Vec<f64>,
    mults: Vec<usize>,
    degree: usize,
    periodic: bool,
}

impl BSplineCurve {
    /// Create a curve from distinct knots and multiplicities.
    pub fn with_multiplicities(
        poles: Vec<Point3>,
        weights: Option<Vec<f64>>,
        knots: Vec<f64>,
        mults: Vec<usize>,
        degree: usize,
        periodic: bool,
    ) -> Result<Self> {
        if degree == 0 {
            return Err(NurbsError::DegreeTooLow);
        }
        if knots.len() != mults.len() || knots.len() < 2 {
            return Err(NurbsError::InvalidKnots(format!(
                "{} knots with {} multiplicities",
                knots.len(),
                mults.len()
            )));
        }
        if knots.windows(2).any(|w| w[1] <= w[0]) {
            return Err(NurbsError::InvalidKnots(
                "knots must be strictly increasing".into(),
            ));
        }
        if mults.iter().any(|&m| m == 0 || m > degree + 1) {
            return Err(NurbsError::InvalidKnots(format!(
                "multiplicities must lie in 1..={}",
                degree + 1
            )));
        }
        if let Some(w) = &weights {
            if w.len() != poles.len() {
                return Err(NurbsError::InvalidKnots(format!(
                    "{} weights for {} poles",
                    w.len(),
                    poles.len()
                )));
            }
            if w.iter().any(|&w| w <= 0.0) {
                return Err(NurbsError::InvalidKnots("weights must be positive".into()));
            }
        }

        let total: usize = mults.iter().sum();
        let (first, last) = (mults[0], mults[mults.len() - 1]);
        let expected = if periodic {
            if first != last {
                return Err(NurbsError::InvalidKnots(
                    "periodic end multiplicities must match".into(),
                ));
            }
            total - last
        } else {
            total - degree - 1
        };
        if poles.len() != expected {
            return Err(NurbsError::InvalidKnots(format!(
                "{} poles but the knots require {}",
                poles.len(),
                expected
            )));
        }
        if periodic && poles.len() < degree + 1 - first {
            return Err(NurbsError::InvalidKnots(
                "too few poles for a periodic curve".into(),
            ));
        }

        Ok(Self {
            poles,
            weights,
            knots,
            mults,
            degree,
            periodic,
        })
    }

    /// Create a non-periodic polynomial curve from a flat knot vector.
    pub fn new(poles: Vec<Point3>, knots: Vec<f64>, degree: usize) -> Result<Self> {
        Self::from_flat(poles, None, &knots, degree)
    }

    /// Create a non-periodic rational curve from a flat knot vector.
    pub fn rational(
        poles: Vec<Point3>,
        weights: Vec<f64>,
        knots: Vec<f64>,
        degree: usize,
    ) -> Result<Self> {
        Self::from_flat(poles, Some(weights), &knots, degree)
    }

    fn from_flat(
        poles: Vec<Point3>,
        weights: Option<Vec<f64>>,
        flat: &[f64],
        degree: usize,
    ) -> Result<Self> {
        if flat.windows(2).any(|w| w[1] < w[0]) {
            return Err(NurbsError::InvalidKnots(
                "knots must be non-decreasing".into(),
            ));
        }
        let (knots, mults) = collapse_knots(flat);
        Self::with_multiplicities(poles, weights, knots, mults, degree, false)
    }

    /// Create a clamped curve with uniform interior knots on `[0, 1]`.
    pub fn clamped_uniform(poles: Vec<Point3>, degree: usize) -> Result<Self> {
        if degree == 0 {
            return Err(NurbsError::DegreeTooLow);
        }
        if poles.len() < degree + 1 {
            return Err(NurbsError::InvalidKnots(format!(
                "degree {} needs at least {} poles",
                degree,
                degree + 1
            )));
        }
        let spans = poles.len() - degree;
        let mut knots = Vec::with_capacity(spans + 1);
        let mut mults = Vec::with_capacity(spans + 1);
        for i in 0..=spans {
            knots.push(i as f64 / spans as f64);
            mults.push(if i == 0 || i == spans { degree + 1 } else { 1 });
        }
        Self::with_multiplicities(poles, None, knots, mults, degree, false)
    }

    /// Control points (without periodic wrap-around copies).
    pub fn poles(&self) -> &[Point3] {
        &self.poles
    }

    /// Per-pole weights, present only for rational curves.
    pub fn weights(&self) -> Option<&[f64]> {
        self.weights.as_deref()
    }

    /// Distinct knot values.
    pub fn knots(&self) -> &[f64] {
        &self.knots
    }

    /// Multiplicity of each distinct knot.
    pub fn multiplicities(&self) -> &[usize] {
        &self.mults
    }

    /// Polynomial degree.
    pub fn degree(&self) -> usize {
        self.degree
    }

    /// Whether the pole sequence wraps around.
    pub fn is_periodic(&self) -> bool {
        self.periodic
    }

    /// Whether any weight differs from the others.
    pub fn is_rational(&self) -> bool {
        match &self.weights {
            Some(w) => w.iter().any(|&x| (x - w[0]).abs() > 1e-15),
            None => false,
        }
    }

    fn weight(&self, i: usize) -> f64 {
        self.weights.as_ref().map_or(1.0, |w| w[i])
    }

    /// Number of extra knots a periodic curve carries on each side of its
    /// period when written as an open knot vector.
    fn wrap_extent(&self) -> usize {
        if self.periodic {
            self.degree + 1 - self.mults[0]
        } else {
            0
        }
    }

    /// Flat knot sequence with multiplicities expanded.
    ///
    /// Periodic curves get their wrap-around knots on both ends, so the
    /// result has `poles + periodic_pad() + degree + 1` entries.
    pub fn knot_sequence(&self) -> Vec<f64> {
        let flat = expand_knots(&self.knots, &self.mults);
        if !self.periodic {
            return flat;
        }
        let e = self.wrap_extent();
        let period = self.knots[self.knots.len() - 1] - self.knots[0];
        let first = self.mults[0];
        let last = self.mults[self.mults.len() - 1];
        let body_end = flat.len() - last;

        let mut seq = Vec::with_capacity(flat.len() + 2 * e);
        seq.extend(flat[body_end - e..body_end].iter().map(|k| k - period));
        seq.extend_from_slice(&flat);
        seq.extend(flat[first..first + e].iter().map(|k| k + period));
        seq
    }

    /// One-based position, within [`knot_sequence`](Self::knot_sequence), of
    /// the last occurrence of the knot that closes the parameter domain.
    pub fn last_domain_knot_index(&self) -> usize {
        let seq = self.knot_sequence();
        let (_, hi) = self.parameter_domain();
        seq.iter().rposition(|&k| k == hi).map_or(seq.len(), |i| i + 1)
    }

    /// Number of leading poles a non-periodic consumer must append to
    /// reproduce the wrap-around. Zero for non-periodic curves.
    pub fn periodic_pad(&self) -> usize {
        if !self.periodic {
            return 0;
        }
        self.knot_sequence().len() - self.last_domain_knot_index()
    }

    /// Parameter domain `(t_min, t_max)`.
    pub fn parameter_domain(&self) -> (f64, f64) {
        if self.periodic {
            return (self.knots[0], self.knots[self.knots.len() - 1]);
        }
        let flat = expand_knots(&self.knots, &self.mults);
        (flat[self.degree], flat[self.poles.len()])
    }

    fn open_form(&self) -> OpenForm {
        let pad = self.wrap_extent();
        let points = self
            .poles
            .iter()
            .enumerate()
            .chain(self.poles.iter().enumerate().take(pad))
            .map(|(i, p)| Homogeneous::new(p, self.weight(i)))
            .collect();
        OpenForm {
            knots: self.knot_sequence(),
            points,
            degree: self.degree,
        }
    }

    fn from_open_form(&self, form: OpenForm) -> Result<Self> {
        let poles = form.points.iter().map(Homogeneous::point).collect();
        let weights = self
            .weights
            .as_ref()
            .map(|_| form.points.iter().map(Homogeneous::weight).collect());
        Self::from_flat(poles, weights, &form.knots, form.degree)
    }

    /// Evaluate the curve at parameter `t`.
    ///
    /// Periodic curves wrap `t` into their period; others clamp it.
    pub fn eval(&self, t: f64) -> Point3 {
        let t = if self.periodic {
            let (lo, hi) = self.parameter_domain();
            let period = hi - lo;
            let wrapped = lo + (t - lo).rem_euclid(period);
            if wrapped == lo && t > lo { hi } else { wrapped }
        } else {
            t
        };
        self.open_form().eval(t)
    }

    /// Insert a single knot, keeping the curve shape.
    pub fn insert_knot(&self, t: f64) -> Result<Self> {
        let (lo, hi) = self.parameter_domain();
        if t < lo || t > hi {
            return Err(NurbsError::ParameterOutOfRange {
                u: t,
                min: lo,
                max: hi,
            });
        }
        if self.periodic {
            return Err(NurbsError::InvalidKnots(
                "knot insertion on a periodic curve requires segmenting first".into(),
            ));
        }
        let mut form = self.open_form();
        form.insert_knot(t);
        self.from_open_form(form)
    }

    /// Restrict the curve to `[u1, u2]`.
    ///
    /// Parameters within `tol` of an existing knot or of the domain bounds
    /// are snapped onto them. Restricting a periodic curve to its whole
    /// period returns it unchanged; any other restriction yields a clamped,
    /// non-periodic curve whose end poles are the curve points at `u1` and `u2`.
    ///
    /// A periodic curve accepts any range no longer than one period: the
    /// range is shifted by whole periods to start inside the domain and may
    /// run past the seam.
    pub fn segment(&self, u1: f64, u2: f64, tol: f64) -> Result<Self> {
        if u2 - u1 < tol {
            return Err(NurbsError::ParametersTooClose {
                u1,
                u2,
                tolerance: tol,
            });
        }
        let (lo, hi) = self.parameter_domain();
        let (mut form, a, b) = if self.periodic {
            let period = hi - lo;
            if u2 - u1 > period + tol {
                return Err(NurbsError::ParameterOutOfRange {
                    u: u2,
                    min: u1,
                    max: u1 + period,
                });
            }
            let shift = ((u1 - lo + tol) / period).floor() * period;
            let (a, b) = (u1 - shift, u2 - shift);
            if (a - lo).abs() < tol && (b - hi).abs() < tol {
                return Ok(self.clone());
            }
            if b > hi + tol {
                (self.unrolled()?.open_form(), a, b)
            } else {
                (self.open_form(), a, b)
            }
        } else {
            for u in [u1, u2] {
                if u < lo - tol || u > hi + tol {
                    return Err(NurbsError::ParameterOutOfRange {
                        u,
                        min: lo,
                        max: hi,
                    });
                }
            }
            (self.open_form(), u1, u2)
        };

        let p = form.degree;
        let (lo, hi) = form.domain();
        let a = form.snap(a.clamp(lo, hi), tol);
        let b = form.snap(b.clamp(lo, hi), tol);
        if b - a < tol {
            return Err(NurbsError::ParametersTooClose {
                u1,
                u2,
                tolerance: tol,
            });
        }
        form.saturate(a);
        form.saturate(b);

        let last_a = form.knots.iter().rposition(|&k| k == a).unwrap_or(p);
        let first_b = form
            .knots
            .iter()
            .position(|&k| k == b)
            .unwrap_or(form.points.len());

        let points = form.points[last_a - p..first_b].to_vec();
        let mut knots = vec![a; p + 1];
        knots.extend_from_slice(&form.knots[last_a + 1..first_b]);
        knots.extend(std::iter::repeat(b).take(p + 1));

        self.from_open_form(OpenForm {
            knots,
            points,
            degree: p,
        })
    }

    /// The same periodic curve written over two periods, so a range that
    /// crosses the seam lies inside one domain.
    fn unrolled(&self) -> Result<Self> {
        let (lo, hi) = self.parameter_domain();
        let period = hi - lo;
        let mut knots = self.knots.clone();
        knots.extend(self.knots[1..].iter().map(|k| k + period));
        let mut mults = self.mults.clone();
        mults.extend_from_slice(&self.mults[1..]);
        let poles = [self.poles.as_slice(), self.poles.as_slice()].concat();
        let weights = self.weights.as_ref().map(|w| [w.as_slice(), w.as_slice()].concat());
        Self::with_multiplicities(poles, weights, knots, mults, self.degree, true)
    }

    /// Decompose `[u1, u2]` into consecutive Bezier spans.
    pub fn bezier_segments(&self, u1: f64, u2: f64, tol: f64) -> Result<Vec<BezierCurve>> {
        let restricted = self.segment(u1, u2, tol)?;
        let (lo, hi) = restricted.parameter_domain();

        let mut breaks = vec![lo];
        breaks.extend(
            restricted
                .knots
                .iter()
                .copied()
                .filter(|&k| k > lo + tol && k < hi - tol),
        );
        breaks.push(hi);

        breaks
            .windows(2)
            .map(|w| {
                let span = restricted.segment(w[0], w[1], tol)?;
                Ok(BezierCurve {
                    poles: span.poles,
                    weights: span.weights,
                })
            })
            .collect()
    }

    /// Approximate with a cubic curve.
    ///
    /// Curves of degree three or less are returned unchanged. Higher degrees
    /// are replaced by Hermite cubics over each knot span, split into
    /// `pieces_per_span` parts, joined with C1 continuity.
    pub fn approximate_cubic(&self, pieces_per_span: usize) -> Result<Self> {
        if self.degree <= 3 {
            return Ok(self.clone());
        }
        let (lo, hi) = self.parameter_domain();
        let pieces = pieces_per_span.max(1);

        let mut breaks = Vec::new();
        for w in self.knots.windows(2) {
            let (a, b) = (w[0].max(lo), w[1].min(hi));
            if b <= a {
                continue;
            }
            for i in 0..pieces {
                breaks.push(a + (b - a) * i as f64 / pieces as f64);
            }
        }
        breaks.push(hi);

        hermite_cubic(|t| self.eval(t), &breaks)
    }

    /// Apply an affine placement to the poles.
    pub fn transformed(&self, t: &Transform) -> Self {
        Self {
            poles: self.poles.iter().map(|p| t.apply_point(p)).collect(),
            ..self.clone()
        }
    }

    /// Degree-one curve from `start` to `end` over `[u1, u2]`.
    pub fn from_segment(start: Point3, end: Point3, u1: f64, u2: f64) -> Result<Self> {
        if u2 <= u1 {
            return Err(NurbsError::ParametersTooClose {
                u1,
                u2,
                tolerance: 0.0,
            });
        }
        Self::with_multiplicities(vec![start, end], None, vec![u1, u2], vec![2, 2], 1, false)
    }

    /// Exact rational quadratic form of a circular arc over `[u1, u2]`.
    pub fn from_circle_arc(circle: &Circle3d, u1: f64, u2: f64) -> Result<Self> {
        conic_arc(
            circle.center,
            circle.radius * circle.x_dir.as_ref(),
            circle.radius * circle.y_dir.as_ref(),
            u1,
            u2,
        )
    }

    /// Exact rational quadratic form of an elliptical arc over `[u1, u2]`.
    pub fn from_ellipse_arc(ellipse: &Ellipse3d, u1: f64, u2: f64) -> Result<Self> {
        conic_arc(
            ellipse.center,
            ellipse.major_radius * ellipse.x_dir.as_ref(),
            ellipse.minor_radius * ellipse.y_dir.as_ref(),
            u1,
            u2,
        )
    }
}

/// C1 cubic through `f` sampled at `breaks`, one Hermite piece per interval.
///
/// End tangents of each piece come from one-sided differences inside the
/// piece, so kinks at the breaks are preserved.
pub fn hermite_cubic(f: impl Fn(f64) -> Point3, breaks: &[f64]) -> Result<BSplineCurve> {
    if breaks.len() < 2 || breaks.windows(2).any(|w| w[1] <= w[0]) {
        return Err(NurbsError::InvalidKnots(
            "hermite breaks must be strictly increasing".into(),
        ));
    }
    let mut poles = Vec::with_capacity(3 * breaks.len());
    poles.push(f(breaks[0]));
    for w in breaks.windows(2) {
        let (a, b) = (w[0], w[1]);
        let h = b - a;
        let d = h * 1e-6;
        let start = f(a);
        let end = f(b);
        let d0: Vec3 = (f(a + d) - start) / d;
        let d1: Vec3 = (end - f(b - d)) / d;
        poles.push(start + d0 * (h / 3.0));
        poles.push(end - d1 * (h / 3.0));
        poles.push(end);
    }

    let mut mults = vec![3; breaks.len()];
    mults[0] = 4;
    if let Some(last) = mults.last_mut() {
        *last = 4;
    }
    BSplineCurve::with_multiplicities(poles, None, breaks.to_vec(), mults, 3, false)
}

/// Conic arc `center + cos(t) * xv + sin(t) * yv`, split into pieces of at
/// most a quarter turn, each an exact rational quadratic.
fn conic_arc(center: Point3, xv: Vec3, yv: Vec3, u1: f64, u2: f64) -> Result<BSplineCurve> {
    if u2 <= u1 {
        return Err(NurbsError::ParametersTooClose {
            u1,
            u2,
            tolerance: 0.0,
        });
    }
    let at = |t: f64| center + t.cos() * xv + t.sin() * yv;
    let pieces = ((u2 - u1) / FRAC_PI_2 - 1e-12).ceil().max(1.0) as usize;
    let step = (u2 - u1) / pieces as f64;
    let w = (step / 2.0).cos();

    let mut poles = vec![at(u1)];
    let mut weights = vec![1.0];
    let mut knots = vec![u1];
    let mut mults = vec![3];
    for i in 0..pieces {
        let a = u1 + step * i as f64;
        let b = if i + 1 == pieces { u2 } else { a + step };
        let mid = (a + b) / 2.0;
        poles.push(center + (mid.cos() * xv + mid.sin() * yv) / w);
        weights.push(w);
        poles.push(at(b));
        weights.push(1.0);
        knots.push(b);
        mults.push(2);
    }
    if let Some(last) = mults.last_mut() {
        *last = 3;
    }
    BSplineCurve::with_multiplicities(poles, Some(weights), knots, mults, 2, false)
}

impl Curve3d for BSplineCurve {
    fn evaluate(&self, t: f64) -> Point3 {
        self.eval(t)
    }

    fn tangent(&self, t: f64) -> Vec3 {
        let (t_min, t_max) = self.parameter_domain();
        let dt = (t_max - t_min) * 1e-7;
        let p0 = self.eval((t - dt).max(t_min));
        let p1 = self.eval((t + dt).min(t_max));
        (p1 - p0) / (2.0 * dt)
    }

    fn domain(&self) -> (f64, f64) {
        self.parameter_domain()
    }

    fn curve_type(&self) -> CurveKind {
        CurveKind::BSpline
    }

    fn is_periodic(&self) -> bool {
        self.periodic
    }

    fn clone_box(&self) -> Box<dyn Curve3d> {
        Box::new(self.clone())
    }
}

// =============================================================================
// Bezier curve
// =============================================================================

/// A single-span Bezier curve on the parameter range `[0, 1]`.
#[derive(Debug, Clone, PartialEq)]
pub struct BezierCurve {
    /// Control points; `degree + 1` of them.
    pub poles: Vec<Point3>,
    /// Per-pole weights for rational spans.
    pub weights: Option<Vec<f64>>,
}

impl BezierCurve {
    /// Polynomial Bezier curve.
    pub fn new(poles: Vec<Point3>) -> Self {
        Self {
            poles,
            weights: None,
        }
    }

    /// Number of control points.
    pub fn pole_count(&self) -> usize {
        self.poles.len()
    }

    /// Degree, `pole_count() - 1`.
    pub fn degree(&self) -> usize {
        self.poles.len().saturating_sub(1)
    }

    /// Whether the span carries non-uniform weights.
    pub fn is_rational(&self) -> bool {
        match &self.weights {
            Some(w) => w.iter().any(|&x| (x - w[0]).abs() > 1e-15),
            None => false,
        }
    }

    /// De Casteljau evaluation in homogeneous space.
    pub fn eval(&self, t: f64) -> Point3 {
        let mut pts: Vec<Homogeneous> = self
            .poles
            .iter()
            .enumerate()
            .map(|(i, p)| Homogeneous::new(p, self.weights.as_ref().map_or(1.0, |w| w[i])))
            .collect();
        if pts.is_empty() {
            return Point3::origin();
        }
        for level in (1..pts.len()).rev() {
            for i in 0..level {
                pts[i] = pts[i].lerp(&pts[i + 1], t);
            }
        }
        pts[0].point()
    }

    /// Clamped B-spline with a single span on `[0, 1]`.
    pub fn to_bspline(&self) -> Result<BSplineCurve> {
        let degree = self.degree();
        BSplineCurve::with_multiplicities(
            self.poles.clone(),
            self.weights.clone(),
            vec![0.0, 1.0],
            vec![degree + 1, degree + 1],
            degree,
            false,
        )
    }
}

impl Curve3d for BezierCurve {
    fn evaluate(&self, t: f64) -> Point3 {
        self.eval(t)
    }

    fn tangent(&self, t: f64) -> Vec3 {
        let dt = 1e-7;
        let p0 = self.eval((t - dt).max(0.0));
        let p1 = self.eval((t + dt).min(1.0));
        (p1 - p0) / (2.0 * dt)
    }

    fn domain(&self) -> (f64, f64) {
        (0.0, 1.0)
    }

    fn curve_type(&self) -> CurveKind {
        CurveKind::Bezier
    }

    fn clone_box(&self) -> Box<dyn Curve3d> {
        Box::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::{PI, TAU};

    const TOL: f64 = 1e-9;

    fn quadratic() -> BSplineCurve {
        let pts = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 2.0, 0.0),
            Point3::new(3.0, 2.0, 0.0),
            Point3::new(4.0, 0.0, 0.0),
        ];
        BSplineCurve::new(pts, vec![0.0, 0.0, 0.0, 0.5, 1.0, 1.0, 1.0], 2).unwrap()
    }

    /// Uniform periodic cubic through a square of poles.
    fn periodic_cubic() -> BSplineCurve {
        let pts = vec![
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(-1.0, 0.0, 0.0),
            Point3::new(0.0, -1.0, 0.0),
        ];
        BSplineCurve::with_multiplicities(
            pts,
            None,
            vec![0.0, 1.0, 2.0, 3.0, 4.0],
            vec![1; 5],
            3,
            true,
        )
        .unwrap()
    }

    fn assert_close(a: &Point3, b: &Point3) {
        assert!((a - b).norm() < 1e-9, "{a:?} != {b:?}");
    }

    #[test]
    fn test_line_eval() {
        let pts = vec![Point3::new(0.0, 0.0, 0.0), Point3::new(10.0, 0.0, 0.0)];
        let curve = BSplineCurve::new(pts, vec![0.0, 0.0, 1.0, 1.0], 1).unwrap();
        assert_relative_eq!(curve.eval(0.5).x, 5.0, epsilon = 1e-10);
        assert_eq!(curve.knots(), &[0.0, 1.0]);
        assert_eq!(curve.multiplicities(), &[2, 2]);
    }

    #[test]
    fn test_invalid_construction() {
        let pts = vec![Point3::origin(), Point3::new(1.0, 0.0, 0.0)];
        assert!(matches!(
            BSplineCurve::new(pts.clone(), vec![0.0, 0.0, 1.0], 1),
            Err(NurbsError::InvalidKnots(_))
        ));
        assert_eq!(
            BSplineCurve::new(pts.clone(), vec![0.0, 1.0], 0),
            Err(NurbsError::DegreeTooLow)
        );
        assert!(BSplineCurve::rational(pts, vec![1.0, -1.0], vec![0.0, 0.0, 1.0, 1.0], 1).is_err());
    }

    #[test]
    fn test_periodic_knot_sequence() {
        let c = periodic_cubic();
        assert_eq!(
            c.knot_sequence(),
            vec![-3.0, -2.0, -1.0, 0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0]
        );
        assert_eq!(c.periodic_pad(), 3);
        assert_eq!(c.knot_sequence().len(), c.poles().len() + c.periodic_pad() + 4);
        assert_eq!(c.parameter_domain(), (0.0, 4.0));
    }

    #[test]
    fn test_periodic_knot_sequence_with_multiplicity() {
        let pts = vec![
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(-1.0, 0.0, 0.0),
        ];
        let c = BSplineCurve::with_multiplicities(
            pts,
            None,
            vec![0.0, 1.0, 2.0],
            vec![2, 1, 2],
            2,
            true,
        )
        .unwrap();
        assert_eq!(c.knot_sequence(), vec![-1.0, 0.0, 0.0, 1.0, 2.0, 2.0, 3.0]);
        assert_eq!(c.periodic_pad(), 1);
    }

    #[test]
    fn test_clamped_pad_is_zero() {
        assert_eq!(quadratic().periodic_pad(), 0);
    }

    #[test]
    fn test_periodic_eval_wraps() {
        let c = periodic_cubic();
        assert_close(&c.eval(0.0), &c.eval(4.0));
        assert_close(&c.eval(0.5), &c.eval(4.5));
        // Uniform cubic at a knot: (P1 + 4 P2 + P3) / 6
        assert_close(&c.eval(1.0), &Point3::new(-4.0 / 6.0, 0.0, 0.0));
    }

    #[test]
    fn test_insert_knot_preserves_shape() {
        let c = quadratic();
        let refined = c.insert_knot(0.25).unwrap();
        assert_eq!(refined.poles().len(), 5);
        for i in 0..=10 {
            let t = i as f64 / 10.0;
            assert_close(&c.eval(t), &refined.eval(t));
        }
    }

    #[test]
    fn test_segment_endpoints_and_shape() {
        let c = quadratic();
        let s = c.segment(0.2, 0.8, TOL).unwrap();
        assert_eq!(s.parameter_domain(), (0.2, 0.8));
        assert_close(&s.poles()[0], &c.eval(0.2));
        assert_close(s.poles().last().unwrap(), &c.eval(0.8));
        for i in 0..=6 {
            let t = 0.2 + 0.1 * i as f64;
            assert_close(&s.eval(t), &c.eval(t));
        }
    }

    #[test]
    fn test_segment_snaps_near_knots() {
        let c = quadratic();
        let s = c.segment(1e-12, 0.5 + 1e-12, TOL).unwrap();
        assert_eq!(s.parameter_domain(), (0.0, 0.5));
    }

    #[test]
    fn test_segment_rejects_close_parameters() {
        let c = quadratic();
        assert!(matches!(
            c.segment(0.5, 0.5 + 1e-12, TOL),
            Err(NurbsError::ParametersTooClose { .. })
        ));
        assert!(matches!(
            c.segment(-1.0, 0.5, TOL),
            Err(NurbsError::ParameterOutOfRange { .. })
        ));
    }

    #[test]
    fn test_segment_of_periodic() {
        let c = periodic_cubic();
        let full = c.segment(0.0, 4.0, TOL).unwrap();
        assert!(full.is_periodic());

        let part = c.segment(0.5, 3.0, TOL).unwrap();
        assert!(!part.is_periodic());
        assert_close(&part.poles()[0], &c.eval(0.5));
        assert_close(part.poles().last().unwrap(), &c.eval(3.0));
        assert_close(&part.eval(1.7), &c.eval(1.7));
    }

    #[test]
    fn test_segment_collapsing_onto_knot() {
        let c = quadratic();
        assert!(matches!(
            c.segment(0.5 - 5e-10, 0.5 + 6e-10, TOL),
            Err(NurbsError::ParametersTooClose { .. })
        ));
    }

    #[test]
    fn test_segment_across_periodic_seam() {
        let c = periodic_cubic();
        for (u1, u2) in [(3.0, 5.0), (-1.0, 1.0), (2.5, 4.5)] {
            let s = c.segment(u1, u2, TOL).unwrap();
            assert!(!s.is_periodic());
            let (lo, hi) = s.parameter_domain();
            assert_relative_eq!(hi - lo, u2 - u1, epsilon = 1e-12);
            assert_close(&s.poles()[0], &c.eval(u1));
            assert_close(s.poles().last().unwrap(), &c.eval(u2));
            for i in 0..=8 {
                let t = i as f64 / 8.0;
                assert_close(&s.eval(lo + t * (hi - lo)), &c.eval(u1 + t * (u2 - u1)));
            }
        }
    }

    #[test]
    fn test_segment_shifted_by_period() {
        let c = periodic_cubic();
        let s = c.segment(4.5, 6.0, TOL).unwrap();
        assert_eq!(s.parameter_domain(), (0.5, 2.0));
        assert_close(&s.poles()[0], &c.eval(0.5));
        assert!(c.segment(4.0, 8.0, TOL).unwrap().is_periodic());
        assert!(matches!(
            c.segment(0.0, 4.5, TOL),
            Err(NurbsError::ParameterOutOfRange { .. })
        ));
    }

    #[test]
    fn test_bezier_segments_across_seam() {
        let c = periodic_cubic();
        let segs = c.bezier_segments(3.5, 4.5, TOL).unwrap();
        assert_eq!(segs.len(), 2);
        assert_close(&segs[0].poles[0], &c.eval(3.5));
        assert_close(segs[0].poles.last().unwrap(), &c.eval(0.0));
        assert_close(segs[1].poles.last().unwrap(), &c.eval(0.5));
    }

    #[test]
    fn test_bezier_segments_cover_range() {
        let c = quadratic();
        let segs = c.bezier_segments(0.1, 0.9, TOL).unwrap();
        assert_eq!(segs.len(), 2);
        assert!(segs.iter().all(|b| b.pole_count() == 3));
        assert_close(&segs[0].poles[0], &c.eval(0.1));
        assert_close(segs[0].poles.last().unwrap(), &segs[1].poles[0]);
        assert_close(&segs[0].eval(1.0), &c.eval(0.5));
        assert_close(segs[1].poles.last().unwrap(), &c.eval(0.9));
    }

    #[test]
    fn test_circle_arc_is_exact() {
        let circle = Circle3d::new(Point3::new(1.0, 2.0, 0.0), 3.0);
        let c = BSplineCurve::from_circle_arc(&circle, 0.0, TAU).unwrap();
        assert!(c.is_rational());
        assert_eq!(c.degree(), 2);
        for i in 0..=16 {
            let t = TAU * i as f64 / 16.0;
            let d = c.eval(t) - circle.center;
            assert_relative_eq!(d.norm(), 3.0, epsilon = 1e-9);
        }
        assert_close(&c.eval(PI / 3.0), &circle.evaluate(PI / 3.0));
    }

    #[test]
    fn test_ellipse_arc_endpoints() {
        let e = Ellipse3d::new(Point3::origin(), 4.0, 2.0, Vec3::x());
        let c = BSplineCurve::from_ellipse_arc(&e, 0.3, 2.5).unwrap();
        assert_close(&c.eval(0.3), &e.evaluate(0.3));
        assert_close(&c.eval(2.5), &e.evaluate(2.5));
        let p = c.eval(1.4);
        assert_relative_eq!(p.x * p.x / 16.0 + p.y * p.y / 4.0, 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_approximate_cubic_interpolates_breaks() {
        let pts: Vec<Point3> = (0..6)
            .map(|i| Point3::new(i as f64, ((i * i) % 5) as f64, 0.0))
            .collect();
        let quintic = BSplineCurve::clamped_uniform(pts, 5).unwrap();
        let cubic = quintic.approximate_cubic(4).unwrap();
        assert_eq!(cubic.degree(), 3);
        assert_close(&cubic.eval(0.0), &quintic.eval(0.0));
        assert_close(&cubic.eval(0.5), &quintic.eval(0.5));
        assert_close(&cubic.eval(1.0), &quintic.eval(1.0));
        assert!((cubic.eval(0.37) - quintic.eval(0.37)).norm() < 5e-2);
    }

    #[test]
    fn test_transformed_moves_poles() {
        let c = quadratic().transformed(&Transform::translation(0.0, 0.0, 5.0));
        assert!(c.poles().iter().all(|p| (p.z - 5.0).abs() < 1e-12));
    }

    #[test]
    fn test_bezier_to_bspline() {
        let b = BezierCurve::new(vec![
            Point3::origin(),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(2.0, 0.0, 0.0),
        ]);
        let s = b.to_bspline().unwrap();
        assert_close(&s.eval(0.5), &b.eval(0.5));
        assert_eq!(s.curve_type(), CurveKind::BSpline);
        assert_eq!(b.curve_type(), CurveKind::Bezier);
    }
}
