//! Fits shared by the interpolation algorithms.
//!
//! Every function assumes keys sorted by position with strictly
//! increasing finite coordinates; the loader enforces that before any
//! curve is evaluated.

/// Lagrange evaluation of the single polynomial through all keys.
pub(crate) fn lagrange_value(xs: &[f64], ys: &[f64], x: f64) -> f64 {
    let mut acc = 0.0;
    for i in 0..xs.len() {
        let mut basis = 1.0;
        for j in 0..xs.len() {
            if i != j {
                basis *= (x - xs[j]) / (xs[i] - xs[j]);
            }
        }
        acc += ys[i] * basis;
    }
    acc
}

/// Starting slopes of the C1 piecewise-quadratic fit. The first segment
/// starts flat; every later slope is forced by slope continuity at the
/// shared key.
pub(crate) fn quadratic_slopes(xs: &[f64], ys: &[f64]) -> Vec<f64> {
    let n = xs.len();
    let mut z = vec![0.0; n];
    for i in 0..n - 1 {
        let h = xs[i + 1] - xs[i];
        z[i + 1] = 2.0 * (ys[i + 1] - ys[i]) / h - z[i];
    }
    z
}

pub(crate) fn quadratic_eval(xs: &[f64], ys: &[f64], z: &[f64], seg: usize, x: f64) -> f64 {
    let h = xs[seg + 1] - xs[seg];
    let s = x - xs[seg];
    let c = ((ys[seg + 1] - ys[seg]) / h - z[seg]) / h;
    ys[seg] + z[seg] * s + c * s * s
}

/// Second derivatives of the interpolating cubic spline, via the Thomas
/// solve of the standard tridiagonal system. `start`/`end` clamp the
/// boundary slope when given; a `None` end is natural (zero curvature).
pub(crate) fn cubic_moments(
    xs: &[f64],
    ys: &[f64],
    start: Option<f64>,
    end: Option<f64>,
) -> Vec<f64> {
    let n = xs.len();
    let mut diag = vec![0.0; n];
    let mut upper = vec![0.0; n];
    let mut lower = vec![0.0; n];
    let mut rhs = vec![0.0; n];

    match start {
        Some(d0) => {
            let h = xs[1] - xs[0];
            diag[0] = 2.0 * h;
            upper[0] = h;
            rhs[0] = 6.0 * ((ys[1] - ys[0]) / h - d0);
        }
        None => diag[0] = 1.0,
    }
    for i in 1..n - 1 {
        let ha = xs[i] - xs[i - 1];
        let hb = xs[i + 1] - xs[i];
        lower[i] = ha;
        diag[i] = 2.0 * (ha + hb);
        upper[i] = hb;
        rhs[i] = 6.0 * ((ys[i + 1] - ys[i]) / hb - (ys[i] - ys[i - 1]) / ha);
    }
    match end {
        Some(dn) => {
            let h = xs[n - 1] - xs[n - 2];
            lower[n - 1] = h;
            diag[n - 1] = 2.0 * h;
            rhs[n - 1] = 6.0 * (dn - (ys[n - 1] - ys[n - 2]) / h);
        }
        None => diag[n - 1] = 1.0,
    }

    // Thomas forward sweep.
    for i in 1..n {
        let w = lower[i] / diag[i - 1];
        diag[i] -= w * upper[i - 1];
        rhs[i] -= w * rhs[i - 1];
    }
    let mut m = vec![0.0; n];
    m[n - 1] = rhs[n - 1] / diag[n - 1];
    for i in (0..n - 1).rev() {
        m[i] = (rhs[i] - upper[i] * m[i + 1]) / diag[i];
    }
    m
}

pub(crate) fn cubic_eval(xs: &[f64], ys: &[f64], m: &[f64], seg: usize, x: f64) -> f64 {
    let h = xs[seg + 1] - xs[seg];
    let a = xs[seg + 1] - x;
    let b = x - xs[seg];
    (m[seg] * a * a * a + m[seg + 1] * b * b * b) / (6.0 * h)
        + (ys[seg] / h - m[seg] * h / 6.0) * a
        + (ys[seg + 1] / h - m[seg + 1] * h / 6.0) * b
}

/// Slope estimates from centered differences, one-sided at the ends.
/// An explicit derivative on a key wins over the estimate.
pub(crate) fn difference_slopes(xs: &[f64], ys: &[f64], derivs: &[Option<f64>]) -> Vec<f64> {
    let n = xs.len();
    let mut m = vec![0.0; n];
    for i in 0..n {
        if let Some(d) = derivs[i] {
            m[i] = d;
            continue;
        }
        m[i] = if i == 0 {
            (ys[1] - ys[0]) / (xs[1] - xs[0])
        } else if i == n - 1 {
            (ys[n - 1] - ys[n - 2]) / (xs[n - 1] - xs[n - 2])
        } else {
            (ys[i + 1] - ys[i - 1]) / (xs[i + 1] - xs[i - 1])
        };
    }
    m
}

/// Cubic Hermite basis evaluation on one segment.
pub(crate) fn hermite_eval(x0: f64, x1: f64, y0: f64, y1: f64, m0: f64, m1: f64, x: f64) -> f64 {
    let h = x1 - x0;
    let t = (x - x0) / h;
    let t2 = t * t;
    let t3 = t2 * t;
    let h00 = 2.0 * t3 - 3.0 * t2 + 1.0;
    let h10 = t3 - 2.0 * t2 + t;
    let h01 = -2.0 * t3 + 3.0 * t2;
    let h11 = t3 - t2;
    h00 * y0 + h10 * h * m0 + h01 * y1 + h11 * h * m1
}

/// Fritsch-Carlson shape-preserving slopes. Interior slopes use the
/// weighted harmonic mean of adjacent secants and drop to zero where the
/// secants change sign, which keeps monotone data monotone.
pub(crate) fn pchip_slopes(xs: &[f64], ys: &[f64]) -> Vec<f64> {
    let n = xs.len();
    if n == 2 {
        let d = (ys[1] - ys[0]) / (xs[1] - xs[0]);
        return vec![d, d];
    }
    let h: Vec<f64> = (0..n - 1).map(|i| xs[i + 1] - xs[i]).collect();
    let d: Vec<f64> = (0..n - 1).map(|i| (ys[i + 1] - ys[i]) / h[i]).collect();

    let mut m = vec![0.0; n];
    for i in 1..n - 1 {
        if d[i - 1] * d[i] <= 0.0 {
            m[i] = 0.0;
        } else {
            let w1 = 2.0 * h[i] + h[i - 1];
            let w2 = h[i] + 2.0 * h[i - 1];
            m[i] = (w1 + w2) / (w1 / d[i - 1] + w2 / d[i]);
        }
    }
    m[0] = pchip_end_slope(h[0], h[1], d[0], d[1]);
    m[n - 1] = pchip_end_slope(h[n - 2], h[n - 3], d[n - 2], d[n - 3]);
    m
}

/// One-sided three-point end slope with the clips that keep the end
/// segment shape-preserving.
fn pchip_end_slope(h0: f64, h1: f64, d0: f64, d1: f64) -> f64 {
    let m = ((2.0 * h0 + h1) * d0 - h0 * d1) / (h0 + h1);
    if m * d0 <= 0.0 {
        0.0
    } else if d0 * d1 <= 0.0 && m.abs() > 3.0 * d0.abs() {
        3.0 * d0
    } else {
        m
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const XS: [f64; 4] = [0.0, 1.0, 2.0, 4.0];

    #[test]
    fn lagrange_reproduces_polynomial_data() {
        // y = x^2 - 3x + 2 sampled at four points; the cubic fit through
        // them is the parabola itself.
        let ys: Vec<f64> = XS.iter().map(|x| x * x - 3.0 * x + 2.0).collect();
        for x in [0.5, 1.5, 3.0, 3.9] {
            let want = x * x - 3.0 * x + 2.0;
            assert!((lagrange_value(&XS, &ys, x) - want).abs() < 1e-9);
        }
    }

    #[test]
    fn quadratic_first_segment_starts_flat() {
        let xs = [0.0, 1.0, 2.0];
        let ys = [0.0, 1.0, 0.0];
        let z = quadratic_slopes(&xs, &ys);
        assert_eq!(z[0], 0.0);
        // A flat start makes the first segment y = x^2 here.
        assert!((quadratic_eval(&xs, &ys, &z, 0, 0.5) - 0.25).abs() < 1e-12);
        let eps = 1e-6;
        let slope = (quadratic_eval(&xs, &ys, &z, 0, eps) - ys[0]) / eps;
        assert!(slope.abs() < 1e-5);
    }

    #[test]
    fn quadratic_is_slope_continuous_at_keys() {
        let ys = [0.0, 2.0, 1.0, 5.0];
        let z = quadratic_slopes(&XS, &ys);
        let eps = 1e-6;
        for seg in 0..2 {
            let left = (quadratic_eval(&XS, &ys, &z, seg, XS[seg + 1] - eps)
                - quadratic_eval(&XS, &ys, &z, seg, XS[seg + 1] - 2.0 * eps))
                / eps;
            let right = (quadratic_eval(&XS, &ys, &z, seg + 1, XS[seg + 1] + 2.0 * eps)
                - quadratic_eval(&XS, &ys, &z, seg + 1, XS[seg + 1] + eps))
                / eps;
            assert!((left - right).abs() < 1e-4);
        }
    }

    #[test]
    fn natural_cubic_with_two_keys_is_linear() {
        let xs = [0.0, 2.0];
        let ys = [1.0, 5.0];
        let m = cubic_moments(&xs, &ys, None, None);
        assert_eq!(m, vec![0.0, 0.0]);
        assert!((cubic_eval(&xs, &ys, &m, 0, 0.5) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn cubic_passes_through_keys_and_honors_clamped_ends() {
        let ys = [0.0, 1.0, -1.0, 3.0];
        let m = cubic_moments(&XS, &ys, None, None);
        for i in 0..3 {
            assert!((cubic_eval(&XS, &ys, &m, i, XS[i]) - ys[i]).abs() < 1e-9);
            assert!((cubic_eval(&XS, &ys, &m, i, XS[i + 1]) - ys[i + 1]).abs() < 1e-9);
        }

        // A clamped start forces the boundary slope.
        let m = cubic_moments(&XS, &ys, Some(0.0), None);
        let eps = 1e-7;
        let slope = (cubic_eval(&XS, &ys, &m, 0, eps) - cubic_eval(&XS, &ys, &m, 0, 0.0)) / eps;
        assert!(slope.abs() < 1e-4);
    }

    #[test]
    fn difference_slopes_prefer_explicit_derivatives() {
        let ys = [0.0, 1.0, 2.0, 4.0];
        let m = difference_slopes(&XS, &ys, &[None, Some(9.0), None, None]);
        assert_eq!(m[1], 9.0);
        assert!((m[0] - 1.0).abs() < 1e-12);
        assert!((m[3] - 1.0).abs() < 1e-12);
        // Centered difference at the third key spans keys 1 and 3.
        assert!((m[2] - (4.0 - 1.0) / 3.0).abs() < 1e-12);
    }

    #[test]
    fn pchip_keeps_monotone_data_monotone() {
        let xs = [0.0, 1.0, 2.0, 3.0, 4.0];
        let ys = [0.0, 0.1, 0.9, 1.0, 1.0];
        let m = pchip_slopes(&xs, &ys);
        let mut prev = f64::NEG_INFINITY;
        for step in 0..=400 {
            let x = 4.0 * f64::from(step) / 400.0;
            let seg = xs.partition_point(|&k| k <= x).saturating_sub(1).min(3);
            let v = hermite_eval(xs[seg], xs[seg + 1], ys[seg], ys[seg + 1], m[seg], m[seg + 1], x);
            assert!(v >= prev - 1e-12, "overshoot at x={x}: {v} < {prev}");
            assert!((-1e-12..=1.0 + 1e-12).contains(&v));
            prev = v;
        }
    }

    #[test]
    fn pchip_slope_is_zero_at_local_extrema() {
        let xs = [0.0, 1.0, 2.0];
        let ys = [0.0, 1.0, 0.0];
        let m = pchip_slopes(&xs, &ys);
        assert_eq!(m[1], 0.0);
    }
}
