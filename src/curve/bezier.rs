use super::{CurveKey, fit};

/// Cubic bezier across one segment. Control points come from the left
/// key's `cp` when present, as absolute `[x1, y1, x2, y2]` pairs in
/// position/value space; otherwise they are placed a third of the way
/// along the finite-difference tangents, which reproduces the Hermite
/// cubic through the same keys.
pub(crate) fn bezier_value(keys: &[CurveKey], seg: usize, x: f64) -> f64 {
    let a = keys[seg];
    let b = keys[seg + 1];
    let [x1, y1, x2, y2] = match a.cp {
        Some(cp) => cp,
        None => auto_control_points(keys, seg),
    };

    let h = b.position - a.position;
    // The x axis is normalized to [0,1] so the solver sees the classic
    // easing form; values stay in curve space.
    let u = solve_x((x - a.position) / h, (x1 - a.position) / h, (x2 - a.position) / h);
    bezier_at(a.value, y1, y2, b.value, u)
}

fn auto_control_points(keys: &[CurveKey], seg: usize) -> [f64; 4] {
    let xs: Vec<f64> = keys.iter().map(|k| k.position).collect();
    let ys: Vec<f64> = keys.iter().map(|k| k.value).collect();
    let derivs: Vec<Option<f64>> = keys.iter().map(|k| k.deriv).collect();
    let m = fit::difference_slopes(&xs, &ys, &derivs);

    let a = keys[seg];
    let b = keys[seg + 1];
    let third = (b.position - a.position) / 3.0;
    [
        a.position + third,
        a.value + m[seg] * third,
        b.position - third,
        b.value - m[seg + 1] * third,
    ]
}

fn bezier_at(p0: f64, p1: f64, p2: f64, p3: f64, t: f64) -> f64 {
    let omt = 1.0 - t;
    omt * omt * omt * p0 + 3.0 * omt * omt * t * p1 + 3.0 * omt * t * t * p2 + t * t * t * p3
}

/// Solve bx(u) = x for the curve with x-coordinates (0, x1, x2, 1).
/// Newton-Raphson with a bisection pass to pin down flat spots.
fn solve_x(x: f64, x1: f64, x2: f64) -> f64 {
    if x <= 0.0 {
        return 0.0;
    }
    if x >= 1.0 {
        return 1.0;
    }
    fn sample_curve(a1: f64, a2: f64, t: f64) -> f64 {
        let omt = 1.0 - t;
        3.0 * omt * omt * t * a1 + 3.0 * omt * t * t * a2 + t * t * t
    }
    fn sample_curve_derivative(a1: f64, a2: f64, t: f64) -> f64 {
        let omt = 1.0 - t;
        3.0 * omt * omt * a1 + 6.0 * omt * t * (a2 - a1) + 3.0 * t * t * (1.0 - a2)
    }

    let mut t = x;
    for _ in 0..8 {
        let x_t = sample_curve(x1, x2, t) - x;
        if x_t.abs() < 1e-9 {
            return t;
        }
        let d = sample_curve_derivative(x1, x2, t);
        if d.abs() < 1e-7 {
            break;
        }
        t = (t - x_t / d).clamp(0.0, 1.0);
    }

    // Newton stalled on a flat spot; bisect to the same tolerance.
    let mut lo = 0.0;
    let mut hi = 1.0;
    t = x;
    for _ in 0..64 {
        let x_t = sample_curve(x1, x2, t);
        if (x_t - x).abs() < 1e-9 {
            break;
        }
        if x_t < x {
            lo = t;
        } else {
            hi = t;
        }
        t = 0.5 * (lo + hi);
    }
    t
}
