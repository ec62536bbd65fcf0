//! Keyframe curves and the interpolation algorithms that evaluate them.
//!
//! All algorithms share one edge policy: queries before the first key or
//! after the last clamp to the boundary value, and a single-key curve is
//! constant. Between keys the algorithm of the segment decides, where a
//! segment is owned by its left key.

use crate::foundation::error::{KeysplineError, KeysplineResult};
use smallvec::SmallVec;

pub(crate) mod bezier;
pub(crate) mod fit;

/// Interpolation algorithm named by a channel or a single keyframe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Algorithm {
    Nearest,
    Linear,
    Step,
    Polynomial,
    Quadratic,
    Cubic,
    Hermite,
    Bezier,
    Pchip,
}

impl Algorithm {
    /// Maps a document tag to an algorithm. Unknown tags are rejected at
    /// load; that includes `gaussian`, which needs a fitting backend this
    /// crate does not bundle.
    pub(crate) fn from_tag(tag: &str) -> KeysplineResult<Self> {
        Ok(match tag {
            "nearest" => Self::Nearest,
            "linear" => Self::Linear,
            "step" => Self::Step,
            "polynomial" => Self::Polynomial,
            "quadratic" => Self::Quadratic,
            "cubic" => Self::Cubic,
            "hermite" => Self::Hermite,
            "bezier" => Self::Bezier,
            "pchip" => Self::Pchip,
            other => return Err(KeysplineError::UnsupportedInterpolation(other.to_owned())),
        })
    }

    pub(crate) fn tag(self) -> &'static str {
        match self {
            Self::Nearest => "nearest",
            Self::Linear => "linear",
            Self::Step => "step",
            Self::Polynomial => "polynomial",
            Self::Quadratic => "quadratic",
            Self::Cubic => "cubic",
            Self::Hermite => "hermite",
            Self::Bezier => "bezier",
            Self::Pchip => "pchip",
        }
    }
}

/// One resolved keyframe. Expression-valued keys are already evaluated to
/// numbers by the time a curve is sampled.
#[derive(Debug, Clone, Copy)]
pub(crate) struct CurveKey {
    pub(crate) position: f64,
    pub(crate) value: f64,
    /// Per-segment override; `None` falls back to the channel algorithm.
    pub(crate) algorithm: Option<Algorithm>,
    /// Absolute bezier control points `[x1, y1, x2, y2]`.
    pub(crate) cp: Option<[f64; 4]>,
    /// Explicit tangent for hermite and clamped cubic ends.
    pub(crate) deriv: Option<f64>,
}

/// Evaluates a curve at `x` in the keys' own position space.
///
/// The global fits (polynomial, quadratic, cubic, pchip) always fit the
/// full key set, so a per-key override changes which algorithm renders a
/// segment without perturbing its neighbors' shapes.
pub(crate) fn value_at(keys: &[CurveKey], default: Algorithm, x: f64) -> f64 {
    debug_assert!(!keys.is_empty());
    let last = keys.len() - 1;
    if x <= keys[0].position {
        return keys[0].value;
    }
    if x >= keys[last].position {
        return keys[last].value;
    }

    // First index whose position exceeds x. Segments are right-open, so
    // an exact hit on a key lands in the segment that key starts.
    let idx = keys.partition_point(|k| k.position <= x);
    let seg = idx - 1;
    let a = keys[seg];
    let b = keys[seg + 1];

    match a.algorithm.unwrap_or(default) {
        Algorithm::Nearest => {
            if x - a.position <= b.position - x {
                a.value
            } else {
                b.value
            }
        }
        Algorithm::Step => a.value,
        Algorithm::Linear => {
            let t = (x - a.position) / (b.position - a.position);
            a.value + (b.value - a.value) * t
        }
        Algorithm::Polynomial => {
            let (xs, ys) = split_keys(keys);
            fit::lagrange_value(&xs, &ys, x)
        }
        Algorithm::Quadratic => {
            let (xs, ys) = split_keys(keys);
            let z = fit::quadratic_slopes(&xs, &ys);
            fit::quadratic_eval(&xs, &ys, &z, seg, x)
        }
        Algorithm::Cubic => {
            let (xs, ys) = split_keys(keys);
            let m = fit::cubic_moments(&xs, &ys, keys[0].deriv, keys[last].deriv);
            fit::cubic_eval(&xs, &ys, &m, seg, x)
        }
        Algorithm::Hermite => {
            let (xs, ys) = split_keys(keys);
            let derivs: SmallVec<[Option<f64>; 8]> = keys.iter().map(|k| k.deriv).collect();
            let m = fit::difference_slopes(&xs, &ys, &derivs);
            fit::hermite_eval(xs[seg], xs[seg + 1], ys[seg], ys[seg + 1], m[seg], m[seg + 1], x)
        }
        Algorithm::Bezier => bezier::bezier_value(keys, seg, x),
        Algorithm::Pchip => {
            let (xs, ys) = split_keys(keys);
            let m = fit::pchip_slopes(&xs, &ys);
            fit::hermite_eval(xs[seg], xs[seg + 1], ys[seg], ys[seg + 1], m[seg], m[seg + 1], x)
        }
    }
}

fn split_keys(keys: &[CurveKey]) -> (SmallVec<[f64; 8]>, SmallVec<[f64; 8]>) {
    let xs = keys.iter().map(|k| k.position).collect();
    let ys = keys.iter().map(|k| k.value).collect();
    (xs, ys)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(position: f64, value: f64) -> CurveKey {
        CurveKey {
            position,
            value,
            algorithm: None,
            cp: None,
            deriv: None,
        }
    }

    const ALL: [Algorithm; 9] = [
        Algorithm::Nearest,
        Algorithm::Linear,
        Algorithm::Step,
        Algorithm::Polynomial,
        Algorithm::Quadratic,
        Algorithm::Cubic,
        Algorithm::Hermite,
        Algorithm::Bezier,
        Algorithm::Pchip,
    ];

    #[test]
    fn tags_round_trip_and_unknown_is_rejected() {
        for algo in ALL {
            assert_eq!(Algorithm::from_tag(algo.tag()).unwrap(), algo);
        }
        for bad in ["gaussian", "spline", ""] {
            assert!(matches!(
                Algorithm::from_tag(bad),
                Err(KeysplineError::UnsupportedInterpolation(_))
            ));
        }
    }

    #[test]
    fn out_of_range_clamps_and_single_key_is_constant() {
        let keys = [key(0.2, 1.0), key(0.8, 3.0)];
        for algo in ALL {
            assert_eq!(value_at(&keys, algo, -1.0), 1.0);
            assert_eq!(value_at(&keys, algo, 0.2), 1.0);
            assert_eq!(value_at(&keys, algo, 0.8), 3.0);
            assert_eq!(value_at(&keys, algo, 9.0), 3.0);
            assert_eq!(value_at(&[key(0.5, 7.0)], algo, 0.1), 7.0);
        }
    }

    #[test]
    fn every_algorithm_passes_through_its_keys() {
        let keys = [key(0.0, 0.0), key(0.25, 2.0), key(0.5, -1.0), key(1.0, 4.0)];
        for algo in ALL {
            for k in &keys {
                let v = value_at(&keys, algo, k.position);
                assert!(
                    (v - k.value).abs() < 1e-9,
                    "{} missed key at {}: {v}",
                    algo.tag(),
                    k.position
                );
            }
        }
    }

    #[test]
    fn linear_midpoint_is_the_mean() {
        let keys = [key(0.0, 10.0), key(1.0, 20.0)];
        assert_eq!(value_at(&keys, Algorithm::Linear, 0.5), 15.0);
    }

    #[test]
    fn step_holds_left_value_until_the_next_key() {
        let keys = [key(0.0, 0.0), key(0.5, 50.0), key(1.0, 0.0)];
        assert_eq!(value_at(&keys, Algorithm::Step, 0.49999), 0.0);
        assert_eq!(value_at(&keys, Algorithm::Step, 0.5), 50.0);
        assert_eq!(value_at(&keys, Algorithm::Step, 0.99), 50.0);
        assert_eq!(value_at(&keys, Algorithm::Step, 1.0), 0.0);
    }

    #[test]
    fn nearest_breaks_ties_toward_the_earlier_key() {
        let keys = [key(0.0, 1.0), key(1.0, 2.0)];
        assert_eq!(value_at(&keys, Algorithm::Nearest, 0.5), 1.0);
        assert_eq!(value_at(&keys, Algorithm::Nearest, 0.51), 2.0);
    }

    #[test]
    fn per_key_override_changes_only_its_segment() {
        let mut hold = key(0.4, 2.0);
        hold.algorithm = Some(Algorithm::Step);
        let keys = [key(0.0, 0.0), hold, key(1.0, 4.0)];
        assert_eq!(value_at(&keys, Algorithm::Linear, 0.2), 1.0);
        assert_eq!(value_at(&keys, Algorithm::Linear, 0.7), 2.0);
        assert_eq!(value_at(&keys, Algorithm::Linear, 1.0), 4.0);
    }

    #[test]
    fn cubic_honors_explicit_end_derivatives() {
        let mut first = key(0.0, 0.0);
        first.deriv = Some(0.0);
        let keys = [first, key(1.0, 1.0), key(2.0, 2.0)];
        let eps = 1e-6;
        let slope = (value_at(&keys, Algorithm::Cubic, eps) - 0.0) / eps;
        assert!(slope.abs() < 1e-3, "clamped start slope was {slope}");
    }
}
