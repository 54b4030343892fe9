//! Knee/elbow detection on sorted value curves.
//!
//! Points are min-max scaled onto the unit square, then rotated so the chord
//! from the first to the last point is horizontal. The elbow is the lowest
//! rotated point, the knee the highest; both are the points of maximum
//! perpendicular distance from the chord on their side of it.

use crate::error::{QcError, Result};
use nalgebra::{Rotation2, Vector2};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Curve shape to search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CurveMode {
    /// Values sorted ascending; flat then sharply rising.
    Elbow,
    /// Values sorted descending; high plateau then dropping off.
    Knee,
}

impl CurveMode {
    /// Mode name.
    pub fn name(&self) -> &'static str {
        match self {
            CurveMode::Elbow => "elbow",
            CurveMode::Knee => "knee",
        }
    }

    /// Sort values into the order this mode expects.
    pub fn sort(&self, values: &mut [f64]) {
        match self {
            CurveMode::Elbow => values.sort_by(|a, b| a.total_cmp(b)),
            CurveMode::Knee => values.sort_by(|a, b| b.total_cmp(a)),
        }
    }
}

impl FromStr for CurveMode {
    type Err = QcError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "elbow" => Ok(CurveMode::Elbow),
            "knee" => Ok(CurveMode::Knee),
            _ => Err(QcError::InvalidCurveMode(s.to_string())),
        }
    }
}

impl fmt::Display for CurveMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Index of the point of maximum curvature.
///
/// Returns `None` for an empty curve. Ties resolve to the first index.
pub fn inflection_index(points: &[(usize, f64)], mode: CurveMode) -> Option<usize> {
    let (first, last) = (points.first()?, points.last()?);

    let (x_min, x_max) = min_max(points.iter().map(|p| p.0 as f64));
    let (y_min, y_max) = min_max(points.iter().map(|p| p.1));
    let scale = |v: f64, lo: f64, hi: f64| if hi > lo { (v - lo) / (hi - lo) } else { 0.0 };

    let start = Vector2::new(scale(first.0 as f64, x_min, x_max), scale(first.1, y_min, y_max));
    let end = Vector2::new(scale(last.0 as f64, x_min, x_max), scale(last.1, y_min, y_max));
    let chord = end - start;
    let rotation = Rotation2::new(-chord.y.atan2(chord.x));

    let rotated = points.iter().map(|&(x, y)| {
        let p = Vector2::new(scale(x as f64, x_min, x_max), scale(y, y_min, y_max));
        (rotation * p).y
    });

    let mut best: Option<(usize, f64)> = None;
    for (i, y) in rotated.enumerate() {
        let better = match (best, mode) {
            (None, _) => true,
            (Some((_, b)), CurveMode::Elbow) => y < b,
            (Some((_, b)), CurveMode::Knee) => y > b,
        };
        if better {
            best = Some((i, y));
        }
    }
    best.map(|(i, _)| i)
}

/// Value at the point of maximum curvature, or `0.0` for an empty curve.
pub fn find_inflection(points: &[(usize, f64)], mode: CurveMode) -> f64 {
    inflection_index(points, mode)
        .map(|i| points[i].1)
        .unwrap_or(0.0)
}

/// Sort raw values per `mode` and return the inflection value.
///
/// An empty slice yields `0.0` so that an empty partition does not stop a
/// pipeline.
pub fn inflection_cutoff(values: &[f64], mode: CurveMode) -> f64 {
    let mut sorted = values.to_vec();
    mode.sort(&mut sorted);
    let points: Vec<(usize, f64)> = sorted.into_iter().enumerate().collect();
    find_inflection(&points, mode)
}

/// String-keyed variant of [`inflection_cutoff`].
pub fn inflection_cutoff_named(values: &[f64], curve: &str) -> Result<f64> {
    let mode: CurveMode = curve.parse()?;
    Ok(inflection_cutoff(values, mode))
}

fn min_max(values: impl Iterator<Item = f64>) -> (f64, f64) {
    values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_curve_mode_parse() {
        assert_eq!("elbow".parse::<CurveMode>().unwrap(), CurveMode::Elbow);
        assert_eq!("KNEE".parse::<CurveMode>().unwrap(), CurveMode::Knee);
        assert!(matches!(
            "elbw".parse::<CurveMode>(),
            Err(QcError::InvalidCurveMode(ref s)) if s == "elbw"
        ));
    }

    #[test]
    fn test_named_rejects_unknown_mode() {
        assert!(inflection_cutoff_named(&[1.0, 2.0], "hinge").is_err());
        // Mode is validated even when there is nothing to search.
        assert!(inflection_cutoff_named(&[], "hinge").is_err());
    }

    #[test]
    fn test_empty_is_zero() {
        assert_eq!(find_inflection(&[], CurveMode::Elbow), 0.0);
        assert_eq!(inflection_cutoff(&[], CurveMode::Knee), 0.0);
        assert_eq!(inflection_cutoff_named(&[], "elbow").unwrap(), 0.0);
    }

    #[test]
    fn test_single_point() {
        assert_eq!(find_inflection(&[(0, 4.2)], CurveMode::Knee), 4.2);
    }

    #[test]
    fn test_two_points_return_endpoint() {
        let points = [(0, 1.5), (1, 9.0)];
        for mode in [CurveMode::Elbow, CurveMode::Knee] {
            let v = find_inflection(&points, mode);
            assert!(v == 1.5 || v == 9.0);
        }
    }

    #[test]
    fn test_elbow_on_contamination() {
        let values = [5.0, 0.2, 0.1, 0.4, 10.0, 0.2, 0.3, 0.5];
        let cutoff = inflection_cutoff(&values, CurveMode::Elbow);
        assert_relative_eq!(cutoff, 0.5);
    }

    #[test]
    fn test_knee_on_completeness() {
        let values = [60.0, 99.5, 98.7, 99.0, 97.0, 98.5, 98.0, 90.0];
        let cutoff = inflection_cutoff(&values, CurveMode::Knee);
        assert_relative_eq!(cutoff, 97.0);
    }

    #[test]
    fn test_flat_curve() {
        let values = [3.0; 6];
        assert_eq!(inflection_cutoff(&values, CurveMode::Elbow), 3.0);
        assert_eq!(inflection_index(&[(0, 3.0), (1, 3.0), (2, 3.0)], CurveMode::Knee), Some(0));
    }

    #[test]
    fn test_deterministic() {
        let values = [1.0, 1.1, 1.3, 2.0, 4.0, 9.0, 20.0];
        let a = inflection_cutoff(&values, CurveMode::Elbow);
        let b = inflection_cutoff(&values, CurveMode::Elbow);
        assert_eq!(a.to_bits(), b.to_bits());
    }
}
