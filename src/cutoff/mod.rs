//! Cutoff selection: explicit thresholds or data-driven knee/elbow points.

pub mod inflection;

pub use inflection::{
    find_inflection, inflection_cutoff, inflection_cutoff_named, inflection_index, CurveMode,
};

use serde::{Deserialize, Serialize};

/// Where a cutoff value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CutoffSource {
    /// Supplied by the caller.
    Explicit,
    /// Detected on the sorted value curve.
    Detected(CurveMode),
}

/// A resolved scalar threshold.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Cutoff {
    pub value: f64,
    pub source: CutoffSource,
}

impl Cutoff {
    /// Use the explicit threshold when one is supplied, otherwise detect one.
    ///
    /// A zero threshold counts as not supplied. Detection only runs when no
    /// explicit threshold is used.
    pub fn resolve(explicit: Option<f64>, values: &[f64], mode: CurveMode) -> Self {
        match explicit.filter(|v| *v != 0.0) {
            Some(value) => Self {
                value,
                source: CutoffSource::Explicit,
            },
            None => Self {
                value: inflection_cutoff(values, mode),
                source: CutoffSource::Detected(mode),
            },
        }
    }

    /// Check whether the cutoff was detected rather than supplied.
    pub fn is_detected(&self) -> bool {
        matches!(self.source, CutoffSource::Detected(_))
    }
}

impl std::fmt::Display for CutoffSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CutoffSource::Explicit => f.write_str("explicit"),
            CutoffSource::Detected(mode) => write!(f, "{}", mode),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_takes_precedence() {
        let cutoff = Cutoff::resolve(Some(5.0), &[0.1, 0.2, 9.0], CurveMode::Elbow);
        assert_eq!(cutoff.value, 5.0);
        assert_eq!(cutoff.source, CutoffSource::Explicit);
        assert!(!cutoff.is_detected());
    }

    #[test]
    fn test_zero_means_detect() {
        let cutoff = Cutoff::resolve(Some(0.0), &[], CurveMode::Knee);
        assert_eq!(cutoff.source, CutoffSource::Detected(CurveMode::Knee));
        assert_eq!(cutoff.value, 0.0);
    }

    #[test]
    fn test_source_display() {
        assert_eq!(CutoffSource::Explicit.to_string(), "explicit");
        assert_eq!(CutoffSource::Detected(CurveMode::Elbow).to_string(), "elbow");
    }
}
