//! Order statistics for metric distributions.

use crate::data::{GenomeTable, Metric};
use serde::{Deserialize, Serialize};

/// Summary of one numeric column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistributionProfile {
    /// Column summarized.
    pub metric: Metric,
    /// Rows with a present value.
    pub n_present: usize,
    /// Rows with a missing value.
    pub n_missing: usize,
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
    pub mean: f64,
}

impl DistributionProfile {
    /// Interquartile range.
    pub fn iqr(&self) -> f64 {
        self.q3 - self.q1
    }

    /// Tukey upper fence, `Q3 + 1.5 * IQR`.
    pub fn upper_fence(&self) -> f64 {
        self.q3 + 1.5 * self.iqr()
    }
}

impl std::fmt::Display for DistributionProfile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "{}", self.metric.column())?;
        writeln!(f, "  Present: {}", self.n_present)?;
        writeln!(f, "  Missing: {}", self.n_missing)?;
        writeln!(f, "  Min:     {:.2}", self.min)?;
        writeln!(f, "  Q1:      {:.2}", self.q1)?;
        writeln!(f, "  Median:  {:.2}", self.median)?;
        writeln!(f, "  Q3:      {:.2}", self.q3)?;
        writeln!(f, "  Max:     {:.2}", self.max)?;
        writeln!(f, "  Mean:    {:.2}", self.mean)?;
        writeln!(f, "  Upper fence: {:.2}", self.upper_fence())?;
        Ok(())
    }
}

/// Profile the present values of a metric column.
pub fn profile_metric(table: &GenomeTable, metric: Metric) -> DistributionProfile {
    let mut values = table.metric_values(metric);
    values.sort_by(|a, b| a.total_cmp(b));
    let n_present = values.len();
    let mean = if n_present > 0 {
        values.iter().sum::<f64>() / n_present as f64
    } else {
        0.0
    };

    DistributionProfile {
        metric,
        n_present,
        n_missing: table.len() - n_present,
        min: values.first().copied().unwrap_or(0.0),
        q1: quantile_sorted(&values, 0.25),
        median: quantile_sorted(&values, 0.5),
        q3: quantile_sorted(&values, 0.75),
        max: values.last().copied().unwrap_or(0.0),
        mean,
    }
}

/// Quantile of ascending-sorted values using linear interpolation between
/// the two closest ranks (`pos = (n - 1) * q`). Returns `0.0` when empty.
pub fn quantile_sorted(sorted: &[f64], q: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let pos = (sorted.len() - 1) as f64 * q.clamp(0.0, 1.0);
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}

/// Quantile of unsorted values.
pub fn quantile(values: &[f64], q: f64) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    quantile_sorted(&sorted, q)
}

/// Median of unsorted values.
pub fn median(values: &[f64]) -> f64 {
    quantile(values, 0.5)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::GenomeRecord;
    use approx::assert_relative_eq;

    #[test]
    fn test_quantile_linear() {
        let values = [1.0, 2.0, 2.0, 3.0, 3.0, 4.0, 4.0, 5.0, 50.0, 60.0];
        assert_relative_eq!(quantile(&values, 0.25), 2.25);
        assert_relative_eq!(quantile(&values, 0.75), 4.75);
        assert_relative_eq!(median(&values), 3.5);
    }

    #[test]
    fn test_median_even_and_odd() {
        assert_relative_eq!(median(&[3.0, 1.0, 2.0]), 2.0);
        assert_relative_eq!(median(&[4.0, 1.0, 2.0, 3.0]), 2.5);
        assert_eq!(median(&[]), 0.0);
    }

    #[test]
    fn test_profile_metric() {
        let records = vec![
            GenomeRecord::new("a").with_metric(Metric::Contigs, 10),
            GenomeRecord::new("b").with_metric(Metric::Contigs, 20),
            GenomeRecord::new("c").with_metric(Metric::Contigs, 30),
            GenomeRecord::new("d"),
        ];
        let table = GenomeTable::from_records(records);
        let profile = profile_metric(&table, Metric::Contigs);

        assert_eq!(profile.n_present, 3);
        assert_eq!(profile.n_missing, 1);
        assert_relative_eq!(profile.median, 20.0);
        assert_relative_eq!(profile.q1, 15.0);
        assert_relative_eq!(profile.q3, 25.0);
        assert_relative_eq!(profile.upper_fence(), 40.0);
        assert_relative_eq!(profile.mean, 20.0);
    }
}
