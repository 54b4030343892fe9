//! Data profiling for genome summary tables.

mod distribution;

pub use distribution::{median, profile_metric, quantile, quantile_sorted, DistributionProfile};
