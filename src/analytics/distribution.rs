use hdrhistogram::Histogram;

use crate::error::{AppError, Result};

#[derive(Debug, Clone, PartialEq)]
pub struct Bin {
    pub lower: f64,
    pub upper: f64,
    pub count: u64,
}

/// Equal-width histogram of a stat plus a few quantiles.
#[derive(Debug, Clone, PartialEq)]
pub struct Distribution {
    pub bins: Vec<Bin>,
    pub samples: u64,
    pub min: u64,
    pub p50: u64,
    pub p90: u64,
    pub max: u64,
}

/// Buckets `values` into `bin_count` equal-width bins spanning min..=max (the
/// maximum lands in the last bin). When every value is equal the range is
/// widened by 0.5 on each side. Negative values are ignored. `None` when
/// there is nothing to bucket.
pub fn distribution<I>(values: I, bin_count: usize) -> Result<Option<Distribution>>
where
    I: IntoIterator<Item = i64>,
{
    let values: Vec<u64> = values
        .into_iter()
        .filter_map(|v| u64::try_from(v).ok())
        .collect();
    if values.is_empty() || bin_count == 0 {
        return Ok(None);
    }

    let mut hist = Histogram::<u64>::new(3).map_err(|e| AppError::Histogram(format!("{e:?}")))?;
    for &v in &values {
        hist.record(v)
            .map_err(|e| AppError::Histogram(format!("{e:?}")))?;
    }

    let (min, max) = (hist.min() as f64, hist.max() as f64);
    let (lo, hi) = if min == max { (min - 0.5, max + 0.5) } else { (min, max) };
    let width = (hi - lo) / bin_count as f64;

    let mut bins: Vec<Bin> = (0..bin_count)
        .map(|i| Bin {
            lower: lo + width * i as f64,
            upper: lo + width * (i + 1) as f64,
            count: 0,
        })
        .collect();
    for &v in &values {
        let idx = (((v as f64 - lo) / width) as usize).min(bin_count - 1);
        bins[idx].count += 1;
    }

    Ok(Some(Distribution {
        bins,
        samples: hist.len(),
        min: hist.min(),
        p50: hist.value_at_quantile(0.5),
        p90: hist.value_at_quantile(0.9),
        max: hist.max(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bins_cover_min_to_max() {
        let d = distribution(vec![10, 20, 30, 40, 50, 60, 70, 80, 90, 100], 9)
            .unwrap()
            .unwrap();
        assert_eq!(d.bins.len(), 9);
        assert_eq!(d.bins[0].lower, 10.0);
        assert_eq!(d.bins[8].upper, 100.0);
        assert_eq!(d.bins.iter().map(|b| b.count).sum::<u64>(), 10);
        assert_eq!(d.bins[8].count, 2);
        assert_eq!((d.min, d.max, d.samples), (10, 100, 10));
    }

    #[test]
    fn quantiles_follow_the_data() {
        let d = distribution(1..=100, 20).unwrap().unwrap();
        assert_eq!(d.p50, 50);
        assert_eq!(d.p90, 90);
    }

    #[test]
    fn constant_values_get_a_unit_range() {
        let d = distribution(vec![45, 45, 45], 20).unwrap().unwrap();
        assert_eq!(d.bins[0].lower, 44.5);
        assert_eq!(d.bins[19].upper, 45.5);
        assert_eq!(d.bins.iter().map(|b| b.count).sum::<u64>(), 3);
    }

    #[test]
    fn nothing_to_bucket() {
        assert!(distribution(Vec::new(), 20).unwrap().is_none());
        assert!(distribution(vec![-5], 20).unwrap().is_none());
    }
}
