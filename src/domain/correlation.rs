//! Pairwise correlation of the retained price series.
//!
//! Series are aligned by position, not by timestamp: row `k` of the table is
//! the `k`-th retained point of every instrument, so instruments updated a
//! different number of times produce ragged columns. Gaps are forward-filled,
//! then backward-filled.
//!
//! Correlation is the sample Pearson coefficient (N-1 denominator). A series
//! with zero variance has no defined correlation with anything, itself
//! included; such entries are `None` and are never reported as 0.0.

use crate::domain::history::HistoryStore;
use tracing::debug;

pub const DEFAULT_MIN_SAMPLES: usize = 5;

/// Square, symmetric matrix indexed by instrument id in column order.
#[derive(Debug, Clone, PartialEq)]
pub struct CorrelationMatrix {
    ids: Vec<String>,
    values: Vec<Option<f64>>,
}

impl CorrelationMatrix {
    /// Build a matrix by evaluating `f` on the upper triangle (diagonal
    /// included) and mirroring it.
    pub fn from_fn<F>(ids: Vec<String>, f: F) -> Self
    where
        F: Fn(usize, usize) -> Option<f64>,
    {
        let n = ids.len();
        let mut values = vec![None; n * n];
        for i in 0..n {
            for j in i..n {
                let v = f(i, j);
                values[i * n + j] = v;
                values[j * n + i] = v;
            }
        }
        Self { ids, values }
    }

    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Correlation between columns `i` and `j`; `None` when undefined or out of range.
    pub fn get(&self, i: usize, j: usize) -> Option<f64> {
        let n = self.ids.len();
        if i >= n || j >= n {
            return None;
        }
        self.values[i * n + j]
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.ids.iter().position(|x| x == id)
    }

    pub fn get_by_id(&self, a: &str, b: &str) -> Option<f64> {
        self.get(self.index_of(a)?, self.index_of(b)?)
    }
}

/// Positionally aligned, gap-filled columns for every non-empty instrument
/// with at least `min_samples` points, in store order.
pub fn aligned_table(history: &HistoryStore, min_samples: usize) -> Vec<(String, Vec<f64>)> {
    let qualifying: Vec<(&str, Vec<f64>)> = history
        .iter()
        .filter(|(_, rec)| rec.sample_count() >= min_samples && rec.sample_count() > 0)
        .map(|(id, rec)| (id, rec.price_values().collect()))
        .collect();

    let rows = qualifying.iter().map(|(_, s)| s.len()).max().unwrap_or(0);

    qualifying
        .into_iter()
        .filter_map(|(id, series)| {
            let mut column: Vec<Option<f64>> = series.into_iter().map(Some).collect();
            column.resize(rows, None);
            fill_gaps(&mut column);
            // A column that is still missing anywhere had no values at all.
            let filled: Option<Vec<f64>> = column.into_iter().collect();
            filled.map(|values| (id.to_string(), values))
        })
        .collect()
}

/// Forward-fill, then backward-fill the leading gap.
pub fn fill_gaps(column: &mut [Option<f64>]) {
    let mut last = None;
    for slot in column.iter_mut() {
        match slot {
            Some(v) => last = Some(*v),
            None => *slot = last,
        }
    }

    let mut next = None;
    for slot in column.iter_mut().rev() {
        match slot {
            Some(v) => next = Some(*v),
            None => *slot = next,
        }
    }
}

fn is_constant(series: &[f64]) -> bool {
    match series.first() {
        Some(&first) => series.iter().all(|&v| v == first),
        None => true,
    }
}

fn mean(series: &[f64]) -> f64 {
    series.iter().sum::<f64>() / series.len() as f64
}

/// Sample Pearson correlation. `None` for fewer than two points, mismatched
/// lengths, or a zero-variance input.
pub fn pearson(x: &[f64], y: &[f64]) -> Option<f64> {
    let n = x.len();
    if n < 2 || y.len() != n || is_constant(x) || is_constant(y) {
        return None;
    }

    let mean_x = mean(x);
    let mean_y = mean(y);
    let (mut sxy, mut sxx, mut syy) = (0.0_f64, 0.0_f64, 0.0_f64);
    for (&a, &b) in x.iter().zip(y) {
        let dx = a - mean_x;
        let dy = b - mean_y;
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }

    let denom = (n - 1) as f64;
    let cov = sxy / denom;
    let sd_x = (sxx / denom).sqrt();
    let sd_y = (syy / denom).sqrt();
    let scale = sd_x * sd_y;
    if scale <= 0.0 || !scale.is_finite() {
        return None;
    }

    let r = cov / scale;
    r.is_finite().then(|| r.clamp(-1.0, 1.0))
}

/// Correlation matrix over every instrument with at least `min_samples`
/// points. `None` when no instrument qualifies.
pub fn compute(history: &HistoryStore, min_samples: usize) -> Option<CorrelationMatrix> {
    let table = aligned_table(history, min_samples);
    if table.is_empty() {
        debug!(min_samples, "no instrument has enough samples to correlate");
        return None;
    }

    debug!(
        columns = table.len(),
        rows = table.first().map(|(_, c)| c.len()).unwrap_or(0),
        "computing correlation matrix"
    );

    let constant: Vec<bool> = table.iter().map(|(_, c)| is_constant(c)).collect();
    let (ids, columns): (Vec<String>, Vec<Vec<f64>>) = table.into_iter().unzip();

    Some(CorrelationMatrix::from_fn(ids, |i, j| {
        if i == j {
            (!constant[i]).then_some(1.0)
        } else {
            pearson(&columns[i], &columns[j])
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::history::{HistoryRecord, PricePoint};
    use approx::assert_abs_diff_eq;

    fn record(title: &str, prices: &[f64]) -> HistoryRecord {
        HistoryRecord {
            title: title.into(),
            prices: prices
                .iter()
                .enumerate()
                .map(|(i, &p)| PricePoint {
                    t: format!("t{i}"),
                    p,
                })
                .collect(),
        }
    }

    fn store(series: &[(&str, &[f64])]) -> HistoryStore {
        let mut h = HistoryStore::new();
        for &(id, prices) in series {
            h.insert(id, record(id, prices));
        }
        h
    }

    #[test]
    fn fill_gaps_forward_then_backward() {
        let mut col = vec![None, None, Some(0.2), None, Some(0.4), None];
        fill_gaps(&mut col);
        assert_eq!(
            col,
            vec![Some(0.2), Some(0.2), Some(0.2), Some(0.2), Some(0.4), Some(0.4)]
        );
    }

    #[test]
    fn fill_gaps_all_missing_stays_missing() {
        let mut col = vec![None, None, None];
        fill_gaps(&mut col);
        assert!(col.iter().all(Option::is_none));
    }

    #[test]
    fn aligned_table_is_positional_and_forward_filled() {
        let h = store(&[
            ("long", &[0.1, 0.2, 0.3, 0.4, 0.5, 0.6, 0.7]),
            ("short", &[0.5, 0.4, 0.3, 0.2, 0.1]),
        ]);
        let table = aligned_table(&h, 5);

        assert_eq!(table.len(), 2);
        assert_eq!(table[0].0, "long");
        assert_eq!(table[1].1, vec![0.5, 0.4, 0.3, 0.2, 0.1, 0.1, 0.1]);
    }

    #[test]
    fn aligned_table_skips_short_series() {
        let h = store(&[("a", &[0.1, 0.2, 0.3, 0.4, 0.5]), ("d", &[0.1, 0.2, 0.3])]);
        let table = aligned_table(&h, 5);
        let ids: Vec<_> = table.iter().map(|(id, _)| id.as_str()).collect();
        assert_eq!(ids, vec!["a"]);
    }

    #[test]
    fn pearson_known_value() {
        let x = [1.0, 2.0, 3.0, 4.0, 5.0];
        let y = [2.0, 4.0, 5.0, 4.0, 5.0];
        // cov = 1.5, sd_x = 1.5811, sd_y = 1.2247
        assert_abs_diff_eq!(pearson(&x, &y).unwrap(), 0.7745966692, epsilon = 1e-9);
    }

    #[test]
    fn pearson_perfect_and_inverse() {
        let x = [0.1, 0.2, 0.3, 0.4, 0.5];
        let y = [0.5, 0.4, 0.3, 0.2, 0.1];
        assert_abs_diff_eq!(pearson(&x, &x).unwrap(), 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(pearson(&x, &y).unwrap(), -1.0, epsilon = 1e-12);
    }

    #[test]
    fn pearson_undefined_for_constant_series() {
        let x = [0.1, 0.2, 0.3, 0.4, 0.5];
        let flat = [0.3; 5];
        assert_eq!(pearson(&x, &flat), None);
        assert_eq!(pearson(&flat, &flat), None);
        assert_eq!(pearson(&[0.1], &[0.2]), None);
    }

    #[test]
    fn empty_series_never_become_columns() {
        let h = store(&[("e", &[]), ("a", &[0.1, 0.2])]);
        let table = aligned_table(&h, 0);
        let ids: Vec<_> = table.iter().map(|(id, _)| id.as_str()).collect();
        assert_eq!(ids, vec!["a"]);

        assert!(compute(&store(&[("e", &[])]), 0).is_none());
    }

    #[test]
    fn compute_empty_when_nothing_qualifies() {
        let h = store(&[("a", &[0.1, 0.2, 0.3])]);
        assert!(compute(&h, 5).is_none());
        assert!(compute(&HistoryStore::new(), 5).is_none());
    }

    #[test]
    fn compute_is_symmetric_with_unit_diagonal() {
        let h = store(&[
            ("a", &[0.1, 0.2, 0.3, 0.4, 0.5]),
            ("b", &[0.2, 0.1, 0.4, 0.3, 0.6]),
            ("c", &[0.9, 0.7, 0.8, 0.5, 0.4]),
        ]);
        let m = compute(&h, 5).unwrap();

        assert_eq!(m.ids(), &["a", "b", "c"]);
        for i in 0..3 {
            assert_eq!(m.get(i, i), Some(1.0));
            for j in 0..3 {
                assert_eq!(m.get(i, j), m.get(j, i));
                let v = m.get(i, j).unwrap();
                assert!((-1.0..=1.0).contains(&v));
            }
        }
    }

    #[test]
    fn constant_series_is_undefined_everywhere() {
        let h = store(&[
            ("a", &[0.1, 0.2, 0.3, 0.4, 0.5]),
            ("flat", &[0.4, 0.4, 0.4, 0.4, 0.4]),
        ]);
        let m = compute(&h, 5).unwrap();
        assert_eq!(m.get_by_id("a", "flat"), None);
        assert_eq!(m.get_by_id("flat", "flat"), None);
        assert_eq!(m.get_by_id("a", "a"), Some(1.0));
    }

    #[test]
    fn short_series_padded_by_forward_fill_affects_correlation() {
        // "b" has two fewer points; its last value repeats in the missing rows.
        let h = store(&[
            ("a", &[0.1, 0.2, 0.3, 0.4, 0.5, 0.6, 0.7]),
            ("b", &[0.1, 0.2, 0.3, 0.4, 0.5]),
        ]);
        let m = compute(&h, 5).unwrap();
        let expected = pearson(
            &[0.1, 0.2, 0.3, 0.4, 0.5, 0.6, 0.7],
            &[0.1, 0.2, 0.3, 0.4, 0.5, 0.5, 0.5],
        )
        .unwrap();
        assert_abs_diff_eq!(m.get_by_id("a", "b").unwrap(), expected, epsilon = 1e-12);
        assert!(expected < 1.0);
    }

    #[test]
    fn get_out_of_range_is_none() {
        let m = CorrelationMatrix::from_fn(vec!["a".into()], |_, _| Some(1.0));
        assert_eq!(m.get(0, 1), None);
        assert_eq!(m.get_by_id("a", "zzz"), None);
    }
}
