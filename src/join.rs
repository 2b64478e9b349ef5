//! Joins tabular rows to a geometry collection by exact name and classifies the
//! matched values into quantile bins for a sequential colour scale.
//!
//! Tie-breaks:
//! * several features with the same name: the first one binds the row, the later
//!   ones get no data and are listed in `duplicate_features`;
//! * several rows with the same key: the first row is used, the later ones are
//!   listed in `shadowed_rows`.

use crate::dataset::TabularRow;
use crate::geometry::GeometryCollection;
use serde::Serialize;
use std::collections::{HashMap, HashSet};

pub const DEFAULT_BINS: usize = 5;

/// Value and bin for one feature, in collection order. `None` means no data.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JoinedFeature {
    pub name: String,
    pub value: Option<f64>,
    pub bin: Option<usize>,
}

impl JoinedFeature {
    pub fn has_data(&self) -> bool {
        self.value.is_some()
    }
}

/// Quantile class edges: `bins + 1` ascending values from min to max.
#[derive(Debug, Clone, PartialEq, Serialize, Default)]
pub struct Classification {
    pub breaks: Vec<f64>,
}

impl Classification {
    /// Quantile edges over the finite `values` with linear interpolation between
    /// order statistics. No finite input yields no edges.
    pub fn quantiles(values: &[f64], bins: usize) -> Self {
        let mut sorted: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
        if sorted.is_empty() || bins == 0 {
            return Self::default();
        }
        sorted.sort_by(f64::total_cmp);

        let breaks = (0..=bins)
            .map(|i| quantile(&sorted, i as f64 / bins as f64))
            .collect();
        Self { breaks }
    }

    pub fn bins(&self) -> usize {
        self.breaks.len().saturating_sub(1)
    }

    /// Bin for `value`. Intervals are closed on the right, so a value equal to an
    /// inner edge falls in the lower bin.
    pub fn bin_of(&self, value: f64) -> Option<usize> {
        let bins = self.bins();
        if bins == 0 || !value.is_finite() {
            return None;
        }
        let above = self.breaks[1..bins].iter().filter(|&&edge| value > edge).count();
        Some(above)
    }
}

fn quantile(sorted: &[f64], q: f64) -> f64 {
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JoinResult {
    pub features: Vec<JoinedFeature>,
    /// Rows whose key matched no feature.
    pub mismatches: Vec<TabularRow>,
    /// Names of features that lost the tie-break to an earlier feature.
    pub duplicate_features: Vec<String>,
    /// Rows ignored because an earlier row had the same key.
    pub shadowed_rows: Vec<TabularRow>,
    pub classification: Classification,
}

impl JoinResult {
    pub fn matched(&self) -> usize {
        self.features.iter().filter(|f| f.has_data()).count()
    }

    pub fn no_data(&self) -> impl Iterator<Item = &JoinedFeature> {
        self.features.iter().filter(|f| !f.has_data())
    }
}

pub struct DatasetJoiner {
    bins: usize,
}

impl Default for DatasetJoiner {
    fn default() -> Self {
        Self { bins: DEFAULT_BINS }
    }
}

impl DatasetJoiner {
    pub fn new(bins: usize) -> Self {
        Self { bins }
    }

    pub fn join(&self, collection: &GeometryCollection, rows: &[TabularRow]) -> JoinResult {
        let mut by_key: HashMap<&str, &TabularRow> = HashMap::with_capacity(rows.len());
        let mut shadowed_rows = Vec::new();
        for row in rows {
            if by_key.contains_key(row.key.as_str()) {
                shadowed_rows.push(row.clone());
            } else {
                by_key.insert(row.key.as_str(), row);
            }
        }

        let mut bound: HashSet<&str> = HashSet::new();
        let mut duplicate_features = Vec::new();
        let mut features: Vec<JoinedFeature> = collection
            .features()
            .iter()
            .map(|f| {
                let first = bound.insert(f.name.as_str());
                if !first {
                    duplicate_features.push(f.name.clone());
                }
                let value = first
                    .then(|| by_key.get(f.name.as_str()).map(|r| r.value))
                    .flatten()
                    .filter(|v| v.is_finite());
                JoinedFeature {
                    name: f.name.clone(),
                    value,
                    bin: None,
                }
            })
            .collect();

        let mut reported = HashSet::new();
        let mismatches: Vec<TabularRow> = rows
            .iter()
            .filter(|r| !bound.contains(r.key.as_str()) && reported.insert(r.key.as_str()))
            .cloned()
            .collect();

        let values: Vec<f64> = features.iter().filter_map(|f| f.value).collect();
        let classification = Classification::quantiles(&values, self.bins);
        for f in &mut features {
            f.bin = f.value.and_then(|v| classification.bin_of(v));
        }

        for m in &mismatches {
            tracing::warn!(key = %m.key, value = m.value, "dataset row matches no feature");
        }
        for f in features.iter().filter(|f| !f.has_data()) {
            tracing::debug!(name = %f.name, "feature has no data");
        }

        JoinResult {
            features,
            mismatches,
            duplicate_features,
            shadowed_rows,
            classification,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::square;
    use approx::assert_relative_eq;

    fn counties(names: &[&str]) -> GeometryCollection {
        GeometryCollection::new(
            names
                .iter()
                .enumerate()
                .map(|(i, n)| square(n, i as f64, 0.0))
                .collect(),
        )
    }

    #[test]
    fn test_exact_match_binds_value() {
        let c = counties(&["Pest", "Budapest"]);
        let result = DatasetJoiner::default().join(&c, &[TabularRow::new("Pest", 1_200_000.0)]);

        assert_eq!(result.features[0].value, Some(1_200_000.0));
        assert!(result.mismatches.is_empty());
        assert_eq!(result.features[1].value, None);
        assert_eq!(result.matched(), 1);
    }

    #[test]
    fn test_unknown_row_is_isolated() {
        let c = counties(&["Pest", "Budapest"]);
        let rows = vec![
            TabularRow::new("Pest", 1_200_000.0),
            TabularRow::new("Budapest", 1_700_000.0),
        ];
        let baseline = DatasetJoiner::default().join(&c, &rows);

        let mut with_unknown = rows.clone();
        with_unknown.push(TabularRow::new("Unknown", 500.0));
        let result = DatasetJoiner::default().join(&c, &with_unknown);

        assert_eq!(result.mismatches, vec![TabularRow::new("Unknown", 500.0)]);
        assert_eq!(result.features, baseline.features);
    }

    #[test]
    fn test_match_is_case_sensitive() {
        let c = counties(&["Pest"]);
        let result = DatasetJoiner::default().join(&c, &[TabularRow::new("pest", 1.0)]);
        assert_eq!(result.features[0].value, None);
        assert_eq!(result.mismatches.len(), 1);
    }

    #[test]
    fn test_duplicate_feature_first_wins() {
        let c = counties(&["Pest", "Baranya", "Pest"]);
        let result = DatasetJoiner::default().join(&c, &[TabularRow::new("Pest", 10.0)]);

        assert_eq!(result.features[0].value, Some(10.0));
        assert_eq!(result.features[2].value, None);
        assert_eq!(result.duplicate_features, vec!["Pest".to_string()]);
        assert!(result.mismatches.is_empty());
    }

    #[test]
    fn test_duplicate_row_first_wins() {
        let c = counties(&["Pest"]);
        let rows = [TabularRow::new("Pest", 1.0), TabularRow::new("Pest", 2.0)];
        let result = DatasetJoiner::default().join(&c, &rows);

        assert_eq!(result.features[0].value, Some(1.0));
        assert_eq!(result.shadowed_rows, vec![TabularRow::new("Pest", 2.0)]);
    }

    #[test]
    fn test_mismatches_keep_input_order() {
        let c = counties(&["Pest"]);
        let rows = [
            TabularRow::new("Zala", 1.0),
            TabularRow::new("Pest", 2.0),
            TabularRow::new("Heves", 3.0),
            TabularRow::new("Borsod", 4.0),
        ];
        let result = DatasetJoiner::default().join(&c, &rows);
        let keys: Vec<&str> = result.mismatches.iter().map(|r| r.key.as_str()).collect();
        assert_eq!(keys, vec!["Zala", "Heves", "Borsod"]);
    }

    #[test]
    fn test_quantile_breaks() {
        let values: Vec<f64> = (1..=10).map(f64::from).collect();
        let c = Classification::quantiles(&values, 5);
        let expected = [1.0, 2.8, 4.6, 6.4, 8.2, 10.0];
        assert_eq!(c.breaks.len(), expected.len());
        for (got, want) in c.breaks.iter().zip(expected) {
            assert_relative_eq!(*got, want, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_bins_have_equal_counts() {
        let names: Vec<String> = (1..=10).map(|i| format!("c{}", i)).collect();
        let refs: Vec<&str> = names.iter().map(String::as_str).collect();
        let c = counties(&refs);
        let rows: Vec<TabularRow> = names
            .iter()
            .enumerate()
            .map(|(i, n)| TabularRow::new(n.as_str(), (i + 1) as f64))
            .collect();

        let result = DatasetJoiner::new(5).join(&c, &rows);
        let bins: Vec<usize> = result.features.iter().map(|f| f.bin.unwrap()).collect();
        assert_eq!(bins, vec![0, 0, 1, 1, 2, 2, 3, 3, 4, 4]);
    }

    #[test]
    fn test_edge_value_goes_to_lower_bin() {
        let c = Classification {
            breaks: vec![0.0, 10.0, 20.0],
        };
        assert_eq!(c.bin_of(0.0), Some(0));
        assert_eq!(c.bin_of(10.0), Some(0));
        assert_eq!(c.bin_of(10.5), Some(1));
        assert_eq!(c.bin_of(20.0), Some(1));
    }

    #[test]
    fn test_no_matches_no_classification() {
        let c = counties(&["Pest"]);
        let result = DatasetJoiner::default().join(&c, &[]);
        assert!(result.classification.breaks.is_empty());
        assert_eq!(result.features[0].bin, None);
        assert_eq!(result.no_data().count(), 1);
    }

    #[test]
    fn test_single_value_lands_in_first_bin() {
        let c = counties(&["Pest"]);
        let result = DatasetJoiner::default().join(&c, &[TabularRow::new("Pest", 42.0)]);
        assert_eq!(result.features[0].bin, Some(0));
        assert_eq!(result.classification.bins(), 5);
    }

    #[test]
    fn test_nan_cell_is_no_data() {
        let data = "County;Population\nA;1\nB;2\nC;3\nD;NaN\n";
        let layout = crate::dataset::TableLayout {
            delimiter: b';',
            key_column: "County".into(),
            value_column: "Population".into(),
        };
        let rows = crate::dataset::read_rows(data.as_bytes(), &layout).unwrap();
        let result = DatasetJoiner::default().join(&counties(&["A", "B", "C", "D"]), &rows);

        assert!(result.classification.breaks.iter().all(|b| b.is_finite()));
        assert_eq!(result.features[3].value, None);
        assert_eq!(result.features[3].bin, None);
        assert_eq!(result.matched(), 3);
    }

    #[test]
    fn test_non_finite_rows_never_classified() {
        let c = counties(&["A", "B", "C"]);
        let rows = [
            TabularRow::new("A", 1.0),
            TabularRow::new("B", f64::NAN),
            TabularRow::new("C", f64::INFINITY),
        ];
        let result = DatasetJoiner::default().join(&c, &rows);

        assert_eq!(result.classification.breaks, vec![1.0; 6]);
        assert_eq!((result.features[1].value, result.features[1].bin), (None, None));
        assert_eq!((result.features[2].value, result.features[2].bin), (None, None));
        assert_eq!(result.classification.bin_of(f64::NAN), None);
    }

    #[test]
    fn test_join_does_not_touch_collection() {
        let c = counties(&["Pest", "Budapest"]);
        let before = c.clone();
        let _ = DatasetJoiner::default().join(&c, &[TabularRow::new("Pest", 1.0)]);
        assert_eq!(c, before);
    }
}
