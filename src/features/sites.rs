//! Distinct sites touched per session.

use super::{Stage, SITE_PREFIX};
use crate::error::{FeatureError, Result};
use crate::table::{Column, Dataset, Scalar};
use std::collections::HashSet;

/// `num_sites`, plus the opt-in `all_sites` list of distinct sites in first-visit order.
#[derive(Debug, Clone, Copy, Default)]
pub struct UniqueSites {
    pub emit_all_sites: bool,
}

impl UniqueSites {
    pub fn new(emit_all_sites: bool) -> Self {
        Self { emit_all_sites }
    }
}

impl Stage for UniqueSites {
    fn name(&self) -> &'static str {
        "unique_sites"
    }

    fn apply(&self, dataset: Dataset) -> Result<Dataset> {
        let mut site_columns = Vec::new();
        for (_, name) in dataset.indexed_family(SITE_PREFIX) {
            let column = dataset
                .column(name)
                .ok_or_else(|| FeatureError::Schema(format!("missing column '{name}'")))?;
            if !matches!(column, Column::Int(_) | Column::Text(_)) {
                return Err(FeatureError::Schema(format!(
                    "column '{name}' is {}, expected site identifiers",
                    column.kind()
                )));
            }
            site_columns.push(column);
        }
        if site_columns.is_empty() {
            return Err(FeatureError::Schema("no site columns".into()));
        }

        let mut all_sites = Vec::with_capacity(dataset.n_rows());
        let mut num_sites = Vec::with_capacity(dataset.n_rows());
        for row in 0..dataset.n_rows() {
            let mut seen = HashSet::new();
            let distinct: Vec<Scalar> = site_columns
                .iter()
                .filter_map(|c| c.scalar_at(row))
                .filter(|s| seen.insert(s.clone()))
                .collect();
            num_sites.push(Some(distinct.len() as i64));
            all_sites.push(Some(distinct));
        }

        let dataset = if self.emit_all_sites {
            dataset.with_column("all_sites", Column::List(all_sites))?
        } else {
            dataset
        };
        dataset.with_column("num_sites", Column::Int(num_sites))
    }
}
