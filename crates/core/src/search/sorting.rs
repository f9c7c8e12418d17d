use std::cmp::Ordering;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::result::ResultRow;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

impl FromStr for SortDirection {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "asc" | "ascending" => Ok(Self::Ascending),
            "desc" | "descending" => Ok(Self::Descending),
            other => Err(format!("unsupported sort direction `{other}` (expected asc|desc)")),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceSorting {
    #[serde(default)]
    pub direction: SortDirection,
}

impl PriceSorting {
    pub fn ascending() -> Self {
        Self { direction: SortDirection::Ascending }
    }

    pub fn descending() -> Self {
        Self { direction: SortDirection::Descending }
    }

    pub fn compare(&self, left: &ResultRow, right: &ResultRow) -> Ordering {
        match self.direction {
            SortDirection::Ascending => left.price.cmp(&right.price),
            SortDirection::Descending => right.price.cmp(&left.price),
        }
    }
}

pub trait ResultSorter: Send + Sync {
    fn sort(&self, rows: &mut [ResultRow], sorting: Option<&PriceSorting>);
}

/// Stable price sort: rows with equal prices keep their enumeration order in
/// both directions.
#[derive(Default)]
pub struct StablePriceSorter;

impl ResultSorter for StablePriceSorter {
    fn sort(&self, rows: &mut [ResultRow], sorting: Option<&PriceSorting>) {
        if let Some(sorting) = sorting {
            sort_rows(rows, sorting);
        }
    }
}

pub fn sort_rows(rows: &mut [ResultRow], sorting: &PriceSorting) {
    rows.sort_by(|left, right| sorting.compare(left, right));
}
