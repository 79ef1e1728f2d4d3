//! Single-column table sorting.

use std::cmp::Ordering;

use crate::model::Record;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn toggled(self) -> Self {
        match self {
            SortDirection::Ascending => SortDirection::Descending,
            SortDirection::Descending => SortDirection::Ascending,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Ascending => "asc",
            SortDirection::Descending => "desc",
        }
    }
}

/// Active sort column and direction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortState {
    pub key: String,
    pub direction: SortDirection,
}

impl SortState {
    pub fn ascending(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            direction: SortDirection::Ascending,
        }
    }
}

/// Compare two records by the display text of one column, ignoring case
/// first and falling back to the raw text.
pub fn compare_by(key: &str, a: &Record, b: &Record) -> Ordering {
    let left = a.display(key);
    let right = b.display(key);
    left.to_lowercase()
        .cmp(&right.to_lowercase())
        .then_with(|| left.cmp(&right))
}

/// Stable sort. Equal keys keep their input order in both directions.
pub fn sort_records(rows: &mut [Record], sort: &SortState) {
    match sort.direction {
        SortDirection::Ascending => rows.sort_by(|a, b| compare_by(&sort.key, a, b)),
        SortDirection::Descending => rows.sort_by(|a, b| compare_by(&sort.key, a, b).reverse()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_case_insensitive_then_raw() {
        let a = Record::new().with("name", "apple");
        let b = Record::new().with("name", "Banana");
        let c = Record::new().with("name", "Apple");
        assert_eq!(compare_by("name", &a, &b), Ordering::Less);
        assert_eq!(compare_by("name", &c, &a), Ordering::Less);
    }

    #[test]
    fn test_descending_keeps_ties_in_input_order() {
        let mut rows = vec![
            Record::new().with_id(1).with("group", "b"),
            Record::new().with_id(2).with("group", "a"),
            Record::new().with_id(3).with("group", "b"),
        ];
        let mut sort = SortState::ascending("group");
        sort.direction = SortDirection::Descending;
        sort_records(&mut rows, &sort);
        let ids: Vec<_> = rows.iter().map(|r| r.id.unwrap()).collect();
        assert_eq!(ids, vec![1, 3, 2]);
    }
}
