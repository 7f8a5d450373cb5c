//! Integer label encoding for categorical values.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Maps each observed category to its position in the sorted class list.
///
/// Values never seen during [`fit`](Self::fit) encode to `0`, the code of
/// the first known class.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelEncoder {
    classes: Vec<String>,
}

impl LabelEncoder {
    /// Fit on the observed values. Classes are sorted and deduplicated.
    pub fn fit<'a, I>(values: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut classes: Vec<String> = values.into_iter().map(str::to_string).collect();
        classes.sort();
        classes.dedup();
        Self { classes }
    }

    /// Sorted classes; a class's code is its index here.
    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn n_classes(&self) -> usize {
        self.classes.len()
    }

    /// Code of a known value.
    pub fn code(&self, value: &str) -> Option<usize> {
        self.classes
            .binary_search_by(|c| c.as_str().cmp(value))
            .ok()
    }

    /// Code of `value`, or `0` when the value was not seen during fit.
    pub fn encode_or_first(&self, value: &str) -> usize {
        self.code(value).unwrap_or(0)
    }

    /// Class at `code`.
    pub fn decode(&self, code: usize) -> Option<&str> {
        self.classes.get(code).map(String::as_str)
    }

    /// Category to code map, as exported in pipeline metadata.
    pub fn mapping(&self) -> BTreeMap<String, u32> {
        self.classes
            .iter()
            .enumerate()
            .map(|(i, c)| (c.clone(), i as u32))
            .collect()
    }

    /// Code to category map, as reported for classification targets.
    pub fn inverse_mapping(&self) -> BTreeMap<usize, String> {
        self.classes.iter().cloned().enumerate().collect()
    }
}
