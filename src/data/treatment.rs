use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use super::model::{GeneRow, Measurement};

/// Category assigned to treatment codes that have no mapping entry.
pub const UNKNOWN_TREATMENT: &str = "Unknown";

/// Treatment codes of the anticancer drug screen and the compound each was
/// treated with. Two replicates per compound, six vehicle controls.
const DEFAULT_TREATMENTS: &[(&str, &str)] = &[
    ("TT-235", "DMSO"),
    ("TT-236", "DMSO"),
    ("TT-237", "DMSO"),
    ("TT-238", "DMSO"),
    ("TT-239", "DMSO"),
    ("TT-240", "DMSO"),
    ("TT-241", "Doxorubicin"),
    ("TT-242", "Doxorubicin"),
    ("TT-243", "Bortezomib"),
    ("TT-244", "Bortezomib"),
    ("TT-245", "Tegretol"),
    ("TT-246", "Tegretol"),
    ("TT-247", "WZ8040"),
    ("TT-248", "WZ8040"),
    ("TT-249", "PHA-767491"),
    ("TT-250", "PHA-767491"),
    ("TT-251", "BI 2536"),
    ("TT-252", "BI 2536"),
    ("TT-253", "Daunorubicin"),
    ("TT-254", "Daunorubicin"),
    ("TT-255", "Nitrendipine"),
    ("TT-256", "Nitrendipine"),
    ("TT-257", "Solifenacin"),
    ("TT-258", "Solifenacin"),
];

// ---------------------------------------------------------------------------
// TreatmentMapping – treatment code → treatment type
// ---------------------------------------------------------------------------

/// Fixed lookup from treatment code (column id) to treatment type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreatmentMapping {
    types: HashMap<String, String>,
}

impl Default for TreatmentMapping {
    fn default() -> Self {
        DEFAULT_TREATMENTS.iter().copied().collect()
    }
}

impl<C: Into<String>, T: Into<String>> FromIterator<(C, T)> for TreatmentMapping {
    fn from_iter<I: IntoIterator<Item = (C, T)>>(iter: I) -> Self {
        Self {
            types: iter
                .into_iter()
                .map(|(code, ty)| (code.into(), ty.into()))
                .collect(),
        }
    }
}

impl From<BTreeMap<String, String>> for TreatmentMapping {
    fn from(map: BTreeMap<String, String>) -> Self {
        map.into_iter().collect()
    }
}

impl TreatmentMapping {
    /// Treatment type for `code`, or [`UNKNOWN_TREATMENT`].
    pub fn treatment_type<'a>(&'a self, code: &str) -> &'a str {
        self.types
            .get(code)
            .map(String::as_str)
            .unwrap_or(UNKNOWN_TREATMENT)
    }

    pub fn contains(&self, code: &str) -> bool {
        self.types.contains_key(code)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// All mapped codes, sorted.
    pub fn codes(&self) -> Vec<&str> {
        let mut codes: Vec<&str> = self.types.keys().map(String::as_str).collect();
        codes.sort_unstable();
        codes
    }

    /// Codes from `codes` that have no mapping entry, in input order.
    pub fn unmapped<'a>(&self, codes: &'a [String]) -> Vec<&'a str> {
        codes
            .iter()
            .map(String::as_str)
            .filter(|c| !self.contains(c))
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Grouping
// ---------------------------------------------------------------------------

/// Entries of one gene row that share a treatment type, in column order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TreatmentGroup {
    pub treatment_type: String,
    pub measurements: Vec<Measurement>,
}

impl TreatmentGroup {
    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.measurements.iter().map(|m| m.value)
    }
}

/// Group the entries of `row` by treatment type.
///
/// Groups appear in order of the first column carrying that type; unmapped
/// codes are collected under [`UNKNOWN_TREATMENT`] so no entry is dropped.
pub fn group_by_treatment(row: &GeneRow, mapping: &TreatmentMapping) -> Vec<TreatmentGroup> {
    let mut groups: Vec<TreatmentGroup> = Vec::new();
    let mut slot: HashMap<&str, usize> = HashMap::new();

    for m in &row.measurements {
        let ty = mapping.treatment_type(&m.treatment);
        let idx = *slot.entry(ty).or_insert_with(|| {
            groups.push(TreatmentGroup {
                treatment_type: ty.to_string(),
                measurements: Vec::new(),
            });
            groups.len() - 1
        });
        groups[idx].measurements.push(m.clone());
    }

    groups
}
