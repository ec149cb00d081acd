//! Change detection between two snapshots

use crate::models::StatusRecord;

/// Records of `new` that are not value-equal to any record of `old`
///
/// Order follows `new`. Reordering is not a change, an edited record counts as
/// a new one, and records missing from `new` are not reported.
pub fn diff(new: &[StatusRecord], old: &[StatusRecord]) -> Vec<StatusRecord> {
    new.iter()
        .filter(|record| !old.contains(record))
        .cloned()
        .collect()
}
