//! Supplement lookup for a single result and ranking across a panel.

use crate::{
    AnalysisResult, NutrientReferenceTable, RankedSupplement, RelatedSupplement, TestStatus,
};

/// Entries of the test's mapping that apply to `status`, in table order.
pub fn matching_supplements<'a>(
    reference: &'a NutrientReferenceTable,
    test_name: &str,
    status: TestStatus,
) -> Vec<&'a RelatedSupplement> {
    let Some(mapping) = reference.lookup(test_name) else {
        return Vec::new();
    };

    mapping
        .related_supplements
        .iter()
        .filter(|entry| entry.condition.matches(status))
        .collect()
}

/// Supplement ids for the test, or `None` when nothing applies
/// (unmapped test, or no entry for this status).
pub fn recommend_supplements(
    reference: &NutrientReferenceTable,
    test_name: &str,
    status: TestStatus,
) -> Option<Vec<String>> {
    let ids: Vec<String> = matching_supplements(reference, test_name, status)
        .into_iter()
        .map(|entry| entry.supplement_id.clone())
        .collect();

    if ids.is_empty() {
        None
    } else {
        Some(ids)
    }
}

/// Every supplement recommended across `analyses`, once, most urgent first.
///
/// A supplement recommended by several tests keeps the most urgent priority
/// it was given and the test that first recommended it. Ties keep panel order.
pub fn rank_supplements(
    reference: &NutrientReferenceTable,
    analyses: &[AnalysisResult],
) -> Vec<RankedSupplement> {
    let mut ranked: Vec<RankedSupplement> = Vec::new();

    for analysis in analyses {
        for entry in matching_supplements(reference, &analysis.test_name, analysis.status) {
            match ranked
                .iter_mut()
                .find(|existing| existing.supplement_id == entry.supplement_id)
            {
                Some(existing) => {
                    if entry.priority.rank() < existing.priority.rank() {
                        existing.priority = entry.priority;
                    }
                }
                None => ranked.push(RankedSupplement {
                    supplement_id: entry.supplement_id.clone(),
                    priority: entry.priority,
                    test_name: analysis.test_name.clone(),
                }),
            }
        }
    }

    // `sort_by_key` is stable.
    ranked.sort_by_key(|supplement| supplement.priority.rank());
    ranked
}
