//! Nutrient reference table: which supplements relate to which lab test.

use std::collections::{hash_map::Entry, HashMap};

use serde::{Deserialize, Serialize};

use crate::{LabTest, PortalError, TestStatus};

/// Status a supplement entry applies to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SupplementCondition {
    Low,
    High,
    Both,
}

impl SupplementCondition {
    /// `Both` matches every status; `Low`/`High` never match a normal result.
    pub fn matches(self, status: TestStatus) -> bool {
        match (self, status) {
            (SupplementCondition::Both, _) => true,
            (SupplementCondition::Low, TestStatus::Low) => true,
            (SupplementCondition::High, TestStatus::High) => true,
            _ => false,
        }
    }
}

/// Ranking bucket of a supplement entry. Independent of severity.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum SupplementPriority {
    High,
    Medium,
    Low,
}

impl SupplementPriority {
    /// Sort key, most urgent first.
    pub fn rank(self) -> u8 {
        match self {
            SupplementPriority::High => 0,
            SupplementPriority::Medium => 1,
            SupplementPriority::Low => 2,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RelatedSupplement {
    pub supplement_id: String,
    pub condition: SupplementCondition,
    pub priority: SupplementPriority,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NutrientMapping {
    pub test_name: String,
    pub related_supplements: Vec<RelatedSupplement>,
}

/// Read-only lookup from test name to its nutrient mapping.
#[derive(Debug, Clone, Default)]
pub struct NutrientReferenceTable {
    mappings: HashMap<String, NutrientMapping>,
}

impl NutrientReferenceTable {
    /// Build a table, rejecting a test name that appears twice.
    pub fn new(mappings: Vec<NutrientMapping>) -> Result<Self, PortalError> {
        let mut by_name = HashMap::with_capacity(mappings.len());
        for mapping in mappings {
            match by_name.entry(mapping.test_name.clone()) {
                Entry::Occupied(_) => return Err(PortalError::DuplicateMapping(mapping.test_name)),
                Entry::Vacant(slot) => {
                    slot.insert(mapping);
                }
            }
        }
        Ok(Self { mappings: by_name })
    }

    /// Built-in table for the lab tests the portal knows about.
    pub fn standard() -> Self {
        use SupplementCondition::{Both, High, Low};
        use SupplementPriority as P;

        let rows = [
            (
                LabTest::VitaminD,
                vec![
                    related("1", Low, P::High),
                    related("2", Low, P::Medium),
                    related("3", Low, P::Low),
                ],
            ),
            (
                LabTest::CReactiveProtein,
                vec![related("4", High, P::High), related("5", High, P::Medium)],
            ),
            (LabTest::Magnesium, vec![related("3", Low, P::High)]),
            (
                LabTest::Ferritin,
                vec![related("6", Low, P::High), related("7", Low, P::Medium)],
            ),
            (
                LabTest::VitaminB12,
                vec![related("8", Low, P::High), related("9", Low, P::Low)],
            ),
            (
                LabTest::HemoglobinA1c,
                vec![related("10", High, P::Medium), related("11", High, P::Low)],
            ),
            (
                LabTest::LdlCholesterol,
                vec![related("4", High, P::Medium), related("12", High, P::Medium)],
            ),
            (LabTest::Tsh, vec![related("13", Both, P::Low)]),
        ];

        let mappings = rows
            .into_iter()
            .map(|(test, related_supplements)| {
                (
                    test.name().to_string(),
                    NutrientMapping {
                        test_name: test.name().to_string(),
                        related_supplements,
                    },
                )
            })
            .collect();

        Self { mappings }
    }

    pub fn lookup(&self, test_name: &str) -> Option<&NutrientMapping> {
        self.mappings.get(test_name)
    }

    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }
}

fn related(
    supplement_id: &str,
    condition: SupplementCondition,
    priority: SupplementPriority,
) -> RelatedSupplement {
    RelatedSupplement {
        supplement_id: supplement_id.to_string(),
        condition,
        priority,
    }
}
