//! Canned lifestyle suggestions keyed by lab test and status.

use crate::TestStatus;

/// Lab tests with dedicated reference data and lifestyle guidance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LabTest {
    VitaminD,
    CReactiveProtein,
    Magnesium,
    Ferritin,
    VitaminB12,
    HemoglobinA1c,
    LdlCholesterol,
    Tsh,
}

impl LabTest {
    pub const ALL: [LabTest; 8] = [
        LabTest::VitaminD,
        LabTest::CReactiveProtein,
        LabTest::Magnesium,
        LabTest::Ferritin,
        LabTest::VitaminB12,
        LabTest::HemoglobinA1c,
        LabTest::LdlCholesterol,
        LabTest::Tsh,
    ];

    /// Canonical test name as reported by the lab.
    pub fn name(self) -> &'static str {
        match self {
            LabTest::VitaminD => "Vitamin D (25-OH)",
            LabTest::CReactiveProtein => "C-Reactive Protein",
            LabTest::Magnesium => "Magnesium, Serum",
            LabTest::Ferritin => "Ferritin",
            LabTest::VitaminB12 => "Vitamin B12",
            LabTest::HemoglobinA1c => "Hemoglobin A1c",
            LabTest::LdlCholesterol => "LDL Cholesterol",
            LabTest::Tsh => "Thyroid Stimulating Hormone",
        }
    }

    /// Exact match on the canonical name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|test| test.name() == name)
    }
}

/// Suggestions for `test_name` at `status`. Unknown tests yield nothing.
pub fn lifestyle_recommendations(test_name: &str, status: TestStatus) -> Vec<String> {
    let Some(test) = LabTest::from_name(test_name) else {
        return Vec::new();
    };

    suggestions(test, status)
        .iter()
        .map(|text| text.to_string())
        .collect()
}

fn suggestions(test: LabTest, status: TestStatus) -> &'static [&'static str] {
    use TestStatus::{High, Low, Normal};

    match (test, status) {
        (LabTest::VitaminD, Low) => &[
            "Get 15-20 minutes of midday sun exposure on most days when possible.",
            "Include vitamin D rich foods such as fatty fish, egg yolks and fortified dairy.",
            "Take vitamin D with a meal that contains fat to improve absorption.",
        ],
        (LabTest::CReactiveProtein, High) => &[
            "Favor an anti-inflammatory diet rich in vegetables, berries, olive oil and oily fish.",
            "Aim for at least 150 minutes of moderate exercise per week.",
            "Prioritize 7-9 hours of sleep and practice stress reduction.",
            "Limit refined sugar, processed meat and alcohol.",
        ],
        (LabTest::Magnesium, Low) => &[
            "Eat more leafy greens, nuts, seeds, legumes and whole grains.",
            "Reduce caffeine and alcohol, which increase magnesium loss.",
        ],
        (LabTest::Ferritin, Low) => &[
            "Include iron rich foods such as red meat, lentils, spinach and fortified cereals.",
            "Pair iron rich meals with vitamin C sources to improve absorption.",
            "Avoid tea and coffee within an hour of iron rich meals.",
        ],
        (LabTest::VitaminB12, Low) => &[
            "Include B12 sources such as fish, eggs, dairy or fortified plant foods.",
            "Ask your doctor whether absorption issues or medications could be a factor.",
        ],
        (LabTest::HemoglobinA1c, High) => &[
            "Reduce refined carbohydrates and sugary drinks.",
            "Take a short walk after meals to help glucose control.",
            "Increase fiber intake from vegetables, legumes and whole grains.",
        ],
        (LabTest::LdlCholesterol, High) => &[
            "Replace saturated fats with unsaturated fats from nuts, seeds and olive oil.",
            "Add soluble fiber such as oats, beans and psyllium.",
            "Exercise regularly to support a healthier lipid profile.",
        ],
        (LabTest::Tsh, High) => &[
            "Discuss follow-up thyroid testing (free T4, thyroid antibodies) with your doctor.",
            "Include selenium and iodine sources such as seafood, eggs and dairy unless advised otherwise.",
        ],
        (LabTest::Tsh, Low) => &[
            "Avoid high-dose biotin and iodine supplements before retesting.",
        ],
        (LabTest::VitaminD, Normal | High)
        | (LabTest::CReactiveProtein, Low | Normal)
        | (LabTest::Magnesium, Normal | High)
        | (LabTest::Ferritin, Normal | High)
        | (LabTest::VitaminB12, Normal | High)
        | (LabTest::HemoglobinA1c, Low | Normal)
        | (LabTest::LdlCholesterol, Low | Normal)
        | (LabTest::Tsh, Normal) => &[],
    }
}
