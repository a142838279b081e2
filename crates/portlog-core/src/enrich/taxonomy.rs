use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OperationCategory {
    Loading,
    Discharging,
    Shifting,
    Anchorage,
    Other,
}

impl OperationCategory {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Loading => "Loading",
            Self::Discharging => "Discharging",
            Self::Shifting => "Shifting",
            Self::Anchorage => "Anchorage",
            Self::Other => "Other",
        }
    }
}

impl std::fmt::Display for OperationCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

const DEFAULT_RULES: &[(OperationCategory, &[&str])] = &[
    (OperationCategory::Loading, &["load", "commence", "start"]),
    (OperationCategory::Discharging, &["discharge", "complete", "finish"]),
    (OperationCategory::Shifting, &["shift"]),
    (OperationCategory::Anchorage, &["anchorage"]),
];

/// Ordered keyword table mapping a line to an operation category. Rules are
/// tried top to bottom and the first keyword found as a substring of the
/// lower-cased line decides.
#[derive(Debug, Clone)]
pub struct OperationTaxonomy {
    rules: Vec<(OperationCategory, Vec<String>)>,
}

impl OperationTaxonomy {
    #[must_use]
    pub fn new(rules: Vec<(OperationCategory, Vec<String>)>) -> Self {
        let rules = rules
            .into_iter()
            .map(|(category, keywords)| {
                (
                    category,
                    keywords.into_iter().map(|k| k.to_lowercase()).collect(),
                )
            })
            .collect();
        Self { rules }
    }

    #[must_use]
    pub fn classify(&self, line: &str) -> OperationCategory {
        let lower = line.to_lowercase();
        self.rules
            .iter()
            .find(|(_, keywords)| keywords.iter().any(|k| lower.contains(k.as_str())))
            .map_or(OperationCategory::Other, |(category, _)| *category)
    }

    pub fn rules(&self) -> impl Iterator<Item = (OperationCategory, &[String])> {
        self.rules.iter().map(|(c, k)| (*c, k.as_slice()))
    }
}

impl Default for OperationTaxonomy {
    fn default() -> Self {
        Self::new(
            DEFAULT_RULES
                .iter()
                .map(|(category, keywords)| {
                    (*category, keywords.iter().map(|k| (*k).to_string()).collect())
                })
                .collect(),
        )
    }
}
