use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Placeholder used for titles and links that have not been filled in yet.
pub const PLACEHOLDER: &str = "TO_BE_FILLED";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum YearStructure {
    Semesters,
    Units,
}

impl YearStructure {
    pub fn as_str(&self) -> &'static str {
        match self {
            YearStructure::Semesters => "semesters",
            YearStructure::Units => "units",
        }
    }
}

impl fmt::Display for YearStructure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for YearStructure {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "semesters" => Ok(YearStructure::Semesters),
            "units" => Ok(YearStructure::Units),
            other => Err(format!("unknown year structure: {}", other)),
        }
    }
}

/// A year with its whole subtree, as delivered by `GET /api/years` and
/// accepted by the sync endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Year {
    pub id: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub color: String,
    #[serde(default)]
    pub icon: String,
    pub structure: YearStructure,
    #[serde(default)]
    pub semesters: Vec<Semester>,
    #[serde(default)]
    pub units: Vec<Unit>,
    #[serde(default)]
    pub standalone_modules: Vec<Module>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Semester {
    pub id: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub year_id: Option<String>,
    #[serde(default)]
    pub modules: Vec<Module>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Unit {
    pub id: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub year_id: Option<String>,
    #[serde(default)]
    pub modules: Vec<Module>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Module {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub is_shared: bool,
    #[serde(default)]
    pub is_standalone: bool,
    #[serde(default)]
    pub unit_id: Option<String>,
    #[serde(default)]
    pub standalone_year_id: Option<String>,
    #[serde(default)]
    pub lessons: Vec<Material>,
    #[serde(default)]
    pub exams: Vec<Material>,
}

/// A lesson or an exam: a titled link to an externally hosted file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Material {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub drive_url: String,
    #[serde(default)]
    pub module_id: Option<String>,
}

impl Year {
    /// Every module of the year once, in display order.
    ///
    /// Semester years list each module id once even when it is shared between
    /// semesters. Unit years list standalone modules before unit modules.
    pub fn all_modules(&self) -> Vec<&Module> {
        match self.structure {
            YearStructure::Semesters => {
                let mut seen = std::collections::HashSet::new();
                self.semesters
                    .iter()
                    .flat_map(|s| s.modules.iter())
                    .filter(|m| seen.insert(m.id.as_str()))
                    .collect()
            }
            YearStructure::Units => self
                .standalone_modules
                .iter()
                .chain(self.units.iter().flat_map(|u| u.modules.iter()))
                .collect(),
        }
    }
}

impl Module {
    pub fn is_placeholder(&self) -> bool {
        self.title == PLACEHOLDER
    }
}

/// Search hit: a module plus the year it was found in.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchHit {
    #[serde(flatten)]
    pub module: Module,
    pub year_id: String,
    pub year_label: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn module(id: &str) -> Module {
        Module {
            id: id.to_string(),
            title: PLACEHOLDER.to_string(),
            is_shared: false,
            is_standalone: false,
            unit_id: None,
            standalone_year_id: None,
            lessons: Vec::new(),
            exams: Vec::new(),
        }
    }

    #[test]
    fn deserializes_sparse_year() {
        let year: Year = serde_json::from_str(
            r#"{"id":"year-9","structure":"units","units":[{"id":"u1","modules":[{"id":"m1"}]}]}"#,
        )
        .unwrap();

        assert_eq!(year.structure, YearStructure::Units);
        assert!(year.semesters.is_empty());
        assert_eq!(year.units[0].modules[0].id, "m1");
        assert!(year.units[0].modules[0].lessons.is_empty());
    }

    #[test]
    fn rejects_unknown_structure() {
        let parsed = serde_json::from_str::<Year>(r#"{"id":"y","structure":"terms"}"#);
        assert!(parsed.is_err());
    }

    #[test]
    fn shared_modules_listed_once() {
        let mut shared = module("shared");
        shared.is_shared = true;
        let year = Year {
            id: "year-1".into(),
            label: String::new(),
            color: String::new(),
            icon: String::new(),
            structure: YearStructure::Semesters,
            semesters: vec![
                Semester {
                    id: "s1".into(),
                    label: String::new(),
                    year_id: None,
                    modules: vec![shared.clone(), module("a")],
                },
                Semester {
                    id: "s2".into(),
                    label: String::new(),
                    year_id: None,
                    modules: vec![shared, module("b")],
                },
            ],
            units: Vec::new(),
            standalone_modules: Vec::new(),
        };

        let ids: Vec<&str> = year.all_modules().iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["shared", "a", "b"]);
    }

    #[test]
    fn search_hit_flattens_module() {
        let hit = SearchHit {
            module: module("m1"),
            year_id: "year-2".into(),
            year_label: "Y2".into(),
        };
        let value = serde_json::to_value(&hit).unwrap();
        assert_eq!(value["id"], "m1");
        assert_eq!(value["yearId"], "year-2");
        assert_eq!(value["yearLabel"], "Y2");
        assert!(value["lessons"].as_array().unwrap().is_empty());
    }
}
