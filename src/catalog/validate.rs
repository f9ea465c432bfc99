use std::collections::HashMap;

use thiserror::Error;

use crate::models::{Year, YearStructure};

/// Most semesters a semester-structured year may carry.
pub const MAX_SEMESTERS: usize = 2;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogIssue {
    #[error("year at index {0} has an empty id")]
    EmptyYearId(usize),

    #[error("duplicate year id {0}")]
    DuplicateYear(String),

    #[error("year {year} has {count} semesters, at most 2 are allowed")]
    TooManySemesters { year: String, count: usize },

    #[error("year {0} is structured by semesters and cannot hold units or standalone modules")]
    UnitsInSemesterYear(String),

    #[error("year {0} is structured by units and cannot hold semesters")]
    SemestersInUnitYear(String),

    #[error("empty {kind} id in year {year}")]
    EmptyId { kind: &'static str, year: String },

    #[error("duplicate {kind} id {id}")]
    DuplicateGroup { kind: &'static str, id: String },

    #[error("module {0} has more than one home")]
    ModuleHome(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Home<'a> {
    Semesters(&'a str),
    Unit(&'a str),
    Standalone(&'a str),
}

/// Checks a posted catalog before it replaces the stored one.
///
/// A module id may repeat across the semesters of one year (a shared module)
/// but otherwise has exactly one home.
pub fn validate_catalog(years: &[Year]) -> Result<(), CatalogIssue> {
    let mut year_ids = HashMap::new();
    let mut group_ids: HashMap<&str, &'static str> = HashMap::new();
    let mut homes: HashMap<&str, Home<'_>> = HashMap::new();

    for (idx, year) in years.iter().enumerate() {
        if year.id.trim().is_empty() {
            return Err(CatalogIssue::EmptyYearId(idx));
        }
        if year_ids.insert(year.id.as_str(), idx).is_some() {
            return Err(CatalogIssue::DuplicateYear(year.id.clone()));
        }

        match year.structure {
            YearStructure::Semesters => {
                if !year.units.is_empty() || !year.standalone_modules.is_empty() {
                    return Err(CatalogIssue::UnitsInSemesterYear(year.id.clone()));
                }
                if year.semesters.len() > MAX_SEMESTERS {
                    return Err(CatalogIssue::TooManySemesters {
                        year: year.id.clone(),
                        count: year.semesters.len(),
                    });
                }
            }
            YearStructure::Units => {
                if !year.semesters.is_empty() {
                    return Err(CatalogIssue::SemestersInUnitYear(year.id.clone()));
                }
            }
        }

        let groups = year
            .semesters
            .iter()
            .map(|s| ("semester", s.id.as_str()))
            .chain(year.units.iter().map(|u| ("unit", u.id.as_str())));
        for (kind, id) in groups {
            if id.trim().is_empty() {
                return Err(CatalogIssue::EmptyId {
                    kind,
                    year: year.id.clone(),
                });
            }
            if group_ids.insert(id, kind).is_some() {
                return Err(CatalogIssue::DuplicateGroup {
                    kind,
                    id: id.to_string(),
                });
            }
        }

        let year_id = year.id.as_str();
        let placements = year
            .semesters
            .iter()
            .flat_map(move |s| s.modules.iter().map(move |m| (m, Home::Semesters(year_id))))
            .chain(
                year.units
                    .iter()
                    .flat_map(|u| u.modules.iter().map(move |m| (m, Home::Unit(u.id.as_str())))),
            )
            .chain(
                year.standalone_modules
                    .iter()
                    .map(move |m| (m, Home::Standalone(year_id))),
            );

        for (module, home) in placements {
            if module.id.trim().is_empty() {
                return Err(CatalogIssue::EmptyId {
                    kind: "module",
                    year: year.id.clone(),
                });
            }
            match homes.get(module.id.as_str()) {
                None => {
                    homes.insert(module.id.as_str(), home);
                }
                Some(existing) if *existing == home && matches!(home, Home::Semesters(_)) => {}
                Some(_) => return Err(CatalogIssue::ModuleHome(module.id.clone())),
            }
        }
    }

    Ok(())
}
