//! Optimistic in-memory editing of the catalog.
//!
//! [`AdminStore`] holds a full copy of the tree. Mutations only touch that
//! copy and mark it dirty; [`AdminStore::save`] pushes the whole tree through
//! the sync endpoint in one go.

use serde_json::Value;
use thiserror::Error;

use crate::catalog::default_catalog;
use crate::client::{CatalogClient, ClientError};
use crate::models::{Material, MaterialKind, Module, Unit, Year, YearStructure, generate_id};
use crate::services::SyncStats;

pub const NEW_UNIT_LABEL: &str = "وحدة جديدة";
pub const NEW_MODULE_TITLE: &str = "موديل جديد";
pub const NEW_STANDALONE_TITLE: &str = "موديل مستقل جديد";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ImportError {
    #[error("Invalid JSON: {0}")]
    Parse(String),

    #[error("Invalid format")]
    InvalidFormat,

    #[error("Missing required fields")]
    MissingFields,
}

/// Where a module lives inside its year.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Container<'a> {
    /// A semester or a unit, by id.
    Group(&'a str),
    Standalone,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaterialField {
    Title,
    DriveUrl,
}

#[derive(Debug, Clone)]
pub struct AdminStore {
    data: Vec<Year>,
    has_unsaved_changes: bool,
    is_saving: bool,
}

impl Default for AdminStore {
    fn default() -> Self {
        Self::new(default_catalog())
    }
}

impl AdminStore {
    pub fn new(data: Vec<Year>) -> Self {
        Self {
            data,
            has_unsaved_changes: false,
            is_saving: false,
        }
    }

    pub fn data(&self) -> &[Year] {
        &self.data
    }

    pub fn has_unsaved_changes(&self) -> bool {
        self.has_unsaved_changes
    }

    pub fn is_saving(&self) -> bool {
        self.is_saving
    }

    fn touched<T>(&mut self, result: Option<T>) -> Option<T> {
        if result.is_some() {
            self.has_unsaved_changes = true;
        }
        result
    }

    fn year_mut(&mut self, year_id: &str) -> Option<&mut Year> {
        self.data.iter_mut().find(|y| y.id == year_id)
    }

    fn unit_year_mut(&mut self, year_id: &str) -> Option<&mut Year> {
        self.year_mut(year_id)
            .filter(|y| y.structure == YearStructure::Units)
    }

    fn modules_mut<'s>(&'s mut self, year_id: &str, container: Container<'_>) -> Option<&'s mut Vec<Module>> {
        let year = self.year_mut(year_id)?;
        match container {
            Container::Standalone => Some(&mut year.standalone_modules),
            Container::Group(group_id) => match year.structure {
                YearStructure::Semesters => year
                    .semesters
                    .iter_mut()
                    .find(|s| s.id == group_id)
                    .map(|s| &mut s.modules),
                YearStructure::Units => year
                    .units
                    .iter_mut()
                    .find(|u| u.id == group_id)
                    .map(|u| &mut u.modules),
            },
        }
    }

    fn module_mut(&mut self, year_id: &str, container: Container<'_>, module_id: &str) -> Option<&mut Module> {
        self.modules_mut(year_id, container)?
            .iter_mut()
            .find(|m| m.id == module_id)
    }

    // Units

    pub fn add_unit(&mut self, year_id: &str) -> Option<String> {
        let added = self.unit_year_mut(year_id).map(|year| {
            let id = generate_id("unit");
            year.units.push(Unit {
                id: id.clone(),
                label: NEW_UNIT_LABEL.to_string(),
                year_id: Some(year.id.clone()),
                modules: Vec::new(),
            });
            id
        });
        self.touched(added)
    }

    pub fn delete_unit(&mut self, year_id: &str, unit_id: &str) -> bool {
        let removed = self.unit_year_mut(year_id).and_then(|year| {
            let before = year.units.len();
            year.units.retain(|u| u.id != unit_id);
            (year.units.len() < before).then_some(())
        });
        self.touched(removed).is_some()
    }

    /// Relabels a unit, or a semester in a semester-structured year.
    pub fn rename_unit(&mut self, year_id: &str, unit_id: &str, label: &str) -> bool {
        let renamed = self.year_mut(year_id).and_then(|year| {
            let slot = match year.structure {
                YearStructure::Semesters => year
                    .semesters
                    .iter_mut()
                    .find(|s| s.id == unit_id)
                    .map(|s| &mut s.label),
                YearStructure::Units => year
                    .units
                    .iter_mut()
                    .find(|u| u.id == unit_id)
                    .map(|u| &mut u.label),
            }?;
            *slot = label.to_string();
            Some(())
        });
        self.touched(renamed).is_some()
    }

    /// Puts the year's units in the given order. Unknown ids are skipped and
    /// units left out of `order` are dropped.
    pub fn reorder_units(&mut self, year_id: &str, order: &[&str]) -> bool {
        let reordered = self.unit_year_mut(year_id).map(|year| {
            let mut units = std::mem::take(&mut year.units);
            year.units = order
                .iter()
                .filter_map(|id| {
                    let idx = units.iter().position(|u| u.id == *id)?;
                    Some(units.remove(idx))
                })
                .collect();
        });
        self.touched(reordered).is_some()
    }

    // Standalone modules

    pub fn add_standalone_module(&mut self, year_id: &str) -> Option<String> {
        let added = self.unit_year_mut(year_id).map(|year| {
            let id = generate_id("mod-standalone");
            year.standalone_modules.push(Module {
                is_standalone: true,
                standalone_year_id: Some(year.id.clone()),
                ..empty_module(id.clone(), NEW_STANDALONE_TITLE)
            });
            id
        });
        self.touched(added)
    }

    pub fn delete_standalone_module(&mut self, year_id: &str, module_id: &str) -> bool {
        self.delete_module(year_id, Container::Standalone, module_id)
    }

    pub fn rename_standalone_module(&mut self, year_id: &str, module_id: &str, title: &str) -> bool {
        self.rename_module(year_id, Container::Standalone, module_id, title)
    }

    // Modules

    pub fn add_module(&mut self, year_id: &str, group_id: &str) -> Option<String> {
        let added = self
            .modules_mut(year_id, Container::Group(group_id))
            .map(|modules| {
                let id = generate_id("mod");
                modules.push(empty_module(id.clone(), NEW_MODULE_TITLE));
                id
            });
        self.touched(added)
    }

    /// Removes the module from one container only; a shared module stays in
    /// the other semester.
    pub fn delete_module(&mut self, year_id: &str, container: Container<'_>, module_id: &str) -> bool {
        let removed = self.modules_mut(year_id, container).and_then(|modules| {
            let before = modules.len();
            modules.retain(|m| m.id != module_id);
            (modules.len() < before).then_some(())
        });
        self.touched(removed).is_some()
    }

    pub fn rename_module(&mut self, year_id: &str, container: Container<'_>, module_id: &str, title: &str) -> bool {
        let renamed = self.module_mut(year_id, container, module_id).map(|module| {
            module.title = title.to_string();
        });
        self.touched(renamed).is_some()
    }

    /// Flips `is_shared` on every instance of the module across the
    /// semesters of a semester-structured year.
    pub fn toggle_shared(&mut self, year_id: &str, module_id: &str) -> bool {
        let toggled = self
            .year_mut(year_id)
            .filter(|y| y.structure == YearStructure::Semesters)
            .and_then(|year| {
                let mut hit = false;
                for module in year
                    .semesters
                    .iter_mut()
                    .flat_map(|s| s.modules.iter_mut())
                    .filter(|m| m.id == module_id)
                {
                    module.is_shared = !module.is_shared;
                    hit = true;
                }
                hit.then_some(())
            });
        self.touched(toggled).is_some()
    }

    // Lessons and exams

    fn materials_mut(
        &mut self,
        kind: MaterialKind,
        year_id: &str,
        container: Container<'_>,
        module_id: &str,
    ) -> Option<&mut Vec<Material>> {
        let module = self.module_mut(year_id, container, module_id)?;
        Some(match kind {
            MaterialKind::Lesson => &mut module.lessons,
            MaterialKind::Exam => &mut module.exams,
        })
    }

    fn add_material(
        &mut self,
        kind: MaterialKind,
        year_id: &str,
        container: Container<'_>,
        module_id: &str,
    ) -> Option<String> {
        let added = self
            .materials_mut(kind, year_id, container, module_id)
            .map(|materials| {
                let id = generate_id(kind.id_prefix());
                materials.push(Material {
                    id: id.clone(),
                    title: String::new(),
                    drive_url: String::new(),
                    module_id: None,
                });
                id
            });
        self.touched(added)
    }

    #[allow(clippy::too_many_arguments)]
    fn update_material(
        &mut self,
        kind: MaterialKind,
        year_id: &str,
        container: Container<'_>,
        module_id: &str,
        material_id: &str,
        field: MaterialField,
        value: &str,
    ) -> bool {
        let updated = self
            .materials_mut(kind, year_id, container, module_id)
            .and_then(|materials| materials.iter_mut().find(|m| m.id == material_id))
            .map(|material| match field {
                MaterialField::Title => material.title = value.to_string(),
                MaterialField::DriveUrl => material.drive_url = value.to_string(),
            });
        self.touched(updated).is_some()
    }

    fn delete_material(
        &mut self,
        kind: MaterialKind,
        year_id: &str,
        container: Container<'_>,
        module_id: &str,
        material_id: &str,
    ) -> bool {
        let removed = self
            .materials_mut(kind, year_id, container, module_id)
            .and_then(|materials| {
                let before = materials.len();
                materials.retain(|m| m.id != material_id);
                (materials.len() < before).then_some(())
            });
        self.touched(removed).is_some()
    }

    pub fn add_lesson(&mut self, year_id: &str, container: Container<'_>, module_id: &str) -> Option<String> {
        self.add_material(MaterialKind::Lesson, year_id, container, module_id)
    }

    pub fn update_lesson(
        &mut self,
        year_id: &str,
        container: Container<'_>,
        module_id: &str,
        lesson_id: &str,
        field: MaterialField,
        value: &str,
    ) -> bool {
        self.update_material(MaterialKind::Lesson, year_id, container, module_id, lesson_id, field, value)
    }

    pub fn delete_lesson(&mut self, year_id: &str, container: Container<'_>, module_id: &str, lesson_id: &str) -> bool {
        self.delete_material(MaterialKind::Lesson, year_id, container, module_id, lesson_id)
    }

    pub fn add_exam(&mut self, year_id: &str, container: Container<'_>, module_id: &str) -> Option<String> {
        self.add_material(MaterialKind::Exam, year_id, container, module_id)
    }

    pub fn update_exam(
        &mut self,
        year_id: &str,
        container: Container<'_>,
        module_id: &str,
        exam_id: &str,
        field: MaterialField,
        value: &str,
    ) -> bool {
        self.update_material(MaterialKind::Exam, year_id, container, module_id, exam_id, field, value)
    }

    pub fn delete_exam(&mut self, year_id: &str, container: Container<'_>, module_id: &str, exam_id: &str) -> bool {
        self.delete_material(MaterialKind::Exam, year_id, container, module_id, exam_id)
    }

    // Whole-tree operations

    pub fn export_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.data)
    }

    /// Replaces the tree with an exported one. On error the current tree is
    /// left untouched.
    pub fn import_json(&mut self, json: &str) -> Result<(), ImportError> {
        let parsed: Value = serde_json::from_str(json).map_err(|e| ImportError::Parse(e.to_string()))?;
        let items = match parsed.as_array() {
            Some(items) if !items.is_empty() => items,
            _ => return Err(ImportError::InvalidFormat),
        };

        let complete = items.iter().all(|y| {
            let id = y.get("id").and_then(Value::as_str).unwrap_or_default();
            !id.is_empty() && y.get("structure").is_some_and(|s| !s.is_null())
        });
        if !complete {
            return Err(ImportError::MissingFields);
        }

        let years: Vec<Year> = serde_json::from_value(parsed).map_err(|e| ImportError::Parse(e.to_string()))?;
        self.data = years;
        self.has_unsaved_changes = true;
        Ok(())
    }

    pub fn reset_to_default(&mut self) {
        self.data = default_catalog();
        self.has_unsaved_changes = true;
    }

    /// Replaces the tree with the server's copy.
    pub async fn load<C: CatalogClient + ?Sized>(&mut self, client: &C) -> Result<(), ClientError> {
        let years = client.fetch_catalog().await?;
        tracing::debug!("loaded {} years", years.len());
        self.data = years;
        self.has_unsaved_changes = false;
        Ok(())
    }

    /// Pushes the whole tree. The dirty flag survives a failed push.
    pub async fn save<C: CatalogClient + ?Sized>(&mut self, client: &C) -> Result<SyncStats, ClientError> {
        self.is_saving = true;
        let result = client.sync_catalog(&self.data).await;
        self.is_saving = false;

        match &result {
            Ok(stats) => {
                tracing::info!("catalog saved: {:?}", stats);
                self.has_unsaved_changes = false;
            }
            Err(e) => tracing::warn!("catalog save failed: {}", e),
        }
        result
    }
}

fn empty_module(id: String, title: &str) -> Module {
    Module {
        id,
        title: title.to_string(),
        is_shared: false,
        is_standalone: false,
        unit_id: None,
        standalone_year_id: None,
        lessons: Vec::new(),
        exams: Vec::new(),
    }
}
