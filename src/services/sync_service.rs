use std::collections::{HashMap, HashSet};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::info;

use crate::catalog::{default_catalog, validate_catalog};
use crate::db::repository;
use crate::error::AppError;
use crate::models::{Material, MaterialKind, Module, Year};

/// Replaces the stored catalog with a posted tree.
pub struct SyncService {
    db: SqlitePool,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncStats {
    pub years: usize,
    pub semesters: usize,
    pub units: usize,
    pub modules: usize,
    pub links: usize,
    pub lessons: usize,
    pub exams: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct YearRow {
    pub id: String,
    pub label: String,
    pub color: String,
    pub icon: String,
    pub structure: &'static str,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GroupRow {
    pub id: String,
    pub label: String,
    pub year_id: String,
    pub position: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ModuleRow {
    pub id: String,
    pub title: String,
    pub is_shared: bool,
    pub is_standalone: bool,
    pub unit_id: Option<String>,
    pub standalone_year_id: Option<String>,
    pub position: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LinkRow {
    pub semester_id: String,
    pub module_id: String,
    pub position: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MaterialRow {
    pub id: String,
    pub module_id: String,
    pub title: String,
    pub drive_url: String,
    pub position: i64,
}

/// The catalog tree flattened into one row list per table.
#[derive(Debug, Default)]
pub struct FlatCatalog {
    pub years: Vec<YearRow>,
    pub semesters: Vec<GroupRow>,
    pub units: Vec<GroupRow>,
    pub modules: Vec<ModuleRow>,
    pub links: Vec<LinkRow>,
    pub lessons: Vec<MaterialRow>,
    pub exams: Vec<MaterialRow>,
    seen_modules: HashSet<String>,
    seen_materials: HashSet<(MaterialKind, String, String)>,
    material_counts: HashMap<(MaterialKind, String), i64>,
}

impl FlatCatalog {
    /// Flattens the posted years.
    ///
    /// A module listed under several semesters becomes one module row (the
    /// first occurrence wins) plus one join row per semester. Lessons and
    /// exams are unique per `(id, module)`.
    pub fn from_years(years: &[Year]) -> Self {
        let mut flat = FlatCatalog::default();

        for year in years {
            flat.years.push(YearRow {
                id: year.id.clone(),
                label: year.label.clone(),
                color: year.color.clone(),
                icon: year.icon.clone(),
                structure: year.structure.as_str(),
            });

            for (idx, sem) in year.semesters.iter().enumerate() {
                flat.semesters.push(GroupRow {
                    id: sem.id.clone(),
                    label: sem.label.clone(),
                    year_id: year.id.clone(),
                    position: idx as i64,
                });
                for (pos, module) in sem.modules.iter().enumerate() {
                    flat.push_module(module, module.is_shared, false, None, None, 0);
                    if !flat
                        .links
                        .iter()
                        .any(|l| l.semester_id == sem.id && l.module_id == module.id)
                    {
                        flat.links.push(LinkRow {
                            semester_id: sem.id.clone(),
                            module_id: module.id.clone(),
                            position: pos as i64,
                        });
                    }
                }
            }

            for (idx, unit) in year.units.iter().enumerate() {
                flat.units.push(GroupRow {
                    id: unit.id.clone(),
                    label: unit.label.clone(),
                    year_id: year.id.clone(),
                    position: idx as i64,
                });
                for (pos, module) in unit.modules.iter().enumerate() {
                    flat.push_module(module, false, false, Some(&unit.id), None, pos as i64);
                }
            }

            for (pos, module) in year.standalone_modules.iter().enumerate() {
                flat.push_module(module, false, true, None, Some(&year.id), pos as i64);
            }
        }

        flat
    }

    fn push_module(
        &mut self,
        module: &Module,
        is_shared: bool,
        is_standalone: bool,
        unit_id: Option<&String>,
        standalone_year_id: Option<&String>,
        position: i64,
    ) {
        if self.seen_modules.insert(module.id.clone()) {
            self.modules.push(ModuleRow {
                id: module.id.clone(),
                title: module.title.clone(),
                is_shared,
                is_standalone,
                unit_id: unit_id.cloned(),
                standalone_year_id: standalone_year_id.cloned(),
                position,
            });
        }

        for lesson in &module.lessons {
            self.push_material(MaterialKind::Lesson, &module.id, lesson);
        }
        for exam in &module.exams {
            self.push_material(MaterialKind::Exam, &module.id, exam);
        }
    }

    fn push_material(&mut self, kind: MaterialKind, module_id: &str, material: &Material) {
        if !self
            .seen_materials
            .insert((kind, material.id.clone(), module_id.to_string()))
        {
            return;
        }

        let counter = self
            .material_counts
            .entry((kind, module_id.to_string()))
            .or_insert(0);
        let row = MaterialRow {
            id: material.id.clone(),
            module_id: module_id.to_string(),
            title: material.title.clone(),
            drive_url: material.drive_url.clone(),
            position: *counter,
        };
        *counter += 1;

        match kind {
            MaterialKind::Lesson => self.lessons.push(row),
            MaterialKind::Exam => self.exams.push(row),
        }
    }

    pub fn stats(&self) -> SyncStats {
        SyncStats {
            years: self.years.len(),
            semesters: self.semesters.len(),
            units: self.units.len(),
            modules: self.modules.len(),
            links: self.links.len(),
            lessons: self.lessons.len(),
            exams: self.exams.len(),
        }
    }
}

impl SyncService {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// Validates the posted tree, wipes the stored catalog and writes the tree
    /// back, all in one transaction.
    pub async fn replace_catalog(&self, years: &[Year]) -> Result<SyncStats, AppError> {
        validate_catalog(years).map_err(|issue| AppError::BadRequest(issue.to_string()))?;

        info!("Starting sync...");
        let flat = FlatCatalog::from_years(years);
        let stats = flat.stats();

        let mut tx = self.db.begin().await?;

        info!("Step 1: Wiping stored catalog");
        wipe_catalog(&mut *tx).await?;

        info!("Step 2: Writing {} years, {} modules", stats.years, stats.modules);
        write_catalog(&mut *tx, &flat).await?;

        tx.commit().await?;

        info!("Sync completed successfully: {:?}", stats);
        Ok(stats)
    }

    /// Writes the built-in catalog when the store holds no years yet.
    pub async fn seed_if_empty(&self) -> Result<Option<SyncStats>, AppError> {
        if repository::count_years(&self.db).await? > 0 {
            return Ok(None);
        }
        info!("Store is empty, seeding default catalog");
        self.replace_catalog(&default_catalog()).await.map(Some)
    }
}

async fn wipe_catalog(conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM years").execute(&mut *conn).await?;
    // Semester modules hang off join rows only, so the year cascade misses them.
    sqlx::query("DELETE FROM modules WHERE id NOT IN (SELECT module_id FROM semester_modules)")
        .execute(&mut *conn)
        .await?;
    Ok(())
}

async fn write_catalog(conn: &mut SqliteConnection, flat: &FlatCatalog) -> Result<(), sqlx::Error> {
    let now = Utc::now().to_rfc3339();

    for year in &flat.years {
        sqlx::query(
            r#"
            INSERT INTO years (id, label, color, icon, structure, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)
            ON CONFLICT(id) DO UPDATE SET
                label = excluded.label,
                color = excluded.color,
                icon = excluded.icon,
                structure = excluded.structure,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&year.id)
        .bind(&year.label)
        .bind(&year.color)
        .bind(&year.icon)
        .bind(year.structure)
        .bind(&now)
        .execute(&mut *conn)
        .await?;
    }

    for sem in &flat.semesters {
        sqlx::query(
            r#"
            INSERT INTO semesters (id, label, year_id, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?4)
            ON CONFLICT(id) DO UPDATE SET
                label = excluded.label,
                year_id = excluded.year_id,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&sem.id)
        .bind(&sem.label)
        .bind(&sem.year_id)
        .bind(&now)
        .execute(&mut *conn)
        .await?;
    }

    for unit in &flat.units {
        sqlx::query(
            r#"
            INSERT INTO units (id, label, year_id, position, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?5)
            ON CONFLICT(id) DO UPDATE SET
                label = excluded.label,
                year_id = excluded.year_id,
                position = excluded.position,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&unit.id)
        .bind(&unit.label)
        .bind(&unit.year_id)
        .bind(unit.position)
        .bind(&now)
        .execute(&mut *conn)
        .await?;
    }

    for module in &flat.modules {
        sqlx::query(
            r#"
            INSERT INTO modules
                (id, title, is_shared, is_standalone, unit_id, standalone_year_id,
                position, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)
            ON CONFLICT(id) DO UPDATE SET
                title = excluded.title,
                is_shared = excluded.is_shared,
                is_standalone = excluded.is_standalone,
                unit_id = excluded.unit_id,
                standalone_year_id = excluded.standalone_year_id,
                position = excluded.position,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&module.id)
        .bind(&module.title)
        .bind(module.is_shared)
        .bind(module.is_standalone)
        .bind(&module.unit_id)
        .bind(&module.standalone_year_id)
        .bind(module.position)
        .bind(&now)
        .execute(&mut *conn)
        .await?;
    }

    for link in &flat.links {
        sqlx::query(
            r#"
            INSERT INTO semester_modules (semester_id, module_id, position)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(semester_id, module_id) DO UPDATE SET position = excluded.position
            "#,
        )
        .bind(&link.semester_id)
        .bind(&link.module_id)
        .bind(link.position)
        .execute(&mut *conn)
        .await?;
    }

    for (kind, rows) in [
        (MaterialKind::Lesson, &flat.lessons),
        (MaterialKind::Exam, &flat.exams),
    ] {
        let sql = format!(
            r#"
            INSERT INTO {} (id, module_id, title, drive_url, position, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)
            ON CONFLICT(id, module_id) DO UPDATE SET
                title = excluded.title,
                drive_url = excluded.drive_url,
                position = excluded.position,
                updated_at = excluded.updated_at
            "#,
            kind.table()
        );
        for row in rows {
            sqlx::query(&sql)
                .bind(&row.id)
                .bind(&row.module_id)
                .bind(&row.title)
                .bind(&row.drive_url)
                .bind(row.position)
                .bind(&now)
                .execute(&mut *conn)
                .await?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flattens_default_catalog() {
        let flat = FlatCatalog::from_years(&default_catalog());
        let stats = flat.stats();

        assert_eq!(stats.years, 3);
        assert_eq!(stats.semesters, 2);
        assert_eq!(stats.units, 9);
        // 6 shared + 3 + 3 in year one, 2 standalone + 5 * 2 in year two, 4 * 2 in year three
        assert_eq!(stats.modules, 12 + 12 + 8);
        assert_eq!(stats.links, 18);
        assert_eq!(stats.lessons, 32 * 3);
        assert_eq!(stats.exams, 32 * 2);
    }

    #[test]
    fn shared_module_keeps_first_occurrence_and_merges_materials() {
        let years: Vec<Year> = serde_json::from_str(
            r#"[{"id":"y1","structure":"semesters","semesters":[
                {"id":"s1","modules":[{"id":"m1","title":"first","isShared":true,
                    "lessons":[{"id":"les-001","title":"a","driveUrl":"u"}]}]},
                {"id":"s2","modules":[{"id":"m1","title":"second","isShared":true,
                    "lessons":[{"id":"les-001","title":"dup","driveUrl":"u"},
                               {"id":"les-002","title":"b","driveUrl":"u"}]}]}]}]"#,
        )
        .unwrap();

        let flat = FlatCatalog::from_years(&years);

        assert_eq!(flat.modules.len(), 1);
        assert_eq!(flat.modules[0].title, "first");
        assert!(flat.modules[0].is_shared);
        assert_eq!(flat.links.len(), 2);
        let lessons: Vec<(&str, &str, i64)> = flat
            .lessons
            .iter()
            .map(|l| (l.id.as_str(), l.title.as_str(), l.position))
            .collect();
        assert_eq!(lessons, vec![("les-001", "a", 0), ("les-002", "b", 1)]);
    }

    #[test]
    fn homes_are_derived_from_position_in_tree() {
        let years: Vec<Year> = serde_json::from_str(
            r#"[{"id":"y2","structure":"units",
                "standaloneModules":[{"id":"sa","isShared":true}],
                "units":[{"id":"u1","modules":[{"id":"um","isShared":true,"isStandalone":true}]}]}]"#,
        )
        .unwrap();

        let flat = FlatCatalog::from_years(&years);
        let unit_module = flat.modules.iter().find(|m| m.id == "um").unwrap();
        let standalone = flat.modules.iter().find(|m| m.id == "sa").unwrap();

        assert_eq!(unit_module.unit_id.as_deref(), Some("u1"));
        assert!(!unit_module.is_shared && !unit_module.is_standalone);
        assert_eq!(standalone.standalone_year_id.as_deref(), Some("y2"));
        assert!(standalone.is_standalone && !standalone.is_shared);
    }

    #[test]
    fn same_lesson_id_in_two_modules_is_two_rows() {
        let flat = FlatCatalog::from_years(&default_catalog());
        let count = flat.lessons.iter().filter(|l| l.id == "les-001").count();
        assert_eq!(count, 32);
    }
}
