use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::catalog::{Material, PLACEHOLDER};

/// Lessons and exams share one shape but live in separate tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MaterialKind {
    Lesson,
    Exam,
}

impl MaterialKind {
    pub fn table(&self) -> &'static str {
        match self {
            MaterialKind::Lesson => "lessons",
            MaterialKind::Exam => "exams",
        }
    }

    pub fn id_prefix(&self) -> &'static str {
        match self {
            MaterialKind::Lesson => "les",
            MaterialKind::Exam => "ex",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct MaterialRecord {
    pub id: String,
    pub title: String,
    pub drive_url: String,
    pub module_id: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<MaterialRecord> for Material {
    fn from(record: MaterialRecord) -> Self {
        Material {
            id: record.id,
            title: record.title,
            drive_url: record.drive_url,
            module_id: Some(record.module_id),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMaterialRequest {
    #[serde(default)]
    pub title: String,
    pub drive_url: Option<String>,
}

impl NewMaterialRequest {
    /// Empty or missing links fall back to the placeholder.
    pub fn drive_url_or_placeholder(&self) -> String {
        match self.drive_url.as_deref() {
            Some(url) if !url.trim().is_empty() => url.to_string(),
            _ => PLACEHOLDER.to_string(),
        }
    }
}
