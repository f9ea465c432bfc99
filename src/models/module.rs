use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::catalog::{Material, Module};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ModuleRecord {
    pub id: String,
    pub title: String,
    pub is_shared: bool,
    pub is_standalone: bool,
    pub unit_id: Option<String>,
    pub standalone_year_id: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl ModuleRecord {
    pub fn into_node(self, lessons: Vec<Material>, exams: Vec<Material>) -> Module {
        Module {
            id: self.id,
            title: self.title,
            is_shared: self.is_shared,
            is_standalone: self.is_standalone,
            unit_id: self.unit_id,
            standalone_year_id: self.standalone_year_id,
            lessons,
            exams,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewModuleRequest {
    pub id: Option<String>,
    pub title: Option<String>,
    #[serde(default)]
    pub is_shared: bool,
    #[serde(default)]
    pub is_standalone: bool,
    pub unit_id: Option<String>,
    pub standalone_year_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateModuleRequest {
    pub title: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SemesterModuleRequest {
    pub title: Option<String>,
    #[serde(default)]
    pub is_shared: bool,
}
