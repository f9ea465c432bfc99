pub mod catalog;
pub mod material;
pub mod module;
pub mod user;

use uuid::Uuid;

pub use catalog::{Material, Module, PLACEHOLDER, SearchHit, Semester, Unit, Year, YearStructure};
pub use material::{MaterialKind, MaterialRecord, NewMaterialRequest};
pub use module::{ModuleRecord, NewModuleRequest, SemesterModuleRequest, UpdateModuleRequest};
pub use user::{LoginRequest, LoginResponse, User, UserProfile};

/// A fresh `<prefix>-<uuid>` identifier.
pub fn generate_id(prefix: &str) -> String {
    format!("{}-{}", prefix, Uuid::new_v4())
}
