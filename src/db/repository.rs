use chrono::Utc;
use sqlx::{FromRow, SqlitePool};

use crate::models::{
    generate_id, Material, MaterialKind, MaterialRecord, Module, ModuleRecord, NewMaterialRequest,
    NewModuleRequest, Semester, Unit, User, UserProfile, Year, YearStructure,
};

pub const DEFAULT_MODULE_TITLE: &str = "موديل جديد";

const MODULE_COLUMNS: &str =
    "m.id, m.title, m.is_shared, m.is_standalone, m.unit_id, m.standalone_year_id, m.created_at, m.updated_at";

#[derive(Debug, FromRow)]
struct YearRow {
    id: String,
    label: String,
    color: String,
    icon: String,
    structure: String,
}

#[derive(Debug, FromRow)]
struct GroupRow {
    id: String,
    label: String,
    year_id: String,
}

/// Reads the whole catalog as nested years, ordered by id, with each level
/// fetched per parent.
pub async fn fetch_catalog(db: &SqlitePool) -> Result<Vec<Year>, sqlx::Error> {
    let year_rows = sqlx::query_as::<_, YearRow>(
        "SELECT id, label, color, icon, structure FROM years ORDER BY id",
    )
    .fetch_all(db)
    .await?;

    let mut years = Vec::with_capacity(year_rows.len());
    for row in year_rows {
        let structure = row
            .structure
            .parse::<YearStructure>()
            .map_err(|e| sqlx::Error::Decode(e.into()))?;

        let mut semesters = Vec::new();
        for sem in fetch_semesters(db, &row.id).await? {
            let records = fetch_semester_modules(db, &sem.id).await?;
            semesters.push(Semester {
                id: sem.id,
                label: sem.label,
                year_id: Some(sem.year_id),
                modules: with_materials(db, records).await?,
            });
        }

        let mut units = Vec::new();
        for unit in fetch_units(db, &row.id).await? {
            let records = fetch_unit_modules(db, &unit.id).await?;
            units.push(Unit {
                id: unit.id,
                label: unit.label,
                year_id: Some(unit.year_id),
                modules: with_materials(db, records).await?,
            });
        }

        let standalone = fetch_standalone_modules(db, &row.id).await?;
        let standalone_modules = with_materials(db, standalone).await?;

        years.push(Year {
            id: row.id,
            label: row.label,
            color: row.color,
            icon: row.icon,
            structure,
            semesters,
            units,
            standalone_modules,
        });
    }

    Ok(years)
}

async fn fetch_semesters(db: &SqlitePool, year_id: &str) -> Result<Vec<GroupRow>, sqlx::Error> {
    sqlx::query_as::<_, GroupRow>(
        "SELECT id, label, year_id FROM semesters WHERE year_id = ? ORDER BY id",
    )
    .bind(year_id)
    .fetch_all(db)
    .await
}

async fn fetch_units(db: &SqlitePool, year_id: &str) -> Result<Vec<GroupRow>, sqlx::Error> {
    sqlx::query_as::<_, GroupRow>(
        "SELECT id, label, year_id FROM units WHERE year_id = ? ORDER BY position, id",
    )
    .bind(year_id)
    .fetch_all(db)
    .await
}

async fn fetch_semester_modules(
    db: &SqlitePool,
    semester_id: &str,
) -> Result<Vec<ModuleRecord>, sqlx::Error> {
    let sql = format!(
        "SELECT {MODULE_COLUMNS} FROM semester_modules sm \
         JOIN modules m ON m.id = sm.module_id \
         WHERE sm.semester_id = ? ORDER BY sm.position, m.id"
    );
    sqlx::query_as::<_, ModuleRecord>(&sql)
        .bind(semester_id)
        .fetch_all(db)
        .await
}

async fn fetch_unit_modules(db: &SqlitePool, unit_id: &str) -> Result<Vec<ModuleRecord>, sqlx::Error> {
    let sql = format!(
        "SELECT {MODULE_COLUMNS} FROM modules m WHERE m.unit_id = ? ORDER BY m.position, m.id"
    );
    sqlx::query_as::<_, ModuleRecord>(&sql)
        .bind(unit_id)
        .fetch_all(db)
        .await
}

async fn fetch_standalone_modules(
    db: &SqlitePool,
    year_id: &str,
) -> Result<Vec<ModuleRecord>, sqlx::Error> {
    let sql = format!(
        "SELECT {MODULE_COLUMNS} FROM modules m \
         WHERE m.standalone_year_id = ? AND m.is_standalone = 1 \
         ORDER BY m.position, m.id"
    );
    sqlx::query_as::<_, ModuleRecord>(&sql)
        .bind(year_id)
        .fetch_all(db)
        .await
}

async fn with_materials(
    db: &SqlitePool,
    records: Vec<ModuleRecord>,
) -> Result<Vec<Module>, sqlx::Error> {
    let mut modules = Vec::with_capacity(records.len());
    for record in records {
        let lessons = fetch_materials(db, MaterialKind::Lesson, &record.id).await?;
        let exams = fetch_materials(db, MaterialKind::Exam, &record.id).await?;
        modules.push(record.into_node(
            lessons.into_iter().map(Material::from).collect(),
            exams.into_iter().map(Material::from).collect(),
        ));
    }
    Ok(modules)
}

pub async fn fetch_materials(
    db: &SqlitePool,
    kind: MaterialKind,
    module_id: &str,
) -> Result<Vec<MaterialRecord>, sqlx::Error> {
    let sql = format!(
        "SELECT id, title, drive_url, module_id, created_at, updated_at FROM {} \
         WHERE module_id = ? ORDER BY position, id",
        kind.table()
    );
    sqlx::query_as::<_, MaterialRecord>(&sql)
        .bind(module_id)
        .fetch_all(db)
        .await
}

pub async fn count_years(db: &SqlitePool) -> Result<i64, sqlx::Error> {
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(1) FROM years")
        .fetch_one(db)
        .await?;
    Ok(count)
}

pub async fn find_module(db: &SqlitePool, id: &str) -> Result<Option<ModuleRecord>, sqlx::Error> {
    let sql = format!("SELECT {MODULE_COLUMNS} FROM modules m WHERE m.id = ?");
    sqlx::query_as::<_, ModuleRecord>(&sql)
        .bind(id)
        .fetch_optional(db)
        .await
}

/// Inserts a module as described by the request. The caller has already
/// checked the request for a title and a single home.
pub async fn insert_module(
    db: &SqlitePool,
    req: NewModuleRequest,
) -> Result<ModuleRecord, sqlx::Error> {
    let id = req.id.unwrap_or_else(|| generate_id("mod"));
    let title = req.title.unwrap_or_else(|| DEFAULT_MODULE_TITLE.to_string());
    let now = Utc::now().to_rfc3339();

    sqlx::query(
        r#"
        INSERT INTO modules
            (id, title, is_shared, is_standalone, unit_id, standalone_year_id,
            position, created_at, updated_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6,
            (SELECT COUNT(1) FROM modules WHERE unit_id IS ?5 AND standalone_year_id IS ?6),
            ?7, ?7)
        "#,
    )
    .bind(&id)
    .bind(&title)
    .bind(req.is_shared)
    .bind(req.is_standalone)
    .bind(&req.unit_id)
    .bind(&req.standalone_year_id)
    .bind(&now)
    .execute(db)
    .await?;

    Ok(ModuleRecord {
        id,
        title,
        is_shared: req.is_shared,
        is_standalone: req.is_standalone,
        unit_id: req.unit_id,
        standalone_year_id: req.standalone_year_id,
        created_at: now.clone(),
        updated_at: now,
    })
}

pub async fn update_module_title(
    db: &SqlitePool,
    id: &str,
    title: &str,
) -> Result<Option<ModuleRecord>, sqlx::Error> {
    let now = Utc::now().to_rfc3339();
    let affected = sqlx::query("UPDATE modules SET title = ?1, updated_at = ?2 WHERE id = ?3")
        .bind(title)
        .bind(&now)
        .bind(id)
        .execute(db)
        .await?
        .rows_affected();

    if affected == 0 {
        return Ok(None);
    }
    find_module(db, id).await
}

/// Creates a module and links it to the semester in one transaction.
/// Returns `None` when the semester does not exist.
pub async fn insert_semester_module(
    db: &SqlitePool,
    semester_id: &str,
    title: Option<String>,
    is_shared: bool,
) -> Result<Option<ModuleRecord>, sqlx::Error> {
    let mut tx = db.begin().await?;

    let exists: Option<(String,)> = sqlx::query_as("SELECT id FROM semesters WHERE id = ?")
        .bind(semester_id)
        .fetch_optional(&mut *tx)
        .await?;
    if exists.is_none() {
        return Ok(None);
    }

    let id = generate_id("mod");
    let title = title
        .filter(|t| !t.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_MODULE_TITLE.to_string());
    let now = Utc::now().to_rfc3339();

    sqlx::query(
        r#"
        INSERT INTO modules
            (id, title, is_shared, is_standalone, unit_id, standalone_year_id,
            position, created_at, updated_at)
        VALUES (?1, ?2, ?3, 0, NULL, NULL, 0, ?4, ?4)
        "#,
    )
    .bind(&id)
    .bind(&title)
    .bind(is_shared)
    .bind(&now)
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        r#"
        INSERT INTO semester_modules (semester_id, module_id, position)
        VALUES (?1, ?2, (SELECT COUNT(1) FROM semester_modules WHERE semester_id = ?1))
        "#,
    )
    .bind(semester_id)
    .bind(&id)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    Ok(Some(ModuleRecord {
        id,
        title,
        is_shared,
        is_standalone: false,
        unit_id: None,
        standalone_year_id: None,
        created_at: now.clone(),
        updated_at: now,
    }))
}

/// Removes a module with its join rows, lessons and exams, children first.
/// Returns false when no such module exists.
pub async fn delete_module(db: &SqlitePool, id: &str) -> Result<bool, sqlx::Error> {
    let mut tx = db.begin().await?;

    sqlx::query("DELETE FROM semester_modules WHERE module_id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM lessons WHERE module_id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM exams WHERE module_id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    let deleted = sqlx::query("DELETE FROM modules WHERE id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

    if deleted == 0 {
        tx.rollback().await?;
        return Ok(false);
    }

    tx.commit().await?;
    Ok(true)
}

pub async fn insert_material(
    db: &SqlitePool,
    kind: MaterialKind,
    module_id: &str,
    req: NewMaterialRequest,
) -> Result<MaterialRecord, sqlx::Error> {
    let id = generate_id(kind.id_prefix());
    let drive_url = req.drive_url_or_placeholder();
    let now = Utc::now().to_rfc3339();

    let sql = format!(
        "INSERT INTO {table} (id, module_id, title, drive_url, position, created_at, updated_at) \
         VALUES (?1, ?2, ?3, ?4, (SELECT COUNT(1) FROM {table} WHERE module_id = ?2), ?5, ?5)",
        table = kind.table()
    );
    sqlx::query(&sql)
        .bind(&id)
        .bind(module_id)
        .bind(&req.title)
        .bind(&drive_url)
        .bind(&now)
        .execute(db)
        .await?;

    Ok(MaterialRecord {
        id,
        title: req.title,
        drive_url,
        module_id: module_id.to_string(),
        created_at: now.clone(),
        updated_at: now,
    })
}

/// Deletes every lesson or exam carrying this id, whichever module holds it.
pub async fn delete_material(
    db: &SqlitePool,
    kind: MaterialKind,
    id: &str,
) -> Result<u64, sqlx::Error> {
    let sql = format!("DELETE FROM {} WHERE id = ?", kind.table());
    let result = sqlx::query(&sql).bind(id).execute(db).await?;
    Ok(result.rows_affected())
}

pub async fn find_user_by_username(
    db: &SqlitePool,
    username: &str,
) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(
        "SELECT id, username, password_hash FROM users WHERE username = ? LIMIT 1",
    )
    .bind(username)
    .fetch_optional(db)
    .await
}

pub async fn find_user_profile(
    db: &SqlitePool,
    id: &str,
) -> Result<Option<UserProfile>, sqlx::Error> {
    sqlx::query_as::<_, UserProfile>("SELECT id, username FROM users WHERE id = ?")
        .bind(id)
        .fetch_optional(db)
        .await
}

pub async fn count_users(db: &SqlitePool) -> Result<i64, sqlx::Error> {
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(1) FROM users")
        .fetch_one(db)
        .await?;
    Ok(count)
}

pub async fn insert_user(
    db: &SqlitePool,
    username: &str,
    password_hash: &str,
) -> Result<UserProfile, sqlx::Error> {
    let id = generate_id("user");
    let now = Utc::now().to_rfc3339();

    sqlx::query(
        "INSERT INTO users (id, username, password_hash, created_at, updated_at) VALUES (?1, ?2, ?3, ?4, ?4)",
    )
    .bind(&id)
    .bind(username)
    .bind(password_hash)
    .bind(&now)
    .execute(db)
    .await?;

    Ok(UserProfile {
        id,
        username: username.to_string(),
    })
}
