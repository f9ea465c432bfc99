use std::env;
use std::fs;

use dotenvy::dotenv;
use medguid::catalog::{default_catalog, validate_catalog};
use medguid::client::{CatalogClient, HttpCatalogClient};
use medguid::models::Year;
use medguid::services::FlatCatalog;

fn is_dry_run() -> bool {
    !env::args().any(|a| a == "--apply")
}

fn catalog_path() -> Option<String> {
    env::args().skip(1).find(|a| !a.starts_with("--"))
}

fn load_catalog(path: Option<&str>) -> Result<Vec<Year>, Box<dyn std::error::Error>> {
    match path {
        Some(path) => {
            let raw = fs::read_to_string(path)?;
            Ok(serde_json::from_str(&raw)?)
        }
        None => Ok(default_catalog()),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();

    let path = catalog_path();
    let years = load_catalog(path.as_deref())?;
    validate_catalog(&years)?;

    let stats = FlatCatalog::from_years(&years).stats();
    println!(
        "Catalog from {}: {} years, {} semesters, {} units, {} modules ({} semester links), {} lessons, {} exams",
        path.as_deref().unwrap_or("built-in defaults"),
        stats.years,
        stats.semesters,
        stats.units,
        stats.modules,
        stats.links,
        stats.lessons,
        stats.exams,
    );

    if is_dry_run() {
        println!("[DRY RUN] Nothing uploaded, pass --apply to replace the server catalog");
        return Ok(());
    }

    let api_url = env::var("MEDGUID_API_URL")?;
    let username = env::var("MEDGUID_ADMIN_USERNAME")?;
    let password = env::var("MEDGUID_ADMIN_PASSWORD")?;

    let mut client = HttpCatalogClient::new(api_url)?;
    client.login(&username, &password).await?;

    let synced = client.sync_catalog(&years).await?;
    println!("Synced: {:?}", synced);

    Ok(())
}
