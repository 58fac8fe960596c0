#![allow(dead_code)]

use anyhow::Result;

use scraplink_exchange::db::model::{Material, NewMaterial, NewUser, Role, User};
use scraplink_exchange::{migrations, ExchangeProcessor};
use scraplink_persistence::DbExecutor;

/// File-backed database in a temporary directory, migrated and ready. The
/// directory lives as long as the returned struct.
pub struct TestExchange {
    pub processor: ExchangeProcessor,
    _tmp: tempdir::TempDir,
}

pub fn test_exchange(name: &str) -> Result<TestExchange> {
    let _ = env_logger::builder().is_test(true).try_init();

    let tmp = tempdir::TempDir::new(name)?;
    let db = DbExecutor::new(tmp.path().join("exchange.db").display().to_string())?;
    db.apply_migration(migrations::run_with_output)?;

    Ok(TestExchange {
        processor: ExchangeProcessor::new(db),
        _tmp: tmp,
    })
}

pub async fn create_industry(processor: &ExchangeProcessor, name: &str) -> Result<User> {
    Ok(processor
        .create_user(NewUser {
            email: format!("{}@industry.example", name),
            name: name.to_string(),
            role: Role::Industry,
            company_name: Some(format!("{} Ltd.", name)),
            tax_id: Some("CZ12345678".to_string()),
            location: None,
        })
        .await?)
}

pub async fn create_artisan(processor: &ExchangeProcessor, name: &str) -> Result<User> {
    Ok(processor
        .create_user(NewUser {
            email: format!("{}@artisan.example", name),
            name: name.to_string(),
            role: Role::Artisan,
            company_name: None,
            tax_id: None,
            location: Some("Brno".to_string()),
        })
        .await?)
}

pub async fn create_admin(processor: &ExchangeProcessor, name: &str) -> Result<User> {
    Ok(processor
        .create_user(NewUser {
            email: format!("{}@admin.example", name),
            name: name.to_string(),
            role: Role::Admin,
            company_name: None,
            tax_id: None,
            location: None,
        })
        .await?)
}

pub fn steel_offcuts(quantity: f64, price: f64) -> NewMaterial {
    NewMaterial {
        name: "Steel offcuts".to_string(),
        category: "Metals".to_string(),
        quantity,
        unit: "kg".to_string(),
        location: "Ostrava".to_string(),
        price,
        description: "Mild steel sheet offcuts".to_string(),
        images: vec!["https://img.example/offcuts.jpg".to_string()],
    }
}

pub async fn list_material(
    processor: &ExchangeProcessor,
    owner: &User,
    quantity: f64,
    price: f64,
) -> Result<Material> {
    Ok(processor
        .create_material(&owner.id, steel_offcuts(quantity, price))
        .await?)
}
