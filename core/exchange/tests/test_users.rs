mod utils;

use anyhow::Result;

use scraplink_exchange::db::model::Role;
use scraplink_exchange::Error;

use utils::*;

#[tokio::test(flavor = "multi_thread")]
async fn test_role_fields_are_filtered_at_creation() -> Result<()> {
    let exchange = test_exchange("role-fields")?;
    let processor = &exchange.processor;

    let industry = create_industry(processor, "ferrum").await?;
    assert_eq!(industry.role, Role::Industry);
    assert!(industry.company_name.is_some());
    assert!(industry.location.is_none());

    let artisan = create_artisan(processor, "marta").await?;
    assert!(artisan.company_name.is_none());
    assert!(artisan.location.is_some());
    assert!(!artisan.is_verified);
    assert!(artisan.is_active);
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn test_duplicate_email_is_rejected() -> Result<()> {
    let exchange = test_exchange("duplicate-email")?;
    let processor = &exchange.processor;

    create_artisan(processor, "marta").await?;
    match create_artisan(processor, "marta").await {
        Err(e) => match e.downcast::<Error>()? {
            Error::Validation(_) => (),
            other => panic!("expected Validation, got {:?}", other),
        },
        Ok(_) => panic!("expected duplicate email to be rejected"),
    }
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn test_moderation_is_admin_only() -> Result<()> {
    let exchange = test_exchange("moderation")?;
    let processor = &exchange.processor;

    let admin = create_admin(processor, "root").await?;
    let artisan = create_artisan(processor, "marta").await?;

    match processor.list_users(&artisan.id).await {
        Err(Error::Unauthorized(_)) => (),
        other => panic!("expected Unauthorized, got {:?}", other.map(|_| ())),
    }
    assert_eq!(processor.list_users(&admin.id).await?.len(), 2);

    let artisan = processor
        .set_user_verified(&admin.id, &artisan.id, true)
        .await?;
    assert!(artisan.is_verified);

    let artisan = processor
        .set_user_active(&admin.id, &artisan.id, false)
        .await?;
    assert!(!artisan.is_active);
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn test_admin_cannot_moderate_own_account() -> Result<()> {
    let exchange = test_exchange("self-moderation")?;
    let processor = &exchange.processor;

    let admin = create_admin(processor, "root").await?;
    match processor.set_user_active(&admin.id, &admin.id, false).await {
        Err(Error::Unauthorized(_)) => (),
        other => panic!("expected Unauthorized, got {:?}", other.map(|_| ())),
    }
    Ok(())
}
