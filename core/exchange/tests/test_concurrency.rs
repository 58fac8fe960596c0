mod utils;

use anyhow::Result;

use scraplink_exchange::db::model::{MaterialStatus, RequestStatus};
use scraplink_exchange::Error;

use utils::*;

#[tokio::test(flavor = "multi_thread")]
async fn test_concurrent_accepts_commit_exactly_once() -> Result<()> {
    let exchange = test_exchange("concurrent-accept")?;
    let processor = &exchange.processor;

    let owner = create_industry(processor, "ferrum").await?;
    let artisan = create_artisan(processor, "marta").await?;
    let material = list_material(processor, &owner, 100.0, 5.0).await?;
    let request = processor
        .create_request(&artisan.id, &material.id, 10.0, "")
        .await?;

    let first = {
        let processor = processor.clone();
        let owner_id = owner.id.clone();
        let request_id = request.id.clone();
        tokio::spawn(async move { processor.accept_request(&owner_id, &request_id).await })
    };
    let second = {
        let processor = processor.clone();
        let owner_id = owner.id.clone();
        let request_id = request.id.clone();
        tokio::spawn(async move { processor.accept_request(&owner_id, &request_id).await })
    };

    let results = vec![first.await?, second.await?];
    let successes = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(successes, 1);
    for result in results {
        if let Err(e) = result {
            match e {
                Error::Conflict(_) | Error::InvalidState(_) => (),
                other => panic!("expected Conflict or InvalidState, got {:?}", other),
            }
        }
    }

    // The reservation happened exactly once.
    let material = processor.get_material(&material.id).await?.unwrap();
    assert_eq!(material.quantity, 90.0);
    assert_eq!(
        processor.list_transactions_for_user(&owner.id).await?.len(),
        1
    );
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn test_oversubscribed_accept_rolls_back_whole_operation() -> Result<()> {
    let exchange = test_exchange("oversubscribed")?;
    let processor = &exchange.processor;

    let owner = create_industry(processor, "ferrum").await?;
    let marta = create_artisan(processor, "marta").await?;
    let josef = create_artisan(processor, "josef").await?;
    let material = list_material(processor, &owner, 100.0, 5.0).await?;

    // Pending requests do not reserve quantity, so both may be created even
    // though they jointly oversubscribe the listing.
    let big = processor
        .create_request(&marta.id, &material.id, 80.0, "")
        .await?;
    let small = processor
        .create_request(&josef.id, &material.id, 50.0, "")
        .await?;

    processor.accept_request(&owner.id, &big.id).await?;

    // Only 20 left now; accepting the second request must fail without
    // leaving any partial state behind.
    match processor.accept_request(&owner.id, &small.id).await {
        Err(Error::InsufficientQuantity {
            requested,
            available,
        }) => {
            assert_eq!(requested, 50.0);
            assert_eq!(available, 20.0);
        }
        other => panic!("expected InsufficientQuantity, got {:?}", other.map(|_| ())),
    }

    let small = processor.get_request(&small.id).await?.unwrap();
    assert_eq!(small.status, RequestStatus::Pending);
    assert!(processor
        .get_transaction_for_request(&small.id)
        .await?
        .is_none());

    let material = processor.get_material(&material.id).await?.unwrap();
    assert_eq!(material.quantity, 20.0);
    assert_eq!(material.status, MaterialStatus::Available);
    Ok(())
}
