mod common;

use anyhow::Result;
use common::{alice, bob, draft, test_service, test_service_with_seq_ids};
use mercato::application::{AppError, ErrorKind};

#[tokio::test]
async fn test_created_listing_is_retrievable() -> Result<()> {
    let (service, _temp) = test_service().await?;

    let submitted = draft("Vase", 40);
    let created = service.create_listing(&alice(), submitted.clone()).await?;

    assert_eq!(created.owner, alice());
    assert_eq!(created.name, submitted.name);
    assert_eq!(created.item_name, submitted.item_name);
    assert_eq!(created.product_label, submitted.product_label);
    assert_eq!(created.description, submitted.description);
    assert_eq!(created.zipcode, submitted.zipcode);
    assert_eq!(created.price, 40);
    assert!(created.updated_at.is_none());

    let fetched = service.get_listing(&created.id).await?;
    assert_eq!(fetched.id, created.id);
    assert_eq!(fetched.owner, alice());
    assert_eq!(fetched.item_name, submitted.item_name);

    Ok(())
}

#[tokio::test]
async fn test_each_listing_gets_a_fresh_id() -> Result<()> {
    let (service, _temp) = test_service_with_seq_ids().await?;

    let first = service.create_listing(&alice(), draft("Vase", 40)).await?;
    let second = service.create_listing(&alice(), draft("Bowl", 25)).await?;

    assert_eq!(first.id, "id-0000");
    assert_eq!(second.id, "id-0001");
    assert_ne!(first.id, second.id);

    Ok(())
}

#[tokio::test]
async fn test_missing_field_rejected_without_write() -> Result<()> {
    let (service, _temp) = test_service().await?;

    let mut incomplete = draft("Vase", 40);
    incomplete.zipcode = String::new();

    let err = service
        .create_listing(&alice(), incomplete)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::MissingField("zipcode")));
    assert_eq!(err.kind(), ErrorKind::BadRequest);
    assert!(service.list_listings().await?.is_empty());

    let err = service
        .create_listing(&alice(), draft("Vase", 0))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::MissingField("price")));
    assert!(service.list_listings().await?.is_empty());

    Ok(())
}

#[tokio::test]
async fn test_get_listing_validates_its_input() -> Result<()> {
    let (service, _temp) = test_service().await?;

    let err = service.get_listing("").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::BadRequest);

    let err = service.get_listing("no-such-id").await.unwrap_err();
    assert!(matches!(err, AppError::ListingNotFound(_)));
    assert_eq!(err.kind(), ErrorKind::NotFound);

    Ok(())
}

#[tokio::test]
async fn test_list_listings_returns_everything() -> Result<()> {
    let (service, _temp) = test_service().await?;

    let first = service.create_listing(&alice(), draft("Vase", 40)).await?;
    let second = service.create_listing(&bob(), draft("Bowl", 25)).await?;
    let third = service.create_listing(&alice(), draft("Plate", 15)).await?;

    let listings = service.list_listings().await?;
    assert_eq!(listings.len(), 3);

    let ids: Vec<&str> = listings.iter().map(|l| l.id.as_str()).collect();
    assert!(ids.contains(&first.id.as_str()));
    assert!(ids.contains(&second.id.as_str()));
    assert!(ids.contains(&third.id.as_str()));

    Ok(())
}

#[tokio::test]
async fn test_delete_by_non_owner_is_forbidden() -> Result<()> {
    let (service, _temp) = test_service().await?;

    let listing = service.create_listing(&alice(), draft("Vase", 40)).await?;

    let err = service.delete_listing(&bob(), &listing.id).await.unwrap_err();
    assert!(matches!(err, AppError::NotOwner(_)));
    assert_eq!(err.kind(), ErrorKind::Forbidden);

    // the listing is untouched
    let fetched = service.get_listing(&listing.id).await?;
    assert_eq!(fetched.owner, alice());

    Ok(())
}

#[tokio::test]
async fn test_delete_by_owner_removes_the_listing() -> Result<()> {
    let (service, _temp) = test_service().await?;

    let listing = service.create_listing(&alice(), draft("Vase", 40)).await?;
    let removed = service.delete_listing(&alice(), &listing.id).await?;

    assert_eq!(removed.id, listing.id);
    assert_eq!(removed.item_name, "Vase");

    let err = service.get_listing(&listing.id).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    Ok(())
}

#[tokio::test]
async fn test_second_delete_of_same_id_is_not_found() -> Result<()> {
    let (service, _temp) = test_service().await?;

    let listing = service.create_listing(&alice(), draft("Vase", 40)).await?;
    service.delete_listing(&alice(), &listing.id).await?;

    let err = service.delete_listing(&alice(), &listing.id).await.unwrap_err();
    assert!(matches!(err, AppError::ListingNotFound(_)));
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert!(service.list_listings().await?.is_empty());

    Ok(())
}
