//! Create / update / lookup behaviour of the catalog

use library_catalog::{error::AppError, models::WorkData};

use crate::{catalog, copy_data, create_author, create_copy, create_work, work_data};

#[tokio::test]
async fn test_lists_are_empty_on_fresh_catalog() {
    let catalog = catalog();
    assert!(catalog.list_authors().await.unwrap().is_empty());
    assert!(catalog.list_works().await.unwrap().is_empty());
    assert!(catalog.list_copies().await.unwrap().is_empty());
    assert_eq!(catalog.count_copies().await.unwrap(), 0);
}

#[tokio::test]
async fn test_create_assigns_id_and_get_returns_it() {
    let catalog = catalog();
    let author = create_author(&catalog, "Fyodor Dostoevsky").await;
    assert!(author.id.is_some());

    let fetched = catalog.get_author(author.id.unwrap()).await.unwrap();
    assert_eq!(fetched, Some(author));
}

#[tokio::test]
async fn test_get_missing_is_none() {
    let catalog = catalog();
    assert!(catalog.get_author(404).await.unwrap().is_none());
    assert!(catalog.get_work(404).await.unwrap().is_none());
    assert!(catalog.get_copy(404).await.unwrap().is_none());
}

#[tokio::test]
async fn test_work_round_trip() {
    let catalog = catalog();
    let author = create_author(&catalog, "Fyodor Dostoevsky").await;
    let input = work_data("Crime and Punishment", author.id.unwrap());

    let created = catalog.create_work(input.clone()).await.unwrap();
    let fetched = catalog.get_work(created.id.unwrap()).await.unwrap().unwrap();

    assert_eq!(fetched.title, input.title);
    assert_eq!(fetched.genre, input.genre);
    assert_eq!(fetched.published_year, input.published_year);
    assert_eq!(fetched.author_id, input.author_id);
}

#[tokio::test]
async fn test_published_year_boundary() {
    let catalog = catalog();
    let author = create_author(&catalog, "Johannes Gutenberg").await;
    let author_id = author.id.unwrap();

    let too_early = WorkData {
        published_year: 1453,
        ..work_data("Early Print", author_id)
    };
    assert!(matches!(
        catalog.create_work(too_early).await,
        Err(AppError::Validation(_))
    ));

    let first_year = WorkData {
        published_year: 1454,
        ..work_data("First Print", author_id)
    };
    assert!(catalog.create_work(first_year).await.is_ok());
    assert_eq!(catalog.count_works().await.unwrap(), 1);
}

#[tokio::test]
async fn test_work_requires_existing_author() {
    let catalog = catalog();
    let result = catalog.create_work(work_data("Orphan", 99)).await;
    assert!(matches!(result, Err(AppError::ReferenceNotFound(_))));
    assert_eq!(catalog.count_works().await.unwrap(), 0);
}

#[tokio::test]
async fn test_duplicate_inventory_number_on_create() {
    let catalog = catalog();
    let author = create_author(&catalog, "Fyodor Dostoevsky").await;
    let work = create_work(&catalog, "The Idiot", &author).await;
    create_copy(&catalog, "INV001", &work).await;

    let result = catalog.create_copy(copy_data("INV001", work.id.unwrap())).await;
    assert!(matches!(result, Err(AppError::DuplicateInventoryNumber(_))));
    assert_eq!(catalog.count_copies().await.unwrap(), 1);

    // exact, case-sensitive comparison
    assert!(catalog.create_copy(copy_data("inv001", work.id.unwrap())).await.is_ok());
}

#[tokio::test]
async fn test_copy_requires_existing_work() {
    let catalog = catalog();
    let result = catalog.create_copy(copy_data("INV001", 7)).await;
    assert!(matches!(result, Err(AppError::ReferenceNotFound(_))));
    assert_eq!(catalog.count_copies().await.unwrap(), 0);
}

#[tokio::test]
async fn test_update_copy_inventory_number() {
    let catalog = catalog();
    let author = create_author(&catalog, "Fyodor Dostoevsky").await;
    let work = create_work(&catalog, "Demons", &author).await;
    let work_id = work.id.unwrap();
    let first = create_copy(&catalog, "INV001", &work).await;
    let second = create_copy(&catalog, "INV002", &work).await;

    let taken = catalog
        .update_copy(second.id.unwrap(), copy_data("INV001", work_id))
        .await;
    assert!(matches!(taken, Err(AppError::DuplicateInventoryNumber(_))));
    let unchanged = catalog.get_copy(second.id.unwrap()).await.unwrap().unwrap();
    assert_eq!(unchanged.inventory_number, "INV002");

    let same = catalog
        .update_copy(first.id.unwrap(), copy_data("INV001", work_id))
        .await
        .unwrap();
    assert_eq!(same.inventory_number, "INV001");

    let renamed = catalog
        .update_copy(second.id.unwrap(), copy_data("INV003", work_id))
        .await
        .unwrap();
    assert_eq!(renamed.inventory_number, "INV003");
}

#[tokio::test]
async fn test_update_copy_to_missing_work() {
    let catalog = catalog();
    let author = create_author(&catalog, "Fyodor Dostoevsky").await;
    let work = create_work(&catalog, "Demons", &author).await;
    let copy = create_copy(&catalog, "INV001", &work).await;

    let result = catalog.update_copy(copy.id.unwrap(), copy_data("INV001", 77)).await;
    assert!(matches!(result, Err(AppError::ReferenceNotFound(_))));
}

#[tokio::test]
async fn test_update_work_to_missing_author() {
    let catalog = catalog();
    let author = create_author(&catalog, "Ivan Goncharov").await;
    let work = create_work(&catalog, "Oblomov", &author).await;

    let result = catalog
        .update_work(work.id.unwrap(), work_data("Oblomov", 999))
        .await;
    assert!(matches!(result, Err(AppError::ReferenceNotFound(_))));

    let stored = catalog.get_work(work.id.unwrap()).await.unwrap().unwrap();
    assert_eq!(stored.author_id, author.id.unwrap());
    assert_eq!(stored, work);
}

#[tokio::test]
async fn test_find_copy_by_inventory_number() {
    let catalog = catalog();
    let author = create_author(&catalog, "Ivan Turgenev").await;
    let work = create_work(&catalog, "Fathers and Sons", &author).await;
    let copy = create_copy(&catalog, "FS01", &work).await;
    create_copy(&catalog, "FS02", &work).await;

    let found = catalog.find_copy_by_inventory_number("FS01").await.unwrap();
    assert_eq!(found, Some(copy));
    assert_eq!(catalog.find_copy_by_inventory_number("fs01").await.unwrap(), None);
    assert_eq!(catalog.find_copy_by_inventory_number("XX99").await.unwrap(), None);
}

#[tokio::test]
async fn test_update_missing_is_not_found() {
    let catalog = catalog();
    let result = catalog.update_author(5, crate::author_data("Nikolai Gogol")).await;
    assert!(matches!(result, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn test_update_author_keeps_id() {
    let catalog = catalog();
    let author = create_author(&catalog, "Nikolai Gogol").await;

    let mut data = crate::author_data("Nikolai Vasilievich Gogol");
    data.biography = Some("Playwright and novelist".to_string());
    let updated = catalog.update_author(author.id.unwrap(), data).await.unwrap();

    assert_eq!(updated.id, author.id);
    assert_eq!(updated.name, "Nikolai Vasilievich Gogol");
    assert_eq!(catalog.count_authors().await.unwrap(), 1);
}

#[tokio::test]
async fn test_search_and_traversal() {
    let catalog = catalog();
    let tolstoy = create_author(&catalog, "Leo Tolstoy").await;
    let chekhov = create_author(&catalog, "Anton Chekhov").await;
    let war = create_work(&catalog, "War and Peace", &tolstoy).await;
    create_work(&catalog, "Anna Karenina", &tolstoy).await;
    create_work(&catalog, "The Seagull", &chekhov).await;
    create_copy(&catalog, "W1", &war).await;
    create_copy(&catalog, "W2", &war).await;

    let found = catalog.search_authors("tolst").await.unwrap();
    assert_eq!(found, vec![tolstoy.clone()]);

    let titles: Vec<_> = catalog
        .works_by_author(tolstoy.id.unwrap())
        .await
        .unwrap()
        .into_iter()
        .map(|w| w.title)
        .collect();
    assert_eq!(titles, vec!["War and Peace", "Anna Karenina"]);

    assert_eq!(catalog.search_works("SEAGULL").await.unwrap().len(), 1);
    assert_eq!(catalog.copies_by_work(war.id.unwrap()).await.unwrap().len(), 2);
    assert!(matches!(
        catalog.copies_by_work(999).await,
        Err(AppError::NotFound(_))
    ));
}
