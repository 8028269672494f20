//! Ownership cascade: deleting a parent removes every child

use library_catalog::{error::AppError, services::cascade::CascadeReport};

use crate::{catalog, create_author, create_copy, create_work};

#[tokio::test]
async fn test_delete_author_removes_works_and_copies() {
    let catalog = catalog();
    let author = create_author(&catalog, "Leo Tolstoy").await;
    let other = create_author(&catalog, "Anton Chekhov").await;

    let mut work_ids = Vec::new();
    let mut copy_ids = Vec::new();
    for (title, prefix) in [("War and Peace", "WP"), ("Anna Karenina", "AK")] {
        let work = create_work(&catalog, title, &author).await;
        for n in 1..=3 {
            let copy = create_copy(&catalog, &format!("{}{}", prefix, n), &work).await;
            copy_ids.push(copy.id.unwrap());
        }
        work_ids.push(work.id.unwrap());
    }
    let kept_work = create_work(&catalog, "The Seagull", &other).await;
    create_copy(&catalog, "SG1", &kept_work).await;

    let report = catalog.delete_author(author.id.unwrap()).await.unwrap();
    assert_eq!(
        report,
        CascadeReport {
            authors: 1,
            works: 2,
            copies: 6
        }
    );

    assert!(catalog.get_author(author.id.unwrap()).await.unwrap().is_none());
    for id in work_ids {
        assert!(catalog.get_work(id).await.unwrap().is_none());
    }
    for id in copy_ids {
        assert!(catalog.get_copy(id).await.unwrap().is_none());
    }

    assert_eq!(catalog.count_authors().await.unwrap(), 1);
    assert_eq!(catalog.count_works().await.unwrap(), 1);
    assert_eq!(catalog.count_copies().await.unwrap(), 1);
}

#[tokio::test]
async fn test_delete_work_removes_only_its_copies() {
    let catalog = catalog();
    let author = create_author(&catalog, "Leo Tolstoy").await;
    let war = create_work(&catalog, "War and Peace", &author).await;
    let anna = create_work(&catalog, "Anna Karenina", &author).await;
    create_copy(&catalog, "WP1", &war).await;
    create_copy(&catalog, "WP2", &war).await;
    let kept = create_copy(&catalog, "AK1", &anna).await;

    let report = catalog.delete_work(war.id.unwrap()).await.unwrap();
    assert_eq!(report.copies, 2);
    assert_eq!(report.works, 1);

    assert_eq!(catalog.list_copies().await.unwrap(), vec![kept]);
    assert!(catalog.get_author(author.id.unwrap()).await.unwrap().is_some());
}

#[tokio::test]
async fn test_delete_copy() {
    let catalog = catalog();
    let author = create_author(&catalog, "Leo Tolstoy").await;
    let work = create_work(&catalog, "Resurrection", &author).await;
    let copy = create_copy(&catalog, "R1", &work).await;

    catalog.delete_copy(copy.id.unwrap()).await.unwrap();
    assert_eq!(catalog.count_copies().await.unwrap(), 0);
    assert_eq!(catalog.count_works().await.unwrap(), 1);

    // the inventory number is free again
    create_copy(&catalog, "R1", &work).await;
}

#[tokio::test]
async fn test_delete_missing_is_not_found() {
    let catalog = catalog();
    assert!(matches!(catalog.delete_author(1).await, Err(AppError::NotFound(_))));
    assert!(matches!(catalog.delete_work(1).await, Err(AppError::NotFound(_))));
    assert!(matches!(catalog.delete_copy(1).await, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn test_no_orphans_after_delete() {
    let catalog = catalog();
    let author = create_author(&catalog, "Leo Tolstoy").await;
    let work = create_work(&catalog, "Hadji Murat", &author).await;
    create_copy(&catalog, "HM1", &work).await;

    catalog.delete_author(author.id.unwrap()).await.unwrap();

    let authors = catalog.list_authors().await.unwrap();
    let works = catalog.list_works().await.unwrap();
    for w in &works {
        assert!(authors.iter().any(|a| a.id == Some(w.author_id)));
    }
    for c in catalog.list_copies().await.unwrap() {
        assert!(works.iter().any(|w| w.id == Some(c.work_id)));
    }
}
