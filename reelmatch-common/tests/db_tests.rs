//! Catalog table round trips against an on-disk SQLite database

use reelmatch_common::db::{
    get_title, init_database_pool, insert_title, search_titles, StoredTitleRecord,
};
use tempfile::TempDir;

fn record(id: i64, title: &str, year: i32, rating: f32) -> StoredTitleRecord {
    StoredTitleRecord {
        id,
        year,
        title: title.to_string(),
        updated: 1_300_000_000,
        rating,
        play_url: format!("http://play/{}", id),
        synopsis: String::new(),
        box_art: String::new(),
    }
}

#[tokio::test]
async fn test_insert_and_get() {
    let temp_dir = TempDir::new().unwrap();
    let pool = init_database_pool(&temp_dir.path().join("catalog.db"), 2)
        .await
        .unwrap();

    insert_title(&pool, &record(42, "X: The Movie", 2001, 4.5))
        .await
        .unwrap();

    let title = get_title(&pool, 42).await.unwrap().expect("title 42 exists");
    assert_eq!(title.id, 42);
    assert_eq!(title.title, "X: The Movie");
    assert_eq!(title.year, 2001);
    assert_eq!(title.play_url, "http://play/42");
    assert!((title.rating - 4.5).abs() < f32::EPSILON);

    assert!(get_title(&pool, 7).await.unwrap().is_none());
}

#[tokio::test]
async fn test_duplicate_insert_fails() {
    // No upsert path: a second insert with the same id is a storage error
    let temp_dir = TempDir::new().unwrap();
    let pool = init_database_pool(&temp_dir.path().join("catalog.db"), 2)
        .await
        .unwrap();

    insert_title(&pool, &record(1, "Alien", 1979, 4.2)).await.unwrap();
    let result = insert_title(&pool, &record(1, "Aliens", 1986, 4.4)).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_search_orders_by_rating() {
    let temp_dir = TempDir::new().unwrap();
    let pool = init_database_pool(&temp_dir.path().join("catalog.db"), 2)
        .await
        .unwrap();

    insert_title(&pool, &record(1, "Die Hard", 1988, 4.1)).await.unwrap();
    insert_title(&pool, &record(2, "Die Hard 2", 1990, 3.6)).await.unwrap();
    insert_title(&pool, &record(3, "Live Free or Die Hard", 2007, 4.3))
        .await
        .unwrap();
    insert_title(&pool, &record(4, "Heat", 1995, 4.0)).await.unwrap();

    let titles = search_titles(&pool, "die hard", None).await.unwrap();
    let ids: Vec<i64> = titles.iter().map(|t| t.id).collect();
    assert_eq!(ids, vec![3, 1, 2]);

    let exact = search_titles(&pool, "DIE HARD", Some(1988)).await.unwrap();
    assert_eq!(exact.len(), 1);
    assert_eq!(exact[0].id, 1);

    // Wildcards in the term are literal
    assert!(search_titles(&pool, "%", None).await.unwrap().is_empty());
}
