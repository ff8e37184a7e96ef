//! Paged fetches, save/upsert, and column-scoped updates.

use sqlx::{FromRow, SqlitePool};
use strata_core::domain::{Entity, IdentityEntity, PageRequest, Query, SqlValue};
use strata_core::port::Repository;
use strata_infra_sqlite::{create_pool, SqliteContext, SqliteRepository};

#[derive(Debug, Clone, PartialEq, FromRow)]
struct Article {
    id: i64,
    title: String,
    category: String,
    views: i64,
}

impl Entity for Article {
    type Key = i64;

    fn table() -> &'static str {
        "articles"
    }

    fn key_column() -> &'static str {
        "id"
    }

    fn columns() -> &'static [&'static str] {
        &["title", "category", "views"]
    }

    fn key(&self) -> i64 {
        self.id
    }

    fn values(&self) -> Vec<SqlValue> {
        vec![
            SqlValue::from(self.title.clone()),
            SqlValue::from(self.category.clone()),
            SqlValue::from(self.views),
        ]
    }

    fn key_is_generated() -> bool {
        true
    }

    fn assign_key(&mut self, rowid: i64) {
        self.id = rowid;
    }
}

impl IdentityEntity for Article {}

async fn setup() -> SqlitePool {
    let pool = create_pool("sqlite::memory:").await.unwrap();
    sqlx::query(
        "CREATE TABLE articles (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            title TEXT NOT NULL,
            category TEXT NOT NULL,
            views INTEGER NOT NULL DEFAULT 0
        )",
    )
    .execute(&pool)
    .await
    .unwrap();
    pool
}

fn article(title: &str, category: &str) -> Article {
    Article {
        id: 0,
        title: title.to_string(),
        category: category.to_string(),
        views: 0,
    }
}

#[tokio::test]
async fn pages_partition_the_matching_rows() {
    let pool = setup().await;
    let ctx = SqliteContext::begin(&pool).await.unwrap();
    let repo = SqliteRepository::<Article>::new(&ctx);

    for i in 0..10 {
        let mut item = article(&format!("rust {}", i), "tech");
        repo.add(&mut item).await.unwrap();
    }
    for i in 0..3 {
        let mut item = article(&format!("other {}", i), "misc");
        repo.add(&mut item).await.unwrap();
    }

    let query = Query::new()
        .and_where("category = ?", [SqlValue::from("tech")])
        .order_by("id");

    let first = repo
        .find_paged(&PageRequest::new(1, 4), &query)
        .await
        .unwrap();
    assert_eq!(first.total_items, 10);
    assert_eq!(first.total_pages, 3);
    assert_eq!(first.items.len(), 4);

    let mut seen = Vec::new();
    for page in 1..=first.total_pages {
        let response = repo
            .find_paged(&PageRequest::new(page, 4), &query)
            .await
            .unwrap();
        assert!(response.items.len() <= 4);
        assert!(response.items.iter().all(|a| a.category == "tech"));
        seen.extend(response.items.into_iter().map(|a| a.id));
    }
    let raw_len = seen.len();
    seen.sort_unstable();
    seen.dedup();
    assert_eq!(seen.len(), raw_len, "no row may appear on two pages");
    assert_eq!(seen.len(), 10, "every matching row appears exactly once");

    ctx.abandon().await.unwrap();
}

#[tokio::test]
async fn page_past_the_end_is_empty_with_correct_totals() {
    let pool = setup().await;
    let ctx = SqliteContext::begin(&pool).await.unwrap();
    let repo = SqliteRepository::<Article>::new(&ctx);

    for i in 0..2 {
        let mut item = article(&format!("a{}", i), "tech");
        repo.add(&mut item).await.unwrap();
    }

    let response = repo
        .find_paged(&PageRequest::new(5, 2), &Query::new())
        .await
        .unwrap();
    assert!(response.items.is_empty());
    assert_eq!(response.total_items, 2);
    assert_eq!(response.total_pages, 1);

    ctx.abandon().await.unwrap();
}

#[tokio::test]
async fn save_decides_insert_versus_update_by_key_state() {
    let pool = setup().await;
    let ctx = SqliteContext::begin(&pool).await.unwrap();
    let repo = SqliteRepository::<Article>::new(&ctx);

    let mut item = article("draft", "tech");
    assert!(item.is_new());
    repo.save(&mut item).await.unwrap();
    assert!(!item.is_new(), "save of a new entity inserts and assigns a key");

    item.title = "published".to_string();
    repo.save(&mut item).await.unwrap();

    let all = repo.fetch_all().await.unwrap();
    assert_eq!(all.len(), 1, "save of an existing entity must not duplicate");
    assert_eq!(all[0].title, "published");

    ctx.abandon().await.unwrap();
}

#[tokio::test]
async fn two_column_scoped_updates_touch_only_their_columns() {
    let pool = setup().await;
    let ctx = SqliteContext::begin(&pool).await.unwrap();
    let repo = SqliteRepository::<Article>::new(&ctx);

    let mut item = article("original", "tech");
    repo.add(&mut item).await.unwrap();

    let mut first_change = item.clone();
    first_change.title = "renamed".to_string();
    first_change.category = "ignored".to_string();
    repo.modify_columns(&first_change, &["title"]).await.unwrap();

    let mut second_change = item.clone();
    second_change.views = 7;
    second_change.title = "ignored".to_string();
    repo.modify_columns(&second_change, &["views"]).await.unwrap();

    let found = repo.find(item.id).await.unwrap().unwrap();
    assert_eq!(found.title, "renamed");
    assert_eq!(found.category, "tech");
    assert_eq!(found.views, 7);

    ctx.abandon().await.unwrap();
}

#[tokio::test]
async fn conditional_modify_skips_entity_round_trips() {
    let pool = setup().await;
    let ctx = SqliteContext::begin(&pool).await.unwrap();
    let repo = SqliteRepository::<Article>::new(&ctx);

    for i in 0..4 {
        let mut item = article(&format!("a{}", i), if i % 2 == 0 { "tech" } else { "misc" });
        repo.add(&mut item).await.unwrap();
    }

    let rows = repo
        .modify_where(
            &[("views", SqlValue::from(100i64))],
            &Query::new().and_where("category = ?", [SqlValue::from("tech")]),
        )
        .await
        .unwrap();
    assert_eq!(rows, 2);

    let boosted = repo
        .query(&Query::new().and_where("views = ?", [SqlValue::from(100i64)]))
        .await
        .unwrap();
    assert_eq!(boosted.len(), 2);
    assert!(boosted.iter().all(|a| a.category == "tech"));

    ctx.abandon().await.unwrap();
}
