//! Integration tests against a real PostgreSQL instance.
//!
//! Run with a reachable database:
//! `DATABASE_URL=postgres://... cargo test -p sahm-database -- --ignored`

use rust_decimal_macros::dec;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use sahm_database::{
    CompanyChanges, CompanyFilter, CompanyRepository, DatabaseError, FavoriteStore,
    MigrationConfig, MigrationManager, NewCompany, NotificationFlags, SubscriptionStore,
};

async fn pool() -> PgPool {
    let url = std::env::var("DATABASE_URL")
        .expect("DATABASE_URL must be set for integration tests");

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&url)
        .await
        .expect("connect to test database");

    let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("migrations");
    let manager = MigrationManager::new(
        MigrationConfig {
            migration_dir: dir.display().to_string(),
            ..MigrationConfig::default()
        },
        &dir,
    )
    .expect("init migration manager");
    manager.run_migrations(&pool).await.expect("run migrations");

    pool
}

fn unique_suffix() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos()
}

async fn create_user(pool: &PgPool) -> i64 {
    sqlx::query_scalar(
        "INSERT INTO users (name, email) VALUES ($1, $2) RETURNING id",
    )
    .bind("Test User")
    .bind(format!("user-{}@test.sahm.app", unique_suffix()))
    .fetch_one(pool)
    .await
    .expect("insert test user")
}

async fn create_type(pool: &PgPool, name_en: &str, name_ar: &str) -> i64 {
    sqlx::query_scalar(
        "INSERT INTO company_types (name_en, name_ar, slug) VALUES ($1, $2, $3) RETURNING id",
    )
    .bind(name_en)
    .bind(name_ar)
    .bind(format!("{}-{}", name_en.to_lowercase(), unique_suffix()))
    .fetch_one(pool)
    .await
    .expect("insert test company type")
}

fn new_company(type_id: i64, symbol: &str, name_en: &str, name_ar: &str) -> NewCompany {
    NewCompany {
        company_type_id: type_id,
        symbol: symbol.to_string(),
        name_en: name_en.to_string(),
        name_ar: name_ar.to_string(),
        ..NewCompany::default()
    }
}

#[tokio::test]
#[ignore]
async fn adding_the_same_favorite_twice_leaves_one_row() {
    let pool = pool().await;
    let repo = CompanyRepository::new(pool.clone());
    let favorites = FavoriteStore::new(pool.clone());

    let user_id = create_user(&pool).await;
    let type_id = create_type(&pool, "Banks", "البنوك").await;
    let suffix = unique_suffix();
    let company = repo
        .create(&new_company(type_id, &format!("FAV{suffix}"), "Fav Co", "شركة"))
        .await
        .unwrap();

    let first = favorites.add(user_id, company.id).await.unwrap();
    let second = favorites.add(user_id, company.id).await.unwrap();
    assert!(first);
    assert!(!second);

    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM user_company_favorites WHERE user_id = $1 AND company_id = $2",
    )
    .bind(user_id)
    .bind(company.id)
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(count, 1);
    assert!(favorites.is_favorited(user_id, company.id).await.unwrap());
}

#[tokio::test]
#[ignore]
async fn removing_a_never_added_favorite_is_a_no_op() {
    let pool = pool().await;
    let repo = CompanyRepository::new(pool.clone());
    let favorites = FavoriteStore::new(pool.clone());

    let user_id = create_user(&pool).await;
    let type_id = create_type(&pool, "Energy", "الطاقة").await;
    let suffix = unique_suffix();
    let company = repo
        .create(&new_company(type_id, &format!("NFV{suffix}"), "NoFav Co", "شركة"))
        .await
        .unwrap();

    let removed = favorites.remove(user_id, company.id).await.unwrap();
    assert!(!removed);
    assert!(!favorites.is_favorited(user_id, company.id).await.unwrap());
}

#[tokio::test]
#[ignore]
async fn subscription_defaults_apply_only_at_creation() {
    let pool = pool().await;
    let repo = CompanyRepository::new(pool.clone());
    let subscriptions = SubscriptionStore::new(pool.clone());

    let user_id = create_user(&pool).await;
    let type_id = create_type(&pool, "Telecom", "الاتصالات").await;
    let suffix = unique_suffix();
    let company = repo
        .create(&new_company(type_id, &format!("SUB{suffix}"), "Sub Co", "شركة"))
        .await
        .unwrap();

    assert!(subscriptions.get(user_id, company.id).await.unwrap().is_none());

    subscriptions
        .upsert(user_id, company.id, NotificationFlags::default())
        .await
        .unwrap();
    let stored = subscriptions.get(user_id, company.id).await.unwrap().unwrap();
    assert_eq!(stored, NotificationFlags::default());

    // Full replace on update: the vector is overwritten, not merged
    let replacement = NotificationFlags {
        notify_recommendations: false,
        notify_updates: false,
        notify_news: true,
        notify_price_alerts: false,
    };
    subscriptions
        .upsert(user_id, company.id, replacement)
        .await
        .unwrap();
    let stored = subscriptions.get(user_id, company.id).await.unwrap().unwrap();
    assert_eq!(stored, replacement);

    assert!(subscriptions.remove(user_id, company.id).await.unwrap());
    assert!(!subscriptions.remove(user_id, company.id).await.unwrap());
    assert!(subscriptions.get(user_id, company.id).await.unwrap().is_none());
}

#[tokio::test]
#[ignore]
async fn search_matches_symbol_or_either_localized_name() {
    let pool = pool().await;
    let repo = CompanyRepository::new(pool.clone());

    let type_id = create_type(&pool, "Materials", "المواد").await;
    let suffix = unique_suffix();
    let marker = format!("srchmk{suffix}");

    repo.create(&new_company(
        type_id,
        &format!("S1{suffix}"),
        &format!("Alpha {marker} Cement"),
        "أسمنت",
    ))
    .await
    .unwrap();
    repo.create(&new_company(
        type_id,
        &format!("S2{suffix}"),
        "Beta Steel",
        &format!("حديد {marker}"),
    ))
    .await
    .unwrap();
    repo.create(&new_company(type_id, &format!("S3{suffix}"), "Gamma Glass", "زجاج"))
        .await
        .unwrap();

    // Case-insensitive match against name_en and name_ar
    let filter = CompanyFilter {
        search: Some(marker.to_uppercase()),
        type_id: Some(type_id),
    };
    let (rows, total) = repo.list(&filter, 50, 0).await.unwrap();
    assert_eq!(total, 2);
    let symbols: Vec<&str> = rows.iter().map(|r| r.symbol.as_str()).collect();
    assert!(symbols.contains(&format!("S1{suffix}").as_str()));
    assert!(symbols.contains(&format!("S2{suffix}").as_str()));

    // Symbol match
    let filter = CompanyFilter {
        search: Some(format!("s3{suffix}")),
        type_id: Some(type_id),
    };
    let (rows, total) = repo.list(&filter, 50, 0).await.unwrap();
    assert_eq!(total, 1);
    assert_eq!(rows[0].symbol, format!("S3{suffix}"));
}

#[tokio::test]
#[ignore]
async fn type_filter_intersects_with_search() {
    let pool = pool().await;
    let repo = CompanyRepository::new(pool.clone());

    let banks = create_type(&pool, "Banks", "البنوك").await;
    let energy = create_type(&pool, "Energy", "الطاقة").await;
    let suffix = unique_suffix();
    let marker = format!("intermk{suffix}");

    repo.create(&new_company(banks, &format!("B1{suffix}"), &format!("{marker} Bank"), "بنك"))
        .await
        .unwrap();
    repo.create(&new_company(
        energy,
        &format!("E1{suffix}"),
        &format!("{marker} Energy"),
        "طاقة",
    ))
    .await
    .unwrap();

    let filter = CompanyFilter {
        search: Some(marker),
        type_id: Some(banks),
    };
    let (rows, total) = repo.list(&filter, 50, 0).await.unwrap();
    assert_eq!(total, 1);
    assert_eq!(rows[0].symbol, format!("B1{suffix}"));
}

#[tokio::test]
#[ignore]
async fn pagination_is_stable_and_covers_every_company_once() {
    let pool = pool().await;
    let repo = CompanyRepository::new(pool.clone());

    let type_id = create_type(&pool, "Insurance", "التأمين").await;
    let suffix = unique_suffix();
    for i in 0..5 {
        repo.create(&new_company(
            type_id,
            &format!("PG{i}{suffix}"),
            &format!("Pager {i}"),
            "شركة",
        ))
        .await
        .unwrap();
    }

    let filter = CompanyFilter {
        search: None,
        type_id: Some(type_id),
    };

    let page_size = 2i64;
    let mut seen = Vec::new();
    for page in 0..3 {
        let (rows, total) = repo.list(&filter, page_size, page * page_size).await.unwrap();
        assert_eq!(total, 5);
        seen.extend(rows.into_iter().map(|r| r.symbol));
    }

    assert_eq!(seen.len(), 5);
    let mut sorted = seen.clone();
    sorted.sort();
    sorted.dedup();
    assert_eq!(sorted.len(), 5, "every company appears exactly once");

    // Ordering stable by symbol ascending
    let mut expected = seen.clone();
    expected.sort();
    assert_eq!(seen, expected);
}

#[tokio::test]
#[ignore]
async fn windows_over_an_empty_company_are_empty_not_errors() {
    let pool = pool().await;
    let repo = CompanyRepository::new(pool.clone());

    let type_id = create_type(&pool, "Utilities", "المرافق").await;
    let suffix = unique_suffix();
    let company = repo
        .create(&new_company(type_id, &format!("EMT{suffix}"), "Empty Co", "شركة"))
        .await
        .unwrap();

    assert!(repo.recent_news(company.id, 10).await.unwrap().is_empty());
    assert!(repo.recent_ratings(company.id, 5).await.unwrap().is_empty());
    assert!(repo.recent_earnings(company.id, 5).await.unwrap().is_empty());
    assert!(repo.recent_dividends(company.id, 5).await.unwrap().is_empty());
    assert!(repo.recent_splits(company.id, 5).await.unwrap().is_empty());
    assert!(repo
        .recent_annual_financials(company.id, 5)
        .await
        .unwrap()
        .is_empty());
    assert!(repo.statistic(company.id).await.unwrap().is_none());
    assert!(repo.recommendation(company.id).await.unwrap().is_none());
    assert!(repo.latest_daily_indicator(company.id).await.unwrap().is_none());
}

#[tokio::test]
#[ignore]
async fn related_companies_share_the_type_and_exclude_self() {
    let pool = pool().await;
    let repo = CompanyRepository::new(pool.clone());

    let type_id = create_type(&pool, "Retail", "التجزئة").await;
    let other_type = create_type(&pool, "Food", "الأغذية").await;
    let suffix = unique_suffix();

    let subject = repo
        .create(&new_company(type_id, &format!("RL0{suffix}"), "Subject", "شركة"))
        .await
        .unwrap();
    for i in 1..=6 {
        repo.create(&new_company(
            type_id,
            &format!("RL{i}{suffix}"),
            &format!("Peer {i}"),
            "شركة",
        ))
        .await
        .unwrap();
    }
    repo.create(&new_company(other_type, &format!("RLX{suffix}"), "Stranger", "شركة"))
        .await
        .unwrap();

    let related = repo.related(type_id, subject.id, 4).await.unwrap();
    assert_eq!(related.len(), 4);
    assert!(related.iter().all(|r| r.id != subject.id));
    assert!(related.iter().all(|r| r.symbol.starts_with("RL")));
}

#[tokio::test]
#[ignore]
async fn soft_deleted_companies_disappear_from_default_queries() {
    let pool = pool().await;
    let repo = CompanyRepository::new(pool.clone());

    let type_id = create_type(&pool, "Media", "الإعلام").await;
    let suffix = unique_suffix();
    let company = repo
        .create(&new_company(type_id, &format!("DEL{suffix}"), "Doomed Co", "شركة"))
        .await
        .unwrap();

    assert!(repo.soft_delete(company.id).await.unwrap());
    // Second delete is a no-op
    assert!(!repo.soft_delete(company.id).await.unwrap());

    assert!(repo.find_by_id(company.id, false).await.unwrap().is_none());
    assert!(repo.find_by_symbol(&company.symbol).await.unwrap().is_none());

    // Administrative escape hatch still sees the tombstoned row
    let found = repo.find_by_id(company.id, true).await.unwrap().unwrap();
    assert!(found.is_deleted());

    let filter = CompanyFilter {
        search: None,
        type_id: Some(type_id),
    };
    let (rows, total) = repo.list(&filter, 50, 0).await.unwrap();
    assert_eq!(total, 0);
    assert!(rows.is_empty());
}

#[tokio::test]
#[ignore]
async fn duplicate_symbol_and_figi_are_conflicts() {
    let pool = pool().await;
    let repo = CompanyRepository::new(pool.clone());

    let type_id = create_type(&pool, "Tech", "التقنية").await;
    let suffix = unique_suffix();

    let mut first = new_company(type_id, &format!("UNQ{suffix}"), "Unique Co", "شركة");
    first.figi_code = Some(format!("BBG{suffix}"));
    repo.create(&first).await.unwrap();

    // Same symbol
    let dup_symbol = new_company(type_id, &format!("UNQ{suffix}"), "Copy Co", "شركة");
    let err = repo.create(&dup_symbol).await.unwrap_err();
    assert!(matches!(err, DatabaseError::UniqueViolation { .. }));

    // Same figi on a different symbol
    let mut dup_figi = new_company(type_id, &format!("UNQ2{suffix}"), "Copy Co", "شركة");
    dup_figi.figi_code = Some(format!("BBG{suffix}"));
    let err = repo.create(&dup_figi).await.unwrap_err();
    assert!(matches!(err, DatabaseError::UniqueViolation { .. }));

    // Multiple companies without a figi are fine
    repo.create(&new_company(type_id, &format!("UNQ3{suffix}"), "NoFigi A", "شركة"))
        .await
        .unwrap();
    repo.create(&new_company(type_id, &format!("UNQ4{suffix}"), "NoFigi B", "شركة"))
        .await
        .unwrap();
}

#[tokio::test]
#[ignore]
async fn update_writes_only_present_fields() {
    let pool = pool().await;
    let repo = CompanyRepository::new(pool.clone());

    let type_id = create_type(&pool, "Transport", "النقل").await;
    let suffix = unique_suffix();
    let company = repo
        .create(&new_company(type_id, &format!("UPD{suffix}"), "Before", "قبل"))
        .await
        .unwrap();

    let changes = CompanyChanges {
        name_en: Some("After".to_string()),
        ceo: Some("New CEO".to_string()),
        current_price: Some(dec!(101.25)),
        ..CompanyChanges::default()
    };
    let updated = repo.update(company.id, &changes).await.unwrap().unwrap();

    assert_eq!(updated.name_en, "After");
    assert_eq!(updated.ceo.as_deref(), Some("New CEO"));
    assert_eq!(updated.current_price, Some(dec!(101.25)));
    // Untouched fields survive
    assert_eq!(updated.name_ar, "قبل");
    assert_eq!(updated.symbol, company.symbol);

    // Updating a missing company yields None
    let missing = repo.update(i64::MAX, &changes).await.unwrap();
    assert!(missing.is_none());
}

#[tokio::test]
#[ignore]
async fn favorite_batch_lookup_marks_only_the_users_rows() {
    let pool = pool().await;
    let repo = CompanyRepository::new(pool.clone());
    let favorites = FavoriteStore::new(pool.clone());

    let user_id = create_user(&pool).await;
    let other_user = create_user(&pool).await;
    let type_id = create_type(&pool, "Health", "الصحة").await;
    let suffix = unique_suffix();

    let mut ids = Vec::new();
    for i in 0..3 {
        let company = repo
            .create(&new_company(
                type_id,
                &format!("BT{i}{suffix}"),
                &format!("Batch {i}"),
                "شركة",
            ))
            .await
            .unwrap();
        ids.push(company.id);
    }

    favorites.add(user_id, ids[0]).await.unwrap();
    favorites.add(user_id, ids[2]).await.unwrap();
    favorites.add(other_user, ids[1]).await.unwrap();

    let marked = favorites.favorited_ids(user_id, &ids).await.unwrap();
    assert!(marked.contains(&ids[0]));
    assert!(!marked.contains(&ids[1]));
    assert!(marked.contains(&ids[2]));

    let empty = favorites.favorited_ids(user_id, &[]).await.unwrap();
    assert!(empty.is_empty());
}

#[tokio::test]
#[ignore]
async fn favorites_listing_returns_only_favorited_companies() {
    let pool = pool().await;
    let repo = CompanyRepository::new(pool.clone());
    let favorites = FavoriteStore::new(pool.clone());

    let user_id = create_user(&pool).await;
    let type_id = create_type(&pool, "Chemicals", "الكيماويات").await;
    let suffix = unique_suffix();

    let favored = repo
        .create(&new_company(type_id, &format!("FL1{suffix}"), "Kept", "شركة"))
        .await
        .unwrap();
    repo.create(&new_company(type_id, &format!("FL2{suffix}"), "Skipped", "شركة"))
        .await
        .unwrap();

    favorites.add(user_id, favored.id).await.unwrap();

    let (rows, total) = repo.list_favorites(user_id, 50, 0).await.unwrap();
    assert_eq!(total, 1);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].id, favored.id);
}
