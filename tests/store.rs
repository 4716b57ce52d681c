//! Проверки на живой базе. Запуск: DATABASE_URL=... cargo test -- --ignored

use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use rentals_backend::models::{
    AddressInput, ApartmentPatch, ApartmentWithAddress, ApartmentsQuery, Country,
    CreateApartmentRequest, Currency, RegisterRequest, VisitState, VisitsQuery,
};
use rentals_backend::services::{ApartmentService, AuthService, ImageService, VisitService};
use rentals_backend::AppError;

async fn create_user(pool: &PgPool, username: &str) -> Uuid {
    let request = RegisterRequest {
        username: username.to_string(),
        password: "long-enough-password".to_string(),
        email: None,
        first_name: None,
        last_name: None,
    };
    AuthService::create_user(pool, &request).await.unwrap().id
}

fn apartment_request(price: i64, surface: i64, is_available: bool) -> CreateApartmentRequest {
    CreateApartmentRequest {
        surface: Decimal::new(surface * 100, 2),
        price: Decimal::new(price * 100, 2),
        currency: Currency::Pln,
        deposit: None,
        description: "Two rooms near the park".to_string(),
        is_furnished: true,
        is_available,
        address: AddressInput {
            street: "Prosta 2".to_string(),
            city: "Warsaw".to_string(),
            province: "Masovian".to_string(),
            postal_code: "00-001".to_string(),
            country: Country::Poland,
        },
    }
}

async fn create_apartment(pool: &PgPool, owner_id: Uuid) -> ApartmentWithAddress {
    ApartmentService::create(pool, owner_id, &apartment_request(1500, 48, true))
        .await
        .unwrap()
}

async fn count(pool: &PgPool, table: &str) -> i64 {
    let (count,): (i64,) = sqlx::query_as(&format!("SELECT COUNT(*) FROM {}", table))
        .fetch_one(pool)
        .await
        .unwrap();
    count
}

async fn insert_image(pool: &PgPool, apartment_id: Uuid, is_main: bool) -> Uuid {
    let (id,): (Uuid,) = sqlx::query_as(
        r#"
        INSERT INTO apartment_images (apartment_id, storage_key, url, is_main)
        VALUES ($1, $2, $3, $4)
        RETURNING id
        "#,
    )
    .bind(apartment_id)
    .bind(format!("apartments/{}/{}.png", apartment_id, Uuid::new_v4()))
    .bind("http://localhost:9000/rentals/test.png")
    .bind(is_main)
    .fetch_one(pool)
    .await
    .unwrap();
    id
}

#[sqlx::test]
#[ignore]
async fn test_concurrent_duplicate_visits_leave_one_row(pool: PgPool) {
    let owner = create_user(&pool, "owner").await;
    let tenant = create_user(&pool, "tenant").await;
    let apartment = create_apartment(&pool, owner).await.apartment.id;
    let when = Utc::now() + Duration::days(3);

    let first = tokio::spawn({
        let pool = pool.clone();
        async move { VisitService::schedule(&pool, apartment, tenant, when).await }
    });
    let second = tokio::spawn({
        let pool = pool.clone();
        async move { VisitService::schedule(&pool, apartment, tenant, when).await }
    });

    let results = [first.await.unwrap(), second.await.unwrap()];
    let created = results.iter().filter(|r| r.is_ok()).count();
    let conflicts = results
        .iter()
        .filter(|r| matches!(r, Err(AppError::Conflict(_))))
        .count();

    assert_eq!(created, 1);
    assert_eq!(conflicts, 1);

    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM visits WHERE apartment_id = $1")
        .bind(apartment)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(count, 1);
}

#[sqlx::test]
#[ignore]
async fn test_owner_cannot_book_own_apartment(pool: PgPool) {
    let owner = create_user(&pool, "owner").await;
    let apartment = create_apartment(&pool, owner).await.apartment.id;

    let result =
        VisitService::schedule(&pool, apartment, owner, Utc::now() + Duration::days(1)).await;

    assert!(matches!(result, Err(AppError::Forbidden)));
}

#[sqlx::test]
#[ignore]
async fn test_concurrent_main_toggles_keep_single_main(pool: PgPool) {
    let owner = create_user(&pool, "owner").await;
    let apartment = create_apartment(&pool, owner).await.apartment.id;
    let first_image = insert_image(&pool, apartment, true).await;
    let second_image = insert_image(&pool, apartment, false).await;
    let third_image = insert_image(&pool, apartment, false).await;

    let mut handles = Vec::new();
    for image_id in [second_image, third_image, first_image] {
        let pool = pool.clone();
        handles.push(tokio::spawn(async move {
            ImageService::set_main(&pool, apartment, image_id).await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let images = ImageService::list(&pool, apartment).await.unwrap();
    assert_eq!(images.len(), 3);
    assert_eq!(images.iter().filter(|image| image.is_main).count(), 1);
}

#[sqlx::test]
#[ignore]
async fn test_deleting_main_image_leaves_none(pool: PgPool) {
    let owner = create_user(&pool, "owner").await;
    let apartment = create_apartment(&pool, owner).await.apartment.id;
    let main = insert_image(&pool, apartment, true).await;
    insert_image(&pool, apartment, false).await;

    ImageService::delete(&pool, apartment, main).await.unwrap();

    let images = ImageService::list(&pool, apartment).await.unwrap();
    assert_eq!(images.len(), 1);
    assert!(!images[0].is_main);
}

#[sqlx::test]
#[ignore]
async fn test_delete_advertisement_cascades(pool: PgPool) {
    let owner = create_user(&pool, "owner").await;
    let tenant = create_user(&pool, "tenant").await;
    let record = create_apartment(&pool, owner).await;
    let apartment = record.apartment.id;
    insert_image(&pool, apartment, true).await;
    VisitService::schedule(&pool, apartment, tenant, Utc::now() + Duration::days(5))
        .await
        .unwrap();

    let keys = ApartmentService::delete(&pool, apartment, owner).await.unwrap();
    assert_eq!(keys.len(), 1);

    for table in ["apartment_images", "visits"] {
        let (count,): (i64,) =
            sqlx::query_as(&format!("SELECT COUNT(*) FROM {} WHERE apartment_id = $1", table))
                .bind(apartment)
                .fetch_one(&pool)
                .await
                .unwrap();
        assert_eq!(count, 0, "{} rows left behind", table);
    }

    let (addresses,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM addresses WHERE id = $1")
        .bind(record.address.id)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(addresses, 0);
}

#[sqlx::test]
#[ignore]
async fn test_other_owner_cannot_delete(pool: PgPool) {
    let owner = create_user(&pool, "owner").await;
    let stranger = create_user(&pool, "stranger").await;
    let apartment = create_apartment(&pool, owner).await.apartment.id;

    let result = ApartmentService::delete(&pool, apartment, stranger).await;
    assert!(matches!(result, Err(AppError::NotFound(_))));

    let authorize = ImageService::authorize_owner(&pool, apartment, stranger).await;
    assert!(matches!(authorize, Err(AppError::Forbidden)));
}

#[sqlx::test]
#[ignore]
async fn test_patch_changes_only_given_fields(pool: PgPool) {
    let owner = create_user(&pool, "owner").await;
    let created = create_apartment(&pool, owner).await;

    let patch: ApartmentPatch =
        serde_json::from_str(r#"{"deposit":"600","address":{"street":"New St"}}"#).unwrap();
    ApartmentService::update(&pool, created.apartment.id, owner, &patch)
        .await
        .unwrap();

    let stored = ApartmentService::get_details(&pool, created.apartment.id)
        .await
        .unwrap();
    assert_eq!(stored.apartment.deposit, Some(Decimal::from(600)));
    assert_eq!(stored.apartment.price, Decimal::new(150000, 2));
    assert_eq!(stored.apartment.surface, created.apartment.surface);
    assert_eq!(stored.apartment.description, created.apartment.description);
    assert_eq!(stored.address.street, "New St");
    assert_eq!(stored.address.city, "Warsaw");
    assert_eq!(stored.address.postal_code, "00-001");
    assert_eq!(stored.address.id, created.address.id);
}

#[sqlx::test]
#[ignore]
async fn test_failed_create_leaves_no_address(pool: PgPool) {
    // Владельца нет в users: вставка квартиры падает после вставки адреса
    let result =
        ApartmentService::create(&pool, Uuid::new_v4(), &apartment_request(1500, 48, true)).await;

    assert!(matches!(result, Err(AppError::NotFound(_))));
    assert_eq!(count(&pool, "addresses").await, 0);
    assert_eq!(count(&pool, "apartments").await, 0);
}

#[sqlx::test]
#[ignore]
async fn test_foreign_advertisement_is_not_found(pool: PgPool) {
    let owner = create_user(&pool, "owner").await;
    let stranger = create_user(&pool, "stranger").await;
    let apartment = create_apartment(&pool, owner).await.apartment.id;

    let own = ApartmentService::get_owner_advertisement(&pool, apartment, owner).await;
    assert!(own.is_ok());

    let foreign = ApartmentService::get_owner_advertisement(&pool, apartment, stranger).await;
    assert!(matches!(foreign, Err(AppError::NotFound(_))));

    let patch = ApartmentPatch::default();
    let update = ApartmentService::update(&pool, apartment, stranger, &patch).await;
    assert!(matches!(update, Err(AppError::NotFound(_))));
}

#[sqlx::test]
#[ignore]
async fn test_list_available_filters_and_order(pool: PgPool) {
    let owner = create_user(&pool, "owner").await;
    let mut ids = Vec::new();
    for (price, surface, available) in [(1500, 48, true), (3000, 80, true), (2000, 50, false)] {
        let created = ApartmentService::create(
            &pool,
            owner,
            &apartment_request(price, surface, available),
        )
        .await
        .unwrap();
        ids.push(created.apartment.id);
    }

    let listed = |query: ApartmentsQuery| {
        let pool = pool.clone();
        async move {
            ApartmentService::list_available(&pool, &query)
                .await
                .unwrap()
                .into_iter()
                .map(|apartment| apartment.id)
                .collect::<Vec<_>>()
        }
    };

    assert_eq!(listed(ApartmentsQuery::default()).await, vec![ids[0], ids[1]]);

    let by_price = ApartmentsQuery {
        price_gte: Some(Decimal::from(2000)),
        ..Default::default()
    };
    assert_eq!(listed(by_price).await, vec![ids[1]]);

    let by_surface = ApartmentsQuery {
        surface_lte: Some(Decimal::from(50)),
        ..Default::default()
    };
    assert_eq!(listed(by_surface).await, vec![ids[0]]);

    let unavailable = ApartmentsQuery {
        is_available: Some(false),
        ..Default::default()
    };
    assert_eq!(listed(unavailable).await, vec![ids[2]]);

    let second_page = ApartmentsQuery {
        page: Some(1),
        limit: Some(1),
        ..Default::default()
    };
    assert_eq!(listed(second_page).await, vec![ids[1]]);
}

#[sqlx::test]
#[ignore]
async fn test_visit_listings_filter_by_role_and_fields(pool: PgPool) {
    let owner = create_user(&pool, "owner").await;
    let anna = create_user(&pool, "anna").await;
    let piotr = create_user(&pool, "piotr").await;
    let first = create_apartment(&pool, owner).await.apartment.id;
    let second = create_apartment(&pool, owner).await.apartment.id;
    let base = Utc::now();

    VisitService::schedule(&pool, second, anna, base + Duration::days(10))
        .await
        .unwrap();
    VisitService::schedule(&pool, first, anna, base + Duration::days(3))
        .await
        .unwrap();
    VisitService::schedule(&pool, first, piotr, base + Duration::days(5))
        .await
        .unwrap();

    let all = VisitService::list_for_owner(&pool, owner, &VisitsQuery::default())
        .await
        .unwrap();
    assert_eq!(all.len(), 3);
    assert!(all.windows(2).all(|pair| pair[0].date_time <= pair[1].date_time));

    let by_apartment = VisitsQuery {
        apartment: Some(second),
        ..Default::default()
    };
    let visits = VisitService::list_for_owner(&pool, owner, &by_apartment)
        .await
        .unwrap();
    assert_eq!(visits.len(), 1);
    assert_eq!(visits[0].tenant_id, anna);

    let before = VisitsQuery {
        date_time_lte: Some(base + Duration::days(6)),
        state: Some(VisitState::Pending),
        ..Default::default()
    };
    let visits = VisitService::list_for_owner(&pool, owner, &before)
        .await
        .unwrap();
    assert_eq!(visits.len(), 2);

    let stranger_view = VisitService::list_for_owner(&pool, anna, &VisitsQuery::default())
        .await
        .unwrap();
    assert!(stranger_view.is_empty());

    let own = VisitService::list_for_tenant(&pool, anna, &VisitsQuery::default())
        .await
        .unwrap();
    assert_eq!(
        own.iter().map(|visit| visit.apartment_id).collect::<Vec<_>>(),
        vec![first, second]
    );

    let later = VisitsQuery {
        date_time_gte: Some(base + Duration::days(4)),
        ..Default::default()
    };
    let visits = VisitService::list_for_tenant(&pool, anna, &later).await.unwrap();
    assert_eq!(visits.len(), 1);
    assert_eq!(visits[0].apartment_id, second);
}

#[sqlx::test]
#[ignore]
async fn test_login_ignores_surrounding_spaces(pool: PgPool) {
    let id = create_user(&pool, "  marta  ").await;

    let user = AuthService::authenticate(&pool, " marta", "long-enough-password")
        .await
        .unwrap();
    assert_eq!(user.id, id);
    assert_eq!(user.username, "marta");
}
