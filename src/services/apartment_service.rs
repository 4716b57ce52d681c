use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::models::{
    Address, AddressResponse, Apartment, ApartmentPatch, ApartmentResponse, ApartmentWithAddress,
    ApartmentsQuery, Country, CreateApartmentRequest, Currency,
};
use crate::utils::validators::{
    validate_deposit, validate_postal_code_field, validate_price, validate_surface,
};

const SELECT_APARTMENT: &str = r#"
    SELECT
        a.id, a.owner_id, a.address_id, a.surface, a.price, a.currency, a.deposit,
        a.is_available, a.is_furnished, a.description, a.created_at, a.updated_at,
        ad.street, ad.city, ad.province, ad.postal_code, ad.country,
        (
            SELECT i.url FROM apartment_images i
            WHERE i.apartment_id = a.id AND i.is_main
        ) AS main_image
    FROM apartments a
    JOIN addresses ad ON ad.id = a.address_id
"#;

#[derive(Debug, FromRow)]
struct ApartmentRow {
    id: Uuid,
    owner_id: Uuid,
    address_id: Uuid,
    surface: Decimal,
    price: Decimal,
    currency: Currency,
    deposit: Option<Decimal>,
    is_available: bool,
    is_furnished: bool,
    description: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    street: String,
    city: String,
    province: String,
    postal_code: String,
    country: Country,
    main_image: Option<String>,
}

impl ApartmentRow {
    fn into_parts(self) -> (ApartmentWithAddress, Option<String>) {
        let record = ApartmentWithAddress {
            apartment: Apartment {
                id: self.id,
                owner_id: self.owner_id,
                address_id: self.address_id,
                surface: self.surface,
                price: self.price,
                currency: self.currency,
                deposit: self.deposit,
                is_available: self.is_available,
                is_furnished: self.is_furnished,
                description: self.description,
                created_at: self.created_at,
                updated_at: self.updated_at,
            },
            address: Address {
                id: self.address_id,
                street: self.street,
                city: self.city,
                province: self.province,
                postal_code: self.postal_code,
                country: self.country,
            },
        };
        (record, self.main_image)
    }
}

fn list_response(row: ApartmentRow) -> ApartmentResponse {
    let (record, main_image) = row.into_parts();
    let ApartmentWithAddress { apartment, address } = record;
    ApartmentResponse {
        id: apartment.id,
        surface: apartment.surface,
        is_furnished: apartment.is_furnished,
        price: apartment.price,
        currency: apartment.currency,
        deposit: apartment.deposit,
        is_available: apartment.is_available,
        address: AddressResponse::from(address),
        main_image,
    }
}

pub const DEFAULT_PAGE_SIZE: i64 = 20;
pub const MAX_PAGE_SIZE: i64 = 100;

/// LIMIT и OFFSET для страницы каталога; страницы считаются с нуля
pub fn page_window(page: Option<i64>, limit: Option<i64>) -> AppResult<(i64, i64)> {
    let limit = limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
    let offset = page
        .unwrap_or(0)
        .max(0)
        .checked_mul(limit)
        .ok_or_else(|| AppError::Validation("page: page number is too large".to_string()))?;
    Ok((limit, offset))
}

pub fn validate_create(request: &CreateApartmentRequest) -> AppResult<()> {
    request.validate()?;
    validate_surface(request.surface)?;
    validate_price(request.price)?;
    if let Some(deposit) = request.deposit {
        validate_deposit(deposit)?;
    }
    validate_postal_code_field(&request.address.postal_code)
}

pub fn validate_patch(patch: &ApartmentPatch) -> AppResult<()> {
    patch.validate()?;
    if let Some(surface) = patch.surface {
        validate_surface(surface)?;
    }
    if let Some(price) = patch.price {
        validate_price(price)?;
    }
    if let Some(deposit) = patch.deposit {
        validate_deposit(deposit)?;
    }
    if let Some(postal_code) = patch.address.as_ref().and_then(|a| a.postal_code.as_deref()) {
        validate_postal_code_field(postal_code)?;
    }
    Ok(())
}

pub struct ApartmentService;

impl ApartmentService {
    /// Публичный список объявлений в порядке добавления
    pub async fn list_available(
        pool: &PgPool,
        query: &ApartmentsQuery,
    ) -> AppResult<Vec<ApartmentResponse>> {
        let (limit, offset) = page_window(query.page, query.limit)?;

        let sql = format!(
            r#"{}
            WHERE a.is_available = $1
              AND ($2::numeric IS NULL OR a.price >= $2)
              AND ($3::numeric IS NULL OR a.price <= $3)
              AND ($4::numeric IS NULL OR a.surface >= $4)
              AND ($5::numeric IS NULL OR a.surface <= $5)
            ORDER BY a.created_at, a.id
            LIMIT $6 OFFSET $7
            "#,
            SELECT_APARTMENT
        );

        let rows = sqlx::query_as::<_, ApartmentRow>(&sql)
            .bind(query.is_available.unwrap_or(true))
            .bind(query.price_gte)
            .bind(query.price_lte)
            .bind(query.surface_gte)
            .bind(query.surface_lte)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await?;

        Ok(rows.into_iter().map(list_response).collect())
    }

    pub async fn get_details(pool: &PgPool, apartment_id: Uuid) -> AppResult<ApartmentWithAddress> {
        let sql = format!("{} WHERE a.id = $1", SELECT_APARTMENT);

        sqlx::query_as::<_, ApartmentRow>(&sql)
            .bind(apartment_id)
            .fetch_optional(pool)
            .await?
            .map(|row| row.into_parts().0)
            .ok_or_else(|| AppError::NotFound("Apartment not found".to_string()))
    }

    pub async fn list_owner_advertisements(
        pool: &PgPool,
        owner_id: Uuid,
    ) -> AppResult<Vec<ApartmentWithAddress>> {
        let sql = format!(
            "{} WHERE a.owner_id = $1 ORDER BY a.created_at, a.id",
            SELECT_APARTMENT
        );

        let rows = sqlx::query_as::<_, ApartmentRow>(&sql)
            .bind(owner_id)
            .fetch_all(pool)
            .await?;

        Ok(rows.into_iter().map(|row| row.into_parts().0).collect())
    }

    /// Чужое объявление неотличимо от несуществующего
    pub async fn get_owner_advertisement(
        pool: &PgPool,
        apartment_id: Uuid,
        owner_id: Uuid,
    ) -> AppResult<ApartmentWithAddress> {
        let sql = format!("{} WHERE a.id = $1 AND a.owner_id = $2", SELECT_APARTMENT);

        sqlx::query_as::<_, ApartmentRow>(&sql)
            .bind(apartment_id)
            .bind(owner_id)
            .fetch_optional(pool)
            .await?
            .map(|row| row.into_parts().0)
            .ok_or_else(|| AppError::NotFound("Advertisement not found".to_string()))
    }

    pub async fn create(
        pool: &PgPool,
        owner_id: Uuid,
        request: &CreateApartmentRequest,
    ) -> AppResult<ApartmentWithAddress> {
        validate_create(request)?;

        let mut tx = pool.begin().await?;

        let address = sqlx::query_as::<_, Address>(
            r#"
            INSERT INTO addresses (street, city, province, postal_code, country)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(&request.address.street)
        .bind(&request.address.city)
        .bind(&request.address.province)
        .bind(&request.address.postal_code)
        .bind(request.address.country)
        .fetch_one(&mut *tx)
        .await?;

        let apartment = sqlx::query_as::<_, Apartment>(
            r#"
            INSERT INTO apartments (
                owner_id, address_id, surface, price, currency, deposit,
                is_available, is_furnished, description
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(owner_id)
        .bind(address.id)
        .bind(request.surface)
        .bind(request.price)
        .bind(request.currency)
        .bind(request.deposit)
        .bind(request.is_available)
        .bind(request.is_furnished)
        .bind(&request.description)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(apartment_id = %apartment.id, owner_id = %owner_id, "Advertisement created");

        Ok(ApartmentWithAddress { apartment, address })
    }

    pub async fn update(
        pool: &PgPool,
        apartment_id: Uuid,
        owner_id: Uuid,
        patch: &ApartmentPatch,
    ) -> AppResult<ApartmentWithAddress> {
        validate_patch(patch)?;

        let mut tx = pool.begin().await?;

        let current = lock_owned_apartment(&mut tx, apartment_id, owner_id).await?;

        let mut address = sqlx::query_as::<_, Address>("SELECT * FROM addresses WHERE id = $1")
            .bind(current.address_id)
            .fetch_one(&mut *tx)
            .await?;

        if let Some(address_patch) = patch.address.as_ref().filter(|p| !p.is_empty()) {
            let merged = address_patch.apply(&address);
            address = sqlx::query_as::<_, Address>(
                r#"
                UPDATE addresses
                SET street = $2, city = $3, province = $4, postal_code = $5, country = $6
                WHERE id = $1
                RETURNING *
                "#,
            )
            .bind(merged.id)
            .bind(&merged.street)
            .bind(&merged.city)
            .bind(&merged.province)
            .bind(&merged.postal_code)
            .bind(merged.country)
            .fetch_one(&mut *tx)
            .await?;
        }

        let merged = patch.apply(&current);
        let apartment = sqlx::query_as::<_, Apartment>(
            r#"
            UPDATE apartments SET
                surface = $2,
                price = $3,
                currency = $4,
                deposit = $5,
                is_available = $6,
                is_furnished = $7,
                description = $8,
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(merged.id)
        .bind(merged.surface)
        .bind(merged.price)
        .bind(merged.currency)
        .bind(merged.deposit)
        .bind(merged.is_available)
        .bind(merged.is_furnished)
        .bind(&merged.description)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(apartment_id = %apartment_id, "Advertisement updated");

        Ok(ApartmentWithAddress { apartment, address })
    }

    /// Удаляет объявление вместе с адресом; изображения и визиты удаляются каскадом.
    /// Возвращает ключи объектов хранилища, которые нужно удалить после коммита.
    pub async fn delete(pool: &PgPool, apartment_id: Uuid, owner_id: Uuid) -> AppResult<Vec<String>> {
        let mut tx = pool.begin().await?;

        let current = lock_owned_apartment(&mut tx, apartment_id, owner_id).await?;

        let keys: Vec<(String,)> =
            sqlx::query_as("SELECT storage_key FROM apartment_images WHERE apartment_id = $1")
                .bind(apartment_id)
                .fetch_all(&mut *tx)
                .await?;

        sqlx::query("DELETE FROM apartments WHERE id = $1")
            .bind(apartment_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM addresses WHERE id = $1")
            .bind(current.address_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::info!(apartment_id = %apartment_id, "Advertisement deleted");

        Ok(keys.into_iter().map(|(key,)| key).collect())
    }
}

async fn lock_owned_apartment(
    tx: &mut Transaction<'_, Postgres>,
    apartment_id: Uuid,
    owner_id: Uuid,
) -> AppResult<Apartment> {
    sqlx::query_as::<_, Apartment>(
        "SELECT * FROM apartments WHERE id = $1 AND owner_id = $2 FOR UPDATE",
    )
    .bind(apartment_id)
    .bind(owner_id)
    .fetch_optional(&mut **tx)
    .await?
    .ok_or_else(|| AppError::NotFound("Advertisement not found".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AddressInput, AddressPatch};
    use std::str::FromStr;

    fn request() -> CreateApartmentRequest {
        CreateApartmentRequest {
            surface: Decimal::from_str("48.00").unwrap(),
            price: Decimal::from_str("1500.00").unwrap(),
            currency: Currency::Pln,
            deposit: Some(Decimal::from(500)),
            description: "Bright flat".to_string(),
            is_furnished: true,
            is_available: true,
            address: AddressInput {
                street: "Prosta 2".to_string(),
                city: "Warsaw".to_string(),
                province: "Masovian".to_string(),
                postal_code: "00-001".to_string(),
                country: Country::Poland,
            },
        }
    }

    #[test]
    fn test_validate_create_accepts_valid_request() {
        assert!(validate_create(&request()).is_ok());
    }

    #[test]
    fn test_validate_create_rejects_low_price() {
        let mut request = request();
        request.price = Decimal::from(999);
        assert!(matches!(validate_create(&request), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_validate_create_rejects_empty_street() {
        let mut request = request();
        request.address.street = String::new();
        assert!(matches!(validate_create(&request), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_validate_patch_checks_only_present_fields() {
        assert!(validate_patch(&ApartmentPatch::default()).is_ok());

        let patch = ApartmentPatch {
            deposit: Some(Decimal::from(10)),
            ..Default::default()
        };
        assert!(validate_patch(&patch).is_err());

        let patch = ApartmentPatch {
            address: Some(AddressPatch {
                postal_code: Some("??".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        };
        assert!(validate_patch(&patch).is_err());
    }

    #[test]
    fn test_page_window() {
        assert_eq!(page_window(None, None).unwrap(), (20, 0));
        assert_eq!(page_window(Some(3), Some(10)).unwrap(), (10, 30));
        assert_eq!(page_window(Some(-5), Some(0)).unwrap(), (1, 0));
        assert_eq!(page_window(Some(1), Some(1000)).unwrap(), (100, 100));
    }

    #[test]
    fn test_huge_page_is_rejected() {
        assert!(matches!(
            page_window(Some(i64::MAX), Some(100)),
            Err(AppError::Validation(_))
        ));
    }
}
