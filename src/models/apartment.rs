use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use super::{Address, AddressInput, AddressPatch, AddressResponse, ImageSummary};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(type_name = "currency", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    Pln,
    Eur,
    Usd,
    Gbp,
    Chf,
}

impl Default for Currency {
    fn default() -> Self {
        Self::Pln
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Apartment {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub address_id: Uuid,
    pub surface: Decimal,
    pub price: Decimal,
    pub currency: Currency,
    pub deposit: Option<Decimal>,
    pub is_available: bool,
    pub is_furnished: bool,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Квартира вместе со своим адресом
#[derive(Debug, Clone)]
pub struct ApartmentWithAddress {
    pub apartment: Apartment,
    pub address: Address,
}

/// Элемент публичного списка объявлений
#[derive(Debug, Serialize, ToSchema)]
pub struct ApartmentResponse {
    pub id: Uuid,
    pub surface: Decimal,
    pub is_furnished: bool,
    pub price: Decimal,
    pub currency: Currency,
    pub deposit: Option<Decimal>,
    pub is_available: bool,
    pub address: AddressResponse,
    pub main_image: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ApartmentDetailResponse {
    pub id: Uuid,
    pub surface: Decimal,
    pub is_furnished: bool,
    pub price: Decimal,
    pub currency: Currency,
    pub deposit: Option<Decimal>,
    pub is_available: bool,
    pub description: String,
    pub owner: Uuid,
    pub address: AddressResponse,
    pub images: Vec<ImageSummary>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ApartmentDetailResponse {
    pub fn new(record: ApartmentWithAddress, images: Vec<ImageSummary>) -> Self {
        let ApartmentWithAddress { apartment, address } = record;
        Self {
            id: apartment.id,
            surface: apartment.surface,
            is_furnished: apartment.is_furnished,
            price: apartment.price,
            currency: apartment.currency,
            deposit: apartment.deposit,
            is_available: apartment.is_available,
            description: apartment.description,
            owner: apartment.owner_id,
            address: AddressResponse::from(address),
            images,
            created_at: apartment.created_at,
            updated_at: apartment.updated_at,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct CreateApartmentRequest {
    pub surface: Decimal,
    pub price: Decimal,
    #[serde(default)]
    pub currency: Currency,
    pub deposit: Option<Decimal>,
    #[validate(length(min = 1, max = 600))]
    pub description: String,
    #[serde(default = "default_true")]
    pub is_furnished: bool,
    #[serde(default = "default_true")]
    pub is_available: bool,
    #[validate(nested)]
    pub address: AddressInput,
}

fn default_true() -> bool {
    true
}

/// Частичное обновление объявления. Неизвестные поля отклоняются.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct ApartmentPatch {
    pub surface: Option<Decimal>,
    pub price: Option<Decimal>,
    pub currency: Option<Currency>,
    pub deposit: Option<Decimal>,
    #[validate(length(min = 1, max = 600))]
    pub description: Option<String>,
    pub is_furnished: Option<bool>,
    pub is_available: Option<bool>,
    #[validate(nested)]
    pub address: Option<AddressPatch>,
}

impl ApartmentPatch {
    pub fn apply(&self, current: &Apartment) -> Apartment {
        Apartment {
            surface: self.surface.unwrap_or(current.surface),
            price: self.price.unwrap_or(current.price),
            currency: self.currency.unwrap_or(current.currency),
            deposit: self.deposit.or(current.deposit),
            description: self
                .description
                .clone()
                .unwrap_or_else(|| current.description.clone()),
            is_furnished: self.is_furnished.unwrap_or(current.is_furnished),
            is_available: self.is_available.unwrap_or(current.is_available),
            ..current.clone()
        }
    }
}

// PUT приходит с полным телом и сводится к патчу со всеми полями
impl From<CreateApartmentRequest> for ApartmentPatch {
    fn from(request: CreateApartmentRequest) -> Self {
        Self {
            surface: Some(request.surface),
            price: Some(request.price),
            currency: Some(request.currency),
            deposit: request.deposit,
            description: Some(request.description),
            is_furnished: Some(request.is_furnished),
            is_available: Some(request.is_available),
            address: Some(AddressPatch::from(request.address)),
        }
    }
}

#[derive(Debug, Default, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ApartmentsQuery {
    #[serde(rename = "price__gte")]
    pub price_gte: Option<Decimal>,
    #[serde(rename = "price__lte")]
    pub price_lte: Option<Decimal>,
    #[serde(rename = "surface__gte")]
    pub surface_gte: Option<Decimal>,
    #[serde(rename = "surface__lte")]
    pub surface_lte: Option<Decimal>,
    pub is_available: Option<bool>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}
