use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(type_name = "country")]
pub enum Country {
    Poland,
    Germany,
    Czechia,
    Slovakia,
    Lithuania,
    Ukraine,
}

impl Default for Country {
    fn default() -> Self {
        Self::Poland
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Address {
    pub id: Uuid,
    pub street: String,
    pub city: String,
    pub province: String,
    pub postal_code: String,
    pub country: Country,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AddressResponse {
    pub street: String,
    pub city: String,
    pub province: String,
    pub postal_code: String,
    pub country: Country,
}

impl From<Address> for AddressResponse {
    fn from(address: Address) -> Self {
        Self {
            street: address.street,
            city: address.city,
            province: address.province,
            postal_code: address.postal_code,
            country: address.country,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct AddressInput {
    #[validate(length(min = 1, max = 120))]
    pub street: String,
    #[validate(length(min = 1, max = 64))]
    pub city: String,
    #[validate(length(min = 1, max = 64))]
    pub province: String,
    #[validate(length(min = 1, max = 10))]
    pub postal_code: String,
    #[serde(default)]
    pub country: Country,
}

/// Частичное обновление адреса: меняются только переданные поля
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct AddressPatch {
    #[validate(length(min = 1, max = 120))]
    pub street: Option<String>,
    #[validate(length(min = 1, max = 64))]
    pub city: Option<String>,
    #[validate(length(min = 1, max = 64))]
    pub province: Option<String>,
    #[validate(length(min = 1, max = 10))]
    pub postal_code: Option<String>,
    pub country: Option<Country>,
}

impl AddressPatch {
    pub fn is_empty(&self) -> bool {
        self.street.is_none()
            && self.city.is_none()
            && self.province.is_none()
            && self.postal_code.is_none()
            && self.country.is_none()
    }

    pub fn apply(&self, current: &Address) -> Address {
        Address {
            id: current.id,
            street: self.street.clone().unwrap_or_else(|| current.street.clone()),
            city: self.city.clone().unwrap_or_else(|| current.city.clone()),
            province: self.province.clone().unwrap_or_else(|| current.province.clone()),
            postal_code: self
                .postal_code
                .clone()
                .unwrap_or_else(|| current.postal_code.clone()),
            country: self.country.unwrap_or(current.country),
        }
    }
}

impl From<AddressInput> for AddressPatch {
    fn from(input: AddressInput) -> Self {
        Self {
            street: Some(input.street),
            city: Some(input.city),
            province: Some(input.province),
            postal_code: Some(input.postal_code),
            country: Some(input.country),
        }
    }
}
