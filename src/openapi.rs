use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Rentals API",
        version = "1.0.0",
        description = "Backend API for apartment rental advertisements, photos and visit scheduling",
        contact(
            name = "Rentals Team",
            email = "support@rentals.example"
        )
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development server")
    ),
    tags(
        (name = "auth", description = "Registration and tokens"),
        (name = "users", description = "Current user"),
        (name = "apartments", description = "Public apartment catalog"),
        (name = "advertisements", description = "Owner advertisement management"),
        (name = "images", description = "Advertisement photos"),
        (name = "visits", description = "Apartment visit scheduling")
    ),
    paths(
        // Auth
        crate::api::auth::register,
        crate::api::auth::obtain_token,
        crate::api::auth::refresh_token,
        // Users
        crate::api::users::get_me,
        // Apartments
        crate::api::apartments::list_apartments,
        crate::api::apartments::get_apartment,
        // Advertisements
        crate::api::advertisements::list_advertisements,
        crate::api::advertisements::create_advertisement,
        crate::api::advertisements::get_advertisement,
        crate::api::advertisements::replace_advertisement,
        crate::api::advertisements::update_advertisement,
        crate::api::advertisements::delete_advertisement,
        // Images
        crate::api::images::list_images,
        crate::api::images::upload_images,
        crate::api::images::get_image,
        crate::api::images::update_image,
        crate::api::images::delete_image,
        // Visits
        crate::api::visits::create_visit,
        crate::api::visits::list_owner_visits,
        crate::api::visits::list_tenant_visits,
    ),
    components(
        schemas(
            // Auth
            crate::models::RegisterRequest,
            crate::models::TokenRequest,
            crate::models::RefreshTokenRequest,
            crate::models::TokenResponse,
            crate::models::UserPublic,
            // Apartments
            crate::models::Country,
            crate::models::Currency,
            crate::models::AddressResponse,
            crate::models::AddressInput,
            crate::models::AddressPatch,
            crate::models::ApartmentResponse,
            crate::models::ApartmentDetailResponse,
            crate::models::CreateApartmentRequest,
            crate::models::ApartmentPatch,
            // Images
            crate::models::ImageSummary,
            crate::models::Resolution,
            crate::models::ImageDetailResponse,
            crate::models::UpdateImageRequest,
            crate::models::RejectedFile,
            crate::models::UploadImagesResponse,
            // Visits
            crate::models::VisitState,
            crate::models::VisitResponse,
            crate::models::CreateVisitRequest,
        )
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                utoipa::openapi::security::SecurityScheme::Http(
                    utoipa::openapi::security::Http::new(
                        utoipa::openapi::security::HttpAuthScheme::Bearer,
                    ),
                ),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_lists_resource_paths() {
        let doc = ApiDoc::openapi();
        let paths = &doc.paths.paths;

        assert!(paths.contains_key("/api/v1/apartments"));
        assert!(paths.contains_key("/api/v1/me/advertisements/{id}/images/{image_id}"));
        assert!(paths.contains_key("/api/v1/apartments/{id}/visit"));
        assert!(paths.contains_key("/api/v1/me/visits"));
    }
}
