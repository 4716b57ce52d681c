pub mod apartment_service;
pub mod auth_service;
pub mod file_service;
pub mod image_service;
pub mod visit_service;

pub use apartment_service::ApartmentService;
pub use auth_service::AuthService;
pub use file_service::FileService;
pub use image_service::ImageService;
pub use visit_service::VisitService;
