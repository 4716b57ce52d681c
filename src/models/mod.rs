pub mod address;
pub mod apartment;
pub mod image;
pub mod user;
pub mod visit;

pub use address::*;
pub use apartment::*;
pub use image::*;
pub use user::*;
pub use visit::*;
