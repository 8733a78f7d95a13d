//! Request-scoped values for the assistant service.

pub mod ask;
pub mod image;
pub mod product;

pub use ask::{AskRequest, AskResponse};
pub use image::{ImageAnalysis, UploadedImage};
pub use product::ProductSpec;
