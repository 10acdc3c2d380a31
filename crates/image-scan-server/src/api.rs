pub mod admission_review;
pub(crate) mod api_error;
pub(crate) mod handlers;
pub mod image_review;
pub(crate) mod state;
