pub mod auth_service;
pub mod authorization;
pub mod comment_service;
pub mod post_service;
pub mod taxonomy_service;
