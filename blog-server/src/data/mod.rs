pub mod comment_repository;
#[cfg(test)]
pub mod memory;
pub mod post_repository;
pub mod taxonomy_repository;
pub mod user_repository;
