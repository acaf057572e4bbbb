pub(crate) mod comment_repository;
pub(crate) mod post_catalog;
pub(crate) mod repositories;
pub(crate) mod user_repository;
