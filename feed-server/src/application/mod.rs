pub(crate) mod auth_service;
pub(crate) mod comment_service;
