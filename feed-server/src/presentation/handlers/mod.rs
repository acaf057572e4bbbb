pub(crate) mod auth;
pub(crate) mod comments;
pub(crate) mod posts;
