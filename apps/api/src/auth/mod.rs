// Auth: registration, email verification, login and bearer-token extractors.

pub mod extractors;
pub mod handlers;
pub mod jwt;
pub mod password;
pub mod registration;
pub mod verification;
