pub mod converter;
pub mod delivery;
pub mod email;
pub mod fetcher;
#[cfg(feature = "google-auth")]
pub mod google_auth;
pub mod inference;
pub mod plugger;
pub mod storage;
