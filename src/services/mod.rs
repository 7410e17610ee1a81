pub mod cache;
pub mod encoding;
pub mod google;
pub mod provider;
pub mod response;
pub mod token;
