pub mod token;
pub mod translation;
