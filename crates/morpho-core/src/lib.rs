pub mod analyzer;
pub mod dict;
pub mod settings;
pub mod unicode;
pub mod unknown;
