pub mod importer;
pub mod shopify;
