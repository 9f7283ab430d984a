pub mod extraction_service;
pub mod pagination_service;
pub mod price_service;
pub mod summary_service;
