pub mod event;
pub mod history;
pub mod price;
pub mod settings;
pub mod summary;
