pub mod http;
pub mod inventory_history;
pub mod steam_market;
pub mod traits;
