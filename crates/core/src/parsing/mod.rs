pub mod history_markup;
pub mod market_markup;
