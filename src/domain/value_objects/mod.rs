pub mod language;
pub mod position_sizing;
pub mod price;
