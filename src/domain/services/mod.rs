pub mod market_feed;
pub mod position_sizer;
