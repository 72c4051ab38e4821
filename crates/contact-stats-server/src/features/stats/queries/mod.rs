pub mod get;

pub use get::{GetStatsError, GetStatsQuery};
