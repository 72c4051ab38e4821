pub mod commands;
pub mod queries;
pub mod routes;

pub use commands::{RecordStatsCommand, RecordStatsError};
pub use queries::{GetStatsError, GetStatsQuery};
pub use routes::stats_routes;
