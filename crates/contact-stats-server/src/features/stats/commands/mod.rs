pub mod record;

pub use record::{RecordStatsCommand, RecordStatsError};
