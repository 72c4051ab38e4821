pub use mediator::DefaultAsyncMediator;
use std::sync::Arc;

use crate::features::stats::{
    commands::{record, RecordStatsCommand},
    queries::{get, GetStatsQuery},
};
use crate::pipeline::StatsPipeline;

pub mod middleware;

pub type AppMediator = DefaultAsyncMediator;

pub fn build_mediator(pipeline: Arc<StatsPipeline>) -> AppMediator {
    DefaultAsyncMediator::builder()
        // Stats
        .add_handler({
            let pipeline = pipeline.clone();
            move |cmd: RecordStatsCommand| {
                let pipeline = pipeline.clone();
                async move { record::handle(pipeline, Some(cmd)).await }
            }
        })
        .add_handler({
            let pipeline = pipeline.clone();
            move |query: GetStatsQuery| {
                let pipeline = pipeline.clone();
                async move { get::handle(pipeline, query).await }
            }
        })
        .build()
}
