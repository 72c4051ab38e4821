//! CQRS marker traits
//!
//! Write requests implement [`Command`], read requests implement [`Query`].
//! Request tracing uses the distinction to label spans.

/// A request that changes state
pub trait Command {
    const KIND: &'static str = "command";
}

/// A request that only reads state
pub trait Query {
    const KIND: &'static str = "query";
}
