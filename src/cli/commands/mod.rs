//! One handler module per CLI subcommand.

pub mod cancel;
pub mod reconcile;
pub mod serve;
pub mod status;
pub mod submit;
pub mod worker;
