//! Application/orchestration layer: the Task Pipeline, Dispatcher, and
//! Progress Aggregator wiring that sit between the domain ports and the
//! HTTP/CLI surfaces.

pub mod adapter_registry;
pub mod color_extraction;
pub mod dispatcher;
pub mod retry;
pub mod status_api;
pub mod task_pipeline;
pub mod variant_resize;

pub use adapter_registry::AdapterRegistry;
pub use dispatcher::Dispatcher;
pub use status_api::StatusApi;
pub use task_pipeline::TaskPipeline;
