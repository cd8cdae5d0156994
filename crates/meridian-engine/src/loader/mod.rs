//! Background loading of shapefile layers.
//!
//! | module        | role                                                     |
//! |---------------|----------------------------------------------------------|
//! | `request`     | [`ShapefileRequest`], the unit of work                   |
//! | `context`     | [`LoadContext`], the worker's secondary rendering context |
//! | `builder`     | [`BuilderRegistry`], shape type to builder lookup         |
//! | `worker`      | [`ShapefileWorker`], build / fence / post per request     |
//! | `coordinator` | [`LoadCoordinator`], queues, worker lifecycle, adoption  |

mod builder;
mod config;
mod context;
mod coordinator;
mod error;
mod request;
mod worker;

pub use builder::{BuildFn, BuilderRegistry};
pub use config::{FailurePolicy, LoadMode, LoaderConfig};
pub use context::LoadContext;
pub use coordinator::{LoadCoordinator, RenderableSet, TeardownReport};
pub use error::LoadError;
pub use request::ShapefileRequest;
pub use worker::{LoadFailure, ShapefileWorker, WorkerState};
