//! Meridian engine crate.
//!
//! Loads shapefile layers on a background worker and draws them with wgpu.
//!
//! | Module | Role |
//! |--------|------|
//! | [`sync`] | message queue and fence wait: the cross-thread handoff primitives |
//! | [`loader`] | requests, worker, coordinator: build / fence / post / adopt |
//! | [`layers`] | wgpu secondary context, fences, layer builders and geometry |
//! | [`render`] | map projection and the layer renderer |
//! | [`device`], [`window`], [`core`], [`time`] | primary GPU context, window loop, app callbacks, frame pacing |
//! | [`logging`] | `env_logger` setup |

pub mod core;
pub mod device;
pub mod layers;
pub mod loader;
pub mod logging;
pub mod render;
pub mod sync;
pub mod time;
pub mod window;
