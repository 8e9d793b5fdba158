//! Client-side list synchronization for the Onta notes backend.
//!
//! - [`sync`]: [`ListSync`](sync::ListSync), the per-screen list container
//! - [`api`]: the REST client and its [`Remote`](sync::Remote) adapters
//! - [`screen`]: home, category and date screens that own the lists
//! - [`config`]: the optional TOML config file

pub mod api;
pub mod config;
pub mod error;
pub mod model;
pub mod screen;
pub mod sync;
pub mod util;
