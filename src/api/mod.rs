//! REST client for the notes backend.
//!
//! [`ApiClient`] exposes one method per endpoint. [`HttpArticles`] and
//! [`HttpCategories`] plug it into [`ListSync`](crate::sync::ListSync).
//!
//! Wire quirks (ids as strings or numbers, `prioridad` as `"Sí"`/`"No"`,
//! missing arrays) are absorbed in the `wire` module; everything above it
//! sees [`Article`](crate::model::Article) and
//! [`Category`](crate::model::Category) only.

mod client;
mod remote;
mod wire;

pub use client::{ApiClient, ClientError};
pub use remote::{HttpArticles, HttpCategories};
