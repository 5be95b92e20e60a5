//! Core types and trait definitions for the Larder inventory service.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! Storage backends implement [`store::InventoryStore`]; the external APIs the
//! service talks to (text generation, web search, mail delivery) are reached
//! through the traits in [`service`].

// Native `async fn` in traits; the futures are declared `Send` explicitly.
#![allow(async_fn_in_trait)]

pub mod error;
pub mod item;
pub mod product;
pub mod service;
pub mod store;

pub use error::{Error, Result};
