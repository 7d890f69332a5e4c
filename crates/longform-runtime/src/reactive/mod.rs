#![forbid(unsafe_code)]

//! Reactive values shared across components.

pub mod observable;

pub use observable::{Observable, Subscription};
