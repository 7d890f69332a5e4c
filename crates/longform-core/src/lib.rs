// Forbid unsafe in production; deny in tests.
#![cfg_attr(not(test), forbid(unsafe_code))]
#![cfg_attr(test, deny(unsafe_code))]

//! Core: geometry, input events, motion profile, visual poses, and the
//! animation engine.
//!
//! # Role in Longform
//! `longform-core` is the platform-free layer. It knows nothing about
//! intro phases, slides, or chapters; it provides the vocabulary the
//! runtime speaks in.
//!
//! # Primary responsibilities
//! - **Event**: canonical input events (keys, pointer, wheel, scroll, resize, focus).
//! - **MotionProfile**: reduced-motion and touch capability resolution.
//! - **Pose**: the animatable visual state of one node.
//! - **Animation**: easing, tweens, timelines, followers, scroll scrubbing,
//!   and inertial throws, all driven by explicit `Duration` deltas.
//!
//! # How it fits in the system
//! The runtime (`longform-runtime`) consumes `longform-core::Event` values
//! and writes poses into an [`animation::Stage`]. The host backend
//! (`longform-web`) reads those poses back out and applies them to the page.

pub mod animation;
pub mod event;
pub mod geometry;
pub mod logging;
pub mod motion;
pub mod pose;

// Re-export tracing macros at crate root for ergonomic use.
#[cfg(feature = "tracing")]
pub use logging::{debug, error, info, trace, warn};
