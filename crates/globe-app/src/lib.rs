//! Globe viewer application.
//!
//! Window, input, and the frame loop around the layered planet.

pub mod controls;
pub mod frame_clock;
pub mod panel;
pub mod platform;
pub mod window;
