//! Render pipeline construction for recorded draw calls.
//!
//! - `basic` builds a colour-only pipeline from a program's shader modules and
//!   the vertex layout of a draw's enabled attributes

pub mod basic;
