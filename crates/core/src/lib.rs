//! Domain model and rules of the CourseHub platform.
//!
//! Everything in here is free of I/O: the server crate loads rows, turns
//! them into these types and persists whatever the rules decide.

pub mod domain;
