//! Small self-contained helpers shared by the server modules.

pub mod date;
pub mod mime;
