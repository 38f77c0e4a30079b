//! Pure, deterministic logic: tag matching, document preprocessing,
//! template expansion, and task selection. No I/O.

pub mod preprocess;
pub mod select;
pub mod tags;
pub mod template;
pub mod types;
