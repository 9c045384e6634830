//! Request handlers.

pub mod health;
pub mod projects;
pub mod render;
pub mod slides;
pub mod voice;

pub use health::*;
pub use projects::*;
pub use render::*;
pub use slides::*;
pub use voice::*;
