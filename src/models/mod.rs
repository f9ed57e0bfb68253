pub mod github;
pub mod portfolio;
pub mod webhook;

pub use github::*;
pub use portfolio::*;
pub use webhook::*;
