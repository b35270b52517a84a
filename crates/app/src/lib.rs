pub mod pipeline;
pub mod settings;
pub mod snippet;
