pub mod app;
pub mod cli;
pub mod config;
pub mod logging;
pub mod output;
pub mod pipeline;
pub mod record;
pub mod render;
pub mod runner;
pub mod source;
pub mod transform;
pub mod utils;

#[cfg(test)]
mod tests;
