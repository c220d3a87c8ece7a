pub mod app;
pub mod config;
pub mod engine;
pub mod navigation;
pub mod observer;
pub mod page;
pub mod schedule;
pub mod settings;
pub mod store;
mod utils;

#[cfg(test)]
mod testing;

pub use engine::{Engine, EngineHandle, EngineMsg};
pub use page::Page;
