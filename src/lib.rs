pub mod config;
pub mod error;
pub mod events;
pub mod fetch;
pub mod input;
pub mod resolver;
pub mod slideshow;
pub mod tasks {
    pub mod console;
    pub mod controller;
}
