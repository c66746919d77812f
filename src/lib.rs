pub mod app;
pub mod assets;
pub mod audio;
pub mod config;
pub mod interaction;
pub mod render;
pub mod scene;
