pub mod app;
pub mod menu;
