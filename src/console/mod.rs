//! Foreground settings console

mod controller;

pub use controller::SettingsController;
