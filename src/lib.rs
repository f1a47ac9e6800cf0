// #![allow(clippy::new_without_default)]
pub mod config;
#[cfg(feature = "render")]
pub mod font;
pub mod generator;
#[cfg(feature = "render")]
pub mod icon;
pub mod icon_data;
