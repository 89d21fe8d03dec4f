pub mod common;
pub mod debug;
pub mod feed;
pub mod spinner;
pub mod status_bar;
