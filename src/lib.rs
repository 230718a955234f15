pub mod banner;
pub mod bridge;
pub mod commands;
pub mod config;
pub mod consts;
pub mod events;
pub mod logging;
pub mod platform;
pub mod recognition;
pub mod review;
pub mod spinner;
pub mod tasks;
