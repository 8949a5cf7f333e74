pub mod error;

pub mod client;
pub mod config;
pub mod credentials;
pub mod output;
pub mod parameter;
pub mod plugin;
pub mod role;
pub mod sign;
pub mod vela;
pub mod verify;

pub mod cmd;

#[cfg(test)]
pub(crate) mod dev;
