pub(crate) mod bootstrap;
mod config;
mod locations;
pub(crate) mod loop_runner;
