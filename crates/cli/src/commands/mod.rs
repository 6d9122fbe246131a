pub mod aggregate;
pub mod config;
pub mod doctor;
pub mod fetch;
pub mod handles;
mod output;
pub mod serve;
