pub mod config;
pub mod error;
pub mod security;
pub mod identity;
pub mod notices;
pub mod nav;
pub mod routes;
pub mod navigator;
pub mod shell;
pub mod studio;
pub mod server;
