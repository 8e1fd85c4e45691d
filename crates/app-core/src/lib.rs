//! Shared building blocks for the web application: configuration, error
//! responses, request logging and the OAuth 2.0 transport.

pub mod config;
pub mod error;
pub mod middleware;
pub mod oauth;
