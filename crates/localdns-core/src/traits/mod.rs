//! Core traits for the Local DNS console
//!
//! - [`Transport`]: Send one HTTP request to the vendor API

pub mod transport;

pub use transport::{HttpMethod, HttpRequest, HttpResponse, Transport, TransportError};
