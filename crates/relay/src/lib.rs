//! CloudPoodll relay: the hosted fallback used when no native provider
//! produces an image.

pub mod backend;
pub mod config;
pub mod params;
pub mod response;
pub mod token;

pub use backend::RelayBackend;
pub use config::RelayConfig;
pub use params::RemoteCallParams;
pub use response::{first_image, parse_relay_envelope};
pub use token::{CloudPoodllTokenSource, TokenSource};

#[cfg(test)]
#[path = "../tests/test_transport.rs"]
pub(crate) mod test_transport;

#[cfg(test)]
#[path = "../tests/params_tests.rs"]
mod params_tests;

#[cfg(test)]
#[path = "../tests/response_tests.rs"]
mod response_tests;

#[cfg(test)]
#[path = "../tests/backend_tests.rs"]
mod backend_tests;
