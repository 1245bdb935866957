#[path = "../crates/types/src/lib.rs"]
pub mod types;
#[path = "../crates/core/src/lib.rs"]
pub mod core;
#[path = "../crates/transports/reqwest/src/lib.rs"]
pub mod transport_reqwest;
#[path = "../crates/provider/src/lib.rs"]
pub mod provider;
#[path = "../crates/relay/src/lib.rs"]
pub mod relay;
#[path = "../crates/imagegen/src/lib.rs"]
pub mod imagegen;

pub mod transports {
    pub use crate::transport_reqwest as reqwest;
}

pub use crate::imagegen::{Backend, ImageGen, ImageGenConfig, ProviderSelection};

pub(crate) use crate::transport_reqwest as reqwest_transport;
pub(crate) use crate::types as aiimage_types;
