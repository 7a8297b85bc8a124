pub mod client;
pub mod config;
pub mod error;
pub mod poller;
pub mod transport;

pub use client::{CommandPlayer, ExternalPosition, PlayerQuery};
pub use config::{CONFIG_TEMPLATE as EXTERNAL_PLAYER_CONFIG_TEMPLATE, ExternalPlayerConfig};
pub use error::ExternalPlayerError;
pub use poller::ExternalPlayerPoller;
pub use transport::ExternalTransport;
