// tvctl-api: Async wire layer for webOS televisions (SSAP, pointer input, wake)

pub mod endpoint;
pub mod error;
pub mod hardware;
pub mod manifest;
pub mod message;
pub mod protocol;
pub mod transport;
pub mod wake;

pub use endpoint::Endpoint;
pub use error::Error;
pub use hardware::HardwareAddress;
pub use protocol::RegistrationEvent;
pub use transport::{
    DeviceLink, DeviceTransport, InputLink, TlsMode, TransportConfig, WebSocketTransport,
};
