use thiserror::Error;

#[derive(Error, Debug)]
pub enum SdkError {
    #[error("Device error: {0}")]
    Sync(#[from] wled_state::SyncError),

    #[error("Pairing error: {0}")]
    Discovery(#[from] wled_discovery::DiscoveryError),

    #[error("Transport error: {0}")]
    Transport(#[from] wled_client::TransportError),

    #[error("Device not found: {0}")]
    DeviceNotFound(String),

    #[error("Unknown flow action: {0}")]
    UnknownAction(String),
}

impl SdkError {
    /// True when a command argument was rejected before reaching the device
    pub fn is_validation(&self) -> bool {
        matches!(self, SdkError::Sync(e) if e.is_validation())
    }
}
