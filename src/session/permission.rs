use serde::{Deserialize, Serialize};

/// Microphone permission as reported by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PermissionState {
    Undetermined,
    Denied,
    Granted,
}

impl PermissionState {
    pub fn is_granted(self) -> bool {
        self == PermissionState::Granted
    }
}

/// Platform permission prompt.
#[async_trait::async_trait]
pub trait PermissionProvider: Send + Sync {
    /// Prompt if needed; resolves to whether recording is allowed
    async fn request(&self) -> bool;

    fn current_state(&self) -> PermissionState;
}
