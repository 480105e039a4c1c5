//! In-memory collaborators for hosts without a platform audio session.

use anyhow::Result;
use std::sync::{Mutex, PoisonError};
use tracing::{debug, info};

use super::category::{AudioSessionControl, CategoryOptions, SessionCategory};
use super::permission::{PermissionProvider, PermissionState};
use super::route::{PortDescription, RouteControl};

#[derive(Debug)]
struct HeadlessState {
    category: Option<String>,
    active: bool,
}

/// Session and route state kept in memory.
#[derive(Debug)]
pub struct HeadlessAudioSession {
    state: Mutex<HeadlessState>,
    input: Option<PortDescription>,
    output: Option<PortDescription>,
}

impl HeadlessAudioSession {
    pub fn new(category: Option<SessionCategory>) -> Self {
        Self {
            state: Mutex::new(HeadlessState {
                category: category.map(|c| c.name().to_string()),
                active: false,
            }),
            input: Some(PortDescription::new("Built-In Microphone", "MicrophoneBuiltIn")),
            output: Some(PortDescription::new("Speaker", "Speaker")),
        }
    }

    pub fn is_active(&self) -> bool {
        self.state.lock().unwrap_or_else(PoisonError::into_inner).active
    }
}

impl Default for HeadlessAudioSession {
    fn default() -> Self {
        Self::new(Some(SessionCategory::SoloAmbient))
    }
}

impl AudioSessionControl for HeadlessAudioSession {
    fn current_category_name(&self) -> Option<String> {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .category
            .clone()
    }

    fn set_category(&self, category: SessionCategory, options: CategoryOptions) -> Result<()> {
        debug!("Headless session category -> {} ({:?})", category, options);
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.category = Some(category.name().to_string());
        Ok(())
    }

    fn set_active(&self, active: bool) -> Result<()> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.active = active;
        Ok(())
    }
}

impl RouteControl for HeadlessAudioSession {
    fn current_input(&self) -> Option<PortDescription> {
        self.input.clone()
    }

    fn current_output(&self) -> Option<PortDescription> {
        self.output.clone()
    }

    fn present_route_picker(&self) {
        info!("No route picker available on a headless session");
    }
}

/// Permission collaborator with a fixed answer.
#[derive(Debug)]
pub struct HeadlessPermissions {
    state: Mutex<PermissionState>,
    grant_on_request: bool,
}

impl HeadlessPermissions {
    pub fn new(state: PermissionState, grant_on_request: bool) -> Self {
        Self {
            state: Mutex::new(state),
            grant_on_request,
        }
    }

    pub fn granted() -> Self {
        Self::new(PermissionState::Granted, true)
    }
}

#[async_trait::async_trait]
impl PermissionProvider for HeadlessPermissions {
    async fn request(&self) -> bool {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if *state == PermissionState::Undetermined {
            *state = if self.grant_on_request {
                PermissionState::Granted
            } else {
                PermissionState::Denied
            };
        }
        state.is_granted()
    }

    fn current_state(&self) -> PermissionState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
