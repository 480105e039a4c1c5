use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{info, warn};

use crate::error::{AudioError, AudioResult};

/// Platform audio session categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SessionCategory {
    PlayAndRecord,
    Ambient,
    Playback,
    MultiRoute,
    Record,
    SoloAmbient,
}

impl SessionCategory {
    /// Parse a platform category name. Unrecognized names map to `None`.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "playAndRecord" => Some(SessionCategory::PlayAndRecord),
            "ambient" => Some(SessionCategory::Ambient),
            "playback" => Some(SessionCategory::Playback),
            "multiRoute" => Some(SessionCategory::MultiRoute),
            "record" => Some(SessionCategory::Record),
            "soloAmbient" => Some(SessionCategory::SoloAmbient),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            SessionCategory::PlayAndRecord => "playAndRecord",
            SessionCategory::Ambient => "ambient",
            SessionCategory::Playback => "playback",
            SessionCategory::MultiRoute => "multiRoute",
            SessionCategory::Record => "record",
            SessionCategory::SoloAmbient => "soloAmbient",
        }
    }

    pub fn can_play(self) -> bool {
        matches!(
            self,
            SessionCategory::Playback | SessionCategory::PlayAndRecord | SessionCategory::MultiRoute
        )
    }

    pub fn can_record(self) -> bool {
        matches!(
            self,
            SessionCategory::PlayAndRecord | SessionCategory::Record | SessionCategory::MultiRoute
        )
    }
}

impl fmt::Display for SessionCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Options applied together with a category switch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryOptions {
    pub default_to_speaker: bool,
    pub allow_bluetooth: bool,
    pub mix_with_others: bool,
}

impl CategoryOptions {
    /// Options used when switching to a record-capable category.
    pub fn for_recording() -> Self {
        Self {
            default_to_speaker: true,
            allow_bluetooth: true,
            mix_with_others: false,
        }
    }
}

/// Platform audio session.
pub trait AudioSessionControl: Send + Sync {
    /// Raw name of the active category, if the platform reports one
    fn current_category_name(&self) -> Option<String>;

    fn set_category(&self, category: SessionCategory, options: CategoryOptions) -> Result<()>;

    fn set_active(&self, active: bool) -> Result<()>;
}

/// Current category, parsed.
pub fn current_category(session: &dyn AudioSessionControl) -> Option<SessionCategory> {
    session
        .current_category_name()
        .as_deref()
        .and_then(SessionCategory::from_name)
}

/// Make sure the session is in a category accepted by `accepts`, switching to
/// `target` if it is not, and activate it.
///
/// Returns the category that was replaced, so the caller can restore it later.
/// `None` means no switch took place or the previous category was unknown.
pub(crate) fn ensure_category(
    session: &dyn AudioSessionControl,
    accepts: fn(SessionCategory) -> bool,
    target: SessionCategory,
    options: CategoryOptions,
) -> AudioResult<Option<SessionCategory>> {
    let current = current_category(session);

    let replaced = match current {
        Some(category) if accepts(category) => None,
        _ => {
            info!(
                "Switching audio session category {} -> {}",
                current.map(SessionCategory::name).unwrap_or("unknown"),
                target
            );
            session
                .set_category(target, options)
                .map_err(AudioError::session)?;
            current
        }
    };

    session.set_active(true).map_err(AudioError::session)?;

    Ok(replaced)
}

/// Best-effort return to `previous`; failures are logged only.
pub(crate) fn restore_category(session: &dyn AudioSessionControl, previous: SessionCategory) {
    info!("Restoring audio session category {}", previous);
    if let Err(e) = session.set_category(previous, CategoryOptions::default()) {
        warn!("Failed to restore audio session category: {:#}", e);
    }
}
