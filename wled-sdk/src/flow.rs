//! Automation actions
//!
//! Each action selects one option of a device (an effect, palette or
//! preset) and comes with an autocomplete source for its argument.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use wled_state::{CapabilityOption, OptionKind};

use crate::{Device, SdkError};

/// A user-triggerable automation action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowAction {
    SetEffect,
    SetPalette,
    SetPreset,
}

/// One autocomplete suggestion for an action argument
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutocompleteItem {
    pub id: String,
    pub name: String,
}

impl From<CapabilityOption> for AutocompleteItem {
    fn from(option: CapabilityOption) -> Self {
        Self {
            id: option.id,
            name: option.display_name,
        }
    }
}

impl FlowAction {
    pub const ALL: [FlowAction; 3] = [
        FlowAction::SetEffect,
        FlowAction::SetPalette,
        FlowAction::SetPreset,
    ];

    /// Action identifier as registered with the host
    pub fn id(&self) -> &'static str {
        match self {
            FlowAction::SetEffect => "set_effect",
            FlowAction::SetPalette => "set_palette",
            FlowAction::SetPreset => "set_preset",
        }
    }

    /// Name of the autocompleted argument
    pub fn argument(&self) -> &'static str {
        match self {
            FlowAction::SetEffect => "effect",
            FlowAction::SetPalette => "palette",
            FlowAction::SetPreset => "preset",
        }
    }

    pub fn kind(&self) -> OptionKind {
        match self {
            FlowAction::SetEffect => OptionKind::Effect,
            FlowAction::SetPalette => OptionKind::Palette,
            FlowAction::SetPreset => OptionKind::Preset,
        }
    }

    /// Apply the selected option to `device`
    pub async fn run(&self, device: &Device, option_id: &str) -> Result<(), SdkError> {
        let engine = device.engine();
        let result = match self {
            FlowAction::SetEffect => engine.set_effect(option_id).await,
            FlowAction::SetPalette => engine.set_palette(option_id).await,
            FlowAction::SetPreset => engine.set_preset(option_id).await,
        };

        if let Err(e) = &result {
            tracing::error!(
                device = %device.id,
                action = self.id(),
                option_id,
                error = %e,
                "Flow action failed"
            );
        }
        result.map_err(SdkError::from)
    }

    /// Options of the action's kind whose name contains `query`
    pub async fn autocomplete(&self, device: &Device, query: &str) -> Vec<AutocompleteItem> {
        device
            .options(self.kind(), query)
            .await
            .into_iter()
            .map(AutocompleteItem::from)
            .collect()
    }
}

impl fmt::Display for FlowAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for FlowAction {
    type Err = SdkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FlowAction::ALL
            .into_iter()
            .find(|action| action.id() == s)
            .ok_or_else(|| SdkError::UnknownAction(s.to_string()))
    }
}
