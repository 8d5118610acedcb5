//! Workspace-wide settings
//!
//! The company profile is optional context that every task can weave into
//! its prompt or system instruction when enabled.

use crate::state::keys::GLOBAL_SETTINGS;
use crate::state::{PersistenceError, StateStore};
use serde::{Deserialize, Serialize};

/// Settings shared by all tasks
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GlobalSettings {
    /// Include the company profile in generated content
    pub enable_global_info: bool,
    /// Company or brand profile
    pub company_info: String,
}

impl GlobalSettings {
    /// Company profile, when enabled and non-blank
    pub fn company_context(&self) -> Option<&str> {
        if !self.enable_global_info {
            return None;
        }
        let info = self.company_info.trim();
        (!info.is_empty()).then_some(info)
    }

    /// `system` with the company profile appended
    pub fn system_instruction(&self, system: &str) -> String {
        match self.company_context() {
            Some(info) => format!("{}\n\nCompany Context: {}", system, info),
            None => system.to_string(),
        }
    }

    /// Labelled prompt line, empty when disabled
    pub fn prompt_line(&self, label: &str) -> String {
        match self.company_context() {
            Some(info) => format!("\n[{}]: {}", label, info),
            None => String::new(),
        }
    }
}

/// Access to the persisted settings
#[derive(Debug, Clone)]
pub struct Settings {
    store: StateStore,
}

impl Settings {
    /// Bind to `store`
    pub fn new(store: StateStore) -> Self {
        Self { store }
    }

    /// Current settings
    pub async fn get(&self) -> GlobalSettings {
        self.store
            .load(&GLOBAL_SETTINGS, GlobalSettings::default())
            .await
    }

    /// Replace the settings
    pub async fn set(&self, settings: &GlobalSettings) -> Result<(), PersistenceError> {
        self.store.store(&GLOBAL_SETTINGS, settings).await
    }

    /// Back to defaults
    pub async fn reset(&self) -> Result<GlobalSettings, PersistenceError> {
        self.store
            .reset(&GLOBAL_SETTINGS, GlobalSettings::default())
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn enabled(info: &str) -> GlobalSettings {
        GlobalSettings {
            enable_global_info: true,
            company_info: info.to_string(),
        }
    }

    #[test]
    fn test_context_requires_flag_and_text() {
        assert_eq!(GlobalSettings::default().company_context(), None);
        assert_eq!(enabled("   ").company_context(), None);
        assert_eq!(enabled(" Acme ").company_context(), Some("Acme"));

        let disabled = GlobalSettings {
            enable_global_info: false,
            company_info: "Acme".to_string(),
        };
        assert_eq!(disabled.company_context(), None);
    }

    #[test]
    fn test_system_instruction_appends_context() {
        assert_eq!(
            enabled("Acme Bearings").system_instruction("Be brief."),
            "Be brief.\n\nCompany Context: Acme Bearings"
        );
        assert_eq!(
            GlobalSettings::default().system_instruction("Be brief."),
            "Be brief."
        );
    }

    #[test]
    fn test_prompt_line() {
        assert_eq!(
            enabled("Acme").prompt_line("Company Profile"),
            "\n[Company Profile]: Acme"
        );
        assert_eq!(GlobalSettings::default().prompt_line("Company Profile"), "");
    }

    #[test]
    fn test_deserializes_partial_record() {
        let settings: GlobalSettings =
            serde_json::from_str(r#"{"enableGlobalInfo": true}"#).unwrap();
        assert!(settings.enable_global_info);
        assert!(settings.company_info.is_empty());
    }

    #[tokio::test]
    async fn test_get_set_reset() {
        let settings = Settings::new(StateStore::in_memory());
        assert_eq!(settings.get().await, GlobalSettings::default());

        settings.set(&enabled("Acme")).await.unwrap();
        assert_eq!(settings.get().await.company_info, "Acme");

        settings.reset().await.unwrap();
        assert_eq!(settings.get().await, GlobalSettings::default());
    }
}
