//! Typed state keys
//!
//! Every persisted slot is declared here exactly once. A `StateKey<T>` ties
//! the storage name to the value type, so two tasks cannot share a slot by
//! accident and a slot cannot be read back as the wrong type.
//!
//! Names are kept from earlier releases so existing records stay readable.

use crate::tasks::copywriting::{MarketingInputs, OutreachEmail, OutreachInputs};
use crate::tasks::image_studio::{ImageStudioInputs, ImageStudioResults};
use crate::tasks::lead_gen::{LeadGenInputs, LeadGenResults};
use crate::tasks::product_fission::{FissionInputs, FissionResults};
use crate::tasks::product_listing::{ListingInputs, ListingResults};
use crate::tasks::settings::GlobalSettings;
use crate::tasks::video_script::{ScriptData, VideoScriptInputs};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::marker::PhantomData;

/// Name of a persisted slot holding a `T`
pub struct StateKey<T> {
    name: &'static str,
    _type: PhantomData<fn() -> T>,
}

impl<T> StateKey<T> {
    /// Declare a key
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            _type: PhantomData,
        }
    }

    /// Storage name
    pub const fn name(&self) -> &'static str {
        self.name
    }
}

impl<T> Clone for StateKey<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for StateKey<T> {}

impl<T> fmt::Debug for StateKey<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("StateKey").field(&self.name).finish()
    }
}

impl<T> fmt::Display for StateKey<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Workspace-wide settings
pub const GLOBAL_SETTINGS: StateKey<GlobalSettings> = StateKey::new("global_settings");

/// Marketing copy form
pub const MARKETING_INPUTS: StateKey<MarketingInputs> = StateKey::new("marketing_v2_inputs");
/// Marketing copy output
pub const MARKETING_RESULT: StateKey<String> = StateKey::new("marketing_v2_result");

/// Cold outreach form
pub const OUTREACH_INPUTS: StateKey<OutreachInputs> = StateKey::new("outreach_inputs_v2");
/// Cold outreach email
pub const OUTREACH_RESULT: StateKey<OutreachEmail> = StateKey::new("outreach_result_v2");

/// Lead generation form
pub const LEADGEN_INPUTS: StateKey<LeadGenInputs> = StateKey::new("leadgen_inputs");
/// Lead generation report and sources
pub const LEADGEN_RESULTS: StateKey<LeadGenResults> = StateKey::new("leadgen_results");

/// Product fission form
pub const FISSION_INPUTS: StateKey<FissionInputs> = StateKey::new("fission_inputs");
/// Product fission listing
pub const FISSION_RESULTS: StateKey<FissionResults> = StateKey::new("fission_results");

/// Product listing form
pub const LISTING_INPUTS: StateKey<ListingInputs> = StateKey::new("prod_gen_inputs");
/// Product listing output
pub const LISTING_RESULTS: StateKey<ListingResults> = StateKey::new("prod_gen_results");

/// Image studio form
pub const IMAGE_INPUTS: StateKey<ImageStudioInputs> = StateKey::new("img_asst_inputs");
/// Image studio output
pub const IMAGE_RESULTS: StateKey<ImageStudioResults> = StateKey::new("img_asst_results");

/// Video script form
pub const VIDEO_SCRIPT_INPUTS: StateKey<VideoScriptInputs> =
    StateKey::new("video_script_v3_inputs");
/// Generated video script, absent until the first run
pub const VIDEO_SCRIPT_DATA: StateKey<Option<ScriptData>> = StateKey::new("video_script_v3_data");

/// Type-erased view of a registered key
#[derive(Clone, Copy)]
pub struct KeyEntry {
    name: &'static str,
    default: fn() -> Value,
    validate: fn(&Value) -> Result<(), String>,
}

impl KeyEntry {
    /// Storage name
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Untyped key for raw JSON access
    pub fn raw_key(&self) -> StateKey<Value> {
        StateKey::new(self.name)
    }

    /// Default value as JSON
    pub fn default_value(&self) -> Value {
        (self.default)()
    }

    /// Check that `value` deserializes as the key's type
    pub fn validate(&self, value: &Value) -> Result<(), String> {
        (self.validate)(value)
    }
}

impl fmt::Debug for KeyEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("KeyEntry").field(&self.name).finish()
    }
}

fn default_json<T: Default + Serialize>() -> Value {
    serde_json::to_value(T::default()).unwrap_or(Value::Null)
}

fn validate_json<T: DeserializeOwned>(value: &Value) -> Result<(), String> {
    T::deserialize(value).map(|_| ()).map_err(|e| e.to_string())
}

const fn entry<T: Default + Serialize + DeserializeOwned>(key: &StateKey<T>) -> KeyEntry {
    KeyEntry {
        name: key.name,
        default: default_json::<T>,
        validate: validate_json::<T>,
    }
}

/// Every registered key
pub const ALL: &[KeyEntry] = &[
    entry(&GLOBAL_SETTINGS),
    entry(&MARKETING_INPUTS),
    entry(&MARKETING_RESULT),
    entry(&OUTREACH_INPUTS),
    entry(&OUTREACH_RESULT),
    entry(&LEADGEN_INPUTS),
    entry(&LEADGEN_RESULTS),
    entry(&FISSION_INPUTS),
    entry(&FISSION_RESULTS),
    entry(&LISTING_INPUTS),
    entry(&LISTING_RESULTS),
    entry(&IMAGE_INPUTS),
    entry(&IMAGE_RESULTS),
    entry(&VIDEO_SCRIPT_INPUTS),
    entry(&VIDEO_SCRIPT_DATA),
];

/// Find a registered key by its storage name
pub fn lookup(name: &str) -> Option<&'static KeyEntry> {
    ALL.iter().find(|entry| entry.name == name)
}

/// Name/default pair as listed by the HTTP surface
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyInfo {
    /// Storage name
    pub name: String,
    /// Default value
    pub default: Value,
}

/// Describe every registered key
pub fn describe() -> Vec<KeyInfo> {
    ALL.iter()
        .map(|entry| KeyInfo {
            name: entry.name.to_string(),
            default: entry.default_value(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_names_are_unique() {
        let names: HashSet<_> = ALL.iter().map(|e| e.name()).collect();
        assert_eq!(names.len(), ALL.len());
    }

    #[test]
    fn test_lookup() {
        let entry = lookup("leadgen_results").unwrap();
        assert_eq!(entry.name(), LEADGEN_RESULTS.name());
        assert!(lookup("unknown_key").is_none());
    }

    #[test]
    fn test_defaults_validate() {
        for entry in ALL {
            assert!(
                entry.validate(&entry.default_value()).is_ok(),
                "default of {} does not validate",
                entry.name()
            );
        }
    }

    #[test]
    fn test_validate_rejects_wrong_shape() {
        let entry = lookup("leadgen_results").unwrap();
        assert!(entry.validate(&serde_json::json!("just a string")).is_err());
        assert_eq!(VIDEO_SCRIPT_DATA.to_string(), "video_script_v3_data");
        assert!(lookup("video_script_v3_data")
            .unwrap()
            .default_value()
            .is_null());
    }
}
