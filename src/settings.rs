use serde::{Deserialize, Serialize};

/// Editor defaults and presentation strings.
///
/// Every field has a default, so a settings file only needs the keys it
/// wants to override.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EditorSettings {
    /// Name of the root group of a fresh editor.
    pub root_group_name: String,
    /// Name given to groups created by "add group".
    pub new_group_name: String,
    /// Name used when a group is renamed to the empty string.
    pub untitled_group_name: String,
    /// Shown instead of the expression when nothing compiles.
    pub empty_expression_message: String,
}

impl Default for EditorSettings {
    fn default() -> Self {
        Self {
            root_group_name: "Root group".to_owned(),
            new_group_name: "New group".to_owned(),
            untitled_group_name: "Untitled".to_owned(),
            empty_expression_message: "No active rules to build an expression.".to_owned(),
        }
    }
}

impl EditorSettings {
    /// Parse settings from JSON; missing keys keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns the `serde_json` error for malformed input.
    pub fn from_json(input: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(input)
    }
}
