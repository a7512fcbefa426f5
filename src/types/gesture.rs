//! Gesture identifiers and their category classification

use serde::{Deserialize, Serialize};
use std::fmt;

/// Category of a gesture, inferred once from the identifier prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub enum GestureCategory {
    /// Egocentric gestures (`EGO` prefix)
    Ego,
    /// Miscellaneous gestures (`ETC` prefix)
    Etc,
    /// Number gestures (`NUM` prefix)
    Num,
    /// Anything without a known prefix
    Other,
}

impl GestureCategory {
    /// Classify an identifier by its prefix.
    pub fn classify(id: &str) -> Self {
        if id.starts_with("EGO") {
            GestureCategory::Ego
        } else if id.starts_with("ETC") {
            GestureCategory::Etc
        } else if id.starts_with("NUM") {
            GestureCategory::Num
        } else {
            GestureCategory::Other
        }
    }

    /// Leading digit of the numeric wire form.
    pub fn digit(self) -> char {
        match self {
            GestureCategory::Ego => '0',
            GestureCategory::Etc => '1',
            GestureCategory::Num => '2',
            GestureCategory::Other => '3',
        }
    }
}

/// Opaque gesture token, usually the stem of a preview clip file name
/// (e.g. `EGO_12_wave`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
#[serde(transparent)]
pub struct GestureId(String);

impl GestureId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn category(&self) -> GestureCategory {
        GestureCategory::classify(&self.0)
    }

    /// Numeric form sent to the capture server: the category digit followed
    /// by the second `_`-separated segment of the identifier.
    pub fn numeric(&self) -> NumericGestureId {
        let mut numeric = String::with_capacity(8);
        numeric.push(self.category().digit());
        if let Some(suffix) = self.0.split('_').nth(1) {
            numeric.push_str(suffix);
        }
        NumericGestureId(numeric)
    }

    /// Label shown next to the gesture description, `"<numeric>(<id>)"`.
    pub fn display_label(&self) -> String {
        format!("{}({})", self.numeric(), self.0)
    }
}

impl fmt::Display for GestureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for GestureId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for GestureId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Wire encoding of a [`GestureId`] used by `StartRecording`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NumericGestureId(String);

impl NumericGestureId {
    /// Wrap a numeric id read back from the wire.
    pub(crate) fn from_wire(text: &str) -> Self {
        Self(text.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NumericGestureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_known_prefixes() {
        assert_eq!(GestureId::from("EGO_01_wave").category(), GestureCategory::Ego);
        assert_eq!(GestureId::from("ETC_14").category(), GestureCategory::Etc);
        assert_eq!(GestureId::from("NUM_3_three").category(), GestureCategory::Num);
        assert_eq!(GestureId::from("SIGN_2").category(), GestureCategory::Other);
        assert_eq!(GestureId::from("ego_01").category(), GestureCategory::Other);
    }

    #[test]
    fn numeric_form_uses_category_digit_and_second_segment() {
        assert_eq!(GestureId::from("EGO_12_wave").numeric().as_str(), "012");
        assert_eq!(GestureId::from("ETC_05").numeric().as_str(), "105");
        assert_eq!(GestureId::from("NUM_7").numeric().as_str(), "27");
        assert_eq!(GestureId::from("XYZ_40_b").numeric().as_str(), "340");
    }

    #[test]
    fn numeric_form_without_suffix_is_just_the_digit() {
        assert_eq!(GestureId::from("EGO").numeric().as_str(), "0");
    }

    #[test]
    fn display_label_combines_numeric_and_id() {
        assert_eq!(GestureId::from("NUM_3_three").display_label(), "23(NUM_3_three)");
    }

    #[test]
    fn serializes_as_plain_string() {
        let yaml = serde_yaml_ng::to_string(&GestureId::from("ETC_02")).unwrap();
        assert_eq!(yaml.trim(), "ETC_02");
    }
}
