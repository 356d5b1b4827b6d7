use std::fmt;

use serde::{Deserialize, Serialize};

/// The two cached resource partitions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Voices,
    Models,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 2] = [ResourceKind::Voices, ResourceKind::Models];

    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Voices => "voices",
            ResourceKind::Models => "models",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One discoverable resource, as presented to a node's input schema
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Descriptor {
    Voice { name: String, voice_id: String },
    Model { model_id: String },
}

impl Descriptor {
    pub fn voice(name: impl Into<String>, voice_id: impl Into<String>) -> Self {
        Descriptor::Voice {
            name: name.into(),
            voice_id: voice_id.into(),
        }
    }

    pub fn model(model_id: impl Into<String>) -> Self {
        Descriptor::Model {
            model_id: model_id.into(),
        }
    }

    /// Remote identifier used in API paths and payloads
    pub fn id(&self) -> &str {
        match self {
            Descriptor::Voice { voice_id, .. } => voice_id,
            Descriptor::Model { model_id } => model_id,
        }
    }

    pub fn kind(&self) -> ResourceKind {
        match self {
            Descriptor::Voice { .. } => ResourceKind::Voices,
            Descriptor::Model { .. } => ResourceKind::Models,
        }
    }

    /// Display label shown in a selection list: `"Name (voice_id)"` for voices.
    pub fn label(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Descriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Descriptor::Voice { name, voice_id } => write!(f, "{} ({})", name, voice_id),
            Descriptor::Model { model_id } => f.write_str(model_id),
        }
    }
}

/// Recover the voice id from a selection label produced by [`Descriptor::label`].
///
/// Labels without parentheses are taken to be a bare id.
pub fn voice_id_from_label(label: &str) -> &str {
    let tail = match label.rfind('(') {
        Some(idx) => &label[idx + 1..],
        None => label,
    };
    tail.trim().trim_end_matches(')').trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn voice_label_round_trips_id() {
        let d = Descriptor::voice("Rachel (US)", "21m00Tcm4TlvDq8ikWAM");
        assert_eq!(d.label(), "Rachel (US) (21m00Tcm4TlvDq8ikWAM)");
        assert_eq!(voice_id_from_label(&d.label()), "21m00Tcm4TlvDq8ikWAM");
    }

    #[test]
    fn bare_label_is_its_own_id() {
        assert_eq!(voice_id_from_label("abc123"), "abc123");
    }

    #[test]
    fn model_label_is_id() {
        let d = Descriptor::model("eleven_v3");
        assert_eq!(d.label(), "eleven_v3");
        assert_eq!(d.kind(), ResourceKind::Models);
    }
}
