use std::fmt;

use serde::{Deserialize, Serialize};

/// Identity of one accepted selection. Every pick or drop gets a fresh id, so a
/// request tagged with an older id can be recognized as stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SelectionId(pub u64);

impl fmt::Display for SelectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Class names produced by the potato leaf model. Anything else the service
/// sends back is kept verbatim in `Unknown`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DiseaseLabel {
    EarlyBlight,
    LateBlight,
    Healthy,
    Unknown(String),
}

impl DiseaseLabel {
    pub const KNOWN: [DiseaseLabel; 3] = [
        DiseaseLabel::EarlyBlight,
        DiseaseLabel::LateBlight,
        DiseaseLabel::Healthy,
    ];

    pub fn parse(raw: &str) -> Self {
        match raw {
            "Early Blight" => Self::EarlyBlight,
            "Late Blight" => Self::LateBlight,
            "Healthy" => Self::Healthy,
            other => Self::Unknown(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::EarlyBlight => "Early Blight",
            Self::LateBlight => "Late Blight",
            Self::Healthy => "Healthy",
            Self::Unknown(raw) => raw,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Unknown(_))
    }
}

impl From<String> for DiseaseLabel {
    fn from(value: String) -> Self {
        Self::parse(&value)
    }
}

impl From<DiseaseLabel> for String {
    fn from(value: DiseaseLabel) -> Self {
        match value {
            DiseaseLabel::Unknown(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for DiseaseLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_service_class_names() {
        assert_eq!(DiseaseLabel::parse("Early Blight"), DiseaseLabel::EarlyBlight);
        assert_eq!(DiseaseLabel::parse("Late Blight"), DiseaseLabel::LateBlight);
        assert_eq!(DiseaseLabel::parse("Healthy"), DiseaseLabel::Healthy);
    }

    #[test]
    fn keeps_unrecognized_names_verbatim() {
        let label = DiseaseLabel::parse("healthy");
        assert_eq!(label, DiseaseLabel::Unknown("healthy".into()));
        assert_eq!(label.as_str(), "healthy");
        assert!(!label.is_known());
        assert!(!DiseaseLabel::parse("").is_known());
    }

    #[test]
    fn known_labels_display_as_class_names() {
        let names: Vec<String> = DiseaseLabel::KNOWN.iter().map(ToString::to_string).collect();
        assert_eq!(names, ["Early Blight", "Late Blight", "Healthy"]);
    }
}
