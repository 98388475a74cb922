//! Label to presentation mapping for the result card.

use shared::domain::DiseaseLabel;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Icon {
    CheckCircle,
    AlertTriangle,
    Leaf,
}

impl Icon {
    pub fn name(self) -> &'static str {
        match self {
            Icon::CheckCircle => "check-circle",
            Icon::AlertTriangle => "alert-triangle",
            Icon::Leaf => "leaf",
        }
    }
}

/// Color tokens and icon for one label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StyleProfile {
    pub background: &'static str,
    pub border: &'static str,
    pub text: &'static str,
    pub bar: &'static str,
    pub icon: Icon,
    pub icon_color: &'static str,
}

const HEALTHY: StyleProfile = StyleProfile {
    background: "bg-green-50",
    border: "border-green-200",
    text: "text-green-800",
    bar: "bg-green-500",
    icon: Icon::CheckCircle,
    icon_color: "text-green-600",
};

const EARLY_BLIGHT: StyleProfile = StyleProfile {
    background: "bg-yellow-50",
    border: "border-yellow-200",
    text: "text-yellow-800",
    bar: "bg-yellow-500",
    icon: Icon::AlertTriangle,
    icon_color: "text-yellow-600",
};

const LATE_BLIGHT: StyleProfile = StyleProfile {
    background: "bg-red-50",
    border: "border-red-200",
    text: "text-red-800",
    bar: "bg-red-500",
    icon: Icon::AlertTriangle,
    icon_color: "text-red-600",
};

const NEUTRAL: StyleProfile = StyleProfile {
    background: "bg-gray-50",
    border: "border-gray-200",
    text: "text-gray-800",
    bar: "bg-gray-500",
    icon: Icon::Leaf,
    icon_color: "text-gray-600",
};

pub fn style_for(label: &DiseaseLabel) -> StyleProfile {
    match label {
        DiseaseLabel::Healthy => HEALTHY,
        DiseaseLabel::EarlyBlight => EARLY_BLIGHT,
        DiseaseLabel::LateBlight => LATE_BLIGHT,
        DiseaseLabel::Unknown(_) => NEUTRAL,
    }
}

/// `0.97` -> `"97.00%"`.
pub fn format_confidence(confidence: f64) -> String {
    format!("{:.2}%", confidence * 100.0)
}

/// Width of the confidence bar, one decimal: `0.97` -> `"97.0%"`.
pub fn bar_width(confidence: f64) -> String {
    format!("{:.1}%", confidence * 100.0)
}
