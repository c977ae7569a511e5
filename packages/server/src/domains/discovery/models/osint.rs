use serde::{Deserialize, Serialize};

/// Career page reported by the OSINT service for a domain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CareerPage {
    pub url: String,
    #[serde(default)]
    pub confidence: f64,
}

/// ATS platform detection result. The default value means "nothing detected".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlatformDetection {
    pub is_ats: bool,
    pub platform: Option<String>,
    pub confidence: f64,
}

impl PlatformDetection {
    pub fn detected(platform: &str, confidence: f64) -> Self {
        Self {
            is_ats: true,
            platform: Some(platform.to_string()),
            confidence,
        }
    }

    /// Platform name when detection was positive and named one.
    pub fn platform_name(&self) -> Option<&str> {
        if !self.is_ats {
            return None;
        }
        self.platform.as_deref().filter(|p| !p.is_empty())
    }
}
