use crate::error::{TutelaError, TutelaResult};
use serde::{Deserialize, Serialize};

/// Enumerated reason for processing personal data (LGPD Art. 7).
///
/// Closed set: an unrecognized purpose is a validation error at the parsing
/// boundary, never a silent default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PurposeCategory {
    /// Core data processing required to deliver the service.
    DataProcessing,
    /// Usage analytics and aggregated statistics.
    Analytics,
    /// Direct marketing communications.
    Marketing,
    /// Sharing personal data with third parties.
    ThirdPartySharing,
}

impl PurposeCategory {
    /// The legal basis under which processing for this purpose rests.
    pub fn legal_basis(self) -> LegalBasis {
        match self {
            PurposeCategory::DataProcessing => LegalBasis::Consent,
            PurposeCategory::Analytics => LegalBasis::LegitimateInterest,
            PurposeCategory::Marketing => LegalBasis::Consent,
            PurposeCategory::ThirdPartySharing => LegalBasis::Consent,
        }
    }

    /// The data category that must be minimized when consent for this
    /// purpose is denied or withdrawn.
    pub fn minimized_category(self) -> DataCategory {
        match self {
            PurposeCategory::DataProcessing => DataCategory::PersonalPreferences,
            PurposeCategory::Analytics => DataCategory::UsageAnalytics,
            PurposeCategory::Marketing => DataCategory::MarketingProfile,
            PurposeCategory::ThirdPartySharing => DataCategory::ThirdPartyShares,
        }
    }
}

impl std::fmt::Display for PurposeCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PurposeCategory::DataProcessing => write!(f, "data_processing"),
            PurposeCategory::Analytics => write!(f, "analytics"),
            PurposeCategory::Marketing => write!(f, "marketing"),
            PurposeCategory::ThirdPartySharing => write!(f, "third_party_sharing"),
        }
    }
}

/// Legal basis recorded on a consent record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LegalBasis {
    /// Explicit consent from the data subject.
    Consent,
    /// Legitimate interest of the controller.
    LegitimateInterest,
}

/// A category of personal data held for a subject.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataCategory {
    /// Interface and accessibility preferences.
    PersonalPreferences,
    /// Course progress and activity history.
    LearningHistory,
    /// Behavioral analytics derived from usage.
    UsageAnalytics,
    /// Marketing segmentation profile.
    MarketingProfile,
    /// Records shared with third-party providers.
    ThirdPartyShares,
    /// Enrollment records held under legal obligation.
    EnrollmentRecords,
    /// Assessment and certification results held in the public interest.
    AssessmentResults,
}

impl DataCategory {
    /// All known categories, in a fixed order.
    pub const ALL: [DataCategory; 7] = [
        DataCategory::PersonalPreferences,
        DataCategory::LearningHistory,
        DataCategory::UsageAnalytics,
        DataCategory::MarketingProfile,
        DataCategory::ThirdPartyShares,
        DataCategory::EnrollmentRecords,
        DataCategory::AssessmentResults,
    ];

    /// Returns the retention ground that blocks erasure of this category,
    /// or `None` if the category is freely deletable.
    pub fn retention_ground(self) -> Option<RetentionGround> {
        match self {
            DataCategory::EnrollmentRecords => Some(RetentionGround::LegalObligation),
            DataCategory::AssessmentResults => Some(RetentionGround::PublicInterest),
            DataCategory::PersonalPreferences
            | DataCategory::LearningHistory
            | DataCategory::UsageAnalytics
            | DataCategory::MarketingProfile
            | DataCategory::ThirdPartyShares => None,
        }
    }
}

impl std::fmt::Display for DataCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            DataCategory::PersonalPreferences => "personal_preferences",
            DataCategory::LearningHistory => "learning_history",
            DataCategory::UsageAnalytics => "usage_analytics",
            DataCategory::MarketingProfile => "marketing_profile",
            DataCategory::ThirdPartyShares => "third_party_shares",
            DataCategory::EnrollmentRecords => "enrollment_records",
            DataCategory::AssessmentResults => "assessment_results",
        };
        write!(f, "{name}")
    }
}

/// Legal ground under which a data category is retained despite an erasure
/// request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetentionGround {
    /// Retention mandated by law (e.g. enrollment records for audit).
    LegalObligation,
    /// Retention in the public interest (e.g. issued certifications).
    PublicInterest,
}

impl std::fmt::Display for RetentionGround {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RetentionGround::LegalObligation => write!(f, "legal_obligation"),
            RetentionGround::PublicInterest => write!(f, "public_interest"),
        }
    }
}

/// Type of a government institution, as reported by the Sintegra registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstitutionType {
    /// Federal administration body.
    Federal,
    /// State administration body.
    State,
    /// Municipal administration body.
    Municipal,
    /// Autonomous government agency.
    Autarchy,
    /// Public foundation.
    Foundation,
}

impl InstitutionType {
    /// Parses the registry's institution-type code. Unknown codes are a
    /// validation error, never defaulted.
    pub fn from_registry_code(code: &str) -> TutelaResult<Self> {
        match code.to_lowercase().as_str() {
            "federal" => Ok(InstitutionType::Federal),
            "estadual" => Ok(InstitutionType::State),
            "municipal" => Ok(InstitutionType::Municipal),
            "autarquia" => Ok(InstitutionType::Autarchy),
            "fundacao" => Ok(InstitutionType::Foundation),
            other => Err(TutelaError::Validation(format!(
                "unknown institution type code '{other}'"
            ))),
        }
    }

    /// The sector oversight authority notified in addition to the national
    /// data-protection authority, if any.
    pub fn sector_authority(self) -> Option<&'static str> {
        match self {
            InstitutionType::Federal | InstitutionType::Autarchy => Some("CGU"),
            InstitutionType::State => Some("TCE"),
            InstitutionType::Municipal => Some("TCM"),
            InstitutionType::Foundation => None,
        }
    }
}

/// Severity of a detected data breach, ordered by urgency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BreachSeverity {
    /// No breach, or signals below the reporting threshold.
    Low,
    /// Signals warrant monitoring and log review.
    Medium,
    /// Authority notification must be prepared.
    High,
    /// Immediate containment and notification required.
    Critical,
}

impl std::fmt::Display for BreachSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BreachSeverity::Low => write!(f, "low"),
            BreachSeverity::Medium => write!(f, "medium"),
            BreachSeverity::High => write!(f, "high"),
            BreachSeverity::Critical => write!(f, "critical"),
        }
    }
}

/// Static description of the privacy controls the core enforces.
///
/// Read by the compliance reporter and exposable to callers that need to
/// display the platform's data-protection posture.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrivacyControls {
    /// Whether data minimization is enforced on consent denial.
    pub data_minimization: bool,
    /// Retention period for government records, in days.
    pub retention_period_days: u32,
    /// Retention grounds that exempt a category from erasure.
    pub erasure_exceptions: Vec<RetentionGround>,
    /// Hours within which the national authority must be notified of a breach.
    pub breach_notification_hours: u32,
    /// Authorities always notified of a breach.
    pub authorities: Vec<String>,
    /// Whether affected subjects must be notified of high/critical breaches.
    pub user_notification_required: bool,
}

impl Default for PrivacyControls {
    fn default() -> Self {
        Self {
            data_minimization: true,
            // 5 years for government records
            retention_period_days: 5 * 365,
            erasure_exceptions: vec![
                RetentionGround::LegalObligation,
                RetentionGround::PublicInterest,
            ],
            breach_notification_hours: 72,
            authorities: vec!["ANPD".to_string()],
            user_notification_required: true,
        }
    }
}
