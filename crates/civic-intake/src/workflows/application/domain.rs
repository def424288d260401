use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier wrapper for submitted applications.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApplicationId(pub String);

impl fmt::Display for ApplicationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Ordered pages of the public application wizard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WizardStep {
    PersonalInformation,
    IdentityInformation,
    ExpressionOfInterest,
    Consent,
}

impl WizardStep {
    pub const ALL: [WizardStep; 4] = [
        WizardStep::PersonalInformation,
        WizardStep::IdentityInformation,
        WizardStep::ExpressionOfInterest,
        WizardStep::Consent,
    ];

    pub const fn slug(self) -> &'static str {
        match self {
            WizardStep::PersonalInformation => "personal-information",
            WizardStep::IdentityInformation => "identity-information",
            WizardStep::ExpressionOfInterest => "expression-of-interest",
            WizardStep::Consent => "consent",
        }
    }

    pub fn from_slug(raw: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|step| step.slug() == raw)
    }

    pub const fn index(self) -> usize {
        match self {
            WizardStep::PersonalInformation => 0,
            WizardStep::IdentityInformation => 1,
            WizardStep::ExpressionOfInterest => 2,
            WizardStep::Consent => 3,
        }
    }

    pub fn next(self) -> Option<Self> {
        Self::ALL.get(self.index() + 1).copied()
    }

    pub fn previous(self) -> Option<Self> {
        self.index()
            .checked_sub(1)
            .and_then(|index| Self::ALL.get(index).copied())
    }

    pub const fn first() -> Self {
        WizardStep::PersonalInformation
    }

    pub const fn last() -> Self {
        WizardStep::Consent
    }

    /// Steps that must be valid before `self` may be shown.
    pub fn prior_steps(self) -> &'static [WizardStep] {
        &Self::ALL[..self.index()]
    }
}

impl fmt::Display for WizardStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

fn overlay<T>(slot: &mut Option<T>, value: Option<T>) {
    if value.is_some() {
        *slot = value;
    }
}

/// Step 1: who the applicant is and whether they are eligible.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PersonalInformation {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub birth_year: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_province_major_certified: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_canadian_citizen: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub province_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discovery_channel_id: Option<String>,
}

impl PersonalInformation {
    pub fn merge(&mut self, patch: Self) {
        overlay(&mut self.first_name, patch.first_name);
        overlay(&mut self.last_name, patch.last_name);
        overlay(&mut self.email, patch.email);
        overlay(&mut self.birth_year, patch.birth_year);
        overlay(
            &mut self.is_province_major_certified,
            patch.is_province_major_certified,
        );
        overlay(&mut self.language_id, patch.language_id);
        overlay(&mut self.is_canadian_citizen, patch.is_canadian_citizen);
        overlay(&mut self.province_id, patch.province_id);
        overlay(&mut self.discovery_channel_id, patch.discovery_channel_id);
    }
}

/// Step 2: voluntary self-identification answers (each has a "prefer not to say" option).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct IdentityInformation {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub indigenous_status_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disability_status_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ethnic_group_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lgbtq_status_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub education_level_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub income_level_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub household_size_id: Option<String>,
}

impl IdentityInformation {
    pub fn merge(&mut self, patch: Self) {
        overlay(&mut self.gender_id, patch.gender_id);
        overlay(&mut self.indigenous_status_id, patch.indigenous_status_id);
        overlay(&mut self.disability_status_id, patch.disability_status_id);
        overlay(&mut self.ethnic_group_id, patch.ethnic_group_id);
        overlay(&mut self.lgbtq_status_id, patch.lgbtq_status_id);
        overlay(&mut self.education_level_id, patch.education_level_id);
        overlay(&mut self.income_level_id, patch.income_level_id);
        overlay(&mut self.household_size_id, patch.household_size_id);
    }
}

/// Step 3: how and on what the applicant wants to participate.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExpressionOfInterest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preferred_language_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preferred_method_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interest_topic_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub additional_info: Option<String>,
}

impl ExpressionOfInterest {
    pub fn merge(&mut self, patch: Self) {
        overlay(&mut self.preferred_language_id, patch.preferred_language_id);
        overlay(&mut self.preferred_method_id, patch.preferred_method_id);
        overlay(&mut self.interest_topic_id, patch.interest_topic_id);
        overlay(&mut self.additional_info, patch.additional_info);
    }
}

/// Step 4: privacy statement acknowledgement and consent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Consent {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_read_privacy_statement: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_given_consent: Option<bool>,
}

impl Consent {
    pub fn merge(&mut self, patch: Self) {
        overlay(
            &mut self.has_read_privacy_statement,
            patch.has_read_privacy_statement,
        );
        overlay(&mut self.has_given_consent, patch.has_given_consent);
    }
}

/// Partial answers for the whole wizard, persisted between page loads.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ApplicationState {
    pub personal_information: PersonalInformation,
    pub identity_information: IdentityInformation,
    pub expression_of_interest: ExpressionOfInterest,
    pub consent: Consent,
}

impl ApplicationState {
    pub fn section_json(&self, step: WizardStep) -> Result<serde_json::Value, serde_json::Error> {
        match step {
            WizardStep::PersonalInformation => serde_json::to_value(&self.personal_information),
            WizardStep::IdentityInformation => serde_json::to_value(&self.identity_information),
            WizardStep::ExpressionOfInterest => serde_json::to_value(&self.expression_of_interest),
            WizardStep::Consent => serde_json::to_value(&self.consent),
        }
    }

    /// Apply a JSON patch to one section. Absent keys keep their answer; `null` clears it.
    pub fn patch_section(
        &mut self,
        step: WizardStep,
        patch: serde_json::Value,
    ) -> Result<(), serde_json::Error> {
        let serde_json::Value::Object(patch) = patch else {
            return Err(<serde_json::Error as serde::de::Error>::custom(
                "section fields must be a JSON object",
            ));
        };

        let mut fields = match self.section_json(step)? {
            serde_json::Value::Object(fields) => fields,
            _ => serde_json::Map::new(),
        };
        for (key, value) in patch {
            if value.is_null() {
                fields.remove(&key);
            } else {
                fields.insert(key, value);
            }
        }

        match SectionUpdate::from_json(step, serde_json::Value::Object(fields))? {
            SectionUpdate::PersonalInformation(section) => self.personal_information = section,
            SectionUpdate::IdentityInformation(section) => self.identity_information = section,
            SectionUpdate::ExpressionOfInterest(section) => self.expression_of_interest = section,
            SectionUpdate::Consent(section) => self.consent = section,
        }
        Ok(())
    }

    pub fn apply(&mut self, update: SectionUpdate) {
        match update {
            SectionUpdate::PersonalInformation(patch) => self.personal_information.merge(patch),
            SectionUpdate::IdentityInformation(patch) => self.identity_information.merge(patch),
            SectionUpdate::ExpressionOfInterest(patch) => {
                self.expression_of_interest.merge(patch)
            }
            SectionUpdate::Consent(patch) => self.consent.merge(patch),
        }
    }
}

/// Partial field values for one section. Unset fields leave stored answers untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SectionUpdate {
    PersonalInformation(PersonalInformation),
    IdentityInformation(IdentityInformation),
    ExpressionOfInterest(ExpressionOfInterest),
    Consent(Consent),
}

impl SectionUpdate {
    /// Decode a JSON patch for `step`. Keys outside the section's schema are ignored.
    pub fn from_json(step: WizardStep, value: serde_json::Value) -> Result<Self, serde_json::Error> {
        Ok(match step {
            WizardStep::PersonalInformation => {
                SectionUpdate::PersonalInformation(serde_json::from_value(value)?)
            }
            WizardStep::IdentityInformation => {
                SectionUpdate::IdentityInformation(serde_json::from_value(value)?)
            }
            WizardStep::ExpressionOfInterest => {
                SectionUpdate::ExpressionOfInterest(serde_json::from_value(value)?)
            }
            WizardStep::Consent => SectionUpdate::Consent(serde_json::from_value(value)?),
        })
    }

    pub fn step(&self) -> WizardStep {
        match self {
            SectionUpdate::PersonalInformation(_) => WizardStep::PersonalInformation,
            SectionUpdate::IdentityInformation(_) => WizardStep::IdentityInformation,
            SectionUpdate::ExpressionOfInterest(_) => WizardStep::ExpressionOfInterest,
            SectionUpdate::Consent(_) => WizardStep::Consent,
        }
    }
}

/// Flattened application payload assembled from a fully valid wizard state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationDetails {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub birth_year: i32,
    pub is_province_major_certified: bool,
    pub language_id: String,
    pub is_canadian_citizen: bool,
    pub province_id: String,
    pub discovery_channel_id: String,
    pub gender_id: String,
    pub indigenous_status_id: String,
    pub disability_status_id: String,
    pub ethnic_group_id: String,
    pub lgbtq_status_id: String,
    pub education_level_id: String,
    pub income_level_id: String,
    pub household_size_id: String,
    pub preferred_language_id: String,
    pub preferred_method_id: String,
    pub interest_topic_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_info: Option<String>,
    pub has_read_privacy_statement: bool,
    pub has_given_consent: bool,
}

/// A required answer was missing when assembling the submission payload.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("application is incomplete: '{field}' missing on step {step}")]
pub struct IncompleteApplication {
    pub step: WizardStep,
    pub field: &'static str,
}

fn take<T: Clone>(
    value: &Option<T>,
    step: WizardStep,
    field: &'static str,
) -> Result<T, IncompleteApplication> {
    value.clone().ok_or(IncompleteApplication { step, field })
}

impl TryFrom<&ApplicationState> for ApplicationDetails {
    type Error = IncompleteApplication;

    fn try_from(state: &ApplicationState) -> Result<Self, Self::Error> {
        let personal = &state.personal_information;
        let identity = &state.identity_information;
        let interest = &state.expression_of_interest;
        let consent = &state.consent;
        let p = WizardStep::PersonalInformation;
        let i = WizardStep::IdentityInformation;
        let e = WizardStep::ExpressionOfInterest;
        let c = WizardStep::Consent;

        Ok(Self {
            first_name: take(&personal.first_name, p, "firstName")?.trim().to_string(),
            last_name: take(&personal.last_name, p, "lastName")?.trim().to_string(),
            email: take(&personal.email, p, "email")?.trim().to_string(),
            birth_year: take(&personal.birth_year, p, "birthYear")?,
            is_province_major_certified: take(
                &personal.is_province_major_certified,
                p,
                "isProvinceMajorCertified",
            )?,
            language_id: take(&personal.language_id, p, "languageId")?,
            is_canadian_citizen: take(&personal.is_canadian_citizen, p, "isCanadianCitizen")?,
            province_id: take(&personal.province_id, p, "provinceId")?,
            discovery_channel_id: take(&personal.discovery_channel_id, p, "discoveryChannelId")?,
            gender_id: take(&identity.gender_id, i, "genderId")?,
            indigenous_status_id: take(&identity.indigenous_status_id, i, "indigenousStatusId")?,
            disability_status_id: take(&identity.disability_status_id, i, "disabilityStatusId")?,
            ethnic_group_id: take(&identity.ethnic_group_id, i, "ethnicGroupId")?,
            lgbtq_status_id: take(&identity.lgbtq_status_id, i, "lgbtqStatusId")?,
            education_level_id: take(&identity.education_level_id, i, "educationLevelId")?,
            income_level_id: take(&identity.income_level_id, i, "incomeLevelId")?,
            household_size_id: take(&identity.household_size_id, i, "householdSizeId")?,
            preferred_language_id: take(&interest.preferred_language_id, e, "preferredLanguageId")?,
            preferred_method_id: take(&interest.preferred_method_id, e, "preferredMethodId")?,
            interest_topic_id: take(&interest.interest_topic_id, e, "interestTopicId")?,
            additional_info: interest
                .additional_info
                .as_deref()
                .map(str::trim)
                .filter(|text| !text.is_empty())
                .map(str::to_string),
            has_read_privacy_statement: take(
                &consent.has_read_privacy_statement,
                c,
                "hasReadPrivacyStatement",
            )?,
            has_given_consent: take(&consent.has_given_consent, c, "hasGivenConsent")?,
        })
    }
}

/// Record as returned by the backend after submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Application {
    pub id: ApplicationId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_email_verified: Option<bool>,
    #[serde(flatten)]
    pub details: ApplicationDetails,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified_date: Option<DateTime<Utc>>,
}
