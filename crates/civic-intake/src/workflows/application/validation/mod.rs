//! Per-step schema checks for the application wizard.
//!
//! Validation never stops at the first problem: every failing field of a section is
//! reported, each with a translation key that resolves to an English or French message.

pub mod messages;
pub mod rules;

use chrono::{Datelike, Utc};
use serde::Serialize;

use super::domain::{
    ApplicationState, Consent, ExpressionOfInterest, IdentityInformation, PersonalInformation,
    WizardStep,
};
use crate::workflows::lookups::Locale;
use messages::Rule;
use rules::{Checks, MAX_FREE_TEXT_LENGTH, MAX_NAME_LENGTH, MIN_BIRTH_YEAR};

/// One failing field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldError {
    pub path: &'static str,
    pub message_key: String,
}

impl FieldError {
    pub fn new(path: &'static str, rule: Rule) -> Self {
        Self {
            path,
            message_key: messages::message_key(path, rule),
        }
    }

    pub fn localize(&self, locale: Locale) -> LocalizedFieldError {
        LocalizedFieldError {
            path: self.path,
            message_key: self.message_key.clone(),
            message: messages::resolve(locale, &self.message_key),
            href: format!("#{}", self.path),
        }
    }
}

/// Error as rendered inline and in the error summary, with a jump link to the field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalizedFieldError {
    pub path: &'static str,
    pub message_key: String,
    pub message: String,
    pub href: String,
}

pub fn localize_all(errors: &[FieldError], locale: Locale) -> Vec<LocalizedFieldError> {
    errors.iter().map(|error| error.localize(locale)).collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationOutcome {
    Valid,
    Invalid(Vec<FieldError>),
}

impl ValidationOutcome {
    fn from_errors(errors: Vec<FieldError>) -> Self {
        if errors.is_empty() {
            ValidationOutcome::Valid
        } else {
            ValidationOutcome::Invalid(errors)
        }
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationOutcome::Valid)
    }

    pub fn errors(&self) -> &[FieldError] {
        match self {
            ValidationOutcome::Valid => &[],
            ValidationOutcome::Invalid(errors) => errors,
        }
    }
}

/// A wizard section that knows its own field rules.
pub trait SectionSchema {
    fn check(&self, validator: &StepValidator, checks: &mut Checks);
}

/// Runs section schemas. Holds the calendar year used to bound birth years.
#[derive(Debug, Clone, Copy)]
pub struct StepValidator {
    current_year: i32,
}

impl StepValidator {
    pub fn new(current_year: i32) -> Self {
        Self { current_year }
    }

    pub fn current() -> Self {
        Self::new(Utc::now().year())
    }

    pub fn current_year(&self) -> i32 {
        self.current_year
    }

    pub fn validate<S: SectionSchema>(&self, section: &S) -> ValidationOutcome {
        let mut checks = Checks::default();
        section.check(self, &mut checks);
        ValidationOutcome::from_errors(checks.into_errors())
    }

    pub fn validate_step(&self, state: &ApplicationState, step: WizardStep) -> ValidationOutcome {
        match step {
            WizardStep::PersonalInformation => self.validate(&state.personal_information),
            WizardStep::IdentityInformation => self.validate(&state.identity_information),
            WizardStep::ExpressionOfInterest => self.validate(&state.expression_of_interest),
            WizardStep::Consent => self.validate(&state.consent),
        }
    }
}

impl SectionSchema for PersonalInformation {
    fn check(&self, validator: &StepValidator, checks: &mut Checks) {
        checks.text("firstName", self.first_name.as_deref(), MAX_NAME_LENGTH);
        checks.text("lastName", self.last_name.as_deref(), MAX_NAME_LENGTH);
        checks.email("email", self.email.as_deref());
        checks.year(
            "birthYear",
            self.birth_year,
            MIN_BIRTH_YEAR,
            validator.current_year,
        );
        checks.affirmed("isProvinceMajorCertified", self.is_province_major_certified);
        checks.selected("languageId", self.language_id.as_deref());
        checks.answered("isCanadianCitizen", self.is_canadian_citizen);
        checks.selected("provinceId", self.province_id.as_deref());
        checks.selected("discoveryChannelId", self.discovery_channel_id.as_deref());
    }
}

impl SectionSchema for IdentityInformation {
    fn check(&self, _validator: &StepValidator, checks: &mut Checks) {
        checks.selected("genderId", self.gender_id.as_deref());
        checks.selected("indigenousStatusId", self.indigenous_status_id.as_deref());
        checks.selected("disabilityStatusId", self.disability_status_id.as_deref());
        checks.selected("ethnicGroupId", self.ethnic_group_id.as_deref());
        checks.selected("lgbtqStatusId", self.lgbtq_status_id.as_deref());
        checks.selected("educationLevelId", self.education_level_id.as_deref());
        checks.selected("incomeLevelId", self.income_level_id.as_deref());
        checks.selected("householdSizeId", self.household_size_id.as_deref());
    }
}

impl SectionSchema for ExpressionOfInterest {
    fn check(&self, _validator: &StepValidator, checks: &mut Checks) {
        checks.selected("preferredLanguageId", self.preferred_language_id.as_deref());
        checks.selected("preferredMethodId", self.preferred_method_id.as_deref());
        checks.selected("interestTopicId", self.interest_topic_id.as_deref());
        checks.optional_text(
            "additionalInfo",
            self.additional_info.as_deref(),
            MAX_FREE_TEXT_LENGTH,
        );
    }
}

impl SectionSchema for Consent {
    fn check(&self, _validator: &StepValidator, checks: &mut Checks) {
        checks.affirmed("hasReadPrivacyStatement", self.has_read_privacy_statement);
        checks.affirmed("hasGivenConsent", self.has_given_consent);
    }
}
