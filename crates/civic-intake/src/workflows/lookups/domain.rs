use std::cmp::Ordering;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Two-letter language code threaded through lookups and messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    En,
    Fr,
}

impl Locale {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "en" => Some(Self::En),
            "fr" => Some(Self::Fr),
            _ => None,
        }
    }

    pub const fn code(self) -> &'static str {
        match self {
            Locale::En => "en",
            Locale::Fr => "fr",
        }
    }

    /// Backend field used to order entries for this locale.
    pub const fn display_order_field(self) -> &'static str {
        match self {
            Locale::En => "displayOrderEn",
            Locale::Fr => "displayOrderFr",
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Reference tables served by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LookupKind {
    Languages,
    Provinces,
    Genders,
    IndigenousStatuses,
    DisabilityStatuses,
    EthnicGroups,
    LgbtqStatuses,
    EducationLevels,
    IncomeLevels,
    HouseholdSizes,
    DiscoveryChannels,
    PreferredMethods,
    InterestTopics,
    ApplicationStatuses,
}

impl LookupKind {
    pub const ALL: [LookupKind; 14] = [
        LookupKind::Languages,
        LookupKind::Provinces,
        LookupKind::Genders,
        LookupKind::IndigenousStatuses,
        LookupKind::DisabilityStatuses,
        LookupKind::EthnicGroups,
        LookupKind::LgbtqStatuses,
        LookupKind::EducationLevels,
        LookupKind::IncomeLevels,
        LookupKind::HouseholdSizes,
        LookupKind::DiscoveryChannels,
        LookupKind::PreferredMethods,
        LookupKind::InterestTopics,
        LookupKind::ApplicationStatuses,
    ];

    /// Path segment on the backend (`GET /{path}`).
    pub const fn path(self) -> &'static str {
        match self {
            LookupKind::Languages => "languages",
            LookupKind::Provinces => "provinces",
            LookupKind::Genders => "genders",
            LookupKind::IndigenousStatuses => "indigenous-statuses",
            LookupKind::DisabilityStatuses => "disability-statuses",
            LookupKind::EthnicGroups => "ethnic-groups",
            LookupKind::LgbtqStatuses => "lgbtq-statuses",
            LookupKind::EducationLevels => "education-levels",
            LookupKind::IncomeLevels => "income-levels",
            LookupKind::HouseholdSizes => "household-sizes",
            LookupKind::DiscoveryChannels => "discovery-channels",
            LookupKind::PreferredMethods => "preferred-methods",
            LookupKind::InterestTopics => "interest-topics",
            LookupKind::ApplicationStatuses => "application-statuses",
        }
    }

    /// Key of the collection inside the HATEOAS `_embedded` object.
    pub const fn embedded_key(self) -> &'static str {
        match self {
            LookupKind::Languages => "languages",
            LookupKind::Provinces => "provinces",
            LookupKind::Genders => "genders",
            LookupKind::IndigenousStatuses => "indigenousStatuses",
            LookupKind::DisabilityStatuses => "disabilityStatuses",
            LookupKind::EthnicGroups => "ethnicGroups",
            LookupKind::LgbtqStatuses => "lgbtqStatuses",
            LookupKind::EducationLevels => "educationLevels",
            LookupKind::IncomeLevels => "incomeLevels",
            LookupKind::HouseholdSizes => "householdSizes",
            LookupKind::DiscoveryChannels => "discoveryChannels",
            LookupKind::PreferredMethods => "preferredMethods",
            LookupKind::InterestTopics => "interestTopics",
            LookupKind::ApplicationStatuses => "applicationStatuses",
        }
    }

    pub fn from_path(raw: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.path() == raw)
    }
}

impl fmt::Display for LookupKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// One row of a reference table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LookupEntity {
    pub id: String,
    pub description_en: String,
    pub description_fr: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activation_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiration_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_order_en: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_order_fr: Option<i32>,
}

impl LookupEntity {
    /// Active once the activation date has passed and until the expiration date.
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        let activated = self.activation_date.map_or(true, |date| date <= now);
        let expired = self.expiration_date.map_or(false, |date| date <= now);
        activated && !expired
    }

    pub fn description(&self, locale: Locale) -> &str {
        match locale {
            Locale::En => &self.description_en,
            Locale::Fr => &self.description_fr,
        }
    }

    pub fn display_order(&self, locale: Locale) -> Option<i32> {
        match locale {
            Locale::En => self.display_order_en,
            Locale::Fr => self.display_order_fr,
        }
    }
}

/// Drop inactive entries and order the rest for `locale`.
///
/// Entries without a display order sort after ordered ones; ties fall back to
/// the localized description.
pub fn active_entries(
    entities: Vec<LookupEntity>,
    locale: Locale,
    now: DateTime<Utc>,
) -> Vec<LookupEntity> {
    let mut active: Vec<LookupEntity> = entities
        .into_iter()
        .filter(|entity| entity.is_active_at(now))
        .collect();

    active.sort_by(|left, right| {
        let order = match (left.display_order(locale), right.display_order(locale)) {
            (Some(a), Some(b)) => a.cmp(&b),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        };
        order.then_with(|| left.description(locale).cmp(right.description(locale)))
    });

    active
}

/// Localized option as served to the wizard pages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LookupOption {
    pub id: String,
    pub label: String,
}

impl LookupOption {
    pub fn from_entity(entity: &LookupEntity, locale: Locale) -> Self {
        Self {
            id: entity.id.clone(),
            label: entity.description(locale).to_string(),
        }
    }
}
