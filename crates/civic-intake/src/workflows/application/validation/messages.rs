use crate::workflows::lookups::Locale;

/// Why a field failed validation. The suffix of every message key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    Required,
    TooLong,
    Invalid,
    OutOfRange,
    MustAccept,
}

impl Rule {
    pub const fn key(self) -> &'static str {
        match self {
            Rule::Required => "required",
            Rule::TooLong => "too-long",
            Rule::Invalid => "invalid",
            Rule::OutOfRange => "out-of-range",
            Rule::MustAccept => "must-accept",
        }
    }

    fn from_key(raw: &str) -> Option<Self> {
        [
            Rule::Required,
            Rule::TooLong,
            Rule::Invalid,
            Rule::OutOfRange,
            Rule::MustAccept,
        ]
        .into_iter()
        .find(|rule| rule.key() == raw)
    }

    fn template(self, locale: Locale) -> &'static str {
        match (self, locale) {
            (Rule::Required, Locale::En) => "{label} is required.",
            (Rule::Required, Locale::Fr) => "{label} est obligatoire.",
            (Rule::TooLong, Locale::En) => "{label} is too long.",
            (Rule::TooLong, Locale::Fr) => "{label} est trop long.",
            (Rule::Invalid, Locale::En) => "{label} is not valid.",
            (Rule::Invalid, Locale::Fr) => "{label} n'est pas valide.",
            (Rule::OutOfRange, Locale::En) => "{label} is out of range.",
            (Rule::OutOfRange, Locale::Fr) => "{label} est hors de la plage permise.",
            (Rule::MustAccept, Locale::En) => "{label} must be confirmed.",
            (Rule::MustAccept, Locale::Fr) => "{label} doit être confirmé.",
        }
    }
}

struct FieldLabel {
    path: &'static str,
    key: &'static str,
    en: &'static str,
    fr: &'static str,
}

const FIELD_LABELS: &[FieldLabel] = &[
    FieldLabel { path: "firstName", key: "first-name", en: "First name", fr: "Prénom" },
    FieldLabel { path: "lastName", key: "last-name", en: "Last name", fr: "Nom de famille" },
    FieldLabel { path: "email", key: "email", en: "Email address", fr: "Adresse courriel" },
    FieldLabel { path: "birthYear", key: "birth-year", en: "Year of birth", fr: "Année de naissance" },
    FieldLabel {
        path: "isProvinceMajorCertified",
        key: "is-province-major-certified",
        en: "Age of majority in your province",
        fr: "Âge de la majorité dans votre province",
    },
    FieldLabel { path: "languageId", key: "language-id", en: "Official language", fr: "Langue officielle" },
    FieldLabel {
        path: "isCanadianCitizen",
        key: "is-canadian-citizen",
        en: "Canadian citizenship",
        fr: "Citoyenneté canadienne",
    },
    FieldLabel { path: "provinceId", key: "province-id", en: "Province or territory", fr: "Province ou territoire" },
    FieldLabel {
        path: "discoveryChannelId",
        key: "discovery-channel-id",
        en: "How you heard about the program",
        fr: "Comment vous avez entendu parler du programme",
    },
    FieldLabel { path: "genderId", key: "gender-id", en: "Gender", fr: "Genre" },
    FieldLabel {
        path: "indigenousStatusId",
        key: "indigenous-status-id",
        en: "Indigenous identity",
        fr: "Identité autochtone",
    },
    FieldLabel {
        path: "disabilityStatusId",
        key: "disability-status-id",
        en: "Disability",
        fr: "Handicap",
    },
    FieldLabel { path: "ethnicGroupId", key: "ethnic-group-id", en: "Ethnic group", fr: "Groupe ethnique" },
    FieldLabel { path: "lgbtqStatusId", key: "lgbtq-status-id", en: "2SLGBTQIA+ identity", fr: "Identité 2ELGBTQIA+" },
    FieldLabel {
        path: "educationLevelId",
        key: "education-level-id",
        en: "Highest level of education",
        fr: "Plus haut niveau de scolarité",
    },
    FieldLabel { path: "incomeLevelId", key: "income-level-id", en: "Household income", fr: "Revenu du ménage" },
    FieldLabel { path: "householdSizeId", key: "household-size-id", en: "Household size", fr: "Taille du ménage" },
    FieldLabel {
        path: "preferredLanguageId",
        key: "preferred-language-id",
        en: "Preferred language",
        fr: "Langue de préférence",
    },
    FieldLabel {
        path: "preferredMethodId",
        key: "preferred-method-id",
        en: "Preferred participation method",
        fr: "Mode de participation préféré",
    },
    FieldLabel { path: "interestTopicId", key: "interest-topic-id", en: "Topic of interest", fr: "Sujet d'intérêt" },
    FieldLabel {
        path: "additionalInfo",
        key: "additional-info",
        en: "Additional information",
        fr: "Renseignements supplémentaires",
    },
    FieldLabel {
        path: "hasReadPrivacyStatement",
        key: "has-read-privacy-statement",
        en: "Privacy statement acknowledgement",
        fr: "Confirmation de lecture de l'avis de confidentialité",
    },
    FieldLabel { path: "hasGivenConsent", key: "has-given-consent", en: "Consent", fr: "Consentement" },
    FieldLabel { path: "statusId", key: "status-id", en: "Status", fr: "Statut" },
    FieldLabel { path: "reason", key: "reason", en: "Reason", fr: "Motif" },
    FieldLabel { path: "count", key: "count", en: "Number of applications", fr: "Nombre de demandes" },
    FieldLabel { path: "accessToken", key: "access-token", en: "Verification code", fr: "Code de vérification" },
];

/// Translation key for a failing field, e.g. `first-name.required`.
pub fn message_key(path: &str, rule: Rule) -> String {
    let field = FIELD_LABELS
        .iter()
        .find(|label| label.path == path)
        .map_or(path, |label| label.key);
    format!("{field}.{}", rule.key())
}

/// Resolve a message key for `locale`. Unknown keys come back unchanged.
pub fn resolve(locale: Locale, message_key: &str) -> String {
    let Some((field, rule)) = message_key.rsplit_once('.') else {
        return message_key.to_string();
    };
    let Some(rule) = Rule::from_key(rule) else {
        return message_key.to_string();
    };
    let Some(label) = FIELD_LABELS.iter().find(|label| label.key == field) else {
        return message_key.to_string();
    };

    let text = match locale {
        Locale::En => label.en,
        Locale::Fr => label.fr,
    };
    rule.template(locale).replace("{label}", text)
}
