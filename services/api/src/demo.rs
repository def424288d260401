use crate::console::{management_error, parse_locale, render_options, render_page};
use crate::infra::InMemoryIntakeBackend;
use civic_intake::backend::BearerToken;
use civic_intake::error::AppError;
use civic_intake::workflows::application::validation::localize_all;
use civic_intake::workflows::application::{
    ApplicationId, ClientSession, Consent, ExpressionOfInterest, FormStateStore, IdentityInformation,
    MemorySessionStorage, Navigation, PersonalInformation, SectionUpdate, StepErrors,
    SubmitOutcome, VerificationOutcome, WizardNavigator, WizardStep,
};
use civic_intake::workflows::lookups::{Locale, LookupKind, LookupOption};
use civic_intake::workflows::management::{ApplicationQuery, StatusChange};
use civic_intake::workflows::IntakeServices;
use clap::Args;
use std::sync::Arc;

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Language for lookup labels and validation messages (en or fr)
    #[arg(long, value_parser = parse_locale)]
    pub(crate) locale: Option<Locale>,
    /// Stop after the applicant submits; skip the administrator console portion.
    #[arg(long)]
    pub(crate) skip_console: bool,
}

type DemoServices = IntakeServices<InMemoryIntakeBackend>;

pub(crate) async fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let locale = args.locale.unwrap_or_default();
    let services = Arc::new(DemoServices::new(
        Arc::new(InMemoryIntakeBackend::default()),
        locale,
    ));

    println!("Civic Participation Program demo ({locale})");

    println!("\nReference data");
    for kind in [LookupKind::Provinces, LookupKind::InterestTopics] {
        let entries = services.lookups.fetch(kind, locale).await?;
        let options: Vec<LookupOption> = entries
            .iter()
            .map(|entity| LookupOption::from_entity(entity, locale))
            .collect();
        print!("{}", render_options(kind, locale, &options));
    }

    let Some(session) = services.sessions.session("demo-tab") else {
        return Ok(());
    };
    let Some(application_id) = run_applicant(&services, &session, locale).await? else {
        return Ok(());
    };

    if args.skip_console {
        return Ok(());
    }
    run_console(&services, &application_id).await
}

fn storage_failure(err: impl std::fmt::Display) -> AppError {
    AppError::Io(std::io::Error::other(err.to_string()))
}

fn print_errors(invalid: &StepErrors, locale: Locale) {
    println!(
        "  {} has {} problem(s):",
        invalid.step,
        invalid.errors.len()
    );
    for error in localize_all(&invalid.errors, locale) {
        println!("    {} {}", error.href, error.message);
    }
}

async fn run_applicant(
    services: &DemoServices,
    session: &ClientSession,
    locale: Locale,
) -> Result<Option<String>, AppError> {
    let navigator = WizardNavigator::current();
    let mut store: FormStateStore<MemorySessionStorage> =
        FormStateStore::load(session.storage.clone()).map_err(storage_failure)?;

    println!("\nApplicant: first attempt at step 1");
    store
        .update(SectionUpdate::PersonalInformation(PersonalInformation {
            first_name: Some("Jane".to_string()),
            last_name: Some(String::new()),
            email: Some("bad".to_string()),
            birth_year: Some(-5),
            is_province_major_certified: Some(false),
            ..PersonalInformation::default()
        }))
        .map_err(storage_failure)?;
    if let Navigation::Invalid(invalid) = navigator.next(WizardStep::PersonalInformation, store.get())
    {
        print_errors(&invalid, locale);
    }

    println!("\nApplicant: corrected answers");
    let updates = [
        SectionUpdate::PersonalInformation(PersonalInformation {
            first_name: Some("Jane".to_string()),
            last_name: Some("Tremblay".to_string()),
            email: Some("jane.tremblay@example.ca".to_string()),
            birth_year: Some(1988),
            is_province_major_certified: Some(true),
            language_id: Some("languages-fr".to_string()),
            is_canadian_citizen: Some(true),
            province_id: Some("provinces-qc".to_string()),
            discovery_channel_id: Some("discovery-channels-web".to_string()),
        }),
        SectionUpdate::IdentityInformation(IdentityInformation {
            gender_id: Some("genders-woman".to_string()),
            indigenous_status_id: Some("indigenous-statuses-no".to_string()),
            disability_status_id: Some("disability-statuses-prefer-not".to_string()),
            ethnic_group_id: Some("ethnic-groups-prefer-not".to_string()),
            lgbtq_status_id: Some("lgbtq-statuses-prefer-not".to_string()),
            education_level_id: Some("education-levels-university".to_string()),
            income_level_id: Some("income-levels-middle".to_string()),
            household_size_id: Some("household-sizes-2".to_string()),
        }),
        SectionUpdate::ExpressionOfInterest(ExpressionOfInterest {
            preferred_language_id: Some("languages-fr".to_string()),
            preferred_method_id: Some("preferred-methods-online".to_string()),
            interest_topic_id: Some("interest-topics-housing".to_string()),
            additional_info: None,
        }),
        SectionUpdate::Consent(Consent {
            has_read_privacy_statement: Some(true),
            has_given_consent: Some(true),
        }),
    ];
    for update in updates {
        let step = update.step();
        store.update(update).map_err(storage_failure)?;
        match navigator.next(step, store.get()) {
            Navigation::Moved(next) => println!("  {step} ok, continuing to {next}"),
            Navigation::ReadyToSubmit => println!("  {step} ok, ready to submit"),
            Navigation::Invalid(invalid) => {
                print_errors(&invalid, locale);
                return Ok(None);
            }
        }
    }

    let Some(_in_flight) = session.in_flight.try_acquire() else {
        println!("  A submission is already in progress");
        return Ok(None);
    };
    let receipt = match navigator.submit(&mut store, &services.submissions).await {
        Ok(SubmitOutcome::Submitted(receipt)) => receipt,
        Ok(SubmitOutcome::Invalid(invalid)) => {
            print_errors(&invalid, locale);
            return Ok(None);
        }
        Err(err) => {
            println!("  Submission failed: {err}");
            return Ok(None);
        }
    };
    println!(
        "  Submitted {}; next page {}",
        receipt.application_id,
        receipt.redirect.path()
    );

    if let Some(access_code) = &receipt.access_code {
        match services.verification.verify(access_code).await? {
            VerificationOutcome::Verified { application_id } => {
                println!("  Email verified for {application_id}")
            }
            VerificationOutcome::UnknownToken => println!("  Access code was not recognised"),
            VerificationOutcome::Invalid { .. } => println!("  Access code was blank"),
        }
    }

    Ok(Some(receipt.application_id.0))
}

async fn run_console(services: &DemoServices, application_id: &str) -> Result<(), AppError> {
    println!("\nAdministrator console");
    let Some(token) = BearerToken::new("demo-administrator") else {
        return Ok(());
    };
    let console = &services.management;

    let page = console
        .list(ApplicationQuery::default(), &token)
        .await
        .map_err(management_error)?;
    print!("{}", render_page(&page));

    let id = ApplicationId(application_id.to_string());
    let rejected = console
        .change_status(&id, StatusChange::default(), &token)
        .await;
    if let Err(err) = rejected {
        println!("  Status change without a reason refused: {err}");
    }

    let report = console
        .select(3, &token)
        .await
        .map_err(management_error)?;
    println!(
        "  Selected {} of {} requested ({} short)",
        report.selected,
        report.requested,
        report.shortfall()
    );

    let updated = console
        .change_status(
            &id,
            StatusChange {
                status_id: Some("approved".to_string()),
                reason: Some("Selected in the first draw".to_string()),
            },
            &token,
        )
        .await
        .map_err(management_error)?;
    println!(
        "  {} is now {}",
        updated.id,
        updated.status_id.as_deref().unwrap_or("-")
    );
    Ok(())
}
