use civic_intake::backend::{BackendError, BearerToken, HttpIntakeBackend};
use civic_intake::config::{normalize_base_url, AppConfig};
use civic_intake::error::AppError;
use civic_intake::workflows::lookups::{Locale, LookupCache, LookupKind, LookupOption};
use civic_intake::workflows::management::{
    ApplicationPage, ApplicationQuery, ManagementError, ManagementService,
};
use clap::Args;
use std::sync::Arc;

#[derive(Args, Debug)]
pub(crate) struct LookupArgs {
    /// Reference table, e.g. `provinces` or `discovery-channels`
    #[arg(value_parser = parse_lookup_kind)]
    pub(crate) kind: LookupKind,
    /// Language of the labels (en or fr). Defaults to the configured locale.
    #[arg(long, value_parser = parse_locale)]
    pub(crate) locale: Option<Locale>,
    /// Override the backend REST API base URL
    #[arg(long)]
    pub(crate) backend_url: Option<String>,
}

#[derive(Args, Debug)]
pub(crate) struct ApplicationListArgs {
    /// Bearer token issued by the sign-in provider
    #[arg(long)]
    pub(crate) token: String,
    #[arg(long, default_value_t = 0)]
    pub(crate) page: u32,
    #[arg(long, default_value_t = 20)]
    pub(crate) size: u32,
    /// Only applications in this status
    #[arg(long)]
    pub(crate) status: Option<String>,
    /// Match on name or email
    #[arg(long)]
    pub(crate) search: Option<String>,
    /// Override the backend REST API base URL
    #[arg(long)]
    pub(crate) backend_url: Option<String>,
}

#[derive(Args, Debug)]
pub(crate) struct SelectionArgs {
    /// Bearer token issued by the sign-in provider
    #[arg(long)]
    pub(crate) token: String,
    /// How many submitted applications to select
    #[arg(long)]
    pub(crate) count: u32,
    /// Override the backend REST API base URL
    #[arg(long)]
    pub(crate) backend_url: Option<String>,
}

pub(crate) fn parse_lookup_kind(raw: &str) -> Result<LookupKind, String> {
    LookupKind::from_path(raw.trim()).ok_or_else(|| {
        let known: Vec<&str> = LookupKind::ALL.iter().map(|kind| kind.path()).collect();
        format!("unknown lookup '{raw}' (expected one of: {})", known.join(", "))
    })
}

pub(crate) fn parse_locale(raw: &str) -> Result<Locale, String> {
    Locale::parse(raw).ok_or_else(|| format!("unsupported locale '{raw}' (expected en or fr)"))
}

fn backend(config: &mut AppConfig, override_url: Option<String>) -> Result<HttpIntakeBackend, AppError> {
    if let Some(base_url) = override_url {
        config.backend.base_url = normalize_base_url(&base_url)?;
    }
    Ok(HttpIntakeBackend::new(&config.backend)?)
}

fn bearer(raw: &str) -> Result<BearerToken, AppError> {
    BearerToken::new(raw).ok_or_else(|| {
        AppError::Backend(BackendError::Http {
            status: 401,
            body: None,
            text: Some("an empty bearer token was supplied".to_string()),
        })
    })
}

pub(crate) fn management_error(err: ManagementError) -> AppError {
    match err {
        ManagementError::Backend(err) => AppError::Backend(err),
        ManagementError::Validation(errors) => {
            let fields: Vec<String> = errors
                .iter()
                .map(|error| error.localize(Locale::En).message)
                .collect();
            AppError::Backend(BackendError::Http {
                status: 422,
                body: None,
                text: Some(fields.join(" ")),
            })
        }
    }
}

pub(crate) async fn run_lookups(args: LookupArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;
    let locale = args.locale.unwrap_or(config.default_locale);
    let backend = Arc::new(backend(&mut config, args.backend_url)?);

    let entries = LookupCache::new(backend).fetch(args.kind, locale).await?;
    let options: Vec<LookupOption> = entries
        .iter()
        .map(|entity| LookupOption::from_entity(entity, locale))
        .collect();
    print!("{}", render_options(args.kind, locale, &options));
    Ok(())
}

pub(crate) async fn run_application_list(args: ApplicationListArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;
    let backend = Arc::new(backend(&mut config, args.backend_url)?);
    let token = bearer(&args.token)?;
    let service = ManagementService::new(backend, Arc::default());

    let query = ApplicationQuery {
        page: args.page,
        size: args.size,
        sort: None,
        status_id: args.status,
        search: args.search,
    };
    let page = service
        .list(query, &token)
        .await
        .map_err(management_error)?;
    print!("{}", render_page(&page));
    Ok(())
}

pub(crate) async fn run_selection(args: SelectionArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;
    let backend = Arc::new(backend(&mut config, args.backend_url)?);
    let token = bearer(&args.token)?;
    let service = ManagementService::new(backend, Arc::default());

    let report = service
        .select(args.count, &token)
        .await
        .map_err(management_error)?;
    println!(
        "Selected {} of {} requested application(s)",
        report.selected, report.requested
    );
    if report.shortfall() > 0 {
        println!("  Not enough submitted applications: {} short", report.shortfall());
    }
    for id in &report.application_ids {
        println!("  - {id}");
    }
    Ok(())
}

pub(crate) fn render_options(kind: LookupKind, locale: Locale, options: &[LookupOption]) -> String {
    let mut out = format!("{kind} ({locale})\n");
    if options.is_empty() {
        out.push_str("  (no active entries)\n");
    }
    for option in options {
        out.push_str(&format!("  {:<32} {}\n", option.id, option.label));
    }
    out
}

pub(crate) fn render_page(page: &ApplicationPage) -> String {
    let mut out = String::new();
    if let Some(meta) = page.page {
        out.push_str(&format!(
            "Page {} of {} ({} application(s))\n",
            meta.number + 1,
            meta.total_pages.max(1),
            meta.total_elements
        ));
    }
    if page.applications.is_empty() {
        out.push_str("  (no applications)\n");
    }
    for application in &page.applications {
        out.push_str(&format!(
            "  {:<12} {:<12} {} {} <{}>\n",
            application.id.0,
            application.status_id.as_deref().unwrap_or("-"),
            application.details.first_name,
            application.details.last_name,
            application.details.email,
        ));
    }
    out
}
