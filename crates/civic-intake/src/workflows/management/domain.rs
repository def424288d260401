use serde::{Deserialize, Serialize};

use crate::backend::hateoas::PageMetadata;
use crate::workflows::application::{Application, ApplicationId};

pub const DEFAULT_PAGE_SIZE: u32 = 20;
pub const MAX_PAGE_SIZE: u32 = 100;
pub const MAX_REASON_LENGTH: usize = 500;

fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

/// Paging, sorting and filtering for the administrator list.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationQuery {
    #[serde(default)]
    pub page: u32,
    #[serde(default = "default_page_size")]
    pub size: u32,
    /// `field` or `field,asc|desc`, passed through to the backend.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
}

impl Default for ApplicationQuery {
    fn default() -> Self {
        Self {
            page: 0,
            size: DEFAULT_PAGE_SIZE,
            sort: None,
            status_id: None,
            search: None,
        }
    }
}

impl ApplicationQuery {
    /// Clamp the page size and drop blank filters so equivalent queries share a cache entry.
    pub fn normalized(mut self) -> Self {
        self.size = self.size.clamp(1, MAX_PAGE_SIZE);
        let blank_to_none = |value: Option<String>| {
            value
                .map(|text| text.trim().to_string())
                .filter(|text| !text.is_empty())
        };
        self.sort = blank_to_none(self.sort);
        self.status_id = blank_to_none(self.status_id);
        self.search = blank_to_none(self.search);
        self
    }

    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![("page", self.page.to_string()), ("size", self.size.to_string())];
        if let Some(sort) = &self.sort {
            params.push(("sort", sort.clone()));
        }
        if let Some(status_id) = &self.status_id {
            params.push(("statusId", status_id.clone()));
        }
        if let Some(search) = &self.search {
            params.push(("search", search.clone()));
        }
        params
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationPage {
    pub applications: Vec<Application>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<PageMetadata>,
}

/// Status change as typed by an administrator, before validation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StatusChange {
    pub status_id: Option<String>,
    pub reason: Option<String>,
}

/// Validated status change sent to the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusChangeRequest {
    pub status_id: String,
    pub reason: String,
}

/// Outcome of a bulk "select N applications" action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionReport {
    pub requested: u32,
    pub selected: usize,
    pub application_ids: Vec<ApplicationId>,
}

impl SelectionReport {
    pub fn shortfall(&self) -> usize {
        (self.requested as usize).saturating_sub(self.selected)
    }
}
