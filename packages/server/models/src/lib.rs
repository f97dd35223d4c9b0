#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! API request and response types for the emigrant statistics server.
//!
//! These types are serialized to JSON for the REST API. They are separate
//! from the store and transform types so the API contract can evolve on
//! its own.

use std::collections::BTreeMap;

use emigrant_stats_category_models::{Category, CategoryDefinition, Layout};
use emigrant_stats_transform_models::YearRecord;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Header carrying the caller's role, set by the authenticating proxy.
pub const ROLE_HEADER: &str = "X-Emigrant-Role";

/// What a caller is allowed to do.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Permission {
    /// View dashboards and records.
    Read,
    /// Add and edit year records.
    Write,
    /// Delete year records.
    Delete,
    /// Manage user accounts.
    ManageUsers,
    /// Upload category CSV files.
    UploadData,
}

/// A caller's role.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum Role {
    /// Full access.
    Admin,
    /// Can read, edit and upload data.
    Editor,
    /// Read-only access.
    #[default]
    Viewer,
}

impl Role {
    /// Permissions granted to this role.
    #[must_use]
    pub const fn permissions(self) -> &'static [Permission] {
        match self {
            Self::Admin => &[
                Permission::Read,
                Permission::Write,
                Permission::Delete,
                Permission::ManageUsers,
                Permission::UploadData,
            ],
            Self::Editor => &[Permission::Read, Permission::Write, Permission::UploadData],
            Self::Viewer => &[Permission::Read],
        }
    }

    /// Returns `true` if the role grants `permission`.
    #[must_use]
    pub fn has_permission(self, permission: Permission) -> bool {
        self.permissions().contains(&permission)
    }
}

/// Response of `GET /api/health`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiHealth {
    /// Always `true` when the server answers.
    pub healthy: bool,
    /// Server version.
    pub version: String,
}

/// A category as listed by `GET /api/categories`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiCategory {
    /// Category identifier.
    pub id: Category,
    /// Display name.
    pub label: String,
    /// Upload card description.
    pub description: String,
    /// Identifying CSV column.
    pub identifier_column: String,
    /// CSV arrangement.
    pub layout: Layout,
    /// First published year.
    pub start_year: i32,
    /// Last published year.
    pub end_year: i32,
    /// Years per period, if the category has periods.
    pub period_length: Option<u32>,
    /// Canonical field order; empty when discovered from uploads.
    pub vocabulary: Vec<String>,
    /// Upload requirements.
    pub requirements: Vec<String>,
    /// Whether the forecasting service covers the category.
    pub forecast: bool,
}

impl From<&CategoryDefinition> for ApiCategory {
    fn from(def: &CategoryDefinition) -> Self {
        Self {
            id: def.id,
            label: def.label.clone(),
            description: def.description.clone(),
            identifier_column: def.identifier_column.clone(),
            layout: def.layout,
            start_year: def.start_year,
            end_year: def.end_year,
            period_length: def.period_length,
            vocabulary: def.vocabulary.clone(),
            requirements: def.requirements.clone(),
            forecast: def.is_forecast(),
        }
    }
}

/// Query parameters for `GET /api/categories/{id}`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CategoryQueryParams {
    /// `all` (default) or a single year.
    pub year: Option<String>,
}

/// Query parameters for `POST /api/categories/{id}/upload`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UploadQueryParams {
    /// Reject uploads with non-numeric cells instead of reading them as 0.
    #[serde(default)]
    pub strict: bool,
}

/// Body of the record write endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiRecordInput {
    /// Year of the record. Taken from the path on `PUT`.
    pub year: Option<i32>,
    /// Field name to count.
    pub fields: BTreeMap<String, i64>,
}

impl ApiRecordInput {
    /// Converts into a record for `year`.
    #[must_use]
    pub fn into_record(self, year: i32) -> YearRecord {
        YearRecord {
            year,
            fields: self.fields,
        }
    }
}

/// Response of an upload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiUploadResult {
    /// Summary for the uploader.
    pub message: String,
    /// Number of year records written.
    pub years_written: usize,
    /// First year written.
    pub first_year: Option<i32>,
    /// Last year written.
    pub last_year: Option<i32>,
}

/// Response of a delete.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiDeleteResult {
    /// Number of records removed.
    pub deleted: usize,
}

/// Body of `POST /api/predictions`.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiPredictRequest {
    /// Forecast horizon in years; defaults to 5.
    pub years_ahead: Option<u32>,
}

/// Response of `GET /api/predictions/health`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiPredictionHealth {
    /// Whether the forecasting service answered.
    pub healthy: bool,
}
