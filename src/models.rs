use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;

// --- Core Application Schemas (Mapped to Database) ---

/// User
///
/// Represents a row of the `users` table. Applicants and clients share this table and are
/// told apart by `role` ("Client" owns companies). The password hash is never selected.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: String,
}

/// Company
///
/// A company record from the `companies` table, owned by a Client user.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Company {
    pub id: Uuid,
    pub name: String,
    // FK to users.id (the owning Client).
    pub client_id: Uuid,
}

/// Listing
///
/// A job posting from the `listings` table. Belongs to exactly one company.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Listing {
    pub id: Uuid,
    pub title: String,
    // Comma separated, e.g. "rust, backend, remote".
    pub tags: String,
    pub description: String,
    pub requirements: String,
    #[ts(type = "string")]
    pub deadline: DateTime<Utc>,
    pub company_id: Uuid,
    #[ts(type = "string")]
    pub created: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated: DateTime<Utc>,
}

/// Application
///
/// A row of the `applications` table. `company_id` is denormalized from the listing so
/// clients can query applications to their companies without a join.
///
/// The pair (`applicant_id`, `listing_id`) is unique at the database level.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Application {
    pub id: Uuid,
    pub applicant_id: Uuid,
    pub listing_id: Uuid,
    pub company_id: Uuid,
    pub cover_letter: String,
    #[ts(type = "string")]
    pub created: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated: DateTime<Utc>,
}

/// ApplicationCount
///
/// Aggregated relation counts attached to a single application read.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default, PartialEq)]
#[ts(export)]
pub struct ApplicationCount {
    pub offers: i64,
}

/// ApplicationDetail
///
/// Output schema for `GET /applications/{id}`: the application plus its `_count` object.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default, PartialEq)]
#[ts(export)]
pub struct ApplicationDetail {
    #[serde(flatten)]
    pub application: Application,
    #[serde(rename = "_count")]
    pub count: ApplicationCount,
}

/// UpdatedApplication
///
/// Output schema for `PUT /applications/{id}`: the updated row with a confirmation text.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UpdatedApplication {
    #[serde(flatten)]
    pub application: Application,
    pub response: String,
}

// --- Request Payloads (Input Schemas) ---

/// CreateApplicationRequest
///
/// Input payload for `POST /applications`. Every field is optional at the serde level so a
/// missing field surfaces as a 400 with a readable message instead of an extractor
/// rejection. Unknown fields are rejected.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
#[ts(export)]
pub struct CreateApplicationRequest {
    pub applicant_id: Option<String>,
    pub listing_id: Option<String>,
    pub company_id: Option<String>,
    pub cover_letter: Option<String>,
}

/// NewApplication
///
/// A validated `CreateApplicationRequest`, ready for insertion.
#[derive(Debug, Clone, PartialEq)]
pub struct NewApplication {
    pub applicant_id: String,
    pub listing_id: String,
    pub company_id: String,
    pub cover_letter: String,
}

impl CreateApplicationRequest {
    /// Returns the names of required fields that are absent or blank.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        [
            ("applicantId", &self.applicant_id),
            ("listingId", &self.listing_id),
            ("companyId", &self.company_id),
            ("coverLetter", &self.cover_letter),
        ]
        .into_iter()
        .filter(|(_, value)| value.as_deref().is_none_or(|v| v.trim().is_empty()))
        .map(|(name, _)| name)
        .collect()
    }

    /// Converts into a `NewApplication`, or returns the missing field names.
    pub fn validate(self) -> Result<NewApplication, Vec<&'static str>> {
        let missing = self.missing_fields();
        match (self.applicant_id, self.listing_id, self.company_id, self.cover_letter) {
            (Some(applicant_id), Some(listing_id), Some(company_id), Some(cover_letter))
                if missing.is_empty() =>
            {
                Ok(NewApplication {
                    applicant_id,
                    listing_id,
                    company_id,
                    cover_letter,
                })
            }
            _ => Err(missing),
        }
    }
}

/// UpdateApplicationRequest
///
/// Input payload for `PUT /applications/{id}`. Only the cover letter is mutable; any other
/// fields the client echoes back (ids, timestamps) are ignored.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct UpdateApplicationRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_letter: Option<String>,
}

impl UpdateApplicationRequest {
    /// The cover letter, if present and not blank.
    pub fn cover_letter(&self) -> Option<&str> {
        self.cover_letter
            .as_deref()
            .filter(|letter| !letter.trim().is_empty())
    }
}

/// CreateListingRequest
///
/// Input payload for `POST /listings`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
#[ts(export)]
pub struct CreateListingRequest {
    pub title: Option<String>,
    pub tags: Option<String>,
    pub description: Option<String>,
    pub requirements: Option<String>,
    #[ts(type = "string | null")]
    pub deadline: Option<DateTime<Utc>>,
    pub company_id: Option<String>,
}

/// NewListing
///
/// A validated `CreateListingRequest`. The owning company is passed separately once the
/// handler has resolved it.
#[derive(Debug, Clone, PartialEq)]
pub struct NewListing {
    pub title: String,
    pub tags: String,
    pub description: String,
    pub requirements: String,
    pub deadline: DateTime<Utc>,
}

impl CreateListingRequest {
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing: Vec<&'static str> = [
            ("title", &self.title),
            ("tags", &self.tags),
            ("description", &self.description),
            ("requirements", &self.requirements),
            ("companyId", &self.company_id),
        ]
        .into_iter()
        .filter(|(_, value)| value.as_deref().is_none_or(|v| v.trim().is_empty()))
        .map(|(name, _)| name)
        .collect();

        if self.deadline.is_none() {
            missing.push("deadline");
        }
        missing
    }

    /// Splits into the raw company id and the listing fields, or returns the missing names.
    pub fn validate(self) -> Result<(String, NewListing), Vec<&'static str>> {
        let missing = self.missing_fields();
        match (
            self.company_id,
            self.title,
            self.tags,
            self.description,
            self.requirements,
            self.deadline,
        ) {
            (
                Some(company_id),
                Some(title),
                Some(tags),
                Some(description),
                Some(requirements),
                Some(deadline),
            ) if missing.is_empty() => Ok((
                company_id,
                NewListing {
                    title,
                    tags,
                    description,
                    requirements,
                    deadline,
                },
            )),
            _ => Err(missing),
        }
    }
}

/// UpdateListingRequest
///
/// Partial update payload for `PUT /listings/{id}`. Absent fields keep their stored value
/// (the repository applies them with `COALESCE`).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
#[ts(export)]
pub struct UpdateListingRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub requirements: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[ts(type = "string | null")]
    pub deadline: Option<DateTime<Utc>>,
}
