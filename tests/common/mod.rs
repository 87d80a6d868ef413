#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use chrono::{Duration, Utc};
use job_portal::{
    AppConfig, AppState, create_router,
    auth::issue_token,
    models::{
        Application, ApplicationCount, ApplicationDetail, Company, Listing, NewListing,
        UpdateListingRequest, User,
    },
    repository::{RepoResult, Repository},
};
use serde_json::Value;
use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};
use tower::ServiceExt;
use uuid::Uuid;

// --- In-memory Repository ---

/// Repository backed by vectors behind mutexes. Mirrors the Postgres constraints the
/// handlers rely on: the (applicant, listing) uniqueness and cascade on listing delete.
#[derive(Default)]
pub struct InMemoryRepository {
    pub users: Mutex<Vec<User>>,
    pub companies: Mutex<Vec<Company>>,
    pub listings: Mutex<Vec<Listing>>,
    pub applications: Mutex<Vec<Application>>,
    pub offers: Mutex<HashMap<Uuid, i64>>,
    /// When set, every call fails like a dropped database connection.
    pub fail: bool,
}

impl InMemoryRepository {
    fn check(&self) -> RepoResult<()> {
        if self.fail {
            Err(sqlx::Error::PoolTimedOut)
        } else {
            Ok(())
        }
    }

    pub fn application_count(&self) -> usize {
        self.applications.lock().unwrap().len()
    }

    pub fn add_offer(&self, application_id: Uuid) {
        *self.offers.lock().unwrap().entry(application_id).or_insert(0) += 1;
    }
}

#[async_trait]
impl Repository for InMemoryRepository {
    async fn get_user(&self, id: Uuid) -> RepoResult<Option<User>> {
        self.check()?;
        Ok(self.users.lock().unwrap().iter().find(|u| u.id == id).cloned())
    }

    async fn get_company(&self, id: Uuid) -> RepoResult<Option<Company>> {
        self.check()?;
        Ok(self.companies.lock().unwrap().iter().find(|c| c.id == id).cloned())
    }

    async fn get_listings(&self) -> RepoResult<Vec<Listing>> {
        self.check()?;
        Ok(self.listings.lock().unwrap().clone())
    }

    async fn get_listing(&self, id: Uuid) -> RepoResult<Option<Listing>> {
        self.check()?;
        Ok(self.listings.lock().unwrap().iter().find(|l| l.id == id).cloned())
    }

    async fn create_listing(&self, company_id: Uuid, listing: NewListing) -> RepoResult<Listing> {
        self.check()?;
        let now = Utc::now();
        let created = Listing {
            id: Uuid::new_v4(),
            title: listing.title,
            tags: listing.tags,
            description: listing.description,
            requirements: listing.requirements,
            deadline: listing.deadline,
            company_id,
            created: now,
            updated: now,
        };
        self.listings.lock().unwrap().push(created.clone());
        Ok(created)
    }

    async fn update_listing(&self, id: Uuid, req: UpdateListingRequest) -> RepoResult<Option<Listing>> {
        self.check()?;
        let mut listings = self.listings.lock().unwrap();
        let Some(listing) = listings.iter_mut().find(|l| l.id == id) else {
            return Ok(None);
        };
        if let Some(title) = req.title {
            listing.title = title;
        }
        if let Some(tags) = req.tags {
            listing.tags = tags;
        }
        if let Some(description) = req.description {
            listing.description = description;
        }
        if let Some(requirements) = req.requirements {
            listing.requirements = requirements;
        }
        if let Some(deadline) = req.deadline {
            listing.deadline = deadline;
        }
        listing.updated = Utc::now();
        Ok(Some(listing.clone()))
    }

    async fn delete_listing(&self, id: Uuid) -> RepoResult<bool> {
        self.check()?;
        let mut listings = self.listings.lock().unwrap();
        let before = listings.len();
        listings.retain(|l| l.id != id);
        let removed = listings.len() < before;
        if removed {
            self.applications.lock().unwrap().retain(|a| a.listing_id != id);
        }
        Ok(removed)
    }

    async fn create_application(
        &self,
        applicant_id: Uuid,
        listing_id: Uuid,
        company_id: Uuid,
        cover_letter: String,
    ) -> RepoResult<Option<Application>> {
        self.check()?;
        let mut applications = self.applications.lock().unwrap();
        if applications
            .iter()
            .any(|a| a.applicant_id == applicant_id && a.listing_id == listing_id)
        {
            return Ok(None);
        }
        let now = Utc::now();
        let application = Application {
            id: Uuid::new_v4(),
            applicant_id,
            listing_id,
            company_id,
            cover_letter,
            created: now,
            updated: now,
        };
        applications.push(application.clone());
        Ok(Some(application))
    }

    async fn get_applications_for_user(&self, user_id: Uuid) -> RepoResult<Vec<Application>> {
        self.check()?;
        let owned_companies: Vec<Uuid> = self
            .companies
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.client_id == user_id)
            .map(|c| c.id)
            .collect();
        Ok(self
            .applications
            .lock()
            .unwrap()
            .iter()
            .filter(|a| a.applicant_id == user_id || owned_companies.contains(&a.company_id))
            .cloned()
            .collect())
    }

    async fn get_application(&self, id: Uuid) -> RepoResult<Option<ApplicationDetail>> {
        self.check()?;
        let offers = self.offers.lock().unwrap().get(&id).copied().unwrap_or(0);
        Ok(self
            .applications
            .lock()
            .unwrap()
            .iter()
            .find(|a| a.id == id)
            .cloned()
            .map(|application| ApplicationDetail {
                application,
                count: ApplicationCount { offers },
            }))
    }

    async fn update_cover_letter(&self, id: Uuid, cover_letter: String) -> RepoResult<Option<Application>> {
        self.check()?;
        let mut applications = self.applications.lock().unwrap();
        Ok(applications.iter_mut().find(|a| a.id == id).map(|a| {
            a.cover_letter = cover_letter;
            a.updated = Utc::now();
            a.clone()
        }))
    }

    async fn delete_application(&self, id: Uuid) -> RepoResult<bool> {
        self.check()?;
        let mut applications = self.applications.lock().unwrap();
        let before = applications.len();
        applications.retain(|a| a.id != id);
        Ok(applications.len() < before)
    }
}

// --- Fixtures ---

pub fn user(email: &str, role: &str) -> User {
    User {
        id: Uuid::new_v4(),
        email: email.to_string(),
        first_name: email.split('@').next().unwrap_or_default().to_string(),
        last_name: "test".to_string(),
        role: role.to_string(),
    }
}

/// The seeded world every test starts from: two applicants, one client owning a company
/// with one open listing.
pub struct Seed {
    pub applicant: User,
    pub second_applicant: User,
    pub client: User,
    pub company: Company,
    pub listing: Listing,
}

impl Seed {
    pub fn new() -> Self {
        let client = user("clientTestUser@email.com", "Client");
        let company = Company {
            id: Uuid::new_v4(),
            name: "Test company".to_string(),
            client_id: client.id,
        };
        let now = Utc::now();
        let listing = Listing {
            id: Uuid::new_v4(),
            title: "Test listing".to_string(),
            tags: "test, listing".to_string(),
            description: "listing test".to_string(),
            requirements: "t, e, s, t".to_string(),
            deadline: now + Duration::days(30),
            company_id: company.id,
            created: now,
            updated: now,
        };
        Seed {
            applicant: user("applicantTestUser@email.com", "Applicant"),
            second_applicant: user("secondUserTest@email.com", "Applicant"),
            client,
            company,
            listing,
        }
    }

    pub fn repository(&self) -> InMemoryRepository {
        let repo = InMemoryRepository::default();
        repo.users.lock().unwrap().extend([
            self.applicant.clone(),
            self.second_applicant.clone(),
            self.client.clone(),
        ]);
        repo.companies.lock().unwrap().push(self.company.clone());
        repo.listings.lock().unwrap().push(self.listing.clone());
        repo
    }

    pub fn token_for(&self, user: &User) -> String {
        token(user)
    }

    /// The canonical valid creation payload for the applicant.
    pub fn application_body(&self) -> Value {
        serde_json::json!({
            "applicantId": self.applicant.id,
            "listingId": self.listing.id,
            "companyId": self.company.id,
            "coverLetter": "testing letter",
        })
    }
}

pub fn token(user: &User) -> String {
    issue_token(user.id, &user.email, &AppConfig::default().jwt_secret).unwrap()
}

pub fn app(repo: Arc<InMemoryRepository>) -> Router {
    create_router(AppState {
        repo,
        config: AppConfig::default(),
    })
}

// --- Request Helpers ---

pub struct TestResponse {
    pub status: StatusCode,
    pub content_type: Option<String>,
    pub body: Value,
}

/// Sends one request through the router. The body is parsed as JSON when possible, and
/// kept as a JSON string otherwise.
pub async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> TestResponse {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = serde_json::from_slice(&bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));

    TestResponse {
        status,
        content_type,
        body,
    }
}
