use crate::models::{
    Application, ApplicationCount, ApplicationDetail, Company, Listing, NewListing,
    UpdateListingRequest, User,
};
use async_trait::async_trait;
use sqlx::{FromRow, PgPool};
use std::sync::Arc;
use uuid::Uuid;

/// Result of every persistence call. Errors are surfaced to the handler, which maps them
/// to a 500.
pub type RepoResult<T> = Result<T, sqlx::Error>;

/// Repository Trait
///
/// The persistence contract the handlers are written against. `Send + Sync` plus
/// `async_trait` make `Arc<dyn Repository>` shareable across Axum's tasks, and let tests
/// swap in an in-memory implementation.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Users & Companies ---
    async fn get_user(&self, id: Uuid) -> RepoResult<Option<User>>;
    async fn get_company(&self, id: Uuid) -> RepoResult<Option<Company>>;

    // --- Listings ---
    async fn get_listings(&self) -> RepoResult<Vec<Listing>>;
    async fn get_listing(&self, id: Uuid) -> RepoResult<Option<Listing>>;
    async fn create_listing(&self, company_id: Uuid, listing: NewListing) -> RepoResult<Listing>;
    // Applies only the fields that are `Some`.
    async fn update_listing(&self, id: Uuid, req: UpdateListingRequest) -> RepoResult<Option<Listing>>;
    async fn delete_listing(&self, id: Uuid) -> RepoResult<bool>;

    // --- Applications ---
    /// Inserts the application. Returns `None` when the (applicant, listing) pair already
    /// exists; the unique index decides, not a prior lookup.
    async fn create_application(
        &self,
        applicant_id: Uuid,
        listing_id: Uuid,
        company_id: Uuid,
        cover_letter: String,
    ) -> RepoResult<Option<Application>>;
    /// Applications the user submitted, or received through one of their companies.
    async fn get_applications_for_user(&self, user_id: Uuid) -> RepoResult<Vec<Application>>;
    async fn get_application(&self, id: Uuid) -> RepoResult<Option<ApplicationDetail>>;
    async fn update_cover_letter(&self, id: Uuid, cover_letter: String) -> RepoResult<Option<Application>>;
    async fn delete_application(&self, id: Uuid) -> RepoResult<bool>;
}

/// RepositoryState
///
/// The shared handle to the persistence layer stored in `AppState`.
pub type RepositoryState = Arc<dyn Repository>;

/// PostgresRepository
///
/// `Repository` backed by PostgreSQL through a sqlx connection pool.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const LISTING_COLUMNS: &str =
    "id, title, tags, description, requirements, deadline, company_id, created, updated";

const APPLICATION_COLUMNS: &str =
    "id, applicant_id, listing_id, company_id, cover_letter, created, updated";

// Row shape for the single-application read, which carries the offer count.
#[derive(FromRow)]
struct ApplicationWithCountRow {
    #[sqlx(flatten)]
    application: Application,
    offer_count: i64,
}

impl From<ApplicationWithCountRow> for ApplicationDetail {
    fn from(row: ApplicationWithCountRow) -> Self {
        ApplicationDetail {
            application: row.application,
            count: ApplicationCount {
                offers: row.offer_count,
            },
        }
    }
}

#[async_trait]
impl Repository for PostgresRepository {
    async fn get_user(&self, id: Uuid) -> RepoResult<Option<User>> {
        sqlx::query_as::<_, User>(
            "SELECT id, email, first_name, last_name, role FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn get_company(&self, id: Uuid) -> RepoResult<Option<Company>> {
        sqlx::query_as::<_, Company>("SELECT id, name, client_id FROM companies WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    async fn get_listings(&self) -> RepoResult<Vec<Listing>> {
        let query = format!("SELECT {LISTING_COLUMNS} FROM listings ORDER BY created DESC");
        sqlx::query_as::<_, Listing>(&query)
            .fetch_all(&self.pool)
            .await
    }

    async fn get_listing(&self, id: Uuid) -> RepoResult<Option<Listing>> {
        let query = format!("SELECT {LISTING_COLUMNS} FROM listings WHERE id = $1");
        sqlx::query_as::<_, Listing>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    async fn create_listing(&self, company_id: Uuid, listing: NewListing) -> RepoResult<Listing> {
        let query = format!(
            r#"
            INSERT INTO listings (id, title, tags, description, requirements, deadline, company_id, created, updated)
            VALUES ($1, $2, $3, $4, $5, $6, $7, NOW(), NOW())
            RETURNING {LISTING_COLUMNS}
            "#
        );
        sqlx::query_as::<_, Listing>(&query)
            .bind(Uuid::new_v4())
            .bind(listing.title)
            .bind(listing.tags)
            .bind(listing.description)
            .bind(listing.requirements)
            .bind(listing.deadline)
            .bind(company_id)
            .fetch_one(&self.pool)
            .await
    }

    /// Partial update: `COALESCE` keeps the stored value for every `None` field.
    async fn update_listing(&self, id: Uuid, req: UpdateListingRequest) -> RepoResult<Option<Listing>> {
        let query = format!(
            r#"
            UPDATE listings
            SET title = COALESCE($2, title),
                tags = COALESCE($3, tags),
                description = COALESCE($4, description),
                requirements = COALESCE($5, requirements),
                deadline = COALESCE($6, deadline),
                updated = NOW()
            WHERE id = $1
            RETURNING {LISTING_COLUMNS}
            "#
        );
        sqlx::query_as::<_, Listing>(&query)
            .bind(id)
            .bind(req.title)
            .bind(req.tags)
            .bind(req.description)
            .bind(req.requirements)
            .bind(req.deadline)
            .fetch_optional(&self.pool)
            .await
    }

    async fn delete_listing(&self, id: Uuid) -> RepoResult<bool> {
        let result = sqlx::query("DELETE FROM listings WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// `ON CONFLICT DO NOTHING` against `applications_applicant_listing_key` makes two
    /// concurrent identical submissions produce exactly one row; the loser gets `None`.
    async fn create_application(
        &self,
        applicant_id: Uuid,
        listing_id: Uuid,
        company_id: Uuid,
        cover_letter: String,
    ) -> RepoResult<Option<Application>> {
        let query = format!(
            r#"
            INSERT INTO applications (id, applicant_id, listing_id, company_id, cover_letter, created, updated)
            VALUES ($1, $2, $3, $4, $5, NOW(), NOW())
            ON CONFLICT (applicant_id, listing_id) DO NOTHING
            RETURNING {APPLICATION_COLUMNS}
            "#
        );
        sqlx::query_as::<_, Application>(&query)
            .bind(Uuid::new_v4())
            .bind(applicant_id)
            .bind(listing_id)
            .bind(company_id)
            .bind(cover_letter)
            .fetch_optional(&self.pool)
            .await
    }

    async fn get_applications_for_user(&self, user_id: Uuid) -> RepoResult<Vec<Application>> {
        sqlx::query_as::<_, Application>(
            r#"
            SELECT a.id, a.applicant_id, a.listing_id, a.company_id, a.cover_letter, a.created, a.updated
            FROM applications a
            JOIN companies c ON c.id = a.company_id
            WHERE a.applicant_id = $1 OR c.client_id = $1
            ORDER BY a.created DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
    }

    async fn get_application(&self, id: Uuid) -> RepoResult<Option<ApplicationDetail>> {
        let row = sqlx::query_as::<_, ApplicationWithCountRow>(
            r#"
            SELECT a.id, a.applicant_id, a.listing_id, a.company_id, a.cover_letter, a.created, a.updated,
                   (SELECT COUNT(*) FROM offers o WHERE o.application_id = a.id) AS offer_count
            FROM applications a
            WHERE a.id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(ApplicationDetail::from))
    }

    async fn update_cover_letter(&self, id: Uuid, cover_letter: String) -> RepoResult<Option<Application>> {
        let query = format!(
            r#"
            UPDATE applications
            SET cover_letter = $2, updated = NOW()
            WHERE id = $1
            RETURNING {APPLICATION_COLUMNS}
            "#
        );
        sqlx::query_as::<_, Application>(&query)
            .bind(id)
            .bind(cover_letter)
            .fetch_optional(&self.pool)
            .await
    }

    async fn delete_application(&self, id: Uuid) -> RepoResult<bool> {
        let result = sqlx::query("DELETE FROM applications WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
