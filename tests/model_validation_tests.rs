use chrono::Utc;
use job_portal::models::{
    Application, ApplicationCount, ApplicationDetail, CreateApplicationRequest,
    CreateListingRequest, UpdateApplicationRequest, UpdateListingRequest, UpdatedApplication,
};
use serde_json::json;
use uuid::Uuid;

fn application() -> Application {
    let now = Utc::now();
    Application {
        id: Uuid::new_v4(),
        applicant_id: Uuid::new_v4(),
        listing_id: Uuid::new_v4(),
        company_id: Uuid::new_v4(),
        cover_letter: "testing letter".to_string(),
        created: now,
        updated: now,
    }
}

// --- Serialization Shapes ---

#[test]
fn test_application_serializes_camel_case() {
    let value = serde_json::to_value(application()).unwrap();
    for key in ["id", "applicantId", "listingId", "companyId", "coverLetter", "created", "updated"] {
        assert!(value.get(key).is_some(), "missing key {key}");
    }
    assert!(value.get("cover_letter").is_none());
}

#[test]
fn test_application_detail_exposes_count_object() {
    let detail = ApplicationDetail {
        application: application(),
        count: ApplicationCount { offers: 2 },
    };
    let value = serde_json::to_value(&detail).unwrap();

    assert_eq!(value["_count"], json!({ "offers": 2 }));
    assert_eq!(value["coverLetter"], "testing letter");
    assert!(value.get("application").is_none(), "application must be flattened");
}

#[test]
fn test_updated_application_carries_response_text() {
    let updated = UpdatedApplication {
        application: application(),
        response: "Your Application is updated successfully".to_string(),
    };
    let value = serde_json::to_value(&updated).unwrap();

    assert_eq!(value["response"], "Your Application is updated successfully");
    assert!(value["id"].is_string());
}

// --- Create Application Validation ---

#[test]
fn test_create_application_missing_fields_lists_names() {
    let req: CreateApplicationRequest =
        serde_json::from_value(json!({ "listingId": "abc", "coverLetter": "   " })).unwrap();

    assert_eq!(req.missing_fields(), vec!["applicantId", "companyId", "coverLetter"]);
    assert_eq!(req.validate().unwrap_err().len(), 3);
}

#[test]
fn test_create_application_validate_success() {
    let req: CreateApplicationRequest = serde_json::from_value(json!({
        "applicantId": "a",
        "listingId": "l",
        "companyId": "c",
        "coverLetter": "letter",
    }))
    .unwrap();

    let new = req.validate().unwrap();
    assert_eq!(new.applicant_id, "a");
    assert_eq!(new.cover_letter, "letter");
}

#[test]
fn test_create_application_rejects_unknown_fields() {
    let result = serde_json::from_value::<CreateApplicationRequest>(json!({
        "applicant": "a",
        "listingId": "l",
    }));
    assert!(result.is_err());
}

// --- Update Application ---

#[test]
fn test_update_application_ignores_echoed_fields() {
    let mut echoed = serde_json::to_value(application()).unwrap();
    echoed["coverLetter"] = json!("new letter");

    let req: UpdateApplicationRequest = serde_json::from_value(echoed).unwrap();
    assert_eq!(req.cover_letter(), Some("new letter"));
}

#[test]
fn test_update_application_blank_cover_letter_is_absent() {
    let req: UpdateApplicationRequest =
        serde_json::from_value(json!({ "coverLetter": " \n " })).unwrap();
    assert_eq!(req.cover_letter(), None);
    assert_eq!(UpdateApplicationRequest::default().cover_letter(), None);
}

// --- Listings ---

#[test]
fn test_create_listing_requires_every_field() {
    let req: CreateListingRequest =
        serde_json::from_value(json!({ "title": "Rust engineer", "tags": "" })).unwrap();

    assert_eq!(
        req.missing_fields(),
        vec!["tags", "description", "requirements", "companyId", "deadline"]
    );
}

#[test]
fn test_create_listing_validate_splits_company() {
    let company_id = Uuid::new_v4().to_string();
    let req: CreateListingRequest = serde_json::from_value(json!({
        "title": "Rust engineer",
        "tags": "rust",
        "description": "APIs",
        "requirements": "axum",
        "deadline": "2030-11-30T20:55:00Z",
        "companyId": company_id,
    }))
    .unwrap();

    let (company, listing) = req.validate().unwrap();
    assert_eq!(company, company_id);
    assert_eq!(listing.title, "Rust engineer");
    assert_eq!(listing.deadline.to_rfc3339(), "2030-11-30T20:55:00+00:00");
}

#[test]
fn test_update_listing_is_partial_and_strict() {
    let req: UpdateListingRequest = serde_json::from_value(json!({ "title": "New" })).unwrap();
    assert_eq!(req.title.as_deref(), Some("New"));
    assert!(req.deadline.is_none());

    // Unknown keys are rejected, the company of a listing cannot be moved.
    assert!(serde_json::from_value::<UpdateListingRequest>(json!({ "companyId": "x" })).is_err());
}
