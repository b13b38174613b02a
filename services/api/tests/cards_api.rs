mod common;

use std::sync::Arc;

use async_trait::async_trait;
use axum::http::{header, StatusCode};
use card_catalog_core::{Card, CardDetails, CardStore, PortError, PortResult};
use common::*;
use serde_json::json;
use uuid::Uuid;

async fn create(app: &axum::Router, cookie: &str, form: serde_json::Value) -> Uuid {
    let response = send(app, json("POST", "/admin/cards", Some(cookie), &form)).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    body["id"].as_str().unwrap().parse().unwrap()
}

// ----------------------------------------------------------------------------
// Test: add, edit and delete a card through the admin routes
// ----------------------------------------------------------------------------

#[tokio::test]
async fn card_lifecycle_through_the_admin_routes() {
    let app = build_test_app();
    let cookie = unlock(&app).await;

    let listing = body_json(send(&app, get("/cards", None)).await).await;
    assert_eq!(listing["status"], "empty");

    let mut form = card_form("Ken Griffey Jr.", 1989, "Baseball");
    form["card_number"] = json!("1");
    form["is_graded"] = json!(true);
    form["grading_company"] = json!("PSA");
    form["grade"] = json!("10");
    form["value_unknown"] = json!(false);
    form["estimated_value"] = json!(2500.0);
    let id = create(&app, &cookie, form).await;

    let listing = body_json(send(&app, get("/cards", None)).await).await;
    assert_eq!(listing["status"], "ready");
    assert_eq!(listing["total"], 1);
    let row = &listing["rows"][0];
    assert_eq!(row["id"], id.to_string());
    assert_eq!(row["grade"], "PSA 10");
    assert_eq!(row["estimated_value"], "$2500.00");
    assert_eq!(row["purchase_price"], "Unknown");

    // The edit form comes back pre-populated.
    let response = send(&app, get(&format!("/admin/cards/{id}/edit"), Some(&cookie))).await;
    assert_eq!(response.status(), StatusCode::OK);
    let edit = body_json(response).await;
    assert_eq!(edit["mode"]["mode"], "edit");
    assert_eq!(edit["values"]["player"], "Ken Griffey Jr.");
    assert_eq!(edit["visibility"]["grading"], true);

    // Replace it with an ungraded copy.
    let mut replacement = card_form("Ken Griffey Jr.", 1989, "Baseball");
    replacement["quantity"] = json!(3);
    let response = send(
        &app,
        json("PUT", &format!("/admin/cards/{id}"), Some(&cookie), &replacement),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let listing = body_json(send(&app, get("/cards", None)).await).await;
    assert_eq!(listing["rows"][0]["grade"], "Ungraded");
    assert_eq!(listing["rows"][0]["quantity"], 3);
    assert_eq!(listing["rows"][0]["estimated_value"], "Unknown");

    let response = send(&app, empty("DELETE", &format!("/admin/cards/{id}"), Some(&cookie))).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let listing = body_json(send(&app, get("/cards", None)).await).await;
    assert_eq!(listing["status"], "empty");
}

// ----------------------------------------------------------------------------
// Test: invalid forms and missing cards
// ----------------------------------------------------------------------------

#[tokio::test]
async fn invalid_forms_are_rejected_with_a_validation_panel() {
    let app = build_test_app();
    let cookie = unlock(&app).await;

    let mut graded_without_grade = card_form("Tom Brady", 2000, "Football");
    graded_without_grade["is_graded"] = json!(true);
    graded_without_grade["grading_company"] = json!("BGS");

    let mut zero_quantity = card_form("Tom Brady", 2000, "Football");
    zero_quantity["quantity"] = json!(0);

    let mut huge_quantity = card_form("Tom Brady", 2000, "Football");
    huge_quantity["quantity"] = json!(3_000_000_000u32);

    let mut huge_print_run = card_form("Tom Brady", 2000, "Football");
    huge_print_run["is_numbered"] = json!(true);
    huge_print_run["print_run"] = json!(4_000_000_000u32);

    for form in [
        card_form("", 2000, "Football"),
        json!({ "player": "Tom Brady", "sport": "Football" }),
        graded_without_grade,
        zero_quantity,
        huge_quantity,
        huge_print_run,
    ] {
        let response = send(&app, json("POST", "/admin/cards", Some(&cookie), &form)).await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY, "{form}");
        let body = body_json(response).await;
        assert_eq!(body["code"], "VALIDATION");
    }

    let listing = body_json(send(&app, get("/cards", None)).await).await;
    assert_eq!(listing["total"], 0);
}

#[tokio::test]
async fn missing_cards_are_not_found() {
    let app = build_test_app();
    let cookie = unlock(&app).await;
    let id = Uuid::new_v4();

    let response = send(&app, get(&format!("/admin/cards/{id}/edit"), Some(&cookie))).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = send(
        &app,
        json("PUT", &format!("/admin/cards/{id}"), Some(&cookie), &card_form("A", 2000, "B")),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = send(&app, empty("DELETE", &format!("/admin/cards/{id}"), Some(&cookie))).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_json(response).await;
    assert_eq!(body["code"], "NOT_FOUND");
    assert_eq!(body["retryable"], false);
}

// ----------------------------------------------------------------------------
// Test: query-string filters, sorting and paging
// ----------------------------------------------------------------------------

#[tokio::test]
async fn listing_applies_filter_sort_and_page_from_the_query() {
    let app = build_test_app();
    let cookie = unlock(&app).await;

    for i in 0..60 {
        create(&app, &cookie, card_form(&format!("Batter {i}"), 1950 + i, "Baseball")).await;
    }
    create(&app, &cookie, card_form("Lionel Messi", 2004, "Soccer")).await;

    let listing = body_json(send(&app, get("/cards?sport=baseball&sort=year&dir=desc", None)).await).await;
    assert_eq!(listing["matching"], 60);
    assert_eq!(listing["total"], 61);
    assert_eq!(listing["page_count"], 2);
    assert_eq!(listing["rows"].as_array().unwrap().len(), 50);
    assert_eq!(listing["rows"][0]["year"], 2009);

    let page_two =
        body_json(send(&app, get("/cards?sport=baseball&sort=year&dir=desc&page=2", None)).await).await;
    assert_eq!(page_two["page"], 2);
    let rows = page_two["rows"].as_array().unwrap();
    assert_eq!(rows.len(), 10);
    assert_eq!(rows[9]["year"], 1950);

    // Empty parameters are inactive, and a page past the end is clamped.
    let clamped = body_json(send(&app, get("/cards?player=&page=99", None)).await).await;
    assert_eq!(clamped["matching"], 61);
    assert_eq!(clamped["page"], 2);

    let none = body_json(send(&app, get("/cards?player=zzz", None)).await).await;
    assert_eq!(none["status"], "no_results");
    assert_eq!(none["page_count"], 1);
}

#[tokio::test]
async fn malformed_query_values_are_a_bad_request() {
    let app = build_test_app();
    let response = send(&app, get("/cards?year_min=nineteen", None)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let response = send(&app, get("/cards?sort=shoe_size", None)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// ----------------------------------------------------------------------------
// Test: dashboard aggregates over the filtered collection
// ----------------------------------------------------------------------------

#[tokio::test]
async fn dashboard_summarises_the_collection() {
    let app = build_test_app();
    let cookie = unlock(&app).await;

    let mut valued = card_form("Shohei Ohtani", 2018, "Baseball");
    valued["value_unknown"] = json!(false);
    valued["estimated_value"] = json!(100.0);
    valued["quantity"] = json!(2);
    create(&app, &cookie, valued).await;
    create(&app, &cookie, card_form("Connor McDavid", 2015, "Hockey")).await;
    create(&app, &cookie, card_form("Aaron Judge", 2017, "baseball")).await;

    let dashboard = body_json(send(&app, get("/dashboard", None)).await).await;
    assert_eq!(dashboard["record_count"], 3);
    assert_eq!(dashboard["total_quantity"], 4);
    assert_eq!(dashboard["total_estimated_value"], 200.0);
    assert_eq!(dashboard["unknown_value_count"], 2);
    assert_eq!(dashboard["by_sport"][0]["records"], 2);
    assert_eq!(dashboard["top_cards"][0]["player"], "Shohei Ohtani");
    assert!(dashboard["last_export"].is_null());

    let hockey = body_json(send(&app, get("/dashboard?sport=hockey", None)).await).await;
    assert_eq!(hockey["record_count"], 1);
}

// ----------------------------------------------------------------------------
// Test: export then import through the HTTP surface
// ----------------------------------------------------------------------------

#[tokio::test]
async fn export_downloads_csv_and_is_recorded_on_the_dashboard() {
    let app = build_test_app();
    let cookie = unlock(&app).await;
    create(&app, &cookie, card_form("Michael Jordan", 1986, "Basketball")).await;

    let response = send(&app, get("/cards/export", None)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response.headers()[header::CONTENT_TYPE].to_str().unwrap().to_string();
    assert!(content_type.starts_with("text/csv"));
    let disposition = response.headers()[header::CONTENT_DISPOSITION]
        .to_str()
        .unwrap()
        .to_string();
    assert!(disposition.contains("card-collection-"));
    assert!(disposition.ends_with(".csv\""));

    let body = body_text(response).await;
    let mut lines = body.lines();
    assert!(lines.next().unwrap().starts_with("Player,Year,Sport,Card Number"));
    assert!(lines.next().unwrap().starts_with("Michael Jordan,1986,Basketball"));

    let dashboard = body_json(send(&app, get("/dashboard", None)).await).await;
    assert!(dashboard["last_export"].is_string());
}

#[tokio::test]
async fn import_inserts_good_rows_and_reports_bad_ones() {
    let app = build_test_app();
    let cookie = unlock(&app).await;

    let header = card_catalog_core::csv_io::HEADER.join(",");
    let csv = format!(
        "{header}\n\
         Derek Jeter,1993,Baseball,SP2,No,,No,,Yes,PSA,9,150.00,Unknown,Unknown,1,,\n\
         ,1993,Baseball,,No,,No,,No,,,,,,1,,\n\
         Kobe Bryant,1996,Basketball,138,Yes,Chrome Refractor,Yes,/99,No,,,Unknown,20,2021-06-01,2,,\n"
    );

    let response = send(&app, multipart_csv("/admin/cards/import", Some(&cookie), &csv)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let report = body_json(response).await;
    assert_eq!(report["rows"], 3);
    assert_eq!(report["inserted"].as_array().unwrap().len(), 2);
    let failures = report["failures"].as_array().unwrap();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0]["line"], 3);

    let listing = body_json(send(&app, get("/cards?sort=player", None)).await).await;
    assert_eq!(listing["total"], 2);
    assert_eq!(listing["rows"][0]["player"], "Derek Jeter");
    assert_eq!(listing["rows"][1]["print_run"], "/99");
}

#[tokio::test]
async fn import_with_the_wrong_header_inserts_nothing() {
    let app = build_test_app();
    let cookie = unlock(&app).await;

    let csv = "Name,Year,Sport\nDerek Jeter,1993,Baseball\n";
    let response = send(&app, multipart_csv("/admin/cards/import", Some(&cookie), csv)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["code"], "BAD_HEADER");

    let listing = body_json(send(&app, get("/cards", None)).await).await;
    assert_eq!(listing["status"], "empty");
}

// ----------------------------------------------------------------------------
// Test: an unreachable store becomes a retryable error panel
// ----------------------------------------------------------------------------

struct DownStore;

#[async_trait]
impl CardStore for DownStore {
    async fn list_all(&self) -> PortResult<Vec<Card>> {
        Err(PortError::backend("connection refused", Some("08006".to_string())))
    }

    async fn get(&self, _id: Uuid) -> PortResult<Card> {
        Err(PortError::backend("connection refused", None))
    }

    async fn insert(&self, _details: CardDetails) -> PortResult<Uuid> {
        Err(PortError::backend("connection refused", None))
    }

    async fn update(&self, _id: Uuid, _details: CardDetails) -> PortResult<()> {
        Err(PortError::backend("connection refused", None))
    }

    async fn delete(&self, _id: Uuid) -> PortResult<()> {
        Err(PortError::backend("connection refused", None))
    }
}

#[tokio::test]
async fn store_outage_is_reported_as_retryable() {
    let app = build_test_app_with(Arc::new(DownStore));

    for uri in ["/cards", "/dashboard", "/cards/export"] {
        let response = send(&app, get(uri, None)).await;
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE, "{uri}");
        let body = body_json(response).await;
        assert_eq!(body["retryable"], true);
        assert_eq!(body["code"], "08006");
    }

    let cookie = unlock(&app).await;
    let response = send(
        &app,
        json("POST", "/admin/cards", Some(&cookie), &card_form("A", 2000, "B")),
    )
    .await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body_json(response).await["code"], "BACKEND_UNAVAILABLE");
}
