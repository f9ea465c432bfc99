mod common;

use axum::http::{Method, StatusCode};
use axum::Router;
use serde_json::json;

use common::{count, login, send, test_app};
use medguid::catalog::default_catalog;
use medguid::state::AppState;

async fn seeded() -> (AppState, Router, String) {
    let (state, app) = test_app().await;
    let token = login(&app).await;
    let (status, _) = send(
        &app,
        Method::POST,
        "/api/years/sync",
        Some(&token),
        Some(serde_json::to_value(default_catalog()).unwrap()),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    (state, app, token)
}

#[tokio::test]
async fn create_module_in_unit_and_standalone() {
    let (_, app, token) = seeded().await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/years/modules",
        Some(&token),
        Some(json!({ "title": "Pharmacology", "unitId": "unit-2-1" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(body["id"].as_str().unwrap().starts_with("mod-"));
    assert_eq!(body["unitId"], "unit-2-1");
    assert_eq!(body["isStandalone"], false);

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/modules",
        Some(&token),
        Some(json!({ "id": "mod-ethics", "title": "Ethics", "standaloneYearId": "year-3" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["id"], "mod-ethics");
    assert_eq!(body["isStandalone"], true);

    let (_, years) = send(&app, Method::GET, "/api/years", None, None).await;
    let unit_modules = years[1]["units"][0]["modules"].as_array().unwrap();
    assert_eq!(unit_modules.last().unwrap()["title"], "Pharmacology");
    assert_eq!(years[2]["standaloneModules"][0]["id"], "mod-ethics");
}

#[tokio::test]
async fn create_module_validation() {
    let (state, app, token) = seeded().await;

    let cases = [
        (json!({ "unitId": "unit-2-1" }), StatusCode::BAD_REQUEST),
        (json!({ "title": "  ", "unitId": "unit-2-1" }), StatusCode::BAD_REQUEST),
        (
            json!({ "title": "Both", "unitId": "unit-2-1", "standaloneYearId": "year-2" }),
            StatusCode::BAD_REQUEST,
        ),
        (json!({ "title": "Lost", "unitId": "unit-9-9" }), StatusCode::BAD_REQUEST),
        (json!({ "title": "Homeless" }), StatusCode::BAD_REQUEST),
        (json!({ "title": "Homeless", "isStandalone": false }), StatusCode::BAD_REQUEST),
        (
            json!({ "id": "mod-y2-u1-001", "title": "Dup", "unitId": "unit-2-1" }),
            StatusCode::CONFLICT,
        ),
    ];

    for (body, expected) in cases {
        let (status, _) = send(&app, Method::POST, "/api/years/modules", Some(&token), Some(body.clone())).await;
        assert_eq!(status, expected, "{}", body);
    }

    let (_, body) = send(
        &app,
        Method::POST,
        "/api/modules",
        Some(&token),
        Some(json!({ "title": "Homeless" })),
    )
    .await;
    assert_eq!(body["message"], "A module needs a unitId or a standaloneYearId");
    assert_eq!(count(&state, "SELECT COUNT(1) FROM modules WHERE title = 'Homeless'").await, 0);
}

#[tokio::test]
async fn unit_and_standalone_modules_are_never_shared() {
    let (state, app, token) = seeded().await;

    for body in [
        json!({ "title": "Shared unit", "unitId": "unit-2-2", "isShared": true }),
        json!({ "title": "Shared standalone", "standaloneYearId": "year-2", "isShared": true }),
    ] {
        let (status, created) = send(&app, Method::POST, "/api/modules", Some(&token), Some(body)).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["isShared"], false);
    }

    assert_eq!(
        count(&state, "SELECT COUNT(1) FROM modules WHERE title LIKE 'Shared %' AND is_shared = 1").await,
        0
    );
}

#[tokio::test]
async fn rename_module_updates_title() {
    let (_, app, token) = seeded().await;

    let (status, body) = send(
        &app,
        Method::PUT,
        "/api/modules/mod-y1-shared-002",
        Some(&token),
        Some(json!({ "title": "Biochemistry" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "Biochemistry");

    // one row, so both semesters see the new title
    let (_, years) = send(&app, Method::GET, "/api/years", None, None).await;
    assert_eq!(years[0]["semesters"][0]["modules"][1]["title"], "Biochemistry");
    assert_eq!(years[0]["semesters"][1]["modules"][1]["title"], "Biochemistry");

    let (status, body) = send(
        &app,
        Method::PUT,
        "/api/years/modules/ghost",
        Some(&token),
        Some(json!({ "title": "x" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Module not found");

    let (status, _) = send(
        &app,
        Method::PUT,
        "/api/modules/mod-y1-shared-002",
        Some(&token),
        Some(json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn add_module_to_semester_links_it() {
    let (state, app, token) = seeded().await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/semesters/s2/modules",
        Some(&token),
        Some(json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["title"], "موديل جديد");
    let id = body["id"].as_str().unwrap().to_string();

    let (_, years) = send(&app, Method::GET, "/api/years", None, None).await;
    let s2 = years[0]["semesters"][1]["modules"].as_array().unwrap();
    assert_eq!(s2.len(), 10);
    assert_eq!(s2[9]["id"], id.as_str());

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/years/semesters/s9/modules",
        Some(&token),
        Some(json!({ "title": "Orphan" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Semester not found");
    assert_eq!(count(&state, "SELECT COUNT(1) FROM modules WHERE title = 'Orphan'").await, 0);
}

#[tokio::test]
async fn delete_module_cascades() {
    let (state, app, token) = seeded().await;

    let (status, body) = send(
        &app,
        Method::DELETE,
        "/api/years/modules/mod-y1-shared-001",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "success": true }));

    assert_eq!(
        count(&state, "SELECT COUNT(1) FROM semester_modules WHERE module_id = 'mod-y1-shared-001'").await,
        0
    );
    assert_eq!(
        count(&state, "SELECT COUNT(1) FROM lessons WHERE module_id = 'mod-y1-shared-001'").await,
        0
    );
    assert_eq!(
        count(&state, "SELECT COUNT(1) FROM exams WHERE module_id = 'mod-y1-shared-001'").await,
        0
    );

    let (_, years) = send(&app, Method::GET, "/api/years", None, None).await;
    assert_eq!(years[0]["semesters"][0]["modules"].as_array().unwrap().len(), 8);
    assert_eq!(years[0]["semesters"][1]["modules"].as_array().unwrap().len(), 8);

    let (status, _) = send(
        &app,
        Method::DELETE,
        "/api/years/modules/mod-y1-shared-001",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn lessons_and_exams_are_added_and_deleted() {
    let (state, app, token) = seeded().await;

    let (status, lesson) = send(
        &app,
        Method::POST,
        "/api/years/modules/mod-y3-u1-001/lessons",
        Some(&token),
        Some(json!({ "title": "Intro", "driveUrl": "https://drive.example/intro" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(lesson["id"].as_str().unwrap().starts_with("les-"));
    assert_eq!(lesson["moduleId"], "mod-y3-u1-001");

    let (status, exam) = send(
        &app,
        Method::POST,
        "/api/years/modules/mod-y3-u1-001/exams",
        Some(&token),
        Some(json!({ "title": "Midterm" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(exam["driveUrl"], "TO_BE_FILLED");

    let (_, years) = send(&app, Method::GET, "/api/years", None, None).await;
    let module = &years[2]["units"][0]["modules"][0];
    assert_eq!(module["lessons"].as_array().unwrap().len(), 4);
    assert_eq!(module["lessons"][3]["title"], "Intro");
    assert_eq!(module["exams"][2]["title"], "Midterm");

    let lesson_uri = format!("/api/years/lessons/{}", lesson["id"].as_str().unwrap());
    let (status, _) = send(&app, Method::DELETE, &lesson_uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, body) = send(&app, Method::DELETE, &lesson_uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Lesson not found");

    // ex-001 lives in every module
    let (status, _) = send(&app, Method::DELETE, "/api/years/exams/ex-001", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(count(&state, "SELECT COUNT(1) FROM exams WHERE id = 'ex-001'").await, 0);

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/years/modules/ghost/lessons",
        Some(&token),
        Some(json!({ "title": "x" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Module not found");
}

#[tokio::test]
async fn malformed_json_is_bad_request() {
    use axum::body::Body;
    use axum::http::{Request, header};
    use tower::ServiceExt;

    let (_, app, token) = seeded().await;
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/years/modules")
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
