mod common;

use actix_web::http::StatusCode;
use actix_web::test;
use pretty_assertions::assert_eq;
use serde_json::json;
use todo_backend::auth::SESSION_COOKIE;

use common::{init_app, response_cookie, scoped_config, test_config, test_pool, Client};

#[actix_rt::test]
async fn test_signup_and_login_flow() {
    let app = init_app(test_pool().await, test_config()).await;
    let client = Client::new(&app).await;

    assert_eq!(
        client.register(&app, "alice", "secret").await,
        StatusCode::CREATED
    );

    let req = client
        .apply(test::TestRequest::post().uri("/login/"))
        .set_json(json!({ "username": "alice", "password": "secret" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(response_cookie(&resp, SESSION_COOKIE).is_some());
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body, json!({ "message": "Login successful" }));

    let req = client
        .apply(test::TestRequest::post().uri("/login/"))
        .set_json(json!({ "username": "alice", "password": "wrong" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert!(response_cookie(&resp, SESSION_COOKIE).is_none());
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body, json!({ "error": "Invalid credentials" }));
}

#[actix_rt::test]
async fn test_invalid_login_inputs() {
    let app = init_app(test_pool().await, test_config()).await;
    let client = Client::new(&app).await;
    assert_eq!(
        client.register(&app, "login_user", "secret").await,
        StatusCode::CREATED
    );

    let test_cases = vec![
        (json!({ "username": "login_user", "password": "nope" }), "incorrect password"),
        (json!({ "username": "nobody", "password": "secret" }), "non-existent user"),
        (json!({ "password": "secret" }), "missing username"),
        (json!({ "username": "login_user" }), "missing password"),
        (json!({}), "empty body"),
    ];

    for (payload, description) in test_cases {
        let req = test::TestRequest::post()
            .uri("/login/")
            .set_json(&payload)
            .to_request();
        let resp = test::call_service(&app, req).await;
        let status = resp.status();
        let body: serde_json::Value = test::read_body_json(resp).await;

        assert_eq!(
            status,
            StatusCode::BAD_REQUEST,
            "Test case failed: {}. Body: {}",
            description,
            body
        );
        assert_eq!(body["error"], "Invalid credentials", "{}", description);
    }
}

#[actix_rt::test]
async fn test_duplicate_username_is_rejected() {
    let app = init_app(test_pool().await, test_config()).await;
    let client = Client::new(&app).await;

    assert_eq!(
        client.register(&app, "alice", "secret").await,
        StatusCode::CREATED
    );

    let req = client
        .apply(test::TestRequest::post().uri("/register/"))
        .set_json(json!({ "username": "alice", "password": "another" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body, json!({ "error": "Username already exists" }));

    // The first password still works.
    let mut client = client;
    client.login(&app, "alice", "secret").await;
}

#[actix_rt::test]
async fn test_invalid_registration_inputs() {
    let app = init_app(test_pool().await, test_config()).await;
    let client = Client::new(&app).await;

    let test_cases = vec![
        (
            json!({ "password": "secret" }),
            StatusCode::BAD_REQUEST,
            "missing username",
        ),
        (
            json!({ "username": "bob" }),
            StatusCode::BAD_REQUEST,
            "missing password",
        ),
        (
            json!({ "username": "", "password": "secret" }),
            StatusCode::UNPROCESSABLE_ENTITY,
            "empty username",
        ),
        (
            json!({ "username": "bob smith", "password": "secret" }),
            StatusCode::UNPROCESSABLE_ENTITY,
            "username with a space",
        ),
        (
            json!({ "username": "b".repeat(151), "password": "secret" }),
            StatusCode::UNPROCESSABLE_ENTITY,
            "username too long",
        ),
        (
            json!({ "username": "bob", "password": "" }),
            StatusCode::UNPROCESSABLE_ENTITY,
            "empty password",
        ),
        (
            json!({ "username": "bob", "password": "secret", "email": "not-an-email" }),
            StatusCode::UNPROCESSABLE_ENTITY,
            "invalid email",
        ),
        (
            json!({ "username": "bob", "password": "1", "email": "bob@example.com" }),
            StatusCode::CREATED,
            "weak password and email are fine",
        ),
    ];

    for (payload, expected_status, description) in test_cases {
        let req = client
            .apply(test::TestRequest::post().uri("/register/"))
            .set_json(&payload)
            .to_request();
        let resp = test::call_service(&app, req).await;
        let status = resp.status();
        let body = test::read_body(resp).await;

        assert_eq!(
            status,
            expected_status,
            "Test case failed: {}. Body: {:?}",
            description,
            String::from_utf8_lossy(&body)
        );
    }
}

#[actix_rt::test]
async fn test_logout_ends_the_session() {
    let app = init_app(test_pool().await, scoped_config()).await;
    let client = Client::signed_up(&app, "carol", "secret").await;

    let req = client
        .apply(test::TestRequest::get().uri("/todo/"))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

    let req = client
        .apply(test::TestRequest::post().uri("/logout/"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let cleared = response_cookie(&resp, SESSION_COOKIE).expect("logout should clear the cookie");
    assert_eq!(cleared.value(), "");
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body, json!({ "message": "Logout successful" }));

    // The old cookie no longer identifies anyone.
    let req = client
        .apply(test::TestRequest::get().uri("/todo/"))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::UNAUTHORIZED
    );
}

#[actix_rt::test]
async fn test_login_replaces_previous_session() {
    let app = init_app(test_pool().await, scoped_config()).await;
    let mut client = Client::signed_up(&app, "dave", "secret").await;
    let first = client.session.clone().unwrap();

    client.login(&app, "dave", "secret").await;
    let second = client.session.clone().unwrap();
    assert_ne!(first.value(), second.value());

    let stale = Client {
        session: Some(first),
        ..client.clone()
    };
    let req = stale
        .apply(test::TestRequest::get().uri("/todo/"))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::UNAUTHORIZED
    );
}
