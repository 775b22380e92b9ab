mod common;

use axum::http::StatusCode;
use common::TestApp;
use snippetbox::domain::repositories::UserRepository;

#[tokio::test]
async fn test_signup_with_taken_email_rerenders_form() {
    let app = TestApp::new();
    app.register("Alice", "alice@example.com", "pa$$word").await;
    let client = app.client();

    let response = client
        .submit(
            "/user/signup",
            "/user/signup",
            &[("name", "Another Alice"), ("email", "alice@example.com"), ("password", "pa$$word2")],
        )
        .await;

    response.assert_status(StatusCode::OK);
    assert!(response.body.contains("Address is already in use"));
    assert!(response.body.contains(r#"value="Another Alice""#));
    assert!(!response.body.contains("pa$$word2"));
    assert_eq!(app.users.insert_calls(), 1);
}

#[tokio::test]
async fn test_signup_validation_errors() {
    let app = TestApp::new();
    let client = app.client();

    let response = client
        .submit("/user/signup", "/user/signup", &[("name", " "), ("email", "not-an-email"), ("password", "short")])
        .await;

    response.assert_status(StatusCode::OK);
    assert!(response.body.contains("This field cannot be blank"));
    assert!(response.body.contains("This field is invalid"));
    assert!(response.body.contains("This field is too short (minimum is 8 characters)"));
    assert_eq!(app.users.insert_calls(), 0);
}

#[tokio::test]
async fn test_signup_then_login_flow() {
    let app = TestApp::new();
    let client = app.client();

    client
        .submit(
            "/user/signup",
            "/user/signup",
            &[("name", "Bob"), ("email", "bob@example.com"), ("password", "correct horse")],
        )
        .await
        .assert_redirect(StatusCode::SEE_OTHER, "/user/login");

    let login_page = client.get("/user/login").await;
    assert!(login_page.body.contains("Your signup was successful. Please log in."));

    client
        .submit("/user/login", "/user/login", &[("email", "bob@example.com"), ("password", "correct horse")])
        .await
        .assert_redirect(StatusCode::SEE_OTHER, "/snippet/create");

    let create_page = client.get("/snippet/create").await;
    create_page.assert_status(StatusCode::OK);
    assert!(create_page.body.contains("Logout (Bob)"));
}

#[tokio::test]
async fn test_login_with_bad_credentials_shows_generic_error() {
    let app = TestApp::new();
    app.register("Alice", "alice@example.com", "pa$$word").await;

    for (email, password) in [("alice@example.com", "wrong password"), ("nobody@example.com", "pa$$word")] {
        let response = app
            .client()
            .submit("/user/login", "/user/login", &[("email", email), ("password", password)])
            .await;

        response.assert_status(StatusCode::OK);
        assert!(response.body.contains("Email or Password is incorrect"));
        assert!(response.body.contains(&format!(r#"value="{email}""#)));
    }
}

#[tokio::test]
async fn test_login_renews_session_cookie() {
    let app = TestApp::new();
    app.register("Alice", "alice@example.com", "pa$$word").await;
    let client = app.client();

    let before = client.get("/user/login").await.header("set-cookie").unwrap().to_string();
    let response = client
        .submit("/user/login", "/user/login", &[("email", "alice@example.com"), ("password", "pa$$word")])
        .await;
    let after = response.header("set-cookie").unwrap().to_string();

    assert_ne!(before.split(';').next(), after.split(';').next());
}

#[tokio::test]
async fn test_logout_clears_identity() {
    let app = TestApp::new();
    let (client, _) = app.logged_in_client("alice@example.com", "pa$$word").await;

    client
        .submit("/", "/user/logout", &[])
        .await
        .assert_redirect(StatusCode::SEE_OTHER, "/");

    let home = client.get("/").await;
    assert!(home.body.contains("You've been logged out successfully!"));
    assert!(home.body.contains(r#"href="/user/login""#));
    client.get("/snippet/create").await.assert_redirect(StatusCode::FOUND, "/user/login");
}

#[tokio::test]
async fn test_deleted_account_is_dropped_from_session_once() {
    let app = TestApp::new();
    let (client, id) = app.logged_in_client("alice@example.com", "pa$$word").await;
    assert!(app.users.inner.delete(id));
    let lookups = app.users.get_calls();

    let first = client.get("/").await;
    let second = client.get("/").await;

    first.assert_status(StatusCode::OK);
    second.assert_status(StatusCode::OK);
    assert!(second.body.contains(r#"href="/user/login""#));
    assert_eq!(app.users.get_calls(), lookups + 1);
    client.get("/snippet/create").await.assert_redirect(StatusCode::FOUND, "/user/login");
}

#[tokio::test]
async fn test_change_password() {
    let app = TestApp::new();
    let (client, id) = app.logged_in_client("alice@example.com", "pa$$word").await;

    let wrong_current = client
        .submit(
            "/user/password",
            "/user/password",
            &[
                ("current_password", "not my password"),
                ("new_password", "new pa$$word"),
                ("new_password_confirmation", "new pa$$word"),
            ],
        )
        .await;
    wrong_current.assert_status(StatusCode::OK);
    assert!(wrong_current.body.contains("Current password is incorrect"));

    let mismatch = client
        .submit(
            "/user/password",
            "/user/password",
            &[
                ("current_password", "pa$$word"),
                ("new_password", "new pa$$word"),
                ("new_password_confirmation", "something else"),
            ],
        )
        .await;
    mismatch.assert_status(StatusCode::OK);
    assert!(mismatch.body.contains("The values do not match"));

    client
        .submit(
            "/user/password",
            "/user/password",
            &[
                ("current_password", "pa$$word"),
                ("new_password", "new pa$$word"),
                ("new_password_confirmation", "new pa$$word"),
            ],
        )
        .await
        .assert_redirect(StatusCode::SEE_OTHER, "/");

    assert!(client.get("/").await.body.contains("Your password has been updated!"));
    assert_eq!(app.users.inner.authenticate("alice@example.com", "new pa$$word").await.unwrap(), id);
    assert!(app.users.inner.authenticate("alice@example.com", "pa$$word").await.is_err());
}
