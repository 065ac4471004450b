use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use booker::config::{Config, SecurityConfig};
use booker::web::AppState;
use chrono::{Duration, Utc};
use http_body_util::BodyExt;
use tower::ServiceExt;

async fn spawn_app(security: SecurityConfig) -> (Router, Arc<AppState>) {
    let mut config = Config::default();
    config.general.database_path = "sqlite::memory:".to_string();
    config.observability.metrics_enabled = true;
    config.security = security;

    let state = booker::web::create_app_state_from_config(config, None)
        .await
        .expect("Failed to create app state");
    (booker::web::router(state.clone()), state)
}

struct Page {
    status: StatusCode,
    location: Option<String>,
    content_type: Option<String>,
    body: String,
}

/// Minimal browser: keeps the session cookie between requests.
struct Client {
    app: Router,
    cookie: Option<String>,
}

impl Client {
    fn new(app: &Router) -> Self {
        Self {
            app: app.clone(),
            cookie: None,
        }
    }

    async fn send(&mut self, request: Request<Body>) -> Page {
        let response = self.app.clone().oneshot(request).await.unwrap();

        if let Some(set_cookie) = response.headers().get(header::SET_COOKIE) {
            let pair = set_cookie.to_str().unwrap().split(';').next().unwrap();
            self.cookie = Some(pair.to_string());
        }

        let status = response.status();
        let location = response
            .headers()
            .get(header::LOCATION)
            .map(|v| v.to_str().unwrap().to_string());
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .map(|v| v.to_str().unwrap().to_string());
        let bytes = response.into_body().collect().await.unwrap().to_bytes();

        Page {
            status,
            location,
            content_type,
            body: String::from_utf8_lossy(&bytes).into_owned(),
        }
    }

    async fn get(&mut self, uri: &str) -> Page {
        let mut builder = Request::builder().uri(uri);
        if let Some(cookie) = &self.cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.send(builder.body(Body::empty()).unwrap()).await
    }

    async fn post(&mut self, uri: &str, fields: &[(&str, &str)]) -> Page {
        let body = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(fields)
            .finish();
        let mut builder = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
        if let Some(cookie) = &self.cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.send(builder.body(Body::from(body)).unwrap()).await
    }

    /// Loads `uri` and returns the CSRF token embedded in its forms.
    async fn csrf(&mut self, uri: &str) -> String {
        let page = self.get(uri).await;
        assert_eq!(page.status, StatusCode::OK, "GET {uri}");
        hidden_value(&page.body, "csrf_token").expect("page has no CSRF token")
    }

    async fn login(&mut self, username: &str, password: &str) -> Page {
        let token = self.csrf("/login/").await;
        self.post(
            "/login/",
            &[
                ("username", username),
                ("password", password),
                ("csrf_token", token.as_str()),
            ],
        )
        .await
    }
}

fn hidden_value(html: &str, name: &str) -> Option<String> {
    let marker = format!("name=\"{name}\" value=\"");
    let start = html.find(&marker)? + marker.len();
    let end = html[start..].find('"')?;
    Some(html[start..start + end].to_string())
}

async fn add_member(state: &AppState, username: &str, password: &str) -> i32 {
    state
        .auth_service()
        .create_user(username, password, false)
        .await
        .unwrap()
        .id
}

async fn add_slot(state: &AppState, days_ahead: i64) -> i32 {
    state
        .store()
        .create_appointment(Utc::now() + Duration::days(days_ahead))
        .await
        .unwrap()
        .id
}

#[tokio::test]
async fn test_anonymous_visitors_are_sent_to_login() {
    let (app, _) = spawn_app(SecurityConfig::default()).await;
    let mut client = Client::new(&app);

    for uri in ["/", "/question/", "/admin/"] {
        let page = client.get(uri).await;
        assert_eq!(page.status, StatusCode::SEE_OTHER, "GET {uri}");
        assert_eq!(page.location.as_deref(), Some("/login/"));
    }

    let page = client.get("/forgot/").await;
    assert_eq!(page.status, StatusCode::OK);
    assert!(page.body.contains("What was the name of your first pet?"));
}

#[tokio::test]
async fn test_login_failure_is_generic() {
    let (app, state) = spawn_app(SecurityConfig::default()).await;
    add_member(&state, "alice", "alicepass1").await;
    let mut client = Client::new(&app);

    let page = client.login("alice", "wrong-password").await;
    assert_eq!(page.location.as_deref(), Some("/login/"));
    let page = client.get("/login/").await;
    assert!(page.body.contains("Invalid username or password."));

    let page = client.login("nobody", "wrong-password").await;
    assert_eq!(page.location.as_deref(), Some("/login/"));
    let page = client.get("/login/").await;
    assert!(page.body.contains("Invalid username or password."));
}

#[tokio::test]
async fn test_login_form_requires_csrf_token() {
    let (app, state) = spawn_app(SecurityConfig::default()).await;
    add_member(&state, "alice", "alicepass1").await;
    let mut client = Client::new(&app);

    client.get("/login/").await;
    let page = client
        .post(
            "/login/",
            &[("username", "alice"), ("password", "alicepass1")],
        )
        .await;
    assert_eq!(page.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_login_issues_fresh_csrf_token() {
    let (app, state) = spawn_app(SecurityConfig::default()).await;
    add_member(&state, "alice", "alicepass1").await;
    let mut client = Client::new(&app);

    let anonymous_token = client.csrf("/login/").await;
    let page = client
        .post(
            "/login/",
            &[
                ("username", "alice"),
                ("password", "alicepass1"),
                ("csrf_token", anonymous_token.as_str()),
            ],
        )
        .await;
    assert_eq!(page.location.as_deref(), Some("/"));

    let member_token = client.csrf("/").await;
    assert_ne!(member_token, anonymous_token);

    let page = client
        .post("/logout/", &[("csrf_token", anonymous_token.as_str())])
        .await;
    assert_eq!(page.status, StatusCode::FORBIDDEN);

    let page = client
        .post("/logout/", &[("csrf_token", member_token.as_str())])
        .await;
    assert_eq!(page.status, StatusCode::SEE_OTHER);
}

#[tokio::test]
async fn test_book_and_list() {
    let (app, state) = spawn_app(SecurityConfig::default()).await;
    add_member(&state, "alice", "alicepass1").await;
    add_member(&state, "bob", "bobpass12").await;
    let slot = add_slot(&state, 2).await;
    let slot_id = slot.to_string();

    let mut alice = Client::new(&app);
    let page = alice.login("alice", "alicepass1").await;
    assert_eq!(page.status, StatusCode::SEE_OTHER);
    assert_eq!(page.location.as_deref(), Some("/"));

    let page = alice.get("/").await;
    assert_eq!(page.status, StatusCode::OK);
    assert!(page.body.contains(&format!("<option value=\"{slot}\">")));

    // Booking form carries no token while the exemption is on
    let page = alice
        .post(
            "/booking/",
            &[("start_date_id", slot_id.as_str()), ("note", "<i>hello</i>")],
        )
        .await;
    assert_eq!(page.location.as_deref(), Some("/"));

    let page = alice.get("/").await;
    assert!(page.body.contains("Booking successful!"));
    assert!(page.body.contains("&lt;i&gt;hello&lt;&#x2F;i&gt;"));
    assert!(!page.body.contains(&format!("<option value=\"{slot}\">")));

    let mut bob = Client::new(&app);
    bob.login("bob", "bobpass12").await;
    bob.post("/booking/", &[("start_date_id", slot_id.as_str()), ("note", "mine")])
        .await;
    let page = bob.get("/").await;
    assert!(page.body.contains("This appointment is already booked."));

    let page = Client::new(&app).get("/appointments/").await;
    assert_eq!(page.status, StatusCode::OK);
    assert!(page.body.contains("(booked for alice)"));
}

#[tokio::test]
async fn test_booking_unknown_or_past_slot() {
    let (app, state) = spawn_app(SecurityConfig::default()).await;
    add_member(&state, "alice", "alicepass1").await;
    let past = add_slot(&state, -1).await.to_string();

    let mut client = Client::new(&app);
    client.login("alice", "alicepass1").await;

    client
        .post("/booking/", &[("start_date_id", past.as_str()), ("note", "")])
        .await;
    let page = client.get("/").await;
    assert!(page.body.contains("You cannot book a time in the past."));

    client
        .post("/booking/", &[("start_date_id", "not-a-number")])
        .await;
    let page = client.get("/").await;
    assert!(page.body.contains("Appointment not found."));
}

#[tokio::test]
async fn test_hardened_booking_needs_token_and_clean_note() {
    let (app, state) = spawn_app(SecurityConfig::hardened()).await;
    add_member(&state, "alice", "alicepass1").await;
    let slot = add_slot(&state, 1).await.to_string();

    let mut client = Client::new(&app);
    client.login("alice", "alicepass1").await;

    let page = client
        .post("/booking/", &[("start_date_id", slot.as_str()), ("note", "hi")])
        .await;
    assert_eq!(page.status, StatusCode::FORBIDDEN);

    let token = client.csrf("/").await;
    client
        .post(
            "/booking/",
            &[
                ("start_date_id", slot.as_str()),
                ("note", "<script>"),
                ("csrf_token", token.as_str()),
            ],
        )
        .await;
    let page = client.get("/").await;
    assert!(page.body.contains("Note contains invalid characters!"));

    let page = Client::new(&app).get("/appointments/").await;
    assert_eq!(page.location.as_deref(), Some("/login/"));

    let page = client.get("/appointments/").await;
    assert_eq!(page.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_question_and_password_recovery() {
    let (app, state) = spawn_app(SecurityConfig::default()).await;
    add_member(&state, "alice", "alicepass1").await;
    let question_id = state.recovery_service().list_questions().await.unwrap()[1]
        .id
        .to_string();

    let mut client = Client::new(&app);
    client.login("alice", "alicepass1").await;

    let token = client.csrf("/question/").await;
    let page = client
        .post(
            "/question/",
            &[
                ("question_id", question_id.as_str()),
                ("answer", "abc"),
                ("csrf_token", token.as_str()),
            ],
        )
        .await;
    assert_eq!(page.location.as_deref(), Some("/question/"));
    let page = client.get("/question/").await;
    assert!(page.body.contains("Answer must be at least 4 characters long."));

    let page = client
        .post(
            "/question/",
            &[
                ("question_id", question_id.as_str()),
                ("answer", "Fluffy"),
                ("csrf_token", token.as_str()),
            ],
        )
        .await;
    assert_eq!(page.location.as_deref(), Some("/"));
    let page = client.get("/").await;
    assert!(page.body.contains("Recovery question saved successfully!"));

    let token = client.csrf("/").await;
    client.post("/logout/", &[("csrf_token", token.as_str())]).await;

    let mut stranger = Client::new(&app);
    let token = stranger.csrf("/forgot/").await;
    let page = stranger
        .post(
            "/forgot/",
            &[
                ("username", "alice"),
                ("question_id", question_id.as_str()),
                ("answer", "Rex"),
                ("csrf_token", token.as_str()),
            ],
        )
        .await;
    assert_eq!(page.location.as_deref(), Some("/forgot/"));
    let page = stranger.get("/forgot/").await;
    assert!(page.body.contains("Check username, question and answer!"));

    let page = stranger
        .post(
            "/forgot/",
            &[
                ("username", "alice"),
                ("question_id", question_id.as_str()),
                ("answer", "Fluffy"),
                ("csrf_token", token.as_str()),
            ],
        )
        .await;
    assert_eq!(page.status, StatusCode::OK);
    assert!(page.body.contains("Recovery question was answered correctly!"));
    let reset_token = hidden_value(&page.body, "token").expect("reset token in form");

    let page = stranger
        .post(
            "/changepswd/",
            &[
                ("username", "alice"),
                ("password1", "brandnew1"),
                ("password2", "brandnew2"),
                ("token", reset_token.as_str()),
                ("csrf_token", token.as_str()),
            ],
        )
        .await;
    assert_eq!(page.status, StatusCode::OK);
    assert!(page.body.contains("Passwords do not match!"));
    assert_eq!(hidden_value(&page.body, "token"), Some(reset_token.clone()));

    let page = stranger
        .post(
            "/changepswd/",
            &[
                ("username", "alice"),
                ("password1", "brandnew1"),
                ("password2", "brandnew1"),
                ("token", reset_token.as_str()),
                ("csrf_token", token.as_str()),
            ],
        )
        .await;
    assert_eq!(page.location.as_deref(), Some("/"));

    let page = Client::new(&app).login("alice", "brandnew1").await;
    assert_eq!(page.location.as_deref(), Some("/"));
}

#[tokio::test]
async fn test_changepswd_cannot_be_reached_directly() {
    let (app, state) = spawn_app(SecurityConfig::default()).await;
    add_member(&state, "alice", "alicepass1").await;

    let mut client = Client::new(&app);
    let token = client.csrf("/changepswd/").await;
    let page = client
        .post(
            "/changepswd/",
            &[
                ("username", "alice"),
                ("password1", "hijacked1"),
                ("password2", "hijacked1"),
                ("csrf_token", token.as_str()),
            ],
        )
        .await;
    assert_eq!(page.location.as_deref(), Some("/forgot/"));
    let page = client.get("/forgot/").await;
    assert!(page.body.contains("Reset link is invalid or has expired."));

    let page = client
        .post(
            "/changepswd/",
            &[
                ("username", "ghost"),
                ("password1", "hijacked1"),
                ("password2", "hijacked1"),
                ("csrf_token", token.as_str()),
            ],
        )
        .await;
    assert_eq!(page.location.as_deref(), Some("/changepswd/"));

    let page = Client::new(&app).login("alice", "alicepass1").await;
    assert_eq!(page.location.as_deref(), Some("/"));
}

#[tokio::test]
async fn test_admin_screen() {
    let (app, state) = spawn_app(SecurityConfig::default()).await;
    add_member(&state, "alice", "alicepass1").await;

    let mut member = Client::new(&app);
    member.login("alice", "alicepass1").await;
    let page = member.get("/admin/").await;
    assert_eq!(page.status, StatusCode::FORBIDDEN);

    let mut admin = Client::new(&app);
    let page = admin.login("admin", "password").await;
    assert_eq!(page.location.as_deref(), Some("/"));

    let token = admin.csrf("/admin/").await;
    let page = admin
        .post(
            "/admin/appointments/",
            &[("start_date", "2031-03-04T10:30"), ("csrf_token", token.as_str())],
        )
        .await;
    assert_eq!(page.location.as_deref(), Some("/admin/"));

    let page = admin.get("/admin/").await;
    assert!(page.body.contains("2031-03-04 10:30 UTC"));
    assert!(page.body.contains("alice"));

    let roster = state.booking_service().roster(Utc::now()).await.unwrap();
    let id = roster[0].id;
    let page = admin
        .post(
            &format!("/admin/appointments/{id}/delete/"),
            &[("csrf_token", token.as_str())],
        )
        .await;
    assert_eq!(page.location.as_deref(), Some("/admin/"));
    assert!(state.store().get_appointment(id).await.unwrap().is_none());

    let page = admin
        .post(
            "/admin/appointments/",
            &[("start_date", "soon"), ("csrf_token", token.as_str())],
        )
        .await;
    assert_eq!(page.location.as_deref(), Some("/admin/"));
    let page = admin.get("/admin/").await;
    assert!(page.body.contains("Invalid start date."));
}

#[tokio::test]
async fn test_static_assets_and_metrics() {
    let (app, _) = spawn_app(SecurityConfig::default()).await;
    let mut client = Client::new(&app);

    let page = client.get("/static/style.css").await;
    assert_eq!(page.status, StatusCode::OK);
    assert_eq!(page.content_type.as_deref(), Some("text/css"));

    let page = client.get("/static/missing.js").await;
    assert_eq!(page.status, StatusCode::NOT_FOUND);

    let page = client.get("/metrics").await;
    assert_eq!(page.status, StatusCode::OK);
    assert_eq!(page.body, "Metrics not enabled");
}
