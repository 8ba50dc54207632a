use reqwest::{StatusCode, header};
use rit_links_in::{
    AppConfig, AppState, InMemoryRepository, MockIdentityBackend, MockStorageService,
    create_router,
    identity::IdentityBackendState,
    portal::SESSION_HEADER,
    repository::RepositoryState,
    storage::StorageState,
};
use serde_json::{Value, json};
use std::{sync::Arc, time::Duration};
use tokio::net::TcpListener;

#[derive(Debug)]
pub struct TestApp {
    pub address: String,
}

async fn spawn_app() -> TestApp {
    let config = AppConfig {
        session_sync_timeout: Duration::from_secs(2),
        ..AppConfig::default()
    };
    let state = AppState::new(
        Arc::new(MockIdentityBackend::new()) as IdentityBackendState,
        Arc::new(InMemoryRepository::new()) as RepositoryState,
        Arc::new(MockStorageService::new()) as StorageState,
        config,
    );
    let router = create_router(state);

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    TestApp { address }
}

/// A browser stand-in: keeps the portal session id the server hands out and
/// does not follow redirects, so tests can assert on them.
struct Browser {
    http: reqwest::Client,
    base: String,
    session_id: Option<String>,
}

impl Browser {
    fn new(app: &TestApp) -> Self {
        Self {
            http: reqwest::Client::builder()
                .redirect(reqwest::redirect::Policy::none())
                .build()
                .unwrap(),
            base: app.address.clone(),
            session_id: None,
        }
    }

    async fn send(
        &mut self,
        method: reqwest::Method,
        path: &str,
        body: Option<Value>,
    ) -> reqwest::Response {
        let mut request = self.http.request(method, format!("{}{}", self.base, path));
        if let Some(id) = &self.session_id {
            request = request.header(SESSION_HEADER, id);
        }
        if let Some(body) = body {
            request = request.json(&body);
        }
        let response = request.send().await.expect("req fail");
        if let Some(id) = response.headers().get(SESSION_HEADER) {
            self.session_id = Some(id.to_str().unwrap().to_string());
        }
        response
    }

    async fn get(&mut self, path: &str) -> reqwest::Response {
        self.send(reqwest::Method::GET, path, None).await
    }

    async fn post(&mut self, path: &str, body: Value) -> reqwest::Response {
        self.send(reqwest::Method::POST, path, Some(body)).await
    }

    /// GETs a guarded screen, retrying while the session reports it is still loading.
    async fn get_settled(&mut self, path: &str) -> reqwest::Response {
        for _ in 0..50 {
            let response = self.get(path).await;
            if response.status() != StatusCode::ACCEPTED {
                return response;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        panic!("{} never settled", path);
    }

    async fn register_and_login(&mut self, email: &str, role: &str) {
        let registered = self
            .post(
                "/register",
                json!({ "email": email, "password": "secret123", "role": role, "name": "Asha" }),
            )
            .await;
        assert_eq!(registered.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&registered), format!("/login?role={}", role));

        let logged_in = self
            .post("/login", json!({ "email": email, "password": "secret123" }))
            .await;
        assert_eq!(logged_in.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&logged_in), format!("/{}/dashboard", role));
    }
}

fn location(response: &reqwest::Response) -> String {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

#[tokio::test]
async fn test_health_check() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();
    let response = client
        .get(&format!("{}/health", app.address))
        .send()
        .await
        .expect("req fail");
    assert!(response.status().is_success());
}

#[tokio::test]
async fn test_session_routes_name_a_session() {
    let app = spawn_app().await;
    let mut browser = Browser::new(&app);

    let landing = browser.get("/").await;
    assert_eq!(landing.status(), StatusCode::OK);
    assert!(landing.headers().get(SESSION_HEADER).is_none());
    let body: Value = landing.json().await.unwrap();
    assert_eq!(body["sign_in"].as_array().map(Vec::len), Some(2));

    browser.get("/login").await;
    let first = browser.session_id.clone().expect("no session header");

    browser.get("/login?role=faculty").await;
    assert_eq!(browser.session_id.as_deref(), Some(first.as_str()));
}

#[tokio::test]
async fn test_unknown_paths_are_not_found() {
    let app = spawn_app().await;
    let mut browser = Browser::new(&app);

    let response = browser.get("/definitely/not/here").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["title"], "Page Not Found");
}

#[tokio::test]
async fn test_anonymous_visitor_is_sent_to_login() {
    let app = spawn_app().await;
    let mut browser = Browser::new(&app);

    for path in ["/student/dashboard", "/faculty/profile", "/onboarding"] {
        let response = browser.get_settled(path).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER, "{}", path);
        assert_eq!(location(&response), "/login");
    }
}

#[tokio::test]
async fn test_student_portal_flow() {
    let app = spawn_app().await;
    let mut browser = Browser::new(&app);
    browser.register_and_login("asha@rit.edu", "student").await;

    let dashboard = browser.get_settled("/student/dashboard").await;
    assert_eq!(dashboard.status(), StatusCode::OK);
    let page: Value = dashboard.json().await.unwrap();
    assert_eq!(page["dashboard"]["welcome"], "Welcome Asha!");
    assert_eq!(page["shell"]["role"], "student");

    // The other role's screens and unknown sub-paths both go to the own dashboard.
    let wrong_role = browser.get("/faculty/dashboard").await;
    assert_eq!(location(&wrong_role), "/student/dashboard");
    let stray = browser.get("/student/nowhere").await;
    assert_eq!(location(&stray), "/student/dashboard");

    // Already signed in: the login form forwards to the dashboard.
    let login_form = browser.get("/login").await;
    assert_eq!(location(&login_form), "/student/dashboard");

    let logout = browser.post("/logout", json!({})).await;
    assert_eq!(logout.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&logout), "/");

    // The sign-out notification reaches the session asynchronously.
    let mut after = browser.get_settled("/student/dashboard").await;
    for _ in 0..50 {
        if after.status() == StatusCode::SEE_OTHER {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
        after = browser.get_settled("/student/dashboard").await;
    }
    assert_eq!(location(&after), "/login");
}

#[tokio::test]
async fn test_profile_editing_over_http() {
    let app = spawn_app().await;
    let mut browser = Browser::new(&app);
    browser.register_and_login("rao@rit.edu", "faculty").await;

    let edit = browser.post("/faculty/profile/edit", json!({})).await;
    assert_eq!(edit.status(), StatusCode::OK);

    let draft = browser
        .send(
            reqwest::Method::PUT,
            "/faculty/profile/draft",
            Some(json!({ "department": "CSE" })),
        )
        .await;
    assert_eq!(draft.status(), StatusCode::OK);

    browser
        .post("/faculty/profile/skills", json!({ "skill": "Embedded C" }))
        .await;
    let removed = browser
        .send(reqwest::Method::DELETE, "/faculty/profile/skills/Embedded%20C", None)
        .await;
    let draft: Value = removed.json().await.unwrap();
    assert_eq!(draft["skills"], json!([]));

    browser
        .post("/faculty/profile/skills", json!({ "skill": "VLSI" }))
        .await;
    let submitted = browser.post("/faculty/profile/submit", json!({})).await;
    assert_eq!(submitted.status(), StatusCode::OK);
    let page: Value = submitted.json().await.unwrap();
    assert_eq!(page["profile"]["editing"], false);
    assert_eq!(page["profile"]["department"], "CSE");
    assert_eq!(page["profile"]["skills"], json!(["VLSI"]));
    assert_eq!(page["profile"]["notice"]["kind"], "success");

    let again = browser.post("/faculty/profile/submit", json!({})).await;
    assert_eq!(again.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_faculty_can_decide_requests_once() {
    let app = spawn_app().await;
    let mut browser = Browser::new(&app);
    browser.register_and_login("meera@rit.edu", "faculty").await;

    let accepted = browser.post("/faculty/requests/1/accept", json!({})).await;
    assert_eq!(accepted.status(), StatusCode::OK);
    let body: Value = accepted.json().await.unwrap();
    assert_eq!(body["status"], "Accepted");

    let rejected = browser.post("/faculty/requests/1/reject", json!({})).await;
    assert_eq!(rejected.status(), StatusCode::CONFLICT);

    // Another faculty client starts from its own request list.
    let mut colleague = Browser::new(&app);
    colleague.register_and_login("ravi@rit.edu", "faculty").await;
    let fresh = colleague.post("/faculty/requests/1/reject", json!({})).await;
    assert_eq!(fresh.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_students_cannot_reach_request_actions() {
    let app = spawn_app().await;
    let mut browser = Browser::new(&app);
    browser.register_and_login("nila@rit.edu", "student").await;

    let response = browser.post("/faculty/requests/1/accept", json!({})).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/student/dashboard");
}

#[tokio::test]
async fn test_login_errors_are_reported() {
    let app = spawn_app().await;
    let mut browser = Browser::new(&app);

    let missing = browser
        .post("/login", json!({ "email": "", "password": "x" }))
        .await;
    assert_eq!(missing.status(), StatusCode::BAD_REQUEST);

    let unknown = browser
        .post("/login", json!({ "email": "ghost@rit.edu", "password": "secret123" }))
        .await;
    assert_eq!(unknown.status(), StatusCode::UNAUTHORIZED);
    let body: Value = unknown.json().await.unwrap();
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_assistant_round_trip() {
    let app = spawn_app().await;
    let mut browser = Browser::new(&app);

    let greeting: Value = browser.get("/assistant").await.json().await.unwrap();
    assert!(greeting["text"].as_str().unwrap().contains("RIT Links In"));

    let reply: Value = browser
        .post("/assistant", json!({ "text": "How do I add skill?" }))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(reply["topic"], "add_skill");
}

#[tokio::test]
async fn test_skills_projects_and_search_over_http() {
    let app = spawn_app().await;

    let mut faculty = Browser::new(&app);
    faculty.register_and_login("rao@rit.edu", "faculty").await;
    let form = faculty.get_settled("/faculty/projects/create").await;
    assert_eq!(form.status(), StatusCode::OK);

    let created = faculty
        .post(
            "/faculty/projects/create",
            json!({
                "title": "Rover",
                "description": "Autonomous rover",
                "required_skills": ["Arduino"],
                "duration": "6 weeks"
            }),
        )
        .await;
    assert_eq!(created.status(), StatusCode::CREATED);
    let project: Value = created.json().await.unwrap();
    assert_eq!(project["status"], "Open");
    assert_eq!(project["max_students"], 1);

    let mut student = Browser::new(&app);
    student.register_and_login("asha@rit.edu", "student").await;
    student.get_settled("/student/skills").await;
    let added = student
        .post(
            "/student/skills",
            json!({
                "skill_name": "Arduino",
                "skill_level": "Advanced",
                "projects_count": 2,
                "github_repo": "https://github.com/asha/rover"
            }),
        )
        .await;
    assert_eq!(added.status(), StatusCode::CREATED);
    let record: Value = added.json().await.unwrap();
    assert_eq!(record["score"], 50);

    let apply_path = format!("/student/projects/{}/apply", project["id"].as_str().unwrap());
    let applied = student.post(&apply_path, json!({})).await;
    assert_eq!(applied.status(), StatusCode::CREATED);
    let again = student.post(&apply_path, json!({})).await;
    assert_eq!(again.status(), StatusCode::CONFLICT);

    let found: Value = faculty
        .get("/faculty/students/search?skill=Arduino")
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(found["students"][0]["email"], "asha@rit.edu");
    assert_eq!(found["students"][0]["skill"]["score"], 50);

    // Each role's screens stay behind its guard.
    let denied = student.get("/faculty/students/search?skill=Arduino").await;
    assert_eq!(location(&denied), "/student/dashboard");
    let blank = faculty.get("/faculty/students/search?skill=%20").await;
    assert_eq!(blank.status(), StatusCode::BAD_REQUEST);
}
