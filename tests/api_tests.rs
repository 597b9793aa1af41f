// tests/api_tests.rs

use quizdesk::{config::Config, routes, state::AppState};
use serde_json::{Value, json};

/// Helper function to spawn the app on a random port for testing.
/// Returns the base URL (e.g., "http://127.0.0.1:12345").
async fn spawn_app() -> String {
    // 1. Create test configuration; no DATABASE_URL means the in-memory store.
    let config = Config {
        database_url: None,
        jwt_secret: "test_secret_for_integration_tests".to_string(),
        jwt_expiration: 600, // 10 minutes for tests
        rust_log: "error".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        admin_email: None,
        admin_password: None,
        admin_name: None,
    };

    // 2. Create the router with the app state
    let app = routes::create_router(AppState::in_memory(config));

    // 3. Bind to port 0 to get a random available port
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");

    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    // 4. Spawn the server in the background
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    address
}

struct TestApp {
    address: String,
    client: reqwest::Client,
}

impl TestApp {
    async fn new() -> Self {
        Self {
            address: spawn_app().await,
            client: reqwest::Client::new(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    /// Registers a fresh account and returns its token.
    async fn register(&self, role: &str) -> String {
        let email = format!("{}_{}@example.com", role, uuid::Uuid::new_v4().simple());
        let response = self
            .client
            .post(self.url("/api/auth/register"))
            .json(&json!({
                "name": format!("Test {}", role),
                "email": email,
                "password": "password123",
                "role": role
            }))
            .send()
            .await
            .expect("Register failed");

        assert_eq!(response.status().as_u16(), 201);
        let body: Value = response.json().await.unwrap();
        body["token"].as_str().expect("Token not found").to_string()
    }

    async fn post(&self, path: &str, token: &str, body: Value) -> reqwest::Response {
        self.client
            .post(self.url(path))
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .expect("Failed to execute request")
    }

    async fn get(&self, path: &str, token: &str) -> reqwest::Response {
        self.client
            .get(self.url(path))
            .bearer_auth(token)
            .send()
            .await
            .expect("Failed to execute request")
    }

    async fn create(&self, path: &str, token: &str, body: Value) -> Value {
        let response = self.post(path, token, body).await;
        assert_eq!(response.status().as_u16(), 201, "POST {} failed", path);
        response.json().await.unwrap()
    }

    /// Quiz with a 1-point true/false, a 2-point multiple choice and a
    /// 2-point short answer question. Returns (quiz, [tf, mc, sa], correct
    /// tf option, wrong mc option).
    async fn seed_quiz(&self, admin: &str) -> (Value, Vec<Value>, Value, Value) {
        let quiz = self
            .create(
                "/api/admin/quizzes",
                admin,
                json!({ "title": "Rust Basics", "duration_minutes": 30, "passing_score": 50 }),
            )
            .await;

        let mut questions = Vec::new();
        for (text, kind, points) in [
            ("Rust has a garbage collector.", "true_false", 1),
            ("Which keyword declares a trait?", "multiple_choice", 2),
            ("Name the package manager.", "short_answer", 2),
        ] {
            questions.push(
                self.create(
                    "/api/admin/questions",
                    admin,
                    json!({
                        "quiz_id": quiz["id"],
                        "question_text": text,
                        "question_type": kind,
                        "points": points
                    }),
                )
                .await,
            );
        }

        let tf_false = self
            .create(
                "/api/admin/options",
                admin,
                json!({ "question_id": questions[0]["id"], "option_text": "False", "is_correct": true }),
            )
            .await;
        self.create(
            "/api/admin/options",
            admin,
            json!({ "question_id": questions[0]["id"], "option_text": "True", "is_correct": false, "order_num": 1 }),
        )
        .await;
        self.create(
            "/api/admin/options",
            admin,
            json!({ "question_id": questions[1]["id"], "option_text": "trait", "is_correct": true }),
        )
        .await;
        let mc_wrong = self
            .create(
                "/api/admin/options",
                admin,
                json!({ "question_id": questions[1]["id"], "option_text": "impl", "is_correct": false, "order_num": 1 }),
            )
            .await;

        (quiz, questions, tf_false, mc_wrong)
    }
}

#[tokio::test]
async fn health_check_404() {
    // Arrange
    let app = TestApp::new().await;

    // Act
    let response = app
        .client
        .get(app.url("/random_path_that_does_not_exist"))
        .send()
        .await
        .expect("Failed to execute request");

    // Assert
    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn health_check_works() {
    let app = TestApp::new().await;

    let response = app.client.get(app.url("/health")).send().await.unwrap();

    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["status"], "OK");
}

#[tokio::test]
async fn register_and_login_work() {
    let app = TestApp::new().await;

    let response = app
        .client
        .post(app.url("/api/auth/register"))
        .json(&json!({
            "name": "Ada",
            "email": "Ada@Example.com",
            "password": "password123",
            "role": "student"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 201);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["user"]["email"], "ada@example.com");
    assert!(body["user"].get("password").is_none());

    let login: Value = app
        .client
        .post(app.url("/api/auth/login"))
        .json(&json!({ "email": "ada@example.com", "password": "password123" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let token = login["token"].as_str().expect("Token not found");

    let me: Value = app.get("/api/auth/me", token).await.json().await.unwrap();
    assert_eq!(me["name"], "Ada");
    assert_eq!(me["role"], "student");
}

#[tokio::test]
async fn register_fails_validation() {
    let app = TestApp::new().await;

    // Act: Send an invalid email and a short password
    let response = app
        .client
        .post(app.url("/api/auth/register"))
        .json(&json!({
            "name": "yo",
            "email": "not-an-email",
            "password": "123",
            "role": "student"
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
async fn duplicate_email_is_conflict() {
    let app = TestApp::new().await;
    let body = json!({
        "name": "Twin",
        "email": "twin@example.com",
        "password": "password123",
        "role": "student"
    });

    let first = app.client.post(app.url("/api/auth/register")).json(&body).send().await.unwrap();
    let second = app.client.post(app.url("/api/auth/register")).json(&body).send().await.unwrap();

    assert_eq!(first.status().as_u16(), 201);
    assert_eq!(second.status().as_u16(), 409);
}

#[tokio::test]
async fn wrong_password_is_unauthorized() {
    let app = TestApp::new().await;
    app.client
        .post(app.url("/api/auth/register"))
        .json(&json!({
            "name": "Bob",
            "email": "bob@example.com",
            "password": "password123",
            "role": "student"
        }))
        .send()
        .await
        .unwrap();

    let response = app
        .client
        .post(app.url("/api/auth/login"))
        .json(&json!({ "email": "bob@example.com", "password": "nope-nope" }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 401);
}

#[tokio::test]
async fn malformed_json_is_bad_request() {
    let app = TestApp::new().await;

    let response = app
        .client
        .post(app.url("/api/auth/login"))
        .header("Content-Type", "application/json")
        .body("{ not json")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 400);
    let body: Value = response.json().await.unwrap();
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn protected_routes_require_token() {
    let app = TestApp::new().await;

    let attempts = app.client.get(app.url("/api/attempts")).send().await.unwrap();
    let admin = app.client.get(app.url("/api/admin/quizzes")).send().await.unwrap();
    let bogus = app.get("/api/attempts", "not-a-token").await;

    assert_eq!(attempts.status().as_u16(), 401);
    assert_eq!(admin.status().as_u16(), 401);
    assert_eq!(bogus.status().as_u16(), 401);
}

#[tokio::test]
async fn roles_are_enforced() {
    let app = TestApp::new().await;
    let student = app.register("student").await;
    let admin = app.register("admin").await;

    let student_on_admin = app
        .post("/api/admin/quizzes", &student, json!({ "title": "x", "duration_minutes": 5 }))
        .await;
    let admin_on_student = app
        .post("/api/attempts/start", &admin, json!({ "quiz_id": uuid::Uuid::new_v4() }))
        .await;

    assert_eq!(student_on_admin.status().as_u16(), 403);
    assert_eq!(admin_on_student.status().as_u16(), 403);
}

#[tokio::test]
async fn public_quiz_detail_hides_answer_key() {
    let app = TestApp::new().await;
    let admin = app.register("admin").await;
    let (quiz, _, _, _) = app.seed_quiz(&admin).await;

    let list: Vec<Value> = app
        .client
        .get(app.url("/api/quizzes"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(list.len(), 1);

    let detail: Value = app
        .client
        .get(app.url(&format!("/api/quizzes/{}", quiz["id"].as_str().unwrap())))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    let questions = detail["questions"].as_array().unwrap();
    assert_eq!(questions.len(), 3);
    for question in questions {
        for option in question["options"].as_array().unwrap() {
            assert!(option.get("is_correct").is_none());
        }
    }

    // The owner still sees the key.
    let full: Value = app
        .get(&format!("/api/admin/quizzes/{}", quiz["id"].as_str().unwrap()), &admin)
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(full["questions"][0]["options"][0]["is_correct"], true);
}

#[tokio::test]
async fn other_admin_cannot_edit_quiz() {
    let app = TestApp::new().await;
    let owner = app.register("admin").await;
    let intruder = app.register("admin").await;
    let (quiz, _, _, _) = app.seed_quiz(&owner).await;

    let response = app
        .client
        .put(app.url(&format!("/api/admin/quizzes/{}", quiz["id"].as_str().unwrap())))
        .bearer_auth(&intruder)
        .json(&json!({ "title": "Hijacked", "duration_minutes": 10 }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 403);
}

#[tokio::test]
async fn full_attempt_flow_grades_choice_questions() {
    let app = TestApp::new().await;
    let admin = app.register("admin").await;
    let student = app.register("student").await;
    let (quiz, questions, tf_false, mc_wrong) = app.seed_quiz(&admin).await;

    // 1. Start
    let attempt = app
        .create("/api/attempts/start", &student, json!({ "quiz_id": quiz["id"] }))
        .await;
    assert_eq!(attempt["status"], "in_progress");
    let attempt_id = attempt["id"].clone();

    // 2. Answer: tf correct, mc wrong, short answer free text
    for body in [
        json!({ "attempt_id": attempt_id, "question_id": questions[0]["id"], "selected_option_id": tf_false["id"] }),
        json!({ "attempt_id": attempt_id, "question_id": questions[1]["id"], "selected_option_id": mc_wrong["id"] }),
        json!({ "attempt_id": attempt_id, "question_id": questions[2]["id"], "answer_text": "cargo" }),
    ] {
        app.create("/api/attempts/answer", &student, body).await;
    }

    // 3. Submit
    let response = app
        .post("/api/attempts/submit", &student, json!({ "attempt_id": attempt_id }))
        .await;
    assert_eq!(response.status().as_u16(), 200);
    let graded: Value = response.json().await.unwrap();
    assert_eq!(graded["status"], "graded");
    assert_eq!(graded["score"], 1);
    assert_eq!(graded["total_points"], 5);
    assert!(graded["submitted_at"].is_string());

    // 4. Read back
    let detail: Value = app
        .get(&format!("/api/attempts/{}", attempt_id.as_str().unwrap()), &student)
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(detail["passed"], false);
    let answers = detail["answers"].as_array().unwrap();
    assert_eq!(answers.len(), 3);
    let short = answers
        .iter()
        .find(|a| a["question_id"] == questions[2]["id"])
        .unwrap();
    assert_eq!(short["is_correct"], Value::Null);
    assert_eq!(short["points_earned"], 0);

    // 5. The quiz owner sees the attempt
    let attempts: Vec<Value> = app
        .get(&format!("/api/admin/quizzes/{}/attempts", quiz["id"].as_str().unwrap()), &admin)
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(attempts.len(), 1);
    assert_eq!(attempts[0]["score"], 1);
}

#[tokio::test]
async fn closed_attempt_rejects_changes() {
    let app = TestApp::new().await;
    let admin = app.register("admin").await;
    let student = app.register("student").await;
    let (quiz, questions, tf_false, _) = app.seed_quiz(&admin).await;

    let attempt = app
        .create("/api/attempts/start", &student, json!({ "quiz_id": quiz["id"] }))
        .await;
    let submit = json!({ "attempt_id": attempt["id"] });

    let first = app.post("/api/attempts/submit", &student, submit.clone()).await;
    let second = app.post("/api/attempts/submit", &student, submit).await;
    let late_answer = app
        .post(
            "/api/attempts/answer",
            &student,
            json!({ "attempt_id": attempt["id"], "question_id": questions[0]["id"], "selected_option_id": tf_false["id"] }),
        )
        .await;

    assert_eq!(first.status().as_u16(), 200);
    assert_eq!(second.status().as_u16(), 409);
    assert_eq!(late_answer.status().as_u16(), 409);

    // Nothing answered: zero out of everything.
    let graded: Value = first.json().await.unwrap();
    assert_eq!(graded["score"], 0);
    assert_eq!(graded["total_points"], 5);
}

#[tokio::test]
async fn other_student_cannot_touch_attempt() {
    let app = TestApp::new().await;
    let admin = app.register("admin").await;
    let owner = app.register("student").await;
    let other = app.register("student").await;
    let (quiz, questions, tf_false, _) = app.seed_quiz(&admin).await;

    let attempt = app
        .create("/api/attempts/start", &owner, json!({ "quiz_id": quiz["id"] }))
        .await;
    let attempt_id = attempt["id"].as_str().unwrap();

    let answer = app
        .post(
            "/api/attempts/answer",
            &other,
            json!({ "attempt_id": attempt_id, "question_id": questions[0]["id"], "selected_option_id": tf_false["id"] }),
        )
        .await;
    let submit = app
        .post("/api/attempts/submit", &other, json!({ "attempt_id": attempt_id }))
        .await;
    let read = app.get(&format!("/api/attempts/{}", attempt_id), &other).await;
    let admin_read = app.get(&format!("/api/attempts/{}", attempt_id), &admin).await;

    assert_eq!(answer.status().as_u16(), 403);
    assert_eq!(submit.status().as_u16(), 403);
    assert_eq!(read.status().as_u16(), 403);
    assert_eq!(admin_read.status().as_u16(), 403);
}

#[tokio::test]
async fn answers_are_replaced_not_duplicated() {
    let app = TestApp::new().await;
    let admin = app.register("admin").await;
    let student = app.register("student").await;
    let (quiz, questions, tf_false, _) = app.seed_quiz(&admin).await;

    let attempt = app
        .create("/api/attempts/start", &student, json!({ "quiz_id": quiz["id"] }))
        .await;
    let detail: Value = app
        .get(&format!("/api/admin/quizzes/{}", quiz["id"].as_str().unwrap()), &admin)
        .await
        .json()
        .await
        .unwrap();
    let tf_true = detail["questions"][0]["options"][1]["id"].clone();

    for option in [tf_true, tf_false["id"].clone()] {
        app.create(
            "/api/attempts/answer",
            &student,
            json!({ "attempt_id": attempt["id"], "question_id": questions[0]["id"], "selected_option_id": option }),
        )
        .await;
    }

    let graded: Value = app
        .post("/api/attempts/submit", &student, json!({ "attempt_id": attempt["id"] }))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(graded["score"], 1);

    let read: Value = app
        .get(&format!("/api/attempts/{}", attempt["id"].as_str().unwrap()), &student)
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(read["answers"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn answer_shape_must_match_question_type() {
    let app = TestApp::new().await;
    let admin = app.register("admin").await;
    let student = app.register("student").await;
    let (quiz, questions, tf_false, _) = app.seed_quiz(&admin).await;

    let attempt = app
        .create("/api/attempts/start", &student, json!({ "quiz_id": quiz["id"] }))
        .await;

    // Text on a choice question.
    let text_on_choice = app
        .post(
            "/api/attempts/answer",
            &student,
            json!({ "attempt_id": attempt["id"], "question_id": questions[0]["id"], "answer_text": "False" }),
        )
        .await;
    // Option of another question.
    let foreign_option = app
        .post(
            "/api/attempts/answer",
            &student,
            json!({ "attempt_id": attempt["id"], "question_id": questions[1]["id"], "selected_option_id": tf_false["id"] }),
        )
        .await;
    // Missing attempt id.
    let missing_id = app
        .post(
            "/api/attempts/answer",
            &student,
            json!({ "question_id": questions[2]["id"], "answer_text": "cargo" }),
        )
        .await;

    assert_eq!(text_on_choice.status().as_u16(), 400);
    assert_eq!(foreign_option.status().as_u16(), 400);
    assert_eq!(missing_id.status().as_u16(), 400);
}

#[tokio::test]
async fn unknown_ids_are_not_found() {
    let app = TestApp::new().await;
    let student = app.register("student").await;
    let missing = uuid::Uuid::new_v4();

    let start = app
        .post("/api/attempts/start", &student, json!({ "quiz_id": missing }))
        .await;
    let submit = app
        .post("/api/attempts/submit", &student, json!({ "attempt_id": missing }))
        .await;
    let read = app.get(&format!("/api/attempts/{}", missing), &student).await;
    let public = app
        .client
        .get(app.url(&format!("/api/quizzes/{}", missing)))
        .send()
        .await
        .unwrap();

    assert_eq!(start.status().as_u16(), 404);
    assert_eq!(submit.status().as_u16(), 404);
    assert_eq!(read.status().as_u16(), 404);
    assert_eq!(public.status().as_u16(), 404);
}

#[tokio::test]
async fn deleting_quiz_removes_it_everywhere() {
    let app = TestApp::new().await;
    let admin = app.register("admin").await;
    let student = app.register("student").await;
    let (quiz, _, _, _) = app.seed_quiz(&admin).await;
    let quiz_id = quiz["id"].as_str().unwrap();

    let attempt = app
        .create("/api/attempts/start", &student, json!({ "quiz_id": quiz["id"] }))
        .await;

    let response = app
        .client
        .delete(app.url(&format!("/api/admin/quizzes/{}", quiz_id)))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 204);

    let public = app
        .client
        .get(app.url(&format!("/api/quizzes/{}", quiz_id)))
        .send()
        .await
        .unwrap();
    let read = app
        .get(&format!("/api/attempts/{}", attempt["id"].as_str().unwrap()), &student)
        .await;

    assert_eq!(public.status().as_u16(), 404);
    assert_eq!(read.status().as_u16(), 404);
}
