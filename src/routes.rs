// src/routes.rs

use axum::{
    Router,
    http::{HeaderValue, Method, header},
    middleware,
    routing::{delete, get, post},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{self, admin, attempt, auth, quiz},
    state::AppState,
    utils::jwt::{admin_middleware, auth_middleware, student_middleware},
};

/// Assembles the main application router.
///
/// * Merges all sub-routers (auth, quizzes, attempts, admin).
/// * Applies global middleware (Trace, CORS).
/// * Injects global state (repositories + config).
pub fn create_router(state: AppState) -> Router {
    let origins: Vec<HeaderValue> = state
        .config
        .cors_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    let auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .merge(
            Router::new()
                .route("/me", get(auth::me))
                .layer(middleware::from_fn_with_state(state.clone(), auth_middleware)),
        );

    let quiz_routes = Router::new()
        .route("/", get(quiz::list_quizzes))
        .route("/{id}", get(quiz::get_quiz));

    let attempt_routes = Router::new()
        .route("/", get(attempt::list_my_attempts))
        .route("/start", post(attempt::start_attempt))
        .route("/answer", post(attempt::record_answer))
        .route("/submit", post(attempt::submit_attempt))
        .layer(middleware::from_fn(student_middleware))
        // Any authenticated user; ownership is enforced in the handler.
        .merge(Router::new().route("/{id}", get(attempt::get_attempt)))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    let admin_routes = Router::new()
        .route("/quizzes", get(admin::list_my_quizzes).post(admin::create_quiz))
        .route(
            "/quizzes/{id}",
            get(admin::get_quiz)
                .put(admin::update_quiz)
                .delete(admin::delete_quiz),
        )
        .route("/quizzes/{id}/attempts", get(admin::list_quiz_attempts))
        .route("/questions", post(admin::create_question))
        .route(
            "/questions/{id}",
            delete(admin::delete_question).put(admin::update_question),
        )
        .route("/options", post(admin::create_option))
        .route("/options/{id}", delete(admin::delete_option))
        .route("/students", get(admin::list_students))
        // Double middleware protection: Auth first, then Admin check
        .layer(middleware::from_fn(admin_middleware))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .route("/health", get(handlers::health))
        .nest("/api/auth", auth_routes)
        .nest("/api/quizzes", quiz_routes)
        .nest("/api/attempts", attempt_routes)
        .nest("/api/admin", admin_routes)
        // Global Middleware (applied from outside in)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
