// src/routes.rs

use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method, header},
    middleware,
    routing::{get, post, put},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    config::MAX_UPLOAD_BYTES,
    handlers::{
        admin, auth, bid, crew, files, marketplace, message, notification, review, specialist,
        tender, user,
    },
    state::AppState,
    utils::jwt::admin_middleware,
};

/// Request body cap for uploads: the base64 form of a max-size file plus JSON overhead.
const UPLOAD_BODY_LIMIT: usize = MAX_UPLOAD_BYTES / 3 * 4 + 64 * 1024;

/// Assembles the main application router.
///
/// * Mounts every sub-router under `/api`.
/// * Protects `/api/admin` with the admin middleware.
/// * Applies global middleware (Trace, CORS).
pub fn create_router(state: AppState) -> Router {
    let origins: Vec<HeaderValue> = state
        .config
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    let auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/me", get(auth::me));

    let user_routes = Router::new()
        .route("/me", put(user::update_me))
        .route("/top-specialists", get(user::top_specialists))
        .route("/{id}", get(user::get_user));

    let tender_routes = Router::new()
        .route("/", get(tender::list_tenders).post(tender::create_tender))
        .route(
            "/{id}",
            get(tender::get_tender)
                .put(tender::update_tender)
                .delete(tender::delete_tender),
        )
        .route(
            "/{id}/bids",
            get(bid::list_tender_bids).post(bid::create_bid),
        )
        .route("/bids/my", get(bid::list_my_bids))
        .route("/bids/{id}/approve", post(bid::approve_bid))
        .route("/bids/{id}/reject", post(bid::reject_bid));

    let marketplace_routes = Router::new()
        .route(
            "/",
            get(marketplace::list_listings).post(marketplace::create_listing),
        )
        .route(
            "/{id}",
            get(marketplace::get_listing)
                .put(marketplace::update_listing)
                .delete(marketplace::delete_listing),
        );

    let message_routes = Router::new()
        .route(
            "/",
            get(message::list_conversations).post(message::send_message),
        )
        .route("/{user_id}", get(message::get_conversation))
        .route("/{user_id}/read", put(message::mark_conversation_read));

    let notification_routes = Router::new()
        .route("/", get(notification::list_notifications))
        .route("/unread-count", get(notification::unread_count))
        .route("/read-all", put(notification::mark_all_read))
        .route("/{id}/read", put(notification::mark_read));

    let review_routes = Router::new()
        .route("/", post(review::create_review))
        .route("/user/{id}", get(review::list_user_reviews));

    let specialist_routes = Router::new()
        .route(
            "/",
            get(specialist::list_specialists).post(specialist::create_specialist),
        )
        .route(
            "/{id}",
            get(specialist::get_specialist)
                .put(specialist::update_specialist)
                .delete(specialist::delete_specialist),
        );

    let crew_routes = Router::new()
        .route("/", get(crew::list_crews).post(crew::create_crew))
        .route(
            "/{id}",
            get(crew::get_crew)
                .put(crew::update_crew)
                .delete(crew::delete_crew),
        );

    let admin_routes = Router::new()
        .route("/users", get(admin::list_users))
        .route("/users/{id}", put(admin::update_user))
        .route("/stats", get(admin::stats))
        .route("/moderation/{kind}", get(admin::moderation_queue))
        .route("/moderation/{kind}/{id}/approve", post(admin::approve))
        .route("/moderation/{kind}/{id}/reject", post(admin::reject))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            admin_middleware,
        ));

    Router::new()
        .route(
            "/api/upload",
            post(files::upload).layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT)),
        )
        .route("/api/files/{filename}", get(files::serve))
        .nest("/api/auth", auth_routes)
        .nest("/api/users", user_routes)
        .nest("/api/tenders", tender_routes)
        .nest("/api/marketplace", marketplace_routes)
        .nest("/api/messages", message_routes)
        .nest("/api/notifications", notification_routes)
        .nest("/api/reviews", review_routes)
        .nest("/api/specialists", specialist_routes)
        .nest("/api/crews", crew_routes)
        .nest("/api/admin", admin_routes)
        // Global Middleware (applied from outside in)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
