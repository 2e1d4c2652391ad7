mod catalog;
mod db;
mod money;
mod rate_limit;
mod routes;
mod services;
mod state;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL required");
    let port: u16 = std::env::var("PORT")
        .unwrap_or_else(|_| "3000".into())
        .parse()
        .expect("invalid PORT");

    let pool = db::init_pool(&database_url)
        .await
        .expect("database init failed");

    // Both sign-in providers are optional; missing config disables the route.
    let google = services::auth::GoogleConfig::from_env();
    if google.is_some() {
        tracing::info!("Google sign-in enabled");
    } else {
        tracing::warn!("GOOGLE_CLIENT_ID/GOOGLE_CLIENT_SECRET/GOOGLE_REDIRECT_URI not set; Google sign-in disabled");
    }

    let email = services::email_auth::EmailDelivery::from_env();
    if email.is_some() {
        tracing::info!("sign-in code delivery via Resend enabled");
    } else {
        tracing::warn!("RESEND_API_KEY/RESEND_FROM not set; sign-in codes are only logged");
    }

    let state = state::AppState::new(pool, google, email);

    let app = routes::app(state);
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}"))
        .await
        .expect("failed to bind");

    tracing::info!(%port, "pocketbook listening");
    axum::serve(listener, app).await.expect("server failed");
}
