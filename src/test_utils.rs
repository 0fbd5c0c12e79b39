#[cfg(test)]
pub mod test_utils {
    use crate::auth::{AuthConfig, hash_password};
    use crate::router::create_router;
    use crate::schemas::AppState;
    use axum::Router;
    use axum_test::TestServer;
    use chrono::Utc;
    use migration::{Migrator, MigratorTrait};
    use model::entities::user;
    use sea_orm::{ActiveModelTrait, ConnectionTrait, Database, DatabaseConnection, Set, Statement};
    use tracing::Level;
    use tracing_subscriber::FmtSubscriber;

    pub const ADMIN_USERNAME: &str = "tpo_admin";
    pub const ADMIN_PASSWORD: &str = "admin-pass-123";

    /// Create an in-memory SQLite database for testing
    pub async fn setup_test_db() -> DatabaseConnection {
        let db = Database::connect("sqlite::memory:")
            .await
            .expect("Failed to connect to in-memory database");

        // SQLite only enforces foreign keys when asked to
        db.execute(Statement::from_string(
            db.get_database_backend(),
            "PRAGMA foreign_keys = ON;".to_string(),
        ))
        .await
        .expect("Failed to enable foreign keys");

        Migrator::up(&db, None)
            .await
            .expect("Failed to run migrations");

        db
    }

    /// Create AppState for testing, with a seeded admin account
    pub async fn setup_test_app_state() -> AppState {
        let db = setup_test_db().await;

        let now = Utc::now();
        let admin = user::ActiveModel {
            username: Set(ADMIN_USERNAME.to_string()),
            email: Set("tpo@college.edu".to_string()),
            password_hash: Set(hash_password(ADMIN_PASSWORD)),
            first_name: Set("Placement".to_string()),
            last_name: Set("Officer".to_string()),
            role: Set(user::UserRole::Admin),
            phone: Set("9000000000".to_string()),
            is_verified: Set(true),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };
        admin.insert(&db).await.expect("Failed to create admin account");

        AppState {
            db,
            auth: AuthConfig::new("test-secret", 3600, 7200),
        }
    }

    /// Initialize tracing for tests with output to STDERR.
    fn init_test_tracing() -> tracing::subscriber::DefaultGuard {
        let log_level = std::env::var("RUST_LOG")
            .ok()
            .and_then(|level| match level.to_uppercase().as_str() {
                "ERROR" => Some(Level::ERROR),
                "WARN" => Some(Level::WARN),
                "INFO" => Some(Level::INFO),
                "DEBUG" => Some(Level::DEBUG),
                "TRACE" => Some(Level::TRACE),
                _ => None,
            })
            .unwrap_or(Level::WARN);

        let subscriber = FmtSubscriber::builder()
            .with_max_level(log_level)
            .with_writer(std::io::stderr)
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    /// Create axum app for testing
    pub async fn setup_test_app() -> Router {
        let _ = init_test_tracing();
        let state = setup_test_app_state().await;
        create_router(state)
    }

    /// Create axum app for testing, keeping the state for direct DB access
    pub async fn setup_test_app_with_state() -> (Router, AppState) {
        let _ = init_test_tracing();
        let state = setup_test_app_state().await;
        (create_router(state.clone()), state)
    }

    /// Log in through the API and return the (access, refresh) token pair
    pub async fn login(server: &TestServer, username: &str, password: &str) -> (String, String) {
        let response = server
            .post("/api/auth/login")
            .json(&serde_json::json!({
                "username": username,
                "password": password,
            }))
            .await;
        assert_eq!(
            response.status_code(),
            200,
            "login failed for {}: {}",
            username,
            response.text()
        );
        let body: serde_json::Value = response.json();
        (
            body["data"]["tokens"]["access"].as_str().unwrap().to_string(),
            body["data"]["tokens"]["refresh"].as_str().unwrap().to_string(),
        )
    }

    /// Access token for the seeded admin account
    pub async fn admin_token(server: &TestServer) -> String {
        login(server, ADMIN_USERNAME, ADMIN_PASSWORD).await.0
    }

    /// Register a student-role account through the API and return its access
    /// token
    pub async fn register_student_account(
        server: &TestServer,
        username: &str,
        email: &str,
        password: &str,
    ) -> String {
        let response = server
            .post("/api/auth/register")
            .json(&serde_json::json!({
                "username": username,
                "email": email,
                "password": password,
                "password2": password,
                "first_name": "Test",
                "last_name": "Student",
                "role": "STUDENT",
            }))
            .await;
        assert_eq!(
            response.status_code(),
            201,
            "registration failed for {}: {}",
            username,
            response.text()
        );
        let body: serde_json::Value = response.json();
        body["data"]["tokens"]["access"].as_str().unwrap().to_string()
    }
}
