use std::sync::Arc;

use actix_web::middleware::NormalizePath;
use actix_web::web::Data;
use actix_web::{App, HttpServer, Responder, get};
use dotenvy::dotenv;

use absensi::config::{Config, StoreBackend};
use absensi::db;
use absensi::docs::ApiDoc;
use absensi::routes;
use absensi::service::attendance::AttendanceService;
use absensi::service::SystemClock;
use absensi::store::memory::{MemoryAttendanceStore, MemoryUserStore};
use absensi::store::mysql::{MySqlAttendanceStore, MySqlUserStore};
use absensi::store::{AttendanceStore, UserStore};

use tracing::info;
use tracing_appender::rolling;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[get("/")]
async fn index() -> impl Responder {
    actix_web::web::Json(serde_json::json!({
        "message": "Attendance service is running",
        "status": "OK"
    }))
}

async fn build_stores(config: &Config) -> (Arc<dyn AttendanceStore>, Arc<dyn UserStore>) {
    match config.store_backend {
        StoreBackend::Memory => {
            info!("Using in-memory store with demo accounts");
            (
                Arc::new(MemoryAttendanceStore::new()),
                Arc::new(MemoryUserStore::with_demo_users()),
            )
        }
        StoreBackend::Mysql => {
            let url = config
                .database_url
                .as_deref()
                .expect("DATABASE_URL must be set when STORE_BACKEND=mysql");
            let pool = db::init_db(url).await;
            db::migrate(&pool).await.expect("Failed to run migrations");
            info!("Using MySQL store");
            (
                Arc::new(MySqlAttendanceStore::new(pool.clone())),
                Arc::new(MySqlUserStore::new(pool)),
            )
        }
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();

    let config = Config::from_env();

    // Rolling daily log
    let file_appender = rolling::daily("logs", "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .with_target(false)
        .with_level(true)
        .pretty()
        .init();

    info!("Server starting...");

    let (attendance_store, user_store) = build_stores(&config).await;
    let service = Data::new(AttendanceService::new(
        attendance_store,
        Arc::new(SystemClock),
    ));
    let user_store_data: Data<dyn UserStore> = Data::from(user_store);

    let server_addr = config.server_addr.clone();
    let config_data = config.clone();

    HttpServer::new(move || {
        App::new()
            .wrap(actix_web::middleware::Logger::default())
            .wrap(NormalizePath::trim())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
            .app_data(Data::new(config.clone()))
            .app_data(service.clone())
            .app_data(user_store_data.clone())
            .service(index)
            .configure(|cfg| routes::configure(cfg, config_data.clone()))
    })
    .bind(server_addr)?
    .run()
    .await
}
