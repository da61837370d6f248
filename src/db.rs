use sqlx::MySqlPool;

pub async fn init_db(database_url: &str) -> MySqlPool {
    MySqlPool::connect(database_url)
        .await
        .expect("Failed to connect to database")
}

/// Bootstraps the schema on startup. The unique keys carry the two
/// invariants the stores depend on: one attendance record per
/// (user_id, date) and one account per email.
pub async fn migrate(pool: &MySqlPool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id              CHAR(36)     PRIMARY KEY,
            name            VARCHAR(100) NOT NULL,
            email           VARCHAR(255) NOT NULL,
            password_hash   VARCHAR(255) NOT NULL,
            role            VARCHAR(16)  NOT NULL,
            position        VARCHAR(100) NOT NULL,
            department      VARCHAR(100) NOT NULL,
            is_active       BOOLEAN      NOT NULL DEFAULT TRUE,
            created_at      TIMESTAMP    NOT NULL,
            updated_at      TIMESTAMP    NOT NULL,
            UNIQUE KEY uq_users_email (email)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS attendance (
            id                  CHAR(36)    PRIMARY KEY,
            user_id             CHAR(36)    NOT NULL,
            date                DATE        NOT NULL,
            check_in_time       TIMESTAMP   NULL,
            check_in_latitude   DOUBLE      NULL,
            check_in_longitude  DOUBLE      NULL,
            check_in_address    VARCHAR(500) NULL,
            check_out_time      TIMESTAMP   NULL,
            check_out_latitude  DOUBLE      NULL,
            check_out_longitude DOUBLE      NULL,
            check_out_address   VARCHAR(500) NULL,
            working_hours       DOUBLE      NULL,
            status              VARCHAR(16) NOT NULL DEFAULT 'present',
            UNIQUE KEY uq_attendance_user_date (user_id, date)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}
