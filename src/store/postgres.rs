use super::{
    CredentialStore, DEFAULT_ROLE, NewUser, PasswordHasher, PasswordPolicy, StoreError,
    StoreFuture, User, ValidationError, normalize_username, validate_registration,
};
use sqlx::{Connection, PgPool, Row, postgres::PgPoolOptions, postgres::PgRow};
use std::time::Duration;
use tracing::{Instrument, debug, error, info_span};
use uuid::Uuid;

const SCHEMA_SQL: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/sql/schema.sql"));

/// `PostgreSQL` backed store. Uniqueness is enforced by the
/// `users_normalized_username_key` index, so concurrent registrations of the
/// same name cannot both succeed.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
    hasher: PasswordHasher,
    policy: PasswordPolicy,
}

impl PgStore {
    #[must_use]
    pub fn new(pool: PgPool, hasher: PasswordHasher, policy: PasswordPolicy) -> Self {
        Self {
            pool,
            hasher,
            policy,
        }
    }

    /// Connect a small pool to `dsn`.
    ///
    /// # Errors
    /// Returns [`StoreError::Database`] if the first connection fails.
    pub async fn connect(
        dsn: &str,
        hasher: PasswordHasher,
        policy: PasswordPolicy,
    ) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .min_connections(1)
            .max_connections(5)
            .max_lifetime(Duration::from_secs(60 * 2))
            .test_before_acquire(true)
            .connect(dsn)
            .await?;

        Ok(Self::new(pool, hasher, policy))
    }

    /// Apply `sql/schema.sql`. Every statement is idempotent.
    ///
    /// # Errors
    /// Returns [`StoreError::Database`] if a statement fails.
    pub async fn migrate(&self) -> Result<(), StoreError> {
        for statement in split_sql_statements(SCHEMA_SQL) {
            sqlx::query(&statement).execute(&self.pool).await?;
        }
        Ok(())
    }

    async fn user_exists(&self, normalized: &str) -> Result<bool, sqlx::Error> {
        let query = "SELECT EXISTS(SELECT 1 FROM users WHERE normalized_username = $1) AS exists";
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = query
        );
        let row = sqlx::query(query)
            .bind(normalized)
            .fetch_one(&self.pool)
            .instrument(span)
            .await?;
        row.try_get("exists")
    }

    async fn fetch_password_hash(&self, id: Uuid) -> Result<Option<String>, sqlx::Error> {
        let query = "SELECT password_hash FROM users WHERE id = $1";
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = query
        );
        let row = sqlx::query(query)
            .bind(id)
            .fetch_optional(&self.pool)
            .instrument(span)
            .await?;
        row.map(|row| row.try_get("password_hash")).transpose()
    }
}

fn user_from_row(row: &PgRow) -> Result<User, sqlx::Error> {
    Ok(User {
        id: row.try_get("id")?,
        username: row.try_get("username")?,
        email: row.try_get("email")?,
        role: row.try_get("role")?,
        password_hash: row.try_get("password_hash")?,
    })
}

impl CredentialStore for PgStore {
    fn create<'a>(&'a self, user: NewUser, password: &'a str) -> StoreFuture<'a, User> {
        Box::pin(async move {
            let errors =
                validate_registration(&user.username, user.email.as_deref(), password, &self.policy);
            if !errors.is_empty() {
                return Err(StoreError::Validation(errors));
            }

            let username = user.username;
            let normalized = normalize_username(&username);

            if self.user_exists(&normalized).await? {
                debug!("User already exists");
                return Err(StoreError::Validation(vec![
                    ValidationError::duplicate_username(&username),
                ]));
            }

            let password_hash = self.hasher.hash(password).await?;

            let query = r"
                INSERT INTO users (id, username, normalized_username, email, password_hash, role)
                VALUES ($1, $2, $3, $4, $5, $6)
                RETURNING id, username, email, role, password_hash
            ";
            let span = info_span!(
                "db.query",
                db.system = "postgresql",
                db.operation = "INSERT",
                db.statement = query
            );
            let result = sqlx::query(query)
                .bind(Uuid::new_v4())
                .bind(&username)
                .bind(&normalized)
                .bind(user.email.as_deref())
                .bind(&password_hash)
                .bind(DEFAULT_ROLE)
                .fetch_one(&self.pool)
                .instrument(span)
                .await;

            match result {
                Ok(row) => Ok(user_from_row(&row)?),
                Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                    debug!("Lost registration race for {}", normalized);
                    Err(StoreError::Validation(vec![
                        ValidationError::duplicate_username(&username),
                    ]))
                }
                Err(e) => {
                    error!("Error inserting user: {:?}", e);
                    Err(e.into())
                }
            }
        })
    }

    fn find_by_name<'a>(&'a self, username: &'a str) -> StoreFuture<'a, Option<User>> {
        Box::pin(async move {
            let query = r"
                SELECT id, username, email, role, password_hash
                FROM users
                WHERE normalized_username = $1
            ";
            let span = info_span!(
                "db.query",
                db.system = "postgresql",
                db.operation = "SELECT",
                db.statement = query
            );
            let row = sqlx::query(query)
                .bind(normalize_username(username))
                .fetch_optional(&self.pool)
                .instrument(span)
                .await?;

            Ok(row.as_ref().map(user_from_row).transpose()?)
        })
    }

    fn verify_password<'a>(&'a self, user: &'a User, password: &'a str) -> StoreFuture<'a, bool> {
        Box::pin(async move {
            // Re-read the hash so a stale or hand-built `User` cannot supply its own.
            match self.fetch_password_hash(user.id).await? {
                Some(hash) => self.hasher.verify(&hash, password).await,
                None => Ok(false),
            }
        })
    }

    fn ping(&self) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            let acquire_span = info_span!(
                "db.acquire",
                db.system = "postgresql",
                db.operation = "ACQUIRE"
            );
            let mut conn = self.pool.acquire().instrument(acquire_span).await?;

            let ping_span = info_span!("db.ping", db.system = "postgresql", db.operation = "PING");
            conn.ping().instrument(ping_span).await?;

            Ok(())
        })
    }

    fn kind(&self) -> &'static str {
        "postgres"
    }
}

/// Split a schema file into statements. Assumes statements end with `;` at end
/// of line and skips `psql` `\ir` includes.
fn split_sql_statements(sql: &str) -> Vec<String> {
    let mut statements = Vec::new();
    let mut current = String::new();

    for line in sql.lines() {
        let trimmed = line.trim();
        if trimmed.starts_with("\\ir ") || trimmed.starts_with("--") {
            continue;
        }
        current.push_str(line);
        current.push('\n');

        if trimmed.ends_with(';') {
            let statement = current.trim();
            if !statement.is_empty() {
                statements.push(statement.to_string());
            }
            current.clear();
        }
    }

    let leftover = current.trim();
    if !leftover.is_empty() {
        statements.push(leftover.to_string());
    }

    statements
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{Context, Result, anyhow};
    use argon2::Params;

    #[test]
    fn schema_splits_into_table_and_index() {
        let statements = split_sql_statements(SCHEMA_SQL);
        assert_eq!(statements.len(), 2);
        assert!(statements[0].starts_with("CREATE TABLE IF NOT EXISTS users"));
        assert!(statements[1].contains("UNIQUE INDEX"));
        assert!(statements[1].contains("normalized_username"));
    }

    #[test]
    fn split_keeps_unterminated_tail() {
        let statements = split_sql_statements("SELECT 1;\n-- note\nSELECT 2");
        assert_eq!(statements, vec!["SELECT 1;", "SELECT 2"]);
    }

    /// Connects to `TESSERA_TEST_DSN` when set. Tests return early otherwise.
    async fn test_store() -> Result<Option<PgStore>> {
        let Ok(dsn) = std::env::var("TESSERA_TEST_DSN") else {
            eprintln!("Skipping postgres test: TESSERA_TEST_DSN not set");
            return Ok(None);
        };
        let params = Params::new(8, 1, 1, None).map_err(|e| anyhow!(e))?;
        let store = PgStore::connect(&dsn, PasswordHasher::new(params), PasswordPolicy::default())
            .await
            .context("failed to connect test pool")?;
        store.migrate().await.context("failed to apply schema")?;
        Ok(Some(store))
    }

    fn unique_name(prefix: &str) -> String {
        format!("{prefix}-{}", Uuid::new_v4().simple())
    }

    #[tokio::test]
    async fn create_find_verify_round_trip() -> Result<()> {
        let Some(store) = test_store().await? else {
            return Ok(());
        };
        let name = unique_name("Alice");
        let created = store.create(NewUser::new(&name), "Str0ng!Pw").await?;
        assert_eq!(created.role, DEFAULT_ROLE);

        let found = store
            .find_by_name(&name.to_uppercase())
            .await?
            .context("user not found")?;
        assert_eq!(found.id, created.id);
        assert!(store.verify_password(&found, "Str0ng!Pw").await?);
        assert!(!store.verify_password(&found, "wrong").await?);
        store.ping().await?;
        Ok(())
    }

    #[tokio::test]
    async fn duplicate_is_rejected() -> Result<()> {
        let Some(store) = test_store().await? else {
            return Ok(());
        };
        let name = unique_name("bob");
        let original = store.create(NewUser::new(&name), "Str0ng!Pw").await?;
        let result = store.create(NewUser::new(name.to_uppercase()), "0ther!Pw").await;
        assert!(matches!(
            result,
            Err(StoreError::Validation(ref errors)) if errors[0].code == "DuplicateUserName"
        ));

        let found = store.find_by_name(&name).await?.context("user not found")?;
        assert_eq!(found.id, original.id);
        assert!(store.verify_password(&found, "Str0ng!Pw").await?);
        Ok(())
    }

    #[tokio::test]
    async fn unreachable_database_fails_ping() -> Result<()> {
        let pool = PgPoolOptions::new()
            .acquire_timeout(Duration::from_millis(200))
            .connect_lazy("postgres://tessera@127.0.0.1:1/tessera")?;
        let store = PgStore::new(pool, PasswordHasher::default(), PasswordPolicy::default());
        assert!(matches!(store.ping().await, Err(StoreError::Database(_))));
        assert!(matches!(
            store.find_by_name("alice").await,
            Err(StoreError::Database(_))
        ));
        Ok(())
    }
}
