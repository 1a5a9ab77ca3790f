#![cfg(feature = "sqlite")]

use std::{path::PathBuf, sync::Arc};

use yap_auth::{
    Gender, JwtConfig, NewUser, PasswordHasher, RepositoryConfig, RepositoryType,
    SqliteUserRepository, TokenFactory, UserId, UserProfile, UserRepository, YapAuth,
    YapAuthConfig, build_repository,
};

fn config(seed_dataset: Option<PathBuf>) -> YapAuthConfig {
    let _ = tracing_subscriber::fmt().try_init();

    let mut config = YapAuthConfig::from_toml(
        r#"
        [repository]
        kind = "relational"
        connection_string = "sqlite::memory:"

        [token.signing]
        strategy = "shared-secret"
        secret = "sqlite-integration-secret"
        "#,
    )
    .unwrap();
    config.repository.seed_dataset = seed_dataset;
    config
}

/// Write `json` to a uniquely named file in the temp directory.
fn write_seed(json: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!("yap-auth-seed-{}.json", UserId::new_random()));
    std::fs::write(&path, json).unwrap();
    path
}

#[tokio::test]
async fn test_sqlite_register_and_login() {
    let auth = YapAuth::from_config(&config(None)).await.unwrap();

    let registration = auth
        .register(
            NewUser::builder()
                .email("linus@example.com")
                .username("linus")
                .password("penguin")
                .profile(Some(UserProfile::new(
                    Gender::Male,
                    54,
                    vec!["kernels".to_string()],
                )))
                .build()
                .unwrap(),
        )
        .await
        .unwrap();

    let token = auth.login("linus@example.com", "penguin").await.unwrap();
    let claims = auth.validate_token(&token).unwrap();
    assert_eq!(claims.user_id(), registration.user_id);

    let user = auth.get_user(&registration.user_id).await.unwrap();
    assert_eq!(user.profile.unwrap().topics, vec!["kernels".to_string()]);

    assert!(
        auth.login("linus@example.com", "walrus")
            .await
            .unwrap_err()
            .is_invalid_credentials()
    );
}

#[tokio::test]
async fn test_sqlite_seed_dataset() {
    let hasher = PasswordHasher::new().unwrap();
    let path = write_seed(&format!(
        r#"[
            {{"id": "usr_seed_ada", "email": "ada@example.com", "username": "ada",
              "saltedHash": "{ada}",
              "profile": {{"gender": "female", "age": 36, "topics": ["math"]}}}},
            {{"email": "bob@example.com", "username": "bob-old", "saltedHash": "{bob}"}},
            {{"email": "bob@example.com", "username": "bob", "saltedHash": "{bob}"}}
        ]"#,
        ada = hasher.hash("engine").unwrap(),
        bob = hasher.hash("builder").unwrap(),
    ));

    let auth = YapAuth::from_config(&config(Some(path.clone()))).await.unwrap();
    std::fs::remove_file(&path).unwrap();

    let token = auth.login("ada@example.com", "engine").await.unwrap();
    assert_eq!(auth.validate_token(&token).unwrap().sub, "usr_seed_ada");

    let ada = auth.get_user(&UserId::new("usr_seed_ada")).await.unwrap();
    assert_eq!(
        ada.profile,
        Some(UserProfile::new(Gender::Female, 36, vec!["math".to_string()]))
    );

    let token = auth.login("bob@example.com", "builder").await.unwrap();
    assert_eq!(auth.validate_token(&token).unwrap().username, "bob");
}

#[tokio::test]
async fn test_sqlite_invalid_seed_is_fatal() {
    let path = write_seed(r#"[{"email": "", "username": "nobody", "saltedHash": "x"}]"#);

    let result = YapAuth::from_config(&config(Some(path.clone()))).await;
    std::fs::remove_file(&path).unwrap();

    assert!(matches!(result, Err(yap_auth::BuilderError::Seed(_))));
}

#[tokio::test]
async fn test_sqlite_required_profile() {
    let repository = build_repository(&RepositoryConfig {
        kind: RepositoryType::Relational,
        connection_string: Some("sqlite::memory:".to_string()),
        require_profile: true,
        ..Default::default()
    })
    .await
    .unwrap();

    let err = repository
        .new_user(
            NewUser::builder()
                .email("linus@example.com")
                .username("linus")
                .password("penguin")
                .build()
                .unwrap(),
        )
        .await
        .unwrap_err();
    assert!(err.is_validation_error());
}

#[tokio::test]
async fn test_sqlite_without_migrations_fails_on_use() {
    let repository = build_repository(&RepositoryConfig {
        kind: RepositoryType::Relational,
        connection_string: Some("sqlite::memory:".to_string()),
        apply_migrations: false,
        ..Default::default()
    })
    .await
    .unwrap();

    let err = repository
        .authenticate("linus@example.com", "penguin")
        .await
        .unwrap_err();
    assert!(err.is_storage_error());

    repository.migrate().await.unwrap();
    assert!(
        repository
            .authenticate("linus@example.com", "penguin")
            .await
            .unwrap()
            .is_none()
    );
}

/// Register the same email from 16 tasks at once against the database at `url`.
async fn assert_single_winner(url: &str) {
    let _ = tracing_subscriber::fmt().try_init();

    let repository = Arc::new(SqliteUserRepository::connect(url).await.unwrap());
    repository.migrate().await.unwrap();
    let auth = YapAuth::new(
        repository.clone(),
        Arc::new(TokenFactory::new(JwtConfig::new_hs256(b"sqlite-race".to_vec())).unwrap()),
    );

    let handles: Vec<_> = (0..16)
        .map(|i| {
            let auth = auth.clone();
            tokio::spawn(async move {
                auth.register(
                    NewUser::builder()
                        .email("race@example.com")
                        .username("racer")
                        .password(format!("password-{i}"))
                        .build()
                        .unwrap(),
                )
                .await
            })
        })
        .collect();

    let mut created = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => created += 1,
            Err(e) => assert!(e.is_conflict(), "unexpected error: {e:?}"),
        }
    }
    assert_eq!(created, 1);

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM login WHERE email = ?1")
        .bind("race@example.com")
        .fetch_one(repository.pool())
        .await
        .unwrap();
    assert_eq!(count, 1);

    repository.pool().close().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_sqlite_concurrent_registration_in_memory() {
    assert_single_winner("sqlite::memory:").await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_sqlite_concurrent_registration_on_disk() {
    let path = std::env::temp_dir().join(format!("yap-auth-race-{}.db", UserId::new_random()));

    assert_single_winner(&format!("sqlite://{}", path.display())).await;

    for suffix in ["", "-wal", "-shm"] {
        let _ = std::fs::remove_file(format!("{}{suffix}", path.display()));
    }
}
