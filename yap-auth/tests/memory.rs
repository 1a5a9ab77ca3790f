use std::{sync::Arc, time::Duration as StdDuration};

use chrono::Duration;
use yap_auth::{
    Gender, InMemoryUserRepository, JwtConfig, NewUser, TokenFactory, UserId, UserProfile,
    YapAuth,
};

const TEST_HS256_SECRET: &[u8] = b"this_is_a_test_secret_key_for_hs256_jwt_tokens_not_for_prod";

fn auth_with_lifetime(lifetime: Duration) -> YapAuth {
    let _ = tracing_subscriber::fmt().try_init();

    let repository = Arc::new(InMemoryUserRepository::new().unwrap());
    let tokens = TokenFactory::new(
        JwtConfig::new_hs256(TEST_HS256_SECRET.to_vec())
            .with_issuer("yap-auth-test")
            .with_lifetime(lifetime),
    )
    .unwrap();

    YapAuth::new(repository, Arc::new(tokens))
}

fn auth() -> YapAuth {
    auth_with_lifetime(JwtConfig::DEFAULT_LIFETIME)
}

fn profile() -> UserProfile {
    UserProfile::new(Gender::Female, 27, vec!["climbing".to_string()])
}

fn new_user(email: &str, password: &str) -> NewUser {
    NewUser::builder()
        .email(email)
        .username("grace")
        .password(password)
        .profile(Some(profile()))
        .build()
        .unwrap()
}

#[tokio::test]
async fn test_register_issues_token_for_new_user() {
    let auth = auth();

    let registration = auth
        .register(new_user("grace@example.com", "hunter22"))
        .await
        .unwrap();

    let claims = auth.validate_token(&registration.token).unwrap();
    assert_eq!(claims.user_id(), registration.user_id);
    assert_eq!(claims.email, "grace@example.com");
    assert_eq!(claims.username, "grace");
    assert_eq!(claims.iss.as_deref(), Some("yap-auth-test"));
    assert_eq!(claims.exp - claims.iat, 3600);
}

#[tokio::test]
async fn test_login() {
    let auth = auth();
    let registration = auth
        .register(new_user("grace@example.com", "hunter22"))
        .await
        .unwrap();

    let token = auth.login("grace@example.com", "hunter22").await.unwrap();
    let claims = auth.validate_token(&token).unwrap();
    assert_eq!(claims.sub, registration.user_id.to_string());

    let err = auth
        .login("grace@example.com", "hunter23")
        .await
        .unwrap_err();
    assert!(err.is_invalid_credentials());

    let err = auth.login("nobody@example.com", "hunter22").await.unwrap_err();
    assert!(err.is_invalid_credentials());

    let err = auth.login("grace@example.com", "").await.unwrap_err();
    assert!(err.is_validation_error());
}

#[tokio::test]
async fn test_duplicate_registration() {
    let auth = auth();
    auth.register(new_user("grace@example.com", "hunter22"))
        .await
        .unwrap();

    let err = auth
        .register(new_user("grace@example.com", "different"))
        .await
        .unwrap_err();
    assert!(err.is_conflict());

    // The first password still works
    auth.login("grace@example.com", "hunter22").await.unwrap();
}

#[tokio::test]
async fn test_get_user_and_update_profile() {
    let auth = auth();
    let registration = auth
        .register(new_user("grace@example.com", "hunter22"))
        .await
        .unwrap();

    let user = auth.get_user(&registration.user_id).await.unwrap();
    assert_eq!(user.email, "grace@example.com");
    assert_eq!(user.profile, Some(profile()));

    let replacement = UserProfile::new(Gender::NonBinary, 28, vec!["bouldering".to_string()]);
    auth.update_profile(&registration.user_id, replacement.clone())
        .await
        .unwrap();

    let err = auth
        .update_profile(
            &registration.user_id,
            UserProfile::new(Gender::NonBinary, 28, vec![]),
        )
        .await
        .unwrap_err();
    assert!(err.is_validation_error());

    let user = auth.get_user(&registration.user_id).await.unwrap();
    assert_eq!(user.profile, Some(replacement));

    let err = auth.get_user(&UserId::new("usr_missing")).await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_refresh_session() {
    let auth = auth();
    let registration = auth
        .register(new_user("grace@example.com", "hunter22"))
        .await
        .unwrap();

    let claims = auth.validate_token(&registration.token).unwrap();
    let refreshed = auth.refresh_session(&claims).unwrap();
    let refreshed_claims = auth.validate_token(&refreshed).unwrap();
    assert_eq!(refreshed_claims.sub, claims.sub);
    assert!(refreshed_claims.exp >= claims.exp);

    let refreshed = auth.refresh_token(&registration.token).unwrap();
    assert_eq!(auth.validate_token(&refreshed).unwrap().sub, claims.sub);

    assert!(auth.refresh_token("garbage").unwrap_err().is_invalid_token());
}

#[tokio::test]
async fn test_expired_token_is_rejected() {
    let auth = auth_with_lifetime(Duration::seconds(1));
    let registration = auth
        .register(new_user("grace@example.com", "hunter22"))
        .await
        .unwrap();

    tokio::time::sleep(StdDuration::from_millis(2100)).await;

    let err = auth.validate_token(&registration.token).unwrap_err();
    assert!(err.is_token_expired());

    let err = auth.refresh_token(&registration.token).unwrap_err();
    assert!(err.is_token_expired());
}

#[tokio::test]
async fn test_token_from_other_signer_is_invalid() {
    let auth = auth();
    let other = YapAuth::new(
        Arc::new(InMemoryUserRepository::new().unwrap()),
        Arc::new(TokenFactory::new(JwtConfig::new_hs256(b"another secret".to_vec())).unwrap()),
    );

    let registration = other
        .register(new_user("grace@example.com", "hunter22"))
        .await
        .unwrap();

    assert!(auth.validate_token(&registration.token).unwrap_err().is_invalid_token());
}

#[tokio::test]
async fn test_concurrent_registration_same_email() {
    let auth = auth();

    let handles: Vec<_> = (0..16)
        .map(|i| {
            let auth = auth.clone();
            tokio::spawn(async move {
                auth.register(new_user("race@example.com", &format!("password-{i}")))
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
}
