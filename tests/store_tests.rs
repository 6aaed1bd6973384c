use murmur::config::SecurityConfig;
use murmur::db::{SaveError, Store};
use murmur::domain::{NewMicropost, NewUser};

async fn test_store() -> Store {
    Store::new("sqlite::memory:")
        .await
        .expect("Failed to open in-memory store")
}

/// Cheap Argon2 parameters so tests do not burn CPU on hashing
fn test_security() -> SecurityConfig {
    SecurityConfig {
        argon2_memory_cost_kib: 1024,
        argon2_time_cost: 1,
        argon2_parallelism: 1,
    }
}

fn new_user(email: &str) -> NewUser {
    NewUser {
        name: "Example User".to_string(),
        email: email.to_string(),
        password: "foobar".to_string(),
        password_confirmation: "foobar".to_string(),
    }
}

fn new_post(content: &str) -> NewMicropost {
    NewMicropost {
        content: content.to_string(),
    }
}

#[tokio::test]
async fn test_create_user_normalizes_and_tokenizes() {
    let store = test_store().await;

    let user = store
        .create_user(&new_user("USER@Example.COM"), &test_security())
        .await
        .expect("create failed");

    assert_eq!(user.email, "user@example.com");
    assert!(!user.admin);
    assert_eq!(user.remember_token.len(), 64);
    assert!(user.remember_token.chars().all(|c| c.is_ascii_hexdigit()));

    let found = store
        .find_user_by_email("User@Example.Com")
        .await
        .unwrap()
        .expect("lookup by mixed-case email failed");
    assert_eq!(found.id, user.id);
}

#[tokio::test]
async fn test_duplicate_email_rejected_case_insensitively() {
    let store = test_store().await;

    store
        .create_user(&new_user("user@example.com"), &test_security())
        .await
        .expect("first create failed");

    let err = store
        .create_user(&new_user("USER@EXAMPLE.COM"), &test_security())
        .await
        .expect_err("duplicate should fail");

    match err {
        SaveError::Invalid(errors) => {
            assert!(
                errors
                    .iter()
                    .any(|e| e.field == "email" && e.message == "has already been taken")
            );
        }
        SaveError::Database(e) => panic!("expected validation failure, got {e}"),
    }
}

#[tokio::test]
async fn test_invalid_signup_never_reaches_the_database() {
    let store = test_store().await;

    let mut bad = new_user("user@example.com");
    bad.password_confirmation = "mismatch".to_string();

    assert!(matches!(
        store.create_user(&bad, &test_security()).await,
        Err(SaveError::Invalid(_))
    ));

    assert!(
        store
            .find_user_by_email("user@example.com")
            .await
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
async fn test_authenticate_roundtrip() {
    let store = test_store().await;

    let user = store
        .create_user(&new_user("user@example.com"), &test_security())
        .await
        .unwrap();

    let found = store
        .authenticate_user("user@example.com", "foobar")
        .await
        .unwrap()
        .expect("valid password should authenticate");
    assert_eq!(found.id, user.id);

    // Wrong password and unknown email both come back empty, never an error
    assert!(
        store
            .authenticate_user("user@example.com", "invalid")
            .await
            .unwrap()
            .is_none()
    );
    assert!(
        store
            .authenticate_user("nobody@example.com", "foobar")
            .await
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
async fn test_remember_token_rotation() {
    let store = test_store().await;

    let user = store
        .create_user(&new_user("user@example.com"), &test_security())
        .await
        .unwrap();
    let old_token = user.remember_token.clone();

    let new_token = store.regenerate_remember_token(user.id).await.unwrap();
    assert_ne!(new_token, old_token);

    let found = store
        .find_user_by_remember_token(&new_token)
        .await
        .unwrap()
        .expect("new token should resolve");
    assert_eq!(found.id, user.id);

    assert!(
        store
            .find_user_by_remember_token(&old_token)
            .await
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
async fn test_feed_orders_newest_first_and_excludes_others() {
    let store = test_store().await;

    let alice = store
        .create_user(&new_user("alice@example.com"), &test_security())
        .await
        .unwrap();
    let bob = store
        .create_user(&new_user("bob@example.com"), &test_security())
        .await
        .unwrap();

    let first = store
        .create_micropost(alice.id, &new_post("first"))
        .await
        .unwrap();
    let second = store
        .create_micropost(alice.id, &new_post("second"))
        .await
        .unwrap();
    store
        .create_micropost(bob.id, &new_post("unrelated"))
        .await
        .unwrap();

    let feed = store.feed(alice.id).await.unwrap();
    let ids: Vec<i32> = feed.iter().map(|p| p.id).collect();
    assert_eq!(ids, vec![second.id, first.id]);
    assert!(feed.iter().all(|p| p.user_id == alice.id));
}

#[tokio::test]
async fn test_owned_lookup_hides_other_users_posts() {
    let store = test_store().await;

    let alice = store
        .create_user(&new_user("alice@example.com"), &test_security())
        .await
        .unwrap();
    let bob = store
        .create_user(&new_user("bob@example.com"), &test_security())
        .await
        .unwrap();

    let post = store
        .create_micropost(alice.id, &new_post("alice's"))
        .await
        .unwrap();

    assert!(
        store
            .find_micropost_owned(post.id, alice.id)
            .await
            .unwrap()
            .is_some()
    );
    assert!(
        store
            .find_micropost_owned(post.id, bob.id)
            .await
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
async fn test_user_deletion_cascades_atomically() {
    let store = test_store().await;

    let alice = store
        .create_user(&new_user("alice@example.com"), &test_security())
        .await
        .unwrap();
    let bob = store
        .create_user(&new_user("bob@example.com"), &test_security())
        .await
        .unwrap();

    let a1 = store
        .create_micropost(alice.id, &new_post("one"))
        .await
        .unwrap();
    let a2 = store
        .create_micropost(alice.id, &new_post("two"))
        .await
        .unwrap();
    let b1 = store
        .create_micropost(bob.id, &new_post("bob's"))
        .await
        .unwrap();

    assert!(store.delete_user_with_microposts(alice.id).await.unwrap());

    assert!(store.find_user(alice.id).await.unwrap().is_none());
    assert!(store.find_micropost(a1.id).await.unwrap().is_none());
    assert!(store.find_micropost(a2.id).await.unwrap().is_none());

    // Unrelated rows survive
    assert!(store.find_user(bob.id).await.unwrap().is_some());
    assert!(store.find_micropost(b1.id).await.unwrap().is_some());

    // Deleting an already-gone user reports false
    assert!(!store.delete_user_with_microposts(alice.id).await.unwrap());
}

#[tokio::test]
async fn test_micropost_validation_happens_at_save() {
    let store = test_store().await;

    let alice = store
        .create_user(&new_user("alice@example.com"), &test_security())
        .await
        .unwrap();

    assert!(matches!(
        store.create_micropost(alice.id, &new_post("   ")).await,
        Err(SaveError::Invalid(_))
    ));

    assert!(matches!(
        store
            .create_micropost(alice.id, &new_post(&"a".repeat(141)))
            .await,
        Err(SaveError::Invalid(_))
    ));

    assert!(store.feed(alice.id).await.unwrap().is_empty());
}
