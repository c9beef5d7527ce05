//! Live-database tests for the registration protocol and pool discipline.
//! They need a running PostgreSQL pointed to by `DATABASE_URL` and are
//! ignored by default:
//!
//!     DATABASE_URL=postgres://... cargo test -p database -- --ignored

use core_types::{DoctorDetails, NewIdentity, PatientDetails, RoleDetails};
use database::{DbError, Registrar};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

async fn test_pool(max_connections: u32, acquire_timeout: Duration) -> PgPool {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for live tests");
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(acquire_timeout)
        .connect(&url)
        .await
        .expect("failed to connect to the test database");
    database::run_migrations(&pool)
        .await
        .expect("failed to apply migrations");
    pool
}

/// A fresh address per call so reruns never collide on the unique columns.
fn unique_email(tag: &str) -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    format!("{tag}.{nanos}@example.com")
}

fn cardiologist() -> RoleDetails {
    RoleDetails::Doctor(DoctorDetails {
        clinic_id: Some(1),
        specialization: "Cardiology".to_string(),
        license_number: "L123".to_string(),
        qualifications: None,
        experience_years: Some(5),
        consultation_fee: None,
        is_available: true,
    })
}

fn walk_in_patient() -> RoleDetails {
    RoleDetails::Patient(PatientDetails {
        national_id: None,
        emergency_contact: None,
        blood_type: Some("O+".to_string()),
        allergies: None,
        chronic_diseases: None,
    })
}

async fn users_with_email(pool: &PgPool, email: &str) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE email = $1")
        .bind(email)
        .fetch_one(pool)
        .await
        .unwrap()
}

// A successful registration yields exactly one identity and exactly one
// role profile referencing it.
#[tokio::test]
#[ignore]
async fn successful_registration_links_identity_and_profile() {
    let pool = test_pool(5, Duration::from_secs(5)).await;
    let registrar = Registrar::new(pool.clone());

    let email = unique_email("amal.said");
    let identity = NewIdentity::from_parts("Amal", "Said", &email, "0550000000");
    let registered = registrar.register(&identity, &cardiologist()).await.unwrap();

    assert_eq!(registered.full_name, "Amal Said");

    let identities = users_with_email(&pool, &email).await;
    assert_eq!(identities, 1);

    let specialization: String =
        sqlx::query_scalar("SELECT specialization FROM doctors WHERE user_id = $1")
            .bind(registered.user_id)
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(specialization, "Cardiology");
}

// When the role-profile insert fails, the identity insert is rolled
// back with it.
#[tokio::test]
#[ignore]
async fn failed_profile_insert_rolls_back_the_identity() {
    let pool = test_pool(5, Duration::from_secs(5)).await;
    let registrar = Registrar::new(pool.clone());

    let email = unique_email("rollback");
    let identity = NewIdentity::from_parts("Nora", "Hamdi", &email, "0550000001");
    let broken = RoleDetails::Doctor(DoctorDetails {
        // No such clinic: the FK violation fails the role-profile insert.
        clinic_id: Some(999_999_999),
        specialization: "Dermatology".to_string(),
        license_number: "L999".to_string(),
        qualifications: None,
        experience_years: None,
        consultation_fee: None,
        is_available: true,
    });

    let err = registrar.register(&identity, &broken).await.unwrap_err();
    assert!(matches!(err, DbError::Registration(_)), "got {err:?}");

    assert_eq!(users_with_email(&pool, &email).await, 0);
}

// The second registration with the same email fails as a duplicate and
// leaves exactly one identity row behind.
#[tokio::test]
#[ignore]
async fn duplicate_email_is_rejected_without_a_second_row() {
    let pool = test_pool(5, Duration::from_secs(5)).await;
    let registrar = Registrar::new(pool.clone());

    let email = unique_email("twice");
    let identity = NewIdentity::from_parts("Sami", "Odeh", &email, "0550000002");

    registrar.register(&identity, &walk_in_patient()).await.unwrap();
    let err = registrar
        .register(&identity, &walk_in_patient())
        .await
        .unwrap_err();

    assert!(matches!(err, DbError::DuplicateIdentity { .. }), "got {err:?}");
    assert_eq!(users_with_email(&pool, &email).await, 1);
}

// After a mixed batch of concurrent registrations, no lease stays
// outstanding; every connection returns to the idle set.
#[tokio::test]
#[ignore]
async fn pool_recovers_every_lease_after_mixed_outcomes() {
    let pool = test_pool(5, Duration::from_secs(5)).await;
    let registrar = Registrar::new(pool.clone());

    let mut calls = Vec::new();
    for i in 0..8 {
        let registrar = registrar.clone();
        calls.push(async move {
            let email = unique_email(&format!("burst{i}"));
            let identity =
                NewIdentity::from_parts("Load", &format!("Test{i}"), &email, "0550000003");
            let details = if i % 2 == 0 {
                walk_in_patient()
            } else {
                // Odd calls fail at the profile insert and must roll back.
                RoleDetails::Doctor(DoctorDetails {
                    clinic_id: Some(999_999_999),
                    specialization: "None".to_string(),
                    license_number: "L0".to_string(),
                    qualifications: None,
                    experience_years: None,
                    consultation_fee: None,
                    is_available: false,
                })
            };
            registrar.register(&identity, &details).await
        });
    }

    let outcomes = futures::future::join_all(calls).await;
    assert!(outcomes.iter().any(|r| r.is_ok()));
    assert!(outcomes.iter().any(|r| r.is_err()));

    // Drop-based release is asynchronous; give the pool a moment to settle.
    let mut settled = false;
    for _ in 0..50 {
        if pool.num_idle() as u32 == pool.size() {
            settled = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    assert!(settled, "leases still outstanding after the batch completed");
}

// A pool of capacity N never hands out N+1 simultaneous leases; the
// extra acquire only proceeds once an earlier lease is released.
#[tokio::test]
#[ignore]
async fn capacity_bounds_simultaneous_leases() {
    let pool = test_pool(2, Duration::from_secs(1)).await;

    let first = pool.acquire().await.unwrap();
    let second = pool.acquire().await.unwrap();

    let err = pool.acquire().await.unwrap_err();
    assert!(matches!(err, sqlx::Error::PoolTimedOut), "got {err:?}");

    drop(first);
    let third = pool.acquire().await.unwrap();

    drop(second);
    drop(third);
}
