//! Service and domain tests for user registration and lookup.

use std::sync::Arc;

use crate::user::{
    adapters::memory::InMemoryUserRepository,
    domain::{User, UserDomainError, UserId, UserRole},
    ports::UserRepositoryError,
    services::{CreateUserRequest, UserDirectoryError, UserDirectoryService},
};
use mockable::DefaultClock;
use rstest::{fixture, rstest};

type TestService = UserDirectoryService<InMemoryUserRepository, DefaultClock>;

#[fixture]
fn service() -> TestService {
    UserDirectoryService::new(
        Arc::new(InMemoryUserRepository::new()),
        Arc::new(DefaultClock),
    )
}

#[rstest]
#[case("reporter", UserRole::Reporter)]
#[case("Technician", UserRole::Technician)]
#[case(" admin ", UserRole::Admin)]
fn role_parses_known_values(#[case] raw: &str, #[case] expected: UserRole) {
    assert_eq!(UserRole::try_from(raw), Ok(expected));
}

#[rstest]
fn register_trims_username_and_drops_blank_email() {
    let user = User::register(
        "  tom.tech ",
        Some("   ".to_owned()),
        UserRole::Technician,
        &DefaultClock,
    )
    .expect("registration should succeed");

    assert_eq!(user.username(), "tom.tech");
    assert_eq!(user.email(), None);
    assert_eq!(user.role(), UserRole::Technician);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn created_user_is_found_by_id_and_username(service: TestService) {
    let created = service
        .create(CreateUserRequest::new("rita", "reporter").with_email("rita@example.com"))
        .await
        .expect("user creation should succeed");

    let by_id = service
        .get(created.id())
        .await
        .expect("lookup by id should succeed");
    let by_name = service
        .find_by_username(" rita ")
        .await
        .expect("lookup by username should succeed");

    assert_eq!(by_id, created);
    assert_eq!(by_name, created);
    assert_eq!(created.email(), Some("rita@example.com"));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn duplicate_username_is_rejected(service: TestService) {
    service
        .create(CreateUserRequest::new("tom", "technician"))
        .await
        .expect("first registration should succeed");

    let result = service
        .create(CreateUserRequest::new("tom", "admin"))
        .await;

    assert!(matches!(
        result,
        Err(UserDirectoryError::Repository(UserRepositoryError::DuplicateUsername(ref name)))
            if name == "tom"
    ));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn usernames_are_case_sensitive(service: TestService) {
    service
        .create(CreateUserRequest::new("Alex", "reporter"))
        .await
        .expect("first registration should succeed");

    let other = service
        .create(CreateUserRequest::new("alex", "reporter"))
        .await;

    assert!(other.is_ok());
}

#[rstest]
#[case::blank_username("   ", "reporter", UserDomainError::EmptyUsername)]
#[case::unknown_role("sam", "manager", UserDomainError::UnknownRole("manager".to_owned()))]
#[tokio::test(flavor = "multi_thread")]
async fn invalid_registration_is_rejected(
    service: TestService,
    #[case] username: &str,
    #[case] role: &str,
    #[case] expected: UserDomainError,
) {
    let result = service.create(CreateUserRequest::new(username, role)).await;

    assert!(matches!(result, Err(UserDirectoryError::Domain(ref err)) if *err == expected));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn unknown_user_lookups_are_not_found(service: TestService) {
    let missing = UserId::new();

    let by_id = service.get(missing).await;
    let by_name = service.find_by_username("nobody").await;

    assert!(matches!(by_id, Err(UserDirectoryError::NotFound(id)) if id == missing));
    assert!(matches!(
        by_name,
        Err(UserDirectoryError::UsernameNotFound(ref name)) if name == "nobody"
    ));
}
