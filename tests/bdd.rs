use std::{collections::HashMap, fmt, fs::File, net::SocketAddr};

use anyhow::Context;
use chrono::{Duration, Utc};
use cucumber::{given, then, when, World as _};
use sharexe::{
    auth::{self, AuthenticatedUser},
    config::AppConfig,
    db::init_pool,
    error::AppError,
    models::{
        page::{PagedResponse, PageParams},
        trip::{NewTrip, TripEdits, TripResponse},
        trip_request::{ReplyDecision, TripRequestStatus},
    },
    services, store,
    state::AppState,
};
use tempfile::TempDir;

#[derive(Debug, cucumber::World, Default)]
struct AppWorld {
    state: Option<TestState>,
    users: HashMap<String, AuthenticatedUser>,
    trip: Option<TripResponse>,
    requests: HashMap<String, i64>,
    page: Option<PagedResponse<TripResponse>>,
    last_error: Option<AppError>,
}

impl AppWorld {
    fn app_state(&self) -> &AppState {
        self.state
            .as_ref()
            .expect("state must be initialised first")
            .app()
    }

    fn user(&self, name: &str) -> &AuthenticatedUser {
        self.users
            .get(name)
            .unwrap_or_else(|| panic!("user {name} must be registered first"))
    }

    fn trip_id(&self) -> i64 {
        self.trip.as_ref().expect("a trip must exist first").id
    }

    fn request_id(&self, sender: &str) -> i64 {
        *self
            .requests
            .get(sender)
            .unwrap_or_else(|| panic!("no join request recorded for {sender}"))
    }

    fn record<T>(&mut self, result: Result<T, AppError>) -> Option<T> {
        match result {
            Ok(value) => {
                self.last_error = None;
                Some(value)
            }
            Err(err) => {
                self.last_error = Some(err);
                None
            }
        }
    }
}

struct TestState {
    app: AppState,
    _root: TempDir,
}

impl fmt::Debug for TestState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestState").finish()
    }
}

impl TestState {
    async fn new() -> anyhow::Result<Self> {
        let root = TempDir::new().context("create temp dir for bdd world")?;

        let db_path = root.path().join("bdd.sqlite");
        File::create(&db_path)?;
        let database_url = format!("sqlite://{}", db_path.to_string_lossy());

        let config = AppConfig {
            database_url: database_url.clone(),
            listen_addr: SocketAddr::from(([127, 0, 0, 1], 0)),
            cookie_secret: "bdd-cookie-secret".into(),
            session_ttl_hours: 1,
        };

        let db = init_pool(&config.database_url).await?;
        sqlx::migrate!("./migrations").run(&db).await?;

        let app = AppState::new(config, db);
        Ok(Self { app, _root: root })
    }

    fn app(&self) -> &AppState {
        &self.app
    }
}

fn sample_trip(from: &str, to: &str, capacity: i64) -> NewTrip {
    let begin_at = Utc::now() + Duration::days(1);
    NewTrip {
        starting_point: from.to_string(),
        destination: to.to_string(),
        max_capacity: capacity,
        price_per_person: 5.0,
        begin_at,
        end_at: begin_at + Duration::hours(4),
        description: format!("{from} to {to}"),
        restrictions: vec!["no smoking".into()],
    }
}

fn split_restrictions(raw: &str) -> Vec<String> {
    raw.split(';')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(str::to_string)
        .collect()
}

#[given("a fresh application state")]
async fn given_fresh_state(world: &mut AppWorld) {
    world.state = Some(TestState::new().await.expect("state"));
    world.users.clear();
    world.trip = None;
    world.requests.clear();
    world.page = None;
    world.last_error = None;
}

#[given(regex = r#"^a registered user "([^"]+)"$"#)]
async fn given_registered_user(world: &mut AppWorld, username: String) {
    let email = format!("{username}@example.com");
    let created = auth::register_user(world.app_state(), &username, &email, "secret123!")
        .await
        .expect("register user");
    world.users.insert(username, created);
}

#[when(regex = r#"^I register a user "([^"]+)" with email "([^"]+)" and password "([^"]+)"$"#)]
async fn when_register_user(
    world: &mut AppWorld,
    username: String,
    email: String,
    password: String,
) {
    let created = auth::register_user(world.app_state(), &username, &email, &password)
        .await
        .expect("register user");
    world.users.insert(username, created);
}

#[then(regex = r#"^I can authenticate as "([^"]+)" using password "([^"]+)"$"#)]
async fn then_can_authenticate(world: &mut AppWorld, identifier: String, password: String) {
    let authed = auth::authenticate_user(world.app_state(), &identifier, &password)
        .await
        .expect("authentication");
    assert_eq!(authed.username, identifier);
}

#[then(regex = r#"^authenticating as "([^"]+)" with password "([^"]+)" fails$"#)]
async fn then_authentication_fails(world: &mut AppWorld, identifier: String, password: String) {
    let result = auth::authenticate_user(world.app_state(), &identifier, &password).await;
    assert!(
        matches!(result, Err(AppError::Unauthorized)),
        "expected Unauthorized, got {result:?}"
    );
}

#[then(regex = r#"^registering another user named "([^"]+)" fails$"#)]
async fn then_duplicate_registration_fails(world: &mut AppWorld, username: String) {
    let result = auth::register_user(
        world.app_state(),
        &username,
        "other@example.com",
        "secret123!",
    )
    .await;
    assert!(
        matches!(result, Err(AppError::BadRequest(_))),
        "expected BadRequest, got {result:?}"
    );
}

#[when(regex = r#"^"([^"]+)" creates a trip from "([^"]+)" to "([^"]+)" with capacity (-?\d+)$"#)]
async fn when_create_trip(
    world: &mut AppWorld,
    owner: String,
    from: String,
    to: String,
    capacity: i64,
) {
    let owner_id = world.user(&owner).id;
    let details = sample_trip(&from, &to, capacity);
    let result = services::trips::create_trip(&world.app_state().db, owner_id, details).await;
    if let Some(trip) = world.record(result) {
        world.trip = Some(trip);
    }
}

#[when(regex = r#"^"([^"]+)" requests to join the trip$"#)]
async fn when_request_to_join(world: &mut AppWorld, sender: String) {
    let sender_id = world.user(&sender).id;
    let trip_id = world.trip_id();
    let result =
        services::requests::request_to_join(&world.app_state().db, trip_id, sender_id).await;
    if let Some(request) = world.record(result) {
        world.requests.insert(sender, request.id);
    }
}

#[when(regex = r#"^"([^"]+)" (accepts|declines) the join request from "([^"]+)"$"#)]
async fn when_reply_to_request(
    world: &mut AppWorld,
    caller: String,
    verb: String,
    sender: String,
) {
    let caller_id = world.user(&caller).id;
    let request_id = world.request_id(&sender);
    let decision = if verb == "accepts" {
        ReplyDecision::Accept
    } else {
        ReplyDecision::Decline
    };
    let result = services::requests::reply_to_join_request(
        &world.app_state().db,
        request_id,
        caller_id,
        decision,
    )
    .await;
    world.record(result);
}

#[when(regex = r#"^"([^"]+)" edits the trip with description "([^"]*)", price (-?[\d.]+) and restrictions "([^"]*)"$"#)]
async fn when_edit_trip(
    world: &mut AppWorld,
    caller: String,
    description: String,
    price: f64,
    restrictions: String,
) {
    let caller_id = world.user(&caller).id;
    let trip_id = world.trip_id();
    let current = world.trip.as_ref().expect("a trip must exist first");
    let edits = TripEdits {
        description,
        begin_at: current.begin_at,
        end_at: current.end_at,
        price_per_person: price,
        restrictions: split_restrictions(&restrictions),
    };
    let result = services::trips::edit_trip(&world.app_state().db, caller_id, trip_id, edits).await;
    world.record(result);
}

#[when("the trip is marked finished")]
async fn when_trip_finished(world: &mut AppWorld) {
    let trip_id = world.trip_id();
    sqlx::query("UPDATE trips SET status = 'FINISHED' WHERE id = ?1")
        .bind(trip_id)
        .execute(&world.app_state().db)
        .await
        .expect("mark trip finished");
}

#[when(regex = r#"^waiting trips are listed with page (\d+) and size (\d+)$"#)]
async fn when_list_waiting(world: &mut AppWorld, page: u32, size: u32) {
    let result =
        services::trips::waiting_trips(&world.app_state().db, PageParams::new(page, size)).await;
    if let Some(listed) = world.record(result) {
        world.page = Some(listed);
    }
}

#[when(regex = r#"^"([^"]+)" lists (created|joined) trips$"#)]
async fn when_list_for_user(world: &mut AppWorld, caller: String, which: String) {
    let caller_id = world.user(&caller).id;
    let db = &world.app_state().db;
    let result = if which == "created" {
        services::trips::created_trips(db, caller_id, PageParams::default()).await
    } else {
        services::trips::joined_trips(db, caller_id, PageParams::default()).await
    };
    if let Some(listed) = world.record(result) {
        world.page = Some(listed);
    }
}

#[then(regex = r#"^the trip has (\d+) participants$"#)]
async fn then_trip_participants(world: &mut AppWorld, expected: usize) {
    let trip_id = world.trip_id();
    let owner_id = world.trip.as_ref().expect("trip").created_by;
    let trip = services::trips::get_trip(&world.app_state().db, owner_id, trip_id)
        .await
        .expect("load trip");
    assert_eq!(trip.participants.len(), expected);
    assert!(
        trip.participants.len() as i64 <= trip.max_capacity,
        "capacity invariant violated"
    );
}

#[then(regex = r#"^the trip status is "([^"]+)"$"#)]
async fn then_trip_status(world: &mut AppWorld, expected: String) {
    let trip_id = world.trip_id();
    let owner_id = world.trip.as_ref().expect("trip").created_by;
    let trip = services::trips::get_trip(&world.app_state().db, owner_id, trip_id)
        .await
        .expect("load trip");
    assert_eq!(trip.status.as_str(), expected);
}

#[then(regex = r#"^the join request from "([^"]+)" is "([^"]+)"$"#)]
async fn then_request_status(world: &mut AppWorld, sender: String, expected: String) {
    let request_id = world.request_id(&sender);
    let mut conn = world
        .app_state()
        .db
        .acquire()
        .await
        .expect("acquire connection");
    let request = store::requests::find(&mut *conn, request_id)
        .await
        .expect("load request")
        .expect("request row");
    let status = request.status().expect("valid status");
    let expected = TripRequestStatus::parse(&expected).expect("known status in feature file");
    assert_eq!(status, expected);
}

#[then(regex = r#"^the last operation fails with (.+)$"#)]
async fn then_last_operation_fails(world: &mut AppWorld, kind: String) {
    let err = world
        .last_error
        .as_ref()
        .expect("an error should have been recorded");
    let matched = match kind.as_str() {
        "invalid capacity" => matches!(err, AppError::InvalidCapacity),
        "trip full" => matches!(err, AppError::TripFull),
        "invalid state" => matches!(err, AppError::InvalidState(_)),
        "permission denied" => matches!(err, AppError::PermissionDenied),
        "trip not found" => matches!(err, AppError::TripNotFound),
        "request not found" => matches!(err, AppError::RequestNotFound),
        other => panic!("unknown error kind in feature file: {other}"),
    };
    assert!(matched, "expected {kind}, got {err:?}");
}

#[then(regex = r#"^the trip description is "([^"]*)"$"#)]
async fn then_trip_description(world: &mut AppWorld, expected: String) {
    let trip = reload_trip(world).await;
    assert_eq!(trip.description, expected);
}

#[then(regex = r#"^the trip price is ([\d.]+)$"#)]
async fn then_trip_price(world: &mut AppWorld, expected: f64) {
    let trip = reload_trip(world).await;
    assert!((trip.price_per_person - expected).abs() < f64::EPSILON);
}

#[then(regex = r#"^the trip restrictions are exactly "([^"]*)"$"#)]
async fn then_trip_restrictions(world: &mut AppWorld, expected: String) {
    let trip = reload_trip(world).await;
    assert_eq!(trip.restrictions, split_restrictions(&expected));
}

#[then(regex = r#"^the page has (\d+) items and (\d+) total elements$"#)]
async fn then_page_counts(world: &mut AppWorld, items: usize, total: u64) {
    let page = world.page.as_ref().expect("a page must be listed first");
    assert_eq!(page.items.len(), items);
    assert_eq!(page.total_elements, total);
}

#[then(regex = r#"^the page has (\d+) total pages and is (the last|not the last) page$"#)]
async fn then_page_shape(world: &mut AppWorld, total_pages: u64, last: String) {
    let page = world.page.as_ref().expect("a page must be listed first");
    assert_eq!(page.total_pages, total_pages);
    assert_eq!(page.is_last, last == "the last");
}

async fn reload_trip(world: &AppWorld) -> TripResponse {
    let trip_id = world.trip_id();
    let owner_id = world.trip.as_ref().expect("trip").created_by;
    services::trips::get_trip(&world.app_state().db, owner_id, trip_id)
        .await
        .expect("load trip")
}

#[tokio::main]
async fn main() {
    AppWorld::cucumber()
        .fail_on_skipped()
        .with_default_cli()
        .run("tests/features")
        .await;
}
