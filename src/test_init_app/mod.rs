use std::sync::Arc;

use actix_http::Request;
use actix_service::Service;
use actix_web::{body::MessageBody, dev::ServiceResponse, http::StatusCode, middleware::from_fn, test, web, App, Error};
use chrono::Utc;
use serde_json::json;
use sqlx::types::Uuid;

use crate::{
    handlers,
    middlewares::envelope::envelope_middleware,
    models::{
        admin_log::AdminLog,
        course::{Course, CourseStatus},
        subscription::Subscription,
        user::{Role, User},
    },
    schema::{auth::AuthenticationResponse, ApiResponse},
    storage::FileStorage,
    utils::JwtService,
    GlobalState,
};

mod memory;

use memory::MemoryStore;

pub const TEST_SECRET: &str = "edugate-test-secret";

/// The full router over an in-memory store, plus direct access to that store
/// for seeding and assertions.
pub struct TestApp<S> {
    pub service: S,
    pub state: web::Data<GlobalState>,
    store: Arc<MemoryStore>,
}

pub async fn init() -> TestApp<impl Service<Request, Response = ServiceResponse<impl MessageBody>, Error = Error>> {
    let store = Arc::new(MemoryStore::default());
    let upload_dir = std::env::temp_dir().join(format!("edugate-test-{}", Uuid::new_v4()));

    let state = web::Data::new(GlobalState {
        store: store.clone(),
        jwt: JwtService::new(TEST_SECRET, 3600),
        storage: FileStorage::init(upload_dir).expect("Cant create the upload directory"),
    });

    let service = test::init_service(
        App::new()
            .wrap(from_fn(envelope_middleware))
            .configure(|cfg| handlers::configure(cfg, state.clone(), 1024 * 1024)),
    )
    .await;

    TestApp { service, state, store }
}

impl<S> TestApp<S> {
    fn seed(&self, email: &str, role: Role) -> (User, String) {
        let user = User {
            id: Uuid::new_v4(),
            full_name: "Seeded User".into(),
            email: email.into(),
            // not a valid hash, seeded users never log in with a password
            password_hash: "!".into(),
            phone_number: None,
            role,
            created_at: Utc::now(),
        };
        self.store.tables.lock().users.push(user.clone());

        let token = self.state.jwt.issue(&user).expect("Cant issue a token");
        (user, token)
    }

    pub fn seed_user(&self, email: &str) -> (User, String) {
        self.seed(email, Role::User)
    }

    pub fn seed_instructor(&self, email: &str) -> (User, String) {
        self.seed(email, Role::Instructor)
    }

    pub fn seed_admin(&self, email: &str) -> (User, String) {
        self.seed(email, Role::Admin)
    }

    pub fn seed_course(&self, owner: Uuid, name: &str, status: CourseStatus) -> Course {
        let mut tables = self.store.tables.lock();
        let creator_email = tables
            .users
            .iter()
            .find(|u| u.id == owner)
            .map(|u| u.email.clone())
            .expect("course owner must be seeded first");

        let course = Course {
            id: Uuid::new_v4(),
            course_name: name.into(),
            instructor: "Ferris".into(),
            category: "Programming".into(),
            video_link: "https://video.example/course".into(),
            thumbnail: Some(format!("{}.png", Uuid::new_v4())),
            status,
            created_by: owner,
            creator_email,
            created_at: Utc::now(),
        };
        tables.courses.push(course.clone());
        course
    }

    pub fn seed_subscription(&self, user_id: Uuid, course_id: Uuid) {
        self.store.tables.lock().subscriptions.push(Subscription {
            user_id,
            course_id,
            subscribed_at: Utc::now(),
        });
    }

    pub fn user(&self, id: Uuid) -> User {
        self.store
            .tables
            .lock()
            .users
            .iter()
            .find(|u| u.id == id)
            .cloned()
            .expect("no such user")
    }

    /// `None` once the course is deleted.
    pub fn course_status(&self, id: Uuid) -> Option<CourseStatus> {
        self.store.tables.lock().courses.iter().find(|c| c.id == id).map(|c| c.status)
    }

    pub fn course_count(&self) -> usize {
        self.store.tables.lock().courses.len()
    }

    pub fn subscriber_count(&self, course_id: Uuid) -> usize {
        self.store
            .tables
            .lock()
            .subscriptions
            .iter()
            .filter(|s| s.course_id == course_id)
            .count()
    }

    /// Every admin log entry, oldest first.
    pub fn logs(&self) -> Vec<AdminLog> {
        self.store.tables.lock().logs.clone()
    }
}

/// Registers through the public endpoint so the password is really hashed.
pub async fn register_user<S, B>(service: &S, email: &str, password: &str) -> AuthenticationResponse
where
    S: Service<Request, Response = ServiceResponse<B>, Error = Error>,
    B: MessageBody,
{
    let res = test::TestRequest::post()
        .uri("/api/auth/register")
        .set_json(json!({"fullName": "Test User", "email": email, "password": password}))
        .send_request(service)
        .await;
    assert_eq!(res.status(), StatusCode::CREATED);

    let body: ApiResponse<AuthenticationResponse> = test::read_body_json(res).await;
    body.data.expect("registration returns the new account")
}
