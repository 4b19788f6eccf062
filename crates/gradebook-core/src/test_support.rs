//! Mock backend helpers for tests

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use gradebook_auth::{MemoryTokenStore, TokenStore};
use gradebook_client::models::SubjectListItem;
use gradebook_client::{ApiClient, HttpTransport};
use serde_json::{Value, json};
use tokio::net::TcpListener;

pub async fn spawn_backend(router: axum::Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

/// Client for `router`, signed in with a token every mock accepts.
pub async fn client_for(router: axum::Router) -> ApiClient {
    client_with_tokens(router, Arc::new(MemoryTokenStore::with_tokens("at", "rt"))).await
}

pub async fn client_with_tokens(router: axum::Router, tokens: Arc<dyn TokenStore>) -> ApiClient {
    let base = spawn_backend(router).await;
    let transport = HttpTransport::new(base, Duration::from_secs(5)).unwrap();
    ApiClient::new(transport, tokens)
}

pub fn grade_json(id: &str, subject_id: &str, value: u8) -> Value {
    json!({
        "id": id, "subjectId": subject_id, "studentId": "u1", "createdById": "t1",
        "value": value, "gradedAt": "2025-02-14T06:00:00.000Z"
    })
}

pub fn user_json(with_class_room: bool) -> Value {
    let mut user = json!({
        "id": "u1", "login": "ivanov", "role": "student",
        "firstName": "Ivan", "lastName": "Ivanov", "middleName": "Petrovich",
        "createdAt": "2025-01-10T08:00:00.000Z",
        "updatedAt": "2025-01-10T08:00:00.000Z"
    });
    if with_class_room {
        user["classRoom"] = json!({"id": "c1", "name": "ИС-21", "course": 2, "groupName": "21"});
    } else {
        user["classRoomId"] = json!("c1");
    }
    user
}

pub fn subject(id: &str, teacher: Option<Value>) -> SubjectListItem {
    let mut value = json!({"id": id, "name": id, "classRoomId": "c1", "teacherId": "t1"});
    if let Some(teacher) = teacher {
        value["teacher"] = teacher;
    }
    serde_json::from_value(value).unwrap()
}

/// Call counter shared with mock handlers.
#[derive(Clone, Default)]
pub struct Hits(Arc<AtomicU64>);

impl Hits {
    pub fn hit(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }

    pub fn count(&self) -> u64 {
        self.0.load(Ordering::SeqCst)
    }
}
