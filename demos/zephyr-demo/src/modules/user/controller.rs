use super::audit::AuditTrail;
use super::model::{CreateUser, UpdateUser, User};
use super::service::UserService;
use serde_json::{Value, json};
use zephyr::axum::http::HeaderMap;
use zephyr::dispatch::Part;
use zephyr::prelude::*;

#[controller(path = "/users")]
pub struct UserController {
    service: Arc<UserService>,
}

#[routes]
impl UserController {
    #[get]
    async fn list(&self, #[query] name: Option<String>) -> Json<Vec<User>> {
        Json(self.service.list(name.as_deref()))
    }

    #[get("/:id")]
    async fn get_one(&self, #[param] id: u64) -> Option<Json<User>> {
        self.service.get(id).map(Json)
    }

    #[post]
    async fn create(
        &self,
        #[body] Json(request): Json<CreateUser>,
        #[headers] headers: HeaderMap,
        #[inject] audit: Arc<AuditTrail>,
    ) -> anyhow::Result<Response> {
        let by = headers
            .get("x-requested-by")
            .and_then(|value| value.to_str().ok())
            .unwrap_or("anonymous")
            .to_string();

        let user = self.service.create(request);
        audit.record(format!("{by} created user {}", user.id));

        Ok(Response::new(StatusCode::CREATED)
            .json(&user)?
            .header("location", format!("/users/{}", user.id)))
    }

    #[patch("/:id")]
    async fn update(
        &self,
        #[param] id: u64,
        #[body] Json(changes): Json<UpdateUser>,
        #[inject] audit: Arc<AuditTrail>,
    ) -> Response {
        match self.service.update(id, changes) {
            Some(user) => {
                audit.record(format!("updated user {id}"));
                Response::ok(json!(user))
            }
            None => Response::error(StatusCode::NOT_FOUND, format!("User {id} not found")),
        }
    }

    /// 200 with `true` when removed, 204 when there was nothing to remove
    #[delete("/:id")]
    async fn remove(&self, #[param] id: u64) -> bool {
        self.service.delete(id)
    }

    #[post("/:id/avatar")]
    async fn upload_avatar(&self, #[param] id: u64, #[multipart] avatar: Part) -> Value {
        json!({
            "user": id,
            "fileName": avatar.file_name,
            "contentType": avatar.content_type,
            "size": avatar.data.len(),
        })
    }
}
