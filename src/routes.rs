use actix_web::{error::JsonPayloadError, web, HttpRequest, HttpResponse};
use log::debug;
use serde_json::json;

use crate::auth::{login, profile, register};
use crate::chat::{create_message, get_messages, mark_message_read};
use crate::error::AppError;
use crate::project::{create_project, delete_project, get_project, list_projects, update_project};
use crate::resource::{add_resource, delete_resource, list_resources};
use crate::task::{delete_task, list_tasks, put_task};
use crate::team_management::{add_team_member, remove_team_member};
use crate::user_management::{
    delete_user_by_id, find_user_email, get_user_by_id, get_users, update_user_by_id,
};

fn json_error(err: JsonPayloadError, req: &HttpRequest) -> actix_web::Error {
    debug!("Rejected JSON body for {}: {}", req.path(), err);
    AppError::BadRequest(err.to_string()).into()
}

async fn hello() -> HttpResponse {
    HttpResponse::Ok().body("Hello, World!")
}

pub async fn not_found() -> HttpResponse {
    HttpResponse::NotFound().json(json!({ "error": "Not found" }))
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(json_error))
        .route("/", web::get().to(hello))
        .service(
            web::scope("/auth")
                .route("/register", web::post().to(register))
                .route("/login", web::post().to(login))
                .route("/profile", web::get().to(profile))
                .route("/users", web::get().to(get_users)),
        )
        // USERS
        .service(
            web::scope("/users")
                .route("/find_user_email", web::get().to(find_user_email))
                .route("/{id}", web::get().to(get_user_by_id))
                .route("/{id}", web::put().to(update_user_by_id))
                .route("/{id}", web::delete().to(delete_user_by_id)),
        )
        // PROJECTS
        .service(
            web::scope("/projects")
                .route("", web::post().to(create_project))
                .route("", web::get().to(list_projects))
                .service(
                    web::scope("/{project_id}")
                        .route("", web::get().to(get_project))
                        .route("", web::put().to(update_project))
                        .route("", web::delete().to(delete_project))
                        .route("/team", web::post().to(add_team_member))
                        .route("/team/{user_id}", web::delete().to(remove_team_member))
                        .route("/tasks", web::get().to(list_tasks))
                        .route("/tasks", web::put().to(put_task))
                        .route("/tasks/{task_id}", web::delete().to(delete_task))
                        .route("/resources", web::get().to(list_resources))
                        .route("/resources", web::post().to(add_resource))
                        .route("/resources/{resource_id}", web::delete().to(delete_resource)),
                ),
        )
        // CHAT
        .service(
            web::scope("/chat")
                .route("", web::post().to(create_message))
                .route("/project/{project_id}", web::get().to(get_messages))
                .route("/{message_id}/read", web::put().to(mark_message_read)),
        );
}
