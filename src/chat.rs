// File: chat.rs

use actix_web::{web, HttpResponse};
use chrono::Utc;
use log::{debug, info};
use serde::Deserialize;

use crate::access::ensure_access;
use crate::app_state::AppState;
use crate::auth::Identity;
use crate::error::{AppError, AppResult};
use crate::models::{new_id, Message, MessageView, UserSummary};
use crate::project::load;

#[derive(Debug, Deserialize)]
pub struct PostMessageRequest {
    pub project: String,
    pub content: Option<String>,
}

async fn sender_summaries(state: &AppState, messages: &[Message]) -> AppResult<Vec<UserSummary>> {
    let mut ids: Vec<String> = messages.iter().map(|m| m.sender.clone()).collect();
    ids.sort();
    ids.dedup();
    let users = state.users.find_many(&ids).await?;
    Ok(users.iter().map(UserSummary::from).collect())
}

fn view(message: Message, senders: &[UserSummary]) -> MessageView {
    let sender = senders.iter().find(|u| u.id == message.sender).cloned();
    message.into_view(sender)
}

pub async fn post_message(
    state: &AppState,
    caller: &Identity,
    project_id: &str,
    content: Option<String>,
) -> AppResult<MessageView> {
    let content = content
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
        .ok_or_else(|| AppError::bad_request("Message content is required"))?;
    let project = load(state, project_id).await?;
    ensure_access(&project, caller, "post to this project")?;

    let now = Utc::now();
    let message = Message {
        id: new_id(),
        project: project.id,
        sender: caller.id.clone(),
        content,
        read_by: Vec::new(),
        created_at: now,
        updated_at: now,
    };
    state.messages.insert(&message).await?;
    info!("Message {} posted to project {}", message.id, message.project);

    let senders = sender_summaries(state, std::slice::from_ref(&message)).await?;
    Ok(view(message, &senders))
}

/// Messages of a project, oldest first.
pub async fn list_messages(
    state: &AppState,
    caller: &Identity,
    project_id: &str,
) -> AppResult<Vec<MessageView>> {
    let project = load(state, project_id).await?;
    ensure_access(&project, caller, "read messages of this project")?;

    let mut messages = state.messages.find_by_project(&project.id).await?;
    messages.sort_by(|a, b| a.created_at.cmp(&b.created_at));
    let senders = sender_summaries(state, &messages).await?;
    Ok(messages.into_iter().map(|m| view(m, &senders)).collect())
}

pub async fn mark_read(
    state: &AppState,
    caller: &Identity,
    message_id: &str,
) -> AppResult<MessageView> {
    let message = state
        .messages
        .find_by_id(message_id)
        .await?
        .ok_or_else(|| AppError::not_found("Message not found"))?;
    let project = load(state, &message.project).await?;
    ensure_access(&project, caller, "mark this message as read")?;

    let message = state
        .messages
        .add_reader(&message.id, &caller.id)
        .await?
        .ok_or_else(|| AppError::not_found("Message not found"))?;
    debug!("{} read message {}", caller.id, message.id);

    let senders = sender_summaries(state, std::slice::from_ref(&message)).await?;
    Ok(view(message, &senders))
}

// POST /chat
pub async fn create_message(
    caller: Identity,
    data: web::Data<AppState>,
    payload: web::Json<PostMessageRequest>,
) -> AppResult<HttpResponse> {
    let PostMessageRequest { project, content } = payload.into_inner();
    let message = post_message(&data, &caller, &project, content).await?;
    Ok(HttpResponse::Created().json(message))
}

// GET /chat/project/{project_id}
pub async fn get_messages(
    caller: Identity,
    data: web::Data<AppState>,
    project_id: web::Path<String>,
) -> AppResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(list_messages(&data, &caller, &project_id).await?))
}

// PUT /chat/{message_id}/read
pub async fn mark_message_read(
    caller: Identity,
    data: web::Data<AppState>,
    message_id: web::Path<String>,
) -> AppResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(mark_read(&data, &caller, &message_id).await?))
}
