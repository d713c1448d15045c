use askama::Template;
use axum::{
    Form,
    extract::{State, rejection::FormRejection},
    response::Redirect,
};
use serde::Deserialize;
use std::sync::Arc;

use super::render::HtmlTemplate;
use super::{AppError, AppState, Author};
use crate::db::PostWithAuthor;

/// One row of the post listing
pub struct PostView {
    pub title: String,
    pub content: String,
    pub created_at: String,
    pub author: String,
}

impl From<PostWithAuthor> for PostView {
    fn from(row: PostWithAuthor) -> Self {
        Self {
            title: row.post.title,
            content: row.post.content,
            created_at: row.post.created_at.format("%Y-%m-%d").to_string(),
            author: row.author.username,
        }
    }
}

#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    pub posts: Vec<PostView>,
}

#[derive(Template)]
#[template(path = "add_post.html")]
pub struct AddPostTemplate;

#[derive(Debug, Deserialize)]
pub struct NewPostForm {
    pub title: String,
    pub content: String,
}

pub async fn index(
    State(state): State<Arc<AppState>>,
) -> Result<HtmlTemplate<IndexTemplate>, AppError> {
    let posts = state.store().list_posts_with_authors().await?;

    Ok(HtmlTemplate(IndexTemplate {
        posts: posts.into_iter().map(PostView::from).collect(),
    }))
}

pub async fn add_post_form() -> HtmlTemplate<AddPostTemplate> {
    HtmlTemplate(AddPostTemplate)
}

pub async fn add_post(
    State(state): State<Arc<AppState>>,
    author: Author,
    form: Result<Form<NewPostForm>, FormRejection>,
) -> Result<Redirect, AppError> {
    let Form(form) = form.map_err(|rejection| AppError::RequestFormat(rejection.body_text()))?;

    let today = chrono::Local::now().date_naive();
    state
        .store()
        .create_post(author.id(), &form.title, &form.content, today)
        .await?;

    Ok(Redirect::to("/"))
}
