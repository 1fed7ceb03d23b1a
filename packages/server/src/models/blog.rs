use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::entity::{blog, comment};

pub use super::shared::{ModelError, ModelState};
use super::shared::{require, validate_title};

/// Number of empty comment slots offered by a blank create form.
pub const COMMENT_SLOTS: usize = 2;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct BlogDto {
    #[serde(default)]
    pub id: i32,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    /// Token of the row the form was rendered from. Sent back unchanged on edit.
    #[serde(default)]
    pub concurrency_token: Option<i32>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CommentDto {
    #[serde(default)]
    pub id: i32,
    #[serde(default)]
    pub content: String,
}

/// One blog and its comments, as rendered into and submitted from a form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct BlogWithCommentsViewModel {
    #[serde(default)]
    pub blog: BlogDto,
    #[serde(default)]
    pub comments: Vec<CommentDto>,
}

impl BlogWithCommentsViewModel {
    /// A blank form with `slots` empty comments.
    pub fn blank(slots: usize) -> Self {
        Self {
            blog: BlogDto::default(),
            comments: vec![CommentDto::default(); slots],
        }
    }

    pub fn from_models(blog: blog::Model, comments: Vec<comment::Model>) -> Self {
        Self {
            blog: blog.into(),
            comments: comments.into_iter().map(CommentDto::from).collect(),
        }
    }

    /// Required-field checks. Field names follow the JSON shape of the form.
    pub fn validate(&self) -> ModelState {
        let mut state = ModelState::default();
        validate_title(&mut state, "blog.title", &self.blog.title);
        require(
            &mut state,
            "blog.content",
            &self.blog.content,
            "Content is required.",
        );
        for (i, comment) in self.comments.iter().enumerate() {
            require(
                &mut state,
                &format!("comments[{i}].content"),
                &comment.content,
                "Comment content is required.",
            );
        }
        state
    }
}

impl From<blog::Model> for BlogDto {
    fn from(m: blog::Model) -> Self {
        Self {
            id: m.id,
            title: m.title,
            content: m.content,
            concurrency_token: Some(m.concurrency_token),
        }
    }
}

impl From<comment::Model> for CommentDto {
    fn from(m: comment::Model) -> Self {
        Self {
            id: m.id,
            content: m.content,
        }
    }
}

/// A create or edit form page.
#[derive(Debug, Serialize, ToSchema)]
pub struct BlogFormPage {
    pub model: BlogWithCommentsViewModel,
    pub errors: Vec<ModelError>,
    /// Echo in the `RequestVerificationToken` header when posting the form.
    pub antiforgery_token: String,
}

/// The delete confirmation page.
#[derive(Debug, Serialize, ToSchema)]
pub struct DeleteBlogPage {
    pub blog: BlogDto,
    pub antiforgery_token: String,
}
