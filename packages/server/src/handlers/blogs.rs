use axum::Json;
use axum::extract::{Path, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Redirect, Response};
use axum_extra::extract::cookie::CookieJar;
use sea_orm::{ColumnTrait, DbErr, EntityName, Set};
use tracing::{error, info, instrument, warn};

use crate::data::{DataError, UnitOfWork};
use crate::entity::{blog, comment};
use crate::error::{AppError, ErrorBody};
use crate::extractors::antiforgery::{AntiForgery, issue_token};
use crate::extractors::json::FormBody;
use crate::models::blog::*;
use crate::state::AppState;

/// Where successful mutations land.
pub const INDEX: &str = "/Blogs";

const CREATE_FAILED: &str = "An error occurred while creating the blog and comments.";
const CONCURRENCY_CONFLICT: &str = "The blog has been updated by another user.";
const COMMENT_CONFLICT: &str = "A comment has been deleted by another user.";
const TOKEN_REQUIRED: &str = "The form is missing its concurrency token.";

/// Browsers may reuse the list for five minutes.
const INDEX_CACHE_CONTROL: &str = "private, max-age=300";

pub async fn home() -> Redirect {
    Redirect::to(INDEX)
}

#[utoipa::path(
    get,
    path = "/Blogs",
    tag = "Blogs",
    operation_id = "listBlogs",
    summary = "List all blogs",
    responses(
        (status = 200, description = "Every blog, without comments", body = Vec<BlogDto>),
    ),
)]
#[instrument(skip_all)]
pub async fn index(mut uow: UnitOfWork) -> Result<impl IntoResponse, AppError> {
    let blogs: Vec<BlogDto> = uow
        .repository::<blog::Entity>()
        .get_all()
        .await?
        .into_iter()
        .map(BlogDto::from)
        .collect();

    Ok((
        [(header::CACHE_CONTROL, INDEX_CACHE_CONTROL)],
        Json(blogs),
    ))
}

#[utoipa::path(
    get,
    path = "/Blogs/Details/{id}",
    tag = "Blogs",
    operation_id = "getBlog",
    summary = "Show a blog with its comments",
    params(("id" = i32, Path, description = "Blog ID")),
    responses(
        (status = 200, description = "Blog details", body = BlogWithCommentsViewModel),
        (status = 404, description = "Blog not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip_all, fields(id = id))]
pub async fn details(
    mut uow: UnitOfWork,
    Path(id): Path<i32>,
) -> Result<Json<BlogWithCommentsViewModel>, AppError> {
    let (blog, comments) = load_with_comments(&mut uow, id)
        .await?
        .ok_or_else(|| not_found(id))?;

    Ok(Json(BlogWithCommentsViewModel::from_models(blog, comments)))
}

#[utoipa::path(
    get,
    path = "/Blogs/Create",
    tag = "Blogs",
    operation_id = "createBlogForm",
    summary = "Blank create form",
    description = "Returns an empty form with two comment slots and sets the anti-forgery cookie.",
    responses(
        (status = 200, description = "Create form", body = BlogFormPage),
    ),
)]
#[instrument(skip_all)]
pub async fn create_form(State(state): State<AppState>, jar: CookieJar) -> Response {
    form_page(
        &state,
        jar,
        StatusCode::OK,
        BlogWithCommentsViewModel::blank(COMMENT_SLOTS),
        Vec::new(),
    )
}

#[utoipa::path(
    post,
    path = "/Blogs/Create",
    tag = "Blogs",
    operation_id = "createBlog",
    summary = "Create a blog and its comments",
    description = "Inserts the blog and every submitted comment in one transaction. Requires the `RequestVerificationToken` header. Any failure rolls back everything and re-renders the form.",
    request_body = BlogWithCommentsViewModel,
    responses(
        (status = 303, description = "Created; redirects to the list"),
        (status = 400, description = "Missing or invalid anti-forgery token (ANTIFORGERY_TOKEN_INVALID)", body = ErrorBody),
        (status = 422, description = "Validation or persistence failure; form re-rendered", body = BlogFormPage),
    ),
)]
#[instrument(skip_all, fields(title = %vm.blog.title, comments = vm.comments.len()))]
pub async fn create(
    _csrf: AntiForgery,
    State(state): State<AppState>,
    mut uow: UnitOfWork,
    jar: CookieJar,
    FormBody(vm): FormBody<BlogWithCommentsViewModel>,
) -> Result<Response, AppError> {
    let model_state = vm.validate();
    if !model_state.is_valid() {
        let errors = model_state.into_errors();
        return Ok(form_page(&state, jar, StatusCode::UNPROCESSABLE_ENTITY, vm, errors));
    }

    match create_blog_with_comments(&mut uow, &vm).await {
        Ok(id) => {
            info!(id, "Blog created");
            Ok(Redirect::to(INDEX).into_response())
        }
        Err(e) => {
            warn!(error = %e, "Creating blog failed, rolling back");
            if let Err(e) = uow.rollback().await {
                error!(error = %e, "Rollback failed");
            }
            let mut model_state = ModelState::default();
            model_state.add_error("", CREATE_FAILED);
            Ok(form_page(
                &state,
                jar,
                StatusCode::UNPROCESSABLE_ENTITY,
                vm,
                model_state.into_errors(),
            ))
        }
    }
}

#[utoipa::path(
    get,
    path = "/Blogs/Edit/{id}",
    tag = "Blogs",
    operation_id = "editBlogForm",
    summary = "Edit form for a blog",
    params(("id" = i32, Path, description = "Blog ID")),
    responses(
        (status = 200, description = "Edit form", body = BlogFormPage),
        (status = 404, description = "Blog not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip_all, fields(id = id))]
pub async fn edit_form(
    State(state): State<AppState>,
    mut uow: UnitOfWork,
    jar: CookieJar,
    Path(id): Path<i32>,
) -> Result<Response, AppError> {
    let (blog, comments) = load_with_comments(&mut uow, id)
        .await?
        .ok_or_else(|| not_found(id))?;

    Ok(form_page(
        &state,
        jar,
        StatusCode::OK,
        BlogWithCommentsViewModel::from_models(blog, comments),
        Vec::new(),
    ))
}

#[utoipa::path(
    post,
    path = "/Blogs/Edit/{id}",
    tag = "Blogs",
    operation_id = "editBlog",
    summary = "Update a blog and its existing comments",
    description = "Overwrites the title, content and the content of comments whose id matches an existing comment of this blog. Unknown comment ids are ignored. Requires the `RequestVerificationToken` header.",
    params(("id" = i32, Path, description = "Blog ID")),
    request_body = BlogWithCommentsViewModel,
    responses(
        (status = 303, description = "Updated; redirects to the list"),
        (status = 400, description = "Missing or invalid anti-forgery token (ANTIFORGERY_TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Blog not found or id mismatch (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Blog changed since the form was rendered", body = BlogFormPage),
        (status = 422, description = "Validation failure; form re-rendered", body = BlogFormPage),
    ),
)]
#[instrument(skip_all, fields(id = id))]
pub async fn edit(
    _csrf: AntiForgery,
    State(state): State<AppState>,
    mut uow: UnitOfWork,
    jar: CookieJar,
    Path(id): Path<i32>,
    FormBody(vm): FormBody<BlogWithCommentsViewModel>,
) -> Result<Response, AppError> {
    if id != vm.blog.id {
        return Err(not_found(id));
    }

    let mut model_state = vm.validate();
    if vm.blog.concurrency_token.is_none() {
        model_state.add_error("blog.concurrency_token", TOKEN_REQUIRED);
    }
    if !model_state.is_valid() {
        let errors = model_state.into_errors();
        return Ok(form_page(&state, jar, StatusCode::UNPROCESSABLE_ENTITY, vm, errors));
    }

    let (blog, comments) = load_with_comments(&mut uow, id)
        .await?
        .ok_or_else(|| not_found(id))?;
    stage_edit(&mut uow, blog, comments, &vm);

    match uow.save_changes().await {
        Ok(affected) => {
            info!(affected, "Blog updated");
            Ok(Redirect::to(INDEX).into_response())
        }
        Err(DataError::ConcurrencyConflict { entity }) => {
            warn!(%entity, "Rejected edit of a stale blog");
            let (field, message) = conflict_error(&entity);
            model_state.add_error(field, message);
            Ok(form_page(
                &state,
                jar,
                StatusCode::CONFLICT,
                vm,
                model_state.into_errors(),
            ))
        }
        Err(e) => Err(e.into()),
    }
}

#[utoipa::path(
    get,
    path = "/Blogs/Delete/{id}",
    tag = "Blogs",
    operation_id = "deleteBlogForm",
    summary = "Delete confirmation for a blog",
    params(("id" = i32, Path, description = "Blog ID")),
    responses(
        (status = 200, description = "Confirmation page", body = DeleteBlogPage),
        (status = 404, description = "Blog not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip_all, fields(id = id))]
pub async fn delete_form(
    State(state): State<AppState>,
    mut uow: UnitOfWork,
    jar: CookieJar,
    Path(id): Path<i32>,
) -> Result<Response, AppError> {
    let blog = uow
        .repository::<blog::Entity>()
        .get_by_id(id)
        .await?
        .ok_or_else(|| not_found(id))?;

    let (jar, antiforgery_token) = issue_token(jar, &state.config.antiforgery);
    let page = DeleteBlogPage {
        blog: blog.into(),
        antiforgery_token,
    };
    Ok((jar, Json(page)).into_response())
}

#[utoipa::path(
    post,
    path = "/Blogs/Delete/{id}",
    tag = "Blogs",
    operation_id = "deleteBlog",
    summary = "Delete a blog and its comments",
    description = "Removes the blog; the foreign key cascade removes its comments in the same statement. Deleting a blog that does not exist still redirects. Requires the `RequestVerificationToken` header.",
    params(("id" = i32, Path, description = "Blog ID")),
    responses(
        (status = 303, description = "Deleted (or already absent); redirects to the list"),
        (status = 400, description = "Missing or invalid anti-forgery token (ANTIFORGERY_TOKEN_INVALID)", body = ErrorBody),
    ),
)]
#[instrument(skip_all, fields(id = id))]
pub async fn delete(
    _csrf: AntiForgery,
    mut uow: UnitOfWork,
    Path(id): Path<i32>,
) -> Result<Redirect, AppError> {
    let mut blogs = uow.repository::<blog::Entity>();
    if let Some(blog) = blogs.get_by_id(id).await? {
        // Comments go with the blog through the cascading foreign key.
        blogs.remove(blog);

        let affected = uow.save_changes().await?;
        info!(affected, "Blog deleted");
    }

    Ok(Redirect::to(INDEX))
}

/// Insert the blog, then each comment against its generated id, all inside
/// one transaction. The caller rolls back on error.
async fn create_blog_with_comments(
    uow: &mut UnitOfWork,
    vm: &BlogWithCommentsViewModel,
) -> Result<i32, DataError> {
    uow.begin_transaction().await?;

    let blog = uow.repository::<blog::Entity>().add(blog::ActiveModel {
        title: Set(vm.blog.title.trim().to_string()),
        content: Set(vm.blog.content.clone()),
        concurrency_token: Set(0),
        ..Default::default()
    });
    uow.save_changes().await?;
    let blog_id = blog.get().map(|b| b.id).ok_or(DbErr::RecordNotInserted)?;

    for dto in &vm.comments {
        uow.repository::<comment::Entity>().add(comment::ActiveModel {
            content: Set(dto.content.clone()),
            blog_id: Set(blog_id),
            ..Default::default()
        });
        uow.save_changes().await?;
    }

    uow.commit().await?;
    Ok(blog_id)
}

/// Copy the submitted values onto the loaded rows and stage their updates.
fn stage_edit(
    uow: &mut UnitOfWork,
    mut blog: blog::Model,
    comments: Vec<comment::Model>,
    vm: &BlogWithCommentsViewModel,
) {
    blog.title = vm.blog.title.trim().to_string();
    blog.content = vm.blog.content.clone();
    // Compare against the token the form was rendered with, not the one just read.
    if let Some(token) = vm.blog.concurrency_token {
        blog.concurrency_token = token;
    }
    uow.repository::<blog::Entity>().update(blog);

    let mut comment_repo = uow.repository::<comment::Entity>();
    for mut existing in comments {
        if let Some(dto) = vm.comments.iter().find(|c| c.id == existing.id) {
            existing.content = dto.content.clone();
            comment_repo.update(existing);
        }
    }
}

async fn load_with_comments(
    uow: &mut UnitOfWork,
    id: i32,
) -> Result<Option<(blog::Model, Vec<comment::Model>)>, DataError> {
    let Some(blog) = uow.repository::<blog::Entity>().get_by_id(id).await? else {
        return Ok(None);
    };

    let mut comments = uow
        .repository::<comment::Entity>()
        .find_where(comment::Column::BlogId.eq(id))
        .await?;
    comments.sort_by_key(|c| c.id);

    Ok(Some((blog, comments)))
}

/// Render a create/edit form with a fresh anti-forgery token.
fn form_page(
    state: &AppState,
    jar: CookieJar,
    status: StatusCode,
    model: BlogWithCommentsViewModel,
    errors: Vec<ModelError>,
) -> Response {
    let (jar, antiforgery_token) = issue_token(jar, &state.config.antiforgery);
    let page = BlogFormPage {
        model,
        errors,
        antiforgery_token,
    };
    (status, jar, Json(page)).into_response()
}

/// Form field and message for a conflict on the named table.
fn conflict_error(entity: &str) -> (&'static str, &'static str) {
    if entity == comment::Entity.table_name() {
        ("comments", COMMENT_CONFLICT)
    } else {
        ("blog.concurrency_token", CONCURRENCY_CONFLICT)
    }
}

fn not_found(id: i32) -> AppError {
    AppError::NotFound(format!("Blog {id} not found"))
}
