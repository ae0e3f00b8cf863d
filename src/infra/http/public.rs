use std::sync::Arc;

use axum::{
    Router,
    extract::{Path, Query, State},
    http::StatusCode,
    middleware,
    response::{IntoResponse, Redirect, Response},
    routing::get,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    application::{
        error::{ErrorReport, HttpError},
        feed::{FeedError, FeedService},
        pagination::PageQuery,
        posts::{PostError, PostInput, PostService},
        repos::AuthorsRepo,
    },
    domain::entities::AuthorRecord,
    infra::db::PostgresRepositories,
    presentation::views::{
        ErrorPageView, ErrorTemplate, GroupTemplate, IndexTemplate, PostFormTemplate, PostTemplate,
        ProfileTemplate, render_not_found_response, render_template_response,
    },
};

use super::{
    CurrentAuthor, db_health_response,
    middleware::{log_responses, set_request_context},
};

#[derive(Clone)]
pub struct HttpState {
    pub feed: Arc<FeedService>,
    pub posts: Arc<PostService>,
    pub authors: Arc<dyn AuthorsRepo>,
    pub db: Arc<PostgresRepositories>,
}

pub fn build_router(state: HttpState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/group/{slug}", get(group_index))
        .route("/profile/{username}", get(profile))
        .route("/create", get(create_form).post(create_submit))
        .route("/posts/{id}", get(post_detail))
        .route("/posts/{id}/edit", get(edit_form).post(edit_submit))
        .route("/_health/db", get(db_health))
        .fallback(fallback)
        .with_state(state)
        .layer(middleware::from_fn(log_responses))
        .layer(middleware::from_fn(set_request_context))
}

async fn index(State(state): State<HttpState>, Query(query): Query<PageQuery>) -> Response {
    match state.feed.index_context(query.number()).await {
        Ok(view) => render_template_response(IndexTemplate { view }, StatusCode::OK),
        Err(err) => feed_error_to_response(err),
    }
}

async fn group_index(
    State(state): State<HttpState>,
    Path(slug): Path<String>,
    Query(query): Query<PageQuery>,
) -> Response {
    match state.feed.group_context(&slug, query.number()).await {
        Ok((group, view)) => render_template_response(GroupTemplate { group, view }, StatusCode::OK),
        Err(err) => feed_error_to_response(err),
    }
}

async fn profile(
    State(state): State<HttpState>,
    Path(username): Path<String>,
    Query(query): Query<PageQuery>,
) -> Response {
    match state.feed.profile_context(&username, query.number()).await {
        Ok((author, view)) => {
            render_template_response(ProfileTemplate { author, view }, StatusCode::OK)
        }
        Err(err) => feed_error_to_response(err),
    }
}

async fn post_detail(
    State(state): State<HttpState>,
    Path(id): Path<Uuid>,
    CurrentAuthor(viewer): CurrentAuthor,
) -> Response {
    match state.posts.detail_context(id, viewer.as_ref()).await {
        Ok(view) => render_template_response(PostTemplate { view }, StatusCode::OK),
        Err(PostError::NotFound) => render_not_found_response(),
        Err(err) => HttpError::from(err).into_response(),
    }
}

async fn create_form(
    State(state): State<HttpState>,
    CurrentAuthor(viewer): CurrentAuthor,
) -> Response {
    if viewer.is_none() {
        return sign_in_required_response("infra::http::public::create_form");
    }

    match state.posts.create_form_context().await {
        Ok(view) => render_template_response(PostFormTemplate { view }, StatusCode::OK),
        Err(err) => HttpError::from(err).into_response(),
    }
}

async fn create_submit(
    State(state): State<HttpState>,
    CurrentAuthor(viewer): CurrentAuthor,
    form: axum::Form<PostForm>,
) -> Response {
    const SOURCE: &str = "infra::http::public::create_submit";

    let Some(author) = viewer else {
        return sign_in_required_response(SOURCE);
    };

    let input = match parse_post_input(form.0, SOURCE) {
        Ok(input) => input,
        Err(err) => return err.into_response(),
    };

    let body_text = input.body_text.clone();
    match state.posts.create_post(&author, input).await {
        Ok(_) => Redirect::to(&format!("/profile/{}", author.username)).into_response(),
        Err(err @ (PostError::Validation(_) | PostError::UnknownGroup)) => {
            rerender_create_form(&state, body_text, &err).await
        }
        Err(err) => HttpError::from(err).into_response(),
    }
}

async fn edit_form(
    State(state): State<HttpState>,
    Path(id): Path<Uuid>,
    CurrentAuthor(viewer): CurrentAuthor,
) -> Response {
    let Some(author) = viewer else {
        return sign_in_required_response("infra::http::public::edit_form");
    };

    match state.posts.edit_form_context(&author, id).await {
        Ok(view) => render_template_response(PostFormTemplate { view }, StatusCode::OK),
        Err(PostError::NotFound) => render_not_found_response(),
        Err(err @ PostError::PermissionDenied { .. }) => forbidden_response(err),
        Err(err) => HttpError::from(err).into_response(),
    }
}

async fn edit_submit(
    State(state): State<HttpState>,
    Path(id): Path<Uuid>,
    CurrentAuthor(viewer): CurrentAuthor,
    form: axum::Form<PostForm>,
) -> Response {
    const SOURCE: &str = "infra::http::public::edit_submit";

    let Some(author) = viewer else {
        return sign_in_required_response(SOURCE);
    };

    let input = match parse_post_input(form.0, SOURCE) {
        Ok(input) => input,
        Err(err) => return err.into_response(),
    };

    let body_text = input.body_text.clone();
    match state.posts.update_post(&author, id, input).await {
        Ok(record) => Redirect::to(&format!("/posts/{}", record.id)).into_response(),
        Err(PostError::NotFound) => render_not_found_response(),
        Err(err @ PostError::PermissionDenied { .. }) => forbidden_response(err),
        Err(err @ (PostError::Validation(_) | PostError::UnknownGroup)) => {
            rerender_edit_form(&state, &author, id, body_text, &err).await
        }
        Err(err) => HttpError::from(err).into_response(),
    }
}

async fn db_health(State(state): State<HttpState>) -> Response {
    db_health_response(state.db.health_check().await)
}

async fn fallback() -> Response {
    render_not_found_response()
}

/// Form payload for both the creation and edit forms. The group select
/// submits an empty string when no group is chosen.
#[derive(Debug, Deserialize)]
struct PostForm {
    body_text: String,
    #[serde(default)]
    group_id: Option<String>,
}

fn parse_post_input(form: PostForm, source: &'static str) -> Result<PostInput, HttpError> {
    let group_id = match form.group_id.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(raw) => Some(Uuid::parse_str(raw).map_err(|err| {
            HttpError::new(
                source,
                StatusCode::BAD_REQUEST,
                "Invalid group selection",
                format!("group id `{raw}` is not a valid uuid: {err}"),
            )
        })?),
    };

    Ok(PostInput {
        body_text: form.body_text,
        group_id,
    })
}

fn feed_error_to_response(err: FeedError) -> Response {
    match err {
        FeedError::UnknownGroup(_) | FeedError::UnknownAuthor(_) => render_not_found_response(),
        other => HttpError::from(other).into_response(),
    }
}

fn sign_in_required_response(source: &'static str) -> Response {
    HttpError::new(
        source,
        StatusCode::UNAUTHORIZED,
        "Sign in to publish posts",
        "request carried no resolvable author identity",
    )
    .into_response()
}

fn forbidden_response(err: PostError) -> Response {
    let view = ErrorPageView::forbidden();
    let mut response = render_template_response(ErrorTemplate { view }, StatusCode::FORBIDDEN);
    ErrorReport::from_error(
        "infra::http::public::forbidden_response",
        StatusCode::FORBIDDEN,
        &err,
    )
    .attach(&mut response);
    response
}

async fn rerender_create_form(state: &HttpState, body_text: String, err: &PostError) -> Response {
    match state.posts.create_form_context().await {
        Ok(mut view) => {
            view.body_text = body_text;
            view.error = Some(err.to_string());
            render_template_response(PostFormTemplate { view }, StatusCode::BAD_REQUEST)
        }
        Err(err) => HttpError::from(err).into_response(),
    }
}

async fn rerender_edit_form(
    state: &HttpState,
    author: &AuthorRecord,
    id: Uuid,
    body_text: String,
    err: &PostError,
) -> Response {
    match state.posts.edit_form_context(author, id).await {
        Ok(mut view) => {
            view.body_text = body_text;
            view.error = Some(err.to_string());
            render_template_response(PostFormTemplate { view }, StatusCode::BAD_REQUEST)
        }
        Err(err) => HttpError::from(err).into_response(),
    }
}
