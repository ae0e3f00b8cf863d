use crate::application::error::{ErrorReport, HttpError};
use askama::{Error as AskamaError, Template};
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use thiserror::Error;

#[derive(Debug, Error)]
#[error("{public_message}")]
pub struct TemplateRenderError {
    pub(crate) source: &'static str,
    pub(crate) public_message: &'static str,
    #[source]
    pub(crate) error: AskamaError,
}

impl TemplateRenderError {
    pub fn new(source: &'static str, public_message: &'static str, error: AskamaError) -> Self {
        Self {
            source,
            public_message,
            error,
        }
    }
}

impl From<TemplateRenderError> for HttpError {
    fn from(err: TemplateRenderError) -> Self {
        let TemplateRenderError {
            source,
            public_message,
            error,
        } = err;

        HttpError::from_error(
            source,
            StatusCode::INTERNAL_SERVER_ERROR,
            public_message,
            &error,
        )
    }
}

pub fn render_template<T: Template>(template: T) -> Result<Html<String>, HttpError> {
    template.render().map(Html).map_err(|err| {
        TemplateRenderError::new(
            "presentation::views::render_template",
            "Template rendering failed",
            err,
        )
        .into()
    })
}

pub fn render_template_response<T: Template>(template: T, status: StatusCode) -> Response {
    match render_template(template) {
        Ok(html) => (status, html).into_response(),
        Err(err) => err.into_response(),
    }
}

pub fn render_not_found_response() -> Response {
    let view = ErrorPageView::not_found();
    let mut response = render_template_response(ErrorTemplate { view }, StatusCode::NOT_FOUND);
    ErrorReport::from_message(
        "presentation::views::render_not_found_response",
        StatusCode::NOT_FOUND,
        "Resource not found",
    )
    .attach(&mut response);
    response
}

#[derive(Clone, Debug)]
pub struct GroupBadge {
    pub slug: String,
    pub title: String,
    pub href: String,
}

#[derive(Clone, Debug)]
pub struct PostCard {
    pub id: String,
    pub href: String,
    pub author_username: String,
    pub author_href: String,
    pub published: String,
    pub preview: String,
    pub group: Option<GroupBadge>,
}

#[derive(Clone, Debug)]
pub struct PaginationView {
    pub current_page: u32,
    pub page_count: u32,
    pub total_count: u64,
    pub previous_href: Option<String>,
    pub next_href: Option<String>,
}

#[derive(Debug)]
pub struct ListingContext {
    pub posts: Vec<PostCard>,
    pub has_results: bool,
    pub pagination: PaginationView,
}

#[derive(Clone)]
pub struct GroupView {
    pub title: String,
    pub description: String,
}

#[derive(Clone, Debug)]
pub struct AuthorView {
    pub username: String,
    pub post_count: u64,
}

#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    pub view: ListingContext,
}

#[derive(Template)]
#[template(path = "group.html")]
pub struct GroupTemplate {
    pub group: GroupView,
    pub view: ListingContext,
}

#[derive(Template)]
#[template(path = "profile.html")]
pub struct ProfileTemplate {
    pub author: AuthorView,
    pub view: ListingContext,
}

#[derive(Debug)]
pub struct PostDetailContext {
    pub card: PostCard,
    pub body_text: String,
    pub author_post_count: u64,
    pub can_edit: bool,
    pub edit_href: String,
}

#[derive(Template)]
#[template(path = "post.html")]
pub struct PostTemplate {
    pub view: PostDetailContext,
}

#[derive(Clone, Debug)]
pub struct GroupOption {
    pub id: String,
    pub title: String,
    pub selected: bool,
}

#[derive(Debug)]
pub struct PostFormContext {
    pub is_edit: bool,
    pub action_href: String,
    pub body_text: String,
    pub groups: Vec<GroupOption>,
    pub error: Option<String>,
}

#[derive(Template)]
#[template(path = "post_form.html")]
pub struct PostFormTemplate {
    pub view: PostFormContext,
}

pub struct ErrorPageView {
    pub title: String,
    pub message: String,
}

impl ErrorPageView {
    pub fn not_found() -> Self {
        Self {
            title: "Page Not Found".to_string(),
            message: "The page you requested does not exist. Try returning to the homepage."
                .to_string(),
        }
    }

    pub fn forbidden() -> Self {
        Self {
            title: "Not Allowed".to_string(),
            message: "Only the author of a post may edit it.".to_string(),
        }
    }
}

#[derive(Template)]
#[template(path = "error.html")]
pub struct ErrorTemplate {
    pub view: ErrorPageView,
}
