//! Wishlist pages: everyone's wishes or one family member's.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::{Query, State};
use serde::Deserialize;
use tower_sessions::Session;

use family_wishlist_core::{ListFilter, ListView, UserId};

use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::models::{CardView, Flash, MessageQuery, NavView, Notice};
use crate::routes::load_snapshot;
use crate::state::AppState;

/// Which list to show.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    /// User id; missing or empty selects everyone.
    pub user: Option<String>,
}

impl ListQuery {
    fn filter(&self) -> Result<ListFilter> {
        let user = match self.user.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(
                raw.parse::<UserId>()
                    .map_err(|_| AppError::BadRequest(format!("invalid user id: {raw}")))?,
            ),
        };
        Ok(ListFilter::from_selection(user))
    }
}

/// Wishlist page template.
#[derive(Template, WebTemplate)]
#[template(path = "wishlists/list.html")]
pub struct ListTemplate {
    pub flash: Flash,
    pub nav: NavView,
    pub heading: String,
    pub cards: Vec<CardView>,
    pub can_create: bool,
    pub empty_message: Option<&'static str>,
}

/// Display a wishlist.
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(auth): RequireAuth,
    session: Session,
    Query(list): Query<ListQuery>,
    Query(query): Query<MessageQuery>,
) -> Result<ListTemplate> {
    let filter = list.filter()?;
    let snapshot = load_snapshot(&state, &session, &auth).await?;
    let model = &snapshot.model;

    let view = ListView::build(auth.user_id, filter, &model.profiles, &model.items);

    let heading = match filter {
        ListFilter::All => "All wishlists".to_string(),
        ListFilter::User(_) if view.is_own_list() => "My wishlist".to_string(),
        ListFilter::User(id) => model.profile(id).map_or_else(
            || "Wishlist".to_string(),
            |p| format!("{}'s wishlist", p.username),
        ),
    };

    Ok(ListTemplate {
        flash: Flash::from_query(&query).or_notice(snapshot.stale.then_some(Notice::Generic)),
        nav: NavView::new(auth.user_id, &model.profiles),
        heading,
        cards: view.cards.iter().map(CardView::from).collect(),
        can_create: view.can_create(),
        empty_message: view.empty_message().map(|m| m.text()),
    })
}
