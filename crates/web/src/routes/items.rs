//! Item route handlers: detail, create/edit forms and two-step deletion.
//!
//! Each form submission runs through [`ItemDialog`]: validation failures and
//! backend failures re-render the form with the values the user typed, and
//! only a successful write closes it (redirect with a notice).
//!
//! Deletion never happens from a single request. `POST /items/{id}/delete`
//! records the item and a random nonce in the browser session and renders a
//! confirmation page; only a confirm carrying that nonce reaches the store.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use rand::{Rng, distr::Alphanumeric};
use serde::Deserialize;
use tower_sessions::Session;

use family_wishlist_core::{DeleteFlow, ItemCard, ItemDialog, ItemForm, ItemId};

use crate::backend::{AuthSession, BackendError};
use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::models::{CardView, Flash, FormView, MessageQuery, NavView, Notice, session_keys};
use crate::routes::{item_href, load_snapshot, sign_out_browser, wishlist_href};
use crate::services::CommandError;
use crate::state::AppState;

/// Length of the deletion confirmation nonce.
const NONCE_LENGTH: usize = 32;

// =============================================================================
// Templates
// =============================================================================

/// Create/edit form template.
#[derive(Template, WebTemplate)]
#[template(path = "items/form.html")]
pub struct ItemFormTemplate {
    pub flash: Flash,
    pub nav: NavView,
    pub form: FormView,
}

/// Item detail template.
#[derive(Template, WebTemplate)]
#[template(path = "items/show.html")]
pub struct ItemTemplate {
    pub flash: Flash,
    pub nav: NavView,
    pub card: CardView,
    pub back_href: String,
}

/// Deletion confirmation template.
#[derive(Template, WebTemplate)]
#[template(path = "items/confirm_delete.html")]
pub struct ConfirmDeleteTemplate {
    pub flash: Flash,
    pub nav: NavView,
    pub card: CardView,
    pub nonce: String,
}

/// Deletion confirmation form data.
#[derive(Debug, Deserialize)]
pub struct ConfirmForm {
    #[serde(default)]
    pub nonce: String,
}

// =============================================================================
// Detail
// =============================================================================

/// Display one item.
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(auth): RequireAuth,
    session: Session,
    Path(id): Path<ItemId>,
    Query(query): Query<MessageQuery>,
) -> Result<Response> {
    let snapshot = load_snapshot(&state, &session, &auth).await?;
    let model = &snapshot.model;

    let Some(item) = model.item(id).cloned() else {
        return Ok(Notice::NotFound
            .redirect(&wishlist_href(auth.user_id))
            .into_response());
    };

    let back_href = wishlist_href(item.owner_id);
    let card = ItemCard {
        owner: model.profile(item.owner_id).cloned(),
        can_edit: item.is_owned_by(auth.user_id),
        item,
    };

    Ok(ItemTemplate {
        flash: Flash::from_query(&query).or_notice(snapshot.stale.then_some(Notice::Generic)),
        nav: NavView::new(auth.user_id, &model.profiles),
        card: CardView::from(&card),
        back_href,
    }
    .into_response())
}

// =============================================================================
// Create
// =============================================================================

/// Display the create form.
pub async fn new_page(
    State(state): State<AppState>,
    RequireAuth(auth): RequireAuth,
    session: Session,
    Query(query): Query<MessageQuery>,
) -> Result<Response> {
    let dialog = ItemDialog::create();
    let form = dialog.form().cloned().unwrap_or_default();
    let view = FormView::create(&form, wishlist_href(auth.user_id));

    render_form(&state, &session, &auth, view, Flash::from_query(&query), StatusCode::OK).await
}

/// Handle create form submission.
pub async fn create(
    State(state): State<AppState>,
    RequireAuth(auth): RequireAuth,
    session: Session,
    Form(form): Form<ItemForm>,
) -> Result<Response> {
    let my_list = wishlist_href(auth.user_id);
    let mut dialog = ItemDialog::with_values(form);

    let details = match dialog.submit() {
        Ok(details) => details,
        Err(e) => {
            let form = dialog.form().cloned().unwrap_or_default();
            let view = FormView::create(&form, my_list);
            return render_form(
                &state,
                &session,
                &auth,
                view,
                Flash::error(e.to_string()),
                StatusCode::UNPROCESSABLE_ENTITY,
            )
            .await;
        }
    };

    match state.commands().create(&auth, &details).await {
        Ok(_) => {
            dialog.succeed();
            Ok(Notice::ItemAdded.redirect(&my_list).into_response())
        }
        Err(CommandError::InFlight) => Ok(Notice::InFlight.redirect(&my_list).into_response()),
        Err(CommandError::Backend(BackendError::Unauthorized)) => {
            sign_out_browser(&session).await;
            Err(AppError::SessionExpired)
        }
        Err(e) => {
            tracing::warn!(user_id = %auth.user_id, error = %e, "Wish could not be added");
            dialog.fail();
            let form = dialog.form().cloned().unwrap_or_default();
            let view = FormView::create(&form, my_list);
            render_form(
                &state,
                &session,
                &auth,
                view,
                Flash::from_notice(Some(Notice::Generic)),
                StatusCode::SERVICE_UNAVAILABLE,
            )
            .await
        }
    }
}

// =============================================================================
// Edit
// =============================================================================

/// Display the edit form, pre-populated from the item.
pub async fn edit_page(
    State(state): State<AppState>,
    RequireAuth(auth): RequireAuth,
    session: Session,
    Path(id): Path<ItemId>,
    Query(query): Query<MessageQuery>,
) -> Result<Response> {
    let snapshot = load_snapshot(&state, &session, &auth).await?;

    let Some(item) = snapshot.model.item(id) else {
        return Ok(Notice::NotFound
            .redirect(&wishlist_href(auth.user_id))
            .into_response());
    };
    if !item.is_owned_by(auth.user_id) {
        return Ok(Notice::NotOwner.redirect(&item_href(id)).into_response());
    }

    let dialog = ItemDialog::edit(item);
    let form = dialog.form().cloned().unwrap_or_default();

    Ok(ItemFormTemplate {
        flash: Flash::from_query(&query),
        nav: NavView::new(auth.user_id, &snapshot.model.profiles),
        form: FormView::edit(&form, item_href(id)),
    }
    .into_response())
}

/// Handle edit form submission.
pub async fn update(
    State(state): State<AppState>,
    RequireAuth(auth): RequireAuth,
    session: Session,
    Path(id): Path<ItemId>,
    Form(form): Form<ItemForm>,
) -> Result<Response> {
    let detail = item_href(id);
    let mut dialog = ItemDialog::with_values(form);

    let details = match dialog.submit() {
        Ok(details) => details,
        Err(e) => {
            let form = dialog.form().cloned().unwrap_or_default();
            let view = FormView::edit(&form, detail);
            return render_form(
                &state,
                &session,
                &auth,
                view,
                Flash::error(e.to_string()),
                StatusCode::UNPROCESSABLE_ENTITY,
            )
            .await;
        }
    };

    match state.commands().update(&auth, id, &details).await {
        Ok(_) => {
            dialog.succeed();
            Ok(Notice::ItemUpdated.redirect(&detail).into_response())
        }
        Err(CommandError::InFlight) => Ok(Notice::InFlight.redirect(&detail).into_response()),
        Err(CommandError::NotOwner(_)) => Ok(Notice::NotOwner.redirect(&detail).into_response()),
        Err(CommandError::NotFound(_)) => Ok(Notice::NotFound
            .redirect(&wishlist_href(auth.user_id))
            .into_response()),
        Err(CommandError::Backend(BackendError::Unauthorized)) => {
            sign_out_browser(&session).await;
            Err(AppError::SessionExpired)
        }
        Err(e) => {
            tracing::warn!(user_id = %auth.user_id, item_id = %id, error = %e, "Wish could not be updated");
            dialog.fail();
            let form = dialog.form().cloned().unwrap_or_default();
            let view = FormView::edit(&form, detail);
            render_form(
                &state,
                &session,
                &auth,
                view,
                Flash::from_notice(Some(Notice::Generic)),
                StatusCode::SERVICE_UNAVAILABLE,
            )
            .await
        }
    }
}

// =============================================================================
// Delete
// =============================================================================

/// Ask for confirmation before deleting.
pub async fn request_delete(
    State(state): State<AppState>,
    RequireAuth(auth): RequireAuth,
    session: Session,
    Path(id): Path<ItemId>,
) -> Result<Response> {
    let snapshot = load_snapshot(&state, &session, &auth).await?;
    let model = &snapshot.model;

    let Some(item) = model.item(id).cloned() else {
        return Ok(Notice::NotFound
            .redirect(&wishlist_href(auth.user_id))
            .into_response());
    };
    if !item.is_owned_by(auth.user_id) {
        return Ok(Notice::NotOwner.redirect(&item_href(id)).into_response());
    }

    let nonce = confirmation_nonce();
    session
        .insert(session_keys::DELETE_FLOW, DeleteFlow::request(id, nonce.clone()))
        .await?;
    tracing::debug!(user_id = %auth.user_id, item_id = %id, "Deletion awaiting confirmation");

    let card = ItemCard {
        owner: model.profile(item.owner_id).cloned(),
        can_edit: true,
        item,
    };

    Ok(ConfirmDeleteTemplate {
        flash: Flash::default(),
        nav: NavView::new(auth.user_id, &model.profiles),
        card: CardView::from(&card),
        nonce,
    }
    .into_response())
}

/// Delete after confirmation.
///
/// The pending deletion is cleared whatever happens; on success or backend
/// failure the user lands on their list.
pub async fn confirm_delete(
    State(state): State<AppState>,
    RequireAuth(auth): RequireAuth,
    session: Session,
    Path(id): Path<ItemId>,
    Form(form): Form<ConfirmForm>,
) -> Result<Response> {
    let mut flow: DeleteFlow = session
        .get(session_keys::DELETE_FLOW)
        .await?
        .unwrap_or_default();
    let confirmed = flow.confirm(id, &form.nonce);
    session.insert(session_keys::DELETE_FLOW, &flow).await?;

    let item_id = match confirmed {
        Ok(item_id) => item_id,
        Err(e) => {
            tracing::warn!(user_id = %auth.user_id, item_id = %id, error = %e, "Unconfirmed deletion refused");
            return Ok(Notice::DeleteNotConfirmed
                .redirect(&item_href(id))
                .into_response());
        }
    };

    let my_list = wishlist_href(auth.user_id);
    let notice = match state.commands().delete(&auth, item_id).await {
        Ok(_) => Notice::ItemDeleted,
        Err(CommandError::InFlight) => Notice::InFlight,
        Err(CommandError::NotOwner(_)) => Notice::NotOwner,
        Err(CommandError::NotFound(_)) => Notice::NotFound,
        Err(CommandError::Backend(BackendError::Unauthorized)) => {
            sign_out_browser(&session).await;
            return Err(AppError::SessionExpired);
        }
        Err(CommandError::Backend(e)) => {
            tracing::warn!(user_id = %auth.user_id, item_id = %id, error = %e, "Wish could not be deleted");
            Notice::Generic
        }
    };

    Ok(notice.redirect(&my_list).into_response())
}

/// Keep the item and return to its detail page.
pub async fn cancel_delete(
    RequireAuth(auth): RequireAuth,
    session: Session,
    Path(id): Path<ItemId>,
) -> Result<Response> {
    let mut flow: DeleteFlow = session
        .get(session_keys::DELETE_FLOW)
        .await?
        .unwrap_or_default();
    flow.cancel();
    session.insert(session_keys::DELETE_FLOW, &flow).await?;
    tracing::debug!(user_id = %auth.user_id, item_id = %id, "Deletion cancelled");

    Ok(Redirect::to(&item_href(id)).into_response())
}

// =============================================================================
// Helpers
// =============================================================================

async fn render_form(
    state: &AppState,
    session: &Session,
    auth: &AuthSession,
    form: FormView,
    flash: Flash,
    status: StatusCode,
) -> Result<Response> {
    let snapshot = load_snapshot(state, session, auth).await?;
    let template = ItemFormTemplate {
        flash,
        nav: NavView::new(auth.user_id, &snapshot.model.profiles),
        form,
    };
    Ok((status, template).into_response())
}

fn confirmation_nonce() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(NONCE_LENGTH)
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nonces_are_random_and_alphanumeric() {
        let a = confirmation_nonce();
        let b = confirmation_nonce();
        assert_eq!(a.len(), NONCE_LENGTH);
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(a, b);
    }
}
