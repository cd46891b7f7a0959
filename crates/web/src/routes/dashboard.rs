//! Dashboard: the landing page after sign-in.
//!
//! Shows the entry points to every wishlist plus two informational overlays.
//! Whether the overlays were already seen is remembered in cookies only.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::{Query, State};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::{DateTime, Utc};
use tower_sessions::Session;

use family_wishlist_core::{Dashboard, UserId, welcome};

use crate::error::Result;
use crate::middleware::RequireAuth;
use crate::models::{Flash, MessageQuery, NavView, Notice, ProfileView};
use crate::routes::load_snapshot;
use crate::state::AppState;

/// Set on the first dashboard visit of a browser.
const VISITED_COOKIE: &str = "fw_visited";

/// Dashboard page template.
#[derive(Template, WebTemplate)]
#[template(path = "dashboard.html")]
pub struct DashboardTemplate {
    pub flash: Flash,
    pub nav: NavView,
    pub me: Option<ProfileView>,
    pub family: Vec<ProfileView>,
    pub show_tips: bool,
    pub show_welcome: bool,
}

/// Display the dashboard.
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(auth): RequireAuth,
    session: Session,
    jar: CookieJar,
    Query(query): Query<MessageQuery>,
) -> Result<(CookieJar, DashboardTemplate)> {
    let snapshot = load_snapshot(&state, &session, &auth).await?;
    let dashboard = Dashboard::build(auth.user_id, &snapshot.model.profiles);
    let secure = state.config().is_secure();
    let now = Utc::now();

    let show_tips = welcome::show_tips(jar.get(VISITED_COOKIE).is_some());
    let welcome_name = welcome_cookie_name(auth.user_id);
    let last_shown = jar
        .get(&welcome_name)
        .and_then(|c| DateTime::parse_from_rfc3339(c.value()).ok())
        .map(|at| at.with_timezone(&Utc));
    let show_welcome = welcome::show_welcome(last_shown, now);

    let mut jar = jar;
    if show_tips {
        jar = jar.add(remembered(VISITED_COOKIE.to_string(), "1".to_string(), secure));
    }
    if show_welcome {
        jar = jar.add(remembered(welcome_name, now.to_rfc3339(), secure));
    }

    let template = DashboardTemplate {
        flash: Flash::from_query(&query).or_notice(snapshot.stale.then_some(Notice::Generic)),
        nav: NavView::new(auth.user_id, &snapshot.model.profiles),
        me: dashboard.me.as_ref().map(ProfileView::from),
        family: dashboard.family.iter().map(ProfileView::from).collect(),
        show_tips,
        show_welcome,
    };

    Ok((jar, template))
}

fn welcome_cookie_name(user_id: UserId) -> String {
    format!("fw_welcome_{}", user_id.as_uuid().simple())
}

fn remembered(name: String, value: String, secure: bool) -> Cookie<'static> {
    let mut cookie = Cookie::build((name, value))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .build();
    cookie.make_permanent();
    cookie
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_welcome_cookie_is_per_user() {
        let a = welcome_cookie_name(UserId::random());
        let b = welcome_cookie_name(UserId::random());
        assert_ne!(a, b);
        assert!(a.starts_with("fw_welcome_"));
        assert!(!a.contains('-'));
    }

    #[test]
    fn test_remembered_cookie_attributes() {
        let cookie = remembered("fw_visited".to_string(), "1".to_string(), true);
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.secure(), Some(true));
        assert!(cookie.max_age().is_some());
    }
}
