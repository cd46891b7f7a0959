//! Request/response models shared by the route handlers.

pub mod notice;
pub mod session;
pub mod view;

pub use notice::{Flash, MessageQuery, Notice, NoticeKind};
pub use session::keys as session_keys;
pub use view::{CardView, FormView, NavView, ProfileView};
