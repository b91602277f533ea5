//! Navigation state shared by every page: current view, display language
//! and whether the sign-in dialog is open.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::domain::entities::user::User;
use crate::domain::value_objects::language::Language;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppView {
    #[default]
    Dashboard,
    Education,
    Tools,
    Signals,
    Community,
    LiveRoom,
    Admin,
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum ShellError {
    #[error("The admin console requires an admin account")]
    AdminOnly,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NavItem {
    pub id: AppView,
    pub label: &'static str,
    pub icon: &'static str,
}

/// Navigation bar entries; the admin console is linked separately
pub fn nav_items(language: Language) -> Vec<NavItem> {
    let entries: [(AppView, &str, &str, &str); 6] = [
        (AppView::Dashboard, "Dashboard", "แดชบอร์ด", "layout-dashboard"),
        (AppView::Signals, "Signals", "สัญญาณเทรด", "bell"),
        (AppView::LiveRoom, "Live Room", "ห้องไลฟ์", "monitor-play"),
        (AppView::Education, "Academy", "คอร์สเรียน", "book-open"),
        (AppView::Tools, "Tools", "เครื่องมือ", "zap"),
        (AppView::Community, "Community", "ชุมชน", "users"),
    ];
    entries
        .into_iter()
        .map(|(id, en, th, icon)| NavItem {
            id,
            label: match language {
                Language::En => en,
                Language::Th => th,
            },
            icon,
        })
        .collect()
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewShell {
    pub view: AppView,
    pub language: Language,
    pub auth_modal_open: bool,
}

impl ViewShell {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn navigate(&mut self, view: AppView, user: Option<&User>) -> Result<AppView, ShellError> {
        if view == AppView::Admin && !user.map(User::is_admin).unwrap_or(false) {
            warn!("Refused navigation to admin console");
            return Err(ShellError::AdminOnly);
        }
        self.view = view;
        Ok(view)
    }

    pub fn set_language(&mut self, language: Language) {
        self.language = language;
    }

    pub fn set_auth_modal(&mut self, open: bool) {
        self.auth_modal_open = open;
    }

    /// Closes the dialog; admins land on the console
    pub fn on_login(&mut self, user: &User) {
        self.auth_modal_open = false;
        if user.is_admin() {
            info!("Admin {} signed in, opening console", user.id);
            self.view = AppView::Admin;
        }
    }

    pub fn on_logout(&mut self) {
        self.view = AppView::Dashboard;
    }
}
