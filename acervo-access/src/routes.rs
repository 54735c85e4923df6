//! Route registry and navigation menu

use crate::permissions::{Capability, Permissions};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteAccess {
    /// Reachable without a session
    Public,
    /// Any approved identity
    Authenticated,
    Requires(Capability),
}

/// Menu section a route is listed under
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Hidden,
    Main,
    Administration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Route {
    pub path: &'static str,
    pub title: &'static str,
    pub access: RouteAccess,
    pub section: Section,
}

impl Route {
    const fn new(path: &'static str, title: &'static str, access: RouteAccess, section: Section) -> Self {
        Self {
            path,
            title,
            access,
            section,
        }
    }

    /// Whether `permissions` reach this route
    pub fn visible_to(&self, permissions: &Permissions) -> bool {
        match self.access {
            RouteAccess::Public | RouteAccess::Authenticated => true,
            RouteAccess::Requires(required) => permissions.grants(required),
        }
    }
}

const COLLECTION: RouteAccess = RouteAccess::Requires(Capability::READ);
const ADMIN: RouteAccess = RouteAccess::Requires(Capability::ADMIN_PANEL);

pub static ROUTES: &[Route] = &[
    Route::new("/auth", "Sign in", RouteAccess::Public, Section::Hidden),
    Route::new("/", "Dashboard", RouteAccess::Authenticated, Section::Main),
    Route::new("/books", "Books", COLLECTION, Section::Main),
    Route::new("/records", "Records", COLLECTION, Section::Main),
    Route::new("/drinks", "Drinks", COLLECTION, Section::Main),
    Route::new("/games", "Board games", COLLECTION, Section::Main),
    Route::new("/reports", "Reports", COLLECTION, Section::Main),
    Route::new("/export", "Export", COLLECTION, Section::Main),
    Route::new("/profile", "Profile", RouteAccess::Authenticated, Section::Hidden),
    Route::new("/admin", "Administration", ADMIN, Section::Administration),
    Route::new("/admin/books", "Manage books", ADMIN, Section::Administration),
    Route::new("/admin/drinks", "Manage drinks", ADMIN, Section::Administration),
    Route::new("/admin/users", "Users", ADMIN, Section::Administration),
];

/// Look up a route by exact path; a trailing slash is ignored
pub fn find(path: &str) -> Option<&'static Route> {
    let path = match path.strip_suffix('/') {
        Some(trimmed) if !trimmed.is_empty() => trimmed,
        _ => path,
    };
    ROUTES.iter().find(|route| route.path == path)
}

/// Menu entries for `permissions`, in display order
pub fn navigation(permissions: &Permissions) -> Vec<&'static Route> {
    ROUTES
        .iter()
        .filter(|route| route.section != Section::Hidden)
        .filter(|route| route.visible_to(permissions))
        .collect()
}
