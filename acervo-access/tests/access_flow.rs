//! End-to-end access flow against the in-process directory

use std::sync::{Arc, Mutex};
use std::time::Duration;

use acervo_access::{
    AccessConfig, AccessController, AccessDecision, AccessHandle, AdminConsole, Capability,
    ComponentGuard, InMemoryDirectory, Navigator, Notice, Notifier, Permissions, Rendered,
    RouteGuard, RouteView, routes,
};
use shared::models::{Identity, Role};
use tokio::sync::watch;
use uuid::Uuid;

#[derive(Default)]
struct Ui {
    paths: Mutex<Vec<String>>,
    notices: Mutex<Vec<Notice>>,
}

impl Navigator for Ui {
    fn navigate_to(&self, path: &str) {
        self.paths.lock().unwrap().push(path.to_string());
    }
}

impl Notifier for Ui {
    fn notify(&self, notice: &Notice) {
        self.notices.lock().unwrap().push(notice.clone());
    }
}

fn active(dir: &InMemoryDirectory, email: &str, role: Role) -> Identity {
    let identity = Identity::new(Uuid::new_v4(), email);
    dir.register_with_role(&identity, role);
    dir.approve(identity.id);
    identity
}

fn start(
    dir: &Arc<InMemoryDirectory>,
    identity: Option<Identity>,
    config: &AccessConfig,
) -> (AccessHandle, watch::Sender<Option<Identity>>) {
    let (identity_tx, identity_rx) = watch::channel(identity);
    let (controller, handle) = AccessController::new(dir.clone(), dir.clone(), identity_rx, config);
    controller.spawn();
    (handle, identity_tx)
}

#[tokio::test(start_paused = true)]
async fn test_slow_role_lookup_shows_only_loading() {
    let dir = Arc::new(InMemoryDirectory::new());
    let user = active(&dir, "ana@example.com", Role::ReadOnly);
    dir.set_delay(user.id, Duration::from_secs(4));

    let (handle, _tx) = start(&dir, Some(user), &AccessConfig::default());
    let ui = Ui::default();
    let mut route = RouteGuard::new(Capability::WRITE);
    let component = ComponentGuard::require_write();

    // sample the whole pending window
    for _ in 0..7 {
        tokio::time::sleep(Duration::from_millis(500)).await;
        let snapshot = handle.snapshot();
        assert!(snapshot.loading());
        assert_eq!(snapshot.permissions(), Permissions::NONE);
        assert_eq!(route.update(&snapshot, &ui, &ui), RouteView::FullScreenLoading);
        assert_eq!(component.render(&snapshot, || "form"), Rendered::Loading);
    }
    assert!(ui.paths.lock().unwrap().is_empty());
    assert!(ui.notices.lock().unwrap().is_empty());

    let snapshot = handle.settled().await.unwrap();
    assert_eq!(route.update(&snapshot, &ui, &ui), RouteView::Nothing);
    assert_eq!(route.update(&snapshot, &ui, &ui), RouteView::Nothing);
    assert_eq!(*ui.paths.lock().unwrap(), vec!["/".to_string()]);
    assert_eq!(ui.notices.lock().unwrap().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_identity_switch_discards_previous_lookup() {
    let dir = Arc::new(InMemoryDirectory::new());
    let admin = active(&dir, "admin@example.com", Role::Admin);
    let reader = active(&dir, "reader@example.com", Role::ReadOnly);
    dir.set_delay(admin.id, Duration::from_secs(5));

    let (handle, identity_tx) = start(&dir, Some(admin), &AccessConfig::default());
    tokio::time::sleep(Duration::from_secs(1)).await;
    identity_tx.send(Some(reader.clone())).unwrap();

    let snapshot = handle.settled().await.unwrap();
    assert_eq!(snapshot.identity(), Some(&reader));
    assert_eq!(snapshot.role_status().role, Some(Role::ReadOnly));

    // well past the admin lookup's delay
    tokio::time::sleep(Duration::from_secs(10)).await;
    let snapshot = handle.snapshot();
    assert_eq!(snapshot.identity(), Some(&reader));
    assert!(!snapshot.permissions().can_access_admin_panel);
}

#[tokio::test]
async fn test_sign_out_and_back_in() {
    let dir = Arc::new(InMemoryDirectory::new());
    let user = active(&dir, "ana@example.com", Role::Standard);
    let (handle, identity_tx) = start(&dir, Some(user.clone()), &AccessConfig::default());
    let mut rx = handle.subscribe();

    handle.settled().await.unwrap();
    identity_tx.send(None).unwrap();
    let snapshot = rx
        .wait_for(|s| s.decision() == AccessDecision::SignInRequired)
        .await
        .unwrap()
        .clone();
    assert_eq!(snapshot.permissions(), Permissions::NONE);

    identity_tx.send(Some(user)).unwrap();
    let snapshot = rx
        .wait_for(|s| !s.loading() && s.identity().is_some())
        .await
        .unwrap()
        .clone();
    assert_eq!(snapshot.permissions(), Permissions::for_role(Role::Standard));
}

#[tokio::test(start_paused = true)]
async fn test_lookup_timeout_is_unavailable_not_denied() {
    let dir = Arc::new(InMemoryDirectory::new());
    let user = active(&dir, "ana@example.com", Role::Admin);
    dir.set_delay(user.id, Duration::from_secs(120));
    let config = AccessConfig::default().with_lookup_timeout(Duration::from_secs(3));

    let (handle, _tx) = start(&dir, Some(user.clone()), &config);
    let snapshot = handle.settled().await.unwrap();
    assert!(matches!(snapshot.decision(), AccessDecision::Unavailable { .. }));

    let ui = Ui::default();
    let mut route = RouteGuard::new(Capability::READ);
    assert!(matches!(route.update(&snapshot, &ui, &ui), RouteView::Unavailable(_)));
    assert!(ui.paths.lock().unwrap().is_empty());

    // retry once the backend answers again
    dir.clear_delay(user.id);
    handle.refresh();
    let mut rx = handle.subscribe();
    let snapshot = rx
        .wait_for(|s| matches!(s.decision(), AccessDecision::Granted { .. }))
        .await
        .unwrap()
        .clone();
    assert_eq!(route.update(&snapshot, &ui, &ui), RouteView::Render);
}

#[tokio::test]
async fn test_unknown_role_string_is_unavailable() {
    let dir = Arc::new(InMemoryDirectory::new());
    let user = active(&dir, "ana@example.com", Role::Standard);
    dir.set_raw_role(user.id, "superuser");

    let (handle, _tx) = start(&dir, Some(user), &AccessConfig::default());
    let snapshot = handle.settled().await.unwrap();
    assert!(matches!(snapshot.decision(), AccessDecision::Unavailable { .. }));
    assert_eq!(snapshot.permissions(), Permissions::NONE);
}

#[tokio::test]
async fn test_unapproved_admin_sees_only_waiting_screen() {
    let dir = Arc::new(InMemoryDirectory::new());
    let admin = Identity::new(Uuid::new_v4(), "admin@example.com");
    dir.register_with_role(&admin, Role::Admin);

    let (handle, _tx) = start(&dir, Some(admin), &AccessConfig::default());
    let snapshot = handle.settled().await.unwrap();
    assert_eq!(snapshot.decision(), AccessDecision::AwaitingApproval);

    let ui = Ui::default();
    for route in routes::ROUTES {
        if let Some(mut guard) = RouteGuard::for_route(route, &AccessConfig::default()) {
            assert!(matches!(
                guard.update(&snapshot, &ui, &ui),
                RouteView::AwaitingApproval(_)
            ));
        }
    }
    assert!(!snapshot.permissions().can_access_admin_panel);
    assert!(routes::navigation(&snapshot.permissions())
        .iter()
        .all(|r| r.section != routes::Section::Administration));
    assert_eq!(dir.role_lookups(), 0);
    assert!(!snapshot.role_status().loading);
}

#[tokio::test]
async fn test_approval_and_role_change_reach_the_member_session() {
    let dir = Arc::new(InMemoryDirectory::new());
    let admin = active(&dir, "admin@example.com", Role::Admin);
    let member = Identity::new(Uuid::new_v4(), "member@example.com");
    dir.register_with_role(&member, Role::Standard);

    let (admin_access, _admin_tx) = start(&dir, Some(admin), &AccessConfig::default());
    admin_access.settled().await.unwrap();
    let console = AdminConsole::new(dir.clone(), admin_access);

    let (member_access, _member_tx) = start(&dir, Some(member.clone()), &AccessConfig::default());
    assert_eq!(
        member_access.settled().await.unwrap().decision(),
        AccessDecision::AwaitingApproval
    );

    console.approve(member.id).await.unwrap();
    console.approve(member.id).await.unwrap();
    member_access.refresh();
    let mut rx = member_access.subscribe();
    let snapshot = rx
        .wait_for(|s| matches!(s.decision(), AccessDecision::Granted { .. }))
        .await
        .unwrap()
        .clone();
    assert!(snapshot.permissions().can_write);

    // downgrade while a write-guarded view is mounted
    let ui = Ui::default();
    let mut route = RouteGuard::new(Capability::WRITE).redirect_to("/books");
    assert_eq!(route.update(&snapshot, &ui, &ui), RouteView::Render);

    console.set_role(member.id, Role::ReadOnly).await.unwrap();
    member_access.refresh();
    let snapshot = rx
        .wait_for(|s| !s.permissions().can_write)
        .await
        .unwrap()
        .clone();
    assert_eq!(route.update(&snapshot, &ui, &ui), RouteView::Nothing);
    assert_eq!(route.update(&snapshot, &ui, &ui), RouteView::Nothing);
    assert_eq!(*ui.paths.lock().unwrap(), vec!["/books".to_string()]);
}
