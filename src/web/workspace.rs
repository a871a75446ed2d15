use std::{collections::HashMap, sync::Arc};

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use cookie::time::Duration as CookieDuration;
use tokio::sync::RwLock;
use tracing::info;
use uuid::Uuid;

use crate::{
    academics::{CourseStore, ScheduleGrid},
    advisor::AdvisorSession,
};

pub const WORKSPACE_COOKIE: &str = "glassygrad_workspace";

/// Everything one student edits during a visit: courses, schedule and advisor chat.
pub struct Workspace {
    id: Uuid,
    pub courses: RwLock<CourseStore>,
    pub schedule: RwLock<ScheduleGrid>,
    pub advisor: RwLock<AdvisorSession>,
    last_seen: RwLock<DateTime<Utc>>,
}

impl Workspace {
    fn new(welcome_message: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            courses: RwLock::new(CourseStore::with_starter_courses()),
            schedule: RwLock::new(ScheduleGrid::new()),
            advisor: RwLock::new(AdvisorSession::new(welcome_message)),
            last_seen: RwLock::new(Utc::now()),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    async fn touch(&self) {
        *self.last_seen.write().await = Utc::now();
    }

    async fn idle_since(&self, cutoff: DateTime<Utc>) -> bool {
        *self.last_seen.read().await < cutoff
    }
}

/// In-memory workspaces keyed by the id stored in the workspace cookie.
#[derive(Clone)]
pub struct WorkspaceRegistry {
    workspaces: Arc<RwLock<HashMap<Uuid, Arc<Workspace>>>>,
    welcome_message: Arc<str>,
    idle_ttl: ChronoDuration,
}

impl WorkspaceRegistry {
    pub fn new(welcome_message: &str, idle_ttl: ChronoDuration) -> Self {
        Self {
            workspaces: Arc::new(RwLock::new(HashMap::new())),
            welcome_message: Arc::from(welcome_message),
            idle_ttl,
        }
    }

    /// Returns the caller's workspace, creating one when the cookie is missing,
    /// malformed or points at a swept workspace. The cookie is re-issued on every
    /// call so its max age slides along with the idle timeout.
    pub async fn resolve(&self, jar: CookieJar) -> (CookieJar, Arc<Workspace>) {
        if let Some(existing) = self.lookup(&jar).await {
            let cookie = self.workspace_cookie(existing.id);
            return (jar.add(cookie), existing);
        }

        let workspace = Arc::new(Workspace::new(&self.welcome_message));
        self.workspaces
            .write()
            .await
            .insert(workspace.id, Arc::clone(&workspace));
        info!(workspace_id = %workspace.id, "workspace created");

        let cookie = self.workspace_cookie(workspace.id);
        (jar.add(cookie), workspace)
    }

    fn workspace_cookie(&self, id: Uuid) -> Cookie<'static> {
        let mut cookie = Cookie::new(WORKSPACE_COOKIE, id.to_string());
        cookie.set_path("/");
        cookie.set_http_only(true);
        cookie.set_same_site(SameSite::Lax);
        cookie.set_max_age(CookieDuration::seconds(self.idle_ttl.num_seconds()));
        cookie
    }

    /// Touches the workspace while the map is read-locked, so a sweep holding
    /// the write lock never removes a workspace between lookup and touch.
    async fn lookup(&self, jar: &CookieJar) -> Option<Arc<Workspace>> {
        let cookie = jar.get(WORKSPACE_COOKIE)?;
        let id = Uuid::parse_str(cookie.value()).ok()?;
        let guard = self.workspaces.read().await;
        let workspace = guard.get(&id).cloned()?;
        workspace.touch().await;
        Some(workspace)
    }

    /// Drops workspaces untouched for longer than the idle TTL. Returns how many were removed.
    pub async fn sweep_idle(&self) -> usize {
        let Some(cutoff) = Utc::now().checked_sub_signed(self.idle_ttl) else {
            return 0;
        };

        let mut guard = self.workspaces.write().await;
        let mut stale = Vec::new();
        for workspace in guard.values() {
            if workspace.idle_since(cutoff).await {
                stale.push(workspace.id);
            }
        }
        for id in &stale {
            guard.remove(id);
        }
        stale.len()
    }

    pub async fn active_count(&self) -> usize {
        self.workspaces.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> WorkspaceRegistry {
        WorkspaceRegistry::new("Welcome!", ChronoDuration::hours(1))
    }

    #[tokio::test]
    async fn missing_cookie_creates_workspace_and_sets_cookie() {
        let registry = registry();
        let (jar, workspace) = registry.resolve(CookieJar::new()).await;

        let cookie = jar.get(WORKSPACE_COOKIE).expect("cookie set");
        assert_eq!(cookie.value(), workspace.id().to_string());
        assert_eq!(registry.active_count().await, 1);

        let courses = workspace.courses.read().await;
        assert_eq!(courses.courses().len(), 2);
        let advisor = workspace.advisor.read().await;
        assert_eq!(advisor.turns()[0].text, "Welcome!");
    }

    #[tokio::test]
    async fn known_cookie_returns_same_workspace() {
        let registry = registry();
        let (jar, first) = registry.resolve(CookieJar::new()).await;
        let (_, second) = registry.resolve(jar).await;
        assert_eq!(first.id(), second.id());
        assert_eq!(registry.active_count().await, 1);
    }

    #[tokio::test]
    async fn known_cookie_is_reissued_with_fresh_max_age() {
        let registry = registry();
        let (_, workspace) = registry.resolve(CookieJar::new()).await;

        // A browser sends back only the name and value.
        let incoming =
            CookieJar::new().add(Cookie::new(WORKSPACE_COOKIE, workspace.id().to_string()));
        let (jar, resolved) = registry.resolve(incoming).await;
        assert_eq!(resolved.id(), workspace.id());

        let cookie = jar.get(WORKSPACE_COOKIE).expect("cookie re-issued");
        assert_eq!(cookie.value(), workspace.id().to_string());
        assert_eq!(cookie.max_age(), Some(CookieDuration::hours(1)));
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.path(), Some("/"));
    }

    #[tokio::test]
    async fn resolving_refreshes_idle_clock_before_sweep() {
        let registry = registry();
        let (jar, workspace) = registry.resolve(CookieJar::new()).await;
        *workspace.last_seen.write().await = Utc::now() - ChronoDuration::hours(2);

        registry.resolve(jar).await;
        assert_eq!(registry.sweep_idle().await, 0);
        assert_eq!(registry.active_count().await, 1);
    }

    #[tokio::test]
    async fn unknown_cookie_gets_a_fresh_workspace() {
        let registry = registry();
        let jar = CookieJar::new().add(Cookie::new(WORKSPACE_COOKIE, Uuid::new_v4().to_string()));
        let (_, workspace) = registry.resolve(jar).await;
        assert_eq!(registry.active_count().await, 1);

        let jar = CookieJar::new().add(Cookie::new(WORKSPACE_COOKIE, "not-a-uuid"));
        let (_, other) = registry.resolve(jar).await;
        assert_ne!(workspace.id(), other.id());
        assert_eq!(registry.active_count().await, 2);
    }

    #[tokio::test]
    async fn sweep_removes_only_idle_workspaces() {
        let registry = registry();
        let (_, idle) = registry.resolve(CookieJar::new()).await;
        let (_, active) = registry.resolve(CookieJar::new()).await;

        *idle.last_seen.write().await = Utc::now() - ChronoDuration::hours(2);

        assert_eq!(registry.sweep_idle().await, 1);
        assert_eq!(registry.active_count().await, 1);

        let jar = CookieJar::new().add(Cookie::new(WORKSPACE_COOKIE, active.id().to_string()));
        let (_, resolved) = registry.resolve(jar).await;
        assert_eq!(resolved.id(), active.id());
        assert_eq!(registry.sweep_idle().await, 0);
    }
}
