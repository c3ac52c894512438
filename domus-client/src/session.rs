//! One signed-in dashboard session.
//!
//! The session owns every piece of client state: the cookie jar, the REST
//! client, the query cache, the hierarchy selection, navigation and the
//! notification queue. Dropping or tearing down the session discards all
//! of it; nothing is shared between sessions.

use crate::api_client::RestClient;
use crate::config::ClientConfig;
use crate::cookies::CookieJar;
use crate::error::ClientError;
use crate::filters::ListFilter;
use crate::mutations::Mutations;
use crate::nav::Navigator;
use crate::notifications::{Notification, NotificationAction, NotificationLevel, Notifications};
use crate::persistence::{self, PersistedSelection, PersistedState};
use crate::resources::{registry, DomusQueryClient, ResourceData, ResourceKind};
use domus_core::{Actions, EntityId, HierarchyLevel, QueryParams};
use domus_query::{Clock, FetchOptions, QueryError, SelectionController, SelectionError, SystemClock};
use futures_util::future::join_all;
use std::sync::Arc;
use tracing::{info, warn};

pub struct Session {
    config: ClientConfig,
    cookies: Arc<CookieJar>,
    rest: RestClient,
    query: DomusQueryClient,
    selection: SelectionController<RestClient>,
    navigator: Navigator,
    notifications: Notifications,
}

impl Session {
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: ClientConfig, clock: Arc<dyn Clock>) -> Result<Self, ClientError> {
        let cookies = Arc::new(match config.auth.cookies.as_deref() {
            Some(header) => CookieJar::parse(header),
            None => CookieJar::new(),
        });
        let rest = RestClient::new(&config, cookies.clone())?;
        let query = DomusQueryClient::with_clock(registry(&rest), config.cache_config(), clock);
        let selection = SelectionController::new(rest.clone());
        let navigator = Navigator::new(config.access.role, config.permissions())?;
        info!(
            base_url = %rest.base_url(),
            role = ?config.access.role,
            "session started"
        );
        Ok(Self {
            config,
            cookies,
            rest,
            query,
            selection,
            navigator,
            notifications: Notifications::new(),
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn cookies(&self) -> &Arc<CookieJar> {
        &self.cookies
    }

    pub fn rest(&self) -> &RestClient {
        &self.rest
    }

    pub fn query(&self) -> &DomusQueryClient {
        &self.query
    }

    pub fn selection(&self) -> &SelectionController<RestClient> {
        &self.selection
    }

    pub fn navigator(&self) -> &Navigator {
        &self.navigator
    }

    pub fn navigator_mut(&mut self) -> &mut Navigator {
        &mut self.navigator
    }

    pub fn notifications(&self) -> &Notifications {
        &self.notifications
    }

    pub fn notifications_mut(&mut self) -> &mut Notifications {
        &mut self.notifications
    }

    /// Request parameters for `kind` under the current selection.
    pub fn list_params(&self, kind: ResourceKind, filter: &ListFilter) -> QueryParams {
        filter.params(kind, &self.selection.scope_params())
    }

    /// One page of `kind`, served from cache while fresh.
    pub async fn list(
        &mut self,
        kind: ResourceKind,
        filter: &ListFilter,
    ) -> Result<ResourceData, ClientError> {
        let options = self.query.options().with_params(self.list_params(kind, filter));
        self.load_list(kind, options).await
    }

    /// Like [`Session::list`] but always goes to the network.
    pub async fn refresh(
        &mut self,
        kind: ResourceKind,
        filter: &ListFilter,
    ) -> Result<ResourceData, ClientError> {
        let options = self
            .query
            .options()
            .with_params(self.list_params(kind, filter))
            .forced();
        self.load_list(kind, options).await
    }

    async fn load_list(
        &mut self,
        kind: ResourceKind,
        options: FetchOptions,
    ) -> Result<ResourceData, ClientError> {
        self.navigator.ensure(kind.section(), Actions::READ)?;
        match self.query.fetch_once(kind, options).await {
            Ok(data) => Ok(data),
            Err(err) => {
                if let Some(fetch) = err.as_fetch_error() {
                    self.notifications
                        .push(Notification::list_failed(kind, fetch));
                }
                Err(err.into())
            }
        }
    }

    /// Warm the cache for every readable kind in `kinds` concurrently.
    /// Kinds the role may not read are skipped.
    pub async fn prefetch(
        &self,
        kinds: &[ResourceKind],
        filter: &ListFilter,
    ) -> Vec<(ResourceKind, Result<ResourceData, QueryError>)> {
        let readable: Vec<ResourceKind> = kinds
            .iter()
            .copied()
            .filter(|kind| self.navigator.can(kind.section(), Actions::READ))
            .collect();
        let loads = readable.iter().map(|kind| {
            let options = self
                .query
                .options()
                .with_params(self.list_params(*kind, filter));
            self.query.fetch_once(*kind, options)
        });
        let results = join_all(loads).await;
        for (kind, result) in readable.iter().zip(&results) {
            if let Err(err) = result {
                warn!(resource = %kind, error = %err, "prefetch failed");
            }
        }
        readable.into_iter().zip(results).collect()
    }

    /// Select `id` at `level` (or clear the level with `None`).
    pub async fn select(
        &mut self,
        level: HierarchyLevel,
        id: Option<EntityId>,
    ) -> Result<(), ClientError> {
        if id.is_some() {
            self.navigator
                .ensure(ResourceKind::for_level(level).section(), Actions::READ)?;
        }
        match self.selection.set_filter(level, id).await {
            Ok(()) => Ok(()),
            Err(err) => {
                self.notify_selection_failed(&err);
                Err(err.into())
            }
        }
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear_all_filters();
    }

    pub fn mutations(&self) -> Mutations {
        Mutations::new(self.rest.clone(), self.query.clone())
    }

    /// Delete entity `id` of `kind` if the role may, patching cached pages.
    pub async fn delete(&self, kind: ResourceKind, id: EntityId) -> Result<usize, ClientError> {
        self.navigator.ensure(kind.section(), Actions::DELETE)?;
        Ok(self.mutations().delete(kind, id).await?)
    }

    /// Reapply the persisted section and selection, if any was saved.
    ///
    /// Returns how many selection levels were restored. A forbidden section
    /// is ignored; a selection that no longer loads stops the replay.
    pub async fn restore(&mut self) -> Result<usize, ClientError> {
        let Some(state) = persistence::load(&self.config.persistence_path)? else {
            return Ok(0);
        };
        if let Err(err) = self.navigator.go(state.active_section) {
            warn!(error = %err, "persisted section not available");
        }
        match self.selection.restore(&state.selection_ids()).await {
            Ok(restored) => {
                info!(restored, "selection restored");
                Ok(restored)
            }
            Err(err) => {
                self.notify_selection_failed(&err);
                Err(err.into())
            }
        }
    }

    pub fn persisted_state(&self) -> PersistedState {
        PersistedState {
            active_section: self.navigator.active(),
            selections: self
                .selection
                .selected_ids()
                .into_iter()
                .map(|(level, id)| PersistedSelection { level, id })
                .collect(),
        }
    }

    pub fn persist(&self) -> Result<(), ClientError> {
        persistence::save(&self.config.persistence_path, &self.persisted_state())?;
        Ok(())
    }

    /// Sign-out: drop cached data, selections, notifications and cookies.
    pub fn teardown(&mut self) {
        self.query.reset();
        self.selection.clear_all_filters();
        self.notifications.clear();
        self.cookies.clear();
        info!("session torn down");
    }

    fn notify_selection_failed(&mut self, err: &SelectionError) {
        let notification = Notification::new(NotificationLevel::Error, err.to_string());
        let notification = match err {
            SelectionError::Load { level, id, .. } => {
                notification.with_action(NotificationAction::Reselect {
                    level: *level,
                    id: *id,
                })
            }
            SelectionError::Mismatch { .. } => notification,
        };
        self.notifications.push(notification);
    }
}
