//! One editing session over one project.
//!
//! The editor wires the pieces of the sync protocol together: completed
//! drag intents run through the reindexer, become optimistic patches paired
//! with fire-and-forget requests, and settle (or fail, visibly unchanged)
//! when the transport answers. Field edits coalesce through the debouncer
//! before dispatch. Creation is the one awaited shape: the server-assigned
//! id arrives with the settlement and seeds follow-on selection.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use tracing::debug;

use crate::action::{
    CreatedEntity, Debouncer, Dispatcher, Notification, SyncOutcome, SyncRequest, Transport,
    validate,
};
use crate::error::ErrorCode;
use crate::gesture::ReorderIntent;
use crate::model::{
    DatasetId, LayerId, PageEdit, PageId, PageLayerId, ProjectSnapshot, SnapshotPatch, ViewEdit,
    ViewId, ViewKind,
};
use crate::optimistic::{MutationToken, Optimistic};
use crate::order;

/// Coalescing keys for rapid-fire edits. One pending request per key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum DebounceKey {
    PageTitle(PageId),
    PageViewport(PageId),
    ViewName(ViewId),
}

/// Client state seeded from a create settlement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FollowUp {
    /// The created page becomes the active selection.
    SelectPage,
}

/// An interactive editing session over one project snapshot.
pub struct ProjectEditor<Tr> {
    state: Optimistic<ProjectSnapshot, SnapshotPatch>,
    dispatcher: Dispatcher<Tr>,
    debouncer: Debouncer<DebounceKey, SyncRequest>,
    active_page: Option<PageId>,
    follow_ups: HashMap<MutationToken, FollowUp>,
}

impl<Tr: Transport> ProjectEditor<Tr> {
    #[must_use]
    pub fn new(snapshot: ProjectSnapshot, transport: Tr, debounce_window: Duration) -> Self {
        let active_page = snapshot.pages.first().map(|p| p.id);
        Self {
            state: Optimistic::new(snapshot),
            dispatcher: Dispatcher::new(transport),
            debouncer: Debouncer::new(debounce_window),
            active_page,
            follow_ups: HashMap::new(),
        }
    }

    /// The visible snapshot: confirmed state plus pending patches.
    #[must_use]
    pub fn current(&self) -> ProjectSnapshot {
        self.state.current()
    }

    #[must_use]
    pub const fn active_page(&self) -> Option<PageId> {
        self.active_page
    }

    /// Make `id` the active page. Returns `false` for unknown pages. The
    /// caller re-fetches the snapshot afterwards so the new page's layer
    /// stack is loaded (which doubles as the rebase point for navigation).
    pub fn select_page(&mut self, id: PageId) -> bool {
        if self.state.current().page(id).is_none() {
            return false;
        }
        self.active_page = Some(id);
        true
    }

    /// True when the project is down to its final page.
    #[must_use]
    pub fn is_last_page(&self) -> bool {
        self.state.current().pages.len() <= 1
    }

    /// Mutations dispatched but not yet settled.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.dispatcher.in_flight_len()
    }

    /// True when nothing is pending anywhere: no coalescing edits, no
    /// in-flight mutations.
    #[must_use]
    pub fn quiescent(&self) -> bool {
        self.debouncer.is_empty() && self.dispatcher.in_flight_len() == 0
    }

    pub fn drain_notifications(&mut self) -> Vec<Notification> {
        self.dispatcher.drain_notifications()
    }

    /// Access the underlying transport (simulators advance it directly).
    pub fn transport_mut(&mut self) -> &mut Tr {
        self.dispatcher.transport_mut()
    }

    // -----------------------------------------------------------------------
    // Reorder (optimistic, fire-and-forget)
    // -----------------------------------------------------------------------

    /// Apply a completed page drag. Stale or no-op intents are dropped
    /// silently; the reindexer's guards make that decision.
    pub fn reorder_pages(&mut self, intent: ReorderIntent<PageId>) {
        let snapshot = self.state.current();
        let new_order = order::reindex(&snapshot.pages, intent.active_id, intent.over_id);
        let new_ids = order::ordered_ids(&new_order);
        if new_ids == order::ordered_ids(&snapshot.pages) {
            return;
        }
        let request = SyncRequest::ReorderPages {
            project_id: snapshot.project.id,
            ordered_ids: new_ids.clone(),
        };
        if validate::check(&request, &snapshot).is_err() {
            return;
        }
        let token = self.dispatcher.dispatch(request);
        self.state.apply(token, SnapshotPatch::ReplacePageOrder(new_ids));
    }

    /// Apply a completed view drag.
    pub fn reorder_views(&mut self, intent: ReorderIntent<ViewId>) {
        let snapshot = self.state.current();
        let new_order = order::reindex(&snapshot.views, intent.active_id, intent.over_id);
        let new_ids = order::ordered_ids(&new_order);
        if new_ids == order::ordered_ids(&snapshot.views) {
            return;
        }
        let request = SyncRequest::ReorderViews {
            project_id: snapshot.project.id,
            ordered_ids: new_ids.clone(),
        };
        if validate::check(&request, &snapshot).is_err() {
            return;
        }
        let token = self.dispatcher.dispatch(request);
        self.state.apply(token, SnapshotPatch::ReplaceViewOrder(new_ids));
    }

    /// Apply a completed layer drag on the active page.
    pub fn reorder_layers(&mut self, intent: ReorderIntent<PageLayerId>) {
        let Some(page_id) = self.active_page else {
            return;
        };
        let snapshot = self.state.current();
        let new_order = order::reindex(
            &snapshot.active_page_layers,
            intent.active_id,
            intent.over_id,
        );
        let new_ids = order::ordered_ids(&new_order);
        if new_ids == order::ordered_ids(&snapshot.active_page_layers) {
            return;
        }
        let request = SyncRequest::ReorderLayers {
            page_id,
            ordered_ids: new_ids.clone(),
        };
        if validate::check(&request, &snapshot).is_err() {
            return;
        }
        let token = self.dispatcher.dispatch(request);
        self.state
            .apply(token, SnapshotPatch::ReplaceLayerOrder(new_ids));
    }

    // -----------------------------------------------------------------------
    // Field edits (debounced)
    // -----------------------------------------------------------------------

    /// Queue a title edit; the request fires after the quiet window.
    pub fn rename_page(&mut self, id: PageId, title: String, now: Instant) {
        let request = SyncRequest::UpdatePage {
            id,
            edit: PageEdit {
                title: Some(title),
                ..PageEdit::default()
            },
        };
        self.debouncer.push(DebounceKey::PageTitle(id), request, now);
    }

    /// Queue a viewport save; repeated map movement coalesces to the final
    /// position.
    pub fn move_viewport(&mut self, id: PageId, lng: f64, lat: f64, zoom: f64, now: Instant) {
        let request = SyncRequest::UpdatePage {
            id,
            edit: PageEdit {
                center_lng: Some(lng),
                center_lat: Some(lat),
                zoom: Some(zoom),
                ..PageEdit::default()
            },
        };
        self.debouncer
            .push(DebounceKey::PageViewport(id), request, now);
    }

    /// Queue a view rename.
    pub fn rename_view(&mut self, id: ViewId, name: String, now: Instant) {
        let request = SyncRequest::UpdateView {
            id,
            edit: ViewEdit {
                name: Some(name),
                dataset_id: None,
            },
        };
        self.debouncer.push(DebounceKey::ViewName(id), request, now);
    }

    // -----------------------------------------------------------------------
    // Create (awaited via settlement)
    // -----------------------------------------------------------------------

    /// Create a page after the active one's viewport. Not optimistic: the
    /// page appears, and becomes active, when the settlement delivers its
    /// server-assigned id.
    ///
    /// # Errors
    ///
    /// Returns the validation error for form feedback.
    pub fn create_page(&mut self, title: String) -> Result<MutationToken, validate::ValidationError> {
        let snapshot = self.state.current();
        let viewport = self
            .active_page
            .and_then(|id| snapshot.page(id))
            .map_or((0.0, 0.0, 2.0), |p| (p.center_lng, p.center_lat, p.zoom));
        let request = SyncRequest::CreatePage {
            project_id: snapshot.project.id,
            title,
            center_lng: viewport.0,
            center_lat: viewport.1,
            zoom: viewport.2,
        };
        validate::check(&request, &snapshot)?;
        let token = self.dispatcher.dispatch(request);
        self.follow_ups.insert(token, FollowUp::SelectPage);
        Ok(token)
    }

    /// Create a view at the end of the view collection.
    ///
    /// # Errors
    ///
    /// Returns the validation error for form feedback.
    pub fn create_view(
        &mut self,
        name: String,
        kind: ViewKind,
        dataset_id: Option<DatasetId>,
    ) -> Result<MutationToken, validate::ValidationError> {
        let snapshot = self.state.current();
        let request = SyncRequest::CreateView {
            project_id: snapshot.project.id,
            name,
            kind,
            dataset_id,
        };
        validate::check(&request, &snapshot)?;
        Ok(self.dispatcher.dispatch(request))
    }

    /// Attach a workspace layer to the active page's stack.
    pub fn attach_layer(&mut self, layer_id: LayerId) -> Option<MutationToken> {
        let page_id = self.active_page?;
        let request = SyncRequest::AttachLayer { page_id, layer_id };
        Some(self.dispatcher.dispatch(request))
    }

    // -----------------------------------------------------------------------
    // Delete (optimistic, with sibling re-selection)
    // -----------------------------------------------------------------------

    /// Delete a page optimistically. When the deleted page was active, the
    /// next sibling becomes active, or the previous one at the end of the
    /// list. Deleting the final page is refused client-side; the store
    /// enforces the same rule.
    pub fn delete_page(&mut self, id: PageId) -> bool {
        let snapshot = self.state.current();
        if snapshot.page(id).is_none() {
            return false;
        }
        if self.is_last_page() {
            self.dispatcher.notify(Notification::warning(
                ErrorCode::LastPage.message(),
                Some(ErrorCode::LastPage),
            ));
            return false;
        }

        if self.active_page == Some(id) {
            let index = snapshot.pages.iter().position(|p| p.id == id);
            self.active_page = index.and_then(|i| {
                snapshot
                    .pages
                    .get(i + 1)
                    .or_else(|| i.checked_sub(1).and_then(|prev| snapshot.pages.get(prev)))
                    .map(|p| p.id)
            });
        }

        let request = SyncRequest::DeletePage {
            id,
            project_id: snapshot.project.id,
        };
        let token = self.dispatcher.dispatch(request);
        self.state.apply(token, SnapshotPatch::RemovePage(id));
        true
    }

    /// Delete a view optimistically.
    pub fn delete_view(&mut self, id: ViewId) -> bool {
        let snapshot = self.state.current();
        if snapshot.view(id).is_none() {
            return false;
        }
        let request = SyncRequest::DeleteView {
            id,
            project_id: snapshot.project.id,
        };
        let token = self.dispatcher.dispatch(request);
        self.state.apply(token, SnapshotPatch::RemoveView(id));
        true
    }

    /// Remove a layer from the active page's stack optimistically.
    pub fn detach_layer(&mut self, id: PageLayerId) -> bool {
        let Some(page_id) = self.active_page else {
            return false;
        };
        let snapshot = self.state.current();
        if !snapshot.active_page_layers.iter().any(|l| l.id == id) {
            return false;
        }
        let request = SyncRequest::DetachLayer { id, page_id };
        let token = self.dispatcher.dispatch(request);
        self.state.apply(token, SnapshotPatch::DetachLayer(id));
        true
    }

    // -----------------------------------------------------------------------
    // Pump
    // -----------------------------------------------------------------------

    /// Advance the session: fire debounced edits whose window elapsed, then
    /// settle whatever the transport delivered.
    pub fn tick(&mut self, now: Instant) {
        self.fire_ready_edits(now);
        self.settle_arrivals();
    }

    /// Dispatch every coalescing edit immediately (session shutdown).
    pub fn flush_edits(&mut self) {
        let edits = self.debouncer.flush();
        self.dispatch_edits(edits);
    }

    /// Replace the session's base with a fresh snapshot, discarding every
    /// pending patch. Runs on page navigation and explicit refresh.
    pub fn refresh(&mut self, snapshot: ProjectSnapshot) {
        let active_still_exists = self
            .active_page
            .is_some_and(|id| snapshot.pages.iter().any(|p| p.id == id));
        if !active_still_exists {
            self.active_page = snapshot.pages.first().map(|p| p.id);
        }
        self.state.rebase(snapshot);
    }

    fn fire_ready_edits(&mut self, now: Instant) {
        let edits = self.debouncer.ready(now);
        self.dispatch_edits(edits);
    }

    fn dispatch_edits(&mut self, edits: Vec<(DebounceKey, SyncRequest)>) {
        for (_, request) in edits {
            let snapshot = self.state.current();
            if validate::check(&request, &snapshot).is_err() {
                // the target vanished while the edit was coalescing
                continue;
            }
            let patch = match &request {
                SyncRequest::UpdatePage { id, edit } => Some(SnapshotPatch::MergePage {
                    id: *id,
                    edit: edit.clone(),
                }),
                SyncRequest::UpdateView { id, edit } => Some(SnapshotPatch::MergeView {
                    id: *id,
                    edit: edit.clone(),
                }),
                _ => None,
            };
            let token = self.dispatcher.dispatch(request);
            if let Some(patch) = patch {
                self.state.apply(token, patch);
            }
        }
    }

    fn settle_arrivals(&mut self) {
        for settlement in self.dispatcher.poll() {
            match settlement.outcome {
                SyncOutcome::Success(created) => {
                    self.state.settle_success(settlement.token);
                    if let Some(entity) = created {
                        self.absorb_created(settlement.token, entity);
                    }
                }
                SyncOutcome::Failure { .. } => {
                    // no rollback: the dispatcher queued the warning, the
                    // patch stays visible until the next refresh
                    let _ = self.state.settle_failure(settlement.token);
                }
            }
        }
    }

    fn absorb_created(&mut self, token: MutationToken, entity: CreatedEntity) {
        match entity {
            CreatedEntity::Page(page) => {
                let page_id = page.id;
                self.state.amend_confirmed(|snapshot| {
                    if snapshot.pages.iter().all(|p| p.id != page_id) {
                        snapshot.pages.push(page);
                    }
                });
                if self.follow_ups.remove(&token) == Some(FollowUp::SelectPage) {
                    debug!(page = %page_id, "created page becomes active");
                    self.active_page = Some(page_id);
                }
            }
            CreatedEntity::View(view) => {
                self.state.amend_confirmed(|snapshot| {
                    if snapshot.views.iter().all(|v| v.id != view.id) {
                        snapshot.views.push(view);
                    }
                });
            }
            CreatedEntity::PageLayer(link) => {
                let on_active = self.active_page == Some(link.page_id);
                self.state.amend_confirmed(|snapshot| {
                    if on_active && snapshot.active_page_layers.iter().all(|l| l.id != link.id) {
                        snapshot.active_page_layers.push(link);
                    }
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::ProjectEditor;
    use crate::action::{
        CreatedEntity, Severity, SyncEnvelope, SyncOutcome, SyncRequest, SyncSettlement,
        Transport,
    };
    use crate::error::ErrorCode;
    use crate::gesture::ReorderIntent;
    use crate::model::{
        Page, PageId, Project, ProjectId, ProjectSnapshot, WorkspaceId,
    };
    use crate::optimistic::MutationToken;
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::time::{Duration, Instant};

    /// Transport whose submissions and deliveries are driven by the test.
    #[derive(Default)]
    struct Shared {
        submitted: Vec<SyncEnvelope>,
        deliveries: Vec<SyncSettlement>,
    }

    #[derive(Clone, Default)]
    struct ManualTransport(Rc<RefCell<Shared>>);

    impl ManualTransport {
        fn submitted(&self) -> Vec<SyncEnvelope> {
            self.0.borrow().submitted.clone()
        }

        fn deliver(&self, token: MutationToken, outcome: SyncOutcome) {
            self.0
                .borrow_mut()
                .deliveries
                .push(SyncSettlement { token, outcome });
        }

        fn last_token(&self) -> MutationToken {
            self.0
                .borrow()
                .submitted
                .last()
                .expect("a request was submitted")
                .token
        }
    }

    impl Transport for ManualTransport {
        fn submit(&mut self, envelope: SyncEnvelope) {
            self.0.borrow_mut().submitted.push(envelope);
        }

        fn poll(&mut self) -> Vec<SyncSettlement> {
            self.0.borrow_mut().deliveries.drain(..).collect()
        }
    }

    fn page(id: i64, position: i64) -> Page {
        Page {
            id: PageId(id),
            project_id: ProjectId(1),
            position,
            title: format!("P{id}"),
            center_lng: 0.0,
            center_lat: 0.0,
            zoom: 9.0,
            content: None,
            created_at_us: 0,
            updated_at_us: 0,
        }
    }

    fn snapshot(page_ids: &[i64]) -> ProjectSnapshot {
        ProjectSnapshot {
            project: Project {
                id: ProjectId(1),
                workspace_id: WorkspaceId(1),
                name: "Demo".to_string(),
                created_at_us: 0,
                updated_at_us: 0,
            },
            pages: page_ids
                .iter()
                .enumerate()
                .map(|(idx, id)| page(*id, idx as i64))
                .collect(),
            views: Vec::new(),
            active_page_layers: Vec::new(),
            layers: Vec::new(),
        }
    }

    fn editor(page_ids: &[i64]) -> (ProjectEditor<ManualTransport>, ManualTransport) {
        let transport = ManualTransport::default();
        let editor = ProjectEditor::new(
            snapshot(page_ids),
            transport.clone(),
            Duration::from_millis(500),
        );
        (editor, transport)
    }

    fn page_order(editor: &ProjectEditor<ManualTransport>) -> Vec<i64> {
        editor.current().pages.iter().map(|p| p.id.as_i64()).collect()
    }

    #[test]
    fn reorder_updates_immediately_and_dispatches_full_ordering() {
        let (mut editor, transport) = editor(&[1, 2, 3]);

        // drag P3 onto P1
        editor.reorder_pages(ReorderIntent {
            active_id: PageId(3),
            over_id: PageId(1),
        });

        // (a) immediate UI order
        assert_eq!(page_order(&editor), vec![3, 1, 2]);

        // (b) dispatched payload carries parent + complete child ordering
        let submitted = transport.submitted();
        assert_eq!(submitted.len(), 1);
        assert_eq!(
            submitted[0].request,
            SyncRequest::ReorderPages {
                project_id: ProjectId(1),
                ordered_ids: vec![PageId(3), PageId(1), PageId(2)],
            }
        );
    }

    #[test]
    fn stale_reorder_intent_is_dropped_silently() {
        let (mut editor, transport) = editor(&[1, 2, 3]);
        editor.reorder_pages(ReorderIntent {
            active_id: PageId(9),
            over_id: PageId(1),
        });
        assert_eq!(page_order(&editor), vec![1, 2, 3]);
        assert!(transport.submitted().is_empty());
        assert!(editor.drain_notifications().is_empty());
    }

    #[test]
    fn failed_reorder_keeps_optimistic_order_and_warns() {
        let (mut editor, transport) = editor(&[1, 2, 3]);
        editor.reorder_pages(ReorderIntent {
            active_id: PageId(3),
            over_id: PageId(1),
        });

        transport.deliver(
            transport.last_token(),
            SyncOutcome::Failure {
                code: ErrorCode::StoreWriteFailed,
                message: "disk full".to_string(),
            },
        );
        editor.tick(Instant::now());

        // no rollback: the reordered sequence stays visible
        assert_eq!(page_order(&editor), vec![3, 1, 2]);
        let notes = editor.drain_notifications();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].severity, Severity::Warning);
    }

    #[test]
    fn successful_reorder_settles_without_visible_change() {
        let (mut editor, transport) = editor(&[1, 2, 3]);
        editor.reorder_pages(ReorderIntent {
            active_id: PageId(3),
            over_id: PageId(1),
        });

        transport.deliver(transport.last_token(), SyncOutcome::Success(None));
        editor.tick(Instant::now());

        assert_eq!(page_order(&editor), vec![3, 1, 2]);
        assert!(editor.quiescent());
        assert!(editor.drain_notifications().is_empty());
    }

    #[test]
    fn deleting_active_page_selects_next_then_previous_sibling() {
        let (mut editor, _transport) = editor(&[1, 2, 3]);
        assert!(editor.select_page(PageId(2)));

        // next sibling wins
        assert!(editor.delete_page(PageId(2)));
        assert_eq!(editor.active_page(), Some(PageId(3)));

        // at the tail, the previous sibling wins
        assert!(editor.delete_page(PageId(3)));
        assert_eq!(editor.active_page(), Some(PageId(1)));
    }

    #[test]
    fn deleting_the_last_page_is_refused_client_side() {
        let (mut editor, transport) = editor(&[1]);
        assert!(!editor.delete_page(PageId(1)));
        assert_eq!(page_order(&editor), vec![1]);
        assert!(transport.submitted().is_empty());

        let notes = editor.drain_notifications();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].code, Some(ErrorCode::LastPage));
    }

    #[test]
    fn created_page_arrives_with_settlement_and_becomes_active() {
        let (mut editor, transport) = editor(&[1]);
        let token = editor.create_page("New stop".to_string()).expect("valid");

        // not optimistic: nothing visible until the settlement lands
        assert_eq!(page_order(&editor), vec![1]);

        let mut created = page(7, 1);
        created.title = "New stop".to_string();
        transport.deliver(token, SyncOutcome::Success(Some(CreatedEntity::Page(created))));
        editor.tick(Instant::now());

        assert_eq!(page_order(&editor), vec![1, 7]);
        assert_eq!(editor.active_page(), Some(PageId(7)));
    }

    #[test]
    fn renames_coalesce_to_the_final_value() {
        let (mut editor, transport) = editor(&[1, 2]);
        let t0 = Instant::now();
        editor.rename_page(PageId(1), "A".to_string(), t0);
        editor.rename_page(PageId(1), "AB".to_string(), t0 + Duration::from_millis(200));

        // window not yet elapsed for the superseding edit
        editor.tick(t0 + Duration::from_millis(500));
        assert!(transport.submitted().is_empty());

        editor.tick(t0 + Duration::from_millis(800));
        let submitted = transport.submitted();
        assert_eq!(submitted.len(), 1);
        match &submitted[0].request {
            SyncRequest::UpdatePage { id, edit } => {
                assert_eq!(*id, PageId(1));
                assert_eq!(edit.title.as_deref(), Some("AB"));
            }
            other => panic!("unexpected request {other:?}"),
        }
        assert_eq!(editor.current().pages[0].title, "AB");
    }

    #[test]
    fn refresh_discards_pending_patches_and_fixes_selection() {
        let (mut editor, _transport) = editor(&[1, 2, 3]);
        editor.reorder_pages(ReorderIntent {
            active_id: PageId(3),
            over_id: PageId(1),
        });
        assert_eq!(page_order(&editor), vec![3, 1, 2]);

        // a fresh fetch that never saw the reorder wins wholesale
        editor.refresh(snapshot(&[1, 2]));
        assert_eq!(page_order(&editor), vec![1, 2]);

        // the active page vanished server-side; selection falls back
        assert!(editor.select_page(PageId(1)));
        editor.refresh(snapshot(&[2]));
        assert_eq!(editor.active_page(), Some(PageId(2)));
    }
}
