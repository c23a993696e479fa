use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use futures::future::try_join_all;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::registry::WizardStepRegistry;
use super::step::WizardStep;
use crate::error::Result;

/// Live state of one wizard run, published to the render layer
pub struct WizardState<C: Send + Sync> {
    pub current_step: Option<Arc<dyn WizardStep<C>>>,
    /// Ids known to be finished. Only ever grows within a run.
    pub completed_steps: Vec<String>,
    pub available_steps: Vec<Arc<dyn WizardStep<C>>>,
    pub all_steps: Vec<Arc<dyn WizardStep<C>>>,
    pub is_loading: bool,
    pub error: Option<String>,
    pub is_completed: bool,
}

impl<C: Send + Sync> Default for WizardState<C> {
    fn default() -> Self {
        Self {
            current_step: None,
            completed_steps: Vec::new(),
            available_steps: Vec::new(),
            all_steps: Vec::new(),
            is_loading: false,
            error: None,
            is_completed: false,
        }
    }
}

impl<C: Send + Sync> Clone for WizardState<C> {
    fn clone(&self) -> Self {
        Self {
            current_step: self.current_step.clone(),
            completed_steps: self.completed_steps.clone(),
            available_steps: self.available_steps.clone(),
            all_steps: self.all_steps.clone(),
            is_loading: self.is_loading,
            error: self.error.clone(),
            is_completed: self.is_completed,
        }
    }
}

impl<C: Send + Sync> WizardState<C> {
    pub fn current_step_id(&self) -> Option<&str> {
        self.current_step.as_ref().map(|step| step.id())
    }

    /// Index of the current step within `all_steps`
    pub fn current_index(&self) -> Option<usize> {
        let id = self.current_step_id()?;
        self.all_steps.iter().position(|step| step.id() == id)
    }

    pub fn is_step_completed(&self, id: &str) -> bool {
        self.completed_steps.iter().any(|done| done == id)
    }

    /// Merge `ids` in, keeping registration order. Ids outside `all_steps` go last.
    fn mark_completed<I>(&mut self, ids: I)
    where
        I: IntoIterator<Item = String>,
    {
        for id in ids {
            if !self.is_step_completed(&id) {
                self.completed_steps.push(id);
            }
        }
        let all_steps = &self.all_steps;
        self.completed_steps.sort_by_key(|id| {
            all_steps
                .iter()
                .position(|step| step.id() == id)
                .unwrap_or(usize::MAX)
        });
    }
}

/// Result of one reconciliation pass against the steps' own predicates
enum Reconciled<C: Send + Sync> {
    InProgress {
        reported: Vec<String>,
        available: Vec<Arc<dyn WizardStep<C>>>,
        next: Option<Arc<dyn WizardStep<C>>>,
    },
    Finished {
        all_ids: Vec<String>,
        last: Option<Arc<dyn WizardStep<C>>>,
    },
}

struct Inner<C: Send + Sync> {
    registry: Arc<WizardStepRegistry<C>>,
    context: Arc<C>,
    state: watch::Sender<WizardState<C>>,
    in_flight: AtomicUsize,
    issued: AtomicU64,
    committed: AtomicU64,
}

/// Drives a registry through a wizard run against one context.
///
/// Cheap to clone; clones share the same run. State changes are broadcast
/// through [`WizardProvider::subscribe`].
pub struct WizardProvider<C: Send + Sync + 'static> {
    inner: Arc<Inner<C>>,
}

impl<C: Send + Sync + 'static> Clone for WizardProvider<C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<C: Send + Sync + 'static> WizardProvider<C> {
    pub fn new(registry: Arc<WizardStepRegistry<C>>, context: Arc<C>) -> Self {
        let (state, _) = watch::channel(WizardState::default());
        Self {
            inner: Arc::new(Inner {
                registry,
                context,
                state,
                in_flight: AtomicUsize::new(0),
                issued: AtomicU64::new(0),
                committed: AtomicU64::new(0),
            }),
        }
    }

    pub fn registry(&self) -> &Arc<WizardStepRegistry<C>> {
        &self.inner.registry
    }

    pub fn context(&self) -> &Arc<C> {
        &self.inner.context
    }

    pub fn subscribe(&self) -> watch::Receiver<WizardState<C>> {
        self.inner.state.subscribe()
    }

    /// Snapshot of the current state
    pub fn state(&self) -> WizardState<C> {
        self.inner.state.borrow().clone()
    }

    pub fn current_step(&self) -> Option<Arc<dyn WizardStep<C>>> {
        self.inner.state.borrow().current_step.clone()
    }

    pub fn completed_steps(&self) -> Vec<String> {
        self.inner.state.borrow().completed_steps.clone()
    }

    pub fn available_steps(&self) -> Vec<Arc<dyn WizardStep<C>>> {
        self.inner.state.borrow().available_steps.clone()
    }

    pub fn all_steps(&self) -> Vec<Arc<dyn WizardStep<C>>> {
        self.inner.state.borrow().all_steps.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.inner.state.borrow().is_loading
    }

    pub fn error(&self) -> Option<String> {
        self.inner.state.borrow().error.clone()
    }

    pub fn is_completed(&self) -> bool {
        self.inner.state.borrow().is_completed
    }

    /// First reconciliation after the wizard is mounted
    pub async fn initialize(&self) {
        info!(
            "Initializing wizard with {} steps",
            self.inner.registry.step_count()
        );
        self.begin_loading();
        self.refresh_status().await;
        self.end_loading();
    }

    /// Reconcile local state with the steps' own completion predicates.
    ///
    /// Never fails: any step error is stored as the state's `error` and the
    /// last good state is kept. Overlapping calls are allowed; a pass that
    /// finishes after a newer pass has already been applied only contributes
    /// its completed ids.
    pub async fn refresh_status(&self) {
        let generation = self.inner.issued.fetch_add(1, Ordering::SeqCst) + 1;
        let steps = self.inner.registry.all_steps();

        self.inner.state.send_modify(|state| {
            state.all_steps = steps.clone();
        });

        match self.reconcile(&steps).await {
            Ok(outcome) => self.commit(generation, outcome),
            Err(e) => {
                warn!("Wizard status check failed: {}", e);
                self.fail(generation, format!("Failed to check wizard status: {e}"));
            }
        }
    }

    async fn reconcile(&self, steps: &[Arc<dyn WizardStep<C>>]) -> Result<Reconciled<C>> {
        let registry = &self.inner.registry;
        let ctx = self.inner.context.as_ref();

        if registry.is_wizard_completed(ctx).await? {
            return Ok(Reconciled::Finished {
                all_ids: steps.iter().map(|step| step.id().to_string()).collect(),
                last: steps.last().cloned(),
            });
        }

        let checks = steps.iter().map(|step| async move {
            let done = step.is_completed(ctx).await?;
            Ok::<_, crate::error::OnboardError>((step.id().to_string(), done))
        });
        let reported: Vec<String> = try_join_all(checks)
            .await?
            .into_iter()
            .filter_map(|(id, done)| done.then_some(id))
            .collect();

        let mut merged = self.completed_steps();
        for id in &reported {
            if !merged.contains(id) {
                merged.push(id.clone());
            }
        }

        let available = registry.available_steps(&merged, ctx).await?;
        let next = available.first().cloned();

        Ok(Reconciled::InProgress {
            reported,
            available,
            next,
        })
    }

    fn commit(&self, generation: u64, outcome: Reconciled<C>) {
        let committed = &self.inner.committed;

        self.inner.state.send_modify(|state| {
            let stale = generation < committed.load(Ordering::SeqCst);

            match outcome {
                Reconciled::InProgress {
                    reported,
                    available,
                    next,
                } => {
                    state.mark_completed(reported);
                    if stale {
                        debug!("Discarding stale wizard pass {}", generation);
                        return;
                    }
                    state.is_completed = false;
                    state.available_steps = available;
                    state.current_step = next;
                }
                Reconciled::Finished { all_ids, last } => {
                    state.mark_completed(all_ids);
                    if stale {
                        debug!("Discarding stale wizard pass {}", generation);
                        return;
                    }
                    info!("Wizard completed");
                    state.is_completed = true;
                    state.available_steps.clear();
                    state.current_step = last;
                }
            }

            committed.fetch_max(generation, Ordering::SeqCst);
            state.error = None;
        });
    }

    fn fail(&self, generation: u64, message: String) {
        let committed = &self.inner.committed;
        self.inner.state.send_if_modified(|state| {
            if generation < committed.load(Ordering::SeqCst) {
                debug!("Dropping error from stale wizard pass {}", generation);
                return false;
            }
            // A failed pass still supersedes every older one
            committed.fetch_max(generation, Ordering::SeqCst);
            state.error = Some(message);
            true
        });
    }

    /// Page forward in registration order, ignoring dependency gating.
    /// No-op while the current step is unknown.
    pub fn next_step(&self) {
        self.inner.state.send_if_modified(|state| {
            let Some(idx) = state.current_index() else {
                return false;
            };
            match state.all_steps.get(idx + 1).cloned() {
                Some(step) => {
                    state.current_step = Some(step);
                    true
                }
                None => false,
            }
        });
    }

    pub fn previous_step(&self) {
        self.inner.state.send_if_modified(|state| {
            match state.current_index() {
                Some(idx) if idx > 0 => {
                    state.current_step = state.all_steps.get(idx - 1).cloned();
                    true
                }
                _ => false,
            }
        });
    }

    /// Jump to `id`. Unknown ids are ignored; returns whether the step exists.
    pub fn go_to_step(&self, id: &str) -> bool {
        let Some(step) = self.inner.registry.get_step(id) else {
            debug!("Ignoring jump to unknown step '{}'", id);
            return false;
        };
        self.inner.state.send_modify(|state| {
            state.current_step = Some(step);
        });
        true
    }

    /// Mark the current step done right away, then reconcile
    pub async fn complete_current_step(&self) {
        let Some(step) = self.current_step() else {
            return;
        };

        info!("Completing step '{}'", step.id());
        self.begin_loading();
        self.inner.state.send_modify(|state| {
            state.mark_completed([step.id().to_string()]);
        });

        self.refresh_status().await;
        self.end_loading();
    }

    pub fn clear_error(&self) {
        self.inner
            .state
            .send_if_modified(|state| state.error.take().is_some());
    }

    fn begin_loading(&self) {
        self.inner.in_flight.fetch_add(1, Ordering::SeqCst);
        self.inner.state.send_if_modified(|state| {
            let changed = !state.is_loading;
            state.is_loading = true;
            changed
        });
    }

    fn end_loading(&self) {
        let remaining = self.inner.in_flight.fetch_sub(1, Ordering::SeqCst) - 1;
        if remaining == 0 {
            self.inner.state.send_modify(|state| {
                state.is_loading = false;
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::OnboardError;
    use crate::wizard::testing::{CompletionSwitch, MockStep};
    use async_trait::async_trait;
    use std::sync::atomic::AtomicBool;
    use tokio::sync::Notify;

    struct Chain {
        provider: WizardProvider<()>,
        a: CompletionSwitch,
        b: CompletionSwitch,
        c: CompletionSwitch,
    }

    fn chain() -> Chain {
        let a = MockStep::new("A");
        let b = MockStep::new("B").depends_on(&["A"]);
        let c = MockStep::new("C").depends_on(&["B"]);
        let switches = (a.switch(), b.switch(), c.switch());

        let mut registry = WizardStepRegistry::new();
        registry.register(a.into_arc(), None);
        registry.register(b.into_arc(), None);
        registry.register(c.into_arc(), None);

        Chain {
            provider: WizardProvider::new(Arc::new(registry), Arc::new(())),
            a: switches.0,
            b: switches.1,
            c: switches.2,
        }
    }

    #[tokio::test]
    async fn test_initialize_selects_first_available_step() {
        let Chain { provider, .. } = chain();
        provider.initialize().await;

        let state = provider.state();
        assert_eq!(state.current_step_id(), Some("A"));
        assert!(state.completed_steps.is_empty());
        assert_eq!(state.available_steps.len(), 1);
        assert_eq!(state.all_steps.len(), 3);
        assert!(!state.is_loading);
        assert!(!state.is_completed);
        assert!(state.error.is_none());
    }

    #[tokio::test]
    async fn test_refresh_picks_up_external_completion() {
        let chain = chain();
        chain.provider.initialize().await;

        chain.a.set(true);
        chain.provider.refresh_status().await;

        assert_eq!(chain.provider.completed_steps(), vec!["A"]);
        assert_eq!(
            chain.provider.current_step().map(|s| s.id().to_string()),
            Some("B".to_string())
        );
    }

    #[tokio::test]
    async fn test_optimistic_completion_survives_false_negative() {
        let Chain { provider, .. } = chain();
        provider.initialize().await;

        // A's own predicate still says false
        provider.complete_current_step().await;

        assert_eq!(provider.completed_steps(), vec!["A"]);
        assert_eq!(provider.current_step().unwrap().id(), "B");
        assert!(!provider.is_loading());
        assert!(provider.error().is_none());
    }

    #[tokio::test]
    async fn test_complete_current_step_is_idempotent() {
        let Chain { provider, .. } = chain();
        provider.initialize().await;
        provider.go_to_step("A");

        provider.complete_current_step().await;
        provider.go_to_step("A");
        provider.complete_current_step().await;

        assert_eq!(provider.completed_steps(), vec!["A"]);
        assert!(provider.error().is_none());
    }

    #[tokio::test]
    async fn test_complete_without_current_step_is_noop() {
        let Chain { provider, .. } = chain();
        provider.complete_current_step().await;

        let state = provider.state();
        assert!(state.completed_steps.is_empty());
        assert!(state.all_steps.is_empty());
        assert!(!state.is_loading);
    }

    #[tokio::test]
    async fn test_completed_wizard_pins_last_step() {
        let chain = chain();
        chain.a.set(true);
        chain.b.set(true);
        chain.c.set(true);

        chain.provider.initialize().await;

        let state = chain.provider.state();
        assert!(state.is_completed);
        assert_eq!(state.current_step_id(), Some("C"));
        assert_eq!(state.completed_steps, vec!["A", "B", "C"]);
        assert!(state.available_steps.is_empty());
    }

    #[tokio::test]
    async fn test_failing_predicate_sets_error_and_keeps_progress() {
        let chain = chain();
        chain.a.set(true);
        chain.provider.initialize().await;
        let before = chain.provider.completed_steps();

        chain.c.fail(true);
        chain.provider.refresh_status().await;

        let state = chain.provider.state();
        let error = state.error.clone().unwrap();
        assert!(!error.is_empty());
        assert!(before.iter().all(|id| state.is_step_completed(id)));
        assert_eq!(state.current_step_id(), Some("B"));
    }

    #[tokio::test]
    async fn test_successful_refresh_clears_error() {
        let chain = chain();
        chain.b.fail(true);
        chain.provider.initialize().await;
        assert!(chain.provider.error().is_some());

        chain.b.fail(false);
        chain.provider.refresh_status().await;
        assert!(chain.provider.error().is_none());
        assert_eq!(chain.provider.current_step().unwrap().id(), "A");
    }

    #[tokio::test]
    async fn test_navigation_bounds() {
        let Chain { provider, .. } = chain();
        provider.initialize().await;

        provider.previous_step();
        assert_eq!(provider.current_step().unwrap().id(), "A");

        // Paging forward ignores dependency gating
        provider.next_step();
        assert_eq!(provider.current_step().unwrap().id(), "B");
        provider.next_step();
        provider.next_step();
        assert_eq!(provider.current_step().unwrap().id(), "C");

        provider.previous_step();
        assert_eq!(provider.current_step().unwrap().id(), "B");
    }

    #[tokio::test]
    async fn test_paging_needs_a_current_step() {
        let Chain { provider, .. } = chain();

        provider.next_step();
        provider.previous_step();
        assert!(provider.current_step().is_none());
    }

    #[tokio::test]
    async fn test_go_to_unknown_step_is_ignored() {
        let Chain { provider, .. } = chain();
        provider.initialize().await;

        assert!(!provider.go_to_step("missing"));
        assert_eq!(provider.current_step().unwrap().id(), "A");
        assert!(provider.error().is_none());

        assert!(provider.go_to_step("C"));
        assert_eq!(provider.current_step().unwrap().id(), "C");
    }

    #[tokio::test]
    async fn test_subscribers_see_updates() {
        let Chain { provider, .. } = chain();
        let mut rx = provider.subscribe();

        provider.initialize().await;
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().current_step_id(), Some("A"));

        provider.previous_step();
        assert!(!rx.has_changed().unwrap());
    }

    /// Reports the value it saw on entry, optionally parking the first call
    struct GatedStep {
        done: Arc<AtomicBool>,
        hold: Arc<AtomicBool>,
        entered: Arc<Notify>,
        release: Arc<Notify>,
    }

    #[async_trait]
    impl WizardStep<()> for GatedStep {
        fn id(&self) -> &str {
            "gated"
        }

        fn title(&self) -> &str {
            "Gated"
        }

        fn description(&self) -> &str {
            ""
        }

        async fn is_completed(&self, _ctx: &()) -> std::result::Result<bool, OnboardError> {
            let value = self.done.load(Ordering::SeqCst);
            if self.hold.swap(false, Ordering::SeqCst) {
                self.entered.notify_one();
                self.release.notified().await;
            }
            Ok(value)
        }
    }

    #[tokio::test]
    async fn test_stale_refresh_does_not_overwrite_newer_state() {
        let done = Arc::new(AtomicBool::new(false));
        let hold = Arc::new(AtomicBool::new(true));
        let entered = Arc::new(Notify::new());
        let release = Arc::new(Notify::new());

        let mut registry = WizardStepRegistry::new();
        registry.register(
            Arc::new(GatedStep {
                done: done.clone(),
                hold: hold.clone(),
                entered: entered.clone(),
                release: release.clone(),
            }),
            None,
        );
        let provider = WizardProvider::new(Arc::new(registry), Arc::new(()));

        let slow = provider.clone();
        let first = tokio::spawn(async move { slow.refresh_status().await });
        entered.notified().await;

        done.store(true, Ordering::SeqCst);
        provider.refresh_status().await;
        assert!(provider.is_completed());

        release.notify_one();
        first.await.unwrap();

        let state = provider.state();
        assert!(state.is_completed);
        assert_eq!(state.current_step_id(), Some("gated"));
        assert_eq!(state.completed_steps, vec!["gated"]);
    }

    /// Parks on its first call, fails on its second, reports pending after that
    struct FlakyStep {
        calls: AtomicUsize,
        entered: Arc<Notify>,
        release: Arc<Notify>,
    }

    #[async_trait]
    impl WizardStep<()> for FlakyStep {
        fn id(&self) -> &str {
            "flaky"
        }

        fn title(&self) -> &str {
            "Flaky"
        }

        fn description(&self) -> &str {
            ""
        }

        async fn is_completed(&self, _ctx: &()) -> std::result::Result<bool, OnboardError> {
            match self.calls.fetch_add(1, Ordering::SeqCst) {
                0 => {
                    self.entered.notify_one();
                    self.release.notified().await;
                    Ok(false)
                }
                1 => Err(OnboardError::step("flaky", "device went away")),
                _ => Ok(false),
            }
        }
    }

    #[tokio::test]
    async fn test_stale_refresh_does_not_clear_newer_error() {
        let entered = Arc::new(Notify::new());
        let release = Arc::new(Notify::new());

        let mut registry = WizardStepRegistry::new();
        registry.register(
            Arc::new(FlakyStep {
                calls: AtomicUsize::new(0),
                entered: entered.clone(),
                release: release.clone(),
            }),
            None,
        );
        let provider = WizardProvider::new(Arc::new(registry), Arc::new(()));

        let slow = provider.clone();
        let first = tokio::spawn(async move { slow.refresh_status().await });
        entered.notified().await;

        provider.refresh_status().await;
        assert!(provider.state().error.is_some());

        release.notify_one();
        first.await.unwrap();

        let state = provider.state();
        assert!(state.error.is_some());
        assert_eq!(state.current_step_id(), None);
        assert!(state.available_steps.is_empty());
    }

    #[tokio::test]
    async fn test_completed_steps_follow_registration_order() {
        let a = MockStep::new("A");
        let b = MockStep::new("B");
        let c = MockStep::new("C");
        let (a_done, b_done) = (a.switch(), b.switch());

        let mut registry = WizardStepRegistry::new();
        registry.register(a.into_arc(), None);
        registry.register(b.into_arc(), None);
        registry.register(c.into_arc(), None);
        let provider = WizardProvider::new(Arc::new(registry), Arc::new(()));

        b_done.set(true);
        provider.initialize().await;
        assert_eq!(provider.completed_steps(), vec!["B"]);

        a_done.set(true);
        provider.refresh_status().await;
        assert_eq!(provider.completed_steps(), vec!["A", "B"]);
        assert_eq!(provider.state().current_step_id(), Some("C"));
    }
}
