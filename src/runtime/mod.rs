//! Menu runtime.
//!
//! [`MenuRuntime`] owns the host collaborators and orchestrates the three
//! stateful operations of the framework: the display pass with its deferred
//! commit, the live refresh into an already-open container, and click
//! dispatch. Hooks never touch the runtime while their screen is locked;
//! they queue follow-up work on a [`ClickContext`] and the runtime applies
//! it afterwards.

use std::sync::{Arc, Mutex, MutexGuard};

use serde_json::{Value, json};

use crate::buffer::RenderBuffer;
use crate::element::Element;
use crate::error::{MenuError, Result};
use crate::host::{
    ClickEvent, ContainerId, ContainerKind, EventBridge, HostBundle, OpenNotification,
    RenderSurface, SoundPlayer, SoundSpec, TickScheduler, ViewerGateway, ViewerId,
};
use crate::logging::{LogLevel, Logger, event_with_fields, kv};
use crate::metrics::MenuMetrics;
use crate::screen::{Screen, SharedScreen, registration};
use crate::visual::VisualItem;

pub mod session;

use session::SessionRegistry;

/// Ticks between the synchronous part of a display pass and its commit.
/// Listeners reacting to the open notification get one quantum to settle
/// their viewer state before the container actually renders.
const COMMIT_DELAY_TICKS: u64 = 1;

const LOG_TARGET: &str = "menu::runtime";

/// Configuration knobs for the runtime.
#[derive(Clone)]
pub struct MenuConfig {
    /// Sound played towards the viewer on every successful display pass.
    pub transition_sound: SoundSpec,
    /// Message sent when a conversing viewer is refused a menu.
    pub conversation_warning: String,
    /// Ticks a flashed title stays up before reverting.
    pub title_flash_ticks: u64,
    /// Namespace scoping the session-registry keys. Read once when the
    /// runtime is built.
    pub namespace: String,
    /// Optional structured logger.
    pub logger: Option<Logger>,
    /// Optional metrics accumulator.
    pub metrics: Option<Arc<Mutex<MenuMetrics>>>,
}

impl Default for MenuConfig {
    fn default() -> Self {
        Self {
            transition_sound: SoundSpec::new("ui.page_turn", 0.4, 1.0, true),
            conversation_warning: "Type 'exit' to quit your conversation before opening the menu."
                .to_string(),
            title_flash_ticks: 20,
            namespace: "menu".to_string(),
            logger: None,
            metrics: None,
        }
    }
}

impl MenuConfig {
    /// Enable metrics collection if it has not already been configured.
    pub fn enable_metrics(&mut self) {
        if self.metrics.is_none() {
            self.metrics = Some(Arc::new(Mutex::new(MenuMetrics::new())));
        }
    }

    /// Access the shared metrics handle if metrics are enabled.
    pub fn metrics_handle(&self) -> Option<Arc<Mutex<MenuMetrics>>> {
        self.metrics.as_ref().map(Arc::clone)
    }
}

/// How a display pass ended. The non-`Displayed` outcomes are soft aborts:
/// nothing was scheduled and no session state changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayOutcome {
    /// The commit is scheduled for the next scheduling quantum.
    Displayed,
    /// A listener cancelled the open notification.
    Cancelled,
    /// The viewer is held by a conversation prompt.
    Blocked,
}

/// Follow-up work queued by click hooks.
///
/// Applied by the runtime once the screen lock is released, so handlers can
/// request navigation or a refresh without deadlocking on their own screen.
pub struct ClickContext {
    navigate: Option<SharedScreen>,
    refresh: bool,
    flash_title: Option<String>,
}

impl ClickContext {
    pub(crate) fn new() -> Self {
        Self {
            navigate: None,
            refresh: false,
            flash_title: None,
        }
    }

    /// Display another screen to the clicking viewer. Takes precedence over
    /// a queued refresh.
    pub fn navigate(&mut self, target: SharedScreen) {
        self.navigate = Some(target);
    }

    /// Re-register and redraw the clicked screen.
    pub fn request_refresh(&mut self) {
        self.refresh = true;
    }

    /// Like [`ClickContext::request_refresh`], flashing a transient title.
    pub fn request_refresh_flashing(&mut self, title: impl Into<String>) {
        self.refresh = true;
        self.flash_title = Some(title.into());
    }

    fn into_outcome(self) -> ClickOutcome {
        ClickOutcome {
            navigate: self.navigate,
            refresh: self.refresh,
            flash_title: self.flash_title,
        }
    }
}

struct ClickOutcome {
    navigate: Option<SharedScreen>,
    refresh: bool,
    flash_title: Option<String>,
}

/// Orchestrates screens against a host.
pub struct MenuRuntime {
    surface: Arc<dyn RenderSurface>,
    viewers: Arc<dyn ViewerGateway>,
    events: Arc<dyn EventBridge>,
    scheduler: Arc<dyn TickScheduler>,
    sounds: Arc<dyn SoundPlayer>,
    sessions: SessionRegistry,
    config: MenuConfig,
}

impl MenuRuntime {
    pub fn new(host: HostBundle) -> Self {
        Self::with_config(host, MenuConfig::default())
    }

    pub fn with_config(host: HostBundle, config: MenuConfig) -> Self {
        let sessions = SessionRegistry::new(host.store.clone(), &config.namespace);
        Self {
            surface: host.surface,
            viewers: host.viewers,
            events: host.events,
            scheduler: host.scheduler,
            sounds: host.sounds,
            sessions,
            config,
        }
    }

    pub fn config(&self) -> &MenuConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut MenuConfig {
        &mut self.config
    }

    pub fn sessions(&self) -> &SessionRegistry {
        &self.sessions
    }

    /// Screen the viewer currently has open, if any.
    pub fn current_screen(&self, viewer: ViewerId) -> Result<Option<SharedScreen>> {
        self.sessions.current(viewer)
    }

    /// Screen the viewer navigated away from, if any.
    pub fn previous_screen(&self, viewer: ViewerId) -> Result<Option<SharedScreen>> {
        self.sessions.previous(viewer)
    }

    /// Display a screen to a viewer; refused while the viewer is conversing.
    pub fn display_to(&self, screen: &SharedScreen, viewer: ViewerId) -> Result<DisplayOutcome> {
        self.display(screen, viewer, false)
    }

    /// Display even while the viewer is held by a conversation prompt.
    pub fn display_to_ignoring_conversation(
        &self,
        screen: &SharedScreen,
        viewer: ViewerId,
    ) -> Result<DisplayOutcome> {
        self.display(screen, viewer, true)
    }

    fn display(
        &self,
        screen: &SharedScreen,
        viewer: ViewerId,
        ignore_conversation: bool,
    ) -> Result<DisplayOutcome> {
        let (name, mut buffer) = {
            let mut guard = lock_screen(screen)?;
            let name = guard.name().to_string();
            let size = guard.state().size();
            if size == 0 || size % 9 != 0 {
                return Err(MenuError::InvalidSize(size));
            }
            let title = guard
                .state()
                .title()
                .ok_or(MenuError::TitleNotSet)?
                .to_string();

            guard.state_mut().bind_viewer(viewer, &name)?;
            registration::ensure_registered(&mut *guard)?;

            let mut buffer = RenderBuffer::new(size, title);
            for (slot, item) in bottom_bar(&*guard, size) {
                buffer.set_item(slot, item)?;
            }
            for slot in 0..size {
                if buffer.is_set(slot) {
                    continue;
                }
                if let Some(item) = guard.item_at(slot) {
                    buffer.set_item(slot, item)?;
                }
            }
            guard.on_display(&mut buffer);
            (name, buffer)
        };

        let mut notification = OpenNotification::new(viewer, &mut buffer);
        self.events.notify_open(&mut notification);
        if notification.is_cancelled() {
            record_metrics(self.config.metrics.as_ref(), |m| m.record_soft_abort());
            self.log_event(
                LogLevel::Debug,
                "display_cancelled",
                [kv("viewer", json!(viewer.0)), kv("screen", json!(name))],
            );
            return Ok(DisplayOutcome::Cancelled);
        }

        if !ignore_conversation && self.viewers.is_conversing(viewer) {
            self.viewers
                .send_message(viewer, &self.config.conversation_warning);
            record_metrics(self.config.metrics.as_ref(), |m| m.record_soft_abort());
            self.log_event(
                LogLevel::Warn,
                "display_blocked",
                [kv("viewer", json!(viewer.0)), kv("screen", json!(name))],
            );
            return Ok(DisplayOutcome::Blocked);
        }

        self.sounds.play(viewer, &self.config.transition_sound);

        if let Some(prior) = self.sessions.current(viewer)? {
            self.sessions.record_previous(viewer, &prior)?;
        }

        let staged = buffer.slots().count();
        let surface = Arc::clone(&self.surface);
        let sessions = self.sessions.clone();
        let target = Arc::clone(screen);
        let logger = self.config.logger.clone();
        let metrics = self.config.metrics.clone();
        let commit_name = name.clone();
        self.scheduler.run_after(
            COMMIT_DELAY_TICKS,
            Box::new(move || {
                buffer.commit(surface.as_ref(), viewer)?;
                sessions.record_current(viewer, &target)?;
                record_metrics(metrics.as_ref(), |m| m.record_commit());
                log_with(
                    logger.as_ref(),
                    LogLevel::Debug,
                    "display_committed",
                    [
                        kv("viewer", json!(viewer.0)),
                        kv("screen", json!(commit_name)),
                        kv("slots", json!(staged)),
                    ],
                );
                Ok(())
            }),
        );

        record_metrics(self.config.metrics.as_ref(), |m| m.record_display());
        self.log_event(
            LogLevel::Debug,
            "display_scheduled",
            [kv("viewer", json!(viewer.0)), kv("screen", json!(name))],
        );
        Ok(DisplayOutcome::Displayed)
    }

    /// Re-register elements and redraw the already-open container.
    ///
    /// A transient `flash_title` is shown immediately and reverted to the
    /// screen's own title after `title_flash_ticks`.
    pub fn restart_menu(&self, screen: &SharedScreen, flash_title: Option<&str>) -> Result<()> {
        let (name, viewer, title) = {
            let mut guard = lock_screen(screen)?;
            let name = guard.name().to_string();
            let viewer = guard
                .state()
                .viewer()
                .ok_or_else(|| MenuError::ViewerNotBound(name.clone()))?;

            registration::reregister(&mut *guard)?;

            let size = guard.state().size();
            let title = guard
                .state()
                .title()
                .ok_or(MenuError::TitleNotSet)?
                .to_string();

            let open = self.surface.open_container_info(viewer).ok_or_else(|| {
                MenuError::StateMismatch(format!(
                    "{viewer} has no open container while `{name}` refreshes"
                ))
            })?;
            if open.kind != ContainerKind::Grid {
                return Err(MenuError::StateMismatch(format!(
                    "{viewer}'s container changed in the meanwhile (now {:?})",
                    open.kind
                )));
            }
            if open.size != size {
                return Err(MenuError::StateMismatch(format!(
                    "`{name}` expects {size} slots but {viewer}'s container has {}",
                    open.size
                )));
            }

            for slot in 0..size {
                self.surface.set_slot(open.id, slot, guard.item_at(slot))?;
            }
            // Bottom bar last so it always wins over slot content.
            for (slot, item) in bottom_bar(&*guard, size) {
                self.surface.set_slot(open.id, slot, Some(item))?;
            }
            self.surface.force_redraw(viewer)?;
            (name, viewer, title)
        };

        if let Some(flash) = flash_title {
            self.surface.set_title(viewer, flash)?;
            let surface = Arc::clone(&self.surface);
            self.scheduler.run_after(
                self.config.title_flash_ticks,
                Box::new(move || surface.set_title(viewer, &title)),
            );
        }

        record_metrics(self.config.metrics.as_ref(), |m| m.record_refresh());
        self.log_event(
            LogLevel::Debug,
            "menu_refreshed",
            [
                kv("viewer", json!(viewer.0)),
                kv("screen", json!(name)),
                kv("flash", json!(flash_title.is_some())),
            ],
        );
        Ok(())
    }

    /// Route a click notification to the screen's hooks.
    pub fn dispatch_click(&self, screen: &SharedScreen, event: &ClickEvent) -> Result<()> {
        let mut ctx = ClickContext::new();
        let matched;
        {
            let mut guard = lock_screen(screen)?;
            registration::ensure_registered(&mut *guard)?;
            let element = event.clicked.as_ref().and_then(|clicked| {
                guard
                    .state()
                    .elements()
                    .iter()
                    .find(|element| element.visual() == clicked)
                    .cloned()
            });
            match element {
                Some(element) => {
                    matched = true;
                    guard.on_element_click(&mut ctx, event, &element)?;
                }
                None => {
                    matched = false;
                    guard.on_menu_click(&mut ctx, event)?;
                }
            }
        }

        record_metrics(self.config.metrics.as_ref(), |m| {
            if matched {
                m.record_element_hit();
            } else {
                m.record_fallback_click();
            }
        });
        self.log_event(
            LogLevel::Debug,
            "click_dispatched",
            [
                kv("viewer", json!(event.viewer.0)),
                kv("slot", json!(event.slot)),
                kv("matched", json!(matched)),
            ],
        );

        let outcome = ctx.into_outcome();
        if let Some(target) = outcome.navigate {
            self.display_to(&target, event.viewer)?;
        } else if outcome.refresh {
            self.restart_menu(screen, outcome.flash_title.as_deref())?;
        }
        Ok(())
    }

    /// Forward the host's close notification to the screen.
    pub fn handle_close(
        &self,
        screen: &SharedScreen,
        viewer: ViewerId,
        container: ContainerId,
    ) -> Result<()> {
        let name = {
            let mut guard = lock_screen(screen)?;
            guard.on_close(viewer, container);
            guard.name().to_string()
        };
        self.log_event(
            LogLevel::Debug,
            "menu_closed",
            [kv("viewer", json!(viewer.0)), kv("screen", json!(name))],
        );
        Ok(())
    }

    fn log_event<I>(&self, level: LogLevel, message: &str, fields: I)
    where
        I: IntoIterator<Item = (String, Value)>,
    {
        log_with(self.config.logger.as_ref(), level, message, fields);
    }
}

fn lock_screen(screen: &SharedScreen) -> Result<MutexGuard<'_, dyn Screen + 'static>> {
    screen.lock().map_err(|_| MenuError::Poisoned)
}

fn bottom_bar(screen: &dyn Screen, size: usize) -> Vec<(usize, VisualItem)> {
    let mut items = Vec::new();
    if let Some(lines) = screen.info() {
        items.push((screen.info_slot(size), Element::info(lines).visual().clone()));
    }
    let return_element = screen.state().return_element();
    if screen.show_return() && screen.state().has_parent() && !return_element.is_dummy() {
        items.push((screen.return_slot(size), return_element.visual().clone()));
    }
    items
}

fn record_metrics(metrics: Option<&Arc<Mutex<MenuMetrics>>>, apply: impl FnOnce(&mut MenuMetrics)) {
    if let Some(metrics) = metrics {
        if let Ok(mut guard) = metrics.lock() {
            apply(&mut guard);
        }
    }
}

fn log_with<I>(logger: Option<&Logger>, level: LogLevel, message: &str, fields: I)
where
    I: IntoIterator<Item = (String, Value)>,
{
    if let Some(logger) = logger {
        let _ = logger.log_event(event_with_fields(level, LOG_TARGET, message, fields));
    }
}
