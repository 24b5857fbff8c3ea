use crate::controllers::display::display::Display;
use crate::controllers::rendering::ports::presenter::RenderPresenterPort;
use crate::controllers::rendering::worker::RenderWorker;
use crate::core::control::switch_registry::ControlSwitchRegistry;
use crate::core::data::domain_set::DomainSet;
use crate::core::data::rendering_id::RenderingId;
use crate::core::ports::content_builder::ContentBuilder;
use crate::core::ports::switch_target::SwitchTarget;
use crate::core::swap::{SwapController, SwapStatus};
use crate::core::sync::lock;
use std::sync::{Arc, Mutex, Weak};
use tracing::info;

/// One data reference's live presence in a display.
///
/// Bundles the slot ring, the worker that fills it, and every control
/// registry its switches are bound into. Dropping it detaches it.
pub struct Rendering<B: ContentBuilder> {
    controller: SwapController<B::Content>,
    worker: RenderWorker<B>,
    presenter_port: Arc<dyn RenderPresenterPort>,
    display: Weak<Display<B::Content>>,
    registries: Mutex<Vec<Arc<ControlSwitchRegistry>>>,
    detached: bool,
}

impl<B: ContentBuilder> std::fmt::Debug for Rendering<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rendering")
            .field("id", &self.controller.id())
            .field("detached", &self.detached)
            .finish_non_exhaustive()
    }
}

impl<B: ContentBuilder> Rendering<B> {
    pub fn attach(
        display: &Arc<Display<B::Content>>,
        switch_target: Arc<dyn SwitchTarget>,
        builder: Arc<B>,
        presenter_port: Arc<dyn RenderPresenterPort>,
    ) -> Self {
        let controller = display.attach(switch_target);
        let worker = RenderWorker::new(builder, controller.clone(), Arc::clone(&presenter_port));

        Self {
            controller,
            worker,
            presenter_port,
            display: Arc::downgrade(display),
            registries: Mutex::new(Vec::new()),
            detached: false,
        }
    }

    #[must_use]
    pub fn id(&self) -> RenderingId {
        self.controller.id()
    }

    /// Queues a rebuild. Returns the request's generation, or 0 once detached.
    pub fn request(&self, request: B::Request) -> u64 {
        if self.detached {
            return 0;
        }
        self.worker.request(request)
    }

    /// Makes `target` follow `registry`'s control over `set` until this
    /// rendering detaches.
    pub fn bind_control(
        &self,
        registry: &Arc<ControlSwitchRegistry>,
        target: Arc<dyn SwitchTarget>,
        set: Arc<dyn DomainSet>,
    ) {
        registry.register(target, set, self.id());

        let mut registries = lock(&self.registries);
        if !registries.iter().any(|known| Arc::ptr_eq(known, registry)) {
            registries.push(Arc::clone(registry));
        }
    }

    #[must_use]
    pub fn controller(&self) -> &SwapController<B::Content> {
        &self.controller
    }

    #[must_use]
    pub fn status(&self) -> SwapStatus {
        self.controller.status()
    }

    #[must_use]
    pub fn last_completed_generation(&self) -> u64 {
        self.worker.last_completed_generation()
    }

    #[must_use]
    pub fn is_detached(&self) -> bool {
        self.detached
    }

    /// Cancels the worker, drops all slot content without waiting for
    /// removal frames, unbinds every control switch and tells the presenter
    /// to let go of this rendering.
    pub fn detach(&mut self) {
        if self.detached {
            return;
        }
        self.detached = true;

        self.worker.cancel();
        self.controller.detach();
        self.worker.shutdown();

        let registries = std::mem::take(&mut *lock(&self.registries));
        let unbound: usize = registries
            .iter()
            .map(|registry| registry.unregister_all(self.id()))
            .sum();

        if let Some(display) = self.display.upgrade() {
            display.remove(self.id());
        }
        self.presenter_port.forget(self.id());

        info!(rendering = %self.id(), unbound, "rendering detached");
    }
}

impl<B: ContentBuilder> Drop for Rendering<B> {
    fn drop(&mut self) {
        self.detach();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controllers::rendering::events::render::RenderEvent;
    use crate::core::actions::cancellation::CancelToken;
    use crate::core::data::domain_set::Gridded1DSet;
    use crate::core::data::index_switch::IndexSwitch;
    use crate::core::data::slot::SlotState;
    use crate::core::data::unit::ScalarValue;
    use crate::core::ports::content_builder::BuildError;
    use crate::core::swap::SwapConfig;
    use crate::presenters::overlay::OverlayPresenter;
    use std::thread;
    use std::time::{Duration, Instant};

    struct LabelBuilder;

    impl ContentBuilder for LabelBuilder {
        type Request = u32;
        type Content = String;

        fn build(&self, request: &u32, cancel: &dyn CancelToken) -> Result<String, BuildError> {
            cancel.check()?;
            Ok(format!("frame {request}"))
        }
    }

    #[derive(Default)]
    struct MockPresenterPort {
        events: Mutex<Vec<RenderEvent>>,
        forgotten: Mutex<Vec<RenderingId>>,
    }

    impl RenderPresenterPort for MockPresenterPort {
        fn present(&self, event: RenderEvent) {
            self.events.lock().unwrap().push(event);
        }

        fn forget(&self, rendering: RenderingId) {
            self.forgotten.lock().unwrap().push(rendering);
        }
    }

    fn attach(display: &Arc<Display<String>>) -> (Rendering<LabelBuilder>, Arc<MockPresenterPort>) {
        let presenter_port = Arc::new(MockPresenterPort::default());
        let rendering = Rendering::attach(
            display,
            Arc::new(IndexSwitch::new(3)),
            Arc::new(LabelBuilder),
            Arc::clone(&presenter_port) as Arc<dyn RenderPresenterPort>,
        );
        (rendering, presenter_port)
    }

    fn pump_until(display: &Display<String>, mut condition: impl FnMut() -> bool) -> bool {
        let start = Instant::now();
        while start.elapsed() < Duration::from_secs(2) {
            display.render_frame(|_, _| {});
            if condition() {
                return true;
            }
            thread::sleep(Duration::from_millis(5));
        }
        condition()
    }

    #[test]
    fn test_requests_flow_through_to_the_display() {
        let display = Arc::new(Display::new(SwapConfig::default()));
        let (rendering, _) = attach(&display);

        let generation = rendering.request(3);
        assert!(pump_until(&display, || rendering.last_completed_generation() == generation));
        display.render_frame(|_, _| {});

        let mut drawn = Vec::new();
        display.render_frame(|id, content| drawn.push((id, content.clone())));
        assert_eq!(drawn, vec![(rendering.id(), "frame 3".to_string())]);
    }

    #[test]
    fn test_detach_releases_slots_bindings_and_display_entry() {
        let display = Arc::new(Display::new(SwapConfig::default()));
        let registry = Arc::new(ControlSwitchRegistry::new());
        let (mut rendering, _) = attach(&display);
        let (other, _) = attach(&display);
        let set: Arc<dyn DomainSet> = Arc::new(Gridded1DSet::new(vec![0.0, 1.0], None).unwrap());
        let mine = Arc::new(IndexSwitch::new(2));
        let theirs = Arc::new(IndexSwitch::new(2));
        rendering.bind_control(&registry, mine.clone(), Arc::clone(&set));
        other.bind_control(&registry, theirs.clone(), set);

        let generation = rendering.request(1);
        assert!(pump_until(&display, || rendering.last_completed_generation() == generation));

        rendering.detach();

        assert!(rendering.is_detached());
        assert_eq!(rendering.status().states, [SlotState::Empty; 3]);
        assert_eq!(display.rendering_count(), 1);
        assert_eq!(registry.bound_owners(), vec![other.id()]);
        assert_eq!(rendering.request(2), 0);

        registry.apply(&ScalarValue::new(1.0));
        assert_eq!(mine.visible_child(), None);
        assert_eq!(theirs.visible_child(), Some(1));
    }

    #[test]
    fn test_drop_detaches() {
        let display = Arc::new(Display::new(SwapConfig::default()));
        let registry = Arc::new(ControlSwitchRegistry::new());
        {
            let (rendering, _) = attach(&display);
            let set: Arc<dyn DomainSet> =
                Arc::new(Gridded1DSet::new(vec![0.0], None).unwrap());
            rendering.bind_control(&registry, Arc::new(IndexSwitch::new(1)), set);
            assert_eq!(display.rendering_count(), 1);
        }

        assert_eq!(display.rendering_count(), 0);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_repeated_requests_keep_one_visible_slot() {
        let display = Arc::new(Display::new(SwapConfig::default()));
        let (rendering, presenter_port) = attach(&display);

        let mut last = 0;
        for value in 0..20 {
            last = rendering.request(value);
            display.render_frame(|_, _| {});
        }
        assert!(pump_until(&display, || rendering.last_completed_generation() == last));
        display.render_frame(|_, _| {});
        display.render_frame(|_, _| {});

        let states = rendering.status().states;
        assert_eq!(states.iter().filter(|s| **s == SlotState::Visible).count(), 1);
        assert_eq!(states.iter().filter(|s| **s == SlotState::HiddenPending).count(), 0);
        assert!(!presenter_port.events.lock().unwrap().is_empty());
        assert_eq!(
            rendering.controller().visible_content().as_deref(),
            Some(&format!("frame {}", 19))
        );
    }

    #[test]
    fn test_detach_releases_presenter_state() {
        let display = Arc::new(Display::new(SwapConfig::default()));
        let overlay = Arc::new(OverlayPresenter::new());

        for _ in 0..5 {
            let mut rendering = Rendering::attach(
                &display,
                Arc::new(IndexSwitch::new(3)),
                Arc::new(LabelBuilder),
                Arc::clone(&overlay) as Arc<dyn RenderPresenterPort>,
            );
            let generation = rendering.request(1);
            assert!(pump_until(&display, || rendering.last_completed_generation() == generation));
            assert_eq!(overlay.tracked_renderings(), 1);
            rendering.detach();
        }

        assert_eq!(overlay.tracked_renderings(), 0);
        assert!(overlay.overlays().is_empty());
    }

    #[test]
    fn test_detach_forgets_exactly_once() {
        let display = Arc::new(Display::new(SwapConfig::default()));
        let (mut rendering, presenter_port) = attach(&display);
        let id = rendering.id();

        rendering.detach();
        rendering.detach();

        assert_eq!(*presenter_port.forgotten.lock().unwrap(), vec![id]);
    }
}
