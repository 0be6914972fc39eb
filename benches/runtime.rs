use std::sync::Arc;

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use gridmenu::{
    ClickEvent, ClickKind, Element, MemoryHost, MenuRuntime, Screen, ScreenState, SharedScreen,
    SlotAction, ViewerId, VisualItem, share,
};

#[derive(Debug)]
struct BenchShop {
    state: ScreenState,
    wares: Vec<Element>,
}

impl BenchShop {
    fn new() -> Self {
        let wares: Vec<Element> = (0..9)
            .map(|i| {
                Element::new(
                    VisualItem::new(format!("ware-{i}")),
                    Arc::new(|_, _, _| Ok(())),
                )
            })
            .collect();
        let state = ScreenState::builder()
            .title("Bench Shop")
            .element_group("wares", wares.clone())
            .build()
            .expect("state");
        Self { state, wares }
    }
}

impl Screen for BenchShop {
    fn state(&self) -> &ScreenState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut ScreenState {
        &mut self.state
    }

    fn name(&self) -> &str {
        "bench.shop"
    }

    fn item_at(&self, slot: usize) -> Option<VisualItem> {
        self.wares.get(slot).map(|ware| ware.visual().clone())
    }

    fn info(&self) -> Option<Vec<String>> {
        Some(vec!["Synthetic wares for the bench harness".to_string()])
    }
}

fn click(viewer: ViewerId, slot: usize, clicked: Option<VisualItem>) -> ClickEvent {
    ClickEvent {
        viewer,
        slot,
        action: SlotAction::Pickup,
        click: ClickKind::Left,
        cursor: None,
        clicked,
        host_cancelled: false,
    }
}

fn display_and_commit(c: &mut Criterion) {
    let viewer = ViewerId(1);
    c.bench_function("display_and_commit", |b| {
        b.iter(|| {
            let host = MemoryHost::new();
            let runtime = MenuRuntime::new(host.bundle());
            let shop: SharedScreen = share(BenchShop::new());

            runtime.display_to(&shop, viewer).expect("display");
            host.scheduler.advance(1).expect("commit");
            black_box(runtime.current_screen(viewer).expect("lookup"));
        });
    });
}

fn dispatch_click_storm(c: &mut Criterion) {
    let viewer = ViewerId(2);
    let host = MemoryHost::new();
    let runtime = MenuRuntime::new(host.bundle());
    let inner = BenchShop::new();
    let ware = inner.wares[5].visual().clone();
    let shop: SharedScreen = share(inner);
    runtime.display_to(&shop, viewer).expect("display");
    host.scheduler.advance(1).expect("commit");
    let stranger = VisualItem::new("stranger");

    c.bench_function("dispatch_click_storm", |b| {
        b.iter(|| {
            runtime
                .dispatch_click(&shop, &click(viewer, 5, Some(black_box(ware.clone()))))
                .expect("matched dispatch");
            runtime
                .dispatch_click(&shop, &click(viewer, 20, Some(black_box(stranger.clone()))))
                .expect("fallback dispatch");
        });
    });
}

criterion_group!(benches, display_and_commit, dispatch_click_storm);
criterion_main!(benches);
