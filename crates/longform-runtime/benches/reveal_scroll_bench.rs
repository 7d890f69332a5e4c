#![forbid(unsafe_code)]

use std::hint::black_box;
use std::time::Duration;

use ahash::AHashMap;
use criterion::{Criterion, criterion_group, criterion_main};
use longform_core::animation::Stage;
use longform_core::geometry::{Rect, Viewport};
use longform_core::pose::NodeId;
use longform_runtime::config::RevealPolicyConfig;
use longform_runtime::{DriveBy, HostDocument, NodeKind, RevealCandidate, RevealEngine, RevealTargets};

const FRAME: Duration = Duration::from_millis(16);

struct Page {
    scroll_y: f32,
    viewport: Viewport,
    rects: AHashMap<NodeId, Rect>,
}

impl HostDocument for Page {
    fn announce(&mut self, _text: &str) {}

    fn scroll_to(&mut self, top: f32, _smooth: bool) {
        self.scroll_y = top;
    }

    fn scroll_y(&self) -> f32 {
        self.scroll_y
    }

    fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn set_scroll_locked(&mut self, _locked: bool) {}

    fn node_rect(&self, node: NodeId) -> Option<Rect> {
        self.rects.get(&node).copied()
    }
}

/// `n` paragraphs 180px apart plus a drive-by every 25 nodes.
fn page(n: u32) -> (Page, RevealTargets) {
    let mut rects = AHashMap::new();
    let mut targets = RevealTargets::default();
    let mut drives = Vec::new();
    for i in 0..n {
        let node = NodeId(i);
        rects.insert(node, Rect::new(0.0, i as f32 * 180.0, 720.0, 120.0));
        if i % 25 == 24 {
            drives.push(node);
        } else {
            targets
                .candidates
                .push(RevealCandidate::text(node, NodeKind::Paragraph));
        }
    }
    targets.drive_bys = DriveBy::alternating(&drives);
    let page = Page {
        scroll_y: 0.0,
        viewport: Viewport::new(1280.0, 800.0),
        rects,
    };
    (page, targets)
}

fn bench_reveal_scroll(c: &mut Criterion) {
    let mut group = c.benchmark_group("reveal/scroll");

    for n in [100u32, 1_000] {
        group.bench_function(format!("bind_{n}"), |b| {
            let (page, targets) = page(n);
            b.iter(|| {
                let mut stage = Stage::new();
                let mut engine = RevealEngine::new(RevealPolicyConfig::default());
                engine.bind(&targets, &page, &mut stage);
                black_box(engine.binding_count());
            });
        });

        group.bench_function(format!("scroll_frames_60_{n}"), |b| {
            let (mut page, targets) = page(n);
            let mut stage = Stage::new();
            let mut engine = RevealEngine::new(RevealPolicyConfig::default());
            engine.bind(&targets, &page, &mut stage);
            b.iter(|| {
                for frame in 0..60 {
                    page.scroll_y = frame as f32 * 40.0;
                    engine.on_scroll(page.scroll_y);
                    engine.tick(FRAME, &page, &mut stage);
                }
                black_box(engine.progress(NodeId(3)));
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_reveal_scroll);
criterion_main!(benches);
