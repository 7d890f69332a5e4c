#![forbid(unsafe_code)]

//! Slide backgrounds.
//!
//! Every slide has a layer (faded in and out) and an image inside it
//! (scaled, blurred, and offset by pointer parallax). Only the active
//! slide's background is visible.

use std::time::Duration;

use longform_core::animation::{Follower, Stage, TweenSpec, expo_out, power2_out};
use longform_core::geometry::{Point, Viewport};
use longform_core::motion::MotionProfile;
use longform_core::pose::{NodeId, PosePatch};

use crate::config::BackgroundPolicyConfig;

/// Nodes of one slide background.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackgroundNodes {
    /// Full-bleed layer, carries opacity.
    pub layer: NodeId,
    /// Oversized image inside the layer, carries scale, blur and parallax.
    pub image: NodeId,
}

#[derive(Debug, Clone)]
struct Parallax {
    x: Follower,
    y: Follower,
}

#[derive(Debug, Clone)]
pub struct BackgroundLayer {
    backgrounds: Vec<BackgroundNodes>,
    parallax: Vec<Parallax>,
    active: Option<usize>,
    config: BackgroundPolicyConfig,
}

impl BackgroundLayer {
    #[must_use]
    pub fn new(backgrounds: Vec<BackgroundNodes>, config: BackgroundPolicyConfig) -> Self {
        let follow = config.parallax_follow();
        let parallax = backgrounds
            .iter()
            .map(|_| Parallax {
                x: Follower::new(0.0, follow),
                y: Follower::new(0.0, follow),
            })
            .collect();
        Self {
            backgrounds,
            parallax,
            active: None,
            config,
        }
    }

    #[must_use]
    pub fn active(&self) -> Option<usize> {
        self.active
    }

    /// Hide every background.
    pub fn mount(&self, stage: &mut Stage) {
        for bg in &self.backgrounds {
            stage.set(bg.layer, &PosePatch::new().opacity(0.0));
        }
    }

    /// Make `index` the visible background (or none).
    pub fn activate(&mut self, index: Option<usize>, stage: &mut Stage, profile: MotionProfile) {
        let index = index.filter(|&i| i < self.backgrounds.len());
        if index == self.active {
            return;
        }
        if let Some(old) = self.active {
            let bg = self.backgrounds[old];
            stage.kill_node(bg.layer);
            stage.set(bg.layer, &PosePatch::new().opacity(0.0));
        }
        self.active = index;
        let Some(i) = index else {
            return;
        };
        let bg = self.backgrounds[i];
        let cfg = &self.config;
        if profile.reduced_motion {
            stage.tween(
                TweenSpec::from_to(
                    bg.layer,
                    PosePatch::new().opacity(0.0),
                    PosePatch::new().opacity(1.0),
                )
                .duration(cfg.reduced())
                .ease(power2_out),
            );
            stage.tween(
                TweenSpec::from_to(
                    bg.image,
                    PosePatch::new().scale(cfg.reduced_scale_from),
                    PosePatch::new().scale(1.0),
                )
                .duration(cfg.reduced())
                .ease(power2_out),
            );
        } else {
            stage.tween(
                TweenSpec::from_to(
                    bg.layer,
                    PosePatch::new().opacity(0.0),
                    PosePatch::new().opacity(1.0),
                )
                .duration(cfg.fade())
                .ease(expo_out),
            );
            stage.tween(
                TweenSpec::from_to(
                    bg.image,
                    PosePatch::new().scale(cfg.scale_from).blur(cfg.blur_from),
                    PosePatch::new().scale(1.0).blur(cfg.blur_to),
                )
                .duration(cfg.settle())
                .ease(expo_out),
            );
        }
    }

    /// Retarget the parallax of the active background.
    pub fn pointer_moved(&mut self, pointer: Point, viewport: Viewport, profile: MotionProfile) {
        if profile.reduced_motion || profile.is_touch_device {
            return;
        }
        let Some(p) = self.active.and_then(|i| self.parallax.get_mut(i)) else {
            return;
        };
        let center = viewport.center();
        if center.x <= 0.0 || center.y <= 0.0 {
            return;
        }
        let reach = self.config.parallax_px;
        p.x.set_target((pointer.x - center.x) / center.x * reach);
        p.y.set_target((pointer.y - center.y) / center.y * reach);
    }

    /// Advance parallax and write the offsets into the image poses.
    pub fn tick(&mut self, dt: Duration, stage: &mut Stage) {
        for (bg, p) in self.backgrounds.iter().zip(&mut self.parallax) {
            if p.x.is_settled() && p.y.is_settled() {
                continue;
            }
            p.x.tick(dt);
            p.y.tick(dt);
            stage.set(bg.image, &PosePatch::new().x(p.x.value()).y(p.y.value()));
        }
    }

    /// Jump everything to its terminal state for `profile`.
    pub fn reconcile(&mut self, stage: &mut Stage, profile: MotionProfile) {
        for (i, (bg, p)) in self.backgrounds.iter().zip(&mut self.parallax).enumerate() {
            stage.kill_node(bg.layer);
            stage.kill_node(bg.image);
            let active = self.active == Some(i);
            stage.set(bg.layer, &PosePatch::new().opacity(if active { 1.0 } else { 0.0 }));
            let blur = if profile.reduced_motion {
                0.0
            } else {
                self.config.blur_to
            };
            stage.set(bg.image, &PosePatch::new().scale(1.0).blur(blur));
            if profile.reduced_motion {
                p.x.snap(0.0);
                p.y.snap(0.0);
                stage.set(bg.image, &PosePatch::new().x(0.0).y(0.0));
            }
        }
    }
}
