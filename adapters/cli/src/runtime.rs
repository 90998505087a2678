//! Frame-by-frame wiring of the world, systems, and scene.
//!
//! One [`Runtime::frame`] call is one render tick: it advances the world by
//! the elapsed real time, lets the traffic system drain completed probes,
//! dispatches new probes when the spawn task fires, folds panel interactions
//! back into the panel state, and repopulates the scene for drawing.

use std::{mem, time::Duration};

use glam::Vec2;
use rollout_reef_core::{Command, Event, FRAME_PERIOD};
use rollout_reef_rendering::{
    FrameInput, PanelCommand, PanelEntryView, PanelView, Scene, SpriteInstance, SurfaceExtent,
};
use rollout_reef_system_backend::SimulatedBackend;
use rollout_reef_system_panel::{ControlPanel, EnvOverrides, SliderAdjustment};
use rollout_reef_system_traffic::Traffic;
use rollout_reef_world::{self as world, query, World};

use crate::scheduler::Scheduler;

pub(crate) struct Runtime {
    world: World,
    traffic: Traffic,
    panel: ControlPanel,
    backend: SimulatedBackend,
    overrides: EnvOverrides,
    scheduler: Scheduler,
    surface: SurfaceExtent,
    events: Vec<Event>,
    commands: Vec<Command>,
}

impl Runtime {
    pub(crate) fn new(
        traffic: Traffic,
        panel: ControlPanel,
        backend: SimulatedBackend,
        overrides: EnvOverrides,
    ) -> Self {
        Self {
            world: World::new(),
            traffic,
            panel,
            backend,
            overrides,
            scheduler: Scheduler::new(),
            surface: SurfaceExtent::default(),
            events: Vec::new(),
            commands: Vec::new(),
        }
    }

    /// Advances the simulation by one render tick and repopulates the scene.
    pub(crate) fn frame(&mut self, dt: Duration, input: FrameInput, scene: &mut Scene) {
        self.apply_panel_input(input);

        self.events.clear();

        if scene.surface != self.surface {
            self.surface = scene.surface;
            world::apply(
                &mut self.world,
                Command::ConfigureSurface {
                    width: scene.surface.width,
                    height: scene.surface.height,
                },
                &mut self.events,
            );
        }

        world::apply(&mut self.world, Command::Tick { dt }, &mut self.events);

        let mut commands = mem::take(&mut self.commands);
        self.traffic.handle(&self.events, &mut commands);

        let work = self.scheduler.advance(dt);
        if work.render_frames > 1 {
            // The nominal render cadence is bounded by real rendering cost;
            // several completed periods in one frame means we fell behind.
            tracing::trace!(
                elapsed_periods = work.render_frames,
                "render tick running behind nominal cadence"
            );
        }
        if work.probe_dispatches > 0 {
            let payload = self.panel.payload();
            for _ in 0..work.probe_dispatches {
                self.traffic.dispatch_probe(&payload, &mut self.backend);
            }
        }

        for command in commands.drain(..) {
            world::apply(&mut self.world, command, &mut self.events);
        }
        self.commands = commands;

        for event in &self.events {
            if let Event::SpriteSpawned { variant, .. } = event {
                let _ = self
                    .panel
                    .observe_category(variant.category(), &self.overrides);
            }
        }

        self.populate_scene(scene);
    }

    /// Number of probes currently awaiting completion.
    pub(crate) fn in_flight(&self) -> usize {
        self.traffic.in_flight()
    }

    fn apply_panel_input(&mut self, input: FrameInput) {
        match input.panel {
            Some(PanelCommand::Select(category)) => {
                let _ = self.panel.select(category);
            }
            Some(PanelCommand::Adjust {
                return_500,
                delay_percent,
                delay_length,
            }) => {
                self.panel.adjust(SliderAdjustment {
                    return_500,
                    delay_percent,
                    delay_length,
                });
            }
            None => {}
        }
    }

    fn populate_scene(&self, scene: &mut Scene) {
        scene.sprites.clear();
        for snapshot in query::sprites(&self.world).iter() {
            scene.sprites.push(SpriteInstance::at(
                snapshot.variant,
                Vec2::new(snapshot.x, snapshot.y),
            ));
        }

        scene.bars.clear();
        scene.bars.extend(query::bars(&self.world).cloned());

        let current = self.panel.current_category();
        scene.panel = PanelView {
            entries: self
                .panel
                .entries()
                .iter()
                .map(|entry| PanelEntryView {
                    category: entry.category(),
                    return_500: entry.return_500(),
                    delay_percent: entry.delay_percent(),
                    delay_length: entry.delay_length(),
                    selected: Some(entry.category()) == current,
                })
                .collect(),
        };
    }
}

/// Drives the runtime without a window for a fixed number of nominal frames.
pub(crate) fn run_headless(mut runtime: Runtime, frames: u64) {
    let mut scene = Scene {
        surface: SurfaceExtent::new(1280.0, 720.0),
        ..Scene::default()
    };

    for _ in 0..frames {
        runtime.frame(FRAME_PERIOD, FrameInput::default(), &mut scene);
    }

    tracing::info!(
        frames,
        sprites = scene.sprites.len(),
        bars = scene.bars.len(),
        in_flight = runtime.in_flight(),
        "headless run complete"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use rollout_reef_core::{Category, SPRITE_ROSTER_CAPACITY};
    use rollout_reef_system_backend::{Config as BackendConfig, SimulatedBackend};
    use rollout_reef_system_traffic::Config as TrafficConfig;

    fn runtime(error_rate: u32, latency: f64) -> Runtime {
        let backend = SimulatedBackend::new(BackendConfig::new(
            Category::Blue,
            error_rate,
            latency,
            0xfee1_600d,
        ));
        Runtime::new(
            Traffic::new(TrafficConfig::new(0x0ddb_a11)),
            ControlPanel::new(),
            backend,
            EnvOverrides::default(),
        )
    }

    fn drive(runtime: &mut Runtime, scene: &mut Scene, frames: u32) {
        for _ in 0..frames {
            runtime.frame(FRAME_PERIOD, FrameInput::default(), scene);
        }
    }

    fn test_scene() -> Scene {
        Scene {
            surface: SurfaceExtent::new(1280.0, 720.0),
            ..Scene::default()
        }
    }

    #[test]
    fn a_few_simulated_seconds_stream_sprites_and_commit_bars() {
        let mut runtime = runtime(0, 0.0);
        let mut scene = test_scene();

        // 800 frames of 10ms = 8 simulated seconds: two histogram windows
        // and ~26 probes.
        drive(&mut runtime, &mut scene, 800);

        assert!(!scene.sprites.is_empty(), "probes must spawn sprites");
        assert!(scene.sprites.len() <= SPRITE_ROSTER_CAPACITY);
        assert!(
            scene.bars.len() >= 2,
            "two windows should have committed bars, saw {}",
            scene.bars.len()
        );

        let bar = scene.bars.last().expect("bar committed");
        assert_eq!(bar.segments().len(), 1);
        assert_eq!(bar.segments()[0].category, Category::Blue);
        assert!((bar.segments()[0].share - 1.0).abs() < 1e-6);
    }

    #[test]
    fn the_first_response_registers_and_selects_its_category() {
        let mut runtime = runtime(0, 0.0);
        let mut scene = test_scene();

        drive(&mut runtime, &mut scene, 100);

        assert_eq!(scene.panel.entries.len(), 1);
        let entry = &scene.panel.entries[0];
        assert_eq!(entry.category, Category::Blue);
        assert!(entry.selected, "first discovered category is selected");
    }

    #[test]
    fn panel_adjustments_flow_into_the_probe_payload() {
        let mut runtime = runtime(0, 0.0);
        let mut scene = test_scene();

        drive(&mut runtime, &mut scene, 100);
        assert!(!scene.panel.entries.is_empty());

        runtime.frame(
            FRAME_PERIOD,
            FrameInput {
                panel: Some(PanelCommand::Adjust {
                    return_500: 100,
                    delay_percent: 100,
                    delay_length: 0,
                }),
            },
            &mut scene,
        );
        assert_eq!(scene.panel.entries[0].return_500, 100);

        // With a forced error rate every subsequent outcome is a failure.
        drive(&mut runtime, &mut scene, 400);
        let bar = scene.bars.last().expect("bar committed after adjustment");
        let segment = bar
            .segments()
            .iter()
            .find(|segment| segment.category == Category::Blue)
            .expect("blue segment present");
        assert!(segment.err_share > 0.0, "forced failures must register");

        assert!(
            scene.sprites.iter().any(|sprite| sprite
                .variant
                .asset_name()
                .starts_with("darkblue")),
            "failures must render darkened sprites"
        );
    }

    #[test]
    fn injected_latency_keeps_probes_in_flight() {
        let mut runtime = runtime(0, 2.0);
        let mut scene = test_scene();

        // One simulated second: at least three probes dispatched, none of
        // which can have completed a two-second service time yet.
        drive(&mut runtime, &mut scene, 100);

        assert!(scene.sprites.is_empty(), "no completion before the delay");
        assert!(runtime.in_flight() >= 3);

        // After the delay elapses the backlog drains.
        drive(&mut runtime, &mut scene, 250);
        assert!(!scene.sprites.is_empty());
    }

    #[test]
    fn surface_changes_reconfigure_the_world_spawn_edge() {
        let mut runtime = runtime(0, 0.0);
        let mut scene = test_scene();
        drive(&mut runtime, &mut scene, 50);

        scene.surface = SurfaceExtent::new(640.0, 480.0);
        drive(&mut runtime, &mut scene, 50);

        let newest = scene.sprites.first().expect("sprite spawned");
        assert!(
            newest.position.x <= 640.0,
            "sprites must spawn at the new right edge"
        );
    }
}
