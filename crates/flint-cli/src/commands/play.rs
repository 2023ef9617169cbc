//! Play command - runs the demo scene headless
//!
//! A scripted platform stands in for the window. It presses the quit
//! binding's chord on the requested frame and counts the draw calls the
//! scene issues.

use super::{load_config, QUIT_BINDING};
use anyhow::{anyhow, Context, Result};
use flint_core::{Transform, Vec3};
use flint_ecs::{Component, ComponentContext, DrawCall, Entity, MeshHandle, RenderSurface};
use flint_runtime::{
    format_chord, Engine, EventManager, EventSource, KeyAction, KeyCode, Modifiers, Platform,
    WindowHandle,
};
use flint_scene::{MeshRenderer, OrbitCamera, Scene, TransformComponent};
use std::any::Any;
use std::cell::Cell;
use std::rc::Rc;

pub struct PlayArgs {
    pub config: Option<String>,
    pub frames: u32,
    pub fps: Option<f64>,
    pub speed: Option<f64>,
}

pub fn run(args: PlayArgs) -> Result<()> {
    let mut config = load_config(args.config.as_deref())?;
    if let Some(fps) = args.fps {
        config.timing.target_frame_rate = fps;
    }
    if let Some(speed) = args.speed {
        config.timing.game_speed = speed;
    }

    let mut engine = Engine::new(demo_scene());
    config
        .apply(&mut engine)
        .context("Failed to apply engine config")?;
    engine.stop_on_close_requested();

    let quit = engine
        .events()
        .input_map()
        .find(QUIT_BINDING)
        .ok_or_else(|| anyhow!("No '{}' binding configured", QUIT_BINDING))?;
    let (key, modifiers) = engine
        .events()
        .input_map()
        .chord(quit)
        .ok_or_else(|| anyhow!("The '{}' binding has no key", QUIT_BINDING))?;

    let stop = engine.stop_signal();
    if let Some(binding) = engine.events_mut().input_map_mut().key_bindings_mut().get_mut(quit) {
        binding.subscribe(move |event| {
            log::info!("Quit pressed ({})", format_chord(event.hotkey.key, event.hotkey.modifiers));
            stop.request();
            Ok(())
        });
    }

    let ticks = Rc::new(Cell::new(0u64));
    if let Some(timings) = engine.timing_mut().custom_timings_mut() {
        let t = ticks.clone();
        timings.get_or_create(1.0)?.subscribe(move |tick| {
            t.set(tick.fire_count);
            log::info!("{} second(s) of wall-clock time", tick.fire_count);
            Ok(())
        });
    }

    println!("Scene: {}", engine.scenes().template().name());
    println!("Entities: {}", engine.scenes().template().len());
    println!(
        "Quit: {} on frame {}",
        format_chord(key, modifiers),
        args.frames
    );
    println!();

    engine.scenes_mut().run()?;
    let mut platform = ScriptedPlatform::new(args.frames, key, modifiers);
    let frames = engine.run(&mut platform)?;
    engine.scenes_mut().stop();

    let timing = engine.timing();
    println!("Frames:       {}", frames);
    println!("Logical time: {:.3}s", timing.elapsed());
    println!("Wall time:    {:.3}s", timing.real_elapsed());
    println!("FPS:          {:.1}", timing.fps());
    println!("Draw calls:   {}", platform.draws.count);
    println!("Timer ticks:  {}", ticks.get());

    Ok(())
}

/// Template scene for the demo: a player, a prop, and a flare that burns out
/// after half a second of logical time.
fn demo_scene() -> Scene {
    let mut scene = Scene::new("demo");

    let mut player = Entity::new("player");
    player.add(TransformComponent::new(Transform::from_position(Vec3::ZERO)));
    player.add(MeshRenderer::new(MeshHandle(1)));
    scene.add(player);

    let mut crate_prop = Entity::new("crate");
    crate_prop.add(TransformComponent::new(
        Transform::from_position(Vec3::new(2.0, 0.0, 0.0)).with_scale(Vec3::new(0.5, 0.5, 0.5)),
    ));
    crate_prop.add(MeshRenderer::new(MeshHandle(2)));
    scene.add(crate_prop);

    let mut flare = Entity::new("flare");
    flare.add(TransformComponent::new(Transform::from_position(Vec3::UP)));
    flare.add(MeshRenderer::new(MeshHandle(3)));
    flare.add(Lifetime::new(0.5));
    scene.add(flare);

    scene
}

/// Counts down logical time, then disables itself and tags the entity [`Expired`]
#[derive(Clone, Debug)]
struct Lifetime {
    remaining: f64,
    expired: bool,
}

impl Lifetime {
    fn new(seconds: f64) -> Self {
        Self {
            remaining: seconds,
            expired: false,
        }
    }
}

impl Component for Lifetime {
    fn update(&mut self, ctx: &mut ComponentContext<'_>) {
        if self.expired {
            return;
        }
        self.remaining -= ctx.delta;
        if self.remaining <= 0.0 {
            self.expired = true;
            log::debug!("Lifetime on {} expired", ctx.entity);
            ctx.commands.set_enabled(ctx.component, false);
            ctx.commands.add(Expired);
        }
    }

    fn clone_component(&self) -> flint_core::Result<Box<dyn Component>> {
        Ok(Box::new(self.clone()))
    }

    fn can_have_multiple(&self) -> bool {
        false
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Marker left behind by an expired [`Lifetime`]
#[derive(Clone, Copy, Debug)]
struct Expired;

impl Component for Expired {
    fn clone_component(&self) -> flint_core::Result<Box<dyn Component>> {
        Ok(Box::new(*self))
    }

    fn can_have_multiple(&self) -> bool {
        false
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[derive(Default)]
struct DrawCounter {
    count: u64,
}

impl RenderSurface for DrawCounter {
    fn draw(&mut self, _call: DrawCall) {
        self.count += 1;
    }
}

/// Stands in for a window: presses the quit chord on a scripted frame and
/// slowly circles the scene
struct ScriptedPlatform {
    quit_frame: u32,
    key: KeyCode,
    modifiers: Modifiers,
    polls: u32,
    camera: OrbitCamera,
    draws: DrawCounter,
}

impl ScriptedPlatform {
    fn new(quit_frame: u32, key: KeyCode, modifiers: Modifiers) -> Self {
        Self {
            quit_frame: quit_frame.max(1),
            key,
            modifiers,
            polls: 0,
            camera: OrbitCamera::new(Vec3::ZERO, 8.0),
            draws: DrawCounter::default(),
        }
    }
}

impl EventSource for ScriptedPlatform {
    fn poll(&mut self, events: &mut EventManager) {
        const WINDOW: WindowHandle = WindowHandle(0);

        self.polls += 1;
        if self.polls == 1 {
            events.on_resize(WINDOW, 1280, 720);
            events.on_focus(WINDOW, true);
        }
        if self.polls == self.quit_frame {
            events.on_key(WINDOW, self.key, KeyAction::Press, self.modifiers);
            events.on_key(WINDOW, self.key, KeyAction::Release, self.modifiers);
        }
    }
}

impl Platform for ScriptedPlatform {
    fn render(&mut self, scene: &Scene) {
        self.camera.orbit(1.0, 0.0);
        scene.render(&self.camera, &mut self.draws);
    }
}
