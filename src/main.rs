//! Bullet Box entry point
//!
//! Headless driver: loads settings (optional JSON path argument), fires a
//! volley at the target, runs the frame loop against a simulated 60 Hz host
//! clock and prints the final snapshot as JSON.

#[cfg(not(target_arch = "wasm32"))]
fn main() -> Result<(), Box<dyn std::error::Error>> {
    use bullet_box::SimSettings;

    env_logger::init();
    log::info!("Bullet Box (native) starting...");

    let settings = match std::env::args().nth(1) {
        Some(path) => SimSettings::load(path)?,
        None => SimSettings::default(),
    };

    let snapshot = headless::run(&settings, 5.0)?;
    println!("{}", serde_json::to_string_pretty(&snapshot)?);
    Ok(())
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // The engine is a library on the web; the host page drives it
}

#[cfg(not(target_arch = "wasm32"))]
mod headless {
    use bullet_box::sim::{NewProjectile, Simulation, Snapshot};
    use bullet_box::{CollisionMode, SimSettings};
    use glam::Vec2;

    /// Host redraw interval
    const FRAME: f64 = 1.0 / 60.0;

    /// Run a scripted volley for `seconds` of host time
    pub fn run(settings: &SimSettings, seconds: f64) -> Result<Snapshot, bullet_box::sim::CommandError> {
        let mut sim = Simulation::new(settings);
        let lane_y = settings.canvas_height * 0.5;

        // Slow, medium and fast shots from the left edge
        for (i, speed) in [60.0, 180.0, 400.0].into_iter().enumerate() {
            let y = lane_y + (i as f32 - 1.0) * 40.0;
            sim.add_projectile(NewProjectile::at(Vec2::new(30.0, y), Vec2::new(speed, 0.0)));
        }
        sim.start()?;
        log::info!(
            "Firing {} projectiles in {} mode",
            sim.world().projectiles.len(),
            match sim.mode() {
                CollisionMode::Bullet => "bullet",
                CollisionMode::Collision => "collision",
            }
        );

        let mut now = 0.0;
        let mut next_report = 1.0;
        while now <= seconds {
            if let Some(token) = sim.request_frame() {
                sim.on_frame(token, now);
            }
            if now >= next_report {
                let telemetry = sim.telemetry();
                log::info!(
                    "t={:.1}s collisions={} peak impulse={:.2} target={:?}",
                    now,
                    telemetry.collision_count,
                    telemetry.impulse,
                    sim.world().target.state()
                );
                next_report += 1.0;
            }
            now += FRAME;
        }

        sim.pause();
        Ok(sim.snapshot())
    }
}
