//! Headless demo: builds a noise terrain, spawns two opposing units and
//! plays out a move order followed by an attack under jittered frame times.
//!
//! Usage: `heightfield-rts [settings.json] [seed]`

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use heightfield_rts::camera::FrameInput;
use heightfield_rts::sim::{EntityId, Team};
use heightfield_rts::terrain::HeightImage;
use heightfield_rts::{Session, Settings};

const MAP_SIZE: usize = 64;
/// Lattice spacing of the value noise, in pixels
const NOISE_CELL: usize = 16;
const DEFAULT_SEED: u64 = 0x5eed;
const MAX_FRAMES: usize = 5000;

fn main() {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let settings = match args.next() {
        Some(path) => Settings::load_or_default(path),
        None => Settings::default(),
    };
    let seed = args
        .next()
        .and_then(|s| s.parse().ok())
        .unwrap_or(DEFAULT_SEED);

    log::info!("Heightfield RTS demo starting (seed {})", seed);
    let mut rng = Pcg32::seed_from_u64(seed);

    let heightmap = match noise_heightmap(&mut rng) {
        Ok(image) => image,
        Err(e) => {
            log::error!("Heightmap generation failed: {}", e);
            std::process::exit(1);
        }
    };
    let mut session = match Session::new(settings, &heightmap) {
        Ok(session) => session,
        Err(e) => {
            log::error!("Session setup failed: {}", e);
            std::process::exit(1);
        }
    };

    let player = session.spawn_unit(Team::Player, Vec2::ZERO);
    let enemy = session.spawn_unit(Team::Ai, Vec2::new(0.0, 10.0));
    session.world_mut().selection_mut().select_only(player);

    session.world_mut().order_move(Vec2::new(0.0, 5.0));
    let frames = run_until(&mut session, &mut rng, |s| {
        s.world().get(player).is_some_and(|e| !e.state.is_moving())
    });
    report(&session, player, "player after move", frames);

    session.world_mut().order_attack(enemy);
    let frames = run_until(&mut session, &mut rng, |s| {
        s.world().get(enemy).is_none_or(|e| e.state.is_dead())
    });
    report(&session, enemy, "enemy after attack", frames);

    log::info!(
        "Done after {} ticks, camera eye at {}",
        session.world().time_ticks,
        session.camera().eye()
    );
}

/// Step frames of jittered length until `done` holds or the frame budget runs out
fn run_until(session: &mut Session, rng: &mut Pcg32, done: impl Fn(&Session) -> bool) -> usize {
    let mut frames = 0;
    while !done(session) && frames < MAX_FRAMES {
        let input = FrameInput {
            dt: rng.random_range(0.008..0.03),
            ..Default::default()
        };
        session.frame(&input);
        frames += 1;
    }
    frames
}

fn report(session: &Session, id: EntityId, label: &str, frames: usize) {
    match session.world().get(id) {
        Some(e) => log::info!(
            "{} ({} frames): position {}, hit points {}, state {:?}",
            label,
            frames,
            e.position,
            e.hit_points,
            e.state
        ),
        None => log::warn!("{}: entity {:?} is gone", label, id),
    }
}

/// Smoothed value noise on a coarse random lattice
fn noise_heightmap(rng: &mut Pcg32) -> Result<HeightImage, heightfield_rts::terrain::TerrainError> {
    let lattice = MAP_SIZE / NOISE_CELL + 1;
    let values: Vec<f32> = (0..lattice * lattice).map(|_| rng.random::<f32>()).collect();
    let at = |x: usize, z: usize| values[z * lattice + x];
    let smooth = |t: f32| t * t * (3.0 - 2.0 * t);

    let mut gray = Vec::with_capacity(MAP_SIZE * MAP_SIZE);
    for z in 0..MAP_SIZE {
        for x in 0..MAP_SIZE {
            let (cx, cz) = (x / NOISE_CELL, z / NOISE_CELL);
            let tx = smooth((x % NOISE_CELL) as f32 / NOISE_CELL as f32);
            let tz = smooth((z % NOISE_CELL) as f32 / NOISE_CELL as f32);
            let top = at(cx, cz) + (at(cx + 1, cz) - at(cx, cz)) * tx;
            let bottom = at(cx, cz + 1) + (at(cx + 1, cz + 1) - at(cx, cz + 1)) * tx;
            let value = top + (bottom - top) * tz;
            gray.push((value * 255.0) as u8);
        }
    }
    HeightImage::from_gray(MAP_SIZE, MAP_SIZE, &gray)
}
