//! Headless симуляция Tenet
//!
//! Сценарий без хоста: выстрел по укрытию → inversion → обратный выстрел
//! забирает пулю, укрытие собирается обратно.

use bevy::prelude::*;
use tenet_simulation::combat::ProjectileHit;
use tenet_simulation::cover::{CoverConfig, RebuildKeyframe};
use tenet_simulation::inversion::{InversionRequested, InversionVolumeEntered, LevelStarted};
use tenet_simulation::spatial::StaticOracle;
use tenet_simulation::weapon::{TriggerPulled, WeaponSwapRequested};
use tenet_simulation::*;

/// Тиков на секунду симуляции
const TICKS_PER_SECOND: usize = 60;

fn run_seconds(app: &mut App, seconds: f32) {
    for _ in 0..(seconds * TICKS_PER_SECOND as f32) as usize {
        app.update();
    }
}

fn report(app: &App, pistol: Entity, cover: Entity, label: &str) {
    let world = app.world();
    let session = world.resource::<Session>();
    let markers = world.resource::<HistoryMarkers>();
    let (Some(weapon), Some(cover)) = (world.get::<Weapon>(pistol), world.get::<DestructibleCover>(cover)) else {
        return;
    };
    println!(
        "[{}] state {:?}, clip {}/{}, spare {}, markers {}, cover {:?}",
        label,
        session.current(),
        weapon.ammo().current_count(),
        weapon.ammo().clip_count(),
        weapon.ammo().spare_count(),
        markers.len(),
        cover.state()
    );
}

fn main() {
    let seed = 42;
    println!("Starting Tenet headless simulation (seed: {})", seed);

    let mut app = create_headless_app(seed);
    app.add_plugins(SimulationPlugin);

    let cover_position = Vec3::new(0.0, 0.0, -6.0);
    let cover_config = CoverConfig {
        base_duration: 2.0,
        keyframes: vec![RebuildKeyframe::new(0.0, 0.25, 2.0), RebuildKeyframe::new(0.5, 0.25, 0.5)],
        target_duration: None,
        damage_filter: DamageTypeFlags::everything(),
    };
    let cover_component = match DestructibleCover::from_config(&cover_config) {
        Ok(cover) => cover,
        Err(error) => {
            eprintln!("Invalid cover config: {}", error);
            return;
        }
    };

    let world = app.world_mut();
    let player = world
        .spawn((
            Transform::default(),
            Faction::Player,
            Health::new(100.0),
            HealCooldown::default(),
            HistoryTarget::default(),
        ))
        .id();
    let pistol = world
        .spawn(
            Weapon::new(player, "pistol", Ammo::new(DamageType::Normal, 15, 30))
                .with_muzzle(AimOrigin::new(Vec3::new(0.0, 0.0, -0.5), Vec3::NEG_Z)),
        )
        .id();
    world.entity_mut(player).insert(Loadout::new(vec![pistol]));
    let cover = world
        .spawn((Transform::from_translation(cover_position), cover_component))
        .id();

    world.resource_mut::<Session>().set_player(player);
    world.insert_resource(SpatialOracleHandle::new(
        StaticOracle::new()
            .with_ray_hit(cover_position, Some(cover))
            .with_collider(cover, cover_position, 1.0),
    ));

    app.world_mut().send_event(LevelStarted);
    app.world_mut().send_event(WeaponSwapRequested {
        shooter: player,
        index: Some(0),
    });
    // Blackout после доставания оружия
    run_seconds(&mut app, 1.0);
    report(&app, pistol, cover, "ready");

    // Normal: выстрел, хост докладывает попадание в укрытие
    app.world_mut().send_event(TriggerPulled { shooter: player });
    app.update();
    app.world_mut().send_event(ProjectileHit {
        weapon: pistol,
        mode: 0,
        hit_entity: Some(cover),
        point: cover_position,
        reversed: false,
    });
    run_seconds(&mut app, 1.0);
    report(&app, pistol, cover, "shot");

    // Turnstile → Inverted
    app.world_mut().send_event(InversionVolumeEntered {
        target_state: InversionState::Inverted,
        collider: player,
    });
    app.world_mut().send_event(InversionRequested);
    app.update();

    // Обратный выстрел забирает пулю из укрытия
    app.world_mut().send_event(TriggerPulled { shooter: player });
    app.update();
    report(&app, pistol, cover, "un-shot");

    run_seconds(&mut app, 3.0);
    report(&app, pistol, cover, "rebuilt");

    println!("Simulation complete!");
}
