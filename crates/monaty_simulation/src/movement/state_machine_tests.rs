//! Tests for MovementStateMachine (gait, transitions, essential values, rotation).

#[cfg(test)]
mod tests {
    use crate::config::CharacterConfig;
    use crate::movement::{
        GaitState, KinematicSample, MovementEvent, MovementState, MovementStateMachine, StanceState,
    };
    use crate::movement::state_machine::MAX_QUEUED_EVENTS;
    use crate::physics::{AuthoritativeMovementSolver, KinematicIntegrator, Role};
    use crate::shared::Rotator;
    use bevy::prelude::*;

    const DT: f32 = 1.0 / 60.0;

    fn machine() -> MovementStateMachine {
        MovementStateMachine::new(&CharacterConfig::default())
    }

    fn solver(role: Role) -> AuthoritativeMovementSolver {
        AuthoritativeMovementSolver::new(role, Box::new(KinematicIntegrator::default()))
    }

    /// Input под углом `yaw` к aim (aim = 0), amount = 0.95
    fn with_input_at_yaw(machine: &mut MovementStateMachine, yaw: f32) {
        let essentials = machine.essentials_mut();
        essentials.has_movement_input = true;
        essentials.movement_input_amount = 0.95;
        essentials.current_acceleration = Rotator::from_yaw(yaw).forward() * 1000.0;
        essentials.aiming_rotation = Rotator::ZERO;
    }

    fn idle_sample(control_yaw: f32) -> KinematicSample {
        KinematicSample {
            velocity: Vec3::ZERO,
            current_acceleration: Vec3::ZERO,
            max_acceleration: 800.0,
            control_rotation: Rotator::from_yaw(control_yaw),
            is_locally_controlled: true,
        }
    }

    #[test]
    fn test_actual_gait_hysteresis() {
        let mut machine = machine();
        let sprint_speed = machine.current_settings().sprint_speed;

        machine.essentials_mut().speed = sprint_speed;
        assert_eq!(machine.compute_actual_gait(), GaitState::Walking);

        machine.essentials_mut().speed = sprint_speed + 10.0;
        assert_eq!(machine.compute_actual_gait(), GaitState::Walking);

        machine.essentials_mut().speed = sprint_speed + 11.0;
        assert_eq!(machine.compute_actual_gait(), GaitState::Sprinting);
    }

    #[test]
    fn test_can_sprint_requires_movement_input() {
        let mut machine = machine();
        with_input_at_yaw(&mut machine, 0.0);
        machine.essentials_mut().has_movement_input = false;
        assert!(!machine.can_sprint());
    }

    #[test]
    fn test_can_sprint_yaw_tolerance() {
        let mut machine = machine();

        with_input_at_yaw(&mut machine, 49.0);
        assert!(machine.can_sprint());

        with_input_at_yaw(&mut machine, -49.0);
        assert!(machine.can_sprint());

        with_input_at_yaw(&mut machine, 51.0);
        assert!(!machine.can_sprint());
    }

    #[test]
    fn test_can_sprint_input_threshold() {
        let mut machine = machine();
        with_input_at_yaw(&mut machine, 0.0);
        machine.essentials_mut().movement_input_amount = 0.9;
        assert!(!machine.can_sprint());
    }

    #[test]
    fn test_allowed_gait() {
        let mut machine = machine();

        // Desired Walking → Walking независимо от input
        assert_eq!(machine.compute_allowed_gait(), GaitState::Walking);

        machine.set_desired_gait(GaitState::Sprinting);
        assert_eq!(machine.compute_allowed_gait(), GaitState::None);

        with_input_at_yaw(&mut machine, 10.0);
        assert_eq!(machine.compute_allowed_gait(), GaitState::Sprinting);

        // Crouching: desired как есть
        machine.set_stance(StanceState::Crouching);
        machine.essentials_mut().has_movement_input = false;
        assert_eq!(machine.compute_allowed_gait(), GaitState::Sprinting);
    }

    #[test]
    fn test_set_gait_is_idempotent() {
        let mut machine = machine();

        assert!(machine.set_gait(GaitState::Sprinting));
        assert!(machine.set_gait(GaitState::Walking));
        assert!(!machine.set_gait(GaitState::Walking));

        let events = machine.drain_events();
        assert_eq!(
            events,
            vec![
                MovementEvent::GaitChanged {
                    previous: GaitState::Walking,
                    current: GaitState::Sprinting,
                },
                MovementEvent::GaitChanged {
                    previous: GaitState::Sprinting,
                    current: GaitState::Walking,
                },
            ]
        );
        assert_eq!(machine.previous_gait(), GaitState::Sprinting);
        assert!(machine.drain_events().is_empty());
    }

    #[test]
    fn test_undrained_events_are_capped() {
        let mut machine = machine();

        // Без drain_events: очередь держит только последние MAX_QUEUED_EVENTS
        for i in 0..(MAX_QUEUED_EVENTS * 3) {
            let gait = if i % 2 == 0 { GaitState::Sprinting } else { GaitState::Walking };
            assert!(machine.set_gait(gait));
        }

        let events = machine.drain_events();
        assert_eq!(events.len(), MAX_QUEUED_EVENTS);
        assert_eq!(
            events.last(),
            Some(&MovementEvent::GaitChanged {
                previous: GaitState::Sprinting,
                current: GaitState::Walking,
            })
        );
        assert!(machine.drain_events().is_empty());
    }

    #[test]
    fn test_acceleration_halves_for_remote_without_input() {
        let mut machine = machine();
        machine.essentials_mut().acceleration = Vec3::new(100.0, -40.0, 0.0);

        let sample = KinematicSample {
            velocity: Vec3::new(300.0, 0.0, 0.0),
            is_locally_controlled: false,
            ..idle_sample(0.0)
        };
        machine.update_essential_values(DT, &sample);

        assert_eq!(machine.essentials().acceleration, Vec3::new(50.0, -20.0, 0.0));
    }

    #[test]
    fn test_acceleration_differentiates_when_local() {
        let mut machine = machine();
        machine.essentials_mut().acceleration = Vec3::new(100.0, 0.0, 0.0);

        let sample = KinematicSample {
            velocity: Vec3::new(6.0, 0.0, 0.0),
            ..idle_sample(0.0)
        };
        machine.update_essential_values(0.5, &sample);

        assert_eq!(machine.essentials().acceleration, Vec3::new(12.0, 0.0, 0.0));
        assert_eq!(machine.essentials().speed, 6.0);
        assert!(machine.essentials().is_moving);
        assert!(!machine.essentials().has_movement_input);
    }

    #[test]
    fn test_eased_max_acceleration_halves_for_remote() {
        let mut machine = machine();
        machine.essentials_mut().eased_max_acceleration = 800.0;

        let sample = KinematicSample {
            current_acceleration: Vec3::new(200.0, 0.0, 0.0),
            max_acceleration: 0.0,
            is_locally_controlled: false,
            ..idle_sample(0.0)
        };
        machine.update_essential_values(DT, &sample);

        let essentials = machine.essentials();
        assert_eq!(essentials.eased_max_acceleration, 400.0);
        assert_eq!(essentials.movement_input_amount, 0.5);
        assert!(essentials.has_movement_input);
    }

    #[test]
    fn test_speed_is_horizontal_only() {
        let mut machine = machine();
        let sample = KinematicSample {
            velocity: Vec3::new(0.0, 0.5, 500.0),
            ..idle_sample(0.0)
        };
        machine.update_essential_values(DT, &sample);

        assert_eq!(machine.essentials().speed, 0.5);
        assert!(!machine.essentials().is_moving);
        // Last velocity rotation не обновляется без движения
        assert_eq!(machine.essentials().last_velocity_rotation, Rotator::ZERO);
    }

    #[test]
    fn test_last_rotations_retained_after_stop() {
        let mut machine = machine();
        let moving = KinematicSample {
            velocity: Vec3::new(0.0, 200.0, 0.0),
            current_acceleration: Vec3::new(0.0, 800.0, 0.0),
            ..idle_sample(0.0)
        };
        machine.update_essential_values(DT, &moving);
        machine.update_essential_values(DT, &idle_sample(0.0));

        let essentials = machine.essentials();
        assert!(!essentials.is_moving);
        assert!(!essentials.has_movement_input);
        assert!((essentials.last_velocity_rotation.yaw - 90.0).abs() < 1e-4);
        assert!((essentials.last_movement_input_rotation.yaw - 90.0).abs() < 1e-4);
    }

    #[test]
    fn test_entering_in_air_captures_rotation_and_uncrouches() {
        let mut machine = machine();
        machine.set_movement_state(MovementState::Grounded);
        machine.set_stance(StanceState::Crouching);
        machine.drain_events();

        machine.essentials_mut().speed = 250.0;
        machine.essentials_mut().last_velocity_rotation = Rotator::from_yaw(45.0);
        machine.set_actor_and_target_rotation(Rotator::from_yaw(-30.0));

        assert!(machine.set_movement_state(MovementState::InAir));
        assert_eq!(machine.in_air_rotation().yaw, 45.0);
        assert_eq!(machine.stance(), StanceState::Standing);

        let events = machine.drain_events();
        assert_eq!(
            events,
            vec![
                MovementEvent::MovementStateChanged {
                    previous: MovementState::Grounded,
                    current: MovementState::InAir,
                },
                MovementEvent::StanceChanged {
                    previous: StanceState::Crouching,
                    current: StanceState::Standing,
                },
            ]
        );
    }

    #[test]
    fn test_slow_jump_keeps_actor_rotation() {
        let mut machine = machine();
        machine.essentials_mut().speed = 50.0;
        machine.essentials_mut().last_velocity_rotation = Rotator::from_yaw(45.0);
        machine.set_actor_and_target_rotation(Rotator::from_yaw(-30.0));

        machine.on_jumped();
        assert_eq!(machine.in_air_rotation().yaw, -30.0);
    }

    #[test]
    fn test_idle_rotation_pulled_into_band() {
        let mut machine = machine();
        let mut solver = solver(Role::LocalPredicted);
        machine.set_movement_state(MovementState::Grounded);
        machine.set_actor_and_target_rotation(Rotator::from_yaw(170.0));

        for _ in 0..60 {
            machine.update(DT, &idle_sample(0.0), &mut solver);
        }

        let delta = machine.essentials().aiming_rotation.delta(machine.actor_rotation()).yaw;
        assert!(delta.abs() <= 100.0 + 1e-3, "delta = {}", delta);
        assert_eq!(machine.movement_state(), MovementState::Grounded);
    }

    #[test]
    fn test_idle_rotation_inside_band_untouched() {
        let mut machine = machine();
        let mut solver = solver(Role::LocalPredicted);
        machine.set_movement_state(MovementState::Grounded);
        machine.set_actor_and_target_rotation(Rotator::from_yaw(60.0));

        for _ in 0..60 {
            machine.update(DT, &idle_sample(0.0), &mut solver);
        }
        assert_eq!(machine.actor_rotation().yaw, 60.0);
    }

    #[test]
    fn test_moving_rotation_follows_aim() {
        let mut machine = machine();
        let mut solver = solver(Role::LocalPredicted);
        machine.set_movement_state(MovementState::Grounded);

        let sample = KinematicSample {
            velocity: Vec3::new(0.0, 165.0, 0.0),
            current_acceleration: Vec3::new(0.0, 800.0, 0.0),
            ..idle_sample(90.0)
        };
        for _ in 0..120 {
            machine.update(DT, &sample, &mut solver);
        }

        assert!((machine.actor_rotation().yaw - 90.0).abs() < 1.0, "{:?}", machine.actor_rotation());
    }

    #[test]
    fn test_in_air_rotation_target() {
        let mut machine = machine();
        let mut solver = solver(Role::LocalPredicted);
        machine.essentials_mut().speed = 300.0;
        machine.essentials_mut().last_velocity_rotation = Rotator::from_yaw(-90.0);
        machine.set_movement_state(MovementState::InAir);

        let airborne = KinematicSample {
            velocity: Vec3::new(0.0, -300.0, 0.0),
            ..idle_sample(0.0)
        };
        for _ in 0..180 {
            machine.update(DT, &airborne, &mut solver);
        }
        assert!((machine.actor_rotation().yaw + 90.0).abs() < 1.0, "{:?}", machine.actor_rotation());
    }

    #[test]
    fn test_stance_toggle_gating() {
        let mut machine = machine();

        // Не на земле: отказ
        assert!(!machine.toggle_stance());

        machine.set_movement_state(MovementState::Grounded);
        machine.set_gait(GaitState::Sprinting);
        assert!(!machine.toggle_stance());

        machine.set_gait(GaitState::Walking);
        assert!(machine.toggle_stance());
        assert_eq!(machine.stance(), StanceState::Crouching);
        assert_eq!(machine.desired_stance(), StanceState::Crouching);
        assert!(machine.stance_timeline().is_playing());
    }

    #[test]
    fn test_stance_alpha_follows_timeline() {
        let mut machine = machine();
        let mut solver = solver(Role::Remote);
        machine.set_movement_state(MovementState::Grounded);
        machine.toggle_stance();

        for _ in 0..15 {
            machine.update(DT, &idle_sample(0.0), &mut solver);
        }
        assert!((machine.stance_alpha() - 1.0).abs() < 1e-4);

        machine.toggle_stance();
        for _ in 0..15 {
            machine.update(DT, &idle_sample(0.0), &mut solver);
        }
        assert!(machine.stance_alpha().abs() < 1e-4);
    }

    #[test]
    fn test_grounded_update_pushes_settings_to_solver() {
        let mut machine = machine();
        let mut solver = solver(Role::Remote);
        machine.set_movement_state(MovementState::Grounded);
        machine.set_desired_gait(GaitState::Sprinting);

        // Без input спринт не разрешён → walk speed
        machine.update(DT, &idle_sample(0.0), &mut solver);
        assert_eq!(solver.max_walk_speed(), 165.0);
        assert_eq!(solver.settings().sprint_speed, 375.0);

        let sprinting = KinematicSample {
            current_acceleration: Vec3::new(800.0, 0.0, 0.0),
            ..idle_sample(0.0)
        };
        machine.update(DT, &sprinting, &mut solver);
        assert_eq!(solver.max_walk_speed(), 375.0);

        // Crouch → crouching settings
        machine.set_gait(GaitState::Walking);
        machine.set_desired_gait(GaitState::Walking);
        machine.toggle_stance();
        machine.update(DT, &idle_sample(0.0), &mut solver);
        assert_eq!(solver.settings().walk_speed, 150.0);
        assert_eq!(solver.max_walk_speed(), 150.0);
    }
}
