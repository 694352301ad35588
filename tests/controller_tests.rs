//! FrameController tests

#[cfg(test)]
mod tests {
    use glam::{Vec2, Vec3};
    use terrain_roam::{
        animation::Animator,
        broadcast::{NullSink, RecordingSink},
        controller::FrameController,
        input::{InputEvent, Trigger},
        locomotion::MoveOutcome,
        protocol::encode_position,
        query::{CollideMask, CollisionHit, GroundQueryResult, SpatialQuery},
        types::{AnimationState, ControllerConfig, WireFormat},
    };

    /// Rolling hills, terrain everywhere.
    struct Hills;

    impl SpatialQuery for Hills {
        fn cast_down(&self, origin: Vec3, _mask: CollideMask) -> GroundQueryResult {
            let h = (origin.x * 0.2).sin() * 2.0 + (origin.y * 0.15).cos() * 1.5;
            GroundQueryResult::from_hits(vec![CollisionHit::terrain(Vec3::new(
                origin.x, origin.y, h,
            ))])
        }
    }

    struct Flat(f32);

    impl SpatialQuery for Flat {
        fn cast_down(&self, origin: Vec3, _mask: CollideMask) -> GroundQueryResult {
            GroundQueryResult::from_hits(vec![CollisionHit::terrain(Vec3::new(
                origin.x, origin.y, self.0,
            ))])
        }
    }

    #[derive(Default)]
    struct Clips {
        calls: Vec<String>,
    }

    impl Animator for Clips {
        fn play_loop(&mut self, clip: &str, rate: f32) {
            self.calls.push(format!("loop {clip} {rate}"));
        }
        fn stop(&mut self) {
            self.calls.push("stop".into());
        }
        fn pose(&mut self, clip: &str, frame: u32) {
            self.calls.push(format!("pose {clip} {frame}"));
        }
    }

    fn planar_distance(a: Vec3, b: Vec3) -> f32 {
        Vec2::new(a.x - b.x, a.y - b.y).length()
    }

    // -----------------------------------------------------------------------
    // Fixed point
    // -----------------------------------------------------------------------

    #[test]
    fn idle_ticks_do_not_drift() {
        let (mut ctl, _input) = FrameController::new(ControllerConfig::default(), Vec3::ZERO);
        let ground = Flat(0.0);
        let mut anim = Clips::default();
        let mut sink = RecordingSink::default();

        ctl.tick(0.016, &ground, &mut anim, &mut sink);
        let avatar = *ctl.avatar();
        let camera = ctl.camera().clone();

        for _ in 0..50 {
            let report = ctl.tick(0.016, &ground, &mut anim, &mut sink);
            assert_eq!(report.movement, MoveOutcome::Accepted { height: 0.0 });
        }

        assert_eq!(*ctl.avatar(), avatar);
        assert_eq!(ctl.camera().position, camera.position);
        assert_eq!(ctl.camera().target, camera.target);
        assert_eq!(ctl.avatar().animation, AnimationState::Idle);
        assert!(anim.calls.is_empty());
        assert!(sink.messages.is_empty());
    }

    // -----------------------------------------------------------------------
    // Broadcast
    // -----------------------------------------------------------------------

    #[test]
    fn broadcast_fires_on_the_seventh_moving_tick_with_committed_position() {
        let (mut ctl, input) = FrameController::new(ControllerConfig::default(), Vec3::ZERO);
        let ground = Hills;
        let mut anim = Clips::default();
        let mut sink = RecordingSink::default();

        input.send(InputEvent::Press(Trigger::Forward));
        for _ in 0..6 {
            let report = ctl.tick(0.02, &ground, &mut anim, &mut sink);
            assert!(report.broadcast.is_none());
        }
        assert_eq!(ctl.broadcast_counter(), 6);

        let report = ctl.tick(0.02, &ground, &mut anim, &mut sink);
        let expected = encode_position(WireFormat::Legacy, ctl.avatar().position);

        assert_eq!(report.broadcast.as_deref(), Some(expected.as_str()));
        assert!(expected.starts_with(r#"{"character : "["#));
        assert_eq!(sink.messages, vec![expected]);
        assert_eq!(ctl.broadcast_counter(), 0);
        assert_eq!(ctl.stats().broadcasts, 1);
    }

    #[test]
    fn idle_avatar_never_broadcasts() {
        let (mut ctl, _input) = FrameController::new(ControllerConfig::default(), Vec3::ZERO);
        let mut sink = RecordingSink::default();
        for _ in 0..30 {
            ctl.tick(0.02, &Flat(0.0), &mut Clips::default(), &mut sink);
        }
        assert!(sink.messages.is_empty());
    }

    #[test]
    fn json_wire_format_is_used_when_configured() {
        let mut config = ControllerConfig::default();
        config.broadcast.wire_format = WireFormat::Json;
        let (mut ctl, input) = FrameController::new(config, Vec3::ZERO);
        let mut sink = RecordingSink::default();

        input.send(InputEvent::Press(Trigger::Left));
        for _ in 0..7 {
            ctl.tick(0.02, &Flat(0.0), &mut Clips::default(), &mut sink);
        }
        assert_eq!(sink.messages, vec![r#"{"character":[0.0,0.0,0.0]}"#.to_string()]);
    }

    // -----------------------------------------------------------------------
    // Animation
    // -----------------------------------------------------------------------

    #[test]
    fn animation_edges_follow_movement_triggers() {
        let (mut ctl, input) = FrameController::new(ControllerConfig::default(), Vec3::ZERO);
        let mut anim = Clips::default();

        input.send(InputEvent::Press(Trigger::Forward));
        let r1 = ctl.tick(0.02, &Flat(0.0), &mut anim, &mut NullSink);
        let r2 = ctl.tick(0.02, &Flat(0.0), &mut anim, &mut NullSink);
        input.send(InputEvent::Release(Trigger::Forward));
        let r3 = ctl.tick(0.02, &Flat(0.0), &mut anim, &mut NullSink);

        assert_eq!(r1.transition, Some(AnimationState::Moving));
        assert_eq!(r2.transition, None);
        assert_eq!(r3.transition, Some(AnimationState::Idle));
        assert_eq!(anim.calls, vec!["loop run 1.3", "stop", "pose walk 5"]);
    }

    // -----------------------------------------------------------------------
    // Zoom
    // -----------------------------------------------------------------------

    #[test]
    fn one_zoom_press_is_one_step() {
        let (mut ctl, input) = FrameController::new(ControllerConfig::default(), Vec3::ZERO);
        let ground = Flat(0.0);

        input.send(InputEvent::Press(Trigger::CamZoomUp));
        let report = ctl.tick(0.1, &ground, &mut Clips::default(), &mut NullSink);
        assert_eq!(report.zoom_change, -1);
        assert_eq!(ctl.camera().zoom_level, 9);

        let report = ctl.tick(0.1, &ground, &mut Clips::default(), &mut NullSink);
        assert_eq!(report.zoom_change, 0);
        assert_eq!(ctl.camera().zoom_level, 9);

        input.send(InputEvent::Press(Trigger::CamZoomUp));
        ctl.tick(0.1, &ground, &mut Clips::default(), &mut NullSink);
        assert_eq!(ctl.camera().zoom_level, 8);
    }

    #[test]
    fn zoom_press_at_the_bound_is_still_consumed() {
        let mut config = ControllerConfig::default();
        config.camera.initial_zoom = 1;
        let (mut ctl, input) = FrameController::new(config, Vec3::ZERO);
        let ground = Flat(0.0);

        input.send(InputEvent::Press(Trigger::CamZoomUp));
        ctl.tick(0.1, &ground, &mut Clips::default(), &mut NullSink);
        input.send(InputEvent::Press(Trigger::CamZoomDown));
        ctl.tick(0.1, &ground, &mut Clips::default(), &mut NullSink);

        // The stale zoom-up press must not fire once zoom leaves the bound.
        let report = ctl.tick(0.1, &ground, &mut Clips::default(), &mut NullSink);
        assert_eq!(report.zoom_change, 0);
        assert_eq!(ctl.camera().zoom_level, 2);
    }

    // -----------------------------------------------------------------------
    // Drag
    // -----------------------------------------------------------------------

    #[test]
    fn drag_session_lives_until_release() {
        let (mut ctl, input) = FrameController::new(ControllerConfig::default(), Vec3::ZERO);
        let ground = Flat(0.0);

        input.send(InputEvent::Press(Trigger::CamMulti));
        input.send(InputEvent::Pointer(Vec2::new(40.0, 10.0)));
        let report = ctl.tick(0.02, &ground, &mut Clips::default(), &mut NullSink);
        assert_eq!(report.pointer_telemetry.as_deref(), Some(r#"{"mouse : "[40.0, 10.0]}"#));
        assert!(ctl.camera().drag.is_some());

        let report = ctl.tick(0.02, &ground, &mut Clips::default(), &mut NullSink);
        assert_eq!(report.pointer_telemetry, None);

        input.send(InputEvent::Press(Trigger::CamMultiEnd));
        input.send(InputEvent::Pointer(Vec2::new(90.0, 10.0)));
        let report = ctl.tick(0.02, &ground, &mut Clips::default(), &mut NullSink);
        assert_eq!(report.pointer_telemetry, None);
        assert!(ctl.camera().drag.is_none());

        // Both triggers were cleared; pointer motion no longer drags.
        input.send(InputEvent::Pointer(Vec2::new(10.0, 10.0)));
        let report = ctl.tick(0.02, &ground, &mut Clips::default(), &mut NullSink);
        assert_eq!(report.pointer_telemetry, None);
        assert!(ctl.camera().drag.is_none());
    }

    #[test]
    fn lone_drag_end_press_stays_latched() {
        let (mut ctl, input) = FrameController::new(ControllerConfig::default(), Vec3::ZERO);
        let ground = Flat(0.0);

        input.send(InputEvent::Press(Trigger::CamMultiEnd));
        ctl.tick(0.02, &ground, &mut Clips::default(), &mut NullSink);

        // The latched end press cancels the next drag in its first tick.
        input.send(InputEvent::Press(Trigger::CamMulti));
        input.send(InputEvent::Pointer(Vec2::new(40.0, 10.0)));
        let report = ctl.tick(0.02, &ground, &mut Clips::default(), &mut NullSink);
        assert_eq!(report.pointer_telemetry, None);
        assert!(ctl.camera().drag.is_none());

        // Both were cleared, so a second press drags normally.
        input.send(InputEvent::Press(Trigger::CamMulti));
        input.send(InputEvent::Pointer(Vec2::new(60.0, 10.0)));
        let report = ctl.tick(0.02, &ground, &mut Clips::default(), &mut NullSink);
        assert!(report.pointer_telemetry.is_some());
        assert!(ctl.camera().drag.is_some());
    }

    // -----------------------------------------------------------------------
    // Camera frame
    // -----------------------------------------------------------------------

    #[test]
    fn overshooting_zoom_does_not_flip_the_orbit() {
        let (mut ctl, input) = FrameController::new(ControllerConfig::default(), Vec3::ZERO);
        ctl.camera_mut().position = Vec3::new(0.0, 5.0, 2.0);

        // Looking down -Y the right hand points at -X; the zoom step passes
        // the aim point, cam-right must still head for -X.
        input.send(InputEvent::Press(Trigger::CamZoomUp));
        input.send(InputEvent::Press(Trigger::CamRight));
        ctl.tick(0.1, &Flat(0.0), &mut Clips::default(), &mut NullSink);

        assert!(ctl.camera().position.x < -2.0, "camera at {:?}", ctl.camera().position);
    }

    #[test]
    fn inverted_zoom_bounds_do_not_panic_at_spawn() {
        let mut config = ControllerConfig::default();
        config.camera.min_zoom = 20;
        let (ctl, _input) = FrameController::new(config, Vec3::ZERO);
        assert_eq!(ctl.camera().zoom_level, 16);
        assert_eq!(ctl.config().camera.min_zoom, 20);
    }

    #[test]
    fn forward_follows_an_externally_set_heading() {
        let (mut ctl, input) = FrameController::new(ControllerConfig::default(), Vec3::ZERO);
        ctl.avatar_mut().heading = 90.0;

        input.send(InputEvent::Press(Trigger::Forward));
        ctl.tick(0.1, &Flat(0.0), &mut Clips::default(), &mut NullSink);

        let p = ctl.avatar().position;
        assert!((p - Vec3::new(2.5, 0.0, 0.0)).length() < 1e-4, "avatar at {p:?}");
    }

    // -----------------------------------------------------------------------
    // Invariants
    // -----------------------------------------------------------------------

    #[test]
    fn camera_bounds_hold_for_a_long_mixed_session() {
        let (mut ctl, input) = FrameController::new(ControllerConfig::default(), Vec3::ZERO);
        let ground = Hills;
        let mut anim = Clips::default();
        let script = [
            Trigger::Forward,
            Trigger::CamZoomUp,
            Trigger::Left,
            Trigger::CamLeft,
            Trigger::Backward,
            Trigger::CamZoomDown,
            Trigger::Right,
            Trigger::CamRight,
            Trigger::CamMulti,
        ];

        for step in 0..600usize {
            let trigger = script[step % script.len()];
            if step % 3 == 0 {
                input.send(InputEvent::Press(trigger));
            } else if step % 7 == 0 {
                input.send(InputEvent::Release(trigger));
            }
            input.send(InputEvent::Pointer(Vec2::new((step * 13 % 400) as f32, 0.0)));

            let dt = [0.008, 0.016, 0.033, 0.1][step % 4];
            ctl.tick(dt, &ground, &mut anim, &mut NullSink);

            let cam = ctl.camera();
            let avatar = ctl.avatar();
            let d = planar_distance(cam.position, avatar.position);
            assert!((5.0 - 1e-3..=20.0 + 1e-3).contains(&d), "distance {d} at step {step}");
            assert!((1..=16).contains(&cam.zoom_level));
            assert!(cam.position.z >= avatar.position.z + 2.0 - 1e-4);

            let below = Hills.cast_down(cam.position, CollideMask::GROUND).hits()[0].height();
            assert!(cam.position.z >= below + 1.0 - 1e-4);
        }
    }

    #[test]
    fn tick_reports_count_up_and_stats_track_moves() {
        let (mut ctl, input) = FrameController::new(ControllerConfig::default(), Vec3::ZERO);
        input.send(InputEvent::Press(Trigger::Forward));
        for n in 1..=5 {
            let report = ctl.tick(0.02, &Flat(1.0), &mut Clips::default(), &mut NullSink);
            assert_eq!(report.tick, n);
        }
        let stats = ctl.stats();
        assert_eq!(stats.total_ticks, 5);
        assert_eq!(stats.accepted_moves, 5);
        assert_eq!(stats.rollbacks, 0);
        assert_eq!(ctl.avatar().position.z, 1.0);
    }

    // -----------------------------------------------------------------------
    // Exit
    // -----------------------------------------------------------------------

    #[test]
    fn exit_event_is_reported() {
        let (mut ctl, input) = FrameController::new(ControllerConfig::default(), Vec3::ZERO);
        let report = ctl.tick(0.02, &Flat(0.0), &mut Clips::default(), &mut NullSink);
        assert!(!report.exit_requested);

        input.send(InputEvent::Exit);
        let report = ctl.tick(0.02, &Flat(0.0), &mut Clips::default(), &mut NullSink);
        assert!(report.exit_requested);
    }
}
