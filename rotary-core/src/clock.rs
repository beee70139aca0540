/// Animation clock: running/stopped state machine driving the kinematic
/// solver from a host loop, one step at a time.
///
/// The host calls [`AnimationClock::poll`] from its event loop. Each fired
/// step re-arms the ticker only after it has finished, so steps never
/// overlap. Stopping only clears the running flag; a tick that was already
/// armed still fires once, sees the flag and does nothing.
use std::time::{Duration, Instant};

use tracing::info;

use crate::config::{MAX_DEGREES_PER_STEP, MIN_DEGREES_PER_STEP};
use crate::kinematics::KinematicSolver;
use crate::registry::PartRegistry;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AssemblyState {
    /// Accumulated shaft phase in degrees, never wrapped
    pub theta: f64,
    /// Phase increment per step in degrees
    pub delta: f64,
    pub running: bool,
    pub exploded: bool,
}

/// One-shot deadline, re-armed by its owner after each firing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticker {
    delay: Duration,
    deadline: Option<Instant>,
}

impl Ticker {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            deadline: None,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn set_delay(&mut self, delay: Duration) {
        self.delay = delay;
    }

    pub fn arm(&mut self, now: Instant) {
        self.deadline = Some(now + self.delay);
    }

    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    /// Consume the deadline if it has passed
    pub fn take_due(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AnimationClock {
    state: AssemblyState,
    solver: KinematicSolver,
    ticker: Ticker,
    steps: u64,
}

impl AnimationClock {
    pub fn new(solver: KinematicSolver, delta: f64, delay: Duration) -> Self {
        Self {
            state: AssemblyState {
                theta: 0.0,
                delta: clamp_speed(delta),
                running: false,
                exploded: false,
            },
            solver,
            ticker: Ticker::new(delay),
            steps: 0,
        }
    }

    pub fn state(&self) -> &AssemblyState {
        &self.state
    }

    pub fn solver(&self) -> &KinematicSolver {
        &self.solver
    }

    pub fn is_running(&self) -> bool {
        self.state.running
    }

    /// Steps taken since the clock was created
    pub fn steps(&self) -> u64 {
        self.steps
    }

    pub fn is_scheduled(&self) -> bool {
        self.ticker.is_armed()
    }

    /// Start or stop the animation; returns the new running flag.
    ///
    /// Starting rewinds to phase zero and takes the first step immediately.
    pub fn toggle(&mut self, registry: &mut PartRegistry, now: Instant) -> bool {
        self.state.running = !self.state.running;

        if self.state.running {
            info!(delta = self.state.delta, "starting animation");
            self.state.theta = 0.0;
            self.solver.reset(registry);
            self.fire(registry, now);
        } else {
            info!(theta = self.state.theta, steps = self.steps, "stopping animation");
        }

        self.state.running
    }

    /// Run the scheduled step if it is due. Returns whether geometry changed.
    pub fn poll(&mut self, registry: &mut PartRegistry, now: Instant) -> bool {
        if !self.ticker.take_due(now) {
            return false;
        }
        self.fire(registry, now)
    }

    fn fire(&mut self, registry: &mut PartRegistry, now: Instant) -> bool {
        if !self.state.running {
            return false;
        }
        self.state.theta = self.solver.step(registry, self.state.theta, self.state.delta);
        self.steps += 1;
        self.ticker.arm(now);
        true
    }

    /// Set the step size, clamped to the interactive range; returns the value used
    pub fn set_speed(&mut self, delta: f64) -> f64 {
        self.state.delta = clamp_speed(delta);
        self.state.delta
    }

    pub fn nudge_speed(&mut self, change: f64) -> f64 {
        self.set_speed(self.state.delta + change)
    }

    pub fn set_delay(&mut self, delay: Duration) {
        self.ticker.set_delay(delay);
    }

    pub fn set_exploded(&mut self, exploded: bool) {
        self.state.exploded = exploded;
    }
}

fn clamp_speed(delta: f64) -> f64 {
    if delta.is_nan() {
        return MIN_DEGREES_PER_STEP;
    }
    delta.clamp(MIN_DEGREES_PER_STEP, MAX_DEGREES_PER_STEP)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::explode::ExplodeLayout;
    use crate::geometry::Mesh;
    use crate::part::{PartId, PartRole, RoleAssignment};
    use nalgebra::{Point3, Vector3};

    fn engine() -> (PartRegistry, PartId) {
        let mut registry = PartRegistry::new();
        let shaft = registry.insert(
            "crankshaft",
            RoleAssignment::new(PartRole::Shaft, false),
            Mesh::cuboid(Vector3::new(0.1, 1.0, 0.1), Point3::new(0.0, 0.0, 0.0)),
        );
        registry.insert(
            "front_rotor",
            RoleAssignment::new(PartRole::Rotor, false),
            Mesh::cuboid(Vector3::new(0.6, 0.1, 0.4), Point3::new(0.25, 0.3, 0.0)),
        );
        registry.insert(
            "back_rotor",
            RoleAssignment::new(PartRole::Rotor, false),
            Mesh::cuboid(Vector3::new(0.6, 0.1, 0.4), Point3::new(-0.25, -0.3, 0.0)),
        );
        registry.insert(
            "housing",
            RoleAssignment::new(PartRole::Static, true),
            Mesh::cuboid(Vector3::new(2.0, 1.0, 2.0), Point3::origin()),
        );
        (registry, shaft)
    }

    fn clock(delta: f64, delay_ms: u64) -> AnimationClock {
        AnimationClock::new(
            KinematicSolver::default(),
            delta,
            Duration::from_millis(delay_ms),
        )
    }

    #[test]
    fn test_toggle_starts_with_one_step() {
        let (mut registry, _) = engine();
        let mut clock = clock(10.0, 50);
        let now = Instant::now();

        assert!(clock.toggle(&mut registry, now));
        assert_eq!(clock.state().theta, 10.0);
        assert_eq!(clock.steps(), 1);
        assert!(clock.is_scheduled());

        // Not due yet
        assert!(!clock.poll(&mut registry, now + Duration::from_millis(10)));
        assert!(clock.poll(&mut registry, now + Duration::from_millis(50)));
        assert_eq!(clock.state().theta, 20.0);
    }

    #[test]
    fn test_thirty_six_steps_make_a_revolution() {
        let (mut registry, shaft) = engine();
        let start = registry.get(shaft).unwrap().mesh.centroid().unwrap();
        let mut clock = clock(10.0, 0);
        let now = Instant::now();

        clock.toggle(&mut registry, now);
        while clock.steps() < 36 {
            assert!(clock.poll(&mut registry, now));
        }

        assert_eq!(clock.state().theta, 360.0);
        assert_eq!(clock.state().theta % 360.0, 0.0);
        let end = registry.get(shaft).unwrap().mesh.centroid().unwrap();
        assert!((end - start).norm() < 1e-5);
    }

    #[test]
    fn test_revolution_returns_shaft_and_rotor_orbit() {
        for delta in [10.0, 45.0, 180.0] {
            let (mut registry, shaft) = engine();
            let rotors: Vec<PartId> = registry.with_role(PartRole::Rotor).collect();
            let mut clock = clock(delta, 0);
            let now = Instant::now();

            clock.toggle(&mut registry, now);
            // The first step already carries the rotors with the shaft
            let shaft_center = registry.get(shaft).unwrap().mesh.centroid().unwrap();
            let rotor_start = registry.reference(rotors[0]).unwrap().centroid().unwrap();
            let expected = crate::transform::Transform::rotation_about(
                clock.solver().axis(),
                delta,
                &shaft_center,
            ) * rotor_start;
            let placed = registry.get(rotors[0]).unwrap().mesh.centroid().unwrap();
            assert!((placed - expected).norm() < 1e-5, "delta {delta}");

            while clock.steps() < (360.0 / delta) as u64 {
                assert!(clock.poll(&mut registry, now));
            }
            assert_eq!(clock.state().theta, 360.0);

            let shaft_mesh = &registry.get(shaft).unwrap().mesh;
            let reference = registry.reference(shaft).unwrap();
            for (a, b) in shaft_mesh.vertices().zip(reference.vertices()) {
                assert!((a.position - b.position).norm() < 1e-4, "delta {delta}");
            }
            for &rotor in &rotors {
                let center = registry.get(rotor).unwrap().mesh.centroid().unwrap();
                let start = registry.reference(rotor).unwrap().centroid().unwrap();
                assert!((center - start).norm() < 1e-4, "delta {delta}: {center:?} vs {start:?}");
            }
        }
    }

    #[test]
    fn test_start_while_exploded_keeps_lift() {
        let (mut registry, _) = engine();
        let (mut assembled, _) = engine();
        let rotors: Vec<PartId> = registry.with_role(PartRole::Rotor).collect();
        ExplodeLayout::default().apply(&mut registry, true);

        let now = Instant::now();
        let mut exploded_clock = clock(20.0, 0);
        let mut assembled_clock = clock(20.0, 0);
        exploded_clock.set_exploded(true);

        // Run, stop and restart so the reset path sees the offsets
        exploded_clock.toggle(&mut registry, now);
        for _ in 0..5 {
            exploded_clock.poll(&mut registry, now);
        }
        exploded_clock.toggle(&mut registry, now);
        exploded_clock.toggle(&mut registry, now);
        assembled_clock.toggle(&mut assembled, now);
        assert_eq!(exploded_clock.state().theta, assembled_clock.state().theta);

        for (k, &rotor) in rotors.iter().enumerate() {
            let lifted = registry.get(rotor).unwrap().mesh.centroid().unwrap();
            let base = assembled.get(rotor).unwrap().mesh.centroid().unwrap();
            let lift = Vector3::y() * (0.1 * (k + 1) as f32);
            assert!((lifted - base - lift).norm() < 1e-5, "{lifted:?} vs {base:?}");
        }

        // Reset alone puts exploded rotors at their lifted reference pose
        exploded_clock.solver().reset(&mut registry);
        for (k, &rotor) in rotors.iter().enumerate() {
            let center = registry.get(rotor).unwrap().mesh.centroid().unwrap();
            let start = registry.reference(rotor).unwrap().centroid().unwrap();
            let lift = Vector3::y() * (0.1 * (k + 1) as f32);
            assert!((center - start - lift).norm() < 1e-5);
        }
    }

    #[test]
    fn test_stop_lets_pending_tick_noop() {
        let (mut registry, _) = engine();
        let mut clock = clock(10.0, 5);
        let now = Instant::now();

        clock.toggle(&mut registry, now);
        assert!(!clock.toggle(&mut registry, now));
        assert!(clock.is_scheduled());

        let snapshot: Vec<Mesh> = registry.iter().map(|p| p.mesh.clone()).collect();
        let later = now + Duration::from_secs(1);
        assert!(!clock.poll(&mut registry, later));
        assert!(!clock.is_scheduled());
        assert_eq!(clock.state().theta, 10.0);
        for (part, mesh) in registry.iter().zip(&snapshot) {
            assert_eq!(&part.mesh, mesh);
        }

        // Nothing is rescheduled
        assert!(!clock.poll(&mut registry, later + Duration::from_secs(1)));
    }

    #[test]
    fn test_restart_rewinds_phase() {
        let (mut registry, shaft) = engine();
        let reference = registry.reference(shaft).unwrap().clone();
        let mut clock = clock(30.0, 0);
        let now = Instant::now();

        clock.toggle(&mut registry, now);
        for _ in 0..4 {
            clock.poll(&mut registry, now);
        }
        clock.toggle(&mut registry, now);
        assert_eq!(clock.state().theta, 150.0);

        clock.toggle(&mut registry, now);
        assert_eq!(clock.state().theta, 30.0);

        // Shaft was reset before the first step, so it sits at exactly one step
        let mut expected = reference.clone();
        let center = expected.centroid().unwrap();
        expected.transform(&crate::transform::Transform::rotation_about(
            clock.solver().axis(),
            30.0,
            &center,
        ));
        for (a, b) in registry.get(shaft).unwrap().mesh.vertices().zip(expected.vertices()) {
            assert!((a.position - b.position).norm() < 1e-5);
        }
    }

    #[test]
    fn test_poll_while_stopped_does_nothing() {
        let (mut registry, _) = engine();
        let mut clock = clock(10.0, 0);
        assert!(!clock.poll(&mut registry, Instant::now()));
        assert_eq!(clock.steps(), 0);
    }

    #[test]
    fn test_speed_is_clamped() {
        let mut clock = clock(500.0, 0);
        assert_eq!(clock.state().delta, MAX_DEGREES_PER_STEP);
        assert_eq!(clock.set_speed(0.0), MIN_DEGREES_PER_STEP);
        assert_eq!(clock.set_speed(45.0), 45.0);
        assert_eq!(clock.nudge_speed(5.0), 50.0);
        assert_eq!(clock.nudge_speed(-100.0), MIN_DEGREES_PER_STEP);
        assert_eq!(clock.set_speed(f64::NAN), MIN_DEGREES_PER_STEP);
    }

    #[test]
    fn test_speed_change_applies_to_next_step() {
        let (mut registry, _) = engine();
        let mut clock = clock(10.0, 0);
        let now = Instant::now();
        clock.toggle(&mut registry, now);
        clock.set_speed(25.0);
        clock.poll(&mut registry, now);
        assert_eq!(clock.state().theta, 35.0);
    }

    #[test]
    fn test_ticker() {
        let now = Instant::now();
        let mut ticker = Ticker::new(Duration::from_millis(20));
        assert!(!ticker.take_due(now));

        ticker.arm(now);
        assert!(!ticker.take_due(now + Duration::from_millis(19)));
        assert!(ticker.take_due(now + Duration::from_millis(20)));
        assert!(!ticker.is_armed());
    }
}
