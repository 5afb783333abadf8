//! Agent motion state machine.
//!
//! An agent is either idle or moving. A moving agent may have a heading to
//! turn towards and a budget of distance still to cover. Each tick it
//! either rotates or translates, never both, and once it has neither a
//! heading to reach nor steps left it falls back to idle.

use formica_core::types::{normalize_degrees, shortest_turn, Field, Position};

/// Step budget used for "keep going until told otherwise".
pub const UNBOUNDED_STEPS: u32 = u32::MAX;

/// Where an agent is and which way it faces.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    pub position: Position,
    /// Degrees in [0, 360). 0 points right, 90 points down.
    pub heading: f64,
}

impl Pose {
    pub fn new(position: Position, heading: f64) -> Self {
        Self {
            position,
            heading: normalize_degrees(heading),
        }
    }
}

/// Physical limits applied during one motion step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionLimits {
    pub speed: f64,
    pub turn_rate: f64,
    /// Carrying anything halves the speed.
    pub loaded: bool,
}

impl MotionLimits {
    pub fn effective_speed(&self) -> f64 {
        if self.loaded {
            self.speed / 2.0
        } else {
            self.speed
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum MotionState {
    #[default]
    Idle,
    Moving {
        target_heading: Option<f64>,
        steps: Option<u32>,
    },
}

/// What a call to [`MotionState::advance`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotionStep {
    Rotated,
    Moved { bounced: bool },
    Stopped,
    Idle,
}

impl MotionState {
    pub fn is_idle(&self) -> bool {
        matches!(self, MotionState::Idle)
    }

    pub fn target_heading(&self) -> Option<f64> {
        match self {
            MotionState::Moving { target_heading, .. } => *target_heading,
            MotionState::Idle => None,
        }
    }

    pub fn remaining_steps(&self) -> Option<u32> {
        match self {
            MotionState::Moving { steps, .. } => *steps,
            MotionState::Idle => None,
        }
    }

    /// Aim at `direction`, keeping any step budget already set.
    pub fn turn(&mut self, direction: f64) {
        let direction = normalize_degrees(direction);
        match self {
            MotionState::Idle => {
                *self = MotionState::Moving {
                    target_heading: Some(direction),
                    steps: None,
                }
            }
            MotionState::Moving { target_heading, .. } => *target_heading = Some(direction),
        }
    }

    /// Set the distance budget, keeping any pending turn.
    pub fn go_forward(&mut self, budget: u32) {
        match self {
            MotionState::Idle => {
                *self = MotionState::Moving {
                    target_heading: None,
                    steps: Some(budget),
                }
            }
            MotionState::Moving { steps, .. } => *steps = Some(budget),
        }
    }

    pub fn go_forwards(&mut self) {
        self.go_forward(UNBOUNDED_STEPS);
    }

    pub fn stop(&mut self) {
        *self = MotionState::Idle;
    }

    /// Run one tick of the state machine against `pose`.
    pub fn advance(&mut self, pose: &mut Pose, limits: &MotionLimits, field: &Field) -> MotionStep {
        let (target_heading, steps) = match self {
            MotionState::Idle => return MotionStep::Idle,
            MotionState::Moving {
                target_heading,
                steps,
            } => (target_heading, steps),
        };

        if let Some(target) = *target_heading {
            if pose.heading != target {
                let diff = shortest_turn(pose.heading, target);
                if diff.abs() < limits.turn_rate {
                    pose.heading = target;
                } else {
                    pose.heading = normalize_degrees(pose.heading + limits.turn_rate.copysign(diff));
                }
                return MotionStep::Rotated;
            }
            *target_heading = None;
        }

        match steps {
            Some(remaining) if *remaining > 0 => {
                let speed = limits.effective_speed();
                *remaining = remaining.saturating_sub((speed as u32).max(1));
                pose.position = pose.position.advanced(pose.heading, speed);
                let bounced = bounce(pose, field);
                MotionStep::Moved { bounced }
            }
            _ => {
                *self = MotionState::Idle;
                MotionStep::Stopped
            }
        }
    }
}

/// Reflect a pose that has left the field back inside it.
///
/// Each axis is handled independently. Returns whether anything changed.
pub fn bounce(pose: &mut Pose, field: &Field) -> bool {
    let mut bounced = false;
    let p = &mut pose.position;

    if p.x < 0.0 {
        p.x = -p.x;
        pose.heading = normalize_degrees(180.0 - pose.heading);
        bounced = true;
    } else if p.x > field.width {
        p.x = 2.0 * field.width - p.x;
        pose.heading = normalize_degrees(180.0 - pose.heading);
        bounced = true;
    }

    if p.y < 0.0 {
        p.y = -p.y;
        pose.heading = normalize_degrees(-pose.heading);
        bounced = true;
    } else if p.y > field.height {
        p.y = 2.0 * field.height - p.y;
        pose.heading = normalize_degrees(-pose.heading);
        bounced = true;
    }

    bounced
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIELD: Field = Field {
        width: 800.0,
        height: 600.0,
    };

    fn limits() -> MotionLimits {
        MotionLimits {
            speed: 4.0,
            turn_rate: 8.0,
            loaded: false,
        }
    }

    #[test]
    fn turning_does_not_translate() {
        let mut state = MotionState::Idle;
        let mut pose = Pose::new(Position::new(100.0, 100.0), 0.0);
        state.turn(90.0);
        state.go_forwards();

        assert_eq!(state.advance(&mut pose, &limits(), &FIELD), MotionStep::Rotated);
        assert_eq!(pose.heading, 8.0);
        assert_eq!(pose.position, Position::new(100.0, 100.0));
    }

    #[test]
    fn rotation_takes_the_short_way_round() {
        let mut state = MotionState::Idle;
        let mut pose = Pose::new(Position::new(100.0, 100.0), 10.0);
        state.turn(-20.0);
        state.advance(&mut pose, &limits(), &FIELD);
        assert_eq!(pose.heading, 2.0);
        state.advance(&mut pose, &limits(), &FIELD);
        assert_eq!(pose.heading, 354.0);
        state.advance(&mut pose, &limits(), &FIELD);
        assert_eq!(pose.heading, 346.0);
        state.advance(&mut pose, &limits(), &FIELD);
        assert_eq!(pose.heading, 340.0);
        // target reached and no steps: next tick goes idle
        assert_eq!(state.advance(&mut pose, &limits(), &FIELD), MotionStep::Stopped);
        assert!(state.is_idle());
    }

    #[test]
    fn budget_is_spent_in_whole_speed_units() {
        let mut state = MotionState::Idle;
        let mut pose = Pose::new(Position::new(100.0, 100.0), 0.0);
        state.go_forward(10);

        state.advance(&mut pose, &limits(), &FIELD);
        assert_eq!(state.remaining_steps(), Some(6));
        state.advance(&mut pose, &limits(), &FIELD);
        state.advance(&mut pose, &limits(), &FIELD);
        assert_eq!(state.remaining_steps(), Some(0));
        assert_eq!(pose.position.x, 112.0);
        assert_eq!(state.advance(&mut pose, &limits(), &FIELD), MotionStep::Stopped);
        assert_eq!(state.advance(&mut pose, &limits(), &FIELD), MotionStep::Idle);
    }

    #[test]
    fn carrying_halves_speed() {
        let mut state = MotionState::Idle;
        let mut pose = Pose::new(Position::new(100.0, 100.0), 90.0);
        state.go_forwards();
        let loaded = MotionLimits {
            loaded: true,
            ..limits()
        };
        state.advance(&mut pose, &loaded, &FIELD);
        assert!((pose.position.y - 102.0).abs() < 1e-9);
        assert_eq!(state.remaining_steps(), Some(UNBOUNDED_STEPS - 2));
    }

    #[test]
    fn right_edge_reflects_position_and_heading() {
        let mut state = MotionState::Idle;
        let mut pose = Pose::new(Position::new(798.0, 300.0), 0.0);
        state.go_forwards();
        let step = state.advance(&mut pose, &limits(), &FIELD);

        assert_eq!(step, MotionStep::Moved { bounced: true });
        // crossed to x = 802, reflected to 2W - 802
        assert!((pose.position.x - 798.0).abs() < 1e-9);
        assert_eq!(pose.heading, 180.0);
    }

    #[test]
    fn top_edge_negates_heading() {
        let mut pose = Pose::new(Position::new(50.0, -3.0), 300.0);
        assert!(bounce(&mut pose, &FIELD));
        assert_eq!(pose.position.y, 3.0);
        assert_eq!(pose.heading, 60.0);
    }

    #[test]
    fn corner_bounces_both_axes() {
        let mut pose = Pose::new(Position::new(-2.0, 605.0), 135.0);
        assert!(bounce(&mut pose, &FIELD));
        assert_eq!(pose.position, Position::new(2.0, 595.0));
        // 180 - 135 = 45, then -45 -> 315
        assert_eq!(pose.heading, 315.0);
    }

    #[test]
    fn heading_stays_normalized_under_arbitrary_commands() {
        let mut state = MotionState::Idle;
        let mut pose = Pose::new(Position::new(5.0, 5.0), 0.0);
        let fast = MotionLimits {
            speed: 6.0,
            turn_rate: 16.0,
            loaded: false,
        };
        let mut direction = -1000.0;
        for i in 0..2_000 {
            if i % 37 == 0 {
                state.turn(direction);
                state.go_forward(200);
                direction += 333.3;
            }
            state.advance(&mut pose, &fast, &FIELD);
            assert!((0.0..360.0).contains(&pose.heading), "heading {}", pose.heading);
            assert!(pose.position.x >= 0.0 && pose.position.x <= FIELD.width);
            assert!(pose.position.y >= 0.0 && pose.position.y <= FIELD.height);
        }
    }

    #[test]
    fn turn_keeps_existing_budget() {
        let mut state = MotionState::Idle;
        state.go_forward(40);
        state.turn(450.0);
        assert_eq!(state.target_heading(), Some(90.0));
        assert_eq!(state.remaining_steps(), Some(40));
    }
}
