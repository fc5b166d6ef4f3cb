use tandem_shared::{AnimationVariables, Rotation, Tick, Vector3};

/// Fixed playback delay behind the session clock. Large enough to tolerate
/// network jitter, small enough to bound visual lag.
pub const INTERPOLATION_DELAY: Tick = 300;

/// One timestamped transform snapshot received from an entity's owner.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MovementPoint {
    pub tick: Tick,
    pub position: Vector3,
    pub rotation: Rotation,
    pub variables: AnimationVariables,
    pub direction: f32,
}

/// Ordered buffer of movement snapshots for one remotely-simulated entity,
/// producing a delayed, smoothed transform.
///
/// The last produced transform stays readable on the component: the spawn
/// pass uses it for area-of-interest tests and buffer underflow holds it
/// rather than extrapolating.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct InterpolationComponent {
    points: Vec<MovementPoint>,
    pub position: Vector3,
    pub rotation: Rotation,
    pub variables: AnimationVariables,
    pub direction: f32,
}

impl InterpolationComponent {
    /// A fresh buffer holding at the given transform until snapshots arrive.
    pub fn new(position: Vector3, rotation: Rotation) -> Self {
        Self {
            points: Vec::new(),
            position,
            rotation,
            variables: AnimationVariables::default(),
            direction: 0.0,
        }
    }

    /// Appends a snapshot. Senders intend strictly increasing ticks, but
    /// out-of-order arrival is tolerated by insertion-sorting on tick.
    pub fn add_point(&mut self, point: MovementPoint) {
        let mut index = self.points.len();
        while index > 0 && self.points[index - 1].tick > point.tick {
            index -= 1;
        }
        self.points.insert(index, point);
    }

    /// Advances playback to the given tick: interpolates between the
    /// bracketing snapshots and evicts everything strictly older than the
    /// lower bracket.
    ///
    /// With no older bracket (underflow) the last known transform is held;
    /// extrapolating from insufficient data causes overshoot artifacts.
    /// With no newer bracket, playback holds at the newest snapshot.
    pub fn update(&mut self, playback_tick: Tick) {
        if self.points.is_empty() {
            return;
        }

        match self.points.iter().position(|p| p.tick > playback_tick) {
            // Every snapshot is newer than the playback tick: hold.
            Some(0) => {}
            Some(upper) => {
                let lower = upper - 1;
                let span = self.points[upper].tick - self.points[lower].tick;
                let t = if span == 0 {
                    0.0
                } else {
                    (playback_tick - self.points[lower].tick) as f32 / span as f32
                };

                let (low, high) = (&self.points[lower], &self.points[upper]);
                self.position = low.position.lerp(&high.position, t);
                self.rotation = low.rotation.lerp(&high.rotation, t);
                self.variables = low.variables.lerp(&high.variables, t);
                self.direction = low.direction + (high.direction - low.direction) * t;

                self.points.drain(..lower);
            }
            // Playback has passed the newest snapshot: hold there.
            None => {
                if let Some(last) = self.points.last() {
                    self.position = last.position;
                    self.rotation = last.rotation;
                    self.variables = last.variables.clone();
                    self.direction = last.direction;
                }
                let newest = self.points.len() - 1;
                self.points.drain(..newest);
            }
        }
    }

    pub fn pending_points(&self) -> usize {
        self.points.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(tick: Tick, x: f32) -> MovementPoint {
        MovementPoint {
            tick,
            position: Vector3::new(x, 0.0, 0.0),
            ..MovementPoint::default()
        }
    }

    #[test]
    fn interpolates_between_brackets() {
        let mut component = InterpolationComponent::default();
        component.add_point(point(1000, 0.0));
        component.add_point(point(1100, 10.0));

        component.update(1050);
        assert_eq!(component.position.x, 5.0);
    }

    #[test]
    fn tolerates_out_of_order_arrival() {
        let mut component = InterpolationComponent::default();
        component.add_point(point(1100, 10.0));
        component.add_point(point(1000, 0.0));

        component.update(1025);
        assert_eq!(component.position.x, 2.5);
    }

    #[test]
    fn underflow_holds_last_transform() {
        let mut component = InterpolationComponent::new(Vector3::new(7.0, 0.0, 0.0), Rotation::default());
        component.add_point(point(2000, 50.0));

        // Playback tick older than every snapshot: no movement.
        component.update(1000);
        assert_eq!(component.position.x, 7.0);
        assert_eq!(component.pending_points(), 1);
    }

    #[test]
    fn overflow_holds_at_newest_snapshot() {
        let mut component = InterpolationComponent::default();
        component.add_point(point(1000, 0.0));
        component.add_point(point(1100, 10.0));

        component.update(5000);
        assert_eq!(component.position.x, 10.0);
        assert_eq!(component.pending_points(), 1);
    }

    #[test]
    fn evicts_points_older_than_lower_bracket() {
        let mut component = InterpolationComponent::default();
        component.add_point(point(1000, 0.0));
        component.add_point(point(1100, 10.0));
        component.add_point(point(1200, 20.0));

        component.update(1150);
        // 1000 evicted, 1100 kept as lower bracket
        assert_eq!(component.pending_points(), 2);
        assert_eq!(component.position.x, 15.0);
    }

    #[test]
    fn never_samples_ahead_of_playback_while_bracketed() {
        let mut component = InterpolationComponent::default();
        component.add_point(point(1000, 0.0));
        component.add_point(point(2000, 1000.0));

        component.update(1001);
        // Output must stay proportional to playback progress, not jump to
        // the newer snapshot.
        assert!(component.position.x <= 1.1);
    }
}
