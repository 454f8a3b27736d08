//! Scheduled track transitions.
//!
//! Each track owns an [`EventQueue`]. Events are kept in ascending start
//! time (insertion is stable for equal start times). On every controller step
//! the queue is evaluated per [`EventKind`]:
//!
//! 1. only the earliest pending event of a kind can be active;
//! 2. it activates once the controller clock reaches its start, capturing the
//!    value in effect at that moment;
//! 3. during its smoothing window the value moves linearly to the target;
//! 4. at the end of the window the exact target is applied and the event is
//!    removed, letting the next event of that kind activate.
//!
//! An event whose start lies inside the window of an earlier event of the same
//! kind is deferred until that window closes.

/// The track property an event drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Enable,
    Speed,
    Weight,
}

impl EventKind {
    pub const ALL: [EventKind; 3] = [EventKind::Enable, EventKind::Speed, EventKind::Weight];

    const fn slot(self) -> usize {
        match self {
            EventKind::Enable => 0,
            EventKind::Speed => 1,
            EventKind::Weight => 2,
        }
    }
}

/// The event-driven properties of a track.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackParams {
    pub enabled: bool,
    pub speed: f32,
    pub weight: f32,
}

impl Default for TrackParams {
    fn default() -> Self {
        Self {
            enabled: true,
            speed: 1.0,
            weight: 1.0,
        }
    }
}

impl TrackParams {
    /// Current value of `kind`; Enable reads as `1.0` / `0.0`.
    #[must_use]
    pub fn get(&self, kind: EventKind) -> f32 {
        match kind {
            EventKind::Enable => f32::from(u8::from(self.enabled)),
            EventKind::Speed => self.speed,
            EventKind::Weight => self.weight,
        }
    }

    pub fn set(&mut self, kind: EventKind, value: f32) {
        match kind {
            EventKind::Enable => self.enabled = value > 0.5,
            EventKind::Speed => self.speed = value,
            EventKind::Weight => self.weight = value,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Activation {
    from: f32,
    start: f32,
}

/// A transition scheduled on the controller clock.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Event {
    kind: EventKind,
    target: f32,
    start_time: f32,
    smooth_time: f32,
    activation: Option<Activation>,
}

impl Event {
    #[must_use]
    pub fn new(kind: EventKind, target: f32, start_time: f32, smooth_time: f32) -> Self {
        Self {
            kind,
            target,
            start_time,
            smooth_time: smooth_time.max(0.0),
            activation: None,
        }
    }

    #[inline]
    #[must_use]
    pub fn kind(&self) -> EventKind {
        self.kind
    }

    #[inline]
    #[must_use]
    pub fn target(&self) -> f32 {
        self.target
    }

    /// Scheduled start on the controller clock.
    #[inline]
    #[must_use]
    pub fn start_time(&self) -> f32 {
        self.start_time
    }

    #[inline]
    #[must_use]
    pub fn smooth_time(&self) -> f32 {
        self.smooth_time
    }

    #[inline]
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.activation.is_some()
    }

    /// Value of the transition at `now`, and whether it has finished.
    fn value_at(&self, activation: Activation, now: f32) -> (f32, bool) {
        let elapsed = now - activation.start;
        if self.smooth_time <= 0.0 || elapsed >= self.smooth_time {
            return (self.target, true);
        }
        let factor = (elapsed / self.smooth_time).clamp(0.0, 1.0);
        (
            activation.from + (self.target - activation.from) * factor,
            false,
        )
    }
}

/// Ordered queue of pending events for one track.
#[derive(Debug, Clone, PartialEq)]
pub struct EventQueue {
    events: Vec<Event>,
    /// End of the last finished window, per kind.
    free_at: [f32; 3],
}

impl Default for EventQueue {
    fn default() -> Self {
        Self {
            events: Vec::new(),
            free_at: [f32::NEG_INFINITY; 3],
        }
    }
}

impl EventQueue {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts after every event starting at or before `event`.
    pub fn push(&mut self, event: Event) {
        let index = self
            .events
            .partition_point(|e| e.start_time <= event.start_time);
        self.events.insert(index, event);
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Event> {
        self.events.iter()
    }

    pub fn clear(&mut self) {
        self.events.clear();
        self.free_at = [f32::NEG_INFINITY; 3];
    }

    /// Drops every pending event of `kind`, including an active one.
    pub fn remove_kind(&mut self, kind: EventKind) {
        self.events.retain(|e| e.kind != kind);
        self.free_at[kind.slot()] = f32::NEG_INFINITY;
    }

    /// Applies every due event to `params` at controller time `now`.
    pub fn update(&mut self, now: f32, params: &mut TrackParams) {
        for kind in EventKind::ALL {
            self.update_kind(kind, now, params);
        }
    }

    fn head_of(&self, kind: EventKind) -> Option<usize> {
        self.events
            .iter()
            .position(|e| e.kind == kind && e.is_active())
            .or_else(|| self.events.iter().position(|e| e.kind == kind))
    }

    fn update_kind(&mut self, kind: EventKind, now: f32, params: &mut TrackParams) {
        while let Some(index) = self.head_of(kind) {
            let free_at = self.free_at[kind.slot()];
            let event = &mut self.events[index];

            let activation = match event.activation {
                Some(activation) => activation,
                None => {
                    let start = event.start_time.max(free_at);
                    if now < start {
                        return;
                    }
                    let activation = Activation {
                        from: params.get(kind),
                        start,
                    };
                    log::trace!(
                        "{kind:?} event activated at {start} ({} -> {})",
                        activation.from,
                        event.target
                    );
                    event.activation = Some(activation);
                    activation
                }
            };

            let (value, finished) = event.value_at(activation, now);
            params.set(kind, value);
            if !finished {
                return;
            }

            self.free_at[kind.slot()] = activation.start + event.smooth_time;
            log::trace!("{kind:?} event finished at {now} ({value})");
            self.events.remove(index);
        }
    }
}
