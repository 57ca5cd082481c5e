//! # Playback State Machine
//!
//! Advances the current frame through time.
//!
//! ## Responsibilities
//! - **Stepping**: accumulates elapsed time and steps one frame per elapsed
//!   frame duration, forward or backward, inside the active range.
//! - **Wraparound**: raises `AnimationComplete` each time a step crosses the
//!   range boundary in the current direction.
//! - **Triggers**: raises matching registered triggers for every entered frame.
//! - **Relocation**: `goto_tag`, `goto_frame`, `goto_tag_frame`.
//!
//! Nothing here touches geometry; callers resynthesize when an operation
//! reports that the frame moved.

use crate::catalog::SheetCatalog;
use crate::events::SpriteEvent;
use crate::triggers::TriggerRegistry;

#[derive(Debug, Clone, PartialEq)]
pub struct Playback {
    current_frame: usize,
    elapsed_ms: f64,
    current_tag: Option<String>,
    current_tag_frame: Option<usize>,
    playing: bool,
    backward: bool,
}

impl Playback {
    pub fn new(start_frame: usize, playing: bool, backward: bool) -> Self {
        Self {
            current_frame: start_frame,
            elapsed_ms: 0.0,
            current_tag: None,
            current_tag_frame: None,
            playing,
            backward,
        }
    }

    pub fn current_frame(&self) -> usize {
        self.current_frame
    }

    /// Time spent on the current frame so far.
    pub fn elapsed_ms(&self) -> f64 {
        self.elapsed_ms
    }

    pub fn current_tag(&self) -> Option<&str> {
        self.current_tag.as_deref()
    }

    /// Offset of the current frame from the active tag's first frame.
    pub fn current_tag_frame(&self) -> Option<usize> {
        self.current_tag_frame
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn is_backward(&self) -> bool {
        self.backward
    }

    pub fn play(&mut self) {
        self.playing = true;
    }

    pub fn pause(&mut self) {
        self.playing = false;
    }

    pub fn set_backward(&mut self, backward: bool) {
        self.backward = backward;
    }

    /// Inclusive frame range playback loops over: the active tag's, or the
    /// whole sheet's.
    pub fn active_range(&self, catalog: &SheetCatalog) -> (usize, usize) {
        self.current_tag
            .as_deref()
            .and_then(|name| catalog.tag(name))
            .map_or((catalog.min_frame(), catalog.max_frame()), |tag| {
                (tag.from, tag.to)
            })
    }

    /// Adds `delta_ms` and steps through every frame whose duration has
    /// fully elapsed. Returns the number of steps taken.
    pub fn advance(
        &mut self,
        delta_ms: f64,
        catalog: &SheetCatalog,
        triggers: &TriggerRegistry,
        events: &mut Vec<SpriteEvent>,
    ) -> usize {
        if !self.playing || !catalog.contains_frame(self.current_frame) {
            return 0;
        }
        if !delta_ms.is_finite() || delta_ms < 0.0 {
            tracing::debug!(delta_ms, "ignoring non-finite or negative time step");
            return 0;
        }

        self.elapsed_ms += delta_ms;

        let mut steps = 0;
        loop {
            // A zero duration still has to consume time, or the loop never ends.
            let duration = catalog
                .frame_duration(self.current_frame)
                .unwrap_or(0)
                .max(1);
            let duration = f64::from(duration);
            if self.elapsed_ms < duration {
                break;
            }
            self.elapsed_ms -= duration;
            self.step(catalog, triggers, events);
            steps += 1;
        }
        steps
    }

    fn step(
        &mut self,
        catalog: &SheetCatalog,
        triggers: &TriggerRegistry,
        events: &mut Vec<SpriteEvent>,
    ) {
        let (lo, hi) = self.active_range(catalog);
        let size = (hi - lo + 1) as i64;
        let offset = self.current_frame as i64 - lo as i64;
        let step: i64 = if self.backward { -1 } else { 1 };

        let wrapped = if self.backward {
            self.current_frame <= lo
        } else {
            self.current_frame >= hi
        };
        let next = (offset + step + size).rem_euclid(size) as usize + lo;
        self.current_frame = next;
        tracing::trace!(frame = next, wrapped, "playback step");

        if wrapped {
            events.push(SpriteEvent::AnimationComplete {
                tag: self.current_tag.clone(),
            });
        }

        for trigger in triggers.matching(next, self.current_tag.as_deref()) {
            events.push(SpriteEvent::Custom {
                name: trigger.event.clone(),
                frame: next,
                tag: self.current_tag.clone(),
            });
        }

        if let Some(tag) = self.current_tag.as_deref().and_then(|n| catalog.tag(n)) {
            self.current_tag_frame = Some(next - tag.from);
        }
    }

    /// Switches the active tag. Returns `true` when the frame was relocated
    /// and geometry has to be regenerated.
    ///
    /// Unknown tags and the already active tag are ignored. `None` clears the
    /// tag without moving the current frame.
    pub fn goto_tag(
        &mut self,
        name: Option<&str>,
        catalog: &SheetCatalog,
        events: &mut Vec<SpriteEvent>,
    ) -> bool {
        let Some(name) = name else {
            if let Some(previous) = self.current_tag.take() {
                self.current_tag_frame = None;
                events.push(SpriteEvent::TagSwitched {
                    previous: Some(previous),
                    current: None,
                });
            }
            return false;
        };

        if self.current_tag.as_deref() == Some(name) {
            return false;
        }
        let Some(tag) = catalog.tag(name) else {
            tracing::debug!(tag = name, "ignoring switch to unknown tag");
            return false;
        };

        let previous = self.current_tag.replace(tag.name.clone());
        self.current_frame = tag.from;
        self.current_tag_frame = Some(0);
        self.elapsed_ms = 0.0;
        events.push(SpriteEvent::TagSwitched {
            previous,
            current: Some(tag.name.clone()),
        });
        true
    }

    /// Moves to an absolute frame and resets the elapsed time. Returns `true`
    /// when the frame changed.
    ///
    /// Frames outside the table are ignored. Leaving the active tag's range
    /// clears the tag, so listeners see `TagSwitched` with no current tag
    /// even though `goto_tag` was never called.
    pub fn goto_frame(
        &mut self,
        frame: usize,
        catalog: &SheetCatalog,
        events: &mut Vec<SpriteEvent>,
    ) -> bool {
        if !catalog.contains_frame(frame) {
            tracing::warn!(
                frame,
                min = catalog.min_frame(),
                max = catalog.max_frame(),
                "ignoring jump to a frame outside the sheet"
            );
            return false;
        }

        self.elapsed_ms = 0.0;
        if frame == self.current_frame {
            return false;
        }
        self.current_frame = frame;

        if let Some(name) = self.current_tag.clone() {
            match catalog.tag(&name) {
                Some(tag) if tag.contains(frame) => {
                    self.current_tag_frame = Some(frame - tag.from);
                }
                _ => {
                    self.current_tag = None;
                    self.current_tag_frame = None;
                    events.push(SpriteEvent::TagSwitched {
                        previous: Some(name),
                        current: None,
                    });
                }
            }
        }
        true
    }

    /// Moves to a frame relative to the active tag's first frame. Offsets
    /// wrap modulo the tag length in both directions, so `-1` is the last
    /// frame of the tag. Does nothing without an active tag.
    pub fn goto_tag_frame(
        &mut self,
        relative: i64,
        catalog: &SheetCatalog,
        events: &mut Vec<SpriteEvent>,
    ) -> bool {
        let Some(tag) = self.current_tag.as_deref().and_then(|n| catalog.tag(n)) else {
            return false;
        };
        let span = tag.span() as i64;
        let frame = tag.from + relative.rem_euclid(span) as usize;
        self.goto_frame(frame, catalog, events)
    }
}
