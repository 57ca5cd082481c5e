use std::collections::HashMap;

/// A named event raised when playback enters a frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trigger {
    /// `None` fires under any tag; `Some` only while that tag is active.
    pub tag: Option<String>,
    pub event: String,
}

impl Trigger {
    pub fn matches_tag(&self, active: Option<&str>) -> bool {
        match &self.tag {
            None => true,
            Some(tag) => active == Some(tag.as_str()),
        }
    }
}

/// Frame-indexed trigger table.
#[derive(Debug, Clone, Default)]
pub struct TriggerRegistry {
    by_frame: HashMap<usize, Vec<Trigger>>,
}

impl TriggerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, frame: usize, event: &str, tag: Option<&str>) {
        self.by_frame.entry(frame).or_default().push(Trigger {
            tag: tag.map(str::to_string),
            event: event.to_string(),
        });
    }

    /// Removes every trigger matching `(frame, event, tag)` exactly.
    /// Returns how many were removed.
    pub fn remove(&mut self, frame: usize, event: &str, tag: Option<&str>) -> usize {
        let Some(triggers) = self.by_frame.get_mut(&frame) else {
            return 0;
        };
        let before = triggers.len();
        triggers.retain(|t| !(t.event == event && t.tag.as_deref() == tag));
        let removed = before - triggers.len();
        if triggers.is_empty() {
            self.by_frame.remove(&frame);
        }
        removed
    }

    pub fn at(&self, frame: usize) -> &[Trigger] {
        self.by_frame.get(&frame).map(Vec::as_slice).unwrap_or_default()
    }

    /// Triggers at `frame` that apply while `active` is the current tag.
    pub fn matching<'a>(
        &'a self,
        frame: usize,
        active: Option<&'a str>,
    ) -> impl Iterator<Item = &'a Trigger> + 'a {
        self.at(frame).iter().filter(move |t| t.matches_tag(active))
    }

    pub fn len(&self) -> usize {
        self.by_frame.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.by_frame.is_empty()
    }
}
