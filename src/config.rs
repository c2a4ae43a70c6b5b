use crate::parser::DEFAULT_FRAME_DELAY;

/// Defaults applied by the editors when the caller does not choose otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EditorConfig {
    /// Loop count written into the rebuilt Netscape extension.
    pub loop_count: u16,
    /// Total playing time of a trimmed animation, in hundredths of a second.
    pub animation_duration: u16,
    /// Delay between intermediate frames, in hundredths of a second.
    pub delay: u16,
}

impl Default for EditorConfig {
    fn default() -> EditorConfig {
        EditorConfig {
            loop_count: 50,
            animation_duration: 250,
            delay: DEFAULT_FRAME_DELAY,
        }
    }
}

/// Options of [`edit_gif`](crate::editor::edit_gif).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrimOptions {
    pub delay: u16,
    pub frames_to_keep: usize,
    pub loop_count: u16,
    pub animation_duration: u16,
}

impl TrimOptions {
    pub fn new(delay: u16, frames_to_keep: usize) -> TrimOptions {
        TrimOptions { delay, frames_to_keep, ..TrimOptions::from(EditorConfig::default()) }
    }

    #[must_use]
    pub fn with_loop_count(mut self, loop_count: u16) -> TrimOptions {
        self.loop_count = loop_count;
        self
    }

    #[must_use]
    pub fn with_animation_duration(mut self, animation_duration: u16) -> TrimOptions {
        self.animation_duration = animation_duration;
        self
    }

    /// Hold time of the last kept frame, chosen so the whole animation plays
    /// for about `animation_duration`.
    pub fn last_frame_hold(&self, kept_frames: usize) -> u16 {
        let delay = i64::from(self.delay);
        let kept = i64::try_from(kept_frames).unwrap_or(i64::MAX);
        let hold = delay
            .saturating_add(i64::from(self.animation_duration))
            .saturating_sub(kept.saturating_mul(delay));
        hold.clamp(delay, i64::from(u16::MAX)) as u16
    }
}

impl From<EditorConfig> for TrimOptions {
    fn from(config: EditorConfig) -> TrimOptions {
        TrimOptions {
            delay: config.delay,
            frames_to_keep: usize::MAX,
            loop_count: config.loop_count,
            animation_duration: config.animation_duration,
        }
    }
}
