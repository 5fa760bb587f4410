//! Stance transition timeline
//!
//! Маленький curve player: {progress, direction, duration}, двигается вручную каждый tick.
//! Crouch → play forward (progress → 1), stand → reverse (progress → 0).

use crate::shared::FloatCurve;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimelineDirection {
    Forward,
    Reverse,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StanceTimeline {
    progress: f32,
    direction: TimelineDirection,
    duration: f32,
    playing: bool,
}

impl StanceTimeline {
    pub fn new(duration: f32) -> Self {
        Self {
            progress: 0.0,
            direction: TimelineDirection::Reverse,
            duration: duration.max(0.0),
            playing: false,
        }
    }

    /// Продолжает с текущего progress (без сброса)
    pub fn play(&mut self) {
        self.direction = TimelineDirection::Forward;
        self.playing = self.progress < 1.0;
    }

    pub fn reverse(&mut self) {
        self.direction = TimelineDirection::Reverse;
        self.playing = self.progress > 0.0;
    }

    pub fn tick(&mut self, dt: f32) {
        if !self.playing || dt <= 0.0 {
            return;
        }
        // duration 0 → мгновенный переход
        let step = if self.duration > f32::EPSILON { dt / self.duration } else { 1.0 };
        match self.direction {
            TimelineDirection::Forward => {
                self.progress = (self.progress + step).min(1.0);
                self.playing = self.progress < 1.0;
            }
            TimelineDirection::Reverse => {
                self.progress = (self.progress - step).max(0.0);
                self.playing = self.progress > 0.0;
            }
        }
    }

    pub fn progress(&self) -> f32 {
        self.progress
    }

    pub fn direction(&self) -> TimelineDirection {
        self.direction
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    /// Curve(progress); пустая кривая = сам progress
    pub fn sample(&self, curve: &FloatCurve) -> f32 {
        curve.sample(self.progress).unwrap_or(self.progress)
    }
}
