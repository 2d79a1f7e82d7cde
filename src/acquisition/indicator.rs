//! Per-square RGBW indicator colours, the tick-driven blink timer, and the
//! corner pulse shown while an engine move is pending.

/// One RGBW indicator value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IndicatorColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub w: u8,
}

impl IndicatorColor {
    pub const OFF: Self = Self::rgbw(0, 0, 0, 0);
    /// Quiet legal destination.
    pub const LEGAL_MOVE: Self = Self::rgbw(0, 0, 0, 50);
    /// Legal destination holding an opposing piece.
    pub const CAPTURE: Self = Self::rgbw(255, 0, 0, 50);
    /// Square the lifted piece came from.
    pub const ORIGIN: Self = Self::rgbw(0, 0, 0, 100);
    /// Externally-sourced move shown to the human.
    pub const ANNOUNCE: Self = Self::rgbw(0, 0, 0, 255);
    pub const CONFIRM: Self = Self::rgbw(0, 255, 0, 0);
    pub const REJECT: Self = Self::rgbw(255, 0, 0, 0);
    /// Physical follow-up still owed after a commit (promotion swap, rook, ep pawn).
    pub const FOLLOW_UP: Self = Self::rgbw(255, 215, 0, 50);
    pub const HALT: Self = Self::rgbw(255, 0, 0, 0);
    /// Corner squares while an engine move is pending; `ThinkingPulse` scales it.
    pub const THINKING: Self = Self::rgbw(0, 0, 255, 0);

    #[inline]
    pub const fn rgbw(r: u8, g: u8, b: u8, w: u8) -> Self {
        Self { r, g, b, w }
    }

    #[inline]
    pub const fn is_off(self) -> bool {
        self.r == 0 && self.g == 0 && self.b == 0 && self.w == 0
    }
}

/// Alternates `lit` every `interval_ticks`. Purely visual; never drives a
/// protocol transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndicatorTimer {
    interval_ticks: u64,
    last_toggle: u64,
    lit: bool,
}

impl IndicatorTimer {
    pub fn new(interval_ticks: u64, now: u64) -> Self {
        Self {
            interval_ticks: interval_ticks.max(1),
            last_toggle: now,
            lit: true,
        }
    }

    /// Advance to `now`; returns true when the lit state flipped.
    pub fn advance(&mut self, now: u64) -> bool {
        if now.saturating_sub(self.last_toggle) >= self.interval_ticks {
            self.lit = !self.lit;
            self.last_toggle = now;
            true
        } else {
            false
        }
    }

    #[inline]
    pub fn lit(&self) -> bool {
        self.lit
    }

    pub fn restart(&mut self, now: u64) {
        self.last_toggle = now;
        self.lit = true;
    }
}

/// Slow brightness wave for the thinking corners. One step per interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThinkingPulse {
    interval_ticks: u64,
    last_step: u64,
    step: u32,
}

impl ThinkingPulse {
    pub fn new(interval_ticks: u64, now: u64) -> Self {
        Self {
            interval_ticks: interval_ticks.max(1),
            last_step: now,
            step: 0,
        }
    }

    /// Advance to `now`; returns true when the brightness moved on a step.
    pub fn advance(&mut self, now: u64) -> bool {
        if now.saturating_sub(self.last_step) >= self.interval_ticks {
            self.step = self.step.wrapping_add(1);
            self.last_step = now;
            true
        } else {
            false
        }
    }

    pub fn color(&self) -> IndicatorColor {
        let level = ((f64::from(self.step) * 0.3).sin() + 1.0) * 127.0;
        let level = level.clamp(0.0, 255.0) as u16;
        let scale = |channel: u8| (u16::from(channel) * level / 255) as u8;
        let base = IndicatorColor::THINKING;
        IndicatorColor::rgbw(scale(base.r), scale(base.g), scale(base.b), scale(base.w))
    }
}
