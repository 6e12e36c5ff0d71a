use std::collections::BTreeMap;

pub const STEPS: u8 = 16;

/// A control which can be blinked.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum BlinkTarget {
    ButtonLed { channel: u8, number: u8 },
    StripLine { channel: u8, line: u8 },
}

impl BlinkTarget {
    pub fn channel(&self) -> u8 {
        match *self {
            BlinkTarget::ButtonLed { channel, .. } | BlinkTarget::StripLine { channel, .. } => {
                channel
            }
        }
    }
}

/// 16 steps visibility patterns: bit `i` set means visible at step `i`.
#[derive(Debug, Default)]
pub struct BlinkTable {
    patterns: BTreeMap<BlinkTarget, u16>,
    step: u8,
}

impl BlinkTable {
    pub fn set(&mut self, target: BlinkTarget, pattern: u16) {
        self.patterns.insert(target, pattern);
    }

    pub fn remove(&mut self, target: &BlinkTarget) -> Option<u16> {
        self.patterns.remove(target)
    }

    pub fn contains(&self, target: &BlinkTarget) -> bool {
        self.patterns.contains_key(target)
    }

    #[cfg(test)]
    fn step(&self) -> u8 {
        self.step
    }

    /// Moves to the next step and returns the visibility of every entry.
    pub fn advance(&mut self) -> Vec<(BlinkTarget, bool)> {
        self.step = (self.step + 1) % STEPS;

        self.patterns
            .iter()
            .map(|(&target, &pattern)| (target, pattern & (1 << self.step) != 0))
            .collect()
    }
}
