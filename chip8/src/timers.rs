/// The delay and sound timers, decremented together by the host at 60 Hz
#[derive(Debug, Default)]
pub struct Timers {
    pub(crate) delay: u8,
    pub(crate) sound: u8,
}

impl Timers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        self.delay = 0;
        self.sound = 0;
    }

    /// Decrement both timers, stopping at zero
    pub fn tick(&mut self) {
        self.delay = self.delay.saturating_sub(1);
        self.sound = self.sound.saturating_sub(1);
    }

    pub fn delay(&self) -> u8 {
        self.delay
    }

    pub fn sound(&self) -> u8 {
        self.sound
    }
}
