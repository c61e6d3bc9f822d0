//! Time source for receive windows
//!
//! The transport needs two things from time: a monotonic millisecond
//! counter to measure inactivity, and a way to hand control back to the
//! host between polls of the UART. The second part is the standard
//! `embedded-hal` [`DelayNs`] trait, so any board delay works.

pub use embedded_hal::delay::DelayNs;

/// Monotonic clock with cooperative delays
pub trait Clock: DelayNs {
    /// Milliseconds since an arbitrary fixed origin
    ///
    /// Must never go backwards.
    fn now_ms(&self) -> u64;

    /// Milliseconds elapsed since `since`
    fn elapsed_ms(&self, since: u64) -> u64 {
        self.now_ms().saturating_sub(since)
    }
}

impl<C: Clock> Clock for &mut C {
    fn now_ms(&self) -> u64 {
        C::now_ms(self)
    }
}

/// Host clock backed by `std::time::Instant`
#[cfg(feature = "std")]
#[derive(Debug, Clone, Copy)]
pub struct StdClock {
    origin: std::time::Instant,
}

#[cfg(feature = "std")]
impl StdClock {
    /// Create a clock whose origin is now
    pub fn new() -> Self {
        Self {
            origin: std::time::Instant::now(),
        }
    }
}

#[cfg(feature = "std")]
impl Default for StdClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "std")]
impl DelayNs for StdClock {
    fn delay_ns(&mut self, ns: u32) {
        std::thread::sleep(std::time::Duration::from_nanos(u64::from(ns)));
    }
}

#[cfg(feature = "std")]
impl Clock for StdClock {
    fn now_ms(&self) -> u64 {
        self.origin.elapsed().as_millis() as u64
    }
}

/// Clock backed by the embassy time driver
///
/// Delays are blocking (`embassy_time::Delay`), matching the synchronous
/// transport.
#[cfg(feature = "embassy-time")]
#[derive(Debug, Clone, Copy, Default)]
pub struct EmbassyClock;

#[cfg(feature = "embassy-time")]
impl EmbassyClock {
    /// Create a new embassy-backed clock
    pub const fn new() -> Self {
        Self
    }
}

#[cfg(feature = "embassy-time")]
impl DelayNs for EmbassyClock {
    fn delay_ns(&mut self, ns: u32) {
        DelayNs::delay_ns(&mut embassy_time::Delay, ns);
    }
}

#[cfg(feature = "embassy-time")]
impl Clock for EmbassyClock {
    fn now_ms(&self) -> u64 {
        embassy_time::Instant::now().as_millis()
    }
}
