//! Monotonic elapsed-time source for the frame loop.

use cfg_if::cfg_if;

cfg_if! {
    if #[cfg(target_arch = "wasm32")] {
        /// Seconds since construction, read from `performance.now()`.
        pub struct Clock {
            performance: Option<web_sys::Performance>,
            start_ms: f64,
        }

        impl Clock {
            pub fn start() -> Self {
                let performance = web_sys::window().and_then(|w| w.performance());
                let start_ms = performance.as_ref().map(|p| p.now()).unwrap_or(0.0);
                Self { performance, start_ms }
            }

            pub fn elapsed_seconds(&self) -> f64 {
                match &self.performance {
                    Some(p) => ((p.now() - self.start_ms) / 1000.0).max(0.0),
                    None => 0.0,
                }
            }
        }
    } else {
        use std::time::Instant;

        /// Seconds since construction, read from [`Instant`].
        pub struct Clock {
            start: Instant,
        }

        impl Clock {
            pub fn start() -> Self {
                Self { start: Instant::now() }
            }

            pub fn elapsed_seconds(&self) -> f64 {
                self.start.elapsed().as_secs_f64()
            }
        }
    }
}

#[cfg(all(test, not(target_arch = "wasm32")))]
mod tests {
    use super::*;

    #[test]
    fn test_elapsed_is_monotonic() {
        let clock = Clock::start();
        let a = clock.elapsed_seconds();
        let b = clock.elapsed_seconds();
        assert!(a >= 0.0);
        assert!(b >= a);
    }
}
