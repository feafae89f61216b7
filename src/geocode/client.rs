// client.rs
use crate::domain::GeocodeResult;
use crate::geocode::GeocodeFailure;
use std::time::{Duration, Instant};
use tracing::debug;

/// A geocoding provider: free-text address in, canonical address and
/// coordinates out.
pub trait Geocoder {
    fn geocode(&self, address: &str) -> Result<GeocodeResult, GeocodeFailure>;
}

/// Enforces a minimum gap between the *starts* of consecutive calls.
#[derive(Debug)]
pub struct Pacer {
    min_interval: Duration,
    last_start: Option<Instant>,
}

impl Pacer {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_start: None,
        }
    }

    /// Blocks until a call may begin, then stamps it. Returns how long it slept.
    pub fn wait_turn(&mut self) -> Duration {
        let mut slept = Duration::ZERO;

        if let Some(last) = self.last_start {
            let elapsed = last.elapsed();
            if elapsed < self.min_interval {
                slept = self.min_interval - elapsed;
                std::thread::sleep(slept);
            }
        }

        self.last_start = Some(Instant::now());
        slept
    }
}

/// Rate-limited front for a `Geocoder`. All calls made through one client
/// share a single pacer.
pub struct GeocodeClient<G: Geocoder> {
    geocoder: G,
    pacer: Pacer,
    calls: usize,
}

impl<G: Geocoder> GeocodeClient<G> {
    pub fn new(geocoder: G, min_interval: Duration) -> Self {
        Self {
            geocoder,
            pacer: Pacer::new(min_interval),
            calls: 0,
        }
    }

    pub fn resolve(&mut self, address: &str) -> Result<GeocodeResult, GeocodeFailure> {
        let slept = self.pacer.wait_turn();
        self.calls += 1;
        debug!(address, call = self.calls, waited_ms = slept.as_millis() as u64, "geocoding");

        self.geocoder.geocode(address)
    }

    /// Number of provider calls issued so far.
    pub fn calls(&self) -> usize {
        self.calls
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    /// Records when each call started; fails on addresses containing "??".
    struct RecordingGeocoder {
        starts: RefCell<Vec<Instant>>,
    }

    impl Geocoder for RecordingGeocoder {
        fn geocode(&self, address: &str) -> Result<GeocodeResult, GeocodeFailure> {
            self.starts.borrow_mut().push(Instant::now());
            if address.contains("??") {
                return Err(GeocodeFailure::NotFound(address.to_string()));
            }
            Ok(GeocodeResult {
                address: address.to_uppercase(),
                latitude: 1.0,
                longitude: 2.0,
            })
        }
    }

    #[test]
    fn first_call_does_not_wait() {
        let mut pacer = Pacer::new(Duration::from_secs(5));
        assert_eq!(pacer.wait_turn(), Duration::ZERO);
    }

    #[test]
    fn calls_start_at_least_min_interval_apart() {
        let interval = Duration::from_millis(40);
        let mut client = GeocodeClient::new(
            RecordingGeocoder {
                starts: RefCell::new(Vec::new()),
            },
            interval,
        );

        client.resolve("a").unwrap();
        // failures count against the pace too
        assert!(client.resolve("??").is_err());
        client.resolve("c").unwrap();

        let starts = client.geocoder.starts.borrow();
        assert_eq!(starts.len(), 3);
        // the pacer stamps just before the provider call, allow for that gap
        let slack = Duration::from_millis(1);
        for pair in starts.windows(2) {
            assert!(pair[1].duration_since(pair[0]) + slack >= interval);
        }
        assert_eq!(client.calls(), 3);
    }

    #[test]
    fn no_wait_when_caller_is_already_slow() {
        let mut pacer = Pacer::new(Duration::from_millis(10));
        pacer.wait_turn();
        std::thread::sleep(Duration::from_millis(20));
        assert_eq!(pacer.wait_turn(), Duration::ZERO);
    }
}
