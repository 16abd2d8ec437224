use std::time::Duration;

/// Global supervision settings.
#[derive(Clone, Debug)]
pub struct SupervisorConfig {
    /// How long workers get to finish teardown after shutdown is requested.
    ///
    /// Recorders need this to let the encoder close its current segment.
    pub grace: Duration,
    /// Capacity of the event bus (events beyond it are dropped for lagging subscribers).
    pub bus_capacity: usize,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            grace: Duration::from_secs(30),
            bus_capacity: 1024,
        }
    }
}
