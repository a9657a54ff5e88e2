use rand::distr::{Alphanumeric, SampleString};

pub mod item;

pub mod step;

/// Generates a random alphanumeric name for steps created without one,
/// so their log lines can be correlated.
fn build_name() -> String {
    Alphanumeric.sample_string(&mut rand::rng(), 8)
}
