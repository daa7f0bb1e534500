pub mod packets;
pub mod sender;

pub use packets::{fragment_packets, pet, pet_added_packet, pet_removed_packet};
pub use sender::RecordingSender;

use std::sync::Once;
use tracing_subscriber::EnvFilter;

static INIT: Once = Once::new();

pub fn init_test_logging() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| EnvFilter::new("tamer=debug,tamer_state=trace")),
            )
            .with_test_writer()
            .init();
    });
}
