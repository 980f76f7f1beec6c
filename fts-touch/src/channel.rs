//! Exposed channels which can be used to share touch data across tasks

use embassy_sync::channel::Channel;
pub use embassy_sync::{blocking_mutex, channel};

use crate::state::TouchSnapshot;
use crate::{MAX_CONTACTS, RawMutex, SNAPSHOT_CHANNEL_SIZE};

/// Channel for contact table snapshots, from the interrupt task to the input reporting task
pub static TOUCH_SNAPSHOT_CHANNEL: Channel<RawMutex, TouchSnapshot<MAX_CONTACTS>, SNAPSHOT_CHANNEL_SIZE> =
    Channel::new();
