// SPDX-FileCopyrightText: 2026 Workpulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Chunked delivery with the blocked-recipient reaction.

use tracing::{debug, warn};

use crate::error::WorkpulseError;
use crate::traits::{PlatformAdapter, SubscriberStore};
use crate::types::SendOptions;

/// Send every chunk to `destination` in order, stopping at the first failure.
///
/// When the platform reports that the recipient blocked the bot, the platform
/// is disabled for the subscriber before the error is returned. No other
/// failure touches subscription state. Returns the number of chunks sent.
pub async fn deliver(
    adapter: &dyn PlatformAdapter,
    store: &dyn SubscriberStore,
    subscriber_id: &str,
    destination: &str,
    chunks: &[String],
    options: &SendOptions,
) -> Result<usize, WorkpulseError> {
    let platform = adapter.platform();
    for (index, chunk) in chunks.iter().enumerate() {
        if let Err(e) = adapter.send_message(destination, chunk, options).await {
            if e.is_recipient_blocked() {
                warn!(
                    subscriber_id,
                    %platform,
                    "recipient blocked the bot, disabling platform"
                );
                if let Err(store_err) = store.disable_platform(subscriber_id, platform).await {
                    warn!(
                        subscriber_id,
                        %platform,
                        error = %store_err,
                        "failed to disable platform after block"
                    );
                }
            }
            return Err(e);
        }
        debug!(subscriber_id, %platform, chunk = index + 1, total = chunks.len(), "chunk sent");
    }
    Ok(chunks.len())
}
