/*
 * Copyright (c) 2024. Govcraft
 *
 * Licensed under either of
 *   * Apache License, Version 2.0 (the "License");
 *     you may not use this file except in compliance with the License.
 *     You may obtain a copy of the License at http://www.apache.org/licenses/LICENSE-2.0
 *   * MIT license: http://opensource.org/licenses/MIT
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the applicable License for the specific language governing permissions and
 * limitations under that License.
 */

use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;
use tracing::trace;

use crate::common::ChopstickId;

/// An exclusively owned resource shared by the two philosophers on either side of it.
///
/// Ownership is a single atomic flag. [`try_acquire`](Self::try_acquire) never
/// blocks; [`acquire`](Self::acquire) parks the caller until a
/// [`release`](Self::release) wakes it or the supplied token is cancelled.
/// The chopstick never talks to observers; the philosopher holding it does.
#[derive(Debug)]
pub struct Chopstick {
    id: ChopstickId,
    in_use: AtomicBool,
    released: Notify,
}

impl Chopstick {
    /// Creates a free chopstick at position `id`.
    #[must_use]
    pub fn new(id: ChopstickId) -> Self {
        Self {
            id,
            in_use: AtomicBool::new(false),
            released: Notify::new(),
        }
    }

    /// Position on the ring.
    #[inline]
    #[must_use]
    pub const fn id(&self) -> ChopstickId {
        self.id
    }

    /// Whether someone currently holds the chopstick.
    #[inline]
    #[must_use]
    pub fn is_held(&self) -> bool {
        self.in_use.load(Ordering::Acquire)
    }

    /// Takes the chopstick if it is free.
    ///
    /// Returns `false`, with no side effects, when it is already held.
    #[inline]
    pub fn try_acquire(&self) -> bool {
        self.in_use
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Puts the chopstick down and wakes anyone blocked in [`acquire`](Self::acquire).
    ///
    /// Releasing a chopstick nobody holds does nothing. When several callers
    /// race to release, exactly one observes `true`.
    pub fn release(&self) -> bool {
        if self.in_use.swap(false, Ordering::AcqRel) {
            self.released.notify_waiters();
            true
        } else {
            trace!(chopstick = self.id, "release ignored, chopstick was not held");
            false
        }
    }

    /// Waits until the chopstick is taken by the caller or `cancel` fires.
    ///
    /// Returns `true` once the caller holds the chopstick. Returns `false`
    /// without holding it if the token is cancelled first.
    pub async fn acquire(&self, cancel: &CancellationToken) -> bool {
        loop {
            if cancel.is_cancelled() {
                return false;
            }
            // Register for the wake-up before looking at the flag, so a
            // release between the check and the wait is not missed.
            let released = self.released.notified();
            tokio::pin!(released);
            released.as_mut().enable();

            if self.try_acquire() {
                return true;
            }
            trace!(chopstick = self.id, "chopstick busy, waiting for release");

            tokio::select! {
                () = cancel.cancelled() => return false,
                () = &mut released => {}
            }
        }
    }
}
