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

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio_util::sync::CancellationToken;
use tracing::trace;

/// Admission control for the table: at most `capacity` philosophers may be
/// reaching for chopsticks at once.
///
/// With `capacity <= N - 1` at least one chopstick is always left for the
/// admitted philosophers to complete a pair, so someone can always eat.
#[derive(Debug)]
pub struct Waiter {
    permits: Arc<Semaphore>,
    capacity: usize,
    admitted: Arc<AtomicUsize>,
    peak: AtomicUsize,
}

/// Proof of admission. Dropping it returns the permit to the waiter.
#[derive(Debug)]
#[must_use = "dropping the permit immediately hands the seat back to the waiter"]
pub struct AdmissionPermit {
    admitted: Arc<AtomicUsize>,
    // Released after `admitted` is decremented in `drop`, so the gauge never
    // exceeds the semaphore's bound.
    _permit: OwnedSemaphorePermit,
}

impl Waiter {
    /// Creates a waiter handing out `capacity` permits.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            permits: Arc::new(Semaphore::new(capacity)),
            capacity,
            admitted: Arc::new(AtomicUsize::new(0)),
            peak: AtomicUsize::new(0),
        }
    }

    /// Total permits.
    #[inline]
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Philosophers currently past the gate.
    #[inline]
    #[must_use]
    pub fn admitted(&self) -> usize {
        self.admitted.load(Ordering::Acquire)
    }

    /// Highest number of philosophers ever past the gate at the same time.
    #[inline]
    #[must_use]
    pub fn peak_admitted(&self) -> usize {
        self.peak.load(Ordering::Acquire)
    }

    /// Waits for a permit without spinning.
    ///
    /// Returns `None` if `cancel` fires first; no permit is held in that case.
    pub async fn acquire_permit(&self, cancel: &CancellationToken) -> Option<AdmissionPermit> {
        if cancel.is_cancelled() {
            return None;
        }
        let permit = tokio::select! {
            () = cancel.cancelled() => return None,
            permit = Arc::clone(&self.permits).acquire_owned() => match permit {
                Ok(permit) => permit,
                Err(_) => return None,
            },
        };

        let now = self.admitted.fetch_add(1, Ordering::AcqRel) + 1;
        self.peak.fetch_max(now, Ordering::AcqRel);
        trace!(admitted = now, capacity = self.capacity, "permit granted");
        Some(AdmissionPermit {
            admitted: Arc::clone(&self.admitted),
            _permit: permit,
        })
    }
}

impl AdmissionPermit {
    /// Hands the permit back to the waiter.
    pub fn release(self) {
        drop(self);
    }
}

impl Drop for AdmissionPermit {
    fn drop(&mut self) {
        let left = self.admitted.fetch_sub(1, Ordering::AcqRel) - 1;
        trace!(admitted = left, "permit returned");
    }
}
