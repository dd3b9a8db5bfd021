//! Ticket lock implementation

use std::fmt;
use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::{Condvar, Mutex, MutexGuard};

/// Position in the admission order of a [`TicketLock`].
///
/// Tickets are handed out by [`TicketLock::ticket`] and consumed by
/// [`TicketLock::enter`]. A ticket must be entered exactly once; a ticket
/// that is issued but never entered stalls every later holder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Ticket(u64);

impl Ticket {
    /// Sequence number of this ticket (0-based)
    pub fn number(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for Ticket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// FIFO mutual exclusion around a value of type `T`.
///
/// Issuance and admission are two atomic counters. Waiters sleep on a
/// condition variable guarded by `gate` and never poll. The protected value
/// sits behind its own mutex, which is only ever taken by the admitted
/// holder and is therefore uncontended.
pub struct TicketLock<T> {
    next_ticket: AtomicU64,
    now_serving: AtomicU64,
    gate: Mutex<()>,
    turn: Condvar,
    data: Mutex<T>,
}

impl<T> TicketLock<T> {
    /// Create a lock around `value`
    pub fn new(value: T) -> Self {
        Self {
            next_ticket: AtomicU64::new(0),
            now_serving: AtomicU64::new(0),
            gate: Mutex::new(()),
            turn: Condvar::new(),
            data: Mutex::new(value),
        }
    }

    /// Reserve the next place in line without waiting.
    pub fn ticket(&self) -> Ticket {
        Ticket(self.next_ticket.fetch_add(1, Ordering::SeqCst))
    }

    /// Block until `ticket` is at the head of the line, then return the guard.
    ///
    /// # Panics
    ///
    /// Panics if `ticket` was already served or was never issued by this
    /// lock. Both would otherwise wait forever.
    pub fn enter(&self, ticket: Ticket) -> TicketGuard<'_, T> {
        assert!(
            ticket.0 < self.next_ticket.load(Ordering::SeqCst),
            "ticket {} was not issued by this lock",
            ticket
        );

        let mut gate = self.gate.lock();
        loop {
            let serving = self.now_serving.load(Ordering::SeqCst);
            if serving == ticket.0 {
                break;
            }
            assert!(
                serving < ticket.0,
                "ticket {} entered after it was served (now serving #{})",
                ticket,
                serving
            );
            self.turn.wait(&mut gate);
        }
        drop(gate);

        TicketGuard {
            lock: self,
            ticket,
            data: self.data.lock(),
        }
    }

    /// Take a ticket and wait for it. Equivalent to `enter(ticket())`.
    pub fn acquire(&self) -> TicketGuard<'_, T> {
        let ticket = self.ticket();
        self.enter(ticket)
    }

    /// Ticket currently admitted (or next to be admitted when the lock is free)
    pub fn now_serving(&self) -> u64 {
        self.now_serving.load(Ordering::SeqCst)
    }

    /// Number of tickets issued so far
    pub fn issued(&self) -> u64 {
        self.next_ticket.load(Ordering::SeqCst)
    }

    /// Consume the lock and return the protected value
    pub fn into_inner(self) -> T {
        self.data.into_inner()
    }

    fn release(&self, ticket: Ticket) {
        if self
            .now_serving
            .compare_exchange(ticket.0, ticket.0 + 1, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            // Serving order is corrupt; continuing would reorder writes.
            panic!(
                "ticket lock released with {} but now serving #{}",
                ticket,
                self.now_serving.load(Ordering::SeqCst)
            );
        }

        // Taking the gate orders this wakeup after any waiter's check.
        let _gate = self.gate.lock();
        self.turn.notify_all();
    }
}

impl<T: Default> Default for TicketLock<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T> fmt::Debug for TicketLock<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TicketLock")
            .field("issued", &self.issued())
            .field("now_serving", &self.now_serving())
            .finish_non_exhaustive()
    }
}

/// Access to the value inside a [`TicketLock`]; releases the ticket on drop.
pub struct TicketGuard<'a, T> {
    lock: &'a TicketLock<T>,
    ticket: Ticket,
    data: MutexGuard<'a, T>,
}

impl<T> TicketGuard<'_, T> {
    /// Ticket this guard was admitted with
    pub fn ticket(&self) -> Ticket {
        self.ticket
    }
}

impl<T> Deref for TicketGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.data
    }
}

impl<T> DerefMut for TicketGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.data
    }
}

impl<T> Drop for TicketGuard<'_, T> {
    fn drop(&mut self) {
        // `data` is unlocked right after this body; the next holder waits
        // on it for at most that long.
        self.lock.release(self.ticket);
    }
}
