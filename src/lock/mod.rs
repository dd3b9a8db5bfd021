//! Fair Serialization Lock
//!
//! A ticket-based mutex that admits holders strictly in the order they
//! asked for entry. Writers on the run log share one of these so that the
//! order records land in the file is the order their tickets were issued.
//!
//! ```text
//! ticket()  ──► #7 ─┐
//! ticket()  ──► #8 ─┼─► enter(#n) waits until now_serving == n ─► guard
//! ticket()  ──► #9 ─┘                                             │
//!                                 drop(guard): now_serving += 1 ◄─┘
//! ```

mod ticket;

pub use ticket::{Ticket, TicketGuard, TicketLock};
