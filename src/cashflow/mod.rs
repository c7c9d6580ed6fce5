//! Planned cash flows: entries, request expansion, and the working ledger

mod entry;
mod scheduler;
mod ledger;

pub use entry::{CashFlowEntry, Direction, RecurringRuleId, EntryId};
pub use scheduler::{schedule, CashFlowRequest, Frequency, Recurrence, RequestKind, ScheduleError, MAX_OCCURRENCES};
pub use ledger::CashFlowLedger;
