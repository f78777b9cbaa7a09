//! Reschedule chains.
//!
//! A chain is a root booking (no `original_id`) plus at most one live
//! `RescheduledTarget` pointing back at it. Rescheduling any member of a chain
//! retires the root and replaces whatever target it had; deleting the target
//! puts the root back on the agenda.

use std::collections::HashSet;

use ulid::Ulid;

use crate::limits::MAX_CHAIN_DEPTH;
use crate::model::*;

/// Result of a reschedule: the new collection plus the two bookings it touched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rescheduled {
    pub bookings: Vec<Booking>,
    /// Root after retirement (`RescheduledSource`).
    pub root: Booking,
    /// The new live booking (`RescheduledTarget`).
    pub target: Booking,
}

/// Result of a delete. `removed` is empty when the booking was already gone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deleted {
    pub bookings: Vec<Booking>,
    pub removed: Vec<Ulid>,
    /// Root put back to `Scheduled` when a target was deleted.
    pub restored: Option<Ulid>,
}

/// Follow `original_id` back to the chain root.
///
/// Stops at the last booking that resolved when a reference dangles, loops back
/// on itself, or the walk exceeds `MAX_CHAIN_DEPTH` hops.
pub fn resolve_root<'a>(booking: &'a Booking, all: &'a [Booking]) -> &'a Booking {
    let mut current = booking;
    let mut visited = HashSet::new();
    visited.insert(current.id);

    while let Some(parent_id) = current.original_id {
        if visited.len() > MAX_CHAIN_DEPTH {
            break;
        }
        let Some(parent) = all.iter().find(|b| b.id == parent_id) else {
            break;
        };
        if !visited.insert(parent.id) {
            break;
        }
        current = parent;
    }
    current
}

/// Move `target` (or the chain it belongs to) to a new slot.
///
/// Returns `None` without touching anything when `target` is not in `all` or
/// `fields` is incomplete. Every earlier target of the chain is discarded: the
/// store only ever holds the root and the current live booking.
pub fn reschedule(
    target: &Booking,
    fields: BookingFields,
    all: &[Booking],
    new_id: Ulid,
) -> Option<Rescheduled> {
    if !fields.is_complete() {
        return None;
    }
    let stored = all.iter().find(|b| b.id == target.id)?;
    let root = resolve_root(stored, all);
    let root_id = root.id;

    let mut updated_root = root.clone();
    updated_root.status = BookingStatus::RescheduledSource;

    let new_target = Booking {
        id: new_id,
        slot: fields.slot,
        student: fields.student,
        instructor: fields.instructor,
        status: BookingStatus::RescheduledTarget,
        original_id: Some(root_id),
    };

    let mut bookings: Vec<Booking> = all
        .iter()
        .filter(|b| b.id != root_id && b.original_id != Some(root_id))
        .cloned()
        .collect();
    bookings.push(updated_root.clone());
    bookings.push(new_target.clone());

    Some(Rescheduled {
        bookings,
        root: updated_root,
        target: new_target,
    })
}

/// Remove a booking, branching on its stored status:
/// - target: the root it points at goes back to `Scheduled`;
/// - source: every booking pointing at it goes too;
/// - scheduled: only the booking itself.
///
/// Deleting a booking that is not in `all` returns `all` unchanged.
pub fn delete_booking(booking: &Booking, all: &[Booking]) -> Deleted {
    let Some(stored) = all.iter().find(|b| b.id == booking.id) else {
        return Deleted {
            bookings: all.to_vec(),
            removed: Vec::new(),
            restored: None,
        };
    };
    let id = stored.id;

    match stored.status {
        BookingStatus::RescheduledTarget => {
            let origin = stored.original_id;
            let mut restored = None;
            let bookings = all
                .iter()
                .filter(|b| b.id != id)
                .map(|b| {
                    let mut b = b.clone();
                    if Some(b.id) == origin {
                        b.status = BookingStatus::Scheduled;
                        restored = Some(b.id);
                    }
                    b
                })
                .collect();
            Deleted {
                bookings,
                removed: vec![id],
                restored,
            }
        }
        BookingStatus::RescheduledSource => {
            let (removed, bookings): (Vec<Booking>, Vec<Booking>) = all
                .iter()
                .cloned()
                .partition(|b| b.id == id || b.original_id == Some(id));
            Deleted {
                bookings,
                removed: removed.into_iter().map(|b| b.id).collect(),
                restored: None,
            }
        }
        BookingStatus::Scheduled => Deleted {
            bookings: all.iter().filter(|b| b.id != id).cloned().collect(),
            removed: vec![id],
            restored: None,
        },
    }
}

/// The chain `booking_id` belongs to, as currently visible.
pub fn chain_of(booking_id: Ulid, all: &[Booking]) -> Option<ChainView> {
    let booking = all.iter().find(|b| b.id == booking_id)?;
    let root = resolve_root(booking, all);
    let live = all
        .iter()
        .find(|b| b.original_id == Some(root.id))
        .cloned();
    Some(ChainView {
        root: root.clone(),
        live,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn booking(day: DayIndex, time: &str, student: &str) -> Booking {
        Booking::scheduled(Ulid::new(), BookingFields::new(Slot::new(day, time), student, "Ana"))
    }

    fn fields(day: DayIndex, time: &str) -> BookingFields {
        BookingFields::new(Slot::new(day, time), "Maria", "Ana")
    }

    fn find(all: &[Booking], id: Ulid) -> &Booking {
        all.iter().find(|b| b.id == id).unwrap()
    }

    #[test]
    fn root_of_plain_booking_is_itself() {
        let a = booking(1, "08:00", "Maria");
        let all = vec![a.clone()];
        assert_eq!(resolve_root(&a, &all).id, a.id);
    }

    #[test]
    fn root_walks_multiple_hops() {
        let a = booking(1, "08:00", "Maria");
        let mut b = booking(2, "09:00", "Maria");
        b.original_id = Some(a.id);
        let mut c = booking(3, "10:00", "Maria");
        c.original_id = Some(b.id);
        let all = vec![a.clone(), b, c.clone()];
        assert_eq!(resolve_root(&c, &all).id, a.id);
    }

    #[test]
    fn dangling_reference_stops_at_last_resolved() {
        let mut b = booking(2, "09:00", "Maria");
        b.original_id = Some(Ulid::new());
        let mut c = booking(3, "10:00", "Maria");
        c.original_id = Some(b.id);
        let all = vec![b.clone(), c.clone()];
        assert_eq!(resolve_root(&c, &all).id, b.id);
    }

    #[test]
    fn cycle_terminates() {
        let mut a = booking(1, "08:00", "Maria");
        let mut b = booking(2, "09:00", "Maria");
        a.original_id = Some(b.id);
        b.original_id = Some(a.id);
        let all = vec![a.clone(), b.clone()];
        let root = resolve_root(&a, &all);
        assert_eq!(root.id, b.id);
    }

    #[test]
    fn reschedule_then_reschedule_again_keeps_one_hop() {
        let a = booking(1, "08:00", "Maria");
        let other = booking(4, "07:00", "João");
        let all = vec![a.clone(), other.clone()];

        let first = reschedule(&a, fields(3, "10:00"), &all, Ulid::new()).unwrap();
        let b = first.target.clone();
        assert_eq!(find(&first.bookings, a.id).status, BookingStatus::RescheduledSource);
        assert_eq!(b.status, BookingStatus::RescheduledTarget);
        assert_eq!(b.original_id, Some(a.id));
        assert_eq!(b.slot, Slot::new(3, "10:00"));

        let second = reschedule(&b, fields(5, "14:00"), &first.bookings, Ulid::new()).unwrap();
        let c = second.target.clone();
        assert_eq!(second.root.id, a.id);
        assert_eq!(c.original_id, Some(a.id));
        assert!(second.bookings.iter().all(|x| x.id != b.id));
        assert_eq!(second.bookings.len(), 3);
        assert_eq!(find(&second.bookings, other.id), &other);

        let deleted = delete_booking(&c, &second.bookings);
        assert_eq!(deleted.removed, vec![c.id]);
        assert_eq!(deleted.restored, Some(a.id));
        assert_eq!(find(&deleted.bookings, a.id).status, BookingStatus::Scheduled);
        assert_eq!(deleted.bookings.len(), 2);
    }

    #[test]
    fn reschedule_aborts_on_missing_target() {
        let a = booking(1, "08:00", "Maria");
        assert!(reschedule(&a, fields(3, "10:00"), &[], Ulid::new()).is_none());
    }

    #[test]
    fn reschedule_aborts_on_incomplete_fields() {
        let a = booking(1, "08:00", "Maria");
        let all = vec![a.clone()];
        let empty = BookingFields::new(Slot::new(3, "10:00"), "Maria", "");
        assert!(reschedule(&a, empty, &all, Ulid::new()).is_none());
    }

    #[test]
    fn rescheduling_the_source_marker_moves_the_chain() {
        let a = booking(1, "08:00", "Maria");
        let first = reschedule(&a, fields(3, "10:00"), &[a.clone()], Ulid::new()).unwrap();
        let source = find(&first.bookings, a.id).clone();
        let second = reschedule(&source, fields(6, "09:00"), &first.bookings, Ulid::new()).unwrap();
        assert_eq!(second.root.id, a.id);
        assert_eq!(second.bookings.len(), 2);
        assert!(second.bookings.iter().all(|b| b.id != first.target.id));
    }

    #[test]
    fn delete_source_cascades() {
        let a = booking(1, "08:00", "Maria");
        let other = booking(2, "08:00", "João");
        let first = reschedule(&a, fields(3, "10:00"), &[a.clone(), other.clone()], Ulid::new()).unwrap();
        let source = find(&first.bookings, a.id).clone();

        let deleted = delete_booking(&source, &first.bookings);
        assert_eq!(deleted.bookings, vec![other]);
        assert_eq!(deleted.removed.len(), 2);
        assert!(deleted.removed.contains(&a.id));
        assert!(deleted.removed.contains(&first.target.id));
    }

    #[test]
    fn delete_scheduled_removes_only_itself() {
        let a = booking(1, "08:00", "Maria");
        let b = booking(1, "09:00", "João");
        let deleted = delete_booking(&a, &[a.clone(), b.clone()]);
        assert_eq!(deleted.bookings, vec![b]);
        assert_eq!(deleted.removed, vec![a.id]);
    }

    #[test]
    fn delete_is_idempotent() {
        let a = booking(1, "08:00", "Maria");
        let first = reschedule(&a, fields(3, "10:00"), &[a.clone()], Ulid::new()).unwrap();
        let once = delete_booking(&first.target, &first.bookings);
        let twice = delete_booking(&first.target, &once.bookings);
        assert_eq!(once.bookings, twice.bookings);
        assert!(twice.removed.is_empty());
        assert_eq!(twice.restored, None);
    }

    #[test]
    fn delete_uses_stored_status_not_callers_copy() {
        let a = booking(1, "08:00", "Maria");
        let first = reschedule(&a, fields(3, "10:00"), &[a.clone()], Ulid::new()).unwrap();
        // Caller still holds the pre-reschedule copy of `a`.
        let deleted = delete_booking(&a, &first.bookings);
        assert!(deleted.bookings.is_empty());
    }

    #[test]
    fn chain_view_reports_root_and_live() {
        let a = booking(1, "08:00", "Maria");
        let first = reschedule(&a, fields(3, "10:00"), &[a.clone()], Ulid::new()).unwrap();
        let view = chain_of(first.target.id, &first.bookings).unwrap();
        assert_eq!(view.root.id, a.id);
        assert_eq!(view.live.map(|b| b.id), Some(first.target.id));

        let plain = chain_of(a.id, &[a.clone()]).unwrap();
        assert_eq!(plain.live, None);
        assert!(chain_of(Ulid::new(), &[a]).is_none());
    }
}
