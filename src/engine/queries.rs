use std::cmp::Ordering;

use chrono::{Datelike, NaiveDate};
use ulid::Ulid;

use crate::dispatcher::Notification;
use crate::export::{self, ExportKind};
use crate::model::*;
use crate::reminders;

use super::chain;
use super::Engine;

fn by_slot(a: &Booking, b: &Booking) -> Ordering {
    (a.slot.day, &a.slot.time).cmp(&(b.slot.day, &b.slot.time))
}

impl Engine {
    pub async fn booking(&self, id: Ulid) -> Option<Booking> {
        self.state.read().await.booking(id).cloned()
    }

    /// Every booking, retired chain roots included, in store order.
    pub async fn bookings(&self) -> Vec<Booking> {
        self.state.read().await.bookings.clone()
    }

    /// Bookings that occupy a slot, ordered by day then time.
    pub async fn live_bookings(&self) -> Vec<Booking> {
        let guard = self.state.read().await;
        let mut live: Vec<Booking> = guard.bookings.iter().filter(|b| b.is_live()).cloned().collect();
        live.sort_by(by_slot);
        live
    }

    pub async fn agenda_for_day(&self, day: DayIndex) -> Vec<Booking> {
        let guard = self.state.read().await;
        let mut agenda: Vec<Booking> = guard
            .bookings
            .iter()
            .filter(|b| b.is_live() && b.slot.day == day)
            .cloned()
            .collect();
        agenda.sort_by(by_slot);
        agenda
    }

    pub async fn bookings_for_instructor(&self, instructor: &str) -> Vec<Booking> {
        let guard = self.state.read().await;
        let mut bookings: Vec<Booking> = guard
            .bookings
            .iter()
            .filter(|b| b.is_live() && b.instructor == instructor)
            .cloned()
            .collect();
        bookings.sort_by(by_slot);
        bookings
    }

    pub async fn chain(&self, id: Ulid) -> Option<ChainView> {
        chain::chain_of(id, &self.state.read().await.bookings)
    }

    pub async fn allocations_for_day(&self, day: DayIndex) -> Vec<Allocation> {
        let guard = self.state.read().await;
        let mut allocations: Vec<Allocation> = guard
            .allocations
            .iter()
            .filter(|a| a.day == day)
            .cloned()
            .collect();
        allocations.sort_by(|a, b| (&a.time, &a.instructor).cmp(&(&b.time, &b.instructor)));
        allocations
    }

    pub async fn students(&self) -> Vec<Student> {
        self.state.read().await.students.clone()
    }

    pub async fn student_by_name(&self, name: &str) -> Option<Student> {
        self.state.read().await.student_by_name(name).cloned()
    }

    pub async fn instructors(&self) -> Vec<Instructor> {
        self.state.read().await.instructors.clone()
    }

    pub async fn equipment(&self) -> Vec<Equipment> {
        self.state.read().await.equipment.clone()
    }

    pub async fn settings(&self) -> StudioSettings {
        self.state.read().await.settings.clone()
    }

    pub async fn payments_in_month(&self, year: i32, month: u32) -> Vec<Payment> {
        let guard = self.state.read().await;
        guard
            .payments
            .iter()
            .filter(|p| p.paid_on.year() == year && p.paid_on.month() == month)
            .cloned()
            .collect()
    }

    pub async fn dashboard(&self, today: NaiveDate) -> Dashboard {
        let guard = self.state.read().await;
        let weekday = day_index(today);
        let warning_days = guard.settings.expiry_warning_days;

        Dashboard {
            active_students: guard.students.iter().filter(|s| s.active).count(),
            live_bookings: guard.bookings.iter().filter(|b| b.is_live()).count(),
            classes_today: guard
                .bookings
                .iter()
                .filter(|b| b.is_live() && b.slot.day == weekday)
                .count(),
            rescheduled_chains: guard
                .bookings
                .iter()
                .filter(|b| b.status == BookingStatus::RescheduledSource)
                .count(),
            allocations_today: guard.allocations.iter().filter(|a| a.day == weekday).count(),
            revenue_this_month: guard
                .payments
                .iter()
                .filter(|p| p.paid_on.year() == today.year() && p.paid_on.month() == today.month())
                .map(|p| p.amount)
                .sum(),
            expiring_plans: guard
                .students
                .iter()
                .filter(|s| s.active && s.plan_expires_within(today, warning_days))
                .count(),
        }
    }

    pub async fn export(&self, kind: ExportKind) -> String {
        let guard = self.state.read().await;
        export::render(kind, &guard)
    }

    pub async fn due_reminders(&self, today: NaiveDate) -> Vec<Notification> {
        let guard = self.state.read().await;
        reminders::due_reminders(&guard, today)
    }

    /// Hand today's reminders to the dispatcher. Returns how many were queued.
    pub async fn send_due_reminders(&self, today: NaiveDate) -> usize {
        let due = self.due_reminders(today).await;
        let count = due.len();
        for notification in due {
            self.dispatcher.send(notification);
        }
        count
    }
}
