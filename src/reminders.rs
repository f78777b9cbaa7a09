use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use tracing::info;

use crate::dispatcher::Notification;
use crate::engine::Engine;
use crate::model::*;

/// Messages due on `today`: class reminders for today's live bookings, birthday
/// greetings and plan-expiry warnings for active students.
pub fn due_reminders(state: &StudioState, today: NaiveDate) -> Vec<Notification> {
    let mut due = Vec::new();
    let weekday = day_index(today);

    for booking in state.bookings.iter().filter(|b| b.is_live() && b.slot.day == weekday) {
        if let Some(n) = Notification::for_student(state, &booking.student, TemplateKey::ClassReminder) {
            due.push(
                n.var("dia", "hoje")
                    .var("hora", booking.slot.time.clone()),
            );
        }
    }

    let warning_days = state.settings.expiry_warning_days;
    for student in state.students.iter().filter(|s| s.active) {
        if student.has_birthday_on(today)
            && let Some(n) = Notification::for_student(state, &student.name, TemplateKey::BirthdayMessage)
        {
            due.push(n);
        }
        if student.plan_expires_within(today, warning_days)
            && let Some(expires) = student.plan_expires_at
            && let Some(n) = Notification::for_student(state, &student.name, TemplateKey::ExpiryWarning)
        {
            due.push(n.var("vencimento", expires.format("%d/%m/%Y").to_string()));
        }
    }

    due
}

/// Background task: once per calendar day, hand the day's reminders to the dispatcher.
pub async fn run_reminders(engine: Arc<Engine>, period: Duration) {
    let mut interval = tokio::time::interval(period);
    let mut last_run: Option<NaiveDate> = None;
    loop {
        interval.tick().await;
        let today = chrono::Local::now().date_naive();
        if last_run == Some(today) {
            continue;
        }
        last_run = Some(today);
        let sent = engine.send_due_reminders(today).await;
        info!("reminder sweep for {today}: {sent} notifications");
    }
}
