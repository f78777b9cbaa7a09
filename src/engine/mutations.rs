use chrono::NaiveDate;
use tracing::{debug, info};
use ulid::Ulid;

use crate::dispatcher::Notification;
use crate::limits::*;
use crate::model::*;

use super::allocation::{allocation_for, bulk_allocations};
use super::chain;
use super::{Engine, EngineError};

fn check_name(name: &str, field: &'static str) -> Result<(), EngineError> {
    if name.trim().is_empty() {
        return Err(EngineError::InvalidField(field));
    }
    if name.len() > MAX_NAME_LEN {
        return Err(EngineError::LimitExceeded("name too long"));
    }
    Ok(())
}

fn check_fields_len(fields: &BookingFields) -> Result<(), EngineError> {
    if fields.student.len() > MAX_NAME_LEN
        || fields.instructor.len() > MAX_NAME_LEN
        || fields.slot.time.len() > MAX_NAME_LEN
    {
        return Err(EngineError::LimitExceeded("name too long"));
    }
    Ok(())
}

fn aborted(op: &'static str) {
    metrics::counter!(crate::observability::TRANSITIONS_ABORTED_TOTAL, "op" => op).increment(1);
}

/// Insert `item`, or replace the element with the same id. Returns true on insert.
fn upsert<T>(items: &mut Vec<T>, item: T, id_of: impl Fn(&T) -> Ulid) -> bool {
    let id = id_of(&item);
    match items.iter_mut().find(|existing| id_of(existing) == id) {
        Some(existing) => {
            *existing = item;
            false
        }
        None => {
            items.push(item);
            true
        }
    }
}

fn remove_by_id<T>(items: &mut Vec<T>, id: Ulid, id_of: impl Fn(&T) -> Ulid) -> Result<(), EngineError> {
    let pos = items
        .iter()
        .position(|item| id_of(item) == id)
        .ok_or(EngineError::NotFound(id))?;
    items.remove(pos);
    Ok(())
}

/// `1234.5` → `"1234,50"`.
fn format_amount(amount: f64) -> String {
    format!("{amount:.2}").replace('.', ",")
}

impl Engine {
    // ── Bookings ─────────────────────────────────────────────

    /// Add a `Scheduled` booking. `None` when a required field is empty.
    pub async fn create_booking(&self, fields: BookingFields) -> Result<Option<Booking>, EngineError> {
        if !fields.is_complete() {
            debug!("create_booking aborted: incomplete fields");
            aborted("create_booking");
            return Ok(None);
        }
        check_fields_len(&fields)?;

        let mut guard = self.state.write().await;
        if guard.bookings.len() >= MAX_BOOKINGS_PER_TENANT {
            return Err(EngineError::LimitExceeded("too many bookings"));
        }

        let booking = Booking::scheduled(Ulid::new(), fields);
        guard.bookings.push(booking.clone());

        let notification = Notification::for_student(&guard, &booking.student, TemplateKey::ClassReminder)
            .map(|n| {
                n.var("dia", day_name(booking.slot.day))
                    .var("hora", booking.slot.time.clone())
            });
        self.commit(&guard, Event::BookingCreated { booking: booking.clone() }).await;
        drop(guard);

        self.emit(notification);
        metrics::counter!(crate::observability::BOOKINGS_CREATED_TOTAL).increment(1);
        Ok(Some(booking))
    }

    /// Move the chain `id` belongs to onto a new slot. Returns the new live booking,
    /// or `None` when `id` is unknown or a required field is empty.
    pub async fn reschedule_booking(
        &self,
        id: Ulid,
        fields: BookingFields,
    ) -> Result<Option<Booking>, EngineError> {
        check_fields_len(&fields)?;

        let mut guard = self.state.write().await;
        let Some(target) = guard.booking(id).cloned() else {
            debug!("reschedule of {id} aborted: booking not found");
            aborted("reschedule_booking");
            return Ok(None);
        };
        let Some(outcome) = chain::reschedule(&target, fields, &guard.bookings, Ulid::new()) else {
            debug!("reschedule of {id} aborted: incomplete fields");
            aborted("reschedule_booking");
            return Ok(None);
        };
        // Grows by one only when the root had no live target yet.
        if outcome.bookings.len() > MAX_BOOKINGS_PER_TENANT {
            return Err(EngineError::LimitExceeded("too many bookings"));
        }

        guard.bookings = outcome.bookings;
        let new_slot = &outcome.target.slot;
        let notification = Notification::for_student(&guard, &outcome.root.student, TemplateKey::RescheduleNotification)
            .map(|n| {
                n.var("novo_horario", new_slot.describe())
                    .var("dia", day_name(new_slot.day))
                    .var("hora", new_slot.time.clone())
            });
        let event = Event::BookingRescheduled {
            root_id: outcome.root.id,
            booking: outcome.target.clone(),
        };
        self.commit(&guard, event).await;
        drop(guard);

        info!("rescheduled chain {} to {}", outcome.root.id, new_slot.describe());
        self.emit(notification);
        metrics::counter!(crate::observability::BOOKINGS_RESCHEDULED_TOTAL).increment(1);
        Ok(Some(outcome.target))
    }

    /// Delete a booking and whatever its status drags along. Returns the removed ids;
    /// empty when the booking was already gone.
    pub async fn delete_booking(&self, id: Ulid) -> Vec<Ulid> {
        let mut guard = self.state.write().await;
        let Some(booking) = guard.booking(id).cloned() else {
            debug!("delete of {id}: already gone");
            return Vec::new();
        };

        let outcome = chain::delete_booking(&booking, &guard.bookings);
        guard.bookings = outcome.bookings;
        let event = Event::BookingsDeleted {
            ids: outcome.removed.clone(),
            restored: outcome.restored,
        };
        self.commit(&guard, event).await;

        metrics::counter!(crate::observability::BOOKINGS_DELETED_TOTAL)
            .increment(outcome.removed.len() as u64);
        outcome.removed
    }

    // ── Equipment allocation ─────────────────────────────────

    /// Allocate one hour. `None` when the instructor already holds that slot
    /// or a required field is empty.
    pub async fn allocate(
        &self,
        day: DayIndex,
        time: &str,
        instructor: &str,
        equipment: &str,
    ) -> Result<Option<Allocation>, EngineError> {
        if !Slot::new(day, time).is_valid() || instructor.trim().is_empty() || equipment.trim().is_empty() {
            aborted("allocate");
            return Ok(None);
        }
        if instructor.len() > MAX_NAME_LEN || equipment.len() > MAX_NAME_LEN || time.len() > MAX_NAME_LEN {
            return Err(EngineError::LimitExceeded("name too long"));
        }

        let mut guard = self.state.write().await;
        if guard.allocations.len() >= MAX_ALLOCATIONS_PER_TENANT {
            return Err(EngineError::LimitExceeded("too many allocations"));
        }
        let Some(allocation) = allocation_for(day, time, instructor, equipment, &guard.allocations) else {
            debug!("{instructor} already allocated on day {day} at {time}");
            return Ok(None);
        };

        guard.allocations.push(allocation.clone());
        let event = Event::AllocationsAdded {
            allocations: vec![allocation.clone()],
        };
        self.commit(&guard, event).await;
        metrics::counter!(crate::observability::ALLOCATIONS_CREATED_TOTAL).increment(1);
        Ok(Some(allocation))
    }

    /// Allocate every free hour of `[start_hour, end_hour)`. Returns what was created.
    pub async fn bulk_allocate(&self, req: BulkAllocation) -> Result<Vec<Allocation>, EngineError> {
        if req.instructor.len() > MAX_NAME_LEN || req.equipment.len() > MAX_NAME_LEN {
            return Err(EngineError::LimitExceeded("name too long"));
        }

        let mut guard = self.state.write().await;
        let created = bulk_allocations(&req, &guard.allocations)?;
        if created.is_empty() {
            return Ok(created);
        }
        if guard.allocations.len() + created.len() > MAX_ALLOCATIONS_PER_TENANT {
            return Err(EngineError::LimitExceeded("too many allocations"));
        }

        guard.allocations.extend(created.iter().cloned());
        let event = Event::AllocationsAdded {
            allocations: created.clone(),
        };
        self.commit(&guard, event).await;
        metrics::counter!(crate::observability::ALLOCATIONS_CREATED_TOTAL)
            .increment(created.len() as u64);
        Ok(created)
    }

    pub async fn remove_allocation(&self, id: Ulid) -> Result<(), EngineError> {
        let mut guard = self.state.write().await;
        remove_by_id(&mut guard.allocations, id, |a| a.id)?;
        self.commit(&guard, Event::AllocationRemoved { id }).await;
        Ok(())
    }

    // ── Records ──────────────────────────────────────────────

    /// Insert or replace a student by id. New students get a welcome message.
    pub async fn save_student(&self, student: Student) -> Result<Student, EngineError> {
        check_name(&student.name, "name")?;
        if !student.monthly_fee.is_finite() || student.monthly_fee < 0.0 {
            return Err(EngineError::InvalidField("monthly_fee"));
        }

        let mut guard = self.state.write().await;
        let is_new = guard.students.iter().all(|s| s.id != student.id);
        if is_new && guard.students.len() >= MAX_STUDENTS_PER_TENANT {
            return Err(EngineError::LimitExceeded("too many students"));
        }
        upsert(&mut guard.students, student.clone(), |s| s.id);

        let notification = if is_new {
            Notification::for_student(&guard, &student.name, TemplateKey::WelcomeMessage)
        } else {
            None
        };
        self.commit(&guard, Event::StudentSaved { student: student.clone() }).await;
        drop(guard);

        self.emit(notification);
        Ok(student)
    }

    pub async fn remove_student(&self, id: Ulid) -> Result<(), EngineError> {
        let mut guard = self.state.write().await;
        remove_by_id(&mut guard.students, id, |s| s.id)?;
        self.commit(&guard, Event::StudentRemoved { id }).await;
        Ok(())
    }

    pub async fn save_instructor(&self, instructor: Instructor) -> Result<Instructor, EngineError> {
        check_name(&instructor.name, "name")?;
        let mut guard = self.state.write().await;
        upsert(&mut guard.instructors, instructor.clone(), |i| i.id);
        self.commit(&guard, Event::InstructorSaved { instructor: instructor.clone() }).await;
        Ok(instructor)
    }

    pub async fn remove_instructor(&self, id: Ulid) -> Result<(), EngineError> {
        let mut guard = self.state.write().await;
        remove_by_id(&mut guard.instructors, id, |i| i.id)?;
        self.commit(&guard, Event::InstructorRemoved { id }).await;
        Ok(())
    }

    pub async fn save_equipment(&self, equipment: Equipment) -> Result<Equipment, EngineError> {
        check_name(&equipment.name, "name")?;
        let mut guard = self.state.write().await;
        upsert(&mut guard.equipment, equipment.clone(), |e| e.id);
        self.commit(&guard, Event::EquipmentSaved { equipment: equipment.clone() }).await;
        Ok(equipment)
    }

    pub async fn remove_equipment(&self, id: Ulid) -> Result<(), EngineError> {
        let mut guard = self.state.write().await;
        remove_by_id(&mut guard.equipment, id, |e| e.id)?;
        self.commit(&guard, Event::EquipmentRemoved { id }).await;
        Ok(())
    }

    /// Record a payment from a known student and confirm it to them.
    pub async fn record_payment(
        &self,
        student: &str,
        amount: f64,
        paid_on: NaiveDate,
        method: PaymentMethod,
    ) -> Result<Payment, EngineError> {
        if !amount.is_finite() || amount <= 0.0 {
            return Err(EngineError::InvalidField("amount"));
        }

        let mut guard = self.state.write().await;
        if guard.student_by_name(student).is_none() {
            return Err(EngineError::UnknownStudent(student.to_string()));
        }
        if guard.payments.len() >= MAX_PAYMENTS_PER_TENANT {
            return Err(EngineError::LimitExceeded("too many payments"));
        }

        let payment = Payment {
            id: Ulid::new(),
            student: student.to_string(),
            amount,
            paid_on,
            method,
        };
        guard.payments.push(payment.clone());
        let notification = Notification::for_student(&guard, student, TemplateKey::PaymentConfirmation)
            .map(|n| n.var("valor", format_amount(amount)));
        self.commit(&guard, Event::PaymentRecorded { payment: payment.clone() }).await;
        drop(guard);

        self.emit(notification);
        Ok(payment)
    }

    pub async fn update_settings(&self, settings: StudioSettings) -> Result<(), EngineError> {
        check_name(&settings.studio_name, "studio_name")?;
        if settings.templates.longest() > MAX_TEMPLATE_LEN {
            return Err(EngineError::LimitExceeded("template too long"));
        }
        let mut guard = self.state.write().await;
        guard.settings = settings;
        self.commit(&guard, Event::SettingsUpdated).await;
        Ok(())
    }
}
