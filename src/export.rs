//! One-way CSV export of tabular views. Nothing reads these files back.

use crate::model::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportKind {
    Agenda,
    Allocations,
    Students,
    Equipment,
    Payments,
}

impl ExportKind {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "agenda" => Some(ExportKind::Agenda),
            "allocations" => Some(ExportKind::Allocations),
            "students" => Some(ExportKind::Students),
            "equipment" => Some(ExportKind::Equipment),
            "payments" => Some(ExportKind::Payments),
            _ => None,
        }
    }
}

pub fn render(kind: ExportKind, state: &StudioState) -> String {
    match kind {
        ExportKind::Agenda => agenda_csv(&state.bookings),
        ExportKind::Allocations => allocations_csv(&state.allocations),
        ExportKind::Students => students_csv(&state.students),
        ExportKind::Equipment => equipment_csv(&state.equipment),
        ExportKind::Payments => payments_csv(&state.payments),
    }
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

fn push_row(out: &mut String, fields: &[&str]) {
    let row: Vec<String> = fields.iter().map(|f| csv_field(f)).collect();
    out.push_str(&row.join(","));
    out.push('\n');
}

pub fn agenda_csv(bookings: &[Booking]) -> String {
    let mut rows: Vec<&Booking> = bookings.iter().collect();
    rows.sort_by(|a, b| (a.slot.day, &a.slot.time).cmp(&(b.slot.day, &b.slot.time)));

    let mut out = String::new();
    push_row(&mut out, &["day", "time", "student", "instructor", "status", "original_id"]);
    for b in rows {
        let original = b.original_id.map(|id| id.to_string()).unwrap_or_default();
        push_row(
            &mut out,
            &[
                day_name(b.slot.day),
                b.slot.time.as_str(),
                b.student.as_str(),
                b.instructor.as_str(),
                b.status.label(),
                original.as_str(),
            ],
        );
    }
    out
}

pub fn allocations_csv(allocations: &[Allocation]) -> String {
    let mut rows: Vec<&Allocation> = allocations.iter().collect();
    rows.sort_by(|a, b| (a.day, &a.time, &a.instructor).cmp(&(b.day, &b.time, &b.instructor)));

    let mut out = String::new();
    push_row(&mut out, &["day", "time", "instructor", "equipment"]);
    for a in rows {
        push_row(&mut out, &[day_name(a.day), a.time.as_str(), a.instructor.as_str(), a.equipment.as_str()]);
    }
    out
}

pub fn students_csv(students: &[Student]) -> String {
    let mut out = String::new();
    push_row(
        &mut out,
        &["name", "phone", "email", "plan", "plan_expires_at", "monthly_fee", "active"],
    );
    for s in students {
        let expires = s.plan_expires_at.map(|d| d.to_string()).unwrap_or_default();
        let fee = format!("{:.2}", s.monthly_fee);
        push_row(
            &mut out,
            &[
                s.name.as_str(),
                s.phone.as_deref().unwrap_or(""),
                s.email.as_deref().unwrap_or(""),
                s.plan.as_deref().unwrap_or(""),
                expires.as_str(),
                fee.as_str(),
                if s.active { "yes" } else { "no" },
            ],
        );
    }
    out
}

pub fn equipment_csv(equipment: &[Equipment]) -> String {
    let mut rows: Vec<&Equipment> = equipment.iter().collect();
    rows.sort_by(|a, b| a.name.cmp(&b.name));

    let mut out = String::new();
    push_row(&mut out, &["name", "kind"]);
    for e in rows {
        push_row(&mut out, &[e.name.as_str(), e.kind.label()]);
    }
    out
}

pub fn payments_csv(payments: &[Payment]) -> String {
    let mut rows: Vec<&Payment> = payments.iter().collect();
    rows.sort_by_key(|p| p.paid_on);

    let mut out = String::new();
    push_row(&mut out, &["paid_on", "student", "amount", "method"]);
    for p in rows {
        let paid_on = p.paid_on.to_string();
        let amount = format!("{:.2}", p.amount);
        push_row(&mut out, &[paid_on.as_str(), p.student.as_str(), amount.as_str(), p.method.label()]);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use ulid::Ulid;

    #[test]
    fn parse_kind() {
        assert_eq!(ExportKind::parse("Agenda"), Some(ExportKind::Agenda));
        assert_eq!(ExportKind::parse(" payments "), Some(ExportKind::Payments));
        assert_eq!(ExportKind::parse("xlsx"), None);
    }

    #[test]
    fn fields_with_commas_and_quotes_are_quoted() {
        assert_eq!(csv_field("plain"), "plain");
        assert_eq!(csv_field("Silva, Maria"), "\"Silva, Maria\"");
        assert_eq!(csv_field("o \"Reformer\""), "\"o \"\"Reformer\"\"\"");
    }

    #[test]
    fn agenda_sorted_by_day_then_time() {
        let late = Booking::scheduled(Ulid::new(), BookingFields::new(Slot::new(3, "10:00"), "Maria", "Ana"));
        let early = Booking::scheduled(Ulid::new(), BookingFields::new(Slot::new(1, "08:00"), "Silva, João", "Ana"));
        let csv = agenda_csv(&[late, early]);
        let lines: Vec<_> = csv.lines().collect();
        assert_eq!(lines[0], "day,time,student,instructor,status,original_id");
        assert_eq!(lines[1], "Segunda-feira,08:00,\"Silva, João\",Ana,scheduled,");
        assert_eq!(lines[2], "Quarta-feira,10:00,Maria,Ana,scheduled,");
    }

    #[test]
    fn equipment_rows_use_kind_label() {
        let chair = Equipment {
            id: Ulid::new(),
            name: "Wunda Chair".into(),
            kind: EquipmentKind::Chair,
        };
        let reformer = Equipment {
            id: Ulid::new(),
            name: "Reformer 1".into(),
            kind: EquipmentKind::Reformer,
        };
        let state = StudioState {
            equipment: vec![chair, reformer],
            ..StudioState::default()
        };
        assert_eq!(ExportKind::parse("Equipment"), Some(ExportKind::Equipment));
        assert_eq!(
            render(ExportKind::Equipment, &state),
            format!("name,kind\nReformer 1,{}\nWunda Chair,{}\n", EquipmentKind::Reformer.label(), EquipmentKind::Chair.label())
        );
    }

    #[test]
    fn payments_rows() {
        let p = Payment {
            id: Ulid::new(),
            student: "Maria".into(),
            amount: 250.0,
            paid_on: NaiveDate::from_ymd_opt(2026, 10, 5).unwrap(),
            method: PaymentMethod::Pix,
        };
        let csv = payments_csv(&[p]);
        assert_eq!(csv, "paid_on,student,amount,method\n2026-10-05,Maria,250.00,pix\n");
    }
}
