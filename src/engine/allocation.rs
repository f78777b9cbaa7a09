use ulid::Ulid;

use crate::model::*;

use super::EngineError;

/// An hour is taken when the instructor already has an allocation at that day and time,
/// whatever the equipment.
// TODO: equipment is not part of the key, so two instructors can hold the same machine in
// the same hour. Add it once the studio confirms machines are exclusive.
pub(crate) fn is_taken(existing: &[Allocation], day: DayIndex, time: &str, instructor: &str) -> bool {
    existing
        .iter()
        .any(|a| a.day == day && a.time == time && a.instructor == instructor)
}

/// Single allocation, or `None` when the instructor is already allocated at that slot.
pub fn allocation_for(
    day: DayIndex,
    time: &str,
    instructor: &str,
    equipment: &str,
    existing: &[Allocation],
) -> Option<Allocation> {
    if is_taken(existing, day, time, instructor) {
        return None;
    }
    Some(Allocation {
        id: Ulid::new(),
        day,
        time: time.to_string(),
        instructor: instructor.to_string(),
        equipment: equipment.to_string(),
    })
}

/// One allocation per hour in `[start_hour, end_hour)`, skipping hours already taken.
pub fn bulk_allocations(
    req: &BulkAllocation,
    existing: &[Allocation],
) -> Result<Vec<Allocation>, EngineError> {
    if req.start_hour >= req.end_hour || req.end_hour > 24 || req.day > 6 {
        return Err(EngineError::InvalidRange {
            start: req.start_hour,
            end: req.end_hour,
        });
    }
    if req.instructor.trim().is_empty() || req.equipment.trim().is_empty() {
        return Ok(Vec::new());
    }

    let created = (req.start_hour..req.end_hour)
        .map(hour_label)
        .filter_map(|time| allocation_for(req.day, &time, &req.instructor, &req.equipment, existing))
        .collect();
    Ok(created)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alloc(day: DayIndex, time: &str, instructor: &str, equipment: &str) -> Allocation {
        Allocation {
            id: Ulid::new(),
            day,
            time: time.into(),
            instructor: instructor.into(),
            equipment: equipment.into(),
        }
    }

    fn request(start_hour: u8, end_hour: u8) -> BulkAllocation {
        BulkAllocation {
            day: 0,
            instructor: "Ana".into(),
            equipment: "Reformer 1".into(),
            start_hour,
            end_hour,
        }
    }

    #[test]
    fn bulk_skips_taken_hour() {
        let existing = vec![alloc(0, "09:00", "Ana", "Cadillac")];
        let created = bulk_allocations(&request(8, 11), &existing).unwrap();
        let times: Vec<_> = created.iter().map(|a| a.time.as_str()).collect();
        assert_eq!(times, vec!["08:00", "10:00"]);
        assert!(created.iter().all(|a| a.equipment == "Reformer 1" && a.day == 0));
    }

    #[test]
    fn other_instructor_may_share_equipment() {
        let existing = vec![alloc(0, "09:00", "Bia", "Reformer 1")];
        let created = bulk_allocations(&request(9, 10), &existing).unwrap();
        assert_eq!(created.len(), 1);
    }

    #[test]
    fn other_day_does_not_collide() {
        let existing = vec![alloc(1, "09:00", "Ana", "Reformer 1")];
        assert_eq!(bulk_allocations(&request(9, 10), &existing).unwrap().len(), 1);
    }

    #[test]
    fn empty_or_inverted_range_rejected() {
        assert!(matches!(
            bulk_allocations(&request(10, 10), &[]),
            Err(EngineError::InvalidRange { start: 10, end: 10 })
        ));
        assert!(bulk_allocations(&request(11, 9), &[]).is_err());
        assert!(bulk_allocations(&request(20, 25), &[]).is_err());
    }

    #[test]
    fn full_day_range() {
        let created = bulk_allocations(&request(0, 24), &[]).unwrap();
        assert_eq!(created.len(), 24);
        assert_eq!(created[23].time, "23:00");
    }

    #[test]
    fn blank_instructor_is_noop() {
        let mut req = request(8, 9);
        req.instructor = " ".into();
        assert!(bulk_allocations(&req, &[]).unwrap().is_empty());
    }

    #[test]
    fn single_allocation_suppressed_when_taken() {
        let existing = vec![alloc(2, "18:00", "Ana", "Chair")];
        assert!(allocation_for(2, "18:00", "Ana", "Reformer 1", &existing).is_none());
        assert!(allocation_for(2, "19:00", "Ana", "Reformer 1", &existing).is_some());
    }
}
