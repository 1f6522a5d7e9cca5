use crate::model::{Actor, SlotDefinition};

/// Decides whether a student may book a slot, given the slot's requirement
/// flags. Pure; the reason string is empty when eligible and is only used
/// for display.
pub fn eligible(actor: &Actor, slot: &SlotDefinition) -> (bool, String) {
    check(
        actor.on_job_training,
        actor.night_eligible,
        slot.requires_ojt,
        slot.requires_night,
    )
}

pub fn check(
    student_ojt: bool,
    student_night: bool,
    requires_ojt: bool,
    requires_night: bool,
) -> (bool, String) {
    match (requires_ojt, requires_night) {
        (false, false) => (true, String::new()),
        (true, false) => {
            if student_ojt {
                (true, String::new())
            } else {
                (false, "OJT required".to_string())
            }
        }
        (false, true) => {
            if student_night {
                (true, String::new())
            } else {
                (false, "Night shift eligibility required".to_string())
            }
        }
        (true, true) => {
            if student_ojt || student_night {
                (true, String::new())
            } else {
                (false, "OJT or night shift eligibility required".to_string())
            }
        }
    }
}
