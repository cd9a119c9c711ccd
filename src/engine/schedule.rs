use chrono::NaiveTime;
use serde::Serialize;

use crate::engine::minutes_since_midnight;
use crate::model::attendance::EventKind;

/// A fixed slot of the working day with its accepted clock window.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ScheduleSlot {
    pub kind: EventKind,
    pub label: &'static str,
    /// Scheduled time, `HH:MM`.
    pub scheduled: &'static str,
    /// First minute of the window (minutes since midnight, inclusive).
    pub window_start: u32,
    /// Last minute of the window (inclusive).
    pub window_end: u32,
}

impl ScheduleSlot {
    pub fn contains(&self, minutes: u32) -> bool {
        minutes >= self.window_start && minutes <= self.window_end
    }
}

const fn hm(hour: u32, minute: u32) -> u32 {
    hour * 60 + minute
}

/// Scheduled start of the day, 08:00. Entries strictly after it are late.
pub const WORKDAY_START_MINUTES: u32 = hm(8, 0);

/// Ordered lookup table; the first matching window wins.
pub const SCHEDULE: [ScheduleSlot; 4] = [
    ScheduleSlot {
        kind: EventKind::Entrada,
        label: "Entrada",
        scheduled: "08:00",
        window_start: hm(6, 0),
        window_end: hm(11, 0),
    },
    ScheduleSlot {
        kind: EventKind::SalidaAlmuerzo,
        label: "Salida a Almuerzo",
        scheduled: "12:30",
        window_start: hm(11, 1),
        window_end: hm(13, 30),
    },
    ScheduleSlot {
        kind: EventKind::RegresoAlmuerzo,
        label: "Regreso de Almuerzo",
        scheduled: "14:00",
        window_start: hm(13, 31),
        window_end: hm(16, 0),
    },
    ScheduleSlot {
        kind: EventKind::SalidaFinal,
        label: "Salida Final",
        scheduled: "17:30",
        window_start: hm(16, 1),
        window_end: hm(19, 0),
    },
];

/// Picks the event for a clock reading. Outside every window it is an entrada.
pub fn classify(time: NaiveTime) -> EventKind {
    let minutes = minutes_since_midnight(time);

    SCHEDULE
        .iter()
        .find(|slot| slot.contains(minutes))
        .map(|slot| slot.kind)
        .unwrap_or(EventKind::Entrada)
}

pub fn slot(kind: EventKind) -> &'static ScheduleSlot {
    match kind {
        EventKind::Entrada => &SCHEDULE[0],
        EventKind::SalidaAlmuerzo => &SCHEDULE[1],
        EventKind::RegresoAlmuerzo => &SCHEDULE[2],
        EventKind::SalidaFinal => &SCHEDULE[3],
    }
}

pub fn label(kind: EventKind) -> &'static str {
    slot(kind).label
}
