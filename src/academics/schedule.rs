use std::fmt;

use serde::{Deserialize, Serialize};

pub const PERIODS_PER_QUARTER: u8 = 8;

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum Quarter {
    Q1,
    Q2,
    Q3,
    Q4,
}

impl Quarter {
    pub const ALL: [Quarter; 4] = [Quarter::Q1, Quarter::Q2, Quarter::Q3, Quarter::Q4];
}

impl fmt::Display for Quarter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Quarter::Q1 => "Q1",
            Quarter::Q2 => "Q2",
            Quarter::Q3 => "Q3",
            Quarter::Q4 => "Q4",
        };
        f.write_str(label)
    }
}

/// One class period. The period number is structural and never changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScheduleSlot {
    period: u8,
    pub class_name: String,
    pub room: String,
    pub teacher: String,
}

impl ScheduleSlot {
    fn empty(period: u8) -> Self {
        Self {
            period,
            class_name: String::new(),
            room: String::new(),
            teacher: String::new(),
        }
    }

    pub fn apply(&mut self, field: SlotField) {
        match field {
            SlotField::ClassName(value) => self.class_name = value,
            SlotField::Room(value) => self.room = value,
            SlotField::Teacher(value) => self.teacher = value,
        }
    }

    fn copy_text_from(&mut self, source: &ScheduleSlot) {
        self.class_name.clone_from(&source.class_name);
        self.room.clone_from(&source.room);
        self.teacher.clone_from(&source.teacher);
    }
}

/// A single-field slot edit, e.g. `{"field": "room", "value": "B12"}`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "field", content = "value", rename_all = "snake_case")]
pub enum SlotField {
    ClassName(String),
    Room(String),
    Teacher(String),
}

/// Eight period slots, always in ascending period order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct QuarterSchedule {
    slots: [ScheduleSlot; PERIODS_PER_QUARTER as usize],
}

impl Default for QuarterSchedule {
    fn default() -> Self {
        Self {
            slots: std::array::from_fn(|index| ScheduleSlot::empty(index as u8 + 1)),
        }
    }
}

impl QuarterSchedule {
    pub fn slot(&self, period: u8) -> Option<&ScheduleSlot> {
        let index = period_index(period)?;
        self.slots.get(index)
    }

    fn slot_mut(&mut self, period: u8) -> Option<&mut ScheduleSlot> {
        let index = period_index(period)?;
        self.slots.get_mut(index)
    }

    fn overwrite_from(&mut self, source: &QuarterSchedule) {
        for (target, origin) in self.slots.iter_mut().zip(source.slots.iter()) {
            target.copy_text_from(origin);
        }
    }
}

fn period_index(period: u8) -> Option<usize> {
    if (1..=PERIODS_PER_QUARTER).contains(&period) {
        Some(usize::from(period - 1))
    } else {
        None
    }
}

/// Explicit go-ahead for the destructive copy-to-all action.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum CopyConfirmation {
    Confirmed,
    Unconfirmed,
}

impl From<bool> for CopyConfirmation {
    fn from(confirmed: bool) -> Self {
        if confirmed {
            CopyConfirmation::Confirmed
        } else {
            CopyConfirmation::Unconfirmed
        }
    }
}

/// Returned when a copy-to-all is attempted without confirmation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmationRequired {
    source: Quarter,
}

impl ConfirmationRequired {
    pub fn message(&self) -> String {
        format!("Overwrite Q1-Q4 with {} data?", self.source)
    }
}

impl fmt::Display for ConfirmationRequired {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message())
    }
}

impl std::error::Error for ConfirmationRequired {}

/// The four quarter schedules of a workspace.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScheduleGrid {
    #[serde(rename = "Q1")]
    q1: QuarterSchedule,
    #[serde(rename = "Q2")]
    q2: QuarterSchedule,
    #[serde(rename = "Q3")]
    q3: QuarterSchedule,
    #[serde(rename = "Q4")]
    q4: QuarterSchedule,
}

impl ScheduleGrid {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn quarter(&self, quarter: Quarter) -> &QuarterSchedule {
        match quarter {
            Quarter::Q1 => &self.q1,
            Quarter::Q2 => &self.q2,
            Quarter::Q3 => &self.q3,
            Quarter::Q4 => &self.q4,
        }
    }

    fn quarter_mut(&mut self, quarter: Quarter) -> &mut QuarterSchedule {
        match quarter {
            Quarter::Q1 => &mut self.q1,
            Quarter::Q2 => &mut self.q2,
            Quarter::Q3 => &mut self.q3,
            Quarter::Q4 => &mut self.q4,
        }
    }

    /// Updates one slot. Returns `false` when `period` is outside 1..=8.
    pub fn update_slot(&mut self, quarter: Quarter, period: u8, field: SlotField) -> bool {
        match self.quarter_mut(quarter).slot_mut(period) {
            Some(slot) => {
                slot.apply(field);
                true
            }
            None => false,
        }
    }

    /// Overwrites every quarter's text with a deep copy of `source`.
    pub fn copy_quarter_to_all(
        &mut self,
        source: Quarter,
        confirmation: CopyConfirmation,
    ) -> Result<(), ConfirmationRequired> {
        if confirmation != CopyConfirmation::Confirmed {
            return Err(ConfirmationRequired { source });
        }

        let template = self.quarter(source).clone();
        for quarter in Quarter::ALL {
            if quarter != source {
                self.quarter_mut(quarter).overwrite_from(&template);
            }
        }
        Ok(())
    }

    /// The slot for `period` in each quarter, Q1 through Q4.
    pub fn period_across_quarters(&self, period: u8) -> Option<[&ScheduleSlot; 4]> {
        let index = period_index(period)?;
        Some(Quarter::ALL.map(|quarter| &self.quarter(quarter).slots[index]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fill(grid: &mut ScheduleGrid, quarter: Quarter, period: u8, class: &str) {
        grid.update_slot(quarter, period, SlotField::ClassName(class.to_string()));
        grid.update_slot(quarter, period, SlotField::Room(format!("{class}-room")));
        grid.update_slot(quarter, period, SlotField::Teacher(format!("{class}-teacher")));
    }

    #[test]
    fn new_grid_has_eight_empty_ordered_periods() {
        let grid = ScheduleGrid::new();
        for quarter in Quarter::ALL {
            let slots = &grid.quarter(quarter).slots;
            let periods: Vec<u8> = slots.iter().map(|s| s.period).collect();
            assert_eq!(periods, (1..=8).collect::<Vec<u8>>());
            assert!(slots.iter().all(|s| s.class_name.is_empty()));
        }
    }

    #[test]
    fn update_slot_changes_one_cell() {
        let mut grid = ScheduleGrid::new();
        assert!(grid.update_slot(Quarter::Q3, 5, SlotField::Room("204".to_string())));

        assert_eq!(grid.quarter(Quarter::Q3).slot(5).unwrap().room, "204");
        assert_eq!(grid.quarter(Quarter::Q3).slot(4).unwrap().room, "");
        assert_eq!(grid.quarter(Quarter::Q2).slot(5).unwrap().room, "");
    }

    #[test]
    fn update_slot_rejects_out_of_range_period() {
        let mut grid = ScheduleGrid::new();
        assert!(!grid.update_slot(Quarter::Q1, 0, SlotField::Room("x".to_string())));
        assert!(!grid.update_slot(Quarter::Q1, 9, SlotField::Room("x".to_string())));
        assert_eq!(grid, ScheduleGrid::new());
    }

    #[test]
    fn copy_requires_confirmation() {
        let mut grid = ScheduleGrid::new();
        fill(&mut grid, Quarter::Q2, 1, "Biology");
        let before = grid.clone();

        let err = grid
            .copy_quarter_to_all(Quarter::Q2, CopyConfirmation::Unconfirmed)
            .unwrap_err();
        assert_eq!(err.message(), "Overwrite Q1-Q4 with Q2 data?");
        assert_eq!(grid, before);
    }

    #[test]
    fn copy_overwrites_every_quarter() {
        let mut grid = ScheduleGrid::new();
        fill(&mut grid, Quarter::Q2, 1, "Biology");
        fill(&mut grid, Quarter::Q4, 2, "Art");

        let copied = grid.copy_quarter_to_all(Quarter::Q2, CopyConfirmation::Confirmed);
        assert!(copied.is_ok());

        for quarter in Quarter::ALL {
            assert_eq!(grid.quarter(quarter), grid.quarter(Quarter::Q2));
        }
        assert_eq!(grid.quarter(Quarter::Q4).slot(2).unwrap().class_name, "");
    }

    #[test]
    fn copied_slots_are_independent() {
        let mut grid = ScheduleGrid::new();
        fill(&mut grid, Quarter::Q2, 3, "Chemistry");
        let copied = grid.copy_quarter_to_all(Quarter::Q2, CopyConfirmation::Confirmed);
        assert!(copied.is_ok());

        grid.update_slot(Quarter::Q1, 3, SlotField::Teacher("Substitute".to_string()));

        assert_eq!(grid.quarter(Quarter::Q1).slot(3).unwrap().teacher, "Substitute");
        assert_eq!(grid.quarter(Quarter::Q2).slot(3).unwrap().teacher, "Chemistry-teacher");
        assert_eq!(grid.quarter(Quarter::Q3).slot(3).unwrap().teacher, "Chemistry-teacher");
        assert_eq!(grid.quarter(Quarter::Q4).slot(3).unwrap().teacher, "Chemistry-teacher");
    }

    #[test]
    fn period_across_quarters_lists_q1_to_q4() {
        let mut grid = ScheduleGrid::new();
        fill(&mut grid, Quarter::Q1, 6, "Gym");
        fill(&mut grid, Quarter::Q4, 6, "Health");

        let row = grid.period_across_quarters(6).unwrap();
        let names: Vec<&str> = row.iter().map(|s| s.class_name.as_str()).collect();
        assert_eq!(names, vec!["Gym", "", "", "Health"]);
        assert!(grid.period_across_quarters(9).is_none());
    }

    #[test]
    fn grid_serializes_by_quarter_label() {
        let grid = ScheduleGrid::new();
        let json = serde_json::to_value(&grid).unwrap();
        assert_eq!(json["Q3"].as_array().unwrap().len(), 8);
        assert_eq!(json["Q1"][7]["period"], 8);
    }
}
