pub mod courses;
pub mod gpa;
pub mod grades;
pub mod schedule;

pub use courses::{CourseField, CourseRecord, CourseStore};
pub use gpa::GpaSummary;
pub use schedule::{
    CopyConfirmation, PERIODS_PER_QUARTER, Quarter, QuarterSchedule, ScheduleGrid, ScheduleSlot,
    SlotField,
};
