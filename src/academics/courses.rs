use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{
    gpa::{self, GpaSummary},
    grades::{CreditWeight, Grade},
};

/// One row of the GPA calculator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourseRecord {
    pub id: Uuid,
    pub name: String,
    pub grade: Grade,
    pub credits: CreditWeight,
    pub is_ap: bool,
}

impl CourseRecord {
    fn blank(id: Uuid) -> Self {
        Self {
            id,
            name: String::new(),
            grade: Grade::default(),
            credits: CreditWeight::default(),
            is_ap: false,
        }
    }

    pub fn apply(&mut self, field: CourseField) {
        match field {
            CourseField::Name(name) => self.name = name,
            CourseField::Grade(grade) => self.grade = grade,
            CourseField::Credits(credits) => self.credits = credits,
            CourseField::IsAp(is_ap) => self.is_ap = is_ap,
        }
    }
}

/// A single-field edit, e.g. `{"field": "credits", "value": 0.5}`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "field", content = "value", rename_all = "snake_case")]
pub enum CourseField {
    Name(String),
    Grade(Grade),
    Credits(CreditWeight),
    IsAp(bool),
}

/// Ordered course list owned by a workspace.
#[derive(Debug, Clone, Default)]
pub struct CourseStore {
    courses: Vec<CourseRecord>,
}

impl CourseStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-filled with the two sample rows shown to first-time users.
    pub fn with_starter_courses() -> Self {
        let mut store = Self::new();

        let math = store.add().id;
        store.update(math, CourseField::Name("Math".to_string()));

        let history = store.add().id;
        store.update(history, CourseField::Name("History".to_string()));
        store.update(history, CourseField::Grade(Grade::B));
        store.update(history, CourseField::IsAp(true));

        store
    }

    pub fn courses(&self) -> &[CourseRecord] {
        &self.courses
    }

    pub fn get(&self, id: Uuid) -> Option<&CourseRecord> {
        self.courses.iter().find(|course| course.id == id)
    }

    /// Appends a course with default values and returns it.
    pub fn add(&mut self) -> &CourseRecord {
        let id = self.fresh_id();
        self.courses.push(CourseRecord::blank(id));
        &self.courses[self.courses.len() - 1]
    }

    /// Applies `field` to the matching course. Returns `false` when no course has `id`.
    pub fn update(&mut self, id: Uuid, field: CourseField) -> bool {
        match self.courses.iter_mut().find(|course| course.id == id) {
            Some(course) => {
                course.apply(field);
                true
            }
            None => false,
        }
    }

    pub fn remove(&mut self, id: Uuid) -> Option<CourseRecord> {
        let index = self.courses.iter().position(|course| course.id == id)?;
        Some(self.courses.remove(index))
    }

    pub fn summary(&self) -> GpaSummary {
        gpa::aggregate(&self.courses)
    }

    fn fresh_id(&self) -> Uuid {
        loop {
            let candidate = Uuid::new_v4();
            if self.get(candidate).is_none() {
                return candidate;
            }
        }
    }
}
