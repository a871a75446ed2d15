use serde::{Serialize, Serializer};

use super::courses::CourseRecord;

/// Bonus added to the base points of a passing AP course.
const AP_BONUS: f64 = 1.0;

/// Derived GPA figures for a set of courses.
///
/// GPA values are already rounded to three decimal places and serialize as
/// fixed three-decimal strings (`"3.667"`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GpaSummary {
    #[serde(serialize_with = "serialize_gpa")]
    pub weighted_gpa: f64,
    #[serde(serialize_with = "serialize_gpa")]
    pub unweighted_gpa: f64,
    pub total_credits: f64,
}

impl GpaSummary {
    pub fn weighted_display(&self) -> String {
        format_gpa(self.weighted_gpa)
    }

    pub fn unweighted_display(&self) -> String {
        format_gpa(self.unweighted_gpa)
    }
}

/// Weighted points for one course: AP adds a point unless the grade is an F.
pub fn weighted_points(course: &CourseRecord) -> f64 {
    let base = course.grade.points();
    if course.is_ap && base > 0.0 {
        base + AP_BONUS
    } else {
        base
    }
}

pub fn aggregate(courses: &[CourseRecord]) -> GpaSummary {
    let mut weighted_total = 0.0;
    let mut unweighted_total = 0.0;
    let mut total_credits = 0.0;

    for course in courses {
        let credits = course.credits.value();
        weighted_total += weighted_points(course) * credits;
        unweighted_total += course.grade.points() * credits;
        total_credits += credits;
    }

    if total_credits == 0.0 {
        return GpaSummary {
            weighted_gpa: 0.0,
            unweighted_gpa: 0.0,
            total_credits: 0.0,
        };
    }

    GpaSummary {
        weighted_gpa: round_three_places(weighted_total / total_credits),
        unweighted_gpa: round_three_places(unweighted_total / total_credits),
        total_credits,
    }
}

/// Half-up: exact ties such as 3.0625 round to 3.063.
pub fn round_three_places(value: f64) -> f64 {
    ((value * 1000.0) + 0.5).floor() / 1000.0
}

pub fn format_gpa(value: f64) -> String {
    format!("{value:.3}")
}

fn serialize_gpa<S>(value: &f64, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&format_gpa(*value))
}
