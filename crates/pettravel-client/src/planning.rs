//! Travel-planning helpers: date rules, requirement urgency and dashboard
//! aggregates. Everything here is pure; `today` is always passed in.

use std::fmt;

use time::{Date, Duration, OffsetDateTime};

use crate::models::{Pet, PlanRequirement, TravelPlan, TravelPlanStatus};
use crate::validation::FieldErrors;

/// Minimum days between today and a new plan's departure.
pub const MIN_ADVANCE_DAYS: i64 = 30;

/// Requirements due within this many days are flagged as due soon.
pub const DUE_SOON_DAYS: i64 = 14;

/// Today's date in UTC.
pub fn today() -> Date {
    OffsetDateTime::now_utc().date()
}

/// Whole days from `today` until `departure`; negative once it has passed.
pub fn days_until_departure(departure: Date, today: Date) -> i64 {
    (departure - today).whole_days()
}

/// Checks the dates of a new plan. The departure must be at least
/// [`MIN_ADVANCE_DAYS`] ahead and the return strictly after departure.
pub fn validate_travel_dates(
    departure: Date,
    return_date: Option<Date>,
    today: Date,
) -> Result<(), FieldErrors> {
    let mut errors = FieldErrors::new();

    let earliest = today + Duration::days(MIN_ADVANCE_DAYS);
    if departure < earliest {
        errors.entry("departure_date".to_string()).or_default().push(format!(
            "Departure date must be at least {MIN_ADVANCE_DAYS} days in the future ({earliest} or later)"
        ));
    }
    if let Some(ret) = return_date
        && ret <= departure
    {
        errors
            .entry("return_date".to_string())
            .or_default()
            .push("Return date must be after the departure date".to_string());
    }

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}

/// Date by which a requirement with a validity window must be met, or
/// `None` when the window reaches before the earliest representable date.
pub fn requirement_due_date(departure: Date, days_before_departure: u32) -> Option<Date> {
    departure.checked_sub(Duration::days(i64::from(days_before_departure)))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum RequirementUrgency {
    Completed,
    /// No due date known.
    Pending,
    Overdue,
    DueSoon,
    Upcoming,
}

impl RequirementUrgency {
    pub fn classify(done: bool, due: Option<Date>, today: Date) -> Self {
        if done {
            return Self::Completed;
        }
        let Some(due) = due else {
            return Self::Pending;
        };
        let days_left = (due - today).whole_days();
        if days_left < 0 {
            Self::Overdue
        } else if days_left < DUE_SOON_DAYS {
            Self::DueSoon
        } else {
            Self::Upcoming
        }
    }

    /// Urgency of a plan requirement given its due date.
    pub fn of(requirement: &PlanRequirement, due: Option<Date>, today: Date) -> Self {
        Self::classify(requirement.status.is_done(), due, today)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Completed => "Completed",
            Self::Pending => "Pending",
            Self::Overdue => "Overdue",
            Self::DueSoon => "Due Soon",
            Self::Upcoming => "Upcoming",
        }
    }
}

impl fmt::Display for RequirementUrgency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Aggregates shown on the dashboard.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DashboardStats {
    pub pet_count: usize,
    pub active_plans: usize,
    pub upcoming_departures: usize,
    pub completed_plans: usize,
    /// Requirements of active plans not yet completed or waived.
    pub open_requirements: usize,
    /// Earliest departure among active plans not yet departed.
    pub next_departure: Option<NextDeparture>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NextDeparture {
    pub plan_id: u64,
    pub plan_name: String,
    pub date: Date,
    pub days_left: i64,
}

impl DashboardStats {
    pub fn compute(pets: &[Pet], plans: &[TravelPlan], today: Date) -> Self {
        let active: Vec<&TravelPlan> = plans.iter().filter(|p| p.status.is_active()).collect();
        let upcoming: Vec<&TravelPlan> = active
            .iter()
            .copied()
            .filter(|p| p.departure_date >= today)
            .collect();

        let next_departure = upcoming
            .iter()
            .min_by_key(|p| (p.departure_date, p.id))
            .map(|p| NextDeparture {
                plan_id: p.id,
                plan_name: p.name.clone(),
                date: p.departure_date,
                days_left: days_until_departure(p.departure_date, today),
            });

        Self {
            pet_count: pets.len(),
            active_plans: active.len(),
            upcoming_departures: upcoming.len(),
            completed_plans: plans
                .iter()
                .filter(|p| p.status == TravelPlanStatus::Completed)
                .count(),
            open_requirements: active
                .iter()
                .flat_map(|p| p.requirements.iter())
                .filter(|r| !r.status.is_done())
                .count(),
            next_departure,
        }
    }
}
