//! Schedule resolution: which workout falls on which calendar date.
//!
//! Everything here is pure date arithmetic over a borrowed [`Plan`]. Two
//! week counters exist and are kept apart by type:
//! - [`AbsoluteWeekIndex`] counts weeks since the plan start and never wraps.
//!   Week paging uses it.
//! - [`ScheduleWeekIndex`] is the row read from the grid. Repeat plans wrap
//!   it modulo `num_weeks`; once plans stop having one after the last week.
//!
//! "No data" (before the start, after a once plan ends, nothing within the
//! horizon) is always `None`, never an error.

use crate::plan::DAYS_PER_WEEK;
use crate::{
    AbsoluteWeekIndex, Plan, PlanType, ScheduleSlot, ScheduleWeekIndex, WorkoutDefinition,
};
use chrono::{Days, NaiveDate, NaiveDateTime};

/// How far `next_scheduled_workout` looks ahead by default
pub const DEFAULT_LOOKAHEAD_DAYS: u32 = 14;

const WEEK: i64 = DAYS_PER_WEEK as i64;

/// Whole calendar days from `start` to `target` (negative if `target` is
/// earlier)
pub fn days_elapsed(start: NaiveDate, target: NaiveDate) -> i64 {
    (target - start).num_days()
}

/// Like [`days_elapsed`], truncating both timestamps to midnight first
pub fn days_elapsed_between(start: NaiveDateTime, target: NaiveDateTime) -> i64 {
    days_elapsed(start.date(), target.date())
}

/// Grid row for a day offset, or None once a `Once` plan is over
pub fn week_number(
    days_elapsed: i64,
    num_weeks: u32,
    plan_type: PlanType,
) -> Option<ScheduleWeekIndex> {
    if days_elapsed < 0 || num_weeks == 0 {
        return None;
    }
    let week = days_elapsed / WEEK;
    match plan_type {
        PlanType::Once => {
            if week >= i64::from(num_weeks) {
                None
            } else {
                Some(ScheduleWeekIndex(week as u32))
            }
        }
        PlanType::Repeat => Some(ScheduleWeekIndex(
            (week % i64::from(num_weeks)) as u32,
        )),
    }
}

/// Weekday column for a day offset, relative to the plan's start weekday
pub fn day_in_week(days_elapsed: i64) -> usize {
    days_elapsed.rem_euclid(WEEK) as usize
}

/// The schedule cell for `target`, or None if the date precedes the plan or
/// the plan has completed
pub fn scheduled_workout_for_date(plan: &Plan, target: NaiveDate) -> Option<ScheduleSlot> {
    let elapsed = days_elapsed(plan.start_date, target);
    if elapsed < 0 {
        return None;
    }
    let week = week_number(elapsed, plan.num_weeks, plan.plan_type)?;
    plan.slot_at(week, day_in_week(elapsed))
}

/// A workout found by looking ahead
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UpcomingWorkout {
    pub date: NaiveDate,
    pub letter: String,
}

/// First non-rest slot from `from` (inclusive) within `horizon_days` days
pub fn next_scheduled_workout(
    plan: &Plan,
    from: NaiveDate,
    horizon_days: u32,
) -> Option<UpcomingWorkout> {
    (0..u64::from(horizon_days))
        .map_while(|offset| from.checked_add_days(Days::new(offset)))
        .find_map(|date| match scheduled_workout_for_date(plan, date)? {
            ScheduleSlot::Workout(letter) => Some(UpcomingWorkout { date, letter }),
            ScheduleSlot::Rest => None,
        })
}

/// Resolve a date to the workout to perform on it
pub fn resolve_workout(plan: &Plan, target: NaiveDate) -> Option<(String, &WorkoutDefinition)> {
    let slot = scheduled_workout_for_date(plan, target)?;
    let letter = slot.letter()?;
    let workout = plan.workout(letter)?;
    Some((letter.to_string(), workout))
}

/// Start of the cycle in progress at `reference`.
///
/// For repeat plans this is `original_start + cycle * num_weeks * 7` where
/// `cycle = floor(days_elapsed / (num_weeks * 7))`. Once plans have a single
/// cycle beginning at `original_start`, as does any reference date before
/// the start.
pub fn effective_cycle_start(
    original_start: NaiveDate,
    num_weeks: u32,
    plan_type: PlanType,
    reference: NaiveDate,
) -> NaiveDate {
    if plan_type == PlanType::Once || num_weeks == 0 {
        return original_start;
    }
    let elapsed = days_elapsed(original_start, reference);
    if elapsed < 0 {
        return original_start;
    }
    let cycle_days = i64::from(num_weeks) * WEEK;
    let cycle = elapsed / cycle_days;
    // Never later than `reference`, so the addition stays in range
    original_start
        .checked_add_days(Days::new((cycle * cycle_days) as u64))
        .unwrap_or(reference)
}

/// Weeks since the plan start, None if `target` precedes it
pub fn absolute_week_index(start: NaiveDate, target: NaiveDate) -> Option<AbsoluteWeekIndex> {
    let elapsed = days_elapsed(start, target);
    if elapsed < 0 {
        return None;
    }
    u32::try_from(elapsed / WEEK)
        .ok()
        .map(AbsoluteWeekIndex)
}

/// First day of an absolute week (no wrapping), None past the calendar's end
pub fn week_start_date_for_index(start: NaiveDate, index: AbsoluteWeekIndex) -> Option<NaiveDate> {
    start.checked_add_days(Days::new(u64::from(index.0) * DAYS_PER_WEEK as u64))
}

/// Grid row for an absolute week
pub fn schedule_week_index(
    plan_type: PlanType,
    num_weeks: u32,
    absolute: AbsoluteWeekIndex,
) -> Option<ScheduleWeekIndex> {
    week_number(
        i64::from(absolute.0) * WEEK,
        num_weeks,
        plan_type,
    )
}

/// One day of a week view
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DayView {
    pub date: NaiveDate,
    pub slot: Option<ScheduleSlot>,
}

/// The seven days of an absolute week, for paging through a plan.
/// Empty when the week lies beyond the representable calendar.
pub fn week_view(plan: &Plan, absolute: AbsoluteWeekIndex) -> Vec<DayView> {
    let Some(week_start) = week_start_date_for_index(plan.start_date, absolute) else {
        return Vec::new();
    };
    let days: Option<Vec<_>> = (0..DAYS_PER_WEEK as u64)
        .map(|offset| {
            let date = week_start.checked_add_days(Days::new(offset))?;
            Some(DayView {
                date,
                slot: scheduled_workout_for_date(plan, date),
            })
        })
        .collect();
    days.unwrap_or_default()
}

/// Where a plan stands on a given day
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlanProgress {
    pub absolute_week: AbsoluteWeekIndex,
    /// None once a `Once` plan has run out of weeks
    pub schedule_week: Option<ScheduleWeekIndex>,
    /// Zero-based cycle count; always 0 for once plans
    pub cycle: u32,
    pub cycle_start: NaiveDate,
    pub completed: bool,
}

/// Progress through the plan on `today`, None before the plan starts
pub fn plan_progress(plan: &Plan, today: NaiveDate) -> Option<PlanProgress> {
    let absolute_week = absolute_week_index(plan.start_date, today)?;
    let cycle_start =
        effective_cycle_start(plan.start_date, plan.num_weeks, plan.plan_type, today);
    let cycle_days = i64::from(plan.num_weeks.max(1)) * WEEK;
    let cycle = (days_elapsed(plan.start_date, cycle_start) / cycle_days) as u32;
    let schedule_week = schedule_week_index(plan.plan_type, plan.num_weeks, absolute_week);

    Some(PlanProgress {
        absolute_week,
        schedule_week,
        cycle,
        cycle_start,
        completed: schedule_week.is_none(),
    })
}
