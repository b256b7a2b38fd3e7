//! Live workout session state machine.
//!
//! A [`WorkoutSession`] walks one workout set by set:
//!
//! ```text
//! Performing ──complete──> Resting ──expire/skip──> Performing
//! Performing ──start_hold──> Countdown ──> Holding ──expire/stop──> Performing
//!                                   ... ──> Finished
//! ```
//!
//! Traversal is unit-aware: exercises are grouped with
//! [`group_by_superset`], supersets rotate through their members round by
//! round without rest, and rest is taken after the last member of a round.
//!
//! Every timer lives inside the [`Phase`] variant that needs it, so moving
//! to another phase (or dropping the session) releases it.

use crate::repository::{ExerciseCatalog, WorkoutRepository};
use crate::superset::{group_by_superset, position_in_superset, ExerciseUnit, SupersetPosition};
use crate::timer::{Clock, Countdown, Stopwatch};
use crate::{
    Error, ExerciseDefinition, ExerciseKind, ExerciseType, RecordedExercise, Result,
    WorkoutDefinition, WorkoutRecord,
};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use uuid::Uuid;

/// Timing knobs for a session
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionSettings {
    /// Lead-in before a hold starts
    pub lead_in_seconds: u32,
    /// Remaining rest at which `RestEndingSoon` fires
    pub rest_alert_seconds: u32,
    /// Countdown granularity
    pub tick: Duration,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            lead_in_seconds: 3,
            rest_alert_seconds: 3,
            tick: Duration::seconds(1),
        }
    }
}

/// Where the session came from, carried into the persisted record
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionContext {
    pub title: String,
    pub plan_id: Option<Uuid>,
    pub plan_workout_letter: Option<String>,
    pub scheduled_date: NaiveDate,
}

/// A set within the workout
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Cursor {
    pub exercise_index: usize,
    pub set_index: usize,
}

impl Cursor {
    pub fn new(exercise_index: usize, set_index: usize) -> Self {
        Self {
            exercise_index,
            set_index,
        }
    }
}

/// Current phase, owning whatever timer it needs
#[derive(Clone, Debug)]
pub enum Phase {
    Performing,
    Resting {
        timer: Countdown,
        next: Cursor,
        alerted: bool,
    },
    Countdown {
        timer: Countdown,
    },
    Holding {
        timer: Countdown,
        stopwatch: Stopwatch,
        duration: u32,
    },
    Finished,
}

impl Phase {
    pub fn name(&self) -> &'static str {
        match self {
            Phase::Performing => "performing",
            Phase::Resting { .. } => "resting",
            Phase::Countdown { .. } => "countdown",
            Phase::Holding { .. } => "holding",
            Phase::Finished => "finished",
        }
    }
}

/// What completing a set led to
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Step {
    /// Straight on to the next superset member, same set, no rest
    NextInSuperset(Cursor),
    /// Rest before `next`
    Rest { seconds: u32, next: Cursor },
    /// On to `next` without rest (zero rest configured)
    Continue(Cursor),
    Finished,
}

/// Things `tick` observed
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionEvent {
    /// Rest dropped to the alert threshold. Fires once per rest.
    RestEndingSoon { remaining_secs: u64 },
    RestFinished { next: Cursor },
    HoldStarted { cursor: Cursor, duration: u32 },
    HoldCompleted { cursor: Cursor, seconds: u32, step: Step },
}

/// Returned by a manual hold stop. The session has already advanced; the
/// duration the user then types is written against `cursor`, the set that
/// was active when the hold was stopped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PendingDuration {
    pub cursor: Cursor,
    pub elapsed_seconds: u32,
    pub step: Step,
}

/// Per-exercise values of a finished session
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExerciseResult {
    pub exercise_id: String,
    pub exercise_name: String,
    pub exercise_type: ExerciseType,
    pub sets: u32,
    pub values: Vec<u32>,
    pub superset_group: Option<String>,
}

/// Immutable snapshot of a finished session
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionResult {
    pub context: SessionContext,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub exercises: Vec<ExerciseResult>,
}

impl SessionResult {
    /// Build the repository payload, tagging each exercise static or dynamic
    /// through the catalog. Exercises the catalog does not know keep the
    /// type implied by their definition.
    pub fn to_record(&self, catalog: &impl ExerciseCatalog) -> WorkoutRecord {
        let exercises = self
            .exercises
            .iter()
            .enumerate()
            .map(|(order, exercise)| {
                let (exercise_id, exercise_type) = catalog
                    .lookup(&exercise.exercise_id)
                    .or_else(|| catalog.lookup(&exercise.exercise_name))
                    .map(|entry| (entry.exercise_id, entry.kind))
                    .unwrap_or_else(|| {
                        (exercise.exercise_id.clone(), exercise.exercise_type)
                    });
                RecordedExercise {
                    exercise_id,
                    exercise_name: exercise.exercise_name.clone(),
                    exercise_type,
                    sets: exercise.sets,
                    reps: exercise.values.clone(),
                    order_index: order as u32,
                    superset_group: exercise.superset_group.clone(),
                }
            })
            .collect();

        WorkoutRecord {
            id: Uuid::new_v4(),
            title: self.context.title.clone(),
            exercises,
            plan_id: self.context.plan_id,
            plan_workout_letter: self.context.plan_workout_letter.clone(),
            scheduled_date: self.context.scheduled_date,
            start_time: self.started_at,
            end_time: self.finished_at,
        }
    }
}

/// Parse a rep count or hold duration typed by the user
pub fn parse_positive(input: &str) -> Result<u32> {
    let trimmed = input.trim();
    let value: i64 = trimmed
        .parse()
        .map_err(|_| Error::InvalidInput(format!("'{}' is not a whole number", trimmed)))?;
    if value <= 0 {
        return Err(Error::InvalidInput(format!(
            "value must be at least 1, got {}",
            value
        )));
    }
    u32::try_from(value).map_err(|_| Error::InvalidInput(format!("{} is too large", value)))
}

/// The live state of one workout
pub struct WorkoutSession<C: Clock> {
    context: SessionContext,
    exercises: Vec<ExerciseDefinition>,
    kinds: Vec<ExerciseKind>,
    units: Vec<ExerciseUnit>,
    cursor: Cursor,
    completed_values: Vec<Vec<Option<u32>>>,
    phase: Phase,
    settings: SessionSettings,
    clock: C,
    started_at: DateTime<Utc>,
    finished_at: Option<DateTime<Utc>>,
    saving: bool,
    saved: bool,
}

impl<C: Clock> WorkoutSession<C> {
    /// Start a session on a snapshot of `workout`
    pub fn new(
        workout: &WorkoutDefinition,
        context: SessionContext,
        clock: C,
        settings: SessionSettings,
    ) -> Result<Self> {
        if workout.exercises.is_empty() {
            return Err(Error::PlanValidation(format!(
                "Workout '{}' has no exercises",
                workout.name
            )));
        }

        let kinds = workout
            .exercises
            .iter()
            .map(|exercise| {
                let problems = exercise.validate();
                match exercise.kind() {
                    Some(kind) if problems.is_empty() => Ok(kind),
                    _ => Err(Error::PlanValidation(problems.join("; "))),
                }
            })
            .collect::<Result<Vec<_>>>()?;

        let exercises = workout.exercises.clone();
        let units = group_by_superset(&exercises);
        let first = units
            .first()
            .and_then(|unit| unit.members().first().copied())
            .unwrap_or(0);
        let completed_values = exercises
            .iter()
            .map(|e| vec![None; e.sets as usize])
            .collect();
        let started_at = clock.now();

        tracing::info!(
            "Started session '{}' with {} exercises in {} units",
            context.title,
            exercises.len(),
            units.len()
        );

        Ok(Self {
            context,
            exercises,
            kinds,
            units,
            cursor: Cursor::new(first, 0),
            completed_values,
            phase: Phase::Performing,
            settings,
            clock,
            started_at,
            finished_at: None,
            saving: false,
            saved: false,
        })
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    pub fn context(&self) -> &SessionContext {
        &self.context
    }

    pub fn exercises(&self) -> &[ExerciseDefinition] {
        &self.exercises
    }

    pub fn units(&self) -> &[ExerciseUnit] {
        &self.units
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.phase, Phase::Finished)
    }

    pub fn is_saving(&self) -> bool {
        self.saving
    }

    pub fn is_saved(&self) -> bool {
        self.saved
    }

    /// The set being performed (or just performed, while resting); None once
    /// finished
    pub fn cursor(&self) -> Option<Cursor> {
        match self.phase {
            Phase::Finished => None,
            _ => Some(self.cursor),
        }
    }

    pub fn current_exercise(&self) -> Option<&ExerciseDefinition> {
        self.cursor().and_then(|c| self.exercises.get(c.exercise_index))
    }

    pub fn current_kind(&self) -> Option<ExerciseKind> {
        self.cursor().and_then(|c| self.kinds.get(c.exercise_index).copied())
    }

    pub fn superset_position(&self) -> Option<SupersetPosition> {
        self.cursor()
            .map(|c| position_in_superset(c.exercise_index, &self.exercises))
    }

    /// The set that follows the current rest
    pub fn upcoming(&self) -> Option<Cursor> {
        match &self.phase {
            Phase::Resting { next, .. } => Some(*next),
            _ => None,
        }
    }

    pub fn completed_values(&self) -> &[Vec<Option<u32>>] {
        &self.completed_values
    }

    pub fn rest_remaining(&self) -> Option<u64> {
        match &self.phase {
            Phase::Resting { timer, .. } => Some(timer.remaining_secs(&self.clock)),
            _ => None,
        }
    }

    pub fn lead_in_remaining(&self) -> Option<u64> {
        match &self.phase {
            Phase::Countdown { timer } => Some(timer.remaining_secs(&self.clock)),
            _ => None,
        }
    }

    pub fn hold_remaining(&self) -> Option<u64> {
        match &self.phase {
            Phase::Holding { timer, .. } => Some(timer.remaining_secs(&self.clock)),
            _ => None,
        }
    }

    /// (recorded sets, total sets)
    pub fn progress(&self) -> (usize, usize) {
        let done = self
            .completed_values
            .iter()
            .flatten()
            .filter(|v| v.is_some())
            .count();
        let total = self.completed_values.iter().map(Vec::len).sum();
        (done, total)
    }

    // ------------------------------------------------------------------
    // Events
    // ------------------------------------------------------------------

    /// Record `value` for the active set and advance
    ///
    /// Works for dynamic sets (reps) and for logging a static set by hand
    /// (hold-seconds) without running the timer.
    pub fn complete_set(&mut self, value: u32) -> Result<Step> {
        self.ensure_accepting()?;
        if !matches!(self.phase, Phase::Performing) {
            return Err(self.wrong_phase("complete a set"));
        }
        if value == 0 {
            return Err(Error::InvalidInput("value must be at least 1, got 0".into()));
        }

        let done = self.cursor;
        self.record(done, value);
        let step = self.step_after(done);
        self.apply(step);
        tracing::debug!("Completed {:?} with {}: {:?}", done, value, step);
        Ok(step)
    }

    /// `complete_set` from raw user input
    pub fn complete_set_input(&mut self, input: &str) -> Result<Step> {
        self.ensure_accepting()?;
        let value = parse_positive(input)?;
        self.complete_set(value)
    }

    /// End the current rest early
    pub fn skip_rest(&mut self) -> Result<Cursor> {
        self.ensure_accepting()?;
        let Phase::Resting { next, .. } = self.phase else {
            return Err(self.wrong_phase("skip rest"));
        };
        self.cursor = next;
        self.phase = Phase::Performing;
        tracing::debug!("Rest skipped, now at {:?}", next);
        Ok(next)
    }

    /// Begin the lead-in countdown for a static set
    pub fn start_hold(&mut self) -> Result<()> {
        self.ensure_accepting()?;
        if !matches!(self.phase, Phase::Performing) {
            return Err(self.wrong_phase("start a hold"));
        }
        let Some(ExerciseKind::Static { duration }) = self.current_kind() else {
            return Err(Error::Session(
                "current exercise is counted in reps, not held".into(),
            ));
        };

        if self.settings.lead_in_seconds == 0 {
            self.phase = self.holding_from(self.clock.now(), duration);
        } else {
            self.phase = Phase::Countdown {
                timer: Countdown::start(
                    &self.clock,
                    self.settings.lead_in_seconds,
                    self.settings.tick,
                ),
            };
        }
        tracing::debug!("Hold requested for {:?} ({}s)", self.cursor, duration);
        Ok(())
    }

    /// Abort a lead-in or hold without recording anything
    pub fn cancel_hold(&mut self) -> Result<()> {
        self.ensure_accepting()?;
        match self.phase {
            Phase::Countdown { .. } | Phase::Holding { .. } => {
                self.phase = Phase::Performing;
                Ok(())
            }
            _ => Err(self.wrong_phase("cancel a hold")),
        }
    }

    /// Stop a running hold early.
    ///
    /// The session advances immediately. The elapsed time (at least one
    /// second) is recorded as a provisional value; the caller then asks the
    /// user for the real duration and hands it back through
    /// [`submit_manual_duration`] together with the returned token.
    ///
    /// [`submit_manual_duration`]: WorkoutSession::submit_manual_duration
    pub fn stop_hold(&mut self) -> Result<PendingDuration> {
        self.ensure_accepting()?;
        let Phase::Holding { stopwatch, .. } = &self.phase else {
            return Err(self.wrong_phase("stop a hold"));
        };
        let elapsed = u32::try_from(stopwatch.elapsed_secs(&self.clock))
            .unwrap_or(u32::MAX)
            .max(1);

        let stopped = self.cursor;
        self.record(stopped, elapsed);
        let step = self.step_after(stopped);
        self.apply(step);
        tracing::debug!("Hold stopped at {}s on {:?}: {:?}", elapsed, stopped, step);

        Ok(PendingDuration {
            cursor: stopped,
            elapsed_seconds: elapsed,
            step,
        })
    }

    /// Write a manually entered hold duration against the set named by the
    /// token, regardless of where the session is now
    pub fn submit_manual_duration(&mut self, pending: PendingDuration, input: &str) -> Result<()> {
        self.ensure_accepting()?;
        let value = parse_positive(input)?;
        let Cursor {
            exercise_index,
            set_index,
        } = pending.cursor;
        let slot = self
            .completed_values
            .get_mut(exercise_index)
            .and_then(|row| row.get_mut(set_index))
            .ok_or_else(|| Error::Session(format!("no such set: {:?}", pending.cursor)))?;
        *slot = Some(value);
        tracing::debug!("Manual duration {}s recorded for {:?}", value, pending.cursor);
        Ok(())
    }

    /// Observe the clock: expire rests, lead-ins and holds
    ///
    /// A single late tick catches up on everything that elapsed meanwhile.
    pub fn tick(&mut self) -> Vec<SessionEvent> {
        let mut events = Vec::new();
        if self.saving {
            return events;
        }

        loop {
            match &mut self.phase {
                Phase::Resting {
                    timer,
                    next,
                    alerted,
                } => {
                    let remaining = timer.remaining_secs(&self.clock);
                    if remaining == 0 {
                        let next = *next;
                        self.cursor = next;
                        self.phase = Phase::Performing;
                        events.push(SessionEvent::RestFinished { next });
                        continue;
                    }
                    if !*alerted && remaining <= u64::from(self.settings.rest_alert_seconds) {
                        *alerted = true;
                        events.push(SessionEvent::RestEndingSoon {
                            remaining_secs: remaining,
                        });
                    }
                }
                Phase::Countdown { timer } => {
                    if timer.is_expired(&self.clock) {
                        let anchor = timer.target_end();
                        if let Some(ExerciseKind::Static { duration }) = self.current_kind() {
                            self.phase = self.holding_from(anchor, duration);
                            events.push(SessionEvent::HoldStarted {
                                cursor: self.cursor,
                                duration,
                            });
                            continue;
                        }
                        self.phase = Phase::Performing;
                    }
                }
                Phase::Holding {
                    timer, duration, ..
                } => {
                    if timer.is_expired(&self.clock) {
                        let seconds = *duration;
                        let done = self.cursor;
                        self.record(done, seconds);
                        let step = self.step_after(done);
                        self.apply(step);
                        events.push(SessionEvent::HoldCompleted {
                            cursor: done,
                            seconds,
                            step,
                        });
                        continue;
                    }
                }
                Phase::Performing | Phase::Finished => {}
            }
            break;
        }

        events
    }

    /// Leave the workout, discarding all progress
    pub fn abandon(self) {
        let (done, total) = self.progress();
        tracing::info!(
            "Abandoned session '{}' after {}/{} sets",
            self.context.title,
            done,
            total
        );
    }

    // ------------------------------------------------------------------
    // Finalization
    // ------------------------------------------------------------------

    /// Snapshot of the recorded values, available once finished and every
    /// set holds a value
    pub fn result(&self) -> Option<SessionResult> {
        let finished_at = self.finished_at?;
        if !self.is_finished() {
            return None;
        }
        let exercises = self
            .exercises
            .iter()
            .zip(&self.kinds)
            .zip(&self.completed_values)
            .map(|((exercise, kind), values)| {
                Some(ExerciseResult {
                    exercise_id: exercise.exercise_id.clone(),
                    exercise_name: exercise.exercise_name.clone(),
                    exercise_type: kind.exercise_type(),
                    sets: exercise.sets,
                    values: values.iter().copied().collect::<Option<Vec<_>>>()?,
                    superset_group: exercise.superset_tag().map(String::from),
                })
            })
            .collect::<Option<Vec<_>>>()?;

        Some(SessionResult {
            context: self.context.clone(),
            started_at: self.started_at,
            finished_at,
            exercises,
        })
    }

    /// Enter the saving state and hand out the result to persist.
    ///
    /// Until `finish_save` or `abort_save` is called every event is refused.
    pub fn begin_save(&mut self) -> Result<SessionResult> {
        if self.saving {
            return Err(Error::Session("save already in progress".into()));
        }
        if self.saved {
            return Err(Error::Session("workout already saved".into()));
        }
        let result = self
            .result()
            .ok_or_else(|| Error::Session("workout is not finished".into()))?;
        self.saving = true;
        Ok(result)
    }

    /// Leave the saving state after a failed save; recorded values are kept
    pub fn abort_save(&mut self) {
        self.saving = false;
    }

    /// Leave the saving state after a successful save. The session cannot
    /// be saved again.
    pub fn finish_save(&mut self) {
        self.saving = false;
        self.saved = true;
    }

    /// Persist through `repository`. On failure the session stays intact so
    /// the save can be retried.
    pub fn persist(
        &mut self,
        repository: &mut impl WorkoutRepository,
        catalog: &impl ExerciseCatalog,
    ) -> Result<WorkoutRecord> {
        let result = self.begin_save()?;
        let record = result.to_record(catalog);
        match repository.save_workout(&record) {
            Ok(()) => {
                self.finish_save();
                tracing::info!(
                    "Saved workout '{}' ({} sets)",
                    record.title,
                    record.total_sets()
                );
                Ok(record)
            }
            Err(e) => {
                tracing::warn!("Saving workout '{}' failed: {}", record.title, e);
                self.abort_save();
                Err(e)
            }
        }
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn ensure_accepting(&self) -> Result<()> {
        if self.saving {
            Err(Error::Session("workout is being saved".into()))
        } else {
            Ok(())
        }
    }

    fn wrong_phase(&self, action: &str) -> Error {
        Error::Session(format!("cannot {} while {}", action, self.phase.name()))
    }

    fn record(&mut self, at: Cursor, value: u32) {
        if let Some(slot) = self
            .completed_values
            .get_mut(at.exercise_index)
            .and_then(|row| row.get_mut(at.set_index))
        {
            *slot = Some(value);
        }
    }

    /// Hold phase whose countdown and stopwatch both begin at `start`
    fn holding_from(&self, start: DateTime<Utc>, duration: u32) -> Phase {
        let late = (self.clock.now() - start).to_std().unwrap_or_default();
        Phase::Holding {
            timer: Countdown::starting_at(start, duration, self.settings.tick),
            stopwatch: Stopwatch::started_ago(&self.clock, late),
            duration,
        }
    }

    /// Decide what follows the set at `done`
    fn step_after(&self, done: Cursor) -> Step {
        let Some(unit_index) = self
            .units
            .iter()
            .position(|unit| unit.contains(done.exercise_index))
        else {
            return Step::Finished;
        };
        let members = self.units[unit_index].members();
        let sets_of = |index: usize| self.exercises[index].sets as usize;

        // Remaining members of this round
        let position = members
            .iter()
            .position(|&m| m == done.exercise_index)
            .unwrap_or(members.len());
        if let Some(&member) = members
            .iter()
            .skip(position + 1)
            .find(|&&m| sets_of(m) > done.set_index)
        {
            return Step::NextInSuperset(Cursor::new(member, done.set_index));
        }

        let rounds = members.iter().map(|&m| sets_of(m)).max().unwrap_or(0);
        let next_round = done.set_index + 1;
        let next = if next_round < rounds {
            members
                .iter()
                .find(|&&m| sets_of(m) > next_round)
                .map(|&m| Cursor::new(m, next_round))
        } else {
            self.units
                .get(unit_index + 1)
                .and_then(|unit| unit.members().first())
                .map(|&m| Cursor::new(m, 0))
        };

        match next {
            None => Step::Finished,
            Some(next) => match self.exercises[done.exercise_index].rest_seconds {
                0 => Step::Continue(next),
                seconds => Step::Rest { seconds, next },
            },
        }
    }

    fn apply(&mut self, step: Step) {
        match step {
            Step::NextInSuperset(next) | Step::Continue(next) => {
                self.cursor = next;
                self.phase = Phase::Performing;
            }
            Step::Rest { seconds, next } => {
                self.phase = Phase::Resting {
                    timer: Countdown::start(&self.clock, seconds, self.settings.tick),
                    next,
                    alerted: false,
                };
            }
            Step::Finished => {
                self.phase = Phase::Finished;
                self.finished_at = Some(self.clock.now());
                tracing::info!("Session '{}' finished", self.context.title);
            }
        }
    }
}
