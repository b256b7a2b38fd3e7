//! Superset grouping and traversal.
//!
//! Exercises sharing a `superset_group` tag are performed back to back. The
//! functions here identify exercises by their index in the workout's exercise
//! list, so two exercises with the same name never get confused.

use crate::ExerciseDefinition;

/// One unit of a workout: a lone exercise or every member of a superset
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ExerciseUnit {
    Solo(usize),
    Superset { tag: String, members: Vec<usize> },
}

impl ExerciseUnit {
    /// Exercise indices in traversal order
    pub fn members(&self) -> &[usize] {
        match self {
            ExerciseUnit::Solo(index) => std::slice::from_ref(index),
            ExerciseUnit::Superset { members, .. } => members,
        }
    }

    pub fn contains(&self, index: usize) -> bool {
        self.members().contains(&index)
    }

    pub fn is_superset(&self) -> bool {
        matches!(self, ExerciseUnit::Superset { .. })
    }
}

/// Where an exercise sits within its superset
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SupersetPosition {
    pub index: usize,
    pub total: usize,
    pub is_last: bool,
}

pub fn is_in_superset(exercise: &ExerciseDefinition) -> bool {
    exercise.superset_tag().is_some()
}

/// Partition exercises into units.
///
/// Members of a superset need not be adjacent: the whole list is scanned.
/// Units are ordered by the position of their earliest member, members keep
/// their original relative order, and every index lands in exactly one unit.
pub fn group_by_superset(exercises: &[ExerciseDefinition]) -> Vec<ExerciseUnit> {
    let mut units: Vec<ExerciseUnit> = Vec::new();

    for (index, exercise) in exercises.iter().enumerate() {
        match exercise.superset_tag() {
            None => units.push(ExerciseUnit::Solo(index)),
            Some(tag) => {
                let existing = units.iter_mut().find_map(|unit| match unit {
                    ExerciseUnit::Superset { tag: t, members } if t == tag => Some(members),
                    _ => None,
                });
                if let Some(members) = existing {
                    members.push(index);
                    continue;
                }
                units.push(ExerciseUnit::Superset {
                    tag: tag.to_string(),
                    members: vec![index],
                });
            }
        }
    }

    units
}

/// Indices of every exercise sharing `index`'s tag, or just `index`
pub fn superset_members(index: usize, exercises: &[ExerciseDefinition]) -> Vec<usize> {
    let Some(tag) = exercises.get(index).and_then(|e| e.superset_tag()) else {
        return vec![index];
    };
    exercises
        .iter()
        .enumerate()
        .filter(|(_, e)| e.superset_tag() == Some(tag))
        .map(|(i, _)| i)
        .collect()
}

/// Position of `index` among its superset members
pub fn position_in_superset(index: usize, exercises: &[ExerciseDefinition]) -> SupersetPosition {
    let members = superset_members(index, exercises);
    let position = members.iter().position(|&m| m == index).unwrap_or(0);
    SupersetPosition {
        index: position,
        total: members.len(),
        is_last: position + 1 == members.len(),
    }
}

/// The member after `index`, or None when `index` is last or untagged
pub fn next_in_superset(index: usize, exercises: &[ExerciseDefinition]) -> Option<usize> {
    exercises.get(index)?.superset_tag()?;
    let members = superset_members(index, exercises);
    let position = members.iter().position(|&m| m == index)?;
    members.get(position + 1).copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ex(name: &str, tag: Option<&str>) -> ExerciseDefinition {
        ExerciseDefinition {
            exercise_id: name.to_lowercase(),
            exercise_name: name.into(),
            sets: 3,
            reps: Some(10),
            duration: None,
            rest_seconds: 60,
            superset_group: tag.map(String::from),
        }
    }

    #[test]
    fn test_untagged_are_singletons() {
        let exercises = vec![ex("Squat", None), ex("Bench", None)];
        assert_eq!(
            group_by_superset(&exercises),
            vec![ExerciseUnit::Solo(0), ExerciseUnit::Solo(1)]
        );
    }

    #[test]
    fn test_non_contiguous_members_grouped_in_first_occurrence_order() {
        let exercises = vec![
            ex("Row", Some("s1")),
            ex("Squat", None),
            ex("Press", Some("s1")),
            ex("Curl", Some("s2")),
            ex("Dip", Some("s2")),
        ];
        let units = group_by_superset(&exercises);
        assert_eq!(
            units,
            vec![
                ExerciseUnit::Superset {
                    tag: "s1".into(),
                    members: vec![0, 2]
                },
                ExerciseUnit::Solo(1),
                ExerciseUnit::Superset {
                    tag: "s2".into(),
                    members: vec![3, 4]
                },
            ]
        );
    }

    #[test]
    fn test_grouping_is_a_partition() {
        let exercises = vec![
            ex("A", Some("x")),
            ex("B", None),
            ex("C", Some("y")),
            ex("D", Some("x")),
            ex("E", Some("")),
            ex("F", Some("y")),
            ex("G", None),
        ];
        let units = group_by_superset(&exercises);
        let mut seen: Vec<usize> = units.iter().flat_map(|u| u.members().to_vec()).collect();
        seen.sort_unstable();
        assert_eq!(seen, (0..exercises.len()).collect::<Vec<_>>());

        let firsts: Vec<usize> = units.iter().map(|u| u.members()[0]).collect();
        let mut sorted = firsts.clone();
        sorted.sort_unstable();
        assert_eq!(firsts, sorted);
    }

    #[test]
    fn test_traversal_queries() {
        let exercises = vec![
            ex("Row", Some("s1")),
            ex("Squat", None),
            ex("Press", Some("s1")),
        ];
        assert_eq!(superset_members(0, &exercises), vec![0, 2]);
        assert_eq!(superset_members(1, &exercises), vec![1]);
        assert_eq!(next_in_superset(0, &exercises), Some(2));
        assert_eq!(next_in_superset(2, &exercises), None);
        assert_eq!(next_in_superset(1, &exercises), None);
        assert_eq!(
            position_in_superset(2, &exercises),
            SupersetPosition {
                index: 1,
                total: 2,
                is_last: true
            }
        );
        assert!(is_in_superset(&exercises[0]));
        assert!(!is_in_superset(&exercises[1]));
    }

    #[test]
    fn test_duplicate_names_resolved_by_index() {
        let exercises = vec![
            ex("Plank", Some("core")),
            ex("Plank", Some("core")),
            ex("Plank", Some("core")),
        ];
        assert_eq!(next_in_superset(0, &exercises), Some(1));
        assert_eq!(next_in_superset(1, &exercises), Some(2));
        assert_eq!(position_in_superset(1, &exercises).index, 1);
        assert!(!position_in_superset(1, &exercises).is_last);
    }
}
