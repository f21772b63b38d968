//! Weekly plan: what each day prescribes.
//!
//! The plan is configuration consumed by the engine; nothing here is ever
//! mutated at runtime. A built-in week is cached, and a custom one can be
//! loaded from TOML.

use crate::{Error, Result};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// Display selector for run instructions
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    #[default]
    Treadmill,
    Outdoor,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ExerciseSpec {
    pub id: String,
    pub name: String,
    pub sets: u32,
    pub target_reps: u32,
    #[serde(default)]
    pub note: Option<String>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct RunDetails {
    #[serde(default)]
    pub treadmill: Vec<String>,
    #[serde(default)]
    pub outdoor: Vec<String>,
}

impl RunDetails {
    pub fn for_mode(&self, mode: Mode) -> &[String] {
        match mode {
            Mode::Treadmill => &self.treadmill,
            Mode::Outdoor => &self.outdoor,
        }
    }
}

/// Which progression advisory applies to a run day
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RunProgression {
    Interval,
    Tempo,
    LongRun,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MainBlock {
    Strength {
        exercises: Vec<ExerciseSpec>,
    },
    Run {
        title: String,
        details_by_mode: RunDetails,
        #[serde(default)]
        show_interval_timer: bool,
        #[serde(default)]
        progression: Option<RunProgression>,
    },
    Rest {
        #[serde(default)]
        details: Vec<String>,
    },
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct MobilityItem {
    pub id: String,
    pub name: String,
    pub seconds: u32,
    #[serde(default)]
    pub note: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct DayPlan {
    pub key: String,
    pub name: String,
    #[serde(default)]
    pub warmup: Vec<String>,
    pub main: MainBlock,
    #[serde(default)]
    pub mobility: Vec<MobilityItem>,
}

impl DayPlan {
    pub fn exercises(&self) -> &[ExerciseSpec] {
        match &self.main {
            MainBlock::Strength { exercises } => exercises,
            _ => &[],
        }
    }

    pub fn exercise(&self, id: &str) -> Option<&ExerciseSpec> {
        self.exercises().iter().find(|e| e.id == id)
    }

    pub fn mobility_item(&self, id: &str) -> Option<&MobilityItem> {
        self.mobility.iter().find(|m| m.id == id)
    }

    pub fn shows_interval_timer(&self) -> bool {
        matches!(
            self.main,
            MainBlock::Run {
                show_interval_timer: true,
                ..
            }
        )
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Plan {
    pub days: Vec<DayPlan>,
}

/// Cached default plan - built once and reused
static DEFAULT_PLAN: Lazy<Plan> = Lazy::new(build_default_plan);

/// Get a reference to the cached default plan
pub fn default_plan() -> &'static Plan {
    &DEFAULT_PLAN
}

impl Plan {
    /// Load a plan from a TOML file
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let plan: Plan = toml::from_str(&contents)?;
        let errors = plan.validate();
        if !errors.is_empty() {
            return Err(Error::Plan(errors.join("; ")));
        }
        tracing::info!("Loaded plan with {} days from {:?}", plan.days.len(), path);
        Ok(plan)
    }

    pub fn day(&self, key: &str) -> Option<&DayPlan> {
        self.days.iter().find(|d| d.key == key)
    }

    /// Unknown keys fall back to the first day of the week.
    pub fn day_or_first(&self, key: &str) -> Option<&DayPlan> {
        self.day(key).or_else(|| self.days.first())
    }

    /// Check the plan for structural problems
    ///
    /// Returns a list of human-readable errors (empty if valid).
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.days.is_empty() {
            errors.push("Plan has no days".to_string());
        }

        let mut day_keys = HashSet::new();
        let mut interval_days = 0;

        for day in &self.days {
            if day.key.is_empty() {
                errors.push(format!("Day '{}' has empty key", day.name));
            }
            if !day_keys.insert(day.key.as_str()) {
                errors.push(format!("Duplicate day key '{}'", day.key));
            }
            if day.shows_interval_timer() {
                interval_days += 1;
            }

            let mut exercise_ids = HashSet::new();
            for ex in day.exercises() {
                if ex.id.is_empty() {
                    errors.push(format!("Day '{}' has exercise with empty id", day.key));
                }
                if !exercise_ids.insert(ex.id.as_str()) {
                    errors.push(format!("Day '{}': duplicate exercise '{}'", day.key, ex.id));
                }
                if ex.sets == 0 {
                    errors.push(format!("Day '{}': exercise '{}' has no sets", day.key, ex.id));
                }
            }

            let mut mobility_ids = HashSet::new();
            for item in &day.mobility {
                if !mobility_ids.insert(item.id.as_str()) {
                    errors.push(format!(
                        "Day '{}': duplicate mobility item '{}'",
                        day.key, item.id
                    ));
                }
                if item.seconds == 0 {
                    errors.push(format!(
                        "Day '{}': mobility item '{}' has zero duration",
                        day.key, item.id
                    ));
                }
            }
        }

        if interval_days > 1 {
            errors.push(format!(
                "{} days show the interval timer, expected at most one",
                interval_days
            ));
        }

        errors
    }
}

fn lines(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn exercise(id: &str, name: &str, sets: u32, target_reps: u32, note: &str) -> ExerciseSpec {
    ExerciseSpec {
        id: id.into(),
        name: name.into(),
        sets,
        target_reps,
        note: Some(note.into()),
    }
}

fn stretch(id: &str, name: &str, seconds: u32, note: &str) -> MobilityItem {
    MobilityItem {
        id: id.into(),
        name: name.into(),
        seconds,
        note: Some(note.into()),
    }
}

/// Builds the built-in week: two strength days, intervals, easy, tempo and
/// long runs, and one recovery day.
pub fn build_default_plan() -> Plan {
    let days = vec![
        DayPlan {
            key: "mon".into(),
            name: "Mon - Strength A".into(),
            warmup: lines(&[
                "3 min easy walk or jog",
                "Leg swings 10 each direction",
                "Ankle & calf mobility 60 sec",
            ]),
            main: MainBlock::Strength {
                exercises: vec![
                    exercise("trap", "Trap Bar Deadlift", 4, 3, "fast, no grind"),
                    exercise("bss", "Bulgarian Split Squat", 3, 5, "each leg"),
                    exercise("box", "Box Jumps", 3, 3, "reset each rep"),
                    exercise("calf", "Standing Calf Raises", 3, 10, "slow down"),
                ],
            },
            mobility: vec![
                stretch("couch", "Couch stretch", 60, "per side"),
                stretch("calf_stretch", "Calf stretch", 60, "per side"),
                stretch("glute", "Glute stretch", 60, "per side"),
            ],
        },
        DayPlan {
            key: "tue".into(),
            name: "Tue - Intervals".into(),
            warmup: lines(&["10-12 min easy", "3 x 20s strides"]),
            main: MainBlock::Run {
                title: "Intervals".into(),
                details_by_mode: RunDetails {
                    treadmill: lines(&[
                        "Incline: 1.0%",
                        "Rounds: 6",
                        "Work: 95s @ 15.0 km/h (4:00/km)",
                        "Recovery: 90s @ 10.0 km/h (6:00/km)",
                        "Goal: controlled hard reps",
                    ]),
                    outdoor: lines(&[
                        "Route: flat loop / track",
                        "Rounds: 6",
                        "Work: 95s @ hard-but-controlled (RPE 8/10)",
                        "Recovery: 90s easy jog/walk",
                        "Goal: even effort reps",
                    ]),
                },
                show_interval_timer: true,
                progression: Some(RunProgression::Interval),
            },
            mobility: vec![stretch("calf_stretch_tue", "Calf stretch", 60, "per side")],
        },
        DayPlan {
            key: "wed".into(),
            name: "Wed - Mobility / Rest".into(),
            warmup: vec![],
            main: MainBlock::Rest {
                details: lines(&["Recovery day. Keep it easy.", "Optional 10-20 min walk"]),
            },
            mobility: vec![
                stretch("couch_wed", "Couch stretch", 60, "per side"),
                stretch("calves_wed", "Calves", 60, "per side"),
                stretch("thoracic", "Thoracic rotations", 60, "per side"),
            ],
        },
        DayPlan {
            key: "thu".into(),
            name: "Thu - Strength B".into(),
            warmup: lines(&[
                "3 min easy walk or jog",
                "Hip openers 60 sec",
                "Ankle & calf mobility 60 sec",
            ]),
            main: MainBlock::Strength {
                exercises: vec![
                    exercise("rdl", "Romanian Deadlift", 4, 6, "controlled"),
                    exercise("lunge", "Reverse Lunge", 3, 6, "each leg"),
                    exercise("step", "Step-ups", 3, 8, "each leg"),
                    exercise("calf_seated", "Seated Calf Raises", 3, 12, "slow down"),
                ],
            },
            mobility: vec![
                stretch("hip_flexor", "Hip flexor stretch", 60, "per side"),
                stretch("hamstring", "Hamstring stretch", 60, "per side"),
            ],
        },
        DayPlan {
            key: "fri".into(),
            name: "Fri - Easy Run".into(),
            warmup: lines(&["8-10 min easy", "2 x 15s relaxed strides (optional)"]),
            main: MainBlock::Run {
                title: "Easy Run".into(),
                details_by_mode: RunDetails {
                    treadmill: lines(&[
                        "Incline: 1.0%",
                        "20-30 min easy",
                        "Speed: 10.0-12.0 km/h (6:00-5:00/km)",
                        "Finish feeling fresh",
                    ]),
                    outdoor: lines(&[
                        "20-30 min easy",
                        "Talk-test pace (RPE 4-5/10)",
                        "Avoid big hills if possible",
                        "Finish feeling fresh",
                    ]),
                },
                show_interval_timer: false,
                progression: None,
            },
            mobility: vec![stretch("calf_stretch_fri", "Calf stretch", 60, "per side")],
        },
        DayPlan {
            key: "sat".into(),
            name: "Sat - Tempo / Steady".into(),
            warmup: lines(&["10 min easy", "3 x 20s strides"]),
            main: MainBlock::Run {
                title: "Tempo / Steady".into(),
                details_by_mode: RunDetails {
                    treadmill: lines(&[
                        "Incline: 1.0%",
                        "10 min easy @ 11.0-12.0 km/h",
                        "10-15 min steady @ 13.0-14.0 km/h",
                        "5 min easy cool down",
                    ]),
                    outdoor: lines(&[
                        "10 min easy",
                        "10-15 min steady (RPE 7/10, comfortably hard)",
                        "5-10 min cool down",
                        "Aim for even effort, not exact pace",
                    ]),
                },
                show_interval_timer: false,
                progression: Some(RunProgression::Tempo),
            },
            mobility: vec![stretch("glute_sat", "Glute stretch", 60, "per side")],
        },
        DayPlan {
            key: "sun".into(),
            name: "Sun - Long Run".into(),
            warmup: lines(&["5-10 min easy build"]),
            main: MainBlock::Run {
                title: "Long Run".into(),
                details_by_mode: RunDetails {
                    treadmill: lines(&[
                        "Incline: 1.0%",
                        "35-50 min easy (build by +5 min every 1-2 weeks)",
                        "Keep it conversational (RPE 4-5/10)",
                    ]),
                    outdoor: lines(&[
                        "35-50 min easy (build by +5 min every 1-2 weeks)",
                        "Conversational pace (RPE 4-5/10)",
                        "Prefer flatter route; take water if needed",
                    ]),
                },
                show_interval_timer: false,
                progression: Some(RunProgression::LongRun),
            },
            mobility: vec![stretch("full_body", "Full body stretch", 180, "easy")],
        },
    ];

    Plan { days }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_plan_is_valid() {
        let errors = default_plan().validate();
        assert!(errors.is_empty(), "unexpected errors: {:?}", errors);
        assert_eq!(default_plan().days.len(), 7);
    }

    #[test]
    fn test_exactly_one_interval_day() {
        let interval_days: Vec<_> = default_plan()
            .days
            .iter()
            .filter(|d| d.shows_interval_timer())
            .map(|d| d.key.as_str())
            .collect();
        assert_eq!(interval_days, vec!["tue"]);
    }

    #[test]
    fn test_day_lookup_falls_back_to_first() {
        let plan = default_plan();
        assert_eq!(plan.day_or_first("thu").unwrap().key, "thu");
        assert_eq!(plan.day_or_first("nope").unwrap().key, "mon");
        assert!(plan.day("nope").is_none());
    }

    #[test]
    fn test_run_details_follow_mode() {
        let tue = default_plan().day("tue").unwrap();
        let MainBlock::Run {
            details_by_mode, ..
        } = &tue.main
        else {
            panic!("tuesday should be a run day");
        };
        assert_eq!(details_by_mode.for_mode(Mode::Treadmill)[0], "Incline: 1.0%");
        assert_eq!(
            details_by_mode.for_mode(Mode::Outdoor)[0],
            "Route: flat loop / track"
        );
    }

    #[test]
    fn test_validate_reports_problems() {
        let mut plan = build_default_plan();
        plan.days[1].key = "mon".into();
        if let MainBlock::Strength { exercises } = &mut plan.days[0].main {
            exercises[0].sets = 0;
        }
        if let MainBlock::Run {
            show_interval_timer,
            ..
        } = &mut plan.days[4].main
        {
            *show_interval_timer = true;
        }

        let errors = plan.validate();
        assert!(errors.iter().any(|e| e.contains("Duplicate day key 'mon'")));
        assert!(errors.iter().any(|e| e.contains("'trap' has no sets")));
        assert!(errors.iter().any(|e| e.contains("interval timer")));
    }

    #[test]
    fn test_load_plan_from_toml() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("plan.toml");
        std::fs::write(
            &path,
            r#"
[[days]]
key = "a"
name = "Day A"

[days.main]
type = "strength"
exercises = [{ id = "squat", name = "Back Squat", sets = 5, target_reps = 5 }]

[[days.mobility]]
id = "hips"
name = "Hip circles"
seconds = 45

[[days]]
key = "b"
name = "Day B"

[days.main]
type = "rest"
"#,
        )
        .unwrap();

        let plan = Plan::load_from(&path).unwrap();
        assert_eq!(plan.days.len(), 2);
        assert_eq!(plan.day("a").unwrap().exercise("squat").unwrap().sets, 5);
        assert_eq!(plan.day("a").unwrap().mobility_item("hips").unwrap().seconds, 45);
    }

    #[test]
    fn test_load_invalid_plan_is_error() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("plan.toml");
        std::fs::write(&path, "days = []").unwrap();

        assert!(matches!(Plan::load_from(&path), Err(Error::Plan(_))));
    }
}
