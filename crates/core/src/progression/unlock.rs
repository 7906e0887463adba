use serde::Serialize;

use super::ProgressIndex;
use crate::model::{Module, ModuleId, ModuleProgress};

//
// ─── UNLOCK STATE ──────────────────────────────────────────────────────────────
//

/// Whether a learner may open a module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum UnlockState {
    Unlocked,
    /// Blocked by the first unpassed gate earlier in the path. `message` is
    /// that module's unlock message, verbatim.
    Locked {
        blocked_by: ModuleId,
        message: String,
    },
}

impl UnlockState {
    #[must_use]
    pub fn is_unlocked(&self) -> bool {
        matches!(self, Self::Unlocked)
    }

    #[must_use]
    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Unlocked => None,
            Self::Locked { message, .. } => Some(message),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModuleUnlock {
    pub module_id: ModuleId,
    pub order_index: u32,
    pub state: UnlockState,
}

//
// ─── PATH UNLOCKS ──────────────────────────────────────────────────────────────
//

/// Unlock states for a whole learning path, in `order_index` order.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(transparent)]
pub struct PathUnlocks {
    entries: Vec<ModuleUnlock>,
}

impl PathUnlocks {
    #[must_use]
    pub fn entries(&self) -> &[ModuleUnlock] {
        &self.entries
    }

    #[must_use]
    pub fn state_of(&self, module_id: ModuleId) -> Option<&UnlockState> {
        self.entries
            .iter()
            .find(|e| e.module_id == module_id)
            .map(|e| &e.state)
    }

    /// Unknown modules are reported as locked.
    #[must_use]
    pub fn is_unlocked(&self, module_id: ModuleId) -> bool {
        self.state_of(module_id)
            .is_some_and(UnlockState::is_unlocked)
    }

    #[must_use]
    pub fn unlocked_count(&self) -> usize {
        self.entries.iter().filter(|e| e.state.is_unlocked()).count()
    }

    /// First locked entry, i.e. the point where the path currently stops.
    #[must_use]
    pub fn first_locked(&self) -> Option<&ModuleUnlock> {
        self.entries.iter().find(|e| !e.state.is_unlocked())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// `modules` sorted by `order_index`. The sort is stable, so duplicate
/// indices keep their input order instead of failing.
pub(crate) fn ordered(modules: &[Module]) -> Vec<&Module> {
    let mut sorted: Vec<&Module> = modules.iter().collect();
    sorted.sort_by_key(|m| m.order_index());
    sorted
}

fn gate_satisfied(module: &Module, progress: &ProgressIndex<'_>) -> bool {
    !module.quiz_required_to_unlock()
        || progress
            .get(module.id())
            .is_some_and(ModuleProgress::quiz_passed)
}

/// Evaluate which modules of a path one learner can open.
///
/// The first module is always unlocked. Every later module is unlocked only
/// while no earlier gate is unpassed; once a gate fails, it and only it is
/// cited by every module after it. `is_completed` plays no part here.
///
/// `progress` is expected to hold one learner's records; modules without a
/// record count as "quiz not passed".
///
/// # Examples
///
/// ```
/// # use course_core::model::{CourseId, Module, ModuleId, QuizSettings};
/// # use course_core::progression::{evaluate_unlocks, UnlockState};
/// let intro = Module::new(
///     ModuleId::new(1),
///     CourseId::new(1),
///     "Intro",
///     0,
///     QuizSettings::gated(70, 3)?,
///     "Pass the intro quiz to continue",
/// )?;
/// let next = Module::new(ModuleId::new(2), CourseId::new(1), "Next", 1, QuizSettings::no_quiz(), "")?;
///
/// let unlocks = evaluate_unlocks(&[intro, next], &[]);
/// assert_eq!(
///     unlocks.state_of(ModuleId::new(2)).and_then(UnlockState::message),
///     Some("Pass the intro quiz to continue"),
/// );
/// # Ok::<(), course_core::model::ModuleError>(())
/// ```
#[must_use]
pub fn evaluate_unlocks(modules: &[Module], progress: &[ModuleProgress]) -> PathUnlocks {
    let index = ProgressIndex::new(progress);
    let mut blocker: Option<&Module> = None;
    let mut entries = Vec::with_capacity(modules.len());

    for module in ordered(modules) {
        let state = match blocker {
            None => UnlockState::Unlocked,
            Some(gate) => UnlockState::Locked {
                blocked_by: gate.id(),
                message: gate.unlock_message().to_owned(),
            },
        };
        entries.push(ModuleUnlock {
            module_id: module.id(),
            order_index: module.order_index(),
            state,
        });

        if blocker.is_none() && !gate_satisfied(module, &index) {
            blocker = Some(module);
        }
    }

    PathUnlocks { entries }
}

/// The module a learner should continue with: the first unlocked module that
/// is not yet completed. `None` when everything reachable is done.
#[must_use]
pub fn next_module<'a>(modules: &'a [Module], progress: &[ModuleProgress]) -> Option<&'a Module> {
    let unlocks = evaluate_unlocks(modules, progress);
    let index = ProgressIndex::new(progress);

    ordered(modules).into_iter().find(|m| {
        unlocks.is_unlocked(m.id())
            && !index.get(m.id()).is_some_and(ModuleProgress::is_completed)
    })
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
