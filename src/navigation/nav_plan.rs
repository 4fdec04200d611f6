use super::column::ColumnStack;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AwaitKind {
    Movies,
    Shows,
    Mixed,
    Seasons,
    Episodes,
    None,
}

/// A single step in a plan: the item ID to select once its column has
/// loaded. An empty ID means "land on this level without selecting
/// anything" (spec §4.8).
#[derive(Debug, Clone, Default)]
pub struct NavTarget {
    pub id: String,
}

impl NavTarget {
    pub fn select(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }

    pub fn land() -> Self {
        Self { id: String::new() }
    }
}

/// A deferred multi-step drill, e.g. resolving a global-search hit straight
/// to "season 3, episode 5 of show X" without user interaction (spec §4.8).
#[derive(Debug, Clone)]
pub struct NavPlan {
    pub targets: Vec<NavTarget>,
    pub current_step: usize,
    pub await_kind: AwaitKind,
    pub await_id: String,
}

impl NavPlan {
    pub fn new(targets: Vec<NavTarget>, await_kind: AwaitKind, await_id: impl Into<String>) -> Self {
        Self { targets, current_step: 0, await_kind, await_id: await_id.into() }
    }

    fn is_complete(&self) -> bool {
        self.current_step >= self.targets.len()
    }
}

/// The orchestration a plan needs at each step: select an item on the top
/// column, then drill into it (load or use cached data, spec §4.8 step 5).
/// Implemented by whatever owns the column stack and the services behind
/// each column kind; the plan itself never talks to a service directly.
pub trait NavDriller {
    /// Selects `target_id` on the top column. Returns `false` if not found.
    fn select_on_top(&mut self, stack: &mut ColumnStack, target_id: &str) -> bool;

    /// Drills into the currently selected item, returning the await kind/id
    /// for whatever column starts (or finishes, if cached) loading.
    fn drill_selected(&mut self, stack: &mut ColumnStack) -> (AwaitKind, String);

    fn refresh_inspector(&mut self, stack: &ColumnStack);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdvanceOutcome {
    /// The load-completion message didn't match the plan's await fields.
    NoOp,
    /// The step's target ID wasn't found in the newly loaded column; the
    /// plan was cleared.
    SelectionFailed,
    /// The final step was applied; the plan is now cleared.
    Completed,
    /// A step was applied and the plan is waiting on its next drill.
    Continued,
}

/// Consumes one load-completion message against an active nav plan
/// (spec §4.8). `plan` is cleared on both success-at-completion and
/// selection failure.
pub fn advance_nav_plan_after_load(
    plan: &mut Option<NavPlan>,
    stack: &mut ColumnStack,
    driller: &mut impl NavDriller,
    kind: AwaitKind,
    id: &str,
) -> AdvanceOutcome {
    let Some(active) = plan.as_mut() else {
        return AdvanceOutcome::NoOp;
    };
    if active.is_complete() || active.await_kind != kind || active.await_id != id {
        return AdvanceOutcome::NoOp;
    }

    let target = active.targets[active.current_step].clone();
    if !target.id.is_empty() && !driller.select_on_top(stack, &target.id) {
        *plan = None;
        return AdvanceOutcome::SelectionFailed;
    }

    active.current_step += 1;
    if active.is_complete() {
        driller.refresh_inspector(stack);
        *plan = None;
        return AdvanceOutcome::Completed;
    }

    let (next_kind, next_id) = driller.drill_selected(stack);
    active.await_kind = next_kind;
    active.await_id = next_id;
    AdvanceOutcome::Continued
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::navigation::column::{Column, ColumnItems};
    use crate::models::{Library, LibraryId, LibraryKind};

    struct StubDriller {
        select_result: bool,
        next: (AwaitKind, String),
        inspector_refreshed: bool,
    }

    impl NavDriller for StubDriller {
        fn select_on_top(&mut self, _stack: &mut ColumnStack, _target_id: &str) -> bool {
            self.select_result
        }
        fn drill_selected(&mut self, _stack: &mut ColumnStack) -> (AwaitKind, String) {
            self.next.clone()
        }
        fn refresh_inspector(&mut self, _stack: &ColumnStack) {
            self.inspector_refreshed = true;
        }
    }

    fn stack_with_one_column() -> ColumnStack {
        let mut stack = ColumnStack::new();
        let items = ColumnItems::Libraries(vec![Library {
            id: LibraryId::new("l1"),
            name: "Movies".into(),
            kind: LibraryKind::Movie,
            server_updated_at: 0,
        }]);
        stack.reset(Column::new("Libraries", items));
        stack
    }

    #[test]
    fn mismatched_await_is_a_no_op() {
        let mut plan = Some(NavPlan::new(vec![NavTarget::select("s1")], AwaitKind::Shows, "lib1"));
        let mut stack = stack_with_one_column();
        let mut driller = StubDriller { select_result: true, next: (AwaitKind::None, String::new()), inspector_refreshed: false };

        let outcome = advance_nav_plan_after_load(&mut plan, &mut stack, &mut driller, AwaitKind::Seasons, "lib1");
        assert_eq!(outcome, AdvanceOutcome::NoOp);
        assert!(plan.is_some());
    }

    #[test]
    fn selection_failure_clears_the_plan() {
        let mut plan = Some(NavPlan::new(vec![NavTarget::select("missing")], AwaitKind::Shows, "lib1"));
        let mut stack = stack_with_one_column();
        let mut driller = StubDriller { select_result: false, next: (AwaitKind::None, String::new()), inspector_refreshed: false };

        let outcome = advance_nav_plan_after_load(&mut plan, &mut stack, &mut driller, AwaitKind::Shows, "lib1");
        assert_eq!(outcome, AdvanceOutcome::SelectionFailed);
        assert!(plan.is_none());
    }

    #[test]
    fn final_step_completes_and_refreshes_inspector() {
        let mut plan = Some(NavPlan::new(vec![NavTarget::select("e1")], AwaitKind::Episodes, "s1"));
        let mut stack = stack_with_one_column();
        let mut driller = StubDriller { select_result: true, next: (AwaitKind::None, String::new()), inspector_refreshed: false };

        let outcome = advance_nav_plan_after_load(&mut plan, &mut stack, &mut driller, AwaitKind::Episodes, "s1");
        assert_eq!(outcome, AdvanceOutcome::Completed);
        assert!(plan.is_none());
        assert!(driller.inspector_refreshed);
    }

    #[test]
    fn intermediate_step_continues_with_new_await_fields() {
        let mut plan = Some(NavPlan::new(
            vec![NavTarget::select("show1"), NavTarget::select("season1")],
            AwaitKind::Shows,
            "lib1",
        ));
        let mut stack = stack_with_one_column();
        let mut driller = StubDriller {
            select_result: true,
            next: (AwaitKind::Seasons, "show1".to_string()),
            inspector_refreshed: false,
        };

        let outcome = advance_nav_plan_after_load(&mut plan, &mut stack, &mut driller, AwaitKind::Shows, "lib1");
        assert_eq!(outcome, AdvanceOutcome::Continued);
        let plan = plan.unwrap();
        assert_eq!(plan.current_step, 1);
        assert_eq!(plan.await_kind, AwaitKind::Seasons);
        assert_eq!(plan.await_id, "show1");
    }
}
