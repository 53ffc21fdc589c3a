//! Kanban boards, columns and tasks.
//!
//! Ordering inside a column is kept dense (`0..n`) after every insert, move
//! and removal. A task grants its XP the first time it reaches
//! [`TaskStatus::Done`], when it is tagged with a pillar.

use crate::validation::{hex_color, int_in, optional_text, required_text};
use crate::{
    Error, HistoryEntry, HistorySource, KanbanBoard, KanbanColumn, KanbanTask, Pillar, Priority,
    Result, TaskStatus, TrackerState,
};
use chrono::{NaiveDate, Utc};
use uuid::Uuid;

pub const DEFAULT_BOARD_COLOR: &str = "#3b82f6";

#[derive(Clone, Debug)]
pub struct NewBoard {
    pub title: String,
    pub description: Option<String>,
    pub color: Option<String>,
}

#[derive(Clone, Debug)]
pub struct NewTask {
    pub column_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub pillar: Option<Pillar>,
    pub deadline: Option<NaiveDate>,
    pub priority: Priority,
    pub xp: i64,
}

/// A column with its tasks in display order
#[derive(Clone, Debug)]
pub struct ColumnView {
    pub column: KanbanColumn,
    pub tasks: Vec<KanbanTask>,
}

#[derive(Clone, Debug)]
pub struct BoardView {
    pub board: KanbanBoard,
    pub columns: Vec<ColumnView>,
}

pub fn add_board(state: &mut TrackerState, input: NewBoard) -> Result<Uuid> {
    let board = KanbanBoard {
        id: Uuid::new_v4(),
        title: required_text("title", &input.title, 100)?,
        description: optional_text("description", input.description.as_deref(), 500)?,
        color: hex_color(input.color.as_deref().unwrap_or(DEFAULT_BOARD_COLOR))?,
        created_at: Utc::now(),
    };
    let id = board.id;
    state.boards.push(board);
    Ok(id)
}

/// Append a column at the right end of a board
pub fn add_column(state: &mut TrackerState, board_id: Uuid, title: &str) -> Result<Uuid> {
    let title = required_text("title", title, 50)?;
    find_board(state, board_id)?;

    let order = state.columns.iter().filter(|c| c.board_id == board_id).count();
    let column = KanbanColumn {
        id: Uuid::new_v4(),
        board_id,
        title,
        order,
    };
    let id = column.id;
    state.columns.push(column);
    Ok(id)
}

/// Append a task at the bottom of a column
pub fn add_task(state: &mut TrackerState, input: NewTask) -> Result<Uuid> {
    let task = KanbanTask {
        id: Uuid::new_v4(),
        column_id: input.column_id,
        title: required_text("title", &input.title, 200)?,
        description: optional_text("description", input.description.as_deref(), 1000)?,
        pillar: input.pillar,
        status: TaskStatus::Todo,
        deadline: input.deadline,
        priority: input.priority,
        xp: int_in("xp", input.xp, 0..=500)?,
        order: 0,
        xp_awarded: false,
        created_at: Utc::now(),
    };
    find_column(state, input.column_id)?;

    let order = tasks_in(state, input.column_id).len();
    let id = task.id;
    state.tasks.push(KanbanTask { order, ..task });
    Ok(id)
}

/// Move a task to `order` within `column_id`.
///
/// `order` past the end appends. Moving to a column of another board is
/// refused.
pub fn move_task(state: &mut TrackerState, task_id: Uuid, column_id: Uuid, order: usize) -> Result<()> {
    let from_column = find_task(state, task_id)?.column_id;
    let from_board = find_column(state, from_column)?.board_id;
    let to_board = find_column(state, column_id)?.board_id;
    if from_board != to_board {
        return Err(Error::Forbidden(
            "tasks can only move between columns of the same board".into(),
        ));
    }

    // Take the task out of its current position
    let mut siblings = tasks_in(state, column_id);
    siblings.retain(|id| *id != task_id);
    let order = order.min(siblings.len());
    siblings.insert(order, task_id);

    if let Some(task) = state.tasks.iter_mut().find(|t| t.id == task_id) {
        task.column_id = column_id;
    }
    renumber(state, &siblings);
    if from_column != column_id {
        let remaining = tasks_in(state, from_column);
        renumber(state, &remaining);
    }
    Ok(())
}

/// Change a task's status; the first transition to done posts its XP
pub fn set_task_status(
    state: &mut TrackerState,
    task_id: Uuid,
    status: TaskStatus,
    today: NaiveDate,
) -> Result<Option<HistoryEntry>> {
    let task = state
        .tasks
        .iter_mut()
        .find(|t| t.id == task_id)
        .ok_or_else(|| Error::not_found("Task", task_id))?;
    task.status = status;

    if status != TaskStatus::Done || task.xp_awarded {
        return Ok(None);
    }
    let pillar = match task.pillar {
        Some(p) if task.xp > 0 => p,
        _ => return Ok(None),
    };
    task.xp_awarded = true;

    let entry = HistoryEntry::new(
        pillar,
        HistorySource::Task,
        task_id,
        task.xp,
        task.title.clone(),
        today,
    );
    state.ledger.post(entry.clone());
    Ok(Some(entry))
}

pub fn remove_task(state: &mut TrackerState, task_id: Uuid) -> Result<KanbanTask> {
    let idx = state
        .tasks
        .iter()
        .position(|t| t.id == task_id)
        .ok_or_else(|| Error::not_found("Task", task_id))?;
    let task = state.tasks.remove(idx);
    let remaining = tasks_in(state, task.column_id);
    renumber(state, &remaining);
    Ok(task)
}

/// Remove an empty column
pub fn remove_column(state: &mut TrackerState, column_id: Uuid) -> Result<KanbanColumn> {
    let idx = state
        .columns
        .iter()
        .position(|c| c.id == column_id)
        .ok_or_else(|| Error::not_found("Column", column_id))?;
    if !tasks_in(state, column_id).is_empty() {
        return Err(Error::validation("column still has tasks"));
    }
    let removed = state.columns.remove(idx);

    let mut columns: Vec<_> = state
        .columns
        .iter_mut()
        .filter(|c| c.board_id == removed.board_id)
        .collect();
    columns.sort_by_key(|c| c.order);
    for (i, c) in columns.into_iter().enumerate() {
        c.order = i;
    }
    Ok(removed)
}

/// Remove a board with all of its columns and tasks
pub fn remove_board(state: &mut TrackerState, board_id: Uuid) -> Result<KanbanBoard> {
    let idx = state
        .boards
        .iter()
        .position(|b| b.id == board_id)
        .ok_or_else(|| Error::not_found("Board", board_id))?;
    let column_ids: Vec<Uuid> = state
        .columns
        .iter()
        .filter(|c| c.board_id == board_id)
        .map(|c| c.id)
        .collect();
    state.tasks.retain(|t| !column_ids.contains(&t.column_id));
    state.columns.retain(|c| c.board_id != board_id);
    Ok(state.boards.remove(idx))
}

pub fn board_view(state: &TrackerState, board_id: Uuid) -> Result<BoardView> {
    let board = find_board(state, board_id)?.clone();
    let mut columns: Vec<_> = state
        .columns
        .iter()
        .filter(|c| c.board_id == board_id)
        .cloned()
        .collect();
    columns.sort_by_key(|c| c.order);

    let columns = columns
        .into_iter()
        .map(|column| {
            let mut tasks: Vec<_> = state
                .tasks
                .iter()
                .filter(|t| t.column_id == column.id)
                .cloned()
                .collect();
            tasks.sort_by_key(|t| t.order);
            ColumnView { column, tasks }
        })
        .collect();

    Ok(BoardView { board, columns })
}

/// Task ids of a column in display order
fn tasks_in(state: &TrackerState, column_id: Uuid) -> Vec<Uuid> {
    let mut tasks: Vec<_> = state
        .tasks
        .iter()
        .filter(|t| t.column_id == column_id)
        .map(|t| (t.order, t.id))
        .collect();
    tasks.sort();
    tasks.into_iter().map(|(_, id)| id).collect()
}

fn renumber(state: &mut TrackerState, ordered: &[Uuid]) {
    for task in state.tasks.iter_mut() {
        if let Some(pos) = ordered.iter().position(|id| *id == task.id) {
            task.order = pos;
        }
    }
}

fn find_board(state: &TrackerState, id: Uuid) -> Result<&KanbanBoard> {
    state
        .boards
        .iter()
        .find(|b| b.id == id)
        .ok_or_else(|| Error::not_found("Board", id))
}

fn find_column(state: &TrackerState, id: Uuid) -> Result<&KanbanColumn> {
    state
        .columns
        .iter()
        .find(|c| c.id == id)
        .ok_or_else(|| Error::not_found("Column", id))
}

fn find_task(state: &TrackerState, id: Uuid) -> Result<&KanbanTask> {
    state
        .tasks
        .iter()
        .find(|t| t.id == id)
        .ok_or_else(|| Error::not_found("Task", id))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 6, 1).unwrap()
    }

    fn board(state: &mut TrackerState) -> (Uuid, Uuid, Uuid) {
        let board = add_board(
            state,
            NewBoard {
                title: "Franco Assistant".into(),
                description: None,
                color: None,
            },
        )
        .unwrap();
        let todo = add_column(state, board, "To do").unwrap();
        let doing = add_column(state, board, "Doing").unwrap();
        (board, todo, doing)
    }

    fn task(column_id: Uuid, title: &str, pillar: Option<Pillar>) -> NewTask {
        NewTask {
            column_id,
            title: title.into(),
            description: None,
            pillar,
            deadline: None,
            priority: Priority::Media,
            xp: 40,
        }
    }

    fn titles(view: &ColumnView) -> Vec<&str> {
        view.tasks.iter().map(|t| t.title.as_str()).collect()
    }

    #[test]
    fn test_board_defaults_and_color_validation() {
        let mut state = TrackerState::default();
        let (board_id, _, _) = board(&mut state);
        assert_eq!(state.boards[0].color, DEFAULT_BOARD_COLOR);
        assert_eq!(board_view(&state, board_id).unwrap().columns.len(), 2);

        let err = add_board(
            &mut state,
            NewBoard {
                title: "Bad".into(),
                description: None,
                color: Some("blue".into()),
            },
        );
        assert!(matches!(err, Err(Error::Validation(_))));
    }

    #[test]
    fn test_tasks_append_and_move() {
        let mut state = TrackerState::default();
        let (board_id, todo, doing) = board(&mut state);
        let a = add_task(&mut state, task(todo, "A", None)).unwrap();
        add_task(&mut state, task(todo, "B", None)).unwrap();
        add_task(&mut state, task(todo, "C", None)).unwrap();

        // Reorder inside the column
        move_task(&mut state, a, todo, 2).unwrap();
        let view = board_view(&state, board_id).unwrap();
        assert_eq!(titles(&view.columns[0]), vec!["B", "C", "A"]);

        // Move across columns, order past the end appends
        move_task(&mut state, a, doing, 99).unwrap();
        let view = board_view(&state, board_id).unwrap();
        assert_eq!(titles(&view.columns[0]), vec!["B", "C"]);
        assert_eq!(titles(&view.columns[1]), vec!["A"]);
        let orders: Vec<_> = view.columns[0].tasks.iter().map(|t| t.order).collect();
        assert_eq!(orders, vec![0, 1]);
    }

    #[test]
    fn test_move_across_boards_forbidden() {
        let mut state = TrackerState::default();
        let (_, todo, _) = board(&mut state);
        let (_, other_todo, _) = board(&mut state);
        let a = add_task(&mut state, task(todo, "A", None)).unwrap();

        let err = move_task(&mut state, a, other_todo, 0).unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::Forbidden);
    }

    #[test]
    fn test_done_posts_xp_once() {
        let mut state = TrackerState::default();
        let (_, todo, _) = board(&mut state);
        let tagged = add_task(&mut state, task(todo, "Shield feature", Some(Pillar::Capability))).unwrap();
        let untagged = add_task(&mut state, task(todo, "Chores", None)).unwrap();

        let posting = set_task_status(&mut state, tagged, TaskStatus::Done, today()).unwrap();
        assert_eq!(posting.unwrap().xp, 40);

        // Reopen and finish again: no second award
        set_task_status(&mut state, tagged, TaskStatus::InProgress, today()).unwrap();
        assert!(set_task_status(&mut state, tagged, TaskStatus::Done, today())
            .unwrap()
            .is_none());

        assert!(set_task_status(&mut state, untagged, TaskStatus::Done, today())
            .unwrap()
            .is_none());
        assert_eq!(state.ledger.total_xp(), 40);
    }

    #[test]
    fn test_remove_column_requires_empty() {
        let mut state = TrackerState::default();
        let (board_id, todo, doing) = board(&mut state);
        let a = add_task(&mut state, task(todo, "A", None)).unwrap();

        assert!(remove_column(&mut state, todo).is_err());
        remove_task(&mut state, a).unwrap();
        remove_column(&mut state, todo).unwrap();

        let view = board_view(&state, board_id).unwrap();
        assert_eq!(view.columns.len(), 1);
        assert_eq!(view.columns[0].column.id, doing);
        assert_eq!(view.columns[0].column.order, 0);
    }

    #[test]
    fn test_remove_board_cascades() {
        let mut state = TrackerState::default();
        let (board_id, todo, _) = board(&mut state);
        add_task(&mut state, task(todo, "A", None)).unwrap();

        remove_board(&mut state, board_id).unwrap();
        assert!(state.boards.is_empty());
        assert!(state.columns.is_empty());
        assert!(state.tasks.is_empty());
    }

    #[test]
    fn test_add_task_to_missing_column() {
        let mut state = TrackerState::default();
        let err = add_task(&mut state, task(Uuid::new_v4(), "A", None)).unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
    }
}
