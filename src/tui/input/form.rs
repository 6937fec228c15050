use crossterm::event::{KeyCode, KeyEvent};

use crate::model::task::{Priority, Task, TaskDraft, TaskId, TaskPatch};

use super::text::TextInput;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    Title,
    Description,
    Priority,
}

impl FormField {
    fn next(self) -> FormField {
        match self {
            FormField::Title => FormField::Description,
            FormField::Description => FormField::Priority,
            FormField::Priority => FormField::Title,
        }
    }
}

/// What the form produces on submit
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormOutcome {
    Create(TaskDraft),
    Update(TaskId, TaskPatch),
    /// Edit form submitted without changes
    Unchanged,
}

/// Create/edit task form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskForm {
    /// Task being edited; `None` for a new task
    pub editing: Option<Task>,
    pub title: TextInput,
    pub description: TextInput,
    pub priority: Priority,
    pub field: FormField,
}

impl TaskForm {
    pub fn create() -> Self {
        TaskForm {
            editing: None,
            title: TextInput::default(),
            description: TextInput::default(),
            priority: Priority::default(),
            field: FormField::Title,
        }
    }

    pub fn edit(task: &Task) -> Self {
        TaskForm {
            editing: Some(task.clone()),
            title: TextInput::new(&task.title),
            description: TextInput::new(task.description_text()),
            priority: task.priority,
            field: FormField::Title,
        }
    }

    pub fn heading(&self) -> String {
        match &self.editing {
            Some(task) => format!("Edit task #{}", task.id),
            None => "New task".to_string(),
        }
    }

    /// Route a key to the focused field. Returns false if unhandled.
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        if key.code == KeyCode::Tab {
            self.field = self.field.next();
            return true;
        }
        match self.field {
            FormField::Title => self.title.handle_key(key),
            FormField::Description => self.description.handle_key(key),
            FormField::Priority => match key.code {
                KeyCode::Left | KeyCode::Char('h') => {
                    self.priority = cycle(self.priority, -1);
                    true
                }
                KeyCode::Right | KeyCode::Char('l') | KeyCode::Char(' ') => {
                    self.priority = cycle(self.priority, 1);
                    true
                }
                _ => false,
            },
        }
    }

    /// Turn the form into a create or update request. Validation happens in
    /// the controller.
    pub fn submit(&self) -> FormOutcome {
        let title = self.title.text().to_string();
        let description = self.description.text().to_string();
        let Some(task) = &self.editing else {
            return FormOutcome::Create(TaskDraft {
                title,
                description: Some(description),
                priority: Some(self.priority),
                due_at: None,
            });
        };

        let patch = TaskPatch {
            title: (title != task.title).then_some(title),
            description: (description != task.description_text()).then_some(description),
            completed: None,
            priority: (self.priority != task.priority).then_some(self.priority),
            due_at: None,
        };
        if patch.is_empty() {
            FormOutcome::Unchanged
        } else {
            FormOutcome::Update(task.id, patch)
        }
    }
}

fn cycle(p: Priority, step: isize) -> Priority {
    let all = Priority::ALL;
    let idx = all.iter().position(|x| *x == p).unwrap_or(0) as isize;
    let len = all.len() as isize;
    all[((idx + step).rem_euclid(len)) as usize]
}
