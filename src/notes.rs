use crate::models::{Notebook, StickyNote};

/// Board contents after a search
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardView<'a> {
    pub notebooks: Vec<&'a Notebook>,
    pub sticky_notes: Vec<&'a StickyNote>,
    pub searching: bool,
}

impl BoardView<'_> {
    pub fn notebooks_empty_message(&self) -> &'static str {
        if self.searching {
            "No notebooks match your search"
        } else {
            "No notebooks yet. Create your first one!"
        }
    }

    pub fn sticky_notes_empty_message(&self) -> &'static str {
        if self.searching {
            "No sticky notes match your search"
        } else {
            "No sticky notes yet. Add your first one!"
        }
    }
}

fn contains(field: Option<&str>, needle: &str) -> bool {
    field.is_some_and(|value| value.to_lowercase().contains(needle))
}

pub fn notebook_matches(notebook: &Notebook, needle: &str) -> bool {
    contains(Some(&notebook.title), needle)
        || contains(notebook.subject.as_deref(), needle)
        || contains(notebook.description.as_deref(), needle)
}

pub fn sticky_matches(note: &StickyNote, needle: &str) -> bool {
    contains(note.title.as_deref(), needle) || contains(Some(&note.content), needle)
}

/// Case-insensitive substring search; a blank query keeps everything
pub fn search<'a>(
    notebooks: &'a [Notebook],
    sticky_notes: &'a [StickyNote],
    query: &str,
) -> BoardView<'a> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return BoardView {
            notebooks: notebooks.iter().collect(),
            sticky_notes: sticky_notes.iter().collect(),
            searching: false,
        };
    }

    BoardView {
        notebooks: notebooks
            .iter()
            .filter(|n| notebook_matches(n, &needle))
            .collect(),
        sticky_notes: sticky_notes
            .iter()
            .filter(|s| sticky_matches(s, &needle))
            .collect(),
        searching: true,
    }
}
