use crate::catalog::CommandSpec;

/// Selection-index management over the filtered command list.
///
/// The index resets to 0 whenever the palette opens or the filtered result
/// set changes; arrows wrap modulo the list length.
#[derive(Debug, Default)]
pub struct NavigationController {
    selected: usize,
    result_names: Vec<String>,
}

impl NavigationController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selected_index(&self) -> usize {
        self.selected
    }

    pub fn result_len(&self) -> usize {
        self.result_names.len()
    }

    /// Called on open.
    pub fn reset(&mut self) {
        self.selected = 0;
        self.result_names.clear();
    }

    /// Reconciles with the latest filtered list; a changed result set snaps
    /// the index back to 0, an unchanged one leaves it alone.
    pub fn sync(&mut self, results: &[&CommandSpec]) {
        let names: Vec<String> = results.iter().map(|cmd| cmd.name.clone()).collect();
        if names != self.result_names {
            self.selected = 0;
            self.result_names = names;
        }
    }

    pub fn select_next(&mut self) {
        let len = self.result_names.len();
        if len > 0 {
            self.selected = (self.selected + 1) % len;
        }
    }

    pub fn select_previous(&mut self) {
        let len = self.result_names.len();
        if len > 0 {
            self.selected = (self.selected + len - 1) % len;
        }
    }

    /// Hover moves the highlight without committing. Out-of-range indices
    /// are ignored.
    pub fn hover(&mut self, index: usize) {
        if index < self.result_names.len() {
            self.selected = index;
        }
    }
}
