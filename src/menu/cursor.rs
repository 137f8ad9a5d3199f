use super::layout::FlatEntry;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Anchor {
    Clamp,
    Category(String),
    Item { label: String, cmd: String },
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Cursor {
    index: usize,
}

impl Cursor {
    pub fn index(&self, flat: &[FlatEntry]) -> Option<usize> {
        if flat.is_empty() {
            None
        } else {
            Some(self.index.min(flat.len() - 1))
        }
    }

    pub fn move_down(&mut self, flat: &[FlatEntry]) {
        if flat.is_empty() {
            return;
        }
        self.index = (self.index + 1) % flat.len();
    }

    pub fn move_up(&mut self, flat: &[FlatEntry]) {
        if flat.is_empty() {
            return;
        }
        self.index = if self.index == 0 {
            flat.len() - 1
        } else {
            (self.index - 1).min(flat.len() - 1)
        };
    }

    pub fn clamp(&mut self, flat: &[FlatEntry]) {
        if self.index >= flat.len() {
            self.index = flat.len().saturating_sub(1);
        }
    }

    pub fn reanchor_to_category(&mut self, flat: &[FlatEntry], name: &str) {
        let found = flat
            .iter()
            .position(|entry| matches!(entry, FlatEntry::CategoryHeader { name: n } if n == name));
        match found {
            Some(idx) => self.index = idx,
            None => self.clamp(flat),
        }
    }

    pub fn reanchor_to_item(&mut self, flat: &[FlatEntry], label: &str, cmd: &str) {
        let found = flat.iter().position(
            |entry| matches!(entry, FlatEntry::MenuItem { item } if item.matches(label, cmd)),
        );
        match found {
            Some(idx) => self.index = idx,
            None => self.clamp(flat),
        }
    }

    pub fn apply(&mut self, anchor: &Anchor, flat: &[FlatEntry]) {
        match anchor {
            Anchor::Clamp => self.clamp(flat),
            Anchor::Category(name) => self.reanchor_to_category(flat, name),
            Anchor::Item { label, cmd } => self.reanchor_to_item(flat, label, cmd),
        }
    }

    #[cfg(test)]
    pub fn select(&mut self, index: usize, flat: &[FlatEntry]) {
        self.index = index;
        self.clamp(flat);
    }
}
