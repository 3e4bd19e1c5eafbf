/// Dismissable, non-blocking failure notices.
use std::collections::VecDeque;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub id: u64,
    pub message: String,
}

/// Bounded list of notices; the oldest is dropped when full.
#[derive(Debug)]
pub struct Notices {
    items: VecDeque<Notice>,
    capacity: usize,
    next_id: u64,
}

impl Notices {
    pub fn new(capacity: usize) -> Self {
        Self {
            items: VecDeque::new(),
            capacity: capacity.max(1),
            next_id: 1,
        }
    }

    /// Append a notice and return its id.
    pub fn push(&mut self, message: impl Into<String>) -> u64 {
        if self.items.len() >= self.capacity {
            self.items.pop_front();
        }
        let id = self.next_id;
        self.next_id += 1;
        self.items.push_back(Notice {
            id,
            message: message.into(),
        });
        id
    }

    pub fn dismiss(&mut self, id: u64) -> bool {
        match self.items.iter().position(|n| n.id == id) {
            Some(pos) => {
                self.items.remove(pos);
                true
            }
            None => false,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Notice> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn latest(&self) -> Option<&Notice> {
        self.items.back()
    }
}
