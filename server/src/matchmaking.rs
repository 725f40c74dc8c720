//! FIFO queue of connections waiting for an opponent

use crate::registry::ConnId;
use rand::Rng;
use std::collections::VecDeque;

/// Two connections taken off the queue together, with colors decided
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pairing {
    /// Moves first
    pub white: ConnId,
    pub black: ConnId,
}

impl Pairing {
    /// Flips an unbiased coin to decide which of the two plays white
    pub fn coin_flip<R: Rng + ?Sized>(first: ConnId, second: ConnId, rng: &mut R) -> Self {
        if rng.gen_bool(0.5) {
            Self {
                white: first,
                black: second,
            }
        } else {
            Self {
                white: second,
                black: first,
            }
        }
    }

    #[cfg(test)]
    pub fn contains(&self, id: ConnId) -> bool {
        self.white == id || self.black == id
    }
}

/// Connections that asked to play and are not yet paired, oldest first
#[derive(Debug, Default)]
pub struct WaitQueue {
    queue: VecDeque<ConnId>,
}

impl WaitQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `id` unless it is already waiting
    pub fn push(&mut self, id: ConnId) -> bool {
        if self.contains(id) {
            return false;
        }
        self.queue.push_back(id);
        true
    }

    /// Removes `id` wherever it sits. Returns false if it was not queued.
    pub fn remove(&mut self, id: ConnId) -> bool {
        match self.queue.iter().position(|queued| *queued == id) {
            Some(index) => {
                self.queue.remove(index);
                true
            }
            None => false,
        }
    }

    /// Takes the two oldest entries, if there are at least two
    pub fn pop_pair(&mut self) -> Option<(ConnId, ConnId)> {
        if self.queue.len() < 2 {
            return None;
        }
        let first = self.queue.pop_front()?;
        let second = self.queue.pop_front()?;
        Some((first, second))
    }

    pub fn contains(&self, id: ConnId) -> bool {
        self.queue.contains(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ConnId> {
        self.queue.iter()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn clear(&mut self) {
        self.queue.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_push_rejects_duplicates() {
        let mut queue = WaitQueue::new();
        assert!(queue.push(ConnId(1)));
        assert!(!queue.push(ConnId(1)));
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_pop_pair_is_fifo() {
        let mut queue = WaitQueue::new();
        for id in 1..=5 {
            queue.push(ConnId(id));
        }

        assert_eq!(queue.pop_pair(), Some((ConnId(1), ConnId(2))));
        assert_eq!(queue.pop_pair(), Some((ConnId(3), ConnId(4))));
        assert_eq!(queue.pop_pair(), None);
        assert_eq!(queue.iter().copied().collect::<Vec<_>>(), vec![ConnId(5)]);
    }

    #[test]
    fn test_remove_from_middle() {
        let mut queue = WaitQueue::new();
        queue.push(ConnId(1));
        queue.push(ConnId(2));
        queue.push(ConnId(3));

        assert!(queue.remove(ConnId(2)));
        assert!(!queue.remove(ConnId(2)));
        assert_eq!(queue.pop_pair(), Some((ConnId(1), ConnId(3))));
        assert!(queue.is_empty());
    }

    #[test]
    fn test_coin_flip_assigns_both_colors() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut first_was_white = 0;

        for _ in 0..1000 {
            let pairing = Pairing::coin_flip(ConnId(1), ConnId(2), &mut rng);
            assert_ne!(pairing.white, pairing.black);
            assert!(pairing.contains(ConnId(1)) && pairing.contains(ConnId(2)));
            if pairing.white == ConnId(1) {
                first_was_white += 1;
            }
        }

        // Loose bounds; a fair coin lands far inside them
        assert!(first_was_white > 400 && first_was_white < 600);
    }
}
