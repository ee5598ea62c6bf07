use std::collections::HashSet;

use crate::llm::types::ChatMessage;

/// Turns at the head of the transcript (system prompt, task) that pruning
/// never touches.
const PINNED_TURNS: usize = 2;

/// Ordered conversation history for one run.
///
/// Append-only apart from [`Transcript::prune_screenshots`], which removes
/// old screenshot turns and keeps the relative order of everything else.
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    turns: Vec<ChatMessage>,
}

impl Transcript {
    /// Seed with the system prompt and the initial task.
    pub fn new(system_prompt: &str, task_prompt: &str) -> Self {
        Self {
            turns: vec![ChatMessage::system(system_prompt), ChatMessage::user(task_prompt)],
        }
    }

    pub fn push(&mut self, turn: ChatMessage) {
        self.turns.push(turn);
    }

    pub fn turns(&self) -> &[ChatMessage] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn last(&self) -> Option<&ChatMessage> {
        self.turns.last()
    }

    pub fn image_turn_count(&self) -> usize {
        self.turns.iter().filter(|t| t.is_image_bearing()).count()
    }

    /// Keep only the `keep_last` most recent screenshot turns.
    /// Text-only turns are always kept. Returns how many turns were removed.
    pub fn prune_screenshots(&mut self, keep_last: usize) -> usize {
        let image_idxs: Vec<usize> = self
            .turns
            .iter()
            .enumerate()
            .skip(PINNED_TURNS)
            .filter(|(_, t)| t.is_image_bearing())
            .map(|(i, _)| i)
            .collect();

        if image_idxs.len() <= keep_last {
            return 0;
        }
        let drop: HashSet<usize> = image_idxs[..image_idxs.len() - keep_last]
            .iter()
            .copied()
            .collect();

        let mut idx = 0;
        self.turns.retain(|_| {
            let keep = !drop.contains(&idx);
            idx += 1;
            keep
        });

        tracing::debug!(removed = drop.len(), keep_last, "pruned screenshot turns");
        drop.len()
    }
}
