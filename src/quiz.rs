//! Riddle gate between levels.
//!
//! Pure data plus matching; presenting the question and collecting the typed
//! answer is the host's job. Riddles repeat once the list runs out.

pub struct Riddle {
    pub question: &'static str,
    pub answers: &'static [&'static str],
}

pub static RIDDLES: [Riddle; 4] = [
    Riddle {
        question: "I have keys but open no locks.",
        answers: &["piano"],
    },
    Riddle {
        question: "The more you take, the more you leave behind.",
        answers: &["footsteps", "steps"],
    },
    Riddle {
        question: "What has many eyes but cannot see?",
        answers: &["potato"],
    },
    Riddle {
        question: "I'm tall when I'm young, and I'm short when I'm old.",
        answers: &["candle"],
    },
];

pub fn riddle_for_level(level: u32) -> &'static Riddle {
    let idx = (level.max(1) - 1) as usize % RIDDLES.len();
    &RIDDLES[idx]
}

/// Case-insensitive, whitespace-trimmed match against any accepted answer.
pub fn check_answer(level: u32, answer: &str) -> bool {
    let typed = answer.trim().to_lowercase();
    riddle_for_level(level)
        .answers
        .iter()
        .any(|a| *a == typed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_selects_riddle_round_robin() {
        assert!(std::ptr::eq(riddle_for_level(1), &RIDDLES[0]));
        assert!(std::ptr::eq(riddle_for_level(4), &RIDDLES[3]));
        assert!(std::ptr::eq(riddle_for_level(5), &RIDDLES[0]));
        // Degenerate level 0 behaves like level 1 rather than indexing past the end.
        assert!(std::ptr::eq(riddle_for_level(0), &RIDDLES[0]));
    }

    #[test]
    fn matching_is_trimmed_and_case_insensitive() {
        assert!(check_answer(1, "Piano"));
        assert!(check_answer(1, "  piano  "));
        assert!(check_answer(2, "steps"));
        assert!(check_answer(2, "footsteps"));
        assert!(!check_answer(1, "organ"));
        assert!(!check_answer(1, ""));
    }
}
