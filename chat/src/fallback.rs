//! Canned replies used while the chat service is unreachable, and the quick
//! response shortcuts offered under the composer.

use rand::Rng;

/// Replies synthesized locally in degraded mode.
pub const FALLBACK_REPLIES: [&str; 5] = [
    "Thanks for sharing! How else can I support you today?",
    "I appreciate your openness. Would you like to talk more about that?",
    "That's good to know. Remember, it's okay to have all kinds of feelings.",
    "I'm here for you. What would help you feel better right now?",
    "Thank you for checking in today. Is there anything specific on your mind?",
];

/// One-tap mood check-ins.
pub const QUICK_RESPONSES: [&str; 4] = ["I'm doing great!", "Just okay", "Feeling down", "Need support"];

/// Lowest and one-past-highest points granted by a fallback reply.
pub const FALLBACK_POINTS: std::ops::Range<u32> = 5..20;

pub fn pick_reply<R: Rng>(rng: &mut R) -> &'static str {
    FALLBACK_REPLIES[rng.random_range(0..FALLBACK_REPLIES.len())]
}

pub fn pick_points<R: Rng>(rng: &mut R) -> u32 {
    rng.random_range(FALLBACK_POINTS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn pick_reply_stays_within_fixed_set() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..50 {
            assert!(FALLBACK_REPLIES.contains(&pick_reply(&mut rng)));
        }
    }

    #[test]
    fn pick_points_stays_in_range() {
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..50 {
            let points = pick_points(&mut rng);
            assert!((5..20).contains(&points));
        }
    }
}
