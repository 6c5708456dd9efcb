//! Workout suggestions.

use rand::Rng;

/// Suggestions every installation starts with.
pub const BUILTIN_WORKOUTS: [&str; 7] = [
    "Wall sit for 30 seconds",
    "Do 10 push-ups (wall, desk, or regular)",
    "Walk around for 5 minutes",
    "Do 15 jumping jacks",
    "Touch your toes 10 times",
    "Cat-Cow stretch",
    "March in place for 1 minute",
];

/// Built-in suggestions followed by the user's own.
pub fn all_workouts(custom: &[String]) -> Vec<String> {
    BUILTIN_WORKOUTS
        .iter()
        .map(|w| w.to_string())
        .chain(custom.iter().cloned())
        .collect()
}

/// Uniform pick over built-in and custom suggestions.
pub fn pick_workout<R: Rng + ?Sized>(custom: &[String], rng: &mut R) -> String {
    let index = rng.gen_range(0..BUILTIN_WORKOUTS.len() + custom.len());
    match BUILTIN_WORKOUTS.get(index) {
        Some(builtin) => builtin.to_string(),
        None => custom[index - BUILTIN_WORKOUTS.len()].clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    #[test]
    fn picks_cover_builtin_and_custom() {
        let custom = vec!["Plank for 45 seconds".to_string()];
        let mut rng = StdRng::seed_from_u64(7);
        let picked: HashSet<String> = (0..500).map(|_| pick_workout(&custom, &mut rng)).collect();

        let expected: HashSet<String> = all_workouts(&custom).into_iter().collect();
        assert_eq!(picked, expected);
    }

    #[test]
    fn all_workouts_keeps_order() {
        let custom = vec!["B".to_string(), "A".to_string()];
        let all = all_workouts(&custom);
        assert_eq!(all.len(), BUILTIN_WORKOUTS.len() + 2);
        assert_eq!(&all[BUILTIN_WORKOUTS.len()..], &["B".to_string(), "A".to_string()]);
    }
}
