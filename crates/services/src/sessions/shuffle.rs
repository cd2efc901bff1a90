use rand::Rng;

/// Shuffles `items` in place with the thread-local RNG.
pub fn shuffle<T>(items: &mut [T]) {
    shuffle_with(items, &mut rand::rng());
}

/// Fisher–Yates shuffle: walks from the last index down to 1, swapping each
/// slot with a partner drawn uniformly from `0..=i`.
pub fn shuffle_with<T, R>(items: &mut [T], rng: &mut R)
where
    R: Rng + ?Sized,
{
    for i in (1..items.len()).rev() {
        let j = rng.random_range(0..=i);
        items.swap(i, j);
    }
}
