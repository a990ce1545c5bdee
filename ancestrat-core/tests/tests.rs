use ancestrat_core::Position;

#[test]
fn test_position_ordering() {
    let p = Position::new(10).unwrap();
    assert_eq!(p, 10);
    assert!(p < 11);
    assert!(9 < p);
    assert!(Position::new(-1).is_none());
}

#[cfg(feature = "rand")]
mod test_rand_traits {
    use ancestrat_core::Position;
    use proptest::prelude::*;
    use rand::Rng;
    use rand::SeedableRng;

    proptest! {
        #[test]
        fn test_uniform_position(a in 0..i64::MAX, b in 0..i64::MAX,
                                 seed in 0..u64::MAX) {
            if a != b { // else rand will panic
                let lo = Position::new_valid(std::cmp::min(a, b));
                let hi = Position::new_valid(std::cmp::max(a, b));
                let upos = rand::distributions::Uniform::<Position>::new(lo, hi);
                let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
                for _ in 0..100 {
                    let x = rng.sample(upos);
                    prop_assert!(x >= lo);
                    prop_assert!(x < hi);
                }
            }
        }
    }
}
