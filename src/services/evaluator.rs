use crate::models::{Direction, Quote, Watch};

/// Whether `quote` satisfies the watch's threshold. Equality triggers in both directions;
/// an unavailable quote never triggers.
pub fn should_trigger(watch: &Watch, quote: Option<&Quote>) -> bool {
    let Some(quote) = quote else {
        return false;
    };

    match watch.direction {
        Direction::Above => quote.price >= watch.target_price,
        Direction::Below => quote.price <= watch.target_price,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::WatchId;

    fn watch(direction: Direction, target_price: f64) -> Watch {
        Watch {
            id: WatchId(1),
            owner: "u1".into(),
            destination: "c1".into(),
            symbol: "0005.HK".into(),
            target_price,
            direction,
            active: true,
            created_at: 0,
            last_checked_at: None,
            last_alerted_at: None,
            alert_count: 0,
        }
    }

    fn quote(price: f64) -> Quote {
        Quote {
            symbol: "0005.HK".into(),
            price,
            volume: None,
            observed_at: 0,
        }
    }

    #[test]
    fn above_is_boundary_inclusive() {
        let w = watch(Direction::Above, 50.0);
        assert!(!should_trigger(&w, Some(&quote(49.99))));
        assert!(should_trigger(&w, Some(&quote(50.0))));
        assert!(should_trigger(&w, Some(&quote(51.0))));
    }

    #[test]
    fn below_is_boundary_inclusive() {
        let w = watch(Direction::Below, 50.0);
        assert!(should_trigger(&w, Some(&quote(49.0))));
        assert!(should_trigger(&w, Some(&quote(50.0))));
        assert!(!should_trigger(&w, Some(&quote(50.01))));
    }

    #[test]
    fn unavailable_never_triggers() {
        assert!(!should_trigger(&watch(Direction::Above, 1.0), None));
        assert!(!should_trigger(&watch(Direction::Below, 1.0), None));
    }

    #[test]
    fn monotonic_in_price() {
        let up = watch(Direction::Above, 10.0);
        let down = watch(Direction::Below, 10.0);
        let prices = [0.5, 9.0, 9.99, 10.0, 10.01, 11.0, 250.0];

        for (i, &p1) in prices.iter().enumerate() {
            for &p2 in &prices[i..] {
                if should_trigger(&up, Some(&quote(p1))) {
                    assert!(should_trigger(&up, Some(&quote(p2))));
                }
                if should_trigger(&down, Some(&quote(p2))) {
                    assert!(should_trigger(&down, Some(&quote(p1))));
                }
            }
        }
    }
}
